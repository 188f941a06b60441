#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{BodyWhat, Collector, MessageKind, Parser, ParserLimits};

#[derive(Arbitrary, Debug)]
struct FuzzResponse {
    data: Vec<u8>,
    header_max_size: u16,
    body_max_size: u16,
    skip_body: bool,
}

fuzz_target!(|input: FuzzResponse| {
    let limits = ParserLimits {
        header_max_size: usize::from(input.header_max_size),
        body_max_size: u64::from(input.body_max_size),
    };
    let mut parser = Parser::new(MessageKind::Response, limits);
    let body_what = if input.skip_body {
        BodyWhat::Skip
    } else {
        BodyWhat::Normal
    };
    let mut message = Collector::with_body_what(body_what);

    match parser.write(&mut message, &input.data) {
        Ok(n) => {
            assert!(n <= input.data.len());
            assert!(message.body.len() as u64 <= u64::from(input.body_max_size));
            if parser.write_eof(&mut message).is_ok() {
                assert!(parser.complete());
            }
        }
        Err(_) => {
            assert!(parser.is_closed());
            assert!(!parser.complete());
        }
    }
});
