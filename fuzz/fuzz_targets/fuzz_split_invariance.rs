#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{Collector, Error, MessageKind, Parser, ParserLimits};

#[derive(Arbitrary, Debug)]
struct FuzzSplit {
    data: Vec<u8>,
    split_hint: u16,
    response: bool,
}

fn parse(kind: MessageKind, parts: &[&[u8]]) -> (Collector, Result<(), Error>) {
    let mut parser = Parser::new(kind, ParserLimits::unlimited());
    let mut message = Collector::new();
    for part in parts {
        let mut rest = *part;
        while !rest.is_empty() {
            match parser.write(&mut message, rest) {
                Ok(0) => break,
                Ok(n) => rest = &rest[n..],
                Err(e) => return (message, Err(e)),
            }
        }
    }
    let result = parser.write_eof(&mut message);
    (message, result)
}

fuzz_target!(|input: FuzzSplit| {
    let kind = if input.response {
        MessageKind::Response
    } else {
        MessageKind::Request
    };
    let split = usize::from(input.split_hint) % (input.data.len() + 1);
    let (head, tail) = input.data.split_at(split);

    let (whole_message, whole) = parse(kind, &[input.data.as_slice()]);
    let (split_message, split) = parse(kind, &[head, tail]);

    assert_eq!(whole, split);
    if whole.is_ok() {
        assert_eq!(whole_message, split_message);
    }
});
