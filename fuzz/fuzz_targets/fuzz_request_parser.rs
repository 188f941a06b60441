#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::{Collector, Error, Parser};

fuzz_target!(|data: &[u8]| {
    // データを一度に write (パイプラインされたメッセージを順に解析)
    let mut parser = Parser::request();
    let mut message = Collector::new();
    let mut rest = data;
    while !rest.is_empty() {
        match parser.write(&mut message, rest) {
            Ok(0) => break,
            Ok(n) => {
                assert!(n <= rest.len());
                rest = &rest[n..];
            }
            // 接続を再利用できないメッセージの後
            Err(Error::ConnectionClosed) => break,
            Err(_) => {
                assert!(parser.is_closed());
                assert!(
                    parser
                        .error_offset()
                        .is_some_and(|offset| offset <= rest.len())
                );
                break;
            }
        }
    }
    let _ = parser.write_eof(&mut message);

    // データを分割して write (ストリーミングシナリオ)
    parser.reset();
    for chunk in data.chunks(17) {
        if parser.write(&mut message, chunk).is_err() {
            return;
        }
        if parser.complete() {
            break;
        }
    }
});
