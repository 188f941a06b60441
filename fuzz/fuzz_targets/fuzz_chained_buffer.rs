#![no_main]

use std::collections::VecDeque;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_parser::ChainedBuffer;

#[derive(Arbitrary, Debug)]
enum Op {
    Write { reserve: u8, data: Vec<u8>, commit: u8 },
    Consume(u8),
    Clear,
}

#[derive(Arbitrary, Debug)]
struct FuzzBuffer {
    segment_size: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: FuzzBuffer| {
    let Ok(mut buf) = ChainedBuffer::with_segment_size(usize::from(input.segment_size)) else {
        assert_eq!(input.segment_size, 0);
        return;
    };
    let mut model: VecDeque<u8> = VecDeque::new();

    for op in input.ops.iter().take(256) {
        match op {
            Op::Write {
                reserve,
                data,
                commit,
            } => {
                let reserve = usize::from(*reserve);
                let written = buf.prepare(reserve).copy_from_slice(data);
                assert_eq!(written, data.len().min(reserve));
                let committed = usize::from(*commit).min(written);
                buf.commit(committed);
                model.extend(&data[..committed]);
            }
            Op::Consume(n) => {
                let n = usize::from(*n);
                buf.consume(n);
                model.drain(..n.min(model.len()));
            }
            Op::Clear => {
                buf.clear();
                model.clear();
            }
        }
        assert_eq!(buf.len(), model.len());
        assert!(buf.capacity() >= buf.len());
        assert_eq!(buf.data().to_vec(), model.iter().copied().collect::<Vec<u8>>());
    }
});
