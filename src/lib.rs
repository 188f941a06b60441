//! # shiguredo_http11_parser
//!
//! インクリメンタル HTTP/1.x パーサーとセグメント連結バッファ (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **分割耐性**: 入力を任意の位置で分割しても同じイベント列になる
//! - **ゼロコピー**: ボディはバッファを借用したまま `Handler` に渡す
//!
//! ## 使い方
//!
//! ### 受信データをバッファに溜めて解析する
//!
//! ```rust
//! use shiguredo_http11_parser::{ChainedBuffer, Collector, Parser};
//!
//! let mut buf = ChainedBuffer::new();
//! let mut parser = Parser::response();
//! let mut message = Collector::new();
//!
//! // ソケットから読んだデータを prepare() した領域に書き込み commit() する
//! for received in [&b"HTTP/1.1 200 OK\r\nTransfer-"[..], b"Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n"] {
//!     let n = buf.prepare(received.len()).copy_from_slice(received);
//!     buf.commit(n);
//!     parser.write_from(&mut message, &mut buf).unwrap();
//! }
//!
//! assert!(parser.complete());
//! assert_eq!(parser.status_code(), 200);
//! assert_eq!(message.reason, b"OK");
//! assert_eq!(message.body, b"abc");
//! assert!(buf.is_empty());
//! ```
//!
//! ### コールバックを直接受け取る
//!
//! ```rust
//! use shiguredo_http11_parser::{Error, Handler, Parser};
//!
//! #[derive(Default)]
//! struct BodyLen(usize);
//!
//! impl Handler for BodyLen {
//!     fn on_body(&mut self, data: &[u8]) -> Result<(), Error> {
//!         self.0 += data.len();
//!         Ok(())
//!     }
//! }
//!
//! let mut parser = Parser::request();
//! let mut handler = BodyLen::default();
//! parser
//!     .write(&mut handler, b"PUT /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nxyz")
//!     .unwrap();
//! assert!(parser.complete());
//! assert_eq!(handler.0, 3);
//! ```

mod buffer;
mod error;
mod limits;
mod parser;

pub use buffer::{ChainedBuffer, Data, Prepared};
pub use error::Error;
pub use limits::{BufferConfig, ParserLimits};
pub use parser::{BodyKind, BodyWhat, Collector, Flags, Handler, MessageKind, Parser};
