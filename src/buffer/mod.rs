//! セグメント連結バッファ
//!
//! 固定長セグメントのリストを 1 本の読み書き可能なバイトストリームとして扱う。
//!
//! ```text
//!  segments[0]          segments[1]          segments[2]
//! +--------------------+--------------------+--------------------+
//! | consumed | readable ... readable | prepared ... | (予約済み未使用) |
//! +--------------------+--------------------+--------------------+
//!            ^ in_pos                ^ (out, out_pos)
//! ```
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_parser::ChainedBuffer;
//!
//! let mut buf = ChainedBuffer::new();
//! let written = buf.prepare(5).copy_from_slice(b"hello");
//! buf.commit(written);
//! assert_eq!(buf.data().to_vec(), b"hello");
//!
//! buf.consume(2);
//! assert_eq!(buf.data().to_vec(), b"llo");
//! ```

mod segment;
mod view;

use std::collections::VecDeque;
use std::io::IoSlice;

use tracing::{debug, trace};

use crate::error::Error;
use crate::limits::BufferConfig;

use segment::Segment;

pub use view::{Data, Prepared};

/// セグメント連結バッファ
///
/// - 読み取り可能領域: `commit()` 済みで `consume()` されていないバイト列
/// - 書き込み予約領域: `prepare()` で予約され、まだ `commit()` されていないバイト列
///
/// `data()` / `prepare()` が返すビューはバッファを借用するため、
/// 次の変更操作の前に必ず破棄される。
#[derive(Debug)]
pub struct ChainedBuffer {
    segments: VecDeque<Segment>,
    config: BufferConfig,
    /// 先頭セグメント内の読み取り開始位置
    in_pos: usize,
    /// 読み取り可能なバイト数
    in_size: usize,
    /// 書き込み位置のセグメント番号 (`segments.len()` なら末尾)
    out: usize,
    /// 書き込み位置のセグメント内オフセット
    out_pos: usize,
    /// 直近の `prepare()` で予約されたバイト数
    out_size: usize,
}

impl Default for ChainedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ChainedBuffer {
    /// 読み取り可能なバイト列のみを複製する
    fn clone(&self) -> Self {
        let mut buf = Self {
            segments: VecDeque::new(),
            config: self.config.clone(),
            in_pos: 0,
            in_size: 0,
            out: 0,
            out_pos: 0,
            out_size: 0,
        };
        for chunk in self.data() {
            buf.extend_from_slice(chunk);
        }
        buf
    }
}

impl ChainedBuffer {
    /// デフォルト設定でバッファを作成
    pub fn new() -> Self {
        Self {
            segments: VecDeque::new(),
            config: BufferConfig::default(),
            in_pos: 0,
            in_size: 0,
            out: 0,
            out_pos: 0,
            out_size: 0,
        }
    }

    /// 設定を指定してバッファを作成
    ///
    /// `segment_size` が 0 の場合はエラー
    pub fn with_config(config: BufferConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// セグメントサイズを指定してバッファを作成
    pub fn with_segment_size(segment_size: usize) -> Result<Self, Error> {
        Self::with_config(BufferConfig::with_segment_size(segment_size))
    }

    /// 新規セグメントの最小サイズ
    pub fn segment_size(&self) -> usize {
        self.config.segment_size
    }

    /// 確保済みセグメント数
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// 読み取り可能なバイト数
    pub fn len(&self) -> usize {
        self.in_size
    }

    pub fn is_empty(&self) -> bool {
        self.in_size == 0
    }

    /// 読み取り可能なバイト数 + 確保済みで未使用の書き込み領域
    pub fn capacity(&self) -> usize {
        self.in_size + self.writable_capacity()
    }

    fn writable_capacity(&self) -> usize {
        let total: usize = self.segments.iter().skip(self.out).map(Segment::len).sum();
        total - self.out_pos
    }

    /// 読み取り可能領域のビューを返す
    pub fn data(&self) -> Data<'_> {
        Data::new(self.segments.iter(), self.in_pos, self.in_size)
    }

    /// 少なくとも `n` バイトの書き込み領域を予約する
    ///
    /// 既に確保済みのセグメントを再利用し、不足分のみ新しいセグメントを確保する。
    /// 新しいセグメントのサイズは `max(segment_size, 不足分)`。
    /// 再度呼び出すと予約サイズは置き換えられるが、確保済みセグメントは解放しない。
    pub fn prepare(&mut self, n: usize) -> Prepared<'_> {
        let writable = self.writable_capacity();
        if writable < n {
            let size = self.config.segment_size.max(n - writable);
            self.segments.push_back(Segment::new(size));
            debug!(
                size,
                segments = self.segments.len(),
                "chained buffer segment allocated"
            );
        }
        self.out_size = n;

        let out = self.out;
        let out_pos = self.out_pos;
        Prepared::new(self.segments.range_mut(out..), out_pos, n)
    }

    /// 書き込み予約領域の先頭 `n` バイトを読み取り可能領域に移す
    ///
    /// `n` は直近の `prepare()` で予約したサイズに切り詰められる。
    pub fn commit(&mut self, n: usize) {
        let mut n = n.min(self.out_size);
        self.out_size -= n;
        self.in_size += n;
        while n > 0 {
            let avail = self.segments[self.out].len() - self.out_pos;
            if n < avail {
                self.out_pos += n;
                n = 0;
            } else {
                n -= avail;
                self.out += 1;
                self.out_pos = 0;
            }
        }
    }

    /// 読み取り可能領域の先頭 `n` バイトを破棄する
    ///
    /// 読み終えたセグメントは解放する。ただし最後の 1 つは空にして再利用する。
    pub fn consume(&mut self, n: usize) {
        let mut n = n.min(self.in_size);
        while n > 0 {
            if self.out == 0 {
                // 読み取り領域は先頭セグメント内で完結している
                self.in_pos += n;
                self.in_size -= n;
                n = 0;
                continue;
            }

            let avail = self.segments[0].len() - self.in_pos;
            if n < avail {
                self.in_pos += n;
                self.in_size -= n;
                n = 0;
            } else {
                n -= avail;
                self.in_size -= avail;
                if self.segments.len() == 1 {
                    self.in_pos = 0;
                    self.out = 0;
                    self.out_pos = 0;
                    trace!("chained buffer segment recycled");
                } else {
                    self.segments.pop_front();
                    self.out -= 1;
                    self.in_pos = 0;
                }
            }
        }

        if self.in_size == 0 && self.out == 0 && self.out_size == 0 {
            self.in_pos = 0;
            self.out_pos = 0;
        }
    }

    /// `data` を書き込み領域にコピーして commit する
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        let written = self.prepare(data.len()).copy_from_slice(data);
        self.commit(written);
    }

    /// すべてのセグメントを解放する
    pub fn clear(&mut self) {
        self.segments.clear();
        self.in_pos = 0;
        self.in_size = 0;
        self.out = 0;
        self.out_pos = 0;
        self.out_size = 0;
    }
}

impl bytes::Buf for ChainedBuffer {
    fn remaining(&self) -> usize {
        self.in_size
    }

    fn chunk(&self) -> &[u8] {
        self.data().next().unwrap_or_default()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.in_size,
            "cannot advance past remaining: {} > {}",
            cnt,
            self.in_size
        );
        self.consume(cnt);
    }

    fn chunks_vectored<'a>(&'a self, dst: &mut [IoSlice<'a>]) -> usize {
        let mut n = 0;
        for (slot, chunk) in dst.iter_mut().zip(self.data()) {
            *slot = IoSlice::new(chunk);
            n += 1;
        }
        n
    }
}
