//! 読み取り / 書き込みビュー
//!
//! どちらも `ChainedBuffer` を借用するため、次の変更操作より長く生存できない。

use std::collections::vec_deque;

use super::segment::Segment;

/// 読み取り可能領域のビュー
///
/// 複数セグメントにまたがる場合は複数のスライスを返す。
#[derive(Clone)]
pub struct Data<'a> {
    iter: vec_deque::Iter<'a, Segment>,
    offset: usize,
    remaining: usize,
}

impl<'a> Data<'a> {
    pub(crate) fn new(iter: vec_deque::Iter<'a, Segment>, offset: usize, len: usize) -> Self {
        Self {
            iter,
            offset,
            remaining: len,
        }
    }

    /// 残りのバイト数
    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// 連続したバイト列にコピー
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.remaining);
        for chunk in self.clone() {
            out.extend_from_slice(chunk);
        }
        out
    }
}

impl<'a> Iterator for Data<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let segment = self.iter.next()?;
            let start = std::mem::take(&mut self.offset);
            let end = segment.len().min(start + self.remaining);
            if start == end {
                continue;
            }
            self.remaining -= end - start;
            return Some(&segment.as_slice()[start..end]);
        }
        None
    }
}

impl std::fmt::Debug for Data<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data").field("len", &self.remaining).finish()
    }
}

/// 書き込み予約領域のビュー
pub struct Prepared<'a> {
    iter: vec_deque::IterMut<'a, Segment>,
    offset: usize,
    remaining: usize,
}

impl<'a> Prepared<'a> {
    pub(crate) fn new(iter: vec_deque::IterMut<'a, Segment>, offset: usize, len: usize) -> Self {
        Self {
            iter,
            offset,
            remaining: len,
        }
    }

    /// 残りのバイト数
    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// `src` を先頭から書き込み、書き込んだバイト数を返す
    ///
    /// 予約領域より長い部分は書き込まれない。
    pub fn copy_from_slice(self, mut src: &[u8]) -> usize {
        let mut written = 0;
        for chunk in self {
            if src.is_empty() {
                break;
            }
            let n = chunk.len().min(src.len());
            chunk[..n].copy_from_slice(&src[..n]);
            src = &src[n..];
            written += n;
        }
        written
    }
}

impl<'a> Iterator for Prepared<'a> {
    type Item = &'a mut [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let segment = self.iter.next()?;
            let start = std::mem::take(&mut self.offset);
            let end = segment.len().min(start + self.remaining);
            if start == end {
                continue;
            }
            self.remaining -= end - start;
            return Some(&mut segment.as_mut_slice()[start..end]);
        }
        None
    }
}

impl std::fmt::Debug for Prepared<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prepared")
            .field("len", &self.remaining)
            .finish()
    }
}
