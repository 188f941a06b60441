//! ヘッダートークンの部分一致テーブル
//!
//! 入力がどこで分割されても途中から照合を再開できるよう、
//! 候補の集合をビットマスクで、照合済みの文字数をカウンタで保持する。
//! 候補がなくなった時点で一致なしとして扱い、再走査はしない。

/// 特別扱いするヘッダー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Other,
    Connection,
    ContentLength,
    TransferEncoding,
    Upgrade,
}

pub(crate) const FIELD_TOKENS: &[(&[u8], FieldKind)] = &[
    (b"connection", FieldKind::Connection),
    (b"proxy-connection", FieldKind::Connection),
    (b"content-length", FieldKind::ContentLength),
    (b"transfer-encoding", FieldKind::TransferEncoding),
    (b"upgrade", FieldKind::Upgrade),
];

/// Connection ヘッダーの値として意味を持つトークン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionToken {
    Close,
    KeepAlive,
    Upgrade,
}

pub(crate) const CONNECTION_TOKENS: &[(&[u8], ConnectionToken)] = &[
    (b"close", ConnectionToken::Close),
    (b"keep-alive", ConnectionToken::KeepAlive),
    (b"upgrade", ConnectionToken::Upgrade),
];

/// Transfer-Encoding の要素として意味を持つトークン
pub(crate) const TRANSFER_CODINGS: &[(&[u8], ())] = &[(b"chunked", ())];

/// 大文字小文字を区別しない前方一致の途中状態
///
/// テーブルは小文字で書かれている前提。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenMatch {
    candidates: u32,
    matched: usize,
}

impl TokenMatch {
    pub(crate) fn new<T>(table: &[(&[u8], T)]) -> Self {
        debug_assert!(table.len() < 32);
        Self {
            candidates: (1u32 << table.len()) - 1,
            matched: 0,
        }
    }

    /// 1 文字進める
    pub(crate) fn push<T>(&mut self, table: &[(&[u8], T)], b: u8) {
        if self.candidates == 0 {
            return;
        }
        let lower = b.to_ascii_lowercase();
        for (i, (name, _)) in table.iter().enumerate() {
            let bit = 1u32 << i;
            if self.candidates & bit != 0 && name.get(self.matched) != Some(&lower) {
                self.candidates &= !bit;
            }
        }
        self.matched += 1;
    }

    /// 1 文字列進める
    pub(crate) fn extend<T>(&mut self, table: &[(&[u8], T)], bytes: &[u8]) {
        for &b in bytes {
            if self.candidates == 0 {
                break;
            }
            self.push(table, b);
        }
    }

    /// これ以上一致する可能性がない
    pub(crate) fn is_mismatch(&self) -> bool {
        self.candidates == 0
    }

    /// 現在の位置で完全一致しているトークン
    pub(crate) fn finish<T: Copy>(&self, table: &[(&[u8], T)]) -> Option<T> {
        table
            .iter()
            .enumerate()
            .find(|(i, (name, _))| self.candidates & (1u32 << i) != 0 && name.len() == self.matched)
            .map(|(_, (_, value))| *value)
    }
}
