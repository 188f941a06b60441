use std::ops::{BitOr, BitOrAssign};

/// メッセージの解析中に確定したフラグ
///
/// それぞれのビットは独立に設定される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u16);

impl Flags {
    /// Transfer-Encoding の最後の要素が chunked
    pub const CHUNKED: Flags = Flags(1 << 0);
    /// Content-Length ヘッダーがある
    pub const CONTENT_LENGTH: Flags = Flags(1 << 1);
    /// Connection: close
    pub const CONNECTION_CLOSE: Flags = Flags(1 << 2);
    /// Connection: keep-alive
    pub const CONNECTION_KEEP_ALIVE: Flags = Flags(1 << 3);
    /// Connection: upgrade
    pub const CONNECTION_UPGRADE: Flags = Flags(1 << 4);
    /// Upgrade ヘッダーがある
    pub const UPGRADE: Flags = Flags(1 << 5);
    /// ハンドラーがボディの読み飛ばしを指示した
    pub const SKIP_BODY: Flags = Flags(1 << 6);
    /// 最後のチャンクを受信した (トレーラー解析中または完了)
    pub const TRAILING: Flags = Flags(1 << 7);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `other` のビットがすべて立っているか確認
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub(crate) fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub(crate) fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}
