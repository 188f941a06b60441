use crate::error::Error;

/// パーサーの制限設定
///
/// `reset()` 後も保持される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserLimits {
    /// スタートライン + ヘッダー (トレーラーを含む) の最大バイト数 (デフォルト: 16KB)
    pub header_max_size: usize,
    /// 最大ボディサイズ (リクエスト: 4MB、レスポンス: 制限なし)
    pub body_max_size: u64,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self::request()
    }
}

impl ParserLimits {
    /// リクエスト用のデフォルト設定
    pub fn request() -> Self {
        Self {
            header_max_size: 16 * 1024,     // 16KB
            body_max_size: 4 * 1024 * 1024, // 4MB
        }
    }

    /// レスポンス用のデフォルト設定
    pub fn response() -> Self {
        Self {
            header_max_size: 16 * 1024, // 16KB
            body_max_size: u64::MAX,
        }
    }

    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            header_max_size: usize::MAX,
            body_max_size: u64::MAX,
        }
    }
}

/// `ChainedBuffer` の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// 新しいセグメントを確保するときの最小サイズ (デフォルト: 512 バイト)
    pub segment_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { segment_size: 512 }
    }
}

impl BufferConfig {
    /// セグメントサイズを指定して作成
    pub fn with_segment_size(segment_size: usize) -> Self {
        Self { segment_size }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.segment_size == 0 {
            return Err(Error::InvalidConfiguration(
                "segment_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
