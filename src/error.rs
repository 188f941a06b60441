use std::fmt;

/// パース / バッファ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// メソッドが不正
    BadMethod,
    /// リクエストターゲットが不正
    BadUri,
    /// HTTP バージョンが不正
    BadVersion,
    /// ステータスコードが不正
    BadStatusCode,
    /// reason-phrase が不正
    BadReason,
    /// ヘッダー名が不正
    BadField,
    /// ヘッダー値が不正
    BadValue,
    /// CRLF が不正
    BadCrlf,
    /// ヘッダーサイズ超過
    HeaderTooBig { limit: usize },
    /// ボディサイズ超過
    BodyTooBig { limit: u64 },
    /// Content-Length が不正 (重複、オーバーフローを含む)
    BadContentLength,
    /// Transfer-Encoding: chunked と Content-Length が同時に指定された
    ///
    /// RFC 7230 Section 3.3.3: どちらのフレーミングを使うべきか判断できない
    IllegalContentLength,
    /// チャンクサイズが不正
    InvalidChunkSize,
    /// チャンク拡張の名前が不正
    InvalidExtName,
    /// チャンク拡張の値が不正
    InvalidExtVal,
    /// 既に閉じたパーサーへの書き込み
    ConnectionClosed,
    /// メッセージ途中での EOF
    ShortRead,
    /// 不正な設定
    InvalidConfiguration(String),
    /// ハンドラーが中断を要求した
    Callback(String),
}

impl Error {
    /// パース文法違反かどうか
    pub fn is_parse_error(&self) -> bool {
        !matches!(
            self,
            Error::ConnectionClosed | Error::InvalidConfiguration(_) | Error::Callback(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMethod => write!(f, "bad method"),
            Error::BadUri => write!(f, "bad request-target"),
            Error::BadVersion => write!(f, "bad HTTP version"),
            Error::BadStatusCode => write!(f, "bad status code"),
            Error::BadReason => write!(f, "bad reason-phrase"),
            Error::BadField => write!(f, "bad header field name"),
            Error::BadValue => write!(f, "bad header field value"),
            Error::BadCrlf => write!(f, "bad CRLF"),
            Error::HeaderTooBig { limit } => write!(f, "header too big: limit {}", limit),
            Error::BodyTooBig { limit } => write!(f, "body too big: limit {}", limit),
            Error::BadContentLength => write!(f, "bad Content-Length"),
            Error::IllegalContentLength => write!(
                f,
                "illegal Content-Length with Transfer-Encoding: chunked (RFC 7230 Section 3.3.3)"
            ),
            Error::InvalidChunkSize => write!(f, "invalid chunk size"),
            Error::InvalidExtName => write!(f, "invalid chunk extension name"),
            Error::InvalidExtVal => write!(f, "invalid chunk extension value"),
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::ShortRead => write!(f, "short read"),
            Error::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Callback(msg) => write!(f, "callback error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
