//! パーサーの状態

use super::token::TokenMatch;

/// メイン状態
///
/// RFC 7230 の文法要素の境界ごとに 1 つの状態を持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// 最初のメッセージの開始待ち
    Start,

    // request-line
    MethodStart,
    Method,
    UriStart,
    Uri,
    /// "HTTP/" の何文字目まで一致したか (request-line)
    ReqVersion(u8),
    ReqMajor,
    ReqDot,
    ReqMinor,
    ReqCr,
    ReqLf,

    // status-line
    /// "HTTP/" の何文字目まで一致したか (status-line)
    ResVersion(u8),
    ResMajor,
    ResDot,
    ResMinor,
    ResSp,
    /// 読んだステータスコードの桁数
    Status(u8),
    Reason,
    ResLf,

    // header-field (トレーラーでも使う)
    FieldStart,
    Field,
    /// 値の前の OWS
    ValueStart,
    Value,
    ValueLf,
    /// 値の CRLF の直後 (obs-fold かどうか判定する)
    ValueFold,
    /// 空行の CR の直後
    HeadersLf,

    // body
    BodyIdentity,
    BodyEof,

    // chunked body
    ChunkSizeStart,
    ChunkSize,
    /// チャンクサイズの後の OWS / ';' / CR
    ChunkSizeEnd,
    ChunkExtNameStart,
    ChunkExtName,
    /// 拡張名の後の OWS
    ChunkExtNameEnd,
    /// '=' の後 (OWS を読み飛ばす)
    ChunkExtValStart,
    ChunkExtValToken,
    ChunkExtValQuoted,
    ChunkExtValQuotedPair,
    /// quoted-string の閉じ引用符の直後
    ChunkExtValEnd,
    ChunkSizeLf,
    ChunkData,
    ChunkDataCr,
    ChunkDataLf,

    /// メッセージ完了 (keep-alive、次のバイトで新しいメッセージを開始)
    Restart,
    /// メッセージ完了 (接続は再利用できない)
    Done,
    /// エラーで停止した
    Closed,
}

impl State {
    /// スタートライン、ヘッダー、トレーラーのバイトとして数える状態か確認
    pub(crate) fn counts_as_header(self) -> bool {
        matches!(
            self,
            State::MethodStart
                | State::Method
                | State::UriStart
                | State::Uri
                | State::ReqVersion(_)
                | State::ReqMajor
                | State::ReqDot
                | State::ReqMinor
                | State::ReqCr
                | State::ReqLf
                | State::ResVersion(_)
                | State::ResMajor
                | State::ResDot
                | State::ResMinor
                | State::ResSp
                | State::Status(_)
                | State::Reason
                | State::ResLf
                | State::FieldStart
                | State::Field
                | State::ValueStart
                | State::Value
                | State::ValueLf
                | State::ValueFold
                | State::HeadersLf
        )
    }
}

/// Connection ヘッダー値 (トークンのカンマ区切りリスト) の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListState {
    ElementStart,
    Token(TokenMatch),
    AfterToken,
}

/// Transfer-Encoding の要素の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodingState {
    /// 要素の開始 (空要素を含む)
    Empty,
    Token(TokenMatch),
    /// トークンの後の OWS (true なら chunked)
    Trailing(bool),
    /// chunked 以外
    Other,
}

/// Content-Length ヘッダー値の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LengthState {
    Empty,
    Digits,
    Trailing,
}
