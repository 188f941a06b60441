//! インクリメンタル HTTP/1.x パーサー
//!
//! 入力を 1 バイトずつ状態遷移させるため、任意の位置で分割されたバイト列を
//! そのまま渡せる。解析結果は `Handler` のコールバックとして通知される。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_parser::{Collector, Parser};
//!
//! let mut parser = Parser::request();
//! let mut message = Collector::new();
//!
//! let input = b"POST /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET";
//! let n = parser.write(&mut message, input).unwrap();
//!
//! // メッセージの終端で停止し、続くバイト列は消費しない
//! assert_eq!(n, input.len() - 3);
//! assert!(parser.complete());
//! assert!(parser.keep_alive());
//! assert_eq!(message.method, b"POST");
//! assert_eq!(message.header("content-length"), Some(&b"5"[..]));
//! assert_eq!(message.body, b"hello");
//! ```

mod chars;
mod flags;
mod handler;
mod state;
mod token;

use tracing::{debug, trace};

use crate::buffer::ChainedBuffer;
use crate::error::Error;
use crate::limits::ParserLimits;

use chars::{
    hex_value, is_field_content, is_ows, is_qdtext, is_quoted_pair_char, is_reason_char,
    is_tchar, is_uri_char,
};
use state::{CodingState, LengthState, ListState, State};
use token::{
    CONNECTION_TOKENS, ConnectionToken, FIELD_TOKENS, FieldKind, TRANSFER_CODINGS, TokenMatch,
};

pub use flags::Flags;
pub use handler::{BodyWhat, Collector, Handler};

const HTTP_PREFIX: &[u8; 5] = b"HTTP/";

/// 解析するメッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// ボディの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Content-Length で指定された固定長
    ContentLength(u64),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまでがボディ (close-delimited)
    ///
    /// RFC 7230 Section 3.3.3: レスポンスで Transfer-Encoding も Content-Length もない場合、
    /// 接続が閉じられるまでをボディとして扱う
    CloseDelimited,
    /// ボディなし
    None,
}

/// HTTP/1.x メッセージパーサー
///
/// 1 接続につき 1 つ作成し、keep-alive の間は同じインスタンスで
/// 後続のメッセージを解析する。
#[derive(Debug, Clone)]
pub struct Parser {
    kind: MessageKind,
    limits: ParserLimits,
    state: State,
    flags: Flags,
    http_major: u8,
    http_minor: u8,
    status_code: u16,
    /// Content-Length の値 (`Flags::CONTENT_LENGTH` が立っている場合のみ有効)
    content_length: u64,
    /// 固定長ボディ / チャンクの残りバイト数 (チャンクサイズ行の解析中は途中の値)
    remaining: u64,
    body_kind: Option<BodyKind>,
    header_size: usize,
    body_size: u64,

    // 解析中のヘッダー
    field_kind: FieldKind,
    field_match: TokenMatch,
    list: ListState,
    coding: CodingState,
    length: LengthState,
    length_value: u64,
    /// 値の末尾かもしれない OWS
    value_ws: Vec<u8>,
    /// reason-phrase / 値のコールバックを 1 回以上呼んだ
    piece_emitted: bool,

    paused: bool,
    error_offset: Option<usize>,
}

impl Parser {
    /// パーサーを作成
    pub fn new(kind: MessageKind, limits: ParserLimits) -> Self {
        Self {
            kind,
            limits,
            state: State::Start,
            flags: Flags::empty(),
            http_major: 0,
            http_minor: 0,
            status_code: 0,
            content_length: 0,
            remaining: 0,
            body_kind: None,
            header_size: 0,
            body_size: 0,
            field_kind: FieldKind::Other,
            field_match: TokenMatch::new(FIELD_TOKENS),
            list: ListState::ElementStart,
            coding: CodingState::Empty,
            length: LengthState::Empty,
            length_value: 0,
            value_ws: Vec::new(),
            piece_emitted: false,
            paused: false,
            error_offset: None,
        }
    }

    /// リクエスト用のデフォルト制限でパーサーを作成
    pub fn request() -> Self {
        Self::new(MessageKind::Request, ParserLimits::request())
    }

    /// レスポンス用のデフォルト制限でパーサーを作成
    pub fn response() -> Self {
        Self::new(MessageKind::Response, ParserLimits::response())
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_request(&self) -> bool {
        self.kind == MessageKind::Request
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// 制限設定を変更
    ///
    /// 解析中のメッセージにも以降のバイトから適用される。
    pub fn set_limits(&mut self, limits: ParserLimits) {
        self.limits = limits;
    }

    /// 初期状態に戻す
    ///
    /// 制限設定以外のメッセージごとの状態はすべて破棄される。
    pub fn reset(&mut self) {
        self.reset_message();
        self.state = State::Start;
        self.paused = false;
        self.error_offset = None;
    }

    fn reset_message(&mut self) {
        self.flags = Flags::empty();
        self.http_major = 0;
        self.http_minor = 0;
        self.status_code = 0;
        self.content_length = 0;
        self.remaining = 0;
        self.body_kind = None;
        self.header_size = 0;
        self.body_size = 0;
        self.field_kind = FieldKind::Other;
        self.field_match = TokenMatch::new(FIELD_TOKENS);
        self.list = ListState::ElementStart;
        self.coding = CodingState::Empty;
        self.length = LengthState::Empty;
        self.length_value = 0;
        self.value_ws.clear();
        self.piece_emitted = false;
    }

    pub fn http_major(&self) -> u8 {
        self.http_major
    }

    pub fn http_minor(&self) -> u8 {
        self.http_minor
    }

    /// ステータスコード (リクエストの場合は 0)
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Content-Length ヘッダーの値
    pub fn content_length(&self) -> Option<u64> {
        self.flags
            .contains(Flags::CONTENT_LENGTH)
            .then_some(self.content_length)
    }

    /// ヘッダー解析後に決まったボディの種類
    pub fn body_kind(&self) -> Option<BodyKind> {
        self.body_kind
    }

    pub fn chunked(&self) -> bool {
        self.flags.contains(Flags::CHUNKED)
    }

    /// Upgrade ヘッダーと Connection: upgrade の両方がある
    pub fn upgrade(&self) -> bool {
        self.flags
            .contains(Flags::UPGRADE | Flags::CONNECTION_UPGRADE)
    }

    /// ボディの終端が接続の終了で決まる
    pub fn needs_eof(&self) -> bool {
        self.body_kind == Some(BodyKind::CloseDelimited)
    }

    /// 接続を再利用できるか確認
    ///
    /// - Connection: close があれば false
    /// - close-delimited なら false
    /// - HTTP/1.1 以上なら true
    /// - HTTP/1.0 は Connection: keep-alive がある場合のみ true
    pub fn keep_alive(&self) -> bool {
        if self.flags.contains(Flags::CONNECTION_CLOSE) || self.needs_eof() {
            return false;
        }
        if (self.http_major, self.http_minor) >= (1, 1) {
            true
        } else {
            self.flags.contains(Flags::CONNECTION_KEEP_ALIVE)
        }
    }

    /// メッセージが完了した、またはヘッダーの直後で一時停止している
    pub fn complete(&self) -> bool {
        matches!(self.state, State::Restart | State::Done) || self.paused
    }

    /// ヘッダーの直後で一時停止している
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// 一時停止を解除する
    ///
    /// 次の `write` からボディの解析を再開する。
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// エラーで停止している
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// 直近の `write` / `write_buffers` が失敗した位置
    pub fn error_offset(&self) -> Option<usize> {
        self.error_offset
    }

    /// バイト列を解析し、消費したバイト数を返す
    ///
    /// メッセージが完了した時点で停止し、残りのバイト列は消費しない。
    /// 一時停止中は何も消費せずに 0 を返す。
    ///
    /// エラー (ハンドラーが返したものを含む) の場合パーサーは閉じた状態になり、
    /// 以降の `write` は `Error::ConnectionClosed` を返す。
    pub fn write<H: Handler + ?Sized>(&mut self, handler: &mut H, data: &[u8]) -> Result<usize, Error> {
        self.error_offset = None;
        if matches!(self.state, State::Done | State::Closed) {
            return Err(Error::ConnectionClosed);
        }
        if self.paused {
            return Ok(0);
        }

        let mut pos = 0;
        match self.run(handler, data, &mut pos) {
            Ok(()) => Ok(pos),
            Err(e) => Err(self.fail(e, pos)),
        }
    }

    /// 複数のバイト列を順に解析し、消費したバイト数の合計を返す
    ///
    /// `ChainedBuffer::data()` のような分散したバイト列をそのまま渡せる。
    /// メッセージが完了した時点で停止する。
    pub fn write_buffers<'a, H, I>(&mut self, handler: &mut H, buffers: I) -> Result<usize, Error>
    where
        H: Handler + ?Sized,
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut total = 0;
        for buf in buffers {
            match self.write(handler, buf) {
                Ok(n) => {
                    total += n;
                    if n < buf.len() || self.complete() {
                        break;
                    }
                }
                Err(e) => {
                    self.error_offset = self.error_offset.map(|offset| total + offset);
                    return Err(e);
                }
            }
        }
        Ok(total)
    }

    /// バッファの読み取り可能領域を解析し、消費したバイト数だけ `consume` する
    pub fn write_from<H: Handler + ?Sized>(
        &mut self,
        handler: &mut H,
        buffer: &mut ChainedBuffer,
    ) -> Result<usize, Error> {
        let n = self.write_buffers(handler, buffer.data())?;
        buffer.consume(n);
        Ok(n)
    }

    /// 入力の終端を通知する
    ///
    /// close-delimited ボディの解析中であればメッセージを完了する。
    /// メッセージの境界 (完了後、または次のメッセージの開始前) では何もしない。
    /// それ以外の位置では `Error::ShortRead` になる。
    pub fn write_eof<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), Error> {
        self.error_offset = None;
        match self.state {
            State::BodyEof => {
                self.paused = false;
                if let Err(e) = handler.on_complete() {
                    return Err(self.fail(e, 0));
                }
                trace!(body_size = self.body_size, "http message complete at eof");
                self.state = State::Done;
                Ok(())
            }
            State::Restart | State::Done => {
                self.state = State::Done;
                Ok(())
            }
            State::Closed => Err(Error::ConnectionClosed),
            _ => Err(self.fail(Error::ShortRead, 0)),
        }
    }

    fn fail(&mut self, error: Error, offset: usize) -> Error {
        debug!(
            error = %error,
            offset,
            state = ?self.state,
            kind = ?self.kind,
            "http message parse failed"
        );
        self.state = State::Closed;
        self.paused = false;
        self.error_offset = Some(offset);
        error
    }

    /// `n` バイト進める
    ///
    /// スタートライン / ヘッダー / トレーラーの状態ではヘッダーサイズとして数える。
    fn advance(&mut self, pos: &mut usize, n: usize) -> Result<(), Error> {
        if self.counts_as_header() {
            let room = self.header_room();
            if n > room {
                *pos += room;
                self.header_size = self.limits.header_max_size;
                return Err(Error::HeaderTooBig {
                    limit: self.limits.header_max_size,
                });
            }
            self.header_size += n;
        }
        *pos += n;
        Ok(())
    }

    /// 現在の状態のバイトをヘッダーサイズとして数えるか確認
    ///
    /// トレーラー部を閉じる空行は数えない。
    fn counts_as_header(&self) -> bool {
        match self.state {
            State::HeadersLf => !self.flags.contains(Flags::TRAILING),
            state => state.counts_as_header(),
        }
    }

    /// `b` がトレーラー部を閉じる空行の CR か確認
    fn ends_trailers(&self, b: u8) -> bool {
        self.state == State::FieldStart && b == b'\r' && self.flags.contains(Flags::TRAILING)
    }

    fn header_room(&self) -> usize {
        self.limits.header_max_size.saturating_sub(self.header_size)
    }

    /// `pred` を満たすバイトの連続の長さ (ヘッダーサイズの残りで切り詰める)
    fn header_run(&self, data: &[u8], pos: usize, pred: fn(u8) -> bool) -> usize {
        let avail = &data[pos..];
        let limit = avail.len().min(self.header_room());
        avail[..limit]
            .iter()
            .position(|&b| !pred(b))
            .unwrap_or(limit)
    }

    fn run<H: Handler + ?Sized>(
        &mut self,
        h: &mut H,
        data: &[u8],
        pos: &mut usize,
    ) -> Result<(), Error> {
        while *pos < data.len() {
            let b = data[*pos];
            // ヘッダーの状態で受け取ったバイトはすべてヘッダーサイズに数える
            if self.counts_as_header() && !self.ends_trailers(b) && self.header_room() == 0 {
                return Err(Error::HeaderTooBig {
                    limit: self.limits.header_max_size,
                });
            }
            match self.state {
                State::Done | State::Closed => return Ok(()),
                State::Restart => {
                    self.reset_message();
                    self.state = State::Start;
                }
                State::Start => {
                    h.on_start()?;
                    self.state = match self.kind {
                        MessageKind::Request => State::MethodStart,
                        MessageKind::Response => State::ResVersion(0),
                    };
                }

                // request-line
                State::MethodStart => {
                    if !is_tchar(b) {
                        return Err(Error::BadMethod);
                    }
                    self.state = State::Method;
                }
                State::Method => {
                    let n = self.header_run(data, *pos, is_tchar);
                    if n > 0 {
                        let start = *pos;
                        self.advance(pos, n)?;
                        h.on_method(&data[start..*pos])?;
                        continue;
                    }
                    if b != b' ' {
                        return Err(Error::BadMethod);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::UriStart;
                }
                State::UriStart => {
                    if !is_uri_char(b) {
                        return Err(Error::BadUri);
                    }
                    self.state = State::Uri;
                }
                State::Uri => {
                    let n = self.header_run(data, *pos, is_uri_char);
                    if n > 0 {
                        let start = *pos;
                        self.advance(pos, n)?;
                        h.on_uri(&data[start..*pos])?;
                        continue;
                    }
                    if b != b' ' {
                        return Err(Error::BadUri);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ReqVersion(0);
                }
                State::ReqVersion(matched) => {
                    self.state = version_prefix(b, matched, State::ReqVersion, State::ReqMajor)?;
                    self.advance(pos, 1)?;
                }
                State::ReqMajor => {
                    self.http_major = version_digit(b)?;
                    self.advance(pos, 1)?;
                    self.state = State::ReqDot;
                }
                State::ReqDot => {
                    if b != b'.' {
                        return Err(Error::BadVersion);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ReqMinor;
                }
                State::ReqMinor => {
                    self.http_minor = version_digit(b)?;
                    self.advance(pos, 1)?;
                    self.state = State::ReqCr;
                }
                State::ReqCr => {
                    if b != b'\r' {
                        return Err(Error::BadVersion);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ReqLf;
                }
                State::ReqLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::FieldStart;
                    h.on_request()?;
                }

                // status-line
                State::ResVersion(matched) => {
                    self.state = version_prefix(b, matched, State::ResVersion, State::ResMajor)?;
                    self.advance(pos, 1)?;
                }
                State::ResMajor => {
                    self.http_major = version_digit(b)?;
                    self.advance(pos, 1)?;
                    self.state = State::ResDot;
                }
                State::ResDot => {
                    if b != b'.' {
                        return Err(Error::BadVersion);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ResMinor;
                }
                State::ResMinor => {
                    self.http_minor = version_digit(b)?;
                    self.advance(pos, 1)?;
                    self.state = State::ResSp;
                }
                State::ResSp => {
                    if b != b' ' {
                        return Err(Error::BadVersion);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::Status(0);
                }
                State::Status(digits) if digits < 3 => {
                    if !b.is_ascii_digit() {
                        return Err(Error::BadStatusCode);
                    }
                    self.advance(pos, 1)?;
                    self.status_code = self.status_code * 10 + u16::from(b - b'0');
                    self.state = State::Status(digits + 1);
                }
                State::Status(_) => {
                    if b != b' ' {
                        return Err(Error::BadStatusCode);
                    }
                    self.advance(pos, 1)?;
                    self.piece_emitted = false;
                    self.state = State::Reason;
                }
                State::Reason => {
                    let n = self.header_run(data, *pos, is_reason_char);
                    if n > 0 {
                        let start = *pos;
                        self.advance(pos, n)?;
                        self.piece_emitted = true;
                        h.on_reason(&data[start..*pos])?;
                        continue;
                    }
                    if b != b'\r' {
                        return Err(Error::BadReason);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ResLf;
                }
                State::ResLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::FieldStart;
                    if !self.piece_emitted {
                        h.on_reason(b"")?;
                    }
                    h.on_response()?;
                }

                // header-field
                State::FieldStart => {
                    if b == b'\r' {
                        self.state = State::HeadersLf;
                        self.advance(pos, 1)?;
                    } else if is_tchar(b) {
                        self.field_match = TokenMatch::new(FIELD_TOKENS);
                        self.state = State::Field;
                    } else {
                        return Err(Error::BadField);
                    }
                }
                State::Field => {
                    let n = self.header_run(data, *pos, is_tchar);
                    if n > 0 {
                        let start = *pos;
                        self.advance(pos, n)?;
                        let name = &data[start..*pos];
                        if !self.flags.contains(Flags::TRAILING) && !self.field_match.is_mismatch()
                        {
                            self.field_match.extend(FIELD_TOKENS, name);
                        }
                        h.on_field(name)?;
                        continue;
                    }
                    if b != b':' {
                        return Err(Error::BadField);
                    }
                    self.begin_value()?;
                    self.advance(pos, 1)?;
                    self.state = State::ValueStart;
                }
                State::ValueStart => {
                    if is_ows(b) {
                        self.advance(pos, 1)?;
                    } else if b == b'\r' {
                        self.advance(pos, 1)?;
                        self.state = State::ValueLf;
                    } else if is_field_content(b) {
                        self.state = State::Value;
                    } else {
                        return Err(Error::BadValue);
                    }
                }
                State::Value => {
                    let n = self.header_run(data, *pos, is_field_content);
                    if n > 0 {
                        let start = *pos;
                        let run = &data[start..start + n];
                        if let Err((i, e)) = self.value_bytes(run) {
                            *pos = start + i;
                            return Err(e);
                        }
                        self.advance(pos, n)?;
                        self.emit_value(h, run)?;
                        continue;
                    }
                    if b != b'\r' {
                        return Err(Error::BadValue);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ValueLf;
                }
                State::ValueLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ValueFold;
                }
                State::ValueFold => {
                    if is_ows(b) {
                        // obs-fold は SP 1 つとして扱う
                        self.value_byte(b' ')?;
                        self.advance(pos, 1)?;
                        if self.piece_emitted {
                            self.value_ws.clear();
                            self.value_ws.push(b' ');
                        }
                        self.state = State::ValueStart;
                    } else {
                        self.finish_value(h)?;
                        self.state = State::FieldStart;
                    }
                }
                State::HeadersLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    if self.flags.contains(Flags::TRAILING) {
                        self.complete_message(h)?;
                    } else {
                        self.headers_complete(h)?;
                    }
                }

                // body
                State::BodyIdentity => {
                    let start = *pos;
                    let n = self.body_run(data.len() - start);
                    self.advance(pos, n)?;
                    self.remaining -= n as u64;
                    self.body_size += n as u64;
                    h.on_body(&data[start..*pos])?;
                    if self.remaining == 0 {
                        self.complete_message(h)?;
                    }
                }
                State::BodyEof => {
                    let start = *pos;
                    let n = data.len() - start;
                    let room = self.body_room();
                    if n as u64 > room {
                        // room < n なので usize に収まる
                        *pos += room as usize;
                        return Err(Error::BodyTooBig {
                            limit: self.limits.body_max_size,
                        });
                    }
                    self.advance(pos, n)?;
                    self.body_size += n as u64;
                    h.on_body(&data[start..*pos])?;
                }

                // chunked body
                State::ChunkSizeStart => {
                    let v = hex_value(b).ok_or(Error::InvalidChunkSize)?;
                    self.advance(pos, 1)?;
                    self.remaining = u64::from(v);
                    self.state = State::ChunkSize;
                }
                State::ChunkSize => {
                    if let Some(v) = hex_value(b) {
                        self.remaining = self
                            .remaining
                            .checked_mul(16)
                            .and_then(|r| r.checked_add(u64::from(v)))
                            .ok_or(Error::BadContentLength)?;
                    } else {
                        self.state = match b {
                            b';' => State::ChunkExtNameStart,
                            b'\r' => State::ChunkSizeLf,
                            _ if is_ows(b) => State::ChunkSizeEnd,
                            _ => return Err(Error::InvalidChunkSize),
                        };
                    }
                    self.advance(pos, 1)?;
                }
                State::ChunkSizeEnd => {
                    self.state = match b {
                        b';' => State::ChunkExtNameStart,
                        b'\r' => State::ChunkSizeLf,
                        _ if is_ows(b) => State::ChunkSizeEnd,
                        _ => return Err(Error::InvalidChunkSize),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtNameStart => {
                    self.state = match b {
                        _ if is_ows(b) => State::ChunkExtNameStart,
                        _ if is_tchar(b) => State::ChunkExtName,
                        _ => return Err(Error::InvalidExtName),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtName => {
                    self.state = match b {
                        b'=' => State::ChunkExtValStart,
                        b';' => State::ChunkExtNameStart,
                        b'\r' => State::ChunkSizeLf,
                        _ if is_ows(b) => State::ChunkExtNameEnd,
                        _ if is_tchar(b) => State::ChunkExtName,
                        _ => return Err(Error::InvalidExtName),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtNameEnd => {
                    self.state = match b {
                        b'=' => State::ChunkExtValStart,
                        b';' => State::ChunkExtNameStart,
                        b'\r' => State::ChunkSizeLf,
                        _ if is_ows(b) => State::ChunkExtNameEnd,
                        _ => return Err(Error::InvalidExtName),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtValStart => {
                    self.state = match b {
                        _ if is_ows(b) => State::ChunkExtValStart,
                        b'"' => State::ChunkExtValQuoted,
                        _ if is_tchar(b) => State::ChunkExtValToken,
                        _ => return Err(Error::InvalidExtVal),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtValToken => {
                    self.state = match b {
                        b';' => State::ChunkExtNameStart,
                        b'\r' => State::ChunkSizeLf,
                        _ if is_ows(b) => State::ChunkSizeEnd,
                        _ if is_tchar(b) => State::ChunkExtValToken,
                        _ => return Err(Error::InvalidExtVal),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtValQuoted => {
                    self.state = match b {
                        b'"' => State::ChunkExtValEnd,
                        b'\\' => State::ChunkExtValQuotedPair,
                        _ if is_qdtext(b) => State::ChunkExtValQuoted,
                        _ => return Err(Error::InvalidExtVal),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkExtValQuotedPair => {
                    if !is_quoted_pair_char(b) {
                        return Err(Error::InvalidExtVal);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ChunkExtValQuoted;
                }
                State::ChunkExtValEnd => {
                    self.state = match b {
                        b';' => State::ChunkExtNameStart,
                        b'\r' => State::ChunkSizeLf,
                        _ if is_ows(b) => State::ChunkSizeEnd,
                        _ => return Err(Error::InvalidExtVal),
                    };
                    self.advance(pos, 1)?;
                }
                State::ChunkSizeLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    if self.remaining == 0 {
                        self.advance(pos, 1)?;
                        // 最後のチャンク、続いてトレーラー
                        self.flags.insert(Flags::TRAILING);
                        self.state = State::FieldStart;
                    } else {
                        if self.remaining > self.body_room() {
                            return Err(Error::BodyTooBig {
                                limit: self.limits.body_max_size,
                            });
                        }
                        self.advance(pos, 1)?;
                        self.state = State::ChunkData;
                    }
                }
                State::ChunkData => {
                    let start = *pos;
                    let n = self.body_run(data.len() - start);
                    self.advance(pos, n)?;
                    self.remaining -= n as u64;
                    self.body_size += n as u64;
                    h.on_body(&data[start..*pos])?;
                    if self.remaining == 0 {
                        self.state = State::ChunkDataCr;
                    }
                }
                State::ChunkDataCr => {
                    if b != b'\r' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ChunkDataLf;
                }
                State::ChunkDataLf => {
                    if b != b'\n' {
                        return Err(Error::BadCrlf);
                    }
                    self.advance(pos, 1)?;
                    self.state = State::ChunkSizeStart;
                }
            }

            if matches!(self.state, State::Restart | State::Done) || self.paused {
                return Ok(());
            }
        }
        Ok(())
    }

    fn body_room(&self) -> u64 {
        self.limits.body_max_size.saturating_sub(self.body_size)
    }

    /// 固定長ボディ / チャンクデータとして読める長さ
    fn body_run(&self, avail: usize) -> usize {
        usize::try_from(self.remaining).map_or(avail, |remaining| remaining.min(avail))
    }

    /// ':' の直後にヘッダーの種類を確定する
    fn begin_value(&mut self) -> Result<(), Error> {
        self.field_kind = if self.flags.contains(Flags::TRAILING) {
            FieldKind::Other
        } else {
            self.field_match
                .finish(FIELD_TOKENS)
                .unwrap_or(FieldKind::Other)
        };
        match self.field_kind {
            FieldKind::Connection => self.list = ListState::ElementStart,
            FieldKind::ContentLength => {
                if self.flags.contains(Flags::CONTENT_LENGTH) {
                    // 重複
                    return Err(Error::BadContentLength);
                }
                self.length = LengthState::Empty;
                self.length_value = 0;
            }
            FieldKind::TransferEncoding => self.coding = CodingState::Empty,
            FieldKind::Upgrade => self.flags.insert(Flags::UPGRADE),
            FieldKind::Other => {}
        }
        self.piece_emitted = false;
        self.value_ws.clear();
        Ok(())
    }

    fn value_bytes(&mut self, run: &[u8]) -> Result<(), (usize, Error)> {
        if matches!(self.field_kind, FieldKind::Other | FieldKind::Upgrade) {
            return Ok(());
        }
        for (i, &b) in run.iter().enumerate() {
            self.value_byte(b).map_err(|e| (i, e))?;
        }
        Ok(())
    }

    fn value_byte(&mut self, b: u8) -> Result<(), Error> {
        match self.field_kind {
            FieldKind::Other | FieldKind::Upgrade => Ok(()),
            FieldKind::Connection => self.connection_byte(b),
            FieldKind::ContentLength => self.length_byte(b),
            FieldKind::TransferEncoding => {
                self.coding_byte(b);
                Ok(())
            }
        }
    }

    /// 値の断片を通知する
    ///
    /// 末尾の OWS は次の断片が来るまで保留し、値の終端で捨てる。
    fn emit_value<H: Handler + ?Sized>(&mut self, h: &mut H, run: &[u8]) -> Result<(), Error> {
        match run.iter().rposition(|&b| !is_ows(b)) {
            Some(last) => {
                if !self.value_ws.is_empty() {
                    h.on_value(&self.value_ws)?;
                    self.value_ws.clear();
                }
                self.piece_emitted = true;
                h.on_value(&run[..=last])?;
                self.value_ws.extend_from_slice(&run[last + 1..]);
            }
            None => self.value_ws.extend_from_slice(run),
        }
        Ok(())
    }

    /// ヘッダー 1 行の終端
    fn finish_value<H: Handler + ?Sized>(&mut self, h: &mut H) -> Result<(), Error> {
        match self.field_kind {
            FieldKind::Connection => {
                if let ListState::Token(m) = self.list {
                    self.connection_token(m);
                }
            }
            FieldKind::ContentLength => {
                if self.length == LengthState::Empty {
                    return Err(Error::BadContentLength);
                }
                self.content_length = self.length_value;
                self.flags.insert(Flags::CONTENT_LENGTH);
            }
            FieldKind::TransferEncoding => self.finish_coding(),
            FieldKind::Upgrade | FieldKind::Other => {}
        }
        self.value_ws.clear();
        if !self.piece_emitted {
            h.on_value(b"")?;
        }
        Ok(())
    }

    fn connection_byte(&mut self, b: u8) -> Result<(), Error> {
        self.list = match self.list {
            ListState::ElementStart => {
                if is_ows(b) || b == b',' {
                    ListState::ElementStart
                } else if is_tchar(b) {
                    let mut m = TokenMatch::new(CONNECTION_TOKENS);
                    m.push(CONNECTION_TOKENS, b);
                    ListState::Token(m)
                } else {
                    return Err(Error::BadValue);
                }
            }
            ListState::Token(mut m) => {
                if is_tchar(b) {
                    m.push(CONNECTION_TOKENS, b);
                    ListState::Token(m)
                } else if b == b',' {
                    self.connection_token(m);
                    ListState::ElementStart
                } else if is_ows(b) {
                    self.connection_token(m);
                    ListState::AfterToken
                } else {
                    return Err(Error::BadValue);
                }
            }
            ListState::AfterToken => {
                if is_ows(b) {
                    ListState::AfterToken
                } else if b == b',' {
                    ListState::ElementStart
                } else {
                    return Err(Error::BadValue);
                }
            }
        };
        Ok(())
    }

    fn connection_token(&mut self, m: TokenMatch) {
        match m.finish(CONNECTION_TOKENS) {
            Some(ConnectionToken::Close) => self.flags.insert(Flags::CONNECTION_CLOSE),
            Some(ConnectionToken::KeepAlive) => self.flags.insert(Flags::CONNECTION_KEEP_ALIVE),
            Some(ConnectionToken::Upgrade) => self.flags.insert(Flags::CONNECTION_UPGRADE),
            None => {}
        }
    }

    fn length_byte(&mut self, b: u8) -> Result<(), Error> {
        match (self.length, b) {
            (LengthState::Empty, _) if is_ows(b) => {}
            (LengthState::Empty | LengthState::Digits, b'0'..=b'9') => {
                // u64::MAX は「不明」を表すため受け付けない
                self.length_value = self
                    .length_value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    .filter(|v| *v != u64::MAX)
                    .ok_or(Error::BadContentLength)?;
                self.length = LengthState::Digits;
            }
            (LengthState::Digits | LengthState::Trailing, _) if is_ows(b) => {
                self.length = LengthState::Trailing;
            }
            _ => return Err(Error::BadContentLength),
        }
        Ok(())
    }

    fn coding_byte(&mut self, b: u8) {
        if b == b',' {
            self.finish_coding();
            self.coding = CodingState::Empty;
            return;
        }
        self.coding = match self.coding {
            CodingState::Empty if is_ows(b) => CodingState::Empty,
            CodingState::Empty => {
                let mut m = TokenMatch::new(TRANSFER_CODINGS);
                m.push(TRANSFER_CODINGS, b);
                CodingState::Token(m)
            }
            CodingState::Token(m) if is_ows(b) => {
                CodingState::Trailing(m.finish(TRANSFER_CODINGS).is_some())
            }
            CodingState::Token(mut m) => {
                m.push(TRANSFER_CODINGS, b);
                CodingState::Token(m)
            }
            CodingState::Trailing(chunked) if is_ows(b) => CodingState::Trailing(chunked),
            CodingState::Trailing(_) | CodingState::Other => CodingState::Other,
        };
    }

    /// Transfer-Encoding の要素を確定する
    ///
    /// 空要素は無視し、最後の要素が chunked かどうかだけを保持する。
    fn finish_coding(&mut self) {
        let chunked = match self.coding {
            CodingState::Empty => return,
            CodingState::Token(m) => m.finish(TRANSFER_CODINGS).is_some(),
            CodingState::Trailing(chunked) => chunked,
            CodingState::Other => false,
        };
        if chunked {
            self.flags.insert(Flags::CHUNKED);
        } else {
            self.flags.remove(Flags::CHUNKED);
        }
    }

    fn headers_complete<H: Handler + ?Sized>(&mut self, h: &mut H) -> Result<(), Error> {
        let chunked = self.flags.contains(Flags::CHUNKED);
        let content_length = self.content_length();
        if chunked && content_length.is_some() {
            return Err(Error::IllegalContentLength);
        }

        let mut body_kind = if self.kind == MessageKind::Response
            && (self.status_code / 100 == 1 || self.status_code == 204 || self.status_code == 304)
        {
            BodyKind::None
        } else if chunked {
            BodyKind::Chunked
        } else if let Some(n) = content_length {
            BodyKind::ContentLength(n)
        } else if self.kind == MessageKind::Request {
            BodyKind::None
        } else {
            BodyKind::CloseDelimited
        };
        if let BodyKind::ContentLength(n) = body_kind {
            if n > self.limits.body_max_size {
                return Err(Error::BodyTooBig {
                    limit: self.limits.body_max_size,
                });
            }
        }

        h.on_header(content_length)?;
        match h.on_body_what(content_length)? {
            BodyWhat::Normal => {}
            BodyWhat::Skip => {
                self.flags.insert(Flags::SKIP_BODY);
                body_kind = BodyKind::None;
            }
            BodyWhat::Upgrade => {
                self.body_kind = Some(BodyKind::None);
                h.on_complete()?;
                trace!("http message complete, connection upgraded");
                self.state = State::Done;
                return Ok(());
            }
            BodyWhat::Pause => self.paused = true,
        }

        self.body_kind = Some(body_kind);
        trace!(?body_kind, "http message framing");
        match body_kind {
            BodyKind::None | BodyKind::ContentLength(0) => self.complete_message(h),
            BodyKind::ContentLength(n) => {
                self.remaining = n;
                self.state = State::BodyIdentity;
                Ok(())
            }
            BodyKind::Chunked => {
                self.state = State::ChunkSizeStart;
                Ok(())
            }
            BodyKind::CloseDelimited => {
                self.state = State::BodyEof;
                Ok(())
            }
        }
    }

    fn complete_message<H: Handler + ?Sized>(&mut self, h: &mut H) -> Result<(), Error> {
        self.paused = false;
        h.on_complete()?;
        let keep_alive = self.keep_alive();
        trace!(
            keep_alive,
            header_size = self.header_size,
            body_size = self.body_size,
            "http message complete"
        );
        self.state = if keep_alive {
            State::Restart
        } else {
            State::Done
        };
        Ok(())
    }
}

/// "HTTP/" の 1 文字を照合する
fn version_prefix(b: u8, matched: u8, next: fn(u8) -> State, done: State) -> Result<State, Error> {
    if HTTP_PREFIX.get(usize::from(matched)) != Some(&b) {
        return Err(Error::BadVersion);
    }
    let matched = matched + 1;
    if usize::from(matched) == HTTP_PREFIX.len() {
        Ok(done)
    } else {
        Ok(next(matched))
    }
}

fn version_digit(b: u8) -> Result<u8, Error> {
    if b.is_ascii_digit() {
        Ok(b - b'0')
    } else {
        Err(Error::BadVersion)
    }
}
