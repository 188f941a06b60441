//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// トークン / ヘッダー生成
// ========================================

/// tchar (RFC 7230 Section 3.2.6)
pub fn tchar() -> impl Strategy<Value = u8> {
    prop::sample::select(
        b"!#$%&'*+-.^_`|~0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz".to_vec(),
    )
}

pub fn token(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(tchar(), 1..=max_len)
}

pub fn method() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"GET".to_vec()),
        Just(b"POST".to_vec()),
        Just(b"PUT".to_vec()),
        Just(b"DELETE".to_vec()),
        token(12),
    ]
}

pub fn request_target() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"/".to_vec()),
        Just(b"*".to_vec()),
        "/[a-zA-Z0-9/_.?=&%-]{1,48}".prop_map(String::into_bytes),
        "http://[a-z]{1,12}\\.example(:[0-9]{1,5})?/[a-z]{0,8}".prop_map(String::into_bytes),
    ]
}

/// 特別扱いされないヘッダー名
pub fn header_name() -> impl Strategy<Value = Vec<u8>> {
    "X-[A-Za-z0-9-]{1,16}".prop_map(String::into_bytes)
}

/// 前後に OWS を含まないヘッダー値 (空を含む)
pub fn header_value() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(Vec::new()),
        "[!-~]([ !-~]{0,30}[!-~])?".prop_map(String::into_bytes),
        proptest::collection::vec(0x80u8..=0xff, 1..8),
    ]
}

pub fn headers() -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    proptest::collection::vec((header_name(), header_value()), 0..8)
}

pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

/// チャンクのリスト (空チャンクは最後のチャンクと区別できないので含めない)
pub fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..64), 0..8)
}

/// チャンク拡張 (";" を含む)
pub fn chunk_ext() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(Vec::new()),
        token(8).prop_map(|name| {
            let mut ext = b";".to_vec();
            ext.extend_from_slice(&name);
            ext
        }),
        (token(8), token(8)).prop_map(|(name, value)| {
            let mut ext = b";".to_vec();
            ext.extend_from_slice(&name);
            ext.push(b'=');
            ext.extend_from_slice(&value);
            ext
        }),
        (token(8), "[a-z ]{0,8}").prop_map(|(name, value)| {
            let mut ext = b";".to_vec();
            ext.extend_from_slice(&name);
            ext.extend_from_slice(b"=\"");
            ext.extend_from_slice(value.as_bytes());
            ext.push(b'"');
            ext
        }),
    ]
}

// ========================================
// メッセージ生成
// ========================================

/// ボディのフレーミング
#[derive(Debug, Clone)]
pub enum Framing {
    ContentLength(Vec<u8>),
    /// チャンクと、それぞれのチャンク拡張
    Chunked(Vec<(Vec<u8>, Vec<u8>)>),
    None,
}

impl Framing {
    /// デコード後のボディ
    pub fn body(&self) -> Vec<u8> {
        match self {
            Framing::ContentLength(body) => body.clone(),
            Framing::Chunked(chunks) => chunks.iter().flat_map(|(c, _)| c.clone()).collect(),
            Framing::None => Vec::new(),
        }
    }
}

fn framing() -> impl Strategy<Value = Framing> {
    prop_oneof![
        body().prop_map(Framing::ContentLength),
        proptest::collection::vec(
            (proptest::collection::vec(any::<u8>(), 1..64), chunk_ext()),
            0..6
        )
        .prop_map(Framing::Chunked),
        Just(Framing::None),
    ]
}

/// 生成したリクエスト
#[derive(Debug, Clone)]
pub struct GeneratedRequest {
    pub method: Vec<u8>,
    pub target: Vec<u8>,
    pub minor: u8,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub framing: Framing,
}

impl GeneratedRequest {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.method);
        out.push(b' ');
        out.extend_from_slice(&self.target);
        out.extend_from_slice(format!(" HTTP/1.{}\r\n", self.minor).as_bytes());
        for (name, value) in &self.headers {
            out.extend_from_slice(name);
            out.extend_from_slice(b": ");
            out.extend_from_slice(value);
            out.extend_from_slice(b"\r\n");
        }
        match &self.framing {
            Framing::ContentLength(body) => {
                out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
                out.extend_from_slice(body);
            }
            Framing::Chunked(chunks) => {
                out.extend_from_slice(b"Transfer-Encoding: chunked\r\n\r\n");
                for (chunk, ext) in chunks {
                    out.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
                    out.extend_from_slice(ext);
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(chunk);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(b"0\r\n\r\n");
            }
            Framing::None => out.extend_from_slice(b"\r\n"),
        }
        out
    }

    /// ヘッダー部 (空行まで) の長さ
    pub fn head_len(&self) -> usize {
        let encoded = self.encode();
        encoded
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map_or(encoded.len(), |i| i + 4)
    }
}

pub fn request() -> impl Strategy<Value = GeneratedRequest> {
    (method(), request_target(), 0u8..=1, headers(), framing()).prop_map(
        |(method, target, minor, headers, framing)| GeneratedRequest {
            method,
            target,
            minor,
            headers,
            framing,
        },
    )
}

/// 生成したレスポンス (close-delimited を含む)
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    pub status: u16,
    pub reason: Vec<u8>,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub body: Vec<u8>,
}

impl GeneratedResponse {
    /// Content-Length も Transfer-Encoding も付けない
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {:03} ", self.status).into_bytes();
        out.extend_from_slice(&self.reason);
        out.extend_from_slice(b"\r\n");
        for (name, value) in &self.headers {
            out.extend_from_slice(name);
            out.extend_from_slice(b":");
            out.extend_from_slice(value);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

pub fn response() -> impl Strategy<Value = GeneratedResponse> {
    (
        200u16..=599,
        "[A-Za-z]([A-Za-z ]{0,20}[A-Za-z])?",
        headers(),
        body(),
    )
        .prop_filter("status without body", |(status, _, _, _)| {
            *status != 204 && *status != 304
        })
        .prop_map(|(status, reason, headers, body)| GeneratedResponse {
            status,
            reason: reason.into_bytes(),
            headers,
            body,
        })
}

/// 解析に使う主な区切り文字を多めに含むバイト列
pub fn http_like_bytes() -> impl Strategy<Value = Vec<u8>> {
    let interesting = prop::sample::select(
        b" \t\r\n:;,=\"\\/.0123456789aAcCfFHTP-\x00\x7f\x80\xff".to_vec(),
    );
    proptest::collection::vec(prop_oneof![3 => interesting, 1 => any::<u8>()], 0..256)
}
