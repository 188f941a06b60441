//! パーサーが呼び出すコールバック

use crate::error::Error;

/// ヘッダー解析後のボディの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyWhat {
    /// フレーミングに従ってボディを読む
    #[default]
    Normal,
    /// ボディを読まずにメッセージを完了する (HEAD へのレスポンスなど)
    Skip,
    /// メッセージを完了し、残りのバイト列は別のプロトコルとして扱う
    Upgrade,
    /// ヘッダーの直後で停止する
    ///
    /// `Parser::resume()` を呼ぶまで `write` は何も消費しない。
    Pause,
}

/// パースイベントを受け取るハンドラー
///
/// すべてのメソッドにはデフォルト実装 (何もしない) がある。
/// `Err` を返すとその位置で解析を中断し、パーサーは閉じた状態になる。
///
/// `on_method` / `on_uri` / `on_reason` / `on_field` / `on_value` / `on_body` は
/// 入力の分割位置に応じて 1 つの要素に対して複数回呼ばれることがある。
///
/// 1 メッセージ内の呼び出し順:
///
/// ```text
/// on_start
/// (on_method* on_uri* on_request) | (on_reason* on_response)
/// (on_field+ on_value+)*
/// on_header on_body_what
/// on_body*
/// (on_field+ on_value+)*    (トレーラー)
/// on_complete
/// ```
pub trait Handler {
    /// メッセージの最初のバイトを受信した
    fn on_start(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn on_method(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn on_uri(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn on_reason(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    /// request-line の解析が完了した
    fn on_request(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// status-line の解析が完了した
    fn on_response(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// ヘッダー名 (の断片)
    fn on_field(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    /// ヘッダー値 (の断片)
    ///
    /// 前後の OWS は含まれない。obs-fold は SP 1 つに置き換えられる。
    /// 値が空の場合は空スライスで 1 回呼ばれる。
    fn on_value(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    /// ヘッダーの解析が完了した
    ///
    /// `content_length` は Content-Length ヘッダーがあればその値
    fn on_header(&mut self, _content_length: Option<u64>) -> Result<(), Error> {
        Ok(())
    }

    /// ボディの扱いを決める
    fn on_body_what(&mut self, _content_length: Option<u64>) -> Result<BodyWhat, Error> {
        Ok(BodyWhat::Normal)
    }

    /// ボディ (chunked の場合はデコード済み) の断片
    fn on_body(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    /// メッセージが完了した
    fn on_complete(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn on_start(&mut self) -> Result<(), Error> {
        (**self).on_start()
    }

    fn on_method(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_method(data)
    }

    fn on_uri(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_uri(data)
    }

    fn on_reason(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_reason(data)
    }

    fn on_request(&mut self) -> Result<(), Error> {
        (**self).on_request()
    }

    fn on_response(&mut self) -> Result<(), Error> {
        (**self).on_response()
    }

    fn on_field(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_field(data)
    }

    fn on_value(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_value(data)
    }

    fn on_header(&mut self, content_length: Option<u64>) -> Result<(), Error> {
        (**self).on_header(content_length)
    }

    fn on_body_what(&mut self, content_length: Option<u64>) -> Result<BodyWhat, Error> {
        (**self).on_body_what(content_length)
    }

    fn on_body(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).on_body(data)
    }

    fn on_complete(&mut self) -> Result<(), Error> {
        (**self).on_complete()
    }
}

/// イベントを所有バッファに集めるハンドラー
///
/// 1 メッセージ分をまとめて扱いたい場合に使う。
/// `on_start` で前のメッセージの内容は破棄される。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collector {
    pub method: Vec<u8>,
    pub uri: Vec<u8>,
    pub reason: Vec<u8>,
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    pub trailers: Vec<(Vec<u8>, Vec<u8>)>,
    pub body: Vec<u8>,
    pub content_length: Option<u64>,
    /// ボディの扱い (`on_body_what` の戻り値)
    pub body_what: BodyWhat,
    /// ヘッダーの解析が完了した
    pub headers_complete: bool,
    /// メッセージが完了した
    pub complete: bool,
    /// 次の `on_field` で新しいヘッダーを開始する
    in_value: bool,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// ボディの扱いを指定して作成
    pub fn with_body_what(body_what: BodyWhat) -> Self {
        Self {
            body_what,
            ..Self::default()
        }
    }

    /// 名前でヘッダーを検索 (大文字小文字を区別しない、最初の 1 つ)
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v.as_slice())
    }

    /// 名前でトレーラーを検索 (大文字小文字を区別しない、最初の 1 つ)
    pub fn trailer(&self, name: &str) -> Option<&[u8]> {
        self.trailers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v.as_slice())
    }

    fn fields(&mut self) -> &mut Vec<(Vec<u8>, Vec<u8>)> {
        if self.headers_complete {
            &mut self.trailers
        } else {
            &mut self.headers
        }
    }
}

impl Handler for Collector {
    fn on_start(&mut self) -> Result<(), Error> {
        *self = Self::with_body_what(self.body_what);
        Ok(())
    }

    fn on_method(&mut self, data: &[u8]) -> Result<(), Error> {
        self.method.extend_from_slice(data);
        Ok(())
    }

    fn on_uri(&mut self, data: &[u8]) -> Result<(), Error> {
        self.uri.extend_from_slice(data);
        Ok(())
    }

    fn on_reason(&mut self, data: &[u8]) -> Result<(), Error> {
        self.reason.extend_from_slice(data);
        Ok(())
    }

    fn on_field(&mut self, data: &[u8]) -> Result<(), Error> {
        let start_new = std::mem::take(&mut self.in_value);
        let fields = self.fields();
        match fields.last_mut() {
            Some((name, _)) if !start_new => name.extend_from_slice(data),
            _ => fields.push((data.to_vec(), Vec::new())),
        }
        Ok(())
    }

    fn on_value(&mut self, data: &[u8]) -> Result<(), Error> {
        self.in_value = true;
        if let Some((_, value)) = self.fields().last_mut() {
            value.extend_from_slice(data);
        }
        Ok(())
    }

    fn on_header(&mut self, content_length: Option<u64>) -> Result<(), Error> {
        self.content_length = content_length;
        self.headers_complete = true;
        self.in_value = false;
        Ok(())
    }

    fn on_body_what(&mut self, _content_length: Option<u64>) -> Result<BodyWhat, Error> {
        Ok(self.body_what)
    }

    fn on_body(&mut self, data: &[u8]) -> Result<(), Error> {
        self.body.extend_from_slice(data);
        Ok(())
    }

    fn on_complete(&mut self) -> Result<(), Error> {
        self.complete = true;
        Ok(())
    }
}
