//! 文字クラス (RFC 7230 Section 3.2.6)

const fn build_tchar_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 256 {
        table[b] = matches!(
            b as u8,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
            b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
        );
        b += 1;
    }
    table
}

static TCHAR: [bool; 256] = build_tchar_table();

/// トークン文字か確認
///
/// メソッド、ヘッダー名、チャンク拡張名の 1 バイトごとに呼ばれるため表引きにする。
#[inline]
pub(crate) fn is_tchar(b: u8) -> bool {
    TCHAR[b as usize]
}

/// OWS = *( SP / HTAB )
#[inline]
pub(crate) fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// request-target に許可される文字か確認
///
/// VCHAR / obs-text
#[inline]
pub(crate) fn is_uri_char(b: u8) -> bool {
    b > 0x20 && b != 0x7f
}

/// reason-phrase = *( HTAB / SP / VCHAR / obs-text )
#[inline]
pub(crate) fn is_reason_char(b: u8) -> bool {
    matches!(b, 0x09 | 0x20..=0x7E | 0x80..=0xFF)
}

/// field-content に許可される文字か確認
///
/// field-vchar (VCHAR / obs-text) と SP / HTAB
#[inline]
pub(crate) fn is_field_content(b: u8) -> bool {
    matches!(b, 0x09 | 0x20..=0x7E | 0x80..=0xFF)
}

/// qdtext = HTAB / SP / %x21 / %x23-5B / %x5D-7E / obs-text
#[inline]
pub(crate) fn is_qdtext(b: u8) -> bool {
    matches!(b, 0x09 | 0x20 | 0x21 | 0x23..=0x5B | 0x5D..=0x7E | 0x80..=0xFF)
}

/// quoted-pair = "\" ( HTAB / SP / VCHAR / obs-text )
#[inline]
pub(crate) fn is_quoted_pair_char(b: u8) -> bool {
    matches!(b, 0x09 | 0x20..=0x7E | 0x80..=0xFF)
}

/// 16 進数字の値
#[inline]
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
