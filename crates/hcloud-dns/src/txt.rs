//! Encoding of TXT record values.
//!
//! A TXT value travels as whitespace-separated quoted chunks, each holding at most
//! [`MAX_CHUNK_LEN`] bytes. Quotes and backslashes inside a value are escaped with a
//! backslash. [`format_txt`] and [`parse_txt`] convert between the plain value and that
//! wire form.

/// Maximum number of bytes between the quotes of one chunk.
pub const MAX_CHUNK_LEN: usize = 255;

/// Encode a plain value as quoted chunks.
///
/// Chunks break on character boundaries and never inside an escape sequence, so a chunk
/// can end up slightly shorter than [`MAX_CHUNK_LEN`]. An empty value encodes to an empty
/// string.
#[must_use]
pub fn format_txt(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut buf = [0u8; 4];

    for c in value.chars() {
        let unit: &str = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            _ => &*c.encode_utf8(&mut buf),
        };
        if current.len() + unit.len() > MAX_CHUNK_LEN {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(unit);
    }
    chunks.push(current);

    chunks
        .iter()
        .map(|chunk| format!("\"{chunk}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode quoted chunks back into the plain value.
///
/// A backslash escapes the next character both inside and outside quotes. Unquoted
/// characters other than escaped ones are dropped, and an unterminated quote still yields
/// its content.
#[must_use]
pub fn parse_txt(input: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut token = String::new();
    let mut quoted = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            token.push(c);
            escape_next = false;
            continue;
        }
        match c {
            '\\' => escape_next = true,
            '"' => quoted = !quoted,
            ' ' if !quoted => {
                if !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                }
            }
            _ if quoted => token.push(c),
            _ => {}
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }

    tokens.concat()
}
