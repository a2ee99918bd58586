//! Content-Disposition header parsing and building (filename and filename*).

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Accepts `filename="quoted"` (backslash escapes honoured, `;` allowed inside
/// the quotes), `filename=token`, and RFC 5987 `filename*=UTF-8''pct-encoded`.
/// When both forms are present `filename*` wins.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for (name, value) in params(header_value) {
        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_ext_value(&value).filter(|s| !s.is_empty()) {
                return Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") && !value.is_empty() {
            plain = Some(value);
        }
    }

    plain
}

/// Builds an `attachment` header value for `filename`.
///
/// ASCII names go out as a plain quoted `filename`. Anything else also gets
/// an RFC 5987 `filename*` (which readers prefer) next to an ASCII stand-in.
pub fn attachment_disposition(filename: &str) -> String {
    let plain: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    if plain == filename {
        return format!("attachment; filename=\"{}\"", plain);
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        plain,
        percent_encode_attr(filename)
    )
}

/// RFC 5987 `attr-char` encoding of the UTF-8 bytes.
fn percent_encode_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(b as char),
            b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Splits `type; a=b; c="d;e"` into `(name, unquoted value)` pairs.
/// The disposition type itself has no `=` and is skipped.
fn params(header_value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut chars = header_value.chars().peekable();

    loop {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' {
                break;
            }
            name.push(c);
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(';') => continue,
            Some(_) => {}
        }

        while chars.peek().is_some_and(|c| *c == ' ' || *c == '\t') {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => value.push(c),
                }
            }
            // Anything between the closing quote and the next `;` is ignored.
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
                value.push(c);
            }
            value = value.trim().to_string();
        }

        out.push((name.trim().to_string(), value));
    }

    out
}

/// Decodes an RFC 5987 ext-value (`charset'lang'pct-encoded`). Only UTF-8 and
/// ISO-8859-1 charsets are understood.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    let bytes = percent_decode(encoded);

    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}

/// Lenient percent-decoding: malformed escapes are kept literally.
fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
