//! URL escaping helpers used when building login redirects and mapping request paths.

use std::fmt::Write;

use tracing_unwrap::ResultExt;

/// Percent-decoding for request paths.
///
/// Invalid escapes are kept verbatim; byte sequences that are not UTF-8 are
/// replaced with U+FFFD.
#[must_use]
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            decoded.push(byte);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Encodes a value for use inside an `application/x-www-form-urlencoded` query.
///
/// Spaces become `+` and escapes use lowercase hex, so a full URL survives as
/// a single query parameter value.
#[must_use]
pub fn form_urlencode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len() * 3);

    for byte in s.bytes() {
        match byte {
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'*'
            | b'('
            | b')' => encoded.push(char::from(byte)),
            b' ' => encoded.push('+'),
            _ => write!(encoded, "%{byte:02x}").unwrap_or_log(),
        }
    }

    encoded
}
