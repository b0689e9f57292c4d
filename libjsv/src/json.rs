//! JSON sub-lexers shared by the template compiler and the record decoder.
//!
//! Templates and records both embed ordinary JSON fragments: quoted key
//! strings in templates, and arbitrary leaf values in records. The string
//! lexer is hand-rolled so that error columns line up with the surrounding
//! parser; leaf values are handed to serde_json's streaming deserializer,
//! which reports how far into the input it read.

use serde_json::Value;

use crate::error::{RecordError, ScanError};
use crate::scanner::Scanner;

/// Scan a JSON string body. The opening `"` must already be consumed; the
/// closing `"` is consumed here. Escape sequences are decoded, including
/// `\uXXXX` surrogate pairs.
pub(crate) fn scan_string(sc: &mut Scanner) -> Result<String, ScanError> {
    let mut out = String::new();
    loop {
        match sc.next() {
            None => return Err(ScanError::UnexpectedEnd { column: sc.column() }),
            Some('"') => return Ok(out),
            Some('\\') => out.push(scan_escape(sc)?),
            Some(c) => out.push(c),
        }
    }
}

fn scan_escape(sc: &mut Scanner) -> Result<char, ScanError> {
    match sc.next() {
        None => Err(ScanError::UnexpectedEnd { column: sc.column() }),
        Some('"') => Ok('"'),
        Some('\\') => Ok('\\'),
        Some('/') => Ok('/'),
        Some('b') => Ok('\u{0008}'),
        Some('f') => Ok('\u{000c}'),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('u') => scan_unicode_escape(sc),
        Some(_) => Err(ScanError::BadEscape { column: sc.column() }),
    }
}

fn scan_unicode_escape(sc: &mut Scanner) -> Result<char, ScanError> {
    let unit = scan_hex4(sc)?;
    let code = match unit {
        0xD800..=0xDBFF => {
            // High surrogate: a low surrogate escape must follow.
            if sc.next() != Some('\\') || sc.next() != Some('u') {
                return Err(ScanError::BadEscape { column: sc.column() });
            }
            let low = scan_hex4(sc)?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(ScanError::BadEscape { column: sc.column() });
            }
            0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
        }
        0xDC00..=0xDFFF => return Err(ScanError::BadEscape { column: sc.column() }),
        _ => unit,
    };
    char::from_u32(code).ok_or(ScanError::BadEscape { column: sc.column() })
}

fn scan_hex4(sc: &mut Scanner) -> Result<u32, ScanError> {
    let mut code = 0u32;
    for _ in 0..4 {
        match sc.next() {
            None => return Err(ScanError::UnexpectedEnd { column: sc.column() }),
            Some(c) => match c.to_digit(16) {
                Some(d) => code = code * 16 + d,
                None => return Err(ScanError::BadHexDigit { column: sc.column() }),
            },
        }
    }
    Ok(code)
}

/// Scan one complete JSON value starting at the cursor, leaving the cursor
/// on the first character after it. This is how record slots hold arbitrary
/// JSON without the decoder knowing where the value ends.
pub(crate) fn scan_value(sc: &mut Scanner) -> Result<Value, RecordError> {
    sc.skip_whitespace();
    let start = sc.position();
    let rest = sc.remainder();
    let mut stream = serde_json::Deserializer::from_str(&rest).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => {
            let consumed = rest[..stream.byte_offset()].chars().count();
            sc.advance(consumed);
            Ok(value)
        }
        Some(Err(err)) => Err(RecordError::InvalidValue {
            message: err.to_string(),
            column: start,
        }),
        None => Err(RecordError::UnexpectedEnd { column: sc.column() }),
    }
}

/// Quote a string as a compact JSON string literal.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
