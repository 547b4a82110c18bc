//! Row rendering
//!
//! Turns a result row into its canonical text: a tuple of the field values,
//! `('alice', 3, None)`, with a trailing comma for one column `('alice',)`.

use std::fmt::Write;

use rusqlite::types::ValueRef;

/// Render a row's values as tuple text
pub fn render_row(values: &[ValueRef<'_>]) -> String {
    let mut out = String::from("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_value(&mut out, value);
    }
    if values.len() == 1 {
        out.push(',');
    }
    out.push(')');
    out
}

/// Render a single value
pub fn render_value(out: &mut String, value: &ValueRef<'_>) {
    match value {
        ValueRef::Null => out.push_str("None"),
        ValueRef::Integer(i) => {
            let _ = write!(out, "{}", i);
        }
        ValueRef::Real(f) => out.push_str(&render_real(*f)),
        ValueRef::Text(bytes) => render_text(out, &String::from_utf8_lossy(bytes)),
        ValueRef::Blob(bytes) => render_blob(out, bytes),
    }
}

/// Shortest round-trip float text, `1.0` for integral values,
/// `1e+16` / `1e-05` in exponent form
fn render_real(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let text = format!("{:?}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

/// Quote text: single quotes unless it holds a `'` and no `"`
fn render_text(out: &mut String, text: &str) {
    let quote = pick_quote(text.contains('\''), text.contains('"'));
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => escape_char(out, c),
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Code points rendered escaped besides `char::is_control` (Cc): space
/// separators other than U+0020 (Zs), format characters (Cf), line and
/// paragraph separators (Zl, Zp), private use (Co), and unassigned ranges
/// (Cn). Sorted, non-overlapping, inclusive.
const NON_PRINTABLE: &[(u32, u32)] = &[
    (0x00A0, 0x00A0),
    (0x00AD, 0x00AD),
    (0x0600, 0x0605),
    (0x061C, 0x061C),
    (0x06DD, 0x06DD),
    (0x070F, 0x070F),
    (0x0890, 0x0891),
    (0x08E2, 0x08E2),
    (0x1680, 0x1680),
    (0x180E, 0x180E),
    (0x2000, 0x200F),
    (0x2028, 0x202F),
    (0x205F, 0x206F),
    (0x3000, 0x3000),
    (0xE000, 0xF8FF),
    (0xFDD0, 0xFDEF),
    (0xFEFF, 0xFEFF),
    (0xFFF0, 0xFFFB),
    (0xFFFE, 0xFFFF),
    (0x110BD, 0x110BD),
    (0x110CD, 0x110CD),
    (0x13430, 0x1343F),
    (0x1BCA0, 0x1BCA3),
    (0x1D173, 0x1D17A),
    (0x40000, 0xDFFFF),
    (0xE0000, 0xE00FF),
    (0xE01F0, 0x10FFFF),
];

/// Whether a character is written as-is inside a quoted string
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() {
        return false;
    }
    let cp = c as u32;
    // Noncharacters at the end of every plane
    if cp & 0xFFFE == 0xFFFE {
        return false;
    }
    NON_PRINTABLE
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_err()
}

/// `\xNN`, `\uNNNN` or `\UNNNNNNNN` by code point width
fn escape_char(out: &mut String, c: char) {
    let cp = c as u32;
    let _ = if cp < 0x100 {
        write!(out, "\\x{:02x}", cp)
    } else if cp < 0x10000 {
        write!(out, "\\u{:04x}", cp)
    } else {
        write!(out, "\\U{:08x}", cp)
    };
}

/// Bytes literal: printable ASCII as-is, everything else `\xNN`
fn render_blob(out: &mut String, bytes: &[u8]) {
    let quote = pick_quote(bytes.contains(&b'\''), bytes.contains(&b'"'));
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b as char == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(b as char),
            b => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push(quote);
}

fn pick_quote(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}
