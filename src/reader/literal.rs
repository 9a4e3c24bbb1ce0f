//! Readers for the constructs that need no environment:
//! byte literals, text literals, comments and identifier runs.
//!
//! Each reader is called by the dispatcher after it has consumed the
//! construct's first character.

use crate::error::{Error, EvalResult};
use crate::reader::Cursor;

/// Accented letters accepted in identifiers, besides `a-z`, `0-9` and `_`.
pub const ACCENTED: &str = "áàâãäéèêëíìîïóòôõöúùûüçñ";

mod regex {
    use regex::Regex;
    use std::sync::OnceLock;

    use super::ACCENTED;

    pub(super) fn identifier() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(&format!(r"\A[a-z0-9_{ACCENTED}]+"))
                .expect("could not compile regex for identifier")
        })
    }

    pub(super) fn parameter() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(&format!(r"[a-z0-9_{ACCENTED}]+"))
                .expect("could not compile regex for parameter")
        })
    }
}

/// Digits accepted in byte literals. Lowercase letters are not hex digits here.
pub fn is_hex_digit(ch: char) -> bool {
    matches!(ch, '0'..='9' | 'A'..='F')
}

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ACCENTED.contains(ch)
}

/// Read the second digit of a byte literal and decode the pair.
pub fn read_byte(first: char, cursor: &mut Cursor) -> EvalResult<u8> {
    let start = cursor.position() - first.len_utf8();
    match cursor.read() {
        Some(second) if is_hex_digit(second) => {
            let pair = cursor.slice_from(start);
            // Both digits are ASCII hex, so this can't fail.
            Ok(u8::from_str_radix(pair, 16).unwrap_or_default())
        }
        _ => Err(Error::MalformedHex {
            pair: cursor.slice_from(start).to_owned(),
            at: cursor.location_of(start),
        }),
    }
}

/// Read a text literal after its opening quote.
///
/// There is no escaping. End of buffer closes the literal.
pub fn read_text<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let (text, _) = cursor.read_until('"');
    text
}

/// Discard a comment after its opening parenthesis.
///
/// Comments don't nest: the first `)` closes it. End of buffer closes it too.
pub fn skip_comment(cursor: &mut Cursor) {
    let (comment, closed) = cursor.read_until(')');
    if !closed {
        tracing::trace!("comment {:?} closed by end of input", comment);
    }
}

/// Read the rest of an identifier whose first character was just consumed.
pub fn read_identifier<'a>(first: char, cursor: &mut Cursor<'a>) -> &'a str {
    let start = cursor.position() - first.len_utf8();
    if let Some(rest) = regex::identifier().find(cursor.remainder()) {
        cursor.advance(rest.end());
    }
    cursor.slice_from(start)
}

/// Every identifier run in a function header, in order.
pub fn parameter_names(header: &str) -> impl Iterator<Item = &str> {
    regex::parameter().find_iter(header).map(|m| m.as_str())
}
