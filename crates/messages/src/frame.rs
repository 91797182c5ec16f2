//! Frame extraction.
//!
//! A frame on the wire is
//!
//! ```text
//! PyON 1 <key><EOL>
//! <body><EOL>
//! ---<EOL>
//! ```
//!
//! where `<EOL>` is either CRLF or LF. Text before the header is noise and
//! is dropped along with the frame.

use crate::message::RawMessage;

/// Literal that opens every frame
pub const HEADER: &str = "PyON 1 ";

const FOOTER_CRLF: &str = "\r\n---\r\n";
const FOOTER_LF: &str = "\n---\n";

/// Extract the first complete frame from `buffer`.
///
/// Returns the message and the text following its footer, or `None` when
/// `buffer` does not yet hold a complete frame. A header literal appearing
/// inside a body is not distinguished from a real header.
#[must_use]
pub fn extract_next_frame(buffer: &str) -> Option<(RawMessage, &str)> {
    let start = buffer.find(HEADER)? + HEADER.len();
    let after_header = &buffer[start..];

    let key_end = after_header.find('\n')?;
    let key = after_header[..key_end]
        .strip_suffix('\r')
        .unwrap_or(&after_header[..key_end]);
    let body = &after_header[key_end + 1..];

    let (body_end, footer_len) = find_footer(body)?;
    let value = rewrite_literals(&body[..body_end]);
    let remainder = &body[body_end + footer_len..];

    Some((RawMessage::new(key, value), remainder))
}

/// Position and length of the earliest footer in `body`, CRLF form first.
fn find_footer(body: &str) -> Option<(usize, usize)> {
    let crlf = body.find(FOOTER_CRLF).map(|pos| (pos, FOOTER_CRLF.len()));
    let lf = body.find(FOOTER_LF).map(|pos| (pos, FOOTER_LF.len()));

    match (crlf, lf) {
        (Some(c), Some(l)) => Some(if l.0 < c.0 { l } else { c }),
        (c, l) => c.or(l),
    }
}

/// Rewrite the Python literals `None`, `True` and `False` to their JSON
/// spellings wherever they stand as bare values. String contents are left
/// alone.
#[must_use]
pub fn rewrite_literals(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = body;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some((literal, json)) = literal_at(rest, out.chars().next_back()) {
            out.push_str(json);
            rest = &rest[literal.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn literal_at(text: &str, previous: Option<char>) -> Option<(&'static str, &'static str)> {
    const LITERALS: [(&str, &str); 3] = [("None", "null"), ("True", "true"), ("False", "false")];

    if previous.is_some_and(is_word_char) {
        return None;
    }

    LITERALS.into_iter().find(|(literal, _)| {
        text.starts_with(literal)
            && !text[literal.len()..].chars().next().is_some_and(is_word_char)
    })
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
