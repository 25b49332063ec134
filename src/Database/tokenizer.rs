//! # Delimited-text tokenizer
//!
//! Splits one line of a text database into fields. The dialect is not CSV:
//! - both `,` and `;` separate fields;
//! - a field may be quoted with `'` or `"`, inside quotes the doubled quote
//!   character stands for one literal quote;
//! - after a closing quote only whitespace may appear before the next separator;
//! - unquoted fields are trimmed;
//! - a trailing separator yields one extra empty field.
//!
//! `split_line_n` is the size-bounded variant used by the record decoder: it pads
//! short lines with empty fields and folds any overflow into the last field.
use thiserror::Error;

/// malformed quoting in a line, `position` is the 1-based column
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (column {position})")]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

fn is_separator(c: char) -> bool {
    c == ',' || c == ';'
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// one field found by the scanner: its text and the char index where it started
struct Field {
    text: String,
    start: usize,
}

fn scan_fields(line: &str) -> Result<Vec<Field>, TokenizeError> {
    let chars: Vec<char> = line.chars().collect();
    let n = chars.len();
    let mut fields = Vec::new();
    let mut i = 0;
    loop {
        // skip leading whitespace of the field
        while i < n && chars[i].is_whitespace() {
            i += 1;
        }
        let start = i;
        if i < n && is_quote(chars[i]) {
            let quote = chars[i];
            let mut text = String::new();
            i += 1;
            let mut closed = false;
            while i < n {
                if chars[i] == quote {
                    if i + 1 < n && chars[i + 1] == quote {
                        text.push(quote);
                        i += 2;
                        continue;
                    }
                    closed = true;
                    i += 1;
                    break;
                }
                text.push(chars[i]);
                i += 1;
            }
            if !closed {
                return Err(TokenizeError {
                    message: format!("unterminated quote {}", quote),
                    position: start + 1,
                });
            }
            while i < n && chars[i].is_whitespace() {
                i += 1;
            }
            if i < n && !is_separator(chars[i]) {
                return Err(TokenizeError {
                    message: format!("unexpected token '{}' after quoted field", chars[i]),
                    position: i + 1,
                });
            }
            fields.push(Field { text, start });
        } else {
            let mut text = String::new();
            while i < n && !is_separator(chars[i]) {
                text.push(chars[i]);
                i += 1;
            }
            fields.push(Field {
                text: text.trim().to_string(),
                start,
            });
        }
        if i < n {
            // chars[i] is a separator
            i += 1;
            continue;
        }
        break;
    }
    Ok(fields)
}

/// Splits a line into its fields.
///
/// ```
/// use ChemEqDB::Database::tokenizer::split_line;
/// let fields = split_line("a,\"b,c\",d").unwrap();
/// assert_eq!(fields, vec!["a", "b,c", "d"]);
/// ```
pub fn split_line(line: &str) -> Result<Vec<String>, TokenizeError> {
    Ok(scan_fields(line)?.into_iter().map(|f| f.text).collect())
}

/// Splits a line into exactly `n` fields: missing fields are empty strings, and
/// when the line holds more than `n` fields the last one receives the raw
/// remainder of the line, from the start of field `n` to the end, unmodified.
pub fn split_line_n(line: &str, n: usize) -> Result<Vec<String>, TokenizeError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let fields = scan_fields(line)?;
    if fields.len() <= n {
        let mut out: Vec<String> = fields.into_iter().map(|f| f.text).collect();
        out.resize(n, String::new());
        return Ok(out);
    }
    let tail_start = fields[n - 1].start;
    let tail: String = line.chars().skip(tail_start).collect();
    let mut out: Vec<String> = fields.into_iter().take(n - 1).map(|f| f.text).collect();
    out.push(tail.trim_end().to_string());
    Ok(out)
}

/// Quotes a field when needed so that `split_line` gives it back unchanged.
pub fn quote_field(field: &str) -> String {
    let needs_quotes = field.contains(['"', '\'', ',', ';']) || field.trim() != field;
    if !needs_quotes {
        return field.to_string();
    }
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Joins fields with `;`, quoting where required.
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(";")
}
