//! Reader for `.properties` files (the `java.util.Properties` text format).
//!
//! Supported: `#`/`!` comment lines, `=`/`:`/whitespace separators, backslash
//! line continuations and the `\t \n \r \f \\ \uXXXX` escapes. Later keys
//! overwrite earlier ones. There is no interpolation.

use std::collections::BTreeMap;

use thiserror::Error;

/// Parse failure with the 1-based line where the offending entry starts.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct PropertiesError {
    pub line: usize,
    pub message: String,
}

pub type Properties = BTreeMap<String, String>;

/// Parse the full text of a properties file.
pub fn parse_properties(content: &str) -> Result<Properties, PropertiesError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut properties = Properties::new();

    for (line, logical) in logical_lines(content) {
        let (raw_key, raw_value) = split_entry(&logical);
        let key = unescape(raw_key, line)?;
        let value = unescape(raw_value, line)?;
        properties.insert(key, value);
    }

    Ok(properties)
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0c')
}

/// Join continued lines, dropping blanks and comments. Escapes stay raw.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, natural) in natural_lines(content).enumerate() {
        let trimmed = natural.trim_start_matches(is_blank);

        let (start, mut buffer) = match pending.take() {
            Some(open) => open,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (index + 1, String::new())
            }
        };

        let trailing = trimmed.chars().rev().take_while(|ch| *ch == '\\').count();
        if trailing % 2 == 1 {
            buffer.push_str(&trimmed[..trimmed.len() - 1]);
            pending = Some((start, buffer));
        } else {
            buffer.push_str(trimmed);
            lines.push((start, buffer));
        }
    }

    if let Some((start, buffer)) = pending {
        lines.push((start, buffer));
    }
    lines
}

/// Physical lines ended by `\n`, `\r\n` or a lone `\r`.
fn natural_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut rest = content;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\r', '\n']) else {
            let line = rest;
            rest = "";
            return Some(line);
        };
        let line = &rest[..end];
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
        Some(line)
    })
}

/// Split a logical line into its raw key and raw value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut split: Option<(usize, char)> = None;

    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                split = Some((index, ch));
                break;
            }
            ch if is_blank(ch) => {
                split = Some((index, ch));
                break;
            }
            _ => {}
        }
    }

    let Some((index, separator)) = split else {
        return (line, "");
    };

    let key = &line[..index];
    let mut rest = line[index + separator.len_utf8()..].trim_start_matches(is_blank);
    if is_blank(separator) {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches(is_blank);
        }
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let code = decode_unicode_escape(&mut chars, line)?;
                push_code_unit(&mut out, code, &mut chars, line)?;
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn decode_unicode_escape(
    chars: &mut std::str::Chars<'_>,
    line: usize,
) -> Result<u16, PropertiesError> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(PropertiesError {
            line,
            message: format!("malformed \\uXXXX escape: \\u{digits}"),
        });
    }
    u16::from_str_radix(&digits, 16).map_err(|err| PropertiesError {
        line,
        message: format!("malformed \\uXXXX escape: {err}"),
    })
}

/// Push a UTF-16 code unit, pairing a high surrogate with a following `\uXXXX` low surrogate.
fn push_code_unit(
    out: &mut String,
    code: u16,
    chars: &mut std::str::Chars<'_>,
    line: usize,
) -> Result<(), PropertiesError> {
    if let Some(ch) = char::from_u32(u32::from(code)) {
        out.push(ch);
        return Ok(());
    }

    let is_high = (0xD800..=0xDBFF).contains(&code);
    if is_high && chars.as_str().starts_with("\\u") {
        chars.nth(1);
        let low = decode_unicode_escape(chars, line)?;
        if let Some(Ok(ch)) = char::decode_utf16([code, low]).next() {
            out.push(ch);
            return Ok(());
        }
    }

    Err(PropertiesError {
        line,
        message: format!("unpaired surrogate \\u{code:04X}"),
    })
}
