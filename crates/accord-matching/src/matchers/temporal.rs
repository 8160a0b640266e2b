//! Date and time format matching.
//!
//! Formats are written with Java-style pattern letters (`yyyy-MM-dd'T'HH:mm:ss`)
//! and translated to chrono directives. A format containing `%` is taken as
//! a chrono/strftime format as-is.

use crate::error::ParseError;
use crate::rules::TemporalKind;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Translate a Java-style date pattern into a chrono format string.
pub fn to_chrono_format(pattern: &str) -> Result<String, ParseError> {
    if pattern.contains('%') {
        return Ok(pattern.to_string());
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut format = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            i = quoted_literal(&chars, i, &mut format).ok_or_else(|| {
                ParseError::InvalidMatcher(format!("unterminated quote in date pattern '{}'", pattern))
            })?;
            continue;
        }
        if c.is_ascii_alphabetic() {
            let run = chars[i..].iter().take_while(|&&next| next == c).count();
            format.push_str(directive(c, run).ok_or_else(|| {
                ParseError::InvalidMatcher(format!(
                    "unsupported letter '{}' in date pattern '{}'",
                    c, pattern
                ))
            })?);
            i += run;
            continue;
        }
        format.push(c);
        i += 1;
    }
    Ok(format)
}

/// Copies a quoted literal starting at `start`, returning the index after it.
fn quoted_literal(chars: &[char], start: usize, format: &mut String) -> Option<usize> {
    if chars.get(start + 1) == Some(&'\'') {
        format.push('\'');
        return Some(start + 2);
    }
    let mut i = start + 1;
    loop {
        match chars.get(i)? {
            '\'' if chars.get(i + 1) == Some(&'\'') => {
                format.push('\'');
                i += 2;
            }
            '\'' => return Some(i + 1),
            c => {
                format.push(*c);
                i += 1;
            }
        }
    }
}

fn directive(letter: char, run: usize) -> Option<&'static str> {
    let directive = match letter {
        'y' | 'u' if run == 2 => "%y",
        'y' | 'u' => "%Y",
        'M' | 'L' => match run {
            1 | 2 => "%m",
            3 => "%b",
            _ => "%B",
        },
        'd' => "%d",
        'D' => "%j",
        'H' | 'k' => "%H",
        'h' | 'K' => "%I",
        'm' => "%M",
        's' => "%S",
        'S' => match run {
            3 => "%3f",
            6 => "%6f",
            9 => "%9f",
            _ => "%f",
        },
        'a' => "%p",
        'E' if run >= 4 => "%A",
        'E' => "%a",
        'Z' | 'X' | 'x' => "%z",
        'z' => "%Z",
        _ => return None,
    };
    Some(directive)
}

/// Check that `value` parses with `pattern` as the given kind.
///
/// Returns the parser's complaint on failure.
pub fn parse_temporal(kind: TemporalKind, pattern: &str, value: &str) -> Result<(), String> {
    let format = to_chrono_format(pattern).map_err(|e| e.to_string())?;
    match try_parse(kind, &format, value) {
        Ok(()) => Ok(()),
        // `X` patterns accept a literal `Z` for UTC; chrono's `%z` does not.
        Err(_) if format.contains("%z") && value.ends_with('Z') => {
            let utc = format!("{}+00:00", &value[..value.len() - 1]);
            try_parse(kind, &format, &utc)
        }
        Err(e) => Err(e),
    }
}

fn try_parse(kind: TemporalKind, format: &str, value: &str) -> Result<(), String> {
    let result = match kind {
        TemporalKind::Date => NaiveDate::parse_from_str(value, format).map(|_| ()),
        TemporalKind::Time => NaiveTime::parse_from_str(value, format).map(|_| ()),
        TemporalKind::DateTime => DateTime::parse_from_str(value, format)
            .map(|_| ())
            .or_else(|_| NaiveDateTime::parse_from_str(value, format).map(|_| ()))
            .or_else(|_| NaiveDate::parse_from_str(value, format).map(|_| ())),
    };
    result.map_err(|e| e.to_string())
}
