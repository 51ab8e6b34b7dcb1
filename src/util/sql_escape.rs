//! Literal formatting helpers shared by the dialects.

/// Quote a string with standard SQL rules (only `'` is doubled).
pub fn quote_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 8);
    result.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            result.push('\'');
        }
        result.push(ch);
    }
    result.push('\'');
    result
}

/// Quote a string for engines that treat backslash as an escape character.
pub fn quote_string_with_backslashes(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 16);
    result.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => result.push_str("''"),
            '\\' => result.push_str("\\\\"),
            '\0' => result.push_str("\\0"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result.push('\'');
    result
}

/// Reverse of [`quote_string`]; returns `None` if `text` is not a quoted literal.
pub fn unquote_string(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Heuristic used to pick string vs hex literal for binary data.
pub fn is_likely_text(bytes: &[u8]) -> bool {
    if std::str::from_utf8(bytes).is_err() {
        return false;
    }

    let printable = bytes
        .iter()
        .filter(|&&b| (32..127).contains(&b) || [b'\n', b'\r', b'\t'].contains(&b))
        .count();
    printable * 10 >= bytes.len() * 9
}

/// Float literal; non-finite values become quoted words.
pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "'NaN'".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        value.to_string()
    }
}

pub fn format_date(y: i32, m: u32, d: u32) -> String {
    format!("{:04}-{:02}-{:02}", y, m, d)
}

pub fn format_time(neg: bool, h: u32, m: u32, s: u32, us: u32) -> String {
    let sign = if neg { "-" } else { "" };
    if us == 0 {
        format!("{}{:02}:{:02}:{:02}", sign, h, m, s)
    } else {
        format!("{}{:02}:{:02}:{:02}.{:06}", sign, h, m, s, us)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn format_timestamp(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32, us: u32) -> String {
    format!("{} {}", format_date(y, m, d), format_time(false, hh, mm, ss, us))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_single_quotes() {
        assert_eq!(quote_string("O'Reilly"), "'O''Reilly'");
        assert_eq!(unquote_string("'O''Reilly'").as_deref(), Some("O'Reilly"));
        assert_eq!(unquote_string("O'Reilly"), None);
    }

    #[test]
    fn escapes_backslashes() {
        assert_eq!(quote_string_with_backslashes("a\\b\n"), "'a\\\\b\\n'");
    }

    #[test]
    fn formats_temporal_parts() {
        assert_eq!(format_timestamp(2024, 1, 2, 3, 4, 5, 0), "2024-01-02 03:04:05");
        assert_eq!(format_time(true, 1, 2, 3, 40), "-01:02:03.000040");
    }
}
