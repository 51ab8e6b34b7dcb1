//! Literal inference for default values.
//!
//! Values arrive either typed (`SqlValue::Int`, `SqlValue::Function`, ...) or
//! as plain strings taken from a changeset. Strings are rendered according to
//! the declared column type when there is one, and strings that look like a
//! function call are emitted verbatim.

use crate::engine::dialect::SqlDialect;
use crate::engine::value::SqlValue;
use crate::structure::{DataType, StandardType};
use crate::util::sql_escape::unquote_string;
use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*\s*\(.*\)$").unwrap());
static TYPE_CAST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(::[A-Za-z_][A-Za-z0-9_ ]*(\[\])?)+$").unwrap());

const NILADIC_FUNCTIONS: &[&str] = &[
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "SESSION_USER",
    "SYSDATE",
    "SYSTIMESTAMP",
];

/// Whether a string value is really a database function call.
pub fn looks_like_function(text: &str) -> bool {
    let text = text.trim();
    NILADIC_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(text))
        || FUNCTION_CALL_RE.is_match(text)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn is_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.parse::<f64>().is_ok()
}

/// Render a default value as a SQL literal for the given column type.
pub fn default_value_sql(
    value: &SqlValue,
    data_type: Option<&DataType>,
    dialect: &dyn SqlDialect,
) -> String {
    let standard = data_type.map(DataType::standard_type);
    match value {
        SqlValue::String(text) => {
            if looks_like_function(text) {
                return text.trim().to_string();
            }
            match standard {
                Some(t) if t.is_numeric() && is_number(text) => text.trim().to_string(),
                Some(StandardType::Boolean) => match parse_bool(text) {
                    Some(b) => dialect.boolean_literal(b).to_string(),
                    None => dialect.string_literal(text),
                },
                _ => dialect.string_literal(text),
            }
        }
        SqlValue::Bool(b) if standard.map_or(false, |t| t.is_numeric()) => {
            i64::from(*b).to_string()
        }
        SqlValue::Int(v) if standard == Some(StandardType::Boolean) => {
            dialect.boolean_literal(*v != 0).to_string()
        }
        other => dialect.to_literal(other),
    }
}

/// Check that a default value fits the declared column type.
pub fn check_value_matches_type(value: &SqlValue, data_type: &DataType) -> Result<(), String> {
    let standard = data_type.standard_type();
    let mismatch = || -> Result<(), String> {
        Err(format!(
            "default value {:?} does not match column type {}",
            value, data_type
        ))
    };
    match value {
        SqlValue::Null | SqlValue::Function(_) | SqlValue::SequenceNextValue(_) => Ok(()),
        SqlValue::String(text) if looks_like_function(text) => Ok(()),
        SqlValue::String(text) => {
            if standard.is_numeric() && !is_number(text) {
                mismatch()
            } else if standard == StandardType::Boolean && parse_bool(text).is_none() {
                mismatch()
            } else {
                Ok(())
            }
        }
        SqlValue::Int(_) | SqlValue::Float(_) | SqlValue::Decimal(_) => {
            if standard.is_numeric()
                || standard == StandardType::Boolean
                || standard == StandardType::Unknown
            {
                Ok(())
            } else {
                mismatch()
            }
        }
        SqlValue::Bool(_) => {
            if matches!(standard, StandardType::Boolean | StandardType::Unknown)
                || standard.is_numeric()
            {
                Ok(())
            } else {
                mismatch()
            }
        }
        SqlValue::Date { .. } | SqlValue::Time { .. } | SqlValue::Timestamp { .. } => {
            if standard.is_temporal() || standard.is_textual() || standard == StandardType::Unknown
            {
                Ok(())
            } else {
                mismatch()
            }
        }
        SqlValue::Bytes(_) => {
            if matches!(standard, StandardType::Blob | StandardType::Unknown) {
                Ok(())
            } else {
                mismatch()
            }
        }
    }
}

/// Interpret a column default as reported by catalog metadata.
///
/// Returns `None` for an explicit or implied NULL default.
pub fn parse_default_value(raw: &str, data_type: Option<&DataType>) -> Option<SqlValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let without_cast = if raw.starts_with('\'') {
        raw
    } else {
        TYPE_CAST_RE
            .captures(raw)
            .and_then(|c| c.get(1))
            .map_or(raw, |m| m.as_str().trim())
    };
    if without_cast.eq_ignore_ascii_case("null") {
        return None;
    }

    let standard = data_type.map(DataType::standard_type);
    if let Some(text) = quoted_prefix(raw) {
        return Some(match standard {
            Some(t) if t.is_integer() => text
                .trim()
                .parse::<i64>()
                .map(SqlValue::Int)
                .unwrap_or(SqlValue::String(text)),
            Some(StandardType::Boolean) => {
                parse_bool(&text).map_or(SqlValue::String(text), SqlValue::Bool)
            }
            _ => SqlValue::String(text),
        });
    }
    if let Ok(int) = without_cast.parse::<i64>() {
        if standard == Some(StandardType::Boolean) {
            return Some(SqlValue::Bool(int != 0));
        }
        return Some(SqlValue::Int(int));
    }
    if is_number(without_cast) {
        return Some(SqlValue::Decimal(without_cast.to_string()));
    }
    if let Some(b) = parse_bool(without_cast).filter(|_| {
        without_cast.eq_ignore_ascii_case("true") || without_cast.eq_ignore_ascii_case("false")
    }) {
        return Some(SqlValue::Bool(b));
    }
    Some(SqlValue::Function(raw.to_string()))
}

/// Text of a leading quoted literal, ignoring any trailing cast.
fn quoted_prefix(raw: &str) -> Option<String> {
    if !raw.starts_with('\'') {
        return None;
    }
    let bytes = raw.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        if bytes[idx] == b'\'' {
            if bytes.get(idx + 1) == Some(&b'\'') {
                idx += 2;
                continue;
            }
            return unquote_string(&raw[..=idx]);
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;

    #[test]
    fn detects_function_calls() {
        assert!(looks_like_function("now()"));
        assert!(looks_like_function("current_timestamp"));
        assert!(looks_like_function("pg_catalog.gen_random_uuid()"));
        assert!(!looks_like_function("hello world"));
        assert!(!looks_like_function("(1)"));
    }

    #[test]
    fn renders_by_declared_type() {
        let int = DataType::new("int");
        let boolean = DataType::new("boolean");
        let text = DataType::parse("varchar(10)");
        assert_eq!(
            default_value_sql(&SqlValue::String("42".into()), Some(&int), &POSTGRES_DIALECT),
            "42"
        );
        assert_eq!(
            default_value_sql(&SqlValue::String("42".into()), Some(&text), &POSTGRES_DIALECT),
            "'42'"
        );
        assert_eq!(
            default_value_sql(&SqlValue::String("true".into()), Some(&boolean), &MYSQL_DIALECT),
            "1"
        );
        assert_eq!(
            default_value_sql(&SqlValue::Bool(false), Some(&boolean), &POSTGRES_DIALECT),
            "FALSE"
        );
        assert_eq!(
            default_value_sql(&SqlValue::String("now()".into()), Some(&text), &POSTGRES_DIALECT),
            "now()"
        );
    }

    #[test]
    fn rejects_mismatched_defaults() {
        let int = DataType::new("integer");
        assert!(check_value_matches_type(&SqlValue::String("abc".into()), &int).is_err());
        assert!(check_value_matches_type(&SqlValue::String("12".into()), &int).is_ok());
        assert!(check_value_matches_type(&SqlValue::Bytes(vec![1]), &int).is_err());
        let boolean = DataType::new("boolean");
        assert!(check_value_matches_type(&SqlValue::String("maybe".into()), &boolean).is_err());
    }

    #[test]
    fn parses_metadata_defaults() {
        let varchar = DataType::new("varchar");
        assert_eq!(
            parse_default_value("'it''s'::character varying", Some(&varchar)),
            Some(SqlValue::String("it's".into()))
        );
        assert_eq!(parse_default_value("NULL::character varying", None), None);
        assert_eq!(parse_default_value("42", None), Some(SqlValue::Int(42)));
        assert_eq!(
            parse_default_value("1.50", None),
            Some(SqlValue::Decimal("1.50".into()))
        );
        assert_eq!(parse_default_value("false", None), Some(SqlValue::Bool(false)));
        assert_eq!(
            parse_default_value("nextval('seq'::regclass)", None),
            Some(SqlValue::Function("nextval('seq'::regclass)".into()))
        );
    }
}
