use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Neutral value representation used across database engines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Date {
        y: i32,
        m: u32,
        d: u32,
    },
    Time {
        neg: bool,
        h: u32,
        m: u32,
        s: u32,
        us: u32,
    },
    Timestamp {
        y: i32,
        m: u32,
        d: u32,
        hh: u32,
        mm: u32,
        ss: u32,
        us: u32,
    },
    /// Database function call emitted verbatim, e.g. `CURRENT_TIMESTAMP`.
    Function(String),
    /// Next value of the named sequence.
    SequenceNextValue(String),
}

impl SqlValue {
    /// Helper to construct a timestamp from chrono's NaiveDateTime components.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        SqlValue::Timestamp {
            y: dt.date().year(),
            m: dt.date().month(),
            d: dt.date().day(),
            hh: dt.time().hour(),
            mm: dt.time().minute(),
            ss: dt.time().second(),
            us: dt.time().nanosecond() / 1_000,
        }
    }

    /// Helper to construct a date from chrono's NaiveDate.
    pub fn from_date(date: NaiveDate) -> Self {
        SqlValue::Date {
            y: date.year(),
            m: date.month(),
            d: date.day(),
        }
    }

    /// Helper to construct a time from chrono's NaiveTime.
    pub fn from_time(time: NaiveTime) -> Self {
        SqlValue::Time {
            neg: false,
            h: time.hour(),
            m: time.minute(),
            s: time.second(),
            us: time.nanosecond() / 1_000,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Textual form for metadata columns; numbers are stringified.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::String(v) | SqlValue::Decimal(v) | SqlValue::Function(v) => Some(v.clone()),
            SqlValue::Int(v) => Some(v.to_string()),
            SqlValue::Float(v) => Some(v.to_string()),
            SqlValue::Bool(v) => Some(v.to_string()),
            SqlValue::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            _ => None,
        }
    }

    /// Timestamp form; dates are taken at midnight and text is parsed.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp {
                y,
                m,
                d,
                hh,
                mm,
                ss,
                us,
            } => NaiveDate::from_ymd_opt(*y, *m, *d)?.and_hms_micro_opt(*hh, *mm, *ss, *us),
            SqlValue::Date { y, m, d } => NaiveDate::from_ymd_opt(*y, *m, *d)?.and_hms_opt(0, 0, 0),
            SqlValue::String(v) => {
                NaiveDateTime::parse_from_str(v.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()
            }
            _ => None,
        }
    }

    /// Integer form; numeric strings are parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Bool(v) => Some(i64::from(*v)),
            SqlValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            SqlValue::String(v) | SqlValue::Decimal(v) => v.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::String)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

/// One result row: named columns in query order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Case-insensitive column lookup.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Trimmed text value; blank strings become `None`.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(SqlValue::as_text)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_i64)
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
