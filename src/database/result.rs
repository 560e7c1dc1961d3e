//! Query result types and cell values.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Generic query result: ordered column names plus positional rows.
///
/// Produced transiently per query and consumed by the renderer; never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Cell value that can hold the SQL types MySQL hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Bytes(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical string form used everywhere a cell is printed.
    ///
    /// NULL renders as the literal `NULL`; bytes that are not valid UTF-8
    /// render as a hex literal. Pipe characters and newlines inside text are
    /// passed through untouched.
    pub fn render(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Int(n) => n.to_string(),
            Self::UInt(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::DateTime(dt) => dt.to_string(),
            Self::Date(d) => d.to_string(),
            Self::Time(t) => t.to_string(),
            Self::Bytes(b) => {
                let mut out = String::with_capacity(2 + b.len() * 2);
                out.push_str("0x");
                for byte in b {
                    let _ = write!(out, "{byte:02x}");
                }
                out
            }
        }
    }
}

impl From<mysql_async::Value> for CellValue {
    fn from(value: mysql_async::Value) -> Self {
        use mysql_async::Value;
        match value {
            Value::NULL => Self::Null,
            Value::Int(n) => Self::Int(n),
            Value::UInt(n) => Self::UInt(n),
            Value::Float(f) => Self::Float(f64::from(f)),
            Value::Double(f) => Self::Float(f),
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Self::Text(s),
                Err(e) => Self::Bytes(e.into_bytes()),
            },
            Value::Date(year, month, day, hour, minute, second, micros) => {
                from_date_parts(year, month, day, hour, minute, second, micros)
            }
            Value::Time(negative, days, hours, minutes, seconds, micros) => {
                from_time_parts(negative, days, hours, minutes, seconds, micros)
            }
        }
    }
}

/// MySQL DATE/DATETIME components. Zero dates (`0000-00-00`) are outside
/// chrono's range and fall back to their textual form.
fn from_date_parts(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> CellValue {
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day));
    match date {
        Some(date) if hour == 0 && minute == 0 && second == 0 && micros == 0 => {
            CellValue::Date(date)
        }
        Some(date) => {
            match date.and_hms_micro_opt(
                u32::from(hour),
                u32::from(minute),
                u32::from(second),
                micros,
            ) {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::Text(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                )),
            }
        }
        None => CellValue::Text(format!("{year:04}-{month:02}-{day:02}")),
    }
}

/// MySQL TIME is a signed duration; values beyond one day (or negative)
/// cannot be a `NaiveTime` and keep MySQL's own textual form.
fn from_time_parts(
    negative: bool,
    days: u32,
    hours: u8,
    minutes: u8,
    seconds: u8,
    micros: u32,
) -> CellValue {
    if !negative && days == 0 {
        if let Some(t) = NaiveTime::from_hms_micro_opt(
            u32::from(hours),
            u32::from(minutes),
            u32::from(seconds),
            micros,
        ) {
            return CellValue::Time(t);
        }
    }
    let total_hours = days * 24 + u32::from(hours);
    let sign = if negative { "-" } else { "" };
    CellValue::Text(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}"))
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Option<String>> for CellValue {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(s) => Self::Text(s),
            None => Self::Null,
        }
    }
}

/// One row of `DESCRIBE <table>` output, in database order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub field: String,
    pub column_type: String,
    pub null: String,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
}

impl ColumnInfo {
    /// Builds column metadata from a DESCRIBE result row.
    /// The first two cells (field and type) are mandatory.
    pub fn from_row(row: &[CellValue]) -> Option<Self> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or(CellValue::Null);
        let text = |i: usize| cell(i).as_str().map(str::to_string);

        Some(Self {
            field: text(0)?,
            column_type: text(1)?,
            null: text(2).unwrap_or_default(),
            key: text(3).unwrap_or_default(),
            default: match cell(4) {
                CellValue::Null => None,
                other => Some(other.render()),
            },
            extra: text(5).unwrap_or_default(),
        })
    }
}
