use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value bound to a statement, or inlined as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Binary data (blob)
    Bytes(Vec<u8>),
}

impl Value {
    /// Render this value as an inline SQL literal.
    ///
    /// Booleans follow SQLite and render as `1`/`0`.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(n) => n.to_string(),
            // SQLite reads out-of-range reals as infinity; it has no NaN
            Value::Float(n) if n.is_nan() => "NULL".to_string(),
            Value::Float(n) if n.is_infinite() => {
                if *n > 0.0 { "9e999" } else { "-9e999" }.to_string()
            }
            Value::Float(n) if n.fract() == 0.0 => format!("{:.1}", n),
            Value::Float(n) => n.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for byte in bytes {
                    out.push_str(&format!("{:02X}", byte));
                }
                out.push('\'');
                out
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql_literal())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// Dates bind as text, in the format SQLite date functions understand.

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::String(d.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::String(dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        dt.naive_utc().into()
    }
}

/// Parse a loosely typed value from text (CLI arguments, config).
///
/// Integers and finite floats are recognized; `null`, `true` and `false`
/// map to their SQL counterparts; anything else (`nan`, `inf` included) is
/// a string.
pub fn parse_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if let Some(n) = text.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return Value::Float(n);
    }
    match text.to_ascii_lowercase().as_str() {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(Value::Int(42).to_sql_literal(), "42");
        assert_eq!(Value::Float(1.0).to_sql_literal(), "1.0");
        assert_eq!(Value::Float(2.5).to_sql_literal(), "2.5");
        assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(Value::Bool(true).to_sql_literal(), "1");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_sql_literal(), "X'DEAD'");
    }

    #[test]
    fn test_dates_bind_as_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::from(date), Value::String("2024-03-09".to_string()));

        let dt = date.and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(
            Value::from(dt),
            Value::String("2024-03-09 08:05:00.000".to_string())
        );
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("7"), Value::Int(7));
        assert_eq!(parse_value("7.5"), Value::Float(7.5));
        assert_eq!(parse_value("NULL"), Value::Null);
        assert_eq!(parse_value("foo"), Value::String("foo".to_string()));
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(parse_value("nan"), Value::String("nan".to_string()));
        assert_eq!(parse_value("inf"), Value::String("inf".to_string()));
        assert_eq!(parse_value("-Infinity"), Value::String("-Infinity".to_string()));

        assert_eq!(Value::Float(f64::NAN).to_sql_literal(), "NULL");
        assert_eq!(Value::Float(f64::INFINITY).to_sql_literal(), "9e999");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_sql_literal(), "-9e999");
        assert_eq!(Value::Float(-2.0).to_sql_literal(), "-2.0");
    }
}
