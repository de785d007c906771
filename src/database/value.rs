use crate::database::column::ColumnType;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;
use thiserror::Error;

/// Errors raised when a cell string does not fit its declared column type.
#[derive(Error, Debug, PartialEq)]
pub enum CoerceError {
    #[error("'{0}' is not a valid int32")]
    InvalidInteger(String),

    #[error("'{0}' is not a valid {1}")]
    InvalidFloat(String, ColumnType),

    #[error("'{0}' is not a valid boolean")]
    InvalidBoolean(String),

    #[error("'{0}' is not a valid datetime")]
    InvalidDateTime(String),
}

/// Date/time layouts tried in order after RFC 3339
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, read as midnight
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Layout used to render date/time values, accepted back by [`coerce`]
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A typed table value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns the column type this value belongs to.
    pub fn kind(&self) -> ColumnType {
        match self {
            Value::String(_) => ColumnType::String,
            Value::Int32(_) => ColumnType::Int32,
            Value::Float32(_) => ColumnType::Float32,
            Value::Float64(_) => ColumnType::Float64,
            Value::Boolean(_) => ColumnType::Boolean,
            Value::DateTime(_) => ColumnType::DateTime,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(value) => Some(f64::from(*value)),
            Value::Float64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for Value {
    /// Renders the display string written back into cells.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(value) => f.write_str(value),
            Value::Int32(value) => write!(f, "{value}"),
            Value::Float32(value) => write!(f, "{value}"),
            Value::Float64(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::DateTime(value) => write!(f, "{}", value.format(DISPLAY_FORMAT)),
        }
    }
}

/// Converts a cell display string into a value of the declared type.
///
/// Surrounding whitespace is ignored for every type except `String`, which
/// keeps the text verbatim.
pub fn coerce(raw: &str, kind: ColumnType) -> Result<Value, CoerceError> {
    match kind {
        ColumnType::String => Ok(Value::String(raw.to_owned())),
        ColumnType::Int32 => raw
            .trim()
            .parse::<i32>()
            .map(Value::Int32)
            .map_err(|_| CoerceError::InvalidInteger(raw.to_owned())),
        ColumnType::Float32 => parse_decimal::<f32>(raw)
            .filter(|value| value.is_finite())
            .map(Value::Float32)
            .ok_or_else(|| CoerceError::InvalidFloat(raw.to_owned(), kind)),
        ColumnType::Float64 => parse_decimal::<f64>(raw)
            .filter(|value| value.is_finite())
            .map(Value::Float64)
            .ok_or_else(|| CoerceError::InvalidFloat(raw.to_owned(), kind)),
        ColumnType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(CoerceError::InvalidBoolean(raw.to_owned())),
        },
        ColumnType::DateTime => parse_datetime(raw.trim())
            .map(Value::DateTime)
            .ok_or_else(|| CoerceError::InvalidDateTime(raw.to_owned())),
    }
}

/// Parses a plain decimal literal, rejecting the `inf`/`nan` words `FromStr` accepts
fn parse_decimal<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let value = raw.trim();
    let is_decimal = value
        .chars()
        .all(|character| character.is_ascii_digit() || matches!(character, '+' | '-' | '.' | 'e' | 'E'));
    if is_decimal && value.chars().any(|character| character.is_ascii_digit()) {
        value.parse::<T>().ok()
    } else {
        None
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .unwrap()
    }

    #[test]
    fn coerce_strings_verbatim() {
        assert_eq!(coerce(" Widget ", ColumnType::String), Ok(Value::String(" Widget ".to_owned())));
        assert_eq!(coerce("", ColumnType::String), Ok(Value::String(String::new())));
    }

    #[test]
    fn coerce_integers() {
        assert_eq!(coerce("10", ColumnType::Int32), Ok(Value::Int32(10)));
        assert_eq!(coerce(" -42 ", ColumnType::Int32), Ok(Value::Int32(-42)));
        assert_eq!(coerce("+7", ColumnType::Int32), Ok(Value::Int32(7)));
        assert_eq!(coerce("2147483648", ColumnType::Int32), Err(CoerceError::InvalidInteger("2147483648".to_owned())));
        assert_eq!(coerce("1.5", ColumnType::Int32), Err(CoerceError::InvalidInteger("1.5".to_owned())));
        assert_eq!(coerce("", ColumnType::Int32), Err(CoerceError::InvalidInteger(String::new())));
    }

    #[test]
    fn coerce_floats() {
        assert_eq!(coerce("3.25", ColumnType::Float64), Ok(Value::Float64(3.25)));
        assert_eq!(coerce("-1e3", ColumnType::Float64), Ok(Value::Float64(-1000.0)));
        assert_eq!(coerce(" .5 ", ColumnType::Float32), Ok(Value::Float32(0.5)));
        assert!(coerce("inf", ColumnType::Float64).is_err());
        assert!(coerce("NaN", ColumnType::Float32).is_err());
        assert!(coerce("1e40", ColumnType::Float32).is_err());
        assert!(coerce("1,5", ColumnType::Float64).is_err());
        assert!(coerce("e", ColumnType::Float64).is_err());
    }

    #[test]
    fn coerce_booleans() {
        assert_eq!(coerce("TRUE", ColumnType::Boolean), Ok(Value::Boolean(true)));
        assert_eq!(coerce(" false", ColumnType::Boolean), Ok(Value::Boolean(false)));
        assert_eq!(coerce("yes", ColumnType::Boolean), Err(CoerceError::InvalidBoolean("yes".to_owned())));
    }

    #[test]
    fn coerce_datetimes() {
        let expected = datetime(2024, 1, 15, 10, 30, 0);
        for raw in [
            "2024-01-15 10:30:00",
            "2024-01-15T10:30:00",
            "2024/01/15 10:30:00",
            "01/15/2024 10:30:00",
            "2024-01-15 10:30",
            "2024-01-15T10:30:00+09:00",
        ] {
            assert_eq!(coerce(raw, ColumnType::DateTime), Ok(Value::DateTime(expected)), "{raw}");
        }
        assert_eq!(coerce("2024-01-15", ColumnType::DateTime), Ok(Value::DateTime(datetime(2024, 1, 15, 0, 0, 0))));
        assert_eq!(coerce("1/5/2024", ColumnType::DateTime), Ok(Value::DateTime(datetime(2024, 1, 5, 0, 0, 0))));
        assert!(coerce("2024-13-01", ColumnType::DateTime).is_err());
        assert!(coerce("yesterday", ColumnType::DateTime).is_err());
    }

    #[test]
    fn rendered_values_coerce_back() {
        let fractional = datetime(2023, 12, 31, 23, 59, 58)
            + chrono::Duration::milliseconds(125);
        let values = [
            Value::String("Gadget".to_owned()),
            Value::Int32(i32::MIN),
            Value::Float32(0.1),
            Value::Float32(-2.5e-8),
            Value::Float64(1.0 / 3.0),
            Value::Float64(1e300),
            Value::Boolean(true),
            Value::DateTime(datetime(2024, 2, 29, 0, 0, 0)),
            Value::DateTime(fractional),
        ];
        for value in values {
            assert_eq!(coerce(&value.to_string(), value.kind()), Ok(value.clone()));
        }
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Float64(10.0).to_string(), "10");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::DateTime(datetime(2024, 1, 15, 10, 30, 0)).to_string(), "2024-01-15 10:30:00");
    }
}
