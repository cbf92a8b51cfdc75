//! Input validation shared by the model types and the FFI boundary.

use chrono::NaiveDate;
use thiserror::Error;

/// Date format used for every calendar date crossing a boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation errors raised before a record is persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("{field} out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Parse an optional date; blank strings count as absent.
pub fn parse_optional_date(
    field: &'static str,
    value: Option<&str>,
) -> ValidationResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}

/// Format a date the same way it is parsed.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::OutOfRange {
            field,
            detail: format!("{} must be a non-negative number", v),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("service_date", "2024-01-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(format_date(date), "2024-01-01");
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        let err = parse_date("service_date", "01/02/2024").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { field: "service_date", .. }));
    }

    #[test]
    fn test_blank_optional_date_is_none() {
        assert_eq!(parse_optional_date("d", None).unwrap(), None);
        assert_eq!(parse_optional_date("d", Some("  ")).unwrap(), None);
        assert!(parse_optional_date("d", Some("2024-13-01")).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(require_non_negative("weight", Some(0.0)).is_ok());
        assert!(require_non_negative("weight", None).is_ok());
        assert!(require_non_negative("weight", Some(-1.0)).is_err());
        assert!(require_non_negative("weight", Some(f64::NAN)).is_err());
    }
}
