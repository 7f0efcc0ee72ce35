//! Small input checks shared by the handlers.

use chrono::{NaiveDate, NaiveTime};

use crate::error::ApiError;

pub(crate) fn date(field: &'static str, value: &str) -> Result<(), ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a YYYY-MM-DD date")))
}

pub(crate) fn opt_date(field: &'static str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) => date(field, v),
        None => Ok(()),
    }
}

pub(crate) fn time(field: &'static str, value: &str) -> Result<(), ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("{field} must be an HH:MM time")))
}

pub(crate) fn opt_time(field: &'static str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) => time(field, v),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_times_are_checked_strictly() {
        assert!(date("date_of_birth", "1990-04-12").is_ok());
        assert!(date("date_of_birth", "12.04.1990").is_err());
        assert!(date("date_of_birth", "1990-13-01").is_err());

        assert!(time("start_time", "09:30").is_ok());
        assert!(time("start_time", "9:30").is_ok());
        assert!(time("start_time", "25:00").is_err());
        assert!(time("start_time", "caries").is_err());

        assert!(opt_date("due_date", None).is_ok());
        assert!(opt_time("end_time", Some("nope")).is_err());
    }
}
