//! Validation at the edit-entry boundary.
//!
//! Everything the user types goes through these checks before it reaches a
//! store, so the engine only ever sees well-formed values.

use crate::error::ValidationError;

pub const GPA_MIN: f64 = 0.0;
pub const GPA_MAX: f64 = 4.0;

/// Bounds for a course credit in a custom curriculum.
pub const CREDIT_MIN: f64 = 0.5;
pub const CREDIT_MAX: f64 = 10.0;

/// Bounds for a semester's credit total in the simple calculator.
pub const SEMESTER_CREDITS_MIN: f64 = 0.0;
pub const SEMESTER_CREDITS_MAX: f64 = 50.0;

/// Parse a finite number, ignoring surrounding whitespace.
pub fn parse_number(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field,
            input: trimmed.to_string(),
        })
}

pub fn check_gpa(value: f64) -> Result<f64, ValidationError> {
    if (GPA_MIN..=GPA_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::GpaOutOfRange(value))
    }
}

pub fn parse_gpa(input: &str) -> Result<f64, ValidationError> {
    check_gpa(parse_number("GPA", input)?)
}

pub fn check_credit(value: f64) -> Result<f64, ValidationError> {
    check_range(value, CREDIT_MIN, CREDIT_MAX)
}

pub fn parse_credit(input: &str) -> Result<f64, ValidationError> {
    check_credit(parse_number("credit", input)?)
}

pub fn check_semester_credits(value: f64) -> Result<f64, ValidationError> {
    check_range(value, SEMESTER_CREDITS_MIN, SEMESTER_CREDITS_MAX)
}

fn check_range(value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::CreditOutOfRange { value, min, max })
    }
}

/// Trimmed, non-empty text.
pub fn require(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Course codes are stored trimmed and upper-cased.
pub fn course_code(input: &str) -> Result<String, ValidationError> {
    require("course code", input).map(|code| code.to_uppercase())
}

/// Year and semester indices must be single digits so that the composite
/// code sorts the same way as the numbers.
pub fn check_semester_indices(year: u8, semester: u8) -> Result<(), ValidationError> {
    if (1..=9).contains(&year) && (1..=9).contains(&semester) {
        Ok(())
    } else {
        Err(ValidationError::SemesterOutOfRange { year, semester })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpa_bounds() {
        assert_eq!(parse_gpa("3.80").unwrap(), 3.8);
        assert_eq!(parse_gpa(" 0 ").unwrap(), 0.0);
        assert_eq!(parse_gpa("4").unwrap(), 4.0);
        assert!(matches!(parse_gpa("4.01"), Err(ValidationError::GpaOutOfRange(_))));
        assert!(matches!(parse_gpa("-0.5"), Err(ValidationError::GpaOutOfRange(_))));
        assert!(matches!(parse_gpa("abc"), Err(ValidationError::NotANumber { .. })));
        assert!(matches!(parse_gpa(""), Err(ValidationError::EmptyField("GPA"))));
        assert!(matches!(parse_gpa("NaN"), Err(ValidationError::NotANumber { .. })));
    }

    #[test]
    fn credit_bounds() {
        assert_eq!(parse_credit("1.5").unwrap(), 1.5);
        assert_eq!(parse_credit("10").unwrap(), 10.0);
        assert!(parse_credit("0").is_err());
        assert!(parse_credit("0.25").is_err());
        assert!(parse_credit("10.5").is_err());
        assert!(check_semester_credits(50.0).is_ok());
        assert!(check_semester_credits(0.0).is_ok());
        assert!(check_semester_credits(50.5).is_err());
    }

    #[test]
    fn course_codes_are_normalized() {
        assert_eq!(course_code("  cse-1101 ").unwrap(), "CSE-1101");
        assert_eq!(course_code("   "), Err(ValidationError::EmptyField("course code")));
    }

    #[test]
    fn semester_indices() {
        assert!(check_semester_indices(1, 2).is_ok());
        assert!(check_semester_indices(0, 1).is_err());
        assert!(check_semester_indices(4, 10).is_err());
    }
}
