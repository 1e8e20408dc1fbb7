// Input Validation Rules
//
// Pure checks applied to mutation input before the store touches any
// state. A rejected input never produces a partial mutation.

/// Shortest accepted student name, in characters.
pub const MIN_NAME_CHARS: usize = 2;

/// Malformed input to a store mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("student name is required")]
    MissingName,

    #[error("student name `{0}` is too short: at least 2 characters are required")]
    NameTooShort(String),

    #[error("student name `{0}` must not contain digits")]
    NameContainsDigits(String),

    #[error("course name is required")]
    MissingCourse,

    #[error("grade {0} is not a whole number")]
    FractionalGrade(f64),

    #[error("grade {0} is outside the range 0..=100")]
    GradeOutOfRange(f64),
}

/// Student names must be present, at least two characters long and free of
/// digits. Anything else is accepted as-is.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::NameTooShort(name.to_owned()));
    }
    if name.chars().any(char::is_numeric) {
        return Err(ValidationError::NameContainsDigits(name.to_owned()));
    }
    Ok(())
}

pub fn validate_course(course: &str) -> Result<(), ValidationError> {
    if course.trim().is_empty() {
        Err(ValidationError::MissingCourse)
    } else {
        Ok(())
    }
}

/// Returns the score as a whole number in `0..=100`.
pub fn validate_grade(score: f64) -> Result<u8, ValidationError> {
    if !score.is_finite() || score.fract() != 0.0 {
        return Err(ValidationError::FractionalGrade(score));
    }
    if !(0.0..=100.0).contains(&score) {
        return Err(ValidationError::GradeOutOfRange(score));
    }
    Ok(score as u8)
}
