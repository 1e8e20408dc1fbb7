// Transcript Data Model
//
// Students, course grades and the transcripts that tie them together.
// Field names on the wire follow the existing client contract
// (`studentID`, `studentName`, `course`, `grade`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// Store-assigned student identifier.
///
/// Identifiers are issued in strictly increasing order and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "studentID")]
    pub id: StudentId,

    #[serde(rename = "studentName")]
    pub name: String,
}

/// A whole-number grade in `0..=100`.
///
/// The only way to build one from untrusted input is [`Grade::new`], so every
/// `Grade` in the system already satisfies the range rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    /// Validate a raw score. Fractional, non-finite and out-of-range values
    /// are rejected.
    pub fn new(score: impl Into<f64>) -> Result<Self, ValidationError> {
        validation::validate_grade(score.into()).map(Grade)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let score = f64::deserialize(deserializer)?;
        Grade::new(score).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub course: String,
    pub grade: Grade,
}

/// A student plus the grades they have earned, in the order they were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub student: Student,
    pub grades: Vec<CourseGrade>,
}

impl Transcript {
    /// A fresh transcript with no grades.
    pub fn empty(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            student: Student {
                id,
                name: name.into(),
            },
            grades: Vec::new(),
        }
    }

    pub fn id(&self) -> StudentId {
        self.student.id
    }

    pub fn grade_for(&self, course: &str) -> Option<Grade> {
        self.grades
            .iter()
            .find(|g| g.course == course)
            .map(|g| g.grade)
    }

    pub(crate) fn position_of(&self, course: &str) -> Option<usize> {
        self.grades.iter().position(|g| g.course == course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_serializes_with_client_field_names() {
        let mut transcript = Transcript::empty(StudentId(7), "Aziza");
        transcript.grades.push(CourseGrade {
            course: "CS360".into(),
            grade: Grade::new(95).unwrap(),
        });

        let json = serde_json::to_value(&transcript).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "student": { "studentID": 7, "studentName": "Aziza" },
                "grades": [ { "course": "CS360", "grade": 95 } ]
            })
        );
    }

    #[test]
    fn grade_deserialization_enforces_range() {
        assert!(serde_json::from_str::<Grade>("100").is_ok());
        assert!(serde_json::from_str::<Grade>("101").is_err());
        assert!(serde_json::from_str::<Grade>("4.5").is_err());
    }

    #[test]
    fn grade_for_finds_recorded_course() {
        let mut transcript = Transcript::empty(StudentId(1), "Sardor");
        transcript.grades.push(CourseGrade {
            course: "CS411".into(),
            grade: Grade::new(85).unwrap(),
        });

        assert_eq!(transcript.grade_for("CS411").map(Grade::value), Some(85));
        assert_eq!(transcript.grade_for("CS360"), None);
    }
}
