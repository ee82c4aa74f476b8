use thiserror::Error;

use crate::models::{Semester, Session};

/// User input rejected before any query runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no teacher selected; pass --teacher or set DASHBOARD_TEACHER")]
    MissingTeacher,
    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },
    #[error("student id '{0}' is not a number")]
    InvalidStudentId(String),
    #[error("select at least one filter before searching")]
    NoFilterSelected,
    #[error("unknown semester '{0}'")]
    UnknownSemester(String),
}

pub fn session(teacher: Option<&str>) -> Result<Session, ValidationError> {
    let teacher = teacher.map(str::trim).unwrap_or_default();
    if teacher.is_empty() {
        return Err(ValidationError::MissingTeacher);
    }
    Ok(Session {
        teacher: teacher.to_string(),
    })
}

/// Trims the value and rejects blanks.
pub fn require(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyValue { field });
    }
    Ok(value.to_string())
}

/// Blank optional filters count as not selected.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_student_id(value: &str) -> Result<i64, ValidationError> {
    let value = require(value, "student id")?;
    value
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidStudentId(value))
}

/// Accepts a semester id or its `SchoolYear - Semester` display label.
pub fn resolve_semester<'a>(
    semesters: &'a [Semester],
    reference: &str,
) -> Result<&'a Semester, ValidationError> {
    let reference = require(reference, "semester")?;
    semesters
        .iter()
        .find(|s| s.id == reference)
        .or_else(|| {
            semesters
                .iter()
                .find(|s| s.display_label().eq_ignore_ascii_case(&reference))
        })
        .ok_or(ValidationError::UnknownSemester(reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semesters() -> Vec<Semester> {
        vec![
            Semester {
                id: "SEM1".to_string(),
                school_year: "2025-2026".to_string(),
                label: "1st Semester".to_string(),
            },
            Semester {
                id: "SEM2".to_string(),
                school_year: "2025-2026".to_string(),
                label: "2nd Semester".to_string(),
            },
        ]
    }

    #[test]
    fn blank_teacher_is_rejected() {
        assert_eq!(session(None), Err(ValidationError::MissingTeacher));
        assert_eq!(session(Some("   ")), Err(ValidationError::MissingTeacher));
        assert_eq!(session(Some(" Dr. Smith ")).unwrap().teacher, "Dr. Smith");
    }

    #[test]
    fn student_id_must_be_numeric() {
        assert_eq!(parse_student_id(" 1001 "), Ok(1001));
        assert_eq!(
            parse_student_id("10a1"),
            Err(ValidationError::InvalidStudentId("10a1".to_string()))
        );
        assert_eq!(
            parse_student_id(""),
            Err(ValidationError::EmptyValue {
                field: "student id"
            })
        );
    }

    #[test]
    fn blank_optional_filters_are_dropped() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" CS101 ")), Some("CS101".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn semester_resolves_by_id_or_label() {
        let semesters = semesters();
        assert_eq!(resolve_semester(&semesters, "SEM2").unwrap().id, "SEM2");
        assert_eq!(
            resolve_semester(&semesters, "2025-2026 - 1st semester")
                .unwrap()
                .id,
            "SEM1"
        );
        assert_eq!(
            resolve_semester(&semesters, "SEM9"),
            Err(ValidationError::UnknownSemester("SEM9".to_string()))
        );
    }
}
