use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub course: String,
    pub year_level: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub code: String,
    pub description: String,
    pub units: f64,
    /// Assigned instructor; may differ from the teacher recorded on a grade record.
    pub teacher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Semester {
    pub id: String,
    pub school_year: String,
    pub label: String,
}

impl Semester {
    /// Display label used by the semester pickers, e.g. `2025-2026 - 1st Semester`.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.school_year, self.label)
    }
}

/// One subject slot of a grade record, aligned by position at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub subject_code: String,
    pub grade: Option<f64>,
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub id: Uuid,
    pub student_id: i64,
    pub semester_id: String,
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEnrollment {
    pub student_id: i64,
    pub subject_code: String,
    pub grade: Option<f64>,
    pub teacher: Option<String>,
    pub semester_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEnrollment {
    pub student_id: i64,
    pub student_name: String,
    pub course: String,
    pub year_level: Option<i32>,
    pub subject_code: String,
    pub subject_description: String,
    pub units: Option<f64>,
    pub grade: Option<f64>,
    pub teacher: Option<String>,
    pub semester_id: String,
    pub school_year: String,
    pub semester_label: String,
}

/// Per-session context. Every teacher-scoped report receives it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub teacher: String,
}
