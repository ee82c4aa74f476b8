//! Shared in-memory catalog for unit tests.

use uuid::Uuid;

use crate::models::{GradeRecord, Semester, Student, Subject};
use crate::normalize::align;
use crate::store::Catalog;

pub fn student(id: i64, name: &str, course: &str, year_level: i32) -> Student {
    Student {
        id,
        name: name.to_string(),
        course: course.to_string(),
        year_level,
    }
}

pub fn subject(code: &str, description: &str, units: f64, teacher: &str) -> Subject {
    Subject {
        code: code.to_string(),
        description: description.to_string(),
        units,
        teacher: teacher.to_string(),
    }
}

pub fn semester(id: &str, school_year: &str, label: &str) -> Semester {
    Semester {
        id: id.to_string(),
        school_year: school_year.to_string(),
        label: label.to_string(),
    }
}

pub fn record(
    student_id: i64,
    semester_id: &str,
    subjects: &[&str],
    grades: &[Option<f64>],
    teachers: &[&str],
) -> GradeRecord {
    align(
        Uuid::new_v4(),
        student_id,
        semester_id.to_string(),
        subjects.iter().map(|s| s.to_string()).collect(),
        grades.to_vec(),
        teachers.iter().map(|t| Some(t.to_string())).collect(),
    )
}

/// Three students over two semesters of 2024-2025 and one of 2025-2026.
///
/// Semesters are listed out of chronological order on purpose. Student 1003 carries an
/// enrollment in a subject missing from the subject table, with no teacher recorded.
pub fn catalog() -> Catalog {
    Catalog {
        students: vec![
            student(1001, "Avery Lee", "BSCS", 1),
            student(1002, "Jules Moreno", "BSCS", 1),
            student(1003, "Kiara Patel", "BSIT", 2),
        ],
        subjects: vec![
            subject("CS101", "Intro to Programming", 3.0, "Dr. Smith"),
            subject("CS102", "Data Structures", 3.0, "Dr. Smith"),
            subject("MA101", "College Algebra", 2.0, "Dr. Jones"),
        ],
        semesters: vec![
            semester("SEM3", "2025-2026", "1st Semester"),
            semester("SEM1", "2024-2025", "1st Semester"),
            semester("SEM2", "2024-2025", "2nd Semester"),
        ],
        grades: vec![
            record(
                1001,
                "SEM1",
                &["CS101", "MA101"],
                &[Some(85.0), Some(70.0)],
                &["Dr. Smith", "Dr. Jones"],
            ),
            record(1001, "SEM2", &["CS102"], &[Some(92.0)], &["Dr. Smith"]),
            record(
                1002,
                "SEM1",
                &["CS101", "MA101"],
                &[Some(72.0), None],
                &["Dr. Smith", "Dr. Jones"],
            ),
            record(1002, "SEM2", &["CS102"], &[None], &["Dr. Smith"]),
            record(
                1003,
                "SEM1",
                &["CS101", "XX999"],
                &[Some(95.0), Some(88.0)],
                &["Dr. Smith"],
            ),
        ],
    }
}
