use std::collections::HashMap;

use crate::models::{GradeRecord, Semester, Student, Subject};

/// Record-level selection applied by the store before any normalization.
///
/// `teacher` and `subject_code` are containment tests against the record's arrays; the
/// remaining fields are exact matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeQuery {
    pub teacher: Option<String>,
    pub subject_code: Option<String>,
    pub semester_id: Option<String>,
    pub student_ids: Option<Vec<i64>>,
    pub course: Option<String>,
    pub year_level: Option<i32>,
}

impl GradeQuery {
    pub fn for_teacher(teacher: &str) -> Self {
        Self {
            teacher: Some(teacher.to_string()),
            ..Self::default()
        }
    }
}

/// In-memory snapshot of the four read-only collections.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub semesters: Vec<Semester>,
    pub grades: Vec<GradeRecord>,
}

impl Catalog {
    pub fn grade_records(&self, query: &GradeQuery) -> Vec<&GradeRecord> {
        let students: HashMap<i64, &Student> =
            self.students.iter().map(|s| (s.id, s)).collect();

        self.grades
            .iter()
            .filter(|record| {
                if let Some(teacher) = &query.teacher {
                    if !record
                        .enrollments
                        .iter()
                        .any(|e| e.teacher.as_ref() == Some(teacher))
                    {
                        return false;
                    }
                }
                if let Some(code) = &query.subject_code {
                    if !record.enrollments.iter().any(|e| &e.subject_code == code) {
                        return false;
                    }
                }
                if let Some(semester_id) = &query.semester_id {
                    if &record.semester_id != semester_id {
                        return false;
                    }
                }
                if let Some(ids) = &query.student_ids {
                    if !ids.contains(&record.student_id) {
                        return false;
                    }
                }
                if query.course.is_some() || query.year_level.is_some() {
                    let Some(student) = students.get(&record.student_id) else {
                        return false;
                    };
                    if query.course.as_ref().is_some_and(|c| &student.course != c) {
                        return false;
                    }
                    if query.year_level.is_some_and(|y| student.year_level != y) {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Distinct teacher names across every grade record, sorted.
    pub fn teacher_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .grades
            .iter()
            .flat_map(|r| r.enrollments.iter().filter_map(|e| e.teacher.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn subject_by_description(&self, description: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.description == description)
    }

    /// Students whose name contains `fragment`, ignoring case.
    pub fn students_named(&self, fragment: &str) -> Vec<&Student> {
        let needle = fragment.to_lowercase();
        self.students
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn teacher_query_uses_array_containment() {
        let catalog = fixtures::catalog();
        let records = catalog.grade_records(&GradeQuery::for_teacher("Dr. Jones"));
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r
            .enrollments
            .iter()
            .any(|e| e.teacher.as_deref() == Some("Dr. Jones"))));
    }

    #[test]
    fn year_level_query_joins_students() {
        let catalog = fixtures::catalog();
        let query = GradeQuery {
            year_level: Some(2),
            ..GradeQuery::default()
        };
        let records = catalog.grade_records(&query);
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.student_id == 1003));
    }

    #[test]
    fn teacher_names_are_distinct_and_sorted() {
        let catalog = fixtures::catalog();
        assert_eq!(
            catalog.teacher_names(),
            vec!["Dr. Jones".to_string(), "Dr. Smith".to_string()]
        );
    }

    #[test]
    fn students_named_ignores_case() {
        let catalog = fixtures::catalog();
        let found = catalog.students_named("avery");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1001);
    }
}
