use std::collections::HashMap;

use crate::models::{EnrichedEnrollment, NormalizedEnrollment, Semester, Student, Subject};
use crate::store::Catalog;

pub const UNKNOWN: &str = "Unknown";

/// Foreign collections keyed by id, built once per report.
pub struct Lookups<'a> {
    pub students: HashMap<i64, &'a Student>,
    pub subjects: HashMap<&'a str, &'a Subject>,
    pub semesters: HashMap<&'a str, &'a Semester>,
}

impl<'a> Lookups<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            students: catalog.students.iter().map(|s| (s.id, s)).collect(),
            subjects: catalog
                .subjects
                .iter()
                .map(|s| (s.code.as_str(), s))
                .collect(),
            semesters: catalog
                .semesters
                .iter()
                .map(|s| (s.id.as_str(), s))
                .collect(),
        }
    }

    pub fn student_name(&self, id: i64) -> String {
        self.students
            .get(&id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Outer join: rows with unresolved keys are kept with sentinel values.
pub fn enrich(rows: Vec<NormalizedEnrollment>, lookups: &Lookups<'_>) -> Vec<EnrichedEnrollment> {
    let mut misses = 0usize;

    let enriched: Vec<EnrichedEnrollment> = rows
        .into_iter()
        .map(|row| {
            let student = lookups.students.get(&row.student_id);
            let subject = lookups.subjects.get(row.subject_code.as_str());
            let semester = lookups.semesters.get(row.semester_id.as_str());
            if student.is_none() || subject.is_none() || semester.is_none() {
                misses += 1;
            }

            EnrichedEnrollment {
                student_id: row.student_id,
                student_name: student.map_or_else(|| UNKNOWN.to_string(), |s| s.name.clone()),
                course: student.map_or_else(|| UNKNOWN.to_string(), |s| s.course.clone()),
                year_level: student.map(|s| s.year_level),
                subject_description: subject
                    .map_or_else(|| UNKNOWN.to_string(), |s| s.description.clone()),
                units: subject.map(|s| s.units),
                school_year: semester.map_or_else(|| UNKNOWN.to_string(), |s| s.school_year.clone()),
                semester_label: semester.map_or_else(|| UNKNOWN.to_string(), |s| s.label.clone()),
                subject_code: row.subject_code,
                grade: row.grade,
                teacher: row.teacher,
                semester_id: row.semester_id,
            }
        })
        .collect();

    if misses > 0 {
        tracing::debug!(misses, rows = enriched.len(), "rows with unresolved references");
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::normalize::{normalize, RowFilter};

    #[test]
    fn attaches_descriptions_units_and_labels() {
        let catalog = fixtures::catalog();
        let lookups = Lookups::new(&catalog);
        let rows = normalize(&catalog.grades[..1], &RowFilter::default());
        let enriched = enrich(rows, &lookups);

        assert_eq!(enriched.len(), 2);
        let first = &enriched[0];
        assert_eq!(first.student_name, "Avery Lee");
        assert_eq!(first.course, "BSCS");
        assert_eq!(first.year_level, Some(1));
        assert_eq!(first.subject_description, "Intro to Programming");
        assert_eq!(first.units, Some(3.0));
        assert_eq!(first.school_year, "2024-2025");
        assert_eq!(first.semester_label, "1st Semester");
    }

    #[test]
    fn unresolved_keys_keep_the_row() {
        let catalog = fixtures::catalog();
        let lookups = Lookups::new(&catalog);
        let rows = vec![NormalizedEnrollment {
            student_id: 9999,
            subject_code: "ZZ000".to_string(),
            grade: Some(50.0),
            teacher: None,
            semester_id: "NOPE".to_string(),
        }];

        let enriched = enrich(rows, &lookups);
        assert_eq!(enriched.len(), 1);
        let row = &enriched[0];
        assert_eq!(row.student_name, UNKNOWN);
        assert_eq!(row.subject_description, UNKNOWN);
        assert_eq!(row.units, None);
        assert_eq!(row.year_level, None);
        assert_eq!(row.semester_label, UNKNOWN);
        assert_eq!(row.grade, Some(50.0));
    }
}
