use uuid::Uuid;

use crate::classify::recorded_grade;
use crate::models::{Enrollment, GradeRecord, NormalizedEnrollment};
use crate::store::GradeQuery;

/// Zips the stored parallel arrays into typed enrollments.
///
/// One enrollment is produced per subject code. A grade or teacher slot past the end of its
/// array reads as `None`, and grades outside 0..=100 are treated as missing.
pub fn align(
    id: Uuid,
    student_id: i64,
    semester_id: String,
    subject_codes: Vec<String>,
    grades: Vec<Option<f64>>,
    teachers: Vec<Option<String>>,
) -> GradeRecord {
    if grades.len() != subject_codes.len() || teachers.len() != subject_codes.len() {
        tracing::debug!(
            %id,
            student_id,
            subjects = subject_codes.len(),
            grades = grades.len(),
            teachers = teachers.len(),
            "grade record arrays differ in length"
        );
    }

    let mut grades = grades.into_iter();
    let mut teachers = teachers.into_iter();
    let enrollments = subject_codes
        .into_iter()
        .map(|subject_code| Enrollment {
            subject_code,
            grade: recorded_grade(grades.next().flatten()),
            teacher: teachers.next().flatten(),
        })
        .collect();

    GradeRecord {
        id,
        student_id,
        semester_id,
        enrollments,
    }
}

/// Splits enrollments back into the stored parallel arrays, all of equal length.
pub fn to_arrays(
    enrollments: &[Enrollment],
) -> (Vec<String>, Vec<Option<f64>>, Vec<Option<String>>) {
    let codes = enrollments.iter().map(|e| e.subject_code.clone()).collect();
    let grades = enrollments.iter().map(|e| e.grade).collect();
    let teachers = enrollments.iter().map(|e| e.teacher.clone()).collect();
    (codes, grades, teachers)
}

/// Replaces the slot for the same subject, or appends a new one.
///
/// Returns `true` when a slot was appended.
pub fn merge_enrollment(enrollments: &mut Vec<Enrollment>, incoming: Enrollment) -> bool {
    match enrollments
        .iter_mut()
        .find(|e| e.subject_code == incoming.subject_code)
    {
        Some(slot) => {
            *slot = incoming;
            false
        }
        None => {
            enrollments.push(incoming);
            true
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    /// Keep only rows whose aligned teacher equals this name exactly.
    pub teacher: Option<String>,
    pub subject_code: Option<String>,
    pub semester_id: Option<String>,
}

impl RowFilter {
    /// Row-level counterpart of a store query: the same teacher, subject and semester.
    pub fn for_query(query: &GradeQuery) -> Self {
        Self {
            teacher: query.teacher.clone(),
            subject_code: query.subject_code.clone(),
            semester_id: query.semester_id.clone(),
        }
    }

    fn admits_record(&self, record: &GradeRecord) -> bool {
        if let Some(semester_id) = &self.semester_id {
            if &record.semester_id != semester_id {
                return false;
            }
        }
        if let Some(code) = &self.subject_code {
            if !record.enrollments.iter().any(|e| &e.subject_code == code) {
                return false;
            }
        }
        if let Some(teacher) = &self.teacher {
            if !record
                .enrollments
                .iter()
                .any(|e| e.teacher.as_ref() == Some(teacher))
            {
                return false;
            }
        }
        true
    }

    fn admits(&self, enrollment: &Enrollment) -> bool {
        let teacher_ok = self
            .teacher
            .as_ref()
            .map_or(true, |t| enrollment.teacher.as_ref() == Some(t));
        let subject_ok = self
            .subject_code
            .as_ref()
            .map_or(true, |c| &enrollment.subject_code == c);
        teacher_ok && subject_ok
    }
}

pub fn expand(record: &GradeRecord, filter: &RowFilter) -> Vec<NormalizedEnrollment> {
    if !filter.admits_record(record) {
        return Vec::new();
    }

    record
        .enrollments
        .iter()
        .filter(|e| filter.admits(e))
        .map(|e| NormalizedEnrollment {
            student_id: record.student_id,
            subject_code: e.subject_code.clone(),
            grade: e.grade,
            teacher: e.teacher.clone(),
            semester_id: record.semester_id.clone(),
        })
        .collect()
}

pub fn normalize<'a, I>(records: I, filter: &RowFilter) -> Vec<NormalizedEnrollment>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    records
        .into_iter()
        .flat_map(|record| expand(record, filter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn teachers(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn short_arrays_degrade_to_none() {
        let record = align(
            Uuid::new_v4(),
            1001,
            "SEM1".to_string(),
            strings(&["CS101", "CS102", "CS103"]),
            vec![Some(88.0)],
            teachers(&["Dr. Smith", "Dr. Jones"]),
        );

        let rows = normalize([&record], &RowFilter::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].grade, Some(88.0));
        assert_eq!(rows[1].grade, None);
        assert_eq!(rows[1].teacher.as_deref(), Some("Dr. Jones"));
        assert_eq!(rows[2].grade, None);
        assert_eq!(rows[2].teacher, None);
        assert!(rows.iter().all(|r| r.semester_id == "SEM1"));
    }

    #[test]
    fn merge_replaces_matching_subject_and_keeps_alignment() {
        let mut record = align(
            Uuid::new_v4(),
            1001,
            "SEM1".to_string(),
            strings(&["CS101", "CS102"]),
            vec![Some(80.0)],
            teachers(&["Dr. Smith", "Dr. Smith"]),
        );

        let appended = merge_enrollment(
            &mut record.enrollments,
            Enrollment {
                subject_code: "CS102".to_string(),
                grade: Some(91.0),
                teacher: Some("Dr. Smith".to_string()),
            },
        );
        assert!(!appended);
        assert!(merge_enrollment(
            &mut record.enrollments,
            Enrollment {
                subject_code: "MA101".to_string(),
                grade: None,
                teacher: Some("Dr. Jones".to_string()),
            },
        ));

        let (codes, grades, teachers) = to_arrays(&record.enrollments);
        assert_eq!(codes, strings(&["CS101", "CS102", "MA101"]));
        assert_eq!(grades, vec![Some(80.0), Some(91.0), None]);
        assert_eq!(teachers.len(), 3);
        assert_eq!(teachers[2].as_deref(), Some("Dr. Jones"));
    }

    #[test]
    fn extra_grades_are_ignored() {
        let record = align(
            Uuid::new_v4(),
            1001,
            "SEM1".to_string(),
            strings(&["CS101"]),
            vec![Some(70.0), Some(99.0)],
            teachers(&["Dr. Smith", "Dr. Smith"]),
        );
        assert_eq!(record.enrollments.len(), 1);
    }

    #[test]
    fn out_of_range_grade_is_missing() {
        let record = align(
            Uuid::new_v4(),
            7,
            "SEM1".to_string(),
            strings(&["CS101", "CS102"]),
            vec![Some(105.0), Some(-3.0)],
            teachers(&["Dr. Smith", "Dr. Smith"]),
        );
        assert_eq!(record.enrollments[0].grade, None);
        assert_eq!(record.enrollments[1].grade, None);
    }

    #[test]
    fn nan_grade_is_missing() {
        let record = align(
            Uuid::new_v4(),
            7,
            "SEM1".to_string(),
            strings(&["CS101"]),
            vec![Some(f64::NAN)],
            teachers(&["Dr. Smith"]),
        );
        assert_eq!(record.enrollments[0].grade, None);
    }

    #[test]
    fn teacher_filter_matches_aligned_slot_only() {
        let record = align(
            Uuid::new_v4(),
            1001,
            "SEM1".to_string(),
            strings(&["CS101", "MA101"]),
            vec![Some(80.0), Some(60.0)],
            teachers(&["Dr. Smith", "Dr. Jones"]),
        );

        let rows = expand(&record, &RowFilter::for_query(&GradeQuery::for_teacher("Dr. Jones")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_code, "MA101");
        assert_eq!(rows[0].grade, Some(60.0));
    }

    #[test]
    fn semester_and_subject_prefilter_records() {
        let record = align(
            Uuid::new_v4(),
            1001,
            "SEM1".to_string(),
            strings(&["CS101", "MA101"]),
            vec![Some(80.0), Some(60.0)],
            teachers(&["Dr. Smith", "Dr. Jones"]),
        );

        let other_semester = RowFilter {
            semester_id: Some("SEM2".to_string()),
            ..RowFilter::default()
        };
        assert!(expand(&record, &other_semester).is_empty());

        let subject = RowFilter {
            subject_code: Some("CS101".to_string()),
            semester_id: Some("SEM1".to_string()),
            ..RowFilter::default()
        };
        let rows = expand(&record, &subject);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject_code, "CS101");
    }
}
