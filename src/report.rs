use std::collections::HashMap;

use crate::aggregate::{self, OutcomeCounts, SemesterPivot};
use crate::classify::{self, DifficultyLevel, GradeBand, GradeStatus, RiskFlag};
use crate::enrich::{enrich, Lookups};
use crate::models::{EnrichedEnrollment, Session};
use crate::normalize::{normalize, RowFilter};
use crate::store::{Catalog, GradeQuery};
use crate::table::{Cell, Table};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressFilter {
    YearLevel(i32),
    Course(String),
    /// Subject description, or subject code.
    Subject(String),
    StudentId(i64),
}

/// Ad hoc filter set; at least one value is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomQuery {
    subject_code: Option<String>,
    teacher: Option<String>,
    student_name: Option<String>,
}

impl CustomQuery {
    pub fn new(
        subject_code: Option<&str>,
        teacher: Option<&str>,
        student_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let query = Self {
            subject_code: validate::optional(subject_code),
            teacher: validate::optional(teacher),
            student_name: validate::optional(student_name),
        };
        if query.subject_code.is_none() && query.teacher.is_none() && query.student_name.is_none() {
            return Err(ValidationError::NoFilterSelected);
        }
        Ok(query)
    }

    fn grade_query(&self, catalog: &Catalog) -> GradeQuery {
        GradeQuery {
            teacher: self.teacher.clone(),
            subject_code: self.subject_code.clone(),
            student_ids: self.student_ids(catalog),
            ..GradeQuery::default()
        }
    }

    fn student_ids(&self, catalog: &Catalog) -> Option<Vec<i64>> {
        self.student_name.as_ref().map(|name| {
            catalog
                .students_named(name)
                .into_iter()
                .map(|s| s.id)
                .collect()
        })
    }
}

/// The fixed catalogue of dashboard views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Home,
    TeachingAssignments,
    ClassGradeDistribution { semester_id: String },
    StudentProgress(ProgressFilter),
    SubjectDifficulty,
    InterventionCandidates,
    SubmissionStatus,
    CustomQuery(CustomQuery),
    GradeAnalytics { subject_code: String, semester_id: String },
}

impl Report {
    /// Record-level selection the store should apply before the report runs.
    ///
    /// `None` means the report reads no grade records. `catalog` only needs the
    /// reference collections (students, subjects, semesters) at this point.
    pub fn grade_query(&self, session: &Session, catalog: &Catalog) -> Option<GradeQuery> {
        match self {
            Self::Home => None,
            Self::TeachingAssignments => Some(GradeQuery::default()),
            Self::ClassGradeDistribution { semester_id } => {
                Some(class_query(session, None, semester_id))
            }
            Self::StudentProgress(filter) => Some(progress_query(catalog, filter)),
            Self::SubjectDifficulty | Self::InterventionCandidates | Self::SubmissionStatus => {
                Some(GradeQuery::for_teacher(&session.teacher))
            }
            Self::CustomQuery(query) => Some(query.grade_query(catalog)),
            Self::GradeAnalytics {
                subject_code,
                semester_id,
            } => Some(class_query(session, Some(subject_code), semester_id)),
        }
    }

    pub fn run(&self, catalog: &Catalog, session: &Session) -> Vec<Table> {
        let tables = match self {
            Self::Home => {
                let summary = home(catalog, session);
                vec![summary.semesters, summary.subjects]
            }
            Self::TeachingAssignments => vec![teaching_assignments(catalog, session)],
            Self::ClassGradeDistribution { semester_id } => {
                vec![class_grade_distribution(catalog, session, semester_id)]
            }
            Self::StudentProgress(filter) => vec![student_progress(catalog, filter)],
            Self::SubjectDifficulty => vec![subject_difficulty(catalog, session)],
            Self::InterventionCandidates => vec![intervention_candidates(catalog, session)],
            Self::SubmissionStatus => vec![submission_status(catalog, session)],
            Self::CustomQuery(query) => vec![custom_query(catalog, query)],
            Self::GradeAnalytics {
                subject_code,
                semester_id,
            } => {
                let analytics = student_grade_analytics(catalog, session, subject_code, semester_id);
                vec![
                    analytics.roster,
                    analytics.summary,
                    analytics.grade_counts,
                    analytics.status_counts,
                ]
            }
        };

        for table in &tables {
            tracing::debug!(report = %table.title, rows = table.len(), "report built");
        }
        tables
    }
}

fn subject_code_for(catalog: &Catalog, subject: &str) -> String {
    catalog
        .subject_by_description(subject)
        .map_or_else(|| subject.to_string(), |s| s.code.clone())
}

/// The session teacher's slots in one semester, optionally narrowed to one subject.
fn class_query(session: &Session, subject_code: Option<&str>, semester_id: &str) -> GradeQuery {
    GradeQuery {
        teacher: Some(session.teacher.clone()),
        subject_code: subject_code.map(str::to_string),
        semester_id: Some(semester_id.to_string()),
        ..GradeQuery::default()
    }
}

fn progress_query(catalog: &Catalog, filter: &ProgressFilter) -> GradeQuery {
    match filter {
        ProgressFilter::YearLevel(year_level) => GradeQuery {
            year_level: Some(*year_level),
            ..GradeQuery::default()
        },
        ProgressFilter::Course(course) => GradeQuery {
            course: Some(course.clone()),
            ..GradeQuery::default()
        },
        ProgressFilter::Subject(subject) => GradeQuery {
            subject_code: Some(subject_code_for(catalog, subject)),
            ..GradeQuery::default()
        },
        ProgressFilter::StudentId(id) => GradeQuery {
            student_ids: Some(vec![*id]),
            ..GradeQuery::default()
        },
    }
}

/// Records selected by `query`, expanded to the slots that match it and joined.
fn enriched_rows(
    catalog: &Catalog,
    lookups: &Lookups<'_>,
    query: &GradeQuery,
) -> Vec<EnrichedEnrollment> {
    enrich(
        normalize(catalog.grade_records(query), &RowFilter::for_query(query)),
        lookups,
    )
}

/// Position of every known semester in chronological order.
fn semester_positions(catalog: &Catalog, lookups: &Lookups<'_>) -> HashMap<String, usize> {
    let mut ids: Vec<String> = catalog.semesters.iter().map(|s| s.id.clone()).collect();
    aggregate::order_semester_ids(&mut ids, lookups);
    ids.into_iter().enumerate().map(|(i, id)| (id, i)).collect()
}

fn semester_column(lookups: &Lookups<'_>, semester_id: &str) -> String {
    lookups
        .semesters
        .get(semester_id)
        .map_or_else(|| semester_id.to_string(), |s| s.display_label())
}

pub struct HomeSummary {
    pub subjects: Table,
    pub semesters: Table,
}

pub fn home(catalog: &Catalog, session: &Session) -> HomeSummary {
    let needle = session.teacher.to_lowercase();

    let mut subjects = Table::new("My Subjects", ["SubjectCode", "Description", "Units", "Teacher"]);
    let mut mine: Vec<_> = catalog
        .subjects
        .iter()
        .filter(|s| s.teacher.to_lowercase().contains(&needle))
        .collect();
    mine.sort_by(|a, b| a.code.cmp(&b.code));
    for subject in mine {
        subjects.push(vec![
            Cell::text(&subject.code),
            Cell::text(&subject.description),
            Cell::Float(subject.units),
            Cell::text(&subject.teacher),
        ]);
    }

    let mut semesters = Table::new("Semesters", ["SemesterID", "SchoolYear", "Semester"]);
    let mut ordered: Vec<_> = catalog.semesters.iter().collect();
    ordered.sort_by(|a, b| aggregate::chronological(a, b));
    for semester in ordered {
        semesters.push(vec![
            Cell::text(&semester.id),
            Cell::text(&semester.school_year),
            Cell::text(&semester.label),
        ]);
    }

    HomeSummary {
        subjects,
        semesters,
    }
}

/// Distinct teacher names for the session picker.
pub fn teachers(catalog: &Catalog) -> Table {
    let mut table = Table::new("Teachers", ["Teacher"]);
    for name in catalog.teacher_names() {
        table.push(vec![Cell::Text(name)]);
    }
    table
}

/// Distinct subject and semester pairs the session teacher has graded.
///
/// Teacher names match case-insensitively on substring, as in the login picker.
pub fn teaching_assignments(catalog: &Catalog, session: &Session) -> Table {
    let lookups = Lookups::new(catalog);
    let positions = semester_positions(catalog, &lookups);
    let needle = session.teacher.to_lowercase();

    let rows = enriched_rows(catalog, &lookups, &GradeQuery::default());
    let mut assignments: Vec<&EnrichedEnrollment> = rows
        .iter()
        .filter(|r| {
            r.teacher
                .as_ref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();
    assignments.sort_by(|a, b| {
        let pa = positions.get(&a.semester_id).copied().unwrap_or(usize::MAX);
        let pb = positions.get(&b.semester_id).copied().unwrap_or(usize::MAX);
        pa.cmp(&pb)
            .then_with(|| a.semester_id.cmp(&b.semester_id))
            .then_with(|| a.subject_code.cmp(&b.subject_code))
            .then_with(|| a.teacher.cmp(&b.teacher))
    });
    assignments.dedup_by(|a, b| {
        a.semester_id == b.semester_id && a.subject_code == b.subject_code && a.teacher == b.teacher
    });

    let mut table = Table::new(
        format!("Teaching Assignments for {}", session.teacher),
        ["SubjectCode", "Teacher", "SchoolYear", "Semester", "SemesterID"],
    );
    for row in assignments {
        table.push(vec![
            Cell::text(&row.subject_code),
            Cell::opt_text(row.teacher.as_deref()),
            Cell::text(&row.school_year),
            Cell::text(&row.semester_label),
            Cell::text(&row.semester_id),
        ]);
    }
    table
}

pub fn class_grade_distribution(catalog: &Catalog, session: &Session, semester_id: &str) -> Table {
    let lookups = Lookups::new(catalog);
    let rows = enriched_rows(catalog, &lookups, &class_query(session, None, semester_id));

    let mut columns = vec!["SubjectCode".to_string(), "SubjectDescription".to_string()];
    columns.extend(GradeBand::ALL.iter().map(|b| b.label().to_string()));
    columns.push("Total".to_string());

    let mut table = Table::new(
        format!(
            "Grade Distribution for {} ({})",
            session.teacher,
            semester_column(&lookups, semester_id)
        ),
        columns,
    );
    for row in aggregate::distribution(&rows) {
        let mut cells = vec![Cell::Text(row.subject_code.clone()), Cell::Text(row.subject_description.clone())];
        cells.extend(GradeBand::ALL.iter().map(|band| Cell::count(row.count(*band))));
        cells.push(Cell::count(row.total));
        table.push(cells);
    }
    table
}

pub fn student_progress(catalog: &Catalog, filter: &ProgressFilter) -> Table {
    let lookups = Lookups::new(catalog);
    let query = progress_query(catalog, filter);
    let rows = enriched_rows(catalog, &lookups, &query);
    match filter {
        ProgressFilter::YearLevel(year_level) => {
            let pivot = SemesterPivot::gpa(&rows, &lookups);
            progress_table(
                format!("Progress Tracker for Year Level {year_level}"),
                &rows,
                &pivot,
                &lookups,
                " GPA",
            )
        }
        ProgressFilter::Course(course) => {
            let pivot = SemesterPivot::mean_grade(&rows, &lookups);
            progress_table(
                format!("Student Grade Trends for {course}"),
                &rows,
                &pivot,
                &lookups,
                "",
            )
        }
        ProgressFilter::Subject(subject) => {
            let pivot = SemesterPivot::mean_grade(&rows, &lookups);
            let code = query.subject_code.as_deref().unwrap_or(subject.as_str());
            progress_table(
                format!("Student Grade Trends for {code}"),
                &rows,
                &pivot,
                &lookups,
                "",
            )
        }
        ProgressFilter::StudentId(student_id) => {
            student_history(catalog, &lookups, *student_id, rows)
        }
    }
}

fn progress_table(
    title: String,
    rows: &[EnrichedEnrollment],
    pivot: &SemesterPivot,
    lookups: &Lookups<'_>,
    suffix: &str,
) -> Table {
    let mut columns = vec![
        "StudentID".to_string(),
        "Name".to_string(),
        "Course".to_string(),
        "YearLevel".to_string(),
    ];
    columns.extend(
        pivot
            .semester_ids
            .iter()
            .map(|id| format!("{}{suffix}", semester_column(lookups, id))),
    );
    columns.push("Overall Trend".to_string());

    let mut table = Table::new(title, columns);
    for &student_id in pivot.students.keys() {
        let Some(first) = rows.iter().find(|r| r.student_id == student_id) else {
            continue;
        };
        let mut cells = vec![
            Cell::Int(student_id),
            Cell::text(&first.student_name),
            Cell::text(&first.course),
            first.year_level.map_or(Cell::Empty, |y| Cell::Int(y.into())),
        ];
        cells.extend(pivot.series(student_id).into_iter().map(Cell::opt_float));
        cells.push(Cell::text(pivot.trend(student_id).as_str()));
        table.push(cells);
    }
    table
}

/// Every enrollment of one student with that semester's GPA repeated on each row.
fn student_history(
    catalog: &Catalog,
    lookups: &Lookups<'_>,
    student_id: i64,
    mut rows: Vec<EnrichedEnrollment>,
) -> Table {
    let pivot = SemesterPivot::gpa(&rows, lookups);
    let gpas = pivot.students.get(&student_id);

    let positions = semester_positions(catalog, lookups);
    rows.sort_by(|a, b| {
        let pa = positions.get(&a.semester_id).copied().unwrap_or(usize::MAX);
        let pb = positions.get(&b.semester_id).copied().unwrap_or(usize::MAX);
        pa.cmp(&pb)
            .then_with(|| a.semester_id.cmp(&b.semester_id))
            .then_with(|| a.subject_code.cmp(&b.subject_code))
    });

    let mut table = Table::new(
        format!("Semester GPA History for {} ({student_id})", lookups.student_name(student_id)),
        [
            "StudentID",
            "Name",
            "SemesterID",
            "SchoolYear",
            "Semester",
            "SubjectCode",
            "Units",
            "Grade",
            "SemesterGPA",
        ],
    );
    for row in &rows {
        let gpa = gpas.and_then(|g| g.get(&row.semester_id).copied().flatten());
        table.push(vec![
            Cell::Int(row.student_id),
            Cell::text(&row.student_name),
            Cell::text(&row.semester_id),
            Cell::text(&row.school_year),
            Cell::text(&row.semester_label),
            Cell::text(&row.subject_code),
            Cell::opt_float(row.units),
            Cell::opt_float(row.grade),
            Cell::opt_float(gpa),
        ]);
    }
    table
}

/// Pass, fail and missing rates per subject for the session teacher.
///
/// Difficulty is classified on the displayed, two-decimal fail rate.
pub fn subject_difficulty(catalog: &Catalog, session: &Session) -> Table {
    let lookups = Lookups::new(catalog);
    let rows = enriched_rows(catalog, &lookups, &GradeQuery::for_teacher(&session.teacher));

    let mut table = Table::new(
        format!("Performance Summary for {}", session.teacher),
        [
            "SubjectCode",
            "SubjectDescription",
            "Total",
            "Pass",
            "Fail",
            "Missing",
            "Success Rate (%)",
            "Fail Rate (%)",
            "Missing Rate (%)",
            "Difficulty Level",
        ],
    );
    for ((code, description), group) in
        aggregate::group_by(&rows, |r| (r.subject_code.clone(), r.subject_description.clone()))
    {
        let counts = OutcomeCounts::tally(group);
        let fail_rate = classify::rate(counts.fail, counts.total);
        let difficulty = DifficultyLevel::from_fail_rate(fail_rate.unwrap_or(0.0));
        table.push(vec![
            Cell::Text(code),
            Cell::Text(description),
            Cell::count(counts.total),
            Cell::count(counts.pass),
            Cell::count(counts.fail),
            Cell::count(counts.missing),
            Cell::opt_float(classify::rate(counts.pass, counts.total)),
            Cell::opt_float(fail_rate),
            Cell::opt_float(classify::rate(counts.missing, counts.total)),
            Cell::text(difficulty.as_str()),
        ]);
    }
    table
}

/// Enrollments of the session teacher flagged as at risk or missing a grade.
pub fn intervention_candidates(catalog: &Catalog, session: &Session) -> Table {
    let lookups = Lookups::new(catalog);
    let positions = semester_positions(catalog, &lookups);
    let mut rows = enriched_rows(catalog, &lookups, &GradeQuery::for_teacher(&session.teacher));
    rows.retain(|r| RiskFlag::of(r.grade) != RiskFlag::Safe);
    rows.sort_by(|a, b| {
        let pa = positions.get(&a.semester_id).copied().unwrap_or(usize::MAX);
        let pb = positions.get(&b.semester_id).copied().unwrap_or(usize::MAX);
        a.student_id
            .cmp(&b.student_id)
            .then_with(|| pa.cmp(&pb))
            .then_with(|| a.subject_code.cmp(&b.subject_code))
    });

    let mut table = Table::new(
        format!("Intervention Candidates for {}", session.teacher),
        [
            "StudentID",
            "StudentName",
            "SubjectCode",
            "SubjectDescription",
            "Semester",
            "CurrentGrade",
            "RiskFlag",
        ],
    );
    for row in &rows {
        table.push(vec![
            Cell::Int(row.student_id),
            Cell::text(&row.student_name),
            Cell::text(&row.subject_code),
            Cell::text(&row.subject_description),
            Cell::text(&row.semester_id),
            Cell::opt_float(row.grade),
            Cell::text(RiskFlag::of(row.grade).as_str()),
        ]);
    }
    table
}

pub fn submission_status(catalog: &Catalog, session: &Session) -> Table {
    let lookups = Lookups::new(catalog);
    let positions = semester_positions(catalog, &lookups);
    let rows = enriched_rows(catalog, &lookups, &GradeQuery::for_teacher(&session.teacher));

    let mut groups: Vec<_> = aggregate::group_by(&rows, |r| {
        (
            r.semester_id.clone(),
            r.subject_code.clone(),
            r.subject_description.clone(),
        )
    })
    .into_iter()
    .collect();
    groups.sort_by_key(|((semester_id, _, _), _)| {
        positions.get(semester_id).copied().unwrap_or(usize::MAX)
    });

    let mut table = Table::new(
        format!("Grade Submission Summary for {}", session.teacher),
        [
            "SemesterID",
            "SubjectCode",
            "SubjectDescription",
            "SubmittedGrades",
            "NoGrades",
            "TotalStudents",
            "SubmissionRate (%)",
        ],
    );
    for ((semester_id, code, description), group) in groups {
        let counts = OutcomeCounts::tally(group);
        let submitted = counts.submitted();
        table.push(vec![
            Cell::Text(semester_id),
            Cell::Text(code),
            Cell::Text(description),
            Cell::count(submitted),
            Cell::count(counts.missing),
            Cell::count(counts.total),
            Cell::opt_float(classify::rate(submitted, counts.total)),
        ]);
    }
    table
}

/// Enrollments matching every supplied filter. Teacher and subject match the aligned slot.
pub fn custom_query(catalog: &Catalog, query: &CustomQuery) -> Table {
    let lookups = Lookups::new(catalog);
    let rows = enriched_rows(catalog, &lookups, &query.grade_query(catalog));

    let mut table = Table::new(
        "Custom Query Results",
        [
            "StudentID",
            "StudentName",
            "SubjectCode",
            "SubjectDescription",
            "Teacher",
            "Grade",
            "SemesterID",
        ],
    );
    for row in &rows {
        table.push(vec![
            Cell::Int(row.student_id),
            Cell::text(&row.student_name),
            Cell::text(&row.subject_code),
            Cell::text(&row.subject_description),
            Cell::opt_text(row.teacher.as_deref()),
            Cell::opt_float(row.grade),
            Cell::text(&row.semester_id),
        ]);
    }
    table
}

pub struct GradeAnalytics {
    pub roster: Table,
    pub summary: Table,
    pub grade_counts: Table,
    pub status_counts: Table,
}

/// Roster, summary statistics and histogram data for one subject in one semester.
pub fn student_grade_analytics(
    catalog: &Catalog,
    session: &Session,
    subject_code: &str,
    semester_id: &str,
) -> GradeAnalytics {
    let lookups = Lookups::new(catalog);
    let mut rows = enriched_rows(
        catalog,
        &lookups,
        &class_query(session, Some(subject_code), semester_id),
    );
    rows.sort_by_key(|r| r.student_id);

    let label = format!("{subject_code} ({})", semester_column(&lookups, semester_id));

    let mut roster = Table::new(
        format!("Students in {label}"),
        ["StudentID", "Name", "Course", "YearLevel", "Grade", "Status"],
    );
    for row in &rows {
        roster.push(vec![
            Cell::Int(row.student_id),
            Cell::text(&row.student_name),
            Cell::text(&row.course),
            row.year_level.map_or(Cell::Empty, |y| Cell::Int(y.into())),
            Cell::opt_float(row.grade),
            Cell::text(GradeStatus::of(row.grade).as_str()),
        ]);
    }

    let mut summary = Table::new(
        format!("Grade Summary for {label}"),
        ["Mean", "Median", "Highest", "Lowest"],
    );
    if !rows.is_empty() {
        let stats = aggregate::summary_stats(rows.iter().map(|r| r.grade));
        summary.push(vec![
            Cell::opt_float(stats.mean),
            Cell::opt_float(stats.median),
            Cell::opt_float(stats.highest),
            Cell::opt_float(stats.lowest),
        ]);
    }

    let mut grade_counts = Table::new(format!("Grade Distribution for {label}"), ["Grade", "Count"]);
    for (grade, count) in aggregate::grade_counts(rows.iter().map(|r| r.grade)) {
        grade_counts.push(vec![Cell::Float(grade), Cell::count(count)]);
    }

    let mut status_counts = Table::new(format!("Pass vs Fail for {label}"), ["Status", "Count"]);
    if !rows.is_empty() {
        for status in [GradeStatus::Pass, GradeStatus::Fail, GradeStatus::MissingGrade] {
            let count = rows
                .iter()
                .filter(|r| GradeStatus::of(r.grade) == status)
                .count();
            status_counts.push(vec![Cell::text(status.as_str()), Cell::count(count)]);
        }
    }

    GradeAnalytics {
        roster,
        summary,
        grade_counts,
        status_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::models::{Enrollment, GradeRecord};
    use uuid::Uuid;

    fn smith() -> Session {
        Session {
            teacher: "Dr. Smith".to_string(),
        }
    }

    fn text<'a>(table: &'a Table, row: usize, column: &str) -> &'a str {
        table.cell(row, column).and_then(Cell::as_str).unwrap_or_default()
    }

    fn number(table: &Table, row: usize, column: &str) -> Option<f64> {
        table.cell(row, column).and_then(Cell::as_f64)
    }

    #[test]
    fn intervention_lists_only_unsafe_enrollments() {
        let catalog = Catalog {
            students: vec![fixtures::student(1001, "Avery Lee", "BSCS", 1)],
            subjects: vec![
                fixtures::subject("CS101", "Intro to Programming", 3.0, "Dr. Smith"),
                fixtures::subject("CS102", "Data Structures", 3.0, "Dr. Smith"),
            ],
            semesters: vec![fixtures::semester("SEM1", "2025-2026", "1st Semester")],
            grades: vec![fixtures::record(
                1001,
                "SEM1",
                &["CS101", "CS102"],
                &[Some(80.0), None],
                &["Dr. Smith", "Dr. Smith"],
            )],
        };

        let table = intervention_candidates(&catalog, &smith());
        assert_eq!(table.len(), 1);
        assert_eq!(text(&table, 0, "SubjectCode"), "CS102");
        assert_eq!(text(&table, 0, "RiskFlag"), "Missing Grade");
        assert_eq!(table.cell(0, "CurrentGrade"), Some(&Cell::Empty));
    }

    #[test]
    fn intervention_orders_by_student_then_semester() {
        let table = intervention_candidates(&fixtures::catalog(), &smith());
        assert_eq!(table.len(), 2);
        assert_eq!(text(&table, 0, "SubjectCode"), "CS101");
        assert_eq!(text(&table, 0, "RiskFlag"), "At Risk (<75)");
        assert_eq!(text(&table, 1, "SubjectCode"), "CS102");
        assert_eq!(text(&table, 1, "Semester"), "SEM2");
    }

    #[test]
    fn submission_rate_counts_present_grades() {
        let grades: Vec<_> = (1..=10)
            .map(|id| {
                let grade = if id <= 7 { Some(80.0) } else { None };
                fixtures::record(id, "SEM1", &["CS101"], &[grade], &["Dr. Smith"])
            })
            .collect();
        let catalog = Catalog {
            subjects: vec![fixtures::subject("CS101", "Intro to Programming", 3.0, "Dr. Smith")],
            semesters: vec![fixtures::semester("SEM1", "2025-2026", "1st Semester")],
            grades,
            ..Catalog::default()
        };

        let table = submission_status(&catalog, &smith());
        assert_eq!(table.len(), 1);
        assert_eq!(number(&table, 0, "SubmittedGrades"), Some(7.0));
        assert_eq!(number(&table, 0, "NoGrades"), Some(3.0));
        assert_eq!(number(&table, 0, "TotalStudents"), Some(10.0));
        assert_eq!(number(&table, 0, "SubmissionRate (%)"), Some(70.0));
    }

    #[test]
    fn submission_groups_follow_semester_order() {
        let table = submission_status(&fixtures::catalog(), &smith());
        let semesters: Vec<&str> = (0..table.len()).map(|i| text(&table, i, "SemesterID")).collect();
        assert_eq!(semesters, vec!["SEM1", "SEM2"]);
        assert_eq!(number(&table, 1, "SubmissionRate (%)"), Some(50.0));
    }

    #[test]
    fn distribution_keeps_only_the_teachers_slots() {
        let table = class_grade_distribution(&fixtures::catalog(), &smith(), "SEM1");
        assert_eq!(
            table.columns,
            vec![
                "SubjectCode",
                "SubjectDescription",
                "95-100",
                "90-94",
                "85-89",
                "80-84",
                "75-79",
                "Below 75",
                "No Grade",
                "Total"
            ]
        );
        assert_eq!(table.len(), 1);
        assert_eq!(text(&table, 0, "SubjectCode"), "CS101");
        assert_eq!(number(&table, 0, "95-100"), Some(1.0));
        assert_eq!(number(&table, 0, "85-89"), Some(1.0));
        assert_eq!(number(&table, 0, "Below 75"), Some(1.0));
        assert_eq!(number(&table, 0, "Total"), Some(3.0));
    }

    #[test]
    fn distribution_for_an_empty_semester_is_empty() {
        let table = class_grade_distribution(&fixtures::catalog(), &smith(), "SEM3");
        assert!(table.is_empty());
        assert!(table.title.contains("2025-2026 - 1st Semester"));
    }

    #[test]
    fn difficulty_classifies_fail_rate() {
        let table = subject_difficulty(&fixtures::catalog(), &smith());
        assert_eq!(table.len(), 2);

        assert_eq!(text(&table, 0, "SubjectCode"), "CS101");
        assert_eq!(number(&table, 0, "Fail Rate (%)"), Some(33.33));
        assert_eq!(number(&table, 0, "Success Rate (%)"), Some(66.67));
        assert_eq!(text(&table, 0, "Difficulty Level"), "Hard");

        assert_eq!(text(&table, 1, "SubjectCode"), "CS102");
        assert_eq!(number(&table, 1, "Missing"), Some(1.0));
        assert_eq!(number(&table, 1, "Missing Rate (%)"), Some(50.0));
        assert_eq!(text(&table, 1, "Difficulty Level"), "Easy");
    }

    #[test]
    fn custom_query_requires_a_filter() {
        assert_eq!(
            CustomQuery::new(None, Some("  "), None),
            Err(ValidationError::NoFilterSelected)
        );
    }

    #[test]
    fn custom_query_by_student_name_keeps_unresolved_subjects() {
        let query = CustomQuery::new(None, None, Some("kiara")).unwrap();
        let table = custom_query(&fixtures::catalog(), &query);
        assert_eq!(table.len(), 2);
        assert_eq!(text(&table, 1, "SubjectCode"), "XX999");
        assert_eq!(text(&table, 1, "SubjectDescription"), "Unknown");
        assert_eq!(table.cell(1, "Teacher"), Some(&Cell::Empty));
    }

    #[test]
    fn custom_query_subject_and_teacher_match_the_same_slot() {
        let query = CustomQuery::new(Some("MA101"), Some("Dr. Smith"), None).unwrap();
        assert!(custom_query(&fixtures::catalog(), &query).is_empty());

        let query = CustomQuery::new(Some("CS101"), Some("Dr. Smith"), None).unwrap();
        assert_eq!(custom_query(&fixtures::catalog(), &query).len(), 3);
    }

    #[test]
    fn custom_query_with_unknown_student_is_empty() {
        let query = CustomQuery::new(Some("CS101"), None, Some("nobody")).unwrap();
        assert!(custom_query(&fixtures::catalog(), &query).is_empty());
    }

    #[test]
    fn analytics_summarizes_one_class() {
        let analytics = student_grade_analytics(&fixtures::catalog(), &smith(), "CS101", "SEM1");

        assert_eq!(analytics.roster.len(), 3);
        assert_eq!(text(&analytics.roster, 1, "Status"), "Fail");
        assert_eq!(number(&analytics.summary, 0, "Mean"), Some(84.0));
        assert_eq!(number(&analytics.summary, 0, "Median"), Some(85.0));
        assert_eq!(number(&analytics.summary, 0, "Highest"), Some(95.0));
        assert_eq!(number(&analytics.summary, 0, "Lowest"), Some(72.0));
        assert_eq!(analytics.grade_counts.len(), 3);
        assert_eq!(number(&analytics.status_counts, 0, "Count"), Some(2.0));
        assert_eq!(number(&analytics.status_counts, 2, "Count"), Some(0.0));
    }

    #[test]
    fn analytics_for_unknown_class_is_empty() {
        let analytics = student_grade_analytics(&fixtures::catalog(), &smith(), "MA101", "SEM1");
        assert!(analytics.roster.is_empty());
        assert!(analytics.summary.is_empty());
        assert!(analytics.status_counts.is_empty());
    }

    #[test]
    fn progress_by_year_level_pivots_semester_gpa() {
        let table = student_progress(&fixtures::catalog(), &ProgressFilter::YearLevel(1));
        assert_eq!(
            table.columns,
            vec![
                "StudentID",
                "Name",
                "Course",
                "YearLevel",
                "2024-2025 - 1st Semester GPA",
                "2024-2025 - 2nd Semester GPA",
                "Overall Trend"
            ]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(number(&table, 0, "2024-2025 - 1st Semester GPA"), Some(2.48));
        assert_eq!(text(&table, 0, "Overall Trend"), "Improving");
        assert_eq!(text(&table, 1, "Overall Trend"), "Declining");
    }

    #[test]
    fn progress_by_subject_description_uses_mean_grades() {
        let table = student_progress(
            &fixtures::catalog(),
            &ProgressFilter::Subject("Data Structures".to_string()),
        );
        assert_eq!(table.len(), 2);
        assert_eq!(number(&table, 0, "2024-2025 - 2nd Semester"), Some(92.0));
        assert_eq!(table.cell(1, "2024-2025 - 2nd Semester"), Some(&Cell::Empty));
        assert_eq!(text(&table, 0, "Overall Trend"), "–");
    }

    #[test]
    fn progress_by_course_covers_only_that_course() {
        let table = student_progress(&fixtures::catalog(), &ProgressFilter::Course("BSIT".to_string()));
        assert_eq!(table.len(), 1);
        assert_eq!(number(&table, 0, "StudentID"), Some(1003.0));
        assert_eq!(number(&table, 0, "2024-2025 - 1st Semester"), Some(91.5));
    }

    #[test]
    fn progress_by_student_repeats_semester_gpa() {
        let table = student_progress(&fixtures::catalog(), &ProgressFilter::StudentId(1001));
        assert_eq!(table.len(), 3);
        assert_eq!(text(&table, 0, "SubjectCode"), "CS101");
        assert_eq!(text(&table, 1, "SubjectCode"), "MA101");
        assert_eq!(number(&table, 0, "SemesterGPA"), Some(2.48));
        assert_eq!(number(&table, 1, "SemesterGPA"), Some(2.48));
        assert_eq!(text(&table, 2, "SemesterID"), "SEM2");
        assert_eq!(number(&table, 2, "SemesterGPA"), Some(3.7));
    }

    #[test]
    fn home_lists_assigned_subjects_and_ordered_semesters() {
        let summary = home(&fixtures::catalog(), &smith());
        assert_eq!(summary.subjects.len(), 2);
        assert_eq!(text(&summary.subjects, 0, "SubjectCode"), "CS101");
        let ids: Vec<&str> = (0..summary.semesters.len())
            .map(|i| text(&summary.semesters, i, "SemesterID"))
            .collect();
        assert_eq!(ids, vec!["SEM1", "SEM2", "SEM3"]);
    }

    #[test]
    fn teaching_assignments_are_distinct() {
        let session = Session {
            teacher: "smith".to_string(),
        };
        let table = teaching_assignments(&fixtures::catalog(), &session);
        assert_eq!(table.len(), 2);
        assert_eq!(text(&table, 0, "SubjectCode"), "CS101");
        assert_eq!(text(&table, 0, "Semester"), "1st Semester");
        assert_eq!(text(&table, 1, "SubjectCode"), "CS102");
    }

    #[test]
    fn teacher_picker_lists_all_names() {
        let table = teachers(&fixtures::catalog());
        assert_eq!(table.len(), 2);
        assert_eq!(text(&table, 0, "Teacher"), "Dr. Jones");
    }

    #[test]
    fn progress_query_resolves_subject_description() {
        let catalog = fixtures::catalog();
        let report = Report::StudentProgress(ProgressFilter::Subject("Data Structures".to_string()));
        let query = report.grade_query(&smith(), &catalog).unwrap();
        assert_eq!(query.subject_code.as_deref(), Some("CS102"));
        assert_eq!(Report::Home.grade_query(&smith(), &catalog), None);
    }

    #[test]
    fn out_of_range_grade_is_missing_in_every_report() {
        let catalog = Catalog {
            students: vec![fixtures::student(1001, "Avery Lee", "BSCS", 1)],
            subjects: vec![fixtures::subject("CS101", "Intro to Programming", 3.0, "Dr. Smith")],
            semesters: vec![fixtures::semester("SEM1", "2024-2025", "1st Semester")],
            grades: vec![GradeRecord {
                id: Uuid::new_v4(),
                student_id: 1001,
                semester_id: "SEM1".to_string(),
                enrollments: vec![Enrollment {
                    subject_code: "CS101".to_string(),
                    grade: Some(105.0),
                    teacher: Some("Dr. Smith".to_string()),
                }],
            }],
        };

        let distribution = class_grade_distribution(&catalog, &smith(), "SEM1");
        assert_eq!(number(&distribution, 0, "No Grade"), Some(1.0));
        assert_eq!(number(&distribution, 0, "95-100"), Some(0.0));

        let submission = submission_status(&catalog, &smith());
        assert_eq!(number(&submission, 0, "SubmittedGrades"), Some(0.0));
        assert_eq!(number(&submission, 0, "NoGrades"), Some(1.0));

        let analytics = student_grade_analytics(&catalog, &smith(), "CS101", "SEM1");
        assert_eq!(text(&analytics.roster, 0, "Status"), "Missing Grade");
        assert_eq!(text(&analytics.status_counts, 2, "Status"), "Missing Grade");
        assert_eq!(number(&analytics.status_counts, 2, "Count"), Some(1.0));
        assert_eq!(analytics.summary.cell(0, "Mean"), Some(&Cell::Empty));
        assert!(analytics.grade_counts.is_empty());
    }

    #[test]
    fn prefetched_records_give_the_same_tables() {
        let catalog = fixtures::catalog();
        let reports = vec![
            Report::TeachingAssignments,
            Report::ClassGradeDistribution {
                semester_id: "SEM1".to_string(),
            },
            Report::StudentProgress(ProgressFilter::YearLevel(1)),
            Report::StudentProgress(ProgressFilter::Course("BSIT".to_string())),
            Report::StudentProgress(ProgressFilter::Subject("Data Structures".to_string())),
            Report::StudentProgress(ProgressFilter::StudentId(1001)),
            Report::SubjectDifficulty,
            Report::InterventionCandidates,
            Report::SubmissionStatus,
            Report::CustomQuery(CustomQuery::new(Some("CS101"), None, Some("e")).unwrap()),
            Report::GradeAnalytics {
                subject_code: "CS101".to_string(),
                semester_id: "SEM1".to_string(),
            },
        ];

        for report in reports {
            let query = report.grade_query(&smith(), &catalog).unwrap();
            let prefetched = Catalog {
                grades: catalog.grade_records(&query).into_iter().cloned().collect(),
                ..catalog.clone()
            };
            assert_eq!(
                report.run(&prefetched, &smith()),
                report.run(&catalog, &smith()),
                "{report:?}"
            );
        }
    }

    #[test]
    fn reports_are_idempotent() {
        let catalog = fixtures::catalog();
        let report = Report::SubjectDifficulty;
        assert_eq!(report.run(&catalog, &smith()), report.run(&catalog, &smith()));
    }
}
