use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::classify::{self, recorded_grade, GradeBand, GradeStatus, Trend};
use crate::enrich::Lookups;
use crate::models::{EnrichedEnrollment, Semester};

pub fn group_by<'a, K, F>(rows: &'a [EnrichedEnrollment], key: F) -> BTreeMap<K, Vec<&'a EnrichedEnrollment>>
where
    K: Ord,
    F: Fn(&EnrichedEnrollment) -> K,
{
    let mut groups: BTreeMap<K, Vec<&EnrichedEnrollment>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

/// Rank of a term label within its school year: `1st Semester` < `2nd Semester` < `Summer`.
fn term_rank(label: &str) -> u32 {
    let label = label.trim().to_lowercase();
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    if let Ok(n) = digits.parse::<u32>() {
        return n;
    }
    if label.contains("summer") {
        return 3;
    }
    u32::MAX
}

pub fn chronological(a: &Semester, b: &Semester) -> Ordering {
    a.school_year
        .cmp(&b.school_year)
        .then_with(|| term_rank(&a.label).cmp(&term_rank(&b.label)))
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts semester ids chronologically; ids with no semester entry go last, by id.
pub fn order_semester_ids(ids: &mut [String], lookups: &Lookups<'_>) {
    ids.sort_by(|a, b| {
        match (
            lookups.semesters.get(a.as_str()),
            lookups.semesters.get(b.as_str()),
        ) {
            (Some(x), Some(y)) => chronological(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub subject_code: String,
    pub subject_description: String,
    /// Counts in `GradeBand::ALL` order.
    pub counts: [usize; 7],
    pub total: usize,
}

impl DistributionRow {
    pub fn count(&self, band: GradeBand) -> usize {
        GradeBand::ALL
            .iter()
            .position(|b| *b == band)
            .map_or(0, |i| self.counts[i])
    }
}

pub fn distribution(rows: &[EnrichedEnrollment]) -> Vec<DistributionRow> {
    group_by(rows, |r| (r.subject_code.clone(), r.subject_description.clone()))
        .into_iter()
        .map(|((subject_code, subject_description), group)| {
            let mut counts = [0usize; 7];
            for row in &group {
                let band = GradeBand::of(row.grade);
                if let Some(i) = GradeBand::ALL.iter().position(|b| *b == band) {
                    counts[i] += 1;
                }
            }
            DistributionRow {
                subject_code,
                subject_description,
                counts,
                total: counts.iter().sum(),
            }
        })
        .filter(|row| row.total > 0)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeCounts {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub missing: usize,
}

impl OutcomeCounts {
    pub fn tally<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a EnrichedEnrollment>,
    {
        rows.into_iter().fold(Self::default(), |mut acc, row| {
            acc.total += 1;
            match GradeStatus::of(row.grade) {
                GradeStatus::Pass => acc.pass += 1,
                GradeStatus::Fail => acc.fail += 1,
                GradeStatus::MissingGrade => acc.missing += 1,
            }
            acc
        })
    }

    pub fn submitted(&self) -> usize {
        self.pass + self.fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Statistics over present grades only; missing grades are skipped, not counted as zero.
pub fn summary_stats<I>(grades: I) -> SummaryStats
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut values: Vec<f64> = grades.into_iter().filter_map(recorded_grade).collect();
    let count = values.len();
    SummaryStats {
        count,
        highest: values.iter().copied().reduce(f64::max),
        lowest: values.iter().copied().reduce(f64::min),
        mean: mean(&values),
        median: median(&mut values),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Per-student values keyed by semester, with the semester columns in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct SemesterPivot {
    pub semester_ids: Vec<String>,
    pub students: BTreeMap<i64, HashMap<String, Option<f64>>>,
}

impl SemesterPivot {
    fn build<F>(rows: &[EnrichedEnrollment], lookups: &Lookups<'_>, reduce: F) -> Self
    where
        F: Fn(&[&EnrichedEnrollment]) -> Option<f64>,
    {
        let mut students: BTreeMap<i64, HashMap<String, Option<f64>>> = BTreeMap::new();
        for ((student_id, semester_id), group) in
            group_by(rows, |r| (r.student_id, r.semester_id.clone()))
        {
            students
                .entry(student_id)
                .or_default()
                .insert(semester_id, reduce(&group));
        }

        let mut semester_ids: Vec<String> = rows.iter().map(|r| r.semester_id.clone()).collect();
        semester_ids.sort();
        semester_ids.dedup();
        order_semester_ids(&mut semester_ids, lookups);

        Self {
            semester_ids,
            students,
        }
    }

    /// Credit-weighted semester GPA per student. Unresolved subjects carry no units.
    pub fn gpa(rows: &[EnrichedEnrollment], lookups: &Lookups<'_>) -> Self {
        Self::build(rows, lookups, |group| {
            classify::semester_gpa(group.iter().map(|r| (r.grade, r.units.unwrap_or(0.0))))
        })
    }

    /// Mean raw grade per student and semester.
    pub fn mean_grade(rows: &[EnrichedEnrollment], lookups: &Lookups<'_>) -> Self {
        Self::build(rows, lookups, |group| {
            let grades: Vec<f64> = group.iter().filter_map(|r| recorded_grade(r.grade)).collect();
            mean(&grades)
        })
    }

    /// Values for one student in column order; `None` where absent.
    pub fn series(&self, student_id: i64) -> Vec<Option<f64>> {
        let values = self.students.get(&student_id);
        self.semester_ids
            .iter()
            .map(|id| values.and_then(|v| v.get(id).copied().flatten()))
            .collect()
    }

    pub fn trend(&self, student_id: i64) -> Trend {
        let points: Vec<f64> = self.series(student_id).into_iter().flatten().collect();
        Trend::across(&points)
    }
}

/// Occurrence count per distinct present grade, ascending by grade.
pub fn grade_counts<I>(grades: I) -> Vec<(f64, usize)>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut values: Vec<f64> = grades.into_iter().filter_map(recorded_grade).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for value in values {
        match counts.last_mut() {
            Some((last, n)) if *last == value => *n += 1,
            _ => counts.push((value, 1)),
        }
    }
    counts
}
