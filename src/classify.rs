/// Lowest passing percentage grade.
pub const PASSING_MARK: f64 = 75.0;

/// A stored grade counts only when it is a finite percentage in 0..=100.
///
/// Anything else is treated as missing by every classifier.
pub fn recorded_grade(grade: Option<f64>) -> Option<f64> {
    grade.filter(|g| (0.0..=100.0).contains(g))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradeStatus {
    Pass,
    Fail,
    MissingGrade,
}

impl GradeStatus {
    pub fn of(grade: Option<f64>) -> Self {
        match recorded_grade(grade) {
            None => Self::MissingGrade,
            Some(g) if g >= PASSING_MARK => Self::Pass,
            Some(_) => Self::Fail,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::MissingGrade => "Missing Grade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFlag {
    MissingGrade,
    AtRisk,
    Safe,
}

impl RiskFlag {
    pub fn of(grade: Option<f64>) -> Self {
        match GradeStatus::of(grade) {
            GradeStatus::MissingGrade => Self::MissingGrade,
            GradeStatus::Fail => Self::AtRisk,
            GradeStatus::Pass => Self::Safe,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingGrade => "Missing Grade",
            Self::AtRisk => "At Risk (<75)",
            Self::Safe => "Safe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyLevel {
    Easy,
    Moderate,
    Hard,
    VeryHard,
}

impl DifficultyLevel {
    /// `fail_rate` is a percentage in 0..=100; lower bounds are inclusive.
    pub fn from_fail_rate(fail_rate: f64) -> Self {
        match fail_rate {
            r if r >= 40.0 => Self::VeryHard,
            r if r >= 25.0 => Self::Hard,
            r if r >= 10.0 => Self::Moderate,
            _ => Self::Easy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Moderate => "Moderate",
            Self::Hard => "Hard",
            Self::VeryHard => "Very Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl Trend {
    /// Compares the first and last of chronologically ordered observations.
    pub fn across(points: &[f64]) -> Self {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() >= 2 => {
                if last > first {
                    Self::Improving
                } else if last < first {
                    Self::Declining
                } else {
                    Self::Stable
                }
            }
            _ => Self::InsufficientData,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "Improving",
            Self::Declining => "Declining",
            Self::Stable => "Stable",
            Self::InsufficientData => "–",
        }
    }
}

/// Distribution bands, declared from highest to lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeBand {
    From95,
    From90,
    From85,
    From80,
    From75,
    Below75,
    NoGrade,
}

impl GradeBand {
    pub const ALL: [GradeBand; 7] = [
        Self::From95,
        Self::From90,
        Self::From85,
        Self::From80,
        Self::From75,
        Self::Below75,
        Self::NoGrade,
    ];

    pub fn of(grade: Option<f64>) -> Self {
        match recorded_grade(grade) {
            Some(g) if g >= 95.0 => Self::From95,
            Some(g) if g >= 90.0 => Self::From90,
            Some(g) if g >= 85.0 => Self::From85,
            Some(g) if g >= 80.0 => Self::From80,
            Some(g) if g >= PASSING_MARK => Self::From75,
            Some(_) => Self::Below75,
            None => Self::NoGrade,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::From95 => "95-100",
            Self::From90 => "90-94",
            Self::From85 => "85-89",
            Self::From80 => "80-84",
            Self::From75 => "75-79",
            Self::Below75 => "Below 75",
            Self::NoGrade => "No Grade",
        }
    }
}

pub fn gpa_point(grade: Option<f64>) -> f64 {
    let Some(grade) = recorded_grade(grade) else {
        return 0.0;
    };
    match grade {
        g if g >= 97.0 => 4.0,
        g if g >= 93.0 => 4.0,
        g if g >= 90.0 => 3.7,
        g if g >= 87.0 => 3.3,
        g if g >= 83.0 => 3.0,
        g if g >= 80.0 => 2.7,
        g if g >= 77.0 => 2.3,
        g if g >= 73.0 => 2.0,
        g if g >= 70.0 => 1.7,
        g if g >= 67.0 => 1.3,
        g if g >= 65.0 => 1.0,
        _ => 0.0,
    }
}

/// Credit-weighted GPA over `(grade, units)` pairs, rounded to two decimals.
///
/// Returns `None` when the units sum to zero.
pub fn semester_gpa<I>(enrollments: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, f64)>,
{
    let (weighted, units) = enrollments
        .into_iter()
        .fold((0.0, 0.0), |(weighted, units), (grade, u)| {
            (weighted + gpa_point(grade) * u, units + u)
        });
    if units > 0.0 {
        Some(round2(weighted / units))
    } else {
        None
    }
}

/// `part / total` as a percentage rounded to two decimals; `None` when `total` is zero.
pub fn rate(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(round2(part as f64 / total as f64 * 100.0))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
