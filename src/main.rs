use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod classify;
mod config;
mod db;
mod enrich;
mod models;
mod normalize;
mod report;
mod store;
mod table;
mod validate;

#[cfg(test)]
mod fixtures;

use crate::config::Config;
use crate::models::Session;
use crate::report::{CustomQuery, ProgressFilter, Report};
use crate::store::GradeQuery;
use crate::table::Table;

#[derive(Parser)]
#[command(name = "faculty-dashboard")]
#[command(about = "Grade analytics reports for faculty", long_about = None)]
struct Cli {
    /// Session teacher (defaults to DASHBOARD_TEACHER)
    #[arg(long, global = true)]
    teacher: Option<String>,
    #[arg(long, global = true, value_enum, default_value_t = Format::Markdown)]
    format: Format,
    /// Write the report to a file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import enrollments from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List every teacher with recorded grades
    Teachers,
    /// My subjects and the semester list
    Home,
    /// Grade distribution per subject for one semester
    Distribution {
        /// Semester id or "SchoolYear - Semester" label
        #[arg(long)]
        semester: String,
    },
    /// Semester-by-semester progress with overall trend
    #[command(group(
        ArgGroup::new("scope")
            .args(["year_level", "course", "subject", "student_id"])
            .required(true)
            .multiple(false)
    ))]
    Progress {
        #[arg(long)]
        year_level: Option<i32>,
        #[arg(long)]
        course: Option<String>,
        /// Subject description or code
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        student_id: Option<String>,
    },
    /// Pass, fail and missing rates with difficulty level per subject
    Difficulty,
    /// Students at risk or missing a grade
    Intervention,
    /// Grade submission rate per subject and semester
    Submission,
    /// Ad hoc search by subject, teacher and student name
    Query {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        teacher_name: Option<String>,
        #[arg(long)]
        student_name: Option<String>,
    },
    /// Class roster and statistics for one subject and semester
    Analytics {
        #[arg(long, requires = "semester")]
        subject: Option<String>,
        /// Semester id or "SchoolYear - Semester" label
        #[arg(long, requires = "subject")]
        semester: Option<String>,
    },
}

/// Turns report subcommands into a `Report`, validating input before any query runs.
///
/// Semester references are kept as typed and resolved against the loaded semesters later.
fn requested_report(command: &Commands) -> anyhow::Result<Option<Report>> {
    let report = match command {
        Commands::InitDb | Commands::Seed | Commands::Import { .. } | Commands::Teachers => {
            return Ok(None)
        }
        Commands::Home => Report::Home,
        Commands::Distribution { semester } => Report::ClassGradeDistribution {
            semester_id: validate::require(semester, "semester")?,
        },
        Commands::Progress {
            year_level,
            course,
            subject,
            student_id,
        } => {
            let filter = if let Some(level) = year_level {
                ProgressFilter::YearLevel(*level)
            } else if let Some(course) = course {
                ProgressFilter::Course(validate::require(course, "course")?)
            } else if let Some(subject) = subject {
                ProgressFilter::Subject(validate::require(subject, "subject")?)
            } else if let Some(id) = student_id {
                ProgressFilter::StudentId(validate::parse_student_id(id)?)
            } else {
                return Err(validate::ValidationError::NoFilterSelected.into());
            };
            Report::StudentProgress(filter)
        }
        Commands::Difficulty => Report::SubjectDifficulty,
        Commands::Intervention => Report::InterventionCandidates,
        Commands::Submission => Report::SubmissionStatus,
        Commands::Query {
            subject,
            teacher_name,
            student_name,
        } => Report::CustomQuery(CustomQuery::new(
            subject.as_deref(),
            teacher_name.as_deref(),
            student_name.as_deref(),
        )?),
        Commands::Analytics { subject, semester } => match (subject, semester) {
            (Some(subject), Some(semester)) => Report::GradeAnalytics {
                subject_code: validate::require(subject, "subject")?,
                semester_id: validate::require(semester, "semester")?,
            },
            _ => Report::TeachingAssignments,
        },
    };
    Ok(Some(report))
}

fn resolve_semester(report: Report, catalog: &store::Catalog) -> anyhow::Result<Report> {
    Ok(match report {
        Report::ClassGradeDistribution { semester_id } => Report::ClassGradeDistribution {
            semester_id: validate::resolve_semester(&catalog.semesters, &semester_id)?
                .id
                .clone(),
        },
        Report::GradeAnalytics {
            subject_code,
            semester_id,
        } => Report::GradeAnalytics {
            subject_code,
            semester_id: validate::resolve_semester(&catalog.semesters, &semester_id)?
                .id
                .clone(),
        },
        other => other,
    })
}

fn render(tables: &[Table], format: Format, session: Option<&Session>) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(tables)?),
        Format::Csv => {
            let parts = tables
                .iter()
                .map(table::to_csv)
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(parts.join("\n"))
        }
        Format::Markdown => {
            let mut output = String::new();
            let _ = writeln!(output, "# Faculty Grade Report");
            match session {
                Some(session) => {
                    let _ = writeln!(
                        output,
                        "Generated {} for {}",
                        Utc::now().format("%Y-%m-%d %H:%M UTC"),
                        session.teacher
                    );
                }
                None => {
                    let _ = writeln!(output, "Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
                }
            }
            for table in tables {
                let _ = writeln!(output);
                output.push_str(&table::to_markdown(table));
            }
            Ok(output)
        }
    }
}

fn emit(
    tables: &[Table],
    format: Format,
    out: Option<&PathBuf>,
    session: Option<&Session>,
) -> anyhow::Result<()> {
    if format != Format::Markdown {
        for table in tables.iter().filter(|t| t.is_empty()) {
            eprintln!("No records found for {}.", table.title);
        }
    }

    let rendered = render(tables, format, session)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faculty_grade_dashboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let report = requested_report(&cli.command)?;
    let session = match report {
        Some(_) => Some(validate::session(
            cli.teacher.as_deref().or(config.default_teacher.as_deref()),
        )?),
        None => None,
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let appended = db::import_csv(&pool, &csv).await?;
            println!("Imported {appended} new enrollments from {}.", csv.display());
        }
        Commands::Teachers => {
            let mut catalog = db::fetch_reference(&pool).await?;
            catalog.grades = db::fetch_grade_records(&pool, &GradeQuery::default()).await?;
            emit(
                &[report::teachers(&catalog)],
                cli.format,
                cli.out.as_ref(),
                None,
            )?;
        }
        _ => {
            let (Some(report), Some(session)) = (report, session) else {
                return Ok(());
            };

            let mut catalog = db::fetch_reference(&pool).await?;
            let report = resolve_semester(report, &catalog)?;
            if let Some(query) = report.grade_query(&session, &catalog) {
                catalog.grades = db::fetch_grade_records(&pool, &query).await?;
            }

            tracing::info!(teacher = %session.teacher, ?report, "running report");
            let tables = report.run(&catalog, &session);
            emit(&tables, cli.format, cli.out.as_ref(), Some(&session))?;
        }
    }

    Ok(())
}
