use std::collections::BTreeMap;

use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::classify::recorded_grade;
use crate::models::{Enrollment, GradeRecord, Semester, Student, Subject};
use crate::normalize::{align, merge_enrollment, to_arrays};
use crate::store::{Catalog, GradeQuery};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (1001_i64, "Avery Lee", "BSCS", 1),
        (1002, "Jules Moreno", "BSCS", 1),
        (1003, "Kiara Patel", "BSIT", 2),
        (1004, "Noel Santos", "BSIT", 2),
    ];
    for (id, name, course, year_level) in students {
        sqlx::query(
            r#"
            INSERT INTO faculty_dashboard.students (id, name, course, year_level)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, course = EXCLUDED.course, year_level = EXCLUDED.year_level
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(course)
        .bind(year_level)
        .execute(pool)
        .await?;
    }

    let subjects = vec![
        ("CS101", "Introduction to Computing", 3.0, "Dr. Smith"),
        ("CS102", "Computer Programming 1", 3.0, "Dr. Smith"),
        ("IT201", "Data Structures and Algorithms", 3.0, "Prof. Reyes"),
        ("MA101", "College Algebra", 2.0, "Prof. Reyes"),
    ];
    for (code, description, units, teacher) in subjects {
        sqlx::query(
            r#"
            INSERT INTO faculty_dashboard.subjects (code, description, units, teacher)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET description = EXCLUDED.description, units = EXCLUDED.units, teacher = EXCLUDED.teacher
            "#,
        )
        .bind(code)
        .bind(description)
        .bind(units)
        .bind(teacher)
        .execute(pool)
        .await?;
    }

    let semesters = vec![
        ("SEM1", "2024-2025", "1st Semester"),
        ("SEM2", "2024-2025", "2nd Semester"),
        ("SEM3", "2025-2026", "1st Semester"),
    ];
    for (id, school_year, semester) in semesters {
        sqlx::query(
            r#"
            INSERT INTO faculty_dashboard.semesters (id, school_year, semester)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET school_year = EXCLUDED.school_year, semester = EXCLUDED.semester
            "#,
        )
        .bind(id)
        .bind(school_year)
        .bind(semester)
        .execute(pool)
        .await?;
    }

    let records: Vec<(i64, &str, Vec<&str>, Vec<Option<f64>>, Vec<&str>)> = vec![
        (
            1001,
            "SEM1",
            vec!["CS101", "MA101"],
            vec![Some(88.0), Some(79.0)],
            vec!["Dr. Smith", "Prof. Reyes"],
        ),
        (1001, "SEM2", vec!["CS102"], vec![Some(93.0)], vec!["Dr. Smith"]),
        (
            1002,
            "SEM1",
            vec!["CS101", "MA101"],
            vec![Some(71.0), None],
            vec!["Dr. Smith", "Prof. Reyes"],
        ),
        (1002, "SEM2", vec!["CS102"], vec![None], vec!["Dr. Smith"]),
        (
            1003,
            "SEM2",
            vec!["CS102", "IT201"],
            vec![Some(84.0), Some(68.0)],
            vec!["Dr. Smith", "Prof. Reyes"],
        ),
        (
            1003,
            "SEM3",
            vec!["IT201"],
            vec![Some(90.0)],
            vec!["Prof. Reyes"],
        ),
        (
            1004,
            "SEM3",
            vec!["CS101", "IT201"],
            vec![Some(96.0)],
            vec!["Dr. Smith", "Prof. Reyes"],
        ),
    ];
    for (student_id, semester_id, codes, grades, teachers) in records {
        let codes: Vec<String> = codes.into_iter().map(str::to_string).collect();
        let teachers: Vec<Option<String>> =
            teachers.into_iter().map(|t| Some(t.to_string())).collect();
        write_grade_record(pool, Uuid::new_v4(), student_id, semester_id, codes, grades, teachers)
            .await?;
    }

    Ok(())
}

async fn write_grade_record(
    pool: &PgPool,
    id: Uuid,
    student_id: i64,
    semester_id: &str,
    codes: Vec<String>,
    grades: Vec<Option<f64>>,
    teachers: Vec<Option<String>>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO faculty_dashboard.grade_records
        (id, student_id, semester_id, subject_codes, grades, teachers)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (student_id, semester_id) DO UPDATE
        SET subject_codes = EXCLUDED.subject_codes,
            grades = EXCLUDED.grades,
            teachers = EXCLUDED.teachers
        "#,
    )
    .bind(id)
    .bind(student_id)
    .bind(semester_id)
    .bind(codes)
    .bind(grades)
    .bind(teachers)
    .execute(pool)
    .await?;
    Ok(())
}

/// Loads students, subjects and semesters. Grade records are left empty.
pub async fn fetch_reference(pool: &PgPool) -> anyhow::Result<Catalog> {
    let students = sqlx::query(
        "SELECT id, name, course, year_level FROM faculty_dashboard.students ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load students")?
    .into_iter()
    .map(|row| -> Result<Student, sqlx::Error> {
        Ok(Student {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            course: row.try_get("course")?,
            year_level: row.try_get("year_level")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let subjects = sqlx::query(
        "SELECT code, description, units, teacher FROM faculty_dashboard.subjects ORDER BY code",
    )
    .fetch_all(pool)
    .await
    .context("failed to load subjects")?
    .into_iter()
    .map(|row| -> Result<Subject, sqlx::Error> {
        Ok(Subject {
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            units: row.try_get("units")?,
            teacher: row.try_get("teacher")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let semesters = sqlx::query(
        "SELECT id, school_year, semester FROM faculty_dashboard.semesters ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("failed to load semesters")?
    .into_iter()
    .map(|row| -> Result<Semester, sqlx::Error> {
        Ok(Semester {
            id: row.try_get("id")?,
            school_year: row.try_get("school_year")?,
            label: row.try_get("semester")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        students = students.len(),
        subjects = subjects.len(),
        semesters = semesters.len(),
        "reference collections loaded"
    );

    Ok(Catalog {
        students,
        subjects,
        semesters,
        grades: Vec::new(),
    })
}

pub async fn fetch_grade_records(
    pool: &PgPool,
    query: &GradeQuery,
) -> anyhow::Result<Vec<GradeRecord>> {
    let mut sql = String::from(
        "SELECT g.id, g.student_id, g.semester_id, g.subject_codes, g.grades, g.teachers \
         FROM faculty_dashboard.grade_records g \
         LEFT JOIN faculty_dashboard.students s ON s.id = g.student_id \
         WHERE TRUE",
    );
    let mut param = 0;

    if query.teacher.is_some() {
        param += 1;
        sql.push_str(&format!(" AND ${param} = ANY(g.teachers)"));
    }
    if query.subject_code.is_some() {
        param += 1;
        sql.push_str(&format!(" AND ${param} = ANY(g.subject_codes)"));
    }
    if query.semester_id.is_some() {
        param += 1;
        sql.push_str(&format!(" AND g.semester_id = ${param}"));
    }
    if query.student_ids.is_some() {
        param += 1;
        sql.push_str(&format!(" AND g.student_id = ANY(${param})"));
    }
    if query.course.is_some() {
        param += 1;
        sql.push_str(&format!(" AND s.course = ${param}"));
    }
    if query.year_level.is_some() {
        param += 1;
        sql.push_str(&format!(" AND s.year_level = ${param}"));
    }
    sql.push_str(" ORDER BY g.student_id, g.semester_id, g.id");

    let mut rows = sqlx::query(&sql);
    if let Some(value) = &query.teacher {
        rows = rows.bind(value);
    }
    if let Some(value) = &query.subject_code {
        rows = rows.bind(value);
    }
    if let Some(value) = &query.semester_id {
        rows = rows.bind(value);
    }
    if let Some(value) = &query.student_ids {
        rows = rows.bind(value.as_slice());
    }
    if let Some(value) = &query.course {
        rows = rows.bind(value);
    }
    if let Some(value) = query.year_level {
        rows = rows.bind(value);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to load grade records")?;
    let mut grades = Vec::with_capacity(records.len());

    for row in records {
        grades.push(align(
            row.try_get("id")?,
            row.try_get("student_id")?,
            row.try_get("semester_id")?,
            row.try_get("subject_codes")?,
            row.try_get("grades")?,
            row.try_get("teachers")?,
        ));
    }

    tracing::info!(records = grades.len(), ?query, "grade records loaded");
    Ok(grades)
}

/// Imports one enrollment per CSV line.
///
/// Lines are grouped into the grade record for their student and semester. An existing
/// slot for the same subject is overwritten; new subjects are appended to all three arrays.
/// Grades outside 0..=100 are stored as missing.
/// Returns the number of slots appended.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_id: i64,
        semester_id: String,
        subject_code: String,
        grade: Option<f64>,
        teacher: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut grouped: BTreeMap<(i64, String), Vec<Enrollment>> = BTreeMap::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let grade = recorded_grade(row.grade);
        if grade.is_none() && row.grade.is_some() {
            tracing::warn!(
                student_id = row.student_id,
                subject = %row.subject_code,
                grade = ?row.grade,
                "grade outside 0..=100 imported as missing"
            );
        }
        grouped
            .entry((row.student_id, row.semester_id))
            .or_default()
            .push(Enrollment {
                subject_code: row.subject_code,
                grade,
                teacher: row.teacher.filter(|t| !t.trim().is_empty()),
            });
    }

    let mut appended = 0usize;

    for ((student_id, semester_id), incoming) in grouped {
        let existing = sqlx::query(
            r#"
            SELECT id, subject_codes, grades, teachers
            FROM faculty_dashboard.grade_records
            WHERE student_id = $1 AND semester_id = $2
            "#,
        )
        .bind(student_id)
        .bind(&semester_id)
        .fetch_optional(pool)
        .await?;

        let mut record = match existing {
            Some(row) => align(
                row.try_get("id")?,
                student_id,
                semester_id.clone(),
                row.try_get("subject_codes")?,
                row.try_get("grades")?,
                row.try_get("teachers")?,
            ),
            None => GradeRecord {
                id: Uuid::new_v4(),
                student_id,
                semester_id: semester_id.clone(),
                enrollments: Vec::new(),
            },
        };

        for enrollment in incoming {
            if merge_enrollment(&mut record.enrollments, enrollment) {
                appended += 1;
            }
        }

        let (codes, grades, teachers) = to_arrays(&record.enrollments);
        write_grade_record(
            pool,
            record.id,
            student_id,
            &semester_id,
            codes,
            grades,
            teachers,
        )
        .await?;
    }

    Ok(appended)
}
