use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::{Course, CourseId, Score, Student, StudentId};

use super::{CourseLookup, MIGRATION_001_INITIAL, ScoreLookup, StudentLookup};

/// SQLite-backed store for students, courses, enrollments and scores.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Writers
    // ========================

    pub async fn save_course(&self, course: &Course) -> Result<()> {
        sqlx::query("INSERT INTO courses (id, name) VALUES (?, ?)")
            .bind(course.id)
            .bind(&course.name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save course {}", course.id))?;
        Ok(())
    }

    /// Save a student and its enrollment list.
    pub async fn save_student(&self, student: &Student) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("INSERT INTO students (id, name, major) VALUES (?, ?, ?)")
            .bind(student.id)
            .bind(&student.name)
            .bind(&student.major)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save student {}", student.id))?;

        for course in &student.courses {
            sqlx::query("INSERT INTO enrollments (student_id, course_id) VALUES (?, ?)")
                .bind(student.id)
                .bind(course.id)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!(
                        "Failed to enroll student {} in course {}",
                        student.id, course.id
                    )
                })?;
        }

        tx.commit().await.context("Failed to commit student")?;
        Ok(())
    }

    pub async fn enroll(&self, student_id: StudentId, course_id: CourseId) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO enrollments (student_id, course_id) VALUES (?, ?)")
            .bind(student_id)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("Failed to enroll student {student_id} in course {course_id}")
            })?;
        Ok(())
    }

    /// Record a score, replacing any previous value for the same pair.
    pub async fn save_score(&self, student_id: StudentId, score: &Score) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scores (student_id, course_id, score)
            VALUES (?, ?, ?)
            ON CONFLICT(student_id, course_id) DO UPDATE SET score = excluded.score
            "#,
        )
        .bind(student_id)
        .bind(score.course.id)
        .bind(score.value)
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "Failed to save score for student {} in course {}",
                student_id, score.course.id
            )
        })?;
        Ok(())
    }

    // ========================
    // Readers
    // ========================

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query("SELECT id, name FROM courses ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list courses")?;

        Ok(rows.iter().map(Self::row_to_course).collect())
    }

    async fn courses_for_student(&self, student_id: StudentId) -> Result<Vec<Course>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.student_id = ?
            ORDER BY c.id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch enrollments")?;

        Ok(rows.iter().map(Self::row_to_course).collect())
    }

    fn row_to_course(row: &sqlx::sqlite::SqliteRow) -> Course {
        Course {
            id: row.get("id"),
            name: row.get("name"),
        }
    }

    fn row_to_student(row: &sqlx::sqlite::SqliteRow) -> Student {
        Student {
            id: row.get("id"),
            name: row.get("name"),
            major: row.get("major"),
            courses: Vec::new(),
        }
    }
}

#[async_trait]
impl StudentLookup for Repository {
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT id, name, major FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch student")?;

        match row {
            Some(row) => {
                let mut student = Self::row_to_student(&row);
                student.courses = self.courses_for_student(id).await?;
                Ok(Some(student))
            }
            None => Ok(None),
        }
    }

    async fn get_all_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT id, name, major FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list students")?;

        let enrollment_rows = sqlx::query(
            r#"
            SELECT e.student_id, c.id, c.name
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            ORDER BY e.student_id, c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list enrollments")?;

        let mut enrollments: HashMap<StudentId, Vec<Course>> = HashMap::new();
        for row in &enrollment_rows {
            let student_id: StudentId = row.get("student_id");
            enrollments
                .entry(student_id)
                .or_default()
                .push(Self::row_to_course(row));
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut student = Self::row_to_student(row);
                student.courses = enrollments.remove(&student.id).unwrap_or_default();
                student
            })
            .collect())
    }
}

#[async_trait]
impl CourseLookup for Repository {
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>> {
        let row = sqlx::query("SELECT id, name FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch course")?;

        Ok(row.as_ref().map(Self::row_to_course))
    }
}

#[async_trait]
impl ScoreLookup for Repository {
    async fn get_score(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Score>> {
        let row = sqlx::query(
            r#"
            SELECT c.id, c.name, s.score
            FROM scores s
            JOIN courses c ON c.id = s.course_id
            WHERE s.student_id = ? AND s.course_id = ?
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch score")?;

        Ok(row.map(|row| Score {
            course: Self::row_to_course(&row),
            value: row.get("score"),
        }))
    }

    async fn get_scores_by_course(&self, course_id: CourseId) -> Result<HashMap<StudentId, Score>> {
        let rows = sqlx::query(
            r#"
            SELECT s.student_id, c.id, c.name, s.score
            FROM scores s
            JOIN courses c ON c.id = s.course_id
            WHERE s.course_id = ?
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch course scores")?;

        Ok(rows
            .iter()
            .map(|row| {
                let score = Score {
                    course: Self::row_to_course(row),
                    value: row.get("score"),
                };
                (row.get("student_id"), score)
            })
            .collect())
    }
}
