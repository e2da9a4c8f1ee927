use anyhow::Result;
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, info};

use crate::domain::{Course, CourseId, Score, Student, StudentId};
use crate::storage::{CourseLookup, Repository};

/// Which dataset a CSV file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `id,name`
    Courses,
    /// `id,name,major`
    Students,
    /// `student_id,course_id`
    Enrollments,
    /// `student_id,course_id,score`
    Scores,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Courses => "courses",
            ImportKind::Students => "students",
            ImportKind::Enrollments => "enrollments",
            ImportKind::Scores => "scores",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "courses" => Some(ImportKind::Courses),
            "students" => Some(ImportKind::Students),
            "enrollments" => Some(ImportKind::Enrollments),
            "scores" => Some(ImportKind::Scores),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred on one line of the input
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and validate every line without writing anything.
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
struct CourseRow {
    id: CourseId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    id: StudentId,
    name: String,
    major: String,
}

#[derive(Debug, Deserialize)]
struct EnrollmentRow {
    student_id: StudentId,
    course_id: CourseId,
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    student_id: StudentId,
    course_id: CourseId,
    score: f64,
}

/// Loads CSV datasets into the SQLite store.
pub struct Importer<'a> {
    repo: &'a Repository,
}

impl<'a> Importer<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Import one CSV dataset. Bad lines are collected in the result, not fatal.
    pub async fn import_csv<R: Read>(
        &self,
        kind: ImportKind,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut result = ImportResult::default();

        for (line_num, record) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let outcome = match record {
                Ok(record) => self.import_record(kind, &record, &headers, &options).await,
                Err(e) => Err(anyhow::anyhow!("CSV parse error: {}", e)),
            };

            match outcome {
                Ok(()) => result.imported += 1,
                Err(e) => {
                    debug!(line, error = %e, "skipping import line");
                    result.errors.push(ImportError {
                        line,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            kind = kind.as_str(),
            imported = result.imported,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "import finished"
        );
        Ok(result)
    }

    async fn import_record(
        &self,
        kind: ImportKind,
        record: &csv::StringRecord,
        headers: &csv::StringRecord,
        options: &ImportOptions,
    ) -> Result<()> {
        match kind {
            ImportKind::Courses => {
                let row: CourseRow = record.deserialize(Some(headers))?;
                if !options.dry_run {
                    self.repo.save_course(&Course::new(row.id, row.name)).await?;
                }
            }
            ImportKind::Students => {
                let row: StudentRow = record.deserialize(Some(headers))?;
                if !options.dry_run {
                    self.repo
                        .save_student(&Student::new(row.id, row.name, row.major))
                        .await?;
                }
            }
            ImportKind::Enrollments => {
                let row: EnrollmentRow = record.deserialize(Some(headers))?;
                if !options.dry_run {
                    self.repo.enroll(row.student_id, row.course_id).await?;
                }
            }
            ImportKind::Scores => {
                let row: ScoreRow = record.deserialize(Some(headers))?;
                let course = self
                    .repo
                    .get_course(row.course_id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Unknown course: {}", row.course_id))?;
                let score = Score::new(course, row.score)?;
                if !options.dry_run {
                    self.repo.save_score(row.student_id, &score).await?;
                }
            }
        }
        Ok(())
    }
}
