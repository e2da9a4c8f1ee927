use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{CourseRanking, TranscriptService};
use crate::domain::{CourseId, StudentId};
use crate::storage::Repository;

/// Transcript - student averages and course rankings
#[derive(Parser)]
#[command(name = "transcript")]
#[command(about = "Compute student score averages and per-course rankings")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TRANSCRIPT_DB", default_value = "transcript.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Import students, courses, enrollments or scores from CSV
    Import {
        /// What to import: courses, students, enrollments, scores
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a student's average score across enrolled courses
    Average {
        /// Student ID
        student_id: StudentId,
    },

    /// Rank students in a course by score, highest first
    Rank {
        /// Course ID
        course_id: CourseId,

        /// Format: table, csv, json
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show a student's per-course scores and average
    Transcript {
        /// Student ID
        student_id: StudentId,

        /// Format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List all students
    Students,

    /// List all courses
    Courses,
}

impl Cli {
    async fn open(&self) -> Result<(Arc<Repository>, TranscriptService)> {
        let db_url = format!("sqlite:{}", self.database);
        let repo = Arc::new(
            Repository::connect(&db_url)
                .await
                .with_context(|| format!("Failed to open database: {}", self.database))?,
        );
        let service = TranscriptService::from_repository(repo.clone());
        Ok((repo, service))
    }

    pub async fn run(self) -> Result<()> {
        crate::logging::init(self.verbose);
        tracing::debug!(database = %self.database, "starting");

        match &self.command {
            Commands::Init => {
                TranscriptService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
            } => {
                let (repo, _) = self.open().await?;
                run_import_command(&repo, import_type, input.as_deref(), *dry_run).await?;
            }

            Commands::Average { student_id } => {
                let (_, service) = self.open().await?;
                let transcript = service.get_transcript(*student_id).await?;
                println!(
                    "{} (#{}): average {:.2} over {} courses",
                    transcript.student.name,
                    transcript.student.id,
                    transcript.average,
                    transcript.lines.len()
                );
            }

            Commands::Rank {
                course_id,
                format,
                output,
            } => {
                let (_, service) = self.open().await?;
                run_rank_command(&service, *course_id, format, output.as_deref()).await?;
            }

            Commands::Transcript { student_id, format } => {
                let (_, service) = self.open().await?;
                run_transcript_command(&service, *student_id, format).await?;
            }

            Commands::Students => {
                let (_, service) = self.open().await?;
                let students = service.list_students().await?;
                if students.is_empty() {
                    println!("No students found.");
                } else {
                    println!("{:<8} {:<24} {:<24} {:>8}", "ID", "NAME", "MAJOR", "COURSES");
                    println!("{}", "-".repeat(67));
                    for student in students {
                        println!(
                            "{:<8} {:<24} {:<24} {:>8}",
                            student.id,
                            student.name,
                            student.major,
                            student.courses.len()
                        );
                    }
                }
            }

            Commands::Courses => {
                let (repo, _) = self.open().await?;
                let courses = repo.list_courses().await?;
                if courses.is_empty() {
                    println!("No courses found.");
                } else {
                    println!("{:<8} {:<30}", "ID", "NAME");
                    println!("{}", "-".repeat(39));
                    for course in courses {
                        println!("{:<8} {:<30}", course.id, course.name);
                    }
                }
            }
        }

        Ok(())
    }
}

async fn run_import_command(
    repo: &Repository,
    import_type: &str,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    use crate::io::{ImportKind, ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let kind = ImportKind::from_str(import_type).with_context(|| {
        format!(
            "Invalid import type '{}'. Valid types: courses, students, enrollments, scores",
            import_type
        )
    })?;

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let result = Importer::new(repo)
        .import_csv(kind, reader, ImportOptions { dry_run })
        .await?;

    if dry_run {
        println!("Validation complete ({})", kind);
    } else {
        println!("Import complete ({})", kind);
    }
    println!("  Imported: {}", result.imported);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!("  Line {}: {}", error.line, error.error);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankFormat {
    Table,
    Csv,
    Json,
}

impl RankFormat {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(RankFormat::Table),
            "csv" => Some(RankFormat::Csv),
            "json" => Some(RankFormat::Json),
            _ => None,
        }
    }
}

/// The output file is only created once the ranking has been computed, so a bad
/// format or unknown course leaves an existing file untouched.
async fn run_rank_command(
    service: &TranscriptService,
    course_id: CourseId,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::{write_ranking_csv, write_ranking_json};
    use std::fs::File;
    use std::io::stdout;

    let format = RankFormat::from_str(format).with_context(|| {
        format!("Invalid format '{}'. Valid formats: table, csv, json", format)
    })?;
    let ranking = service.get_course_ranking(course_id).await?;

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match format {
        RankFormat::Json => write_ranking_json(&ranking, writer)?,
        RankFormat::Csv => write_ranking_csv(&ranking, writer)?,
        RankFormat::Table => write_ranking_table(&ranking, writer)?,
    };
    if output.is_some() {
        eprintln!("Exported {} ranked students", count);
    }

    Ok(())
}

fn write_ranking_table<W: Write>(ranking: &CourseRanking, mut writer: W) -> Result<usize> {
    writeln!(writer, "Ranking: {}", ranking.course)?;
    writeln!(writer)?;
    if ranking.entries.is_empty() {
        writeln!(writer, "No scores recorded for this course.")?;
        return Ok(0);
    }
    writeln!(
        writer,
        "{:>4}  {:<8} {:<24} {:<24} {:>8}",
        "RANK", "ID", "NAME", "MAJOR", "SCORE"
    )?;
    writeln!(writer, "{}", "-".repeat(72))?;
    for entry in &ranking.entries {
        writeln!(
            writer,
            "{:>4}  {:<8} {:<24} {:<24} {:>8.2}",
            entry.rank, entry.student.id, entry.student.name, entry.student.major, entry.score
        )?;
    }
    Ok(ranking.entries.len())
}

async fn run_transcript_command(
    service: &TranscriptService,
    student_id: StudentId,
    format: &str,
) -> Result<()> {
    match format {
        "json" => {
            crate::io::Exporter::new(service)
                .export_transcript_json(student_id, std::io::stdout())
                .await?;
            println!();
        }
        "table" => {
            let transcript = service.get_transcript(student_id).await?;
            println!(
                "Transcript: {} (#{}), {}",
                transcript.student.name, transcript.student.id, transcript.student.major
            );
            println!();
            println!("{:<30} {:>8}", "COURSE", "SCORE");
            println!("{}", "-".repeat(39));
            for line in &transcript.lines {
                println!("{:<30} {:>8.2}", line.course.name, line.score);
            }
            println!("{}", "-".repeat(39));
            println!("{:<30} {:>8.2}", "AVERAGE", transcript.average);
        }
        _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", format),
    }

    Ok(())
}
