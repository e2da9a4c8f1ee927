use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{CourseRanking, TranscriptService};
use crate::domain::StudentId;

/// JSON envelope for exported reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope<T> {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub data: T,
}

impl<T> ExportEnvelope<T> {
    fn wrap(data: T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            data,
        }
    }
}

/// Exporter for student transcripts; rankings are written with `write_ranking_*`
pub struct Exporter<'a> {
    service: &'a TranscriptService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a TranscriptService) -> Self {
        Self { service }
    }

    /// Export a student transcript to JSON format
    pub async fn export_transcript_json<W: Write>(
        &self,
        student_id: StudentId,
        writer: W,
    ) -> Result<usize> {
        let transcript = self.service.get_transcript(student_id).await?;
        let count = transcript.lines.len();
        serde_json::to_writer_pretty(writer, &ExportEnvelope::wrap(transcript))?;
        Ok(count)
    }
}

/// Write an already computed ranking as JSON inside the export envelope.
pub fn write_ranking_json<W: Write>(ranking: &CourseRanking, writer: W) -> Result<usize> {
    serde_json::to_writer_pretty(writer, &ExportEnvelope::wrap(ranking))?;
    Ok(ranking.entries.len())
}

/// Write an already computed ranking as CSV, one row per ranked student.
pub fn write_ranking_csv<W: Write>(ranking: &CourseRanking, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["rank", "student_id", "name", "major", "score"])?;

    for entry in &ranking.entries {
        csv_writer.write_record([
            entry.rank.to_string(),
            entry.student.id.to_string(),
            entry.student.name.clone(),
            entry.student.major.clone(),
            entry.score.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(ranking.entries.len())
}
