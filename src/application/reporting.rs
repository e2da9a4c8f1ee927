use serde::{Deserialize, Serialize};

use crate::domain::{Course, Student};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRanking {
    pub course: Course,
    pub entries: Vec<RankedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Competition rank: equal scores share a rank and the next rank skips ahead.
    pub rank: usize,
    pub student: Student,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub student: Student,
    pub lines: Vec<TranscriptLine>,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub course: Course,
    pub score: f64,
}
