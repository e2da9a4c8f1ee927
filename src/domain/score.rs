use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Course;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Score must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("Score must not be negative, got {0}")]
    Negative(f64),
}

/// A recorded result for one student in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub course: Course,
    pub value: f64,
}

impl Score {
    pub fn new(course: Course, value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotFinite(value));
        }
        if value < 0.0 {
            return Err(ScoreError::Negative(value));
        }
        // Adding +0.0 turns -0.0 into 0.0.
        Ok(Self {
            course,
            value: value + 0.0,
        })
    }
}

/// Arithmetic mean of the given values, or `None` when there are none.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
