use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Course, CourseId, Score, Student, StudentId};

// Read-only accessors the transcript service is built on.
// `Ok(None)` (or a missing map key) means "not found"; `Err` is a store failure.

#[async_trait]
pub trait StudentLookup: Send + Sync {
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>>;

    /// Every student in the store, regardless of enrollment.
    async fn get_all_students(&self) -> Result<Vec<Student>>;
}

#[async_trait]
pub trait CourseLookup: Send + Sync {
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>>;
}

#[async_trait]
pub trait ScoreLookup: Send + Sync {
    async fn get_score(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Score>>;

    /// All recorded scores for a course, keyed by student.
    async fn get_scores_by_course(&self, course_id: CourseId) -> Result<HashMap<StudentId, Score>>;
}
