use thiserror::Error;

use crate::domain::{CourseId, StudentId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("No score recorded for student {student_id} in course {course_id}")]
    ScoreNotFound {
        student_id: StudentId,
        course_id: CourseId,
    },

    #[error("Student {0} is not enrolled in any course")]
    NoEnrolledCourses(StudentId),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
