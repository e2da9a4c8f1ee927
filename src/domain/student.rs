use serde::{Deserialize, Serialize};

use super::{Course, CourseId};

pub type StudentId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub major: String,
    /// Courses the student is enrolled in. Order carries no meaning.
    pub courses: Vec<Course>,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>, major: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            major: major.into(),
            courses: Vec::new(),
        }
    }

    pub fn with_courses(mut self, courses: impl IntoIterator<Item = Course>) -> Self {
        self.courses = courses.into_iter().collect();
        self
    }

    pub fn is_enrolled_in(&self, course_id: CourseId) -> bool {
        self.courses.iter().any(|c| c.id == course_id)
    }
}
