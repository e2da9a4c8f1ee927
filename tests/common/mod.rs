// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use transcript::application::TranscriptService;
use transcript::domain::{Course, CourseId, Score, Student, StudentId};
use transcript::storage::{CourseLookup, Repository, ScoreLookup, StudentLookup};

pub fn korean() -> Course {
    Course::new(1, "korean")
}

pub fn english() -> Course {
    Course::new(2, "english")
}

pub fn math() -> Course {
    Course::new(3, "math")
}

pub fn science() -> Course {
    Course::new(4, "science")
}

pub fn all_courses() -> Vec<Course> {
    vec![korean(), english(), math(), science()]
}

pub fn student(id: StudentId, name: &str) -> Student {
    Student::new(id, name, "Computer Engineering")
}

/// In-memory store that counts every lookup it serves.
#[derive(Default)]
pub struct CountingStore {
    students: Mutex<Vec<Student>>,
    courses: Mutex<Vec<Course>>,
    scores: Mutex<HashMap<(StudentId, CourseId), Score>>,
    pub student_lookups: AtomicUsize,
    pub roster_lookups: AtomicUsize,
    pub course_lookups: AtomicUsize,
    pub score_lookups: Mutex<Vec<(StudentId, CourseId)>>,
    pub score_map_lookups: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_student(&self, student: Student) {
        self.students.lock().unwrap().push(student);
    }

    pub fn add_course(&self, course: Course) {
        self.courses.lock().unwrap().push(course);
    }

    pub fn add_score(&self, student_id: StudentId, course: Course, value: f64) {
        let course_id = course.id;
        let score = Score::new(course, value).unwrap();
        self.scores
            .lock()
            .unwrap()
            .insert((student_id, course_id), score);
    }

    pub fn student_lookup_count(&self) -> usize {
        self.student_lookups.load(Ordering::SeqCst)
    }

    pub fn score_lookup_count(&self) -> usize {
        self.score_lookups.lock().unwrap().len()
    }

    pub fn score_lookups_for(&self, student_id: StudentId, course_id: CourseId) -> usize {
        self.score_lookups
            .lock()
            .unwrap()
            .iter()
            .filter(|&&key| key == (student_id, course_id))
            .count()
    }
}

#[async_trait]
impl StudentLookup for CountingStore {
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        self.student_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn get_all_students(&self) -> Result<Vec<Student>> {
        self.roster_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.students.lock().unwrap().clone())
    }
}

#[async_trait]
impl CourseLookup for CountingStore {
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>> {
        self.course_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

#[async_trait]
impl ScoreLookup for CountingStore {
    async fn get_score(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Option<Score>> {
        self.score_lookups
            .lock()
            .unwrap()
            .push((student_id, course_id));
        Ok(self
            .scores
            .lock()
            .unwrap()
            .get(&(student_id, course_id))
            .cloned())
    }

    async fn get_scores_by_course(&self, course_id: CourseId) -> Result<HashMap<StudentId, Score>> {
        self.score_map_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .scores
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, c), _)| *c == course_id)
            .map(|((s, _), score)| (*s, score.clone()))
            .collect())
    }
}

/// Service wired entirely to one counting store
pub fn counting_service(store: &Arc<CountingStore>) -> TranscriptService {
    TranscriptService::new(store.clone(), store.clone(), store.clone())
}

/// Helper to create a repository and service over a temporary database
pub async fn test_repository() -> Result<(Arc<Repository>, TranscriptService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Arc::new(Repository::init(&db_url).await?);
    let service = TranscriptService::from_repository(repo.clone());
    Ok((repo, service, temp_dir))
}

/// Seed the four standard courses into a repository
pub async fn seed_courses(repo: &Repository) -> Result<()> {
    for course in all_courses() {
        repo.save_course(&course).await?;
    }
    Ok(())
}

/// Store whose every lookup fails with the given message.
pub struct FailingStore {
    pub message: &'static str,
}

impl FailingStore {
    pub fn new(message: &'static str) -> Arc<Self> {
        Arc::new(Self { message })
    }
}

#[async_trait]
impl StudentLookup for FailingStore {
    async fn get_student(&self, _id: StudentId) -> Result<Option<Student>> {
        anyhow::bail!(self.message)
    }

    async fn get_all_students(&self) -> Result<Vec<Student>> {
        anyhow::bail!(self.message)
    }
}

#[async_trait]
impl ScoreLookup for FailingStore {
    async fn get_score(
        &self,
        _student_id: StudentId,
        _course_id: CourseId,
    ) -> Result<Option<Score>> {
        anyhow::bail!(self.message)
    }

    async fn get_scores_by_course(&self, _course_id: CourseId) -> Result<HashMap<StudentId, Score>> {
        anyhow::bail!(self.message)
    }
}
