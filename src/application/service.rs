use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    compare_ranked, competition_ranks, mean, Course, CourseId, Score, Student, StudentId,
};
use crate::storage::{CourseLookup, Repository, ScoreLookup, StudentLookup};

use super::{AppError, CourseRanking, RankedEntry, Transcript, TranscriptLine};

/// Read-side service computing student averages and course rankings.
/// This is the primary interface for any client (CLI, export, tests).
///
/// Holds no mutable state; concurrent callers need no coordination beyond
/// what the lookups themselves provide.
pub struct TranscriptService {
    students: Arc<dyn StudentLookup>,
    courses: Arc<dyn CourseLookup>,
    scores: Arc<dyn ScoreLookup>,
}

impl TranscriptService {
    /// Create a service over the given lookups.
    pub fn new(
        students: Arc<dyn StudentLookup>,
        courses: Arc<dyn CourseLookup>,
        scores: Arc<dyn ScoreLookup>,
    ) -> Self {
        Self {
            students,
            courses,
            scores,
        }
    }

    /// Create a service backed entirely by one SQLite repository.
    pub fn from_repository(repo: Arc<Repository>) -> Self {
        Self::new(repo.clone(), repo.clone(), repo)
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::from_repository(Arc::new(repo)))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::from_repository(Arc::new(repo)))
    }

    // ========================
    // Averages
    // ========================

    /// Mean score across every course the student is enrolled in.
    ///
    /// A missing score for any enrolled course fails the whole computation with
    /// [`AppError::ScoreNotFound`]; it is never left out of the mean. A student
    /// with no enrollments fails with [`AppError::NoEnrolledCourses`].
    pub async fn get_average_score(&self, student_id: StudentId) -> Result<f64, AppError> {
        let student = self.get_student(student_id).await?;
        let scores = self.scores_for(&student).await?;

        mean(scores.iter().map(|s| s.value)).ok_or(AppError::NoEnrolledCourses(student_id))
    }

    /// Per-course breakdown of a student's scores together with their average.
    pub async fn get_transcript(&self, student_id: StudentId) -> Result<Transcript, AppError> {
        let student = self.get_student(student_id).await?;
        let scores = self.scores_for(&student).await?;
        let average =
            mean(scores.iter().map(|s| s.value)).ok_or(AppError::NoEnrolledCourses(student_id))?;

        let lines = scores
            .into_iter()
            .map(|s| TranscriptLine {
                course: s.course,
                score: s.value,
            })
            .collect();

        Ok(Transcript {
            student,
            lines,
            average,
        })
    }

    // ========================
    // Rankings
    // ========================

    /// Students with a recorded score in the course, highest score first.
    ///
    /// Students without a score in the course are left out entirely. Equal
    /// scores are ordered by ascending student id.
    pub async fn get_ranked_students(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Student>, AppError> {
        let (_, ranked) = self.ranked_scores(course_id).await?;
        Ok(ranked.into_iter().map(|(student, _)| student).collect())
    }

    /// Same as [`Self::get_ranked_students`]. Despite the name the result is in
    /// descending score order.
    #[deprecated(note = "results are in descending score order; use `get_ranked_students`")]
    pub async fn get_ranked_students_asc(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Student>, AppError> {
        self.get_ranked_students(course_id).await
    }

    /// Ranking of a course with scores and competition ranks attached.
    pub async fn get_course_ranking(&self, course_id: CourseId) -> Result<CourseRanking, AppError> {
        let (course, ranked) = self.ranked_scores(course_id).await?;
        let values: Vec<f64> = ranked.iter().map(|(_, score)| *score).collect();

        let entries = ranked
            .into_iter()
            .zip(competition_ranks(&values))
            .map(|((student, score), rank)| RankedEntry {
                rank,
                student,
                score,
            })
            .collect();

        Ok(CourseRanking { course, entries })
    }

    // ========================
    // Lookups
    // ========================

    /// Get a student by id.
    pub async fn get_student(&self, student_id: StudentId) -> Result<Student, AppError> {
        debug!(student_id, "looking up student");
        self.students.get_student(student_id).await?.ok_or_else(|| {
            warn!(student_id, "student not found");
            AppError::StudentNotFound(student_id)
        })
    }

    /// Get a course by id.
    pub async fn get_course(&self, course_id: CourseId) -> Result<Course, AppError> {
        debug!(course_id, "looking up course");
        self.courses.get_course(course_id).await?.ok_or_else(|| {
            warn!(course_id, "course not found");
            AppError::CourseNotFound(course_id)
        })
    }

    /// List every student in the store.
    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.students.get_all_students().await?)
    }

    /// One score lookup per enrolled course; the first missing score aborts.
    async fn scores_for(&self, student: &Student) -> Result<Vec<Score>, AppError> {
        let mut scores = Vec::with_capacity(student.courses.len());
        for course in &student.courses {
            let score = self
                .scores
                .get_score(student.id, course.id)
                .await?
                .ok_or_else(|| {
                    warn!(
                        student_id = student.id,
                        course_id = course.id,
                        "score missing for enrolled course"
                    );
                    AppError::ScoreNotFound {
                        student_id: student.id,
                        course_id: course.id,
                    }
                })?;
            scores.push(score);
        }
        debug!(
            student_id = student.id,
            count = scores.len(),
            "collected scores"
        );
        Ok(scores)
    }

    async fn ranked_scores(
        &self,
        course_id: CourseId,
    ) -> Result<(Course, Vec<(Student, f64)>), AppError> {
        let course = self.get_course(course_id).await?;
        let scores = self.scores.get_scores_by_course(course_id).await?;
        let roster = self.students.get_all_students().await?;

        let mut ranked: Vec<(Student, f64)> = roster
            .into_iter()
            .filter_map(|student| {
                let value = scores.get(&student.id)?.value;
                Some((student, value))
            })
            .collect();
        ranked.sort_by(compare_ranked);

        debug!(
            course_id,
            ranked = ranked.len(),
            scored = scores.len(),
            "ranked course"
        );
        Ok((course, ranked))
    }
}
