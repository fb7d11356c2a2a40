//! The `PeerEvalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `peerval-store-sqlite`).
//! The web layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  error::Classify,
  group::{GroupFormation, GroupLabel},
  model::{
    Course, CourseOverview, CourseRef, EvaluateeAnalysis, EvaluationContext, EvaluationDetail,
    EvaluationSummary, GroupWithMembers, NewProfessor, NewStudent, Professor, Student,
  },
  roster::{ImportReport, RosterRow},
  rubric::RubricScores,
};

/// Abstraction over a peer-evaluation store backend.
///
/// Multi-statement operations (`import_roster`, `form_group`,
/// `assign_due_date`, `open_group_evaluations`) are atomic: they either
/// commit in full or leave the store untouched.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PeerEvalStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// Register a student with a store-assigned id.
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn student_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn add_professor(
    &self,
    input: NewProfessor,
  ) -> impl Future<Output = Result<Professor, Self::Error>> + Send + '_;

  fn professor_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Professor>, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  /// The professor's courses with enrolment and evaluation counts, ordered
  /// by course code.
  fn courses_for_professor(
    &self,
    professor_id: i64,
  ) -> impl Future<Output = Result<Vec<CourseOverview>, Self::Error>> + Send + '_;

  fn course(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Students enrolled in a course, ordered by name.
  fn enrolled_students(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Set a course's evaluation due date, and the due date of every evaluation
  /// row belonging to it. Fails with a not-found error when the course does
  /// not belong to `professor_id`.
  fn assign_due_date(
    &self,
    professor_id: i64,
    course_id: i64,
    due: NaiveDate,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  /// Per-evaluatee averages over the submitted evaluations of a course.
  fn course_analysis(
    &self,
    professor_id: i64,
    course_id: i64,
  ) -> impl Future<Output = Result<Vec<EvaluateeAnalysis>, Self::Error>> + Send + '_;

  // ── Roster & groups ───────────────────────────────────────────────────

  /// Import parsed roster rows into `course`, creating the course for
  /// `professor_id` if it does not exist yet.
  ///
  /// Unknown student ids are inserted; enrolments are ensured. Skipped rows
  /// are reported, never fatal. Re-importing the same rows adds nothing.
  fn import_roster(
    &self,
    professor_id: i64,
    course: CourseRef,
    rows: Vec<RosterRow>,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + '_;

  /// Place `student_ids` into the course group named by `label`, creating
  /// the group on first use. Existing memberships are left as they are.
  fn form_group(
    &self,
    course_id: i64,
    label: GroupLabel,
    student_ids: Vec<i64>,
  ) -> impl Future<Output = Result<GroupFormation, Self::Error>> + Send + '_;

  fn groups_for_course(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<Vec<GroupWithMembers>, Self::Error>> + Send + '_;

  fn groups_for_professor(
    &self,
    professor_id: i64,
  ) -> impl Future<Output = Result<Vec<GroupWithMembers>, Self::Error>> + Send + '_;

  /// Create any missing evaluation rows between members of the same group
  /// in a course. Returns the number of rows created.
  fn open_group_evaluations(
    &self,
    course_id: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Evaluations ───────────────────────────────────────────────────────

  /// Evaluations assigned to `student_id`, earliest due date first and
  /// undated ones last.
  fn evaluations_for_evaluator(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Vec<EvaluationSummary>, Self::Error>> + Send + '_;

  fn evaluation_for_evaluator(
    &self,
    peer_eval_id: i64,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<EvaluationDetail>, Self::Error>> + Send + '_;

  /// Overwrite the scores of evaluation `peer_eval_id` owned by evaluator
  /// `student_id`. Never inserts.
  ///
  /// Returns the number of rows affected; `0` means no such evaluation.
  fn submit_scores(
    &self,
    peer_eval_id: i64,
    student_id: i64,
    scores: RubricScores,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn evaluation_context(
    &self,
    peer_eval_id: i64,
  ) -> impl Future<Output = Result<Option<EvaluationContext>, Self::Error>> + Send + '_;
}
