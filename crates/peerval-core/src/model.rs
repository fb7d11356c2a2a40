//! Domain records: people, courses, groups and evaluations.
//!
//! Identifiers are the integer keys of the relational schema. Student ids are
//! either supplied by a roster file or assigned by the store on signup.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rubric::{RubricField, RubricScores};

// ─── People ──────────────────────────────────────────────────────────────────

/// Which kind of account a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
  Student,
  Professor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id: i64,
  pub name:       String,
  /// Login key.
  pub email:      String,
}

/// Input for [`PeerEvalStore::add_student`](crate::store::PeerEvalStore::add_student).
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professor {
  pub professor_id: i64,
  pub name:         String,
  pub email:        String,
  /// Stored and compared in plaintext.
  #[serde(skip_serializing)]
  pub password:     String,
  pub department:   Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProfessor {
  pub name:       String,
  pub email:      String,
  pub password:   String,
  pub department: Option<String>,
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:     i64,
  pub course_code:   String,
  pub course_name:   String,
  pub professor_id:  i64,
  pub semester:      Option<String>,
  pub year:          Option<i32>,
  pub course_time:   Option<String>,
  pub eval_due_date: Option<NaiveDate>,
}

/// Names a course by its natural key within a professor's catalogue.
///
/// Used by roster import, which creates the course when it does not exist.
#[derive(Debug, Clone)]
pub struct CourseRef {
  pub code: String,
  /// Display name for a newly created course; defaults to the code.
  pub name: Option<String>,
}

/// A course together with evaluation progress, for the professor dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CourseOverview {
  #[serde(flatten)]
  pub course:                Course,
  pub enrolled:              u32,
  pub evaluations_total:     u32,
  pub evaluations_submitted: u32,
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroup {
  pub group_id:   i64,
  pub course_id:  i64,
  /// Always `{CourseCode}-Group{N}`.
  pub group_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupWithMembers {
  #[serde(flatten)]
  pub group:       StudentGroup,
  pub course_code: String,
  pub members:     Vec<Student>,
}

// ─── Evaluations ─────────────────────────────────────────────────────────────

/// One row of a student's dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
  pub peer_eval_id:  i64,
  pub course_code:   String,
  pub course_name:   String,
  pub evaluatee:     String,
  pub eval_due_date: Option<NaiveDate>,
  pub submitted:     bool,
}

/// Everything the evaluation form shows about one assignment.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationDetail {
  pub peer_eval_id:   i64,
  pub evaluatee_id:   i64,
  pub evaluatee_name: String,
  pub course_code:    String,
  pub course_name:    String,
  pub professor_name: String,
  pub semester:       Option<String>,
  pub year:           Option<i32>,
  pub course_time:    Option<String>,
  pub eval_due_date:  Option<NaiveDate>,
  /// `None` until the evaluation has been submitted.
  pub scores:         Option<RubricScores>,
}

/// Joined evaluator, evaluatee and course data used by outbound notifications.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
  pub peer_eval_id: i64,
  pub evaluator:    Student,
  pub evaluatee:    Student,
  pub course_id:    i64,
  pub course_code:  String,
  pub course_name:  String,
  pub scores:       Option<RubricScores>,
  pub submitted_at: Option<DateTime<Utc>>,
}

/// Per-dimension averages over submitted evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RubricAverages {
  pub contribution:  f64,
  pub collaboration: f64,
  pub communication: f64,
  pub planning:      f64,
  pub inclusivity:   f64,
  pub overall:       f64,
}

impl RubricAverages {
  /// Average each dimension over `scores`. Returns `None` for an empty slice.
  pub fn of(scores: &[RubricScores]) -> Option<Self> {
    if scores.is_empty() {
      return None;
    }
    let n = scores.len() as f64;
    let avg = |field: RubricField| {
      scores.iter().map(|s| f64::from(s.get(field).get())).sum::<f64>() / n
    };
    Some(Self {
      contribution:  avg(RubricField::Contribution),
      collaboration: avg(RubricField::Collaboration),
      communication: avg(RubricField::Communication),
      planning:      avg(RubricField::Planning),
      inclusivity:   avg(RubricField::Inclusivity),
      overall:       avg(RubricField::Overall),
    })
  }
}

/// How one student was rated by their peers within a course.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateeAnalysis {
  pub student_id: i64,
  pub name:       String,
  /// Evaluations of this student that have been submitted.
  pub submitted:  u32,
  /// Evaluations of this student still awaiting a submission.
  pub pending:    u32,
  pub averages:   Option<RubricAverages>,
}
