//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings.
//! Rubric scores live in six nullable integer columns; a row is submitted
//! once all six are set.

use chrono::{DateTime, NaiveDate, Utc};
use peerval_core::{
  model::{Course, EvaluationDetail},
  rubric::{RubricScores, Score},
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// Column list in rubric order, for SELECTs.
pub const SCORE_COLUMNS: &str =
  "contribution, collaboration, communication, planning, inclusivity, overall";

pub fn encode_scores(scores: &RubricScores) -> [i64; 6] {
  scores.to_array().map(|s| i64::from(s.get()))
}

/// `None` until every column is set.
pub fn decode_scores(raw: [Option<i64>; 6]) -> Result<Option<RubricScores>> {
  let mut scores = [Score::default(); 6];
  for (slot, value) in scores.iter_mut().zip(raw) {
    let Some(value) = value else { return Ok(None) };
    *slot = Score::new(value).ok_or_else(|| Error::Decode(format!("score {value}")))?;
  }
  Ok(Some(RubricScores::from_array(scores)))
}

/// Read six score columns starting at `first`.
pub fn score_columns(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<[Option<i64>; 6]> {
  Ok([
    row.get(first)?,
    row.get(first + 1)?,
    row.get(first + 2)?,
    row.get(first + 3)?,
    row.get(first + 4)?,
    row.get(first + 5)?,
  ])
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawCourse::from_row`].
pub const COURSE_COLUMNS: &str = "course_id, course_code, course_name, professor_id, \
                                  semester, year, course_time, eval_due_date";

/// A `courses` row before date decoding.
pub struct RawCourse {
  pub course_id:     i64,
  pub course_code:   String,
  pub course_name:   String,
  pub professor_id:  i64,
  pub semester:      Option<String>,
  pub year:          Option<i32>,
  pub course_time:   Option<String>,
  pub eval_due_date: Option<String>,
}

impl RawCourse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:     row.get(0)?,
      course_code:   row.get(1)?,
      course_name:   row.get(2)?,
      professor_id:  row.get(3)?,
      semester:      row.get(4)?,
      year:          row.get(5)?,
      course_time:   row.get(6)?,
      eval_due_date: row.get(7)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:     self.course_id,
      course_code:   self.course_code,
      course_name:   self.course_name,
      professor_id:  self.professor_id,
      semester:      self.semester,
      year:          self.year,
      course_time:   self.course_time,
      eval_due_date: decode_opt_date(self.eval_due_date)?,
    })
  }
}

/// A joined evaluation row as read for the evaluation form.
pub struct RawEvaluationDetail {
  pub peer_eval_id:   i64,
  pub evaluatee_id:   i64,
  pub evaluatee_name: String,
  pub course_code:    String,
  pub course_name:    String,
  pub professor_name: String,
  pub semester:       Option<String>,
  pub year:           Option<i32>,
  pub course_time:    Option<String>,
  pub eval_due_date:  Option<String>,
  pub scores:         [Option<i64>; 6],
}

impl RawEvaluationDetail {
  pub fn into_detail(self) -> Result<EvaluationDetail> {
    Ok(EvaluationDetail {
      peer_eval_id:   self.peer_eval_id,
      evaluatee_id:   self.evaluatee_id,
      evaluatee_name: self.evaluatee_name,
      course_code:    self.course_code,
      course_name:    self.course_name,
      professor_name: self.professor_name,
      semester:       self.semester,
      year:           self.year,
      course_time:    self.course_time,
      eval_due_date:  decode_opt_date(self.eval_due_date)?,
      scores:         decode_scores(self.scores)?,
    })
  }
}
