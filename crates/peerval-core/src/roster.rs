//! Roster CSV parsing and the import report.
//!
//! A roster is a comma-separated file with a header row. Three logical
//! columns are required: a student id (any header containing `id`), `name`,
//! and `email`, all matched case-insensitively. Each data row is either
//! accepted or skipped with a reason; only a structurally unusable file is an
//! error.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The file as a whole could not be used.
#[derive(Debug, Error)]
pub enum RosterError {
  #[error("roster file is empty")]
  Empty,

  #[error("roster is missing a {0} column")]
  MissingColumn(&'static str),

  #[error("roster is not valid CSV: {0}")]
  Csv(#[from] csv::Error),
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A roster row with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
  /// 1-based line in the file; the header is line 1.
  pub line:       u64,
  pub student_id: i64,
  pub name:       String,
  pub email:      String,
}

/// Why a row did not contribute to the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
  MissingField { field: &'static str },
  InvalidStudentId { value: String },
  /// The email already belongs to a different student id.
  EmailInUse { email: String, owner: i64 },
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MissingField { field } => write!(f, "missing {field}"),
      Self::InvalidStudentId { value } => write!(f, "student id {value:?} is not a number"),
      Self::EmailInUse { email, owner } => {
        write!(f, "{email} is already registered to student {owner}")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterRow {
  Accepted(RosterEntry),
  Skipped { line: u64, reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
  pub line:   u64,
  pub reason: SkipReason,
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

struct Columns {
  id:    usize,
  name:  usize,
  email: usize,
}

impl Columns {
  fn locate(headers: &csv::StringRecord) -> Result<Self, RosterError> {
    let normalised: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |pred: &dyn Fn(&str) -> bool| normalised.iter().position(|h| pred(h.as_str()));

    Ok(Self {
      id:    find(&|h| h.contains("id")).ok_or(RosterError::MissingColumn("student id"))?,
      name:  find(&|h| h == "name").ok_or(RosterError::MissingColumn("name"))?,
      email: find(&|h| h == "email").ok_or(RosterError::MissingColumn("email"))?,
    })
  }
}

/// Parse a roster file into per-row outcomes.
pub fn parse_roster(data: &[u8]) -> Result<Vec<RosterRow>, RosterError> {
  let mut rdr = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(data);

  let headers = rdr.headers()?.clone();
  if headers.is_empty() || headers.iter().all(str::is_empty) {
    return Err(RosterError::Empty);
  }
  let cols = Columns::locate(&headers)?;

  let mut rows = Vec::new();
  for record in rdr.records() {
    let record = record?;
    if record.iter().all(str::is_empty) {
      continue;
    }
    let line = record.position().map_or(0, |p| p.line());
    rows.push(parse_row(&record, &cols, line));
  }
  Ok(rows)
}

fn parse_row(record: &csv::StringRecord, cols: &Columns, line: u64) -> RosterRow {
  let field = |idx: usize| record.get(idx).filter(|v| !v.is_empty());

  let (Some(raw_id), Some(name), Some(email)) =
    (field(cols.id), field(cols.name), field(cols.email))
  else {
    let missing = if field(cols.id).is_none() {
      "student id"
    } else if field(cols.name).is_none() {
      "name"
    } else {
      "email"
    };
    return RosterRow::Skipped { line, reason: SkipReason::MissingField { field: missing } };
  };

  match raw_id.parse::<i64>() {
    Ok(student_id) => RosterRow::Accepted(RosterEntry {
      line,
      student_id,
      name: name.to_owned(),
      email: email.to_owned(),
    }),
    Err(_) => RosterRow::Skipped {
      line,
      reason: SkipReason::InvalidStudentId { value: raw_id.to_owned() },
    },
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Outcome of a committed roster import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
  pub course_id:         i64,
  pub course_code:       String,
  pub course_created:    bool,
  pub students_added:    u32,
  pub enrollments_added: u32,
  pub skipped:           Vec<SkippedRow>,
}

impl ImportReport {
  /// User-visible one-line summary of the import.
  pub fn summary(&self) -> String {
    let plural = |n: usize, one: &str, many: &str| {
      format!("{n} {}", if n == 1 { one } else { many })
    };
    format!(
      "Imported roster for {}: {} added, {} added, {} skipped.",
      self.course_code,
      plural(self.students_added as usize, "student", "students"),
      plural(self.enrollments_added as usize, "enrollment", "enrollments"),
      plural(self.skipped.len(), "row", "rows"),
    )
  }
}
