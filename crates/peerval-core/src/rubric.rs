//! Rubric types and rating validation.
//!
//! An evaluation is scored on six fixed dimensions, each an integer in
//! `[0, 4]`. Raw form input is validated field by field in [`RubricField::ALL`]
//! order and the first failure wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// One of the six rubric dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubricField {
  Contribution,
  Collaboration,
  Communication,
  Planning,
  Inclusivity,
  Overall,
}

impl RubricField {
  /// Validation and storage order.
  pub const ALL: [RubricField; 6] = [
    RubricField::Contribution,
    RubricField::Collaboration,
    RubricField::Communication,
    RubricField::Planning,
    RubricField::Inclusivity,
    RubricField::Overall,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Contribution => "contribution",
      Self::Collaboration => "collaboration",
      Self::Communication => "communication",
      Self::Planning => "planning",
      Self::Inclusivity => "inclusivity",
      Self::Overall => "overall",
    }
  }
}

impl fmt::Display for RubricField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Score ───────────────────────────────────────────────────────────────────

/// A single rubric rating, guaranteed to lie in `[Score::MIN, Score::MAX]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 0;
  pub const MAX: u8 = 4;

  /// Returns `None` when `value` is outside the rubric range.
  pub fn new(value: i64) -> Option<Self> {
    (i64::from(Self::MIN)..=i64::from(Self::MAX))
      .contains(&value)
      .then_some(Self(value as u8))
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Score {
  type Error = String;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    Self::new(value).ok_or_else(|| format!("score {value} is outside 0..=4"))
  }
}

impl From<Score> for u8 {
  fn from(score: Score) -> Self { score.0 }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Why a submitted rating was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("please provide a rating for {0}")]
  Missing(RubricField),

  #[error("rating for {field} must be a whole number, got {raw:?}")]
  NotInteger { field: RubricField, raw: String },

  #[error("rating for {field} must be between 0 and 4, got {value}")]
  OutOfRange { field: RubricField, value: i64 },
}

impl ValidationError {
  /// The field that failed validation.
  pub fn field(&self) -> RubricField {
    match self {
      Self::Missing(field) => *field,
      Self::NotInteger { field, .. } | Self::OutOfRange { field, .. } => *field,
    }
  }
}

/// Raw, unvalidated ratings exactly as posted by the evaluation form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingsForm {
  pub contribution:  Option<String>,
  pub collaboration: Option<String>,
  pub communication: Option<String>,
  pub planning:      Option<String>,
  pub inclusivity:   Option<String>,
  pub overall:       Option<String>,
}

impl RatingsForm {
  fn raw(&self, field: RubricField) -> Option<&str> {
    let value = match field {
      RubricField::Contribution => &self.contribution,
      RubricField::Collaboration => &self.collaboration,
      RubricField::Communication => &self.communication,
      RubricField::Planning => &self.planning,
      RubricField::Inclusivity => &self.inclusivity,
      RubricField::Overall => &self.overall,
    };
    value.as_deref()
  }

  /// Validate every field in rubric order, stopping at the first failure.
  pub fn validate(&self) -> Result<RubricScores, ValidationError> {
    let mut scores = [Score::default(); 6];
    for (slot, field) in scores.iter_mut().zip(RubricField::ALL) {
      *slot = validate_field(field, self.raw(field))?;
    }
    Ok(RubricScores::from_array(scores))
  }
}

fn validate_field(field: RubricField, raw: Option<&str>) -> Result<Score, ValidationError> {
  let raw = raw
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or(ValidationError::Missing(field))?;

  let value: i64 = raw.parse().map_err(|_| ValidationError::NotInteger {
    field,
    raw: raw.to_owned(),
  })?;

  Score::new(value).ok_or(ValidationError::OutOfRange { field, value })
}

// ─── Validated scores ────────────────────────────────────────────────────────

/// A complete, validated set of six ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScores {
  pub contribution:  Score,
  pub collaboration: Score,
  pub communication: Score,
  pub planning:      Score,
  pub inclusivity:   Score,
  pub overall:       Score,
}

impl RubricScores {
  /// Build from scores laid out in [`RubricField::ALL`] order.
  pub fn from_array(s: [Score; 6]) -> Self {
    Self {
      contribution:  s[0],
      collaboration: s[1],
      communication: s[2],
      planning:      s[3],
      inclusivity:   s[4],
      overall:       s[5],
    }
  }

  /// Scores in [`RubricField::ALL`] order.
  pub fn to_array(&self) -> [Score; 6] {
    [
      self.contribution,
      self.collaboration,
      self.communication,
      self.planning,
      self.inclusivity,
      self.overall,
    ]
  }

  pub fn get(&self, field: RubricField) -> Score {
    match field {
      RubricField::Contribution => self.contribution,
      RubricField::Collaboration => self.collaboration,
      RubricField::Communication => self.communication,
      RubricField::Planning => self.planning,
      RubricField::Inclusivity => self.inclusivity,
      RubricField::Overall => self.overall,
    }
  }

  /// Mean of the six ratings.
  pub fn mean(&self) -> f64 {
    let total: u32 = self.to_array().iter().map(|s| u32::from(s.get())).sum();
    f64::from(total) / 6.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(values: [&str; 6]) -> RatingsForm {
    RatingsForm {
      contribution:  Some(values[0].into()),
      collaboration: Some(values[1].into()),
      communication: Some(values[2].into()),
      planning:      Some(values[3].into()),
      inclusivity:   Some(values[4].into()),
      overall:       Some(values[5].into()),
    }
  }

  #[test]
  fn accepts_full_range() {
    let scores = form(["0", "1", "2", "3", "4", " 2 "]).validate().unwrap();
    assert_eq!(scores.contribution.get(), 0);
    assert_eq!(scores.inclusivity.get(), 4);
    assert_eq!(scores.overall.get(), 2);
  }

  #[test]
  fn rejects_out_of_range_communication() {
    let err = form(["4", "0", "5", "2", "1", "3"]).validate().unwrap_err();
    assert_eq!(err, ValidationError::OutOfRange {
      field: RubricField::Communication,
      value: 5,
    });
  }

  #[test]
  fn first_failure_short_circuits() {
    // collaboration is missing and planning is non-numeric; collaboration
    // comes first in rubric order.
    let mut f = form(["3", "", "2", "abc", "9", "1"]);
    assert_eq!(f.validate().unwrap_err(), ValidationError::Missing(RubricField::Collaboration));

    f.collaboration = Some("2".into());
    let err = f.validate().unwrap_err();
    assert_eq!(err.field(), RubricField::Planning);
    assert!(matches!(err, ValidationError::NotInteger { .. }));
  }

  #[test]
  fn absent_field_is_missing() {
    let f = RatingsForm { overall: None, ..form(["1"; 6]) };
    assert_eq!(f.validate().unwrap_err(), ValidationError::Missing(RubricField::Overall));
  }

  #[test]
  fn rejects_negative_and_fractional() {
    let err = form(["-1", "0", "0", "0", "0", "0"]).validate().unwrap_err();
    assert!(matches!(err, ValidationError::OutOfRange { value: -1, .. }));

    let err = form(["2.5", "0", "0", "0", "0", "0"]).validate().unwrap_err();
    assert!(matches!(err, ValidationError::NotInteger { ref raw, .. } if raw == "2.5"));
  }

  #[test]
  fn mean_of_scores() {
    let scores = form(["4", "4", "2", "2", "0", "0"]).validate().unwrap();
    assert!((scores.mean() - 2.0).abs() < f64::EPSILON);
  }

  #[test]
  fn score_deserialisation_enforces_range() {
    assert!(serde_json::from_str::<Score>("3").is_ok());
    assert!(serde_json::from_str::<Score>("7").is_err());
  }
}
