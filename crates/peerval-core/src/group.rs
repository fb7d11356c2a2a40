//! Group labels and canonical group naming.
//!
//! Professors pick a free-form label such as `"Group 3"`; only its trailing
//! number matters. Groups are stored under `{CourseCode}-Group{N}`, which is
//! the natural key used for idempotent re-selection.

use serde::Serialize;

use crate::{Error, Result};

/// Group id assigned when a store holds no groups yet.
pub const FIRST_GROUP_ID: i64 = 1;

/// The numeric part of a caller-chosen group label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLabel(u32);

impl GroupLabel {
  /// Extract the trailing number of `label` (`"Group 12"` → `12`).
  pub fn parse(label: &str) -> Result<Self> {
    let trimmed = label.trim();
    let digits_start = trimmed
      .char_indices()
      .rev()
      .take_while(|(_, c)| c.is_ascii_digit())
      .last()
      .map(|(i, _)| i)
      .ok_or_else(|| Error::InvalidGroupLabel(label.to_owned()))?;

    trimmed[digits_start..]
      .parse()
      .map(Self)
      .map_err(|_| Error::InvalidGroupLabel(label.to_owned()))
  }

  pub fn number(self) -> u32 { self.0 }

  /// `{course_code}-Group{n}`.
  pub fn canonical_name(self, course_code: &str) -> String {
    format!("{course_code}-Group{}", self.0)
  }
}

/// Outcome of a committed group formation.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFormation {
  pub group_id:      i64,
  pub group_name:    String,
  /// `false` when an existing group with the same name was reused.
  pub created:       bool,
  pub members_added: u32,
}
