//! Error types for `peerval-core`.

use thiserror::Error;

use crate::{roster::RosterError, rubric::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("group label {0:?} does not end in a group number")]
  InvalidGroupLabel(String),

  #[error("select at least one student to form a group")]
  EmptyGroup,

  #[error(transparent)]
  Roster(#[from] RosterError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of a failure, used where errors are turned into
/// user-facing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The input was rejected; nothing was written.
  Invalid,
  /// A referenced record does not exist (or is not visible to the caller).
  NotFound,
  /// A uniqueness rule was violated.
  Conflict,
  /// Anything else: connectivity, constraint or encoding failures.
  Internal,
}

/// Errors that can report their [`ErrorKind`].
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_)
      | Error::InvalidGroupLabel(_)
      | Error::EmptyGroup
      | Error::Roster(_) => ErrorKind::Invalid,
    }
  }
}
