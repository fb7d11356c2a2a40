//! Error type for `peerval-store-sqlite`.

use peerval_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] peerval_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored value could not be decoded into its domain type.
  #[error("invalid stored value: {0}")]
  Decode(String),

  #[error("course not found: {0}")]
  CourseNotFound(i64),

  #[error("email {0} is already registered")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::CourseNotFound(_) => ErrorKind::NotFound,
      Error::EmailTaken(_) => ErrorKind::Conflict,
      Error::Database(_) | Error::Decode(_) => ErrorKind::Internal,
    }
  }
}
