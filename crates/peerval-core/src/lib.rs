//! Core types and trait definitions for the peer-evaluation service.
//!
//! This crate has no HTTP or database dependencies. It holds the domain
//! model, the rubric and roster rules, and the [`store::PeerEvalStore`]
//! abstraction the other crates build on.

pub mod error;
pub mod group;
pub mod model;
pub mod roster;
pub mod rubric;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
