//! Error types for gendyn-engine.
//!
//! The render path has no failure modes; these only surface where text or
//! integers from a host are turned into typed configuration.

use thiserror::Error;

/// Failure to turn a host-supplied value into a distribution kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDistributionError {
    #[error("unknown distribution name: {0:?}")]
    UnknownName(String),

    #[error("distribution selector out of range: {0} (expected 0..=5)")]
    SelectorOutOfRange(i64),
}
