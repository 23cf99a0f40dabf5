//! GENDYN Engine — stochastic voice + lock-free controls + realtime glue.
//!
//! Crate layout:
//! - [`graph`]    : `Generator` trait and `Engine<G>` wrapper
//! - [`controls`] : shared, clamped configuration (`GendyControls`) and its
//!   snapshot (`GendySettings`)
//! - [`gendy`]    : the dynamic stochastic synthesis voice
//! - [`error`]    : parse errors for host-supplied selectors
//!
//! The engine deliberately avoids heap allocations in the audio thread.
//! Parameters are atomics written by the control thread and read once per
//! rendered block.

pub mod controls;
pub mod error;
pub mod gendy;
pub mod graph;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use controls::{parse_distribution, GendyControls, GendySettings};
pub use error::ParseDistributionError;
pub use gendy::{Gendy, VoiceState};
pub use gendyn_core::breakpoints::MAX_POINTS;
pub use gendyn_core::distribution::DistributionKind;
pub use graph::{Engine, Generator};
