#![cfg_attr(not(feature = "std"), no_std)]
//! GENDYN Core — no_std-ready building blocks for dynamic stochastic synthesis.
//!
//! Features
//! - `std`                 : (default) use the Rust standard library
//! - `no-std`              : build with `#![no_std]`, all math through `libm`
//! - `exact-distributions` : real cauchy / log-normal / chi-squared /
//!   exponential / extreme-value deviates (otherwise uniform fallback)
//!
//! Modules
//! - [`dsp`]          : math backend, clamp/lerp, boundary reflection (`mirror`)
//! - [`distribution`] : distribution selector and the `[-1, 1]` step sampler
//! - [`breakpoints`]  : fixed-capacity per-voice breakpoint table
//!
//! Design
//! - No heap allocations; randomness is always injected by the caller
//! - Every walk value is kept in bounds by reflection, never by clipping
//! - Friendly to embedded / real-time targets

pub mod breakpoints;
pub mod distribution;
pub mod dsp;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::breakpoints::{next_index, Breakpoint, BreakpointTable, MAX_POINTS};
    pub use crate::distribution::{sample, DistributionKind, Shape};
    pub use crate::dsp::{clamp, lerp, mirror, wrap_phase01};
}

#[cfg(test)]
mod smoke {

    #[test]
    fn prelude_exists() {
        use crate::prelude::*;
        use rand::rngs::mock::StepRng;

        let mut rng = StepRng::new(1 << 63, 0);
        let table = BreakpointTable::seeded(&mut rng);
        let step = sample(&mut rng, DistributionKind::Uniform, 0.5);
        let p = table.read(next_index(0, 4));
        let _ = mirror(p.amp_walk + step, -1.0, 1.0);
    }
}
