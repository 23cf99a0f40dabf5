//! Fixed-capacity breakpoint table.
//!
//! One table per voice holds the random-walk state of up to [`MAX_POINTS`]
//! control points. The logical point count lives with the voice's
//! configuration and may shrink or grow at any time; the storage never
//! changes size, so slots past the current count keep their (seeded) state
//! and are simply not visited.
//!
//! Every access is reduced modulo the capacity, which makes out-of-bounds
//! reads impossible even if a caller hands in a stale index.

use rand::Rng;

/// Capacity of a breakpoint table.
pub const MAX_POINTS: usize = 128;

/// Random-walk state of one control point.
///
/// `amp_walk` / `dur_walk` are the first-order walks (the stochastic step),
/// `amp_level` / `dur_level` the second-order walks that are read back as the
/// breakpoint's amplitude and normalized duration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Breakpoint {
    /// First amplitude walk, in `[-1, 1]`.
    pub amp_walk: f64,
    /// Breakpoint amplitude, in `[-1, 1]`.
    pub amp_level: f64,
    /// First duration walk, in `[-1, 1]`.
    pub dur_walk: f64,
    /// Normalized segment duration, in `[0, 1]`.
    pub dur_level: f64,
}

impl Breakpoint {
    /// Independent uniform draws within each field's domain.
    #[inline]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            amp_walk: rng.gen_range(-1.0..=1.0),
            amp_level: rng.gen_range(-1.0..=1.0),
            dur_walk: rng.gen_range(-1.0..=1.0),
            dur_level: rng.gen_range(0.0..=1.0),
        }
    }
}

/// Arena of [`MAX_POINTS`] breakpoints.
#[derive(Clone, Debug)]
pub struct BreakpointTable {
    points: [Breakpoint; MAX_POINTS],
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self { points: [Breakpoint::default(); MAX_POINTS] }
    }
}

impl BreakpointTable {
    /// A table whose every slot is already seeded from `rng`.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut t = Self::default();
        t.reseed(rng);
        t
    }

    /// Fill every slot, including the ones past the current point count.
    pub fn reseed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for p in &mut self.points {
            *p = Breakpoint::random(rng);
        }
    }

    #[inline]
    pub fn read(&self, i: usize) -> Breakpoint {
        self.points[i % MAX_POINTS]
    }

    #[inline]
    pub fn write(&mut self, i: usize, point: Breakpoint) {
        self.points[i % MAX_POINTS] = point;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        MAX_POINTS
    }

    /// The full backing storage, active or not.
    #[inline]
    pub fn as_slice(&self) -> &[Breakpoint] {
        &self.points
    }
}

/// Next slot after `index` for a voice with `count` active points.
///
/// `count` is clamped to `[1, MAX_POINTS]` first, so the result is always a
/// valid slot even while the count is changing under the render path.
#[inline]
pub fn next_index(index: usize, count: usize) -> usize {
    let count = count.clamp(1, MAX_POINTS);
    (index % count + 1) % count
}
