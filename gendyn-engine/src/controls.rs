//! Lock-free voice configuration.
//!
//! The control plane (UI, message handler, FFI caller) and the audio thread
//! share one [`GendyControls`] block. Setters clamp and store into atomics;
//! the voice takes a [`GendySettings`] snapshot at the top of every rendered
//! block. Fields are independent cells: last write wins and becomes visible
//! no later than the next block, which is all a voice needs since each field
//! is valid on its own.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF64;
use gendyn_core::breakpoints::MAX_POINTS;
use gendyn_core::distribution::DistributionKind;
use gendyn_core::dsp::clamp;

use crate::error::ParseDistributionError;

/// Lowest accepted frequency bound, Hz.
pub const MIN_FREQUENCY: f64 = 1.0e-6;
/// Highest accepted frequency bound, Hz.
pub const MAX_FREQUENCY: f64 = 22_000.0;
/// Sample rates below this are raised to it.
pub const MIN_SAMPLE_RATE: f64 = 1.0;

pub const DEFAULT_POINT_COUNT: usize = 12;
pub const DEFAULT_MIN_FREQUENCY: f64 = 220.0;
pub const DEFAULT_MAX_FREQUENCY: f64 = 440.0;
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

// --------------------------------- Snapshot ---------------------------------------

/// Plain copy of a voice's configuration; what `dump()` returns and what a
/// preset file holds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GendySettings {
    pub active: bool,
    pub point_count: usize,
    pub min_frequency: f64,
    pub max_frequency: f64,
    #[cfg_attr(feature = "serde", serde(with = "distribution_name"))]
    pub amp_distribution: DistributionKind,
    pub amp_param: f64,
    pub amp_scale: f64,
    #[cfg_attr(feature = "serde", serde(with = "distribution_name"))]
    pub dur_distribution: DistributionKind,
    pub dur_param: f64,
    pub dur_scale: f64,
    pub sample_rate: f64,
}

impl Default for GendySettings {
    fn default() -> Self {
        Self {
            active: true,
            point_count: DEFAULT_POINT_COUNT,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            max_frequency: DEFAULT_MAX_FREQUENCY,
            amp_distribution: DistributionKind::Uniform,
            amp_param: 0.5,
            amp_scale: 0.5,
            dur_distribution: DistributionKind::Uniform,
            dur_param: 0.5,
            dur_scale: 0.5,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl GendySettings {
    /// Every field pulled into its domain, exactly as the setters would.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            active: self.active,
            point_count: clamp_point_count(i64::try_from(self.point_count).unwrap_or(i64::MAX)),
            min_frequency: clamp_frequency(self.min_frequency),
            max_frequency: clamp_frequency(self.max_frequency),
            amp_distribution: self.amp_distribution,
            amp_param: clamp_unit(self.amp_param),
            amp_scale: clamp_unit(self.amp_scale),
            dur_distribution: self.dur_distribution,
            dur_param: clamp_unit(self.dur_param),
            dur_scale: clamp_unit(self.dur_scale),
            sample_rate: clamp_sample_rate(self.sample_rate),
        }
    }
}

#[inline]
pub fn clamp_point_count(v: i64) -> usize {
    // MAX_POINTS fits comfortably in i64 and the clamped value in usize.
    v.clamp(1, MAX_POINTS as i64) as usize
}

#[inline]
pub fn clamp_frequency(hz: f64) -> f64 {
    clamp(hz, MIN_FREQUENCY, MAX_FREQUENCY)
}

#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    clamp(v, 0.0, 1.0)
}

#[inline]
pub fn clamp_sample_rate(sr: f64) -> f64 {
    clamp(sr, MIN_SAMPLE_RATE, f64::MAX)
}

// --------------------------------- Parsing ----------------------------------------

/// Integer selector (as sent by message-based hosts) → kind.
pub fn distribution_from_selector(v: i64) -> Result<DistributionKind, ParseDistributionError> {
    u8::try_from(v)
        .ok()
        .and_then(DistributionKind::from_u8)
        .ok_or(ParseDistributionError::SelectorOutOfRange(v))
}

/// Accepts either a name (`"cauchy"`, `"log-normal"`, ...) or an integer
/// selector (`"0"`..`"5"`).
pub fn parse_distribution(s: &str) -> Result<DistributionKind, ParseDistributionError> {
    let t = s.trim();
    if let Ok(v) = t.parse::<i64>() {
        return distribution_from_selector(v);
    }
    DistributionKind::from_name(t).ok_or_else(|| ParseDistributionError::UnknownName(t.to_string()))
}

#[cfg(feature = "serde")]
mod distribution_name {
    use gendyn_core::distribution::DistributionKind;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &DistributionKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(kind.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DistributionKind, D::Error> {
        let name = String::deserialize(d)?;
        super::parse_distribution(&name).map_err(serde::de::Error::custom)
    }
}

// --------------------------------- Shared block -----------------------------------

#[derive(Debug)]
struct Shared {
    active: AtomicBool,
    point_count: AtomicUsize,
    min_frequency: AtomicF64,
    max_frequency: AtomicF64,
    amp_distribution: AtomicU8,
    amp_param: AtomicF64,
    amp_scale: AtomicF64,
    dur_distribution: AtomicU8,
    dur_param: AtomicF64,
    dur_scale: AtomicF64,
    sample_rate: AtomicF64,
}

impl Shared {
    fn new(s: GendySettings) -> Self {
        let s = s.clamped();
        Self {
            active: AtomicBool::new(s.active),
            point_count: AtomicUsize::new(s.point_count),
            min_frequency: AtomicF64::new(s.min_frequency),
            max_frequency: AtomicF64::new(s.max_frequency),
            amp_distribution: AtomicU8::new(s.amp_distribution.as_u8()),
            amp_param: AtomicF64::new(s.amp_param),
            amp_scale: AtomicF64::new(s.amp_scale),
            dur_distribution: AtomicU8::new(s.dur_distribution.as_u8()),
            dur_param: AtomicF64::new(s.dur_param),
            dur_scale: AtomicF64::new(s.dur_scale),
            sample_rate: AtomicF64::new(s.sample_rate),
        }
    }
}

/// Cloneable, thread-safe handle onto one voice's configuration.
///
/// Every setter clamps into the field's domain and never fails.
#[derive(Clone, Debug)]
pub struct GendyControls {
    shared: Arc<Shared>,
}

impl Default for GendyControls {
    fn default() -> Self {
        Self::new(GendySettings::default())
    }
}

impl GendyControls {
    pub fn new(settings: GendySettings) -> Self {
        Self { shared: Arc::new(Shared::new(settings)) }
    }

    /// Store every field of `settings` (clamped).
    pub fn apply(&self, settings: &GendySettings) {
        self.set_active(settings.active);
        self.set_point_count(i64::try_from(settings.point_count).unwrap_or(i64::MAX));
        self.set_min_frequency(settings.min_frequency);
        self.set_max_frequency(settings.max_frequency);
        self.set_amp_distribution(settings.amp_distribution);
        self.set_amp_param(settings.amp_param);
        self.set_amp_scale(settings.amp_scale);
        self.set_dur_distribution(settings.dur_distribution);
        self.set_dur_param(settings.dur_param);
        self.set_dur_scale(settings.dur_scale);
        self.set_sample_rate(settings.sample_rate);
    }

    #[inline]
    pub fn set_active(&self, on: bool) {
        self.shared.active.store(on, Ordering::Release);
    }

    /// Clamped to `[1, MAX_POINTS]`.
    #[inline]
    pub fn set_point_count(&self, n: i64) {
        self.shared.point_count.store(clamp_point_count(n), Ordering::Release);
    }

    #[inline]
    pub fn set_min_frequency(&self, hz: f64) {
        self.shared.min_frequency.store(clamp_frequency(hz), Ordering::Release);
    }

    #[inline]
    pub fn set_max_frequency(&self, hz: f64) {
        self.shared.max_frequency.store(clamp_frequency(hz), Ordering::Release);
    }

    pub fn set_amp_distribution(&self, kind: DistributionKind) {
        note_fallback("amp", kind);
        self.shared.amp_distribution.store(kind.as_u8(), Ordering::Release);
    }

    #[inline]
    pub fn set_amp_param(&self, v: f64) {
        self.shared.amp_param.store(clamp_unit(v), Ordering::Release);
    }

    #[inline]
    pub fn set_amp_scale(&self, v: f64) {
        self.shared.amp_scale.store(clamp_unit(v), Ordering::Release);
    }

    pub fn set_dur_distribution(&self, kind: DistributionKind) {
        note_fallback("dur", kind);
        self.shared.dur_distribution.store(kind.as_u8(), Ordering::Release);
    }

    #[inline]
    pub fn set_dur_param(&self, v: f64) {
        self.shared.dur_param.store(clamp_unit(v), Ordering::Release);
    }

    #[inline]
    pub fn set_dur_scale(&self, v: f64) {
        self.shared.dur_scale.store(clamp_unit(v), Ordering::Release);
    }

    /// Host sample rate in Hz; the voice derives its inverse on the next block.
    pub fn set_sample_rate(&self, sr: f64) {
        let sr = clamp_sample_rate(sr);
        let prev = self.shared.sample_rate.swap(sr, Ordering::AcqRel);
        if prev != sr {
            tracing::debug!(from = prev, to = sr, "sample rate changed");
        }
    }

    /// Read-only snapshot of the current configuration.
    pub fn dump(&self) -> GendySettings {
        let s = &self.shared;
        GendySettings {
            active: s.active.load(Ordering::Acquire),
            point_count: s.point_count.load(Ordering::Acquire),
            min_frequency: s.min_frequency.load(Ordering::Acquire),
            max_frequency: s.max_frequency.load(Ordering::Acquire),
            amp_distribution: load_kind(&s.amp_distribution),
            amp_param: s.amp_param.load(Ordering::Acquire),
            amp_scale: s.amp_scale.load(Ordering::Acquire),
            dur_distribution: load_kind(&s.dur_distribution),
            dur_param: s.dur_param.load(Ordering::Acquire),
            dur_scale: s.dur_scale.load(Ordering::Acquire),
            sample_rate: s.sample_rate.load(Ordering::Acquire),
        }
    }
}

#[inline]
fn load_kind(cell: &AtomicU8) -> DistributionKind {
    // Only valid selectors are ever stored.
    DistributionKind::from_u8(cell.load(Ordering::Acquire)).unwrap_or_default()
}

fn note_fallback(walk: &'static str, kind: DistributionKind) {
    if !kind.is_exact() {
        tracing::debug!(walk, %kind, "built without exact-distributions; sampling uniformly");
    }
}
