//! GENDYN voice: dynamic stochastic synthesis.
//!
//! A cycle of the waveform is cut into `point_count` segments. Each segment
//! ramps linearly from the previous breakpoint amplitude to the next one, and
//! its length follows the breakpoint's duration walk. Whenever the segment
//! phase crosses 1.0 the voice moves to the next breakpoint and perturbs its
//! walks:
//!
//! ```text
//! step      = mirror(amp_walk  + sample(amp_dist, amp_param), -1, 1)
//! next_amp  = mirror(amp_level + amp_scale * step,            -1, 1)
//! dstep     = mirror(dur_walk  + sample(dur_dist, dur_param), -1, 1)
//! rate      = mirror(dur_level + dur_scale * dstep,            0, 1)
//! speed     = (min_f + (max_f - min_f) * rate) / sr * point_count
//! ```
//!
//! The per-sample path is constant time, allocation-free and lock-free. The
//! configuration is read from [`GendyControls`] once per rendered block.

use gendyn_core::breakpoints::{next_index, BreakpointTable};
use gendyn_core::distribution::{DistributionKind, Shape};
use gendyn_core::dsp::{lerp, mirror, wrap_phase01};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::controls::{GendyControls, GendySettings};
use crate::graph::Generator;

/// Runtime state of a voice, for diagnostics and tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VoiceState {
    /// Position inside the current segment.
    pub phase: f64,
    /// Breakpoint slot the current segment ends on.
    pub index: usize,
    pub amp: f64,
    pub next_amp: f64,
    /// Normalized duration of the current segment.
    pub rate: f64,
    /// Phase increment per sample.
    pub speed: f64,
}

impl Default for VoiceState {
    /// Phase starts at 1 so the very first sample crosses into a segment.
    fn default() -> Self {
        Self { phase: 1.0, index: 0, amp: 0.0, next_amp: 0.0, rate: 1.0, speed: 1.0 }
    }
}

/// One GENDYN voice driven by the random source `R`.
pub struct Gendy<R = SmallRng> {
    controls: GendyControls,
    // per-block snapshot
    settings: GendySettings,
    amp_shape: Shape,
    dur_shape: Shape,
    inv_sr: f64,
    // walks + state
    table: BreakpointTable,
    state: VoiceState,
    rng: R,
}

impl<R> core::fmt::Debug for Gendy<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gendy")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Gendy<SmallRng> {
    /// Voice seeded from system entropy.
    pub fn new(sample_rate: f64) -> Self {
        tracing::debug!(sample_rate, "gendy voice seeded from entropy");
        Self::with_rng(sample_rate, SmallRng::from_entropy())
    }

    /// Reproducible voice: equal seeds and equal control calls render equal
    /// output.
    pub fn with_seed(sample_rate: f64, seed: u64) -> Self {
        tracing::debug!(sample_rate, seed, "gendy voice seeded");
        Self::with_rng(sample_rate, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Gendy<R> {
    /// Voice with default configuration at `sample_rate`, drawing from `rng`.
    pub fn with_rng(sample_rate: f64, rng: R) -> Self {
        let controls = GendyControls::new(GendySettings { sample_rate, ..GendySettings::default() });
        Self::with_controls(controls, rng)
    }

    /// Voice bound to an existing control block. The breakpoint table is
    /// seeded for every slot up to capacity before the first render.
    pub fn with_controls(controls: GendyControls, mut rng: R) -> Self {
        let table = BreakpointTable::seeded(&mut rng);
        Self::with_table(controls, table, rng)
    }

    /// Voice starting from a caller-prepared breakpoint table.
    pub fn with_table(controls: GendyControls, table: BreakpointTable, rng: R) -> Self {
        let settings = controls.dump();
        let mut g = Self {
            controls,
            settings,
            amp_shape: Shape::Uniform,
            dur_shape: Shape::Uniform,
            inv_sr: 1.0 / settings.sample_rate,
            table,
            state: VoiceState::default(),
            rng,
        };
        g.refresh();
        g
    }

    // ------------------------------- control plane -------------------------------

    /// Handle for setting parameters from another thread.
    #[inline]
    pub fn controls(&self) -> GendyControls {
        self.controls.clone()
    }

    #[inline] pub fn set_active(&self, on: bool) { self.controls.set_active(on); }
    #[inline] pub fn set_point_count(&self, n: i64) { self.controls.set_point_count(n); }
    #[inline] pub fn set_min_frequency(&self, hz: f64) { self.controls.set_min_frequency(hz); }
    #[inline] pub fn set_max_frequency(&self, hz: f64) { self.controls.set_max_frequency(hz); }
    #[inline] pub fn set_amp_distribution(&self, k: DistributionKind) { self.controls.set_amp_distribution(k); }
    #[inline] pub fn set_amp_param(&self, v: f64) { self.controls.set_amp_param(v); }
    #[inline] pub fn set_amp_scale(&self, v: f64) { self.controls.set_amp_scale(v); }
    #[inline] pub fn set_dur_distribution(&self, k: DistributionKind) { self.controls.set_dur_distribution(k); }
    #[inline] pub fn set_dur_param(&self, v: f64) { self.controls.set_dur_param(v); }
    #[inline] pub fn set_dur_scale(&self, v: f64) { self.controls.set_dur_scale(v); }
    #[inline] pub fn set_sample_rate(&self, sr: f64) { self.controls.set_sample_rate(sr); }

    /// Current configuration, as the control plane sees it.
    #[inline]
    pub fn dump(&self) -> GendySettings {
        self.controls.dump()
    }

    #[inline]
    pub fn state(&self) -> VoiceState {
        self.state
    }

    #[inline]
    pub fn table(&self) -> &BreakpointTable {
        &self.table
    }

    /// Replace every walk with fresh random values. Not for the audio thread
    /// mid-block; the cost is proportional to the table capacity.
    pub fn reseed(&mut self) {
        self.table.reseed(&mut self.rng);
    }

    // ------------------------------- render path ---------------------------------

    /// Render `out.len()` samples, each in `[-1, 1]`.
    ///
    /// Configuration is sampled once, before the first sample. An inactive
    /// voice writes silence and keeps its state untouched.
    pub fn render(&mut self, out: &mut [f32]) {
        self.refresh();
        if !self.settings.active {
            out.fill(0.0);
            return;
        }
        for y in out.iter_mut() {
            *y = self.tick();
        }
    }

    /// Take the per-block configuration snapshot.
    #[inline]
    fn refresh(&mut self) {
        let s = self.controls.dump();
        self.amp_shape = s.amp_distribution.shape(s.amp_param);
        self.dur_shape = s.dur_distribution.shape(s.dur_param);
        self.inv_sr = 1.0 / s.sample_rate;
        self.settings = s;
    }

    /// Advance one sample with the current snapshot.
    #[inline]
    fn tick(&mut self) -> f32 {
        if self.state.phase >= 1.0 {
            self.state.phase -= 1.0;
            self.cross();
            // Faster than one segment per sample: drop the skipped segments.
            if self.state.phase >= 1.0 {
                self.state.phase = wrap_phase01(self.state.phase);
            }
        }

        let z = lerp(self.state.amp, self.state.next_amp, self.state.phase);
        self.state.phase += self.state.speed;

        #[allow(clippy::cast_possible_truncation)]
        let y = z as f32;
        y.clamp(-1.0, 1.0)
    }

    /// Move onto the next breakpoint and perturb its walks.
    fn cross(&mut self) {
        let s = &self.settings;
        let st = &mut self.state;

        st.index = next_index(st.index, s.point_count);
        st.amp = st.next_amp;

        let mut p = self.table.read(st.index);

        let step = mirror(p.amp_walk + self.amp_shape.sample(&mut self.rng), -1.0, 1.0);
        p.amp_walk = step;
        st.next_amp = mirror(p.amp_level + s.amp_scale * step, -1.0, 1.0);
        p.amp_level = st.next_amp;

        let dstep = mirror(p.dur_walk + self.dur_shape.sample(&mut self.rng), -1.0, 1.0);
        p.dur_walk = dstep;
        st.rate = mirror(p.dur_level + s.dur_scale * dstep, 0.0, 1.0);
        p.dur_level = st.rate;

        self.table.write(st.index, p);

        #[allow(clippy::cast_precision_loss)]
        let count = s.point_count as f64;
        let hz = s.min_frequency + (s.max_frequency - s.min_frequency) * st.rate;
        st.speed = hz * self.inv_sr * count;
    }
}

impl<R: Rng> Generator for Gendy<R> {
    fn reset(&mut self, sr: f32) {
        self.controls.set_sample_rate(f64::from(sr));
    }

    fn next(&mut self) -> f32 {
        self.refresh();
        if self.settings.active { self.tick() } else { 0.0 }
    }

    fn render(&mut self, out: &mut [f32]) {
        Gendy::render(self, out);
    }
}
