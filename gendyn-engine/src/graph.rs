//! Realtime generator glue.
//!
//! This module defines the minimal `Generator` trait and a lightweight `Engine<G>`
//! wrapper that owns a generator (voice), tracks sample rate and time, and
//! produces **mono** samples one at a time or a block at a time with zero heap
//! work.
//!
//! Design goals
//! - No dynamic allocations in the audio thread
//! - SR changes handled lazily (if the host reconfigures), with cheap branching
//! - Generic over the voice type, so voices can be swapped without trait objects

/// Anything that can generate mono audio.
pub trait Generator {
    /// Called when the engine is (re)initialized or when the sample rate changes.
    fn reset(&mut self, sr: f32);

    /// Generate the next mono sample. Implementations should assume the sample
    /// rate has been communicated via `reset`.
    fn next(&mut self) -> f32;

    /// Fill `out` with consecutive samples.
    fn render(&mut self, out: &mut [f32]) {
        for y in out.iter_mut() {
            *y = self.next();
        }
    }
}

/// Lightweight realtime engine that owns a generator.
///
/// The audio callback calls `next(sr)` per sample or `render(sr, block)` per
/// block. If the `sr` reported by the host changes, the engine calls
/// `reset(sr)` on the inner generator once and continues.
pub struct Engine<G: Generator> {
    sr: f32,
    t: f64,
    gen: G,
}

impl<G: Generator> Engine<G> {
    /// Construct with an already-configured generator. We immediately `reset`
    /// the generator to communicate the sample rate.
    #[inline]
    pub fn new(mut gen: G, sr: f32) -> Self {
        let sr = if sr.is_finite() { sr.max(1.0) } else { 1.0 };
        gen.reset(sr);
        Self { sr, t: 0.0, gen }
    }

    /// Rates below 1 Hz clamp to 1; non-finite rates keep the current one.
    #[inline]
    fn sync_rate(&mut self, sr: f32) {
        let sr = if sr.is_finite() { sr.max(1.0) } else { self.sr };
        if sr != self.sr {
            self.sr = sr;
            self.gen.reset(sr);
        }
    }

    /// Produce **one** mono sample at the given sample rate.
    #[inline]
    pub fn next(&mut self, sr: f32) -> f32 {
        self.sync_rate(sr);
        self.t += 1.0 / f64::from(self.sr);
        self.gen.next()
    }

    /// Produce `out.len()` mono samples at the given sample rate.
    #[inline]
    pub fn render(&mut self, sr: f32, out: &mut [f32]) {
        self.sync_rate(sr);
        #[allow(clippy::cast_precision_loss)]
        let n = out.len() as f64;
        self.t += n / f64::from(self.sr);
        self.gen.render(out);
    }

    /// Tell the generator about a new host rate (no-op when unchanged).
    #[inline]
    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sync_rate(sr);
    }

    /// Return the engine's current sample rate.
    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }

    /// Return elapsed time (seconds) since this engine was created.
    #[inline] pub fn time(&self) -> f64 { self.t }

    /// Replace the inner generator in a zero-allocation manner.
    /// We call `reset(sr)` on the new one.
    #[inline]
    pub fn swap_generator(&mut self, mut gen: G) -> G {
        gen.reset(self.sr);
        core::mem::replace(&mut self.gen, gen)
    }

    /// Get a mutable reference to the inner generator for live parameter tweaks.
    #[inline]
    pub fn generator_mut(&mut self) -> &mut G { &mut self.gen }

    #[inline]
    pub fn generator(&self) -> &G { &self.gen }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts samples and remembers the last rate it was told about.
    #[derive(Default)]
    struct Ramp {
        sr: f32,
        resets: usize,
        n: f32,
    }

    impl Generator for Ramp {
        fn reset(&mut self, sr: f32) {
            self.sr = sr;
            self.resets += 1;
        }
        fn next(&mut self) -> f32 {
            self.n += 1.0;
            self.n
        }
    }

    #[test]
    fn resets_once_per_rate_change() {
        let mut e = Engine::new(Ramp::default(), 48_000.0);
        assert_eq!(e.generator().resets, 1);
        e.next(48_000.0);
        e.next(48_000.0);
        assert_eq!(e.generator().resets, 1);
        e.next(44_100.0);
        e.next(44_100.0);
        assert_eq!(e.generator().resets, 2);
        assert_eq!(e.generator().sr, 44_100.0);
        assert_eq!(e.sample_rate(), 44_100.0);
    }

    #[test]
    fn unusable_rates_do_not_reset_every_call() {
        let mut e = Engine::new(Ramp::default(), 0.5);
        assert_eq!(e.sample_rate(), 1.0);
        for _ in 0..10 {
            e.next(0.5);
        }
        assert_eq!(e.generator().resets, 1);

        let mut out = [0.0f32; 8];
        for _ in 0..10 {
            e.next(f32::NAN);
            e.render(f32::INFINITY, &mut out);
        }
        assert_eq!(e.generator().resets, 1);
        assert_eq!(e.sample_rate(), 1.0);

        e.set_sample_rate(22_050.0);
        e.set_sample_rate(22_050.0);
        assert_eq!(e.generator().resets, 2);
        assert_eq!(e.generator().sr, 22_050.0);
    }

    #[test]
    fn default_render_calls_next_in_order() {
        let mut e = Engine::new(Ramp::default(), 100.0);
        let mut out = [0.0f32; 4];
        e.render(100.0, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
        assert!((e.time() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn swap_hands_back_the_old_generator() {
        let mut e = Engine::new(Ramp::default(), 8_000.0);
        e.next(8_000.0);
        let old = e.swap_generator(Ramp::default());
        assert_eq!(old.n, 1.0);
        assert_eq!(e.generator().sr, 8_000.0);
        e.generator_mut().n = 10.0;
        assert_eq!(e.next(8_000.0), 11.0);
    }
}
