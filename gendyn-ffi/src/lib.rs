//! C ABI wrapper for the GENDYN voice.
//!
//! Exposes a small set of functions to create/destroy a voice, render
//! interleaved f32 samples, change every control and read them back.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Two opaque handles, both heap-allocated and owned by the caller:
//!   - `GendynEngine`: the voice itself (render, sample rate).
//!   - `GendynControls`: its configuration, from `gendyn_controls`.
//! - Render path produces **mono** internally and duplicates to N channels.
//! - Every function accepts null handles and does nothing (or returns 0/false).
//!
//! Threading
//! - A `GendynEngine` belongs to one thread (normally the audio thread):
//!   `gendyn_controls`, `gendyn_set_sample_rate`, `gendyn_render_interleaved_f32`
//!   and `gendyn_destroy` must not run concurrently on the same handle.
//! - A `GendynControls` may be used from any thread at any time, concurrently
//!   with rendering. Changes reach the voice at the start of the next render call.
//! - The two handles are independent: either may be destroyed first.

use gendyn_engine::controls::distribution_from_selector;
use gendyn_engine::{DistributionKind, Engine, Gendy, GendyControls, GendySettings};

/// Frames rendered per inner engine call.
const BLOCK: usize = 256;

/// Opaque voice wrapper we hand to C.
pub struct GendynEngine {
    inner: Engine<Gendy>,
}

impl GendynEngine {
    fn new(sr: f32, seed: Option<u64>) -> Self {
        let sr = if sr.is_finite() { sr.max(1.0) } else { 1.0 };
        let voice = match seed {
            Some(seed) => Gendy::with_seed(f64::from(sr), seed),
            None => Gendy::new(f64::from(sr)),
        };
        Self { inner: Engine::new(voice, sr) }
    }
}

/// Opaque, thread-safe handle onto a voice's configuration.
pub struct GendynControls {
    inner: GendyControls,
}

/// Plain-data mirror of the voice configuration, filled by `gendyn_dump`.
///
/// Distribution fields carry the integer selector (0 = uniform .. 5 = extreme value).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GendynSettings {
    pub active: bool,
    pub point_count: u32,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub amp_distribution: u8,
    pub amp_param: f64,
    pub amp_scale: f64,
    pub dur_distribution: u8,
    pub dur_param: f64,
    pub dur_scale: f64,
    pub sample_rate: f64,
}

impl From<GendySettings> for GendynSettings {
    fn from(s: GendySettings) -> Self {
        Self {
            active: s.active,
            // Bounded by MAX_POINTS.
            point_count: u32::try_from(s.point_count).unwrap_or(u32::MAX),
            min_frequency: s.min_frequency,
            max_frequency: s.max_frequency,
            amp_distribution: s.amp_distribution.as_u8(),
            amp_param: s.amp_param,
            amp_scale: s.amp_scale,
            dur_distribution: s.dur_distribution.as_u8(),
            dur_param: s.dur_param,
            dur_scale: s.dur_scale,
            sample_rate: s.sample_rate,
        }
    }
}

/// Borrow the engine exclusively, logging null misuse.
///
/// # Safety
/// `engine` must be null or a live pointer returned by `gendyn_create*`, not
/// borrowed anywhere else for the returned lifetime.
unsafe fn engine_mut<'a>(engine: *mut GendynEngine, op: &str) -> Option<&'a mut GendynEngine> {
    if engine.is_null() {
        tracing::warn!(op, "null engine handle");
        return None;
    }
    Some(&mut *engine)
}

/// Borrow the controls (shared), logging null misuse.
///
/// # Safety
/// `controls` must be null or a live pointer returned by `gendyn_controls`.
unsafe fn controls_ref<'a>(controls: *const GendynControls, op: &str) -> Option<&'a GendyControls> {
    if controls.is_null() {
        tracing::warn!(op, "null controls handle");
        return None;
    }
    Some(&(*controls).inner)
}

fn selector_or_uniform(selector: i32, which: &str) -> DistributionKind {
    distribution_from_selector(i64::from(selector)).unwrap_or_else(|err| {
        tracing::warn!(which, %err, "falling back to uniform");
        DistributionKind::Uniform
    })
}

// --- Creation / destruction -------------------------------------------------------

/// Create a voice seeded from OS entropy.
/// Returns a non-null pointer; free it with `gendyn_destroy`.
#[no_mangle]
pub extern "C" fn gendyn_create(sample_rate: f32) -> *mut GendynEngine {
    Box::into_raw(Box::new(GendynEngine::new(sample_rate, None)))
}

/// Create a voice with a fixed seed: identical control traffic renders identical output.
#[no_mangle]
pub extern "C" fn gendyn_create_seeded(sample_rate: f32, seed: u64) -> *mut GendynEngine {
    Box::into_raw(Box::new(GendynEngine::new(sample_rate, Some(seed))))
}

/// Destroy a voice previously returned by `gendyn_create*`.
///
/// # Safety
/// `engine` must be null or a pointer from `gendyn_create*` not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn gendyn_destroy(engine: *mut GendynEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// New controls handle for `engine`; free it with `gendyn_controls_destroy`.
/// Returns null when `engine` is null.
///
/// # Safety
/// `engine` must be null or a live handle owned by the calling thread.
#[no_mangle]
pub unsafe extern "C" fn gendyn_controls(engine: *mut GendynEngine) -> *mut GendynControls {
    let Some(e) = engine_mut(engine, "controls") else { return std::ptr::null_mut() };
    let inner = e.inner.generator().controls();
    Box::into_raw(Box::new(GendynControls { inner }))
}

/// Destroy a controls handle previously returned by `gendyn_controls`.
///
/// # Safety
/// `controls` must be null or a pointer from `gendyn_controls` not yet
/// destroyed, and no other thread may be using it.
#[no_mangle]
pub unsafe extern "C" fn gendyn_controls_destroy(controls: *mut GendynControls) {
    if !controls.is_null() {
        drop(Box::from_raw(controls));
    }
}

/// Change the sample rate (e.g. when the host reconfigures its device).
///
/// # Safety
/// `engine` must be null or a live handle owned by the calling thread.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_sample_rate(engine: *mut GendynEngine, sample_rate: f32) {
    let Some(e) = engine_mut(engine, "set_sample_rate") else { return };
    e.inner.set_sample_rate(sample_rate);
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` of audio into an interleaved f32 buffer with `channels` channels.
/// The voice is mono; each sample is duplicated to all channels.
///
/// Returns the number of frames rendered (0 on error).
///
/// # Safety
/// `engine` must be null or a live handle owned by the calling thread;
/// `out_interleaved` must be null or valid for `frames * channels` writes.
#[no_mangle]
pub unsafe extern "C" fn gendyn_render_interleaved_f32(
    engine: *mut GendynEngine,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    let Some(e) = engine_mut(engine, "render") else { return 0 };
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let (Ok(n), Ok(ch)) = (usize::try_from(frames), usize::try_from(channels)) else { return 0 };
    let Some(len) = n.checked_mul(ch) else { return 0 };
    let out = std::slice::from_raw_parts_mut(out_interleaved, len);

    let sr = e.inner.sample_rate();
    let mut mono = [0.0f32; BLOCK];
    for chunk in out.chunks_mut(BLOCK * ch) {
        let m = &mut mono[..chunk.len() / ch];
        e.inner.render(sr, m);
        for (frame, &s) in chunk.chunks_mut(ch).zip(m.iter()) {
            frame.fill(s);
        }
    }
    frames
}

// --- Controls (any thread) -------------------------------------------------------

/// Start (true) or silence (false) the voice. Silence does not advance its state.
///
/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_active(controls: *const GendynControls, active: bool) {
    if let Some(c) = controls_ref(controls, "set_active") { c.set_active(active); }
}

/// Breakpoints per cycle, clamped to `[1, 128]`.
///
/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_point_count(controls: *const GendynControls, n: i64) {
    if let Some(c) = controls_ref(controls, "set_point_count") { c.set_point_count(n); }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_min_frequency(controls: *const GendynControls, hz: f64) {
    if let Some(c) = controls_ref(controls, "set_min_frequency") { c.set_min_frequency(hz); }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_max_frequency(controls: *const GendynControls, hz: f64) {
    if let Some(c) = controls_ref(controls, "set_max_frequency") { c.set_max_frequency(hz); }
}

/// Selector 0..=5; anything else selects uniform.
///
/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_amp_distribution(controls: *const GendynControls, selector: i32) {
    if let Some(c) = controls_ref(controls, "set_amp_distribution") {
        c.set_amp_distribution(selector_or_uniform(selector, "amp"));
    }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_amp_param(controls: *const GendynControls, v: f64) {
    if let Some(c) = controls_ref(controls, "set_amp_param") { c.set_amp_param(v); }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_amp_scale(controls: *const GendynControls, v: f64) {
    if let Some(c) = controls_ref(controls, "set_amp_scale") { c.set_amp_scale(v); }
}

/// Selector 0..=5; anything else selects uniform.
///
/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_dur_distribution(controls: *const GendynControls, selector: i32) {
    if let Some(c) = controls_ref(controls, "set_dur_distribution") {
        c.set_dur_distribution(selector_or_uniform(selector, "dur"));
    }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_dur_param(controls: *const GendynControls, v: f64) {
    if let Some(c) = controls_ref(controls, "set_dur_param") { c.set_dur_param(v); }
}

/// # Safety
/// `controls` must be null or a live controls handle.
#[no_mangle]
pub unsafe extern "C" fn gendyn_set_dur_scale(controls: *const GendynControls, v: f64) {
    if let Some(c) = controls_ref(controls, "set_dur_scale") { c.set_dur_scale(v); }
}

/// Copy the current configuration into `out`. Returns false on null arguments.
///
/// # Safety
/// `controls` must be null or a live controls handle; `out` must be null or
/// valid for one write.
#[no_mangle]
pub unsafe extern "C" fn gendyn_dump(controls: *const GendynControls, out: *mut GendynSettings) -> bool {
    let Some(c) = controls_ref(controls, "dump") else { return false };
    if out.is_null() {
        return false;
    }
    out.write(GendynSettings::from(c.dump()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn dump(c: *const GendynControls) -> GendynSettings {
        let mut s = GendynSettings::default();
        assert!(unsafe { gendyn_dump(c, &mut s) });
        s
    }

    #[test]
    fn defaults_come_back_through_dump() {
        let e = gendyn_create_seeded(44_100.0, 9);
        let c = unsafe { gendyn_controls(e) };
        let s = dump(c);
        assert!(s.active);
        assert_eq!(s.point_count, 12);
        assert_eq!(s.min_frequency, 220.0);
        assert_eq!(s.max_frequency, 440.0);
        assert_eq!(s.amp_distribution, 0);
        assert_eq!(s.sample_rate, 44_100.0);
        unsafe {
            gendyn_controls_destroy(c);
            gendyn_destroy(e);
        }
    }

    #[test]
    fn setters_clamp_and_bad_selectors_mean_uniform() {
        let e = gendyn_create_seeded(48_000.0, 1);
        let c = unsafe { gendyn_controls(e) };
        unsafe {
            gendyn_set_point_count(c, 1_000);
            gendyn_set_max_frequency(c, 1.0e9);
            gendyn_set_amp_scale(c, -1.0);
            gendyn_set_dur_distribution(c, 4);
            gendyn_set_amp_distribution(c, 3);
            gendyn_set_amp_distribution(c, 42);
            gendyn_set_sample_rate(e, 0.0);
        }
        let s = dump(c);
        assert_eq!(s.point_count, 128);
        assert_eq!(s.max_frequency, 22_000.0);
        assert_eq!(s.amp_scale, 0.0);
        assert_eq!(s.dur_distribution, 4);
        assert_eq!(s.amp_distribution, 0);
        assert_eq!(s.sample_rate, 1.0);
        unsafe {
            gendyn_destroy(e);
            gendyn_controls_destroy(c);
        }
    }

    #[test]
    fn render_duplicates_mono_across_channels() {
        let e = gendyn_create_seeded(48_000.0, 5);
        let mut buf = vec![7.0f32; 600 * 3];
        let n = unsafe { gendyn_render_interleaved_f32(e, buf.as_mut_ptr(), 600, 3) };
        assert_eq!(n, 600);
        for f in buf.chunks(3) {
            assert!((-1.0..=1.0).contains(&f[0]));
            assert_eq!(f[0], f[1]);
            assert_eq!(f[1], f[2]);
        }
        unsafe { gendyn_destroy(e) };
    }

    #[test]
    fn same_seed_same_output() {
        let a = gendyn_create_seeded(48_000.0, 77);
        let b = gendyn_create_seeded(48_000.0, 77);
        let mut x = vec![0.0f32; 1_000];
        let mut y = vec![0.0f32; 1_000];
        unsafe {
            gendyn_render_interleaved_f32(a, x.as_mut_ptr(), 1_000, 1);
            gendyn_render_interleaved_f32(b, y.as_mut_ptr(), 1_000, 1);
            gendyn_destroy(a);
            gendyn_destroy(b);
        }
        assert_eq!(x, y);
    }

    #[test]
    fn inactive_voice_renders_silence() {
        let e = gendyn_create_seeded(48_000.0, 2);
        let mut buf = [1.0f32; 64];
        unsafe {
            let c = gendyn_controls(e);
            gendyn_set_active(c, false);
            gendyn_controls_destroy(c);
            gendyn_render_interleaved_f32(e, buf.as_mut_ptr(), 32, 2);
            gendyn_destroy(e);
        }
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn controls_work_from_another_thread_while_rendering() {
        let e = gendyn_create_seeded(48_000.0, 4);
        // Raw pointers are not Send; the address crosses the thread boundary.
        let c = unsafe { gendyn_controls(e) } as usize;
        let done = Arc::new(AtomicBool::new(false));

        let control = {
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let c = c as *const GendynControls;
                let mut n = 1;
                while !done.load(Ordering::Acquire) {
                    unsafe {
                        gendyn_set_point_count(c, n);
                        gendyn_set_max_frequency(c, 200.0 * n as f64);
                        gendyn_set_dur_distribution(c, (n % 6) as i32);
                    }
                    n = n % 128 + 1;
                }
                unsafe { gendyn_set_point_count(c, 3) };
            })
        };

        let mut buf = vec![0.0f32; 256 * 2];
        for _ in 0..200 {
            let n = unsafe { gendyn_render_interleaved_f32(e, buf.as_mut_ptr(), 256, 2) };
            assert_eq!(n, 256);
            assert!(buf.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
        done.store(true, Ordering::Release);
        control.join().unwrap();

        let c = c as *mut GendynControls;
        assert_eq!(dump(c).point_count, 3);
        unsafe {
            gendyn_destroy(e);
            // The configuration outlives the voice it came from.
            assert_eq!(dump(c).point_count, 3);
            gendyn_controls_destroy(c);
        }
    }

    #[test]
    fn null_arguments_are_ignored() {
        unsafe {
            gendyn_set_point_count(std::ptr::null(), 3);
            gendyn_destroy(std::ptr::null_mut());
            gendyn_controls_destroy(std::ptr::null_mut());
            assert!(gendyn_controls(std::ptr::null_mut()).is_null());
            assert_eq!(gendyn_render_interleaved_f32(std::ptr::null_mut(), std::ptr::null_mut(), 8, 1), 0);
            let mut s = GendynSettings::default();
            assert!(!gendyn_dump(std::ptr::null(), &mut s));

            let e = gendyn_create(48_000.0);
            let c = gendyn_controls(e);
            assert!(!gendyn_dump(c, std::ptr::null_mut()));
            assert_eq!(gendyn_render_interleaved_f32(e, std::ptr::null_mut(), 8, 1), 0);
            gendyn_controls_destroy(c);
            gendyn_destroy(e);
        }
    }
}
