//! GENDYN CLI — real-time player and offline renderer for stochastic voices.

mod preset;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use atomic_float::AtomicF32;
use clap::{Args as ClapArgs, Parser, Subcommand};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gendyn_engine::{parse_distribution, DistributionKind, Engine, Gendy, GendySettings};
use tracing_subscriber::EnvFilter;

/// Frames rendered per engine call inside the audio callback.
const BLOCK: usize = 256;

/// Dynamic stochastic synthesis from the command line
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio output devices and exit
    ListDevices,
    /// Play a voice through an output device
    Play(PlayArgs),
    /// Render a voice to a 32-bit float WAV file
    Render(RenderArgs),
    /// Write the default preset to a TOML file
    InitPreset {
        #[arg(long, default_value = "gendyn.toml")]
        out: PathBuf,
    },
}

/// Voice configuration: a preset file, then per-parameter overrides.
#[derive(ClapArgs, Debug)]
struct VoiceArgs {
    /// TOML preset (see `init-preset`)
    #[arg(long)]
    preset: Option<PathBuf>,
    /// Seed for reproducible output (entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Breakpoints per cycle, clamped to 1..=128
    #[arg(long, allow_negative_numbers = true)]
    points: Option<i64>,
    /// Lower frequency bound, Hz
    #[arg(long, allow_negative_numbers = true)]
    min_freq: Option<f64>,
    /// Upper frequency bound, Hz
    #[arg(long, allow_negative_numbers = true)]
    max_freq: Option<f64>,
    /// Amplitude distribution: name or selector 0..=5
    #[arg(long, value_parser = parse_distribution)]
    amp_dist: Option<DistributionKind>,
    #[arg(long, allow_negative_numbers = true)]
    amp_param: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    amp_scale: Option<f64>,
    /// Duration distribution: name or selector 0..=5
    #[arg(long, value_parser = parse_distribution)]
    dur_dist: Option<DistributionKind>,
    #[arg(long, allow_negative_numbers = true)]
    dur_param: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    dur_scale: Option<f64>,
}

#[derive(ClapArgs)]
struct PlayArgs {
    #[command(flatten)]
    voice: VoiceArgs,
    /// Output device name (default device when omitted)
    #[arg(long)]
    device: Option<String>,
    #[arg(long)]
    sample_rate: Option<u32>,
    #[arg(long)]
    channels: Option<u16>,
    /// Stop after this many seconds (play until Ctrl+C when omitted)
    #[arg(long)]
    duration: Option<u64>,
    #[arg(long, default_value_t = 0.35)]
    gain: f32,
}

#[derive(ClapArgs)]
struct RenderArgs {
    #[command(flatten)]
    voice: VoiceArgs,
    /// Output WAV path
    #[arg(long, default_value = "gendyn.wav")]
    out: PathBuf,
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,
    #[arg(long, default_value_t = 1)]
    channels: u16,
    #[arg(long, default_value_t = 0.8)]
    gain: f32,
}

impl VoiceArgs {
    fn settings(&self, sample_rate: f64) -> Result<GendySettings> {
        let mut s = match &self.preset {
            Some(path) => preset::load(path)?,
            None => GendySettings::default(),
        };
        if let Some(v) = self.points { s.point_count = usize::try_from(v.max(0)).unwrap_or(usize::MAX); }
        if let Some(v) = self.min_freq { s.min_frequency = v; }
        if let Some(v) = self.max_freq { s.max_frequency = v; }
        if let Some(v) = self.amp_dist { s.amp_distribution = v; }
        if let Some(v) = self.amp_param { s.amp_param = v; }
        if let Some(v) = self.amp_scale { s.amp_scale = v; }
        if let Some(v) = self.dur_dist { s.dur_distribution = v; }
        if let Some(v) = self.dur_param { s.dur_param = v; }
        if let Some(v) = self.dur_scale { s.dur_scale = v; }
        s.sample_rate = sample_rate;
        Ok(s.clamped())
    }

    fn voice(&self, sample_rate: f64) -> Result<Gendy> {
        let settings = self.settings(sample_rate)?;
        let voice = match self.seed {
            Some(seed) => Gendy::with_seed(sample_rate, seed),
            None => Gendy::new(sample_rate),
        };
        voice.controls().apply(&settings);
        tracing::info!(
            points = settings.point_count,
            min_hz = settings.min_frequency,
            max_hz = settings.max_frequency,
            amp = %settings.amp_distribution,
            dur = %settings.dur_distribution,
            seed = ?self.seed,
            "voice ready"
        );
        Ok(voice)
    }
}

fn list_output_devices() -> Result<()> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    if let Some(name) = name {
        for d in host.output_devices()? {
            if d.name()? == name { return Ok(d); }
        }
        bail!("requested device not found: {name}");
    }
    host.default_output_device()
        .ok_or_else(|| anyhow!("no default output device"))
}

fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig> {
    // If nothing requested, default is already concrete.
    if req_sr.is_none() && req_ch.is_none() {
        return Ok(device.default_output_config()?);
    }

    // Pick a SupportedStreamConfigRange first.
    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let ch     = range.channels();
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = req_ch.map_or(0, |c| u64::from(ch.abs_diff(c)));
        let sr_pen = match req_sr {
            Some(sr) if !(sr_min..=sr_max).contains(&sr) => u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))),
            _ => 0,
        };

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| anyhow!("no supported output configs"))?;

    // Choose a concrete sample rate and convert the range into a concrete config.
    let pick_sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };

    Ok(range.with_sample_rate(pick_sr))
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut engine: Engine<Gendy>,
    gain: f32,
    peak: Arc<AtomicF32>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    #[allow(clippy::cast_precision_loss)]
    let sr = cfg.sample_rate.0 as f32;
    let channels = usize::from(cfg.channels);
    let mut scratch = [0.0f32; BLOCK];

    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _| {
            let mut block_peak = 0.0f32;
            for frames in output.chunks_mut(channels * BLOCK) {
                let n = frames.len() / channels;
                let mono = &mut scratch[..n];
                engine.render(sr, mono);
                for (frame, &s) in frames.chunks_mut(channels).zip(mono.iter()) {
                    let s = (s * gain).clamp(-1.0, 1.0);
                    block_peak = block_peak.max(s.abs());
                    let v: T = T::from_sample(s);
                    frame.fill(v);
                }
            }
            peak.fetch_max(block_peak, std::sync::atomic::Ordering::Relaxed);
        },
        |e| tracing::error!("stream error: {e}"),
        None,
    )?;

    Ok(stream)
}

fn play(args: &PlayArgs) -> Result<()> {
    let device  = pick_device(args.device.as_deref())?;
    let sup_cfg = choose_config(&device, args.sample_rate, args.channels)?;
    let sample_format = sup_cfg.sample_format();
    let mut cfg = sup_cfg.config();

    if let Some(sr) = args.sample_rate { cfg.sample_rate = cpal::SampleRate(sr); }
    if let Some(ch) = args.channels    { cfg.channels    = ch; }

    let sr = cfg.sample_rate.0;
    let voice  = args.voice.voice(f64::from(sr))?;
    #[allow(clippy::cast_precision_loss)]
    let engine = Engine::new(voice, sr as f32);
    let peak = Arc::new(AtomicF32::new(0.0));

    tracing::info!(device = %device.name()?, ?cfg, ?sample_format, gain = args.gain, "starting stream");

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, engine, args.gain, peak.clone())?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, engine, args.gain, peak.clone())?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, engine, args.gain, peak.clone())?,
        other => bail!("unsupported device sample format: {other:?}"),
    };

    stream.play()?;
    println!("Press Ctrl+C to stop…");

    let started = Instant::now();
    let limit = args.duration.map(Duration::from_secs);
    loop {
        std::thread::sleep(Duration::from_secs(1));
        let p = peak.swap(0.0, std::sync::atomic::Ordering::Relaxed);
        tracing::info!("peak ~ {p:.3}");
        if limit.is_some_and(|l| started.elapsed() >= l) {
            return Ok(());
        }
    }
}

fn render(args: &RenderArgs) -> Result<()> {
    let sr = args.sample_rate.max(1);
    let channels = args.channels.max(1);
    let voice = args.voice.voice(f64::from(sr))?;
    #[allow(clippy::cast_precision_loss)]
    let mut engine = Engine::new(voice, sr as f32);

    let spec = hound::WavSpec {
        channels,
        sample_rate: sr,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.out, spec)
        .with_context(|| format!("cannot create {}", args.out.display()))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = (args.seconds.max(0.0) * f64::from(sr)).round() as usize;
    let mut block = [0.0f32; BLOCK];
    let mut done = 0;
    #[allow(clippy::cast_precision_loss)]
    let sr_f = sr as f32;
    while done < total {
        let n = BLOCK.min(total - done);
        engine.render(sr_f, &mut block[..n]);
        for &s in &block[..n] {
            let s = (s * args.gain).clamp(-1.0, 1.0);
            for _ in 0..channels {
                writer.write_sample(s)?;
            }
        }
        done += n;
    }
    writer.finalize()?;

    tracing::info!(frames = total, path = %args.out.display(), "render finished");
    println!("Wrote {} ({:.2} s @ {} Hz)", args.out.display(), engine.time(), sr);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ListDevices => list_output_devices()?,
        Commands::Play(args) => play(&args)?,
        Commands::Render(args) => render(&args)?,
        Commands::InitPreset { out } => {
            preset::save(&out, &GendySettings::default())?;
            println!("Generated default preset at {}", out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_apply_on_top_of_defaults_and_clamp() {
        let cli = Cli::try_parse_from([
            "gendyn", "render", "--points", "300", "--amp-dist", "cauchy", "--dur-dist", "4",
            "--min-freq", "-5", "--dur-scale", "0.25", "--seed", "3",
        ])
        .unwrap();
        let Commands::Render(args) = cli.command else { panic!("expected render") };
        let s = args.voice.settings(44_100.0).unwrap();
        assert_eq!(s.point_count, 128);
        assert_eq!(s.amp_distribution, DistributionKind::Cauchy);
        assert_eq!(s.dur_distribution, DistributionKind::Exponential);
        assert_eq!(s.min_frequency, 1.0e-6);
        assert_eq!(s.dur_scale, 0.25);
        assert_eq!(s.sample_rate, 44_100.0);
        assert_eq!(s.max_frequency, GendySettings::default().max_frequency);
    }

    #[test]
    fn unknown_distribution_is_rejected() {
        assert!(Cli::try_parse_from(["gendyn", "render", "--amp-dist", "poisson"]).is_err());
        assert!(Cli::try_parse_from(["gendyn", "render", "--amp-dist", "6"]).is_err());
    }

    #[test]
    fn render_writes_a_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("voice.wav");
        let cli = Cli::try_parse_from([
            "gendyn", "render", "--seconds", "0.05", "--sample-rate", "8000", "--channels", "2",
            "--seed", "1", "--out", out.to_str().unwrap(),
        ])
        .unwrap();
        let Commands::Render(args) = cli.command else { panic!("expected render") };
        render(&args).unwrap();

        let reader = hound::WavReader::open(&out).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8000);
        let samples: Vec<f32> = reader.into_samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 2 * 400);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(samples.chunks(2).all(|f| f[0] == f[1]));
    }
}
