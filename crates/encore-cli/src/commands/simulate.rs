//! Simulated playback against the in-memory backend.
//!
//! Plays a silent channel for a fixed number of update frames and prints,
//! per frame, the channel gain, the gain the audio callback would apply
//! (linear and in dB), the reverb wet level and the sync-adjusted position.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use encore_config::AudioSettings;
use encore_core::{EffectParams, linear_to_db};
use encore_mixer::{MemoryBackend, SettingsRequest};

#[derive(Args)]
pub struct SimulateArgs {
    /// Settings file (defaults are used when omitted)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Song length in seconds
    #[arg(long, default_value = "180")]
    length_secs: f64,

    /// Number of update frames to simulate
    #[arg(long, default_value = "20")]
    ticks: u32,

    /// Frame duration in milliseconds
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Enable reverb at the start of the simulation
    #[arg(long)]
    reverb: bool,

    /// Fade the channel to this gain
    #[arg(long, value_name = "GAIN")]
    fade_to: Option<f32>,
}

const SAMPLE_RATE: u32 = 44_100;
const FRAME_CHANNELS: u16 = 2;

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    if args.length_secs <= 0.0 || !args.length_secs.is_finite() {
        anyhow::bail!("--length-secs must be positive");
    }

    let settings = match &args.settings {
        Some(path) => AudioSettings::load(path)?,
        None => AudioSettings::default(),
    };

    let backend = Arc::new(MemoryBackend::new());
    let channel = backend.create_channel(SAMPLE_RATE, FRAME_CHANNELS, args.length_secs);
    let mut mixer = settings.build_mixer(backend.clone());
    let tap = mixer.register_channel(channel, usize::from(FRAME_CHANNELS));

    let mut requests = settings.startup_requests(channel);
    if args.reverb {
        requests.push(SettingsRequest::SetReverb {
            channel,
            enabled: true,
        });
    }
    if let Some(to) = args.fade_to {
        requests.push(SettingsRequest::FadeChannel { channel, to });
    }
    for request in requests {
        // Effects that fail to bind are skipped; playback goes on without them.
        if let Err(err) = mixer.handle(request) {
            tracing::warn!(?request, "request failed: {err}");
        }
    }

    tracing::info!(
        length = mixer.length_seconds(channel)?,
        effects = backend.effect_count(channel),
        reverb = %mixer.reverb_variant().effect_type(),
        "simulation started"
    );

    println!(
        "{:>5}  {:>8}  {:>6}  {:>9}  {:>8}  {:>8}  {:>10}",
        "tick", "time_ms", "gain", "effective", "out_db", "reverb", "sync_pos"
    );

    let delta = Duration::from_millis(args.tick_ms);
    let mut block = vec![1.0_f32; 64 * usize::from(FRAME_CHANNELS)];
    for tick in 1..=args.ticks {
        backend.advance_position(channel, delta.as_secs_f64());
        let report = mixer.advance(delta);
        for failure in &report.failed {
            tracing::warn!(target = ?failure.target, "transition failed: {}", failure.error);
        }

        block.fill(1.0);
        tap.process(&mut block);

        let reverb = match mixer.reverb_params(channel) {
            Some(EffectParams::Freeverb(p)) => format!("{:.3}", p.wet_mix),
            Some(EffectParams::DxReverb(p)) => format!("{:.1}dB", p.reverb_mix),
            _ => "-".to_string(),
        };

        println!(
            "{:>5}  {:>8}  {:>6.3}  {:>9.3}  {:>8.1}  {:>8}  {:>10.3}",
            tick,
            u64::from(tick).saturating_mul(args.tick_ms),
            mixer.channel_gain(channel)?,
            block[0],
            linear_to_db(block[0]),
            reverb,
            mixer.sync_adjusted_position(channel)?,
        );
    }

    Ok(())
}
