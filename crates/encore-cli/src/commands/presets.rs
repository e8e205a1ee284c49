//! Effect preset listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use encore_core::{EffectParams, presets};

#[derive(Args)]
pub struct PresetsArgs {
    /// Show details for a specific preset
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    let Some(name) = args.name else {
        println!("Effect Presets:");
        println!("===============");
        for preset in presets::all() {
            println!(
                "  {:12} {:12} - {}",
                preset.name,
                preset.params.effect_type(),
                preset.description
            );
        }
        return Ok(());
    };

    let preset = presets::find(&name).ok_or_else(|| anyhow::anyhow!("Unknown preset: {name}"))?;

    println!("{}", preset.name);
    println!("{}", "=".repeat(preset.name.len()));
    println!();
    println!("{}", preset.description);
    println!("Effect: {}", preset.params.effect_type());
    println!();
    println!("Parameters:");
    println!();
    println!("  {:20}  {}", "Name", "Value");
    println!("  {:20}  {}", "----", "-----");
    for (field, value) in fields(&preset.params) {
        println!("  {field:20}  {value}");
    }
    println!();
    println!("Encoded size: {} bytes", preset.params.encode().len());
    Ok(())
}

fn fields(params: &EffectParams) -> Vec<(&'static str, String)> {
    match params {
        EffectParams::Compressor(p) => vec![
            ("gain", format!("{} dB", p.gain)),
            ("threshold", format!("{} dB", p.threshold)),
            ("ratio", format!("{}:1", p.ratio)),
            ("attack", format!("{} s", p.attack)),
            ("release", format!("{} s", p.release)),
        ],
        EffectParams::PeakEq(p) => vec![
            ("bandwidth", format!("{} oct", p.bandwidth)),
            ("center", format!("{} Hz", p.center)),
            ("gain", format!("{} dB", p.gain)),
        ],
        EffectParams::Freeverb(p) => vec![
            ("dry_mix", p.dry_mix.to_string()),
            ("wet_mix", p.wet_mix.to_string()),
            ("room_size", p.room_size.to_string()),
            ("damp", p.damp.to_string()),
            ("width", p.width.to_string()),
            ("mode", p.mode.to_string()),
        ],
        EffectParams::DxReverb(p) => vec![
            ("in_gain", format!("{} dB", p.in_gain)),
            ("reverb_mix", format!("{} dB", p.reverb_mix)),
            ("reverb_time", format!("{} ms", p.reverb_time)),
            ("high_freq_rt_ratio", p.high_freq_rt_ratio.to_string()),
        ],
    }
}
