//! Process-wide effect presets.
//!
//! These are the parameter sets the engine binds when a channel enables an
//! effect. They are plain constants: no lifecycle, no registration.
//!
//! | Preset | Values |
//! |--------|--------|
//! | [`COMPRESSOR`] | gain −3, threshold −2, ratio 4, attack 0.01, release 0.1 |
//! | [`LOW_EQ`] | bandwidth 1.25, center 250 Hz, gain −12 dB |
//! | [`MID_EQ`] | bandwidth 1.25, center 2300 Hz, gain +2.25 dB |
//! | [`HIGH_EQ`] | bandwidth 0.75, center 6000 Hz, gain +2 dB |
//! | [`DX_REVERB`] | in-gain −5, mix 0, time 1000 ms, HF ratio 0.001 |
//! | [`FREEVERB`] | dry 0.5, wet 1.5, room 0.75, damp 0.5, width 1, mode 0 |

use crate::effect::{
    CompressorParams, DxReverbParams, EffectParams, EqBand, FreeverbParams, PeakEqParams,
    ReverbVariant,
};

/// Channel compressor.
pub const COMPRESSOR: CompressorParams = CompressorParams {
    gain: -3.0,
    threshold: -2.0,
    ratio: 4.0,
    attack: 0.01,
    release: 0.1,
};

/// Low EQ band: heavy cut around 250 Hz.
pub const LOW_EQ: PeakEqParams = PeakEqParams {
    bandwidth: 1.25,
    center: 250.0,
    gain: -12.0,
};

/// Mid EQ band: presence lift around 2.3 kHz.
pub const MID_EQ: PeakEqParams = PeakEqParams {
    bandwidth: 1.25,
    center: 2300.0,
    gain: 2.25,
};

/// High EQ band: air lift around 6 kHz.
pub const HIGH_EQ: PeakEqParams = PeakEqParams {
    bandwidth: 0.75,
    center: 6000.0,
    gain: 2.0,
};

/// DX reverb.
pub const DX_REVERB: DxReverbParams = DxReverbParams {
    in_gain: -5.0,
    reverb_mix: 0.0,
    reverb_time: 1000.0,
    high_freq_rt_ratio: 0.001,
};

/// DX reverb mix (dB) treated as silent. The backend's floor.
pub const DX_REVERB_MIX_SILENT: f32 = -96.0;

/// Freeverb.
pub const FREEVERB: FreeverbParams = FreeverbParams {
    dry_mix: 0.5,
    wet_mix: 1.5,
    room_size: 0.75,
    damp: 0.5,
    width: 1.0,
    mode: 0,
};

/// Reverb variant used when nothing else is configured.
pub const DEFAULT_REVERB: ReverbVariant = ReverbVariant::Freeverb;

/// Named preset, for listings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedPreset {
    /// Preset name.
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Parameters.
    pub params: EffectParams,
}

/// All presets known to the engine, in listing order.
pub fn all() -> [NamedPreset; 6] {
    [
        NamedPreset {
            name: "compressor",
            description: "Gentle bus compression for the song mix",
            params: EffectParams::Compressor(COMPRESSOR),
        },
        NamedPreset {
            name: "eq_low",
            description: "Low band cut",
            params: EffectParams::PeakEq(EqBand::Low.preset()),
        },
        NamedPreset {
            name: "eq_mid",
            description: "Mid band presence lift",
            params: EffectParams::PeakEq(EqBand::Mid.preset()),
        },
        NamedPreset {
            name: "eq_high",
            description: "High band air lift",
            params: EffectParams::PeakEq(EqBand::High.preset()),
        },
        NamedPreset {
            name: "freeverb",
            description: "Wet Freeverb room (default reverb)",
            params: EffectParams::Freeverb(FREEVERB),
        },
        NamedPreset {
            name: "dx_reverb",
            description: "DirectX 8 reverb",
            params: EffectParams::DxReverb(DX_REVERB),
        },
    ]
}

/// Look up a preset by name (case-insensitive).
pub fn find(name: &str) -> Option<NamedPreset> {
    all().into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
