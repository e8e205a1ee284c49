//! Effect kinds, slots and typed parameter payloads.
//!
//! Every effect the engine can attach to a channel is described by a closed
//! set of enums. [`EffectParams`] carries one strongly typed parameter struct
//! per backend effect; there is no untyped parameter object and no pointer
//! reinterpretation anywhere in the model.
//!
//! # Backend Encoding
//!
//! Parameters reach the backend through [`EffectParams::encode`], which lays
//! each field out as a 4-byte little-endian value in declaration order:
//!
//! | Effect | Fields |
//! |--------|--------|
//! | Compressor | gain, threshold, ratio, attack, release (`f32`) |
//! | Peak EQ | bandwidth, center, gain (`f32`) |
//! | Freeverb | dry_mix, wet_mix, room_size, damp, width (`f32`), mode (`i32`) |
//! | DX reverb | in_gain, reverb_mix, reverb_time, high_freq_rt_ratio (`f32`) |
//!
//! [`EffectParams::decode`] is the exact inverse and rejects blocks of the
//! wrong length.

use alloc::vec::Vec;
use core::fmt;

use crate::math::lerp;

/// Effect types understood by the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectType {
    /// Dynamics compressor.
    Compressor,
    /// Single peaking equalizer band.
    PeakEq,
    /// Freeverb-style algorithmic reverb.
    Freeverb,
    /// DirectX 8 style reverb.
    DxReverb,
}

impl EffectType {
    /// Stable lowercase identifier, used in logs and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            EffectType::Compressor => "compressor",
            EffectType::PeakEq => "peak_eq",
            EffectType::Freeverb => "freeverb",
            EffectType::DxReverb => "dx_reverb",
        }
    }

    /// Size in bytes of the encoded parameter block for this effect.
    pub fn encoded_len(self) -> usize {
        4 * match self {
            EffectType::Compressor => 5,
            EffectType::PeakEq => 3,
            EffectType::Freeverb => 6,
            EffectType::DxReverb => 4,
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equalizer band. Each band occupies its own slot on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqBand {
    /// Low band.
    Low,
    /// Mid band.
    Mid,
    /// High band.
    High,
}

impl EqBand {
    /// All bands, low to high.
    pub const ALL: [EqBand; 3] = [EqBand::Low, EqBand::Mid, EqBand::High];

    /// Preset parameters for this band.
    pub fn preset(self) -> PeakEqParams {
        match self {
            EqBand::Low => crate::presets::LOW_EQ,
            EqBand::Mid => crate::presets::MID_EQ,
            EqBand::High => crate::presets::HIGH_EQ,
        }
    }
}

/// Reverb algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReverbVariant {
    /// Freeverb (the engine default).
    #[default]
    Freeverb,
    /// DirectX 8 reverb.
    DxReverb,
}

impl ReverbVariant {
    /// Backend effect type for this variant.
    pub fn effect_type(self) -> EffectType {
        match self {
            ReverbVariant::Freeverb => EffectType::Freeverb,
            ReverbVariant::DxReverb => EffectType::DxReverb,
        }
    }

    /// Fully-wet preset parameters for this variant.
    pub fn preset(self) -> EffectParams {
        match self {
            ReverbVariant::Freeverb => EffectParams::Freeverb(crate::presets::FREEVERB),
            ReverbVariant::DxReverb => EffectParams::DxReverb(crate::presets::DX_REVERB),
        }
    }

    /// Inaudible endpoint for slides: the preset with its wet path muted.
    pub fn silent(self) -> EffectParams {
        match self {
            ReverbVariant::Freeverb => EffectParams::Freeverb(FreeverbParams {
                wet_mix: 0.0,
                ..crate::presets::FREEVERB
            }),
            ReverbVariant::DxReverb => EffectParams::DxReverb(DxReverbParams {
                reverb_mix: crate::presets::DX_REVERB_MIX_SILENT,
                ..crate::presets::DX_REVERB
            }),
        }
    }
}

/// Slot an effect occupies on a channel.
///
/// A channel holds at most one binding per slot. Reverb occupies a single
/// slot regardless of variant, so switching variants replaces the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectSlot {
    /// Compressor slot.
    Compressor,
    /// Reverb slot, tagged with the variant it expects.
    Reverb(ReverbVariant),
    /// One equalizer band.
    Equalizer(EqBand),
}

impl EffectSlot {
    /// Backend effect type that fills this slot.
    pub fn effect_type(self) -> EffectType {
        match self {
            EffectSlot::Compressor => EffectType::Compressor,
            EffectSlot::Reverb(variant) => variant.effect_type(),
            EffectSlot::Equalizer(_) => EffectType::PeakEq,
        }
    }

    /// Whether `params` can be applied to an effect in this slot.
    pub fn accepts(self, params: &EffectParams) -> bool {
        self.effect_type() == params.effect_type()
    }

    /// Identity used for the one-binding-per-slot rule.
    ///
    /// Reverb variants collapse to one key.
    pub fn key(self) -> EffectSlot {
        match self {
            EffectSlot::Reverb(_) => EffectSlot::Reverb(ReverbVariant::Freeverb),
            other => other,
        }
    }
}

impl fmt::Display for EffectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSlot::Compressor => f.write_str("compressor"),
            EffectSlot::Reverb(variant) => write!(f, "reverb({})", variant.effect_type()),
            EffectSlot::Equalizer(band) => write!(f, "eq({band:?})"),
        }
    }
}

/// Compressor parameters (gain and threshold in dB, times in seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// Output gain in dB.
    pub gain: f32,
    /// Threshold in dB.
    pub threshold: f32,
    /// Compression ratio.
    pub ratio: f32,
    /// Attack time.
    pub attack: f32,
    /// Release time.
    pub release: f32,
}

/// Peaking EQ band parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakEqParams {
    /// Bandwidth in octaves.
    pub bandwidth: f32,
    /// Center frequency in Hz.
    pub center: f32,
    /// Gain in dB.
    pub gain: f32,
}

/// Freeverb parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeverbParams {
    /// Dry signal level.
    pub dry_mix: f32,
    /// Wet signal level.
    pub wet_mix: f32,
    /// Room size (0-1).
    pub room_size: f32,
    /// High-frequency damping (0-1).
    pub damp: f32,
    /// Stereo width (0-1).
    pub width: f32,
    /// Backend mode flag (0 = normal, 1 = freeze).
    pub mode: i32,
}

/// DX reverb parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DxReverbParams {
    /// Input gain in dB.
    pub in_gain: f32,
    /// Reverb mix in dB.
    pub reverb_mix: f32,
    /// Reverb time in ms.
    pub reverb_time: f32,
    /// High-frequency reverb time ratio.
    pub high_freq_rt_ratio: f32,
}

/// Typed parameter payload for one effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    /// Compressor parameters.
    Compressor(CompressorParams),
    /// Peaking EQ parameters.
    PeakEq(PeakEqParams),
    /// Freeverb parameters.
    Freeverb(FreeverbParams),
    /// DX reverb parameters.
    DxReverb(DxReverbParams),
}

impl EffectParams {
    /// Backend effect type these parameters belong to.
    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectParams::Compressor(_) => EffectType::Compressor,
            EffectParams::PeakEq(_) => EffectType::PeakEq,
            EffectParams::Freeverb(_) => EffectType::Freeverb,
            EffectParams::DxReverb(_) => EffectType::DxReverb,
        }
    }

    /// Serialize to the backend's parameter block format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.effect_type().encoded_len());
        match *self {
            EffectParams::Compressor(p) => {
                put_words(&mut out, &[p.gain, p.threshold, p.ratio, p.attack, p.release]);
            }
            EffectParams::PeakEq(p) => {
                put_words(&mut out, &[p.bandwidth, p.center, p.gain]);
            }
            EffectParams::Freeverb(p) => {
                put_words(&mut out, &[p.dry_mix, p.wet_mix, p.room_size, p.damp, p.width]);
                out.extend_from_slice(&p.mode.to_le_bytes());
            }
            EffectParams::DxReverb(p) => {
                put_words(
                    &mut out,
                    &[p.in_gain, p.reverb_mix, p.reverb_time, p.high_freq_rt_ratio],
                );
            }
        }
        out
    }

    /// Parse a backend parameter block. Returns `None` on a length mismatch.
    pub fn decode(effect: EffectType, bytes: &[u8]) -> Option<EffectParams> {
        if bytes.len() != effect.encoded_len() {
            return None;
        }
        let word = |i: usize| -> [u8; 4] {
            let mut w = [0u8; 4];
            w.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            w
        };
        let f = |i: usize| f32::from_le_bytes(word(i));

        Some(match effect {
            EffectType::Compressor => EffectParams::Compressor(CompressorParams {
                gain: f(0),
                threshold: f(1),
                ratio: f(2),
                attack: f(3),
                release: f(4),
            }),
            EffectType::PeakEq => EffectParams::PeakEq(PeakEqParams {
                bandwidth: f(0),
                center: f(1),
                gain: f(2),
            }),
            EffectType::Freeverb => EffectParams::Freeverb(FreeverbParams {
                dry_mix: f(0),
                wet_mix: f(1),
                room_size: f(2),
                damp: f(3),
                width: f(4),
                mode: i32::from_le_bytes(word(5)),
            }),
            EffectType::DxReverb => EffectParams::DxReverb(DxReverbParams {
                in_gain: f(0),
                reverb_mix: f(1),
                reverb_time: f(2),
                high_freq_rt_ratio: f(3),
            }),
        })
    }

    /// Linear interpolation between two parameter sets of the same effect.
    ///
    /// `t` is clamped to `[0, 1]`. At `t == 1.0` the result is exactly `to`.
    /// Returns `None` when the two sets belong to different effects. Integer
    /// fields (the Freeverb mode) take the value of `to`.
    pub fn lerp(from: &EffectParams, to: &EffectParams, t: f32) -> Option<EffectParams> {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 && from.effect_type() == to.effect_type() {
            return Some(*to);
        }
        Some(match (from, to) {
            (EffectParams::Compressor(a), EffectParams::Compressor(b)) => {
                EffectParams::Compressor(CompressorParams {
                    gain: lerp(a.gain, b.gain, t),
                    threshold: lerp(a.threshold, b.threshold, t),
                    ratio: lerp(a.ratio, b.ratio, t),
                    attack: lerp(a.attack, b.attack, t),
                    release: lerp(a.release, b.release, t),
                })
            }
            (EffectParams::PeakEq(a), EffectParams::PeakEq(b)) => {
                EffectParams::PeakEq(PeakEqParams {
                    bandwidth: lerp(a.bandwidth, b.bandwidth, t),
                    center: lerp(a.center, b.center, t),
                    gain: lerp(a.gain, b.gain, t),
                })
            }
            (EffectParams::Freeverb(a), EffectParams::Freeverb(b)) => {
                EffectParams::Freeverb(FreeverbParams {
                    dry_mix: lerp(a.dry_mix, b.dry_mix, t),
                    wet_mix: lerp(a.wet_mix, b.wet_mix, t),
                    room_size: lerp(a.room_size, b.room_size, t),
                    damp: lerp(a.damp, b.damp, t),
                    width: lerp(a.width, b.width, t),
                    mode: b.mode,
                })
            }
            (EffectParams::DxReverb(a), EffectParams::DxReverb(b)) => {
                EffectParams::DxReverb(DxReverbParams {
                    in_gain: lerp(a.in_gain, b.in_gain, t),
                    reverb_mix: lerp(a.reverb_mix, b.reverb_mix, t),
                    reverb_time: lerp(a.reverb_time, b.reverb_time, t),
                    high_freq_rt_ratio: lerp(a.high_freq_rt_ratio, b.high_freq_rt_ratio, t),
                })
            }
            _ => return None,
        })
    }

    /// Audible wet level of a reverb parameter set, `None` for other effects.
    ///
    /// Freeverb reports its wet mix; DX reverb reports its mix in dB.
    pub fn reverb_wet(&self) -> Option<f32> {
        match self {
            EffectParams::Freeverb(p) => Some(p.wet_mix),
            EffectParams::DxReverb(p) => Some(p.reverb_mix),
            _ => None,
        }
    }
}

fn put_words(out: &mut Vec<u8>, words: &[f32]) {
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn encoded_len_matches_encode() {
        let all = [
            EffectParams::Compressor(presets::COMPRESSOR),
            EffectParams::PeakEq(presets::MID_EQ),
            EffectParams::Freeverb(presets::FREEVERB),
            EffectParams::DxReverb(presets::DX_REVERB),
        ];
        for params in all {
            assert_eq!(params.encode().len(), params.effect_type().encoded_len());
        }
    }

    #[test]
    fn encode_is_little_endian_in_field_order() {
        let bytes = EffectParams::PeakEq(presets::LOW_EQ).encode();
        assert_eq!(&bytes[0..4], &1.25f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &250.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-12.0f32).to_le_bytes());
    }

    #[test]
    fn freeverb_mode_encodes_as_integer() {
        let params = EffectParams::Freeverb(FreeverbParams {
            mode: 1,
            ..presets::FREEVERB
        });
        let bytes = params.encode();
        assert_eq!(&bytes[20..24], &1i32.to_le_bytes());
        assert_eq!(EffectParams::decode(EffectType::Freeverb, &bytes), Some(params));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let bytes = EffectParams::Compressor(presets::COMPRESSOR).encode();
        assert_eq!(EffectParams::decode(EffectType::PeakEq, &bytes), None);
        assert_eq!(EffectParams::decode(EffectType::Compressor, &bytes[..8]), None);
    }

    #[test]
    fn lerp_midpoint() {
        let from = ReverbVariant::Freeverb.silent();
        let to = ReverbVariant::Freeverb.preset();
        let mid = EffectParams::lerp(&from, &to, 0.5).unwrap();
        assert!((mid.reverb_wet().unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn lerp_endpoint_is_exact() {
        let from = ReverbVariant::DxReverb.silent();
        let to = ReverbVariant::DxReverb.preset();
        assert_eq!(EffectParams::lerp(&from, &to, 1.0), Some(to));
        assert_eq!(EffectParams::lerp(&from, &to, 7.0), Some(to));
        assert_eq!(EffectParams::lerp(&from, &to, -1.0), Some(from));
    }

    #[test]
    fn lerp_across_effects_is_none() {
        let a = EffectParams::Compressor(presets::COMPRESSOR);
        let b = EffectParams::PeakEq(presets::HIGH_EQ);
        assert_eq!(EffectParams::lerp(&a, &b, 0.5), None);
        assert_eq!(EffectParams::lerp(&a, &b, 1.0), None);
    }

    #[test]
    fn slot_acceptance() {
        let eq = EffectParams::PeakEq(presets::LOW_EQ);
        assert!(EffectSlot::Equalizer(EqBand::High).accepts(&eq));
        assert!(!EffectSlot::Compressor.accepts(&eq));
        let freeverb = ReverbVariant::Freeverb.preset();
        assert!(!EffectSlot::Reverb(ReverbVariant::DxReverb).accepts(&freeverb));
    }

    #[test]
    fn reverb_slots_share_a_key() {
        assert_eq!(
            EffectSlot::Reverb(ReverbVariant::DxReverb).key(),
            EffectSlot::Reverb(ReverbVariant::Freeverb).key()
        );
        assert_ne!(
            EffectSlot::Equalizer(EqBand::Low).key(),
            EffectSlot::Equalizer(EqBand::Mid).key()
        );
    }
}
