//! Property-based tests for encore-core gain and interpolation primitives.
//!
//! Uses proptest for randomized buffers, gains and parameter endpoints.

use encore_core::{EffectParams, FreeverbParams, apply_gain, apply_gain_raw, lerp, presets};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any non-negative gain, every output sample equals gain × input.
    #[test]
    fn gain_scales_every_sample(
        gain in 0.0f32..8.0f32,
        input in prop::collection::vec(-1.0f32..=1.0f32, 0..512),
    ) {
        let mut buffer = input.clone();
        apply_gain(&mut buffer, gain);
        for (out, inp) in buffer.iter().zip(&input) {
            prop_assert_eq!(*out, inp * gain);
        }
    }

    /// Unity gain leaves the buffer bit-identical, however often it is applied.
    #[test]
    fn unity_gain_is_idempotent(
        input in prop::collection::vec(-1.0f32..=1.0f32, 0..512),
        passes in 1usize..4,
    ) {
        let mut buffer = input.clone();
        for _ in 0..passes {
            apply_gain(&mut buffer, 1.0);
        }
        prop_assert_eq!(buffer, input);
    }

    /// The raw byte path agrees with the float path sample for sample.
    #[test]
    fn raw_path_matches_float_path(
        gain in 0.0f32..4.0f32,
        input in prop::collection::vec(-1.0f32..=1.0f32, 0..256),
    ) {
        let mut raw: Vec<u8> = input.iter().flat_map(|s| s.to_le_bytes()).collect();
        apply_gain_raw(&mut raw, gain);

        let mut floats = input.clone();
        apply_gain(&mut floats, gain);

        for (chunk, want) in raw.chunks_exact(4).zip(floats) {
            let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            prop_assert_eq!(got, want);
        }
    }

    /// Interpolated wet mix stays between its endpoints.
    #[test]
    fn reverb_lerp_stays_in_range(
        from_wet in 0.0f32..3.0f32,
        to_wet in 0.0f32..3.0f32,
        t in 0.0f32..=1.0f32,
    ) {
        let from = EffectParams::Freeverb(FreeverbParams {
            wet_mix: from_wet,
            ..presets::FREEVERB
        });
        let to = EffectParams::Freeverb(FreeverbParams {
            wet_mix: to_wet,
            ..presets::FREEVERB
        });
        let wet = EffectParams::lerp(&from, &to, t).unwrap().reverb_wet().unwrap();
        let (lo, hi) = if from_wet <= to_wet { (from_wet, to_wet) } else { (to_wet, from_wet) };
        prop_assert!(wet >= lo - 1e-5 && wet <= hi + 1e-5, "wet {} outside [{}, {}]", wet, lo, hi);
    }

    /// Scalar lerp hits its start exactly at t = 0.
    #[test]
    fn lerp_starts_at_origin(a in -10.0f32..10.0f32, b in -10.0f32..10.0f32) {
        prop_assert_eq!(lerp(a, b, 0.0), a);
    }
}
