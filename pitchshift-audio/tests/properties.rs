//! Property-based tests for the pool-free processing and control APIs.
//!
//! Uses proptest to check the invariants the real-time path relies on:
//! history reads stay inside what was written, processing stays bounded,
//! the mix always sums to one, and no command line can panic the loop.

use pitchshift_audio::constants::AUDIO_BLOCK_SAMPLES;
use pitchshift_audio::control::{CommandInterpreter, EffectParams, LineAssembler, MixParams};
use pitchshift_audio::dsp::grain_buffer::GrainBuffer;
use pitchshift_audio::nodes::{AudioEffectGranular, AudioMixer, EngineState, GrainMode};
use pitchshift_audio::{Command, Outcome, Variant};
use proptest::prelude::*;

const RING: usize = 64;

fn block_strategy() -> impl Strategy<Value = [i16; AUDIO_BLOCK_SAMPLES]> {
    prop::collection::vec(any::<i16>(), AUDIO_BLOCK_SAMPLES).prop_map(|v| {
        let mut block = [0i16; AUDIO_BLOCK_SAMPLES];
        block.copy_from_slice(&v);
        block
    })
}

fn peak(samples: &[i16]) -> i32 {
    samples.iter().map(|&s| i32::from(s).abs()).max().unwrap_or(0)
}

fn variant_strategy() -> impl Strategy<Value = Variant> {
    prop_oneof![Just(Variant::PitchReverb), Just(Variant::Robot)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Taps and grains match the most recent writes, clamped to what is retained.
    #[test]
    fn grain_reads_match_history(
        written in prop::collection::vec(any::<i16>(), 0..200),
        delay in 0usize..100,
        window in 0usize..100,
    ) {
        let mut ring = GrainBuffer::<RING>::new();
        ring.write_block(&written);

        let kept = &written[written.len().saturating_sub(RING)..];
        prop_assert_eq!(ring.fill_level(), kept.len());

        if kept.is_empty() {
            prop_assert_eq!(ring.tap(delay), 0);
        } else {
            let clamped = delay.min(kept.len() - 1);
            prop_assert_eq!(ring.tap(delay), kept[kept.len() - 1 - clamped]);
        }

        let mut out = vec![0i16; window];
        let n = ring.read_grain(delay, &mut out);
        if delay >= kept.len() {
            prop_assert_eq!(n, 0);
        } else {
            prop_assert_eq!(n, window.min(kept.len() - delay));
            let end = kept.len() - delay;
            prop_assert_eq!(&out[..n], &kept[end - n..end]);
        }
    }

    /// Fractional reads never leave the range of the retained samples.
    #[test]
    fn interpolation_stays_between_neighbours(
        written in prop::collection::vec(any::<i16>(), 1..200),
        delay in -10.0f32..100.0,
    ) {
        let mut ring = GrainBuffer::<RING>::new();
        ring.write_block(&written);
        let kept = &written[written.len().saturating_sub(RING)..];
        let lo = f32::from(*kept.iter().min().unwrap());
        let hi = f32::from(*kept.iter().max().unwrap());

        let v = ring.interpolate(delay);
        prop_assert!(v >= lo - 0.01 && v <= hi + 0.01, "{} outside [{}, {}]", v, lo, hi);
    }

    /// Output never exceeds the loudest input seen, for any speed, grain size
    /// and grain mode.
    #[test]
    fn granular_output_is_bounded(
        blocks in prop::collection::vec(block_strategy(), 1..12),
        speed in 0.01f32..8.0,
        grain_ms in 0.1f32..400.0,
        robot in any::<bool>(),
    ) {
        let mut fx = AudioEffectGranular::new();
        if robot {
            fx.set_mode(GrainMode::Robot);
        }
        prop_assert!(fx.begin_pitch_shift(grain_ms));
        prop_assert!(fx.set_speed(speed));

        let mut loudest = 0;
        let mut out = [0i16; AUDIO_BLOCK_SAMPLES];
        for block in &blocks {
            loudest = loudest.max(peak(block));
            fx.process(block, &mut out);
            prop_assert!(peak(&out) <= loudest + 1);
        }
        prop_assert!(fx.history_len() <= pitchshift_audio::constants::GRANULAR_MEMORY_SIZE);
    }

    /// A stopped engine is a pass-through whatever its settings.
    #[test]
    fn stopped_engine_passes_input(
        block in block_strategy(),
        speed in 0.01f32..8.0,
    ) {
        let mut fx = AudioEffectGranular::new();
        fx.set_speed(speed);
        fx.stop();
        prop_assert_eq!(fx.state(), EngineState::Stopped);

        let mut out = [0i16; AUDIO_BLOCK_SAMPLES];
        fx.process(&block, &mut out);
        prop_assert_eq!(out, block);
    }

    /// Non-positive and non-finite values never replace the current setting.
    #[test]
    fn setters_reject_invalid_values(bad in prop_oneof![
        -1000.0f32..=0.0,
        Just(f32::NAN),
        Just(f32::INFINITY),
        Just(f32::NEG_INFINITY),
    ]) {
        let mut fx = AudioEffectGranular::new();
        fx.begin_pitch_shift(50.0);
        fx.set_speed(1.5);

        prop_assert!(!fx.set_speed(bad));
        prop_assert!(!fx.set_grain_size(bad));
        prop_assert_eq!(fx.speed(), 1.5);
        prop_assert_eq!(fx.grain_size_ms(), 50.0);
    }

    /// dry + wet == 1 after any sequence of wet-fraction updates.
    #[test]
    fn mix_always_sums_to_one(updates in prop::collection::vec(any::<f32>(), 0..20)) {
        let mut mix = MixParams::dry_only();
        for wet in updates {
            mix.set_wet_fraction(wet);
            prop_assert!((0.0..=1.0).contains(&mix.wet()));
            prop_assert!((0.0..=1.0).contains(&mix.dry()));
            prop_assert_eq!(mix.dry() + mix.wet(), 1.0);
        }
    }

    /// REVERB clamps its argument into [0, 1].
    #[test]
    fn reverb_argument_is_clamped(x in -10.0f32..10.0) {
        let interp = CommandInterpreter::new(Variant::PitchReverb);
        let mut params = EffectParams::new(Variant::PitchReverb);
        let line = format!("REVERB {x}");
        prop_assert_eq!(interp.interpret(&line, &mut params), Outcome::Applied(Command::Reverb(x)));
        prop_assert_eq!(params.mix.wet(), x.clamp(0.0, 1.0));
        prop_assert_eq!(params.mix.dry() + params.mix.wet(), 1.0);
    }

    /// ROBOT maps linearly onto 50..100 ms for amounts in [0, 1].
    #[test]
    fn robot_amount_maps_to_grain_size(amount in 0.0f32..=1.0) {
        let interp = CommandInterpreter::new(Variant::Robot);
        let mut params = EffectParams::new(Variant::Robot);
        interp.apply(Command::Robot(amount), &mut params);
        prop_assert!((params.engine.grain_size_ms() - (50.0 + amount * 50.0)).abs() < 1e-4);
        prop_assert_eq!(params.engine.state(), EngineState::Running);
    }

    /// No line panics, and lines without a known keyword change nothing.
    #[test]
    fn arbitrary_lines_never_panic(line in "\\PC{0,40}", variant in variant_strategy()) {
        let interp = CommandInterpreter::new(variant);
        let mut params = EffectParams::new(variant);
        let before = params;
        let outcome = interp.interpret(&line, &mut params);

        let known = ["PITCH", "REVERB", "ROBOT", "RESET"].iter().any(|k| line.starts_with(k));
        if !known {
            prop_assert_eq!(outcome, Outcome::Ignored);
            prop_assert_eq!(params, before);
        }
    }

    /// RESET restores the defaults whatever came before.
    #[test]
    fn reset_restores_defaults(
        speeds in prop::collection::vec(0.01f32..8.0, 0..5),
        wets in prop::collection::vec(-1.0f32..2.0, 0..5),
        variant in variant_strategy(),
    ) {
        let interp = CommandInterpreter::new(variant);
        let mut params = EffectParams::new(variant);
        for s in speeds {
            interp.apply(Command::Pitch(s), &mut params);
        }
        for w in wets {
            interp.apply(Command::Reverb(w), &mut params);
        }
        interp.apply(Command::Robot(0.7), &mut params);
        interp.apply(Command::Reset, &mut params);

        let fresh = EffectParams::new(variant);
        prop_assert_eq!(params.engine.speed(), 1.0);
        prop_assert_eq!(params.engine.grain_size_ms(), fresh.engine.grain_size_ms());
        prop_assert_eq!(params.engine.state(), fresh.engine.state());
        prop_assert_eq!(params.mix, MixParams::dry_only());
        prop_assert_eq!(params.reverb, fresh.reverb);
    }

    /// Arbitrary serial bytes yield only bounded, newline-free lines.
    #[test]
    fn line_assembly_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let mut lines = LineAssembler::<32>::new();
        let mut rest = bytes.as_slice();
        let mut taken = 0usize;
        while !rest.is_empty() {
            let used = lines.feed(rest);
            rest = &rest[used..];
            if let Some(line) = lines.take_line() {
                prop_assert!(line.len() <= 32);
                prop_assert!(!line.contains('\n'));
                taken += 1;
            }
        }
        let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
        prop_assert_eq!(taken + lines.dropped() as usize, newlines);
    }

    /// A linear crossfade never exceeds the louder input.
    #[test]
    fn crossfade_is_bounded(
        dry in block_strategy(),
        wet in block_strategy(),
        wet_level in 0.0f32..=1.0,
    ) {
        let mut mixer = AudioMixer::<2>::new();
        mixer.crossfade(1.0 - wet_level, wet_level);
        let mut out = [0i16; AUDIO_BLOCK_SAMPLES];
        mixer.mix([Some(&dry), Some(&wet)], &mut out);
        for i in 0..AUDIO_BLOCK_SAMPLES {
            let limit = i32::from(dry[i]).abs().max(i32::from(wet[i]).abs()) + 2;
            prop_assert!(i32::from(out[i]).abs() <= limit, "sample {} = {}", i, out[i]);
        }
    }
}
