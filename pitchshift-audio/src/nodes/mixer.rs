//! N-channel mixer with per-channel gain.
//!
//! The effects graphs use a two-channel instance as the dry/wet stage:
//! channel 0 carries the pitch-shifted signal, channel 1 the reverb.

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::constants::AUDIO_BLOCK_SAMPLES;
use crate::dsp::intrinsics::saturate16;
use crate::node::AudioNode;

/// 1.0 in Q16.16.
const UNITY: i32 = 1 << 16;

/// Largest gain magnitude a channel accepts.
const MAX_GAIN: f32 = 32767.0;

/// Mixer channel fed by the pitch shifter.
pub const DRY_CHANNEL: usize = 0;
/// Mixer channel fed by the reverb.
pub const WET_CHANNEL: usize = 1;

/// Mixes `N` inputs into one output. Node: `N` inputs, 1 output.
///
/// # Example
/// ```ignore
/// let mut mixer = AudioMixer::<2>::new();
/// mixer.crossfade(0.7, 0.3);
/// ```
pub struct AudioMixer<const N: usize> {
    /// Per-channel gain, Q16.16.
    multiplier: [i32; N],
    level: [f32; N],
}

impl<const N: usize> AudioMixer<N> {
    /// All channels at unity gain.
    pub const fn new() -> Self {
        AudioMixer {
            multiplier: [UNITY; N],
            level: [1.0; N],
        }
    }

    /// Set one channel's gain. Out-of-range channels are ignored.
    ///
    /// 0.0 mutes, 1.0 is unity. Clamped to ±32767; NaN mutes.
    pub fn gain(&mut self, channel: usize, level: f32) {
        if channel >= N {
            return;
        }
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(-MAX_GAIN, MAX_GAIN)
        };
        self.level[channel] = level;
        self.multiplier[channel] = (level * UNITY as f32) as i32;
    }

    /// Current gain of `channel`, or `None` past the channel count.
    pub fn level(&self, channel: usize) -> Option<f32> {
        self.level.get(channel).copied()
    }

    /// Set the dry and wet channel gains together.
    pub fn crossfade(&mut self, dry: f32, wet: f32) {
        self.gain(DRY_CHANNEL, dry);
        self.gain(WET_CHANNEL, wet);
    }

    /// Mix the present inputs into `out`. Absent channels contribute silence.
    pub fn mix(
        &self,
        inputs: [Option<&[i16; AUDIO_BLOCK_SAMPLES]>; N],
        out: &mut [i16; AUDIO_BLOCK_SAMPLES],
    ) {
        out.fill(0);
        for (ch, input) in inputs.iter().enumerate() {
            if let Some(src) = input {
                accumulate(out, src, self.multiplier[ch]);
            }
        }
    }
}

impl<const N: usize> Default for AudioMixer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// `dst += saturate16(src * mult >> 16)`, saturating.
fn accumulate(dst: &mut [i16; AUDIO_BLOCK_SAMPLES], src: &[i16; AUDIO_BLOCK_SAMPLES], mult: i32) {
    if mult == 0 {
        return;
    }
    if mult == UNITY {
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = saturate16(*d as i32 + s as i32);
        }
        return;
    }
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        let scaled = ((s as i64 * mult as i64) >> 16).clamp(i32::MIN as i64, i32::MAX as i64);
        let scaled = saturate16(scaled as i32);
        *d = saturate16(*d as i32 + scaled as i32);
    }
}

impl<const N: usize> AudioNode for AudioMixer<N> {
    const NUM_INPUTS: usize = N;
    const NUM_OUTPUTS: usize = 1;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    ) {
        let mut out = match outputs[0].take() {
            Some(b) => b,
            None => return,
        };
        out.fill(0);
        for (ch, input) in inputs.iter().enumerate().take(N) {
            if let Some(block) = input {
                accumulate(&mut out, block, self.multiplier[ch]);
            }
        }
        outputs[0] = Some(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pool::pool_guard;

    fn shared(values: &[i16]) -> AudioBlockRef {
        AudioBlockMut::alloc_from(values).unwrap().into_shared()
    }

    fn run<const N: usize>(mixer: &mut AudioMixer<N>, inputs: [Option<AudioBlockRef>; N]) -> AudioBlockMut {
        let mut outputs = [AudioBlockMut::alloc()];
        mixer.update(&inputs, &mut outputs);
        outputs[0].take().unwrap()
    }

    #[test]
    fn unity_passes_single_channel() {
        let _pool = pool_guard();
        let mut mixer = AudioMixer::<2>::new();
        let out = run(&mut mixer, [Some(shared(&[1000, -2000, 32767, -32768])), None]);
        assert_eq!(&out[..4], &[1000, -2000, 32767, -32768]);
    }

    #[test]
    fn crossfade_scales_each_side() {
        let _pool = pool_guard();
        let mut mixer = AudioMixer::<2>::new();
        mixer.crossfade(0.75, 0.25);
        assert_eq!(mixer.level(DRY_CHANNEL), Some(0.75));
        assert_eq!(mixer.level(WET_CHANNEL), Some(0.25));

        let out = run(&mut mixer, [Some(shared(&[8000])), Some(shared(&[8000]))]);
        assert_eq!(out[0], 8000);
    }

    #[test]
    fn zero_gain_mutes_channel() {
        let _pool = pool_guard();
        let mut mixer = AudioMixer::<2>::new();
        mixer.crossfade(1.0, 0.0);
        let out = run(&mut mixer, [Some(shared(&[1234])), Some(shared(&[30000]))]);
        assert_eq!(out[0], 1234);
    }

    #[test]
    fn sum_saturates() {
        let _pool = pool_guard();
        let mut mixer = AudioMixer::<2>::new();
        let out = run(&mut mixer, [Some(shared(&[30000, -30000])), Some(shared(&[30000, -30000]))]);
        assert_eq!(out[0], i16::MAX);
        assert_eq!(out[1], i16::MIN);
    }

    #[test]
    fn no_inputs_is_silence() {
        let _pool = pool_guard();
        let mut mixer = AudioMixer::<2>::new();
        let out = run(&mut mixer, [None, None]);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn gain_clamps_and_ignores_bad_channel() {
        let mut mixer = AudioMixer::<2>::new();
        mixer.gain(5, 0.5);
        assert_eq!(mixer.level(5), None);
        mixer.gain(0, 1.0e9);
        assert_eq!(mixer.level(0), Some(MAX_GAIN));
        mixer.gain(1, f32::NAN);
        assert_eq!(mixer.level(1), Some(0.0));
    }

    #[test]
    fn mix_without_pool() {
        let mut mixer = AudioMixer::<2>::new();
        mixer.crossfade(0.5, 0.5);
        let a = [10_000i16; AUDIO_BLOCK_SAMPLES];
        let b = [-2_000i16; AUDIO_BLOCK_SAMPLES];
        let mut out = [7i16; AUDIO_BLOCK_SAMPLES];
        mixer.mix([Some(&a), Some(&b)], &mut out);
        assert!(out.iter().all(|&s| s == 4_000));

        mixer.mix([None, None], &mut out);
        assert!(out.iter().all(|&s| s == 0));
    }
}
