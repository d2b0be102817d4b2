//! Mono fixed-point Freeverb room simulation.
//!
//! Eight parallel feedback comb filters, each with a one-pole low-pass in its
//! loop (damping), followed by four series allpass diffusers. Delay lines live
//! in two flat inline arrays; nothing is allocated after construction.

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::constants::{AUDIO_BLOCK_SAMPLES, DEFAULT_DAMPING, DEFAULT_ROOM_SIZE};
use crate::dsp::helpers::{coefficient_q15, unit_clamp, Q15_ONE};
use crate::dsp::intrinsics::{saturate16, signed_saturate_rshift};
use crate::node::AudioNode;

/// Comb delay lengths in samples (Freeverb tunings, mutually prime).
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay lengths in samples.
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];

const COMB_OFFSETS: [usize; 8] = offsets(COMB_TUNINGS);
const COMB_TOTAL: usize = total(COMB_TUNINGS);
const ALLPASS_OFFSETS: [usize; 4] = offsets(ALLPASS_TUNINGS);
const ALLPASS_TOTAL: usize = total(ALLPASS_TUNINGS);

/// Comb feedback at room size 0 and its span up to room size 1.
const FEEDBACK_BASE: f32 = 0.7;
const FEEDBACK_SPAN: f32 = 0.28;

/// Low-pass coefficient at damping 1.
const DAMPING_SCALE: f32 = 0.4;

const fn offsets<const K: usize>(lengths: [usize; K]) -> [usize; K] {
    let mut out = [0usize; K];
    let mut acc = 0;
    let mut i = 0;
    while i < K {
        out[i] = acc;
        acc += lengths[i];
        i += 1;
    }
    out
}

const fn total<const K: usize>(lengths: [usize; K]) -> usize {
    let mut acc = 0;
    let mut i = 0;
    while i < K {
        acc += lengths[i];
        i += 1;
    }
    acc
}

/// Freeverb reverb. Effect node: 1 input, 1 output (100% wet).
///
/// # Example
/// ```ignore
/// let mut reverb = AudioEffectFreeverb::new();
/// reverb.set_room_size(0.6);
/// reverb.set_damping(0.5);
/// ```
pub struct AudioEffectFreeverb {
    comb_buf: [i16; COMB_TOTAL],
    comb_pos: [usize; 8],
    /// Per-comb low-pass state.
    comb_filter: [i32; 8],
    allpass_buf: [i16; ALLPASS_TOTAL],
    allpass_pos: [usize; 4],
    /// Comb feedback, Q15.
    feedback: i32,
    /// Low-pass weight on the previous filter state, Q15.
    damp1: i32,
    /// Low-pass weight on the fresh comb output, Q15 (`Q15_ONE - damp1`).
    damp2: i32,
    room_size: f32,
    damping: f32,
}

impl AudioEffectFreeverb {
    /// Create a reverb with the default room size and damping and an empty tail.
    pub fn new() -> Self {
        let mut reverb = AudioEffectFreeverb {
            comb_buf: [0; COMB_TOTAL],
            comb_pos: [0; 8],
            comb_filter: [0; 8],
            allpass_buf: [0; ALLPASS_TOTAL],
            allpass_pos: [0; 4],
            feedback: 0,
            damp1: 0,
            damp2: Q15_ONE,
            room_size: 0.0,
            damping: 0.0,
        };
        reverb.set_room_size(DEFAULT_ROOM_SIZE);
        reverb.set_damping(DEFAULT_DAMPING);
        reverb
    }

    /// Room size, 0.0 (small) to 1.0 (large hall). Clamped to that range.
    pub fn set_room_size(&mut self, n: f32) {
        let n = unit_clamp(n);
        self.room_size = n;
        self.feedback = coefficient_q15(FEEDBACK_BASE + FEEDBACK_SPAN * n);
    }

    /// High-frequency damping, 0.0 (bright) to 1.0 (dark). Clamped to that range.
    pub fn set_damping(&mut self, n: f32) {
        let n = unit_clamp(n);
        self.damping = n;
        self.damp1 = coefficient_q15(DAMPING_SCALE * n);
        self.damp2 = Q15_ONE - self.damp1;
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Produce one wet block from one input block.
    pub fn process(
        &mut self,
        input: &[i16; AUDIO_BLOCK_SAMPLES],
        output: &mut [i16; AUDIO_BLOCK_SAMPLES],
    ) {
        for (out, &x) in output.iter_mut().zip(input.iter()) {
            *out = self.tick(x);
        }
    }

    #[inline]
    fn tick(&mut self, x: i16) -> i16 {
        // Headroom for eight combs summing into one accumulator.
        let input = signed_saturate_rshift::<16, 3>(x as i32);

        let mut sum = 0i32;
        for c in 0..COMB_TUNINGS.len() {
            let idx = COMB_OFFSETS[c] + self.comb_pos[c];
            let delayed = self.comb_buf[idx] as i32;
            sum += delayed;

            let filtered = (delayed * self.damp2 + self.comb_filter[c] * self.damp1) >> 15;
            self.comb_filter[c] = filtered;
            self.comb_buf[idx] = saturate16(input + ((filtered * self.feedback) >> 15));

            self.comb_pos[c] += 1;
            if self.comb_pos[c] == COMB_TUNINGS[c] {
                self.comb_pos[c] = 0;
            }
        }

        let mut acc = signed_saturate_rshift::<16, 2>(sum);
        for a in 0..ALLPASS_TUNINGS.len() {
            let idx = ALLPASS_OFFSETS[a] + self.allpass_pos[a];
            let buffered = self.allpass_buf[idx] as i32;
            self.allpass_buf[idx] = saturate16(acc + (buffered >> 1));
            acc = saturate16(buffered - acc) as i32;

            self.allpass_pos[a] += 1;
            if self.allpass_pos[a] == ALLPASS_TUNINGS[a] {
                self.allpass_pos[a] = 0;
            }
        }

        saturate16(acc)
    }
}

impl Default for AudioEffectFreeverb {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for AudioEffectFreeverb {
    const NUM_INPUTS: usize = 1;
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
        // No input still rings out the tail.
        let silence = [0i16; AUDIO_BLOCK_SAMPLES];
        let input: &[i16; AUDIO_BLOCK_SAMPLES] = match inputs[0] {
            Some(ref b) => &**b,
            None => &silence,
        };
        self.process(input, &mut out);
        outputs[0] = Some(out);
    }
}
