//! Granular pitch shifter and robot voice.
//!
//! Every input sample is recorded into a [`GrainBuffer`]. The output is the
//! sum of two grain readers ("taps") that sweep through that history half a
//! grain apart. Each tap sits `phase * grain_len` samples behind the live
//! input and its phase drifts by `(1 - speed) / grain_len` per sample, so the
//! history is replayed `speed` times faster than it was recorded: pitch moves
//! while the output keeps real-time duration. When a tap's phase wraps it
//! jumps to a new grain; the raised-cosine window is zero exactly there and
//! the two windows always sum to one, which hides the seam.
//!
//! [`GrainMode::Robot`] lays grains out differently: every grain period
//! replays the freshest half-grain of history twice, each copy shaped by a
//! short attack/decay gate that closes completely at the seams. The gate
//! rate (two per grain, so 40 Hz at 50 ms and 20 Hz at 100 ms) is heard as a
//! metallic buzz, and the grain size picks its pitch.

use libm::{floorf, sinf};

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::constants::{
    AUDIO_BLOCK_SAMPLES, AUDIO_SAMPLE_RATE_EXACT, DEFAULT_GRAIN_SIZE_MS, DEFAULT_SPEED,
    GRANULAR_MEMORY_SIZE, MAX_GRAIN_SAMPLES, MIN_GRAIN_SAMPLES,
};
use crate::dsp::grain_buffer::GrainBuffer;
use crate::dsp::helpers::sample_from_f32;
use crate::node::AudioNode;

/// Whether the engine is synthesizing grains or passing audio straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    /// Bypass: input is copied to the output unchanged (still recorded).
    Stopped,
}

/// How grains are laid over the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainMode {
    /// Two overlapping windowed taps; smooth transposition.
    Shift,
    /// Gated half-grain repeats; the grain rate becomes audible.
    Robot,
}

/// Share of a half-grain spent on each gate edge.
const GATE_RAMP_DIVISOR: usize = 8;

/// Granular pitch-shift effect. Effect node: 1 input, 1 output.
///
/// Starts `Stopped`; [`begin_pitch_shift`](Self::begin_pitch_shift) or
/// [`set_grain_size`](Self::set_grain_size) starts synthesis.
///
/// # Example
/// ```ignore
/// let mut granular = AudioEffectGranular::new();
/// granular.begin_pitch_shift(50.0);
/// granular.set_speed(2.0); // one octave up
/// ```
pub struct AudioEffectGranular {
    history: GrainBuffer<GRANULAR_MEMORY_SIZE>,
    speed: f32,
    grain_size_ms: f32,
    /// Grain length in samples, derived from `grain_size_ms`.
    grain_len: usize,
    /// Position of the first tap within its grain, in `[0, 1)`.
    phase: f32,
    /// Samples into the current robot grain, in `[0, grain_len)`.
    grain_pos: usize,
    mode: GrainMode,
    state: EngineState,
}

impl AudioEffectGranular {
    pub fn new() -> Self {
        AudioEffectGranular {
            history: GrainBuffer::new(),
            speed: DEFAULT_SPEED,
            grain_size_ms: DEFAULT_GRAIN_SIZE_MS,
            grain_len: grain_samples(DEFAULT_GRAIN_SIZE_MS),
            phase: 0.0,
            grain_pos: 0,
            mode: GrainMode::Shift,
            state: EngineState::Stopped,
        }
    }

    /// Start pitch shifting with the given grain size, restarting the grain
    /// cycle. Returns `false` (and changes nothing) for a non-positive size.
    pub fn begin_pitch_shift(&mut self, grain_size_ms: f32) -> bool {
        if !self.set_grain_size(grain_size_ms) {
            return false;
        }
        self.phase = 0.0;
        self.grain_pos = 0;
        true
    }

    /// Choose how grains are synthesized. Switching restarts the grain cycle.
    pub fn set_mode(&mut self, mode: GrainMode) {
        if mode != self.mode {
            self.mode = mode;
            self.phase = 0.0;
            self.grain_pos = 0;
        }
    }

    /// Set the playback-rate multiplier for the next block.
    ///
    /// Returns `false` and keeps the previous value unless `speed` is finite
    /// and positive.
    pub fn set_speed(&mut self, speed: f32) -> bool {
        if !is_positive(speed) {
            return false;
        }
        self.speed = speed;
        true
    }

    /// Set the grain window for the next block and resume synthesis.
    ///
    /// Returns `false` and keeps the previous value unless `ms` is finite and
    /// positive. Sizes outside what the history ring can hold are clamped
    /// when converted to samples.
    pub fn set_grain_size(&mut self, ms: f32) -> bool {
        if !is_positive(ms) {
            return false;
        }
        self.grain_size_ms = ms;
        self.grain_len = grain_samples(ms);
        if self.grain_pos >= self.grain_len {
            self.grain_pos = 0;
        }
        self.state = EngineState::Running;
        true
    }

    /// Bypass synthesis until the grain size is set again.
    pub fn stop(&mut self) {
        self.state = EngineState::Stopped;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn grain_size_ms(&self) -> f32 {
        self.grain_size_ms
    }

    /// Effective grain length in samples.
    pub fn grain_len(&self) -> usize {
        self.grain_len
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> GrainMode {
        self.mode
    }

    /// Delay of the dominant tap right after `begin_pitch_shift`, in samples.
    /// Also the delay of the first copy in every robot grain.
    pub fn latency_samples(&self) -> usize {
        self.grain_len / 2
    }

    /// Samples of input history currently retained.
    pub fn history_len(&self) -> usize {
        self.history.fill_level()
    }

    /// Record one input block and synthesize the matching output block.
    pub fn process(
        &mut self,
        input: &[i16; AUDIO_BLOCK_SAMPLES],
        output: &mut [i16; AUDIO_BLOCK_SAMPLES],
    ) {
        self.history.write_block(input);

        if self.state == EngineState::Stopped {
            output.copy_from_slice(input);
            return;
        }

        match self.mode {
            GrainMode::Shift => self.shift(output),
            GrainMode::Robot => self.robotize(output),
        }
    }

    fn shift(&mut self, output: &mut [i16; AUDIO_BLOCK_SAMPLES]) {
        let len = self.grain_len as f32;
        let step = (1.0 - self.speed) / len;
        let mut phase = self.phase;

        for (i, out) in output.iter_mut().enumerate() {
            // Sample i is this far behind the newest recorded sample.
            let lag = (AUDIO_BLOCK_SAMPLES - 1 - i) as f32;
            let other = wrap_phase(phase + 0.5);

            let a = window(phase) * self.history.interpolate(lag + phase * len);
            let b = window(other) * self.history.interpolate(lag + other * len);
            *out = sample_from_f32(a + b);

            phase = wrap_phase(phase + step);
        }

        self.phase = phase;
    }

    fn robotize(&mut self, output: &mut [i16; AUDIO_BLOCK_SAMPLES]) {
        let half = self.grain_len / 2;
        let ramp = (half / GATE_RAMP_DIVISOR).max(1);
        let drift = 1.0 - self.speed;

        for (i, out) in output.iter_mut().enumerate() {
            let lag = (AUDIO_BLOCK_SAMPLES - 1 - i) as f32;
            // Both copies read the same stretch of history: the first from
            // half a grain back, the repeat from a whole grain back.
            let (pos, base) = if self.grain_pos < half {
                (self.grain_pos, half)
            } else {
                (self.grain_pos - half, 2 * half)
            };
            let delay = base as f32 + pos as f32 * drift;
            let sample = gate(pos, half, ramp) * self.history.interpolate(lag + delay);
            *out = sample_from_f32(sample);

            self.grain_pos += 1;
            if self.grain_pos >= self.grain_len {
                self.grain_pos = 0;
            }
        }
    }
}

impl Default for AudioEffectGranular {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
fn is_positive(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

/// Grain length in samples for a window of `ms` milliseconds.
fn grain_samples(ms: f32) -> usize {
    let samples = ms * AUDIO_SAMPLE_RATE_EXACT / 1000.0 + 0.5;
    if samples >= MAX_GRAIN_SAMPLES as f32 {
        MAX_GRAIN_SAMPLES
    } else if samples <= MIN_GRAIN_SAMPLES as f32 {
        MIN_GRAIN_SAMPLES
    } else {
        samples as usize
    }
}

#[inline(always)]
fn wrap_phase(phase: f32) -> f32 {
    phase - floorf(phase)
}

/// Raised-cosine grain window. `window(p) + window(p + 0.5) == 1`.
#[inline(always)]
fn window(phase: f32) -> f32 {
    let s = sinf(core::f32::consts::PI * phase);
    s * s
}

/// Linear attack/decay envelope over a copy of `len` samples: zero at both
/// seams, unity once `ramp` samples in from either edge.
#[inline(always)]
fn gate(pos: usize, len: usize, ramp: usize) -> f32 {
    let edge = pos.min(len.saturating_sub(pos + 1));
    if edge >= ramp {
        1.0
    } else {
        edge as f32 / ramp as f32
    }
}

impl AudioNode for AudioEffectGranular {
    const NUM_INPUTS: usize = 1;
    const NUM_OUTPUTS: usize = 1;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    ) {
        // A missing input is recorded as silence so grain tails decay
        // and the history stays aligned with wall-clock time.
        let silence = [0i16; AUDIO_BLOCK_SAMPLES];
        let input: &[i16; AUDIO_BLOCK_SAMPLES] = match inputs[0] {
            Some(ref b) => &**b,
            None => &silence,
        };

        match outputs[0].take() {
            Some(mut out) => {
                self.process(input, &mut out);
                outputs[0] = Some(out);
            }
            None => {
                let mut scratch = [0i16; AUDIO_BLOCK_SAMPLES];
                self.process(input, &mut scratch);
            }
        }
    }
}
