//! Peak level meter for the microphone input.

use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::node::AudioNode;

/// Full-scale magnitude used to normalise levels.
const FULL_SCALE: f32 = 32767.0;

/// Peak meter. Analyzer node: 1 input, 0 outputs.
///
/// Accumulates the largest absolute sample since the last [`read`](Self::read).
/// A tick without an input block counts as silence.
pub struct AudioAnalyzePeak {
    peak: u16,
    new_output: bool,
}

impl AudioAnalyzePeak {
    pub const fn new() -> Self {
        AudioAnalyzePeak {
            peak: 0,
            new_output: false,
        }
    }

    /// `true` once at least one tick has been metered since the last read.
    pub fn available(&self) -> bool {
        self.new_output
    }

    /// Peak level in `[0.0, 1.0]` (full-scale negative reads as 1.0). Resets the meter.
    pub fn read(&mut self) -> f32 {
        let level = self.peek();
        self.peak = 0;
        self.new_output = false;
        level
    }

    /// Peak level without resetting.
    pub fn peek(&self) -> f32 {
        (self.peak as f32 / FULL_SCALE).min(1.0)
    }

    /// Fold one block of samples into the running peak.
    pub fn observe(&mut self, samples: &[i16]) {
        let block_peak = samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0);
        self.peak = self.peak.max(block_peak);
        self.new_output = true;
    }
}

impl Default for AudioAnalyzePeak {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for AudioAnalyzePeak {
    const NUM_INPUTS: usize = 1;
    const NUM_OUTPUTS: usize = 0;

    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        _outputs: &mut [Option<AudioBlockMut>],
    ) {
        match inputs[0] {
            Some(ref block) => self.observe(&block[..]),
            None => self.observe(&[]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pool::pool_guard;

    fn feed(peak: &mut AudioAnalyzePeak, at: usize, value: i16) {
        let mut block = AudioBlockMut::alloc().unwrap();
        block[at] = value;
        let mut outputs: [Option<AudioBlockMut>; 0] = [];
        peak.update(&[Some(block.into_shared())], &mut outputs);
    }

    #[test]
    fn fresh_meter_has_nothing() {
        let mut peak = AudioAnalyzePeak::new();
        assert!(!peak.available());
        assert_eq!(peak.read(), 0.0);
    }

    #[test]
    fn tracks_largest_magnitude() {
        let _pool = pool_guard();
        let mut peak = AudioAnalyzePeak::new();
        feed(&mut peak, 50, 16384);
        feed(&mut peak, 10, -24576);
        assert!(peak.available());
        let level = peak.read();
        assert!((level - 0.75).abs() < 0.01, "got {level}");
        assert!(!peak.available());
        assert_eq!(peak.read(), 0.0);
    }

    #[test]
    fn full_scale_negative_clamps_to_one() {
        let _pool = pool_guard();
        let mut peak = AudioAnalyzePeak::new();
        feed(&mut peak, 0, i16::MIN);
        assert_eq!(peak.read(), 1.0);
    }

    #[test]
    fn missing_input_counts_as_silence() {
        let mut peak = AudioAnalyzePeak::new();
        let mut outputs: [Option<AudioBlockMut>; 0] = [];
        peak.update(&[None], &mut outputs);
        assert!(peak.available());
        assert_eq!(peak.peek(), 0.0);
    }
}
