//! Microphone stand-ins: a WAV file or a sine tone, cut into blocks.

use std::f32::consts::TAU;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use pitchshift_audio::block::AudioBlockMut;
use pitchshift_audio::constants::AUDIO_BLOCK_SAMPLES;
use pitchshift_audio::AudioSource;

use crate::error::Result;

/// Decoded first channel of a WAV file.
#[derive(Debug)]
pub struct WavInput {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Read a WAV file and keep its first channel as 16-bit samples.
pub fn read_first_channel(path: &Path) -> Result<WavInput> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let stride = usize::from(spec.channels.max(1));

    let samples = match spec.sample_format {
        SampleFormat::Int => {
            let shift = i32::from(spec.bits_per_sample) - 16;
            reader
                .into_samples::<i32>()
                .step_by(stride)
                .map(|s| s.map(|v| rescale_int(v, shift)))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(stride)
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok(WavInput {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn rescale_int(v: i32, shift: i32) -> i16 {
    let scaled = if shift >= 0 { v >> shift } else { v << -shift };
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Sine oscillator that stops after a fixed number of samples.
#[derive(Debug, Clone)]
pub struct Tone {
    phase: f32,
    step: f32,
    amplitude: f32,
    remaining: usize,
}

impl Tone {
    pub fn new(hz: f32, amplitude: f32, seconds: f32, sample_rate: f32) -> Self {
        Tone {
            phase: 0.0,
            step: hz / sample_rate,
            amplitude: amplitude.clamp(0.0, 1.0),
            remaining: (seconds * sample_rate).round() as usize,
        }
    }
}

impl Iterator for Tone {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let sample = self.amplitude * (TAU * self.phase).sin();
        self.phase += self.step;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        Some((sample * 32767.0) as i16)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Cuts a sample stream into pool blocks, zero-padding the last one.
pub struct BlockSource {
    samples: Box<dyn Iterator<Item = i16>>,
    exhausted: bool,
}

impl BlockSource {
    pub fn new(samples: impl Iterator<Item = i16> + 'static) -> Self {
        BlockSource {
            samples: Box::new(samples),
            exhausted: false,
        }
    }

    /// Every sample has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl AudioSource for BlockSource {
    fn poll_block(&mut self) -> Option<AudioBlockMut> {
        if self.exhausted {
            return None;
        }
        let mut buf = [0i16; AUDIO_BLOCK_SAMPLES];
        let mut filled = 0;
        for (slot, sample) in buf.iter_mut().zip(&mut self.samples) {
            *slot = sample;
            filled += 1;
        }
        if filled < AUDIO_BLOCK_SAMPLES {
            self.exhausted = true;
        }
        if filled == 0 {
            return None;
        }

        let block = AudioBlockMut::alloc_from(&buf);
        if block.is_none() {
            tracing::warn!("block pool exhausted, input block lost");
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use pitchshift_audio::constants::AUDIO_SAMPLE_RATE_EXACT;

    #[test]
    fn tone_length_and_level() {
        let tone = Tone::new(441.0, 0.5, 0.1, 44_100.0);
        assert_eq!(tone.size_hint(), (4410, Some(4410)));
        let samples: Vec<i16> = tone.collect();
        assert_eq!(samples.len(), 4410);
        assert_eq!(samples[0], 0);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!((16_300..=16_384).contains(&peak), "peak {peak}");
    }

    #[test]
    fn blocks_are_zero_padded_then_exhausted() {
        let mut src = BlockSource::new((1..=200).map(|n| n as i16));

        let first = src.poll_block().unwrap();
        assert_eq!(first[0], 1);
        assert_eq!(first[127], 128);
        assert!(!src.is_exhausted());
        drop(first);

        let second = src.poll_block().unwrap();
        assert_eq!(second[71], 200);
        assert!(second[72..].iter().all(|&s| s == 0));
        assert!(src.is_exhausted());
        drop(second);

        assert!(src.poll_block().is_none());
    }

    #[test]
    fn exact_multiple_ends_without_empty_block() {
        let mut src = BlockSource::new(std::iter::repeat(7i16).take(AUDIO_BLOCK_SAMPLES));
        assert!(src.poll_block().is_some());
        assert!(src.poll_block().is_none());
        assert!(src.is_exhausted());
    }

    #[test]
    fn tone_block_count() {
        let tone = Tone::new(220.0, 0.5, 1.0, AUDIO_SAMPLE_RATE_EXACT);
        let mut src = BlockSource::new(tone);
        let mut blocks = 0;
        while src.poll_block().is_some() {
            blocks += 1;
        }
        assert_eq!(blocks, 345);
    }

    #[test]
    fn wav_keeps_first_channel_at_16_bits() {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(file.path(), spec).unwrap();
        for (left, right) in [(256, -1), (-8_388_608, 5), (8_388_607, 0)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let wav = read_first_channel(file.path()).unwrap();
        assert_eq!(wav.sample_rate, 48_000);
        assert_eq!(wav.channels, 2);
        assert_eq!(wav.samples, vec![1, i16::MIN, i16::MAX]);
    }

    #[test]
    fn float_wav_is_scaled() {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(file.path(), spec).unwrap();
        for v in [0.5f32, -2.0, 0.0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let wav = read_first_channel(file.path()).unwrap();
        assert_eq!(wav.samples, vec![16383, -32767, 0]);
    }
}
