//! Transport sink: where finished audio leaves the engine.
//!
//! Each block goes out as exactly [`BLOCK_BYTES`] bytes, samples in order,
//! little-endian `i16`, with no header or delimiter. The host knows the
//! block size in advance.

use crate::constants::{AUDIO_BLOCK_SAMPLES, BLOCK_BYTES};

/// Accepts encoded audio blocks, e.g. a serial port or a file.
pub trait TransportSink {
    /// Error type for write failures.
    type Error;

    /// Write one encoded block. May block until the link has taken it.
    fn write_block(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: TransportSink + ?Sized> TransportSink for &mut T {
    type Error = T::Error;

    fn write_block(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write_block(bytes)
    }
}

/// Serialise one block for the wire.
pub fn encode_block(samples: &[i16; AUDIO_BLOCK_SAMPLES], out: &mut [u8; BLOCK_BYTES]) {
    for (pair, &s) in out.chunks_exact_mut(2).zip(samples.iter()) {
        pair.copy_from_slice(&s.to_le_bytes());
    }
}

/// Inverse of [`encode_block`].
pub fn decode_block(bytes: &[u8; BLOCK_BYTES], out: &mut [i16; AUDIO_BLOCK_SAMPLES]) {
    for (s, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *s = i16::from_le_bytes([pair[0], pair[1]]);
    }
}

/// Seconds of audio one block carries.
pub fn block_duration_secs(sample_rate: f32) -> f32 {
    AUDIO_BLOCK_SAMPLES as f32 / sample_rate
}

/// Whether a serial link at `baud` (8N1, 10 bits per byte) keeps up with the
/// audio byte rate at `sample_rate`. When it cannot, blocks queue up behind
/// the link and arrive late.
pub fn link_sustains(baud: u32, sample_rate: f32) -> bool {
    let bytes_per_sec = baud as f32 / 10.0;
    let needed = sample_rate * core::mem::size_of::<i16>() as f32;
    bytes_per_sec >= needed
}
