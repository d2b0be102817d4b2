//! Transport sinks: the raw byte stream plus an optional WAV capture.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use pitchshift_audio::constants::{AUDIO_SAMPLE_RATE_EXACT, BLOCK_BYTES};
use pitchshift_audio::io::TransportSink;

use crate::error::{HostError, Result};

/// Writes encoded blocks to any byte stream, optionally teeing the decoded
/// samples into a mono 16-bit WAV file.
pub struct StreamSink {
    stream: Box<dyn Write>,
    capture: Option<WavWriter<BufWriter<File>>>,
    bytes_written: u64,
}

impl StreamSink {
    pub fn new(stream: impl Write + 'static) -> Self {
        StreamSink {
            stream: Box::new(stream),
            capture: None,
            bytes_written: 0,
        }
    }

    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }

    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    /// Also record every block to `path` as WAV.
    pub fn with_capture(mut self, path: &Path) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: AUDIO_SAMPLE_RATE_EXACT.round() as u32,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        self.capture = Some(WavWriter::create(path, spec)?);
        Ok(self)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush the stream and finalize the capture. Returns bytes written.
    pub fn finish(mut self) -> Result<u64> {
        self.stream.flush()?;
        if let Some(capture) = self.capture.take() {
            capture.finalize()?;
        }
        Ok(self.bytes_written)
    }
}

impl TransportSink for StreamSink {
    type Error = HostError;

    fn write_block(&mut self, bytes: &[u8]) -> Result<()> {
        debug_assert_eq!(bytes.len(), BLOCK_BYTES);
        self.stream.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        if let Some(capture) = self.capture.as_mut() {
            for pair in bytes.chunks_exact(2) {
                capture.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use pitchshift_audio::constants::AUDIO_BLOCK_SAMPLES;
    use pitchshift_audio::io::{decode_block, encode_block};

    fn encoded(value: i16) -> [u8; BLOCK_BYTES] {
        let mut wire = [0u8; BLOCK_BYTES];
        encode_block(&[value; AUDIO_BLOCK_SAMPLES], &mut wire);
        wire
    }

    #[test]
    fn raw_stream_is_concatenated_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.raw");

        let mut sink = StreamSink::create(&path).unwrap();
        sink.write_block(&encoded(-2)).unwrap();
        sink.write_block(&encoded(300)).unwrap();
        assert_eq!(sink.bytes_written(), 2 * BLOCK_BYTES as u64);
        assert_eq!(sink.finish().unwrap(), 512);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 2 * BLOCK_BYTES);
        let mut samples = [0i16; AUDIO_BLOCK_SAMPLES];
        decode_block(bytes[BLOCK_BYTES..].try_into().unwrap(), &mut samples);
        assert!(samples.iter().all(|&s| s == 300));
    }

    #[test]
    fn capture_mirrors_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("out.raw");
        let wav = dir.path().join("out.wav");

        let mut sink = StreamSink::create(&raw).unwrap().with_capture(&wav).unwrap();
        sink.write_block(&encoded(1234)).unwrap();
        sink.finish().unwrap();

        let reader = WavReader::open(&wav).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44_118);
        let samples: Vec<i16> = reader.into_samples().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(samples, vec![1234; AUDIO_BLOCK_SAMPLES]);
    }

    #[test]
    fn write_errors_surface() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut sink = StreamSink::new(Full);
        assert!(matches!(sink.write_block(&encoded(0)), Err(HostError::Io(_))));
        assert_eq!(sink.bytes_written(), 0);
    }
}
