//! The tick loop: one audio block, then at most one command line.
//!
//! [`EffectsEngine::tick`] polls the microphone source without blocking and,
//! when a block is ready, runs it through the pipeline and writes the result
//! to the transport. It then polls the control channel and applies at most
//! one line. Parameter changes therefore always land between two blocks.

use crate::block::AudioBlockMut;
use crate::constants::BLOCK_BYTES;
use crate::control::{Command, CommandInterpreter, ControlChannel, EffectParams, Outcome};
use crate::io::transport::{encode_block, TransportSink};
use crate::pipeline::{EffectsPipeline, Variant};

/// Non-blocking source of microphone blocks.
pub trait AudioSource {
    /// Next input block, or `None` if a full block is not ready yet.
    fn poll_block(&mut self) -> Option<AudioBlockMut>;
}

/// Failures surfaced by [`EffectsEngine::tick`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E> {
    /// The transport refused a block.
    #[error("transport write failed")]
    Transport(#[source] E),
}

/// Running totals since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Input blocks run through the pipeline.
    pub blocks_processed: u64,
    /// Encoded blocks accepted by the transport.
    pub blocks_sent: u64,
    /// Ticks whose output never reached the transport (pool or queue exhausted).
    pub blocks_dropped: u64,
    pub commands_applied: u64,
    pub commands_rejected: u64,
    pub commands_ignored: u64,
}

/// What one call to [`EffectsEngine::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tick {
    /// An input block was consumed.
    pub processed: bool,
    /// Blocks written to the transport.
    pub sent: usize,
    /// Outcome of the control line handled this tick.
    pub command: Option<Outcome>,
}

/// Owns the parameter record, the pipeline and the interpreter.
pub struct EffectsEngine {
    params: EffectParams,
    pipeline: EffectsPipeline,
    interpreter: CommandInterpreter,
    stats: EngineStats,
    input_peak: f32,
    wire: [u8; BLOCK_BYTES],
}

impl EffectsEngine {
    pub fn new(variant: Variant) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(%variant, "effects engine created");
        EffectsEngine {
            params: EffectParams::new(variant),
            pipeline: EffectsPipeline::new(variant),
            interpreter: CommandInterpreter::new(variant),
            stats: EngineStats::default(),
            input_peak: 0.0,
            wire: [0; BLOCK_BYTES],
        }
    }

    /// Process at most one audio block and at most one control line.
    pub fn tick<S, C, T>(
        &mut self,
        source: &mut S,
        control: &mut C,
        sink: &mut T,
    ) -> Result<Tick, EngineError<T::Error>>
    where
        S: AudioSource + ?Sized,
        C: ControlChannel + ?Sized,
        T: TransportSink + ?Sized,
    {
        let mut tick = Tick::default();

        if let Some(block) = source.poll_block() {
            tick.processed = true;
            tick.sent = self.process_block(block, sink)?;
        }

        if let Some(line) = control.poll_line() {
            let outcome = self.interpreter.interpret(line, &mut self.params);
            self.count(outcome);
            tick.command = Some(outcome);
        }

        Ok(tick)
    }

    /// Run one block through the pipeline and drain the output to `sink`.
    /// Returns the number of blocks written.
    pub fn process_block<T>(
        &mut self,
        block: AudioBlockMut,
        sink: &mut T,
    ) -> Result<usize, EngineError<T::Error>>
    where
        T: TransportSink + ?Sized,
    {
        self.pipeline.apply(&self.params);
        if self.pipeline.process(block).is_err() {
            self.stats.blocks_dropped += 1;
            #[cfg(feature = "tracing")]
            tracing::warn!("input stage full, block dropped");
            return Ok(0);
        }
        self.stats.blocks_processed += 1;

        if let Some(peak) = self.pipeline.read_input_peak() {
            self.input_peak = peak;
        }

        let mut sent = 0;
        while let Some(out) = self.pipeline.next_output() {
            encode_block(&out, &mut self.wire);
            drop(out);
            sink.write_block(&self.wire).map_err(EngineError::Transport)?;
            sent += 1;
        }
        self.stats.blocks_sent += sent as u64;

        let overflows = self.pipeline.take_overflows() as u64;
        if sent == 0 || overflows > 0 {
            self.stats.blocks_dropped += overflows.max(1);
            #[cfg(feature = "tracing")]
            tracing::warn!(
                free_blocks = crate::block::POOL.free_count(),
                pool_size = crate::constants::POOL_SIZE,
                "no output block this tick"
            );
        }
        Ok(sent)
    }

    /// Apply a command directly, as if it had arrived on the control channel.
    pub fn apply_command(&mut self, cmd: Command) -> Outcome {
        let outcome = self.interpreter.apply(cmd, &mut self.params);
        self.count(outcome);
        outcome
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied(_) => self.stats.commands_applied += 1,
            Outcome::Rejected(_) => self.stats.commands_rejected += 1,
            Outcome::Ignored => self.stats.commands_ignored += 1,
        }
    }

    pub fn variant(&self) -> Variant {
        self.interpreter.variant()
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn pipeline(&self) -> &EffectsPipeline {
        &self.pipeline
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Input peak of the most recent block, `0.0..=1.0`.
    pub fn input_peak(&self) -> f32 {
        self.input_peak
    }
}
