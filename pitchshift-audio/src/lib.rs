//! # pitchshift-audio
//!
//! A `no_std`, zero-allocation real-time voice effects engine: a granular
//! pitch shifter (or grain-size "robot" voice), an optional Freeverb send and
//! a dry/wet mixer, driven block by block and steered by one-line text
//! commands from a host.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed-size audio block pool with refcounted handles |
//! | Trait | [`node`] | `AudioNode`, the per-block stage interface |
//! | DSP | [`dsp`] / [`nodes`] | Grain history ring, granular engine, reverb, mixer, meter |
//! | Graph | [`graph`] / [`pipeline`] | [`audio_graph!`] wiring and the two effect chains |
//! | Control | [`control`] | Parameter records, command protocol, line assembly |
//! | I/O | [`io`] | Entry/exit queues, transport encoding |
//! | Loop | [`engine`] | The tick loop tying audio, control and transport together |
//!
//! ## Quick start
//!
//! ```ignore
//! use pitchshift_audio::engine::EffectsEngine;
//! use pitchshift_audio::pipeline::Variant;
//!
//! let mut engine = EffectsEngine::new(Variant::PitchReverb);
//! loop {
//!     // Non-blocking: processes a block if one is ready, then one command line.
//!     engine.tick(&mut mic, &mut serial_lines, &mut serial_out)?;
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `tracing` | no | `tracing` events for commands, variant selection and dropped blocks |
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::AUDIO_BLOCK_SAMPLES`])
//! - **Sample rate:** 44 117.647 Hz ([`constants::AUDIO_SAMPLE_RATE_EXACT`])
//! - **Sample format:** `i16`, little-endian on the wire
//! - **Grain history:** 12 800 samples ([`constants::GRANULAR_MEMORY_SIZE`])

#![no_std]

#[cfg(test)]
extern crate std;

pub mod block;
pub mod constants;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod graph;
pub mod io;
pub mod node;
pub mod nodes;
pub mod pipeline;

pub use control::{Command, Outcome, Preset};
pub use engine::{AudioSource, EffectsEngine, EngineError, EngineStats, Tick};
pub use pipeline::Variant;
