//! Runtime parameter records shared by the command interpreter and the
//! pipeline.
//!
//! The interpreter is the only writer. The pipeline copies the records into
//! its nodes at the start of every processed block, so a change always lands
//! on a block boundary.

use crate::constants::{DEFAULT_DAMPING, DEFAULT_GRAIN_SIZE_MS, DEFAULT_ROOM_SIZE, DEFAULT_SPEED};
use crate::dsp::helpers::unit_clamp;
use crate::nodes::EngineState;
use crate::pipeline::Variant;

/// Granular engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    speed: f32,
    grain_size_ms: f32,
    state: EngineState,
    /// Bumped by every reset; a change restarts the grain cycle.
    epoch: u32,
}

impl EngineParams {
    fn defaults(variant: Variant, epoch: u32) -> Self {
        EngineParams {
            speed: DEFAULT_SPEED,
            grain_size_ms: DEFAULT_GRAIN_SIZE_MS,
            state: match variant {
                Variant::PitchReverb => EngineState::Running,
                Variant::Robot => EngineState::Stopped,
            },
            epoch,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn grain_size_ms(&self) -> f32 {
        self.grain_size_ms
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Returns `false` and keeps the old value unless `speed` is finite and positive.
    pub fn set_speed(&mut self, speed: f32) -> bool {
        if !(speed > 0.0 && speed.is_finite()) {
            return false;
        }
        self.speed = speed;
        true
    }

    /// Same gate as [`set_speed`](Self::set_speed). An accepted size also
    /// puts the engine back into `Running`.
    pub fn set_grain_size(&mut self, ms: f32) -> bool {
        if !(ms > 0.0 && ms.is_finite()) {
            return false;
        }
        self.grain_size_ms = ms;
        self.state = EngineState::Running;
        true
    }

    pub fn stop(&mut self) {
        self.state = EngineState::Stopped;
    }
}

/// Dry/wet gain pair. `dry + wet == 1` after every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixParams {
    dry: f32,
    wet: f32,
}

impl MixParams {
    /// Fully dry.
    pub const fn dry_only() -> Self {
        MixParams { dry: 1.0, wet: 0.0 }
    }

    pub fn dry(&self) -> f32 {
        self.dry
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    /// Set the wet share, clamped to `[0, 1]` (NaN counts as 0), and give
    /// the rest to dry.
    pub fn set_wet_fraction(&mut self, wet: f32) {
        let wet = unit_clamp(wet);
        self.wet = wet;
        self.dry = 1.0 - wet;
    }
}

impl Default for MixParams {
    fn default() -> Self {
        Self::dry_only()
    }
}

/// Room simulation settings, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    room_size: f32,
    damping: f32,
}

impl ReverbParams {
    pub const fn new() -> Self {
        ReverbParams {
            room_size: DEFAULT_ROOM_SIZE,
            damping: DEFAULT_DAMPING,
        }
    }

    pub fn room_size(&self) -> f32 {
        self.room_size
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn set_room_size(&mut self, n: f32) {
        self.room_size = unit_clamp(n);
    }

    pub fn set_damping(&mut self, n: f32) {
        self.damping = unit_clamp(n);
    }
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Every parameter the control channel can touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub engine: EngineParams,
    pub mix: MixParams,
    pub reverb: ReverbParams,
}

impl EffectParams {
    /// Startup defaults for `variant`.
    pub fn new(variant: Variant) -> Self {
        EffectParams {
            engine: EngineParams::defaults(variant, 0),
            mix: MixParams::dry_only(),
            reverb: ReverbParams::new(),
        }
    }

    /// Restore the startup defaults in one step and restart the grain cycle.
    pub fn reset(&mut self, variant: Variant) {
        let epoch = self.engine.epoch.wrapping_add(1);
        *self = EffectParams {
            engine: EngineParams::defaults(variant, epoch),
            ..EffectParams::new(variant)
        };
    }
}
