//! Processing nodes used by the effects graphs.
//!
//! Each implements [`AudioNode`](crate::node::AudioNode).

mod analyze_peak;
mod effect_freeverb;
mod effect_granular;
mod mixer;

pub use analyze_peak::AudioAnalyzePeak;
pub use effect_freeverb::AudioEffectFreeverb;
pub use effect_granular::{AudioEffectGranular, EngineState, GrainMode};
pub use mixer::{AudioMixer, DRY_CHANNEL, WET_CHANNEL};
