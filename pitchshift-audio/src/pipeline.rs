//! The two effect chains and the wrapper that keeps them in step with the
//! parameter record.
//!
//! ```text
//! pitch+reverb:  input ─┬─ meter
//!                       └─ granular ─┬──────────── mixer.0 ─ output
//!                                    └─ reverb ─── mixer.1
//!
//! robot:         input ─┬─ meter
//!                       └─ granular ── mixer.0 ─ output     (mixer.1 open)
//! ```

use core::fmt;

use crate::audio_graph;
use crate::block::{AudioBlockMut, AudioBlockRef};
use crate::control::EffectParams;
use crate::io::{AudioPlayQueue, AudioRecordQueue};
use crate::nodes::{
    AudioAnalyzePeak, AudioEffectFreeverb, AudioEffectGranular, AudioMixer, EngineState, GrainMode,
};

audio_graph! {
    /// Granular shifter with a Freeverb send blended back in by the mixer.
    pub struct PitchReverbGraph {
        input: AudioPlayQueue {},
        meter: AudioAnalyzePeak { (input, 0) },
        granular: AudioEffectGranular { (input, 0) },
        reverb: AudioEffectFreeverb { (granular, 0) },
        mixer: AudioMixer<2> { (granular, 0), (reverb, 0) },
        output: AudioRecordQueue { (mixer, 0) },
    }
}

audio_graph! {
    /// Granular robot voice; the mixer's wet input is left open.
    pub struct RobotGraph {
        input: AudioPlayQueue {},
        meter: AudioAnalyzePeak { (input, 0) },
        granular: AudioEffectGranular { (input, 0) },
        mixer: AudioMixer<2> { (granular, 0), _ },
        output: AudioRecordQueue { (mixer, 0) },
    }
}

/// Which effect chain runs. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Pitch shift with a dry/wet reverb blend. Accepts `PITCH`, `REVERB`, `RESET`.
    PitchReverb,
    /// Grain-size robot voice, dry only. Accepts `PITCH`, `ROBOT`, `RESET`.
    Robot,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::PitchReverb => "pitch-reverb",
            Variant::Robot => "robot",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Graph {
    PitchReverb(PitchReverbGraph),
    Robot(RobotGraph),
}

/// Runs the selected chain one block at a time.
pub struct EffectsPipeline {
    graph: Graph,
    /// Reset epoch last pushed into the granular engine.
    applied_epoch: Option<u32>,
}

/// Evaluate `$body` with `$g` bound to whichever graph is active.
macro_rules! with_graph {
    ($self:expr, $g:ident => $body:expr) => {
        match $self {
            Graph::PitchReverb($g) => $body,
            Graph::Robot($g) => $body,
        }
    };
}

impl EffectsPipeline {
    pub fn new(variant: Variant) -> Self {
        let mut graph = match variant {
            Variant::PitchReverb => Graph::PitchReverb(PitchReverbGraph::new()),
            Variant::Robot => {
                let mut g = RobotGraph::new();
                g.granular.set_mode(GrainMode::Robot);
                Graph::Robot(g)
            }
        };
        with_graph!(&mut graph, g => g.output.start());
        EffectsPipeline {
            graph,
            applied_epoch: None,
        }
    }

    pub fn variant(&self) -> Variant {
        match self.graph {
            Graph::PitchReverb(_) => Variant::PitchReverb,
            Graph::Robot(_) => Variant::Robot,
        }
    }

    /// Push the parameter record into the nodes. Call between blocks only.
    pub fn apply(&mut self, params: &EffectParams) {
        let engine = &params.engine;
        let restart = self.applied_epoch != Some(engine.epoch());
        self.applied_epoch = Some(engine.epoch());

        with_graph!(&mut self.graph, g => {
            let granular = &mut g.granular;
            granular.set_speed(engine.speed());
            match engine.state() {
                EngineState::Running if restart => {
                    granular.begin_pitch_shift(engine.grain_size_ms());
                }
                EngineState::Running => {
                    if granular.state() != EngineState::Running
                        || granular.grain_size_ms() != engine.grain_size_ms()
                    {
                        granular.set_grain_size(engine.grain_size_ms());
                    }
                }
                EngineState::Stopped => {
                    if restart {
                        granular.set_grain_size(engine.grain_size_ms());
                    }
                    granular.stop();
                }
            }
            g.mixer.crossfade(params.mix.dry(), params.mix.wet());
        });

        if let Graph::PitchReverb(g) = &mut self.graph {
            g.reverb.set_room_size(params.reverb.room_size());
            g.reverb.set_damping(params.reverb.damping());
        }
    }

    /// Run one tick with `block` as the microphone input.
    ///
    /// Hands the block back if the input stage is still full; the graph is
    /// not run in that case.
    pub fn process(&mut self, block: AudioBlockMut) -> Result<(), AudioBlockMut> {
        with_graph!(&mut self.graph, g => {
            g.input.play(block)?;
            g.update_all();
        });
        Ok(())
    }

    /// Next finished block, oldest first.
    pub fn next_output(&self) -> Option<AudioBlockRef> {
        with_graph!(&self.graph, g => g.output.read())
    }

    /// Finished blocks lost to a full output stage since the last call.
    pub fn take_overflows(&self) -> u32 {
        with_graph!(&self.graph, g => g.output.take_overflows())
    }

    /// Input peak since the last read, if any tick was metered.
    pub fn read_input_peak(&mut self) -> Option<f32> {
        with_graph!(&mut self.graph, g => g.meter.available().then(|| g.meter.read()))
    }

    pub fn granular(&self) -> &AudioEffectGranular {
        with_graph!(&self.graph, g => &g.granular)
    }

    pub fn mixer(&self) -> &AudioMixer<2> {
        with_graph!(&self.graph, g => &g.mixer)
    }

    /// The reverb stage, present only in the pitch+reverb chain.
    pub fn reverb(&self) -> Option<&AudioEffectFreeverb> {
        match &self.graph {
            Graph::PitchReverb(g) => Some(&g.reverb),
            Graph::Robot(_) => None,
        }
    }
}
