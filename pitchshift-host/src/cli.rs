//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pitchshift_audio::{Preset, Variant};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "pitchshift")]
#[command(author, version, about = "Run the voice effects engine on a recorded or synthetic microphone", long_about = None)]
pub struct Cli {
    /// Effect chain to run
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// WAV file used as the microphone signal (first channel)
    #[arg(short, long, conflicts_with = "tone")]
    pub input: Option<PathBuf>,

    /// Use a sine tone of this frequency (Hz) as the microphone signal
    #[arg(long)]
    pub tone: Option<f32>,

    /// Length of the sine tone in seconds
    #[arg(long)]
    pub seconds: Option<f32>,

    /// Destination of the raw little-endian block stream ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also capture the processed stream as a WAV file
    #[arg(long)]
    pub wav_out: Option<PathBuf>,

    /// Command script, one line per command ("-" reads stdin).
    /// Lines of the form "@<block> <command>" wait for that block.
    #[arg(short, long)]
    pub commands: Option<PathBuf>,

    /// Apply a preset before the first block
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// TOML file with defaults for any of these options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pace processing at the audio block rate
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantArg {
    /// Pitch shift with reverb blend
    PitchReverb,
    /// Grain-size robot voice
    Robot,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::PitchReverb => Variant::PitchReverb,
            VariantArg::Robot => Variant::Robot,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetArg {
    /// PITCH 0.5
    LowVoice,
    /// PITCH 2.0
    HighVoice,
    /// ROBOT 1.0
    Robot,
    /// RESET
    Reset,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::LowVoice => Preset::LowVoice,
            PresetArg::HighVoice => Preset::HighVoice,
            PresetArg::Robot => Preset::Robot,
            PresetArg::Reset => Preset::Reset,
        }
    }
}
