//! Control path: parameter state, the command protocol and line assembly.

pub mod command;
pub mod line;
pub mod params;

pub use command::{parse_command, Command, CommandInterpreter, Outcome, Preset};
pub use line::{ControlChannel, LineAssembler};
pub use params::{EffectParams, EngineParams, MixParams, ReverbParams};
