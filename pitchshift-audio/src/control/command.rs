//! Text command protocol.
//!
//! One line, one command. Keywords are case-sensitive and matched as a
//! prefix. Exactly one separator byte after the keyword is skipped, then
//! the argument is whatever leading decimal number follows; anything
//! unparsable reads as `0.0`, so `PITCH2` is a pitch of zero.
//!
//! | Line | Variant | Effect |
//! |------|---------|--------|
//! | `PITCH <x>` | both | speed = x |
//! | `REVERB <x>` | pitch+reverb | wet = clamp(x, 0, 1), dry = 1 - wet |
//! | `ROBOT <x>` | robot | grain size = 50 + 50·x ms, engine runs |
//! | `RESET` | both | startup defaults |

use core::fmt;

use crate::constants::{ROBOT_GRAIN_BASE_MS, ROBOT_GRAIN_SPAN_MS};
use crate::pipeline::Variant;

use super::params::EffectParams;

const PITCH: &str = "PITCH";
const REVERB: &str = "REVERB";
const ROBOT: &str = "ROBOT";
const RESET: &str = "RESET";

/// A decoded command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Playback-rate multiplier.
    Pitch(f32),
    /// Wet fraction, clamped when applied.
    Reverb(f32),
    /// Robot amount, mapped to a grain size when applied.
    Robot(f32),
    Reset,
}

impl Command {
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Pitch(_) => PITCH,
            Command::Reverb(_) => REVERB,
            Command::Robot(_) => ROBOT,
            Command::Reset => RESET,
        }
    }

    /// Whether `variant` understands this command.
    pub fn supported_by(&self, variant: Variant) -> bool {
        match self {
            Command::Pitch(_) | Command::Reset => true,
            Command::Reverb(_) => variant == Variant::PitchReverb,
            Command::Robot(_) => variant == Variant::Robot,
        }
    }
}

/// Renders the wire form, e.g. `PITCH 0.5`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Command::Pitch(v) | Command::Reverb(v) | Command::Robot(v) => {
                write!(f, "{} {:?}", self.keyword(), v)
            }
            Command::Reset => f.write_str(RESET),
        }
    }
}

/// Decode one line for `variant`.
///
/// Trailing whitespace (including a serial `\r`) is ignored. Returns `None`
/// for unknown keywords and for keywords the variant does not support.
pub fn parse_command(line: &str, variant: Variant) -> Option<Command> {
    let line = line.trim_end();

    let cmd = if let Some(rest) = line.strip_prefix(PITCH) {
        Command::Pitch(argument(rest))
    } else if let Some(rest) = line.strip_prefix(REVERB) {
        Command::Reverb(argument(rest))
    } else if let Some(rest) = line.strip_prefix(ROBOT) {
        Command::Robot(argument(rest))
    } else if line == RESET {
        Command::Reset
    } else {
        return None;
    };

    cmd.supported_by(variant).then_some(cmd)
}

/// The argument after a keyword: one separator byte is dropped, whatever
/// it is.
fn argument(rest: &str) -> f32 {
    leading_float(rest.get(1..).unwrap_or(""))
}

/// Parse the decimal number at the start of `s` after leading whitespace.
///
/// Accepts an optional sign, digits and one decimal point; stops at the
/// first other character. No number at all gives `0.0`, never NaN or
/// infinity.
fn leading_float(s: &str) -> f32 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_point = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_point => seen_point = true,
            _ => break,
        }
        end += 1;
    }
    s[..end]
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// What happened to one control line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Parameters changed.
    Applied(Command),
    /// Recognised, but the engine refused the value; nothing changed.
    Rejected(Command),
    /// Unknown or unsupported line; nothing changed.
    Ignored,
}

/// Applies command lines to an [`EffectParams`] record.
#[derive(Debug, Clone, Copy)]
pub struct CommandInterpreter {
    variant: Variant,
}

impl CommandInterpreter {
    pub const fn new(variant: Variant) -> Self {
        CommandInterpreter { variant }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Decode `line` and apply it. Never fails and never panics.
    pub fn interpret(&self, line: &str, params: &mut EffectParams) -> Outcome {
        let Some(cmd) = parse_command(line, self.variant) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(line, "ignored control line");
            return Outcome::Ignored;
        };
        self.apply(cmd, params)
    }

    /// Apply an already decoded command.
    pub fn apply(&self, cmd: Command, params: &mut EffectParams) -> Outcome {
        if !cmd.supported_by(self.variant) {
            return Outcome::Ignored;
        }
        let accepted = match cmd {
            Command::Pitch(speed) => params.engine.set_speed(speed),
            Command::Reverb(wet) => {
                params.mix.set_wet_fraction(wet);
                true
            }
            Command::Robot(amount) => params
                .engine
                .set_grain_size(ROBOT_GRAIN_BASE_MS + amount * ROBOT_GRAIN_SPAN_MS),
            Command::Reset => {
                params.reset(self.variant);
                true
            }
        };

        if accepted {
            #[cfg(feature = "tracing")]
            tracing::debug!(command = %cmd, "applied");
            Outcome::Applied(cmd)
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(command = %cmd, "value rejected, previous setting kept");
            Outcome::Rejected(cmd)
        }
    }
}

/// One-click settings offered by the desktop front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    LowVoice,
    HighVoice,
    Robot,
    Reset,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::LowVoice, Preset::HighVoice, Preset::Robot, Preset::Reset];

    pub fn command(self) -> Command {
        match self {
            Preset::LowVoice => Command::Pitch(0.5),
            Preset::HighVoice => Command::Pitch(2.0),
            Preset::Robot => Command::Robot(1.0),
            Preset::Reset => Command::Reset,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::LowVoice => "Low Voice",
            Preset::HighVoice => "High Voice",
            Preset::Robot => "Robot",
            Preset::Reset => "Reset",
        }
    }
}
