//! TOML defaults merged under the command line.
//!
//! ```toml
//! variant = "robot"
//! tone_hz = 220.0
//! seconds = 3.0
//! output = "out.raw"
//! commands = "automation.txt"
//! baud = 921600
//! ```

use std::path::{Path, PathBuf};

use pitchshift_audio::constants::{AUDIO_SAMPLE_RATE_EXACT, SERIAL_BAUD};
use pitchshift_audio::io::transport::link_sustains;
use pitchshift_audio::{Preset, Variant};
use serde::Deserialize;

use crate::cli::{Cli, PresetArg, VariantArg};
use crate::error::{HostError, Result};

const DEFAULT_TONE_SECONDS: f32 = 5.0;
const DEFAULT_TONE_AMPLITUDE: f32 = 0.5;

/// Optional file-level defaults. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub variant: Option<VariantArg>,
    pub input: Option<PathBuf>,
    pub tone_hz: Option<f32>,
    pub tone_amplitude: Option<f32>,
    pub seconds: Option<f32>,
    pub output: Option<PathBuf>,
    pub wav_out: Option<PathBuf>,
    pub commands: Option<PathBuf>,
    pub preset: Option<PresetArg>,
    pub realtime: Option<bool>,
    /// Serial link rate the stream is budgeted against.
    pub baud: Option<u32>,
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|source| HostError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Wav(PathBuf),
    Tone { hz: f32, amplitude: f32, seconds: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandSpec {
    Stdin,
    Script(PathBuf),
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub variant: Variant,
    pub source: SourceSpec,
    pub output: OutputSpec,
    pub wav_out: Option<PathBuf>,
    pub commands: Option<CommandSpec>,
    pub preset: Option<Preset>,
    pub realtime: bool,
    pub baud: u32,
}

fn is_dash(path: &Path) -> bool {
    path.as_os_str() == "-"
}

impl Settings {
    /// Merge `cli` over `file`; flags given on the command line win.
    pub fn resolve(cli: &Cli, file: HostConfig) -> Result<Self> {
        let variant: Variant = cli
            .variant
            .or(file.variant)
            .unwrap_or(VariantArg::PitchReverb)
            .into();

        // An explicit source on the command line replaces the file's, whichever kind.
        let (input, tone) = if cli.input.is_some() || cli.tone.is_some() {
            (cli.input.clone(), cli.tone)
        } else {
            (file.input, file.tone_hz)
        };
        let source = match (input, tone) {
            (Some(path), _) => SourceSpec::Wav(path),
            (None, Some(hz)) => {
                let seconds = cli.seconds.or(file.seconds).unwrap_or(DEFAULT_TONE_SECONDS);
                let amplitude = file.tone_amplitude.unwrap_or(DEFAULT_TONE_AMPLITUDE);
                validate_tone(hz, amplitude, seconds)?;
                SourceSpec::Tone {
                    hz,
                    amplitude,
                    seconds,
                }
            }
            (None, None) => return Err(HostError::NoSource),
        };

        let output = match cli.output.clone().or(file.output) {
            Some(path) if !is_dash(&path) => OutputSpec::File(path),
            _ => OutputSpec::Stdout,
        };

        let commands = cli.commands.clone().or(file.commands).map(|path| {
            if is_dash(&path) {
                CommandSpec::Stdin
            } else {
                CommandSpec::Script(path)
            }
        });

        let baud = file.baud.unwrap_or(SERIAL_BAUD);
        if baud == 0 {
            return Err(HostError::Invalid("baud must be positive".into()));
        }

        Ok(Settings {
            variant,
            source,
            output,
            wav_out: cli.wav_out.clone().or(file.wav_out),
            commands,
            preset: cli.preset.or(file.preset).map(Preset::from),
            realtime: cli.realtime || file.realtime.unwrap_or(false),
            baud,
        })
    }

    /// Whether the configured link can carry the processed stream in real time.
    pub fn link_keeps_up(&self) -> bool {
        link_sustains(self.baud, AUDIO_SAMPLE_RATE_EXACT)
    }
}

fn validate_tone(hz: f32, amplitude: f32, seconds: f32) -> Result<()> {
    let nyquist = AUDIO_SAMPLE_RATE_EXACT / 2.0;
    if !(hz > 0.0 && hz < nyquist) {
        return Err(HostError::Invalid(format!(
            "tone frequency {hz} Hz outside (0, {nyquist})"
        )));
    }
    if !(amplitude > 0.0 && amplitude <= 1.0) {
        return Err(HostError::Invalid(format!(
            "tone amplitude {amplitude} outside (0, 1]"
        )));
    }
    if !(seconds > 0.0 && seconds.is_finite()) {
        return Err(HostError::Invalid(format!("tone length {seconds} s")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pitchshift").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_from_tone_flag() {
        let s = Settings::resolve(&cli(&["--tone", "440"]), HostConfig::default()).unwrap();
        assert_eq!(s.variant, Variant::PitchReverb);
        assert_eq!(
            s.source,
            SourceSpec::Tone {
                hz: 440.0,
                amplitude: DEFAULT_TONE_AMPLITUDE,
                seconds: DEFAULT_TONE_SECONDS
            }
        );
        assert_eq!(s.output, OutputSpec::Stdout);
        assert_eq!(s.commands, None);
        assert_eq!(s.baud, SERIAL_BAUD);
        assert!(!s.realtime);
        assert!(s.link_keeps_up());
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = Settings::resolve(&cli(&[]), HostConfig::default()).unwrap_err();
        assert!(matches!(err, HostError::NoSource));
    }

    #[test]
    fn cli_overrides_file() {
        let file = HostConfig::parse(
            r#"
            variant = "robot"
            tone_hz = 220.0
            seconds = 2.0
            output = "from-file.raw"
            preset = "high-voice"
            realtime = true
            "#,
        )
        .unwrap();
        let s = Settings::resolve(
            &cli(&["--variant", "pitch-reverb", "--input", "voice.wav", "-o", "-"]),
            file,
        )
        .unwrap();
        assert_eq!(s.variant, Variant::PitchReverb);
        assert_eq!(s.source, SourceSpec::Wav(PathBuf::from("voice.wav")));
        assert_eq!(s.output, OutputSpec::Stdout);
        assert_eq!(s.preset, Some(Preset::HighVoice));
        assert!(s.realtime);
    }

    #[test]
    fn file_supplies_what_cli_omits() {
        let file = HostConfig::parse(
            r#"
            variant = "robot"
            tone_hz = 220.0
            tone_amplitude = 0.25
            commands = "-"
            baud = 115200
            "#,
        )
        .unwrap();
        let s = Settings::resolve(&cli(&["--seconds", "1.5"]), file).unwrap();
        assert_eq!(s.variant, Variant::Robot);
        assert_eq!(
            s.source,
            SourceSpec::Tone {
                hz: 220.0,
                amplitude: 0.25,
                seconds: 1.5
            }
        );
        assert_eq!(s.commands, Some(CommandSpec::Stdin));
        assert!(!s.link_keeps_up());
    }

    #[test]
    fn bad_tone_rejected() {
        let cases: [&[&str]; 3] = [&["--tone", "0"], &["--tone", "30000"], &["--tone", "440", "--seconds", "0"]];
        for args in cases {
            let res = Settings::resolve(&cli(args), HostConfig::default());
            assert!(matches!(res, Err(HostError::Invalid(_))), "{args:?}");
        }
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(HostConfig::parse("volume = 11").is_err());
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "variant = \"kazoo\"").unwrap();
        let err = HostConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HostError::Config { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
