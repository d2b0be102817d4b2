//! Host-side error type.

use std::path::PathBuf;

/// Failures outside the real-time path: files, config, arguments.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    #[error("invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no microphone source: pass --input <wav> or --tone <hz>")]
    NoSource,

    #[error("invalid schedule in script line {0:?}")]
    Schedule(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, HostError>;
