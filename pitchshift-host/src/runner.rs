//! The host processing loop.

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pitchshift_audio::constants::AUDIO_SAMPLE_RATE_EXACT;
use pitchshift_audio::io::transport::block_duration_secs;
use pitchshift_audio::{EffectsEngine, EngineError, EngineStats, Outcome};

use crate::config::{CommandSpec, OutputSpec, Settings, SourceSpec};
use crate::control::{spawn_reader, LineQueue, ScheduledLines};
use crate::error::Result;
use crate::sink::StreamSink;
use crate::source::{read_first_channel, BlockSource, Tone};

/// Blocks between progress reports (about one second).
const REPORT_INTERVAL: u64 = 345;

/// What a finished run did.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub stats: EngineStats,
    pub input_peak: f32,
    pub bytes_written: u64,
    pub interrupted: bool,
}

fn open_source(spec: &SourceSpec) -> Result<BlockSource> {
    match spec {
        SourceSpec::Wav(path) => {
            let wav = read_first_channel(path)?;
            let engine_rate = AUDIO_SAMPLE_RATE_EXACT.round() as u32;
            if wav.sample_rate.abs_diff(engine_rate) > 100 {
                tracing::warn!(
                    file_rate = wav.sample_rate,
                    engine_rate,
                    "WAV sample rate differs from the engine rate; pitch and timing will shift"
                );
            }
            tracing::info!(
                path = %path.display(),
                samples = wav.samples.len(),
                channels = wav.channels,
                "microphone from WAV"
            );
            Ok(BlockSource::new(wav.samples.into_iter()))
        }
        &SourceSpec::Tone {
            hz,
            amplitude,
            seconds,
        } => {
            tracing::info!(hz, amplitude, seconds, "microphone from sine tone");
            Ok(BlockSource::new(Tone::new(
                hz,
                amplitude,
                seconds,
                AUDIO_SAMPLE_RATE_EXACT,
            )))
        }
    }
}

fn open_sink(settings: &Settings) -> Result<StreamSink> {
    let sink = match &settings.output {
        OutputSpec::Stdout => StreamSink::stdout(),
        OutputSpec::File(path) => StreamSink::create(path)?,
    };
    match &settings.wav_out {
        Some(path) => sink.with_capture(path),
        None => Ok(sink),
    }
}

fn open_control(spec: Option<&CommandSpec>) -> Result<ScheduledLines> {
    let queue = Arc::new(LineQueue::new());
    let closed = Arc::new(AtomicBool::new(false));
    match spec {
        None => return Ok(ScheduledLines::disconnected()),
        Some(CommandSpec::Stdin) => {
            spawn_reader(std::io::stdin(), Arc::clone(&queue), Arc::clone(&closed))?;
        }
        Some(CommandSpec::Script(path)) => {
            spawn_reader(File::open(path)?, Arc::clone(&queue), Arc::clone(&closed))?;
        }
    }
    Ok(ScheduledLines::new(queue, closed))
}

/// Run until the source is exhausted or `running` is cleared.
pub fn run(settings: &Settings, running: &AtomicBool) -> Result<Summary> {
    if !settings.link_keeps_up() {
        tracing::warn!(
            baud = settings.baud,
            "link slower than the audio byte rate; blocks will be delayed"
        );
    }

    let mut source = open_source(&settings.source)?;
    let mut sink = open_sink(settings)?;
    let mut control = open_control(settings.commands.as_ref())?;
    let scripted = matches!(settings.commands, Some(CommandSpec::Script(_)));

    let mut engine = EffectsEngine::new(settings.variant);
    tracing::info!(variant = %settings.variant, "engine ready");
    if let Some(preset) = settings.preset {
        let outcome = engine.apply_command(preset.command());
        tracing::info!(preset = preset.label(), ?outcome, "preset");
    }

    let period = Duration::from_secs_f32(block_duration_secs(AUDIO_SAMPLE_RATE_EXACT));
    let mut deadline = Instant::now();
    let mut interrupted = false;

    while !source.is_exhausted() {
        if !running.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }

        // Lines poll after this tick's block, so `@N` lands before block N + 1.
        control.set_clock(engine.stats().blocks_processed + 1);
        if scripted {
            control.wait_for_input();
        }

        let tick = engine
            .tick(&mut source, &mut control, &mut sink)
            .map_err(|err| match err {
                EngineError::Transport(e) => e,
            })?;

        match tick.command {
            Some(Outcome::Applied(cmd)) => tracing::info!(%cmd, "applied"),
            Some(Outcome::Rejected(cmd)) => tracing::warn!(%cmd, "rejected"),
            Some(Outcome::Ignored) => tracing::debug!("unrecognised line ignored"),
            None => {}
        }

        let blocks = engine.stats().blocks_processed;
        if tick.processed && blocks % REPORT_INTERVAL == 0 {
            tracing::debug!(
                blocks,
                bytes = sink.bytes_written(),
                input_peak = engine.input_peak(),
                "progress"
            );
        }

        if settings.realtime {
            deadline += period;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
    }

    if control.pending() {
        tracing::warn!("input ended before every scheduled command was released");
    }

    Ok(Summary {
        stats: engine.stats(),
        input_peak: engine.input_peak(),
        bytes_written: sink.finish()?,
        interrupted,
    })
}
