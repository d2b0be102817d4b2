/// Number of 16-bit samples per audio block.
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Number of bytes one block occupies on the transport (`i16` little-endian, no framing).
pub const BLOCK_BYTES: usize = AUDIO_BLOCK_SAMPLES * core::mem::size_of::<i16>();

/// Number of audio blocks in the global pool.
pub const POOL_SIZE: usize = 32;

/// Exact audio sample rate in Hz (matches Teensy hardware PLL configuration).
pub const AUDIO_SAMPLE_RATE_EXACT: f32 = 44_117.647;

/// Capacity of the granular engine's history ring, in samples.
pub const GRANULAR_MEMORY_SIZE: usize = 12_800;

/// Shortest grain the engine will synthesize, in samples.
pub const MIN_GRAIN_SAMPLES: usize = 16;

/// Longest grain the engine will synthesize, in samples.
///
/// One block of headroom stays free so every tap of the current block lies
/// inside retained history.
pub const MAX_GRAIN_SAMPLES: usize = GRANULAR_MEMORY_SIZE - AUDIO_BLOCK_SAMPLES;

/// Longest command line the control channel assembles, in bytes.
pub const SERIAL_BUFFER_SIZE: usize = 256;

/// Host link rate in bits per second (8N1 framing: 10 bits per byte).
pub const SERIAL_BAUD: u32 = 921_600;

/// Default playback-rate multiplier (unity pitch).
pub const DEFAULT_SPEED: f32 = 1.0;

/// Default grain window in milliseconds.
pub const DEFAULT_GRAIN_SIZE_MS: f32 = 50.0;

/// Default reverb room size.
pub const DEFAULT_ROOM_SIZE: f32 = 0.6;

/// Default reverb damping.
pub const DEFAULT_DAMPING: f32 = 0.5;

/// Grain size produced by `ROBOT 0`, in milliseconds.
pub const ROBOT_GRAIN_BASE_MS: f32 = 50.0;

/// Grain size added per unit of `ROBOT` amount, in milliseconds.
pub const ROBOT_GRAIN_SPAN_MS: f32 = 50.0;
