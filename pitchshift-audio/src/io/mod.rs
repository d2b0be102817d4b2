//! Pipeline entry/exit stages and the byte transport.
//!
//! | Item | Inputs | Outputs | Role |
//! |------|--------|---------|------|
//! | [`AudioPlayQueue`] | 0 | 1 | Incoming microphone blocks → graph |
//! | [`AudioRecordQueue`] | 1 | 0 | Graph → outgoing blocks |
//! | [`TransportSink`] | | | Encoded blocks → host |
//!
//! [`spsc`] is the lock-free ring both queues (and the host's command
//! reader) are built on.

pub mod play_queue;
pub mod record_queue;
pub mod spsc;
pub mod transport;

pub use play_queue::AudioPlayQueue;
pub use record_queue::AudioRecordQueue;
pub use spsc::SpscQueue;
pub use transport::{decode_block, encode_block, TransportSink};
