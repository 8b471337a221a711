// Audio module - playback core and cpal stream

pub mod engine;

pub use engine::{AudioEngine, AudioEngineError, PlaybackEngine};
