// Paradiddle - a sample-based drum machine engine
// Patterns of step notes, a timeline of regions, and a polyphonic
// sampler rendered through a real-time audio callback.

pub mod audio;
pub mod messaging;
pub mod project;
pub mod sampler;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::{AudioEngine, AudioEngineError, PlaybackEngine};
pub use messaging::{create_command_channel, create_notification_channel, Command, Notification};
pub use project::{Instrument, InstrumentRack, Project, ProjectError};
pub use sampler::{Sample, SampleLibrary, Sampler, MAX_VOICES};
pub use sequencer::{
    CompiledEvent, MeterMap, MusicalPosition, Pattern, PatternLibrary, Region, RegionType,
    Scheduler, StepNote, StretchMode, TempoMap, Tick, TimeSignature, Track, Transport,
    TransportState, PPQ,
};
