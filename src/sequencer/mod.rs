// Sequencer module - musical time, patterns, arrangement, scheduling

pub mod arrangement;
pub mod maps;
pub mod pattern;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use arrangement::{Region, RegionType, StretchMode, Track};
pub use maps::{MeterChange, MeterMap, TempoChange, TempoMap};
pub use pattern::{Pattern, PatternLibrary, StepNote};
pub use scheduler::{CompiledEvent, Scheduler};
pub use timeline::{MusicalPosition, Tick, TimeSignature, PPQ};
pub use transport::{Transport, TransportState};
