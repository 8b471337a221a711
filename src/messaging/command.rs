// Commands sent from the control thread to the audio callback

use crate::sequencer::timeline::Tick;

/// Transport-level controls that are safe to issue while the engine is
/// running. Structural edits (patterns, regions, instruments) are not
/// commands; they happen only while playback is stopped.
#[derive(Debug, Clone)]
pub enum Command {
    /// Loop a pattern from the library, starting at tick 0
    PlayPattern(String),
    /// Play the project timeline from tick 0
    PlayTimeline,
    /// Play the project timeline from a given tick
    PlayFromTick(Tick),
    /// Stop playback and silence all voices
    Stop,
    /// Seek the transport cursor
    Seek(Tick),
    /// Set the engine's internal tempo
    SetTempo(f64),
}
