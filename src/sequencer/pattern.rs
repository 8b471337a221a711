// Pattern - Reusable note sequences
// A pattern holds step notes inside a local tick window [0, length_ticks),
// like a drum machine "clip". Regions on the timeline reference patterns
// by id.

use crate::sequencer::timeline::{Tick, PPQ};
use serde::{Deserialize, Serialize};

/// A note hit within a pattern. `offset_tick` is relative to the
/// pattern origin; velocity and probability are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNote {
    pub instrument_id: i32,
    pub offset_tick: Tick,
    pub velocity: f32,
    #[serde(default = "default_probability")]
    pub probability: f32,
}

fn default_probability() -> f32 {
    1.0
}

impl StepNote {
    pub fn new(instrument_id: i32, offset_tick: Tick, velocity: f32) -> Self {
        Self {
            instrument_id,
            offset_tick,
            velocity,
            probability: 1.0,
        }
    }
}

impl Default for StepNote {
    fn default() -> Self {
        Self {
            instrument_id: 0,
            offset_tick: 0,
            velocity: 0.8,
            probability: 1.0,
        }
    }
}

/// A reusable sequence of note events.
///
/// Notes are kept sorted ascending by `offset_tick`; notes at the same
/// offset on different instruments are permitted.
#[derive(Debug, Clone)]
pub struct Pattern {
    id: String,
    pub name: String,
    length_ticks: Tick,
    notes: Vec<StepNote>,
}

impl Pattern {
    pub fn new(id: impl Into<String>, name: impl Into<String>, length_ticks: Tick) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            length_ticks,
            notes: Vec::new(),
        }
    }

    /// A one-bar 4/4 pattern.
    pub fn one_bar(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, PPQ * 4)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn length_ticks(&self) -> Tick {
        self.length_ticks
    }

    pub fn set_length_ticks(&mut self, ticks: Tick) {
        self.length_ticks = ticks;
    }

    pub fn notes(&self) -> &[StepNote] {
        &self.notes
    }

    /// Insert a note, keeping the list sorted by offset. Notes at equal
    /// offsets preserve insertion order.
    pub fn add_note(&mut self, note: StepNote) {
        let insert_pos = self
            .notes
            .partition_point(|n| n.offset_tick <= note.offset_tick);
        self.notes.insert(insert_pos, note);
    }

    pub fn remove_note(&mut self, index: usize) {
        if index < self.notes.len() {
            self.notes.remove(index);
        }
    }

    pub fn clear_notes(&mut self) {
        self.notes.clear();
    }

    /// All notes at exactly this tick (multiple instruments allowed).
    pub fn notes_at(&self, tick: Tick) -> Vec<StepNote> {
        self.notes
            .iter()
            .filter(|n| n.offset_tick == tick)
            .copied()
            .collect()
    }

    pub fn notes_for_instrument(&self, instrument_id: i32) -> Vec<StepNote> {
        self.notes
            .iter()
            .filter(|n| n.instrument_id == instrument_id)
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Pattern library: id -> pattern. Adding an existing id replaces the
/// prior entry.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&mut self, pattern: Pattern) {
        self.remove_pattern(pattern.id());
        self.patterns.push(pattern);
    }

    pub fn remove_pattern(&mut self, id: &str) {
        self.patterns.retain(|p| p.id() != id);
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Pattern> {
        self.patterns.iter_mut().find(|p| p.id() == id)
    }

    pub fn has_pattern(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}
