// Project - the top-level document containing all musical data
// Owns the tempo/meter maps, pattern library, instrument rack and
// tracks. A revision counter is bumped on edits so views can cheaply
// detect changes.

pub mod instrument;
pub mod serialization;

pub use instrument::{Instrument, InstrumentRack};
pub use serialization::ProjectError;

use crate::sequencer::arrangement::Track;
use crate::sequencer::maps::{MeterMap, TempoMap};
use crate::sequencer::pattern::PatternLibrary;
use crate::sequencer::timeline::TimeSignature;

#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    revision: u64,
    tempo_map: TempoMap,
    meter_map: MeterMap,
    patterns: PatternLibrary,
    instruments: InstrumentRack,
    tracks: Vec<Track>,
}

impl Project {
    /// An empty named project: 120 BPM, 4/4, no tracks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: 0,
            tempo_map: TempoMap::new(),
            meter_map: MeterMap::new(),
            patterns: PatternLibrary::new(),
            instruments: InstrumentRack::new(),
            tracks: Vec::new(),
        }
    }

    /// The startup project: one "Drums" track and a kick/snare/hi-hat rack.
    pub fn with_defaults() -> Self {
        let mut project = Self::new("Untitled");
        project.tracks.push(Track::new("track_0", "Drums"));
        project.instruments.add_instrument(Instrument::new(1, "Kick"));
        project.instruments.add_instrument(Instrument::new(2, "Snare"));
        project.instruments.add_instrument(Instrument::new(3, "Hi-Hat"));
        project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record that an edit happened. Callers mutating nested state
    /// through the `_mut` accessors call this themselves.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    pub fn tempo_map_mut(&mut self) -> &mut TempoMap {
        &mut self.tempo_map
    }

    pub fn meter_map(&self) -> &MeterMap {
        &self.meter_map
    }

    pub fn meter_map_mut(&mut self) -> &mut MeterMap {
        &mut self.meter_map
    }

    pub fn pattern_library(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn pattern_library_mut(&mut self) -> &mut PatternLibrary {
        &mut self.patterns
    }

    pub fn instrument_rack(&self) -> &InstrumentRack {
        &self.instruments
    }

    pub fn instrument_rack_mut(&mut self) -> &mut InstrumentRack {
        &mut self.instruments
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
        self.touch();
    }

    pub fn remove_track(&mut self, track_id: &str) {
        self.tracks.retain(|t| t.id() != track_id);
        self.touch();
    }

    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id() == track_id)
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_at_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Reset to an empty untitled project.
    pub fn clear(&mut self) {
        self.name = "Untitled".to_string();
        self.revision = 0;
        self.tempo_map.set_constant(120.0);
        self.meter_map.set_constant(TimeSignature::four_four());
        self.patterns.clear();
        self.instruments.clear();
        self.tracks.clear();
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_project_contents() {
        let project = Project::default();

        assert_eq!(project.name(), "Untitled");
        assert_eq!(project.track_count(), 1);
        assert_eq!(project.tracks()[0].name, "Drums");
        assert_eq!(project.instrument_rack().instruments().len(), 3);
        assert_eq!(project.tempo_map().bpm_at(0), 120.0);
        assert_eq!(
            project.meter_map().signature_at(0),
            TimeSignature::four_four()
        );
    }

    #[test]
    fn test_revision_bumps_on_edit() {
        let mut project = Project::default();
        let start = project.revision();

        project.add_track(Track::new("t2", "Percussion"));
        assert_eq!(project.revision(), start + 1);

        project.set_name("Renamed");
        assert_eq!(project.revision(), start + 2);

        project.remove_track("t2");
        assert_eq!(project.revision(), start + 3);
    }

    #[test]
    fn test_track_lookup() {
        let mut project = Project::default();
        assert!(project.track("track_0").is_some());
        assert!(project.track("missing").is_none());
        assert!(project.track_at(0).is_some());
        assert!(project.track_at(5).is_none());

        project.track_mut("track_0").unwrap().muted = true;
        assert!(project.track("track_0").unwrap().muted);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut project = Project::default();
        project.tempo_map_mut().add_change(3840, 90.0);
        project.add_track(Track::new("t2", "Extra"));

        project.clear();

        assert_eq!(project.revision(), 0);
        assert_eq!(project.track_count(), 0);
        assert!(project.instrument_rack().instruments().is_empty());
        assert_eq!(project.tempo_map().bpm_at(100_000), 120.0);
    }
}
