// Project persistence - format v1
// A hierarchical JSON document: patterns, tracks/regions, instruments
// and meter changes. Loading parses the whole document before touching
// the target project, so a malformed file leaves it unchanged. Loading
// into a non-empty project appends rather than replaces.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::project::{Instrument, Project};
use crate::sequencer::arrangement::{Region, RegionType, Track};
use crate::sequencer::pattern::{Pattern, StepNote};
use crate::sequencer::timeline::{Tick, TimeSignature};

/// The only format version this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported project version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid region type: {0}")]
    InvalidRegionType(i32),

    #[error("invalid time signature: {0}/{1}")]
    InvalidTimeSignature(u32, u32),

    #[error("invalid region length: {0}")]
    InvalidRegionLength(Tick),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocument {
    #[serde(default)]
    version: u32,
    name: String,
    patterns: Vec<PatternDocument>,
    tracks: Vec<TrackDocument>,
    instruments: Vec<InstrumentDocument>,
    meter_changes: Vec<MeterChangeDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternDocument {
    id: String,
    name: String,
    length_ticks: Tick,
    notes: Vec<StepNote>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackDocument {
    id: String,
    name: String,
    regions: Vec<RegionDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionDocument {
    id: String,
    #[serde(rename = "type")]
    region_type: i32,
    start_tick: Tick,
    length_ticks: Tick,
    pattern_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentDocument {
    id: i32,
    name: String,
    gain: f32,
    pan: f32,
    sample_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeterChangeDocument {
    tick: Tick,
    numerator: u32,
    denominator: u32,
}

fn region_type_to_int(kind: RegionType) -> i32 {
    match kind {
        RegionType::Groove => 0,
        RegionType::Fill => 1,
        RegionType::Signature => 2,
        RegionType::Tempo => 3,
    }
}

fn region_type_from_int(value: i32) -> Result<RegionType, ProjectError> {
    match value {
        0 => Ok(RegionType::Groove),
        1 => Ok(RegionType::Fill),
        2 => Ok(RegionType::Signature),
        3 => Ok(RegionType::Tempo),
        other => Err(ProjectError::InvalidRegionType(other)),
    }
}

fn document_from_project(project: &Project) -> ProjectDocument {
    ProjectDocument {
        version: FORMAT_VERSION,
        name: project.name().to_string(),
        patterns: project
            .pattern_library()
            .patterns()
            .iter()
            .map(|pattern| PatternDocument {
                id: pattern.id().to_string(),
                name: pattern.name.clone(),
                length_ticks: pattern.length_ticks(),
                notes: pattern.notes().to_vec(),
            })
            .collect(),
        tracks: project
            .tracks()
            .iter()
            .map(|track| TrackDocument {
                id: track.id().to_string(),
                name: track.name.clone(),
                regions: track
                    .regions()
                    .iter()
                    .map(|region| RegionDocument {
                        id: region.id().to_string(),
                        region_type: region_type_to_int(region.kind),
                        start_tick: region.start_tick(),
                        length_ticks: region.length_ticks(),
                        pattern_id: region.pattern_id().to_string(),
                    })
                    .collect(),
            })
            .collect(),
        instruments: project
            .instrument_rack()
            .instruments()
            .iter()
            .map(|instrument| InstrumentDocument {
                id: instrument.id,
                name: instrument.name.clone(),
                gain: instrument.gain,
                pan: instrument.pan,
                sample_path: instrument.sample_path.clone(),
            })
            .collect(),
        meter_changes: project
            .meter_map()
            .changes()
            .iter()
            .map(|change| MeterChangeDocument {
                tick: change.at_tick,
                numerator: change.signature.numerator,
                denominator: change.signature.denominator,
            })
            .collect(),
    }
}

fn apply_document(project: &mut Project, document: ProjectDocument) -> Result<(), ProjectError> {
    // Validate everything fallible up front so the project stays
    // untouched on failure
    let mut tracks = Vec::with_capacity(document.tracks.len());
    for track_doc in document.tracks {
        let mut track = Track::new(track_doc.id, track_doc.name);
        for region_doc in track_doc.regions {
            if region_doc.length_ticks <= 0 {
                return Err(ProjectError::InvalidRegionLength(region_doc.length_ticks));
            }
            let mut region = Region::new(
                region_doc.id,
                region_type_from_int(region_doc.region_type)?,
                region_doc.start_tick,
                region_doc.length_ticks,
            );
            region.set_pattern_id(region_doc.pattern_id);
            track.add_region(region);
        }
        tracks.push(track);
    }

    let mut meter_changes = Vec::with_capacity(document.meter_changes.len());
    for change in document.meter_changes {
        if change.numerator == 0 || !change.denominator.is_power_of_two() {
            return Err(ProjectError::InvalidTimeSignature(
                change.numerator,
                change.denominator,
            ));
        }
        meter_changes.push((
            change.tick,
            TimeSignature::new(change.numerator, change.denominator),
        ));
    }

    for pattern_doc in document.patterns {
        let mut pattern = Pattern::new(pattern_doc.id, pattern_doc.name, pattern_doc.length_ticks);
        for note in pattern_doc.notes {
            pattern.add_note(note);
        }
        project.pattern_library_mut().add_pattern(pattern);
    }

    for instrument_doc in document.instruments {
        let mut instrument = Instrument::new(instrument_doc.id, instrument_doc.name);
        instrument.gain = instrument_doc.gain;
        instrument.pan = instrument_doc.pan;
        instrument.sample_path = instrument_doc.sample_path;
        project.instrument_rack_mut().add_instrument(instrument);
    }

    for track in tracks {
        project.add_track(track);
    }

    for (tick, signature) in meter_changes {
        project.meter_map_mut().add_change(tick, signature);
    }

    project.touch();
    Ok(())
}

/// Save a project as a pretty-printed v1 JSON document.
pub fn save_to_file(project: &Project, path: &Path) -> Result<(), ProjectError> {
    let document = document_from_project(project);
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a v1 JSON document into a project. Content is appended to
/// whatever the project already holds.
pub fn load_from_file(project: &mut Project, path: &Path) -> Result<(), ProjectError> {
    let json = fs::read_to_string(path)?;
    let document: ProjectDocument = serde_json::from_str(&json)?;

    if document.version != FORMAT_VERSION {
        return Err(ProjectError::UnsupportedVersion(document.version));
    }

    apply_document(project, document)
}
