// Timeline - Musical time representation
// All musical durations are expressed in ticks so tempo may change
// without rewriting positions. This module is the only place where
// floating-point time math occurs.

use std::fmt;

/// Musical time in ticks.
pub type Tick = i64;

/// Pulses (ticks) per quarter note. Fixed resolution for the whole engine.
pub const PPQ: Tick = 960;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,   // Beats per bar
    pub denominator: u32, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(numerator: u32, denominator: u32) -> Self {
        assert!(numerator > 0, "Time signature numerator must be > 0");
        assert!(
            denominator.is_power_of_two(),
            "Time signature denominator must be power of 2"
        );
        Self {
            numerator,
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::new(6, 8)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Position in musical time, derived from an absolute tick under one meter.
/// Bar and beat are zero-based; `tick` is the remainder within the beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MusicalPosition {
    pub bar: i64,
    pub beat: i64,
    pub tick: Tick,
}

impl fmt::Display for MusicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Displayed 1-based, the way musicians count
        write!(f, "{}:{}:{:03}", self.bar + 1, self.beat + 1, self.tick)
    }
}

/// Ticks in one bar for a given time signature.
/// For 4/4: (4/4) * 4 * 960 = 3840. For 3/4: 2880.
pub fn ticks_per_bar(ts: TimeSignature) -> Tick {
    (ts.numerator as Tick * 4 * PPQ) / ts.denominator as Tick
}

/// Ticks in one beat for a given time signature.
/// The beat is defined by the denominator: x/4 time = quarter = PPQ,
/// x/8 time = eighth = PPQ/2.
pub fn ticks_per_beat(ts: TimeSignature) -> Tick {
    (4 * PPQ) / ts.denominator as Tick
}

/// Decompose an absolute tick into bar:beat:tick under one meter.
pub fn tick_to_position(tick: Tick, ts: TimeSignature) -> MusicalPosition {
    let bar_length = ticks_per_bar(ts);
    let beat_length = ticks_per_beat(ts);

    let bar = tick.div_euclid(bar_length);
    let remainder = tick.rem_euclid(bar_length);

    MusicalPosition {
        bar,
        beat: remainder / beat_length,
        tick: remainder % beat_length,
    }
}

/// Convert bar:beat:tick back to an absolute tick under one meter.
pub fn position_to_tick(pos: MusicalPosition, ts: TimeSignature) -> Tick {
    pos.bar * ticks_per_bar(ts) + pos.beat * ticks_per_beat(ts) + pos.tick
}

/// Snap a tick to the nearest bar boundary. The exact midpoint rounds up.
pub fn snap_to_bar(tick: Tick, ts: TimeSignature) -> Tick {
    snap_to_multiple(tick, ticks_per_bar(ts))
}

/// Snap a tick to the nearest beat. The exact midpoint rounds up.
pub fn snap_to_beat(tick: Tick, ts: TimeSignature) -> Tick {
    snap_to_multiple(tick, ticks_per_beat(ts))
}

/// Snap a tick to a grid subdivision of the quarter note
/// (1 = quarter, 2 = eighth, 4 = sixteenth, ...).
pub fn snap_to_grid(tick: Tick, subdivision: Tick) -> Tick {
    snap_to_multiple(tick, PPQ / subdivision)
}

fn snap_to_multiple(tick: Tick, grid: Tick) -> Tick {
    let remainder = tick.rem_euclid(grid);
    if remainder < grid - remainder {
        tick - remainder
    } else {
        tick + (grid - remainder)
    }
}

/// Frames per tick at a fixed tempo.
/// One quarter note takes (60 / bpm) seconds and spans PPQ ticks.
pub fn frames_per_tick(bpm: f64, sample_rate: u32) -> f64 {
    (sample_rate as f64 * 60.0) / (bpm * PPQ as f64)
}

/// Convert ticks to frames at a fixed tempo, rounding to the nearest frame.
/// Negative tick positions clamp to frame 0.
pub fn ticks_to_frames(ticks: Tick, bpm: f64, sample_rate: u32) -> u64 {
    let frames = ticks as f64 * frames_per_tick(bpm, sample_rate);
    frames.round().max(0.0) as u64
}

/// Convert frames to ticks at a fixed tempo, rounding to the nearest tick.
pub fn frames_to_ticks(frames: u64, bpm: f64, sample_rate: u32) -> Tick {
    (frames as f64 / frames_per_tick(bpm, sample_rate)).round() as Tick
}
