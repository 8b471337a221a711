// Tempo and meter maps - piecewise-constant change points indexed by tick
// The value at any tick is the most recent change at or before it.

use crate::sequencer::timeline::{ticks_per_bar, Tick, TimeSignature};

const DEFAULT_BPM: f64 = 120.0;

/// A tempo change point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub at_tick: Tick,
    pub bpm: f64,
}

/// Piecewise-constant tempo indexed by tick.
/// Always seeded with an entry at tick 0 (120 BPM).
#[derive(Debug, Clone)]
pub struct TempoMap {
    changes: Vec<TempoChange>,
}

impl TempoMap {
    pub fn new() -> Self {
        Self::with_bpm(DEFAULT_BPM)
    }

    pub fn with_bpm(initial_bpm: f64) -> Self {
        Self {
            changes: vec![TempoChange {
                at_tick: 0,
                bpm: initial_bpm,
            }],
        }
    }

    /// Add a tempo change. An existing change at the same tick is replaced.
    pub fn add_change(&mut self, at_tick: Tick, bpm: f64) {
        self.remove_change_at(at_tick);
        self.changes.push(TempoChange { at_tick, bpm });
        self.changes.sort_by_key(|c| c.at_tick);
    }

    pub fn remove_change_at(&mut self, tick: Tick) {
        self.changes.retain(|c| c.at_tick != tick);
    }

    /// BPM at the given tick: the last change at or before it.
    pub fn bpm_at(&self, tick: Tick) -> f64 {
        let mut bpm = match self.changes.first() {
            Some(first) => first.bpm,
            None => return DEFAULT_BPM,
        };
        for change in &self.changes {
            if change.at_tick <= tick {
                bpm = change.bpm;
            } else {
                break;
            }
        }
        bpm
    }

    /// Drop every change point. Queries fall back to the default tempo.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Replace all changes with a single constant tempo from tick 0.
    pub fn set_constant(&mut self, bpm: f64) {
        self.changes.clear();
        self.changes.push(TempoChange { at_tick: 0, bpm });
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new()
    }
}

/// A meter change point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterChange {
    pub at_tick: Tick,
    pub signature: TimeSignature,
}

/// Piecewise-constant meter indexed by tick.
/// Always seeded with an entry at tick 0 (4/4).
#[derive(Debug, Clone)]
pub struct MeterMap {
    changes: Vec<MeterChange>,
}

impl MeterMap {
    pub fn new() -> Self {
        Self::with_signature(TimeSignature::four_four())
    }

    pub fn with_signature(initial: TimeSignature) -> Self {
        Self {
            changes: vec![MeterChange {
                at_tick: 0,
                signature: initial,
            }],
        }
    }

    /// Add a meter change. An existing change at the same tick is replaced.
    pub fn add_change(&mut self, at_tick: Tick, signature: TimeSignature) {
        self.remove_change_at(at_tick);
        self.changes.push(MeterChange { at_tick, signature });
        self.changes.sort_by_key(|c| c.at_tick);
    }

    pub fn remove_change_at(&mut self, tick: Tick) {
        self.changes.retain(|c| c.at_tick != tick);
    }

    /// Time signature at the given tick: the last change at or before it.
    pub fn signature_at(&self, tick: Tick) -> TimeSignature {
        let mut sig = match self.changes.first() {
            Some(first) => first.signature,
            None => return TimeSignature::default(),
        };
        for change in &self.changes {
            if change.at_tick <= tick {
                sig = change.signature;
            } else {
                break;
            }
        }
        sig
    }

    /// Start tick of the bar containing `tick` under the prevailing
    /// meter segment. Bars are anchored at each segment's start.
    pub fn bar_start_at(&self, tick: Tick) -> Tick {
        if self.changes.is_empty() {
            let bar_length = ticks_per_bar(TimeSignature::default());
            return tick.div_euclid(bar_length) * bar_length;
        }

        for (i, change) in self.changes.iter().enumerate() {
            let range_start = change.at_tick;
            let range_end = self
                .changes
                .get(i + 1)
                .map(|next| next.at_tick)
                .unwrap_or(tick + 1);

            if tick < range_start {
                break;
            }
            if tick < range_end {
                let bar_length = ticks_per_bar(change.signature);
                let offset_in_segment = tick - range_start;
                return range_start + (offset_in_segment / bar_length) * bar_length;
            }
        }

        // Before the first change point: grid of the default signature
        let bar_length = ticks_per_bar(TimeSignature::default());
        tick.div_euclid(bar_length) * bar_length
    }

    /// Global zero-based bar index at `tick`, counting fully elapsed
    /// bars in every segment. A partial bar left at a segment boundary
    /// counts as zero; the next segment restarts its bar grid.
    pub fn bar_index_at(&self, tick: Tick) -> i64 {
        if self.changes.is_empty() {
            let bar_length = ticks_per_bar(TimeSignature::default());
            return tick.div_euclid(bar_length);
        }

        let mut bars = 0i64;
        for (i, change) in self.changes.iter().enumerate() {
            let range_start = change.at_tick;
            let range_end = self
                .changes
                .get(i + 1)
                .map(|next| next.at_tick)
                .unwrap_or(tick + 1);

            if tick < range_start {
                break;
            }

            let bar_length = ticks_per_bar(change.signature);
            let effective_end = tick.min(range_end);
            bars += (effective_end - range_start) / bar_length;

            if tick < range_end {
                break;
            }
        }
        bars
    }

    /// Replace all changes with a single constant meter from tick 0.
    pub fn set_constant(&mut self, signature: TimeSignature) {
        self.changes.clear();
        self.changes.push(MeterChange {
            at_tick: 0,
            signature,
        });
    }

    /// Drop every change point. Queries fall back to 4/4.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn changes(&self) -> &[MeterChange] {
        &self.changes
    }
}

impl Default for MeterMap {
    fn default() -> Self {
        Self::new()
    }
}
