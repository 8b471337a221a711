// Scheduler - Compiles a tick window into ordered trigger events
// Two sources: a single looping pattern, or the project timeline.
// Windows are half-open [start_tick, end_tick) so that contiguous
// queries never emit an event twice and never skip one.

use crate::project::Project;
use crate::sequencer::pattern::Pattern;
use crate::sequencer::timeline::Tick;

/// A compiled trigger: the scheduler's output, the sampler's input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompiledEvent {
    pub tick: Tick,
    pub instrument_id: i32,
    pub velocity: f32,
}

/// Generates sample triggers from the timeline arrangement or from a
/// single looping pattern. Setting one source clears the other.
#[derive(Debug)]
pub struct Scheduler {
    timeline: bool,
    pattern: Option<Pattern>,
    loop_length_ticks: Tick,
    looping: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            timeline: false,
            pattern: None,
            loop_length_ticks: 0,
            looping: true,
        }
    }

    /// Bind the project timeline as the event source.
    pub fn set_timeline(&mut self) {
        self.timeline = true;
        self.pattern = None;
    }

    /// Bind a single pattern as the event source. The loop length
    /// defaults to the pattern length if none was set.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        if self.loop_length_ticks == 0 {
            self.loop_length_ticks = pattern.length_ticks();
        }
        self.pattern = Some(pattern);
        self.timeline = false;
    }

    pub fn set_loop_length(&mut self, ticks: Tick) {
        self.loop_length_ticks = ticks;
    }

    pub fn set_looping(&mut self, enabled: bool) {
        self.looping = enabled;
    }

    /// Drop both sources; subsequent queries return nothing.
    pub fn clear(&mut self) {
        self.timeline = false;
        self.pattern = None;
    }

    pub fn is_active(&self) -> bool {
        self.timeline || self.pattern.is_some()
    }

    /// Events whose tick lies in [start_tick, end_tick), sorted
    /// ascending by tick.
    pub fn events_in_range(
        &self,
        project: &Project,
        start_tick: Tick,
        end_tick: Tick,
    ) -> Vec<CompiledEvent> {
        if self.timeline {
            return self.events_from_timeline(project, start_tick, end_tick);
        }
        if let Some(pattern) = &self.pattern {
            return self.events_from_single_pattern(pattern, start_tick, end_tick);
        }
        Vec::new()
    }

    fn events_from_timeline(
        &self,
        project: &Project,
        start_tick: Tick,
        end_tick: Tick,
    ) -> Vec<CompiledEvent> {
        let mut events = Vec::new();

        for track in project.tracks() {
            for region in track.regions_in_range(start_tick, end_tick) {
                let Some(pattern) = project.pattern_library().get(region.pattern_id()) else {
                    // Missing pattern reference: the region is skipped
                    continue;
                };

                let region_start = region.start_tick();
                let region_end = region.end_tick();
                let pattern_length = pattern.length_ticks();
                if pattern_length <= 0 {
                    continue;
                }

                // Whole-copy repetitions covering the region, the last
                // possibly partial and clipped at the region end
                let num_repeats =
                    (region.length_ticks() + pattern_length - 1) / pattern_length;

                for rep in 0..num_repeats {
                    let repeat_start = region_start + rep * pattern_length;
                    let repeat_end = repeat_start + pattern_length;
                    if repeat_end <= start_tick || repeat_start >= end_tick {
                        continue;
                    }

                    for note in pattern.notes() {
                        let event_tick = repeat_start + note.offset_tick;
                        if event_tick >= start_tick
                            && event_tick < end_tick
                            && event_tick >= region_start
                            && event_tick < region_end
                        {
                            events.push(CompiledEvent {
                                tick: event_tick,
                                instrument_id: note.instrument_id,
                                velocity: note.velocity,
                            });
                        }
                    }
                }
            }
        }

        events.sort_by_key(|e| e.tick);
        events
    }

    fn events_from_single_pattern(
        &self,
        pattern: &Pattern,
        start_tick: Tick,
        end_tick: Tick,
    ) -> Vec<CompiledEvent> {
        let mut events = Vec::new();

        if pattern.is_empty() || self.loop_length_ticks <= 0 {
            return events;
        }

        if self.looping {
            let loop_length = self.loop_length_ticks;
            let first_loop = start_tick.div_euclid(loop_length) * loop_length;

            let mut loop_start = first_loop;
            while loop_start < end_tick {
                for note in pattern.notes() {
                    let event_tick = loop_start + note.offset_tick;
                    if event_tick >= start_tick && event_tick < end_tick {
                        events.push(CompiledEvent {
                            tick: event_tick,
                            instrument_id: note.instrument_id,
                            velocity: note.velocity,
                        });
                    }
                }
                loop_start += loop_length;
            }
        } else {
            // One-shot: the pattern plays once at tick 0
            for note in pattern.notes() {
                if note.offset_tick >= start_tick && note.offset_tick < end_tick {
                    events.push(CompiledEvent {
                        tick: note.offset_tick,
                        instrument_id: note.instrument_id,
                        velocity: note.velocity,
                    });
                }
            }
        }

        events.sort_by_key(|e| e.tick);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::arrangement::{Region, RegionType, Track};
    use crate::sequencer::pattern::StepNote;

    fn four_on_the_floor() -> Pattern {
        let mut pattern = Pattern::new("kick4", "Four on the Floor", 3840);
        for beat in 0..4 {
            pattern.add_note(StepNote::new(0, beat * 960, 0.9));
        }
        pattern
    }

    fn scheduler_with_pattern(pattern: Pattern) -> Scheduler {
        let mut scheduler = Scheduler::new();
        scheduler.set_loop_length(pattern.length_ticks());
        scheduler.set_looping(true);
        scheduler.set_pattern(pattern);
        scheduler
    }

    #[test]
    fn test_inactive_scheduler_returns_nothing() {
        let scheduler = Scheduler::new();
        let project = Project::default();
        assert!(scheduler.events_in_range(&project, 0, 100_000).is_empty());
    }

    #[test]
    fn test_single_pattern_loops() {
        let scheduler = scheduler_with_pattern(four_on_the_floor());
        let project = Project::default();

        // Two full loops
        let events = scheduler.events_in_range(&project, 0, 7680);
        assert_eq!(events.len(), 8);
        assert_eq!(events[0].tick, 0);
        assert_eq!(events[4].tick, 3840);
        assert_eq!(events[7].tick, 3840 + 2880);
    }

    #[test]
    fn test_window_straddles_loop_boundary() {
        let scheduler = scheduler_with_pattern(four_on_the_floor());
        let project = Project::default();

        let events = scheduler.events_in_range(&project, 3000, 4000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 3840);
    }

    #[test]
    fn test_one_shot_plays_once() {
        let mut scheduler = scheduler_with_pattern(four_on_the_floor());
        scheduler.set_looping(false);
        let project = Project::default();

        let events = scheduler.events_in_range(&project, 0, 100_000);
        assert_eq!(events.len(), 4);
        assert_eq!(events.last().unwrap().tick, 2880);
    }

    #[test]
    fn test_no_double_emit_across_adjacent_windows() {
        let scheduler = scheduler_with_pattern(four_on_the_floor());
        let project = Project::default();

        let first = scheduler.events_in_range(&project, 0, 960);
        let second = scheduler.events_in_range(&project, 960, 1920);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].tick, 0);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].tick, 960);
    }

    #[test]
    fn test_window_monotonicity() {
        // [a,b) followed by [b,c) equals [a,c), same order
        let scheduler = scheduler_with_pattern(four_on_the_floor());
        let project = Project::default();

        let (a, b, c) = (100, 4200, 9000);
        let mut split = scheduler.events_in_range(&project, a, b);
        split.extend(scheduler.events_in_range(&project, b, c));
        let whole = scheduler.events_in_range(&project, a, c);

        assert_eq!(split, whole);
    }

    fn timeline_project() -> Project {
        let mut project = Project::new("Timeline Test");
        project.pattern_library_mut().add_pattern(four_on_the_floor());

        let mut track = Track::new("t1", "Drums");
        let mut region = Region::new("r1", RegionType::Groove, 3840, 2 * 3840);
        region.set_pattern_id("kick4");
        track.add_region(region);
        project.add_track(track);
        project
    }

    #[test]
    fn test_timeline_repeats_pattern_inside_region() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline();
        let project = timeline_project();

        let events = scheduler.events_in_range(&project, 0, 100_000);
        assert_eq!(events.len(), 8); // two repetitions of four kicks
        assert_eq!(events[0].tick, 3840);
        assert_eq!(events[7].tick, 3840 + 3840 + 2880);
    }

    #[test]
    fn test_timeline_clips_trailing_partial_repetition() {
        let mut project = Project::new("Clip Test");
        project.pattern_library_mut().add_pattern(four_on_the_floor());

        // Region covers one and a half pattern lengths
        let mut track = Track::new("t1", "Drums");
        let mut region = Region::new("r1", RegionType::Groove, 0, 3840 + 1920);
        region.set_pattern_id("kick4");
        track.add_region(region);
        project.add_track(track);

        let mut scheduler = Scheduler::new();
        scheduler.set_timeline();

        let events = scheduler.events_in_range(&project, 0, 100_000);
        // Full repetition (4) plus the clipped half (beats at 3840, 4800)
        assert_eq!(events.len(), 6);
        assert_eq!(events.last().unwrap().tick, 4800);
    }

    #[test]
    fn test_timeline_skips_missing_pattern() {
        let mut project = Project::new("Missing Pattern");
        let mut track = Track::new("t1", "Drums");
        let mut region = Region::new("r1", RegionType::Groove, 0, 3840);
        region.set_pattern_id("nonexistent");
        track.add_region(region);
        project.add_track(track);

        let mut scheduler = Scheduler::new();
        scheduler.set_timeline();

        assert!(scheduler.events_in_range(&project, 0, 100_000).is_empty());
    }

    #[test]
    fn test_events_sorted_across_tracks() {
        let mut project = Project::new("Two Tracks");
        project.pattern_library_mut().add_pattern(four_on_the_floor());

        let mut offbeat = Pattern::new("offbeat", "Offbeat", 3840);
        for beat in 0..4 {
            offbeat.add_note(StepNote::new(1, beat * 960 + 480, 0.6));
        }
        project.pattern_library_mut().add_pattern(offbeat);

        for (track_id, pattern_id) in [("t1", "kick4"), ("t2", "offbeat")] {
            let mut track = Track::new(track_id, track_id);
            let mut region = Region::new(format!("r-{track_id}"), RegionType::Groove, 0, 3840);
            region.set_pattern_id(pattern_id);
            track.add_region(region);
            project.add_track(track);
        }

        let mut scheduler = Scheduler::new();
        scheduler.set_timeline();

        let events = scheduler.events_in_range(&project, 0, 3840);
        let ticks: Vec<Tick> = events.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 960, 1440, 1920, 2400, 2880, 3360]);
    }

    #[test]
    fn test_setting_one_source_clears_the_other() {
        let mut scheduler = Scheduler::new();
        scheduler.set_timeline();
        assert!(scheduler.is_active());

        scheduler.set_pattern(four_on_the_floor());
        let project = timeline_project();
        // Timeline region starts at 3840; single-pattern mode emits at 0
        let events = scheduler.events_in_range(&project, 0, 960);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tick, 0);

        scheduler.set_timeline();
        let events = scheduler.events_in_range(&project, 0, 960);
        assert!(events.is_empty());

        scheduler.clear();
        assert!(!scheduler.is_active());
    }
}
