// End-to-end playback scenarios driving the engine core block by block

use std::sync::Arc;

use paradiddle::sequencer::timeline::frames_to_ticks;
use paradiddle::{
    Command, Instrument, Pattern, PlaybackEngine, Project, Region, RegionType, Sample, Scheduler,
    StepNote, Track, MAX_VOICES,
};

const SR: u32 = 48000;
const BLOCK: usize = 512;
const BAR: i64 = 3840;

fn synthetic_sample(path: &str, frames: usize) -> Sample {
    Sample {
        data_left: vec![1.0; frames],
        data_right: vec![1.0; frames],
        sample_rate: SR,
        channels: 1,
        length_frames: frames as u64,
        path: path.to_string(),
    }
}

fn basic_groove() -> Pattern {
    let mut groove = Pattern::new("groove1", "Basic Groove", BAR);
    groove.add_note(StepNote::new(0, 0, 0.9));
    groove.add_note(StepNote::new(0, 1920, 0.85));
    groove.add_note(StepNote::new(1, 960, 0.8));
    groove.add_note(StepNote::new(1, 2880, 0.8));
    for k in 0..8 {
        groove.add_note(StepNote::new(2, k * 480, 0.6));
    }
    groove
}

fn snare_fill() -> Pattern {
    let mut fill = Pattern::new("fill1", "Snare Fill", BAR);
    for k in 0..16 {
        fill.add_note(StepNote::new(1, k * 240, 0.7));
    }
    fill
}

fn run_blocks(engine: &mut PlaybackEngine, blocks: usize) {
    let mut out_l = vec![0.0; BLOCK];
    let mut out_r = vec![0.0; BLOCK];
    for _ in 0..blocks {
        out_l.fill(0.0);
        out_r.fill(0.0);
        engine.process_block(&mut out_l, &mut out_r);
    }
}

#[test]
fn groove_and_fill_timeline_compiles_in_order() {
    // Three bars of groove followed by one bar of fill
    let mut project = Project::new("Arrangement");
    project.pattern_library_mut().add_pattern(basic_groove());
    project.pattern_library_mut().add_pattern(snare_fill());

    let mut track = Track::new("t1", "Drums");
    let mut groove_region = Region::new("groove", RegionType::Groove, 0, 3 * BAR);
    groove_region.set_pattern_id("groove1");
    let mut fill_region = Region::new("fill", RegionType::Fill, 3 * BAR, BAR);
    fill_region.set_pattern_id("fill1");
    assert!(!track.would_overlap(&groove_region));
    track.add_region(groove_region);
    assert!(!track.would_overlap(&fill_region));
    track.add_region(fill_region);
    project.add_track(track);

    let mut scheduler = Scheduler::new();
    scheduler.set_timeline();
    let events = scheduler.events_in_range(&project, 0, 4 * BAR);

    // Three groove repetitions (12 notes each) plus the 16-note fill
    assert_eq!(events.len(), 3 * 12 + 16);

    // Sorted ascending by tick
    assert!(events.windows(2).all(|w| w[0].tick <= w[1].tick));

    // Groove events cover exactly the first three bars
    let groove_events: Vec<_> = events.iter().filter(|e| e.tick < 3 * BAR).collect();
    assert_eq!(groove_events.len(), 36);
    for rep in 0..3 {
        let downbeat = events
            .iter()
            .find(|e| e.tick == rep * BAR && e.instrument_id == 0)
            .expect("groove downbeat kick");
        assert_eq!(downbeat.velocity, 0.9);
    }

    // Fill starts at bar 3 with sixteenth-note snares
    let fill_events: Vec<_> = events.iter().filter(|e| e.tick >= 3 * BAR).collect();
    assert_eq!(fill_events.len(), 16);
    assert!(fill_events.iter().all(|e| e.instrument_id == 1));
    assert_eq!(fill_events[0].tick, 3 * BAR);
    assert_eq!(fill_events[15].tick, 3 * BAR + 15 * 240);
}

#[test]
fn seek_while_rolling_emits_from_seek_target() {
    let mut project = Project::new("Seek");
    project
        .instrument_rack_mut()
        .add_instrument(Instrument::with_sample(0, "Kick", "mem/kick.wav"));

    // Kick at the downbeat, snare late in the bar: after 200 ms the
    // cursor sits between them
    let mut pattern = Pattern::new("p", "P", BAR);
    pattern.add_note(StepNote::new(0, 0, 0.9));
    pattern.add_note(StepNote::new(0, 2000, 0.9));
    project.pattern_library_mut().add_pattern(pattern);

    let mut engine = PlaybackEngine::new(project, SR);
    engine
        .sample_library_mut()
        .insert(synthetic_sample("mem/kick.wav", 1 << 20));
    engine.load_instrument_samples();

    engine.play_pattern("p");

    // ~200 ms at 48 kHz: cursor lands around tick 384 (frame 9728)
    run_blocks(&mut engine, 19);
    let cursor = engine.transport().state().tick;
    assert!(cursor > 0 && cursor < 2000, "cursor at {}", cursor);
    assert_eq!(engine.sampler().active_voice_count(), 1); // only the downbeat

    engine.apply_command(Command::Seek(0));

    // The next block emits from tick 0 again; the note at 2000 is not
    // emitted early (it was in the "skipped" range before the seek)
    run_blocks(&mut engine, 1);
    assert_eq!(engine.sampler().active_voice_count(), 2);
    assert_eq!(
        frames_to_ticks(engine.transport().state().frame, 120.0, SR),
        engine.transport().state().tick
    );

    // Play on until past tick 2000: exactly one more trigger
    run_blocks(&mut engine, 99);
    assert!(engine.transport().state().tick > 2000);
    assert_eq!(engine.sampler().active_voice_count(), 3);
}

#[test]
fn voice_pool_saturates_at_max_voices() {
    let mut project = Project::new("Saturation");
    project
        .instrument_rack_mut()
        .add_instrument(Instrument::with_sample(0, "Kick", "mem/kick.wav"));

    // 65 simultaneous kick hits in one callback
    let mut pattern = Pattern::new("burst", "Burst", BAR);
    for _ in 0..(MAX_VOICES + 1) {
        pattern.add_note(StepNote::new(0, 0, 0.9));
    }
    project.pattern_library_mut().add_pattern(pattern);

    let mut engine = PlaybackEngine::new(project, SR);
    engine
        .sample_library_mut()
        .insert(synthetic_sample("mem/kick.wav", 1 << 20));
    engine.load_instrument_samples();

    engine.play_pattern("burst");

    let mut out_l = vec![0.0; BLOCK];
    let mut out_r = vec![0.0; BLOCK];
    engine.process_block(&mut out_l, &mut out_r);

    // The 65th hit was dropped
    assert_eq!(engine.sampler().active_voice_count(), MAX_VOICES);
    assert_eq!(engine.sampler().dropped_note_count(), 1);

    // Output equals the sum of 64 voices at kick gain
    let expected = MAX_VOICES as f32 * 0.9;
    assert!((out_l[0] - expected).abs() < 1e-3);
    assert!((out_r[0] - expected).abs() < 1e-3);
}

#[test]
fn stereo_pan_law_through_the_engine() {
    let cases = [
        (0.0f32, 1.0f32, 1.0f32),  // centered: equal L/R
        (-1.0, 1.0, 0.0),          // hard left: R silent
        (1.0, 0.0, 1.0),           // hard right: L silent
        (-0.5, 1.0, 0.5),          // half left: R at half of L
    ];

    for (pan, expect_l, expect_r) in cases {
        let mut project = Project::new("Pan");
        let mut instrument = Instrument::with_sample(0, "Kick", "mem/kick.wav");
        instrument.pan = pan;
        project.instrument_rack_mut().add_instrument(instrument);

        let mut pattern = Pattern::new("hit", "Hit", BAR);
        pattern.add_note(StepNote::new(0, 0, 1.0));
        project.pattern_library_mut().add_pattern(pattern);

        let mut engine = PlaybackEngine::new(project, SR);
        engine
            .sample_library_mut()
            .insert(synthetic_sample("mem/kick.wav", 1 << 20));
        engine.load_instrument_samples();
        engine.play_pattern("hit");

        let mut out_l = vec![0.0; BLOCK];
        let mut out_r = vec![0.0; BLOCK];
        engine.process_block(&mut out_l, &mut out_r);

        assert!(
            (out_l[0] - expect_l).abs() < 1e-6,
            "pan {}: left was {}",
            pan,
            out_l[0]
        );
        assert!(
            (out_r[0] - expect_r).abs() < 1e-6,
            "pan {}: right was {}",
            pan,
            out_r[0]
        );
    }
}

#[test]
fn adjacent_callback_windows_never_double_fire() {
    let mut project = Project::new("Windows");
    project
        .instrument_rack_mut()
        .add_instrument(Instrument::with_sample(0, "Hat", "mem/hat.wav"));

    // Eighth-note hats across the bar
    let mut pattern = Pattern::new("hats", "Hats", BAR);
    for k in 0..8 {
        pattern.add_note(StepNote::new(0, k * 480, 0.6));
    }
    project.pattern_library_mut().add_pattern(pattern);

    let mut engine = PlaybackEngine::new(project, SR);
    engine
        .sample_library_mut()
        .insert(synthetic_sample("mem/hat.wav", 1 << 20));
    engine.load_instrument_samples();

    engine.play_pattern("hats");

    // Exactly one bar of audio (96000 frames) in odd-sized blocks so
    // window edges land on note ticks in many different ways
    let mut out_l = vec![0.0; 96000];
    let mut out_r = vec![0.0; 96000];
    let mut rendered = 0;
    for chunk in [511usize, 512, 513, 128, 1024].iter().cycle() {
        if rendered >= 96000 {
            break;
        }
        let n = (*chunk).min(96000 - rendered);
        engine.process_block(
            &mut out_l[rendered..rendered + n],
            &mut out_r[rendered..rendered + n],
        );
        rendered += n;
    }

    // 8 hats in the bar, every one fired exactly once
    assert_eq!(engine.sampler().active_voice_count(), 8);
    assert_eq!(engine.sampler().dropped_note_count(), 0);
}

#[test]
fn sample_handles_stay_valid_after_library_eviction() {
    let mut project = Project::new("Eviction");
    project
        .instrument_rack_mut()
        .add_instrument(Instrument::with_sample(0, "Kick", "mem/kick.wav"));
    let mut pattern = Pattern::new("hit", "Hit", BAR);
    pattern.add_note(StepNote::new(0, 0, 1.0));
    project.pattern_library_mut().add_pattern(pattern);

    let mut engine = PlaybackEngine::new(project, SR);
    let handle: Arc<Sample> = engine
        .sample_library_mut()
        .insert(synthetic_sample("mem/kick.wav", 1 << 16));
    engine.load_instrument_samples();
    drop(handle);

    engine.play_pattern("hit");
    run_blocks(&mut engine, 1);
    assert_eq!(engine.sampler().active_voice_count(), 1);

    // Evict from the cache while a voice still plays the sample
    engine.sample_library_mut().unload_sample("mem/kick.wav");
    let mut out_l = vec![0.0; BLOCK];
    let mut out_r = vec![0.0; BLOCK];
    engine.process_block(&mut out_l, &mut out_r);
    assert!(out_l.iter().any(|&s| s != 0.0));
}
