use paradiddle::sequencer::timeline::{ticks_per_bar, TimeSignature};
use paradiddle::{
    create_notification_channel, AudioEngine, Instrument, Pattern, Project, Region, RegionType,
    StepNote, Track,
};
use ringbuf::traits::Consumer;
use std::path::{Path, PathBuf};

const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

/// Look for a drum sample in common locations.
fn find_sample(name: &str) -> Option<PathBuf> {
    let search_dirs = [
        "./samples",
        "../samples",
        "/usr/share/hydrogen/data/drumkits/GMRockKit",
        "/usr/local/share/hydrogen/data/drumkits/GMRockKit",
    ];

    search_dirs
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|path| path.exists())
}

fn add_instrument(project: &mut Project, id: i32, name: &str, sample_file: &str) {
    match find_sample(sample_file) {
        Some(path) => {
            println!("  Found {}: {}", name, path.display());
            project
                .instrument_rack_mut()
                .add_instrument(Instrument::with_sample(id, name, path.to_string_lossy()));
        }
        None => {
            println!("  Warning: {} sample not found ({})", name, sample_file);
            project
                .instrument_rack_mut()
                .add_instrument(Instrument::new(id, name));
        }
    }
}

fn build_demo_project() -> Project {
    let mut project = Project::new("Demo Song");

    println!("Searching for drum samples...");
    add_instrument(&mut project, 0, "Kick", "Kick-Hard.wav");
    add_instrument(&mut project, 1, "Snare", "Snare-Hard.wav");
    add_instrument(&mut project, 2, "Hi-Hat", "HatClosed-Hard.wav");
    add_instrument(&mut project, 3, "Crash", "Crash-Hard.wav");

    let bar_length = ticks_per_bar(TimeSignature::four_four());

    // Basic groove: kick on 1 and 3, snare on 2 and 4, eighth hats
    let mut groove = Pattern::new("groove1", "Basic Groove", bar_length);
    groove.add_note(StepNote::new(0, 0, 0.9));
    groove.add_note(StepNote::new(0, 1920, 0.85));
    groove.add_note(StepNote::new(1, 960, 0.8));
    groove.add_note(StepNote::new(1, 2880, 0.8));
    for i in 0..8 {
        groove.add_note(StepNote::new(2, i * 480, 0.6));
    }

    // Sixteenth-note snare fill with a crescendo and a crash at the end
    let mut fill = Pattern::new("fill1", "Drum Fill", bar_length);
    for i in 0..16 {
        fill.add_note(StepNote::new(1, i * 240, 0.6 + i as f32 * 0.02));
    }
    fill.add_note(StepNote::new(3, bar_length - 10, 0.9));

    // Half-time feel: kick on 1, snare on 3, quarter hats
    let mut halftime = Pattern::new("halftime1", "Half-Time", bar_length);
    halftime.add_note(StepNote::new(0, 0, 0.9));
    halftime.add_note(StepNote::new(1, 1920, 0.85));
    for i in 0..4 {
        halftime.add_note(StepNote::new(2, i * 960, 0.65));
    }

    project.pattern_library_mut().add_pattern(groove);
    project.pattern_library_mut().add_pattern(fill);
    project.pattern_library_mut().add_pattern(halftime);

    // 14-bar arrangement: groove, fill, half-time, fill, groove
    let mut track = Track::new("track1", "Drums");
    let sections: [(&str, &str, i64, i64); 5] = [
        ("region1", "groove1", 0, 4),
        ("region2", "fill1", 4, 1),
        ("region3", "halftime1", 5, 4),
        ("region4", "fill1", 9, 1),
        ("region5", "groove1", 10, 4),
    ];
    for (region_id, pattern_id, start_bar, length_bars) in sections {
        let mut region = Region::new(
            region_id,
            RegionType::Groove,
            start_bar * bar_length,
            length_bars * bar_length,
        );
        region.set_pattern_id(pattern_id);
        assert!(!track.would_overlap(&region));
        track.add_region(region);
    }
    project.add_track(track);

    println!("Timeline created: 14 bars with multiple patterns\n");
    project
}

fn main() {
    println!("=== Paradiddle Drum Machine ===\n");

    let project = build_demo_project();

    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_CHANNEL_CAPACITY);

    println!("Audio engine initialisation...");
    let mut engine = match AudioEngine::new(project, notification_tx) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Failed to initialize audio engine: {}", err);
            std::process::exit(1);
        }
    };

    println!(
        "Engine initialized: {} Hz, {} frame buffers",
        engine.sample_rate(),
        engine.buffer_size()
    );

    println!("\nLoading drum samples...");
    let loaded = engine.load_instrument_samples();
    if loaded == 0 {
        println!("Note: no samples could be loaded; playback will be silent.");
        println!("Place WAV files in ./samples to hear the demo.");
    } else {
        println!("{} samples loaded", loaded);
    }

    println!("\nPlaying timeline. Press Enter to stop.");
    engine.play_timeline();

    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    engine.shutdown();

    while let Some(notification) = notification_rx.try_pop() {
        println!("[{:?}/{:?}] {}", notification.level, notification.category, notification.message);
    }

    if engine.xrun_count() > 0 {
        println!("Stream errors during playback: {}", engine.xrun_count());
    }

    println!("Stopped.");
}
