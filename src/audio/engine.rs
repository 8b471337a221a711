// Audio engine - per-block playback core and the cpal stream around it
//
// `PlaybackEngine` owns the project, transport, scheduler, sampler and
// sample cache, and renders one block at a time into planar f32
// buffers. It has no audio-device dependency, so tests and offline
// drivers can call `process_block` directly.
//
// `AudioEngine` wraps it in a cpal output stream. The callback is the
// real-time zone: no allocations in the steady state, no I/O, no
// blocking locks. Control commands arrive through a ringbuffer and are
// drained at the top of each callback; errors flow back through the
// notification channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample as CpalSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};

use crate::messaging::channels::{
    create_command_channel, CommandConsumer, CommandProducer, NotificationProducer,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::project::Project;
use crate::sampler::{Sample, SampleLibrary, Sampler};
use crate::sequencer::scheduler::Scheduler;
use crate::sequencer::timeline::{self, MusicalPosition, Tick};
use crate::sequencer::transport::Transport;

const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// The audio-playback core: advances the transport, compiles the tick
/// window for each block, dispatches voices and mixes them.
pub struct PlaybackEngine {
    project: Project,
    sample_library: SampleLibrary,
    sampler: Sampler,
    transport: Transport,
    scheduler: Scheduler,
    /// instrument id -> decoded sample, filled by `load_instrument_samples`
    instrument_samples: HashMap<i32, Arc<Sample>>,
    sample_rate: u32,
}

impl PlaybackEngine {
    pub fn new(project: Project, sample_rate: u32) -> Self {
        let mut transport = Transport::new();
        transport.set_sample_rate(sample_rate);

        Self {
            project,
            sample_library: SampleLibrary::new(),
            sampler: Sampler::new(),
            transport,
            scheduler: Scheduler::new(),
            instrument_samples: HashMap::new(),
            sample_rate,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn sample_library(&self) -> &SampleLibrary {
        &self.sample_library
    }

    pub fn sample_library_mut(&mut self) -> &mut SampleLibrary {
        &mut self.sample_library
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Update the cached output sample rate (device change).
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.transport.set_sample_rate(sample_rate);
    }

    /// Decode and cache the sample of every instrument in the rack.
    /// Missing paths and decode failures are logged and skipped; those
    /// instruments stay silent. Returns the number of samples loaded.
    pub fn load_instrument_samples(&mut self) -> usize {
        self.instrument_samples.clear();

        let wanted: Vec<(i32, String, String)> = self
            .project
            .instrument_rack()
            .instruments()
            .iter()
            .map(|i| (i.id, i.name.clone(), i.sample_path.clone()))
            .collect();

        let mut loaded = 0;
        for (id, name, path) in wanted {
            if path.is_empty() {
                eprintln!("Instrument {} ({}) has no sample path", id, name);
                continue;
            }
            match self.sample_library.load_sample(&path) {
                Ok(sample) => {
                    self.instrument_samples.insert(id, sample);
                    loaded += 1;
                }
                Err(err) => {
                    eprintln!("Failed to load sample for instrument {} ({}): {}", id, name, err);
                }
            }
        }
        loaded
    }

    pub fn sample_for_instrument(&self, instrument_id: i32) -> Option<Arc<Sample>> {
        self.instrument_samples.get(&instrument_id).map(Arc::clone)
    }

    /// Loop a pattern from the library, starting at tick 0.
    /// Returns false if the pattern id is unknown.
    pub fn play_pattern(&mut self, pattern_id: &str) -> bool {
        let Some(pattern) = self.project.pattern_library().get(pattern_id).cloned() else {
            return false;
        };

        self.scheduler.set_loop_length(pattern.length_ticks());
        self.scheduler.set_looping(true);
        self.scheduler.set_pattern(pattern);

        self.transport.set_position(0);
        self.transport.play();
        true
    }

    /// Play the project timeline from tick 0.
    pub fn play_timeline(&mut self) {
        self.scheduler.set_timeline();
        self.transport.set_position(0);
        self.transport.play();
    }

    /// Play the project timeline from a given tick.
    pub fn play_from_tick(&mut self, start_tick: Tick) {
        self.scheduler.set_timeline();
        self.transport.set_position(start_tick);
        self.transport.play();
    }

    /// Stop the transport, clear the scheduler, silence all voices.
    pub fn stop_playback(&mut self) {
        self.transport.stop();
        self.scheduler.clear();
        self.sampler.all_notes_off();
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_rolling()
    }

    /// The transport cursor as bar:beat:tick under the project meter.
    pub fn current_position(&self) -> MusicalPosition {
        let tick = self.transport.state().tick;
        let meter = self.project.meter_map();
        let signature = meter.signature_at(tick);
        let within_bar = tick - meter.bar_start_at(tick);
        let beat_length = timeline::ticks_per_beat(signature);

        MusicalPosition {
            bar: meter.bar_index_at(tick),
            beat: within_bar / beat_length,
            tick: within_bar % beat_length,
        }
    }

    /// Apply a control command between blocks.
    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::PlayPattern(pattern_id) => {
                self.play_pattern(&pattern_id);
            }
            Command::PlayTimeline => self.play_timeline(),
            Command::PlayFromTick(tick) => self.play_from_tick(tick),
            Command::Stop => self.stop_playback(),
            Command::Seek(tick) => self.transport.set_position(tick),
            Command::SetTempo(bpm) => self.transport.set_tempo(bpm),
        }
    }

    /// Render one audio block into pre-zeroed planar buffers.
    ///
    /// Events are compiled for the half-open window starting at the
    /// cursor's tick at block start, so consecutive blocks cover
    /// contiguous windows: nothing fires twice, nothing is skipped,
    /// and a seek emits from the seek target onward.
    pub fn process_block(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let nframes = out_l.len().min(out_r.len()) as u32;
        if nframes == 0 {
            return;
        }

        let state = *self.transport.state();
        self.transport.update_internal(nframes, self.sample_rate);

        if state.rolling {
            let start_tick = state.tick;
            let end_frame = state.frame + nframes as u64;
            let end_tick = timeline::frames_to_ticks(end_frame, state.bpm, state.sample_rate);

            let events = self
                .scheduler
                .events_in_range(&self.project, start_tick, end_tick);

            for event in events {
                let Some(sample) = self.instrument_samples.get(&event.instrument_id) else {
                    // No sample for this instrument: the event is skipped
                    continue;
                };

                let event_frame =
                    timeline::ticks_to_frames(event.tick, state.bpm, state.sample_rate);
                let offset_frames = event_frame
                    .saturating_sub(state.frame)
                    .min(nframes as u64 - 1) as u32;

                let (gain, pan) = self
                    .project
                    .instrument_rack()
                    .get(event.instrument_id)
                    .map(|i| (i.gain, i.pan))
                    .unwrap_or((1.0, 0.0));

                self.sampler
                    .note_on(Arc::clone(sample), event.velocity, gain, pan, offset_frames);
            }
        }

        self.sampler.render(out_l, out_r);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioEngineError {
    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("failed to query output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Owns the cpal output stream and the shared playback core.
///
/// Control methods enqueue commands that the callback applies at its
/// next block boundary; accessors lock the core briefly (structural
/// edits belong on the control thread while playback is stopped).
pub struct AudioEngine {
    _device: Device,
    stream: Stream,
    sample_rate: u32,
    buffer_size: usize,
    core: Arc<Mutex<PlaybackEngine>>,
    command_tx: CommandProducer,
    xruns: Arc<AtomicU64>,
}

impl AudioEngine {
    /// Acquire the default output device and start streaming.
    pub fn new(
        project: Project,
        notification_tx: NotificationProducer,
    ) -> Result<Self, AudioEngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioEngineError::NoOutputDevice)?;

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0;
        let channels = supported_config.channels() as usize;

        let config: StreamConfig = supported_config.into();
        let buffer_size = match &config.buffer_size {
            cpal::BufferSize::Fixed(size) => *size as usize,
            cpal::BufferSize::Default => 512,
        };

        let core = Arc::new(Mutex::new(PlaybackEngine::new(project, sample_rate)));
        let (command_tx, command_rx) = create_command_channel(COMMAND_CHANNEL_CAPACITY);
        let notification_tx = Arc::new(Mutex::new(notification_tx));
        let xruns = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                buffer_size,
                Arc::clone(&core),
                command_rx,
                Arc::clone(&notification_tx),
                Arc::clone(&xruns),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                buffer_size,
                Arc::clone(&core),
                command_rx,
                Arc::clone(&notification_tx),
                Arc::clone(&xruns),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                buffer_size,
                Arc::clone(&core),
                command_rx,
                Arc::clone(&notification_tx),
                Arc::clone(&xruns),
            ),
            other => return Err(AudioEngineError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play()?;

        if let Ok(mut tx) = notification_tx.try_lock() {
            let _ = tx.try_push(Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz, {} channels", sample_rate, channels),
            ));
        }

        Ok(Self {
            _device: device,
            stream,
            sample_rate,
            buffer_size,
            core,
            command_tx,
            xruns,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        buffer_size: usize,
        core: Arc<Mutex<PlaybackEngine>>,
        mut command_rx: CommandConsumer,
        notification_tx: Arc<Mutex<NotificationProducer>>,
        xruns: Arc<AtomicU64>,
    ) -> Result<Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        // Planar scratch buffers, sized up front so the steady state
        // never allocates
        let mut scratch_l = vec![0.0f32; buffer_size.max(64)];
        let mut scratch_r = vec![0.0f32; buffer_size.max(64)];

        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Real-time zone: no allocations, no I/O, no blocking locks
                let nframes = data.len() / channels;
                if scratch_l.len() < nframes {
                    scratch_l.resize(nframes, 0.0);
                    scratch_r.resize(nframes, 0.0);
                }
                let out_l = &mut scratch_l[..nframes];
                let out_r = &mut scratch_r[..nframes];
                out_l.fill(0.0);
                out_r.fill(0.0);

                if let Ok(mut core) = core.try_lock() {
                    while let Some(command) = command_rx.try_pop() {
                        core.apply_command(command);
                    }
                    core.process_block(out_l, out_r);
                }
                // If the lock is contended the scratch stays zeroed and
                // this block is silence

                for (i, frame) in data.chunks_mut(channels).enumerate() {
                    write_stereo_frame(out_l[i], out_r[i], frame);
                }
            },
            move |err| {
                // Runs outside the audio callback: I/O is fine here
                eprintln!("Audio stream error: {}", err);
                xruns.fetch_add(1, Ordering::Relaxed);

                if let Ok(mut tx) = notification_tx.try_lock() {
                    let _ = tx.try_push(Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {}", err),
                    ));
                }
            },
            None,
        )
    }

    /// The shared playback core, for structural edits while stopped
    /// and for state queries.
    pub fn core(&self) -> &Arc<Mutex<PlaybackEngine>> {
        &self.core
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Stream errors reported by the backend since startup.
    pub fn xrun_count(&self) -> u64 {
        self.xruns.load(Ordering::Relaxed)
    }

    pub fn load_instrument_samples(&self) -> usize {
        self.core
            .lock()
            .map(|mut core| core.load_instrument_samples())
            .unwrap_or(0)
    }

    pub fn play_pattern(&mut self, pattern_id: &str) {
        let _ = self
            .command_tx
            .try_push(Command::PlayPattern(pattern_id.to_string()));
    }

    pub fn play_timeline(&mut self) {
        let _ = self.command_tx.try_push(Command::PlayTimeline);
    }

    pub fn play_from_tick(&mut self, tick: Tick) {
        let _ = self.command_tx.try_push(Command::PlayFromTick(tick));
    }

    pub fn stop_playback(&mut self) {
        let _ = self.command_tx.try_push(Command::Stop);
    }

    pub fn seek(&mut self, tick: Tick) {
        let _ = self.command_tx.try_push(Command::Seek(tick));
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        let _ = self.command_tx.try_push(Command::SetTempo(bpm));
    }

    pub fn is_playing(&self) -> bool {
        self.core
            .lock()
            .map(|core| core.is_playing())
            .unwrap_or(false)
    }

    /// Stop playback and pause the stream.
    pub fn shutdown(&mut self) {
        self.stop_playback();
        let _ = self.stream.pause();
    }
}

/// Write one stereo frame into an interleaved device frame, mixing
/// down for mono devices and zero-filling extra channels.
fn write_stereo_frame<T>(left: f32, right: f32, frame: &mut [T])
where
    T: SizedSample + FromSample<f32>,
{
    match frame.len() {
        0 => {}
        1 => frame[0] = T::from_sample(0.5 * (left + right)),
        _ => {
            frame[0] = T::from_sample(left);
            frame[1] = T::from_sample(right);
            for channel in frame.iter_mut().skip(2) {
                *channel = T::from_sample(0.0);
            }
        }
    }
}
