// Sampler - fixed-size voice pool and mixing
// Voices live in a fixed array that is never reallocated, so admitting
// and rendering voices is safe inside the real-time callback.

pub mod library;
pub mod loader;

pub use library::SampleLibrary;
pub use loader::{Sample, SampleLoadError};

use std::sync::Arc;

/// Maximum number of simultaneous voices.
pub const MAX_VOICES: usize = 64;

/// One sample-playback cursor: the unit of polyphony.
/// Voices reference samples; they never own them.
#[derive(Debug, Clone, Default)]
pub struct Voice {
    sample: Option<Arc<Sample>>,
    playback_position: u64,
    velocity: f32,
    gain: f32,
    pan: f32,
    /// First output frame within the block the voice was admitted in.
    first_output_frame: u32,
    active: bool,
}

impl Voice {
    fn reset(&mut self) {
        *self = Voice::default();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Polyphonic sampler with a fixed voice pool.
///
/// `note_on` admits a voice into the first free slot; when the pool is
/// saturated the new note is dropped and counted. `render` accumulates
/// every active voice into caller-provided (pre-zeroed) buffers.
pub struct Sampler {
    voices: [Voice; MAX_VOICES],
    dropped_notes: u64,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            voices: std::array::from_fn(|_| Voice::default()),
            dropped_notes: 0,
        }
    }

    /// Trigger a voice. `offset_frames` is the intended first output
    /// frame within the current audio block.
    pub fn note_on(
        &mut self,
        sample: Arc<Sample>,
        velocity: f32,
        gain: f32,
        pan: f32,
        offset_frames: u32,
    ) {
        if sample.length_frames == 0 {
            return;
        }

        let Some(voice) = self.voices.iter_mut().find(|v| !v.active) else {
            // Pool saturated: drop the new note, no voice stealing
            self.dropped_notes += 1;
            return;
        };

        voice.sample = Some(sample);
        voice.playback_position = 0;
        voice.velocity = velocity;
        voice.gain = gain;
        voice.pan = pan;
        voice.first_output_frame = offset_frames;
        voice.active = true;
    }

    /// Silence every voice immediately.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Mix all active voices into the output buffers. The caller has
    /// pre-zeroed them; this accumulates.
    pub fn render(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let nframes = out_l.len().min(out_r.len());

        for voice in &mut self.voices {
            if !voice.active {
                continue;
            }
            let Some(sample) = voice.sample.clone() else {
                voice.reset();
                continue;
            };

            // Constant-sum linear pan law, computed once per call
            let (pan_l, pan_r) = if voice.pan < 0.0 {
                (1.0, 1.0 + voice.pan)
            } else {
                (1.0 - voice.pan, 1.0)
            };
            let gain_l = voice.velocity * voice.gain * pan_l;
            let gain_r = voice.velocity * voice.gain * pan_r;

            let start = (voice.first_output_frame as usize).min(nframes);
            voice.first_output_frame = 0;

            for i in start..nframes {
                let pos = voice.playback_position as usize;
                out_l[i] += sample.data_left[pos] * gain_l;
                out_r[i] += sample.data_right[pos] * gain_r;

                voice.playback_position += 1;
                if voice.playback_position >= sample.length_frames {
                    voice.reset();
                    break;
                }
            }
        }
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    /// Notes dropped because the pool was saturated.
    pub fn dropped_note_count(&self) -> u64 {
        self.dropped_notes
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
