// Transport - Playback cursor
// The single source of truth for "where the cursor is now" during
// callbacks. Only the audio thread mutates it from within the callback;
// control commands overwrite its scalar fields between blocks.

use crate::sequencer::timeline::{self, Tick, TimeSignature};

/// Snapshot of the playback cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub rolling: bool,
    pub frame: u64,
    pub tick: Tick,
    pub bpm: f64,
    pub signature: TimeSignature,
    pub sample_rate: u32,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            rolling: false,
            frame: 0,
            tick: 0,
            bpm: 120.0,
            signature: TimeSignature::default(),
            sample_rate: 48000,
        }
    }
}

/// Transport manager - handles timing and position.
#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn is_rolling(&self) -> bool {
        self.state.rolling
    }

    pub fn play(&mut self) {
        self.state.rolling = true;
    }

    pub fn stop(&mut self) {
        self.state.rolling = false;
    }

    /// Move the cursor to a tick. While rolling, this is a seek.
    pub fn set_position(&mut self, tick: Tick) {
        self.state.tick = tick;
        self.state.frame =
            timeline::ticks_to_frames(tick, self.state.bpm, self.state.sample_rate);
    }

    /// Set the engine's internal BPM. Stored tempo-map data is untouched.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.state.bpm = bpm;
    }

    pub fn set_signature(&mut self, signature: TimeSignature) {
        self.state.signature = signature;
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.state.sample_rate = sample_rate;
    }

    /// Advance the cursor by one audio block. No-op while stopped.
    pub fn update_internal(&mut self, nframes: u32, sample_rate: u32) {
        if !self.state.rolling {
            return;
        }

        self.state.sample_rate = sample_rate;
        self.state.frame += nframes as u64;
        self.state.tick =
            timeline::frames_to_ticks(self.state.frame, self.state.bpm, sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_stop() {
        let mut transport = Transport::new();
        assert!(!transport.is_rolling());

        transport.play();
        assert!(transport.is_rolling());

        transport.stop();
        assert!(!transport.is_rolling());
    }

    #[test]
    fn test_update_is_noop_while_stopped() {
        let mut transport = Transport::new();
        transport.update_internal(512, 48000);

        assert_eq!(transport.state().frame, 0);
        assert_eq!(transport.state().tick, 0);
    }

    #[test]
    fn test_update_advances_frames_and_ticks() {
        let mut transport = Transport::new();
        transport.play();

        // At 120 BPM / 48 kHz one tick is 25 frames
        transport.update_internal(24000, 48000);
        assert_eq!(transport.state().frame, 24000);
        assert_eq!(transport.state().tick, 960); // one beat

        transport.update_internal(24000, 48000);
        assert_eq!(transport.state().frame, 48000);
        assert_eq!(transport.state().tick, 1920);
    }

    #[test]
    fn test_set_position_recomputes_frame() {
        let mut transport = Transport::new();
        transport.set_position(3840);

        assert_eq!(transport.state().tick, 3840);
        assert_eq!(transport.state().frame, 96000); // one 4/4 bar at 120/48k
    }

    #[test]
    fn test_set_tempo_changes_frame_mapping() {
        let mut transport = Transport::new();
        transport.set_tempo(60.0);
        transport.set_position(960);

        // At 60 BPM one beat is a full second
        assert_eq!(transport.state().frame, 48000);
        assert_eq!(transport.state().bpm, 60.0);
    }

    #[test]
    fn test_signature_and_sample_rate_setters() {
        let mut transport = Transport::new();
        transport.set_signature(TimeSignature::three_four());
        transport.set_sample_rate(96000);

        assert_eq!(transport.state().signature, TimeSignature::three_four());
        assert_eq!(transport.state().sample_rate, 96000);

        // Position mapping follows the new rate: one beat at 120 BPM
        transport.set_position(960);
        assert_eq!(transport.state().frame, 48000);
    }

    #[test]
    fn test_seek_while_rolling() {
        let mut transport = Transport::new();
        transport.play();
        transport.update_internal(48000, 48000);
        assert_eq!(transport.state().tick, 1920);

        transport.set_position(0);
        assert_eq!(transport.state().tick, 0);
        assert_eq!(transport.state().frame, 0);
        assert!(transport.is_rolling());
    }
}
