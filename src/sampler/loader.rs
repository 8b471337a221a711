// Sample loader - decodes audio files into de-interleaved float PCM
// Mono files are duplicated into both channels at load time so the
// render loop never branches on channel count.

use std::path::Path;

use claxon::FlacReader;
use hound::WavReader;

/// Decoded sample data, ready for playback.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub data_left: Vec<f32>,
    pub data_right: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub length_frames: u64,
    pub path: String,
}

impl Sample {
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SampleLoadError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported channel count: {0} (only mono and stereo)")]
    UnsupportedChannels(u16),

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC error: {0}")]
    Flac(#[from] claxon::Error),
}

/// Decode a sample file. Dispatches on extension: WAV (16/24/32-bit
/// integer and 32-bit float PCM) or FLAC.
pub fn load_sample(path: &Path) -> Result<Sample, SampleLoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "wav" => load_wav(path),
        "flac" => load_flac(path),
        other => Err(SampleLoadError::UnsupportedFormat(other.to_string())),
    }
}

fn load_wav(path: &Path) -> Result<Sample, SampleLoadError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.channels > 2 {
        return Err(SampleLoadError::UnsupportedChannels(spec.channels));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        (hound::SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = 1.0 / (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
        (_, bits) => return Err(SampleLoadError::UnsupportedBitDepth(bits)),
    };

    Ok(build_sample(
        path,
        interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}

fn load_flac(path: &Path) -> Result<Sample, SampleLoadError> {
    let mut reader = FlacReader::open(path)?;
    let info = reader.streaminfo();

    let channels = info.channels as u16;
    if channels == 0 || channels > 2 {
        return Err(SampleLoadError::UnsupportedChannels(channels));
    }

    let scale = 1.0 / (1i64 << (info.bits_per_sample - 1)) as f32;
    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 * scale))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(build_sample(path, interleaved, channels, info.sample_rate))
}

/// De-interleave into left/right, duplicating mono into both channels.
fn build_sample(path: &Path, interleaved: Vec<f32>, channels: u16, sample_rate: u32) -> Sample {
    let length_frames = (interleaved.len() / channels as usize) as u64;

    let (data_left, data_right) = if channels == 1 {
        (interleaved.clone(), interleaved)
    } else {
        let mut left = Vec::with_capacity(length_frames as usize);
        let mut right = Vec::with_capacity(length_frames as usize);
        for frame in interleaved.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        (left, right)
    };

    Sample {
        data_left,
        data_right,
        sample_rate,
        channels,
        length_frames,
        path: path.to_string_lossy().into_owned(),
    }
}
