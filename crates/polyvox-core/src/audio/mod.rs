//! Audio buffers and post-processing for synthesized speech.

mod stretch;
mod wav;

pub use stretch::time_stretch;
pub use wav::{decode_wav, encode_wav, write_wav};

use crate::error::{Error, Result};

/// Mono float PCM in the range [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Change tempo by `rate` while keeping pitch.
    pub fn stretched(self, rate: f32) -> Self {
        let samples = time_stretch(&self.samples, self.sample_rate, rate);
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }
}

/// Join per-chunk segments into one waveform.
pub fn concat(segments: Vec<Waveform>) -> Result<Waveform> {
    let mut iter = segments.into_iter();
    let mut merged = iter
        .next()
        .ok_or_else(|| Error::InferenceError("No audio segments to join".to_string()))?;

    for segment in iter {
        if segment.sample_rate != merged.sample_rate {
            return Err(Error::InferenceError(format!(
                "Sample-rate mismatch between chunks: {} vs {}",
                merged.sample_rate, segment.sample_rate
            )));
        }
        merged.samples.extend_from_slice(&segment.samples);
    }

    Ok(merged)
}
