use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use super::Waveform;
use crate::error::{Error, Result};

fn pcm16_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn to_pcm16(sample: f32) -> i16 {
    let x = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    if x >= 0.0 {
        (x * 32767.0).round() as i16
    } else {
        (x * 32768.0).round() as i16
    }
}

/// Encode as a 16-bit PCM mono WAV file.
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>> {
    if waveform.sample_rate == 0 {
        return Err(Error::InvalidInput("sample_rate must be > 0".to_string()));
    }

    let mut buf = Cursor::new(Vec::<u8>::new());
    {
        let mut writer = hound::WavWriter::new(&mut buf, pcm16_spec(waveform.sample_rate))?;
        for &sample in &waveform.samples {
            writer.write_sample(to_pcm16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(buf.into_inner())
}

pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    let bytes = encode_wav(waveform)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    debug!(
        "Wrote {} samples @ {} Hz to {}",
        waveform.samples.len(),
        waveform.sample_rate,
        path.display()
    );
    Ok(())
}

/// Decode any integer or float WAV into mono float samples.
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform> {
    if bytes.is_empty() {
        return Err(Error::InferenceError("Empty audio payload".to_string()));
    }

    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let mut samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.max(1) as u32;
            let max_val = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => reader.samples::<f32>().filter_map(|s| s.ok()).collect(),
    };

    if channels > 1 {
        samples = samples
            .chunks(channels)
            .map(|frame| frame.iter().copied().sum::<f32>() / frame.len() as f32)
            .collect();
    }

    for sample in &mut samples {
        *sample = if sample.is_finite() {
            sample.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    if spec.sample_rate == 0 {
        return Err(Error::InferenceError(
            "Decoded audio has invalid sample rate 0".to_string(),
        ));
    }

    Ok(Waveform::new(samples, spec.sample_rate))
}
