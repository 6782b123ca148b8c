//! Tempo change without pitch change (WSOLA overlap-add).

use std::f32::consts::PI;

const FRAME_SECS: f32 = 0.040;
const SEARCH_SECS: f32 = 0.010;
const MIN_FRAME: usize = 64;

fn hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos())
        .collect()
}

fn correlation(samples: &[f32], a: usize, b: usize, len: usize) -> f32 {
    let n = samples.len();
    let mut sum = 0.0f32;
    for i in 0..len {
        let (ia, ib) = (a + i, b + i);
        if ia >= n || ib >= n {
            break;
        }
        sum += samples[ia] * samples[ib];
    }
    sum
}

/// Stretch `samples` so playback runs `rate` times faster.
///
/// The output holds about `samples.len() / rate` samples. Frames are taken
/// from the input at the nominal position, shifted within a small window to
/// the offset that best continues the previous frame, and overlap-added with
/// a Hann window.
pub fn time_stretch(samples: &[f32], sample_rate: u32, rate: f32) -> Vec<f32> {
    if samples.is_empty() || !rate.is_finite() || rate <= 0.0 || (rate - 1.0).abs() < 1e-3 {
        return samples.to_vec();
    }

    let n = samples.len();
    let out_len = ((n as f64) / (rate as f64)).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let frame = (((sample_rate as f32) * FRAME_SECS) as usize).max(MIN_FRAME) & !1;
    let hop = frame / 2;
    let tolerance = ((sample_rate as f32) * SEARCH_SECS) as usize;
    let window = hann(frame);
    let last_start = n.saturating_sub(frame);

    let mut out = vec![0.0f32; out_len + frame];
    let mut norm = vec![0.0f32; out_len + frame];
    let mut prev_src: Option<usize> = None;

    let mut out_pos = 0usize;
    while out_pos < out_len {
        let nominal = (((out_pos as f64) * (rate as f64)) as usize).min(last_start);

        let src = match prev_src {
            None => nominal,
            Some(prev) => {
                let target = prev + hop;
                let lo = nominal.saturating_sub(tolerance);
                let hi = (nominal + tolerance).min(last_start);
                let mut best = nominal;
                let mut best_score = f32::NEG_INFINITY;
                for candidate in lo..=hi.max(lo) {
                    let score = correlation(samples, candidate, target, hop);
                    if score > best_score {
                        best_score = score;
                        best = candidate;
                    }
                }
                best
            }
        };

        for (i, w) in window.iter().enumerate() {
            let idx = src + i;
            if idx >= n {
                break;
            }
            out[out_pos + i] += samples[idx] * w;
            norm[out_pos + i] += w;
        }

        prev_src = Some(src);
        out_pos += hop;
    }

    out.truncate(out_len);
    for (sample, weight) in out.iter_mut().zip(norm.iter()) {
        if *weight > 1e-3 {
            *sample /= weight;
        }
    }
    out
}
