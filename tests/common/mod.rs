//! WAV fixtures for the integration tests.
#![allow(dead_code)]

use hound::{WavReader, WavSpec, WavWriter};
use std::path::Path;

pub const SAMPLE_RATE: u32 = 44_100;

/// Write 16-bit frames, one inner vector per frame.
pub fn write_wav(path: &Path, frames: &[Vec<i16>]) {
    let spec = WavSpec {
        channels: frames[0].len() as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for frame in frames {
        for &sample in frame {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Deterministic sine, never exactly zero for the first frames.
pub fn sine(frames: usize, step: f32, amplitude: f32) -> Vec<i16> {
    (1..=frames)
        .map(|i| ((i as f32 * step).sin() * amplitude * i16::MAX as f32) as i16)
        .collect()
}

pub fn interleave(channels: &[Vec<i16>]) -> Vec<Vec<i16>> {
    (0..channels[0].len())
        .map(|i| channels.iter().map(|c| c[i]).collect())
        .collect()
}

pub fn read_wav(path: &Path) -> (WavSpec, Vec<Vec<i16>>) {
    let mut reader = WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    let frames = samples
        .chunks(spec.channels as usize)
        .map(|c| c.to_vec())
        .collect();
    (spec, frames)
}
