use std::fs;
use std::path::{Path, PathBuf};

use hound::{WavSpec, WavWriter};
use log::debug;

use crate::audio::source::{SampleBlock, SampleFormat};
use crate::{AudioError, Result};

/// Anything that can persist a block of frames to a path.
pub trait SampleSink: Sync {
    fn write(&self, path: &Path, sample_rate: u32, format: SampleFormat, block: &SampleBlock) -> Result<()>;
}

/// Writes WAV files with hound.
///
/// The data lands in a hidden sibling first and is renamed over the
/// target only once the writer is finalized, so a failed write never
/// clobbers an existing file.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavSink;

impl WavSink {
    pub fn new() -> Self {
        Self
    }

    fn partial_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.partial", name))
    }

    fn write_samples(path: &Path, spec: WavSpec, block: &SampleBlock) -> Result<()> {
        let mut writer = WavWriter::create(path, spec)?;
        match spec.sample_format {
            hound::SampleFormat::Float => {
                for &sample in &block.samples {
                    writer.write_sample(sample)?;
                }
            }
            hound::SampleFormat::Int => {
                for &sample in &block.samples {
                    writer.write_sample(quantize(sample, spec.bits_per_sample))?;
                }
            }
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Map a float amplitude back onto the integer grid symphonia decoded it from.
fn quantize(sample: f32, bits: u16) -> i32 {
    let scale = (1i64 << (bits - 1)) as f64;
    let value = (sample as f64 * scale).round();
    value.clamp(-scale, scale - 1.0) as i32
}

impl SampleSink for WavSink {
    fn write(&self, path: &Path, sample_rate: u32, format: SampleFormat, block: &SampleBlock) -> Result<()> {
        let channels = u16::try_from(block.channels)
            .map_err(|_| AudioError::UnsupportedFormat(format!("{} channels", block.channels)))?;
        let spec = match format {
            SampleFormat::Float => WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
            SampleFormat::Int { bits } => {
                if !matches!(bits, 8 | 16 | 24 | 32) {
                    return Err(AudioError::UnsupportedFormat(format!("{}-bit integer samples", bits)));
                }
                WavSpec {
                    channels,
                    sample_rate,
                    bits_per_sample: bits,
                    sample_format: hound::SampleFormat::Int,
                }
            }
        };

        let partial = Self::partial_path(path);
        if let Err(e) = Self::write_samples(&partial, spec, block) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, path)?;
        debug!(
            "Wrote {} ({} channels, {} frames)",
            path.display(),
            channels,
            block.frame_count()
        );
        Ok(())
    }
}
