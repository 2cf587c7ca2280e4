use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{
    Decoder, DecoderOptions, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64BE,
    CODEC_TYPE_PCM_F64LE,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::SampleFormat as SymphoniaSampleFormat;

use crate::{AudioError, Result};

/// Sample encoding of the source file, carried untouched to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleFormat {
    Int { bits: u16 },
    Float,
}

impl Default for SampleFormat {
    fn default() -> Self {
        SampleFormat::Int { bits: 16 }
    }
}

/// A run of interleaved frames, `channels` samples per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub channels: usize,
    pub samples: Vec<f32>,
}

impl SampleBlock {
    pub fn new(channels: usize, samples: Vec<f32>) -> Self {
        Self { channels, samples }
    }

    pub fn from_frames(frames: &[Vec<f32>]) -> Self {
        let channels = frames.first().map_or(0, |f| f.len());
        Self {
            channels,
            samples: frames.iter().flatten().copied().collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.chunks_exact(self.channels.max(1))
    }

    /// One row of samples per channel.
    pub fn channel_rows(&self) -> Vec<Vec<f32>> {
        let mut rows = vec![Vec::with_capacity(self.frame_count()); self.channels];
        for frame in self.frames() {
            for (row, &sample) in rows.iter_mut().zip(frame) {
                row.push(sample);
            }
        }
        rows
    }

    /// Extract a single channel as a mono block.
    pub fn channel(&self, index: usize) -> SampleBlock {
        SampleBlock {
            channels: 1,
            samples: self.frames().map(|frame| frame[index]).collect(),
        }
    }

    /// Extend with silent frames up to `frames`.
    pub fn pad_to(&mut self, frames: usize) {
        if frames > self.frame_count() {
            self.samples.resize(frames * self.channels, 0.0);
        }
    }

    /// Place the channels of every block side by side, frame by frame.
    /// All blocks must hold the same number of frames.
    pub fn concat_channels(blocks: &[SampleBlock]) -> SampleBlock {
        let channels = blocks.iter().map(|b| b.channels).sum();
        let frames = blocks.first().map_or(0, |b| b.frame_count());
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for block in blocks {
                let start = i * block.channels;
                samples.extend_from_slice(&block.samples[start..start + block.channels]);
            }
        }
        SampleBlock { channels, samples }
    }
}

/// Anything that can hand out fixed-size blocks of frames.
pub trait SampleSource {
    fn channel_count(&self) -> usize;
    fn sample_rate(&self) -> u32;
    fn format(&self) -> SampleFormat;

    /// Next block of at most `size` frames, `None` at end of stream.
    /// A `size` of 0 drains the rest of the stream into one block.
    fn next_block(&mut self, size: usize) -> Result<Option<SampleBlock>>;

    fn read_all(&mut self) -> Result<SampleBlock> {
        let mut all = SampleBlock::new(self.channel_count(), Vec::new());
        while let Some(block) = self.next_block(0)? {
            all.samples.extend_from_slice(&block.samples);
        }
        Ok(all)
    }
}

/// Decodes a file with symphonia and re-chunks the packets into blocks.
pub struct WavSource {
    path: PathBuf,
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: usize,
    sample_rate: u32,
    format: SampleFormat,
    pending: VecDeque<f32>,
    finished: bool,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |reason: String| AudioError::UnreadableSource {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| unreadable(e.to_string()))?;

        let reader = probed.format;
        let track = reader
            .default_track()
            .ok_or_else(|| AudioError::UnsupportedFormat(format!("no audio track in {}", path.display())))?;
        let track_id = track.id;
        let params = &track.codec_params;

        let channels = params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| AudioError::UnsupportedFormat("unknown channel layout".into()))?;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| AudioError::UnsupportedFormat("unknown sample rate".into()))?;
        let is_float = matches!(
            params.sample_format,
            Some(SymphoniaSampleFormat::F32) | Some(SymphoniaSampleFormat::F64)
        ) || [CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F64LE, CODEC_TYPE_PCM_F64BE]
            .contains(&params.codec);
        let format = if is_float {
            SampleFormat::Float
        } else {
            SampleFormat::Int {
                bits: params.bits_per_sample.unwrap_or(16) as u16,
            }
        };

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| unreadable(e.to_string()))?;

        debug!(
            "Opened {} ({} channels, {} Hz, {:?})",
            path.display(),
            channels,
            sample_rate,
            format
        );

        Ok(Self {
            path: path.to_path_buf(),
            track_id,
            reader,
            decoder,
            channels,
            sample_rate,
            format,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode one more packet into the pending queue. Returns false at end of stream.
    fn fill(&mut self) -> Result<bool> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(e) => return end_of_stream(&self.path, e).map(|()| false),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet in {}: {}", self.path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(AudioError::UnreadableSource {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })
                }
            };

            let spec = *decoded.spec();
            let found = spec.channels.count();
            if found != self.channels {
                return Err(AudioError::InconsistentChannelCount {
                    expected: self.channels,
                    found,
                });
            }

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            self.pending.extend(buffer.samples().iter().copied());
            return Ok(true);
        }
    }
}

/// `Ok` only for a clean end of stream. Anything else, a decoder reset
/// included, would cut the stream short and is reported as unreadable.
fn end_of_stream(path: &Path, error: SymphoniaError) -> Result<()> {
    match error {
        SymphoniaError::IoError(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        e => Err(AudioError::UnreadableSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

impl SampleSource for WavSource {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn format(&self) -> SampleFormat {
        self.format
    }

    fn next_block(&mut self, size: usize) -> Result<Option<SampleBlock>> {
        while !self.finished && (size == 0 || self.pending.len() < size * self.channels) {
            if !self.fill()? {
                self.finished = true;
            }
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = if size == 0 {
            self.pending.len()
        } else {
            self.pending.len().min(size * self.channels)
        };
        let samples: Vec<f32> = self.pending.drain(..take).collect();
        Ok(Some(SampleBlock::new(self.channels, samples)))
    }
}

/// Frames held in memory, mostly useful for hosts that decode elsewhere.
pub struct MemorySource {
    block: SampleBlock,
    position: usize,
    sample_rate: u32,
    format: SampleFormat,
}

impl MemorySource {
    pub fn new(block: SampleBlock, sample_rate: u32, format: SampleFormat) -> Self {
        Self {
            block,
            position: 0,
            sample_rate,
            format,
        }
    }

    pub fn from_frames(frames: &[Vec<f32>]) -> Self {
        Self::new(SampleBlock::from_frames(frames), 44_100, SampleFormat::default())
    }
}

impl SampleSource for MemorySource {
    fn channel_count(&self) -> usize {
        self.block.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn format(&self) -> SampleFormat {
        self.format
    }

    fn next_block(&mut self, size: usize) -> Result<Option<SampleBlock>> {
        let total = self.block.frame_count();
        if self.position >= total {
            return Ok(None);
        }
        let end = if size == 0 { total } else { (self.position + size).min(total) };
        let channels = self.block.channels;
        let samples = self.block.samples[self.position * channels..end * channels].to_vec();
        self.position = end;
        Ok(Some(SampleBlock::new(channels, samples)))
    }
}
