use log::debug;

use crate::audio::source::{SampleBlock, SampleSource};
use crate::{AudioError, Result};

/// Widest channel layout a bitmask can describe.
pub const MAX_CHANNELS: usize = u64::BITS as usize;

/// Whether every channel carries the same signal at a fixed gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Correlation {
    #[default]
    Unknown,
    Correlated,
    Uncorrelated,
}

impl Correlation {
    pub fn is_correlated(self) -> bool {
        self == Correlation::Correlated
    }

    /// Fold in the result of one block. `Uncorrelated` is final.
    fn and(self, block_correlated: bool) -> Self {
        match (self, block_correlated) {
            (Correlation::Uncorrelated, _) | (_, false) => Correlation::Uncorrelated,
            _ => Correlation::Correlated,
        }
    }
}

/// Running channel statistics of one file, threaded through its blocks.
///
/// The result only depends on the concatenated frames, not on where the
/// stream was cut into blocks: the last frame of each block is carried so
/// the sample-to-sample ratio across a block boundary is still checked.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorState {
    pub channels: usize,
    pub active_mask: u64,
    pub correlation: Correlation,
    pub reference_sample: Vec<f32>,
    pub null_threshold: f32,
    pub empty_threshold: f32,
    previous_frame: Vec<f32>,
}

impl AccumulatorState {
    pub fn new(null_threshold: f32, empty_threshold: f32) -> Self {
        Self {
            channels: 0,
            active_mask: 0,
            correlation: Correlation::Unknown,
            reference_sample: Vec::new(),
            null_threshold,
            empty_threshold,
            previous_frame: Vec::new(),
        }
    }

    /// Fold one block into the state.
    pub fn update(mut self, block: &SampleBlock) -> Result<Self> {
        if block.is_empty() {
            return Ok(self);
        }

        let rows = block.channel_rows();
        if self.channels == 0 {
            if rows.len() > MAX_CHANNELS {
                return Err(AudioError::UnsupportedFormat(format!("{} channels", rows.len())));
            }
            self.channels = rows.len();
        } else if rows.len() != self.channels {
            return Err(AudioError::InconsistentChannelCount {
                expected: self.channels,
                found: rows.len(),
            });
        }

        self.update_active_mask(&rows);
        self.update_correlation(&rows);
        self.update_reference_sample(block);

        if let Some(last) = block.frames().last() {
            self.previous_frame = last.to_vec();
        }
        Ok(self)
    }

    /// Pull every block out of `source` and fold them in order.
    pub fn fold_source<S: SampleSource + ?Sized>(mut self, source: &mut S, block_size: usize) -> Result<Self> {
        let mut blocks = 0usize;
        while let Some(block) = source.next_block(block_size)? {
            self = self.update(&block)?;
            blocks += 1;
        }
        debug!(
            "Folded {} blocks: mask {:#b}, {:?}",
            blocks, self.active_mask, self.correlation
        );
        Ok(self)
    }

    fn update_active_mask(&mut self, rows: &[Vec<f32>]) {
        for (i, row) in rows.iter().enumerate() {
            if row.iter().any(|s| s.abs() >= self.empty_threshold) {
                self.active_mask |= 1u64 << i;
            }
        }
    }

    fn update_correlation(&mut self, rows: &[Vec<f32>]) {
        if self.correlation == Correlation::Uncorrelated {
            return;
        }
        if self.channels == 1 {
            self.correlation = Correlation::Correlated;
            return;
        }

        let ratios: Vec<Vec<f64>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let carried = self.previous_frame.get(i).copied();
                let samples: Vec<f32> = carried.into_iter().chain(row.iter().copied()).collect();
                ratio_sequence(&samples)
            })
            .collect();

        let block_correlated = ratios_within(&ratios, self.null_threshold as f64);
        self.correlation = self.correlation.and(block_correlated);
    }

    fn update_reference_sample(&mut self, block: &SampleBlock) {
        let mut best_peak = if self.reference_sample.is_empty() {
            None
        } else {
            Some(peak(&self.reference_sample))
        };
        let mut best_frame = None;

        for frame in block.frames().filter(|f| f.iter().all(|&s| s != 0.0)) {
            let amplitude = peak(frame);
            if best_peak.map_or(true, |current| amplitude > current) {
                best_peak = Some(amplitude);
                best_frame = Some(frame);
            }
        }

        if let Some(frame) = best_frame {
            self.reference_sample = frame.to_vec();
        }
    }
}

fn peak(frame: &[f32]) -> f32 {
    frame.iter().fold(0.0, |acc, s| acc.max(s.abs()))
}

/// `sample[k + 1] / sample[k]`, with non-finite ratios mapped to zero.
pub fn ratio_sequence(samples: &[f32]) -> Vec<f64> {
    samples
        .windows(2)
        .map(|pair| {
            let ratio = pair[1] as f64 / pair[0] as f64;
            if ratio.is_finite() {
                ratio
            } else {
                0.0
            }
        })
        .collect()
}

/// True when, at every position, all channels' ratios lie within `threshold`
/// of each other.
pub fn ratios_within(ratios: &[Vec<f64>], threshold: f64) -> bool {
    let len = ratios.iter().map(Vec::len).min().unwrap_or(0);
    (0..len).all(|k| {
        let (lo, hi) = ratios
            .iter()
            .map(|r| r[k])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| (lo.min(r), hi.max(r)));
        hi - lo < threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MemorySource;
    use pretty_assertions::assert_eq;

    const THRESHOLD: f32 = 1e-5;

    fn state() -> AccumulatorState {
        AccumulatorState::new(THRESHOLD, THRESHOLD)
    }

    fn fold(frames: &[Vec<f32>], block_size: usize) -> AccumulatorState {
        state()
            .fold_source(&mut MemorySource::from_frames(frames), block_size)
            .unwrap()
    }

    fn sine(n: usize, phase: f32) -> Vec<f32> {
        (0..n).map(|i| (i as f32 * 0.1 + phase).sin() * 0.5).collect()
    }

    #[test]
    fn ratio_sequence_maps_division_by_zero_to_zero() {
        assert_eq!(ratio_sequence(&[0.5, 0.5]), vec![1.0]);
        assert_eq!(ratio_sequence(&[0.0, 0.0]), vec![0.0]);
        assert_eq!(ratio_sequence(&[0.0, 0.3]), vec![0.0]);
        assert_eq!(ratio_sequence(&[1.0, 2.0, 3.0, -6.0]), vec![2.0, 1.5, -2.0]);
    }

    #[test]
    fn ratios_within_compares_every_channel_pair() {
        assert!(ratios_within(&[vec![1.0, 0.5], vec![1.0, 0.5]], 1e-5));
        assert!(!ratios_within(&[vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 4.0], vec![1.0, 3.0, 2.0]], 1e-5));
        assert!(ratios_within(&[vec![], vec![]], 1e-5));
    }

    #[test]
    fn active_mask_marks_channels_above_threshold() {
        assert_eq!(fold(&[vec![0.0, 0.5]], 0).active_mask, 0b10);
        assert_eq!(fold(&[vec![-0.25, 0.0]], 0).active_mask, 0b01);
        assert_eq!(fold(&[vec![0.0, 0.0]], 0).active_mask, 0);
        assert_eq!(fold(&[vec![0.000001, 0.0]], 0).active_mask, 0);
    }

    #[test]
    fn active_mask_only_grows() {
        let s = state()
            .update(&SampleBlock::from_frames(&[vec![0.5, 0.0]]))
            .unwrap()
            .update(&SampleBlock::from_frames(&[vec![0.0, 0.0]]))
            .unwrap();
        assert_eq!(s.active_mask, 0b01);
    }

    #[test]
    fn single_channel_is_correlated_immediately() {
        assert_eq!(fold(&[vec![0.3]], 0).correlation, Correlation::Correlated);
    }

    #[test]
    fn uncorrelated_is_sticky() {
        let first = SampleBlock::from_frames(&[vec![0.1, 0.1], vec![0.2, 0.3]]);
        let second = SampleBlock::from_frames(&[vec![0.4, 0.6], vec![0.8, 1.2]]);
        let s = state().update(&first).unwrap();
        assert_eq!(s.correlation, Correlation::Uncorrelated);
        let s = s.update(&second).unwrap();
        assert_eq!(s.correlation, Correlation::Uncorrelated);
    }

    #[test]
    fn fixed_gain_pan_is_correlated() {
        let frames: Vec<Vec<f32>> = sine(256, 0.3).into_iter().map(|s| vec![s, s * 0.5]).collect();
        let s = fold(&frames, 64);
        assert_eq!(s.correlation, Correlation::Correlated);
        assert_eq!(s.active_mask, 0b11);
    }

    #[test]
    fn reference_sample_keeps_strongest_all_nonzero_frame() {
        let s = state()
            .update(&SampleBlock::from_frames(&[vec![0.9, 0.45], vec![0.99, 0.0]]))
            .unwrap()
            .update(&SampleBlock::from_frames(&[vec![0.2, 0.1]]))
            .unwrap();
        assert_eq!(s.reference_sample, vec![0.9, 0.45]);

        let s = s.update(&SampleBlock::from_frames(&[vec![-0.95, 0.1]])).unwrap();
        assert_eq!(s.reference_sample, vec![-0.95, 0.1]);
    }

    #[test]
    fn reference_sample_untouched_without_qualifying_frame() {
        let s = fold(&[vec![0.5, 0.0], vec![0.0, 0.5]], 0);
        assert!(s.reference_sample.is_empty());
    }

    #[test]
    fn channel_count_change_fails_fast() {
        let err = state()
            .update(&SampleBlock::from_frames(&[vec![0.1, 0.2]]))
            .unwrap()
            .update(&SampleBlock::from_frames(&[vec![0.1, 0.2, 0.3]]))
            .unwrap_err();
        assert!(matches!(
            err,
            AudioError::InconsistentChannelCount { expected: 2, found: 3 }
        ));
    }

    #[test]
    fn block_size_does_not_change_the_result() {
        let left = sine(300, 0.0);
        let right = sine(300, 1.3);
        let streams: Vec<Vec<Vec<f32>>> = vec![
            left.iter().zip(&right).map(|(l, r)| vec![*l, *r]).collect(),
            left.iter().map(|l| vec![*l, *l * 0.25]).collect(),
            left.iter().map(|l| vec![*l, 0.0, *l]).collect(),
        ];
        for frames in &streams {
            let whole = fold(frames, 0);
            for size in [1, 2, 7, 64, 299] {
                assert_eq!(fold(frames, size), whole, "block size {}", size);
            }
        }
    }
}
