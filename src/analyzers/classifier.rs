use std::fmt;

use serde::Serialize;

use crate::analyzers::accumulator::AccumulatorState;
use crate::{AudioError, Result};

/// Which channels of a file carry content worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelVerdict {
    pub channels: usize,
    pub valid_channel_mask: u64,
    pub correlated: bool,
    pub is_empty: bool,
    pub is_mono: bool,
    pub is_fake_stereo: bool,
    pub is_stereo: bool,
    pub is_multichannel: bool,
}

impl ChannelVerdict {
    pub fn new(channels: usize, valid_channel_mask: u64, correlated: bool) -> Self {
        let valid = valid_channel_mask.count_ones();
        let is_empty = valid_channel_mask == 0 || channels == 0;
        Self {
            channels,
            valid_channel_mask,
            correlated,
            is_empty,
            is_mono: channels == 1 && !is_empty,
            is_fake_stereo: (correlated || valid == 1) && channels == 2 && !is_empty,
            is_stereo: channels == 2 && valid == 2 && !correlated,
            is_multichannel: channels > 2 && valid > 2 && !correlated,
        }
    }

    pub fn valid_channel_count(&self) -> u32 {
        self.valid_channel_mask.count_ones()
    }

    /// Index of the only valid channel, if exactly one is set.
    pub fn single_channel(&self) -> Option<usize> {
        (self.valid_channel_count() == 1).then(|| self.valid_channel_mask.trailing_zeros() as usize)
    }

    pub fn category(&self) -> ChannelCategory {
        if self.is_empty {
            ChannelCategory::Empty
        } else if self.is_mono {
            ChannelCategory::Mono
        } else if self.is_fake_stereo {
            ChannelCategory::FakeStereo
        } else if self.is_stereo {
            ChannelCategory::Stereo
        } else if self.is_multichannel {
            ChannelCategory::Multichannel
        } else {
            ChannelCategory::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelCategory {
    Empty,
    Mono,
    FakeStereo,
    Stereo,
    Multichannel,
    /// Several channels, some of them silent, not a plain stereo pair.
    Partial,
}

impl ChannelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelCategory::Empty => "Empty",
            ChannelCategory::Mono => "Mono",
            ChannelCategory::FakeStereo => "Fake stereo",
            ChannelCategory::Stereo => "Stereo",
            ChannelCategory::Multichannel => "Multichannel",
            ChannelCategory::Partial => "Partially silent",
        }
    }
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Turn the final accumulator state into a verdict.
pub fn classify(state: &AccumulatorState) -> Result<ChannelVerdict> {
    let correlated = state.correlation.is_correlated();
    let mask = valid_channel_mask(state)?;
    Ok(ChannelVerdict::new(state.channels, mask, correlated))
}

fn valid_channel_mask(state: &AccumulatorState) -> Result<u64> {
    let active = state.active_mask;
    if active == 0 {
        return Ok(0);
    }
    if state.channels == 1 {
        return Ok(1);
    }

    let all_channels = if state.channels >= 64 {
        u64::MAX
    } else {
        (1u64 << state.channels) - 1
    };
    let correlated = state.correlation.is_correlated();

    if !correlated && active == all_channels {
        return Ok(active);
    }
    if correlated {
        // Loudest channel of the reference frame, lowest index on ties.
        let selected = state
            .reference_sample
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
                Some((_, top)) if s.abs() <= top => best,
                _ => Some((i, s.abs())),
            })
            .map(|(i, _)| i)
            .ok_or(AudioError::InsufficientSample)?;
        return Ok(1u64 << selected);
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::accumulator::Correlation;
    use crate::audio::source::MemorySource;
    use pretty_assertions::assert_eq;

    fn verdict_of(frames: &[Vec<f32>]) -> ChannelVerdict {
        let state = AccumulatorState::new(1e-5, 1e-5)
            .fold_source(&mut MemorySource::from_frames(frames), 32)
            .unwrap();
        classify(&state).unwrap()
    }

    fn sine(n: usize, step: f32) -> Vec<f32> {
        (1..=n).map(|i| (i as f32 * step).sin() * 0.5).collect()
    }

    #[test]
    fn mono_with_signal_is_mono() {
        let frames: Vec<Vec<f32>> = sine(100, 0.05).into_iter().map(|s| vec![s]).collect();
        let v = verdict_of(&frames);
        assert!(v.is_mono);
        assert!(!v.is_empty);
        assert_eq!(v.valid_channel_mask, 1);
        assert_eq!(v.category(), ChannelCategory::Mono);
    }

    #[test]
    fn silence_is_empty_for_any_channel_count() {
        for channels in 1..=4 {
            let v = verdict_of(&vec![vec![0.0; channels]; 50]);
            assert!(v.is_empty);
            assert!(!v.is_mono && !v.is_fake_stereo && !v.is_stereo && !v.is_multichannel);
            assert_eq!(v.valid_channel_mask, 0);
        }
    }

    #[test]
    fn identical_channels_keep_the_first() {
        let frames: Vec<Vec<f32>> = sine(100, 0.05).into_iter().map(|s| vec![s, s]).collect();
        let v = verdict_of(&frames);
        assert!(v.correlated);
        assert!(v.is_fake_stereo);
        assert!(!v.is_stereo);
        assert_eq!(v.valid_channel_mask, 1);
        assert_eq!(v.single_channel(), Some(0));
    }

    #[test]
    fn fixed_pan_selects_louder_channel() {
        let frames: Vec<Vec<f32>> = sine(100, 0.05).into_iter().map(|s| vec![s * 0.5, s]).collect();
        let v = verdict_of(&frames);
        assert!(v.is_fake_stereo);
        assert_eq!(v.valid_channel_mask, 0b10);

        let frames: Vec<Vec<f32>> = sine(100, 0.05).into_iter().map(|s| vec![s, s * 0.5]).collect();
        assert_eq!(verdict_of(&frames).valid_channel_mask, 0b01);
    }

    #[test]
    fn hard_panned_channel_is_fake_stereo() {
        let frames: Vec<Vec<f32>> = sine(100, 0.05).into_iter().map(|s| vec![0.0, s]).collect();
        let v = verdict_of(&frames);
        assert!(!v.correlated);
        assert_eq!(v.valid_channel_mask, 0b10);
        assert!(v.is_fake_stereo);
    }

    #[test]
    fn independent_channels_are_true_stereo() {
        let left = sine(100, 0.05);
        let right = sine(100, 0.21);
        let frames: Vec<Vec<f32>> = left.into_iter().zip(right).map(|(l, r)| vec![l, r]).collect();
        let v = verdict_of(&frames);
        assert!(v.is_stereo);
        assert!(!v.is_fake_stereo);
        assert_eq!(v.valid_channel_mask, 0b11);
        assert_eq!(v.category(), ChannelCategory::Stereo);
    }

    #[test]
    fn partially_silent_multichannel_keeps_active_channels() {
        let a = sine(100, 0.05);
        let b = sine(100, 0.13);
        let frames: Vec<Vec<f32>> = a.into_iter().zip(b).map(|(a, b)| vec![a, 0.0, b]).collect();
        let v = verdict_of(&frames);
        assert_eq!(v.valid_channel_mask, 0b101);
        assert!(!v.is_multichannel);
        assert_eq!(v.category(), ChannelCategory::Partial);

        let c = sine(100, 0.31);
        let frames: Vec<Vec<f32>> = sine(100, 0.05)
            .into_iter()
            .zip(sine(100, 0.13))
            .zip(c)
            .map(|((a, b), c)| vec![a, b, c])
            .collect();
        assert!(verdict_of(&frames).is_multichannel);
    }

    #[test]
    fn correlated_without_reference_sample_is_an_error() {
        let mut state = AccumulatorState::new(1e-5, 1e-5);
        state.channels = 2;
        state.active_mask = 0b01;
        state.correlation = Correlation::Correlated;
        assert!(matches!(classify(&state), Err(AudioError::InsufficientSample)));
    }

    #[test]
    fn classification_is_repeatable() {
        let frames: Vec<Vec<f32>> = sine(64, 0.07).into_iter().map(|s| vec![s, s * 0.3]).collect();
        assert_eq!(verdict_of(&frames), verdict_of(&frames));
    }
}
