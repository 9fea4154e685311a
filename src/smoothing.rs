use std::collections::VecDeque;

use crate::bands::{Band, BandSample};

/// Absolute band powers for one epoch, ordered delta, theta, alpha, beta
pub type EpochPowers = [f64; 4];

/// Rolling window of recent band-power epochs, one queue per channel.
///
/// Averaging the last few epochs irons out single-epoch spikes before the
/// powers reach the scorer.
#[derive(Debug, Clone)]
pub struct BandPowerBuffer {
    per_channel: Vec<VecDeque<EpochPowers>>,
    capacity: usize,
}

impl BandPowerBuffer {
    /// `capacity` is the number of epochs kept per channel; zero is treated as one
    pub fn new(channels: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            per_channel: (0..channels)
                .map(|_| VecDeque::with_capacity(capacity))
                .collect(),
            capacity,
        }
    }

    pub fn channels(&self) -> usize {
        self.per_channel.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an epoch for `channel`, evicting the oldest one when full.
    /// Unknown channels are ignored.
    pub fn push(&mut self, channel: usize, powers: EpochPowers) {
        let Some(queue) = self.per_channel.get_mut(channel) else {
            log::debug!("dropping epoch for unknown channel {channel}");
            return;
        };
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(powers);
    }

    pub fn len(&self, channel: usize) -> usize {
        self.per_channel.get(channel).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.per_channel.iter().all(VecDeque::is_empty)
    }

    /// Mean powers over the buffered epochs of `channel`
    pub fn smoothed(&self, channel: usize) -> Option<EpochPowers> {
        let queue = self.per_channel.get(channel)?;
        if queue.is_empty() {
            return None;
        }

        let mut mean = [0.0; 4];
        for epoch in queue {
            for (acc, power) in mean.iter_mut().zip(epoch) {
                *acc += power;
            }
        }
        let n = queue.len() as f64;
        mean.iter_mut().for_each(|m| *m /= n);
        Some(mean)
    }

    /// Build the per-tick sample from the smoothed powers of every channel
    /// that has data. Concentration is beta/theta, anxiety is theta/alpha.
    pub fn sample(&self) -> BandSample {
        let mut sample = BandSample::default();

        for channel in 0..self.channels() {
            let Some([delta, theta, alpha, beta]) = self.smoothed(channel) else {
                continue;
            };

            sample.channels_mut(Band::Delta).push(delta);
            sample.channels_mut(Band::Theta).push(theta);
            sample.channels_mut(Band::Alpha).push(alpha);
            sample.channels_mut(Band::Beta).push(beta);
            sample
                .channels_mut(Band::Concentration)
                .push(ratio(beta, theta));
            sample.channels_mut(Band::Anxiety).push(ratio(theta, alpha));
        }

        sample
    }

    pub fn clear(&mut self) {
        self.per_channel.iter_mut().for_each(VecDeque::clear);
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = BandPowerBuffer::new(2, 5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.smoothed(0), None);
        assert_eq!(buffer.sample(), BandSample::default());
    }

    #[test]
    fn test_zero_capacity_keeps_one_epoch() {
        let mut buffer = BandPowerBuffer::new(1, 0);
        buffer.push(0, [1.0, 1.0, 1.0, 1.0]);
        buffer.push(0, [3.0, 3.0, 3.0, 3.0]);

        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.smoothed(0), Some([3.0, 3.0, 3.0, 3.0]));
    }

    #[test]
    fn test_push_evicts_oldest_epoch() {
        let mut buffer = BandPowerBuffer::new(1, 2);
        buffer.push(0, [10.0, 0.0, 0.0, 0.0]);
        buffer.push(0, [2.0, 0.0, 0.0, 0.0]);
        buffer.push(0, [4.0, 0.0, 0.0, 0.0]);

        assert_eq!(buffer.len(0), 2);
        assert_eq!(buffer.smoothed(0).unwrap()[0], 3.0);
    }

    #[test]
    fn test_push_unknown_channel_is_ignored() {
        let mut buffer = BandPowerBuffer::new(1, 3);
        buffer.push(4, [1.0, 1.0, 1.0, 1.0]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(4), 0);
    }

    #[test]
    fn test_smoothed_is_mean_per_band() {
        let mut buffer = BandPowerBuffer::new(1, 4);
        buffer.push(0, [1.0, 2.0, 3.0, 4.0]);
        buffer.push(0, [3.0, 4.0, 5.0, 6.0]);

        assert_eq!(buffer.smoothed(0), Some([2.0, 3.0, 4.0, 5.0]));
    }

    #[test]
    fn test_sample_derives_ratio_bands() {
        let mut buffer = BandPowerBuffer::new(2, 3);
        buffer.push(0, [1.0, 2.0, 4.0, 3.0]);
        buffer.push(1, [1.0, 4.0, 2.0, 2.0]);

        let sample = buffer.sample();

        assert_eq!(sample.deltas, vec![1.0, 1.0]);
        assert_eq!(sample.betas, vec![3.0, 2.0]);
        assert_eq!(sample.concentrations, vec![1.5, 0.5]);
        assert_eq!(sample.anxieties, vec![0.5, 2.0]);
    }

    #[test]
    fn test_sample_skips_channels_without_data() {
        let mut buffer = BandPowerBuffer::new(3, 3);
        buffer.push(1, [1.0, 1.0, 1.0, 1.0]);

        let sample = buffer.sample();
        assert_eq!(sample.alphas.len(), 1);
    }

    #[test]
    fn test_zero_denominator_ratio_is_zero() {
        let mut buffer = BandPowerBuffer::new(1, 1);
        buffer.push(0, [1.0, 0.0, 0.0, 2.0]);

        let sample = buffer.sample();
        assert_eq!(sample.concentrations, vec![0.0]);
        assert_eq!(sample.anxieties, vec![0.0]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = BandPowerBuffer::new(2, 3);
        buffer.push(0, [1.0, 1.0, 1.0, 1.0]);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
