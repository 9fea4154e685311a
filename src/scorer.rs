use crate::bands::{Band, BandSample, Bands};

pub type WaveScores = Bands<i64>;
pub type SessionTotals = Bands<i64>;

/// Per-tick channel sums
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveSums {
    pub sums: Bands<f64>,
    /// delta + theta + alpha + beta; the ratio bands are left out
    pub wave_total: f64,
}

impl WaveSums {
    pub fn from_sample(sample: &BandSample) -> Self {
        let sums = Bands::from_fn(|band| sum_waves(sample.channels(band)));
        let wave_total = Band::PRIMARY.iter().map(|b| *sums.get(*b)).sum();

        Self { sums, wave_total }
    }
}

pub fn sum_waves(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Share of `value` in `total` as a truncated percentage.
///
/// Zero on either side scores zero. Nothing is clamped: a value larger than
/// its total scores above 100 and negative input can score below zero.
pub fn score_wave(total: f64, value: f64) -> i64 {
    if total == 0.0 || value == 0.0 {
        return 0;
    }
    ((value / total) * 100.0).trunc() as i64
}

/// Turns band samples into percentage scores and keeps the running totals
#[derive(Debug, Clone, Default)]
pub struct WaveScorer {
    sums: WaveSums,
    scores: WaveScores,
    totals: SessionTotals,
    ticks: u64,
}

impl WaveScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one tick and fold it into the totals
    pub fn analyze(&mut self, sample: &BandSample) -> WaveScores {
        let sums = WaveSums::from_sample(sample);

        let scores = Bands::from_fn(|band| {
            let total = if band.is_ratio() { 1.0 } else { sums.wave_total };
            score_wave(total, *sums.sums.get(band))
        });

        for (band, score) in scores.iter() {
            *self.totals.get_mut(band) += score;
        }

        self.sums = sums;
        self.scores = scores;
        self.ticks += 1;
        scores
    }

    pub fn sums(&self) -> &WaveSums {
        &self.sums
    }

    pub fn scores(&self) -> &WaveScores {
        &self.scores
    }

    pub fn totals(&self) -> &SessionTotals {
        &self.totals
    }

    /// Number of ticks folded into the totals
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
