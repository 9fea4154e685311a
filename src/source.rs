use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bands::BandSample;
use crate::error::{NeuroError, Result};
use crate::smoothing::{BandPowerBuffer, EpochPowers};

/// Supplies one band sample per tick.
///
/// Implementations must return promptly; the game loop calls `pull` on every
/// frame and never waits on it.
pub trait BandSource {
    fn pull(&mut self) -> BandSample;

    /// Short label for the status line
    fn name(&self) -> &str;
}

/// Constant sample, handy when no headset is around
#[derive(Debug, Clone)]
pub struct FixedSource {
    sample: BandSample,
}

impl FixedSource {
    pub fn new(sample: BandSample) -> Self {
        Self { sample }
    }

    /// The two-channel reading used for offline development
    pub fn dev() -> Self {
        Self::new(BandSample {
            deltas: vec![1.0],
            thetas: vec![2.0],
            alphas: vec![0.5, 0.5],
            betas: vec![4.0],
            concentrations: vec![5.0],
            anxieties: vec![6.0],
        })
    }
}

impl BandSource for FixedSource {
    fn pull(&mut self) -> BandSample {
        self.sample.clone()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

// Drift per epoch as a fraction of the current power
const WALK_STEP: f64 = 0.15;
const MIN_POWER: f64 = 0.05;
const MAX_POWER: f64 = 2.0;

/// Random-walk band powers fed through the smoothing buffer
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
    powers: Vec<EpochPowers>,
    buffer: BandPowerBuffer,
}

impl SimulatedSource {
    pub fn new(channels: usize, window: usize) -> Self {
        Self::with_rng(StdRng::from_entropy(), channels, window)
    }

    /// Reproducible stream for tests and demos
    pub fn seeded(seed: u64, channels: usize, window: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), channels, window)
    }

    fn with_rng(rng: StdRng, channels: usize, window: usize) -> Self {
        Self {
            rng,
            powers: vec![[0.6, 0.5, 0.8, 0.4]; channels],
            buffer: BandPowerBuffer::new(channels, window),
        }
    }
}

impl BandSource for SimulatedSource {
    fn pull(&mut self) -> BandSample {
        for (channel, powers) in self.powers.iter_mut().enumerate() {
            for power in powers.iter_mut() {
                let drift = self.rng.gen_range(-WALK_STEP..=WALK_STEP);
                *power = (*power * (1.0 + drift)).clamp(MIN_POWER, MAX_POWER);
            }
            self.buffer.push(channel, *powers);
        }
        self.buffer.sample()
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Replays recorded samples, one JSON object per line, looping at the end
#[derive(Debug, Clone)]
pub struct ReplaySource {
    samples: Vec<BandSample>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(samples: Vec<BandSample>) -> Self {
        Self { samples, cursor: 0 }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Blank lines are skipped; a malformed line fails with its 1-based number
    pub fn parse(text: &str) -> Result<Self> {
        let samples = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<BandSample>(line).map_err(|source| NeuroError::Replay {
                    line: idx + 1,
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("loaded {} replay samples", samples.len());
        Ok(Self::new(samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl BandSource for ReplaySource {
    fn pull(&mut self) -> BandSample {
        if self.samples.is_empty() {
            return BandSample::default();
        }
        let sample = self.samples[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.samples.len();
        sample
    }

    fn name(&self) -> &str {
        "replay"
    }
}
