use serde::{Deserialize, Serialize};

/// One of the six signal categories tracked per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Concentration,
    Anxiety,
}

impl Band {
    pub const ALL: [Band; 6] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::Beta,
        Band::Concentration,
        Band::Anxiety,
    ];

    /// Bands that are raw powers and take part in `wave_total`
    pub const PRIMARY: [Band; 4] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta];

    /// Concentration and anxiety arrive as ratios, not powers
    pub fn is_ratio(&self) -> bool {
        matches!(self, Band::Concentration | Band::Anxiety)
    }
}

/// Fixed six-field record, one value per band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bands<T> {
    pub delta: T,
    pub theta: T,
    pub alpha: T,
    pub beta: T,
    pub concentration: T,
    pub anxiety: T,
}

impl<T> Bands<T> {
    pub fn get(&self, band: Band) -> &T {
        match band {
            Band::Delta => &self.delta,
            Band::Theta => &self.theta,
            Band::Alpha => &self.alpha,
            Band::Beta => &self.beta,
            Band::Concentration => &self.concentration,
            Band::Anxiety => &self.anxiety,
        }
    }

    pub fn get_mut(&mut self, band: Band) -> &mut T {
        match band {
            Band::Delta => &mut self.delta,
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Concentration => &mut self.concentration,
            Band::Anxiety => &mut self.anxiety,
        }
    }

    /// Build a record by evaluating `f` once per band, in `Band::ALL` order
    pub fn from_fn<F: FnMut(Band) -> T>(mut f: F) -> Self {
        Self {
            delta: f(Band::Delta),
            theta: f(Band::Theta),
            alpha: f(Band::Alpha),
            beta: f(Band::Beta),
            concentration: f(Band::Concentration),
            anxiety: f(Band::Anxiety),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, &T)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }
}

/// A tick's raw input: per-channel values for every band.
///
/// Field names follow the acquisition payload (`deltas`, `thetas`, ...), so
/// recorded streams deserialize directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandSample {
    #[serde(default)]
    pub deltas: Vec<f64>,
    #[serde(default)]
    pub thetas: Vec<f64>,
    #[serde(default)]
    pub alphas: Vec<f64>,
    #[serde(default)]
    pub betas: Vec<f64>,
    #[serde(default)]
    pub concentrations: Vec<f64>,
    #[serde(default)]
    pub anxieties: Vec<f64>,
}

impl BandSample {
    pub fn channels(&self, band: Band) -> &[f64] {
        match band {
            Band::Delta => &self.deltas,
            Band::Theta => &self.thetas,
            Band::Alpha => &self.alphas,
            Band::Beta => &self.betas,
            Band::Concentration => &self.concentrations,
            Band::Anxiety => &self.anxieties,
        }
    }

    pub fn channels_mut(&mut self, band: Band) -> &mut Vec<f64> {
        match band {
            Band::Delta => &mut self.deltas,
            Band::Theta => &mut self.thetas,
            Band::Alpha => &mut self.alphas,
            Band::Beta => &mut self.betas,
            Band::Concentration => &mut self.concentrations,
            Band::Anxiety => &mut self.anxieties,
        }
    }

    /// Mean alpha over the active channels, halved to the 0..1 range the
    /// focus ring expects. Empty alpha data reads as zero.
    pub fn alpha_average(&self) -> f64 {
        if self.alphas.is_empty() {
            return 0.0;
        }
        let mean = self.alphas.iter().sum::<f64>() / self.alphas.len() as f64;
        mean / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_display_is_lowercase() {
        assert_eq!(Band::Delta.to_string(), "delta");
        assert_eq!(Band::Concentration.to_string(), "concentration");
    }

    #[test]
    fn test_ratio_bands() {
        let ratios: Vec<Band> = Band::ALL.into_iter().filter(|b| b.is_ratio()).collect();
        assert_eq!(ratios, vec![Band::Concentration, Band::Anxiety]);
        assert!(Band::PRIMARY.iter().all(|b| !b.is_ratio()));
    }

    #[test]
    fn test_bands_get_mut_targets_named_field() {
        let mut bands: Bands<i64> = Bands::default();
        *bands.get_mut(Band::Beta) += 7;
        assert_eq!(bands.beta, 7);
        assert_eq!(*bands.get(Band::Beta), 7);
        assert_eq!(bands.alpha, 0);
    }

    #[test]
    fn test_bands_from_fn_order() {
        let mut seen = vec![];
        let bands = Bands::from_fn(|b| {
            seen.push(b);
            seen.len()
        });
        assert_eq!(seen, Band::ALL.to_vec());
        assert_eq!(bands.delta, 1);
        assert_eq!(bands.anxiety, 6);
    }

    #[test]
    fn test_sample_deserializes_acquisition_payload() {
        let json = r#"{"deltas":[1.0],"thetas":[2.0],"alphas":[0.5,0.5],"betas":[4.0],"concentrations":[5.0],"anxieties":[6.0]}"#;
        let sample: BandSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.channels(Band::Alpha), &[0.5, 0.5]);
        assert_eq!(sample.channels(Band::Anxiety), &[6.0]);
    }

    #[test]
    fn test_sample_missing_band_defaults_to_empty() {
        let sample: BandSample = serde_json::from_str(r#"{"alphas":[0.2]}"#).unwrap();
        assert!(sample.deltas.is_empty());
        assert!(sample.anxieties.is_empty());
    }

    #[test]
    fn test_alpha_average() {
        let sample = BandSample {
            alphas: vec![0.5, 1.5],
            ..Default::default()
        };
        assert_eq!(sample.alpha_average(), 0.5);
        assert_eq!(BandSample::default().alpha_average(), 0.0);
    }
}
