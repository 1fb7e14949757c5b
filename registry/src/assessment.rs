//! Vegetation-change impact assessment.
//!
//! Turns before/after vegetation index summaries for a plot into a 0-100
//! impact figure a verifier can submit. The registry never calls this itself:
//! scores stay whatever the verifier submits.

use serde::{Deserialize, Serialize};

use verileaf_types::ImpactScore;

/// Guards the relative change against a zero baseline.
const EPSILON: f64 = 1e-6;

const NDVI_WEIGHT: f64 = 0.4;
const EVI_WEIGHT: f64 = 0.2;
const FVC_WEIGHT: f64 = 0.2;
const LAI_WEIGHT: f64 = 0.2;

const BASE_CONFIDENCE: f64 = 70.0;
const NOISE_PENALTY: f64 = 5.0;
const MIN_CONFIDENCE: f64 = 50.0;
const MAX_CONFIDENCE: f64 = 95.0;

/// Mean and spread of each vegetation index over one image of a plot.
///
/// Missing fields read as zero; unknown fields are ignored, so the output of
/// an external image pipeline can be fed in as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationMetrics {
    pub ndvi_mean: f64,
    pub ndvi_std: f64,
    pub evi_mean: f64,
    pub evi_std: f64,
    pub fvc_mean: f64,
    pub fvc_std: f64,
    pub lai_mean: f64,
    pub lai_std: f64,
}

impl VegetationMetrics {
    fn std_devs(&self) -> [f64; 4] {
        [self.ndvi_std, self.evi_std, self.fvc_std, self.lai_std]
    }
}

/// Qualitative band of an impact figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactCategory {
    Excellent,
    Good,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl ImpactCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 65.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Moderate
        } else if score >= 35.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }
}

/// Result of comparing two [`VegetationMetrics`] of the same plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub impact_score: f64,
    pub confidence: f64,
    pub category: ImpactCategory,
    pub ndvi_change_percent: f64,
    pub evi_change_percent: f64,
    pub fvc_change_percent: f64,
    pub lai_change_percent: f64,
    pub weighted_score: f64,
}

impl ImpactAssessment {
    /// Compare `before` and `after`.
    ///
    /// The weighted relative change of the index means moves the score away
    /// from a neutral 50; shifts in the spreads lower the confidence.
    pub fn from_metrics(before: &VegetationMetrics, after: &VegetationMetrics) -> Self {
        let ndvi = change_percent(before.ndvi_mean, after.ndvi_mean);
        let evi = change_percent(before.evi_mean, after.evi_mean);
        let fvc = change_percent(before.fvc_mean, after.fvc_mean);
        let lai = change_percent(before.lai_mean, after.lai_mean);

        let weighted = NDVI_WEIGHT * ndvi + EVI_WEIGHT * evi + FVC_WEIGHT * fvc + LAI_WEIGHT * lai;
        let impact_score = clamp(50.0 + weighted / 2.0, 0.0, 100.0);

        let noise: f64 = before
            .std_devs()
            .iter()
            .zip(after.std_devs())
            .map(|(b, a)| (b - a).abs())
            .sum();
        let confidence = clamp(
            BASE_CONFIDENCE - noise * NOISE_PENALTY,
            MIN_CONFIDENCE,
            MAX_CONFIDENCE,
        );

        Self {
            impact_score,
            confidence,
            category: ImpactCategory::from_score(impact_score),
            ndvi_change_percent: ndvi,
            evi_change_percent: evi,
            fvc_change_percent: fvc,
            lai_change_percent: lai,
            weighted_score: weighted,
        }
    }

    /// The impact figure rounded to a submittable score.
    pub fn score(&self) -> ImpactScore {
        let rounded = self.impact_score.round().clamp(0.0, 100.0) as u32;
        ImpactScore::new(rounded).unwrap_or(ImpactScore::MIN)
    }
}

fn change_percent(before: f64, after: f64) -> f64 {
    (after - before) / (before.abs() + EPSILON) * 100.0
}

// NaN inputs pin to the lower bound instead of propagating.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
