//! Disease progression and drug effect curves.
//!
//! The latent disability trajectory of the fitted model is
//!
//! PD(t) = P1 + (θ₁ + P2) · t^θ₂ · (1 - Ef_prot) - Ef_symp
//!
//! with `t` in years. The individual offsets `P1`/`P2` are random effects and
//! are not modelled here; the curves below use the population slope.

use serde::{Deserialize, Serialize};

use crate::error::{IrtError, IrtResult};
use crate::model::EvaluationGrid;

/// Population disease progression: `slope · t^power`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiseaseProgression {
    /// Progression slope θ₁ (disability units per year at t = 1).
    pub slope: f64,
    /// Time-course exponent θ₂.
    pub power: f64,
}

impl DiseaseProgression {
    pub fn validate(&self) -> IrtResult<()> {
        if !self.slope.is_finite() {
            return Err(IrtError::InvalidParameter(format!(
                "progression slope must be finite, got {}",
                self.slope
            )));
        }
        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(IrtError::InvalidParameter(format!(
                "progression power must be positive, got {}",
                self.power
            )));
        }
        Ok(())
    }

    /// Untreated progression at `years`; zero before baseline.
    pub fn untreated(&self, years: f64) -> f64 {
        if years <= 0.0 {
            0.0
        } else {
            self.slope * years.powf(self.power)
        }
    }
}

/// Symptomatic (Emax) and protective drug effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrugEffect {
    /// Maximal symptomatic effect.
    pub emax: f64,
    /// Exposure giving half the maximal symptomatic effect.
    pub ec50: f64,
    /// Fractional reduction of the progression rate, in `[0, 1]`.
    pub protective: f64,
}

impl DrugEffect {
    pub fn validate(&self) -> IrtResult<()> {
        if !self.emax.is_finite() {
            return Err(IrtError::InvalidParameter(format!(
                "emax must be finite, got {}",
                self.emax
            )));
        }
        if !self.ec50.is_finite() || self.ec50 <= 0.0 {
            return Err(IrtError::InvalidParameter(format!(
                "ec50 must be positive, got {}",
                self.ec50
            )));
        }
        if !(0.0..=1.0).contains(&self.protective) {
            return Err(IrtError::InvalidParameter(format!(
                "protective effect must lie in [0, 1], got {}",
                self.protective
            )));
        }
        Ok(())
    }

    /// Symptomatic effect `Emax · x / (x + EC50)` at exposure `x`.
    /// Negative exposures are treated as zero.
    pub fn symptomatic(&self, exposure: f64) -> f64 {
        let x = exposure.max(0.0);
        self.emax * x / (x + self.ec50)
    }

    /// Progression rate once the protective effect applies.
    pub fn protected_slope(&self, progression: &DiseaseProgression) -> f64 {
        progression.slope * (1.0 - self.protective)
    }
}

/// Progression under the three treatment scenarios of the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionCurves {
    /// Time points in years.
    pub years: Vec<f64>,
    /// No treatment.
    pub placebo: Vec<f64>,
    /// Protective effect only.
    pub protective: Vec<f64>,
    /// Protective plus symptomatic effect at `reference_exposure`.
    pub combined: Vec<f64>,
    /// Exposure used for the symptomatic offset.
    pub reference_exposure: f64,
}

impl ProgressionCurves {
    /// Treatment benefit (placebo minus combined) at each time point.
    pub fn benefit(&self) -> Vec<f64> {
        self.placebo
            .iter()
            .zip(&self.combined)
            .map(|(p, c)| p - c)
            .collect()
    }
}

/// Evaluate the three progression scenarios over `time` (in years).
///
/// The symptomatic offset uses `reference_exposure`, or EC50 when `None`.
pub fn progression_curves(
    progression: &DiseaseProgression,
    drug: &DrugEffect,
    time: &EvaluationGrid,
    reference_exposure: Option<f64>,
) -> IrtResult<ProgressionCurves> {
    progression.validate()?;
    drug.validate()?;

    let reference_exposure = reference_exposure.unwrap_or(drug.ec50);
    if !reference_exposure.is_finite() || reference_exposure < 0.0 {
        return Err(IrtError::InvalidParameter(format!(
            "reference exposure must be non-negative, got {reference_exposure}"
        )));
    }
    let offset = drug.symptomatic(reference_exposure);

    let placebo: Vec<f64> = time.points().iter().map(|&t| progression.untreated(t)).collect();
    let protective: Vec<f64> = placebo.iter().map(|p| p * (1.0 - drug.protective)).collect();
    let combined: Vec<f64> = protective.iter().map(|p| p - offset).collect();

    Ok(ProgressionCurves {
        years: time.points().to_vec(),
        placebo,
        protective,
        combined,
        reference_exposure,
    })
}

/// Exposure-response curve of the symptomatic effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmaxCurve {
    pub exposure: Vec<f64>,
    pub effect: Vec<f64>,
    pub emax: f64,
    pub ec50: f64,
}

/// Evaluate the symptomatic effect over an exposure grid.
pub fn emax_curve(drug: &DrugEffect, exposure: &EvaluationGrid) -> IrtResult<EmaxCurve> {
    drug.validate()?;
    Ok(EmaxCurve {
        exposure: exposure.points().to_vec(),
        effect: exposure.points().iter().map(|&x| drug.symptomatic(x)).collect(),
        emax: drug.emax,
        ec50: drug.ec50,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progression() -> DiseaseProgression {
        DiseaseProgression {
            slope: 0.093,
            power: 0.71,
        }
    }

    fn drug() -> DrugEffect {
        DrugEffect {
            emax: 0.17,
            ec50: 408.29,
            protective: 0.209,
        }
    }

    #[test]
    fn emax_at_ec50_is_half() {
        let d = drug();
        assert!((d.symptomatic(d.ec50) - d.emax / 2.0).abs() < 1e-15);
        assert_eq!(d.symptomatic(0.0), 0.0);
        assert_eq!(d.symptomatic(-10.0), 0.0);
        assert!(d.symptomatic(1e9) < d.emax);
    }

    #[test]
    fn progression_at_one_year_equals_slope() {
        let p = progression();
        assert!((p.untreated(1.0) - 0.093).abs() < 1e-15);
        assert_eq!(p.untreated(0.0), 0.0);
        assert!(p.untreated(5.0) > p.untreated(2.0));
    }

    #[test]
    fn protected_slope_reduces_rate() {
        let slope = drug().protected_slope(&progression());
        assert!((slope - 0.093 * 0.791).abs() < 1e-15);
    }

    #[test]
    fn progression_curves_scenarios() {
        let time = EvaluationGrid::linspace(0.0, 5.0, 11).unwrap();
        let curves = progression_curves(&progression(), &drug(), &time, None).unwrap();
        assert_eq!(curves.years.len(), 11);
        assert_eq!(curves.reference_exposure, 408.29);

        let offset = 0.17 / 2.0;
        for i in 0..11 {
            assert!(curves.protective[i] <= curves.placebo[i]);
            assert!((curves.combined[i] - (curves.protective[i] - offset)).abs() < 1e-12);
        }
        assert!(curves.benefit().iter().all(|&b| b > 0.0));
    }

    #[test]
    fn progression_curves_reject_bad_parameters() {
        let time = EvaluationGrid::linspace(0.0, 5.0, 3).unwrap();
        let bad_drug = DrugEffect {
            protective: 1.5,
            ..drug()
        };
        assert!(matches!(
            progression_curves(&progression(), &bad_drug, &time, None),
            Err(IrtError::InvalidParameter(_))
        ));

        let bad_progression = DiseaseProgression {
            power: 0.0,
            ..progression()
        };
        assert!(progression_curves(&bad_progression, &drug(), &time, None).is_err());
        assert!(progression_curves(&progression(), &drug(), &time, Some(-1.0)).is_err());
    }

    #[test]
    fn emax_curve_validates_ec50() {
        let grid = EvaluationGrid::linspace(0.0, 2000.0, 5).unwrap();
        let curve = emax_curve(&drug(), &grid).unwrap();
        assert_eq!(curve.effect.len(), 5);
        assert!(curve.effect.windows(2).all(|w| w[1] > w[0]));

        let bad = DrugEffect { ec50: 0.0, ..drug() };
        assert!(emax_curve(&bad, &grid).is_err());
    }
}
