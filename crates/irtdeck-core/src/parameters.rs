//! The fitted-model parameter set.
//!
//! A [`ModelParameters`] value carries every fixed estimate the evaluator and
//! renderers need. It is built once (from a TOML file or a preset) and then
//! only read.

use serde::{Deserialize, Serialize};

use crate::covariance::RandomEffects;
use crate::error::IrtResult;
use crate::model::ItemSpec;
use crate::pharmacology::{DiseaseProgression, DrugEffect};

/// Descriptive metadata about the fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique identifier (e.g. "cladribine-edss").
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Literature reference.
    #[serde(default)]
    pub reference: String,
    /// Drug under study.
    #[serde(default)]
    pub drug: String,
    /// Indication / population.
    #[serde(default)]
    pub indication: String,
    /// Name of the latent trait (e.g. "Disability").
    #[serde(default = "default_trait_name")]
    pub latent_trait: String,
}

fn default_trait_name() -> String {
    "Disability".to_string()
}

impl ModelInfo {
    /// `id` reduced to a single safe file-name component.
    ///
    /// Characters other than ASCII alphanumerics, `-`, `_` and `.` become `_`,
    /// and leading dots are dropped.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_start_matches('.');
        if stem.is_empty() {
            "model".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Population mean of one FREM covariate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovariateMean {
    pub name: String,
    pub mean: f64,
    #[serde(default)]
    pub unit: String,
}

/// Estimation summary reported alongside the parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitSummary {
    /// Objective function value.
    #[serde(default)]
    pub objective_function: Option<f64>,
    /// Estimation method (e.g. "LAPLACIAN").
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub observations: Option<u32>,
    #[serde(default)]
    pub subjects: Option<u32>,
    #[serde(default)]
    pub thetas: Option<u32>,
    #[serde(default)]
    pub omegas: Option<u32>,
}

/// The complete immutable parameter set of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub model: ModelInfo,
    pub progression: DiseaseProgression,
    pub drug_effect: DrugEffect,
    pub random_effects: RandomEffects,
    #[serde(default)]
    pub covariates: Vec<CovariateMean>,
    #[serde(default)]
    pub fit: FitSummary,
    pub items: Vec<ItemSpec>,
}

impl ModelParameters {
    /// Check every numeric block that is not validated on construction.
    pub fn validate(&self) -> IrtResult<()> {
        self.progression.validate()?;
        self.drug_effect.validate()?;
        self.random_effects.validate()?;
        Ok(())
    }

    /// Item with the given name.
    pub fn item(&self, name: &str) -> Option<&ItemSpec> {
        self.items.iter().find(|i| i.name() == name)
    }

    /// Total number of cumulative thresholds across the battery.
    pub fn threshold_count(&self) -> usize {
        self.items.iter().map(|i| i.category_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::Correlation;

    fn params() -> ModelParameters {
        ModelParameters {
            model: ModelInfo {
                id: "synthetic".into(),
                title: "Synthetic".into(),
                reference: String::new(),
                drug: String::new(),
                indication: String::new(),
                latent_trait: default_trait_name(),
            },
            progression: DiseaseProgression {
                slope: 0.1,
                power: 1.0,
            },
            drug_effect: DrugEffect {
                emax: 0.2,
                ec50: 100.0,
                protective: 0.1,
            },
            random_effects: RandomEffects {
                names: vec!["a".into(), "b".into()],
                variances: vec![1.0, 2.0],
                correlations: vec![Correlation {
                    first: "a".into(),
                    second: "b".into(),
                    value: 0.3,
                }],
            },
            covariates: vec![],
            fit: FitSummary::default(),
            items: vec![
                ItemSpec::new("one", vec![0.0], 1.0, 2).unwrap(),
                ItemSpec::new("two", vec![0.0, 1.0], 2.0, 3).unwrap(),
            ],
        }
    }

    #[test]
    fn validate_accepts_consistent_parameters() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_drug_effect() {
        let mut p = params();
        p.drug_effect.ec50 = -1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn item_lookup_and_counts() {
        let p = params();
        assert_eq!(p.item("two").unwrap().discrimination(), 2.0);
        assert!(p.item("three").is_none());
        assert_eq!(p.threshold_count(), 3);
    }

    #[test]
    fn file_stem_stays_in_one_component() {
        let mut info = params().model;
        assert_eq!(info.file_stem(), "synthetic");

        info.id = "../../etc/x".into();
        assert_eq!(info.file_stem(), "_.._etc_x");
        info.id = "a/b\\c d".into();
        assert_eq!(info.file_stem(), "a_b_c_d");
        info.id = "..".into();
        assert_eq!(info.file_stem(), "model");
        info.id = String::new();
        assert_eq!(info.file_stem(), "model");
    }
}
