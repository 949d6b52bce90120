//! Model evaluation report with JSON persistence.
//!
//! A [`ModelReport`] bundles every evaluated curve of a fitted model. The
//! renderers in `irtdeck-report` read nothing but this structure.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IrtdeckConfig;
use crate::covariance::{summarize, CorrelationSummary};
use crate::grm::item_thresholds;
use crate::model::DiscriminationClass;
use crate::parameters::{CovariateMean, FitSummary, ModelInfo, ModelParameters};
use crate::parser::validate_parameters;
use crate::pharmacology::{
    emax_curve, progression_curves, DiseaseProgression, DrugEffect, EmaxCurve, ProgressionCurves,
};
use crate::statistics::{evaluate_battery, summarize_discrimination, BatteryResult, DiscriminationSummary};

/// Number of strongest correlations kept in the summary.
const TOP_CORRELATIONS: usize = 5;

/// A complete model report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the fitted model.
    pub model: ModelSummary,
    /// Per-item parameter rows.
    pub items: Vec<ItemSummary>,
    /// Item and test curves over the latent-trait grid.
    pub battery: BatteryResult,
    pub discrimination: DiscriminationSummary,
    pub progression: ProgressionCurves,
    pub emax: EmaxCurve,
    pub correlations: CorrelationSummary,
    /// Non-fatal validation findings.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Summary of a fitted model (without the item battery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub info: ModelInfo,
    pub progression: DiseaseProgression,
    pub drug_effect: DrugEffect,
    /// Progression slope once the protective effect applies.
    pub protected_slope: f64,
    pub covariates: Vec<CovariateMean>,
    pub fit: FitSummary,
    pub item_count: usize,
}

/// Parameter row of a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSummary {
    pub name: String,
    pub discrimination: f64,
    pub class: DiscriminationClass,
    pub max_score: u32,
    pub boundaries: Vec<f64>,
    pub thresholds: Vec<f64>,
    /// Latent-trait location of peak item information.
    pub peak_theta: Option<f64>,
    pub peak_information: Option<f64>,
}

impl ModelReport {
    /// Evaluate every curve of `params` over the grids of `config`.
    pub fn build(params: &ModelParameters, config: &IrtdeckConfig) -> Result<Self> {
        params.validate().context("invalid model parameters")?;

        let theta = config.theta_grid().context("invalid latent-trait grid")?;
        let exposure = config.exposure_grid().context("invalid exposure grid")?;
        let time = config.time_grid().context("invalid time grid")?;

        let battery = evaluate_battery(&params.items, &theta);
        let peaks = battery.item_peaks();

        let items = params
            .items
            .iter()
            .zip(peaks)
            .map(|(item, peak)| {
                ItemSummary {
                    name: item.name().to_string(),
                    discrimination: item.discrimination(),
                    class: item.discrimination_class(),
                    max_score: item.max_score(),
                    boundaries: item.boundaries().to_vec(),
                    thresholds: item_thresholds(item),
                    peak_theta: peak.map(|p| p.theta),
                    peak_information: peak.map(|p| p.value),
                }
            })
            .collect();

        let progression = progression_curves(
            &params.progression,
            &params.drug_effect,
            &time,
            config.reference_exposure,
        )
        .context("failed to evaluate progression curves")?;
        let emax = emax_curve(&params.drug_effect, &exposure)
            .context("failed to evaluate Emax curve")?;
        let correlations = summarize(&params.random_effects, TOP_CORRELATIONS)
            .context("failed to summarize random effects")?;

        let warnings = validate_parameters(params)
            .into_iter()
            .map(|w| match w.item {
                Some(item) => format!("{item}: {}", w.message),
                None => w.message,
            })
            .collect();

        tracing::debug!(
            model = %params.model.id,
            items = params.items.len(),
            grid = theta.len(),
            "built model report"
        );

        Ok(ModelReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model: ModelSummary {
                info: params.model.clone(),
                progression: params.progression,
                drug_effect: params.drug_effect,
                protected_slope: params.drug_effect.protected_slope(&params.progression),
                covariates: params.covariates.clone(),
                fit: params.fit.clone(),
                item_count: params.items.len(),
            },
            items,
            discrimination: summarize_discrimination(&params.items),
            battery,
            progression,
            emax,
            correlations,
            warnings,
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ModelReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Row of the named item.
    pub fn item(&self, name: &str) -> Option<&ItemSummary> {
        self.items.iter().find(|i| i.name == name)
    }
}
