//! TOML model parameter parser.
//!
//! Loads fitted-model parameter sets from TOML files and directories, and
//! validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::covariance::{Correlation, RandomEffects};
use crate::grm::cumulative_thresholds;
use crate::model::ItemSpec;
use crate::parameters::{CovariateMean, FitSummary, ModelInfo, ModelParameters};
use crate::pharmacology::{DiseaseProgression, DrugEffect};

/// Items with a slope below this get a validation warning.
pub const LOW_DISCRIMINATION_WARNING: f64 = 0.5;

/// Intermediate TOML structure for parsing model files.
#[derive(Debug, Deserialize)]
struct TomlModelFile {
    model: ModelInfo,
    progression: DiseaseProgression,
    drug_effect: DrugEffect,
    random_effects: TomlRandomEffects,
    #[serde(default)]
    covariates: Vec<CovariateMean>,
    #[serde(default)]
    fit: FitSummary,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlRandomEffects {
    names: Vec<String>,
    variances: Vec<f64>,
    #[serde(default)]
    correlations: Vec<TomlCorrelation>,
}

#[derive(Debug, Deserialize)]
struct TomlCorrelation {
    first: String,
    second: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    name: String,
    boundaries: Vec<f64>,
    #[serde(alias = "discrimination")]
    slope: f64,
    max_score: u32,
}

/// Parse a single TOML file into `ModelParameters`.
pub fn parse_model(path: &Path) -> Result<ModelParameters> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model file: {}", path.display()))?;

    parse_model_str(&content, path)
}

/// Parse a TOML string into `ModelParameters` (useful for testing).
pub fn parse_model_str(content: &str, source_path: &Path) -> Result<ModelParameters> {
    let parsed: TomlModelFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            ItemSpec::new(item.name, item.boundaries, item.slope, item.max_score)
                .with_context(|| format!("item #{} in {}", i + 1, source_path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let random_effects = RandomEffects {
        names: parsed.random_effects.names,
        variances: parsed.random_effects.variances,
        correlations: parsed
            .random_effects
            .correlations
            .into_iter()
            .map(|c| Correlation {
                first: c.first,
                second: c.second,
                value: c.value,
            })
            .collect(),
    };

    let params = ModelParameters {
        model: parsed.model,
        progression: parsed.progression,
        drug_effect: parsed.drug_effect,
        random_effects,
        covariates: parsed.covariates,
        fit: parsed.fit,
        items,
    };

    params
        .validate()
        .with_context(|| format!("invalid parameters in {}", source_path.display()))?;

    tracing::debug!(
        model = %params.model.id,
        items = params.items.len(),
        "parsed model parameters"
    );

    Ok(params)
}

/// Recursively load all `.toml` model files from a directory.
pub fn load_model_directory(dir: &Path) -> Result<Vec<ModelParameters>> {
    let mut models = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            models.extend(load_model_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_model(&path) {
                Ok(model) => models.push(model),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(models)
}

/// A warning from parameter validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item name (if applicable).
    pub item: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a parameter set for issues that do not prevent evaluation.
pub fn validate_parameters(params: &ModelParameters) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if params.items.is_empty() {
        warnings.push(ValidationWarning {
            item: None,
            message: "model has no items; test information is zero everywhere".into(),
        });
    }

    // Check for duplicate item names
    let mut seen = std::collections::HashSet::new();
    for item in &params.items {
        if !seen.insert(item.name()) {
            warnings.push(ValidationWarning {
                item: Some(item.name().to_string()),
                message: format!("duplicate item name: {}", item.name()),
            });
        }
    }

    // Negative offsets after the first make the thresholds non-monotonic
    for item in &params.items {
        let negative: Vec<usize> = item
            .boundaries()
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, b)| **b < 0.0)
            .map(|(i, _)| i + 1)
            .collect();
        if !negative.is_empty() {
            let thresholds = cumulative_thresholds(item.boundaries()).unwrap_or_default();
            warnings.push(ValidationWarning {
                item: Some(item.name().to_string()),
                message: format!(
                    "negative boundary offset at categories {:?}; cumulative thresholds {:?} are not monotonic",
                    negative,
                    thresholds
                        .iter()
                        .map(|t| (t * 1000.0).round() / 1000.0)
                        .collect::<Vec<_>>()
                ),
            });
        }
    }

    for item in &params.items {
        if item.discrimination() < LOW_DISCRIMINATION_WARNING {
            warnings.push(ValidationWarning {
                item: Some(item.name().to_string()),
                message: format!(
                    "discrimination {:.3} is very low; item carries little information",
                    item.discrimination()
                ),
            });
        }
    }

    match params.random_effects.is_positive_definite() {
        Ok(true) => {}
        Ok(false) => warnings.push(ValidationWarning {
            item: None,
            message: "random-effect correlation matrix is not positive definite".into(),
        }),
        Err(e) => warnings.push(ValidationWarning {
            item: None,
            message: e.to_string(),
        }),
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[model]
id = "synthetic"
title = "Synthetic Model"
reference = "Test et al., 2024"

[progression]
slope = 0.1
power = 0.8

[drug_effect]
emax = 0.2
ec50 = 300.0
protective = 0.25

[random_effects]
names = ["Disability", "Slope"]
variances = [1.0, 0.2]

[[random_effects.correlations]]
first = "Disability"
second = "Slope"
value = 0.11

[[covariates]]
name = "Age"
mean = 40.0
unit = "years"

[fit]
objective_function = 100.5
method = "LAPLACIAN"

[[items]]
name = "Pyramidal"
boundaries = [-1.55, 1.248, 0.818]
slope = 3.172
max_score = 4

[[items]]
name = "Visual"
boundaries = [-0.037, 3.751]
discrimination = 0.44
max_score = 3
"#;

    #[test]
    fn parse_valid_toml() {
        let params = parse_model_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(params.model.id, "synthetic");
        assert_eq!(params.model.latent_trait, "Disability");
        assert_eq!(params.items.len(), 2);
        assert_eq!(params.items[0].name(), "Pyramidal");
        assert_eq!(params.items[1].discrimination(), 0.44);
        assert_eq!(params.random_effects.correlations.len(), 1);
        assert_eq!(params.covariates[0].unit, "years");
        assert_eq!(params.fit.method.as_deref(), Some("LAPLACIAN"));
        assert!(params.fit.subjects.is_none());
    }

    #[test]
    fn parse_rejects_invalid_item() {
        let bad = VALID_TOML.replace("max_score = 4", "max_score = 5");
        let err = parse_model_str(&bad, &PathBuf::from("bad.toml")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("item #1"), "{msg}");
        assert!(msg.contains("Pyramidal"), "{msg}");
    }

    #[test]
    fn parse_rejects_bad_correlation() {
        let bad = VALID_TOML.replace("value = 0.11", "value = 1.11");
        assert!(parse_model_str(&bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_model_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_clean_model_has_only_low_slope_warning() {
        let params = parse_model_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_parameters(&params);
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert_eq!(warnings[0].item.as_deref(), Some("Visual"));
        assert!(warnings[0].message.contains("very low"));
    }

    #[test]
    fn validate_flags_non_monotonic_thresholds() {
        let toml = VALID_TOML.replace("[-1.55, 1.248, 0.818]", "[0.5, -1.0, 0.818]");
        let params = parse_model_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_parameters(&params);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("not monotonic") && w.item.as_deref() == Some("Pyramidal")));
    }

    #[test]
    fn validate_duplicate_items() {
        let toml = VALID_TOML.replace("name = \"Visual\"", "name = \"Pyramidal\"");
        let params = parse_model_str(&toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_parameters(&params);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not = [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let models = load_model_directory(dir.path()).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].model.id, "synthetic");
    }

    #[test]
    fn load_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        assert!(load_model_directory(&path).is_err());
    }
}
