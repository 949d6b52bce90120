//! Evaluation configuration.
//!
//! Grid resolutions, output location, and artifact formats. Values come from
//! a TOML file, are overridden by environment variables, and finally by CLI
//! flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::IrtResult;
use crate::model::EvaluationGrid;

/// Top-level irtdeck configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrtdeckConfig {
    /// Lower end of the latent-trait grid.
    #[serde(default = "default_theta_min")]
    pub theta_min: f64,
    /// Upper end of the latent-trait grid.
    #[serde(default = "default_theta_max")]
    pub theta_max: f64,
    /// Number of latent-trait grid points.
    #[serde(default = "default_points")]
    pub grid_points: usize,
    /// Largest exposure on the Emax curve.
    #[serde(default = "default_exposure_max")]
    pub exposure_max: f64,
    #[serde(default = "default_points")]
    pub exposure_points: usize,
    /// Length of the progression curves, in years.
    #[serde(default = "default_horizon")]
    pub horizon_years: f64,
    #[serde(default = "default_time_points")]
    pub time_points: usize,
    /// Exposure for the symptomatic offset; EC50 when unset.
    #[serde(default)]
    pub reference_exposure: Option<f64>,
    /// Output directory for artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Artifact formats to write.
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_theta_min() -> f64 {
    -3.0
}
fn default_theta_max() -> f64 {
    6.0
}
fn default_points() -> usize {
    200
}
fn default_exposure_max() -> f64 {
    2000.0
}
fn default_horizon() -> f64 {
    5.0
}
fn default_time_points() -> usize {
    100
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./irtdeck-output")
}
fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for IrtdeckConfig {
    fn default() -> Self {
        Self {
            theta_min: default_theta_min(),
            theta_max: default_theta_max(),
            grid_points: default_points(),
            exposure_max: default_exposure_max(),
            exposure_points: default_points(),
            horizon_years: default_horizon(),
            time_points: default_time_points(),
            reference_exposure: None,
            output_dir: default_output_dir(),
            formats: default_formats(),
        }
    }
}

impl IrtdeckConfig {
    /// Latent-trait grid.
    pub fn theta_grid(&self) -> IrtResult<EvaluationGrid> {
        EvaluationGrid::linspace(self.theta_min, self.theta_max, self.grid_points)
    }

    /// Exposure grid for the Emax curve, starting at zero.
    pub fn exposure_grid(&self) -> IrtResult<EvaluationGrid> {
        EvaluationGrid::linspace(0.0, self.exposure_max, self.exposure_points)
    }

    /// Time grid in years for the progression curves, starting at baseline.
    pub fn time_grid(&self) -> IrtResult<EvaluationGrid> {
        EvaluationGrid::linspace(0.0, self.horizon_years, self.time_points)
    }

    /// Parsed output formats, with `all` expanded.
    pub fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        parse_formats(&self.formats)
    }
}

/// An artifact format the CLI can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Html,
    Deck,
    Csv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Html,
        OutputFormat::Deck,
        OutputFormat::Csv,
    ];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Deck => write!(f, "deck"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            "deck" | "md" | "markdown" => Ok(OutputFormat::Deck),
            "csv" => Ok(OutputFormat::Csv),
            other => anyhow::bail!("unknown output format '{other}' (expected json, html, deck, csv or all)"),
        }
    }
}

/// Parse format names, expanding `all` and dropping duplicates.
pub fn parse_formats<S: AsRef<str>>(names: &[S]) -> Result<Vec<OutputFormat>> {
    let mut formats = Vec::new();
    for name in names {
        let name = name.as_ref();
        let expanded: Vec<OutputFormat> = if name.trim().eq_ignore_ascii_case("all") {
            OutputFormat::ALL.to_vec()
        } else {
            vec![name.parse()?]
        };
        for f in expanded {
            if !formats.contains(&f) {
                formats.push(f);
            }
        }
    }
    Ok(formats)
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never rescanned.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&lookup(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `irtdeck.toml` in the current directory
/// 2. `~/.config/irtdeck/config.toml`
///
/// Environment variable override: `IRTDECK_OUTPUT_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<IrtdeckConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("irtdeck.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<IrtdeckConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => IrtdeckConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Apply `IRTDECK_OUTPUT_DIR` and resolve `${VAR}` references in the output
/// directory.
fn apply_env_overrides(config: &mut IrtdeckConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = lookup("IRTDECK_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    let raw = config.output_dir.to_string_lossy().into_owned();
    if raw.contains("${") {
        config.output_dir = PathBuf::from(resolve_env_vars(&raw, &lookup));
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("irtdeck"))
}
