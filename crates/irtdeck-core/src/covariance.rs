//! Random-effect correlation structure.
//!
//! The fitted model reports variances on the diagonal and pairwise
//! correlations between named random effects. This module assembles them into
//! dense matrices and checks that the result is a usable covariance matrix.

use std::collections::HashSet;
use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{IrtError, IrtResult};

/// One pairwise correlation between two named random effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub first: String,
    pub second: String,
    pub value: f64,
}

/// Named random effects with their variances and pairwise correlations.
///
/// Pairs that are not listed are uncorrelated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEffects {
    pub names: Vec<String>,
    pub variances: Vec<f64>,
    #[serde(default)]
    pub correlations: Vec<Correlation>,
}

impl RandomEffects {
    fn index_of(&self, name: &str) -> IrtResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| IrtError::InvalidCorrelation(format!("unknown random effect '{name}'")))
    }

    /// Check names, variances, and correlation entries.
    pub fn validate(&self) -> IrtResult<()> {
        if self.names.is_empty() {
            return Err(IrtError::InvalidCorrelation("no random effects".into()));
        }
        if self.names.len() != self.variances.len() {
            return Err(IrtError::InvalidCorrelation(format!(
                "{} names but {} variances",
                self.names.len(),
                self.variances.len()
            )));
        }
        let mut seen = HashSet::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(IrtError::InvalidCorrelation(format!(
                    "duplicate random effect '{name}'"
                )));
            }
        }
        for (name, &v) in self.names.iter().zip(&self.variances) {
            if !v.is_finite() || v <= 0.0 {
                return Err(IrtError::InvalidParameter(format!(
                    "variance of '{name}' must be positive, got {v}"
                )));
            }
        }

        let mut pairs = HashSet::new();
        for c in &self.correlations {
            let i = self.index_of(&c.first)?;
            let j = self.index_of(&c.second)?;
            if i == j {
                return Err(IrtError::InvalidCorrelation(format!(
                    "self-correlation of '{}'",
                    c.first
                )));
            }
            if !pairs.insert((i.min(j), i.max(j))) {
                return Err(IrtError::InvalidCorrelation(format!(
                    "correlation '{}'-'{}' listed twice",
                    c.first, c.second
                )));
            }
            if !c.value.is_finite() || c.value.abs() > 1.0 {
                return Err(IrtError::InvalidCorrelation(format!(
                    "correlation '{}'-'{}' must lie in [-1, 1], got {}",
                    c.first, c.second, c.value
                )));
            }
        }
        Ok(())
    }

    /// Symmetric correlation matrix with unit diagonal.
    pub fn correlation_matrix(&self) -> IrtResult<DMatrix<f64>> {
        self.validate()?;
        let n = self.names.len();
        let mut m = DMatrix::<f64>::identity(n, n);
        for c in &self.correlations {
            let i = self.index_of(&c.first)?;
            let j = self.index_of(&c.second)?;
            m[(i, j)] = c.value;
            m[(j, i)] = c.value;
        }
        Ok(m)
    }

    /// Covariance matrix `Σ_ij = r_ij · sqrt(v_i · v_j)`.
    pub fn covariance_matrix(&self) -> IrtResult<DMatrix<f64>> {
        let corr = self.correlation_matrix()?;
        let sd: Vec<f64> = self.variances.iter().map(|v| v.sqrt()).collect();
        let n = sd.len();
        Ok(DMatrix::from_fn(n, n, |i, j| corr[(i, j)] * sd[i] * sd[j]))
    }

    /// Whether the correlation matrix admits a Cholesky factorisation.
    pub fn is_positive_definite(&self) -> IrtResult<bool> {
        let corr = self.correlation_matrix()?;
        Ok(corr.cholesky().is_some())
    }

    /// Off-diagonal correlations ranked by absolute value, strongest first.
    pub fn strongest(&self, n: usize) -> Vec<RankedCorrelation> {
        let mut ranked: Vec<RankedCorrelation> = self
            .correlations
            .iter()
            .map(|c| RankedCorrelation {
                first: c.first.clone(),
                second: c.second.clone(),
                value: c.value,
                strength: CorrelationStrength::from_value(c.value),
            })
            .collect();
        ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        ranked.truncate(n);
        ranked
    }
}

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn from_value(r: f64) -> Self {
        let r = r.abs();
        if r < 0.3 {
            CorrelationStrength::Weak
        } else if r < 0.5 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Strong
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationStrength::Weak => write!(f, "weak"),
            CorrelationStrength::Moderate => write!(f, "moderate"),
            CorrelationStrength::Strong => write!(f, "strong"),
        }
    }
}

/// A correlation together with its qualitative reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCorrelation {
    pub first: String,
    pub second: String,
    pub value: f64,
    pub strength: CorrelationStrength,
}

impl RankedCorrelation {
    /// e.g. "moderate positive".
    pub fn describe(&self) -> String {
        let sign = if self.value < 0.0 { "negative" } else { "positive" };
        format!("{} {}", self.strength, sign)
    }
}

/// Dense correlation summary handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub names: Vec<String>,
    pub variances: Vec<f64>,
    /// Row-major correlation matrix.
    pub matrix: Vec<Vec<f64>>,
    pub positive_definite: bool,
    pub strongest: Vec<RankedCorrelation>,
}

/// Build the renderer-facing summary of a random-effect structure.
pub fn summarize(effects: &RandomEffects, top: usize) -> IrtResult<CorrelationSummary> {
    let m = effects.correlation_matrix()?;
    let matrix = (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| m[(i, j)]).collect())
        .collect();
    let positive_definite = m.cholesky().is_some();
    if !positive_definite {
        tracing::warn!("random-effect correlation matrix is not positive definite");
    }
    Ok(CorrelationSummary {
        names: effects.names.clone(),
        variances: effects.variances.clone(),
        matrix,
        positive_definite,
        strongest: effects.strongest(top),
    })
}
