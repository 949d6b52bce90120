//! Core data model types for irtdeck.
//!
//! These are the fundamental types the evaluator works on: validated item
//! specifications, latent-trait grids, and per-item curve results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrtError, IrtResult};

/// A single graded-response item (one EDSS functional system).
///
/// Fields are private so an `ItemSpec` can only exist in a valid state:
/// `boundaries` is non-empty, `boundaries.len() == max_score - 1`, and the
/// discrimination is finite and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItemSpec", into = "RawItemSpec")]
pub struct ItemSpec {
    name: String,
    boundaries: Vec<f64>,
    discrimination: f64,
    max_score: u32,
}

/// Unvalidated wire form of an [`ItemSpec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawItemSpec {
    name: String,
    boundaries: Vec<f64>,
    #[serde(alias = "slope")]
    discrimination: f64,
    max_score: u32,
}

impl TryFrom<RawItemSpec> for ItemSpec {
    type Error = IrtError;

    fn try_from(raw: RawItemSpec) -> Result<Self, Self::Error> {
        ItemSpec::new(raw.name, raw.boundaries, raw.discrimination, raw.max_score)
    }
}

impl From<ItemSpec> for RawItemSpec {
    fn from(spec: ItemSpec) -> Self {
        RawItemSpec {
            name: spec.name,
            boundaries: spec.boundaries,
            discrimination: spec.discrimination,
            max_score: spec.max_score,
        }
    }
}

impl ItemSpec {
    /// Build a validated item specification.
    pub fn new(
        name: impl Into<String>,
        boundaries: Vec<f64>,
        discrimination: f64,
        max_score: u32,
    ) -> IrtResult<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(IrtError::invalid_spec(name, "item name is empty"));
        }
        if boundaries.is_empty() {
            return Err(IrtError::invalid_spec(name, "boundaries must not be empty"));
        }
        if max_score == 0 || boundaries.len() != (max_score - 1) as usize {
            return Err(IrtError::invalid_spec(
                name,
                format!(
                    "expected max_score - 1 = {} boundaries, got {}",
                    i64::from(max_score) - 1,
                    boundaries.len()
                ),
            ));
        }
        if let Some(i) = boundaries.iter().position(|b| !b.is_finite()) {
            return Err(IrtError::invalid_spec(
                name,
                format!("boundary {i} is not finite"),
            ));
        }
        if !discrimination.is_finite() || discrimination <= 0.0 {
            return Err(IrtError::invalid_spec(
                name,
                format!("discrimination must be positive, got {discrimination}"),
            ));
        }

        Ok(Self {
            name,
            boundaries,
            discrimination,
            max_score,
        })
    }

    /// Item name (e.g. "Pyramidal").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative boundary offsets as fitted.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Discrimination (slope) parameter `a`.
    pub fn discrimination(&self) -> f64 {
        self.discrimination
    }

    /// Highest attainable score on the `0..max_score - 1` category scale
    /// plus one, i.e. the number of score categories.
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Number of cumulative category curves `P(X >= k)`, `k = 1..=n`.
    pub fn category_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Qualitative discrimination class of this item.
    pub fn discrimination_class(&self) -> DiscriminationClass {
        DiscriminationClass::from_slope(self.discrimination)
    }
}

/// Ordered latent-trait sample points.
///
/// Always holds at least one finite point, in non-decreasing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid", into = "RawGrid")]
pub struct EvaluationGrid {
    points: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawGrid {
    points: Vec<f64>,
}

impl TryFrom<RawGrid> for EvaluationGrid {
    type Error = IrtError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        EvaluationGrid::from_points(raw.points)
    }
}

impl From<EvaluationGrid> for RawGrid {
    fn from(grid: EvaluationGrid) -> Self {
        RawGrid {
            points: grid.points,
        }
    }
}

impl EvaluationGrid {
    /// `n` evenly spaced points from `min` to `max`, both ends included.
    pub fn linspace(min: f64, max: f64, n: usize) -> IrtResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(IrtError::InvalidGrid(format!(
                "range bounds must be finite, got [{min}, {max}]"
            )));
        }
        if min >= max {
            return Err(IrtError::InvalidGrid(format!(
                "range minimum {min} must be below maximum {max}"
            )));
        }
        if n < 2 {
            return Err(IrtError::InvalidGrid(format!(
                "an evenly spaced grid needs at least 2 points, got {n}"
            )));
        }

        let step = (max - min) / (n - 1) as f64;
        let mut points: Vec<f64> = (0..n).map(|i| min + step * i as f64).collect();
        // pin the endpoint against accumulated rounding
        points[n - 1] = max;

        Ok(Self { points })
    }

    /// Grid over explicit points, which must be finite and non-decreasing.
    pub fn from_points(points: Vec<f64>) -> IrtResult<Self> {
        if points.is_empty() {
            return Err(IrtError::InvalidGrid("grid has no points".into()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(IrtError::InvalidGrid(format!("point {i} is not finite")));
        }
        if points.windows(2).any(|w| w[1] < w[0]) {
            return Err(IrtError::InvalidGrid(
                "points must be in non-decreasing order".into(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.points[0]
    }

    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}

/// One cumulative category curve `P(X >= category | θ)` over a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCurve {
    /// Category index `k`, starting at 1.
    pub category: u32,
    /// Cumulative threshold `b_k` where the curve crosses 0.5.
    pub threshold: f64,
    /// Probabilities aligned with the evaluation grid.
    pub probabilities: Vec<f64>,
}

/// Evaluation of one item over a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveResult {
    /// Item name.
    pub item: String,
    /// Discrimination used for the evaluation.
    pub discrimination: f64,
    /// Cumulative category curves, ordered by category.
    pub categories: Vec<CategoryCurve>,
    /// Item information summed over all thresholds, aligned with the grid.
    pub information: Vec<f64>,
    /// Expected item score `Σ_k P(X >= k | θ)`, aligned with the grid.
    pub expected_score: Vec<f64>,
}

impl CurveResult {
    /// Curve for category `k`, if the item has one.
    pub fn category(&self, k: u32) -> Option<&CategoryCurve> {
        self.categories.iter().find(|c| c.category == k)
    }

    /// Cumulative thresholds in category order.
    pub fn thresholds(&self) -> Vec<f64> {
        self.categories.iter().map(|c| c.threshold).collect()
    }
}

/// Qualitative reading of a discrimination parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminationClass {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl DiscriminationClass {
    /// Classify a slope: `< 1.0` low, `< 1.5` moderate, `<= 2.5` high,
    /// above that very high.
    pub fn from_slope(slope: f64) -> Self {
        if slope < 1.0 {
            DiscriminationClass::Low
        } else if slope < 1.5 {
            DiscriminationClass::Moderate
        } else if slope <= 2.5 {
            DiscriminationClass::High
        } else {
            DiscriminationClass::VeryHigh
        }
    }
}

impl fmt::Display for DiscriminationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscriminationClass::Low => write!(f, "low"),
            DiscriminationClass::Moderate => write!(f, "moderate"),
            DiscriminationClass::High => write!(f, "high"),
            DiscriminationClass::VeryHigh => write!(f, "very high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_spec_valid() {
        let item = ItemSpec::new("Brainstem", vec![-0.112, 1.711, 2.0, 2.78], 1.038, 5).unwrap();
        assert_eq!(item.name(), "Brainstem");
        assert_eq!(item.category_count(), 4);
        assert_eq!(item.max_score(), 5);
        assert_eq!(item.discrimination_class(), DiscriminationClass::Moderate);
    }

    #[test]
    fn item_spec_rejects_empty_boundaries() {
        let err = ItemSpec::new("Empty", vec![], 1.0, 1).unwrap_err();
        assert!(matches!(err, IrtError::InvalidSpec { .. }));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn item_spec_rejects_length_mismatch() {
        let err = ItemSpec::new("Pyramidal", vec![-1.55, 1.248, 0.818], 3.172, 3).unwrap_err();
        assert!(err.to_string().contains("expected max_score - 1 = 2 boundaries, got 3"));
    }

    #[test]
    fn item_spec_rejects_zero_max_score() {
        assert!(ItemSpec::new("Zero", vec![0.0], 1.0, 0).is_err());
    }

    #[test]
    fn item_spec_rejects_non_positive_discrimination() {
        assert!(ItemSpec::new("Flat", vec![0.0], 0.0, 2).is_err());
        assert!(ItemSpec::new("Negative", vec![0.0], -1.0, 2).is_err());
        assert!(ItemSpec::new("Nan", vec![0.0], f64::NAN, 2).is_err());
    }

    #[test]
    fn item_spec_rejects_non_finite_boundary() {
        let err = ItemSpec::new("Inf", vec![0.0, f64::INFINITY], 1.0, 3).unwrap_err();
        assert!(err.to_string().contains("boundary 1 is not finite"));
    }

    #[test]
    fn item_spec_deserialize_validates() {
        let json = r#"{"name":"Bad","boundaries":[0.1,0.2],"slope":1.0,"max_score":2}"#;
        let result: Result<ItemSpec, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"{"name":"Good","boundaries":[0.1],"slope":1.5,"max_score":2}"#;
        let item: ItemSpec = serde_json::from_str(json).unwrap();
        assert_eq!(item.discrimination(), 1.5);
    }

    #[test]
    fn item_spec_serde_roundtrip() {
        let item = ItemSpec::new("Mental", vec![0.402, 1.111, 4.161, 2.89], 0.912, 5).unwrap();
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"discrimination\":0.912"));
        let back: ItemSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn linspace_includes_endpoints() {
        let grid = EvaluationGrid::linspace(-3.0, 6.0, 200).unwrap();
        assert_eq!(grid.len(), 200);
        assert_eq!(grid.min(), -3.0);
        assert_eq!(grid.max(), 6.0);
        assert!(grid.points().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linspace_rejects_bad_ranges() {
        assert!(EvaluationGrid::linspace(1.0, 1.0, 10).is_err());
        assert!(EvaluationGrid::linspace(2.0, 1.0, 10).is_err());
        assert!(EvaluationGrid::linspace(0.0, 1.0, 1).is_err());
        assert!(EvaluationGrid::linspace(f64::NEG_INFINITY, 1.0, 10).is_err());
    }

    #[test]
    fn from_points_validates_order() {
        assert!(EvaluationGrid::from_points(vec![]).is_err());
        assert!(EvaluationGrid::from_points(vec![1.0, 0.0]).is_err());
        assert!(EvaluationGrid::from_points(vec![0.0, f64::NAN]).is_err());
        let grid = EvaluationGrid::from_points(vec![0.0]).unwrap();
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn discrimination_class_boundaries() {
        assert_eq!(DiscriminationClass::from_slope(0.44), DiscriminationClass::Low);
        assert_eq!(DiscriminationClass::from_slope(1.0), DiscriminationClass::Moderate);
        assert_eq!(DiscriminationClass::from_slope(1.5), DiscriminationClass::High);
        assert_eq!(DiscriminationClass::from_slope(2.5), DiscriminationClass::High);
        assert_eq!(DiscriminationClass::from_slope(3.64), DiscriminationClass::VeryHigh);
    }

    #[test]
    fn discrimination_class_display() {
        assert_eq!(DiscriminationClass::VeryHigh.to_string(), "very high");
        assert_eq!(DiscriminationClass::Low.to_string(), "low");
        let json = serde_json::to_string(&DiscriminationClass::VeryHigh).unwrap();
        assert_eq!(json, "\"very_high\"");
    }

    #[test]
    fn grid_deserialize_validates() {
        let empty: Result<EvaluationGrid, _> = serde_json::from_str(r#"{"points":[]}"#);
        assert!(empty.is_err());
        let unordered: Result<EvaluationGrid, _> = serde_json::from_str(r#"{"points":[1.0,0.0]}"#);
        assert!(unordered.is_err());

        let grid: EvaluationGrid = serde_json::from_str(r#"{"points":[-1.0,0.5]}"#).unwrap();
        assert_eq!(grid.min(), -1.0);
        assert_eq!(grid.max(), 0.5);
        assert_eq!(serde_json::to_string(&grid).unwrap(), r#"{"points":[-1.0,0.5]}"#);
    }
}
