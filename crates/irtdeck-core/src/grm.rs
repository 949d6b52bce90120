//! Graded Response Model evaluator.
//!
//! Cumulative category probabilities follow the two-parameter logistic form
//!
//! P(X >= k | θ) = 1 / (1 + exp(-a (θ - b_k)))
//!
//! where `b_k` is the running sum of the item's boundary offsets. Fisher
//! information of one threshold is `a² P (1 - P)`; item information is the sum
//! over the item's thresholds.

use crate::error::{IrtError, IrtResult};
use crate::model::{CategoryCurve, CurveResult, EvaluationGrid, ItemSpec};

/// Logit magnitude beyond which the logistic is clamped.
///
/// `exp(-35)` is about 6.3e-16, so `1 / (1 + exp(-35))` is still strictly
/// below 1.0 in `f64`, which keeps every probability inside (0, 1).
pub const MAX_LOGIT: f64 = 35.0;

/// Running sum of boundary offsets: `out[i] = boundaries[0] + ... + boundaries[i]`.
///
/// Offsets may be negative, in which case the thresholds are not monotonic.
pub fn cumulative_thresholds(boundaries: &[f64]) -> IrtResult<Vec<f64>> {
    if boundaries.is_empty() {
        return Err(IrtError::invalid_spec(
            "<anonymous>",
            "boundaries must not be empty",
        ));
    }

    Ok(boundaries
        .iter()
        .scan(0.0, |acc, &b| {
            *acc += b;
            Some(*acc)
        })
        .collect())
}

/// Numerically stable logistic function with a clamped argument.
pub fn logistic(z: f64) -> f64 {
    let z = z.clamp(-MAX_LOGIT, MAX_LOGIT);
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `P(X >= k | θ)` for discrimination `a` and threshold `b`.
pub fn category_probability(a: f64, b: f64, theta: f64) -> f64 {
    logistic(a * (theta - b))
}

/// Fisher information `a² P (1 - P)` of one threshold at `θ`.
pub fn threshold_information(a: f64, b: f64, theta: f64) -> f64 {
    let p = category_probability(a, b, theta);
    a * a * p * (1.0 - p)
}

/// Item information at `θ`: threshold information summed over `thresholds`.
pub fn item_information(a: f64, thresholds: &[f64], theta: f64) -> f64 {
    thresholds
        .iter()
        .map(|&b| threshold_information(a, b, theta))
        .sum()
}

/// Expected item score `Σ_k P(X >= k | θ)`.
pub fn expected_score(a: f64, thresholds: &[f64], theta: f64) -> f64 {
    thresholds
        .iter()
        .map(|&b| category_probability(a, b, theta))
        .sum()
}

/// Cumulative thresholds of a validated item.
pub fn item_thresholds(item: &ItemSpec) -> Vec<f64> {
    // a valid ItemSpec always has at least one boundary
    cumulative_thresholds(item.boundaries()).unwrap_or_default()
}

/// Evaluate every category curve, item information, and expected score of
/// `item` over `grid`.
pub fn evaluate_item(item: &ItemSpec, grid: &EvaluationGrid) -> CurveResult {
    let a = item.discrimination();
    let thresholds = item_thresholds(item);

    let categories: Vec<CategoryCurve> = thresholds
        .iter()
        .enumerate()
        .map(|(i, &b)| CategoryCurve {
            category: (i + 1) as u32,
            threshold: b,
            probabilities: grid
                .points()
                .iter()
                .map(|&theta| category_probability(a, b, theta))
                .collect(),
        })
        .collect();

    let information = grid
        .points()
        .iter()
        .map(|&theta| item_information(a, &thresholds, theta))
        .collect();
    let expected = grid
        .points()
        .iter()
        .map(|&theta| expected_score(a, &thresholds, theta))
        .collect();

    tracing::debug!(
        item = item.name(),
        categories = categories.len(),
        points = grid.len(),
        "evaluated item"
    );

    CurveResult {
        item: item.name().to_string(),
        discrimination: a,
        categories,
        information,
        expected_score: expected,
    }
}
