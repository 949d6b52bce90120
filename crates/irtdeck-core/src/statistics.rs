//! Test information, standard error, and battery-level summaries.
//!
//! Test information is the pointwise sum of item information across a
//! battery; the standard error of measurement is its inverse square root.

use serde::{Deserialize, Serialize};

use crate::grm::{evaluate_item, item_information, item_thresholds};
use crate::model::{CurveResult, EvaluationGrid, ItemSpec};

/// Information at or below this value is treated as zero.
pub const DEGENERATE_INFORMATION: f64 = 1e-12;

/// Standard error `1 / sqrt(information)`.
///
/// Returns `f64::INFINITY` when the information is degenerate (zero, below
/// [`DEGENERATE_INFORMATION`], or not a number), never a silent division by
/// zero.
pub fn standard_error(information: f64) -> f64 {
    if is_degenerate(information) {
        f64::INFINITY
    } else {
        1.0 / information.sqrt()
    }
}

/// Whether `information` is too small to yield a finite standard error.
pub fn is_degenerate(information: f64) -> bool {
    information.is_nan() || information <= DEGENERATE_INFORMATION
}

/// Total information of a battery at a single `θ`.
pub fn test_information_at(items: &[ItemSpec], theta: f64) -> f64 {
    items
        .iter()
        .map(|item| item_information(item.discrimination(), &item_thresholds(item), theta))
        .sum()
}

/// Pointwise sum of already evaluated item information curves.
///
/// All curves must be aligned with the same grid of `len` points.
pub fn test_information(curves: &[CurveResult], len: usize) -> Vec<f64> {
    let mut total = vec![0.0; len];
    for curve in curves {
        for (t, i) in total.iter_mut().zip(&curve.information) {
            *t += i;
        }
    }
    total
}

/// Location and height of a curve's maximum over a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Grid point where the maximum is reached (first one on ties).
    pub theta: f64,
    /// Maximum value.
    pub value: f64,
}

/// Grid maximum of `values`, or `None` if the sequence is empty or not
/// aligned with `grid`.
pub fn peak(grid: &EvaluationGrid, values: &[f64]) -> Option<Peak> {
    if values.is_empty() || values.len() != grid.len() {
        return None;
    }
    let (idx, &value) = values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &f64)>, (i, v)| match best {
            Some((_, bv)) if *v <= *bv => best,
            _ => Some((i, v)),
        })?;
    Some(Peak {
        theta: grid.points()[idx],
        value,
    })
}

/// Peak of an information curve, or `None` when even the maximum is
/// degenerate.
pub fn information_peak(grid: &EvaluationGrid, information: &[f64]) -> Option<Peak> {
    peak(grid, information).filter(|p| !is_degenerate(p.value))
}

impl Peak {
    /// Standard error at the peak, treating `value` as information.
    pub fn standard_error(&self) -> f64 {
        standard_error(self.value)
    }
}

/// Evaluation of a whole battery over a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryResult {
    /// Latent-trait points all sequences are aligned with.
    pub theta: Vec<f64>,
    /// Per-item curves in battery order.
    pub items: Vec<CurveResult>,
    /// Test information per grid point.
    pub test_information: Vec<f64>,
    /// Standard error per grid point; infinite where information is degenerate.
    /// Infinite values are written as `null` in JSON.
    #[serde(with = "infinite_as_null")]
    pub standard_error: Vec<f64>,
    /// Grid points with degenerate information.
    pub degenerate_points: Vec<f64>,
    /// Maximum of the test information function; `None` when information is
    /// degenerate at every grid point.
    pub peak_information: Option<Peak>,
}

impl BatteryResult {
    /// Curves of the named item.
    pub fn item(&self, name: &str) -> Option<&CurveResult> {
        self.items.iter().find(|c| c.item == name)
    }

    /// Peak information of each item, aligned index by index with `items`.
    pub fn item_peaks(&self) -> Vec<Option<Peak>> {
        let Ok(grid) = EvaluationGrid::from_points(self.theta.clone()) else {
            return vec![None; self.items.len()];
        };
        self.items
            .iter()
            .map(|c| information_peak(&grid, &c.information))
            .collect()
    }

    /// Whether every grid point has a finite standard error.
    pub fn is_fully_informative(&self) -> bool {
        self.degenerate_points.is_empty()
    }
}

mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        values
            .iter()
            .map(|v| v.is_finite().then_some(*v))
            .collect::<Vec<Option<f64>>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::INFINITY))
            .collect())
    }
}

/// Evaluate every item of the battery and aggregate test information and
/// standard error over `grid`.
pub fn evaluate_battery(items: &[ItemSpec], grid: &EvaluationGrid) -> BatteryResult {
    let curves: Vec<CurveResult> = items.iter().map(|item| evaluate_item(item, grid)).collect();
    let total = test_information(&curves, grid.len());
    let se: Vec<f64> = total.iter().map(|&i| standard_error(i)).collect();

    let degenerate_points: Vec<f64> = grid
        .points()
        .iter()
        .zip(&total)
        .filter(|(_, i)| is_degenerate(**i))
        .map(|(&t, _)| t)
        .collect();

    if !degenerate_points.is_empty() {
        tracing::debug!(
            count = degenerate_points.len(),
            "test information degenerate at some grid points; standard error reported as infinite"
        );
    }

    let peak_information = information_peak(grid, &total);

    tracing::debug!(items = items.len(), points = grid.len(), "evaluated battery");

    BatteryResult {
        theta: grid.points().to_vec(),
        items: curves,
        test_information: total,
        standard_error: se,
        degenerate_points,
        peak_information,
    }
}

/// Summary of the discrimination parameters of a battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscriminationSummary {
    /// Arithmetic mean of the slopes, `None` for an empty battery.
    pub mean: Option<f64>,
    /// `(item, slope)` pairs ordered from most to least discriminating.
    pub ranked: Vec<(String, f64)>,
}

impl DiscriminationSummary {
    /// The `n` most discriminating items.
    pub fn top(&self, n: usize) -> &[(String, f64)] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// The `n` least discriminating items, least first.
    pub fn bottom(&self, n: usize) -> Vec<(String, f64)> {
        self.ranked.iter().rev().take(n).cloned().collect()
    }
}

/// Rank items by discrimination and compute the mean slope.
pub fn summarize_discrimination(items: &[ItemSpec]) -> DiscriminationSummary {
    let mut ranked: Vec<(String, f64)> = items
        .iter()
        .map(|i| (i.name().to_string(), i.discrimination()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mean = if items.is_empty() {
        None
    } else {
        Some(ranked.iter().map(|(_, s)| s).sum::<f64>() / ranked.len() as f64)
    };

    DiscriminationSummary { mean, ranked }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(name: &str, a: f64, b: f64) -> ItemSpec {
        ItemSpec::new(name, vec![b], a, 2).unwrap()
    }

    #[test]
    fn two_item_battery_at_zero() {
        let items = vec![single("one", 1.0, 0.0), single("two", 2.0, 0.0)];
        let total = test_information_at(&items, 0.0);
        assert!((total - 1.25).abs() < 1e-12, "got {total}");
        let se = standard_error(total);
        assert!((se - 0.894_427_191).abs() < 1e-6, "got {se}");
    }

    #[test]
    fn battery_curves_match_pointwise() {
        let items = vec![single("one", 1.0, 0.0), single("two", 2.0, 0.0)];
        let grid = EvaluationGrid::from_points(vec![-1.0, 0.0, 1.0]).unwrap();
        let result = evaluate_battery(&items, &grid);

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.test_information.len(), 3);
        assert!((result.test_information[1] - 1.25).abs() < 1e-12);
        for (j, &theta) in grid.points().iter().enumerate() {
            let direct = test_information_at(&items, theta);
            assert!((result.test_information[j] - direct).abs() < 1e-12);
        }
        let peak = result.peak_information.unwrap();
        assert_eq!(peak.theta, 0.0);
        assert!(result.is_fully_informative());
    }

    #[test]
    fn standard_error_sentinel_on_zero_information() {
        assert_eq!(standard_error(0.0), f64::INFINITY);
        assert_eq!(standard_error(1e-13), f64::INFINITY);
        assert_eq!(standard_error(f64::NAN), f64::INFINITY);
        assert_eq!(standard_error(4.0), 0.5);
    }

    #[test]
    fn empty_battery_is_degenerate_everywhere() {
        let grid = EvaluationGrid::linspace(-1.0, 1.0, 5).unwrap();
        let result = evaluate_battery(&[], &grid);
        assert!(result.test_information.iter().all(|&i| i == 0.0));
        assert!(result.standard_error.iter().all(|s| s.is_infinite()));
        assert_eq!(result.degenerate_points.len(), 5);
        assert!(!result.is_fully_informative());
        assert!(result.peak_information.is_none());
    }

    #[test]
    fn negligible_information_has_no_peak() {
        let items = vec![single("flat", 1e-7, 0.0)];
        let grid = EvaluationGrid::linspace(-1.0, 1.0, 21).unwrap();
        let result = evaluate_battery(&items, &grid);
        assert!(result.standard_error.iter().all(|s| s.is_infinite()));
        assert!(result.peak_information.is_none());
        assert_eq!(result.item_peaks(), vec![None]);
    }

    #[test]
    fn peak_standard_error_matches_grid() {
        let items = vec![single("one", 1.0, 0.0), single("two", 2.0, 0.0)];
        let grid = EvaluationGrid::from_points(vec![-1.0, 0.0, 1.0]).unwrap();
        let result = evaluate_battery(&items, &grid);
        let peak = result.peak_information.unwrap();
        assert_eq!(peak.standard_error(), result.standard_error[1]);
        let zero = Peak { theta: 0.0, value: 0.0 };
        assert_eq!(zero.standard_error(), f64::INFINITY);
    }

    #[test]
    fn degenerate_standard_error_survives_json() {
        let grid = EvaluationGrid::linspace(-1.0, 1.0, 3).unwrap();
        let result = evaluate_battery(&[], &grid);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"standard_error\":[null,null,null]"));
        let back: BatteryResult = serde_json::from_str(&json).unwrap();
        assert!(back.standard_error.iter().all(|s| s.is_infinite()));
    }

    #[test]
    fn peak_requires_aligned_values() {
        let grid = EvaluationGrid::linspace(0.0, 1.0, 3).unwrap();
        assert!(peak(&grid, &[1.0, 2.0]).is_none());
        assert!(peak(&grid, &[]).is_none());
        let p = peak(&grid, &[1.0, 3.0, 3.0]).unwrap();
        assert_eq!(p.theta, 0.5);
        assert_eq!(p.value, 3.0);
    }

    #[test]
    fn item_peaks_follow_thresholds() {
        let items = vec![single("low", 1.0, -1.0), single("high", 1.0, 2.0)];
        let grid = EvaluationGrid::linspace(-3.0, 3.0, 61).unwrap();
        let result = evaluate_battery(&items, &grid);
        let peaks = result.item_peaks();
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0].unwrap().theta - -1.0).abs() < 1e-9);
        assert!((peaks[1].unwrap().theta - 2.0).abs() < 1e-9);
        assert!(result.item("high").is_some());
        assert!(result.item("missing").is_none());
    }

    #[test]
    fn discrimination_summary_ranks_descending() {
        let items = vec![
            single("visual", 0.44, 0.0),
            single("ambulation", 3.64, 0.0),
            single("pyramidal", 3.172, 0.0),
        ];
        let summary = summarize_discrimination(&items);
        assert_eq!(summary.ranked[0].0, "ambulation");
        assert_eq!(summary.top(2)[1].0, "pyramidal");
        assert_eq!(summary.bottom(1)[0].0, "visual");
        assert!((summary.mean.unwrap() - (0.44 + 3.64 + 3.172) / 3.0).abs() < 1e-12);
        assert_eq!(summary.top(10).len(), 3);
    }

    #[test]
    fn discrimination_summary_empty() {
        let summary = summarize_discrimination(&[]);
        assert!(summary.mean.is_none());
        assert!(summary.top(3).is_empty());
    }
}
