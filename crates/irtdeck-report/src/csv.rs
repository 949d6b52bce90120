//! Long-format CSV tables.
//!
//! One row per (series, grid point), so the tables load directly into
//! plotting tools.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use irtdeck_core::report::ModelReport;

use crate::escape::csv_field;

fn number(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else if v > 0.0 {
        "inf".to_string()
    } else {
        String::new()
    }
}

/// Category probabilities of every item: `item,category,threshold,theta,probability`.
pub fn item_curves_csv(report: &ModelReport) -> String {
    let mut out = String::from("item,category,threshold,theta,probability\n");
    let theta = &report.battery.theta;
    for curve in &report.battery.items {
        let name = csv_field(&curve.item);
        for cat in &curve.categories {
            for (t, p) in theta.iter().zip(&cat.probabilities) {
                out.push_str(&format!(
                    "{},{},{},{},{}\n",
                    name,
                    cat.category,
                    number(cat.threshold),
                    number(*t),
                    number(*p)
                ));
            }
        }
    }
    out
}

/// Item information and expected score: `item,theta,information,expected_score`.
pub fn item_information_csv(report: &ModelReport) -> String {
    let mut out = String::from("item,theta,information,expected_score\n");
    let theta = &report.battery.theta;
    for curve in &report.battery.items {
        let name = csv_field(&curve.item);
        for ((t, i), e) in theta
            .iter()
            .zip(&curve.information)
            .zip(&curve.expected_score)
        {
            out.push_str(&format!(
                "{},{},{},{}\n",
                name,
                number(*t),
                number(*i),
                number(*e)
            ));
        }
    }
    out
}

/// Test information and standard error: `theta,information,standard_error`.
///
/// Degenerate points have `inf` as their standard error.
pub fn test_information_csv(report: &ModelReport) -> String {
    let b = &report.battery;
    let mut out = String::from("theta,information,standard_error\n");
    for ((t, i), se) in b.theta.iter().zip(&b.test_information).zip(&b.standard_error) {
        out.push_str(&format!("{},{},{}\n", number(*t), number(*i), number(*se)));
    }
    out
}

/// Progression scenarios: `scenario,years,value`.
pub fn progression_csv(report: &ModelReport) -> String {
    let p = &report.progression;
    let mut out = String::from("scenario,years,value\n");
    for (scenario, values) in [
        ("placebo", &p.placebo),
        ("protective", &p.protective),
        ("combined", &p.combined),
    ] {
        for (t, v) in p.years.iter().zip(values) {
            out.push_str(&format!("{},{},{}\n", scenario, number(*t), number(*v)));
        }
    }
    out
}

/// Symptomatic effect: `exposure,effect`.
pub fn emax_csv(report: &ModelReport) -> String {
    let mut out = String::from("exposure,effect\n");
    for (x, e) in report.emax.exposure.iter().zip(&report.emax.effect) {
        out.push_str(&format!("{},{}\n", number(*x), number(*e)));
    }
    out
}

/// Write every table into `dir`, returning the written paths.
pub fn write_csv_tables(report: &ModelReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let tables = [
        ("item_curves.csv", item_curves_csv(report)),
        ("item_information.csv", item_information_csv(report)),
        ("test_information.csv", test_information_csv(report)),
        ("progression.csv", progression_csv(report)),
        ("emax.csv", emax_csv(report)),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, content) in tables {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use irtdeck_core::config::IrtdeckConfig;
    use irtdeck_core::presets::cladribine_edss;

    fn make_test_report() -> ModelReport {
        let config = IrtdeckConfig {
            grid_points: 10,
            exposure_points: 5,
            time_points: 6,
            ..Default::default()
        };
        ModelReport::build(&cladribine_edss().unwrap(), &config).unwrap()
    }

    #[test]
    fn item_curves_row_count() {
        let report = make_test_report();
        let csv = item_curves_csv(&report);
        let thresholds: usize = report.items.iter().map(|i| i.thresholds.len()).sum();
        assert_eq!(csv.lines().count(), 1 + thresholds * 10);
        assert!(csv.starts_with("item,category,threshold,theta,probability\n"));
        assert!(csv.contains("\nBowel/Bladder,1,"));
    }

    #[test]
    fn test_information_rows() {
        let report = make_test_report();
        let csv = test_information_csv(&report);
        assert_eq!(csv.lines().count(), 11);
        let first: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(first[0], "-3");
        assert!(first[2].parse::<f64>().unwrap() > 0.0);
    }

    #[test]
    fn progression_has_three_scenarios() {
        let report = make_test_report();
        let csv = progression_csv(&report);
        assert_eq!(csv.lines().count(), 1 + 3 * 6);
        assert!(csv.contains("\ncombined,0,"));
    }

    #[test]
    fn infinite_values_written_as_inf() {
        assert_eq!(number(f64::INFINITY), "inf");
        assert_eq!(number(f64::NAN), "");
        assert_eq!(number(0.5), "0.5");
    }

    #[test]
    fn write_tables() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let written = write_csv_tables(&report, &dir.path().join("csv")).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));
        let emax = std::fs::read_to_string(dir.path().join("csv").join("emax.csv")).unwrap();
        assert!(emax.starts_with("exposure,effect\n0,0\n"));
    }
}
