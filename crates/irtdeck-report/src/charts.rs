//! Named charts of a model report.
//!
//! The HTML page inlines these charts; the slide deck writes them as
//! standalone SVG files and links them from its chart slides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use irtdeck_core::report::ModelReport;

use crate::svg::{DotChart, LineChart, Series, PALETTE};

const THETA_LABEL: &str = "Latent disability θ";

/// One rendered chart.
#[derive(Debug, Clone)]
pub struct Chart {
    /// File name used when written on its own.
    pub file_name: String,
    pub title: String,
    /// `<svg>` element.
    pub svg: String,
}

impl Chart {
    fn new(file_name: impl Into<String>, title: impl Into<String>, svg: String) -> Self {
        Self {
            file_name: file_name.into(),
            title: title.into(),
            svg,
        }
    }
}

/// Item characteristic curves, one chart per item in battery order.
pub fn icc_charts(report: &ModelReport) -> Vec<Chart> {
    let theta = &report.battery.theta;
    report
        .battery
        .items
        .iter()
        .enumerate()
        .map(|(idx, curve)| {
            let title = format!("{} (a = {:.3})", curve.item, curve.discrimination);
            let mut chart = LineChart::new(&title, THETA_LABEL, "P(X ≥ k)").y_range(0.0, 1.0);
            for (i, cat) in curve.categories.iter().enumerate() {
                chart = chart.series(Series::new(
                    format!("k = {}", cat.category),
                    PALETTE[i % PALETTE.len()],
                    theta,
                    &cat.probabilities,
                ));
            }
            // index prefix keeps duplicate item names apart
            Chart::new(
                format!("icc-{}-{}.svg", idx + 1, slug(&curve.item)),
                format!("{} characteristic curves", curve.item),
                chart.render(),
            )
        })
        .collect()
}

pub fn item_information_chart(report: &ModelReport) -> Chart {
    let battery = &report.battery;
    let mut chart = LineChart::new("Item information", THETA_LABEL, "I(θ)");
    for (i, curve) in battery.items.iter().enumerate() {
        chart = chart.series(Series::new(
            curve.item.as_str(),
            PALETTE[i % PALETTE.len()],
            &battery.theta,
            &curve.information,
        ));
    }
    Chart::new("item_information.svg", "Item information", chart.render())
}

pub fn test_information_chart(report: &ModelReport) -> Chart {
    let battery = &report.battery;
    let mut chart = LineChart::new("Test information", THETA_LABEL, "I(θ)").series(Series::new(
        "Total",
        PALETTE[0],
        &battery.theta,
        &battery.test_information,
    ));
    if let Some(peak) = battery.peak_information {
        chart = chart.marker(peak.theta, format!("peak {:.2}", peak.value));
    }
    Chart::new("test_information.svg", "Test information", chart.render())
}

/// Standard error of measurement; degenerate points leave gaps.
pub fn standard_error_chart(report: &ModelReport) -> Chart {
    let battery = &report.battery;
    let chart = LineChart::new("Standard error of measurement", THETA_LABEL, "SE(θ)").series(
        Series::new("SE", PALETTE[4], &battery.theta, &battery.standard_error),
    );
    Chart::new("standard_error.svg", "Standard error of measurement", chart.render())
}

/// Cumulative threshold locations of every item, where `P(X ≥ k) = 0.5`.
pub fn threshold_chart(report: &ModelReport) -> Chart {
    let mut chart = DotChart::new("Threshold locations", THETA_LABEL).marker(0.0, "mean");
    for item in &report.items {
        chart = chart.row(item.name.as_str(), &item.thresholds);
    }
    Chart::new("thresholds.svg", "Threshold locations", chart.render())
}

pub fn emax_chart(report: &ModelReport) -> Chart {
    let emax = &report.emax;
    let chart = LineChart::new("Symptomatic effect (Emax)", "Exposure", "Effect")
        .series(Series::new("E(x)", PALETTE[4], &emax.exposure, &emax.effect))
        .marker(emax.ec50, "EC50");
    Chart::new("emax.svg", "Symptomatic effect (Emax)", chart.render())
}

pub fn progression_chart(report: &ModelReport) -> Chart {
    let prog = &report.progression;
    let chart = LineChart::new("Disease progression", "Time (years)", "Disability change")
        .series(Series::new("Placebo", "#6b7280", &prog.years, &prog.placebo).dashed())
        .series(Series::new(
            "Protective",
            PALETTE[1],
            &prog.years,
            &prog.protective,
        ))
        .series(Series::new(
            "Protective + symptomatic",
            PALETTE[0],
            &prog.years,
            &prog.combined,
        ));
    Chart::new("progression.svg", "Disease progression", chart.render())
}

/// Every chart of the report.
pub fn all_charts(report: &ModelReport) -> Vec<Chart> {
    let mut charts = icc_charts(report);
    charts.extend([
        item_information_chart(report),
        test_information_chart(report),
        standard_error_chart(report),
        threshold_chart(report),
        emax_chart(report),
        progression_chart(report),
    ]);
    charts
}

/// Write `charts` as standalone SVG files into `dir`.
pub fn write_charts(charts: &[Chart], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = dir.join(&chart.file_name);
        let content = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", chart.svg);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Lowercase ASCII file-name fragment of an item name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "item".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irtdeck_core::config::IrtdeckConfig;
    use irtdeck_core::presets::cladribine_edss;

    fn make_test_report() -> ModelReport {
        let config = IrtdeckConfig {
            grid_points: 30,
            exposure_points: 10,
            time_points: 10,
            ..Default::default()
        };
        ModelReport::build(&cladribine_edss().unwrap(), &config).unwrap()
    }

    #[test]
    fn one_chart_per_kind_plus_iccs() {
        let report = make_test_report();
        let charts = all_charts(&report);
        assert_eq!(charts.len(), 8 + 6);
        assert_eq!(charts[4].file_name, "icc-5-bowel-bladder.svg");
        assert!(charts.iter().all(|c| c.svg.starts_with("<svg")));
        let mut names: Vec<&str> = charts.iter().map(|c| c.file_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), charts.len());
    }

    #[test]
    fn threshold_chart_has_a_dot_per_threshold() {
        let report = make_test_report();
        let chart = threshold_chart(&report);
        let thresholds: usize = report.items.iter().map(|i| i.thresholds.len()).sum();
        assert_eq!(chart.svg.matches("<circle").count(), thresholds);
        assert!(chart.svg.contains(">Ambulation</text>"));
    }

    #[test]
    fn slug_is_file_safe() {
        assert_eq!(slug("Bowel/Bladder"), "bowel-bladder");
        assert_eq!(slug("  Mental  "), "mental");
        assert_eq!(slug("../.."), "item");
    }

    #[test]
    fn write_charts_as_svg_files() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let charts = vec![emax_chart(&report), threshold_chart(&report)];
        let written = write_charts(&charts, &dir.path().join("charts")).unwrap();
        assert_eq!(written.len(), 2);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.contains("EC50"));
    }
}
