//! The `irtdeck evaluate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use irtdeck_core::config::{load_config_from, parse_formats, OutputFormat};
use irtdeck_core::report::ModelReport;
use irtdeck_report::csv::write_csv_tables;
use irtdeck_report::deck::write_deck;
use irtdeck_report::html::write_html_report;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    model_path: Option<PathBuf>,
    theta_min: Option<f64>,
    theta_max: Option<f64>,
    points: Option<usize>,
    reference_exposure: Option<f64>,
    output: Option<PathBuf>,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    // Load config, then apply flag overrides
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(v) = theta_min {
        config.theta_min = v;
    }
    if let Some(v) = theta_max {
        config.theta_max = v;
    }
    if let Some(n) = points {
        config.grid_points = n;
    }
    if reference_exposure.is_some() {
        config.reference_exposure = reference_exposure;
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }

    anyhow::ensure!(
        config.theta_min < config.theta_max,
        "theta-min ({}) must be below theta-max ({})",
        config.theta_min,
        config.theta_max
    );
    anyhow::ensure!(config.grid_points >= 2, "points must be at least 2");

    let formats = match &format {
        Some(f) => parse_formats(&f.split(',').collect::<Vec<_>>())?,
        None => config.output_formats()?,
    };
    anyhow::ensure!(!formats.is_empty(), "at least one output format is required");

    let params = super::load_model(model_path.as_deref())?;
    eprintln!(
        "irtdeck v{} - Evaluating {} ({} items, {} thresholds) on {} grid points",
        env!("CARGO_PKG_VERSION"),
        params.model.title,
        params.items.len(),
        params.threshold_count(),
        config.grid_points
    );

    let report = ModelReport::build(&params, &config)?;

    print_summary(&report);
    for w in &report.warnings {
        tracing::warn!("{w}");
    }

    // Save outputs
    let output = &config.output_dir;
    std::fs::create_dir_all(output)?;
    let stem = params.model.file_stem();

    for fmt in &formats {
        match fmt {
            OutputFormat::Json => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("JSON report: {}", path.display());
            }
            OutputFormat::Html => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            OutputFormat::Deck => {
                let path = output.join(format!("{stem}-deck.md"));
                let charts = write_deck(&report, &path)?;
                eprintln!("Slide deck: {} (charts in {})", path.display(), charts.display());
            }
            OutputFormat::Csv => {
                let dir = output.join(format!("{stem}-csv"));
                let written = write_csv_tables(&report, &dir)?;
                eprintln!("CSV tables: {} ({} files)", dir.display(), written.len());
            }
        }
        tracing::info!(format = %fmt, "artifact written");
    }

    Ok(())
}

fn print_summary(report: &ModelReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Item",
        "a",
        "Class",
        "Categories",
        "Peak θ",
        "Peak info",
    ]);

    for item in &report.items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(format!("{:.3}", item.discrimination)),
            Cell::new(item.class),
            Cell::new(item.max_score),
            Cell::new(
                item.peak_theta
                    .map(|t| format!("{t:.2}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(
                item.peak_information
                    .map(|i| format!("{i:.3}"))
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }

    println!("{table}");

    let battery = &report.battery;
    match battery.peak_information {
        Some(peak) => println!(
            "Test information peaks at θ = {:.2} (I = {:.3}, SE = {:.3})",
            peak.theta,
            peak.value,
            peak.standard_error()
        ),
        None => println!("Test information is degenerate over the whole grid"),
    }
    if !battery.degenerate_points.is_empty() {
        println!(
            "Standard error undefined at {} of {} grid points",
            battery.degenerate_points.len(),
            battery.theta.len()
        );
    }
    println!(
        "Protected progression slope: {:.4} (placebo {:.4})",
        report.model.protected_slope, report.model.progression.slope
    );
}
