//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS and charts inlined.

use anyhow::{Context, Result};
use std::path::Path;

use irtdeck_core::report::ModelReport;

use crate::charts::{
    emax_chart, icc_charts, item_information_chart, progression_chart, standard_error_chart,
    test_information_chart, threshold_chart,
};
use crate::escape::html_escape;

/// Generate an HTML report from a model report.
pub fn generate_html(report: &ModelReport) -> String {
    let info = &report.model.info;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>irtdeck report: {}</title>\n",
        html_escape(&info.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&info.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} | {} items | {}</p>\n",
        html_escape(&info.drug),
        html_escape(&info.reference),
        report.model.item_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    if !report.warnings.is_empty() {
        html.push_str("<section class=\"warnings\">\n<h2>Warnings</h2>\n<ul>\n");
        for w in &report.warnings {
            html.push_str(&format!("<li>{}</li>\n", html_escape(w)));
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str(&parameter_section(report));
    html.push_str(&item_section(report));
    html.push_str(&icc_section(report));
    html.push_str(&information_section(report));
    html.push_str(&drug_section(report));
    html.push_str(&correlation_section(report));

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ModelReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn parameter_section(report: &ModelReport) -> String {
    let m = &report.model;
    let mut html = String::from("<section>\n<h2>Parameter Estimates</h2>\n");
    html.push_str("<table class=\"params\">\n<thead><tr><th>Parameter</th><th>Estimate</th></tr></thead>\n<tbody>\n");
    let rows = [
        ("Progression slope (θ₁)", format!("{:.3}", m.progression.slope)),
        ("Time-course power (θ₂)", format!("{:.3}", m.progression.power)),
        ("Emax (symptomatic)", format!("{:.3}", m.drug_effect.emax)),
        ("EC50 (symptomatic)", format!("{:.2}", m.drug_effect.ec50)),
        (
            "Protective effect",
            format!("{:.1}%", m.drug_effect.protective * 100.0),
        ),
        ("Protected slope", format!("{:.4}", m.protected_slope)),
    ];
    for (name, value) in rows {
        html.push_str(&format!("<tr><td>{name}</td><td>{value}</td></tr>\n"));
    }
    for c in &m.covariates {
        html.push_str(&format!(
            "<tr><td>Mean {} ({})</td><td>{:.3}</td></tr>\n",
            html_escape(&c.name),
            html_escape(&c.unit),
            c.mean
        ));
    }
    if let Some(ofv) = m.fit.objective_function {
        html.push_str(&format!("<tr><td>Objective function</td><td>{ofv:.3}</td></tr>\n"));
    }
    if let Some(method) = &m.fit.method {
        html.push_str(&format!(
            "<tr><td>Estimation method</td><td>{}</td></tr>\n",
            html_escape(method)
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
    html
}

fn item_section(report: &ModelReport) -> String {
    let mut html = String::from("<section>\n<h2>Item Parameters</h2>\n");
    html.push_str("<table class=\"items\">\n<thead><tr><th>Item</th><th>Discrimination</th><th>Class</th><th>Max score</th><th>Thresholds</th><th>Peak θ</th></tr></thead>\n<tbody>\n");
    for item in &report.items {
        let thresholds: Vec<String> = item.thresholds.iter().map(|t| format!("{t:.2}")).collect();
        let peak = item
            .peak_theta
            .map(|t| format!("{t:.2}"))
            .unwrap_or_else(|| "-".into());
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.3}</td><td class=\"class-{}\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&item.name),
            item.discrimination,
            item.class.to_string().replace(' ', "-"),
            item.class,
            item.max_score,
            thresholds.join(", "),
            peak
        ));
    }
    html.push_str("</tbody></table>\n");
    if let Some(mean) = report.discrimination.mean {
        html.push_str(&format!(
            "<p class=\"meta\">Mean discrimination: {mean:.3}</p>\n"
        ));
    }
    html.push_str("</section>\n");
    html
}

fn icc_section(report: &ModelReport) -> String {
    let mut html = String::from("<section class=\"charts\">\n<h2>Item Characteristic Curves</h2>\n");
    for chart in icc_charts(report) {
        html.push_str(&chart.svg);
    }
    html.push_str("</section>\n");
    html
}

fn information_section(report: &ModelReport) -> String {
    let battery = &report.battery;
    let mut html = String::from("<section class=\"charts\">\n<h2>Information</h2>\n");

    html.push_str(&item_information_chart(report).svg);

    match battery.peak_information {
        Some(peak) => html.push_str(&format!(
            "<p class=\"meta\">Peak test information {:.3} at θ = {:.2} (SE {:.3})</p>\n",
            peak.value,
            peak.theta,
            peak.standard_error()
        )),
        None => html.push_str("<p class=\"meta\">No test information anywhere on the grid.</p>\n"),
    }
    html.push_str(&test_information_chart(report).svg);

    html.push_str(&standard_error_chart(report).svg);
    if !battery.degenerate_points.is_empty() {
        html.push_str(&format!(
            "<p class=\"meta\">Standard error undefined at {} grid points (no information).</p>\n",
            battery.degenerate_points.len()
        ));
    }

    html.push_str(&threshold_chart(report).svg);
    html.push_str("</section>\n");
    html
}

fn drug_section(report: &ModelReport) -> String {
    let mut html = String::from("<section class=\"charts\">\n<h2>Drug Effects</h2>\n");
    html.push_str(&emax_chart(report).svg);
    html.push_str(&progression_chart(report).svg);
    html.push_str(&format!(
        "<p class=\"meta\">Symptomatic offset evaluated at exposure {:.2}.</p>\n",
        report.progression.reference_exposure
    ));
    html.push_str("</section>\n");
    html
}

fn correlation_section(report: &ModelReport) -> String {
    let c = &report.correlations;
    let mut html = String::from("<section>\n<h2>Random-Effect Correlations</h2>\n");
    html.push_str("<table class=\"corr\">\n<thead><tr><th></th>");
    for name in &c.names {
        html.push_str(&format!("<th>{}</th>", html_escape(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for (name, row) in c.names.iter().zip(&c.matrix) {
        html.push_str(&format!("<tr><th>{}</th>", html_escape(name)));
        for r in row {
            let alpha = (r.abs() * 0.8).min(0.8);
            let rgb = if *r < 0.0 { "220,38,38" } else { "37,99,235" };
            html.push_str(&format!(
                "<td style=\"background: rgba({rgb},{alpha:.2})\">{r:.3}</td>"
            ));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table>\n");

    if !c.positive_definite {
        html.push_str("<p class=\"warn\">Correlation matrix is not positive definite.</p>\n");
    }
    if !c.strongest.is_empty() {
        html.push_str("<h3>Strongest correlations</h3>\n<ul>\n");
        for r in &c.strongest {
            html.push_str(&format!(
                "<li>{} / {}: {:.3} ({})</li>\n",
                html_escape(&r.first),
                html_escape(&r.second),
                r.value,
                r.describe()
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");
    html
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --warn: #fef3c7; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --warn: #78350f; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.4rem 0.8rem; text-align: left; }
th { background: var(--border); }
.warnings, .warn { background: var(--warn); padding: 0.5rem 1rem; border-radius: 8px; }
.class-very-high { font-weight: bold; }
.charts svg { display: inline-block; margin: 0.5rem; }
"#;
