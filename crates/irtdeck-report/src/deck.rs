//! Markdown slide deck generator.
//!
//! Slides are separated by `---` lines and carry speaker notes in HTML
//! comments, the layout most Markdown presentation tools understand. Chart
//! slides link standalone SVG files written next to the deck.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use irtdeck_core::model::DiscriminationClass;
use irtdeck_core::report::ModelReport;

use crate::charts::{all_charts, write_charts, Chart};

/// Charts shown on the information slide, in order.
const INFORMATION_CHARTS: [&str; 4] = [
    "item_information.svg",
    "test_information.svg",
    "standard_error.svg",
    "thresholds.svg",
];
const DRUG_CHARTS: [&str; 2] = ["emax.svg", "progression.svg"];

/// One slide of the deck.
#[derive(Debug, Clone)]
pub struct Slide {
    pub title: String,
    pub body: String,
    pub notes: Vec<String>,
}

impl Slide {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            notes: Vec::new(),
        }
    }

    fn line(mut self, line: impl AsRef<str>) -> Self {
        self.body.push_str(line.as_ref());
        self.body.push('\n');
        self
    }

    /// Link every chart matching `pick`, relative to `dir`.
    fn charts(mut self, charts: &[Chart], dir: &str, pick: impl Fn(&Chart) -> bool) -> Self {
        let dir = dir.replace(' ', "%20");
        for chart in charts.iter().filter(|c| pick(c)) {
            self = self.line(format!("![{}]({}/{})", chart.title, dir, chart.file_name));
        }
        self
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.title);
        md.push_str(&self.body);
        if !self.notes.is_empty() {
            md.push_str("\n<!--\nnotes:\n");
            for n in &self.notes {
                // a literal "-->" would close the comment early
                md.push_str(&format!("- {}\n", n.replace("-->", "->")));
            }
            md.push_str("-->\n");
        }
        md
    }
}

/// Build every slide of the deck in presentation order.
///
/// Chart slides link the files of `charts` under the relative directory
/// `chart_dir`.
pub fn build_slides(report: &ModelReport, charts: &[Chart], chart_dir: &str) -> Vec<Slide> {
    vec![
        title_slide(report),
        agenda_slide(),
        background_slide(report),
        structure_slide(report),
        parameter_slide(report),
        correlation_slide(report),
        icc_chart_slide(report, charts, chart_dir),
        interpretation_slide(report),
        information_chart_slide(report, charts, chart_dir),
        drug_chart_slide(report, charts, chart_dir),
        drug_effect_slide(report),
        summary_slide(report),
        references_slide(report),
    ]
}

/// Generate the complete deck.
pub fn generate_deck(report: &ModelReport, charts: &[Chart], chart_dir: &str) -> String {
    build_slides(report, charts, chart_dir)
        .iter()
        .map(Slide::to_markdown)
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Name of the chart directory that sits next to the deck at `path`.
pub fn chart_dir_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string());
    format!("{stem}-charts")
}

/// Write the deck and its charts, returning the chart directory.
pub fn write_deck(report: &ModelReport, path: &Path) -> Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let dir_name = chart_dir_name(path);
    let chart_dir = parent.join(&dir_name);

    let charts = all_charts(report);
    write_charts(&charts, &chart_dir)?;

    let md = generate_deck(report, &charts, &dir_name);
    std::fs::write(path, md)
        .with_context(|| format!("failed to write deck to {}", path.display()))?;
    Ok(chart_dir)
}

fn title_slide(report: &ModelReport) -> Slide {
    let info = &report.model.info;
    let mut slide = Slide::new(info.title.as_str());
    if !info.drug.is_empty() || !info.indication.is_empty() {
        slide = slide.line(format!("**{}** in {}", info.drug, info.indication));
    }
    if !info.reference.is_empty() {
        slide = slide.line("").line(format!("Based on {}", info.reference));
    }
    slide
        .line("")
        .line(format!("Generated {}", report.created_at.format("%Y-%m-%d")))
        .note(format!(
            "Longitudinal IRT model with {} items linked to one latent {} variable",
            report.model.item_count,
            info.latent_trait.to_lowercase()
        ))
}

fn agenda_slide() -> Slide {
    Slide::new("Overview")
        .line("1. **Clinical Background**: the composite scale and why IRT fits it")
        .line("2. **Model Structure**: longitudinal IRT framework with drug effects")
        .line("3. **Parameter Estimates**: population parameters and variability")
        .line("4. **Random Effects**: correlation structure")
        .line("5. **IRT Analysis**: item characteristic curves and information")
        .line("6. **Drug Effects**: symptomatic and disease-modifying mechanisms")
        .line("7. **Summary**: key findings")
}

fn background_slide(report: &ModelReport) -> Slide {
    let info = &report.model.info;
    let trait_name = info.latent_trait.to_lowercase();
    let mut slide = Slide::new("Clinical Background");
    if !info.indication.is_empty() {
        slide = slide.line(format!("- **Indication**: {}", info.indication));
    }
    if !info.drug.is_empty() {
        slide = slide.line(format!("- **Treatment**: {}", info.drug));
    }
    slide = slide.line(format!(
        "- **Composite scale**: {} item subscores",
        report.model.item_count
    ));
    for item in &report.items {
        slide = slide.line(format!("  - {} (0-{})", item.name, item.thresholds.len()));
    }

    let mut ranges: Vec<usize> = report.items.iter().map(|i| i.thresholds.len()).collect();
    ranges.sort_unstable();
    ranges.dedup();
    let ranges: Vec<String> = ranges.iter().map(|r| format!("0-{r}")).collect();

    slide = slide
        .line("")
        .line("**Why item response theory?**")
        .line("")
        .line("- Subscores are ordinal, so regression on the raw scores is inappropriate");
    if ranges.len() > 1 {
        slide = slide.line(format!(
            "- Subscores have different ranges ({}) and are not directly comparable",
            ranges.join(", ")
        ));
    }
    slide
        .line("- Floor and ceiling effects mask true changes")
        .line(format!(
            "- One latent {trait_name} variable underlies all observed subscores"
        ))
        .note("IRT gives a single disease metric across all subscores")
        .note("Each subscore ranges from 0 to its number of thresholds")
}

fn structure_slide(report: &ModelReport) -> Slide {
    let trait_name = &report.model.info.latent_trait;
    Slide::new("Model Structure")
        .line("```")
        .line("PD(t) = P1 + (θ₁ + P2) · t^θ₂ · (1 - Ef_prot) - Ef_symp")
        .line("P(X ≥ k | PD) = 1 / (1 + exp(-a · (PD - b_k)))")
        .line("```")
        .line("")
        .line(format!("- **Disease progression**: power model, θ₁ = {:.3}, θ₂ = {:.3}", report.model.progression.slope, report.model.progression.power))
        .line("- **Symptomatic effect**: Emax model on exposure, shifts the level")
        .line("- **Protective effect**: proportional reduction of the progression rate")
        .line(format!(
            "- **Measurement**: {} items, graded response model on latent {}",
            report.model.item_count,
            trait_name.to_lowercase()
        ))
        .note(format!(
            "Central latent variable represents the underlying {}",
            trait_name.to_lowercase()
        ))
        .note(if report.model.progression.power < 1.0 {
            "Power below 1 means progression decelerates over time"
        } else {
            "Power of at least 1 means progression does not decelerate"
        })
        .note("Drug effects are active only after the start of treatment")
        .note("Each item threshold is the running sum of its boundary offsets")
}

fn parameter_slide(report: &ModelReport) -> Slide {
    let m = &report.model;
    let mut slide = Slide::new("Parameter Estimates")
        .line("| Parameter | Estimate |")
        .line("|-----------|----------|")
        .line(format!("| Progression slope θ₁ | {:.3} |", m.progression.slope))
        .line(format!("| Time-course power θ₂ | {:.3} |", m.progression.power))
        .line(format!("| Emax | {:.3} |", m.drug_effect.emax))
        .line(format!("| EC50 | {:.2} |", m.drug_effect.ec50))
        .line(format!(
            "| Protective effect | {:.1}% |",
            m.drug_effect.protective * 100.0
        ));
    for c in &m.covariates {
        slide = slide.line(format!("| Mean {} | {:.3} |", c.name, c.mean));
    }
    if let Some(ofv) = m.fit.objective_function {
        slide = slide.line(format!("| OFV | {ofv:.3} |"));
    }

    slide = slide.line("").line("| Item | a | Class |").line("|------|---|-------|");
    for item in &report.items {
        slide = slide.line(format!(
            "| {} | {:.3} | {} |",
            item.name, item.discrimination, item.class
        ));
    }

    slide = slide.note(format!(
        "Disease progression slope {:.3} per year at t = 1",
        m.progression.slope
    ));
    if let Some((name, a)) = report.discrimination.ranked.first() {
        slide = slide.note(format!("{name} has the highest discrimination ({a:.2})"));
    }
    if let Some((name, a)) = report.discrimination.ranked.last() {
        slide = slide.note(format!("{name} has the lowest discrimination ({a:.2})"));
    }
    if let Some(method) = &m.fit.method {
        slide = slide.note(format!("Estimated with {method}"));
    }
    slide
}

fn correlation_slide(report: &ModelReport) -> Slide {
    let c = &report.correlations;
    let mut header = String::from("| |");
    let mut rule = String::from("|-|");
    for name in &c.names {
        header.push_str(&format!(" {name} |"));
        rule.push_str("-|");
    }
    let mut slide = Slide::new("Random-Effect Correlations").line(header).line(rule);
    for (name, row) in c.names.iter().zip(&c.matrix) {
        let cells: Vec<String> = row.iter().map(|r| format!("{r:.3}")).collect();
        slide = slide.line(format!("| **{name}** | {} |", cells.join(" | ")));
    }
    slide = slide.line("");
    for r in &c.strongest {
        slide = slide.line(format!(
            "- {} / {}: {:.3} ({})",
            r.first,
            r.second,
            r.value,
            r.describe()
        ));
    }

    slide = slide.note(if c.positive_definite {
        "Correlation matrix is positive definite (Cholesky factorisation exists)"
    } else {
        "Correlation matrix is NOT positive definite; check the estimates"
    });
    if let Some(top) = c.strongest.first() {
        slide = slide.note(format!(
            "Strongest pair is {}-{} ({:.2}, {})",
            top.first,
            top.second,
            top.value,
            top.describe()
        ));
    }
    let negative = c.strongest.iter().filter(|r| r.value < 0.0).count();
    if negative > 0 {
        slide = slide.note(format!("{negative} of the strongest correlations are negative"));
    }
    slide
}

fn icc_chart_slide(report: &ModelReport, charts: &[Chart], dir: &str) -> Slide {
    let mut slide = Slide::new("Item Characteristic Curves")
        .line("Probability of scoring at least k at each level of the latent trait")
        .line("")
        .charts(charts, dir, |c| c.file_name.starts_with("icc-"))
        .note("Steeper curves mean higher discrimination and better differentiation");
    if let Some((name, _)) = report.discrimination.ranked.first() {
        slide = slide.note(format!("{name} shows the sharpest transitions"));
    }
    if let [(name, _)] = report.discrimination.bottom(1).as_slice() {
        slide = slide.note(format!("{name} shows the most gradual curves"));
    }
    slide.note("Curve spacing shows where the item thresholds lie")
}

fn information_chart_slide(report: &ModelReport, charts: &[Chart], dir: &str) -> Slide {
    let mut slide = Slide::new("Item and Test Information")
        .line("Discrimination, information, and threshold locations")
        .line("")
        .charts(charts, dir, |c| INFORMATION_CHARTS.contains(&c.file_name.as_str()));

    slide = slide.note(match report.battery.peak_information {
        Some(peak) => format!(
            "Test information peaks at θ = {:.2} (SE {:.2})",
            peak.theta,
            peak.standard_error()
        ),
        None => "Test information is degenerate over the whole grid".to_string(),
    });
    let widest = report
        .items
        .iter()
        .filter_map(|i| {
            let lo = i.thresholds.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = i.thresholds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (hi >= lo).then_some((i.name.as_str(), lo, hi))
        })
        .max_by(|a, b| (a.2 - a.1).total_cmp(&(b.2 - b.1)));
    if let Some((name, lo, hi)) = widest {
        slide = slide.note(format!(
            "{name} thresholds span the widest range, θ = {lo:.2} to {hi:.2}"
        ));
    }
    slide
        .note("Each item is most useful where its information curve is high")
        .note("Standard error is inversely related to information")
}

fn drug_chart_slide(report: &ModelReport, charts: &[Chart], dir: &str) -> Slide {
    let d = &report.model.drug_effect;
    Slide::new("Drug Effect Curves")
        .line("Symptomatic and disease-modifying mechanisms")
        .line("")
        .charts(charts, dir, |c| DRUG_CHARTS.contains(&c.file_name.as_str()))
        .note(format!("Half of the maximal symptomatic effect at EC50 = {:.2}", d.ec50))
        .note(format!(
            "Protective effect ({:.1}%) acts on the progression rate, not the level",
            d.protective * 100.0
        ))
        .note("Combined curves separate over time")
}

fn interpretation_slide(report: &ModelReport) -> Slide {
    let high: Vec<String> = report
        .items
        .iter()
        .filter(|i| i.class >= DiscriminationClass::High)
        .map(|i| format!("{} ({:.2})", i.name, i.discrimination))
        .collect();
    let low: Vec<String> = report
        .items
        .iter()
        .filter(|i| i.class == DiscriminationClass::Low)
        .map(|i| format!("{} ({:.2})", i.name, i.discrimination))
        .collect();

    let mut slide = Slide::new("IRT Interpretation")
        .line("Discrimination guide: < 1.0 low, 1.0 - 1.5 moderate, 1.5 - 2.5 high, > 2.5 very high")
        .line("");
    slide = slide.line(format!(
        "- **Highly discriminating**: {}",
        if high.is_empty() { "none".to_string() } else { high.join(", ") }
    ));
    slide = slide.line(format!(
        "- **Weakly discriminating**: {}",
        if low.is_empty() { "none".to_string() } else { low.join(", ") }
    ));
    slide = slide.line(match report.battery.peak_information {
        Some(peak) => format!(
            "- **Test information** peaks at θ = {:.2} (I = {:.2}, SE = {:.2})",
            peak.theta,
            peak.value,
            peak.standard_error()
        ),
        None => "- **Test information**: no information anywhere on the grid".to_string(),
    });

    slide
        .note("Steeper curves mean higher discrimination and better differentiation")
        .note("Items are most informative where their curves are steepest")
        .note("Standard error is the inverse square root of test information")
        .note("Precision drops at the extremes of the latent scale")
}

fn drug_effect_slide(report: &ModelReport) -> Slide {
    let d = &report.model.drug_effect;
    let prog = &report.progression;
    let mut slide = Slide::new("Drug Effects")
        .line(format!(
            "- **Symptomatic**: E(x) = {:.3} · x / (x + {:.2})",
            d.emax, d.ec50
        ))
        .line(format!(
            "- **Protective**: progression rate reduced by {:.1}% (slope {:.4} → {:.4})",
            d.protective * 100.0,
            report.model.progression.slope,
            report.model.protected_slope
        ));
    if let (Some(&t), Some(b)) = (prog.years.last(), prog.benefit().last()) {
        slide = slide.line(format!(
            "- **Benefit at {t:.1} years**: {b:.3} disability units versus placebo"
        ));
    }
    slide
        .note("Emax model gives a saturable symptomatic effect with exposure")
        .note(format!(
            "Symptomatic offset shown at exposure {:.2}",
            prog.reference_exposure
        ))
        .note("Protective effect acts on the progression rate, not the level")
        .note("Curves separate over time, so the benefit grows long-term")
}

fn summary_slide(report: &ModelReport) -> Slide {
    let mut slide = Slide::new("Summary");
    if let Some((name, a)) = report.discrimination.ranked.first() {
        slide = slide.line(format!("- {name} is the most informative item (a = {a:.2})"));
    }
    if let Some(mean) = report.discrimination.mean {
        slide = slide.line(format!("- Mean discrimination across items: {mean:.2}"));
    }
    if let Some(peak) = report.battery.peak_information {
        slide = slide.line(format!(
            "- Measurement is most precise around θ = {:.1}",
            peak.theta
        ));
    }
    slide = slide.line(format!(
        "- Treatment slows progression by {:.1}%",
        report.model.drug_effect.protective * 100.0
    ));
    for w in &report.warnings {
        slide = slide.note(format!("Warning: {w}"));
    }
    slide
}

fn references_slide(report: &ModelReport) -> Slide {
    let mut slide = Slide::new("References");
    if !report.model.info.reference.is_empty() {
        slide = slide.line(format!("- {}", report.model.info.reference));
    }
    slide
        .line("- Samejima F. Estimation of latent ability using a response pattern of graded scores. Psychometrika Monograph Supplement, 1969")
        .line("- Ueckert S. Modeling composite assessment data using item response theory. CPT Pharmacometrics Syst Pharmacol, 2018")
}
