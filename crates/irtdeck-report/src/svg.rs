//! Minimal inline SVG line charts.

use crate::escape::html_escape;

/// Series colours, cycled in order.
pub const PALETTE: [&str; 8] = [
    "#2563eb", "#16a34a", "#9333ea", "#ea580c", "#dc2626", "#0891b2", "#ca8a04", "#db2777",
];

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 150.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 42.0;

/// One named line of a chart.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub dashed: bool,
}

impl Series {
    pub fn new(label: impl Into<String>, color: &str, x: &[f64], y: &[f64]) -> Self {
        Self {
            label: label.into(),
            color: color.to_string(),
            x: x.to_vec(),
            y: y.to_vec(),
            dashed: false,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// A line chart with a shared x axis.
#[derive(Debug, Clone, Default)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    /// Fixed y range; computed from the data when `None`.
    pub y_range: Option<(f64, f64)>,
    /// Vertical reference lines `(x, label)`.
    pub markers: Vec<(f64, String)>,
}

impl LineChart {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            ..Default::default()
        }
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn marker(mut self, x: f64, label: impl Into<String>) -> Self {
        self.markers.push((x, label.into()));
        self
    }

    fn x_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.series.iter().flat_map(|s| s.x.iter().copied()))
    }

    fn y_bounds(&self) -> Option<(f64, f64)> {
        if let Some(range) = self.y_range {
            return Some(range);
        }
        bounds(self.series.iter().flat_map(|s| s.y.iter().copied()))
    }

    /// Render the chart as an `<svg>` element.
    pub fn render(&self) -> String {
        let mut svg = format!(
            "<svg class=\"chart\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" width=\"{WIDTH}\" height=\"{HEIGHT}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
        );
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"18\" font-size=\"14\" font-weight=\"bold\" fill=\"currentColor\">{}</text>\n",
            MARGIN_LEFT,
            html_escape(&self.title)
        ));

        let (Some((x_min, x_max)), Some((y_min, y_max))) = (self.x_bounds(), self.y_bounds())
        else {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\">no data</text>\n</svg>\n",
                WIDTH / 2.0,
                HEIGHT / 2.0
            ));
            return svg;
        };

        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let sx = |x: f64| MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_w;
        let sy = |y: f64| MARGIN_TOP + (1.0 - (y - y_min) / (y_max - y_min)) * plot_h;

        // axes
        svg.push_str(&format!(
            "  <rect x=\"{MARGIN_LEFT}\" y=\"{MARGIN_TOP}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"none\" stroke=\"#9ca3af\"/>\n"
        ));
        for i in 0..=4 {
            let fx = x_min + (x_max - x_min) * i as f64 / 4.0;
            let fy = y_min + (y_max - y_min) * i as f64 / 4.0;
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
                sx(fx),
                HEIGHT - MARGIN_BOTTOM + 14.0,
                tick(fx)
            ));
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
                MARGIN_LEFT - 6.0,
                sy(fy),
                tick(fy)
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            MARGIN_LEFT + plot_w / 2.0,
            HEIGHT - 6.0,
            html_escape(&self.x_label)
        ));
        svg.push_str(&format!(
            "  <text x=\"12\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"middle\" transform=\"rotate(-90 12 {:.1})\">{}</text>\n",
            MARGIN_TOP + plot_h / 2.0,
            MARGIN_TOP + plot_h / 2.0,
            html_escape(&self.y_label)
        ));

        push_markers(&mut svg, &self.markers, (x_min, x_max), &sx, plot_h);

        for (i, series) in self.series.iter().enumerate() {
            let dash = if series.dashed {
                " stroke-dasharray=\"6 4\""
            } else {
                ""
            };
            // Non-finite or out-of-range points split the line into segments
            for segment in segments(&series.x, &series.y, y_min, y_max) {
                let points: Vec<String> = segment
                    .iter()
                    .map(|&(x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
                    .collect();
                svg.push_str(&format!(
                    "  <polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\"{} points=\"{}\"/>\n",
                    html_escape(&series.color),
                    dash,
                    points.join(" ")
                ));
            }

            let ly = MARGIN_TOP + 8.0 + i as f64 * 16.0;
            let lx = WIDTH - MARGIN_RIGHT + 10.0;
            svg.push_str(&format!(
                "  <line x1=\"{lx}\" y1=\"{ly}\" x2=\"{}\" y2=\"{ly}\" stroke=\"{}\" stroke-width=\"2\"{dash}/>\n",
                lx + 16.0,
                html_escape(&series.color)
            ));
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{ly}\" font-size=\"11\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
                lx + 20.0,
                html_escape(&series.label)
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Horizontal dot plot with one labelled row of points per category,
/// points coloured by their position in the row.
#[derive(Debug, Clone, Default)]
pub struct DotChart {
    pub title: String,
    pub x_label: String,
    pub rows: Vec<(String, Vec<f64>)>,
    pub markers: Vec<(f64, String)>,
}

const DOT_MARGIN_LEFT: f64 = 110.0;
const DOT_MARGIN_RIGHT: f64 = 30.0;
const ROW_HEIGHT: f64 = 28.0;

impl DotChart {
    pub fn new(title: &str, x_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            ..Default::default()
        }
    }

    pub fn row(mut self, label: impl Into<String>, values: &[f64]) -> Self {
        self.rows.push((label.into(), values.to_vec()));
        self
    }

    pub fn marker(mut self, x: f64, label: impl Into<String>) -> Self {
        self.markers.push((x, label.into()));
        self
    }

    /// Render the chart as an `<svg>` element.
    pub fn render(&self) -> String {
        let plot_h = ROW_HEIGHT * self.rows.len().max(1) as f64;
        let height = MARGIN_TOP + plot_h + MARGIN_BOTTOM;
        let mut svg = format!(
            "<svg class=\"chart\" viewBox=\"0 0 {WIDTH} {height}\" width=\"{WIDTH}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
        );
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"18\" font-size=\"14\" font-weight=\"bold\" fill=\"currentColor\">{}</text>\n",
            DOT_MARGIN_LEFT,
            html_escape(&self.title)
        ));

        let Some((x_min, x_max)) = bounds(self.rows.iter().flat_map(|(_, v)| v.iter().copied()))
        else {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\">no data</text>\n</svg>\n",
                WIDTH / 2.0,
                height / 2.0
            ));
            return svg;
        };
        // leave room for the outermost dots
        let pad = (x_max - x_min) * 0.05;
        let (x_min, x_max) = (x_min - pad, x_max + pad);

        let plot_w = WIDTH - DOT_MARGIN_LEFT - DOT_MARGIN_RIGHT;
        let sx = |x: f64| DOT_MARGIN_LEFT + (x - x_min) / (x_max - x_min) * plot_w;

        svg.push_str(&format!(
            "  <rect x=\"{DOT_MARGIN_LEFT}\" y=\"{MARGIN_TOP}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"none\" stroke=\"#9ca3af\"/>\n"
        ));
        for i in 0..=4 {
            let fx = x_min + (x_max - x_min) * i as f64 / 4.0;
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
                sx(fx),
                height - MARGIN_BOTTOM + 14.0,
                tick(fx)
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            DOT_MARGIN_LEFT + plot_w / 2.0,
            height - 6.0,
            html_escape(&self.x_label)
        ));

        push_markers(&mut svg, &self.markers, (x_min, x_max), &sx, plot_h);

        for (row, (label, values)) in self.rows.iter().enumerate() {
            let cy = MARGIN_TOP + (row as f64 + 0.5) * ROW_HEIGHT;
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{cy:.1}\" font-size=\"11\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
                DOT_MARGIN_LEFT - 6.0,
                html_escape(label)
            ));
            let finite: Vec<(usize, f64)> = values
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .collect();
            if finite.len() > 1 {
                let points: Vec<String> = finite
                    .iter()
                    .map(|&(_, v)| format!("{:.1},{cy:.1}", sx(v)))
                    .collect();
                svg.push_str(&format!(
                    "  <polyline fill=\"none\" stroke=\"#6b7280\" stroke-opacity=\"0.5\" points=\"{}\"/>\n",
                    points.join(" ")
                ));
            }
            for (k, v) in finite {
                svg.push_str(&format!(
                    "  <circle cx=\"{:.1}\" cy=\"{cy:.1}\" r=\"5\" fill=\"{}\" stroke=\"#111827\"/>\n",
                    sx(v),
                    PALETTE[k % PALETTE.len()]
                ));
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Vertical dashed reference lines for every marker inside `x_range`.
fn push_markers(
    svg: &mut String,
    markers: &[(f64, String)],
    (x_min, x_max): (f64, f64),
    sx: impl Fn(f64) -> f64,
    plot_h: f64,
) {
    for (x, label) in markers {
        if *x < x_min || *x > x_max {
            continue;
        }
        svg.push_str(&format!(
            "  <line x1=\"{0:.1}\" y1=\"{1}\" x2=\"{0:.1}\" y2=\"{2}\" stroke=\"#9ca3af\" stroke-dasharray=\"3 3\"/>\n",
            sx(*x),
            MARGIN_TOP,
            MARGIN_TOP + plot_h
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"currentColor\">{}</text>\n",
            sx(*x) + 3.0,
            MARGIN_TOP + 12.0,
            html_escape(label)
        ));
    }
}

/// Finite min/max of `values`, widened when degenerate.
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;
    if max > min {
        Some((min, max))
    } else {
        Some((min - 0.5, max + 0.5))
    }
}

fn segments(x: &[f64], y: &[f64], y_min: f64, y_max: f64) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (&px, &py) in x.iter().zip(y) {
        if px.is_finite() && py.is_finite() && py >= y_min && py <= y_max {
            current.push((px, py));
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn tick(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else if v.abs() >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_polyline_per_series() {
        let x = [0.0, 1.0, 2.0];
        let chart = LineChart::new("Test", "x", "y")
            .series(Series::new("a", PALETTE[0], &x, &[0.0, 1.0, 0.5]))
            .series(Series::new("b", PALETTE[1], &x, &[1.0, 0.0, 0.5]).dashed());
        let svg = chart.render();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains(">a</text>"));
    }

    #[test]
    fn infinite_values_split_the_line() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 2.0, f64::INFINITY, 2.0, 1.0];
        let svg = LineChart::new("SE", "θ", "SE")
            .series(Series::new("se", PALETTE[0], &x, &y))
            .render();
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn empty_chart_says_no_data() {
        let svg = LineChart::new("Empty", "x", "y").render();
        assert!(svg.contains("no data"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = LineChart::new("<b>", "x", "y")
            .series(Series::new("a&b", PALETTE[0], &[0.0, 1.0], &[0.0, 1.0]))
            .render();
        assert!(svg.contains("&lt;b&gt;"));
        assert!(svg.contains("a&amp;b"));
    }

    #[test]
    fn markers_outside_range_are_skipped() {
        let svg = LineChart::new("m", "x", "y")
            .series(Series::new("a", PALETTE[0], &[0.0, 1.0], &[0.0, 1.0]))
            .marker(0.5, "EC50")
            .marker(5.0, "far")
            .render();
        assert!(svg.contains("EC50"));
        assert!(!svg.contains("far"));
    }

    #[test]
    fn dot_chart_draws_every_finite_point() {
        let svg = DotChart::new("Thresholds", "θ")
            .row("Easy", &[-1.0, 0.5, 2.0])
            .row("Bowel/Bladder & more", &[0.0, f64::NAN])
            .marker(0.0, "mean")
            .render();
        assert_eq!(svg.matches("<circle").count(), 4);
        // single finite point gets no connecting line
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("Bowel/Bladder &amp; more"));
        assert!(svg.contains(">mean</text>"));
        assert!(svg.contains(&format!("fill=\"{}\"", PALETTE[2])));
    }

    #[test]
    fn empty_dot_chart_says_no_data() {
        let svg = DotChart::new("Empty", "x").render();
        assert!(svg.contains("no data"));
        assert!(!svg.contains("<circle"));
    }
}
