//! Entity statistics chart
//!
//! A plain SVG bar chart: one bar per label, height proportional to its
//! count, filled with the label colour.

use std::fmt::Write;

use entilens_core::LabelCount;

/// Shown instead of a chart when there is nothing to count
pub const NO_STATS_MESSAGE: &str = "No entities to display statistics for.";

/// Chart geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Maximum number of horizontal grid lines
    pub max_ticks: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 700,
            height: 400,
            max_ticks: 5,
        }
    }
}

const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 96.0;

/// Integer tick step giving at most `max_ticks` intervals
fn tick_step(max: usize, max_ticks: usize) -> usize {
    max.div_ceil(max_ticks.max(1)).max(1)
}

/// Render `counts` as an SVG document
pub fn render_bar_chart(counts: &[LabelCount], options: &ChartOptions) -> String {
    let width = f64::from(options.width);
    let height = f64::from(options.height);

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\" font-family=\"sans-serif\" font-size=\"12\">",
        w = options.width,
        h = options.height
    );

    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    if max == 0 {
        let _ = write!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"#555\">{NO_STATS_MESSAGE}</text></svg>",
            width / 2.0,
            height / 2.0
        );
        return svg;
    }

    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;

    let step = tick_step(max, options.max_ticks);
    let y_max = max.div_ceil(step) * step;
    let scale = plot_height / y_max as f64;

    // Grid and y axis labels
    for tick in (0..=y_max).step_by(step) {
        let y = baseline - tick as f64 * scale;
        let _ = write!(
            svg,
            "<line x1=\"{MARGIN_LEFT:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#e0e0e0\"/><text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{tick}</text>",
            MARGIN_LEFT + plot_width,
            MARGIN_LEFT - 6.0,
            y + 4.0
        );
    }

    let slot = plot_width / counts.len() as f64;
    let bar_width = (slot * 0.7).min(80.0);

    for (index, count) in counts.iter().enumerate() {
        let bar_height = count.count as f64 * scale;
        let center = MARGIN_LEFT + slot * (index as f64 + 0.5);
        let x = center - bar_width / 2.0;
        let y = baseline - bar_height;
        let label = count.label.as_str();

        let _ = write!(
            svg,
            "<rect class=\"bar\" x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_width:.1}\" height=\"{bar_height:.1}\" fill=\"{}\"><title>{label}: {}</title></rect>",
            count.label.solid_color(),
            count.count
        );
        let _ = write!(
            svg,
            "<text x=\"{center:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>",
            y - 4.0,
            count.count
        );
        let _ = write!(
            svg,
            "<text x=\"{center:.1}\" y=\"{:.1}\" text-anchor=\"end\" transform=\"rotate(-40 {center:.1} {:.1})\">{label}</text>",
            baseline + 14.0,
            baseline + 14.0
        );
    }

    // Axes and titles
    let _ = write!(
        svg,
        "<line x1=\"{MARGIN_LEFT:.1}\" y1=\"{baseline:.1}\" x2=\"{:.1}\" y2=\"{baseline:.1}\" stroke=\"#333\"/><line x1=\"{MARGIN_LEFT:.1}\" y1=\"{MARGIN_TOP:.1}\" x2=\"{MARGIN_LEFT:.1}\" y2=\"{baseline:.1}\" stroke=\"#333\"/>",
        MARGIN_LEFT + plot_width
    );
    let _ = write!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-weight=\"bold\">Entity Type</text><text x=\"14\" y=\"{:.1}\" text-anchor=\"middle\" font-weight=\"bold\" transform=\"rotate(-90 14 {:.1})\">Count</text>",
        MARGIN_LEFT + plot_width / 2.0,
        height - 8.0,
        MARGIN_TOP + plot_height / 2.0,
        MARGIN_TOP + plot_height / 2.0
    );

    svg.push_str("</svg>");
    svg
}
