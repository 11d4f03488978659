// src/report/chart.rs
use crate::grades::model::format_score;
use crate::utils::error::ChartError;
use crate::utils::markup::escape;
use crate::utils::sanitize::sanitize_filename;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

// --- Constants ---
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const LABEL_AREA: f64 = 330.0;
const RIGHT_MARGIN: f64 = 50.0;
const TOP_MARGIN: f64 = 50.0;
const BOTTOM_MARGIN: f64 = 60.0;
const BAR_FILL: f64 = 0.8;

/// A horizontal bar chart, one bar per labeled value.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub bars: Vec<(String, f64)>,
    /// The x axis always spans `[0, axis_max]` so charts stay comparable.
    pub axis_max: f64,
    pub right_to_left: bool,
    pub color: &'static str,
}

impl BarChart {
    /// Bars in drawing order, bottom to top: input order, reversed for right-to-left.
    pub fn ordered_bars(&self) -> Vec<&(String, f64)> {
        if self.right_to_left {
            self.bars.iter().rev().collect()
        } else {
            self.bars.iter().collect()
        }
    }
}

/// Produces an image file for a bar chart.
pub trait ChartRenderer {
    /// File extension of the produced image, without the dot.
    fn extension(&self) -> &'static str;
    fn media_type(&self) -> &'static str;
    fn render_bar_chart(&self, chart: &BarChart, output: &Path) -> Result<(), ChartError>;
}

/// Renders bar charts as standalone SVG files.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    font_family: String,
}

impl SvgChartRenderer {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }

    pub fn to_svg(&self, chart: &BarChart) -> Result<String, ChartError> {
        if chart.bars.is_empty() {
            return Err(ChartError::NoBars(chart.title.clone()));
        }

        let plot_left = LABEL_AREA;
        let plot_right = CHART_WIDTH - RIGHT_MARGIN;
        let plot_top = TOP_MARGIN;
        let plot_bottom = CHART_HEIGHT - BOTTOM_MARGIN;
        let axis_max = if chart.axis_max > 0.0 { chart.axis_max } else { 1.0 };
        let x_of = |value: f64| plot_left + (value.clamp(0.0, axis_max) / axis_max) * (plot_right - plot_left);
        let direction = if chart.right_to_left { "rtl" } else { "ltr" };

        let mut svg = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
            w = CHART_WIDTH,
            h = CHART_HEIGHT,
            font = escape(&self.font_family)
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="18" text-anchor="middle" direction="{}">{}</text>"#,
            CHART_WIDTH / 2.0,
            TOP_MARGIN / 2.0 + 6.0,
            direction,
            escape(&chart.title)
        );

        // Ticks: whole numbers up to the axis maximum, at most ten intervals
        let step = (axis_max / 10.0).ceil().max(1.0);
        let mut tick = 0.0;
        while tick <= axis_max + f64::EPSILON {
            let x = x_of(tick);
            let _ = writeln!(
                svg,
                r##"<line x1="{x:.1}" y1="{top}" x2="{x:.1}" y2="{bottom}" stroke="#dddddd"/>"##,
                x = x,
                top = plot_top,
                bottom = plot_bottom
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{}" font-size="12" text-anchor="middle">{}</text>"#,
                x,
                plot_bottom + 18.0,
                tick
            );
            tick += step;
        }
        let _ = writeln!(
            svg,
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            l = plot_left,
            r = plot_right,
            b = plot_bottom
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{}" font-size="14" text-anchor="middle" direction="{}">{}</text>"#,
            (plot_left + plot_right) / 2.0,
            CHART_HEIGHT - 15.0,
            direction,
            escape(&chart.x_label)
        );

        // "start" is the right edge of rtl text, so labels end just left of the plot either way
        let label_anchor = if chart.right_to_left { "start" } else { "end" };
        let bars = chart.ordered_bars();
        let band = (plot_bottom - plot_top) / bars.len() as f64;
        let bar_height = band * BAR_FILL;
        for (index, (label, value)) in bars.into_iter().enumerate() {
            // index 0 sits at the bottom, like a horizontal bar plot
            let band_top = plot_bottom - band * (index as f64 + 1.0);
            let y = band_top + (band - bar_height) / 2.0;
            let center = band_top + band / 2.0;
            let width = x_of(*value) - plot_left;

            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                plot_left, y, width, bar_height, chart.color
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="{}" dominant-baseline="middle" direction="{}">{}</text>"#,
                plot_left - 8.0,
                center,
                label_anchor,
                direction,
                escape(label)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="12" dominant-baseline="middle">{}</text>"#,
                plot_left + width + 4.0,
                center,
                format_score(*value)
            );
        }
        svg.push_str("</svg>\n");

        Ok(svg)
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn media_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn render_bar_chart(&self, chart: &BarChart, output: &Path) -> Result<(), ChartError> {
        let svg = self.to_svg(chart)?;
        fs::write(output, svg)?;
        tracing::debug!("Rendered chart '{}' to {}", chart.title, output.display());
        Ok(())
    }
}

/// A chart image on disk that is removed when the value is dropped.
///
/// The guard exists before the renderer runs, so a half-written file from a
/// failed render is cleaned up as well.
#[derive(Debug)]
pub struct ChartArtifact {
    path: PathBuf,
}

impl ChartArtifact {
    /// Renders `chart` to `<dir>/<sanitized stem>_chart.<ext>`.
    pub fn render<R: ChartRenderer + ?Sized>(
        renderer: &R,
        chart: &BarChart,
        dir: &Path,
        stem: &str,
    ) -> Result<Self, ChartError> {
        let file_name = format!("{}_chart.{}", sanitize_filename(stem), renderer.extension());
        let artifact = ChartArtifact {
            path: dir.join(file_name),
        };
        renderer.render_bar_chart(chart, &artifact.path)?;
        Ok(artifact)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>, ChartError> {
        Ok(fs::read(&self.path)?)
    }
}

impl Drop for ChartArtifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed chart artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove chart artifact {}: {}", self.path.display(), e),
        }
    }
}
