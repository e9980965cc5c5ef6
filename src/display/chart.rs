//! Text renderings of the server's chart specs for the "Charts" tab.
//!
//! Bars and line markers are scaled into a fixed column budget; pie slices
//! are listed with their share of the total and a colored swatch.

use crate::api::models::{ChartSpec, LabelValue, Point};
use crate::utils::text::{max_display_width, pad_to_width, truncate_text_unicode};
use crossterm::style::{Color, Stylize};

pub const NO_CHARTS: &str = "No charts available for this data";

/// Slice colors, assigned by slice index modulo the palette length
pub const PIE_PALETTE: [Color; 8] = [
    Color::Rgb { r: 0x00, g: 0x88, b: 0xFE },
    Color::Rgb { r: 0x00, g: 0xC4, b: 0x9F },
    Color::Rgb { r: 0xFF, g: 0xBB, b: 0x28 },
    Color::Rgb { r: 0xFF, g: 0x80, b: 0x42 },
    Color::Rgb { r: 0x88, g: 0x84, b: 0xD8 },
    Color::Rgb { r: 0x82, g: 0xCA, b: 0x9D },
    Color::Rgb { r: 0xFF, g: 0xC6, b: 0x58 },
    Color::Rgb { r: 0xFF, g: 0x7C, b: 0x7C },
];

const BAR_WIDTH: usize = 40;
const MAX_LABEL_WIDTH: usize = 24;
const BAR_CHAR: &str = "█";
const SWATCH: &str = "■";
const LINE_MARKER: &str = "●";

pub fn slice_color(index: usize) -> Color {
    PIE_PALETTE[index % PIE_PALETTE.len()]
}

pub struct ChartView {
    use_colors: bool,
    width: usize,
}

impl ChartView {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            width: BAR_WIDTH,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Column budget for bars and line markers
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Number of charts in `charts` that produce output
    pub fn rendered_count(charts: Option<&[ChartSpec]>) -> usize {
        charts
            .unwrap_or_default()
            .iter()
            .filter(|chart| !matches!(chart, ChartSpec::Unknown { .. }))
            .count()
    }

    pub fn render(&self, charts: Option<&[ChartSpec]>) -> String {
        let mut sections = Vec::new();

        for chart in charts.unwrap_or_default() {
            let body = match chart {
                ChartSpec::Bar { data, .. } => self.render_bar(data),
                ChartSpec::Pie { data, .. } => self.render_pie(data),
                ChartSpec::Line { data, .. } => self.render_line(data),
                ChartSpec::Unknown { kind } => {
                    log::debug!("Skipping chart with unsupported type '{}'", kind);
                    continue;
                }
            };
            sections.push(format!("{}\n{}", self.title_line(chart), body));
        }

        if sections.is_empty() {
            NO_CHARTS.to_string()
        } else {
            sections.join("\n\n")
        }
    }

    fn title_line(&self, chart: &ChartSpec) -> String {
        let title = match chart.title() {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => format!("{} chart", chart.kind()),
        };
        if self.use_colors {
            format!("📊 {}", title.bold())
        } else {
            format!("📊 {}", title)
        }
    }

    fn render_bar(&self, data: &[LabelValue]) -> String {
        if data.is_empty() {
            return "  (no data points)".to_string();
        }

        let label_width = label_width(data);
        let max = data.iter().map(|d| d.value.abs()).fold(0.0_f64, f64::max);

        data.iter()
            .map(|item| {
                let length = scaled(item.value.abs(), max, self.width);
                let bar = BAR_CHAR.repeat(length);
                let bar = if self.use_colors {
                    bar.with(PIE_PALETTE[0]).to_string()
                } else {
                    bar
                };
                format!(
                    "  {} │{} {}",
                    fit_label(&item.label, label_width),
                    bar,
                    format_number(item.value)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_pie(&self, data: &[LabelValue]) -> String {
        if data.is_empty() {
            return "  (no data points)".to_string();
        }

        let label_width = label_width(data);
        let total: f64 = data.iter().map(|d| d.value).sum();

        data.iter()
            .enumerate()
            .map(|(index, item)| {
                let share = if total > 0.0 {
                    item.value / total * 100.0
                } else {
                    0.0
                };
                let swatch = if self.use_colors {
                    SWATCH.with(slice_color(index)).to_string()
                } else {
                    SWATCH.to_string()
                };
                format!(
                    "  {} {} {:>6.1}%  ({})",
                    swatch,
                    fit_label(&item.label, label_width),
                    share,
                    format_number(item.value)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One row per point in the order received; x is never sorted
    fn render_line(&self, data: &[Point]) -> String {
        if data.is_empty() {
            return "  (no data points)".to_string();
        }

        let min = data.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max = data.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let coordinates: Vec<String> = data
            .iter()
            .map(|p| format!("{}, {}", format_number(p.x), format_number(p.y)))
            .collect();
        let coordinate_width = max_display_width(coordinates.iter().map(String::as_str), 32);

        data.iter()
            .zip(coordinates)
            .map(|(point, coordinate)| {
                let column = scaled(point.y - min, max - min, self.width);
                let marker = if self.use_colors {
                    LINE_MARKER.with(PIE_PALETTE[1]).to_string()
                } else {
                    LINE_MARKER.to_string()
                };
                format!(
                    "  {} │{}{}",
                    pad_to_width(&coordinate, coordinate_width),
                    " ".repeat(column),
                    marker
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ChartView {
    fn default() -> Self {
        Self::new()
    }
}

fn label_width(data: &[LabelValue]) -> usize {
    max_display_width(data.iter().map(|d| d.label.as_str()), MAX_LABEL_WIDTH)
}

fn fit_label(label: &str, width: usize) -> String {
    pad_to_width(&truncate_text_unicode(label, width), width)
}

/// `value / max` of `width` columns, rounded
fn scaled(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value / max) * width as f64).round().clamp(0.0, width as f64) as usize
}

/// Whole numbers print without decimals, the rest with two
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
