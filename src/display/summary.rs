use crate::api::models::{NumericStat, Summary};
use crate::error::AppError;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;

pub const LOADING: &str = "Loading summary data...";
pub const NO_NUMERIC_COLUMNS: &str = "No numeric columns found in the results.";

/// Aggregate statistics for the "Summary" tab
pub struct SummaryView {
    use_colors: bool,
}

impl SummaryView {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn render(&self, summary: Option<&Summary>) -> Result<String, AppError> {
        let Some(summary) = summary else {
            return Ok(LOADING.to_string());
        };

        let mut output = String::new();
        output.push_str(&format!("Total Rows: {}\n", summary.row_count));
        output.push_str(&format!("Columns: {}\n", summary.columns.len()));

        if !summary.columns.is_empty() {
            output.push_str(&format!(
                "Columns in Results: {}\n",
                summary.columns.join(", ")
            ));
        }

        output.push('\n');
        if summary.numeric_summary.is_empty() {
            output.push_str(NO_NUMERIC_COLUMNS);
        } else {
            output.push_str(&self.render_numeric_table(&summary.numeric_summary));
        }

        Ok(output)
    }

    fn render_numeric_table(&self, stats: &[NumericStat]) -> String {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        let headers: Vec<Cell> = ["Column", "Count", "Min", "Max", "Average"]
            .into_iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.use_colors {
                    cell.fg(Color::Cyan)
                } else {
                    cell
                }
            })
            .collect();
        table.set_header(headers);

        for stat in stats {
            table.add_row(vec![
                Cell::new(&stat.column),
                Cell::new(stat.count).set_alignment(CellAlignment::Right),
                Cell::new(format_stat(&stat.min)).set_alignment(CellAlignment::Right),
                Cell::new(format_stat(&stat.max)).set_alignment(CellAlignment::Right),
                Cell::new(format_stat(&stat.avg)).set_alignment(CellAlignment::Right),
            ]);
        }

        table.to_string()
    }
}

impl Default for SummaryView {
    fn default() -> Self {
        Self::new()
    }
}

/// Numbers get two decimals; anything else (dates, strings) passes through
pub fn format_stat(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{:.2}", f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
