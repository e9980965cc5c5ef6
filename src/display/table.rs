use crate::api::models::TabularData;
use crate::error::AppError;
use crate::utils::validation::tabular_shape_issues;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::terminal;
use serde_json::Value;

/// Rows shown in the preview grid
pub const PREVIEW_ROWS: usize = 10;

pub const NO_DATA: &str = "No data available";

/// Preview grid for the "Table" tab
pub struct TableView {
    max_width: Option<usize>,
    use_colors: bool,
}

impl TableView {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    /// Detect terminal width, clamped to a readable range
    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn render(&self, data: Option<&TabularData>) -> Result<String, AppError> {
        let data = match data {
            Some(data) if !data.rows.is_empty() => data,
            _ => return Ok(NO_DATA.to_string()),
        };

        for issue in tabular_shape_issues(data) {
            log::debug!("Result table shape: {:?}", issue);
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        self.configure_table_width(&mut table);

        let headers: Vec<Cell> = data
            .columns
            .iter()
            .map(|column| {
                if self.use_colors {
                    Cell::new(column)
                        .add_attribute(Attribute::Bold)
                        .fg(Color::Green)
                } else {
                    Cell::new(column).add_attribute(Attribute::Bold)
                }
            })
            .collect();
        table.set_header(headers);

        for row in data.rows.iter().take(PREVIEW_ROWS) {
            let cells: Vec<Cell> = data
                .columns
                .iter()
                .map(|column| {
                    let value = row.get(column).unwrap_or(&Value::Null);
                    let text = Self::format_cell_value(value);
                    if self.use_colors && value.is_null() {
                        Cell::new(text)
                            .fg(Color::DarkGrey)
                            .add_attribute(Attribute::Italic)
                    } else {
                        Cell::new(text)
                    }
                })
                .collect();
            table.add_row(cells);
        }

        let mut output = table.to_string();
        if let Some(footer) = Self::footer(data.row_count) {
            output.push('\n');
            output.push_str(&footer);
        }
        Ok(output)
    }

    /// Truncation note, present only when the result exceeds the preview
    pub fn footer(row_count: u64) -> Option<String> {
        if row_count > PREVIEW_ROWS as u64 {
            let shown = row_count.min(PREVIEW_ROWS as u64);
            Some(format!("Showing first {} of {} rows", shown, row_count))
        } else {
            None
        }
    }

    /// Cell text. Missing keys and JSON null both read `null`; an empty
    /// string stays empty.
    pub fn format_cell_value(value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => value.to_string(),
        }
    }

    fn configure_table_width(&self, table: &mut Table) {
        let terminal_width = self.max_width.unwrap_or(80);
        // borders and padding
        let available = if terminal_width > 20 {
            terminal_width - 6
        } else {
            terminal_width.max(40)
        };
        table.set_width(available as u16);
    }
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Row;
    use serde_json::json;

    fn view() -> TableView {
        TableView::new().with_colors(false).with_max_width(120)
    }

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                let mut row = Row::new();
                row.insert("id".to_string(), json!(i));
                row.insert("name".to_string(), json!(format!("user-{}", i)));
                row
            })
            .collect()
    }

    fn data(count: usize, row_count: u64) -> TabularData {
        TabularData {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: rows(count),
            row_count,
        }
    }

    #[test]
    fn test_absent_or_empty_table() {
        assert_eq!(view().render(None).unwrap(), NO_DATA);

        let empty = TabularData {
            columns: vec!["id".to_string()],
            rows: Vec::new(),
            row_count: 0,
        };
        assert_eq!(view().render(Some(&empty)).unwrap(), NO_DATA);
    }

    #[test]
    fn test_preview_limited_to_ten_rows() {
        let output = view().render(Some(&data(25, 25))).unwrap();
        assert!(output.contains("user-9"));
        assert!(!output.contains("user-10"));
        assert!(output.ends_with("Showing first 10 of 25 rows"));
    }

    #[test]
    fn test_no_footer_at_ten_rows() {
        let output = view().render(Some(&data(10, 10))).unwrap();
        assert!(output.contains("user-9"));
        assert!(!output.contains("Showing first"));
    }

    #[test]
    fn test_footer_uses_logical_row_count() {
        // server truncated the preview to 3 rows of 500
        let output = view().render(Some(&data(3, 500))).unwrap();
        assert!(output.contains("Showing first 10 of 500 rows"));
        assert_eq!(TableView::footer(11).as_deref(), Some("Showing first 10 of 11 rows"));
        assert_eq!(TableView::footer(10), None);
    }

    #[test]
    fn test_header_follows_column_order() {
        let mut table = data(1, 1);
        table.columns = vec!["name".to_string(), "id".to_string()];
        let output = view().render(Some(&table)).unwrap();
        let name_at = output.find("name").unwrap();
        let id_at = output.find("id").unwrap();
        assert!(name_at < id_at);
    }

    #[test]
    fn test_null_and_missing_cells_render_null() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        row.insert("email".to_string(), Value::Null);
        let table = TabularData {
            columns: vec!["id".to_string(), "email".to_string(), "phone".to_string()],
            rows: vec![row],
            row_count: 1,
        };

        let output = view().render(Some(&table)).unwrap();
        assert_eq!(output.matches("null").count(), 2);
    }

    #[test]
    fn test_empty_string_is_not_null() {
        assert_eq!(TableView::format_cell_value(&json!("")), "");
        assert_eq!(TableView::format_cell_value(&Value::Null), "null");
        assert_eq!(TableView::format_cell_value(&json!("null")), "null");
        assert_eq!(TableView::format_cell_value(&json!(2.5)), "2.5");
        assert_eq!(TableView::format_cell_value(&json!(true)), "true");
        assert_eq!(TableView::format_cell_value(&json!([1, 2])), "[1,2]");
        assert_eq!(TableView::format_cell_value(&json!({"a": 1})), "{\"a\":1}");
    }
}
