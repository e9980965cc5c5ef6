use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// One result row: column name to scalar (JSON null is a null scalar)
pub type Row = Map<String, Value>;

/// Custom deserializer: treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(T::default()),
        other => serde_json::from_value(other).map_err(de::Error::custom),
    }
}

/// Custom deserializer: chart labels may arrive as numbers or booleans
fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    })
}

/// Custom deserializer: numbers, or strings holding a number (DECIMAL columns)
fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("number out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got '{}'", s))),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

/// Custom deserializer: a visualization part that fails to decode is
/// treated as absent instead of failing the whole answer
fn lenient_part<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(part) => Ok(Some(part)),
        Err(e) => {
            log::debug!("Ignoring malformed visualization part: {}", e);
            Ok(None)
        }
    }
}

/// Decode chart points one by one, dropping the ones that do not parse
fn decode_points<T: DeserializeOwned>(kind: &str, data: Value) -> Vec<T> {
    let Value::Array(items) = data else {
        log::debug!("Ignoring {} chart data that is not a list", kind);
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(point) => Some(point),
            Err(e) => {
                log::debug!("Skipping {} chart point {}: {}", kind, index, e);
                None
            }
        })
        .collect()
}

// Chat models
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub db_connection_id: String,
}

/// Structured answer to one natural-language question
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct QueryResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sql_query: String,
    #[serde(default)]
    pub visualizations: Option<Visualizations>,
    #[serde(default)]
    pub connection_id: Option<String>,
}

impl QueryResult {
    pub fn table(&self) -> Option<&TabularData> {
        self.visualizations.as_ref().and_then(|v| v.table.as_ref())
    }

    pub fn charts(&self) -> Option<&[ChartSpec]> {
        self.visualizations
            .as_ref()
            .and_then(|v| v.charts.as_deref())
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.visualizations.as_ref().and_then(|v| v.summary.as_ref())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Visualizations {
    #[serde(default, deserialize_with = "lenient_part")]
    pub table: Option<TabularData>,
    #[serde(default, deserialize_with = "lenient_part")]
    pub charts: Option<Vec<ChartSpec>>,
    #[serde(default, deserialize_with = "lenient_part")]
    pub summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
struct TabularDataWire {
    #[serde(default, deserialize_with = "null_as_default")]
    columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    rows: Vec<Row>,
    #[serde(default)]
    row_count: Option<u64>,
}

/// Column/row result set. `row_count` is the logical total, which may
/// exceed `rows.len()` when the server truncated the preview.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(from = "TabularDataWire")]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: u64,
}

impl From<TabularDataWire> for TabularData {
    fn from(wire: TabularDataWire) -> Self {
        let row_count = wire.row_count.unwrap_or(wire.rows.len() as u64);
        Self {
            columns: wire.columns,
            rows: wire.rows,
            row_count,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LabelValue {
    #[serde(deserialize_with = "deserialize_label")]
    pub label: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub value: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Point {
    #[serde(deserialize_with = "deserialize_number")]
    pub x: f64,
    #[serde(deserialize_with = "deserialize_number")]
    pub y: f64,
}

/// One chart to draw. Unrecognised tags land in `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Bar { title: String, data: Vec<LabelValue> },
    Pie { title: String, data: Vec<LabelValue> },
    Line { title: String, data: Vec<Point> },
    Unknown { kind: String },
}

impl ChartSpec {
    pub fn kind(&self) -> &str {
        match self {
            ChartSpec::Bar { .. } => "bar",
            ChartSpec::Pie { .. } => "pie",
            ChartSpec::Line { .. } => "line",
            ChartSpec::Unknown { kind } => kind,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ChartSpec::Bar { title, .. }
            | ChartSpec::Pie { title, .. }
            | ChartSpec::Line { title, .. } => Some(title),
            ChartSpec::Unknown { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for ChartSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        // NOTE: the server tags charts with "type"; "kind" is accepted too
        let kind = value
            .get("type")
            .or_else(|| value.get("kind"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = match value.get("data") {
            Some(Value::Null) | None => Value::Array(Vec::new()),
            Some(data) => data.clone(),
        };

        let spec = match kind.as_str() {
            "bar" => ChartSpec::Bar {
                title,
                data: decode_points(&kind, data),
            },
            "pie" => ChartSpec::Pie {
                title,
                data: decode_points(&kind, data),
            },
            "line" => ChartSpec::Line {
                title,
                data: decode_points(&kind, data),
            },
            _ => ChartSpec::Unknown { kind },
        };
        Ok(spec)
    }
}

#[derive(Debug, Deserialize)]
struct SummaryWire {
    #[serde(default)]
    row_count: Option<u64>,
    #[serde(default)]
    total_rows: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    numeric_summary: Vec<NumericStat>,
}

/// Aggregate statistics over a result set
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(from = "SummaryWire")]
pub struct Summary {
    pub row_count: u64,
    pub columns: Vec<String>,
    pub numeric_summary: Vec<NumericStat>,
}

impl From<SummaryWire> for Summary {
    fn from(wire: SummaryWire) -> Self {
        Self {
            row_count: wire.row_count.or(wire.total_rows).unwrap_or(0),
            columns: wire.columns,
            numeric_summary: wire.numeric_summary,
        }
    }
}

/// Per-column statistics. Bounds stay raw JSON: date columns report
/// string min/max.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NumericStat {
    pub column: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub min: Value,
    #[serde(default)]
    pub max: Value,
    #[serde(default)]
    pub avg: Value,
}

// Connection catalog models
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ConnectionInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub database: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub db_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: HashMap<String, ConnectionInfo>,
}

/// Payload for adding or testing a connection
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub db_type: String,
}

impl fmt::Debug for NewConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewConnection")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"*****")
            .field("database", &self.database)
            .field("db_type", &self.db_type)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddConnectionResponse {
    #[serde(default)]
    pub success: bool,
    pub connection_id: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ConnectionTest {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// FastAPI-style error body: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: Value,
}

impl ErrorDetail {
    /// Extract the detail text from an error body, if it has one
    pub fn extract(body: &str) -> Option<String> {
        let parsed: ErrorDetail = serde_json::from_str(body).ok()?;
        match parsed.detail {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Null => None,
            // Validation errors come back as a list of objects
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_result_deserialization() {
        let json = r#"{
            "sql_query": "SELECT * FROM customers",
            "explanation": "Here are all customers",
            "results": {"columns": ["id"], "rows": [], "count": 0},
            "visualizations": {
                "table": {"type": "table", "columns": ["id", "name"], "rows": [{"id": 1, "name": null}], "row_count": 25},
                "charts": [{"type": "bar", "title": "t", "data": [{"label": "a", "value": 2}]}],
                "summary": {"total_rows": 25, "row_count": 25, "columns": ["id", "name"], "numeric_summary": []}
            },
            "connection_id": "abc"
        }"#;

        let result: QueryResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.sql_query, "SELECT * FROM customers");
        assert_eq!(result.explanation, "Here are all customers");
        let table = result.table().unwrap();
        assert_eq!(table.row_count, 25);
        assert_eq!(table.rows[0].get("name"), Some(&Value::Null));
        assert_eq!(result.charts().unwrap().len(), 1);
        assert_eq!(result.summary().unwrap().row_count, 25);
        assert_eq!(result.connection_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_query_result_tolerates_missing_visualizations() {
        let result: QueryResult =
            serde_json::from_str(r#"{"explanation": "x", "sql_query": "SELECT 1"}"#).unwrap();
        assert!(result.table().is_none());
        assert!(result.charts().is_none());
        assert!(result.summary().is_none());

        let result: QueryResult = serde_json::from_str(
            r#"{"explanation": null, "sql_query": "SELECT 1", "visualizations": {"table": null}}"#,
        )
        .unwrap();
        assert_eq!(result.explanation, "");
        assert!(result.table().is_none());
    }

    #[test]
    fn test_tabular_row_count_defaults_to_rows() {
        let table: TabularData =
            serde_json::from_value(json!({"columns": ["a"], "rows": [{"a": 1}, {"a": 2}]}))
                .unwrap();
        assert_eq!(table.row_count, 2);
    }

    #[test]
    fn test_chart_spec_dispatch_on_type() {
        let charts: Vec<ChartSpec> = serde_json::from_value(json!([
            {"type": "bar", "title": "Sales", "data": [{"label": "north", "value": 10}]},
            {"type": "scatter", "title": "Nope", "data": [{"x": 1, "y": 2}]},
            {"type": "pie", "title": "Share", "data": [{"label": 2024, "value": "3.5"}]},
            {"kind": "line", "title": "Trend", "data": [{"x": 1, "y": 2}, {"x": 0, "y": 5}]}
        ]))
        .unwrap();

        assert_eq!(charts.len(), 4);
        assert!(matches!(&charts[0], ChartSpec::Bar { data, .. } if data[0].value == 10.0));
        assert_eq!(
            charts[1],
            ChartSpec::Unknown {
                kind: "scatter".to_string()
            }
        );
        match &charts[2] {
            ChartSpec::Pie { data, .. } => {
                assert_eq!(data[0].label, "2024");
                assert_eq!(data[0].value, 3.5);
            }
            other => panic!("expected pie, got {:?}", other),
        }
        match &charts[3] {
            ChartSpec::Line { title, data } => {
                assert_eq!(title, "Trend");
                assert_eq!(data[1], Point { x: 0.0, y: 5.0 });
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_chart_points_are_dropped() {
        let charts: Vec<ChartSpec> = serde_json::from_value(json!([
            {"type": "line", "title": "Trend", "data": [{"x": 0, "y": 1}, {"x": 1, "y": "n/a"}, {"x": 2, "y": null}, {"x": 3, "y": 4}]},
            {"type": "bar", "title": "Broken", "data": "oops"}
        ]))
        .unwrap();

        match &charts[0] {
            ChartSpec::Line { data, .. } => {
                assert_eq!(data, &vec![Point { x: 0.0, y: 1.0 }, Point { x: 3.0, y: 4.0 }]);
            }
            other => panic!("expected line, got {:?}", other),
        }
        assert!(matches!(&charts[1], ChartSpec::Bar { data, .. } if data.is_empty()));
    }

    #[test]
    fn test_malformed_part_keeps_rest_of_answer() {
        let result: QueryResult = serde_json::from_value(json!({
            "explanation": "Monthly totals",
            "sql_query": "SELECT month, total FROM sales",
            "visualizations": {
                "table": {"columns": ["month", "total"], "rows": [{"month": 1, "total": 3}]},
                "charts": {"not": "a list"},
                "summary": {"row_count": "many"}
            }
        }))
        .unwrap();

        assert_eq!(result.explanation, "Monthly totals");
        assert_eq!(result.table().map(|t| t.row_count), Some(1));
        assert!(result.charts().is_none());
        assert!(result.summary().is_none());
    }

    #[test]
    fn test_summary_total_rows_alias() {
        let summary: Summary =
            serde_json::from_value(json!({"total_rows": 7, "columns": ["a"]})).unwrap();
        assert_eq!(summary.row_count, 7);
        assert!(summary.numeric_summary.is_empty());

        let summary: Summary = serde_json::from_value(json!({
            "row_count": 3,
            "columns": ["created"],
            "numeric_summary": [{"column": "created", "count": 3, "min": "2024-01-01", "max": "2024-02-01", "avg": 1.5}]
        }))
        .unwrap();
        assert_eq!(summary.numeric_summary[0].min, json!("2024-01-01"));
    }

    #[test]
    fn test_connection_list_deserialization() {
        let list: ConnectionList = serde_json::from_value(json!({
            "connections": {
                "c1": {"name": "Prod", "database": "shop", "host": "db", "port": 5432, "db_type": "postgresql", "password": "***"}
            }
        }))
        .unwrap();
        let info = &list.connections["c1"];
        assert_eq!(info.name, "Prod");
        assert_eq!(info.port, Some(5432));
    }

    #[test]
    fn test_new_connection_debug_masks_password() {
        let draft = NewConnection {
            name: "Prod".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            database: "shop".to_string(),
            db_type: "postgresql".to_string(),
        };
        let debug = format!("{:?}", draft);
        assert!(!debug.contains("hunter2"));

        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("hunter2"));
    }

    #[test]
    fn test_error_detail_extract() {
        assert_eq!(
            ErrorDetail::extract(r#"{"detail": "connection timed out"}"#),
            Some("connection timed out".to_string())
        );
        assert_eq!(ErrorDetail::extract("Internal Server Error"), None);
        assert!(
            ErrorDetail::extract(r#"{"detail": [{"msg": "field required"}]}"#)
                .is_some_and(|d| d.contains("field required"))
        );
    }
}
