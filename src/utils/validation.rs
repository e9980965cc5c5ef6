//! Input validation and data-shape checks
//!
//! Validates user input (URLs, connection drafts) before it reaches the
//! server, and checks result sets coming back from it.

use std::collections::HashSet;

use crate::api::models::{NewConnection, TabularData};
use crate::error::{CatalogError, CliError};

pub const SUPPORTED_DB_TYPES: [&str; 3] = ["postgresql", "mysql", "sqlite"];

/// Validate that a URL is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}

fn require(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidDraft {
            field: field.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Validate a connection before it is tested or added
pub fn validate_connection_draft(draft: &NewConnection) -> Result<(), CatalogError> {
    require("name", &draft.name)?;
    require("database", &draft.database)?;

    if !SUPPORTED_DB_TYPES.contains(&draft.db_type.as_str()) {
        return Err(CatalogError::InvalidDraft {
            field: "db_type".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                draft.db_type,
                SUPPORTED_DB_TYPES.join(", ")
            ),
        });
    }

    // SQLite connections only need a database path
    if draft.db_type != "sqlite" {
        require("host", &draft.host)?;
        require("username", &draft.username)?;
        if draft.port == 0 {
            return Err(CatalogError::InvalidDraft {
                field: "port".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }
    }

    Ok(())
}

/// Problems found in a result set's shape. None of them stop rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeIssue {
    DuplicateColumn(String),
    UnknownKey { row: usize, key: String },
    RowCountBelowRows { row_count: u64, rows: usize },
}

/// Check a result set against its invariants: unique column names, row
/// keys drawn from the column list, and a total at least the preview size
pub fn tabular_shape_issues(table: &TabularData) -> Vec<ShapeIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for column in &table.columns {
        if !seen.insert(column.as_str()) {
            issues.push(ShapeIssue::DuplicateColumn(column.clone()));
        }
    }

    for (index, row) in table.rows.iter().enumerate() {
        for key in row.keys() {
            if !seen.contains(key.as_str()) {
                issues.push(ShapeIssue::UnknownKey {
                    row: index,
                    key: key.clone(),
                });
            }
        }
    }

    if table.row_count < table.rows.len() as u64 {
        issues.push(ShapeIssue::RowCountBelowRows {
            row_count: table.row_count,
            rows: table.rows.len(),
        });
    }

    issues
}
