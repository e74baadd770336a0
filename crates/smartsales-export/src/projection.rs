//! Rows to headers + body matrix

use serde_json::Value;
use tracing::debug;

use crate::column::{ColumnRegistry, ExportCell, ExportSelection};
use crate::error::{ExportError, Result};

/// Sink-agnostic table
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub headers: Vec<String>,
    pub body: Vec<Vec<ExportCell>>,
}

impl Projection {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.body.len()
    }
}

/// Project `rows` onto the selected columns
///
/// Column order is always the registry's declaration order. An empty
/// selection yields a zero-column table; empty `rows` is an error.
pub fn project(
    rows: &[Value],
    registry: &ColumnRegistry,
    selection: &ExportSelection,
) -> Result<Projection> {
    if rows.is_empty() {
        return Err(ExportError::EmptyExport);
    }

    let columns: Vec<_> = registry.selected(selection).collect();
    let headers = columns.iter().map(|c| c.header().to_string()).collect();
    let body = rows
        .iter()
        .map(|row| columns.iter().map(|c| c.export_cell(row)).collect())
        .collect();

    debug!("Projected {} rows onto {} columns", rows.len(), columns.len());
    Ok(Projection { headers, body })
}
