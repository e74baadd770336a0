//! Column registry and per-cell scalarization
//!
//! A report declares its columns once, in display order. The same descriptor
//! drives the on-screen cell (`render`) and the exported cell (`export_cell`),
//! so both views agree on what a value means.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use smartsales_core::utils::{
    format_currency, format_display_datetime, json_number, json_path, NOT_AVAILABLE,
};

use crate::error::{ExportError, Result};

/// One exported value
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    /// No value: blank in spreadsheets, `N/A` in print outputs
    Missing,
    Text(String),
    /// Numeric value; `decimals` fixes the rendered precision
    Number { value: f64, decimals: Option<u8> },
}

impl ExportCell {
    pub fn text(value: impl Into<String>) -> Self {
        ExportCell::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        ExportCell::Number {
            value,
            decimals: None,
        }
    }

    pub fn currency(value: f64) -> Self {
        ExportCell::Number {
            value,
            decimals: Some(2),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ExportCell::Missing)
    }

    /// Text used by the print sinks
    pub fn print_text(&self) -> String {
        match self {
            ExportCell::Missing => NOT_AVAILABLE.to_string(),
            ExportCell::Text(text) => text.clone(),
            ExportCell::Number {
                value,
                decimals: Some(2),
            } => format_currency(*value),
            ExportCell::Number {
                value,
                decimals: Some(places),
            } => format!("{:.*}", usize::from(*places), value),
            ExportCell::Number {
                value,
                decimals: None,
            } => format_plain_number(*value),
        }
    }
}

impl fmt::Display for ExportCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print_text())
    }
}

fn format_plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// How the raw JSON value of a column is scalarized by default
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Strings as-is, numbers and booleans stringified, empty strings missing
    Text,
    Number,
    /// Two decimals; a non-numeric value exports as `0.00`
    Currency,
    /// Boolean mapped to display labels
    Boolean { yes: String, no: String },
    /// Backend date rendered with a chrono pattern
    DateTime { pattern: String },
    /// Raw code mapped to a display label; unknown codes pass through
    Labels(BTreeMap<String, String>),
    /// Array of objects, one field of each joined with `", "`
    Join { field: String },
}

impl ColumnKind {
    pub fn boolean(yes: &str, no: &str) -> Self {
        ColumnKind::Boolean {
            yes: yes.to_string(),
            no: no.to_string(),
        }
    }

    pub fn datetime(pattern: &str) -> Self {
        ColumnKind::DateTime {
            pattern: pattern.to_string(),
        }
    }

    pub fn labels(pairs: &[(&str, &str)]) -> Self {
        ColumnKind::Labels(
            pairs
                .iter()
                .map(|(code, label)| (code.to_string(), label.to_string()))
                .collect(),
        )
    }

    pub fn join(field: &str) -> Self {
        ColumnKind::Join {
            field: field.to_string(),
        }
    }

    fn scalarize(&self, value: Option<&Value>) -> ExportCell {
        let value = match value {
            None | Some(Value::Null) => {
                return match self {
                    ColumnKind::Currency => ExportCell::currency(0.0),
                    _ => ExportCell::Missing,
                }
            }
            Some(value) => value,
        };

        match self {
            ColumnKind::Text => match value {
                Value::String(s) if s.is_empty() => ExportCell::Missing,
                Value::String(s) => ExportCell::Text(s.clone()),
                Value::Number(n) => ExportCell::Text(n.to_string()),
                Value::Bool(b) => ExportCell::Text(b.to_string()),
                other => ExportCell::Text(other.to_string()),
            },
            ColumnKind::Number => json_number(value)
                .map(ExportCell::number)
                .unwrap_or(ExportCell::Missing),
            ColumnKind::Currency => ExportCell::currency(json_number(value).unwrap_or(0.0)),
            ColumnKind::Boolean { yes, no } => {
                let truthy = match value {
                    Value::Bool(b) => *b,
                    Value::String(s) => s.eq_ignore_ascii_case("true"),
                    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                    _ => false,
                };
                ExportCell::text(if truthy { yes.as_str() } else { no.as_str() })
            }
            ColumnKind::DateTime { pattern } => match value.as_str() {
                Some(raw) if !raw.trim().is_empty() => {
                    ExportCell::Text(format_display_datetime(Some(raw), pattern))
                }
                _ => ExportCell::Missing,
            },
            ColumnKind::Labels(map) => match value {
                Value::String(code) if code.is_empty() => ExportCell::Missing,
                Value::String(code) => {
                    ExportCell::Text(map.get(code).cloned().unwrap_or_else(|| code.clone()))
                }
                other => ExportCell::Text(other.to_string()),
            },
            ColumnKind::Join { field } => {
                let names: Vec<String> = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| match item.get(field.as_str()) {
                                Some(Value::String(s)) => Some(s.clone()),
                                Some(Value::Null) | None => None,
                                Some(other) => Some(other.to_string()),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                if names.is_empty() {
                    ExportCell::Missing
                } else {
                    ExportCell::Text(names.join(", "))
                }
            }
        }
    }
}

type ExportFn = Arc<dyn Fn(&Value) -> ExportCell + Send + Sync>;
type RenderFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Declaration of one report column
#[derive(Clone)]
pub struct ColumnDescriptor {
    key: String,
    header: String,
    sort_key: Option<String>,
    accessor: Option<String>,
    kind: ColumnKind,
    export_value: Option<ExportFn>,
    render: Option<RenderFn>,
}

impl ColumnDescriptor {
    /// Column reading `key` from the row as text
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            sort_key: None,
            accessor: Some(key.to_string()),
            kind: ColumnKind::Text,
            export_value: None,
            render: None,
        }
    }

    /// Dotted path into the row (`profile.nombre`)
    pub fn accessor(mut self, path: &str) -> Self {
        self.accessor = Some(path.to_string());
        self
    }

    pub fn without_accessor(mut self) -> Self {
        self.accessor = None;
        self
    }

    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Ordering token sent to the backend when sorting by this column
    pub fn sort_key(mut self, sort_key: &str) -> Self {
        self.sort_key = Some(sort_key.to_string());
        self
    }

    pub fn export_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> ExportCell + Send + Sync + 'static,
    {
        self.export_value = Some(Arc::new(f));
        self
    }

    pub fn render_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn sort_key_token(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    pub fn is_sortable(&self) -> bool {
        self.sort_key.is_some()
    }

    /// Exported value of this column for `row`
    pub fn export_cell(&self, row: &Value) -> ExportCell {
        if let Some(export) = &self.export_value {
            return export(row);
        }
        let raw = self.accessor.as_deref().and_then(|path| json_path(row, path));
        self.kind.scalarize(raw)
    }

    /// On-screen text of this column for `row`
    pub fn render(&self, row: &Value) -> String {
        match &self.render {
            Some(render) => render(row),
            None => self.export_cell(row).print_text(),
        }
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("sort_key", &self.sort_key)
            .field("accessor", &self.accessor)
            .field("kind", &self.kind)
            .field("export_value", &self.export_value.is_some())
            .finish()
    }
}

/// Ordered, key-unique set of columns
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.clone()) {
                return Err(ExportError::DuplicateColumn(column.key.clone()));
            }
            if column.accessor.is_none() && column.export_value.is_none() {
                return Err(ExportError::InvalidColumn(column.key.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Registry for column sets whose keys are known to be unique
    pub(crate) fn from_declared(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Selected columns in declaration order
    pub fn selected<'a>(
        &'a self,
        selection: &'a ExportSelection,
    ) -> impl Iterator<Item = &'a ColumnDescriptor> + 'a {
        self.columns.iter().filter(|c| selection.contains(&c.key))
    }
}

/// Keys of the columns the user wants; iteration order is irrelevant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSelection {
    keys: HashSet<String>,
}

impl ExportSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Every column of `registry`
    pub fn all(registry: &ColumnRegistry) -> Self {
        Self::from_keys(registry.keys())
    }

    pub fn insert(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.keys.remove(key);
    }

    /// Flip a column on or off
    pub fn toggle(&mut self, key: &str) {
        if !self.keys.remove(key) {
            self.keys.insert(key.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys not present in `registry`
    pub fn unknown_keys(&self, registry: &ColumnRegistry) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .keys
            .iter()
            .filter(|key| registry.get(key).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown
    }
}
