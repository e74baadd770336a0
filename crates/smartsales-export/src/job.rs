//! Export jobs and their parameters

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use smartsales_core::EXPORT_CAPS;

use crate::column::ExportCell;
use crate::error::ExportError;
use crate::projection::Projection;

/// Output destination kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    Xlsx,
    Pdf,
    HtmlPrint,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Xlsx => "xlsx",
            SinkKind::Pdf => "pdf",
            SinkKind::HtmlPrint => "html-print",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SinkKind::Xlsx => "xlsx",
            SinkKind::Pdf => "pdf",
            SinkKind::HtmlPrint => "html",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(SinkKind::Xlsx),
            "pdf" => Ok(SinkKind::Pdf),
            "html" | "html-print" | "print" => Ok(SinkKind::HtmlPrint),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// Maximum number of rows fetched for a full-dataset export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExportCap(u32);

impl ExportCap {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for ExportCap {
    fn default() -> Self {
        ExportCap(EXPORT_CAPS[0])
    }
}

impl TryFrom<u32> for ExportCap {
    type Error = ExportError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if EXPORT_CAPS.contains(&value) {
            Ok(ExportCap(value))
        } else {
            Err(ExportError::InvalidCap(value))
        }
    }
}

impl From<ExportCap> for u32 {
    fn from(cap: ExportCap) -> Self {
        cap.0
    }
}

/// Report identity shared by every job of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    /// File name stem, e.g. `Reporte_Productos`
    pub filename_base: String,
    /// Heading of the PDF and print outputs
    pub title: String,
    /// Worksheet name of the spreadsheet output
    pub sheet_name: String,
}

/// One export, built per request and consumed by a single sink
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub headers: Vec<String>,
    pub body: Vec<Vec<ExportCell>>,
    pub sink: SinkKind,
    pub filename_base: String,
    pub title: String,
    pub sheet_name: String,
    pub generated_at: NaiveDateTime,
}

impl ExportJob {
    pub fn new(projection: Projection, sink: SinkKind, meta: &ReportMeta) -> Self {
        Self {
            headers: projection.headers,
            body: projection.body,
            sink,
            filename_base: meta.filename_base.clone(),
            title: meta.title.clone(),
            sheet_name: meta.sheet_name.clone(),
            generated_at: Local::now().naive_local(),
        }
    }

    pub fn at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// `<filename_base>_<yyyyMMdd>.<ext>`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            self.filename_base,
            self.generated_at.format("%Y%m%d"),
            self.sink.extension()
        )
    }

    pub fn row_count(&self) -> usize {
        self.body.len()
    }
}

/// What a sink produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub sink: SinkKind,
    /// Written file, when the sink writes one
    pub path: Option<PathBuf>,
    pub rows: usize,
}
