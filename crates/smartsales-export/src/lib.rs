//! SmartSales365 Export - tabular report pipeline
//!
//! ```text
//! rows ──► project(rows, registry, selection) ──► ExportJob ──► emit(job, sink)
//!                                                                  │
//!                                           ┌──────────────┬───────┴───────────┐
//!                                           ▼              ▼                   ▼
//!                                       XlsxSink        PdfSink         HtmlPrintSink
//!                                                                        (PopupSink)
//! ```
//!
//! Column order in every output follows the registry's declaration order,
//! whatever order the user toggled columns in.

mod column;
mod error;
mod job;
mod popup;
mod projection;
mod reports;
mod runner;
mod sinks;

pub use column::{ColumnDescriptor, ColumnKind, ColumnRegistry, ExportCell, ExportSelection};
pub use error::{ExportError, Result};
pub use job::{ExportArtifact, ExportCap, ExportJob, ReportMeta, SinkKind};
pub use popup::{FilePopup, NoPopup, PopupSink, PrintContext};
pub use projection::{project, Projection};
pub use reports::ReportDefinition;
pub use runner::{export_rows, ExportPhase, ExportRequest, ExportRunner};
pub use sinks::{
    emit, render_print_html, ExportSink, HtmlPrintSink, Orientation, PdfSink, SinkSet, XlsxSink,
};
