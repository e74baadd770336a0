//! Output sinks
//!
//! Each sink turns an [`ExportJob`] into one artifact: a workbook, a PDF or a
//! print-ready HTML document handed to a print context.

mod html;
mod pdf;
mod xlsx;

pub use html::{render_print_html, HtmlPrintSink};
pub use pdf::{Orientation, PdfSink};
pub use xlsx::XlsxSink;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::error::{ExportError, Result};
use crate::job::{ExportArtifact, ExportJob, SinkKind};
use crate::popup::PopupSink;

/// A destination for export jobs
pub trait ExportSink: Send + Sync {
    fn kind(&self) -> SinkKind;

    fn emit(&self, job: &ExportJob) -> Result<ExportArtifact>;
}

/// Hand `job` to `sink`, which must match the job's sink kind
pub fn emit(job: &ExportJob, sink: &dyn ExportSink) -> Result<ExportArtifact> {
    if job.sink != sink.kind() {
        return Err(ExportError::SinkMismatch {
            expected: job.sink.to_string(),
            actual: sink.kind().to_string(),
        });
    }

    let artifact = sink.emit(job)?;
    match &artifact.path {
        Some(path) => info!(
            "Exported {} rows as {} to {}",
            artifact.rows,
            artifact.sink,
            path.display()
        ),
        None => info!("Exported {} rows as {}", artifact.rows, artifact.sink),
    }
    Ok(artifact)
}

/// The three sinks, ready to be picked by kind
pub struct SinkSet {
    xlsx: XlsxSink,
    pdf: PdfSink,
    html: HtmlPrintSink,
}

impl SinkSet {
    /// File sinks writing under `output_dir`, print jobs through `popup`
    pub fn new(output_dir: impl Into<PathBuf>, popup: Arc<dyn PopupSink>) -> Self {
        let output_dir = output_dir.into();
        Self {
            xlsx: XlsxSink::new(&output_dir),
            pdf: PdfSink::new(&output_dir),
            html: HtmlPrintSink::new(popup),
        }
    }

    pub fn get(&self, kind: SinkKind) -> &dyn ExportSink {
        match kind {
            SinkKind::Xlsx => &self.xlsx,
            SinkKind::Pdf => &self.pdf,
            SinkKind::HtmlPrint => &self.html,
        }
    }
}

/// Make sure `dir` exists and is a directory
pub(crate) fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(ExportError::SinkUnavailable(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    fs::create_dir_all(dir).map_err(|e| {
        ExportError::SinkUnavailable(format!("cannot create {}: {}", dir.display(), e))
    })
}

/// Write `bytes` as the job's file under `dir`
pub(crate) fn write_artifact(dir: &Path, job: &ExportJob, bytes: &[u8]) -> Result<ExportArtifact> {
    prepare_output_dir(dir)?;
    let path = dir.join(job.file_name());
    fs::write(&path, bytes)?;

    Ok(ExportArtifact {
        sink: job.sink,
        path: Some(path),
        rows: job.row_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ExportCell;
    use crate::job::ReportMeta;
    use crate::popup::NoPopup;
    use crate::projection::Projection;

    fn job(sink: SinkKind) -> ExportJob {
        let projection = Projection {
            headers: vec!["Nombre".to_string()],
            body: vec![vec![ExportCell::text("Silla")]],
        };
        ExportJob::new(
            projection,
            sink,
            &ReportMeta {
                filename_base: "Reporte".to_string(),
                title: "Reporte".to_string(),
                sheet_name: "Hoja".to_string(),
            },
        )
    }

    #[test]
    fn test_emit_rejects_mismatched_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = SinkSet::new(dir.path(), Arc::new(NoPopup));

        let err = emit(&job(SinkKind::Pdf), sinks.get(SinkKind::Xlsx)).unwrap_err();
        assert!(matches!(err, ExportError::SinkMismatch { .. }));
    }

    #[test]
    fn test_output_dir_that_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("salida");
        std::fs::write(&blocker, b"x").unwrap();

        let sinks = SinkSet::new(&blocker, Arc::new(NoPopup));
        let err = emit(&job(SinkKind::Xlsx), sinks.get(SinkKind::Xlsx)).unwrap_err();
        assert!(matches!(err, ExportError::SinkUnavailable(_)));
    }

    #[test]
    fn test_output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reportes").join("2025");

        let sinks = SinkSet::new(&nested, Arc::new(NoPopup));
        let artifact = emit(&job(SinkKind::Pdf), sinks.get(SinkKind::Pdf)).unwrap();
        assert!(artifact.path.unwrap().starts_with(&nested));
    }
}
