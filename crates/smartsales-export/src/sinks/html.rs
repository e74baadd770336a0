//! Print-ready HTML sink

use std::fmt::Write as _;
use std::sync::Arc;

use smartsales_core::utils::REPORT_DATETIME_FORMAT;

use super::ExportSink;
use crate::error::{ExportError, Result};
use crate::job::{ExportArtifact, ExportJob, SinkKind};
use crate::popup::PopupSink;

const PRINT_STYLE: &str = "\
body { font-family: -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, \"Helvetica Neue\", Arial, sans-serif; margin: 20px; }
table { width: 100%; border-collapse: collapse; font-size: 10px; }
th, td { border: 1px solid #ddd; padding: 6px; text-align: left; word-break: break-all; }
th { background-color: #f4f4f4; font-weight: bold; }
h1 { font-size: 24px; }
@media print { .no-print { display: none; } }";

/// Loads a standalone HTML table into a print context and prints it
pub struct HtmlPrintSink {
    popup: Arc<dyn PopupSink>,
}

impl HtmlPrintSink {
    pub fn new(popup: Arc<dyn PopupSink>) -> Self {
        Self { popup }
    }
}

impl ExportSink for HtmlPrintSink {
    fn kind(&self) -> SinkKind {
        SinkKind::HtmlPrint
    }

    fn emit(&self, job: &ExportJob) -> Result<ExportArtifact> {
        if !self.popup.is_supported() {
            return Err(ExportError::SinkUnavailable(
                "print windows are not available".to_string(),
            ));
        }

        let mut context = self.popup.open(&job.file_name())?;
        context.load(&render_print_html(job))?;
        context.print()?;

        Ok(ExportArtifact {
            sink: SinkKind::HtmlPrint,
            path: context.location(),
            rows: job.row_count(),
        })
    }
}

/// Self-contained document with the job's table; styles are inline only
pub fn render_print_html(job: &ExportJob) -> String {
    let title = escape(&job.title);
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n{PRINT_STYLE}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n\
         <p>Generado el: {}</p>\n<table>\n<thead>\n<tr>",
        job.generated_at.format(REPORT_DATETIME_FORMAT)
    );
    for header in &job.headers {
        let _ = write!(html, "<th>{}</th>", escape(header));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &job.body {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape(&cell.print_text()));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
