//! Spreadsheet sink

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

use super::{write_artifact, ExportSink};
use crate::column::ExportCell;
use crate::error::Result;
use crate::job::{ExportArtifact, ExportJob, SinkKind};

/// Writes a single-sheet workbook: header row, then one row per record
pub struct XlsxSink {
    output_dir: PathBuf,
}

impl XlsxSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Workbook bytes for `job`
    pub fn render(&self, job: &ExportJob) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&job.sheet_name)?;

        let header_format = Format::new().set_bold();
        for (col, header) in job.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }

        for (index, row) in job.body.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    ExportCell::Missing => {}
                    ExportCell::Text(text) => {
                        worksheet.write_string(row_num, col, text)?;
                    }
                    ExportCell::Number {
                        value,
                        decimals: None,
                    } => {
                        worksheet.write_number(row_num, col, *value)?;
                    }
                    ExportCell::Number {
                        value,
                        decimals: Some(places),
                    } => {
                        let format = Format::new().set_num_format(number_format(*places));
                        worksheet.write_number_with_format(row_num, col, *value, &format)?;
                    }
                }
            }
        }

        worksheet.autofit();
        Ok(workbook.save_to_buffer()?)
    }
}

impl ExportSink for XlsxSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Xlsx
    }

    fn emit(&self, job: &ExportJob) -> Result<ExportArtifact> {
        let bytes = self.render(job)?;
        write_artifact(&self.output_dir, job, &bytes)
    }
}

fn number_format(places: u8) -> String {
    if places == 0 {
        "0".to_string()
    } else {
        format!("0.{}", "0".repeat(usize::from(places)))
    }
}
