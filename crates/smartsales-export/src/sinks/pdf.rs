//! PDF table sink

use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use super::{write_artifact, ExportSink};
use crate::error::{ExportError, Result};
use crate::job::{ExportArtifact, ExportJob, SinkKind};

const A4_SHORT_MM: f32 = 210.0;
const A4_LONG_MM: f32 = 297.0;
const MARGIN_MM: f32 = 14.0;
const TITLE_BASELINE_MM: f32 = 16.0;
const TABLE_TOP_MM: f32 = 20.0;
const ROW_HEIGHT_MM: f32 = 6.0;
const CELL_PADDING_MM: f32 = 2.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const PT_TO_MM: f32 = 0.3528;

/// Tables wider than this many columns are laid out in landscape
pub const PORTRAIT_MAX_COLUMNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn for_columns(columns: usize) -> Self {
        if columns > PORTRAIT_MAX_COLUMNS {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// (width, height) in millimetres
    pub fn page_size_mm(&self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (A4_SHORT_MM, A4_LONG_MM),
            Orientation::Landscape => (A4_LONG_MM, A4_SHORT_MM),
        }
    }
}

/// Renders the job as a paginated table with a title on the first page
pub struct PdfSink {
    output_dir: PathBuf,
    font_size: f32,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

struct TableLayout {
    width: f32,
    column_width: f32,
    max_chars: usize,
    font_size: f32,
}

impl PdfSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            font_size: 8.0,
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Document bytes for `job`
    pub fn render(&self, job: &ExportJob) -> Result<Vec<u8>> {
        let (width, height) = Orientation::for_columns(job.headers.len()).page_size_mm();
        let (doc, page, layer) = PdfDocument::new(&job.title, Mm(width), Mm(height), "Layer 1");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
        };

        let mut layer = doc.get_page(page).get_layer(layer);
        layer.use_text(
            job.title.clone(),
            TITLE_FONT_SIZE,
            Mm(MARGIN_MM),
            Mm(height - TITLE_BASELINE_MM),
            &fonts.regular,
        );

        if !job.headers.is_empty() {
            let layout = TableLayout::new(width, job.headers.len(), self.font_size);
            let mut top = height - TABLE_TOP_MM;
            draw_header(&layer, &fonts, &layout, &job.headers, top);
            top -= ROW_HEIGHT_MM;

            for (index, row) in job.body.iter().enumerate() {
                if top - ROW_HEIGHT_MM < MARGIN_MM {
                    let (page, page_layer) = doc.add_page(Mm(width), Mm(height), "Layer 1");
                    layer = doc.get_page(page).get_layer(page_layer);
                    top = height - MARGIN_MM;
                    draw_header(&layer, &fonts, &layout, &job.headers, top);
                    top -= ROW_HEIGHT_MM;
                }

                if index % 2 == 1 {
                    fill_row(&layer, &layout, top, rgb(245, 245, 245));
                }
                layer.set_fill_color(rgb(0, 0, 0));
                for (col, cell) in row.iter().enumerate() {
                    layer.use_text(
                        layout.fit(&cell.print_text()),
                        layout.font_size,
                        Mm(layout.cell_x(col)),
                        Mm(top - ROW_HEIGHT_MM + CELL_PADDING_MM),
                        &fonts.regular,
                    );
                }
                top -= ROW_HEIGHT_MM;
            }
        }

        doc.save_to_bytes().map_err(pdf_error)
    }
}

impl ExportSink for PdfSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Pdf
    }

    fn emit(&self, job: &ExportJob) -> Result<ExportArtifact> {
        let bytes = self.render(job)?;
        write_artifact(&self.output_dir, job, &bytes)
    }
}

impl TableLayout {
    fn new(page_width: f32, columns: usize, font_size: f32) -> Self {
        let width = page_width - 2.0 * MARGIN_MM;
        let column_width = width / columns as f32;
        // Helvetica averages about half an em per glyph
        let glyph_mm = font_size * 0.5 * PT_TO_MM;
        let usable = (column_width - 2.0 * CELL_PADDING_MM).max(glyph_mm);
        Self {
            width,
            column_width,
            max_chars: ((usable / glyph_mm).floor() as usize).max(1),
            font_size,
        }
    }

    fn cell_x(&self, col: usize) -> f32 {
        MARGIN_MM + col as f32 * self.column_width + CELL_PADDING_MM
    }

    /// Truncate `text` to what fits in one cell
    fn fit(&self, text: &str) -> String {
        if text.chars().count() <= self.max_chars {
            return text.to_string();
        }
        let keep = self.max_chars.saturating_sub(3);
        let mut truncated: String = text.chars().take(keep).collect();
        truncated.push_str("...");
        truncated
    }
}

fn draw_header(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    layout: &TableLayout,
    headers: &[String],
    top: f32,
) {
    fill_row(layer, layout, top, rgb(22, 160, 133));
    layer.set_fill_color(rgb(255, 255, 255));
    for (col, header) in headers.iter().enumerate() {
        layer.use_text(
            layout.fit(header),
            layout.font_size,
            Mm(layout.cell_x(col)),
            Mm(top - ROW_HEIGHT_MM + CELL_PADDING_MM),
            &fonts.bold,
        );
    }
    layer.set_fill_color(rgb(0, 0, 0));
}

fn fill_row(layer: &PdfLayerReference, layout: &TableLayout, top: f32, color: Color) {
    layer.set_fill_color(color);
    layer.add_rect(Rect::new(
        Mm(MARGIN_MM),
        Mm(top - ROW_HEIGHT_MM),
        Mm(MARGIN_MM + layout.width),
        Mm(top),
    ));
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn pdf_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}
