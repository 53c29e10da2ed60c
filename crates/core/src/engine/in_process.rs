use super::{AssemblyReport, RenderingEngine};
use crate::config::AssemblyOptions;
use crate::error::AssemblyError;
use crate::output::write_atomically;
use iwb2pdf_layout::compute_sizing;
use iwb2pdf_render_lopdf::{FontDatabase, PageCanvas, StreamingPdfWriter, SvgDrawing, system_font_database};
use iwb2pdf_types::{PageSet, Size, SizingMode};
use log::{debug, info, warn};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

const PDF_VERSION: &str = "1.7";

/// Renders pages with the built-in SVG renderer.
///
/// A page that cannot be parsed is skipped with a warning; the remaining
/// pages are sized as if it never existed. The run only fails when no page
/// survives.
pub struct InProcessEngine {
    padding: f32,
    fonts: FontDatabase,
}

impl InProcessEngine {
    pub fn new(padding: f32, fonts: FontDatabase) -> Self {
        Self { padding, fonts }
    }

    pub fn from_options(options: &AssemblyOptions) -> Self {
        Self::new(options.padding, system_font_database(options.system_fonts))
    }

    /// Parses every page, returning the survivors and the indices of the
    /// pages that failed.
    fn load_drawings(&self, pages: &PageSet) -> (Vec<SvgDrawing>, Vec<u64>) {
        let mut drawings = Vec::with_capacity(pages.len());
        let mut skipped = Vec::new();

        for page in pages {
            match SvgDrawing::load(&page.path, &self.fonts) {
                Ok(drawing) => {
                    let size = drawing.size();
                    debug!("Parsed {} ({}x{})", page.name(), size.width, size.height);
                    drawings.push(drawing);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", page.name(), e);
                    skipped.push(page.index);
                }
            }
        }
        (drawings, skipped)
    }
}

impl fmt::Debug for InProcessEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessEngine")
            .field("padding", &self.padding)
            .field("font_faces", &self.fonts.len())
            .finish()
    }
}

impl RenderingEngine for InProcessEngine {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn combine_to_pdf(&self, pages: &PageSet, output: &Path, mode: SizingMode) -> Result<AssemblyReport, AssemblyError> {
        info!("Rendering {} page(s) in-process into {}", pages.len(), output.display());

        let (drawings, skipped) = self.load_drawings(pages);
        if drawings.is_empty() {
            return Err(AssemblyError::NoRenderablePages { total: pages.len() });
        }

        let sizes: Vec<Size> = drawings.iter().map(SvgDrawing::size).collect();
        let decisions = compute_sizing(&sizes, mode, self.padding);

        write_atomically(output, |file| {
            let mut writer = StreamingPdfWriter::new(BufWriter::new(file), PDF_VERSION)?;
            for (drawing, decision) in drawings.iter().zip(&decisions) {
                let mut canvas = PageCanvas::new(decision.page_size());
                drawing.draw(&mut canvas, decision.content_offset_x, decision.content_offset_y);
                writer.finish_page(canvas)?;
            }
            writer.finish()?.flush()?;
            Ok(())
        })?;

        if skipped.is_empty() {
            info!("Successfully saved PDF: {}", output.display());
        } else {
            warn!(
                "Saved PDF with {} of {} page(s); skipped indices {:?}: {}",
                drawings.len(),
                pages.len(),
                skipped,
                output.display()
            );
        }

        Ok(AssemblyReport {
            output: output.to_path_buf(),
            engine: self.name(),
            pages_written: drawings.len(),
            skipped,
            degraded: false,
        })
    }
}
