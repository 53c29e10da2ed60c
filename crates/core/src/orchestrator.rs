use crate::config::{AssemblyOptions, ToolCommand};
use crate::engine::{AssemblyReport, Engine, RenderingEngine};
use crate::error::AssemblyError;
use crate::selector::select_engine;
use iwb2pdf_types::{EnginePreference, PageSet, SizingMode};
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

/// A builder for creating an `AssemblyOrchestrator`.
#[derive(Debug, Clone, Default)]
pub struct AssemblyBuilder {
    options: AssemblyOptions,
}

impl AssemblyBuilder {
    /// Creates a new `AssemblyBuilder` with default settings.
    pub fn new() -> Self { Default::default() }

    pub fn with_sizing_mode(mut self, mode: SizingMode) -> Self { self.options.sizing_mode = mode; self }

    pub fn with_engine_preference(mut self, preference: EnginePreference) -> Self { self.options.engine_preference = preference; self }

    /// Padding added on every side of each page's content.
    pub fn with_padding(mut self, padding: f32) -> Self { self.options.padding = padding; self }

    /// Extension of the page files to collect, without the dot.
    pub fn with_page_extension(mut self, extension: impl Into<String>) -> Self { self.options.page_extension = extension.into(); self }

    /// Time limit for a single converter invocation.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self { self.options.tool_timeout = timeout; self }

    /// Runs `command` as the external converter instead of searching for one.
    pub fn with_tool_command(mut self, command: ToolCommand) -> Self { self.options.tool_command = Some(command); self }

    /// Scans the host for installed fonts so SVG text can be drawn in-process.
    pub fn with_system_fonts(mut self, system_fonts: bool) -> Self { self.options.system_fonts = system_fonts; self }

    /// Validates the options and creates the `AssemblyOrchestrator`.
    pub fn build(self) -> Result<AssemblyOrchestrator, AssemblyError> {
        self.options.validate().map_err(AssemblyError::Config)?;
        let mut options = self.options;
        options.page_extension = options.page_extension.trim_start_matches('.').to_string();
        Ok(AssemblyOrchestrator { options })
    }
}

/// Turns a directory of page files into one PDF.
///
/// Holds only configuration; every call selects its own engine.
#[derive(Debug, Clone)]
pub struct AssemblyOrchestrator {
    options: AssemblyOptions,
}

impl AssemblyOrchestrator {
    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Assembles every `page_<N>.<ext>` file in `page_dir` into `output`.
    pub fn assemble_directory(&self, page_dir: &Path, output: &Path) -> Result<AssemblyReport, AssemblyError> {
        let engine = select_engine(self.options.engine_preference, &self.options);

        let pages = PageSet::discover(page_dir, &self.options.page_extension)?;
        info!("Found {} page file(s) in {}", pages.len(), page_dir.display());
        debug!("Page order: {:?}", pages.indices());

        self.run(&engine, &pages, output)
    }

    /// Assembles an already collected page set into `output`.
    pub fn assemble_pages(&self, pages: &PageSet, output: &Path) -> Result<AssemblyReport, AssemblyError> {
        let engine = select_engine(self.options.engine_preference, &self.options);
        self.run(&engine, pages, output)
    }

    fn run(&self, engine: &Engine, pages: &PageSet, output: &Path) -> Result<AssemblyReport, AssemblyError> {
        info!(
            "Assembling {} page(s) with the {} engine ({} sizing)",
            pages.len(),
            engine.name(),
            self.options.sizing_mode
        );
        engine.combine_to_pdf(pages, output, self.options.sizing_mode)
    }
}
