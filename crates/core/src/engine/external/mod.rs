//! The external converter engine.
//!
//! Each page is framed to its computed page size, converted to a
//! single-page PDF by a child process, and the results are merged. The
//! first failing page aborts the run: nothing is written to the output.

mod frame;
mod invoke;
mod locate;

pub use locate::{Platform, TOOL_NAME, candidate_paths, find_tool, search_path};

use super::{AssemblyReport, RenderingEngine};
use crate::config::{AssemblyOptions, DEFAULT_TOOL_TIMEOUT, ToolCommand};
use crate::error::AssemblyError;
use crate::output::write_atomically;
use iwb2pdf_layout::DEFAULT_PADDING;
use iwb2pdf_types::{PageSet, SizingMode};
use log::{debug, info, warn};
use once_cell::unsync::OnceCell;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug)]
pub struct ExternalToolEngine {
    padding: f32,
    timeout: Duration,
    explicit: Option<ToolCommand>,
    /// Lookup result, resolved on first use and kept for this instance.
    resolved: OnceCell<Option<ToolCommand>>,
}

impl Default for ExternalToolEngine {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            timeout: DEFAULT_TOOL_TIMEOUT,
            explicit: None,
            resolved: OnceCell::new(),
        }
    }
}

impl ExternalToolEngine {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_options(options: &AssemblyOptions) -> Self {
        let engine = Self::new().with_padding(options.padding).with_timeout(options.tool_timeout);
        match &options.tool_command {
            Some(command) => engine.with_command(command.clone()),
            None => engine,
        }
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses `command` instead of searching for the converter.
    pub fn with_command(mut self, command: ToolCommand) -> Self {
        self.explicit = Some(command);
        self.resolved = OnceCell::new();
        self
    }

    /// The converter this engine runs, if one can be found.
    pub fn tool(&self) -> Option<&ToolCommand> {
        self.resolved.get_or_init(|| self.locate()).as_ref()
    }

    fn locate(&self) -> Option<ToolCommand> {
        match &self.explicit {
            Some(command) if locate::command_exists(&command.program) => Some(command.clone()),
            Some(command) => {
                debug!("Configured converter {} is not executable", command.program.display());
                None
            }
            None => find_tool(TOOL_NAME, Platform::current()).map(ToolCommand::new),
        }
    }

    fn convert_pages(&self, tool: &ToolCommand, pages: &PageSet, mode: SizingMode, scratch: &Path) -> Result<Vec<PathBuf>, AssemblyError> {
        let framed = frame::frame_pages(pages, mode, self.padding, scratch)?;
        let total = pages.len();
        let mut converted = Vec::with_capacity(total);

        for (position, (page, input)) in pages.iter().zip(&framed).enumerate() {
            let target = scratch.join(format!("{position:04}_page_{}.pdf", page.index));
            debug!("Converting SVG to PDF: {}", page.name());
            invoke::convert(tool, input, &target, self.timeout, &page.name())?;
            info!(
                "Converted ({}/{}): {} -> {}",
                position + 1,
                total,
                page.name(),
                target.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
            );
            converted.push(target);
        }
        Ok(converted)
    }
}

impl RenderingEngine for ExternalToolEngine {
    fn name(&self) -> &'static str {
        "external-tool"
    }

    fn is_available(&self) -> bool {
        self.tool().is_some()
    }

    fn combine_to_pdf(&self, pages: &PageSet, output: &Path, mode: SizingMode) -> Result<AssemblyReport, AssemblyError> {
        let tool = self.tool().ok_or(AssemblyError::ToolUnavailable)?;
        info!("Converting {} page(s) with {}", pages.len(), tool.program.display());

        // Removed on every exit path when `scratch` drops.
        let scratch = tempfile::Builder::new().prefix("iwb2pdf-").tempdir()?;
        debug!("Using temporary directory: {}", scratch.path().display());

        let converted = self.convert_pages(tool, pages, mode, scratch.path())?;
        let (pages_written, degraded) = assemble(&converted, output)?;

        Ok(AssemblyReport {
            output: output.to_path_buf(),
            engine: self.name(),
            pages_written,
            skipped: Vec::new(),
            degraded,
        })
    }
}

/// Merges the converted pages into `output`, returning the page count and
/// whether the output is degraded.
#[cfg(feature = "merge")]
fn assemble(converted: &[PathBuf], output: &Path) -> Result<(usize, bool), AssemblyError> {
    use std::io::{BufWriter, Write};

    info!("Merging {} PDF file(s) into {}", converted.len(), output.display());
    let mut merged = iwb2pdf_pdf_composer::merge_files(converted)?;
    write_atomically(output, |file| {
        let mut writer = BufWriter::new(file);
        iwb2pdf_pdf_composer::save_document(&mut merged, &mut writer)?;
        writer.flush()?;
        Ok(())
    })?;
    info!("Successfully saved PDF: {}", output.display());
    Ok((converted.len(), false))
}

#[cfg(not(feature = "merge"))]
fn assemble(converted: &[PathBuf], output: &Path) -> Result<(usize, bool), AssemblyError> {
    warn!("PDF merging is not available, using single-page fallback");
    copy_first_page(converted, output)?;
    if converted.len() > 1 {
        warn!(
            "Only the first of {} pages was saved to {}. Build with the `merge` feature for full output",
            converted.len(),
            output.display()
        );
    }
    Ok((1, true))
}

/// Copies the first converted page to `output` unchanged.
#[cfg_attr(feature = "merge", allow(dead_code))]
fn copy_first_page(converted: &[PathBuf], output: &Path) -> Result<(), AssemblyError> {
    let first = converted.first().ok_or(AssemblyError::NoRenderablePages { total: 0 })?;
    write_atomically(output, |file| {
        io::copy(&mut File::open(first)?, file)?;
        Ok(())
    })?;
    warn!("Saved PDF (single page): {}", output.display());
    Ok(())
}
