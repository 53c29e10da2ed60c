//! Rendering engines.
//!
//! - [`InProcessEngine`]: parses and draws each page itself. Best effort: a
//!   page that fails to parse is logged and left out of the output.
//! - [`ExternalToolEngine`]: converts each page with an external program and
//!   merges the results. All or nothing: the first failing page aborts the
//!   run and no output is written.

use crate::error::AssemblyError;
use iwb2pdf_types::{PageSet, SizingMode};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub mod external;
pub mod in_process;

pub use external::ExternalToolEngine;
pub use in_process::InProcessEngine;

/// Outcome of a successful `combine_to_pdf` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub output: PathBuf,
    pub engine: &'static str,
    pub pages_written: usize,
    /// Indices of pages the in-process engine could not parse.
    pub skipped: Vec<u64>,
    /// Set when only the first page was kept because merging is unavailable.
    pub degraded: bool,
}

/// A backend that turns an ordered page set into one PDF.
pub trait RenderingEngine {
    fn name(&self) -> &'static str;

    /// Whether the engine can run here. Never fails; a missing dependency is
    /// reported as `false`.
    fn is_available(&self) -> bool;

    /// Writes every page of `pages`, in index order, into a PDF at `output`.
    fn combine_to_pdf(&self, pages: &PageSet, output: &Path, mode: SizingMode) -> Result<AssemblyReport, AssemblyError>;
}

/// An enum for static dispatch of `RenderingEngine` implementations.
#[derive(Debug)]
pub enum Engine {
    InProcess(InProcessEngine),
    ExternalTool(ExternalToolEngine),
}

impl RenderingEngine for Engine {
    fn name(&self) -> &'static str {
        match self {
            Engine::InProcess(e) => e.name(),
            Engine::ExternalTool(e) => e.name(),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            Engine::InProcess(e) => e.is_available(),
            Engine::ExternalTool(e) => e.is_available(),
        }
    }

    fn combine_to_pdf(&self, pages: &PageSet, output: &Path, mode: SizingMode) -> Result<AssemblyReport, AssemblyError> {
        match self {
            Engine::InProcess(e) => e.combine_to_pdf(pages, output, mode),
            Engine::ExternalTool(e) => e.combine_to_pdf(pages, output, mode),
        }
    }
}
