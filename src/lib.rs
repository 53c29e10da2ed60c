//! # iwb2pdf
//!
//! Assembles the per-page vector drawings of a whiteboard document into a
//! single PDF.
//!
//! ```no_run
//! use iwb2pdf::{AssemblyBuilder, SizingMode};
//! use std::path::Path;
//!
//! let orchestrator = AssemblyBuilder::new()
//!     .with_sizing_mode(SizingMode::Uniform)
//!     .build()?;
//! let report = orchestrator.assemble_directory(Path::new("pages"), Path::new("board.pdf"))?;
//! println!("{} page(s) written by the {} engine", report.pages_written, report.engine);
//! # Ok::<(), iwb2pdf::AssemblyError>(())
//! ```

pub use iwb2pdf_core as core;
pub use iwb2pdf_layout as layout;
pub use iwb2pdf_types as types;

pub use iwb2pdf_core::{
    AssemblyBuilder, AssemblyError, AssemblyOptions, AssemblyOrchestrator, AssemblyReport, DEFAULT_TOOL_TIMEOUT, Engine,
    ExternalToolEngine, InProcessEngine, Platform, RenderingEngine, ToolCommand, candidate_paths, select_engine,
};
pub use iwb2pdf_layout::{DEFAULT_PADDING, SizingDecision, compute_sizing};
pub use iwb2pdf_types::{EnginePreference, PageFile, PageSet, Size, SizingMode};
