//! # iwb2pdf-core
//!
//! Assembles a directory of single-page vector files into one PDF.
//!
//! - **engine**: the [`RenderingEngine`] capability and its two variants,
//!   an in-process renderer and an external converter
//! - **selector**: picks the engine for a run from an [`EnginePreference`]
//! - **orchestrator**: discovers the pages and drives the chosen engine
//! - **config** / **error**: options and the error taxonomy
//!
//! The two engines fail differently on purpose. The in-process engine drops
//! pages it cannot parse and keeps going; the external engine aborts the
//! whole run on the first failing page.

pub use iwb2pdf_layout as layout;
pub use iwb2pdf_types as types;

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod selector;

mod output;

pub use config::{AssemblyOptions, DEFAULT_TOOL_TIMEOUT, ToolCommand};
pub use engine::external::{ExternalToolEngine, Platform, candidate_paths};
pub use engine::in_process::InProcessEngine;
pub use engine::{AssemblyReport, Engine, RenderingEngine};
pub use error::AssemblyError;
pub use orchestrator::{AssemblyBuilder, AssemblyOrchestrator};
pub use selector::select_engine;
pub use types::{EnginePreference, PageFile, PageSet, SizingMode};
