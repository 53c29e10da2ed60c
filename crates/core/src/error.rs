//! Error types for page assembly.

use iwb2pdf_render_lopdf::RenderError;
use iwb2pdf_types::PageSetError;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The page directory is unreadable or holds no page files.
    #[error(transparent)]
    PageSet(#[from] PageSetError),

    /// Every page failed to parse, so there is nothing to write.
    #[error("none of the {total} page file(s) could be rendered")]
    NoRenderablePages { total: usize },

    #[error("failed to prepare {page}: {reason}")]
    PageRender { page: String, reason: String },

    #[error("failed to launch converter {}: {source}", program.display())]
    ToolLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("converter timed out after {}s on {page}", timeout.as_secs_f32())]
    ToolTimeout { page: String, timeout: Duration },

    #[error("converter failed on {page} ({status}): {stderr}")]
    ToolExit {
        page: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no external converter is available")]
    ToolUnavailable,

    #[error("failed to merge converted pages: {0}")]
    Merge(String),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "merge")]
impl From<iwb2pdf_pdf_composer::ComposerError> for AssemblyError {
    fn from(e: iwb2pdf_pdf_composer::ComposerError) -> Self {
        AssemblyError::Merge(e.to_string())
    }
}
