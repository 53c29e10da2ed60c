//! In-process SVG to PDF rendering.
//!
//! - [`SvgDrawing`]: a parsed page with its intrinsic size, drawn as PDF
//!   vector operations.
//! - [`PageCanvas`]: the operations and resources of one output page.
//! - [`StreamingPdfWriter`]: writes each finished page to the output
//!   immediately, then the page tree and cross-reference table on `finish`.

mod canvas;
mod error;
mod svg;
mod writer;

pub use canvas::{ImageXObject, PageCanvas};
pub use error::RenderError;
pub use svg::{FontDatabase, SvgDrawing, system_font_database};
pub use writer::StreamingPdfWriter;
