pub mod geometry;
pub mod options;
pub mod page;

pub use geometry::Size;
pub use options::{EnginePreference, ParseOptionError, SizingMode};
pub use page::{PageFile, PageSet, PageSetError};
