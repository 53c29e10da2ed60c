use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("no documents to merge")]
    NothingToMerge,

    #[error("failed to save merged document: {0}")]
    Save(String),

    #[error("{0}")]
    Other(String),
}
