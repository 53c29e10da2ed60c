//! Page files produced by the whiteboard extraction step.
//!
//! The extractor writes one vector document per logical page, named
//! `page_<N>.<ext>`. `N` is a non-negative integer that defines the page
//! order; it need not start at zero or be contiguous, and it is compared
//! numerically so that `page_10` sorts after `page_9`.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_PREFIX: &str = "page_";

#[derive(Error, Debug)]
pub enum PageSetError {
    #[error("no page files matching 'page_<N>.{extension}' found in {}", dir.display())]
    Empty { dir: PathBuf, extension: String },

    #[error("page index of {} does not fit in 64 bits", path.display())]
    IndexOutOfRange { path: PathBuf },

    #[error("failed to read page directory {}: {source}", dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single-page vector document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub index: u64,
    pub path: PathBuf,
}

impl PageFile {
    /// Builds a `PageFile` if the file name follows `page_<N>.<extension>`.
    /// The extension is compared case-insensitively.
    pub fn from_path(path: impl Into<PathBuf>, extension: &str) -> Option<Self> {
        let path = path.into();
        let index = Self::parse_index(path.file_name()?.to_str()?, extension)?;
        Some(Self { index, path })
    }

    /// Extracts `N` from `page_<N>.<extension>`. Returns `None` when the name
    /// does not follow the pattern or `N` does not fit in a `u64`.
    pub fn parse_index(file_name: &str, extension: &str) -> Option<u64> {
        index_digits(file_name, extension)?.parse().ok()
    }

    /// File name for display in log lines.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The non-empty, index-ordered sequence of page files for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSet {
    files: Vec<PageFile>,
}

impl PageSet {
    /// Orders the files by index. Returns `None` for an empty list.
    ///
    /// Files sharing an index (`page_1` and `page_01`) are ordered by path
    /// so the result does not depend on directory enumeration order.
    pub fn from_files(mut files: Vec<PageFile>) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        files.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
        Some(Self { files })
    }

    /// Collects every `page_<N>.<extension>` regular file in `dir`.
    pub fn discover(dir: &Path, extension: &str) -> Result<Self, PageSetError> {
        let io_err = |source| PageSetError::Io {
            dir: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(digits) = index_digits(name, extension) else {
                continue;
            };
            match digits.parse() {
                Ok(index) => files.push(PageFile { index, path }),
                Err(_) => return Err(PageSetError::IndexOutOfRange { path }),
            }
        }

        Self::from_files(files).ok_or_else(|| PageSetError::Empty {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn first(&self) -> &PageFile {
        &self.files[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageFile> {
        self.files.iter()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.files.iter().map(|f| f.index).collect()
    }
}

/// The digit run `N` of a `page_<N>.<extension>` file name, extension
/// compared case-insensitively.
fn index_digits<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let rest = file_name.strip_prefix(PAGE_PREFIX)?;
    let (digits, ext) = rest.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case(extension) {
        return None;
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a PageFile;
    type IntoIter = std::slice::Iter<'a, PageFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
