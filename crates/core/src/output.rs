//! Output files are written into a temporary sibling and renamed into place
//! once complete, so a failed run never leaves a partial PDF behind.

use crate::error::AssemblyError;
use std::fs::File;
use std::path::Path;

pub(crate) fn write_atomically<F>(output: &Path, write: F) -> Result<(), AssemblyError>
where
    F: FnOnce(&mut File) -> Result<(), AssemblyError>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".iwb2pdf-")
        .suffix(".pdf.part")
        .tempfile_in(dir)?;

    write(staged.as_file_mut())?;
    staged.as_file_mut().sync_all()?;

    staged.persist(output).map_err(|e| AssemblyError::Io(e.error))?;
    log::debug!("Wrote {}", output.display());
    Ok(())
}
