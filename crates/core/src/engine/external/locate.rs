//! Finding the external converter on the host.

use log::debug;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Program name searched for on `PATH`.
pub const TOOL_NAME: &str = "inkscape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }
}

/// Well-known install locations of the converter, tried in order after the
/// `PATH` search fails.
pub fn candidate_paths(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[
            r"C:\Program Files\Inkscape\bin\inkscape.exe",
            r"C:\Program Files (x86)\Inkscape\bin\inkscape.exe",
            r"C:\Program Files\Inkscape\inkscape.exe",
            r"C:\Program Files (x86)\Inkscape\inkscape.exe",
        ],
        Platform::MacOs => &[
            "/Applications/Inkscape.app/Contents/MacOS/inkscape",
            "/usr/local/bin/inkscape",
            "/opt/homebrew/bin/inkscape",
        ],
        Platform::Linux => &["/usr/bin/inkscape", "/usr/local/bin/inkscape", "/snap/bin/inkscape"],
        Platform::Other => &[],
    }
}

/// Looks `program` up in each directory of a `PATH`-style list.
pub fn search_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    let file_name = format!("{program}{}", env::consts::EXE_SUFFIX);
    env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(&file_name))
        .find(|candidate| is_executable(candidate))
}

/// `PATH` first, then the platform's install locations.
pub fn find_tool(program: &str, platform: Platform) -> Option<PathBuf> {
    if let Some(found) = env::var_os("PATH").and_then(|path_var| search_path(program, &path_var)) {
        debug!("Found {program} in PATH: {}", found.display());
        return Some(found);
    }

    let found = candidate_paths(platform)
        .iter()
        .map(PathBuf::from)
        .find(|candidate| is_executable(candidate));
    match &found {
        Some(path) => debug!("Found {program} at: {}", path.display()),
        None => debug!("{program} not found in PATH or common installation paths"),
    }
    found
}

/// Whether an explicitly configured program can be run. A bare name is
/// looked up on `PATH`; anything with a directory part is checked directly.
pub fn command_exists(program: &Path) -> bool {
    if program.components().count() > 1 || program.is_absolute() {
        return is_executable(program);
    }
    match (program.to_str(), env::var_os("PATH")) {
        (Some(name), Some(path_var)) => search_path(name, &path_var).is_some(),
        _ => false,
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
