//! Page directories and converters for assembly tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A page with a filled rectangle covering its top-left quarter.
pub fn rect_svg(width: u32, height: u32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <rect x="0" y="0" width="{}" height="{}" fill="#336699"/>
</svg>
"##,
        width / 2,
        height / 2
    )
}

/// A page that uses strokes, opacity, curves and a nested group.
pub fn sketch_svg(width: u32, height: u32) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">
  <g opacity="0.8" transform="translate(2 2)">
    <path d="M 1 1 Q 10 20 20 1 C 25 5 30 5 35 1 Z" fill="none" stroke="#cc0000" stroke-width="1.5"
          stroke-linecap="round" stroke-linejoin="round" stroke-dasharray="3 1"/>
    <circle cx="10" cy="10" r="4" fill="green" fill-opacity="0.5" fill-rule="evenodd"/>
  </g>
</svg>
"##
    )
}

pub const BROKEN_SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\"";

/// A temporary directory laid out like the extractor's output.
pub struct PageDir {
    dir: TempDir,
}

impl PageDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { dir: tempfile::tempdir()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `page_<index>.svg`.
    pub fn page(&self, index: u32, body: &str) -> std::io::Result<PathBuf> {
        self.file(&format!("page_{index}.svg"), body)
    }

    pub fn file(&self, name: &str, body: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, body)?;
        Ok(path)
    }

    /// A fresh output path next to the pages.
    pub fn output(&self) -> PathBuf {
        self.dir.path().join("assembled.pdf")
    }
}

#[cfg(unix)]
pub mod converter {
    use iwb2pdf::ToolCommand;
    use std::fs;
    use std::path::Path;

    /// A converter script run through `/bin/sh`. It receives the same
    /// arguments as the real converter: `$1` is `--without-gui`, `$2` the
    /// input SVG, `$3` `--export-filename=<pdf>`.
    pub fn script(dir: &Path, body: &str) -> std::io::Result<ToolCommand> {
        let path = dir.join("fake-converter.sh");
        let script = format!(
            "input=\"$2\"\nout=\"${{3#--export-filename=}}\"\nname=$(basename \"$input\" .svg)\nindex=\"${{name##*_}}\"\n{body}\n"
        );
        fs::write(&path, script)?;
        Ok(ToolCommand::new("/bin/sh").with_args([path]))
    }

    /// Copies `<fixtures>/page_<index>.pdf` to the requested output and
    /// records each input it saw in `<fixtures>/calls.log`.
    pub fn copying(fixtures: &Path) -> std::io::Result<ToolCommand> {
        let dir = fixtures.display();
        script(
            fixtures,
            &format!("echo \"$input\" >> '{dir}/calls.log'\ncp '{dir}'/page_\"$index\".pdf \"$out\""),
        )
    }

    /// Behaves like `copying` but exits non-zero on page `failing_index`.
    pub fn failing_on(fixtures: &Path, failing_index: u32) -> std::io::Result<ToolCommand> {
        let dir = fixtures.display();
        script(
            fixtures,
            &format!(
                "echo \"$input\" >> '{dir}/calls.log'\nif [ \"$index\" = \"{failing_index}\" ]; then echo 'cannot convert' >&2; exit 3; fi\ncp '{dir}'/page_\"$index\".pdf \"$out\""
            ),
        )
    }

    /// Never finishes within a short timeout.
    pub fn hanging(fixtures: &Path) -> std::io::Result<ToolCommand> {
        script(fixtures, "exec sleep 5")
    }

    pub fn call_count(fixtures: &Path) -> usize {
        fs::read_to_string(fixtures.join("calls.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}
