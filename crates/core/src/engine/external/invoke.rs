//! Running the converter as a child process with a hard timeout.

use crate::config::ToolCommand;
use crate::error::AssemblyError;
use log::debug;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Converts `input` into a single-page PDF at `output`.
///
/// `page` names the page in errors. The child is killed once `timeout`
/// elapses.
pub(crate) fn convert(
    tool: &ToolCommand,
    input: &Path,
    output: &Path,
    timeout: Duration,
    page: &str,
) -> Result<(), AssemblyError> {
    let mut export_filename = OsString::from("--export-filename=");
    export_filename.push(output);

    let mut command = Command::new(&tool.program);
    command
        .args(&tool.leading_args)
        .arg("--without-gui")
        .arg(input)
        .arg(export_filename)
        .arg("--export-type=pdf")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("Running {:?}", command);

    let mut child = command.spawn().map_err(|source| AssemblyError::ToolLaunch {
        program: tool.program.clone(),
        source,
    })?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_with_timeout(&mut child, timeout)? {
        Some(status) => status,
        None => {
            // The drain threads end on their own once the pipes close.
            let _ = child.kill();
            let _ = child.wait();
            return Err(AssemblyError::ToolTimeout {
                page: page.to_string(),
                timeout,
            });
        }
    };

    let stdout = collect(stdout);
    let stderr = collect(stderr);
    if !stdout.trim().is_empty() {
        debug!("{page}: {}", stdout.trim());
    }

    if !status.success() {
        return Err(AssemblyError::ToolExit {
            page: page.to_string(),
            status,
            stderr: stderr.trim().to_string(),
        });
    }
    if !output.is_file() {
        return Err(AssemblyError::PageRender {
            page: page.to_string(),
            reason: format!("converter exited successfully but wrote no {}", output.display()),
        });
    }
    Ok(())
}

/// Polls until the child exits or `timeout` elapses. A timeout too large to
/// represent as an `Instant` means no deadline.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn script(dir: &Path, body: &str) -> ToolCommand {
        let path = dir.join("converter.sh");
        fs::write(&path, body).unwrap();
        ToolCommand::new("/bin/sh").with_args([path])
    }

    #[test]
    fn test_passes_converter_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args.txt");
        // $1 --without-gui, $2 input, $3 --export-filename=..., $4 --export-type=pdf
        let tool = script(
            dir.path(),
            &format!(
                "echo \"$@\" > '{}'\nout=\"${{3#--export-filename=}}\"\nprintf '%%PDF-1.4' > \"$out\"\n",
                args_file.display()
            ),
        );
        let output = dir.path().join("page_1.pdf");

        convert(&tool, Path::new("in.svg"), &output, Duration::from_secs(10), "page_1.svg").unwrap();

        let args = fs::read_to_string(&args_file).unwrap();
        assert_eq!(
            args.trim(),
            format!("--without-gui in.svg --export-filename={} --export-type=pdf", output.display())
        );
        assert!(output.is_file());
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo 'bad input' >&2\nexit 3\n");

        let err = convert(&tool, Path::new("in.svg"), &dir.path().join("o.pdf"), Duration::from_secs(10), "page_4.svg")
            .unwrap_err();
        match err {
            AssemblyError::ToolExit { page, status, stderr } => {
                assert_eq!(page, "page_4.svg");
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "bad input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "exec sleep 5\n");

        let started = Instant::now();
        let err = convert(&tool, Path::new("in.svg"), &dir.path().join("o.pdf"), Duration::from_millis(200), "page_1.svg")
            .unwrap_err();
        assert!(matches!(err, AssemblyError::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let tool = ToolCommand::new("/nonexistent/converter");
        let err = convert(&tool, Path::new("in.svg"), Path::new("o.pdf"), Duration::from_secs(1), "page_1.svg")
            .unwrap_err();
        assert!(matches!(err, AssemblyError::ToolLaunch { .. }));
    }

    #[test]
    fn test_success_without_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "exit 0\n");
        let err = convert(&tool, Path::new("in.svg"), &dir.path().join("o.pdf"), Duration::from_secs(10), "page_1.svg")
            .unwrap_err();
        assert!(matches!(err, AssemblyError::PageRender { .. }));
    }

    #[test]
    fn test_unbounded_timeout_waits_for_exit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "out=\"${3#--export-filename=}\"\nprintf '%%PDF-1.4' > \"$out\"\n");
        let output = dir.path().join("o.pdf");

        convert(&tool, Path::new("in.svg"), &output, Duration::from_secs(u64::MAX), "page_1.svg").unwrap();
        assert!(output.is_file());
    }
}
