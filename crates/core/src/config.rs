use iwb2pdf_layout::DEFAULT_PADDING;
use iwb2pdf_types::{EnginePreference, SizingMode};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on a single converter invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Extension of the page files produced by the extractor.
pub const DEFAULT_PAGE_EXTENSION: &str = "svg";

/// An explicit external converter: the program plus any arguments that go
/// before the converter's own arguments.
///
/// `ToolCommand::new("/bin/sh").with_args(["convert.sh"])` runs a wrapper
/// script in place of the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Settings for one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub sizing_mode: SizingMode,
    pub engine_preference: EnginePreference,
    /// Padding on every side of the content, in drawing units.
    pub padding: f32,
    pub page_extension: String,
    pub tool_timeout: Duration,
    /// Bypasses converter lookup when set.
    pub tool_command: Option<ToolCommand>,
    /// Load installed fonts so the in-process engine can draw SVG text.
    pub system_fonts: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            sizing_mode: SizingMode::default(),
            engine_preference: EnginePreference::default(),
            padding: DEFAULT_PADDING,
            page_extension: DEFAULT_PAGE_EXTENSION.to_string(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            tool_command: None,
            system_fonts: true,
        }
    }
}

impl AssemblyOptions {
    /// Checks the values a builder cannot rule out by type.
    pub fn validate(&self) -> Result<(), String> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(format!("padding must be a non-negative number, got {}", self.padding));
        }
        if self.tool_timeout.is_zero() {
            return Err("converter timeout must be greater than zero".to_string());
        }
        let extension = self.page_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(format!("invalid page extension '{}'", self.page_extension));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AssemblyOptions::default();
        assert_eq!(options.sizing_mode, SizingMode::Independent);
        assert_eq!(options.engine_preference, EnginePreference::Auto);
        assert_eq!(options.padding, 10.0);
        assert_eq!(options.page_extension, "svg");
        assert_eq!(options.tool_timeout, Duration::from_secs(60));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_padding = AssemblyOptions {
            padding: -1.0,
            ..Default::default()
        };
        assert!(bad_padding.validate().is_err());

        let nan_padding = AssemblyOptions {
            padding: f32::NAN,
            ..Default::default()
        };
        assert!(nan_padding.validate().is_err());

        let zero_timeout = AssemblyOptions {
            tool_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let empty_extension = AssemblyOptions {
            page_extension: ".".to_string(),
            ..Default::default()
        };
        assert!(empty_extension.validate().is_err());
    }

    #[test]
    fn test_tool_command_args() {
        let command = ToolCommand::new("/bin/sh").with_args(["fake.sh", "--flag"]);
        assert_eq!(command.program, PathBuf::from("/bin/sh"));
        assert_eq!(command.leading_args, vec![OsString::from("fake.sh"), OsString::from("--flag")]);
    }
}
