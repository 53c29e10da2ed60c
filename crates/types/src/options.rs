use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// How output pages are sized relative to their content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// Each page is sized to its own content plus padding. (Default)
    #[default]
    Independent,
    /// Every page takes the size of the largest content plus padding,
    /// with each page's content centered.
    Uniform,
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMode::Independent => f.write_str("independent"),
            SizingMode::Uniform => f.write_str("uniform"),
        }
    }
}

impl FromStr for SizingMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(SizingMode::Independent),
            "uniform" => Ok(SizingMode::Uniform),
            _ => Err(ParseOptionError {
                kind: "sizing mode",
                value: s.to_string(),
                expected: "independent, uniform",
            }),
        }
    }
}

/// Which rendering engine the caller would like to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnginePreference {
    /// Use the external converter, falling back to the in-process engine
    /// when the converter cannot be found.
    ForceOn,
    /// Always use the in-process engine.
    ForceOff,
    /// Prefer the external converter when it is installed. (Default)
    #[default]
    Auto,
}

impl fmt::Display for EnginePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePreference::ForceOn => f.write_str("external"),
            EnginePreference::ForceOff => f.write_str("builtin"),
            EnginePreference::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for EnginePreference {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EnginePreference::Auto),
            "external" | "inkscape" | "on" => Ok(EnginePreference::ForceOn),
            "builtin" | "in-process" | "off" => Ok(EnginePreference::ForceOff),
            _ => Err(ParseOptionError {
                kind: "engine",
                value: s.to_string(),
                expected: "auto, external, builtin",
            }),
        }
    }
}
