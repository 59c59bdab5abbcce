//! Reading and writing plan files.
//!
//! The format is chosen by extension: `.json` is JSON, anything else TOML.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dentplan_model::Plan;

/// Serialization format of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    Toml,
    Json,
}

impl PlanFormat {
    /// Format implied by a path's extension, if it names one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.to_ascii_lowercase().parse().ok())
    }
}

impl fmt::Display for PlanFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Toml => "toml",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanFormat {
    type Err = PlanFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(PlanFormatParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanFormat`] string.
#[derive(Debug, Clone)]
pub struct PlanFormatParseError(pub String);

impl fmt::Display for PlanFormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan format: {:?} (expected toml or json)", self.0)
    }
}

impl std::error::Error for PlanFormatParseError {}

/// Pick the output format: explicit flag, then the output file's extension,
/// then the configured default.
pub fn choose_format(
    explicit: Option<PlanFormat>,
    output: Option<&Path>,
    default: PlanFormat,
) -> PlanFormat {
    explicit
        .or_else(|| output.and_then(PlanFormat::from_path))
        .unwrap_or(default)
}

/// Parse plan text in the given format.
pub fn parse_plan(contents: &str, format: PlanFormat) -> Result<Plan> {
    let plan = match format {
        PlanFormat::Toml => toml::from_str(contents).context("failed to parse plan TOML")?,
        PlanFormat::Json => serde_json::from_str(contents).context("failed to parse plan JSON")?,
    };
    Ok(plan)
}

/// Render a plan in the given format.
pub fn render_plan(plan: &Plan, format: PlanFormat) -> Result<String> {
    let text = match format {
        PlanFormat::Toml => toml::to_string_pretty(plan).context("failed to serialize plan")?,
        PlanFormat::Json => {
            let mut text =
                serde_json::to_string_pretty(plan).context("failed to serialize plan")?;
            text.push('\n');
            text
        }
    };
    Ok(text)
}

/// Read a plan file, choosing the format by extension.
pub fn read_plan(path: &Path) -> Result<Plan> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file: {}", path.display()))?;
    let format = PlanFormat::from_path(path).unwrap_or(PlanFormat::Toml);
    parse_plan(&contents, format).with_context(|| format!("in {}", path.display()))
}

/// Write a plan to `output`, or to stdout when no path is given.
pub fn write_plan(plan: &Plan, format: PlanFormat, output: Option<&Path>) -> Result<()> {
    let text = render_plan(plan, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("cannot write output file: {}", path.display()))?;
            tracing::info!(path = %path.display(), %format, "plan written");
        }
        None => print!("{text}"),
    }
    Ok(())
}
