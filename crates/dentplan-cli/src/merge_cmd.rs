//! `dentplan merge`: merge extraction suggestions into a stored plan.

use std::path::Path;

use anyhow::{Context, Result};

use dentplan_core::{Configurator, parse_suggestions};
use dentplan_model::EngineConfig;

use crate::plan_io::{self, PlanFormat};

/// Run the merge command.
///
/// A malformed suggestion file changes nothing and fails the command.
/// Suggestions the plan cannot take are reported and skipped.
pub fn run_merge(
    plan_path: &Path,
    suggestions_path: &Path,
    output: Option<&Path>,
    format: PlanFormat,
    engine: EngineConfig,
) -> Result<()> {
    let plan = plan_io::read_plan(plan_path)?;
    let json = std::fs::read_to_string(suggestions_path).with_context(|| {
        format!(
            "failed to read suggestions file: {}",
            suggestions_path.display()
        )
    })?;
    let suggestions = parse_suggestions(&json)
        .with_context(|| format!("invalid suggestions in {}", suggestions_path.display()))?;

    let mut configurator = Configurator::from_plan(&plan, engine);
    let report = configurator
        .merge_suggestions(suggestions)
        .with_context(|| format!("suggestions in {} rejected", suggestions_path.display()))?;

    for notice in configurator.take_notices() {
        eprintln!("{notice}");
    }
    eprintln!(
        "Merged {} suggestion(s), skipped {}.",
        report.applied.len(),
        report.skipped.len()
    );

    let mut merged = configurator.snapshot();
    merged.meta.generated_at = Some(chrono::Utc::now());
    plan_io::write_plan(&merged, format, output)
}
