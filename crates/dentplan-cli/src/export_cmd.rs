//! `dentplan export`: convert a plan file between formats.

use std::path::Path;

use anyhow::Result;

use crate::plan_io::{self, PlanFormat};

/// Re-serialize a plan in `format`, stamping the export time.
pub fn run_export(plan_path: &Path, format: PlanFormat, output: Option<&Path>) -> Result<()> {
    let mut plan = plan_io::read_plan(plan_path)?;
    plan.meta.generated_at = Some(chrono::Utc::now());
    plan_io::write_plan(&plan, format, output)
}
