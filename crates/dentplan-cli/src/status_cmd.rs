//! `dentplan validate` and `dentplan status`: inspect a stored plan.

use std::path::Path;

use anyhow::{Result, bail};

use dentplan_core::{Configurator, Step, ToothStatus, plan::plan_issues};
use dentplan_model::{ClinicalState, EngineConfig};

use crate::plan_io;

/// Check a plan file's internal consistency. Fails if any issue is found.
pub fn run_validate(path: &Path) -> Result<()> {
    let plan = plan_io::read_plan(path)?;
    let issues = plan_issues(&plan);
    if issues.is_empty() {
        println!("{}: OK", path.display());
        return Ok(());
    }

    for issue in &issues {
        println!("  - {issue}");
    }
    bail!("{} has {} issue(s)", path.display(), issues.len());
}

/// Show the completeness of a plan file.
pub fn run_status(path: &Path, engine: EngineConfig) -> Result<()> {
    let plan = plan_io::read_plan(path)?;
    if plan.is_empty() {
        println!("{}: empty plan", path.display());
        return Ok(());
    }
    let configurator = Configurator::from_plan(&plan, engine);
    let report = configurator.completeness();

    if let Some(order_ref) = &plan.meta.order_ref {
        println!("Order: {order_ref}");
    }
    if let Some(generated_at) = plan.meta.generated_at {
        println!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let clinical = configurator.clinical();
    println!(
        "Clinical: missing={} abutment={} implant={}",
        clinical.teeth_in_state(ClinicalState::Missing).len(),
        clinical.teeth_in_state(ClinicalState::Abutment).len(),
        clinical.teeth_in_state(ClinicalState::Implant).len(),
    );
    println!(
        "Work: {} teeth, {} bridge(s), {} pontic(s)",
        report.teeth_in_plan.len(),
        report.bridge_count,
        report.pontic_count,
    );
    println!();

    if !report.tooth_status.is_empty() {
        println!("{:<6} {:<14} {:<20} STATUS", "TOOTH", "TYPE", "MATERIAL");
        for (tooth, status) in &report.tooth_status {
            let Some(assignment) = configurator.plan().assignment(*tooth) else {
                continue;
            };
            let status = match status {
                ToothStatus::Configured => "configured",
                ToothStatus::MissingMaterial => "needs material",
                ToothStatus::MissingShade => "needs shade",
                ToothStatus::Unconfigured => "needs material and shade",
            };
            println!(
                "{:<6} {:<14} {:<20} {status}",
                tooth,
                assignment.restoration_type.label(),
                assignment.material.as_deref().unwrap_or("-"),
            );
        }
        println!();
    }

    for (tooth, fields) in &report.incomplete_implants {
        let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
        println!("Implant {tooth} lacks: {}", names.join(", "));
    }
    println!(
        "Step {} reachable: {}",
        Step::AssignWork.number(),
        if report.can_advance { "yes" } else { "no" }
    );
    println!(
        "Complete: {}",
        if report.is_complete() { "yes" } else { "no" }
    );

    Ok(())
}
