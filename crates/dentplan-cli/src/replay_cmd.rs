//! `dentplan replay` command: drive the configurator from a session script.
//!
//! A script is a TOML file with an ordered `[[actions]]` list, each entry
//! tagged by `action`:
//!
//! ```toml
//! [meta]
//! order_ref = "ORD-1042"
//!
//! [[actions]]
//! action = "clinical_tool"
//! tool = "missing"
//!
//! [[actions]]
//! action = "click"
//! tooth = 15
//!
//! [[actions]]
//! action = "next"
//!
//! [[actions]]
//! action = "bridge"
//! start = 14
//! end = 16
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use dentplan_core::{
    BulkEdit, ClinicalTool, Configurator, Group, ShadeZone, Step, WorkTool, parse_suggestions,
};
use dentplan_model::{
    ClinicalState, EngineConfig, ImplantDetailPatch, Patch, PlanMeta, RestorationType, ToothId,
};

use crate::plan_io::{self, PlanFormat};

// -----------------------------------------------------------------------
// Script types
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Script {
    /// Replaces the seed plan's metadata when present.
    #[serde(default)]
    pub meta: Option<PlanMeta>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// `tool` is `missing`, `abutment`, `implant`, or absent for none.
    ClinicalTool { tool: Option<ClinicalState> },
    /// `tool` is a restoration type, `bridge`, or absent for none.
    WorkTool { tool: Option<RestorationType> },
    Click { tooth: ToothId },
    SetState { tooth: ToothId, state: ClinicalState },
    Implant {
        tooth: ToothId,
        brand: Option<String>,
        connection_system: Option<String>,
        platform: Option<String>,
        abutment_type: Option<String>,
        notes: Option<String>,
    },
    Next,
    Back,
    GoTo { step: u8 },
    SkipValidation { skip: bool },
    Assign { tooth: ToothId, restoration_type: RestorationType },
    Bridge { start: ToothId, end: ToothId },
    Remove { tooth: ToothId },
    Bulk {
        #[serde(flatten)]
        group: GroupSpec,
        #[serde(flatten)]
        fields: BulkFields,
    },
    /// Merge a suggestions JSON file, relative to the script.
    Merge { file: PathBuf },
}

/// Exactly one of the keys selects the group.
#[derive(Debug, Default, Deserialize)]
pub struct GroupSpec {
    pub cohort: Option<RestorationType>,
    pub bridge_of: Option<ToothId>,
    pub teeth: Option<Vec<ToothId>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkFields {
    pub material: Option<String>,
    pub shade_type: Option<String>,
    pub shade_code: Option<String>,
    pub cervical: Option<String>,
    pub body: Option<String>,
    pub incisal: Option<String>,
    pub provisional: Option<bool>,
    pub jig: Option<bool>,
}

impl BulkFields {
    fn edits(self) -> Vec<BulkEdit> {
        let mut edits = Vec::new();
        edits.extend(self.material.map(BulkEdit::Material));
        edits.extend(self.shade_type.map(BulkEdit::ShadeType));
        edits.extend(self.shade_code.map(BulkEdit::ShadeCode));
        edits.extend(self.cervical.map(|v| BulkEdit::Zone(ShadeZone::Cervical, v)));
        edits.extend(self.body.map(|v| BulkEdit::Zone(ShadeZone::Body, v)));
        edits.extend(self.incisal.map(|v| BulkEdit::Zone(ShadeZone::Incisal, v)));
        edits.extend(self.provisional.map(BulkEdit::Provisional));
        edits.extend(self.jig.map(BulkEdit::Jig));
        edits
    }
}

// -----------------------------------------------------------------------
// Running
// -----------------------------------------------------------------------

/// Parse a session script.
pub fn parse_script(contents: &str) -> Result<Script> {
    toml::from_str(contents).context("failed to parse replay script")
}

/// Apply every action of `script` to `configurator`, in order.
///
/// `base_dir` resolves relative paths inside the script. Refused operator
/// actions are not errors; they end up in the notice queue. Malformed
/// actions and unreadable files abort the replay.
pub fn apply_script(
    configurator: &mut Configurator,
    script: Script,
    base_dir: &Path,
) -> Result<()> {
    if let Some(meta) = script.meta {
        configurator.set_meta(meta);
    }

    for (index, action) in script.actions.into_iter().enumerate() {
        tracing::debug!(index, ?action, "replaying action");
        apply_action(configurator, action, base_dir)
            .with_context(|| format!("action #{} failed", index + 1))?;
    }
    Ok(())
}

fn apply_action(configurator: &mut Configurator, action: Action, base_dir: &Path) -> Result<()> {
    match action {
        Action::ClinicalTool { tool } => {
            let tool = tool.map(clinical_tool).transpose()?;
            configurator.set_clinical_tool(tool);
        }
        Action::WorkTool { tool } => {
            let tool = tool.map(|kind| match kind {
                RestorationType::Bridge => WorkTool::Bridge,
                other => WorkTool::Single(other),
            });
            configurator.select_work_tool(tool);
        }
        Action::Click { tooth } => {
            configurator.click(tooth);
        }
        Action::SetState { tooth, state } => configurator.set_clinical_state(tooth, state),
        Action::Implant {
            tooth,
            brand,
            connection_system,
            platform,
            abutment_type,
            notes,
        } => {
            let patch = ImplantDetailPatch {
                brand: input_patch(brand),
                connection_system: input_patch(connection_system),
                platform: input_patch(platform),
                abutment_type: input_patch(abutment_type),
                notes: input_patch(notes),
            };
            configurator.update_implant_detail(tooth, patch);
        }
        Action::Next => {
            // A refused advance is queued as a notice.
            let _ = configurator.next();
        }
        Action::Back => {
            configurator.back();
        }
        Action::GoTo { step } => {
            let Some(step) = Step::from_number(step) else {
                bail!("no wizard step {step}; expected 1 or 2");
            };
            configurator.go_to(step);
        }
        Action::SkipValidation { skip } => configurator.set_skip_validation(skip),
        Action::Assign {
            tooth,
            restoration_type,
        } => {
            configurator.assign_work(tooth, restoration_type);
        }
        Action::Bridge { start, end } => {
            // Refusals are queued as notices.
            let _ = configurator.create_bridge(start, end);
        }
        Action::Remove { tooth } => {
            configurator.remove_tooth(tooth);
        }
        Action::Bulk { group, fields } => {
            let group = resolve_group(configurator, group)?;
            let edits = fields.edits();
            if edits.is_empty() {
                bail!("bulk action sets no fields");
            }
            for edit in &edits {
                configurator.bulk_apply(&group, edit);
            }
        }
        Action::Merge { file } => {
            let path = base_dir.join(file);
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read suggestions: {}", path.display()))?;
            let suggestions = parse_suggestions(&json)
                .with_context(|| format!("invalid suggestions in {}", path.display()))?;
            configurator
                .merge_suggestions(suggestions)
                .with_context(|| format!("suggestions in {} rejected", path.display()))?;
        }
    }
    Ok(())
}

fn clinical_tool(state: ClinicalState) -> Result<ClinicalTool> {
    match state {
        ClinicalState::Missing => Ok(ClinicalTool::Missing),
        ClinicalState::Abutment => Ok(ClinicalTool::Abutment),
        ClinicalState::Implant => Ok(ClinicalTool::Implant),
        ClinicalState::Normal => bail!("there is no normal tool; omit `tool` to deselect"),
    }
}

fn input_patch(value: Option<String>) -> Patch<String> {
    value.map(Patch::from_input).unwrap_or_default()
}

fn resolve_group(configurator: &Configurator, spec: GroupSpec) -> Result<Group> {
    match (spec.cohort, spec.bridge_of, spec.teeth) {
        (Some(kind), None, None) => Ok(Group::Cohort(kind)),
        (None, Some(tooth), None) => {
            let bridge = configurator
                .plan()
                .bridge_for(tooth)
                .with_context(|| format!("tooth {tooth} is not part of a bridge"))?;
            Ok(Group::Bridge(bridge.id))
        }
        (None, None, Some(teeth)) => Ok(Group::Selection(teeth)),
        _ => bail!("bulk action needs exactly one of cohort, bridge_of, teeth"),
    }
}

/// Run the replay command.
pub fn run_replay(
    script_path: &Path,
    seed: Option<&Path>,
    output: Option<&Path>,
    format: PlanFormat,
    engine: EngineConfig,
) -> Result<()> {
    let contents = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script: {}", script_path.display()))?;
    let script = parse_script(&contents)?;

    let mut configurator = match seed {
        Some(path) => Configurator::from_plan(&plan_io::read_plan(path)?, engine),
        None => Configurator::new(engine),
    };

    let base_dir = script_path.parent().unwrap_or(Path::new("."));
    apply_script(&mut configurator, script, base_dir)?;

    for notice in configurator.take_notices() {
        eprintln!("{notice}");
    }
    tracing::info!(step = configurator.step().number(), "replay finished");

    let mut plan = configurator.snapshot();
    plan.meta.generated_at = Some(chrono::Utc::now());
    plan_io::write_plan(&plan, format, output)
}
