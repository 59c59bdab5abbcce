//! Bulk editing of material, shade and extras across a group of teeth.
//!
//! A group is either every standalone tooth of one restoration type, every
//! tooth of one bridge, or an explicit selection. The editor shows the
//! group's consensus and writes one edited field to every member at once,
//! leaving the members' other fields (their per-tooth overrides) alone.

use std::collections::BTreeMap;

use dentplan_model::{AssignmentPatch, Patch, RestorationType, ShadePatch, ShadeSpec, ToothId};
use tracing::debug;
use uuid::Uuid;

use crate::consensus::{GroupState, derive_group_state};
use crate::plan::{BulkReport, PlanStore, bridge_span};

/// A set of teeth edited together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    /// Standalone teeth of one restoration type.
    Cohort(RestorationType),
    /// Every tooth in a bridge's span.
    Bridge(Uuid),
    /// Explicitly chosen teeth.
    Selection(Vec<ToothId>),
}

/// Shade zone for layered shades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadeZone {
    Cervical,
    Body,
    Incisal,
}

/// One edited field. Blank text clears the field on every member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkEdit {
    Material(String),
    ShadeType(String),
    ShadeCode(String),
    Zone(ShadeZone, String),
    Provisional(bool),
    Jig(bool),
}

impl BulkEdit {
    /// The patch that writes this edit and nothing else.
    pub fn to_patch(&self) -> AssignmentPatch {
        match self {
            Self::Material(value) => AssignmentPatch::material(value.as_str()),
            Self::ShadeType(value) => shade_patch(ShadePatch {
                shade_type: Patch::from_input(value.as_str()),
                ..ShadePatch::default()
            }),
            Self::ShadeCode(value) => shade_patch(ShadePatch {
                shade_code: Patch::from_input(value.as_str()),
                ..ShadePatch::default()
            }),
            Self::Zone(zone, value) => {
                let patch = Patch::from_input(value.as_str());
                let shade = match zone {
                    ShadeZone::Cervical => ShadePatch {
                        cervical: patch,
                        ..ShadePatch::default()
                    },
                    ShadeZone::Body => ShadePatch {
                        body: patch,
                        ..ShadePatch::default()
                    },
                    ShadeZone::Incisal => ShadePatch {
                        incisal: patch,
                        ..ShadePatch::default()
                    },
                };
                shade_patch(shade)
            }
            Self::Provisional(flag) => AssignmentPatch {
                provisional: Some(*flag),
                ..AssignmentPatch::default()
            },
            Self::Jig(flag) => AssignmentPatch {
                jig: Some(*flag),
                ..AssignmentPatch::default()
            },
        }
    }
}

fn shade_patch(shade: ShadePatch) -> AssignmentPatch {
    AssignmentPatch {
        shade,
        ..AssignmentPatch::default()
    }
}

/// Stateless coordinator between groups, consensus, and the plan store.
pub struct BulkEditCoordinator;

impl BulkEditCoordinator {
    /// Teeth of `group` as currently defined by the plan.
    ///
    /// A selection is returned as given, stale teeth included; an unknown
    /// bridge has no members.
    pub fn members(plan: &PlanStore, group: &Group) -> Vec<ToothId> {
        match group {
            Group::Cohort(kind) => plan.cohort(*kind),
            Group::Bridge(id) => plan.bridge(*id).map(bridge_span).unwrap_or_default(),
            Group::Selection(teeth) => teeth.clone(),
        }
    }

    /// Consensus of the group's current members.
    pub fn group_state(plan: &PlanStore, group: &Group) -> GroupState {
        let assignments: Vec<_> = Self::members(plan, group)
            .into_iter()
            .filter_map(|t| plan.assignment(t))
            .collect();
        let materials: Vec<&str> = assignments
            .iter()
            .map(|a| a.material.as_deref().unwrap_or(""))
            .collect();
        let shades: Vec<ShadeSpec> = assignments.iter().map(|a| a.shade.clone()).collect();
        derive_group_state(&materials, &shades)
    }

    /// Write `edit` to every member of `group` in one store update.
    pub fn apply(plan: &mut PlanStore, group: &Group, edit: &BulkEdit) -> BulkReport {
        let patch = edit.to_patch();
        let updates: BTreeMap<ToothId, AssignmentPatch> = Self::members(plan, group)
            .into_iter()
            .map(|t| (t, patch.clone()))
            .collect();
        let report = plan.bulk_update(updates);
        debug!(
            ?group,
            ?edit,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "bulk edit applied"
        );
        report
    }
}
