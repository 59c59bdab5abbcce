//! Derived completeness signals for the surrounding form.
//!
//! Everything here is recomputed from the stores on every call.

use dentplan_model::{ImplantField, RestorationAssignment, ToothId};

use crate::clinical::ClinicalStateStore;
use crate::plan::PlanStore;

/// Configuration status of one tooth in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToothStatus {
    /// Material and shade chosen.
    Configured,
    MissingMaterial,
    MissingShade,
    /// Neither material nor shade chosen.
    Unconfigured,
}

impl ToothStatus {
    pub fn of(assignment: &RestorationAssignment) -> Self {
        let has_material = assignment
            .material
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        let has_shade = !assignment.shade.is_empty();
        match (has_material, has_shade) {
            (true, true) => Self::Configured,
            (false, true) => Self::MissingMaterial,
            (true, false) => Self::MissingShade,
            (false, false) => Self::Unconfigured,
        }
    }
}

/// Counts and lists the form renders as warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletenessReport {
    /// Teeth with work assigned, in traversal order.
    pub teeth_in_plan: Vec<ToothId>,
    /// Status of each tooth in `teeth_in_plan`, same order.
    pub tooth_status: Vec<(ToothId, ToothStatus)>,
    /// Teeth in the plan that are not fully configured.
    pub unconfigured: Vec<ToothId>,
    /// Implant teeth lacking required implant fields.
    pub incomplete_implants: Vec<(ToothId, Vec<ImplantField>)>,
    pub bridge_count: usize,
    pub pontic_count: usize,
    /// Step 1 may be left (implant data complete or override set).
    pub can_advance: bool,
}

impl CompletenessReport {
    /// Nothing left for the operator to fill in.
    pub fn is_complete(&self) -> bool {
        self.unconfigured.is_empty() && self.incomplete_implants.is_empty()
    }
}

/// Compute the completeness report for the current stores.
pub fn completeness(
    clinical: &ClinicalStateStore,
    plan: &PlanStore,
    required: &[ImplantField],
    skip_implant_validation: bool,
) -> CompletenessReport {
    let teeth_in_plan = plan.teeth_in_plan();
    let tooth_status: Vec<(ToothId, ToothStatus)> = teeth_in_plan
        .iter()
        .filter_map(|t| plan.assignment(*t).map(|a| (*t, ToothStatus::of(a))))
        .collect();
    let unconfigured = tooth_status
        .iter()
        .filter(|(_, s)| *s != ToothStatus::Configured)
        .map(|(t, _)| *t)
        .collect();
    let incomplete_implants = clinical.incomplete_implants(required);
    let can_advance = skip_implant_validation || incomplete_implants.is_empty();

    CompletenessReport {
        teeth_in_plan,
        tooth_status,
        unconfigured,
        incomplete_implants,
        bridge_count: plan.bridges().len(),
        pontic_count: plan.bridges().iter().map(|b| b.pontics.len()).sum(),
        can_advance,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dentplan_model::{AssignmentPatch, ClinicalState, RestorationType};

    use super::*;

    fn t(code: u8) -> ToothId {
        ToothId::try_from(code).unwrap()
    }

    #[test]
    fn empty_stores_are_complete() {
        let report = completeness(
            &ClinicalStateStore::new(),
            &PlanStore::new(),
            &ImplantField::DEFAULT_REQUIRED,
            false,
        );
        assert!(report.is_complete());
        assert!(report.can_advance);
        assert!(report.teeth_in_plan.is_empty());
    }

    #[test]
    fn statuses_and_counts() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(15), ClinicalState::Missing);
        clinical.set_state(t(26), ClinicalState::Implant);
        let mut plan = PlanStore::new();
        plan.create_bridge(t(14), t(16), &clinical).unwrap();
        plan.assign_work(t(26), RestorationType::Crown, &clinical);

        let mut patch = AssignmentPatch::material("Zirconia");
        patch.shade.shade_code = dentplan_model::Patch::Set("A2".into());
        plan.bulk_update(BTreeMap::from([(t(26), patch)]));
        plan.bulk_update(BTreeMap::from([(t(14), AssignmentPatch::material("PFM"))]));

        let report = completeness(&clinical, &plan, &ImplantField::DEFAULT_REQUIRED, false);
        assert_eq!(report.teeth_in_plan, vec![t(16), t(15), t(14), t(26)]);
        assert_eq!(report.bridge_count, 1);
        assert_eq!(report.pontic_count, 1);
        assert_eq!(report.unconfigured, vec![t(16), t(15), t(14)]);
        assert!(report
            .tooth_status
            .contains(&(t(14), ToothStatus::MissingShade)));
        assert!(report
            .tooth_status
            .contains(&(t(26), ToothStatus::Configured)));
        assert_eq!(report.incomplete_implants.len(), 1);
        assert!(!report.can_advance);

        let skipped = completeness(&clinical, &plan, &ImplantField::DEFAULT_REQUIRED, true);
        assert!(skipped.can_advance);
    }
}
