//! Step 2 store: restoration assignments and bridges.
//!
//! [`PlanStore`] owns the tooth -> [`RestorationAssignment`] map and the list
//! of [`BridgeDefinition`]s. Bridge membership is never cached: it is
//! recomputed from each bridge's endpoints whenever it is needed, since a
//! single bridge change can move many teeth at once.

pub mod bridge;
pub mod validate;

use std::collections::BTreeMap;

use dentplan_model::{
    AssignmentPatch, BridgeDefinition, ClinicalState, ImplantDetail, RestorationAssignment,
    RestorationType, ToothId,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clinical::ClinicalStateStore;
use crate::topology::{resolve_range, sort_anatomically};

pub use bridge::{BridgeClick, BridgeError, BridgeProtocol, build_bridge, derive_pontics};
pub use validate::{PlanValidationError, plan_issues, validate_plan};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a direct assignment was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignRejection {
    #[error("tooth {0} is missing; missing teeth can only be bridge pontics")]
    MissingTooth(ToothId),

    #[error("tooth {tooth} is part of bridge {bridge}; remove the bridge first")]
    BridgeMember { tooth: ToothId, bridge: Uuid },

    #[error("bridge work on tooth {0} must be created with the bridge tool")]
    BridgeType(ToothId),
}

/// Result of [`PlanStore::assign_work`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// A new assignment was created.
    Assigned,
    /// The tooth's existing assignment changed to the new type.
    Retyped { previous: RestorationType },
    /// The same type was clicked again; the assignment is gone.
    Removed,
    /// Nothing changed.
    Rejected(AssignRejection),
}

/// Result of [`PlanStore::remove_tooth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The tooth was a bridge member; the whole bridge went.
    Bridge { id: Uuid, teeth: Vec<ToothId> },
    /// A standalone assignment was removed.
    Single,
    /// The tooth had no work assigned.
    NotInPlan,
}

/// Result of [`PlanStore::bulk_update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub updated: Vec<ToothId>,
    /// Teeth named in the update that no longer have an assignment.
    pub skipped: Vec<ToothId>,
}

// ---------------------------------------------------------------------------
// PlanStore
// ---------------------------------------------------------------------------

/// Assignments and bridges of the plan under construction.
#[derive(Debug, Clone, Default)]
pub struct PlanStore {
    assignments: BTreeMap<ToothId, RestorationAssignment>,
    bridges: Vec<BridgeDefinition>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle standalone work of `kind` on `tooth`.
    ///
    /// - Missing teeth, bridge members, and the `Bridge` type are refused.
    /// - No assignment yet: one is created.
    /// - Same type already assigned: the assignment is removed.
    /// - Another type assigned: the type changes, material and shade stay.
    ///
    /// Implant teeth get the implant flag and a copy of their record.
    pub fn assign_work(
        &mut self,
        tooth: ToothId,
        kind: RestorationType,
        clinical: &ClinicalStateStore,
    ) -> AssignOutcome {
        if let Err(rejection) = self.check_standalone(tooth, kind, clinical) {
            warn!(%tooth, %kind, "assignment rejected: {rejection}");
            return AssignOutcome::Rejected(rejection);
        }

        let current = self.assignments.get(&tooth).map(|a| a.restoration_type);
        match current {
            Some(previous) if previous == kind => {
                self.assignments.remove(&tooth);
                debug!(%tooth, %kind, "assignment removed");
                AssignOutcome::Removed
            }
            Some(previous) => {
                if let Some(existing) = self.assignments.get_mut(&tooth) {
                    existing.restoration_type = kind;
                }
                debug!(%tooth, from = %previous, to = %kind, "assignment retyped");
                AssignOutcome::Retyped { previous }
            }
            None => {
                let assignment = with_clinical_implant(
                    RestorationAssignment::new(tooth, kind),
                    clinical,
                );
                self.assignments.insert(tooth, assignment);
                debug!(%tooth, %kind, "assignment created");
                AssignOutcome::Assigned
            }
        }
    }

    /// Insert or wholesale replace the standalone assignment of a tooth.
    ///
    /// Applies the same rules as [`Self::assign_work`] but never toggles.
    pub fn upsert_assignment(
        &mut self,
        assignment: RestorationAssignment,
        clinical: &ClinicalStateStore,
    ) -> Result<(), AssignRejection> {
        self.check_standalone(assignment.tooth, assignment.restoration_type, clinical)?;
        self.assignments.insert(assignment.tooth, assignment);
        Ok(())
    }

    fn check_standalone(
        &self,
        tooth: ToothId,
        kind: RestorationType,
        clinical: &ClinicalStateStore,
    ) -> Result<(), AssignRejection> {
        if kind == RestorationType::Bridge {
            return Err(AssignRejection::BridgeType(tooth));
        }
        if clinical.is_missing(tooth) {
            return Err(AssignRejection::MissingTooth(tooth));
        }
        if let Some(bridge) = self.bridge_for(tooth) {
            return Err(AssignRejection::BridgeMember {
                tooth,
                bridge: bridge.id,
            });
        }
        Ok(())
    }

    /// Create a bridge from `start` to `end`.
    ///
    /// Every tooth of the span gets a `Bridge` assignment, replacing any
    /// standalone work it had. Overlapping an existing bridge is refused.
    pub fn create_bridge(
        &mut self,
        start: ToothId,
        end: ToothId,
        clinical: &ClinicalStateStore,
    ) -> Result<BridgeDefinition, BridgeError> {
        let (bridge, span) = build_bridge(start, end, clinical)?;

        for tooth in &span {
            if let Some(existing) = self.bridge_for(*tooth) {
                return Err(BridgeError::Overlapping {
                    tooth: *tooth,
                    bridge: existing.id,
                });
            }
        }

        for tooth in &span {
            if let Some(previous) = self.assignments.get(tooth) {
                debug!(
                    %tooth,
                    previous = %previous.restoration_type,
                    "standalone work replaced by bridge"
                );
            }
            let assignment = with_clinical_implant(
                RestorationAssignment::new(*tooth, RestorationType::Bridge),
                clinical,
            );
            self.assignments.insert(*tooth, assignment);
        }

        debug!(
            id = %bridge.id,
            %start,
            %end,
            pontics = bridge.pontics.len(),
            "bridge created"
        );
        self.bridges.push(bridge.clone());
        Ok(bridge)
    }

    /// Remove the work on `tooth`. A bridge member takes its whole bridge
    /// with it.
    pub fn remove_tooth(&mut self, tooth: ToothId) -> RemoveOutcome {
        if let Some(id) = self.bridge_for(tooth).map(|b| b.id) {
            let teeth = self.remove_bridge(id).unwrap_or_default();
            return RemoveOutcome::Bridge { id, teeth };
        }
        match self.assignments.remove(&tooth) {
            Some(_) => {
                debug!(%tooth, "assignment removed");
                RemoveOutcome::Single
            }
            None => RemoveOutcome::NotInPlan,
        }
    }

    /// Remove a bridge and every assignment in its span.
    ///
    /// Returns the teeth that were freed, or `None` for an unknown id.
    pub fn remove_bridge(&mut self, id: Uuid) -> Option<Vec<ToothId>> {
        let idx = self.bridges.iter().position(|b| b.id == id)?;
        let bridge = self.bridges.remove(idx);
        let span = bridge_span(&bridge);
        for tooth in &span {
            self.assignments.remove(tooth);
        }
        debug!(%id, teeth = span.len(), "bridge removed");
        Some(span)
    }

    /// Merge each patch into its tooth's assignment in one pass.
    ///
    /// Teeth without an assignment are skipped and reported.
    pub fn bulk_update(&mut self, updates: BTreeMap<ToothId, AssignmentPatch>) -> BulkReport {
        let mut report = BulkReport::default();
        for (tooth, patch) in updates {
            match self.assignments.get_mut(&tooth) {
                Some(assignment) => {
                    patch.apply_to(assignment);
                    report.updated.push(tooth);
                }
                None => report.skipped.push(tooth),
            }
        }
        if !report.skipped.is_empty() {
            debug!(skipped = ?report.skipped, "bulk update skipped stale teeth");
        }
        report
    }

    /// Bring derived data back in line after clinical states changed.
    ///
    /// - Pontics of every bridge are recomputed.
    /// - Standalone work on teeth that are now missing is dropped.
    /// - Implant flags and records on assignments follow the clinical store,
    ///   which is authoritative for implant data.
    ///
    /// Returns the teeth whose standalone work was dropped.
    pub fn sync_with_clinical(&mut self, clinical: &ClinicalStateStore) -> Vec<ToothId> {
        for bridge in &mut self.bridges {
            let span = bridge_span(bridge);
            bridge.pontics = derive_pontics(&span, clinical);
        }

        let dropped: Vec<ToothId> = self
            .assignments
            .values()
            .filter(|a| {
                a.restoration_type != RestorationType::Bridge && clinical.is_missing(a.tooth)
            })
            .map(|a| a.tooth)
            .collect();
        for tooth in &dropped {
            self.assignments.remove(tooth);
        }

        for assignment in self.assignments.values_mut() {
            if clinical.state(assignment.tooth) == ClinicalState::Implant {
                assignment.implant_work = true;
                assignment.implant = clinical.implant_detail(assignment.tooth).cloned();
            } else {
                assignment.implant_work = false;
                assignment.implant = None;
            }
        }

        dropped
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn assignment(&self, tooth: ToothId) -> Option<&RestorationAssignment> {
        self.assignments.get(&tooth)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &RestorationAssignment> {
        self.assignments.values()
    }

    pub fn bridges(&self) -> &[BridgeDefinition] {
        &self.bridges
    }

    pub fn bridge(&self, id: Uuid) -> Option<&BridgeDefinition> {
        self.bridges.iter().find(|b| b.id == id)
    }

    /// Full span of the bridge with `id`, recomputed from its endpoints.
    pub fn bridge_span(&self, id: Uuid) -> Option<Vec<ToothId>> {
        self.bridge(id).map(bridge_span)
    }

    /// The bridge whose full span contains `tooth`, if any.
    pub fn bridge_for(&self, tooth: ToothId) -> Option<&BridgeDefinition> {
        self.bridges
            .iter()
            .find(|b| bridge_span(b).contains(&tooth))
    }

    /// Teeth with any work assigned, upper arch first, in traversal order.
    pub fn teeth_in_plan(&self) -> Vec<ToothId> {
        let mut teeth: Vec<ToothId> = self.assignments.keys().copied().collect();
        sort_anatomically(&mut teeth);
        teeth
    }

    /// Teeth carrying standalone work of `kind`, in traversal order.
    pub fn cohort(&self, kind: RestorationType) -> Vec<ToothId> {
        let mut teeth: Vec<ToothId> = self
            .assignments
            .values()
            .filter(|a| a.restoration_type == kind && self.bridge_for(a.tooth).is_none())
            .map(|a| a.tooth)
            .collect();
        sort_anatomically(&mut teeth);
        teeth
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.bridges.is_empty()
    }

    /// Flattened assignments (code order) and bridges (creation order).
    pub fn snapshot(&self) -> (Vec<RestorationAssignment>, Vec<BridgeDefinition>) {
        (
            self.assignments.values().cloned().collect(),
            self.bridges.clone(),
        )
    }

    /// Replace all assignments and bridges wholesale, verbatim.
    pub fn replace_all(
        &mut self,
        assignments: &[RestorationAssignment],
        bridges: &[BridgeDefinition],
    ) {
        self.assignments = assignments
            .iter()
            .map(|a| (a.tooth, a.clone()))
            .collect();
        self.bridges = bridges.to_vec();
    }
}

/// Full span of a bridge, endpoints included, in traversal order.
///
/// A corrupt definition whose endpoints do not resolve (e.g. one imported
/// across arches) is treated as spanning just its two endpoints.
pub fn bridge_span(bridge: &BridgeDefinition) -> Vec<ToothId> {
    resolve_range(bridge.start, bridge.end).unwrap_or_else(|| vec![bridge.start, bridge.end])
}

/// Flag implant work and attach the record when `assignment.tooth` is an
/// implant.
fn with_clinical_implant(
    assignment: RestorationAssignment,
    clinical: &ClinicalStateStore,
) -> RestorationAssignment {
    if clinical.state(assignment.tooth) != ClinicalState::Implant {
        return assignment;
    }
    let tooth = assignment.tooth;
    let detail = clinical
        .implant_detail(tooth)
        .cloned()
        .unwrap_or_else(|| ImplantDetail::empty(tooth));
    assignment.with_implant(detail)
}

#[cfg(test)]
mod tests {
    use dentplan_model::Patch;

    use super::*;

    fn t(code: u8) -> ToothId {
        ToothId::try_from(code).unwrap()
    }

    #[test]
    fn assign_toggle_and_retype() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();

        assert_eq!(
            plan.assign_work(t(11), RestorationType::Crown, &clinical),
            AssignOutcome::Assigned
        );
        plan.bulk_update(BTreeMap::from([(t(11), AssignmentPatch::material("E-max"))]));
        assert_eq!(
            plan.assign_work(t(11), RestorationType::Veneer, &clinical),
            AssignOutcome::Retyped {
                previous: RestorationType::Crown
            }
        );
        assert_eq!(
            plan.assignment(t(11)).and_then(|a| a.material.as_deref()),
            Some("E-max")
        );
        assert_eq!(
            plan.assign_work(t(11), RestorationType::Veneer, &clinical),
            AssignOutcome::Removed
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_tooth_cannot_take_direct_work() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(36), ClinicalState::Missing);
        let mut plan = PlanStore::new();
        assert_eq!(
            plan.assign_work(t(36), RestorationType::Crown, &clinical),
            AssignOutcome::Rejected(AssignRejection::MissingTooth(t(36)))
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn implant_tooth_carries_implant_record() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(46), ClinicalState::Implant);
        let mut plan = PlanStore::new();
        plan.assign_work(t(46), RestorationType::Crown, &clinical);
        let a = plan.assignment(t(46)).unwrap();
        assert!(a.implant_work);
        assert_eq!(a.implant.as_ref().map(|d| d.tooth), Some(t(46)));
    }

    #[test]
    fn bridge_replaces_standalone_work_in_span() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        plan.assign_work(t(15), RestorationType::Crown, &clinical);
        plan.create_bridge(t(14), t(16), &clinical).unwrap();
        assert_eq!(
            plan.assignment(t(15)).map(|a| a.restoration_type),
            Some(RestorationType::Bridge)
        );
        assert!(plan.cohort(RestorationType::Crown).is_empty());
    }

    #[test]
    fn overlapping_bridge_refused() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        let first = plan.create_bridge(t(14), t(16), &clinical).unwrap();
        let err = plan.create_bridge(t(13), t(15), &clinical).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Overlapping {
                tooth: t(15),
                bridge: first.id
            }
        );
        assert_eq!(plan.bridges().len(), 1);
        assert!(plan.assignment(t(13)).is_none());
    }

    #[test]
    fn bridge_members_refuse_standalone_work() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        let bridge = plan.create_bridge(t(34), t(36), &clinical).unwrap();
        assert_eq!(
            plan.assign_work(t(35), RestorationType::Crown, &clinical),
            AssignOutcome::Rejected(AssignRejection::BridgeMember {
                tooth: t(35),
                bridge: bridge.id
            })
        );
    }

    #[test]
    fn removing_inner_member_removes_bridge() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        let bridge = plan.create_bridge(t(13), t(16), &clinical).unwrap();
        match plan.remove_tooth(t(14)) {
            RemoveOutcome::Bridge { id, teeth } => {
                assert_eq!(id, bridge.id);
                assert_eq!(teeth.len(), 4);
            }
            other => panic!("expected bridge removal, got {other:?}"),
        }
        assert!(plan.is_empty());
    }

    #[test]
    fn remove_unknown_bridge_is_none() {
        let mut plan = PlanStore::new();
        assert_eq!(plan.remove_bridge(Uuid::new_v4()), None);
        assert_eq!(plan.remove_tooth(t(11)), RemoveOutcome::NotInPlan);
    }

    #[test]
    fn bulk_update_skips_stale_teeth() {
        let clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        plan.assign_work(t(21), RestorationType::Crown, &clinical);
        let report = plan.bulk_update(BTreeMap::from([
            (t(21), AssignmentPatch::material("Zirconia")),
            (t(22), AssignmentPatch::material("Zirconia")),
        ]));
        assert_eq!(report.updated, vec![t(21)]);
        assert_eq!(report.skipped, vec![t(22)]);
        assert!(plan.assignment(t(22)).is_none());
    }

    #[test]
    fn sync_recomputes_pontics_and_drops_missing_work() {
        let mut clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        plan.create_bridge(t(44), t(46), &clinical).unwrap();
        plan.assign_work(t(31), RestorationType::Crown, &clinical);
        assert!(plan.bridges()[0].pontics.is_empty());

        clinical.set_state(t(45), ClinicalState::Missing);
        clinical.set_state(t(31), ClinicalState::Missing);
        let dropped = plan.sync_with_clinical(&clinical);

        assert_eq!(dropped, vec![t(31)]);
        assert_eq!(plan.bridges()[0].pontics, vec![t(45)]);
    }

    #[test]
    fn sync_tracks_implant_changes() {
        let mut clinical = ClinicalStateStore::new();
        let mut plan = PlanStore::new();
        plan.assign_work(t(26), RestorationType::Crown, &clinical);

        clinical.set_state(t(26), ClinicalState::Implant);
        clinical.update_implant_detail(
            t(26),
            dentplan_model::ImplantDetailPatch {
                brand: Patch::Set("Nobel".into()),
                ..Default::default()
            },
        );
        plan.sync_with_clinical(&clinical);
        let a = plan.assignment(t(26)).unwrap();
        assert!(a.implant_work);
        assert_eq!(a.implant.as_ref().and_then(|d| d.brand.as_deref()), Some("Nobel"));

        clinical.set_state(t(26), ClinicalState::Normal);
        plan.sync_with_clinical(&clinical);
        assert!(!plan.assignment(t(26)).unwrap().implant_work);
    }
}
