//! Consistency checks for a flattened [`Plan`].
//!
//! Plans built through the stores satisfy these by construction; plans
//! received from outside (an existing order, a hand-edited file) may not.
//! Checks:
//! - No tooth appears twice in the clinical, implant, or assignment lists.
//! - Implant records belong to implant teeth.
//! - Standalone work is never assigned to a missing tooth.
//! - Every bridge resolves to a same-arch span of at least two teeth.
//! - Every span tooth has a `Bridge` assignment, and every `Bridge`
//!   assignment lies in some bridge's span.
//! - Bridges do not overlap, and pontics are the inner missing teeth.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use dentplan_model::{ClinicalState, Plan, RestorationType, ToothId};
use thiserror::Error;
use uuid::Uuid;

use crate::topology::resolve_range;

/// A violated plan invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanValidationError {
    #[error("tooth {0} has more than one clinical entry")]
    DuplicateClinicalEntry(ToothId),

    #[error("tooth {0} has more than one assignment")]
    DuplicateAssignment(ToothId),

    #[error("tooth {0} has more than one implant record")]
    DuplicateImplantRecord(ToothId),

    #[error("tooth {0} has an implant record but is not marked as implant")]
    ImplantWithoutState(ToothId),

    #[error("tooth {0} is missing but has standalone work assigned")]
    WorkOnMissingTooth(ToothId),

    #[error("bridge id {0} is used more than once")]
    DuplicateBridgeId(Uuid),

    #[error("bridge {id} joins {start} and {end}, which are in different arches")]
    BridgeCrossArch { id: Uuid, start: ToothId, end: ToothId },

    #[error("bridge {id} spans a single tooth ({start})")]
    BridgeDegenerate { id: Uuid, start: ToothId },

    #[error("tooth {tooth} is in bridge {bridge} but has no bridge assignment")]
    BridgeMemberUnassigned { bridge: Uuid, tooth: ToothId },

    #[error("tooth {tooth} is in bridge {bridge} but is assigned {found}")]
    BridgeMemberWrongType {
        bridge: Uuid,
        tooth: ToothId,
        found: RestorationType,
    },

    #[error("tooth {0} has a bridge assignment but belongs to no bridge")]
    OrphanBridgeAssignment(ToothId),

    #[error("tooth {tooth} belongs to both bridge {first} and bridge {second}")]
    OverlappingBridges {
        tooth: ToothId,
        first: Uuid,
        second: Uuid,
    },

    #[error("bridge {bridge} lists pontics {found:?}, expected {expected:?}")]
    PonticMismatch {
        bridge: Uuid,
        expected: Vec<ToothId>,
        found: Vec<ToothId>,
    },
}

/// Validate `plan`, returning the first violation found.
pub fn validate_plan(plan: &Plan) -> Result<(), PlanValidationError> {
    match plan_issues(plan).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every violation in `plan`, in check order.
pub fn plan_issues(plan: &Plan) -> Vec<PlanValidationError> {
    let mut issues = Vec::new();

    // Duplicates.
    let mut states: BTreeMap<ToothId, ClinicalState> = BTreeMap::new();
    for entry in &plan.clinical {
        if states.insert(entry.tooth, entry.state).is_some() {
            issues.push(PlanValidationError::DuplicateClinicalEntry(entry.tooth));
        }
    }
    let state_of = |tooth: ToothId| {
        states
            .get(&tooth)
            .copied()
            .unwrap_or(ClinicalState::Normal)
    };

    let mut implant_teeth = HashSet::new();
    for detail in &plan.implants {
        if !implant_teeth.insert(detail.tooth) {
            issues.push(PlanValidationError::DuplicateImplantRecord(detail.tooth));
        }
        if state_of(detail.tooth) != ClinicalState::Implant {
            issues.push(PlanValidationError::ImplantWithoutState(detail.tooth));
        }
    }

    let mut assignments: BTreeMap<ToothId, RestorationType> = BTreeMap::new();
    for a in &plan.assignments {
        if assignments.insert(a.tooth, a.restoration_type).is_some() {
            issues.push(PlanValidationError::DuplicateAssignment(a.tooth));
        }
        if a.restoration_type != RestorationType::Bridge
            && state_of(a.tooth) == ClinicalState::Missing
        {
            issues.push(PlanValidationError::WorkOnMissingTooth(a.tooth));
        }
    }

    // Bridges.
    let mut seen_ids = HashSet::new();
    let mut owner: BTreeMap<ToothId, Uuid> = BTreeMap::new();
    for bridge in &plan.bridges {
        if !seen_ids.insert(bridge.id) {
            issues.push(PlanValidationError::DuplicateBridgeId(bridge.id));
        }

        let Some(span) = resolve_range(bridge.start, bridge.end) else {
            issues.push(PlanValidationError::BridgeCrossArch {
                id: bridge.id,
                start: bridge.start,
                end: bridge.end,
            });
            continue;
        };
        if span.len() < 2 {
            issues.push(PlanValidationError::BridgeDegenerate {
                id: bridge.id,
                start: bridge.start,
            });
            continue;
        }

        for tooth in &span {
            if let Some(first) = owner.insert(*tooth, bridge.id) {
                if first != bridge.id {
                    issues.push(PlanValidationError::OverlappingBridges {
                        tooth: *tooth,
                        first,
                        second: bridge.id,
                    });
                }
            }
            match assignments.get(tooth) {
                None => issues.push(PlanValidationError::BridgeMemberUnassigned {
                    bridge: bridge.id,
                    tooth: *tooth,
                }),
                Some(RestorationType::Bridge) => {}
                Some(other) => issues.push(PlanValidationError::BridgeMemberWrongType {
                    bridge: bridge.id,
                    tooth: *tooth,
                    found: *other,
                }),
            }
        }

        let expected: Vec<ToothId> = span[1..span.len() - 1]
            .iter()
            .copied()
            .filter(|t| state_of(*t) == ClinicalState::Missing)
            .collect();
        let expected_set: BTreeSet<ToothId> = expected.iter().copied().collect();
        let found_set: BTreeSet<ToothId> = bridge.pontics.iter().copied().collect();
        if expected_set != found_set {
            issues.push(PlanValidationError::PonticMismatch {
                bridge: bridge.id,
                expected,
                found: bridge.pontics.clone(),
            });
        }
    }

    for (tooth, kind) in &assignments {
        if *kind == RestorationType::Bridge && !owner.contains_key(tooth) {
            issues.push(PlanValidationError::OrphanBridgeAssignment(*tooth));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use dentplan_model::{BridgeDefinition, ClinicalEntry, ImplantDetail, RestorationAssignment};

    use super::*;

    fn t(code: u8) -> ToothId {
        ToothId::try_from(code).unwrap()
    }

    fn bridge_plan() -> Plan {
        Plan {
            clinical: vec![ClinicalEntry {
                tooth: t(15),
                state: ClinicalState::Missing,
            }],
            assignments: [14, 15, 16]
                .into_iter()
                .map(|c| RestorationAssignment::new(t(c), RestorationType::Bridge))
                .collect(),
            bridges: vec![BridgeDefinition {
                id: Uuid::new_v4(),
                start: t(14),
                end: t(16),
                pontics: vec![t(15)],
            }],
            ..Plan::default()
        }
    }

    #[test]
    fn consistent_plan_passes() {
        assert!(validate_plan(&Plan::default()).is_ok());
        assert!(validate_plan(&bridge_plan()).is_ok());
    }

    #[test]
    fn unassigned_member_detected() {
        let mut plan = bridge_plan();
        plan.assignments.retain(|a| a.tooth != t(15));
        let id = plan.bridges[0].id;
        assert_eq!(
            validate_plan(&plan),
            Err(PlanValidationError::BridgeMemberUnassigned {
                bridge: id,
                tooth: t(15)
            })
        );
    }

    #[test]
    fn standalone_and_bridge_conflict_detected() {
        let mut plan = bridge_plan();
        for a in &mut plan.assignments {
            if a.tooth == t(16) {
                a.restoration_type = RestorationType::Crown;
            }
        }
        assert!(plan_issues(&plan).iter().any(|e| matches!(
            e,
            PlanValidationError::BridgeMemberWrongType { tooth, .. } if *tooth == t(16)
        )));
    }

    #[test]
    fn cross_arch_and_pontic_mismatch_detected() {
        let mut plan = bridge_plan();
        plan.bridges[0].pontics.clear();
        plan.bridges.push(BridgeDefinition {
            id: Uuid::new_v4(),
            start: t(24),
            end: t(34),
            pontics: vec![],
        });
        let issues = plan_issues(&plan);
        assert!(issues
            .iter()
            .any(|e| matches!(e, PlanValidationError::PonticMismatch { .. })));
        assert!(issues
            .iter()
            .any(|e| matches!(e, PlanValidationError::BridgeCrossArch { .. })));
    }

    #[test]
    fn orphan_bridge_assignment_and_implant_without_state() {
        let plan = Plan {
            assignments: vec![RestorationAssignment::new(t(21), RestorationType::Bridge)],
            implants: vec![ImplantDetail::empty(t(22))],
            ..Plan::default()
        };
        let issues = plan_issues(&plan);
        assert!(issues.contains(&PlanValidationError::ImplantWithoutState(t(22))));
        assert!(issues.contains(&PlanValidationError::OrphanBridgeAssignment(t(21))));
    }

    #[test]
    fn overlap_detected() {
        let mut plan = bridge_plan();
        plan.assignments
            .push(RestorationAssignment::new(t(17), RestorationType::Bridge));
        plan.bridges.push(BridgeDefinition {
            id: Uuid::new_v4(),
            start: t(16),
            end: t(17),
            pontics: vec![],
        });
        let overlaps = plan_issues(&plan).into_iter().any(|e| {
            matches!(e, PlanValidationError::OverlappingBridges { tooth, .. } if tooth == t(16))
        });
        assert!(overlaps);
    }
}
