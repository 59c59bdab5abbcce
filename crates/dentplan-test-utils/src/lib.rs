//! Shared fixtures for dentplan integration tests.
//!
//! Builders here go through the public engine API rather than poking at
//! store internals, so a fixture is always a state an operator could reach.

use dentplan_core::{Configurator, Step};
use dentplan_model::{
    BridgeDefinition, ClinicalEntry, ClinicalState, EngineConfig, ImplantDetail,
    ImplantDetailPatch, Patch, Plan, RestorationAssignment, RestorationType, ToothId,
};
use uuid::Uuid;

/// Tooth from its FDI code. Panics on an invalid code.
pub fn tooth(code: u8) -> ToothId {
    ToothId::try_from(code).unwrap_or_else(|e| panic!("bad fixture tooth {code}: {e}"))
}

/// Several teeth from their FDI codes.
pub fn teeth(codes: &[u8]) -> Vec<ToothId> {
    codes.iter().map(|c| tooth(*c)).collect()
}

/// A configurator with default engine config and the given clinical states
/// already recorded. Still in step 1.
pub fn configurator_with(states: &[(u8, ClinicalState)]) -> Configurator {
    let mut c = Configurator::new(EngineConfig::new());
    for (code, state) in states {
        c.set_clinical_state(tooth(*code), *state);
    }
    c
}

/// Like [`configurator_with`], but already moved to step 2 without the gate.
pub fn configurator_in_step_two(states: &[(u8, ClinicalState)]) -> Configurator {
    let mut c = configurator_with(states);
    c.go_to(Step::AssignWork);
    c
}

/// Implant patch with the default required fields filled in.
pub fn complete_implant_patch(brand: &str, connection: &str) -> ImplantDetailPatch {
    ImplantDetailPatch {
        brand: Patch::Set(brand.to_owned()),
        connection_system: Patch::Set(connection.to_owned()),
        ..Default::default()
    }
}

/// A consistent plan: 14-16 bridge with 15 missing, an implant crown on 36.
pub fn sample_plan() -> Plan {
    let implant = ImplantDetail {
        brand: Some("Straumann".into()),
        connection_system: Some("CrossFit".into()),
        ..ImplantDetail::empty(tooth(36))
    };
    let mut assignments: Vec<RestorationAssignment> = [14, 15, 16]
        .iter()
        .map(|c| RestorationAssignment::new(tooth(*c), RestorationType::Bridge))
        .collect();
    let mut crown = RestorationAssignment::new(tooth(36), RestorationType::Crown)
        .with_implant(implant.clone());
    crown.material = Some("Zirconia".into());
    assignments.push(crown);

    Plan {
        clinical: vec![
            ClinicalEntry {
                tooth: tooth(15),
                state: ClinicalState::Missing,
            },
            ClinicalEntry {
                tooth: tooth(36),
                state: ClinicalState::Implant,
            },
        ],
        implants: vec![implant],
        assignments,
        bridges: vec![BridgeDefinition {
            id: Uuid::new_v4(),
            start: tooth(14),
            end: tooth(16),
            pontics: vec![tooth(15)],
        }],
        ..Plan::default()
    }
}
