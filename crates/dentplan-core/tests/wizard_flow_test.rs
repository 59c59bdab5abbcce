//! End-to-end wizard flows through the configurator facade.

use dentplan_core::{
    BulkEdit, ClickOutcome, ClinicalTool, Group, Step, StepGateError, ToggleOutcome, WorkTool,
};
use dentplan_model::{ClinicalState, ImplantDetailPatch, ImplantField, Patch, RestorationType};
use dentplan_test_utils::{complete_implant_patch, configurator_with, tooth};

#[test]
fn gate_blocks_then_override_passes_without_touching_data() {
    let mut c = configurator_with(&[(36, ClinicalState::Implant), (15, ClinicalState::Missing)]);
    c.update_implant_detail(
        tooth(36),
        ImplantDetailPatch {
            connection_system: Patch::Set("Internal hex".into()),
            ..Default::default()
        },
    );
    let before = c.snapshot();

    let err = c.next().unwrap_err();
    assert_eq!(
        err,
        StepGateError::IncompleteImplantData {
            teeth: vec![(tooth(36), vec![ImplantField::Brand])]
        }
    );
    assert_eq!(c.step(), Step::InitialState);

    c.set_skip_validation(true);
    assert_eq!(c.next(), Ok(Step::AssignWork));
    assert_eq!(c.snapshot(), before);
}

#[test]
fn full_session_produces_consistent_plan() {
    let mut c = configurator_with(&[]);
    c.set_clinical_tool(Some(ClinicalTool::Implant));
    assert_eq!(
        c.click(tooth(46)),
        ClickOutcome::Clinical(ToggleOutcome::Set(ClinicalState::Implant))
    );
    c.update_implant_detail(tooth(46), complete_implant_patch("Nobel", "Conical"));
    c.set_clinical_tool(Some(ClinicalTool::Missing));
    c.click(tooth(25));
    c.next().unwrap();
    assert_eq!(c.clinical().tool(), None);

    c.select_work_tool(Some(WorkTool::Single(RestorationType::Crown)));
    c.click(tooth(46));
    c.click(tooth(11));
    c.select_work_tool(Some(WorkTool::Bridge));
    c.click(tooth(24));
    c.click(tooth(26));

    c.bulk_apply(
        &Group::Cohort(RestorationType::Crown),
        &BulkEdit::Material("Zirconia".into()),
    );
    c.bulk_apply(
        &Group::Cohort(RestorationType::Crown),
        &BulkEdit::ShadeCode("A2".into()),
    );

    let plan = c.snapshot();
    dentplan_core::validate_plan(&plan).unwrap();

    let crown = plan
        .assignments
        .iter()
        .find(|a| a.tooth == tooth(46))
        .unwrap();
    assert!(crown.implant_work);
    assert_eq!(
        crown.implant.as_ref().and_then(|d| d.brand.as_deref()),
        Some("Nobel")
    );
    assert_eq!(plan.bridges.len(), 1);
    assert_eq!(plan.bridges[0].pontics, vec![tooth(25)]);

    let report = c.completeness();
    assert_eq!(report.bridge_count, 1);
    assert_eq!(report.pontic_count, 1);
    assert_eq!(
        report.unconfigured,
        vec![tooth(24), tooth(25), tooth(26)]
    );
    assert!(report.can_advance);
}

#[test]
fn back_and_go_to_clear_transient_tools() {
    let mut c = configurator_with(&[]);
    c.go_to(Step::AssignWork);
    c.select_work_tool(Some(WorkTool::Bridge));
    c.click(tooth(33));
    assert_eq!(c.wizard().pending_bridge_start(), Some(tooth(33)));

    c.back();
    assert_eq!(c.wizard().work_tool(), None);
    assert_eq!(c.wizard().pending_bridge_start(), None);

    c.set_clinical_tool(Some(ClinicalTool::Abutment));
    c.go_to(Step::AssignWork);
    assert_eq!(c.clinical().tool(), None);
}

#[test]
fn implant_edit_in_step_one_reaches_assigned_work() {
    let mut c = configurator_with(&[(21, ClinicalState::Implant)]);
    c.go_to(Step::AssignWork);
    c.assign_work(tooth(21), RestorationType::Crown);
    c.go_to(Step::InitialState);
    c.update_implant_detail(tooth(21), complete_implant_patch("Astra", "Conical"));

    let a = c.plan().assignment(tooth(21)).unwrap();
    assert_eq!(
        a.implant.as_ref().and_then(|d| d.connection_system.as_deref()),
        Some("Conical")
    );
}
