//! The two-step wizard state machine.
//!
//! ```text
//! InitialState --next()  [implant data complete or skip override]--> AssignWork
//! AssignWork   --back()  ------------------------------------------> InitialState
//! any          --go_to(step) (ungated) ----------------------------> step
//! ```
//!
//! The controller holds only transient UI state: the active step, the
//! step 2 work tool, the bridge tool's pending start, and the skip override.
//! The data it navigates lives in the stores.

use std::fmt;

use dentplan_model::{ImplantField, RestorationType, ToothId};
use thiserror::Error;
use tracing::{debug, info};

use crate::clinical::ClinicalStateStore;
use crate::plan::BridgeProtocol;

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Step 1: record each tooth's clinical state.
    InitialState,
    /// Step 2: assign restorative work.
    AssignWork,
}

impl Step {
    pub const ALL: [Step; 2] = [Self::InitialState, Self::AssignWork];

    /// 1-based position shown on the step indicator.
    pub fn number(self) -> u8 {
        match self {
            Self::InitialState => 1,
            Self::AssignWork => 2,
        }
    }

    /// The step at 1-based position `number`, if there is one.
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InitialState => "initial_state",
            Self::AssignWork => "assign_work",
        };
        f.write_str(s)
    }
}

/// Step 2 tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTool {
    /// Toggle standalone work of this type.
    Single(RestorationType),
    /// Two-click bridge assembly.
    Bridge,
}

impl fmt::Display for WorkTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(kind) => fmt::Display::fmt(kind, f),
            Self::Bridge => f.write_str("bridge"),
        }
    }
}

/// Why step 1 cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepGateError {
    #[error("implant information incomplete: {}", describe_incomplete(.teeth))]
    IncompleteImplantData {
        teeth: Vec<(ToothId, Vec<ImplantField>)>,
    },
}

fn describe_incomplete(teeth: &[(ToothId, Vec<ImplantField>)]) -> String {
    teeth
        .iter()
        .map(|(tooth, fields)| {
            let names: Vec<String> = fields.iter().map(ToString::to_string).collect();
            format!("{tooth} lacks {}", names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Step, tool, and override state of the wizard.
#[derive(Debug, Clone)]
pub struct WizardController {
    step: Step,
    work_tool: Option<WorkTool>,
    bridge: BridgeProtocol,
    skip_implant_validation: bool,
}

impl WizardController {
    pub fn new(skip_implant_validation: bool) -> Self {
        Self {
            step: Step::InitialState,
            work_tool: None,
            bridge: BridgeProtocol::Idle,
            skip_implant_validation,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn work_tool(&self) -> Option<WorkTool> {
        self.work_tool
    }

    pub fn pending_bridge_start(&self) -> Option<ToothId> {
        self.bridge.pending()
    }

    pub fn bridge_protocol_mut(&mut self) -> &mut BridgeProtocol {
        &mut self.bridge
    }

    pub fn skip_implant_validation(&self) -> bool {
        self.skip_implant_validation
    }

    pub fn set_skip_implant_validation(&mut self, skip: bool) {
        self.skip_implant_validation = skip;
    }

    /// Select the step 2 tool. Any change abandons a pending bridge.
    pub fn select_work_tool(&mut self, tool: Option<WorkTool>) {
        if self.work_tool != tool {
            self.bridge.reset();
        }
        self.work_tool = tool;
    }

    /// Check whether step 1 may be left.
    pub fn check_gate(
        &self,
        clinical: &ClinicalStateStore,
        required: &[ImplantField],
    ) -> Result<(), StepGateError> {
        if self.skip_implant_validation {
            return Ok(());
        }
        let teeth = clinical.incomplete_implants(required);
        if teeth.is_empty() {
            Ok(())
        } else {
            Err(StepGateError::IncompleteImplantData { teeth })
        }
    }

    /// Advance from step 1 to step 2 if the gate allows it.
    ///
    /// In step 2 this does nothing. Only the step and the (transient)
    /// clinical tool change; no store data is touched.
    pub fn next(
        &mut self,
        clinical: &mut ClinicalStateStore,
        required: &[ImplantField],
    ) -> Result<Step, StepGateError> {
        if self.step == Step::AssignWork {
            return Ok(self.step);
        }
        self.check_gate(clinical, required)?;
        clinical.set_tool(None);
        self.step = Step::AssignWork;
        info!("wizard advanced to step 2");
        Ok(self.step)
    }

    /// Return to step 1, dropping the work tool and any pending bridge.
    pub fn back(&mut self) -> Step {
        self.clear_work_selection();
        self.step = Step::InitialState;
        debug!("wizard returned to step 1");
        self.step
    }

    /// Jump straight to `step` from the step indicator.
    ///
    /// Never gated. The other step's tool selection is cleared.
    pub fn go_to(&mut self, step: Step, clinical: &mut ClinicalStateStore) -> Step {
        match step {
            Step::InitialState => self.clear_work_selection(),
            Step::AssignWork => clinical.set_tool(None),
        }
        self.step = step;
        debug!(%step, "wizard jumped to step");
        self.step
    }

    fn clear_work_selection(&mut self) {
        self.work_tool = None;
        self.bridge.reset();
    }
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use dentplan_model::{ClinicalState, ImplantDetailPatch, Patch};

    use super::*;
    use crate::clinical::ClinicalTool;

    fn t(code: u8) -> ToothId {
        ToothId::try_from(code).unwrap()
    }

    fn required() -> Vec<ImplantField> {
        ImplantField::DEFAULT_REQUIRED.to_vec()
    }

    #[test]
    fn step_numbers_roundtrip() {
        for step in Step::ALL {
            assert_eq!(Step::from_number(step.number()), Some(step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(3), None);
    }

    #[test]
    fn starts_in_step_one() {
        let wizard = WizardController::default();
        assert_eq!(wizard.step(), Step::InitialState);
        assert_eq!(wizard.work_tool(), None);
    }

    #[test]
    fn gate_blocks_incomplete_implant() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(36), ClinicalState::Implant);
        let mut wizard = WizardController::default();

        let err = wizard.next(&mut clinical, &required()).unwrap_err();
        assert_eq!(
            err,
            StepGateError::IncompleteImplantData {
                teeth: vec![(t(36), required())]
            }
        );
        assert_eq!(wizard.step(), Step::InitialState);
        assert!(err.to_string().contains("36 lacks brand, connection_system"));
    }

    #[test]
    fn gate_passes_with_override() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(36), ClinicalState::Implant);
        let mut wizard = WizardController::default();
        wizard.set_skip_implant_validation(true);
        assert_eq!(wizard.next(&mut clinical, &required()), Ok(Step::AssignWork));
    }

    #[test]
    fn gate_passes_once_fields_filled() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(36), ClinicalState::Implant);
        clinical.update_implant_detail(
            t(36),
            ImplantDetailPatch {
                brand: Patch::Set("Straumann".into()),
                connection_system: Patch::Set("CrossFit".into()),
                ..Default::default()
            },
        );
        let mut wizard = WizardController::default();
        assert_eq!(wizard.next(&mut clinical, &required()), Ok(Step::AssignWork));
    }

    #[test]
    fn back_clears_work_tool_and_pending_bridge() {
        let mut clinical = ClinicalStateStore::new();
        let mut wizard = WizardController::default();
        wizard.next(&mut clinical, &required()).unwrap();
        wizard.select_work_tool(Some(WorkTool::Bridge));
        wizard.bridge_protocol_mut().click(t(14));
        assert_eq!(wizard.pending_bridge_start(), Some(t(14)));

        assert_eq!(wizard.back(), Step::InitialState);
        assert_eq!(wizard.work_tool(), None);
        assert_eq!(wizard.pending_bridge_start(), None);
    }

    #[test]
    fn go_to_is_ungated_and_clears_other_tool() {
        let mut clinical = ClinicalStateStore::new();
        clinical.set_state(t(36), ClinicalState::Implant);
        clinical.set_tool(Some(ClinicalTool::Missing));
        let mut wizard = WizardController::default();

        assert_eq!(wizard.go_to(Step::AssignWork, &mut clinical), Step::AssignWork);
        assert_eq!(clinical.tool(), None);

        wizard.select_work_tool(Some(WorkTool::Single(RestorationType::Crown)));
        wizard.go_to(Step::InitialState, &mut clinical);
        assert_eq!(wizard.work_tool(), None);
    }

    #[test]
    fn changing_tool_resets_bridge() {
        let mut wizard = WizardController::default();
        wizard.select_work_tool(Some(WorkTool::Bridge));
        wizard.bridge_protocol_mut().click(t(44));
        wizard.select_work_tool(Some(WorkTool::Bridge));
        assert_eq!(wizard.pending_bridge_start(), Some(t(44)));
        wizard.select_work_tool(Some(WorkTool::Single(RestorationType::Onlay)));
        assert_eq!(wizard.pending_bridge_start(), None);
    }
}
