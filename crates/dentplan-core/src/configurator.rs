//! The configurator facade.
//!
//! [`Configurator`] owns both stores, the wizard controller, and the notice
//! queue, and is the single entry point the surrounding form talks to. Every
//! operator action is one `&mut self` call; rejected actions leave a
//! [`Notice`] behind instead of returning an error, except where the caller
//! needs to branch on the failure (step navigation, suggestion import).

use std::collections::BTreeMap;

use dentplan_model::{
    AssignmentPatch, BridgeDefinition, ClinicalState, EngineConfig, ImplantDetailPatch, Plan,
    PlanMeta, RestorationType, ToothId,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bulk::{BulkEdit, BulkEditCoordinator, Group};
use crate::clinical::{ClinicalStateStore, ClinicalTool, ToggleOutcome};
use crate::completeness::{CompletenessReport, completeness};
use crate::consensus::GroupState;
use crate::import::{ImportError, MergeReport, SuggestedTooth, prepare_suggestions};
use crate::notice::Notice;
use crate::plan::{
    AssignOutcome, BridgeClick, BridgeError, BulkReport, PlanStore, RemoveOutcome, plan_issues,
};
use crate::wizard::{Step, StepGateError, WizardController, WorkTool};

/// What a click on a tooth did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Step 1: the clinical tool was applied.
    Clinical(ToggleOutcome),
    /// Step 2 with a single-tooth tool.
    Work(AssignOutcome),
    /// Step 2 bridge tool: first endpoint recorded.
    BridgeStarted(ToothId),
    /// Step 2 bridge tool: second endpoint accepted.
    BridgeCreated(BridgeDefinition),
    /// Step 2 bridge tool: the bridge was refused and the tool reset.
    BridgeAborted(BridgeError),
    /// Step 2 with no work tool selected.
    NoTool,
}

/// The stateful restoration plan configurator.
#[derive(Debug, Clone)]
pub struct Configurator {
    config: EngineConfig,
    meta: PlanMeta,
    clinical: ClinicalStateStore,
    plan: PlanStore,
    wizard: WizardController,
    notices: Vec<Notice>,
}

impl Configurator {
    /// An empty configurator in step 1.
    pub fn new(config: EngineConfig) -> Self {
        let wizard = WizardController::new(config.skip_implant_validation);
        Self {
            config,
            meta: PlanMeta::default(),
            clinical: ClinicalStateStore::new(),
            plan: PlanStore::new(),
            wizard,
            notices: Vec::new(),
        }
    }

    /// Seed every store from an existing plan.
    ///
    /// The plan is taken verbatim. Inconsistencies are logged, not repaired,
    /// so that a round-trip never silently changes a stored order.
    pub fn from_plan(plan: &Plan, config: EngineConfig) -> Self {
        let mut this = Self::new(config);
        this.meta = plan.meta.clone();
        this.clinical.replace_all(&plan.clinical, &plan.implants);
        this.plan.replace_all(&plan.assignments, &plan.bridges);

        for issue in plan_issues(plan) {
            warn!("imported plan is inconsistent: {issue}");
        }
        info!(
            clinical = plan.clinical.len(),
            assignments = plan.assignments.len(),
            bridges = plan.bridges.len(),
            "configurator seeded from plan"
        );
        this
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn meta(&self) -> &PlanMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: PlanMeta) {
        self.meta = meta;
    }

    pub fn step(&self) -> Step {
        self.wizard.step()
    }

    pub fn clinical(&self) -> &ClinicalStateStore {
        &self.clinical
    }

    pub fn plan(&self) -> &PlanStore {
        &self.plan
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    /// Notices queued since the last [`Self::take_notices`].
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notice queue.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Tools and clicks
    // -----------------------------------------------------------------------

    pub fn set_clinical_tool(&mut self, tool: Option<ClinicalTool>) {
        self.clinical.set_tool(tool);
    }

    pub fn select_work_tool(&mut self, tool: Option<WorkTool>) {
        self.wizard.select_work_tool(tool);
    }

    /// Route a click on `tooth` according to the active step and tool.
    pub fn click(&mut self, tooth: ToothId) -> ClickOutcome {
        match self.wizard.step() {
            Step::InitialState => {
                let outcome = self.clinical.toggle(tooth);
                if outcome != ToggleOutcome::NoTool {
                    self.sync_plan();
                }
                ClickOutcome::Clinical(outcome)
            }
            Step::AssignWork => match self.wizard.work_tool() {
                None => ClickOutcome::NoTool,
                Some(WorkTool::Single(kind)) => ClickOutcome::Work(self.assign_work(tooth, kind)),
                Some(WorkTool::Bridge) => self.bridge_click(tooth),
            },
        }
    }

    fn bridge_click(&mut self, tooth: ToothId) -> ClickOutcome {
        match self.wizard.bridge_protocol_mut().click(tooth) {
            BridgeClick::Started(start) => ClickOutcome::BridgeStarted(start),
            BridgeClick::Complete { start, end } => {
                match self.plan.create_bridge(start, end, &self.clinical) {
                    Ok(bridge) => ClickOutcome::BridgeCreated(bridge),
                    Err(err) => self.bridge_aborted(err),
                }
            }
            BridgeClick::Aborted(err) => self.bridge_aborted(err),
        }
    }

    fn bridge_aborted(&mut self, err: BridgeError) -> ClickOutcome {
        warn!("bridge refused: {err}");
        self.notices.push(Notice::warning(err.to_string()));
        ClickOutcome::BridgeAborted(err)
    }

    // -----------------------------------------------------------------------
    // Step 1
    // -----------------------------------------------------------------------

    /// Write a clinical state directly, bypassing the tool.
    pub fn set_clinical_state(&mut self, tooth: ToothId, state: ClinicalState) {
        self.clinical.set_state(tooth, state);
        self.sync_plan();
    }

    /// Merge `patch` into the implant record of `tooth`.
    ///
    /// Returns `false` when the tooth is not an implant.
    pub fn update_implant_detail(&mut self, tooth: ToothId, patch: ImplantDetailPatch) -> bool {
        let updated = self.clinical.update_implant_detail(tooth, patch);
        if updated {
            self.sync_plan();
        } else {
            debug!(%tooth, "implant update ignored: tooth is not an implant");
        }
        updated
    }

    // -----------------------------------------------------------------------
    // Step 2
    // -----------------------------------------------------------------------

    /// Toggle standalone work of `kind` on `tooth`.
    pub fn assign_work(&mut self, tooth: ToothId, kind: RestorationType) -> AssignOutcome {
        let outcome = self.plan.assign_work(tooth, kind, &self.clinical);
        if let AssignOutcome::Rejected(rejection) = &outcome {
            self.notices
                .push(Notice::warning(rejection.to_string()).for_tooth(tooth));
        }
        outcome
    }

    /// Create a bridge without going through the two-click tool.
    pub fn create_bridge(
        &mut self,
        start: ToothId,
        end: ToothId,
    ) -> Result<BridgeDefinition, BridgeError> {
        self.plan
            .create_bridge(start, end, &self.clinical)
            .inspect_err(|err| {
                warn!("bridge refused: {err}");
                self.notices.push(Notice::warning(err.to_string()));
            })
    }

    /// Remove the work on `tooth`; a bridge member removes its bridge.
    pub fn remove_tooth(&mut self, tooth: ToothId) -> RemoveOutcome {
        let outcome = self.plan.remove_tooth(tooth);
        if let RemoveOutcome::Bridge { teeth, .. } = &outcome {
            let codes: Vec<String> = teeth.iter().map(ToString::to_string).collect();
            self.notices.push(
                Notice::info(format!("bridge {} removed", codes.join("-"))).for_tooth(tooth),
            );
        }
        outcome
    }

    pub fn remove_bridge(&mut self, id: Uuid) -> Option<Vec<ToothId>> {
        self.plan.remove_bridge(id)
    }

    /// Merge patches into several assignments at once.
    pub fn bulk_update(&mut self, updates: BTreeMap<ToothId, AssignmentPatch>) -> BulkReport {
        let report = self.plan.bulk_update(updates);
        self.notice_stale(&report);
        report
    }

    /// Write one edited field to every member of `group`.
    pub fn bulk_apply(&mut self, group: &Group, edit: &BulkEdit) -> BulkReport {
        let report = BulkEditCoordinator::apply(&mut self.plan, group, edit);
        self.notice_stale(&report);
        report
    }

    pub fn group_state(&self, group: &Group) -> GroupState {
        BulkEditCoordinator::group_state(&self.plan, group)
    }

    fn notice_stale(&mut self, report: &BulkReport) {
        for tooth in &report.skipped {
            warn!(%tooth, "update skipped: tooth no longer has work assigned");
            self.notices
                .push(Notice::warning("no work assigned; update skipped").for_tooth(*tooth));
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Advance to step 2. A refused advance also queues a notice.
    pub fn next(&mut self) -> Result<Step, StepGateError> {
        self.wizard
            .next(&mut self.clinical, &self.config.required_implant_fields)
            .inspect_err(|err| {
                warn!("cannot advance: {err}");
                self.notices.push(Notice::warning(err.to_string()));
            })
    }

    pub fn back(&mut self) -> Step {
        self.wizard.back()
    }

    pub fn go_to(&mut self, step: Step) -> Step {
        self.wizard.go_to(step, &mut self.clinical)
    }

    pub fn set_skip_validation(&mut self, skip: bool) {
        self.wizard.set_skip_implant_validation(skip);
    }

    // -----------------------------------------------------------------------
    // Import and export
    // -----------------------------------------------------------------------

    /// Merge suggestions from the extraction service.
    ///
    /// The batch is validated first; a malformed entry rejects all of it and
    /// nothing changes. Each remaining entry then replaces its tooth's
    /// assignment wholesale, unless assigning that tooth directly would be
    /// refused, in which case it is skipped with a notice. Implant fields
    /// mark the tooth as an implant and fill its record.
    pub fn merge_suggestions(
        &mut self,
        suggestions: Vec<SuggestedTooth>,
    ) -> Result<MergeReport, ImportError> {
        let prepared = prepare_suggestions(suggestions)?;
        let mut report = MergeReport::default();

        for suggestion in prepared {
            let assignment = suggestion.assignment;
            let tooth = assignment.tooth;
            if let Err(rejection) = self.plan.upsert_assignment(assignment, &self.clinical) {
                warn!(%tooth, "suggestion skipped: {rejection}");
                self.notices.push(
                    Notice::warning(format!("suggestion skipped: {rejection}")).for_tooth(tooth),
                );
                report.skipped.push((tooth, rejection));
                continue;
            }

            if let Some(implant) = suggestion.implant {
                if self.clinical.state(tooth) != ClinicalState::Implant {
                    debug!(%tooth, "suggestion marks tooth as implant");
                    self.clinical.set_state(tooth, ClinicalState::Implant);
                }
                self.clinical.update_implant_detail(tooth, implant);
            }
            report.applied.push(tooth);
        }

        self.sync_plan();
        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "suggestions merged"
        );
        if !report.applied.is_empty() {
            self.notices.push(Notice::info(format!(
                "{} suggested teeth applied",
                report.applied.len()
            )));
        }
        Ok(report)
    }

    /// The flattened plan for the order collaborator.
    pub fn snapshot(&self) -> Plan {
        let (clinical, implants) = self.clinical.snapshot();
        let (assignments, bridges) = self.plan.snapshot();
        Plan {
            meta: self.meta.clone(),
            clinical,
            implants,
            assignments,
            bridges,
        }
    }

    pub fn completeness(&self) -> CompletenessReport {
        completeness(
            &self.clinical,
            &self.plan,
            &self.config.required_implant_fields,
            self.wizard.skip_implant_validation(),
        )
    }

    fn sync_plan(&mut self) {
        for tooth in self.plan.sync_with_clinical(&self.clinical) {
            warn!(%tooth, "work dropped: tooth is now missing");
            self.notices.push(
                Notice::warning("tooth marked missing; its work was removed").for_tooth(tooth),
            );
        }
    }
}

impl Default for Configurator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
