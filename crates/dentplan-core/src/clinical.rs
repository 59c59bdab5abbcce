//! Step 1 store: the pre-existing clinical state of each tooth.
//!
//! Owns the tooth -> [`ClinicalState`] map and the [`ImplantDetail`] records.
//! Normal teeth are not stored. An implant record exists exactly while its
//! tooth is in the `Implant` state.

use std::collections::BTreeMap;
use std::fmt;

use dentplan_model::{
    ClinicalEntry, ClinicalState, ImplantDetail, ImplantDetailPatch, ImplantField, ToothId,
};
use tracing::debug;

/// Which clinical state a click in step 1 writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicalTool {
    Missing,
    Abutment,
    Implant,
}

impl ClinicalTool {
    /// The state this tool writes.
    pub fn target(self) -> ClinicalState {
        match self {
            Self::Missing => ClinicalState::Missing,
            Self::Abutment => ClinicalState::Abutment,
            Self::Implant => ClinicalState::Implant,
        }
    }
}

impl fmt::Display for ClinicalTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.target(), f)
    }
}

/// What a toggle did to the tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The tooth now holds this state.
    Set(ClinicalState),
    /// The tooth was reset to normal.
    Cleared,
    /// No tool is selected.
    NoTool,
}

/// Clinical state of every tooth plus implant records.
#[derive(Debug, Clone, Default)]
pub struct ClinicalStateStore {
    states: BTreeMap<ToothId, ClinicalState>,
    implants: BTreeMap<ToothId, ImplantDetail>,
    tool: Option<ClinicalTool>,
}

impl ClinicalStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the tool subsequent toggles use. `None` means browse only.
    pub fn set_tool(&mut self, tool: Option<ClinicalTool>) {
        self.tool = tool;
    }

    pub fn tool(&self) -> Option<ClinicalTool> {
        self.tool
    }

    /// Apply the active tool to `tooth`.
    ///
    /// Toggling the state a tooth already holds resets it to normal, so two
    /// identical toggles leave the tooth as it was. Any other state is
    /// overwritten; states never stack.
    pub fn toggle(&mut self, tooth: ToothId) -> ToggleOutcome {
        let Some(tool) = self.tool else {
            return ToggleOutcome::NoTool;
        };
        let target = tool.target();
        if self.state(tooth) == target {
            self.set_state(tooth, ClinicalState::Normal);
            debug!(%tooth, "clinical state cleared");
            ToggleOutcome::Cleared
        } else {
            self.set_state(tooth, target);
            debug!(%tooth, state = %target, "clinical state set");
            ToggleOutcome::Set(target)
        }
    }

    /// Write a state directly, maintaining the implant record lifecycle.
    pub fn set_state(&mut self, tooth: ToothId, state: ClinicalState) {
        match state {
            ClinicalState::Normal => {
                self.states.remove(&tooth);
            }
            other => {
                self.states.insert(tooth, other);
            }
        }
        if state == ClinicalState::Implant {
            self.implants
                .entry(tooth)
                .or_insert_with(|| ImplantDetail::empty(tooth));
        } else {
            self.implants.remove(&tooth);
        }
    }

    /// Merge `patch` into the implant record of `tooth`.
    ///
    /// Returns `false` without changing anything when the tooth is not an
    /// implant.
    pub fn update_implant_detail(&mut self, tooth: ToothId, patch: ImplantDetailPatch) -> bool {
        if self.state(tooth) != ClinicalState::Implant {
            return false;
        }
        let detail = self
            .implants
            .entry(tooth)
            .or_insert_with(|| ImplantDetail::empty(tooth));
        patch.apply_to(detail);
        true
    }

    /// Current state; teeth never touched are normal.
    pub fn state(&self, tooth: ToothId) -> ClinicalState {
        self.states
            .get(&tooth)
            .copied()
            .unwrap_or(ClinicalState::Normal)
    }

    pub fn is_missing(&self, tooth: ToothId) -> bool {
        self.state(tooth) == ClinicalState::Missing
    }

    pub fn implant_detail(&self, tooth: ToothId) -> Option<&ImplantDetail> {
        self.implants.get(&tooth)
    }

    /// Teeth holding `state`, in code order. Asking for `Normal` is
    /// meaningless for a sparse map and returns nothing.
    pub fn teeth_in_state(&self, state: ClinicalState) -> Vec<ToothId> {
        self.states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(t, _)| *t)
            .collect()
    }

    /// Implant teeth whose records lack any of `required`, with the
    /// missing fields.
    pub fn incomplete_implants(
        &self,
        required: &[ImplantField],
    ) -> Vec<(ToothId, Vec<ImplantField>)> {
        self.teeth_in_state(ClinicalState::Implant)
            .into_iter()
            .filter_map(|tooth| {
                let missing = match self.implants.get(&tooth) {
                    Some(detail) => detail.missing_fields(required),
                    None => required.to_vec(),
                };
                (!missing.is_empty()).then_some((tooth, missing))
            })
            .collect()
    }

    /// Flattened clinical entries and implant records.
    pub fn snapshot(&self) -> (Vec<ClinicalEntry>, Vec<ImplantDetail>) {
        let entries = self
            .states
            .iter()
            .map(|(tooth, state)| ClinicalEntry {
                tooth: *tooth,
                state: *state,
            })
            .collect();
        let implants = self.implants.values().cloned().collect();
        (entries, implants)
    }

    /// Replace all states and implant records wholesale.
    ///
    /// Entries are taken verbatim; `Normal` entries are dropped since they
    /// are the default. The selected tool is left alone.
    pub fn replace_all(&mut self, entries: &[ClinicalEntry], implants: &[ImplantDetail]) {
        self.states = entries
            .iter()
            .filter(|e| e.state != ClinicalState::Normal)
            .map(|e| (e.tooth, e.state))
            .collect();
        self.implants = implants.iter().map(|d| (d.tooth, d.clone())).collect();
    }
}
