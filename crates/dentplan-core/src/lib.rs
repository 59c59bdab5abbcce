//! Restoration plan configurator engine.
//!
//! Step 1 records the clinical state of each tooth, step 2 assigns
//! restorative work. [`Configurator`] ties the stores and the wizard
//! together; the other modules are usable on their own.

pub mod bulk;
pub mod clinical;
pub mod completeness;
pub mod configurator;
pub mod consensus;
pub mod import;
pub mod notice;
pub mod plan;
pub mod topology;
pub mod wizard;

pub use bulk::{BulkEdit, BulkEditCoordinator, Group, ShadeZone};
pub use clinical::{ClinicalStateStore, ClinicalTool, ToggleOutcome};
pub use completeness::{CompletenessReport, ToothStatus};
pub use configurator::{ClickOutcome, Configurator};
pub use consensus::{Consensus, GroupState, derive_group_state};
pub use import::{ImportError, MergeReport, SuggestedTooth, parse_suggestions};
pub use notice::{Notice, NoticeLevel};
pub use plan::{
    AssignOutcome, AssignRejection, BridgeError, BulkReport, PlanStore, PlanValidationError,
    RemoveOutcome, validate_plan,
};
pub use wizard::{Step, StepGateError, WizardController, WorkTool};
