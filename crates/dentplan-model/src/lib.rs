//! Value types for the restoration plan configurator.
//!
//! Tooth identifiers, clinical and restoration enums, per-tooth records, the
//! flattened [`models::Plan`] exchanged with the order collaborator, explicit
//! patch types, and engine configuration.

pub mod config;
pub mod models;
pub mod patch;
pub mod tooth;

pub use config::{EngineConfig, EngineEnvError};
pub use models::{
    BridgeDefinition, ClinicalEntry, ClinicalState, ClinicalStateParseError, ImplantDetail,
    ImplantField, ImplantFieldParseError, Plan, PlanMeta, RestorationAssignment, RestorationType,
    RestorationTypeParseError, ShadeSpec,
};
pub use patch::{AssignmentPatch, ImplantDetailPatch, Patch, ShadePatch};
pub use tooth::{Arch, ToothId, ToothIdParseError};
