//! Two-click bridge assembly.
//!
//! The bridge tool is an explicit two-state machine:
//!
//! ```text
//! Idle            --click(t)--> PendingStart(t)
//! PendingStart(s) --click(t), t != s--> Idle  (attempt bridge s..t)
//! PendingStart(s) --click(s)----------> Idle  (aborted: degenerate)
//! ```
//!
//! Range validation and pontic derivation live in [`build_bridge`], which
//! does not touch any store so it can be checked in isolation.

use dentplan_model::{BridgeDefinition, ToothId};
use thiserror::Error;
use uuid::Uuid;

use crate::clinical::ClinicalStateStore;
use crate::topology::resolve_range;

/// Why a bridge could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("teeth {start} and {end} are in different arches; a bridge must stay within one arch")]
    CrossArch { start: ToothId, end: ToothId },

    #[error("a bridge needs at least two different teeth (got {start} to {end})")]
    Degenerate { start: ToothId, end: ToothId },

    #[error("tooth {tooth} already belongs to bridge {bridge}")]
    Overlapping { tooth: ToothId, bridge: Uuid },
}

/// State of the bridge tool between clicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgeProtocol {
    #[default]
    Idle,
    PendingStart(ToothId),
}

/// What a click on the bridge tool asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeClick {
    /// First endpoint recorded; waiting for the second.
    Started(ToothId),
    /// Both endpoints chosen; the caller should attempt the bridge.
    Complete { start: ToothId, end: ToothId },
    /// The pending start was clicked again; nothing is pending any more.
    Aborted(BridgeError),
}

impl BridgeProtocol {
    /// Advance the protocol with a click on `tooth`.
    pub fn click(&mut self, tooth: ToothId) -> BridgeClick {
        match *self {
            Self::Idle => {
                *self = Self::PendingStart(tooth);
                BridgeClick::Started(tooth)
            }
            Self::PendingStart(start) => {
                *self = Self::Idle;
                if start == tooth {
                    BridgeClick::Aborted(BridgeError::Degenerate {
                        start,
                        end: tooth,
                    })
                } else {
                    BridgeClick::Complete { start, end: tooth }
                }
            }
        }
    }

    /// Drop any pending start.
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    pub fn pending(&self) -> Option<ToothId> {
        match self {
            Self::Idle => None,
            Self::PendingStart(t) => Some(*t),
        }
    }
}

/// Resolve `start..end` into a bridge definition.
///
/// Returns the definition and its full span. Pontics are the missing teeth
/// strictly between the endpoints. Overlap with existing bridges is the
/// store's concern.
pub fn build_bridge(
    start: ToothId,
    end: ToothId,
    clinical: &ClinicalStateStore,
) -> Result<(BridgeDefinition, Vec<ToothId>), BridgeError> {
    let span = resolve_range(start, end).ok_or(BridgeError::CrossArch { start, end })?;
    if span.len() < 2 {
        return Err(BridgeError::Degenerate { start, end });
    }
    let pontics = derive_pontics(&span, clinical);
    let bridge = BridgeDefinition {
        id: Uuid::new_v4(),
        start,
        end,
        pontics,
    };
    Ok((bridge, span))
}

/// Missing teeth of `span`, excluding both ends.
pub fn derive_pontics(span: &[ToothId], clinical: &ClinicalStateStore) -> Vec<ToothId> {
    if span.len() < 3 {
        return Vec::new();
    }
    span[1..span.len() - 1]
        .iter()
        .copied()
        .filter(|t| clinical.is_missing(*t))
        .collect()
}
