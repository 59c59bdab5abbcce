//! Partial updates with explicit per-field semantics.
//!
//! Every field of a patch is either left alone, overwritten, or cleared.
//! There is no implicit "merge whatever is non-empty": a bulk edit that
//! wants a field emptied across a group must say so with [`Patch::Clear`].

use crate::models::{ImplantDetail, RestorationAssignment, ShadeSpec};

/// Update to a single optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched.
    #[default]
    Keep,
    /// Replace the current value.
    Set(T),
    /// Remove the current value.
    Clear,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Apply the update to an optional slot.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(value) => *slot = Some(value),
            Self::Clear => *slot = None,
        }
    }
}

impl Patch<String> {
    /// `Set` for a non-blank value, `Clear` for a blank one.
    ///
    /// Matches how form inputs report an emptied text field.
    pub fn from_input(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Clear
        } else {
            Self::Set(value)
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `Some` sets, `None` keeps.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Keep,
        }
    }
}

// ---------------------------------------------------------------------------

/// Partial update of an [`ImplantDetail`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplantDetailPatch {
    pub brand: Patch<String>,
    pub connection_system: Patch<String>,
    pub platform: Patch<String>,
    pub abutment_type: Patch<String>,
    pub notes: Patch<String>,
}

impl ImplantDetailPatch {
    pub fn apply_to(self, detail: &mut ImplantDetail) {
        self.brand.apply_to(&mut detail.brand);
        self.connection_system
            .apply_to(&mut detail.connection_system);
        self.platform.apply_to(&mut detail.platform);
        self.abutment_type.apply_to(&mut detail.abutment_type);
        self.notes.apply_to(&mut detail.notes);
    }
}

/// Partial update of the shade fields of an assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadePatch {
    pub shade_type: Patch<String>,
    pub shade_code: Patch<String>,
    pub cervical: Patch<String>,
    pub body: Patch<String>,
    pub incisal: Patch<String>,
}

impl ShadePatch {
    pub fn apply_to(self, shade: &mut ShadeSpec) {
        self.shade_type.apply_to(&mut shade.shade_type);
        self.shade_code.apply_to(&mut shade.shade_code);
        self.cervical.apply_to(&mut shade.cervical);
        self.body.apply_to(&mut shade.body);
        self.incisal.apply_to(&mut shade.incisal);
    }
}

/// Partial update of a [`RestorationAssignment`].
///
/// The tooth, restoration type and implant linkage are not patchable:
/// those change only through assignment and bridge operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPatch {
    pub material: Patch<String>,
    pub shade: ShadePatch,
    pub provisional: Option<bool>,
    pub jig: Option<bool>,
}

impl AssignmentPatch {
    pub fn material(value: impl Into<String>) -> Self {
        Self {
            material: Patch::from_input(value),
            ..Self::default()
        }
    }

    pub fn apply_to(self, assignment: &mut RestorationAssignment) {
        self.material.apply_to(&mut assignment.material);
        self.shade.apply_to(&mut assignment.shade);
        if let Some(provisional) = self.provisional {
            assignment.provisional = provisional;
        }
        if let Some(jig) = self.jig {
            assignment.jig = jig;
        }
    }
}
