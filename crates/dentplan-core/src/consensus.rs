//! Group consensus over per-tooth attribute values.
//!
//! A multi-tooth selection shows a field's value only when every member
//! that has a value agrees. Members without a value do not break
//! agreement; two different values do, and the field is shown blank.

use dentplan_model::ShadeSpec;

/// Result of comparing one field across a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consensus<T> {
    /// No member has a value.
    Empty,
    /// Every member with a value has this one.
    Shared(T),
    /// At least two members disagree.
    Mixed,
}

impl<T> Consensus<T> {
    /// The shared value, if any. `Empty` and `Mixed` both display blank.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Shared(v) => Some(v),
            Self::Empty | Self::Mixed => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed)
    }
}

/// Fold a sequence of optional values into a [`Consensus`].
pub fn consensus<T, I>(values: I) -> Consensus<T>
where
    T: PartialEq,
    I: IntoIterator<Item = Option<T>>,
{
    let mut shared: Option<T> = None;
    for value in values.into_iter().flatten() {
        match &shared {
            None => shared = Some(value),
            Some(current) if *current == value => {}
            Some(_) => return Consensus::Mixed,
        }
    }
    match shared {
        Some(v) => Consensus::Shared(v),
        None => Consensus::Empty,
    }
}

/// Consensus over text values, treating blank strings as absent.
pub fn text_consensus<'a, I>(values: I) -> Consensus<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    consensus(values.into_iter().map(|v| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }))
}

/// What the bulk editor displays for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupState {
    pub material: Option<String>,
    pub shade_type: Option<String>,
    pub shade_code: Option<String>,
    pub cervical: Option<String>,
    pub body: Option<String>,
    pub incisal: Option<String>,
    /// Any field above is blank because members disagree.
    pub has_mixed_values: bool,
}

/// Derive the shared state of a group from its members' materials and shades.
///
/// `materials` and `shades` are parallel, one entry per member; a blank or
/// absent material counts as "no value".
pub fn derive_group_state<M>(materials: &[M], shades: &[ShadeSpec]) -> GroupState
where
    M: AsRef<str>,
{
    let material = text_consensus(materials.iter().map(|m| Some(m.as_ref())));
    let shade_type = text_consensus(shades.iter().map(|s| s.shade_type.as_deref()));
    let shade_code = text_consensus(shades.iter().map(|s| s.shade_code.as_deref()));
    let cervical = text_consensus(shades.iter().map(|s| s.cervical.as_deref()));
    let body = text_consensus(shades.iter().map(|s| s.body.as_deref()));
    let incisal = text_consensus(shades.iter().map(|s| s.incisal.as_deref()));

    let has_mixed_values = [
        &material,
        &shade_type,
        &shade_code,
        &cervical,
        &body,
        &incisal,
    ]
    .iter()
    .any(|c| c.is_mixed());

    GroupState {
        material: material.value().cloned(),
        shade_type: shade_type.value().cloned(),
        shade_code: shade_code.value().cloned(),
        cervical: cervical.value().cloned(),
        body: body.value().cloned(),
        incisal: incisal.value().cloned(),
        has_mixed_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreeing_materials() {
        let state = derive_group_state(&["Zirconia", "Zirconia", "Zirconia"], &[]);
        assert_eq!(state.material.as_deref(), Some("Zirconia"));
        assert!(!state.has_mixed_values);
    }

    #[test]
    fn disagreeing_materials_are_blank_and_mixed() {
        let state = derive_group_state(&["Zirconia", "E-max", ""], &[]);
        assert_eq!(state.material, None);
        assert!(state.has_mixed_values);
    }

    #[test]
    fn blanks_do_not_break_agreement() {
        let state = derive_group_state(&["", "E-max", "  "], &[]);
        assert_eq!(state.material.as_deref(), Some("E-max"));
        assert!(!state.has_mixed_values);
    }

    #[test]
    fn all_blank_is_empty_not_mixed() {
        let state = derive_group_state::<&str>(&["", ""], &[]);
        assert_eq!(state.material, None);
        assert!(!state.has_mixed_values);
    }

    #[test]
    fn shade_fields_are_independent() {
        let a = ShadeSpec {
            shade_type: Some("zonal".into()),
            cervical: Some("A3".into()),
            body: Some("A2".into()),
            ..ShadeSpec::default()
        };
        let b = ShadeSpec {
            shade_type: Some("zonal".into()),
            cervical: Some("A3".into()),
            body: Some("B2".into()),
            ..ShadeSpec::default()
        };
        let state = derive_group_state(&["E-max", "E-max"], &[a, b]);
        assert_eq!(state.shade_type.as_deref(), Some("zonal"));
        assert_eq!(state.cervical.as_deref(), Some("A3"));
        assert_eq!(state.body, None);
        assert!(state.has_mixed_values);
    }

    #[test]
    fn generic_consensus() {
        assert_eq!(consensus(vec![Some(1), None, Some(1)]), Consensus::Shared(1));
        assert_eq!(consensus::<i32, _>(vec![None, None]), Consensus::Empty);
        assert_eq!(consensus(vec![Some(true), Some(false)]), Consensus::Mixed);
    }
}
