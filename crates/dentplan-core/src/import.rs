//! Suggested tooth configurations from the extraction service.
//!
//! The extraction service reads a lab prescription and proposes per-tooth
//! work as loosely typed JSON. [`prepare_suggestions`] turns that into typed
//! entries, rejecting the whole batch if any entry is malformed, so that a
//! merge is either fully attempted or not attempted at all.

use std::collections::HashSet;

use dentplan_model::{
    ImplantDetailPatch, Patch, RestorationAssignment, RestorationType, RestorationTypeParseError,
    ShadeSpec, ToothId, ToothIdParseError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::AssignRejection;

/// Errors that reject a batch of suggestions before anything is applied.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("suggestion #{index}: {source}")]
    InvalidTooth {
        index: usize,
        #[source]
        source: ToothIdParseError,
    },

    #[error("suggestion for tooth {tooth}: {source}")]
    InvalidRestorationType {
        tooth: ToothId,
        #[source]
        source: RestorationTypeParseError,
    },

    #[error("tooth {0} appears in more than one suggestion")]
    DuplicateTooth(ToothId),
}

/// One tooth as proposed by the extraction service.
///
/// Only `tooth` is required. Blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTooth {
    /// Raw FDI number; validated during preparation.
    pub tooth: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restoration_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shade_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cervical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incisal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jig: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implant_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implant_connection_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implant_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implant_abutment_type: Option<String>,
}

/// A validated suggestion, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSuggestion {
    /// Replaces the tooth's assignment wholesale (implant data is filled in
    /// from the clinical store when applied).
    pub assignment: RestorationAssignment,
    /// Present when any implant field was suggested.
    pub implant: Option<ImplantDetailPatch>,
}

/// Outcome of merging a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: Vec<ToothId>,
    /// Teeth that individual assignment would also have refused.
    pub skipped: Vec<(ToothId, AssignRejection)>,
}

/// Accepts either a bare array or `{"teeth": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionDocument {
    List(Vec<SuggestedTooth>),
    Wrapped { teeth: Vec<SuggestedTooth> },
}

/// Parse the extraction service's JSON output.
pub fn parse_suggestions(json: &str) -> Result<Vec<SuggestedTooth>, ImportError> {
    let doc: SuggestionDocument = serde_json::from_str(json)?;
    Ok(match doc {
        SuggestionDocument::List(teeth) | SuggestionDocument::Wrapped { teeth } => teeth,
    })
}

/// Validate every suggestion. Any malformed entry fails the whole batch.
///
/// A suggestion without a restoration type defaults to a crown.
pub fn prepare_suggestions(
    suggestions: Vec<SuggestedTooth>,
) -> Result<Vec<PreparedSuggestion>, ImportError> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(suggestions.len());

    for (index, s) in suggestions.into_iter().enumerate() {
        let tooth = u8::try_from(s.tooth)
            .map_err(|_| ToothIdParseError(s.tooth.to_string()))
            .and_then(ToothId::try_from)
            .map_err(|source| ImportError::InvalidTooth { index, source })?;
        if !seen.insert(tooth) {
            return Err(ImportError::DuplicateTooth(tooth));
        }

        let kind = match non_blank(s.restoration_type) {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .replace([' ', '-'], "_")
                .parse::<RestorationType>()
                .map_err(|source| ImportError::InvalidRestorationType { tooth, source })?,
            None => RestorationType::Crown,
        };

        let mut assignment = RestorationAssignment::new(tooth, kind);
        assignment.material = non_blank(s.material);
        assignment.shade = ShadeSpec {
            shade_type: non_blank(s.shade_type).map(|v| v.to_ascii_lowercase()),
            shade_code: non_blank(s.shade_code),
            cervical: non_blank(s.cervical),
            body: non_blank(s.body),
            incisal: non_blank(s.incisal),
        };
        assignment.provisional = s.provisional.unwrap_or(false);
        assignment.jig = s.jig.unwrap_or(false);

        let implant = ImplantDetailPatch {
            brand: non_blank(s.implant_brand).into(),
            connection_system: non_blank(s.implant_connection_system).into(),
            platform: non_blank(s.implant_platform).into(),
            abutment_type: non_blank(s.implant_abutment_type).into(),
            notes: Patch::Keep,
        };
        let has_implant = !(implant.brand.is_keep()
            && implant.connection_system.is_keep()
            && implant.platform.is_keep()
            && implant.abutment_type.is_keep());

        prepared.push(PreparedSuggestion {
            assignment,
            implant: has_implant.then_some(implant),
        });
    }

    Ok(prepared)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(code: u8) -> ToothId {
        ToothId::try_from(code).unwrap()
    }

    #[test]
    fn parses_bare_and_wrapped_documents() {
        let bare = parse_suggestions(r#"[{"tooth": 11, "material": "E-max"}]"#).unwrap();
        assert_eq!(bare.len(), 1);
        let wrapped = parse_suggestions(r#"{"teeth": [{"tooth": 21}, {"tooth": 22}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
        assert!(parse_suggestions(r#"{"tooth": 11}"#).is_err());
    }

    #[test]
    fn defaults_to_crown_and_normalises_type() {
        let prepared = prepare_suggestions(vec![
            SuggestedTooth {
                tooth: 11,
                ..Default::default()
            },
            SuggestedTooth {
                tooth: 12,
                restoration_type: Some("Post and core".into()),
                ..Default::default()
            },
        ])
        .unwrap();
        assert_eq!(prepared[0].assignment.restoration_type, RestorationType::Crown);
        assert_eq!(
            prepared[1].assignment.restoration_type,
            RestorationType::PostAndCore
        );
    }

    #[test]
    fn implant_inferred_from_sub_fields() {
        let prepared = prepare_suggestions(vec![
            SuggestedTooth {
                tooth: 36,
                implant_brand: Some("Straumann".into()),
                ..Default::default()
            },
            SuggestedTooth {
                tooth: 37,
                implant_brand: Some("  ".into()),
                ..Default::default()
            },
        ])
        .unwrap();
        let implant = prepared[0].implant.as_ref().unwrap();
        assert_eq!(implant.brand, Patch::Set("Straumann".into()));
        assert!(prepared[1].implant.is_none());
    }

    #[test]
    fn one_bad_entry_rejects_batch() {
        let err = prepare_suggestions(vec![
            SuggestedTooth {
                tooth: 11,
                ..Default::default()
            },
            SuggestedTooth {
                tooth: 19,
                ..Default::default()
            },
        ])
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidTooth { index: 1, .. }));

        let err = prepare_suggestions(vec![SuggestedTooth {
            tooth: 11,
            restoration_type: Some("denture".into()),
            ..Default::default()
        }])
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidRestorationType { tooth, .. } if tooth == t(11)));
    }

    #[test]
    fn out_of_range_tooth_numbers_rejected() {
        for code in [-14, 300, 1021] {
            let err = prepare_suggestions(vec![SuggestedTooth {
                tooth: code,
                ..Default::default()
            }])
            .unwrap_err();
            match err {
                ImportError::InvalidTooth { index, source } => {
                    assert_eq!(index, 0);
                    assert_eq!(source.0, code.to_string());
                }
                other => panic!("unexpected error for {code}: {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_teeth_rejected() {
        let err = prepare_suggestions(vec![
            SuggestedTooth {
                tooth: 11,
                ..Default::default()
            },
            SuggestedTooth {
                tooth: 11,
                ..Default::default()
            },
        ])
        .unwrap_err();
        assert!(matches!(err, ImportError::DuplicateTooth(tooth) if tooth == t(11)));
    }
}
