use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tooth::ToothId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Pre-existing clinical condition of a tooth.
///
/// `Normal` is the implicit default: stores keep only non-normal teeth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalState {
    Normal,
    Missing,
    Abutment,
    Implant,
}

impl fmt::Display for ClinicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Missing => "missing",
            Self::Abutment => "abutment",
            Self::Implant => "implant",
        };
        f.write_str(s)
    }
}

impl FromStr for ClinicalState {
    type Err = ClinicalStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "missing" => Ok(Self::Missing),
            "abutment" => Ok(Self::Abutment),
            "implant" => Ok(Self::Implant),
            other => Err(ClinicalStateParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ClinicalState`] string.
#[derive(Debug, Clone)]
pub struct ClinicalStateParseError(pub String);

impl fmt::Display for ClinicalStateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid clinical state: {:?}", self.0)
    }
}

impl std::error::Error for ClinicalStateParseError {}

// ---------------------------------------------------------------------------

/// Kind of restorative work assigned to a tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorationType {
    Crown,
    Veneer,
    Inlay,
    Onlay,
    PostAndCore,
    /// Member of a multi-tooth bridge. Only created by bridge assembly.
    Bridge,
}

impl RestorationType {
    /// Every type that can be assigned to a single tooth.
    pub const STANDALONE: [RestorationType; 5] = [
        Self::Crown,
        Self::Veneer,
        Self::Inlay,
        Self::Onlay,
        Self::PostAndCore,
    ];

    /// Human-readable label used in group headings and notices.
    pub fn label(self) -> &'static str {
        match self {
            Self::Crown => "Crown",
            Self::Veneer => "Veneer",
            Self::Inlay => "Inlay",
            Self::Onlay => "Onlay",
            Self::PostAndCore => "Post and core",
            Self::Bridge => "Bridge",
        }
    }
}

impl fmt::Display for RestorationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Crown => "crown",
            Self::Veneer => "veneer",
            Self::Inlay => "inlay",
            Self::Onlay => "onlay",
            Self::PostAndCore => "post_and_core",
            Self::Bridge => "bridge",
        };
        f.write_str(s)
    }
}

impl FromStr for RestorationType {
    type Err = RestorationTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crown" => Ok(Self::Crown),
            "veneer" => Ok(Self::Veneer),
            "inlay" => Ok(Self::Inlay),
            "onlay" => Ok(Self::Onlay),
            "post_and_core" => Ok(Self::PostAndCore),
            "bridge" => Ok(Self::Bridge),
            other => Err(RestorationTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`RestorationType`] string.
#[derive(Debug, Clone)]
pub struct RestorationTypeParseError(pub String);

impl fmt::Display for RestorationTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid restoration type: {:?}", self.0)
    }
}

impl std::error::Error for RestorationTypeParseError {}

// ---------------------------------------------------------------------------

/// A field of [`ImplantDetail`] that can be required before leaving step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplantField {
    Brand,
    ConnectionSystem,
    Platform,
    AbutmentType,
}

impl ImplantField {
    /// Fields required when nothing else is configured.
    pub const DEFAULT_REQUIRED: [ImplantField; 2] = [Self::Brand, Self::ConnectionSystem];
}

impl fmt::Display for ImplantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Brand => "brand",
            Self::ConnectionSystem => "connection_system",
            Self::Platform => "platform",
            Self::AbutmentType => "abutment_type",
        };
        f.write_str(s)
    }
}

impl FromStr for ImplantField {
    type Err = ImplantFieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand" => Ok(Self::Brand),
            "connection_system" => Ok(Self::ConnectionSystem),
            "platform" => Ok(Self::Platform),
            "abutment_type" => Ok(Self::AbutmentType),
            other => Err(ImplantFieldParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ImplantField`] string.
#[derive(Debug, Clone)]
pub struct ImplantFieldParseError(pub String);

impl fmt::Display for ImplantFieldParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid implant field: {:?}", self.0)
    }
}

impl std::error::Error for ImplantFieldParseError {}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Implant information for a tooth whose clinical state is `Implant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplantDetail {
    pub tooth: ToothId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abutment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ImplantDetail {
    /// An empty record, as created when a tooth is first marked as implant.
    pub fn empty(tooth: ToothId) -> Self {
        Self {
            tooth,
            brand: None,
            connection_system: None,
            platform: None,
            abutment_type: None,
            notes: None,
        }
    }

    /// Value of a single field, treating blank strings as absent.
    pub fn field(&self, field: ImplantField) -> Option<&str> {
        let value = match field {
            ImplantField::Brand => self.brand.as_deref(),
            ImplantField::ConnectionSystem => self.connection_system.as_deref(),
            ImplantField::Platform => self.platform.as_deref(),
            ImplantField::AbutmentType => self.abutment_type.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Which of `required` are absent or blank.
    pub fn missing_fields(&self, required: &[ImplantField]) -> Vec<ImplantField> {
        required
            .iter()
            .copied()
            .filter(|f| self.field(*f).is_none())
            .collect()
    }
}

/// Shade prescription for a restoration.
///
/// Either a single shade code, or per-zone shades for layered work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadeSpec {
    /// Shade system or layout, e.g. `single` or `zonal`.
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
}

impl ShadeSpec {
    /// True when neither a shade code nor any zone shade is recorded.
    pub fn is_empty(&self) -> bool {
        [&self.shade_code, &self.cervical, &self.body, &self.incisal]
            .iter()
            .all(|v| v.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// Work assigned to a single tooth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationAssignment {
    pub tooth: ToothId,
    pub restoration_type: RestorationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default)]
    pub shade: ShadeSpec,
    /// Work is to be seated on an implant.
    #[serde(default)]
    pub implant_work: bool,
    /// Copy of the implant record at the time the work was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implant: Option<ImplantDetail>,
    #[serde(default)]
    pub provisional: bool,
    #[serde(default)]
    pub jig: bool,
}

impl RestorationAssignment {
    /// A fresh assignment with no material, shade, or extras.
    pub fn new(tooth: ToothId, restoration_type: RestorationType) -> Self {
        Self {
            tooth,
            restoration_type,
            material: None,
            shade: ShadeSpec::default(),
            implant_work: false,
            implant: None,
            provisional: false,
            jig: false,
        }
    }

    /// Attach implant information (sets the implant work flag).
    pub fn with_implant(mut self, detail: ImplantDetail) -> Self {
        self.implant_work = true;
        self.implant = Some(detail);
        self
    }

    /// Material and shade have both been chosen.
    pub fn is_configured(&self) -> bool {
        self.material
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
            && !self.shade.is_empty()
    }
}

/// A multi-tooth bridge between two endpoint teeth of the same arch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDefinition {
    pub id: Uuid,
    pub start: ToothId,
    pub end: ToothId,
    /// Missing teeth strictly inside the span, in anatomical order.
    #[serde(default)]
    pub pontics: Vec<ToothId>,
}

/// One tooth's entry in the flattened clinical map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalEntry {
    pub tooth: ToothId,
    pub state: ClinicalState,
}

/// Free-form metadata carried alongside a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMeta {
    /// Reference of the order this plan belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    /// When the plan was last written out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// The flattened plan handed to and received from the order collaborator.
///
/// Arrays only, no internal references: safe to serialize as JSON or TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub meta: PlanMeta,
    #[serde(default)]
    pub clinical: Vec<ClinicalEntry>,
    #[serde(default)]
    pub implants: Vec<ImplantDetail>,
    #[serde(default)]
    pub assignments: Vec<RestorationAssignment>,
    #[serde(default)]
    pub bridges: Vec<BridgeDefinition>,
}

impl Plan {
    /// Nothing recorded at all.
    pub fn is_empty(&self) -> bool {
        self.clinical.is_empty()
            && self.implants.is_empty()
            && self.assignments.is_empty()
            && self.bridges.is_empty()
    }
}
