//! FDI tooth identifiers.
//!
//! A [`ToothId`] is the two-digit FDI code of a permanent tooth: the first
//! digit is the quadrant (1-4), the second the position counted from the
//! midline (1-8). Quadrants 1 and 2 form the upper arch, 3 and 4 the lower.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper or lower half of the dentition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    Upper,
    Lower,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// A permanent tooth in FDI notation (11-18, 21-28, 31-38, 41-48).
///
/// Ordering is numeric on the code, which is *not* the anatomical order
/// along an arch; see `dentplan_core::topology` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ToothId(u8);

impl ToothId {
    /// Build a tooth from its quadrant and position digits.
    pub fn new(quadrant: u8, position: u8) -> Result<Self, ToothIdParseError> {
        if !(1..=4).contains(&quadrant) || !(1..=8).contains(&position) {
            return Err(ToothIdParseError(format!("{quadrant}{position}")));
        }
        Ok(Self(quadrant * 10 + position))
    }

    /// Quadrant digit (1-4).
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position from the midline (1 = central incisor, 8 = third molar).
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    /// The two-digit FDI code.
    pub fn code(self) -> u8 {
        self.0
    }

    pub fn arch(self) -> Arch {
        if self.quadrant() <= 2 {
            Arch::Upper
        } else {
            Arch::Lower
        }
    }

    /// All 32 permanent teeth in ascending code order.
    pub fn all() -> impl Iterator<Item = ToothId> {
        (1..=4u8).flat_map(|q| (1..=8u8).map(move |p| ToothId(q * 10 + p)))
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for ToothId {
    type Error = ToothIdParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::new(code / 10, code % 10).map_err(|_| ToothIdParseError(code.to_string()))
    }
}

impl From<ToothId> for u8 {
    fn from(tooth: ToothId) -> Self {
        tooth.0
    }
}

impl FromStr for ToothId {
    type Err = ToothIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 2 {
            return Err(ToothIdParseError(s.to_owned()));
        }
        trimmed
            .parse::<u8>()
            .map_err(|_| ToothIdParseError(s.to_owned()))
            .and_then(|code| Self::try_from(code).map_err(|_| ToothIdParseError(s.to_owned())))
    }
}

/// Error returned when a value is not a permanent FDI tooth code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToothIdParseError(pub String);

impl fmt::Display for ToothIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid FDI tooth number: {:?}", self.0)
    }
}

impl std::error::Error for ToothIdParseError {}
