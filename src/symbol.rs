//! Weld symbol vocabulary
//!
//! Sides of the reference line, groove preparation shapes, and the final
//! structured groove symbol handed to UI collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the welding symbol reference line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Below the reference line
    Arrow,
    /// Above the reference line
    Other,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Arrow, Side::Other];

    /// Prefix used in template asset names ("Arrow" / "Other")
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Arrow => "Arrow",
            Side::Other => "Other",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Groove preparation shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrooveType {
    V,
    U,
    J,
    Bevel,
}

impl GrooveType {
    pub const ALL: [GrooveType; 4] = [GrooveType::V, GrooveType::J, GrooveType::U, GrooveType::Bevel];

    pub fn as_str(self) -> &'static str {
        match self {
            GrooveType::V => "V",
            GrooveType::U => "U",
            GrooveType::J => "J",
            GrooveType::Bevel => "Bevel",
        }
    }
}

impl fmt::Display for GrooveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for text that names no groove type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown groove type '{0}'")]
pub struct UnknownGroove(pub String);

impl FromStr for GrooveType {
    type Err = UnknownGroove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V" => Ok(GrooveType::V),
            "U" => Ok(GrooveType::U),
            "J" => Ok(GrooveType::J),
            "Bevel" => Ok(GrooveType::Bevel),
            other => Err(UnknownGroove(other.to_string())),
        }
    }
}

/// Final interpreted groove symbol
///
/// Every field is independently optional: a value is present only when
/// supporting evidence was found (or a human entered it manually).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GrooveSymbol {
    pub arrow_groove: Option<GrooveType>,
    pub other_groove: Option<GrooveType>,
    /// Depth of preparation on the arrow side
    pub arrow_depth: Option<f64>,
    /// Depth of preparation on the other side
    pub other_depth: Option<f64>,
    pub root_opening: Option<f64>,
    /// Groove angle in degrees on the arrow side
    pub arrow_angle: Option<u32>,
    /// Groove angle in degrees on the other side
    pub other_angle: Option<u32>,
}

impl GrooveSymbol {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        *self == GrooveSymbol::default()
    }
}
