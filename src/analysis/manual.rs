//! Manual override of an inferred groove symbol
//!
//! A person reviewing the result may replace it wholesale. Fields arrive as
//! raw form text and are validated before a new symbol is produced; invalid
//! input is rejected without a partial update.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::context::parse_numeric_value;
use crate::symbol::{GrooveSymbol, GrooveType, UnknownGroove};

/// Groove choices offered to the user, "None" meaning no groove
pub const GROOVE_OPTIONS: [&str; 5] = ["None", "Bevel", "V", "J", "U"];

/// Raw form input, one string per symbol field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManualEntry {
    pub arrow_groove: String,
    pub other_groove: String,
    pub arrow_depth: String,
    pub other_depth: String,
    pub root_opening: String,
    pub arrow_angle: String,
    pub other_angle: String,
}

impl ManualEntry {
    /// Pre-fill the form from an existing symbol
    pub fn from_symbol(symbol: &GrooveSymbol) -> Self {
        fn text<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        Self {
            arrow_groove: symbol.arrow_groove.map_or("None", GrooveType::as_str).to_string(),
            other_groove: symbol.other_groove.map_or("None", GrooveType::as_str).to_string(),
            arrow_depth: text(symbol.arrow_depth),
            other_depth: text(symbol.other_depth),
            root_opening: text(symbol.root_opening),
            arrow_angle: text(symbol.arrow_angle),
            other_angle: text(symbol.other_angle),
        }
    }
}

/// Form fields that can be flagged as invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManualField {
    ArrowDepth,
    OtherDepth,
    ArrowAngle,
    OtherAngle,
}

impl fmt::Display for ManualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManualField::ArrowDepth => "arrow depth",
            ManualField::OtherDepth => "other depth",
            ManualField::ArrowAngle => "arrow angle",
            ManualField::OtherAngle => "other angle",
        };
        f.write_str(name)
    }
}

/// Rejected manual input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cannot set depth or angle for an empty groove.")]
    EmptyGroove { fields: Vec<ManualField> },
    #[error(transparent)]
    UnknownGroove(#[from] UnknownGroove),
}

impl ValidationError {
    /// Fields to highlight in the form
    pub fn fields(&self) -> &[ManualField] {
        match self {
            ValidationError::EmptyGroove { fields } => fields,
            ValidationError::UnknownGroove(_) => &[],
        }
    }
}

/// Validate form input and build the replacement symbol.
///
/// Numeric fields that are blank or unparseable become empty.
pub fn set_manual(entry: &ManualEntry) -> Result<GrooveSymbol, ValidationError> {
    let arrow_groove = parse_groove(&entry.arrow_groove)?;
    let other_groove = parse_groove(&entry.other_groove)?;

    let mut fields = Vec::new();
    if arrow_groove.is_none() {
        flag_if_set(&mut fields, &entry.arrow_depth, ManualField::ArrowDepth);
        flag_if_set(&mut fields, &entry.arrow_angle, ManualField::ArrowAngle);
    }
    if other_groove.is_none() {
        flag_if_set(&mut fields, &entry.other_depth, ManualField::OtherDepth);
        flag_if_set(&mut fields, &entry.other_angle, ManualField::OtherAngle);
    }
    if !fields.is_empty() {
        return Err(ValidationError::EmptyGroove { fields });
    }

    Ok(GrooveSymbol {
        arrow_groove,
        other_groove,
        arrow_depth: parse_numeric_value(entry.arrow_depth.trim()),
        other_depth: parse_numeric_value(entry.other_depth.trim()),
        root_opening: parse_numeric_value(entry.root_opening.trim()),
        arrow_angle: entry.arrow_angle.trim().parse().ok(),
        other_angle: entry.other_angle.trim().parse().ok(),
    })
}

/// "None" or blank means no groove
fn parse_groove(text: &str) -> Result<Option<GrooveType>, ValidationError> {
    match text.trim() {
        "" | "None" => Ok(None),
        other => Ok(Some(other.parse()?)),
    }
}

fn flag_if_set(fields: &mut Vec<ManualField>, value: &str, field: ManualField) {
    if !value.trim().is_empty() {
        fields.push(field);
    }
}
