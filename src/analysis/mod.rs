//! Analysis Layer
//!
//! Interprets vision output: classifies recognized text per side, assembles
//! the groove symbol, and validates manual overrides.

pub mod context;
pub mod groove;
pub mod manual;

pub use context::{extract_context, split_by_side, WeldSideData, WeldSymbolContext};
pub use groove::GrooveBuilder;
pub use manual::{set_manual, ManualEntry, ManualField, ValidationError};
