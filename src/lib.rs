//! WeldVision - weld groove symbol interpretation
//!
//! Reads a photographed welding symbol and reports the groove preparation on
//! each side of the reference line: groove type, depth, angle and root opening.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod symbol;
pub mod vision;

pub use analysis::{set_manual, ManualEntry, ValidationError};
pub use capture::{CaptureError, CapturedFrame};
pub use config::AppConfig;
pub use symbol::{GrooveSymbol, GrooveType, Side};
pub use vision::{Analysis, WeldAnalyzer};
