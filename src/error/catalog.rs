// Catalog lookup errors

use crate::error::ErrorCode;
use std::fmt;

/// Catalog error code constants
///
/// Error code range: 4001-4003
pub struct CatalogErrorCodes;

impl CatalogErrorCodes {
    pub const UNKNOWN_SHOT_TYPE: i32 = 4001;
    pub const UNKNOWN_PRO: i32 = 4002;
    pub const MALFORMED: i32 = 4003;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// String did not map onto a known shot category
    UnknownShotType { value: String },

    /// No professional with this name for the shot category
    UnknownPro { shot_type: String, pro: String },

    /// Catalog document could not be parsed or contains invalid entries
    Malformed { reason: String },
}

impl ErrorCode for CatalogError {
    fn code(&self) -> i32 {
        match self {
            CatalogError::UnknownShotType { .. } => CatalogErrorCodes::UNKNOWN_SHOT_TYPE,
            CatalogError::UnknownPro { .. } => CatalogErrorCodes::UNKNOWN_PRO,
            CatalogError::Malformed { .. } => CatalogErrorCodes::MALFORMED,
        }
    }

    fn message(&self) -> String {
        match self {
            CatalogError::UnknownShotType { value } => {
                format!("Unknown shot type '{}'", value)
            }
            CatalogError::UnknownPro { shot_type, pro } => {
                format!("No professional named '{}' for {}", pro, shot_type)
            }
            CatalogError::Malformed { reason } => format!("Malformed catalog: {}", reason),
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CatalogError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Malformed {
            reason: err.to_string(),
        }
    }
}
