//! Error types for the forecast engine and its collaborators

use thiserror::Error;

/// Errors raised while building or persisting a forecast
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A required historical field is absent under every known alias
    #[error("none of the expected fields {candidates:?} found; available columns: {available:?}")]
    UnresolvedField {
        candidates: Vec<String>,
        available: Vec<String>,
    },

    /// A required driver is absent from the loaded assumptions
    #[error("missing assumption: {driver}")]
    MissingAssumption { driver: String },

    /// An assumption value could not be parsed as a number
    #[error("assumption '{metric}' has non-numeric value '{value}'")]
    InvalidAssumption { metric: String, value: String },

    /// The historical data source failed to return a statement
    #[error("failed to fetch {statement}: {reason}")]
    SourceFetch { statement: String, reason: String },

    /// Writing a table or assumption set failed
    #[error("failed to write '{destination}': {reason}")]
    SinkWrite { destination: String, reason: String },

    /// Cell reference is not valid A1 notation
    #[error("invalid anchor cell '{0}'")]
    InvalidAnchor(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_field_message_lists_columns() {
        let err = ModelError::UnresolvedField {
            candidates: vec!["revenue".into()],
            available: vec!["sales".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("revenue"));
        assert!(msg.contains("sales"));
    }
}
