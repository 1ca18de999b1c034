//! Errors raised while interpreting CRD field values

use thiserror::Error;

/// CRD value errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrdError {
    /// A string did not match any variant of an enumerated field
    #[error("unknown {kind} value: {value:?}")]
    UnknownValue {
        /// Field type name
        kind: &'static str,
        /// Offending value
        value: String,
    },
}
