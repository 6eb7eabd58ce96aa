use thiserror::Error;

use modmarshal_types::SymbolError;

/// Failures while classifying a type or synthesizing its methods. All abort
/// the run that produced them; no partial output is written.
#[derive(Debug, Error)]
pub enum GenError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("generic type not supported: {0}")]
    UnsupportedGenericType(String),

    #[error("cannot generate code for {type_name}: {reason}")]
    UnsupportedShape { type_name: String, reason: String },
}

impl GenError {
    pub(crate) fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
