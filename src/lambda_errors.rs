//! Errors shared by the tokenizer, parser and rewriting engine.

use thiserror::Error;

/// Every failure the engine can report. Nothing is recovered internally, each
/// variant propagates to the caller of the operation that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LambdaError {
    /// Malformed token stream or grammar violation.
    #[error("Error: unexpected syntax! {0}")]
    SyntaxError(String),

    /// A registered reserved word was encountered. The registered callback
    /// has already run when this is returned.
    #[error("Reserved symbol encountered: {0}")]
    ReservedSymbol(String),

    /// Alpha conversion would capture a variable.
    #[error("Requested name already exists! Cannot rename {old_name} to {new_name}.")]
    NameClash { old_name: String, new_name: String },

    /// Beta reduction to convergence did not reach a normal form in budget.
    #[error("Maximum iterations exceeded! No normal form after {0} steps.")]
    MaxIterationsExceeded(u64),

    /// Tried to reserve something other than a lowercase word or a single
    /// special character.
    #[error(
        "Invalid reserved symbol {0:?}: only lowercase words or single characters may be reserved"
    )]
    InvalidReservedSymbol(String),
}

impl LambdaError {
    /// Shorthand for building a `SyntaxError`.
    pub fn syntax(message: impl Into<String>) -> Self {
        return Self::SyntaxError(message.into());
    }
}
