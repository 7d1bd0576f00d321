use super::ruleset::RulesetError;

/// Failures surfaced by the evaluation engine. All of them are deterministic
/// functions of the ruleset and the input.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("ruleset invalid: {0}")]
    RulesetInvalid(#[from] RulesetError),
    #[error("unrecognized value '{value}' for profile field '{field}'")]
    UnrecognizedProfileField { field: &'static str, value: String },
    #[error("no wizard template for category '{0}'")]
    UnknownCategory(String),
    #[error("internal evaluation error: {0}")]
    EvaluationInternal(String),
}

impl EngineError {
    /// True when the caller's input, not the engine or its document, is at fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnrecognizedProfileField { .. } | EngineError::UnknownCategory(_)
        )
    }
}
