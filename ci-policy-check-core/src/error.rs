//! Error taxonomy for a policy check run.

use thiserror::Error;

use crate::arn::ArnError;

/// Errors raised while resolving the principal or evaluating a check.
///
/// `Identity` and `RoleLookup` are fatal for a run: no check is meaningful
/// without a resolved principal. `EvaluationService` is scoped to the check
/// that raised it and marks that check as errored, never as failed.
#[derive(Error, Debug)]
pub enum PolicyCheckError {
    #[error("Identity resolution error: {0}")]
    Identity(String),
    #[error("Role lookup error: {0}")]
    RoleLookup(String),
    #[error("Policy evaluation error: {0}")]
    EvaluationService(String),
    #[error("Report rendering error: {0}")]
    Report(#[from] serde_json::Error),
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

impl PolicyCheckError {
    pub fn identity(message: impl Into<String>) -> Self {
        Self::Identity(message.into())
    }

    pub fn role_lookup(message: impl Into<String>) -> Self {
        Self::RoleLookup(message.into())
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::EvaluationService(message.into())
    }

    pub(crate) fn malformed_caller_arn(arn: &str, source: &ArnError) -> Self {
        Self::Identity(format!("failed to parse caller identity ARN '{arn}': {source}"))
    }

    pub(crate) fn malformed_role_arn(arn: &str, source: &ArnError) -> Self {
        Self::RoleLookup(format!(
            "failed to parse the role ARN returned by GetRole '{arn}': {source}"
        ))
    }
}

pub type PolicyCheckResult<T> = Result<T, PolicyCheckError>;
