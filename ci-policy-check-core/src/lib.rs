//! This crate provides the core logic for CI policy checks:
//! - Effective principal resolution, following assumed-role sessions back to their role
//! - The declarative catalog of expected permissions
//! - Running checks against the IAM policy simulator and reporting mismatches
//!

pub mod arn;
mod aws;
pub mod catalog;
mod error;
mod report;
mod resolver;
mod runner;
mod service;
mod types;

#[cfg(test)]
mod test_support;

// Re-exports for a small, focused public API
pub use arn::{Arn, ArnError, PrincipalArn};
pub use aws::{
    load_sdk_config, AwsIamClient, AwsStsClient, IdentityService, PolicySimulator,
    RoleLookupService, SimulationPage, SimulationRequest,
};
pub use error::{PolicyCheckError, PolicyCheckResult};
pub use report::{render_mismatches, write_results, RunSummary, REPORT_INDENT};
pub use resolver::{ArnResolver, PrincipalSource, Resolution};
pub use runner::{CheckRunner, SimulationPages};
pub use service::{describe_resolution, PolicyCheckService, RunOptions, RunPhase};
pub use types::{
    Check, CheckDefinition, CheckResult, CheckStatus, ContextEntry, EvalDecision,
    EvaluationOutcome, MatchedStatement, OrganizationsDecisionDetail,
    PermissionsBoundaryDecisionDetail,
};
