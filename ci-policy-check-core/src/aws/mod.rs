//! Consumed services: caller identity, role lookup and policy simulation,
//! with their AWS SDK bindings.

pub(crate) mod iam_client;
pub(crate) mod sts;

use async_trait::async_trait;

use crate::arn::PrincipalArn;
use crate::error::PolicyCheckResult;
use crate::types::{Check, ContextEntry, EvaluationOutcome};

pub use iam_client::AwsIamClient;
pub use sts::AwsStsClient;

/// Returns the ARN of the currently authenticated caller.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn caller_arn(&self) -> PolicyCheckResult<String>;
}

/// Returns the canonical ARN of an IAM role given its name.
#[async_trait]
pub trait RoleLookupService: Send + Sync {
    async fn role_arn(&self, role_name: &str) -> PolicyCheckResult<String>;
}

/// Inputs of one policy simulation, borrowed from a bound check.
#[derive(Debug, Clone, Copy)]
pub struct SimulationRequest<'a> {
    pub policy_source_arn: &'a PrincipalArn,
    pub actions: &'a [String],
    pub resources: Option<&'a [String]>,
    pub context: Option<&'a [ContextEntry]>,
}

impl<'a> From<&'a Check> for SimulationRequest<'a> {
    fn from(check: &'a Check) -> Self {
        Self {
            policy_source_arn: &check.policy_source_arn,
            actions: &check.definition.actions,
            resources: check.definition.resources.as_deref(),
            context: check.definition.context.as_deref(),
        }
    }
}

/// One page of simulation results.
#[derive(Debug, Clone, Default)]
pub struct SimulationPage {
    pub outcomes: Vec<EvaluationOutcome>,
    /// Marker for the following page; `None` on the last page.
    pub next_marker: Option<String>,
}

/// Evaluates a principal's policies for a set of actions, one page at a time.
#[async_trait]
pub trait PolicySimulator: Send + Sync {
    async fn simulate_page(
        &self,
        request: &SimulationRequest<'_>,
        marker: Option<String>,
    ) -> PolicyCheckResult<SimulationPage>;
}

/// Load the SDK configuration from the default credential provider chain,
/// optionally pinned to a named profile and region.
pub async fn load_sdk_config(
    profile: Option<&str>,
    region: Option<&str>,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    loader.load().await
}
