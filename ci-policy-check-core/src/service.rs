//! Policy check service
//!
//! Wires principal resolution, the check catalog, the runner and the report
//! into one run. A run moves through [`RunPhase`] in order and never goes back;
//! a resolution failure aborts it before any check is attempted.

use std::fmt;
use std::io::Write;

use log::{debug, warn};

use crate::arn::PrincipalArn;
use crate::aws::{
    load_sdk_config, AwsIamClient, AwsStsClient, IdentityService, PolicySimulator,
    RoleLookupService,
};
use crate::catalog;
use crate::error::PolicyCheckResult;
use crate::report::{write_results, RunSummary};
use crate::resolver::{ArnResolver, PrincipalSource, Resolution};
use crate::runner::CheckRunner;
use crate::types::{Check, CheckResult, CheckStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    ResolvingIdentity,
    BuildingCatalog,
    RunningChecks,
    Reporting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolvingIdentity => "resolving identity",
            Self::BuildingCatalog => "building catalog",
            Self::RunningChecks => "running checks",
            Self::Reporting => "reporting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Simulate against this principal instead of resolving the caller identity.
    pub principal_arn: Option<PrincipalArn>,
    /// Run only the checks with these names; empty runs the whole catalog.
    pub only: Vec<String>,
}

/// Main service struct holding the consumed services.
pub struct PolicyCheckService<I, R, S> {
    identity: I,
    roles: R,
    simulator: S,
}

impl PolicyCheckService<AwsStsClient, AwsIamClient, AwsIamClient> {
    /// Create a service backed by STS and IAM clients.
    ///
    /// The configuration is loaded using the default credential provider chain.
    pub async fn from_env(profile: Option<&str>, region: Option<&str>) -> Self {
        let config = load_sdk_config(profile, region).await;
        let iam = AwsIamClient::from_conf(&config);
        Self::new(AwsStsClient::from_conf(&config), iam.clone(), iam)
    }
}

impl<I, R, S> PolicyCheckService<I, R, S>
where
    I: IdentityService,
    R: RoleLookupService,
    S: PolicySimulator,
{
    pub fn new(identity: I, roles: R, simulator: S) -> Self {
        Self {
            identity,
            roles,
            simulator,
        }
    }

    pub async fn resolve_principal(&self) -> PolicyCheckResult<Resolution> {
        ArnResolver::new(&self.identity, &self.roles).resolve().await
    }

    /// Run every check sequentially, in catalog order.
    ///
    /// A service error only marks its own check as errored.
    pub async fn run_checks<'c>(&self, checks: &'c [Check]) -> Vec<CheckResult<'c>> {
        let runner = CheckRunner::new(&self.simulator);
        let mut results = Vec::with_capacity(checks.len());
        for check in checks {
            let result = runner.run(check).await;
            if let CheckStatus::Error(e) = &result.status {
                warn!("{}: {e}", check.name());
            }
            results.push(result);
        }
        results
    }

    /// The principal a run is bound to: the supplied override, or the
    /// resolved caller identity.
    pub async fn principal_for(&self, options: &RunOptions) -> PolicyCheckResult<Resolution> {
        match &options.principal_arn {
            Some(principal) => Ok(Resolution {
                principal: principal.clone(),
                source: PrincipalSource::Override,
            }),
            None => self.resolve_principal().await,
        }
    }

    /// Resolve the principal, run the selected checks and write the report to `out`.
    ///
    /// `on_resolved` is called once the principal is known, before any check
    /// runs. Returns an error only for fatal conditions (identity or role
    /// resolution, or a failure to write the report).
    pub async fn run<W, F>(
        &self,
        options: &RunOptions,
        out: &mut W,
        on_resolved: F,
    ) -> PolicyCheckResult<RunSummary>
    where
        W: Write,
        F: FnOnce(&Resolution),
    {
        debug!("Run phase: {}", RunPhase::ResolvingIdentity);
        let resolution = self.principal_for(options).await?;
        on_resolved(&resolution);
        let principal = resolution.principal;

        debug!("Run phase: {}", RunPhase::BuildingCatalog);
        let checks: Vec<Check> = catalog::build(&principal)
            .into_iter()
            .filter(|check| {
                options.only.is_empty() || options.only.iter().any(|n| n == check.name())
            })
            .collect();
        debug!("{} check(s) bound to {principal}", checks.len());

        debug!("Run phase: {}", RunPhase::RunningChecks);
        let results = self.run_checks(&checks).await;

        debug!("Run phase: {}", RunPhase::Reporting);
        let summary = write_results(out, &results)?;

        debug!("Run phase: {} ({summary})", RunPhase::Done);
        Ok(summary)
    }
}

/// Operator-facing description of how the principal was derived.
pub fn describe_resolution(resolution: &Resolution) -> String {
    match &resolution.source {
        PrincipalSource::IamEntity => format!(
            "The current principal is an IAM entity: {:?}",
            resolution.principal.as_str()
        ),
        PrincipalSource::AssumedRole {
            session_arn,
            role_name,
        } => format!(
            "The current principal is an assumed role {session_arn:?}, \
             located IAM entity for {role_name:?}: {:?}",
            resolution.principal.as_str()
        ),
        PrincipalSource::Unresolved => format!(
            "The current principal is used as is: {:?}",
            resolution.principal.as_str()
        ),
        PrincipalSource::Override => format!(
            "Using the supplied principal: {:?}",
            resolution.principal.as_str()
        ),
    }
}
