//! AWS IAM client wrapper for role lookup and policy simulation

use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::{ContextEntry as SdkContextEntry, ContextKeyTypeEnum, EvaluationResult};
use aws_sdk_iam::Client as IamClient;
use log::debug;

use crate::aws::{PolicySimulator, RoleLookupService, SimulationPage, SimulationRequest};
use crate::error::{PolicyCheckError, PolicyCheckResult};
use crate::types::{
    ContextEntry, EvalDecision, EvaluationOutcome, MatchedStatement,
    OrganizationsDecisionDetail, PermissionsBoundaryDecisionDetail,
};

#[derive(Clone)]
pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(IamClient::new(config))
    }
}

#[async_trait]
impl RoleLookupService for AwsIamClient {
    async fn role_arn(&self, role_name: &str) -> PolicyCheckResult<String> {
        let out = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                PolicyCheckError::role_lookup(format!(
                    "failed call to GetRole for role '{role_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        out.role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| {
                PolicyCheckError::role_lookup(format!("GetRole returned no role for '{role_name}'"))
            })
    }
}

#[async_trait]
impl PolicySimulator for AwsIamClient {
    async fn simulate_page(
        &self,
        request: &SimulationRequest<'_>,
        marker: Option<String>,
    ) -> PolicyCheckResult<SimulationPage> {
        let out = self
            .client
            .simulate_principal_policy()
            .policy_source_arn(request.policy_source_arn.as_str())
            .set_action_names(Some(request.actions.to_vec()))
            .set_resource_arns(request.resources.map(<[String]>::to_vec))
            .set_context_entries(
                request
                    .context
                    .map(|entries| entries.iter().map(to_sdk_context_entry).collect()),
            )
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| {
                PolicyCheckError::evaluation(format!(
                    "failed call to SimulatePrincipalPolicy: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let outcomes: Vec<EvaluationOutcome> =
            out.evaluation_results().iter().map(to_outcome).collect();
        let next_marker = if out.is_truncated() {
            out.marker().map(str::to_string)
        } else {
            None
        };
        debug!(
            "SimulatePrincipalPolicy returned {} result(s), truncated: {}",
            outcomes.len(),
            next_marker.is_some()
        );
        Ok(SimulationPage {
            outcomes,
            next_marker,
        })
    }
}

fn to_sdk_context_entry(entry: &ContextEntry) -> SdkContextEntry {
    SdkContextEntry::builder()
        .context_key_name(&entry.key)
        .context_key_type(ContextKeyTypeEnum::String)
        .set_context_key_values(Some(entry.values.clone()))
        .build()
}

fn to_outcome(result: &EvaluationResult) -> EvaluationOutcome {
    let mut outcome = EvaluationOutcome::new(
        result.eval_action_name(),
        result.eval_resource_name(),
        EvalDecision::from(result.eval_decision().as_str()),
    );
    outcome.matched_statements = result
        .matched_statements()
        .iter()
        .map(|statement| MatchedStatement {
            source_policy_id: statement.source_policy_id().map(str::to_string),
            source_policy_type: statement
                .source_policy_type()
                .map(|t| t.as_str().to_string()),
        })
        .collect();
    outcome.missing_context_values = result.missing_context_values().to_vec();
    if let Some(details) = result.eval_decision_details() {
        outcome.eval_decision_details = details
            .iter()
            .map(|(policy, decision)| (policy.clone(), EvalDecision::from(decision.as_str())))
            .collect();
    }
    outcome.permissions_boundary_decision_detail = result
        .permissions_boundary_decision_detail()
        .map(|detail| PermissionsBoundaryDecisionDetail {
            allowed_by_permissions_boundary: detail.allowed_by_permissions_boundary(),
        });
    outcome.organizations_decision_detail = result
        .organizations_decision_detail()
        .map(|detail| OrganizationsDecisionDetail {
            allowed_by_organizations: detail.allowed_by_organizations(),
        });
    outcome
}
