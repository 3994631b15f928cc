//! Check declarations, simulation outcomes and check results

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::arn::PrincipalArn;
use crate::error::PolicyCheckError;

/// A string context key constraint applied to the simulated request,
/// e.g. `aws:RequestedRegion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub key: String,
    pub values: Vec<String>,
}

impl ContextEntry {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: vec![value.into()],
        }
    }
}

/// ARN-independent declaration of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDefinition {
    pub name: String,
    pub actions: Vec<String>,
    /// `None` lets the service evaluate against the implicit `*` resource.
    pub resources: Option<Vec<String>>,
    pub context: Option<Vec<ContextEntry>>,
    /// Whether every (action, resource) pair must evaluate to allowed.
    pub expected_allowed: bool,
    /// Operator-facing explanation; has no effect on evaluation.
    pub rationale: String,
}

impl CheckDefinition {
    pub fn new<A, S>(name: &str, actions: A, expected_allowed: bool, rationale: &str) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            actions: actions.into_iter().map(Into::into).collect(),
            resources: None,
            context: None,
            expected_allowed,
            rationale: rationale.to_string(),
        }
    }

    pub fn with_resources<R, S>(mut self, resources: R) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_context(mut self, entries: Vec<ContextEntry>) -> Self {
        self.context = Some(entries);
        self
    }

    /// Bind this definition to the principal it is simulated against.
    pub fn bind(self, policy_source_arn: &PrincipalArn) -> Check {
        Check {
            policy_source_arn: policy_source_arn.clone(),
            definition: self,
        }
    }

    pub fn expected_decision(&self) -> &'static str {
        if self.expected_allowed {
            "allowed"
        } else {
            "denied"
        }
    }
}

/// A check bound to the principal under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub policy_source_arn: PrincipalArn,
    pub definition: CheckDefinition,
}

impl Check {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Decision returned by the simulation service for one (action, resource) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalDecision {
    Allowed,
    ExplicitDeny,
    ImplicitDeny,
    /// A value this tool does not know; compared as denied.
    Unknown(String),
}

impl EvalDecision {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Allowed => "allowed",
            Self::ExplicitDeny => "explicitDeny",
            Self::ImplicitDeny => "implicitDeny",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl From<&str> for EvalDecision {
    fn from(raw: &str) -> Self {
        match raw {
            "allowed" => Self::Allowed,
            "explicitDeny" => Self::ExplicitDeny,
            "implicitDeny" => Self::ImplicitDeny,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl Serialize for EvalDecision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Policy statement that contributed to a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchedStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_policy_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionsBoundaryDecisionDetail {
    pub allowed_by_permissions_boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationsDecisionDetail {
    pub allowed_by_organizations: bool,
}

/// One decision record per (action, resource) pair.
///
/// Serialisation skips absent and empty diagnostics, so the rendered report
/// only carries what the service actually returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationOutcome {
    pub eval_action_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_resource_name: Option<String>,
    pub eval_decision: EvalDecision,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_statements: Vec<MatchedStatement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_context_values: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub eval_decision_details: BTreeMap<String, EvalDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions_boundary_decision_detail: Option<PermissionsBoundaryDecisionDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizations_decision_detail: Option<OrganizationsDecisionDetail>,
}

impl EvaluationOutcome {
    pub fn new(action: &str, resource: Option<&str>, decision: EvalDecision) -> Self {
        Self {
            eval_action_name: action.to_string(),
            eval_resource_name: resource.map(str::to_string),
            eval_decision: decision,
            matched_statements: Vec::new(),
            missing_context_values: Vec::new(),
            eval_decision_details: BTreeMap::new(),
            permissions_boundary_decision_detail: None,
            organizations_decision_detail: None,
        }
    }

    pub fn matches(&self, expected_allowed: bool) -> bool {
        self.eval_decision.is_allowed() == expected_allowed
    }
}

#[derive(Debug)]
pub enum CheckStatus {
    Pass,
    /// Holds the first mismatching outcome(s); evaluation stops at the first one.
    Fail(Vec<EvaluationOutcome>),
    Error(PolicyCheckError),
}

/// Result of running one check.
#[derive(Debug)]
pub struct CheckResult<'a> {
    pub check: &'a Check,
    pub status: CheckStatus,
}

impl CheckResult<'_> {
    pub fn passed(&self) -> bool {
        matches!(self.status, CheckStatus::Pass)
    }
}
