//! In-memory service stubs shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::aws::{
    IdentityService, PolicySimulator, RoleLookupService, SimulationPage, SimulationRequest,
};
use crate::error::{PolicyCheckError, PolicyCheckResult};
use crate::types::{EvalDecision, EvaluationOutcome};

pub(crate) fn outcome(
    action: &str,
    resource: Option<&str>,
    decision: EvalDecision,
) -> EvaluationOutcome {
    EvaluationOutcome::new(action, resource, decision)
}

pub(crate) struct StubIdentity {
    result: Result<String, String>,
}

impl StubIdentity {
    pub(crate) fn ok(arn: &str) -> Self {
        Self {
            result: Ok(arn.to_string()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl IdentityService for StubIdentity {
    async fn caller_arn(&self) -> PolicyCheckResult<String> {
        self.result.clone().map_err(PolicyCheckError::Identity)
    }
}

pub(crate) struct StubRoles {
    result: Result<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubRoles {
    pub(crate) fn ok(arn: &str) -> Self {
        Self {
            result: Ok(arn.to_string()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RoleLookupService for StubRoles {
    async fn role_arn(&self, role_name: &str) -> PolicyCheckResult<String> {
        self.requested
            .lock()
            .expect("lock")
            .push(role_name.to_string());
        self.result.clone().map_err(PolicyCheckError::RoleLookup)
    }
}

/// Owned copy of a simulation request as seen by [`StubSimulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub policy_source_arn: String,
    pub actions: Vec<String>,
    pub resources: Option<Vec<String>>,
    pub context: Vec<(String, Vec<String>)>,
    pub marker: Option<String>,
}

/// Serves the same canned pages to every request sequence, optionally failing
/// once they run out or for requests naming a given action. Every request is
/// recorded.
pub(crate) struct StubSimulator {
    pages: Vec<Vec<EvaluationOutcome>>,
    failure: Option<String>,
    failing_action: Option<(String, String)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubSimulator {
    pub(crate) fn pages(pages: Vec<Vec<EvaluationOutcome>>) -> Self {
        Self {
            pages,
            failure: None,
            failing_action: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_after(pages: Vec<Vec<EvaluationOutcome>>, message: &str) -> Self {
        Self {
            pages,
            failure: Some(message.to_string()),
            failing_action: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_for(mut self, action: &str, message: &str) -> Self {
        self.failing_action = Some((action.to_string(), message.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

#[async_trait]
impl PolicySimulator for StubSimulator {
    async fn simulate_page(
        &self,
        request: &SimulationRequest<'_>,
        marker: Option<String>,
    ) -> PolicyCheckResult<SimulationPage> {
        let index = marker
            .as_deref()
            .and_then(|m| m.strip_prefix("page-"))
            .and_then(|i| i.parse::<usize>().ok())
            .unwrap_or(0);
        self.requests
            .lock()
            .expect("lock")
            .push(RecordedRequest {
                policy_source_arn: request.policy_source_arn.to_string(),
                actions: request.actions.to_vec(),
                resources: request.resources.map(<[String]>::to_vec),
                context: request
                    .context
                    .unwrap_or_default()
                    .iter()
                    .map(|entry| (entry.key.clone(), entry.values.clone()))
                    .collect(),
                marker,
            });

        if let Some((action, message)) = &self.failing_action {
            if request.actions.contains(action) {
                return Err(PolicyCheckError::evaluation(message.clone()));
            }
        }

        let total = self.pages.len() + usize::from(self.failure.is_some());
        let next_marker = (index + 1 < total).then(|| format!("page-{}", index + 1));
        match self.pages.get(index) {
            Some(outcomes) => Ok(SimulationPage {
                outcomes: outcomes.clone(),
                next_marker,
            }),
            None => Err(PolicyCheckError::evaluation(
                self.failure
                    .clone()
                    .unwrap_or_else(|| "no more pages".to_string()),
            )),
        }
    }
}
