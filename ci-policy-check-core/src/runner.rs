//! Runs a single check against the policy simulator.

use log::debug;

use crate::aws::{PolicySimulator, SimulationRequest};
use crate::error::PolicyCheckResult;
use crate::types::{Check, CheckResult, CheckStatus, EvaluationOutcome};

/// Lazy sequence of simulation result pages for one request.
///
/// Pages are fetched only when pulled; dropping the sequence stops pagination.
pub struct SimulationPages<'a, S: ?Sized> {
    simulator: &'a S,
    request: SimulationRequest<'a>,
    marker: Option<String>,
    done: bool,
}

impl<'a, S> SimulationPages<'a, S>
where
    S: PolicySimulator + ?Sized,
{
    pub fn new(simulator: &'a S, request: SimulationRequest<'a>) -> Self {
        Self {
            simulator,
            request,
            marker: None,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the last page has been returned.
    pub async fn next_page(&mut self) -> Option<PolicyCheckResult<Vec<EvaluationOutcome>>> {
        if self.done {
            return None;
        }
        match self
            .simulator
            .simulate_page(&self.request, self.marker.take())
            .await
        {
            Ok(page) => {
                self.marker = page.next_marker;
                self.done = self.marker.is_none();
                Some(Ok(page.outcomes))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub struct CheckRunner<'a, S: ?Sized> {
    simulator: &'a S,
}

impl<'a, S> CheckRunner<'a, S>
where
    S: PolicySimulator + ?Sized,
{
    pub fn new(simulator: &'a S) -> Self {
        Self { simulator }
    }

    /// Compare every returned outcome with the check's expectation.
    ///
    /// Returns the first mismatching outcome, or an empty list when every
    /// outcome on every page agrees. No page is requested after a mismatch.
    pub async fn evaluate(&self, check: &Check) -> PolicyCheckResult<Vec<EvaluationOutcome>> {
        let expected_allowed = check.definition.expected_allowed;
        let mut pages = SimulationPages::new(self.simulator, SimulationRequest::from(check));
        let mut page_count = 0usize;

        while let Some(page) = pages.next_page().await {
            let outcomes = page?;
            page_count += 1;
            if let Some(mismatch) = outcomes.into_iter().find(|o| !o.matches(expected_allowed)) {
                debug!(
                    "{}: {} on {} was {}, expected {}; stopping after page {page_count}",
                    check.name(),
                    mismatch.eval_action_name,
                    mismatch.eval_resource_name.as_deref().unwrap_or("*"),
                    mismatch.eval_decision.as_str(),
                    check.definition.expected_decision(),
                );
                return Ok(vec![mismatch]);
            }
        }

        debug!("{}: all outcomes matched across {page_count} page(s)", check.name());
        Ok(Vec::new())
    }

    /// Run `check`, folding service errors into the result.
    pub async fn run<'c>(&self, check: &'c Check) -> CheckResult<'c> {
        let status = match self.evaluate(check).await {
            Ok(mismatches) if mismatches.is_empty() => CheckStatus::Pass,
            Ok(mismatches) => CheckStatus::Fail(mismatches),
            Err(e) => CheckStatus::Error(e),
        };
        CheckResult { check, status }
    }
}
