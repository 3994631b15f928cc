//! Mismatch report rendering

use std::fmt;
use std::io::Write;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::PolicyCheckResult;
use crate::types::{CheckResult, CheckStatus, EvaluationOutcome};

const TICK: char = '\u{2714}';
const CROSS: char = '\u{2717}';

/// Indentation placed before every report line, nesting it under the check line.
pub const REPORT_INDENT: &str = "     ";

fn to_pretty_json<T: Serialize>(value: &T) -> PolicyCheckResult<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render mismatching outcomes as indented JSON records, one per outcome.
///
/// Absent and empty diagnostic fields are left out of each record.
pub fn render_mismatches(outcomes: &[EvaluationOutcome]) -> PolicyCheckResult<String> {
    let mut out = String::new();
    for outcome in outcomes {
        for line in to_pretty_json(outcome)?.lines() {
            out.push_str(REPORT_INDENT);
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Aggregate counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    /// True iff every check passed.
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    fn record(&mut self, status: &CheckStatus) {
        match status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Fail(_) => self.failed += 1,
            CheckStatus::Error(_) => self.errored += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} errored",
            self.passed, self.failed, self.errored
        )
    }
}

/// Write one line per check result, with the rationale and mismatch report
/// under failures, followed by a summary line.
pub fn write_results<W: Write>(
    out: &mut W,
    results: &[CheckResult<'_>],
) -> PolicyCheckResult<RunSummary> {
    let mut summary = RunSummary::default();
    for result in results {
        let name = result.check.name();
        match &result.status {
            CheckStatus::Pass => writeln!(out, " {TICK} {name} PASS")?,
            CheckStatus::Fail(mismatches) => {
                writeln!(out, " {CROSS} {name} FAIL")?;
                writeln!(
                    out,
                    "{REPORT_INDENT}Reason: {} (expected {})",
                    result.check.definition.rationale,
                    result.check.definition.expected_decision()
                )?;
                write!(out, "{}", render_mismatches(mismatches)?)?;
            }
            CheckStatus::Error(e) => writeln!(out, " {CROSS} {name} ERROR {e}")?,
        }
        summary.record(&result.status);
    }
    writeln!(out, "{summary}")?;
    Ok(summary)
}
