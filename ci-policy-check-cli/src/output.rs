use ci_policy_check_core::CheckDefinition;
use std::io::{self, Write};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "ci-policy-check: {}", msg);
}

pub(crate) fn fatal(msg: &str) {
    let _ = writeln!(io::stderr(), "ci-policy-check (fatal): {}", msg);
}

pub(crate) fn print_catalog(checks: &[CheckDefinition]) {
    let stdout = io::stdout();
    let mut w = stdout.lock();
    for check in checks {
        let _ = writeln!(w, "{} (expected {})", check.name, check.expected_decision());
        let _ = writeln!(w, "     Actions:   {}", check.actions.join(", "));
        if let Some(resources) = &check.resources {
            let _ = writeln!(w, "     Resources: {}", resources.join(", "));
        }
        if let Some(context) = &check.context {
            for entry in context {
                let _ = writeln!(
                    w,
                    "     Context:   {} = {}",
                    entry.key,
                    entry.values.join(", ")
                );
            }
        }
        let _ = writeln!(w, "     Reason:    {}", check.rationale);
    }
}
