use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use ci_policy_check_core::{
    catalog, describe_resolution, IdentityService, PolicyCheckService, PolicySimulator,
    PrincipalArn, RoleLookupService, RunOptions,
};
use clap::{ArgAction, Parser};
use log::debug;

mod output;

/// Verify that the AWS principal running a CI pipeline holds only its intended permissions.
#[derive(Parser, Debug)]
#[command(name = "ci-policy-check", version, about)]
struct Cli {
    /// Named AWS profile to load credentials from
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// AWS region for the STS and IAM clients
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Simulate against this principal ARN instead of the caller identity
    #[arg(long, value_name = "ARN")]
    principal_arn: Option<String>,

    /// Run only the named check (repeatable)
    #[arg(long = "check", value_name = "NAME")]
    checks: Vec<String>,

    /// Print the check catalog and exit without contacting AWS
    #[arg(long)]
    list_checks: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Reject check names the catalog does not declare.
fn validate_check_names(names: &[String]) -> Result<()> {
    let known = catalog::definitions();
    let unknown: Vec<&str> = names
        .iter()
        .filter(|name| !known.iter().any(|check| &check.name == *name))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        bail!(
            "unknown check name(s): {} (use --list-checks to see the catalog)",
            unknown.join(", ")
        );
    }
    Ok(())
}

fn parse_principal_arn(arn: Option<&str>) -> Result<Option<PrincipalArn>> {
    arn.map(|arn| {
        arn.parse::<PrincipalArn>()
            .map_err(|e| anyhow!("failed to parse principal ARN '{arn}': {e}"))
    })
    .transpose()
}

async fn run(cli: Cli) -> Result<bool> {
    validate_check_names(&cli.checks)?;
    let options = RunOptions {
        principal_arn: parse_principal_arn(cli.principal_arn.as_deref())?,
        only: cli.checks,
    };

    let service =
        PolicyCheckService::from_env(cli.profile.as_deref(), cli.region.as_deref()).await;
    let stdout = io::stdout();
    execute(&service, &options, &mut stdout.lock()).await
}

/// Run the checks and report whether every one of them passed.
async fn execute<I, R, S, W>(
    service: &PolicyCheckService<I, R, S>,
    options: &RunOptions,
    out: &mut W,
) -> Result<bool>
where
    I: IdentityService,
    R: RoleLookupService,
    S: PolicySimulator,
    W: Write,
{
    let summary = service
        .run(options, out, |resolution| {
            output::note(&describe_resolution(resolution));
        })
        .await
        .context("Policy check run aborted")?;
    debug!("Run finished: {summary}");
    Ok(summary.success())
}

fn exit_code(outcome: Result<bool>) -> ExitCode {
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            output::fatal(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_checks {
        output::print_catalog(&catalog::definitions());
        return ExitCode::SUCCESS;
    }

    exit_code(run(cli).await)
}
