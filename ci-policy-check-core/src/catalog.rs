//! The battery of permission checks run against a CI principal.
//!
//! Definitions are plain data and independent of the principal; [`build`]
//! binds them to the resolved principal ARN.

use crate::arn::PrincipalArn;
use crate::types::{Check, CheckDefinition, ContextEntry};

const REQUESTED_REGION_KEY: &str = "aws:RequestedRegion";

/// Regions CI is allowed to deploy CloudFormation stacks into.
pub const ALLOWED_STACK_REGIONS: [&str; 2] = ["eu-west-1", "eu-west-2"];

/// Every other commercial region, in which stack creation must be denied.
///
/// Hand-maintained: a region launched after this list was written is not
/// covered, and the deny check keeps passing without testing it.
pub const DENIED_STACK_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-3",
    "eu-south-1",
    "eu-south-2",
    "eu-north-1",
    "il-central-1",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
];

const DYNAMODB_ALL_TABLES: &str = "arn:aws:dynamodb:*:*:table/*";

fn stack_arn(region: &str) -> String {
    format!("arn:aws:cloudformation:{region}:*:stack/*")
}

fn can_create_stacks_in(region: &str) -> CheckDefinition {
    CheckDefinition::new(
        &format!("CanCreateCloudFormationStacksIn-{region}"),
        ["cloudformation:CreateStack"],
        true,
        "CI deploys Serverless applications as CloudFormation stacks in the approved regions.",
    )
    .with_context(vec![ContextEntry::string(REQUESTED_REGION_KEY, region)])
}

/// The ARN-independent check definitions, in run order.
pub fn definitions() -> Vec<CheckDefinition> {
    let mut checks = vec![
        CheckDefinition::new(
            "CannotCreateUsers",
            ["iam:CreateUser"],
            false,
            "A CI pipeline should not be able to create new users.",
        ),
        CheckDefinition::new(
            "CannotLaunchEC2Instances",
            ["ec2:LaunchInstance"],
            false,
            "It's unusual for a Serverless application to launch EC2 instances.",
        ),
        CheckDefinition::new(
            "CanCreateNewPolicies",
            ["iam:CreatePolicy"],
            true,
            "Creating a policy is low risk: it grants nothing until it is attached.",
        ),
    ];

    checks.extend(ALLOWED_STACK_REGIONS.iter().copied().map(can_create_stacks_in));

    checks.push(
        CheckDefinition::new(
            "CannotCreateCloudFormationStacksInOtherRegions",
            ["cloudformation:CreateStack"],
            false,
            "Deployments are restricted to the approved regions.",
        )
        .with_resources(DENIED_STACK_REGIONS.iter().map(|region| stack_arn(region))),
    );

    checks.push(
        CheckDefinition::new(
            "CannotReadDynamoDBTables",
            [
                "dynamodb:BatchGetItem",
                "dynamodb:GetItem",
                "dynamodb:Query",
                "dynamodb:Scan",
            ],
            false,
            "CI deploys tables but has no business reading application data.",
        )
        .with_resources([DYNAMODB_ALL_TABLES]),
    );

    checks.push(
        CheckDefinition::new(
            "CannotWriteDynamoDBTables",
            [
                "dynamodb:BatchWriteItem",
                "dynamodb:DeleteItem",
                "dynamodb:PutItem",
                "dynamodb:UpdateItem",
            ],
            false,
            "CI deploys tables but must not modify application data.",
        )
        .with_resources([DYNAMODB_ALL_TABLES]),
    );

    checks.push(
        CheckDefinition::new(
            "CannotRunDynamoDBTransactions",
            ["dynamodb:TransactGetItems", "dynamodb:TransactWriteItems"],
            false,
            "Transactions read and write application data, which CI must not touch.",
        )
        .with_resources([DYNAMODB_ALL_TABLES]),
    );

    checks
}

/// Bind every check definition to `principal`.
pub fn build(principal: &PrincipalArn) -> Vec<Check> {
    definitions()
        .into_iter()
        .map(|definition| definition.bind(principal))
        .collect()
}
