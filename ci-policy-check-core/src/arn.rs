//! Amazon Resource Name parsing

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

const ARN_PREFIX: &str = "arn:";
const ARN_SECTIONS: usize = 6;
const ASSUMED_ROLE_PREFIX: &str = "assumed-role/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArnError {
    #[error("invalid prefix")]
    InvalidPrefix,
    #[error("not enough sections")]
    NotEnoughSections,
}

/// A parsed ARN: `arn:partition:service:region:account:resource`.
///
/// The resource section is kept verbatim and may itself contain `:` or `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// Role name of an STS assumed-role session ARN
    /// (`arn:aws:sts::123456789012:assumed-role/MyRole/session-1` yields `MyRole`).
    ///
    /// Any `assumed-role/` resource yields a name, even an empty one; the role
    /// lookup decides whether it exists.
    pub fn assumed_role_name(&self) -> Option<&str> {
        if self.service != "sts" {
            return None;
        }
        self.resource
            .strip_prefix(ASSUMED_ROLE_PREFIX)
            .and_then(|rest| rest.split('/').next())
    }
}

impl FromStr for Arn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with(ARN_PREFIX) {
            return Err(ArnError::InvalidPrefix);
        }
        let sections: Vec<&str> = s.splitn(ARN_SECTIONS, ':').collect();
        if sections.len() != ARN_SECTIONS {
            return Err(ArnError::NotEnoughSections);
        }
        Ok(Self {
            partition: sections[1].to_string(),
            service: sections[2].to_string(),
            region: sections[3].to_string(),
            account_id: sections[4].to_string(),
            resource: sections[5].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// The principal whose permissions are simulated.
///
/// Produced once per run and shared read-only by every bound check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalArn(Arc<str>);

impl PrincipalArn {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Arn> for PrincipalArn {
    fn from(arn: &Arn) -> Self {
        Self(Arc::from(arn.to_string()))
    }
}

impl FromStr for PrincipalArn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arn: Arn = s.parse()?;
        Ok(Self::from(&arn))
    }
}

impl fmt::Display for PrincipalArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
