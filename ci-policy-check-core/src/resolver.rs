//! Effective principal resolution.
//!
//! Policy simulation must be anchored to a durable IAM entity. When the caller
//! is an STS assumed-role session, the session ARN is traded for the ARN of the
//! role it was assumed from.

use log::{debug, info};

use crate::arn::{Arn, PrincipalArn};
use crate::aws::{IdentityService, RoleLookupService};
use crate::error::{PolicyCheckError, PolicyCheckResult};

/// How the principal was derived from the caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalSource {
    /// The caller is already an IAM user or role.
    IamEntity,
    /// The caller is an assumed-role session; the principal is the role it came from.
    AssumedRole { session_arn: String, role_name: String },
    /// Any other identity shape, used as returned by the identity service.
    Unresolved,
    /// Supplied by the operator; the identity service was not consulted.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub principal: PrincipalArn,
    pub source: PrincipalSource,
}

pub struct ArnResolver<'a, I, R> {
    identity: &'a I,
    roles: &'a R,
}

impl<'a, I, R> ArnResolver<'a, I, R>
where
    I: IdentityService,
    R: RoleLookupService,
{
    pub fn new(identity: &'a I, roles: &'a R) -> Self {
        Self { identity, roles }
    }

    pub async fn resolve(&self) -> PolicyCheckResult<Resolution> {
        let caller = self.identity.caller_arn().await?;
        let caller_arn: Arn = caller
            .parse()
            .map_err(|e| PolicyCheckError::malformed_caller_arn(&caller, &e))?;
        debug!("Caller identity: {caller_arn}");

        if caller_arn.service == "iam" {
            info!("The current principal is an IAM entity: {caller_arn}");
            return Ok(Resolution {
                principal: PrincipalArn::from(&caller_arn),
                source: PrincipalSource::IamEntity,
            });
        }

        if let Some(role_name) = caller_arn.assumed_role_name() {
            info!("The current principal is an assumed role, locating IAM entity: {caller_arn}");
            let role = self.roles.role_arn(role_name).await?;
            let role_arn: Arn = role
                .parse()
                .map_err(|e| PolicyCheckError::malformed_role_arn(&role, &e))?;
            info!("Located IAM entity: {role_arn}");
            return Ok(Resolution {
                principal: PrincipalArn::from(&role_arn),
                source: PrincipalSource::AssumedRole {
                    session_arn: caller_arn.to_string(),
                    role_name: role_name.to_string(),
                },
            });
        }

        debug!("No resolution rule for caller identity {caller_arn}, using it as is");
        Ok(Resolution {
            principal: PrincipalArn::from(&caller_arn),
            source: PrincipalSource::Unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubIdentity, StubRoles};

    #[tokio::test]
    async fn test_iam_caller_is_used_unchanged() {
        let identity = StubIdentity::ok("arn:aws:iam::123456789012:user/ci");
        let roles = StubRoles::ok("arn:aws:iam::123456789012:role/Unused");
        let resolution = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect("should resolve");

        assert_eq!(resolution.principal.as_str(), "arn:aws:iam::123456789012:user/ci");
        assert_eq!(resolution.source, PrincipalSource::IamEntity);
        assert!(roles.requested().is_empty());
    }

    #[tokio::test]
    async fn test_assumed_role_is_resolved_through_role_lookup() {
        let identity = StubIdentity::ok("arn:aws:sts::123456789012:assumed-role/MyRole/session-1");
        let roles = StubRoles::ok("arn:aws:iam::123456789012:role/service-role/MyRole");
        let resolution = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect("should resolve");

        assert_eq!(roles.requested(), vec!["MyRole".to_string()]);
        assert_eq!(
            resolution.principal.as_str(),
            "arn:aws:iam::123456789012:role/service-role/MyRole"
        );
        assert_eq!(
            resolution.source,
            PrincipalSource::AssumedRole {
                session_arn: "arn:aws:sts::123456789012:assumed-role/MyRole/session-1".to_string(),
                role_name: "MyRole".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_other_identity_shapes_pass_through() {
        let identity = StubIdentity::ok("arn:aws:sts::123456789012:federated-user/bob");
        let roles = StubRoles::ok("arn:aws:iam::123456789012:role/Unused");
        let resolution = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect("should resolve");

        assert_eq!(
            resolution.principal.as_str(),
            "arn:aws:sts::123456789012:federated-user/bob"
        );
        assert_eq!(resolution.source, PrincipalSource::Unresolved);
        assert!(roles.requested().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_caller_arn_is_identity_error() {
        let identity = StubIdentity::ok("aws:iam::123456789012:user/ci");
        let roles = StubRoles::ok("arn:aws:iam::123456789012:role/Unused");
        let err = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect_err("should fail");

        assert!(matches!(err, PolicyCheckError::Identity(_)));
    }

    #[tokio::test]
    async fn test_identity_service_failure_is_propagated() {
        let identity = StubIdentity::failing("expired token");
        let roles = StubRoles::ok("arn:aws:iam::123456789012:role/Unused");
        let err = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect_err("should fail");

        assert!(matches!(err, PolicyCheckError::Identity(ref m) if m.contains("expired token")));
    }

    #[tokio::test]
    async fn test_role_lookup_failures_are_role_lookup_errors() {
        let identity = StubIdentity::ok("arn:aws:sts::123456789012:assumed-role/MyRole/session-1");

        let failing = StubRoles::failing("NoSuchEntity");
        let err = ArnResolver::new(&identity, &failing)
            .resolve()
            .await
            .expect_err("should fail");
        assert!(matches!(err, PolicyCheckError::RoleLookup(_)));

        let malformed = StubRoles::ok("role/MyRole");
        let err = ArnResolver::new(&identity, &malformed)
            .resolve()
            .await
            .expect_err("should fail");
        assert!(matches!(err, PolicyCheckError::RoleLookup(_)));
    }

    #[tokio::test]
    async fn test_empty_assumed_role_name_still_goes_through_role_lookup() {
        let identity = StubIdentity::ok("arn:aws:sts::123456789012:assumed-role//session-1");
        let roles = StubRoles::failing("NoSuchEntity: role name must not be empty");
        let err = ArnResolver::new(&identity, &roles)
            .resolve()
            .await
            .expect_err("should fail");

        assert!(matches!(err, PolicyCheckError::RoleLookup(_)));
        assert_eq!(roles.requested(), vec![String::new()]);
    }
}
