use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;

use crate::aws::IdentityService;
use crate::error::{PolicyCheckError, PolicyCheckResult};

/// STS binding of the caller identity service.
pub struct AwsStsClient {
    client: StsClient,
}

impl AwsStsClient {
    pub fn new(client: StsClient) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(StsClient::new(config))
    }
}

#[async_trait]
impl IdentityService for AwsStsClient {
    async fn caller_arn(&self) -> PolicyCheckResult<String> {
        let out = self.client.get_caller_identity().send().await.map_err(|e| {
            PolicyCheckError::identity(format!(
                "failed call to GetCallerIdentity: {}",
                DisplayErrorContext(&e)
            ))
        })?;
        out.arn()
            .map(str::to_string)
            .ok_or_else(|| PolicyCheckError::identity("GetCallerIdentity returned no ARN"))
    }
}
