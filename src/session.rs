use crate::config::{SessionMode, SessionOptions};
use crate::error::BoxError;
use crate::storage::{DynamoStorageClient, StorageClient};
use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use aws_types::SdkConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Creates a session from `SessionOptions` and turns it into a storage client.
/// Called at most once per process by the handler, see `PingHandler::storage_client`.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Send;

    async fn create_session(&self, options: &SessionOptions) -> Result<Self::Session, BoxError>;

    fn new_client(&self, session: Self::Session) -> Arc<dyn StorageClient>;
}

/// Loads an AWS SDK config and builds a DynamoDB client from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsSessionFactory;

#[async_trait]
impl SessionFactory for AwsSessionFactory {
    type Session = SdkConfig;

    async fn create_session(&self, options: &SessionOptions) -> Result<SdkConfig, BoxError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        match options.mode {
            SessionMode::Shared => {
                // the provider chain finds the region unless it is overridden here
                if let Some(region) = &options.region {
                    loader = loader.region(Region::new(region.clone()));
                }
            }
            SessionMode::Explicit => {
                let region = match &options.region {
                    Some(v) => v.clone(),
                    None => return Err(BoxError::from("explicit session options require a region")),
                };
                loader = loader
                    .region(Region::new(region))
                    .credentials_provider(EnvironmentVariableCredentialsProvider::new());
            }
        }

        if let Some(endpoint_url) = &options.endpoint_url {
            info!("Using custom DynamoDB endpoint: {endpoint_url}");
            loader = loader.endpoint_url(endpoint_url.clone());
        }

        let config = loader.load().await;

        // there is no point in building a client that cannot sign requests for any region
        match config.region() {
            Some(region) => debug!("Session region: {region}"),
            None => {
                return Err(BoxError::from(
                    "no AWS region configured. Set AWS_REGION or PING_AWS_REGION",
                ))
            }
        }

        Ok(config)
    }

    fn new_client(&self, session: SdkConfig) -> Arc<dyn StorageClient> {
        Arc::new(DynamoStorageClient::new(&session))
    }
}
