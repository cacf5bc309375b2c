use crate::config::{SessionOptions, TABLE_NAME};
use crate::encoding::{DynamoItemEncoder, ItemEncoder, JsonResponseEncoder, ResponseEncoder};
use crate::error::PingError;
use crate::session::SessionFactory;
use crate::storage::StorageClient;
use crate::types::{DeviceRequest, IngestResponse, LogRecord};
use aws_lambda_events::apigw::ApiGatewayProxyResponse;
use lambda_runtime::{Error, LambdaEvent};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, info_span, Instrument};

/// Validates a device ping, writes it to the ping log and echoes the stored item back as JSON.
///
/// All collaborators are injected so they can be replaced with mocks in tests.
/// The storage client is created on the first invocation that needs it and then reused
/// for the lifetime of the process.
pub struct PingHandler<F, I = DynamoItemEncoder, J = JsonResponseEncoder> {
    session_factory: F,
    session_options: SessionOptions,
    item_encoder: I,
    response_encoder: J,
    client: OnceCell<Arc<dyn StorageClient>>,
}

impl<F: SessionFactory> PingHandler<F> {
    /// A handler with the default DynamoDB and JSON encoders.
    pub fn new(session_factory: F, session_options: SessionOptions) -> Self {
        Self::with_encoders(session_factory, session_options, DynamoItemEncoder, JsonResponseEncoder)
    }
}

impl<F, I, J> PingHandler<F, I, J>
where
    F: SessionFactory,
    I: ItemEncoder,
    J: ResponseEncoder,
{
    pub fn with_encoders(session_factory: F, session_options: SessionOptions, item_encoder: I, response_encoder: J) -> Self {
        Self {
            session_factory,
            session_options,
            item_encoder,
            response_encoder,
            client: OnceCell::new(),
        }
    }

    /// Uses `client` from the start. The session factory is never called.
    pub fn with_storage_client(mut self, client: Arc<dyn StorageClient>) -> Self {
        self.client = OnceCell::new_with(Some(client));
        self
    }

    /// Runs a single ping through validate -> connect -> build record -> encode -> write -> respond.
    /// The first failing step ends the request.
    pub async fn handle(&self, request: DeviceRequest) -> Result<IngestResponse, PingError> {
        // cheap check first, before any connection is made
        if request.device.is_empty() {
            return Err(PingError::MissingDeviceId);
        }

        let client = self.storage_client().await?;

        let record = LogRecord::new(request.device);
        debug!("Log record: {:?}", record);

        let item = self
            .item_encoder
            .encode_item(&record)
            .map_err(PingError::StorageEncodingFailed)?;

        let attributes = client.put_item(TABLE_NAME, item).await.map_err(PingError::WriteFailed)?;
        info!("Logged ping {} from {}", record.id, record.device);

        let body = self
            .response_encoder
            .encode_response(&attributes)
            .map_err(PingError::ResponseEncodingFailed)?;

        Ok(IngestResponse::ok(body))
    }

    /// The entry point for `lambda_runtime`.
    /// Errors are logged and returned to the runtime as-is.
    pub async fn handle_event(&self, event: LambdaEvent<DeviceRequest>) -> Result<ApiGatewayProxyResponse, Error> {
        let (request, ctx) = event.into_parts();
        debug!("Event: {:?}", request);
        debug!("Context: {:?}", ctx);

        let span = info_span!("ping", request_id = %ctx.request_id);

        match self.handle(request).instrument(span).await {
            Ok(response) => Ok(response.into()),
            Err(e) => {
                error!("Ping failed for request {}: {e}", ctx.request_id);
                Err(Error::from(e))
            }
        }
    }

    /// Returns the cached client or creates one via the session factory.
    /// Concurrent callers wait for the same initialization. A failed attempt leaves
    /// the cell empty so the next request can try again.
    async fn storage_client(&self) -> Result<&Arc<dyn StorageClient>, PingError> {
        self.client
            .get_or_try_init(|| async {
                debug!("Creating a new session: {:?}", self.session_options);
                let session = self
                    .session_factory
                    .create_session(&self.session_options)
                    .await
                    .map_err(PingError::SessionSetupFailed)?;
                Ok::<_, PingError>(self.session_factory.new_client(session))
            })
            .await
    }
}
