use crate::error::BoxError;
use crate::types::{Item, StoredAttributes};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_types::SdkConfig;
use tracing::{debug, error};

/// The write side of the store. A single unconditional create-or-overwrite per call.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_item(&self, table: &str, item: Item) -> Result<StoredAttributes, BoxError>;
}

pub struct DynamoStorageClient {
    client: DynamoClient,
}

impl DynamoStorageClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: DynamoClient::new(config),
        }
    }
}

#[async_trait]
impl StorageClient for DynamoStorageClient {
    async fn put_item(&self, table: &str, item: Item) -> Result<StoredAttributes, BoxError> {
        debug!("PutItem into {table}: {:?}", item);

        // no condition expression: a random id never collides in practice
        // no ReturnValues either: PutItem can only return the overwritten attributes
        if let Err(e) = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item.clone()))
            .send()
            .await
        {
            error!("PutItem into {table} failed: {}", DisplayErrorContext(&e));
            return Err(BoxError::from(e));
        };

        // after an unconditional put the stored item is exactly what was written
        Ok(StoredAttributes::from(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TABLE_NAME;
    use aws_config::BehaviorVersion;
    use aws_sdk_dynamodb::config::Credentials;
    use aws_sdk_dynamodb::types::AttributeValue;
    use aws_types::region::Region;
    use http_body_util::{BodyExt, Full};
    use hyper::body::{Bytes, Incoming};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use serde_json::Value;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// A request as seen by the stub: the X-Amz-Target header and the JSON body.
    type Captured = (String, Value);

    /// Serves every request with `status` and `body`, passing each request it receives to the returned channel.
    /// Returns the endpoint URL to point the SDK at.
    async fn stub_dynamodb(status: StatusCode, body: &'static str) -> (String, mpsc::UnboundedReceiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind the stub listener");
        let endpoint = format!("http://{}", listener.local_addr().expect("Stub listener has no address"));
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => return,
                };
                let tx = tx.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        async move {
                            let target = req
                                .headers()
                                .get("x-amz-target")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or_default()
                                .to_string();
                            let req_body = req.into_body().collect().await?.to_bytes();
                            let req_body = serde_json::from_slice(&req_body).unwrap_or(Value::Null);
                            let _ = tx.send((target, req_body));

                            Ok::<_, hyper::Error>(
                                Response::builder()
                                    .status(status)
                                    .header("content-type", "application/x-amz-json-1.0")
                                    .body(Full::new(Bytes::from_static(body.as_bytes())))
                                    .expect("Failed to create a response"),
                            )
                        }
                    });

                    let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await;
                });
            }
        });

        (endpoint, rx)
    }

    async fn client_for(endpoint: &str) -> DynamoStorageClient {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("AKIDPINGTEST", "secret", None, None, "test"))
            .load()
            .await;
        DynamoStorageClient::new(&config)
    }

    fn item() -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::S("0b4e3f7c-2d1a-4c8e-9f6b-1a2b3c4d5e6f".to_string())),
            ("device".to_string(), AttributeValue::S("abc123".to_string())),
            ("synced".to_string(), AttributeValue::Bool(false)),
        ])
    }

    #[tokio::test]
    async fn put_item_is_a_plain_unconditional_write() {
        let (endpoint, mut requests) = stub_dynamodb(StatusCode::OK, "{}").await;
        let client = client_for(&endpoint).await;

        let stored = client.put_item(TABLE_NAME, item()).await.expect("the stub accepts the write");

        // the written item is what gets reported back
        assert_eq!(stored, StoredAttributes::from(item()));

        let (target, body) = requests.recv().await.expect("the stub saw the request");
        assert_eq!(target, "DynamoDB_20120810.PutItem");
        assert_eq!(body["TableName"], TABLE_NAME);
        assert_eq!(body["Item"]["device"]["S"], "abc123");
        assert_eq!(body["Item"]["synced"]["BOOL"], false);
        assert!(body.get("ConditionExpression").is_none(), "{body}");
        assert!(body.get("ReturnValues").is_none(), "{body}");

        // exactly one write
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn sdk_errors_are_returned() {
        let (endpoint, mut requests) = stub_dynamodb(
            StatusCode::BAD_REQUEST,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
        )
        .await;
        let client = client_for(&endpoint).await;

        let err = client.put_item(TABLE_NAME, item()).await.expect_err("the stub rejects the write");

        let err = err
            .downcast_ref::<aws_sdk_dynamodb::error::SdkError<aws_sdk_dynamodb::operation::put_item::PutItemError>>()
            .expect("the SDK error is passed through unchanged");
        assert!(
            err.as_service_error().map(|e| e.is_resource_not_found_exception()).unwrap_or(false),
            "{}",
            DisplayErrorContext(err)
        );

        // not retried
        assert!(requests.recv().await.is_some());
        assert!(requests.try_recv().is_err());
    }
}
