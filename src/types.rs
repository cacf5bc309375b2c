use aws_lambda_events::apigw::ApiGatewayProxyResponse;
use aws_lambda_events::encodings::Body;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A DynamoDB item as sent to or returned by PutItem.
pub type Item = HashMap<String, AttributeValue>;

/// The payload of the incoming Lambda event, e.g. `{ "device": "abc123" }`.
/// A missing `device` property is treated the same as an empty one.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct DeviceRequest {
    #[serde(default)]
    pub device: String,
}

/// One row of the ping log table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: Uuid,
    pub device: String,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
}

impl LogRecord {
    /// A fresh record with a random id, stamped with the current time and not yet synced.
    pub fn new(device: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            device,
            timestamp: Utc::now(),
            synced: false,
        }
    }
}

/// Attributes reported back by the store after a successful write.
/// Serializes as plain JSON, see `encoding::AttributeJson`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredAttributes(pub(crate) Item);

impl From<Item> for StoredAttributes {
    fn from(item: Item) -> Self {
        Self(item)
    }
}

/// The handler output before it is wrapped into an API Gateway response.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestResponse {
    /// JSON-encoded stored attributes
    pub body: Vec<u8>,
    pub status_code: u16,
}

impl IngestResponse {
    pub const SUCCESS: u16 = 200;

    pub(crate) fn ok(body: Vec<u8>) -> Self {
        Self {
            body,
            status_code: Self::SUCCESS,
        }
    }
}

impl From<IngestResponse> for ApiGatewayProxyResponse {
    fn from(response: IngestResponse) -> Self {
        ApiGatewayProxyResponse {
            status_code: i64::from(response.status_code),
            // the encoders only produce JSON, so this is never lossy in practice
            body: Some(Body::Text(String::from_utf8_lossy(&response.body).into_owned())),
            ..Default::default()
        }
    }
}
