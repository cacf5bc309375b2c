//! An AWS Lambda that records device pings in DynamoDB.
//!
//! The handler takes `{ "device": "..." }`, writes a timestamped, unsynced log record
//! to the `shop_ping_log` table and returns the stored item as JSON.

pub mod config;
pub mod encoding;
pub mod error;
pub mod handler;
pub mod session;
pub mod storage;
pub mod types;

pub use error::{BoxError, PingError};
pub use handler::PingHandler;
