use std::env::var;
use std::str::FromStr;
use tracing::{debug, warn};

/// DynamoDB table receiving the ping log.
/// TODO: read it from an env var once the table is provisioned per stage.
pub const TABLE_NAME: &str = "shop_ping_log";

/// How the AWS session discovers its region and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Standard provider chain: env vars, shared config/credentials files, container/instance metadata.
    #[default]
    Shared,
    /// Region must be set in `SessionOptions`, credentials come from env vars only.
    Explicit,
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "explicit" => Ok(Self::Explicit),
            _ => Err(format!("Unknown session mode: {s}. Use shared or explicit")),
        }
    }
}

/// Options passed to the session factory on the first invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub mode: SessionMode,
    /// E.g. us-east-1
    pub region: Option<String>,
    /// E.g. http://localhost:8000 for DynamoDB Local
    pub endpoint_url: Option<String>,
}

pub struct Config {
    pub session: SessionOptions,
}

impl Config {
    /// Creates a new Config instance from environment variables and defaults.
    /// Invalid values are logged and replaced with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Same as `from_env`, but reads the values through `lookup` so it can be tested without touching the process env.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup("PING_SESSION_MODE") {
            Some(v) => v.parse::<SessionMode>().unwrap_or_else(|e| {
                warn!("{e}. Falling back to shared.");
                SessionMode::Shared
            }),
            None => SessionMode::Shared,
        };

        // empty values are as good as missing
        let region = lookup("PING_AWS_REGION").filter(|v| !v.trim().is_empty());
        let endpoint_url = lookup("PING_DYNAMODB_ENDPOINT").filter(|v| !v.trim().is_empty());

        if mode == SessionMode::Explicit && region.is_none() {
            warn!("PING_SESSION_MODE=explicit requires PING_AWS_REGION. Session setup will fail.");
        }

        debug!("Session mode: {:?}, region: {:?}, endpoint: {:?}", mode, region, endpoint_url);

        Self {
            session: SessionOptions {
                mode,
                region,
                endpoint_url,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_shared_config() {
        let config = config_from(&[]);
        assert_eq!(config.session, SessionOptions::default());
        assert_eq!(config.session.mode, SessionMode::Shared);
    }

    #[test]
    fn reads_explicit_options() {
        let config = config_from(&[
            ("PING_SESSION_MODE", "Explicit"),
            ("PING_AWS_REGION", "ap-southeast-2"),
            ("PING_DYNAMODB_ENDPOINT", "http://localhost:8000"),
        ]);
        assert_eq!(config.session.mode, SessionMode::Explicit);
        assert_eq!(config.session.region.as_deref(), Some("ap-southeast-2"));
        assert_eq!(config.session.endpoint_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn invalid_mode_falls_back_to_shared() {
        let config = config_from(&[("PING_SESSION_MODE", "sideways"), ("PING_AWS_REGION", " ")]);
        assert_eq!(config.session.mode, SessionMode::Shared);
        assert!(config.session.region.is_none());
    }
}
