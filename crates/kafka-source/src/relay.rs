//! Delivery of decoded events to the stats server.

use crate::error::RelayError;
use reqwest::{Client, StatusCode, Url};
use stats_types::RelayPayload;
use std::time::Duration;

/// Something that accepts one decoded event at a time.
#[async_trait::async_trait]
pub trait Relay: Send + Sync {
    async fn relay(&self, payload: &RelayPayload) -> Result<(), RelayError>;
}

/// Where and how long to wait when posting to the stats server.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// `host:port` or a full base URL of the stats server.
    pub address: String,
    /// Bound on a single relay call, connect included.
    pub timeout: Duration,
}

impl RelayConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Posts payloads as JSON to `{address}/stats`.
pub struct HttpRelay {
    client: Client,
    endpoint: Url,
}

impl HttpRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let endpoint = stats_endpoint(&config.address)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Relay for HttpRelay {
    async fn relay(&self, payload: &RelayPayload) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout(e.to_string())
                } else {
                    RelayError::Transport(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            other => Err(RelayError::Status(other.as_u16())),
        }
    }
}

fn stats_endpoint(address: &str) -> Result<Url, RelayError> {
    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let mut url = Url::parse(&with_scheme)
        .map_err(|e| RelayError::InvalidConfig(format!("stats server address '{address}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| RelayError::InvalidConfig("stats server address cannot be a base".into()))?
        .pop_if_empty()
        .push("stats");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_port_gets_http_scheme() {
        let url = stats_endpoint("localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/stats");
    }

    #[test]
    fn test_base_path_is_preserved() {
        let url = stats_endpoint("https://stats.internal/pipeline/").unwrap();
        assert_eq!(url.as_str(), "https://stats.internal/pipeline/stats");
    }

    #[test]
    fn test_garbage_address_is_a_config_error() {
        assert!(matches!(
            stats_endpoint("http://"),
            Err(RelayError::InvalidConfig(_))
        ));
    }
}
