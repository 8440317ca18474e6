//! Outbound message transport
//!
//! Relay nodes, the vessel sender and ground-station delivery all push a
//! single JSON envelope to an endpoint's ingress with one POST.

use crate::message::Message;
use crate::relay::error::{RelayError, RelayResult};
use async_trait::async_trait;
use std::time::Duration;

/// Sends one message to the ingress at `endpoint` ("host:port")
#[async_trait]
pub trait LinkTransport: Send + Sync + 'static {
    async fn send(&self, endpoint: &str, message: &Message) -> RelayResult<()>;
}

/// HTTP transport backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    fn url(endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}/")
        }
    }
}

#[async_trait]
impl LinkTransport for HttpTransport {
    async fn send(&self, endpoint: &str, message: &Message) -> RelayResult<()> {
        let response = self
            .client
            .post(Self::url(endpoint))
            .json(message)
            .send()
            .await
            .map_err(|e| RelayError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Rejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
