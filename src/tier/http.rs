use crate::tier::{DistributedCache, TierError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTL header honored by the cache gateway on writes.
const TTL_HEADER: &str = "X-Cache-TTL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTierConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for HttpTierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_ms: 250,
        }
    }
}

/// Shared cache tier behind an HTTP gateway. The timeout is deliberately
/// short: a slow distributed tier must never cost more than falling
/// through to the index.
#[derive(Debug, Clone)]
pub struct HttpTier {
    base_url: String,
    api_key: Option<String>,
    http_client: Client,
}

impl HttpTier {
    pub fn new(config: HttpTierConfig) -> Result<Self, TierError> {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TierError::NetworkError(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            http_client,
        })
    }

    fn entry_url(&self, key: &str) -> String {
        format!("{}/cache/{}", self.base_url, key)
    }
}

#[async_trait]
impl DistributedCache for HttpTier {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, TierError> {
        let mut request = self.http_client.get(self.entry_url(key));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TierError::NetworkError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| TierError::NetworkError(e.to_string()))?;
            Ok(Some(body))
        } else {
            Err(TierError::NetworkError(format!(
                "get {} failed: {}",
                key,
                response.status()
            )))
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), TierError> {
        let mut request = self
            .http_client
            .put(self.entry_url(key))
            .header(TTL_HEADER, ttl.as_secs().to_string())
            .body(value);

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TierError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TierError::NetworkError(format!(
                "set {} failed: {}",
                key,
                response.status()
            )))
        }
    }

    async fn close(&self) -> Result<(), TierError> {
        // Connections are pooled by the client and dropped with it.
        Ok(())
    }
}
