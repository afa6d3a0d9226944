use async_trait::async_trait;
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, GatewayError};

const USER_AGENT: &str = concat!("rarity-service/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One outbound GET. Implementations never retry; that is the gateway's job.
#[async_trait]
pub trait HttpSource {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<RawResponse, GatewayError>;
}

pub type Source = Arc<dyn HttpSource + Send + Sync>;

pub struct ReqwestSource {
    client: Client,
}

impl ReqwestSource {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<RawResponse, GatewayError> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
