use super::HttpClient;
use crate::{client::LnurlClient, config::ResolverConfig, error::ClientError};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Response,
};
use serde_json::Value;
use tracing::debug;
use url::Url;
use zapdesk_core::primitives::lnurl_error_reason;

const MAX_REASON_CHARS: usize = 200;

impl HttpClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn extract_response_data(response: Response) -> Result<Value, ClientError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| lnurl_error_reason(&body))
                .unwrap_or_else(|| text.chars().take(MAX_REASON_CHARS).collect());
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        serde_json::from_str::<Value>(&text).map_err(|e| ClientError::InvalidJson(e.to_string()))
    }
}

#[async_trait]
impl LnurlClient for HttpClient {
    async fn get_json(&self, url: &Url) -> Result<Value, ClientError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        Self::extract_response_data(resp).await
    }
}
