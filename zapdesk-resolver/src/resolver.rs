use std::sync::Arc;

use tracing::{debug, info, warn};
use zapdesk_core::{
    address::LightningAddress,
    primitives::{lnurl_error_reason, LnurlPayResponse, PayParameters},
};

use crate::{
    cache::PayParametersCache,
    client::LnurlClient,
    error::{ClientError, ResolutionError},
};

/// Maps a lightning address to the pay parameters of its LNURL-pay endpoint.
#[derive(Debug, Clone)]
pub struct EndpointResolver<C> {
    client: C,
    cache: Arc<PayParametersCache>,
}

impl<C: LnurlClient> EndpointResolver<C> {
    pub fn new(client: C, cache: Arc<PayParametersCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<PayParametersCache> {
        &self.cache
    }

    pub async fn resolve(
        &self,
        address: &LightningAddress,
    ) -> Result<Arc<PayParameters>, ResolutionError> {
        let key = address.cache_key();
        if let Some(params) = self.cache.get(&key) {
            debug!("pay parameters for {} served from cache", key);
            return Ok(params);
        }

        let url = address.discovery_url()?;
        info!("fetching pay parameters for {} from {}", address, url);

        let body = self.client.get_json(&url).await.map_err(|err| {
            warn!("discovery for {} failed: {}", address, err);
            match err {
                ClientError::InvalidJson(reason) => ResolutionError::MalformedPayParameters(reason),
                other => ResolutionError::EndpointUnreachable(other.to_string()),
            }
        })?;

        if let Some(reason) = lnurl_error_reason(&body) {
            return Err(ResolutionError::MalformedPayParameters(format!(
                "endpoint returned an error: {reason}"
            )));
        }

        let response = serde_json::from_value::<LnurlPayResponse>(body)
            .map_err(|e| ResolutionError::MalformedPayParameters(e.to_string()))?;
        let params = Arc::new(PayParameters::try_from(response)?);

        debug!(
            "{} accepts {} - {}",
            address, params.min_sendable, params.max_sendable
        );
        self.cache.insert(key, params.clone());
        Ok(params)
    }
}
