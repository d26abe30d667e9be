use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::ClientError;

#[cfg(test)]
use mockall::automock;

/// Transport used for both LNURL-pay round trips (discovery and callback).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LnurlClient: Send + Sync {
    /// Issues a GET request and returns the json body of a successful (2xx) response.
    async fn get_json(&self, url: &Url) -> Result<Value, ClientError>;
}

#[async_trait]
impl<T: LnurlClient + ?Sized> LnurlClient for Arc<T> {
    async fn get_json(&self, url: &Url) -> Result<Value, ClientError> {
        (**self).get_json(url).await
    }
}
