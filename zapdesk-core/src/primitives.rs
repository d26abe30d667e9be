//! This module contains the LNURL-pay request and response objects (LUD-06, LUD-16)
//! together with the validated [`PayParameters`] derived from a discovery response.

use bitcoin_hashes::{sha256, Hash};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use url::Url;

use crate::{amount::Millisats, error::ZapdeskCoreError};

pub const PAY_REQUEST_TAG: &str = "payRequest";
pub const STATUS_ERROR: &str = "ERROR";

const METADATA_PLAIN_TEXT: &str = "text/plain";

/// Discovery response of a LNURL-pay endpoint.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LnurlPayResponse {
    pub callback: String,
    /// in millisats
    pub min_sendable: u64,
    /// in millisats
    pub max_sendable: u64,
    /// json encoded list of `[mime-type, content]` pairs
    pub metadata: String,
    pub tag: Option<String>,
    pub comment_allowed: Option<u64>,
}

/// Response of the callback url, carrying the bolt11 invoice.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LnurlCallbackResponse {
    pub pr: Option<String>,
    pub success_action: Option<Value>,
    /// `null` and a missing field both mean no routes
    pub routes: Option<Vec<Value>>,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LnurlStatusResponse {
    pub status: String,
    pub reason: Option<String>,
}

/// Returns the reason of an explicit LNURL error (`{"status": "ERROR", "reason": ...}`).
pub fn lnurl_error_reason(body: &Value) -> Option<String> {
    let status = serde_json::from_value::<LnurlStatusResponse>(body.clone()).ok()?;
    if !status.status.eq_ignore_ascii_case(STATUS_ERROR) {
        return None;
    }
    Some(
        status
            .reason
            .unwrap_or_else(|| "no reason given".to_owned()),
    )
}

/// Validated parameters of a LNURL-pay endpoint. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayParameters {
    pub callback: Url,
    pub min_sendable: Millisats,
    pub max_sendable: Millisats,
    pub metadata: String,
    pub comment_allowed: u64,
}

impl PayParameters {
    pub fn accepts(&self, amount: Millisats) -> bool {
        amount >= self.min_sendable && amount <= self.max_sendable
    }

    /// sha256 of the raw metadata string, as committed to by the invoice description hash
    pub fn metadata_hash(&self) -> sha256::Hash {
        sha256::Hash::hash(self.metadata.as_bytes())
    }

    /// The `text/plain` entry of the metadata, if there is one.
    pub fn description(&self) -> Option<String> {
        let entries = serde_json::from_str::<Vec<Vec<Value>>>(&self.metadata).ok()?;
        entries.into_iter().find_map(|entry| match entry.as_slice() {
            [Value::String(mime), Value::String(content), ..] if mime == METADATA_PLAIN_TEXT => {
                Some(content.to_owned())
            }
            _ => None,
        })
    }
}

impl TryFrom<LnurlPayResponse> for PayParameters {
    type Error = ZapdeskCoreError;

    fn try_from(response: LnurlPayResponse) -> Result<Self, Self::Error> {
        if let Some(tag) = &response.tag {
            if tag != PAY_REQUEST_TAG {
                return Err(ZapdeskCoreError::InvalidPayParameters(format!(
                    "expected tag '{PAY_REQUEST_TAG}', got '{tag}'"
                )));
            }
        }

        let callback = Url::parse(&response.callback).map_err(|e| {
            ZapdeskCoreError::InvalidPayParameters(format!(
                "invalid callback url {:?}: {e}",
                response.callback
            ))
        })?;
        if !matches!(callback.scheme(), "https" | "http") {
            return Err(ZapdeskCoreError::InvalidPayParameters(format!(
                "unsupported callback scheme {}",
                callback.scheme()
            )));
        }

        if response.max_sendable < response.min_sendable {
            return Err(ZapdeskCoreError::InvalidPayParameters(format!(
                "maxSendable {} is below minSendable {}",
                response.max_sendable, response.min_sendable
            )));
        }

        Ok(Self {
            callback,
            min_sendable: Millisats(response.min_sendable),
            max_sendable: Millisats(response.max_sendable),
            metadata: response.metadata,
            comment_allowed: response.comment_allowed.unwrap_or_default(),
        })
    }
}
