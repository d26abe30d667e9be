//! Maps a payee identity (an agent email) to a lightning address.
//!
//! Lookups never fail: a missing or unreachable directory entry is `None`, and
//! [`resolve_address`] turns that into [`AddressChoice::UseDefault`]. This is the
//! only place where the fallback decision is made.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::client::LnurlClient;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressChoice {
    Use(String),
    UseDefault,
}

impl From<Option<String>> for AddressChoice {
    fn from(lookup: Option<String>) -> Self {
        match lookup.map(|address| address.trim().to_owned()) {
            Some(address) if !address.is_empty() => Self::Use(address),
            _ => Self::UseDefault,
        }
    }
}

#[async_trait]
pub trait PayeeDirectory: Send + Sync {
    async fn lookup(&self, identity: &str) -> Option<String>;
}

pub async fn resolve_address<D>(directory: &D, identity: &str) -> AddressChoice
where
    D: PayeeDirectory + ?Sized,
{
    let identity = identity.trim();
    if identity.is_empty() {
        return AddressChoice::UseDefault;
    }
    directory.lookup(identity).await.into()
}

/// In-memory directory, identities compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn insert(&mut self, identity: &str, address: impl Into<String>) {
        self.entries
            .insert(identity.trim().to_lowercase(), address.into());
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for StaticDirectory {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut directory = Self::default();
        for (identity, address) in iter {
            directory.insert(identity.as_ref(), address);
        }
        directory
    }
}

#[async_trait]
impl PayeeDirectory for StaticDirectory {
    async fn lookup(&self, identity: &str) -> Option<String> {
        self.entries.get(&identity.trim().to_lowercase()).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct AgentRecord {
    lightning_address: Option<String>,
    agent_name: Option<String>,
}

/// Agent directory service answering `GET <base>/api/get-agent?agent_email=<identity>`.
#[derive(Debug, Clone)]
pub struct HttpDirectory<C> {
    base_url: Url,
    client: C,
}

impl<C: LnurlClient> HttpDirectory<C> {
    pub fn new(base_url: Url, client: C) -> Self {
        Self { base_url, client }
    }

    fn lookup_url(&self, identity: &str) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "get-agent"]);
        url.query_pairs_mut().append_pair("agent_email", identity);
        Some(url)
    }
}

#[async_trait]
impl<C: LnurlClient> PayeeDirectory for HttpDirectory<C> {
    async fn lookup(&self, identity: &str) -> Option<String> {
        let Some(url) = self.lookup_url(identity) else {
            warn!("directory url {} cannot have a path", self.base_url);
            return None;
        };

        let body = match self.client.get_json(&url).await {
            Ok(body) => body,
            Err(err) => {
                warn!("directory lookup for {} failed: {}", identity, err);
                return None;
            }
        };

        match serde_json::from_value::<AgentRecord>(body) {
            Ok(record) => {
                debug!(
                    "directory lists {} ({}) as {:?}",
                    identity,
                    record.agent_name.as_deref().unwrap_or("unnamed"),
                    record.lightning_address
                );
                record.lightning_address
            }
            Err(err) => {
                warn!("unexpected directory response for {}: {}", identity, err);
                None
            }
        }
    }
}
