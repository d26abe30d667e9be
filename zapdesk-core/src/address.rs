//! Lightning addresses (LUD-16).
//!
//! A lightning address looks like an email address (`user@domain.com`) and maps to a
//! LNURL-pay endpoint under `https://domain.com/.well-known/lnurlp/user`.
//! Parsing is pure: no network access happens here.

use std::{fmt::Display, str::FromStr};

use url::Url;

use crate::error::ZapdeskCoreError;

const LIGHTNING_URI_PREFIX: &str = "lightning:";

const WELL_KNOWN_PATH: [&str; 2] = [".well-known", "lnurlp"];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LightningAddress {
    local_part: String,
    domain: String,
}

impl LightningAddress {
    pub fn parse(address: &str) -> Result<Self, ZapdeskCoreError> {
        let trimmed = strip_uri_prefix(address.trim());

        let (local_part, domain) = trimmed
            .split_once('@')
            .ok_or_else(|| ZapdeskCoreError::invalid_address(address, "missing '@'"))?;

        if domain.contains('@') {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "more than one '@'",
            ));
        }
        if local_part.is_empty() {
            return Err(ZapdeskCoreError::invalid_address(address, "empty user part"));
        }
        if domain.is_empty() {
            return Err(ZapdeskCoreError::invalid_address(address, "empty domain"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "contains whitespace",
            ));
        }
        if domain.contains(['/', '?', '#', '\\', ':']) {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "domain contains url delimiters",
            ));
        }
        if !domain.contains('.') {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "domain has no '.'",
            ));
        }
        if !local_part.chars().all(is_local_part_char) {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "user part may only contain letters, digits and '-_.+'",
            ));
        }
        // dot segments would be resolved away in the discovery url
        if matches!(local_part, "." | "..") {
            return Err(ZapdeskCoreError::invalid_address(
                address,
                "user part is a dot segment",
            ));
        }

        Ok(Self {
            local_part: local_part.to_owned(),
            domain: domain.to_owned(),
        })
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Case-insensitive identity of the address, used to key cached pay parameters.
    pub fn cache_key(&self) -> String {
        format!(
            "{}@{}",
            self.local_part.to_lowercase(),
            self.domain.to_lowercase()
        )
    }

    pub fn is_onion(&self) -> bool {
        self.domain.to_lowercase().ends_with(".onion")
    }

    /// The LNURL-pay discovery url: `https://<domain>/.well-known/lnurlp/<user>`.
    /// Onion services are reached over plain http.
    pub fn discovery_url(&self) -> Result<Url, ZapdeskCoreError> {
        let scheme = if self.is_onion() { "http" } else { "https" };
        let address = self.to_string();

        let mut url = Url::parse(&format!("{scheme}://{}/", self.domain))
            .map_err(|e| ZapdeskCoreError::invalid_address(&address, e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ZapdeskCoreError::invalid_address(&address, "domain is not a host"))?
            .clear()
            .extend(WELL_KNOWN_PATH)
            .push(&self.local_part);
        Ok(url)
    }
}

/// LUD-16 allows `a-z0-9-_.`; upper case and `+` are accepted as seen in the wild.
const fn is_local_part_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

fn strip_uri_prefix(value: &str) -> &str {
    match value.get(..LIGHTNING_URI_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(LIGHTNING_URI_PREFIX) => {
            &value[LIGHTNING_URI_PREFIX.len()..]
        }
        _ => value,
    }
}

impl FromStr for LightningAddress {
    type Err = ZapdeskCoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for LightningAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::LightningAddress;
    use crate::error::ZapdeskCoreError;

    #[test]
    fn test_parse_address() -> anyhow::Result<()> {
        let address = LightningAddress::parse("agent@example.com")?;
        assert_eq!("agent", address.local_part());
        assert_eq!("example.com", address.domain());
        assert_eq!("agent@example.com", address.to_string());
        Ok(())
    }

    #[test]
    fn test_parse_keeps_case_and_roundtrips() -> anyhow::Result<()> {
        for input in [
            "covertbrian73@walletofsatoshi.com",
            "Alice.B+tips@Pay.Example.ORG",
            "x@a.b",
            "_-_@sub.domain.co.uk",
        ] {
            let address: LightningAddress = input.parse()?;
            assert_eq!(input, format!("{}@{}", address.local_part(), address.domain()));
        }
        Ok(())
    }

    #[test]
    fn test_parse_trims_and_strips_uri_prefix() -> anyhow::Result<()> {
        let address = LightningAddress::parse("  LIGHTNING:agent@example.com \n")?;
        assert_eq!("agent@example.com", address.to_string());
        Ok(())
    }

    #[test]
    fn test_invalid_addresses() {
        for input in [
            "",
            "agent",
            "agent.example.com",
            "@example.com",
            "agent@",
            "agent@example",
            "a@b@example.com",
            "agent@@example.com",
            "age nt@example.com",
            "agent@exa mple.com",
            "lightning:",
            ".@example.com",
            "..@example.com",
            "ag/ent@example.com",
            "ag%2Fent@example.com",
            "agent?x=1@example.com",
            "agent#x@example.com",
            "ag:ent@example.com",
            "lightning:lightning:agent@example.com",
        ] {
            let result = LightningAddress::parse(input);
            assert!(
                matches!(result, Err(ZapdeskCoreError::InvalidAddressFormat { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_cache_key_is_lowercase() -> anyhow::Result<()> {
        let upper = LightningAddress::parse("Agent@Example.COM")?;
        let lower = LightningAddress::parse("agent@example.com")?;
        assert_eq!(upper.cache_key(), lower.cache_key());
        assert_eq!("agent@example.com", upper.cache_key());
        Ok(())
    }

    #[test]
    fn test_discovery_url() -> anyhow::Result<()> {
        let address = LightningAddress::parse("agent@example.com")?;
        assert_eq!(
            "https://example.com/.well-known/lnurlp/agent",
            address.discovery_url()?.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_discovery_url_ends_with_user_part() -> anyhow::Result<()> {
        for input in ["a.b@example.com", "...@example.com", "x-y_z+1@example.com"] {
            let address = LightningAddress::parse(input)?;
            let url = address.discovery_url()?;
            assert_eq!(
                Some(address.local_part()),
                url.path_segments().and_then(|mut segments| segments.next_back()),
                "{input}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_discovery_url_onion_uses_http() -> anyhow::Result<()> {
        let address = LightningAddress::parse("tips@abcdefghij.onion")?;
        assert!(address.is_onion());
        assert_eq!(
            "http://abcdefghij.onion/.well-known/lnurlp/tips",
            address.discovery_url()?.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_domain_with_url_delimiters_is_rejected() {
        for input in ["agent@exa/mple.com", "agent@example.com:8080", "agent@example.com?x"] {
            assert!(LightningAddress::parse(input).is_err(), "{input:?}");
        }
    }
}
