use std::time::Duration;

use clap::Parser;
use url::Url;

pub const DEFAULT_LIGHTNING_ADDRESS: &str = "covertbrian73@walletofsatoshi.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_MIN_INVOICE_LENGTH: usize = 20;
pub const DEFAULT_QR_MIN_DIMENSION: u32 = 256;

#[derive(Debug, Clone, Parser)]
pub struct ResolverConfig {
    /// Timeout for each discovery and invoice request
    #[clap(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        env = "ZAPDESK_REQUEST_TIMEOUT_SECS"
    )]
    pub request_timeout_secs: u64,

    /// How long discovered pay parameters are reused
    #[clap(
        long,
        default_value_t = DEFAULT_CACHE_TTL_SECS,
        env = "ZAPDESK_CACHE_TTL_SECS"
    )]
    pub cache_ttl_secs: u64,

    #[clap(
        long,
        default_value_t = DEFAULT_MIN_INVOICE_LENGTH,
        env = "ZAPDESK_MIN_INVOICE_LENGTH"
    )]
    pub min_invoice_length: usize,

    /// Minimum width and height of the rendered svg in pixels
    #[clap(
        long,
        default_value_t = DEFAULT_QR_MIN_DIMENSION,
        env = "ZAPDESK_QR_MIN_DIMENSION"
    )]
    pub qr_min_dimension: u32,

    /// Proxy for all requests, e.g. socks5h://127.0.0.1:9050 for onion addresses
    #[clap(long, env = "ZAPDESK_PROXY")]
    pub proxy: Option<String>,
}

impl ResolverConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            min_invoice_length: DEFAULT_MIN_INVOICE_LENGTH,
            qr_min_dimension: DEFAULT_QR_MIN_DIMENSION,
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub struct DirectoryConfig {
    /// Used whenever the directory has no lightning address for a payee
    #[clap(
        long,
        default_value = DEFAULT_LIGHTNING_ADDRESS,
        env = "ZAPDESK_DEFAULT_ADDRESS"
    )]
    pub default_address: String,

    /// Base url of the agent directory service (serves /api/get-agent)
    #[clap(long, env = "ZAPDESK_DIRECTORY_URL")]
    pub directory_url: Option<Url>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_address: DEFAULT_LIGHTNING_ADDRESS.to_owned(),
            directory_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::{DirectoryConfig, ResolverConfig, DEFAULT_LIGHTNING_ADDRESS};

    #[test]
    fn test_parse_defaults_match_default_impl() -> anyhow::Result<()> {
        let parsed = ResolverConfig::try_parse_from(["zapdesk"])?;
        let default = ResolverConfig::default();
        assert_eq!(default.request_timeout(), parsed.request_timeout());
        assert_eq!(default.cache_ttl(), parsed.cache_ttl());
        assert_eq!(default.min_invoice_length, parsed.min_invoice_length);
        assert_eq!(default.qr_min_dimension, parsed.qr_min_dimension);
        Ok(())
    }

    #[test]
    fn test_parse_overrides() -> anyhow::Result<()> {
        let parsed = ResolverConfig::try_parse_from([
            "zapdesk",
            "--request-timeout-secs",
            "3",
            "--cache-ttl-secs",
            "60",
        ])?;
        assert_eq!(3, parsed.request_timeout().as_secs());
        assert_eq!(60, parsed.cache_ttl().as_secs());
        Ok(())
    }

    #[test]
    fn test_directory_defaults() -> anyhow::Result<()> {
        let parsed = DirectoryConfig::try_parse_from([
            "zapdesk",
            "--directory-url",
            "https://tips.example.com",
        ])?;
        assert_eq!(DEFAULT_LIGHTNING_ADDRESS, parsed.default_address);
        assert_eq!(
            Some("https://tips.example.com/"),
            parsed.directory_url.as_ref().map(|u| u.as_str())
        );
        Ok(())
    }
}
