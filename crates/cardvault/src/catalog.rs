use crate::prelude::*;
use std::future::Future;
use std::time::Duration;

use cardvault_core::catalog::{interpret_card, CatalogCard, LookupError, LookupResult};

/// Something that can resolve a catalog identifier into listing data
///
/// Implementations must be safe to call concurrently for many identifiers.
pub trait CardCatalog: Send + Sync {
    fn lookup(&self, id: &str) -> impl Future<Output = LookupResult> + Send;
}

/// Scryfall catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Applied to every lookup; a timed out lookup counts as failed.
    pub timeout: Duration,
    pub user_agent: String,
}

impl CatalogConfig {
    /// Default Scryfall API base URL
    pub const DEFAULT_BASE_URL: &'static str = "https://api.scryfall.com";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Load configuration from environment variables
    /// Uses SCRYFALL_BASE_URL with default fallback
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("SCRYFALL_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("cardvault/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }
}

/// Create an HTTP client carrying the headers Scryfall asks API users to send
pub fn create_catalog_client(config: &CatalogConfig) -> Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| eyre!("Invalid header value: {}", e))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Catalog backed by the Scryfall REST API
#[derive(Debug, Clone)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        Ok(Self {
            client: create_catalog_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_card(&self, id: &str) -> Result<CatalogCard, String> {
        let url = format!("{}/cards/{}", self.base_url, urlencoding::encode(id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch card {}: {}", id, e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Failed to fetch card {}: HTTP {}",
                id,
                response.status()
            ));
        }

        response
            .json::<CatalogCard>()
            .await
            .map_err(|e| format!("Failed to parse card {}: {}", id, e))
    }
}

impl CardCatalog for ScryfallClient {
    async fn lookup(&self, id: &str) -> LookupResult {
        match self.fetch_card(id).await {
            Ok(card) => interpret_card(&card),
            Err(message) => {
                log::debug!("{}", message);
                Err(LookupError::LookupFailed(message))
            }
        }
    }
}
