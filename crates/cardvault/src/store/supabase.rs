use crate::prelude::*;
use cardvault_core::record::CollectionRecord;
use serde::{Deserialize, Serialize};

use super::CollectionStore;

/// Supabase configuration from environment variables
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    /// User session token; requests fall back to the anon key without one
    pub access_token: Option<String>,
    pub table: String,
}

impl SupabaseConfig {
    pub const DEFAULT_TABLE: &'static str = "collections";

    /// Load configuration from environment variables
    ///
    /// Returns `None` unless both SUPABASE_URL and SUPABASE_ANON_KEY are set.
    /// SUPABASE_ACCESS_TOKEN and SUPABASE_TABLE are optional.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let api_key = std::env::var("SUPABASE_ANON_KEY").ok()?;

        Some(Self {
            url,
            api_key,
            access_token: std::env::var("SUPABASE_ACCESS_TOKEN").ok(),
            table: std::env::var("SUPABASE_TABLE")
                .unwrap_or_else(|_| Self::DEFAULT_TABLE.to_string()),
        })
    }
}

/// Create an HTTP client with the Supabase API key and bearer token headers
pub fn create_supabase_client(config: &SupabaseConfig) -> Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

    let bearer = config.access_token.as_deref().unwrap_or(&config.api_key);

    let mut headers = HeaderMap::new();
    headers.insert(
        "apikey",
        HeaderValue::from_str(&config.api_key)
            .map_err(|e| eyre!("Invalid header value: {}", e))?,
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|e| eyre!("Invalid header value: {}", e))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Collections stored in a Supabase (PostgREST) table keyed by `user_id`
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
}

#[derive(Debug, Serialize)]
struct CollectionRowRef<'a> {
    user_id: &'a str,
    data: &'a [CollectionRecord],
}

#[derive(Debug, Deserialize)]
struct CollectionRow {
    #[serde(default)]
    data: Option<Vec<CollectionRecord>>,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        Ok(Self {
            client: create_supabase_client(config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

impl CollectionStore for SupabaseStore {
    async fn save(&self, user_id: &str, records: &[CollectionRecord]) -> Result<(), Error> {
        let rows = [CollectionRowRef {
            user_id,
            data: records,
        }];

        let response = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to send request to Supabase: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Supabase upsert failed [{}]: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Option<Vec<CollectionRecord>>, Error> {
        let user_filter = format!("eq.{user_id}");

        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "data"), ("user_id", user_filter.as_str())])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to send request to Supabase: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Supabase select failed [{}]: {}",
                status, body
            )));
        }

        let rows: Vec<CollectionRow> = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Failed to parse Supabase response: {}", e)))?;

        Ok(rows.into_iter().next().and_then(|row| row.data))
    }
}
