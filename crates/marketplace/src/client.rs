use std::time::Duration;

use {async_trait::async_trait, reqwest::Client, tracing::debug};

use crate::{
    error::{Error, Result},
    normalize::normalize_records,
    types::MarketplaceRecord,
};

/// Longest response body excerpt kept in a [`Error::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Read access to the remote marketplace.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Fetch one zero-based page of the all-time listing.
    async fn fetch_page(&self, page: u32) -> Result<Vec<MarketplaceRecord>>;

    /// Keyword search. A single, exhaustive page.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MarketplaceRecord>>;
}

/// HTTP implementation against the marketplace JSON API.
pub struct HttpMarketplaceClient {
    client: Client,
    base_url: String,
}

impl HttpMarketplaceClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_records(&self, url: &str) -> Result<Vec<MarketplaceRecord>> {
        debug!(%url, "marketplace request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut excerpt = body.trim().to_string();
            if excerpt.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
            }
            return Err(Error::Status {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::Parse(e.to_string()))?;
        Ok(normalize_records(value))
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn fetch_page(&self, page: u32) -> Result<Vec<MarketplaceRecord>> {
        let url = format!("{}/api/skills/all-time/{page}", self.base_url);
        self.get_records(&url).await
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MarketplaceRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/api/search?q={}&limit={limit}",
            self.base_url,
            urlencoding::encode(query)
        );
        self.get_records(&url).await
    }
}
