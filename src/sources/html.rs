use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::domain::{Item, Source};
use crate::errors::{NewsboyError, NewsboyResult};
use crate::sources::extract::extract_items;
use crate::sources::traits::ItemFetcher;

/// Some sites block requests based on User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Fetches a source page over HTTP and runs its CSS selector on the body.
pub struct HtmlFetcher {
    client: Client,
}

impl HtmlFetcher {
    pub fn new(user_agent: &str) -> NewsboyResult<Self> {
        // No request timeout: a hung source only holds back its own results
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ItemFetcher for HtmlFetcher {
    async fn fetch(&self, source: &Source) -> NewsboyResult<Vec<Item>> {
        let base = Url::parse(&source.url)
            .map_err(|e| NewsboyError::InvalidUrl(format!("{}: {}", source.url, e)))?;

        let response = self.client.get(base.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsboyError::UnexpectedStatus {
                status: status.as_u16(),
                url: source.url.clone(),
            });
        }

        // Redirects change the base that relative links resolve against
        let base = response.url().clone();
        let body = response.text().await?;

        extract_items(source, &base, &body)
    }
}
