use async_trait::async_trait;

use crate::domain::{Item, Source};
use crate::errors::NewsboyResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Fetch one page and extract its items.
    ///
    /// Every returned item has `title` and `url` set; `source_name` is left
    /// for the collector to stamp. Any non-success outcome is an error.
    async fn fetch(&self, source: &Source) -> NewsboyResult<Vec<Item>>;
}
