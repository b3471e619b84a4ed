use serde::{Deserialize, Serialize};

/// A link discovered on a source page.
///
/// `url` is the resolved absolute address of the link and is the item's
/// identity: two items with the same `url` are the same item, whatever
/// their titles say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub url: String,
    /// Set by the collector, never by a fetcher.
    #[serde(default)]
    pub source_name: String,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_name: String::new(),
        }
    }

    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// Key used for deduplication.
    pub fn identity(&self) -> &str {
        &self.url
    }

    /// Format: "[{source}] {title} - {url}"
    pub fn format(&self) -> String {
        format!("[{}] {} - {}", self.source_name, self.title, self.url)
    }
}
