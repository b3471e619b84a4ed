use std::fs;
use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::domain::{ExtractRule, Source};
use crate::errors::{NewsboyError, NewsboyResult};
use crate::sources::extract::compile_selector;

/// The fixed set of sources polled for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Built-in sources used when no source list is configured
    pub fn defaults() -> Self {
        Self {
            sources: vec![
                Source::new(
                    "HackerNews",
                    "https://news.ycombinator.com",
                    ".titleline > a",
                    ExtractRule::Anchor,
                ),
                Source::new(
                    "Reddit",
                    "https://old.reddit.com",
                    "a.title",
                    ExtractRule::Anchor,
                ),
            ],
        }
    }

    /// Parse a JSON array of source definitions
    pub fn from_json(content: &str) -> NewsboyResult<Self> {
        let sources: Vec<Source> = serde_json::from_str(content)?;

        let mut registry = Self::new();
        for source in sources {
            registry.register(source)?;
        }

        if registry.is_empty() {
            return Err(NewsboyError::InvalidSource(
                "Source list is empty".to_string(),
            ));
        }

        Ok(registry)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> NewsboyResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load the configured source list, falling back to the built-ins
    pub fn load(path: Option<&str>) -> NewsboyResult<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::defaults()),
        }
    }

    pub fn register(&mut self, source: Source) -> NewsboyResult<()> {
        Self::validate(&source)?;

        if self.find(&source.name).is_some() {
            return Err(NewsboyError::InvalidSource(format!(
                "Duplicate source name: {}",
                source.name
            )));
        }

        self.sources.push(source);
        Ok(())
    }

    fn validate(source: &Source) -> NewsboyResult<()> {
        if source.name.trim().is_empty() {
            return Err(NewsboyError::InvalidSource(format!(
                "Source for {} has no name",
                source.url
            )));
        }

        let url = Url::parse(&source.url)
            .map_err(|e| NewsboyError::InvalidUrl(format!("{}: {}", source.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(NewsboyError::InvalidUrl(format!(
                "{}: only http and https are supported",
                source.url
            )));
        }

        compile_selector(&source.selector)?;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn into_shared(self) -> Arc<[Source]> {
        self.sources.into()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let registry = SourceRegistry::defaults();

        assert!(!registry.is_empty());
        for source in registry.sources() {
            SourceRegistry::validate(source).unwrap();
        }
    }

    #[test]
    fn test_from_json() {
        let registry = SourceRegistry::from_json(
            r#"[
                {"name": "Lobsters", "url": "https://lobste.rs", "selector": "a.u-url"},
                {"name": "Tildes", "url": "https://tildes.net", "selector": "h1.topic-title", "rule": "container"}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find("Tildes").unwrap().rule, ExtractRule::Container);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = SourceRegistry::from_json(
            r#"[
                {"name": "Same", "url": "https://a.example.com", "selector": "a"},
                {"name": "Same", "url": "https://b.example.com", "selector": "a"}
            ]"#,
        );

        assert!(matches!(result, Err(NewsboyError::InvalidSource(_))));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = SourceRegistry::from_json(
            r#"[{"name": "Ftp", "url": "ftp://files.example.com", "selector": "a"}]"#,
        );
        assert!(matches!(result, Err(NewsboyError::InvalidUrl(_))));

        let result = SourceRegistry::from_json(
            r#"[{"name": "Nowhere", "url": "nowhere", "selector": "a"}]"#,
        );
        assert!(matches!(result, Err(NewsboyError::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = SourceRegistry::from_json(
            r#"[{"name": "Broken", "url": "https://example.com", "selector": "a[["}]"#,
        );
        assert!(matches!(result, Err(NewsboyError::InvalidSelector(_))));
    }

    #[test]
    fn test_empty_list_rejected() {
        let result = SourceRegistry::from_json("[]");
        assert!(matches!(result, Err(NewsboyError::InvalidSource(_))));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Example", "url": "https://example.com", "selector": "a"}}]"#
        )
        .unwrap();

        let registry = SourceRegistry::load(file.path().to_str()).unwrap();
        assert_eq!(registry.sources()[0].name, "Example");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let registry = SourceRegistry::load(None).unwrap();
        assert!(registry.find("HackerNews").is_some());
    }
}
