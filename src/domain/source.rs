use serde::{Deserialize, Serialize};

/// How matched elements are turned into items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractRule {
    /// The selector matches `<a>` elements directly.
    #[default]
    Anchor,
    /// The selector matches a container; its first `a[href]` descendant is used.
    Container,
}

impl ExtractRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractRule::Anchor => "anchor",
            ExtractRule::Container => "container",
        }
    }
}

impl std::str::FromStr for ExtractRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anchor" | "a" => Ok(ExtractRule::Anchor),
            "container" => Ok(ExtractRule::Container),
            _ => Err(format!("Unknown extract rule: {}", s)),
        }
    }
}

impl std::fmt::Display for ExtractRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A web page polled for items. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub selector: String,
    #[serde(default)]
    pub rule: ExtractRule,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        selector: impl Into<String>,
        rule: ExtractRule,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: selector.into(),
            rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_str() {
        assert_eq!("anchor".parse::<ExtractRule>().unwrap(), ExtractRule::Anchor);
        assert_eq!("Container".parse::<ExtractRule>().unwrap(), ExtractRule::Container);
        assert!("table".parse::<ExtractRule>().is_err());
    }

    #[test]
    fn test_rule_defaults_to_anchor_when_missing() {
        let source: Source = serde_json::from_str(
            r#"{"name": "HN", "url": "https://news.ycombinator.com", "selector": ".titleline > a"}"#,
        )
        .unwrap();

        assert_eq!(source.rule, ExtractRule::Anchor);
    }
}
