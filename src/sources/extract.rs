use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::{ExtractRule, Item, Source};
use crate::errors::{NewsboyError, NewsboyResult};

pub fn compile_selector(selector: &str) -> NewsboyResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| NewsboyError::InvalidSelector(format!("{}: {}", selector, e)))
}

/// Run the source's selector over a page and convert the matches to items.
///
/// `base` is the address the page was served from; relative hrefs are
/// resolved against it so every item carries an absolute url.
pub fn extract_items(source: &Source, base: &Url, body: &str) -> NewsboyResult<Vec<Item>> {
    let selector = compile_selector(&source.selector)?;
    let anchor = compile_selector("a[href]")?;
    let document = Html::parse_document(body);

    let items = document
        .select(&selector)
        .filter_map(|element| {
            let link = match source.rule {
                ExtractRule::Anchor => element,
                ExtractRule::Container => element.select(&anchor).next()?,
            };
            item_from_link(link, base)
        })
        .collect();

    Ok(items)
}

fn item_from_link(link: ElementRef<'_>, base: &Url) -> Option<Item> {
    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // Collapse whitespace left over from nested markup
    let title = link.text().collect::<String>();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return None;
    }

    Some(Item::new(title, url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <table>
      <tr class="athing">
        <td><span class="titleline"><a href="https://example.com/rust-2024">Rust 2024 edition is <b>stable</b></a></span></td>
      </tr>
      <tr class="athing">
        <td><span class="titleline"><a href="item?id=42">Ask HN: Favourite crates?</a></span></td>
      </tr>
      <tr class="athing">
        <td><span class="titleline"><a href="">Empty link</a></span></td>
      </tr>
      <tr class="athing">
        <td><span class="titleline"><a href="mailto:someone@example.com">Mail me</a></span></td>
      </tr>
      <tr class="athing">
        <td><span class="titleline"><a href="/nothing">   </a></span></td>
      </tr>
    </table>
  </body>
</html>"#;

    fn base() -> Url {
        Url::parse("https://news.example.com/").unwrap()
    }

    #[test]
    fn test_anchor_rule_extracts_links() {
        let source = Source::new("HN", "https://news.example.com/", ".titleline > a", ExtractRule::Anchor);
        let items = extract_items(&source, &base(), SAMPLE_PAGE).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Rust 2024 edition is stable");
        assert_eq!(items[0].url, "https://example.com/rust-2024");
        assert!(items[0].source_name.is_empty(), "fetchers never set source_name");
    }

    #[test]
    fn test_relative_links_resolved_against_page() {
        let source = Source::new("HN", "https://news.example.com/", ".titleline > a", ExtractRule::Anchor);
        let items = extract_items(&source, &base(), SAMPLE_PAGE).unwrap();

        assert_eq!(items[1].title, "Ask HN: Favourite crates?");
        assert_eq!(items[1].url, "https://news.example.com/item?id=42");
    }

    #[test]
    fn test_container_rule_uses_first_descendant_link() {
        let source = Source::new("HN", "https://news.example.com/", "tr.athing", ExtractRule::Container);
        let items = extract_items(&source, &base(), SAMPLE_PAGE).unwrap();

        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/rust-2024", "https://news.example.com/item?id=42"]
        );
    }

    #[test]
    fn test_invalid_selector() {
        let source = Source::new("Broken", "https://example.com", "a[[", ExtractRule::Anchor);
        let result = extract_items(&source, &base(), SAMPLE_PAGE);

        assert!(matches!(result, Err(NewsboyError::InvalidSelector(_))));
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let source = Source::new("Quiet", "https://example.com", ".missing", ExtractRule::Anchor);
        let items = extract_items(&source, &base(), SAMPLE_PAGE).unwrap();

        assert!(items.is_empty());
    }
}
