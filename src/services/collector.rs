use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::domain::{Item, Source};
use crate::sources::ItemFetcher;

/// A source that could not be fetched during one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub source: String,
    pub reason: String,
}

/// Fans a poll cycle out to every source concurrently.
#[derive(Clone)]
pub struct Collector {
    sources: Arc<[Source]>,
    fetcher: Arc<dyn ItemFetcher>,
}

impl Collector {
    pub fn new(sources: Arc<[Source]>, fetcher: Arc<dyn ItemFetcher>) -> Self {
        Self { sources, fetcher }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Start one fetch per source and merge the results into a single stream.
    ///
    /// Each item is stamped with the name of the source it came from. The
    /// stream ends once every fetch has finished, failed ones included, so
    /// callers can read it to the end without any other signal. A failed
    /// source contributes no items and is reported by
    /// [`ItemStream::failures`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn collect(&self) -> ItemStream {
        // Bounded by the source count, which is fixed for the process lifetime
        let (tx, rx) = mpsc::channel(self.sources.len().max(1));
        let failures = Arc::new(Mutex::new(Vec::new()));

        for source in self.sources.iter().cloned() {
            // Each task owns a sender clone; the channel closes when the last one drops
            let tx = tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let failures = Arc::clone(&failures);

            tokio::spawn(async move {
                match fetcher.fetch(&source).await {
                    Ok(items) => {
                        debug!(source = %source.name, count = items.len(), "fetched items");
                        for mut item in items {
                            item.source_name = source.name.clone();
                            if tx.send(item).await.is_err() {
                                // Reader went away, nothing left to do
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(source = %source.name, url = %source.url, "Error getting items: {}", e);
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(FetchFailure {
                                source: source.name.clone(),
                                reason: e.to_string(),
                            });
                    }
                }
            });
        }
        drop(tx);

        ItemStream {
            inner: ReceiverStream::new(rx),
            failures,
        }
    }
}

/// Items from one collect call, in arrival order.
///
/// Arrival order is only preserved per source. Not restartable: call
/// [`Collector::collect`] again for the next cycle.
pub struct ItemStream {
    inner: ReceiverStream<Item>,
    failures: Arc<Mutex<Vec<FetchFailure>>>,
}

impl ItemStream {
    /// Sources that failed so far. Complete once the stream has ended,
    /// because a task records its failure before releasing its sender.
    pub fn failures(&self) -> Vec<FetchFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Stream for ItemStream {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtractRule;
    use crate::errors::{NewsboyError, NewsboyResult};
    use crate::sources::traits::MockItemFetcher;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::time::Duration;

    fn source(name: &str) -> Source {
        Source::new(name, format!("https://{}.example.com", name.to_lowercase()), "a", ExtractRule::Anchor)
    }

    /// Serves canned results per source name, optionally after a delay.
    struct StubFetcher {
        results: HashMap<String, Vec<Item>>,
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl ItemFetcher for StubFetcher {
        async fn fetch(&self, source: &Source) -> NewsboyResult<Vec<Item>> {
            if let Some(delay) = self.delays.get(&source.name) {
                tokio::time::sleep(*delay).await;
            }
            self.results
                .get(&source.name)
                .cloned()
                .ok_or_else(|| NewsboyError::UnexpectedStatus {
                    status: 503,
                    url: source.url.clone(),
                })
        }
    }

    #[tokio::test]
    async fn test_items_stamped_with_source_name() {
        let mut fetcher = MockItemFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_| {
            Ok(vec![
                Item::new("x", "https://a.example.com/x"),
                Item::new("y", "https://a.example.com/y"),
            ])
        });

        let collector = Collector::new(vec![source("A")].into(), Arc::new(fetcher));
        let items: Vec<Item> = collector.collect().collect().await;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.source_name == "A"));
        // Order within one source is preserved
        assert_eq!(items[0].title, "x");
        assert_eq!(items[1].title, "y");
    }

    #[tokio::test]
    async fn test_failing_source_contributes_nothing() {
        let fetcher = StubFetcher {
            results: HashMap::from([(
                "A".to_string(),
                vec![
                    Item::new("x", "https://a.example.com/x"),
                    Item::new("y", "https://a.example.com/y"),
                ],
            )]),
            delays: HashMap::new(),
        };

        let collector = Collector::new(vec![source("A"), source("B")].into(), Arc::new(fetcher));
        let mut stream = collector.collect();

        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.source_name == "A"));

        let failures = stream.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source, "B");
        assert!(failures[0].reason.contains("503"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_does_not_lose_others() {
        let fetcher = StubFetcher {
            results: HashMap::from([
                ("Slow".to_string(), vec![Item::new("late", "https://slow.example.com/late")]),
                ("Fast".to_string(), vec![Item::new("early", "https://fast.example.com/early")]),
            ]),
            delays: HashMap::from([("Slow".to_string(), Duration::from_secs(60))]),
        };

        let collector = Collector::new(vec![source("Slow"), source("Fast")].into(), Arc::new(fetcher));
        let mut stream = collector.collect();

        let first = stream.next().await.unwrap();
        assert_eq!(first.source_name, "Fast");

        let second = stream.next().await.unwrap();
        assert_eq!(second.source_name, "Slow");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_more_items_than_channel_capacity() {
        let many: Vec<Item> = (0..50)
            .map(|i| Item::new("item", format!("https://a.example.com/{}", i)))
            .collect();
        let fetcher = StubFetcher {
            results: HashMap::from([("A".to_string(), many)]),
            delays: HashMap::new(),
        };

        let collector = Collector::new(vec![source("A")].into(), Arc::new(fetcher));
        let count = collector.collect().count().await;

        assert_eq!(count, 50);
    }

    #[tokio::test]
    async fn test_no_sources_closes_immediately() {
        let fetcher = MockItemFetcher::new();
        let collector = Collector::new(Vec::<Source>::new().into(), Arc::new(fetcher));

        let mut stream = collector.collect();
        assert!(stream.next().await.is_none());
        assert!(stream.failures().is_empty());
    }
}
