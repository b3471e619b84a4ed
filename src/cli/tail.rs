use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use colored::{Color, Colorize};
use tokio::time;
use tracing::info;

use crate::domain::{Item, Source};
use crate::errors::NewsboyResult;
use crate::services::{Poller, StartOutcome};

const PALETTE: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// One color per source, assigned in configuration order.
pub fn source_colors(sources: &[Source]) -> HashMap<String, Color> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| (source.name.clone(), PALETTE[i % PALETTE.len()]))
        .collect()
}

/// Format: "{title} - [{source}] {url}"
pub fn format_tail_line(item: &Item) -> String {
    format!("{} - [{}] {}", item.title, item.source_name, item.url)
}

/// Poll until Ctrl-C, printing every new item once.
pub async fn run_tail(poller: Arc<Poller>, interval: Duration) -> NewsboyResult<()> {
    let colors = source_colors(poller.sources());

    if let StartOutcome::Started(report) = poller.start().await {
        info!(new_items = report.added, "first poll finished");
    }

    // One listener for the whole run, so a Ctrl-C during printing is not missed
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticker = time::interval(interval);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                for item in poller.cache().drain_unread() {
                    let line = format_tail_line(&item);
                    match colors.get(&item.source_name) {
                        Some(color) => println!("{}", line.color(*color)),
                        None => println!("{}", line),
                    }
                }
            }
        }
    }

    poller.stop();
    Ok(())
}
