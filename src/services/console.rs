use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::domain::Item;
use crate::errors::{NewsboyError, NewsboyResult};
use crate::services::poller::{Poller, StartOutcome};
use crate::storage::snapshot;

/// A line command understood by the shell and the chat bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    Show,
    Search(String),
    Sources,
    Flush,
    Save(Option<String>),
    Load(Option<String>),
    Help,
}

const HELP: &str = "\
start            Start polling sources for items.
stop             Stop polling sources.
status           Show how many items are read and unread.
show             Show unread items and mark them read.
search <term>    Search read items by title.
sources          List the configured sources.
flush            Forget every read item.
save [path]      Save read items to a file.
load [path]      Load read items from a file.
help             Show this message.";

impl std::str::FromStr for Command {
    type Err = NewsboyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match name.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            "show" => Ok(Command::Show),
            "search" => arg
                .map(Command::Search)
                .ok_or_else(|| NewsboyError::InvalidInput("usage: `search <search term>`".to_string())),
            "sources" => Ok(Command::Sources),
            "flush" => Ok(Command::Flush),
            "save" => Ok(Command::Save(arg)),
            "load" => Ok(Command::Load(arg)),
            "help" => Ok(Command::Help),
            "" => Err(NewsboyError::InvalidInput("empty command".to_string())),
            other => Err(NewsboyError::InvalidInput(format!(
                "unknown command `{}`, try `help`",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStyle {
    Plain,
    Colored,
}

pub fn render_item(item: &Item, style: ItemStyle) -> String {
    match style {
        ItemStyle::Plain => item.format(),
        ItemStyle::Colored => format!(
            "[{}] {} - {}",
            item.source_name,
            item.title.green(),
            item.url.cyan()
        ),
    }
}

pub fn render_item_lines(items: &[Item], style: ItemStyle) -> String {
    items
        .iter()
        .map(|item| render_item(item, style))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs line commands against a shared poller and returns the text to show.
pub struct Console {
    poller: Arc<Poller>,
    snapshot_path: PathBuf,
    style: ItemStyle,
}

impl Console {
    pub fn new(poller: Arc<Poller>, snapshot_path: impl Into<PathBuf>, style: ItemStyle) -> Self {
        Self {
            poller,
            snapshot_path: snapshot_path.into(),
            style,
        }
    }

    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    pub fn style(&self) -> ItemStyle {
        self.style
    }

    pub async fn execute(&self, line: &str) -> NewsboyResult<String> {
        let command: Command = line.parse()?;
        self.run(command).await
    }

    pub async fn run(&self, command: Command) -> NewsboyResult<String> {
        let cache = self.poller.cache();

        let output = match command {
            Command::Start => {
                if self.poller.is_running() {
                    return Ok("Bot already running.".to_string());
                }
                match self.poller.start().await {
                    StartOutcome::Started(report) => {
                        let mut out = format!("Bot started. {} new items.", report.added);
                        for failure in &report.failures {
                            out.push_str(&format!("\n  ! {}: {}", failure.source, failure.reason));
                        }
                        out
                    }
                    StartOutcome::AlreadyRunning => "Bot already running.".to_string(),
                }
            }
            Command::Stop => {
                if self.poller.stop() {
                    "Bot stopped.".to_string()
                } else {
                    "Bot is not running.".to_string()
                }
            }
            Command::Status => {
                let mut out = format!(
                    "{} read items.\n{} unread items.",
                    cache.delivered_count(),
                    cache.pending_count()
                );
                if self.poller.is_running() {
                    out.push_str("\nBot is running.");
                }
                out
            }
            Command::Show => {
                let items = cache.drain_unread();
                if items.is_empty() {
                    "No new items.".to_string()
                } else {
                    render_item_lines(&items, self.style)
                }
            }
            Command::Search(term) => {
                let results = cache.search(&term);
                let mut out = format!("Showing results for `{}`", term);
                if !results.is_empty() {
                    out.push('\n');
                    out.push_str(&render_item_lines(&results, self.style));
                }
                out
            }
            Command::Sources => self
                .poller
                .sources()
                .iter()
                .map(|s| format!("{} ({})", s.name, s.url))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Flush => format!("Forgot {} read items.", cache.flush()),
            Command::Save(path) => {
                let path = self.resolve_path(path);
                let count = snapshot::save(cache, &path)?;
                format!("Saved {} items to {}", count, path.display())
            }
            Command::Load(path) => {
                let path = self.resolve_path(path);
                let count = snapshot::restore(cache, &path)?;
                format!("Loaded {} items from {}", count, path.display())
            }
            Command::Help => HELP.to_string(),
        };

        Ok(output)
    }

    fn resolve_path(&self, path: Option<String>) -> PathBuf {
        path.map(PathBuf::from)
            .unwrap_or_else(|| self.snapshot_path.clone())
    }
}
