use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::errors::{NewsboyError, NewsboyResult};
use crate::services::Console;

/// A chat frame, as exchanged with the chat service's real-time API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub text: String,
}

/// Answers messages that start with a mention of the bot.
pub struct ChatBot {
    mention: Regex,
    console: Console,
    counter: AtomicU64,
}

impl ChatBot {
    pub fn new(bot_id: &str, console: Console) -> NewsboyResult<Self> {
        let pattern = format!(r"(?s)^<@{}>\s*(.*)$", regex::escape(bot_id));
        let mention = Regex::new(&pattern)
            .map_err(|e| NewsboyError::InvalidInput(format!("bad bot id {}: {}", bot_id, e)))?;

        Ok(Self {
            mention,
            console,
            counter: AtomicU64::new(0),
        })
    }

    /// The command line addressed to the bot, if the message mentions it.
    pub fn command_for<'a>(&self, message: &'a ChatMessage) -> Option<&'a str> {
        if message.kind != "message" {
            return None;
        }
        self.mention
            .captures(&message.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    pub async fn handle(&self, message: &ChatMessage) -> Option<ChatMessage> {
        let command = self.command_for(message)?;
        debug!(channel = %message.channel, command, "chat command");

        let text = match self.console.execute(command).await {
            Ok(output) => output,
            Err(e) => format!("error running `{}`: {}", message.text, e),
        };

        Some(ChatMessage {
            id: self.counter.fetch_add(1, Ordering::SeqCst) + 1,
            kind: "message".to_string(),
            channel: message.channel.clone(),
            text,
        })
    }
}

/// Read one JSON frame per line from stdin and write replies to stdout.
pub async fn run_chat(bot: ChatBot) -> NewsboyResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let message: ChatMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping malformed chat frame: {}", e);
                continue;
            }
        };

        if let Some(reply) = bot.handle(&message).await {
            let mut encoded = serde_json::to_string(&reply)?;
            encoded.push('\n');
            stdout.write_all(encoded.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    bot.console.poller().stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExtractRule, Source};
    use crate::services::{Collector, ItemStyle, Poller};
    use crate::sources::traits::MockItemFetcher;
    use crate::storage::ItemCache;
    use std::sync::Arc;
    use std::time::Duration;

    fn bot() -> ChatBot {
        let fetcher = MockItemFetcher::new();
        let sources = vec![Source::new("Example", "https://example.com", "a", ExtractRule::Anchor)];
        let collector = Collector::new(sources.into(), Arc::new(fetcher));
        let poller = Poller::new(Arc::new(ItemCache::new()), collector, Duration::from_secs(3600));
        let console = Console::new(Arc::new(poller), "unused.json", ItemStyle::Plain);
        ChatBot::new("U123", console).unwrap()
    }

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: 0,
            kind: "message".to_string(),
            channel: "C1".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_command_for_mention() {
        let bot = bot();

        assert_eq!(bot.command_for(&message("<@U123> status")), Some("status"));
        assert_eq!(bot.command_for(&message("<@U123>   search rust ")), Some("search rust"));
        assert_eq!(bot.command_for(&message("hello <@U123> status")), None);
        assert_eq!(bot.command_for(&message("<@U999> status")), None);
    }

    #[test]
    fn test_non_message_frames_ignored() {
        let bot = bot();
        let mut frame = message("<@U123> status");
        frame.kind = "presence_change".to_string();

        assert_eq!(bot.command_for(&frame), None);
    }

    #[tokio::test]
    async fn test_handle_replies_in_channel() {
        let bot = bot();

        let reply = bot.handle(&message("<@U123> status")).await.unwrap();
        assert_eq!(reply.channel, "C1");
        assert_eq!(reply.kind, "message");
        assert_eq!(reply.text, "0 read items.\n0 unread items.");
        assert_eq!(reply.id, 1);

        let reply = bot.handle(&message("<@U123> sources")).await.unwrap();
        assert_eq!(reply.id, 2);
        assert_eq!(reply.text, "Example (https://example.com)");
    }

    #[tokio::test]
    async fn test_handle_reports_errors() {
        let bot = bot();

        let reply = bot.handle(&message("<@U123> search")).await.unwrap();
        assert!(reply.text.starts_with("error running `<@U123> search`"));
    }

    #[test]
    fn test_frame_json() {
        let frame: ChatMessage =
            serde_json::from_str(r#"{"type": "message", "channel": "C1", "text": "<@U123> show", "user": "U9"}"#)
                .unwrap();

        assert_eq!(frame.kind, "message");
        assert_eq!(frame.id, 0);
        assert_eq!(frame.text, "<@U123> show");
    }
}
