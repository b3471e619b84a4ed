use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsboy")]
#[command(about = "Polls web pages for new links and serves the unread and read sets")]
#[command(version)]
pub struct Cli {
    /// JSON file listing the sources to poll (defaults to the built-in sources)
    #[arg(long, global = true)]
    pub sources_file: Option<String>,

    /// Seconds between poll cycles
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive command shell
    Shell,

    /// Serve status and items over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Poll continuously and print new items as they appear
    Tail,

    /// Answer chat messages that mention the bot (JSON lines on stdin/stdout)
    Chat {
        /// The bot's user id, as used in `<@ID>` mentions
        #[arg(long, env = "NEWSBOY_BOT_ID")]
        bot_id: String,
    },

    /// List the configured sources
    Sources,
}
