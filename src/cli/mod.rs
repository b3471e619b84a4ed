pub mod commands;
pub mod shell;
pub mod tail;
pub mod chat;

pub use commands::{Cli, Commands};
