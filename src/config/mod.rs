use std::time::Duration;

use crate::errors::{NewsboyError, NewsboyResult};
use crate::sources::html::DEFAULT_USER_AGENT;

#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub tail_interval: Duration,
    pub sources_path: Option<String>,
    pub cache_path: String,
    pub bind_addr: String,
    pub user_agent: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> NewsboyResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let poll_interval = Self::seconds_var("NEWSBOY_POLL_SECS", 10)?;
        let tail_interval = Self::seconds_var("NEWSBOY_TAIL_SECS", 10)?;

        let sources_path = std::env::var("NEWSBOY_SOURCES")
            .ok()
            .filter(|p| !p.trim().is_empty());

        // Default cache_path is relative to executable directory
        let cache_path = std::env::var("NEWSBOY_CACHE_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("newsboy.json").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./newsboy.json".to_string())
        });

        let bind_addr =
            std::env::var("NEWSBOY_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let user_agent = std::env::var("NEWSBOY_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            poll_interval,
            tail_interval,
            sources_path,
            cache_path,
            bind_addr,
            user_agent,
        })
    }

    fn seconds_var(name: &str, default: u64) -> NewsboyResult<Duration> {
        match std::env::var(name) {
            Ok(value) => parse_seconds(name, &value),
            Err(_) => Ok(Duration::from_secs(default)),
        }
    }
}

fn parse_seconds(name: &str, value: &str) -> NewsboyResult<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| NewsboyError::Config(format!("{} must be a whole number of seconds, got `{}`", name, value)))?;

    if secs == 0 {
        return Err(NewsboyError::Config(format!("{} must be greater than zero", name)));
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("X", "30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_seconds("X", " 5 ").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_seconds_rejects_bad_values() {
        assert!(matches!(parse_seconds("X", "soon"), Err(NewsboyError::Config(_))));
        assert!(matches!(parse_seconds("X", "0"), Err(NewsboyError::Config(_))));
        assert!(matches!(parse_seconds("X", "-3"), Err(NewsboyError::Config(_))));
    }
}
