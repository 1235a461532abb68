use std::str::FromStr;

use anyhow::{Context, Result};
use simplelog::LevelFilter;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub log_level: LevelFilter,
}

impl Settings {
    // Reads GPA_BASE_URL and GPA_LOG_LEVEL; call after dotenv().
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var("GPA_BASE_URL").ok().as_deref(),
            std::env::var("GPA_LOG_LEVEL").ok().as_deref(),
        )
    }

    pub fn from_values(base_url: Option<&str>, log_level: Option<&str>) -> Result<Self> {
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        let log_level = match log_level {
            Some(level) => LevelFilter::from_str(level.trim())
                .ok()
                .with_context(|| format!("GPA_LOG_LEVEL `{}` is not a log level", level))?,
            None => LevelFilter::Info,
        };
        Ok(Settings { base_url, log_level })
    }
}

// Relative joins drop the last path segment unless the base ends with a slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') { raw.to_string() } else { format!("{}/", raw) };
    Url::parse(&normalized).with_context(|| format!("GPA_BASE_URL `{}` is not a valid url", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let settings = Settings::from_values(None, None).unwrap();
        assert_eq!(settings.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(settings.log_level, LevelFilter::Info);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let settings = Settings::from_values(Some("https://gpa.example.edu/app"), Some("debug")).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://gpa.example.edu/app/");
        assert_eq!(settings.log_level, LevelFilter::Debug);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Settings::from_values(Some("not a url"), None).is_err());
        assert!(Settings::from_values(None, Some("loud")).is_err());
    }
}
