//! Configuration loader — merges env vars, .env file, and config.toml.

use std::path::Path;

use common::{Error, FeedConfig};

fn parse_positive_i64(raw: &str, env_name: &str) -> Result<i64, Error> {
    let parsed = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed <= 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn validate_config(config: &FeedConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.data_dir.trim().is_empty() {
        issues.push("data_dir must not be empty".into());
    }

    if config.cache.key_prefix.trim().is_empty() {
        issues.push("cache.key_prefix must not be empty".into());
    }
    if config.cache.schema_version.trim().is_empty() {
        issues.push("cache.schema_version must not be empty".into());
    }
    if config.cache.quote_ttl_ms <= 0 {
        issues.push("cache.quote_ttl_ms must be > 0".into());
    }
    if config.cache.news_ttl_ms <= 0 {
        issues.push("cache.news_ttl_ms must be > 0".into());
    }

    if config.snapshot.base_url.trim().is_empty() {
        issues.push("snapshot.base_url must not be empty".into());
    }
    if config.snapshot.min_points == 0 {
        issues.push("snapshot.min_points must be > 0".into());
    }

    if config.provider.chart_base_url.trim().is_empty() {
        issues.push("provider.chart_base_url must not be empty".into());
    }
    if config.provider.news_base_url.trim().is_empty() {
        issues.push("provider.news_base_url must not be empty".into());
    }
    if config.provider.relay_base_url.trim().is_empty() {
        issues.push("provider.relay_base_url must not be empty".into());
    }
    if config.provider.timeout_secs == 0 {
        issues.push("provider.timeout_secs must be > 0".into());
    }
    if config.provider.news_limit == 0 {
        issues.push("provider.news_limit must be > 0".into());
    }
    if config.provider.requests_per_sec == 0 {
        issues.push("provider.requests_per_sec must be > 0".into());
    }

    if config.prefetch.max_batch == 0 {
        issues.push("prefetch.max_batch must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load feed configuration from environment and optional config file.
pub fn load_config(path: Option<&Path>) -> Result<FeedConfig, Error> {
    // 1. Load .env file from the working directory or its parents.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = FeedConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = path.unwrap_or_else(|| Path::new("config.toml"));
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", config_path.display(), e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", config_path.display(), e)))?;
    } else if path.is_some() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(dir) = std::env::var("QUOTEFEED_DATA_DIR") {
        config.data_dir = dir;
    }
    if let Ok(url) = std::env::var("QUOTEFEED_SNAPSHOT_URL") {
        config.snapshot.base_url = url;
    }
    if let Ok(url) = std::env::var("QUOTEFEED_RELAY_URL") {
        config.provider.relay_base_url = url;
    }
    if let Ok(raw) = std::env::var("QUOTEFEED_QUOTE_TTL_MS") {
        config.cache.quote_ttl_ms = parse_positive_i64(&raw, "QUOTEFEED_QUOTE_TTL_MS")?;
    }
    if let Ok(raw) = std::env::var("QUOTEFEED_NEWS_TTL_MS") {
        config.cache.news_ttl_ms = parse_positive_i64(&raw, "QUOTEFEED_NEWS_TTL_MS")?;
    }
    if let Ok(raw) = std::env::var("QUOTEFEED_PREFETCH_STAGGER_MS") {
        config.prefetch.stagger_ms = parse_positive_u64(&raw, "QUOTEFEED_PREFETCH_STAGGER_MS")?;
    }

    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FeedConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_collects_all_issues() {
        let mut config = FeedConfig::default();
        config.cache.quote_ttl_ms = 0;
        config.provider.relay_base_url = String::new();
        config.prefetch.max_batch = 0;

        let err = validate_config(&config).expect_err("config should be rejected");
        let message = err.to_string();
        assert!(message.contains("cache.quote_ttl_ms"));
        assert!(message.contains("provider.relay_base_url"));
        assert!(message.contains("prefetch.max_batch"));
    }
}
