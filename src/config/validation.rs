use crate::config::types::{
    CatalogConfig, Config, CrawlerConfig, HttpConfig, OutputConfig, SectionEntry,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_catalog_config(&config.catalog)?;
    validate_output_config(&config.output)?;
    validate_sections(&config.sections)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sections < 1 || config.max_concurrent_sections > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sections must be between 1 and 100, got {}",
            config.max_concurrent_sections
        )));
    }

    // 0 keeps page fan-out unbounded inside an admitted section
    if config.max_concurrent_pages > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages must be between 0 and 1000, got {}",
            config.max_concurrent_pages
        )));
    }

    if config.max_retry_passes > 100 {
        return Err(ConfigError::Validation(format!(
            "max_retry_passes must be <= 100, got {}",
            config.max_retry_passes
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates pagination and count indicator settings
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.page_param.is_empty()
        || !config
            .page_param
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "page_param must be a non-empty alphanumeric name, got '{}'",
            config.page_param
        )));
    }

    Selector::parse(&config.count_selector).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "Invalid count_selector '{}': {:?}",
            config.count_selector, e
        ))
    })?;

    let pattern = Regex::new(&config.count_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "Invalid count_pattern '{}': {}",
            config.count_pattern, e
        ))
    })?;

    if pattern.captures_len() < 2 {
        return Err(ConfigError::InvalidPattern(format!(
            "count_pattern '{}' must contain a capture group for the count",
            config.count_pattern
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the section list
fn validate_sections(sections: &[SectionEntry]) -> Result<(), ConfigError> {
    if sections.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[section]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in sections {
        let url = Url::parse(&entry.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid section URL '{}': {}", entry.url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Section URL '{}' must use HTTP or HTTPS scheme",
                entry.url
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Section URL '{}' has no host",
                entry.url
            )));
        }

        if !seen.insert(url.as_str().to_string()) {
            return Err(ConfigError::Validation(format!(
                "Section URL '{}' is listed more than once",
                entry.url
            )));
        }
    }

    Ok(())
}
