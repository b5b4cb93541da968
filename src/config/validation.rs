use crate::config::types::{BrowserConfig, Config, HarvestConfig, OutputConfig, TargetConfig};
use crate::url::parse_target_url;
use crate::ConfigError;

/// Validates the entire configuration
///
/// A missing target URL is accepted here so that modes which only read the
/// database can run without one; [`validate_target_config`] is what requires
/// it before a harvest starts. A URL that is set must still be usable.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    if config.target.url.trim().is_empty() {
        validate_item_selector(&config.target)?;
    } else {
        validate_target_config(&config.target)?;
    }
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates harvest loop tuning
pub fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.max_cycles < 1 {
        return Err(ConfigError::Validation(
            "max_cycles must be >= 1".to_string(),
        ));
    }

    if config.max_session_duration_secs < 1 {
        return Err(ConfigError::Validation(
            "max_session_duration must be at least one second".to_string(),
        ));
    }

    if config.progress_log_interval < 1 {
        return Err(ConfigError::Validation(
            "progress_log_interval must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) must not exceed max_delay ({}ms)",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.initial_delay_ms < config.min_delay_ms || config.initial_delay_ms > config.max_delay_ms
    {
        return Err(ConfigError::Validation(format!(
            "initial_delay ({}ms) must lie between min_delay ({}ms) and max_delay ({}ms)",
            config.initial_delay_ms, config.min_delay_ms, config.max_delay_ms
        )));
    }

    for (name, value) in [
        ("max_consecutive_no_new", config.max_consecutive_no_new),
        (
            "max_consecutive_unchanged_dom",
            config.max_consecutive_unchanged_dom,
        ),
        (
            "max_consecutive_scroll_stuck",
            config.max_consecutive_scroll_stuck,
        ),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if !(1..=3).contains(&config.required_soft_signals) {
        return Err(ConfigError::Validation(format!(
            "required_soft_signals must be between 1 and 3, got {}",
            config.required_soft_signals
        )));
    }

    if !(config.duplicate_ratio_threshold > 0.0 && config.duplicate_ratio_threshold <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "duplicate_ratio_threshold must be in (0, 1], got {}",
            config.duplicate_ratio_threshold
        )));
    }

    Ok(())
}

/// Validates the harvest target
pub fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target url cannot be empty (set [target] url or HARVEST_TARGET_URL)".to_string(),
        ));
    }

    parse_target_url(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target url '{}': {}", config.url, e)))?;

    validate_item_selector(config)
}

fn validate_item_selector(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.item_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "item_selector cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates browser settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if let Some(ws) = &config.connect_url {
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(format!(
                "connect_url must be a DevTools websocket (ws:// or wss://), got '{}'",
                ws
            )));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.target.url = "https://example.com/marketplace/cars".to_string();
        config
    }

    #[test]
    fn test_defaults_with_target_are_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_target_url_is_only_required_for_harvesting() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert!(matches!(
            validate_target_config(&config.target),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_selector_checked_without_target_url() {
        let mut config = Config::default();
        config.target.item_selector = String::new();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_http_target_url() {
        let mut config = valid_config();
        config.target.url = "file:///tmp/page.html".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_delay_bounds() {
        let mut config = valid_config();
        config.harvest.min_delay_ms = 6000;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.harvest.initial_delay_ms = 1000;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.harvest.initial_delay_ms = 9000;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.harvest.min_delay_ms = 2000;
        config.harvest.max_delay_ms = 2000;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = valid_config();
        config.harvest.max_cycles = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.harvest.progress_log_interval = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.harvest.max_consecutive_scroll_stuck = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_soft_signal_count_range() {
        let mut config = valid_config();
        config.harvest.required_soft_signals = 0;
        assert!(validate(&config).is_err());

        config.harvest.required_soft_signals = 4;
        assert!(validate(&config).is_err());

        config.harvest.required_soft_signals = 3;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_ratio_range() {
        let mut config = valid_config();
        config.harvest.duplicate_ratio_threshold = 0.0;
        assert!(validate(&config).is_err());

        config.harvest.duplicate_ratio_threshold = 1.5;
        assert!(validate(&config).is_err());

        config.harvest.duplicate_ratio_threshold = f64::NAN;
        assert!(validate(&config).is_err());

        config.harvest.duplicate_ratio_threshold = 1.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_connect_url_must_be_websocket() {
        let mut config = valid_config();
        config.browser.connect_url = Some("http://127.0.0.1:9222".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.browser.connect_url = Some("ws://127.0.0.1:9222/devtools/browser/1".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_selector_and_database() {
        let mut config = valid_config();
        config.target.item_selector = " ".to_string();
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.output.database_path = String::new();
        assert!(validate(&config).is_err());
    }
}
