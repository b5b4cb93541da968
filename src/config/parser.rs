use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Loads the harvester configuration
///
/// Values are layered in this order, later layers winning:
///
/// 1. Built-in defaults
/// 2. The TOML file at `path`, if one is given
/// 3. Environment variables (see [`apply_env_overrides`])
///
/// The merged configuration is validated before it is returned.
///
/// # Arguments
///
/// * `path` - Optional path to a TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to read, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use listing_harvester::config::load_config;
///
/// let config = load_config(Some(Path::new("harvester.toml"))).unwrap();
/// println!("Max cycles: {}", config.harvest.max_cycles);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Loads a configuration, resolving environment variables through `lookup`
pub fn load_config_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, lookup);

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// The configuration is serialized back to TOML first, so the hash covers
/// environment overrides as well as the file.
pub fn compute_config_hash(config: &Config) -> Result<String, ConfigError> {
    let content = toml::to_string(config)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(&config)?;
    Ok((config, hash))
}

/// Applies environment overrides to a configuration
///
/// `lookup` resolves a variable name to its value; the loader passes
/// `std::env::var`. Unset or empty variables leave the field untouched, and
/// unparseable values are logged and ignored.
///
/// | Variable | Field |
/// |---|---|
/// | `SCRAPER_MAX_SCROLLS` | `harvest.max-cycles` |
/// | `SCRAPER_MAX_DURATION` | `harvest.max-session-duration-secs` |
/// | `SCRAPER_INITIAL_DELAY` | `harvest.initial-delay-ms` |
/// | `SCRAPER_MIN_DELAY` | `harvest.min-delay-ms` |
/// | `SCRAPER_MAX_DELAY` | `harvest.max-delay-ms` |
/// | `SCRAPER_MAX_CONSECUTIVE_NO_NEW` | `harvest.max-consecutive-no-new` |
/// | `SCRAPER_MAX_CONSECUTIVE_UNCHANGED` | `harvest.max-consecutive-unchanged-dom` |
/// | `SCRAPER_EXTRACTION_INTERVAL` | `harvest.progress-log-interval` |
/// | `HARVEST_TARGET_URL` | `target.url` |
/// | `HARVEST_ITEM_SELECTOR` | `target.item-selector` |
/// | `HARVEST_DATABASE_PATH` | `output.database-path` |
/// | `HARVEST_BROWSER_WS` | `browser.connect-url` |
///
/// Duration variables accept `1500ms`, `2s`, `60m` or `1h`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let harvest = &mut config.harvest;

    override_number(value("SCRAPER_MAX_SCROLLS"), "SCRAPER_MAX_SCROLLS", &mut harvest.max_cycles);
    override_number(
        value("SCRAPER_MAX_CONSECUTIVE_NO_NEW"),
        "SCRAPER_MAX_CONSECUTIVE_NO_NEW",
        &mut harvest.max_consecutive_no_new,
    );
    override_number(
        value("SCRAPER_MAX_CONSECUTIVE_UNCHANGED"),
        "SCRAPER_MAX_CONSECUTIVE_UNCHANGED",
        &mut harvest.max_consecutive_unchanged_dom,
    );
    override_number(
        value("SCRAPER_EXTRACTION_INTERVAL"),
        "SCRAPER_EXTRACTION_INTERVAL",
        &mut harvest.progress_log_interval,
    );

    if let Some(d) = duration_override(value("SCRAPER_MAX_DURATION"), "SCRAPER_MAX_DURATION") {
        harvest.max_session_duration_secs = d.as_secs();
    }
    if let Some(d) = duration_override(value("SCRAPER_INITIAL_DELAY"), "SCRAPER_INITIAL_DELAY") {
        harvest.initial_delay_ms = d.as_millis() as u64;
    }
    if let Some(d) = duration_override(value("SCRAPER_MIN_DELAY"), "SCRAPER_MIN_DELAY") {
        harvest.min_delay_ms = d.as_millis() as u64;
    }
    if let Some(d) = duration_override(value("SCRAPER_MAX_DELAY"), "SCRAPER_MAX_DELAY") {
        harvest.max_delay_ms = d.as_millis() as u64;
    }

    if let Some(url) = value("HARVEST_TARGET_URL") {
        config.target.url = url;
    }
    if let Some(selector) = value("HARVEST_ITEM_SELECTOR") {
        config.target.item_selector = selector;
    }
    if let Some(path) = value("HARVEST_DATABASE_PATH") {
        config.output.database_path = path;
    }
    if let Some(ws) = value("HARVEST_BROWSER_WS") {
        config.browser.connect_url = Some(ws);
    }
}

fn override_number<T>(raw: Option<String>, key: &str, field: &mut T)
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = raw else { return };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *field = parsed,
        Err(_) => tracing::warn!(
            "{} is not a valid integer ({:?}), keeping {}",
            key,
            raw,
            field
        ),
    }
}

fn duration_override(raw: Option<String>, key: &str) -> Option<Duration> {
    let raw = raw?;
    let parsed = parse_duration(&raw);
    if parsed.is_none() {
        tracing::warn!("{} is not a valid duration ({:?}), ignoring", key, raw);
    }
    parsed
}

/// Parses a duration such as `1500ms`, `2s`, `1.5s`, `60m` or `1h`
///
/// A bare number is read as seconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let number: f64 = number.parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }

    let nanos_per_unit = match unit.trim() {
        "ms" => 1e6,
        "" | "s" => 1e9,
        "m" => 60.0 * 1e9,
        "h" => 3600.0 * 1e9,
        _ => return None,
    };

    Some(Duration::from_nanos((number * nanos_per_unit).round() as u64))
}
