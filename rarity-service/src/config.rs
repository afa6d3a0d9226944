use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::gateway::RetryPolicy;

pub const DEFAULT_SPECIES_COUNTS_URL: &str =
    "https://api.inaturalist.org/v1/observations/species_counts";
pub const DEFAULT_TAXA_URL: &str = "https://api.inaturalist.org/v1/taxa";
pub const DEFAULT_OBSERVATION_LINK_BASE: &str = "https://www.inaturalist.org/observations";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub species_counts_url: String,
    pub taxa_url: String,
    pub observation_link_base: String,
    pub retry: RetryPolicy,
    pub enrich_workers: usize,
    pub strict_fallback: bool,
    pub max_result_count: usize,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 7010,
            species_counts_url: DEFAULT_SPECIES_COUNTS_URL.to_string(),
            taxa_url: DEFAULT_TAXA_URL.to_string(),
            observation_link_base: DEFAULT_OBSERVATION_LINK_BASE.to_string(),
            retry: RetryPolicy::default(),
            enrich_workers: 8,
            strict_fallback: false,
            max_result_count: 100,
            http_timeout: Duration::from_secs(15),
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let max_retries = parse_var(&lookup, "MAX_RETRIES", defaults.retry.max_retries)?;
        if max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_RETRIES",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        let backoff_factor = parse_var(&lookup, "BACKOFF_FACTOR", defaults.retry.backoff_factor)?;
        if !backoff_factor.is_finite() || backoff_factor < 0.0 {
            return Err(ConfigError::Invalid {
                key: "BACKOFF_FACTOR",
                value: backoff_factor.to_string(),
                reason: "must be a non-negative number of seconds".to_string(),
            });
        }
        let enrich_workers = parse_var(&lookup, "ENRICH_WORKERS", defaults.enrich_workers)?.max(1);

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            species_counts_url: lookup("SPECIES_COUNTS_URL").unwrap_or(defaults.species_counts_url),
            taxa_url: lookup("TAXA_URL").unwrap_or(defaults.taxa_url),
            observation_link_base: lookup("OBSERVATION_LINK_BASE")
                .unwrap_or(defaults.observation_link_base),
            retry: RetryPolicy {
                max_retries,
                backoff_factor,
            },
            enrich_workers,
            strict_fallback: parse_var(&lookup, "ENRICH_STRICT_FALLBACK", defaults.strict_fallback)?,
            max_result_count: parse_var(&lookup, "MAX_RESULT_COUNT", defaults.max_result_count)?,
            http_timeout: Duration::from_secs(parse_var(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
        })
    }
}
