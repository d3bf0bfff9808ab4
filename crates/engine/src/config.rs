//! Engine configuration loaded from the environment.
//!
//! Every knob has a default except the store identity: `SHOPIFY_STORE` and
//! `SHOPIFY_ADMIN_TOKEN` must be set, and each reconciliation location needs
//! either its `*_LOCATION_ID` or its `*_LOCATION_NAME` variable.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use outlet_sync_core::LocationId;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {name}: {message}")]
    InvalidEnvVar { name: String, message: String },
}

/// How a reconciliation location is identified in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRef {
    /// Pre-known numeric id; skips the name lookup entirely.
    Id(LocationId),
    /// Display name, resolved case-insensitively against the shop's
    /// location list at run start.
    Name(String),
}

/// Store identity and transport pacing.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop domain, e.g. `my-store.myshopify.com`.
    pub store: String,
    /// Admin API access token.
    pub admin_token: SecretString,
    /// Admin API version segment of every URL.
    pub api_version: String,
    /// Minimum wall-clock interval between outbound calls.
    pub min_interval: Duration,
    /// Attempt budget shared by rate-limit and server-error retries.
    pub max_retries: u32,
}

impl ShopifyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            admin_token: SecretString::from(get_required_env("SHOPIFY_ADMIN_TOKEN")?),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2025-01"),
            min_interval: duration_env_or_default("SHOPIFY_MIN_INTERVAL_SEC", 0.7)?,
            max_retries: parse_env_or_default("SHOPIFY_MAX_RETRIES", 5)?,
        })
    }
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("admin_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("min_interval", &self.min_interval)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// The two inventory locations a reconciliation moves stock between.
#[derive(Debug, Clone)]
pub struct LocationsConfig {
    pub promo: LocationRef,
    pub warehouse: LocationRef,
}

impl LocationsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            promo: location_ref_from_env("PROMO_LOCATION_ID", "PROMO_LOCATION_NAME")?,
            warehouse: location_ref_from_env("WAREHOUSE_LOCATION_ID", "WAREHOUSE_LOCATION_NAME")?,
        })
    }
}

/// Optional pipeline features.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags {
    /// Run the destructive variant recreate protocol after each outlet is
    /// built.
    pub variant_reset: bool,
    /// Unpublish each outlet from every sales channel outside the keep
    /// list.
    pub channel_restriction: bool,
    /// Cache the shop's location list for the lifetime of the client.
    pub location_cache: bool,
}

impl FeatureFlags {
    pub fn from_env() -> Self {
        Self {
            variant_reset: bool_env_or("ENABLE_VARIANT_RESET", true),
            channel_restriction: bool_env_or("ENABLE_CHANNEL_RESTRICTION", true),
            location_cache: bool_env_or("ENABLE_LOCATION_CACHE", true),
        }
    }
}

/// Batch sizes and fixed delays.
#[derive(Debug, Clone)]
pub struct TuningConfig {
    /// Metafields written per `metafieldsSet` call, capped at 25 by the
    /// platform.
    pub metafield_batch_size: usize,
    /// Pause between stocking the promotional location and draining the
    /// warehouse.
    pub inventory_propagation_delay: Duration,
    /// Variants whose title contains this fragment are left untouched by
    /// the reset protocol. Empty disables the filter.
    pub variant_reset_skip_filter: String,
    /// Pause after each destructive call inside the reset protocol.
    pub variant_reset_delay: Duration,
}

impl TuningConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            metafield_batch_size: parse_env_or_default("BATCH_SIZE_METAFIELDS", 20)?,
            inventory_propagation_delay: duration_env_or_default("INVENTORY_PROPAGATION_DELAY", 1.5)?,
            variant_reset_skip_filter: get_env_or_default("VARIANT_RESET_SKIP_FILTER", "perso"),
            variant_reset_delay: duration_env_or_default("VARIANT_RESET_DELAY", 0.6)?,
        })
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub shopify: ShopifyConfig,
    pub locations: LocationsConfig,
    pub features: FeatureFlags,
    pub tuning: TuningConfig,
}

impl Config {
    /// Load the full configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            shopify: ShopifyConfig::from_env()?,
            locations: LocationsConfig::from_env()?,
            features: FeatureFlags::from_env(),
            tuning: TuningConfig::from_env()?,
        })
    }
}

fn location_ref_from_env(id_var: &str, name_var: &str) -> Result<LocationRef, ConfigError> {
    if let Some(raw) = get_optional_env(id_var) {
        let id = raw.parse::<u64>().map_err(|_| ConfigError::InvalidEnvVar {
            name: id_var.to_owned(),
            message: format!("expected a numeric location id, got {raw:?}"),
        })?;
        return Ok(LocationRef::Id(LocationId::new(id)));
    }
    get_optional_env(name_var)
        .map(LocationRef::Name)
        .ok_or_else(|| ConfigError::MissingEnvVar(format!("{id_var} or {name_var}")))
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    get_optional_env(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_owned()))
}

fn get_optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_owned())
}

fn parse_env_or_default<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match get_optional_env(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::InvalidEnvVar {
            name: name.to_owned(),
            message: err.to_string(),
        }),
    }
}

fn bool_env_or(name: &str, default: bool) -> bool {
    get_optional_env(name).map_or(default, |raw| {
        matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
    })
}

fn duration_env_or_default(name: &str, default_secs: f64) -> Result<Duration, ConfigError> {
    let secs: f64 = parse_env_or_default(name, default_secs)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            name: name.to_owned(),
            message: format!("expected a non-negative number of seconds, got {secs}"),
        });
    }
    Ok(Duration::from_secs_f64(secs))
}
