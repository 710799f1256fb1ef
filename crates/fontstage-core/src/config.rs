//! Tunables for staging and caching
//!
//! Configuration is a plain value handed to constructors. Nothing here is
//! global: two resolvers in one process can run with different capacities.
//!
//! # Example
//!
//! ```
//! use fontstage_core::config::CompatConfig;
//!
//! let config = CompatConfig::default();
//! assert_eq!(config.cache.capacity, 16);
//! assert_eq!(config.staging.max_attempts, 100);
//! ```
//!
//! # Environment Variables
//!
//! [`CompatConfig::from_env`] starts from the defaults and applies:
//!
//! - `FONTSTAGE_CACHE_CAPACITY` - typeface cache entries
//! - `FONTSTAGE_TEMP_ATTEMPTS` - temp-file names tried per staging call
//! - `FONTSTAGE_COPY_BUFFER` - bytes per copy chunk
//!
//! Unparseable or zero values are ignored with a warning.

/// Prefix of every staged temp file
pub const DEFAULT_TEMP_PREFIX: &str = ".font";

/// Candidate names tried per staging call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Transfer chunk size when copying into a staged file
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 1024;

/// Typeface cache entries
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

pub const ENV_CACHE_CAPACITY: &str = "FONTSTAGE_CACHE_CAPACITY";
pub const ENV_TEMP_ATTEMPTS: &str = "FONTSTAGE_TEMP_ATTEMPTS";
pub const ENV_COPY_BUFFER: &str = "FONTSTAGE_COPY_BUFFER";

/// How temp files are named and filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingConfig {
    pub prefix: String,
    /// Names tried before giving up; the counter restarts per call
    pub max_attempts: u32,
    pub copy_buffer_size: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TEMP_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
        }
    }
}

/// Typeface cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Everything a resolver needs to know up front
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompatConfig {
    pub staging: StagingConfig,
    pub cache: CacheConfig,
}

impl CompatConfig {
    /// Defaults overridden by `FONTSTAGE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(capacity) = positive(&lookup, ENV_CACHE_CAPACITY) {
            config.cache.capacity = capacity;
        }
        if let Some(attempts) = positive(&lookup, ENV_TEMP_ATTEMPTS) {
            config.staging.max_attempts = attempts;
        }
        if let Some(size) = positive(&lookup, ENV_COPY_BUFFER) {
            config.staging.copy_buffer_size = size;
        }

        config
    }
}

fn positive<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => {
            log::info!("Fontstage {} set to {} via environment", name, raw.trim());
            Some(value)
        }
        _ => {
            log::warn!("Ignoring {}={:?}: expected a positive integer", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompatConfig::default();
        assert_eq!(config.staging.prefix, ".font");
        assert_eq!(config.staging.max_attempts, 100);
        assert_eq!(config.staging.copy_buffer_size, 1024);
        assert_eq!(config.cache.capacity, 16);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = CompatConfig::from_lookup(|name| match name {
            ENV_CACHE_CAPACITY => Some("64".to_string()),
            ENV_TEMP_ATTEMPTS => Some(" 5 ".to_string()),
            _ => None,
        });
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.staging.max_attempts, 5);
        assert_eq!(config.staging.copy_buffer_size, DEFAULT_COPY_BUFFER_SIZE);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = CompatConfig::from_lookup(|name| match name {
            ENV_CACHE_CAPACITY => Some("0".to_string()),
            ENV_COPY_BUFFER => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config, CompatConfig::default());
    }
}
