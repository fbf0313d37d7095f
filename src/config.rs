//! # Repository Configuration
//!
//! Paging defaults and limits. Values come from [`RepositoryConfig::default`],
//! `QUARRY_*` environment variables, or a configuration file layered with
//! `QUARRY__*` environment variables through the `config` crate.

use crate::error::ConfigurationError;
use crate::query_builder::{PagingOptions, PagingStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_PREFIX: &str = "QUARRY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub default_page_size: u32,
    /// Requests above this page size are rejected as contract errors
    pub max_page_size: Option<u32>,
    pub default_strategy: PagingStrategy,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: None,
            default_strategy: PagingStrategy::Offset,
        }
    }
}

impl RepositoryConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Ok(page_size) = std::env::var("QUARRY_DEFAULT_PAGE_SIZE") {
            config.default_page_size = page_size.parse().map_err(|e| {
                ConfigurationError::invalid_value("default_page_size", &page_size, format!("{e}"))
            })?;
        }

        if let Ok(max_page_size) = std::env::var("QUARRY_MAX_PAGE_SIZE") {
            config.max_page_size = Some(max_page_size.parse().map_err(|e| {
                ConfigurationError::invalid_value("max_page_size", &max_page_size, format!("{e}"))
            })?);
        }

        if let Ok(strategy) = std::env::var("QUARRY_DEFAULT_STRATEGY") {
            config.default_strategy = parse_strategy(&strategy)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a configuration file, with `QUARRY__*` environment variables taking precedence
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            path = %path.display(),
            default_page_size = config.default_page_size,
            max_page_size = ?config.max_page_size,
            default_strategy = ?config.default_strategy,
            "Repository configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.default_page_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "default_page_size",
                self.default_page_size,
                "must be greater than zero",
            ));
        }

        if let Some(max_page_size) = self.max_page_size {
            if max_page_size < self.default_page_size {
                return Err(ConfigurationError::invalid_value(
                    "max_page_size",
                    max_page_size,
                    format!(
                        "must be at least the default page size ({})",
                        self.default_page_size
                    ),
                ));
            }
        }

        Ok(())
    }

    /// First-page options using the configured strategy and page size
    pub fn paging_defaults(&self) -> PagingOptions {
        match self.default_strategy {
            PagingStrategy::Offset => PagingOptions::offset(1, self.default_page_size),
            PagingStrategy::Keyset => PagingOptions::keyset(self.default_page_size),
        }
    }
}

fn parse_strategy(value: &str) -> Result<PagingStrategy, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "offset" => Ok(PagingStrategy::Offset),
        "keyset" | "cursor" => Ok(PagingStrategy::Keyset),
        _ => Err(ConfigurationError::invalid_value(
            "default_strategy",
            value,
            "expected 'offset' or 'keyset'",
        )),
    }
}
