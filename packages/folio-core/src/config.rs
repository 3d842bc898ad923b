//! User configuration loaded from `~/.folio/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is valid.

use crate::analytics::{DEFAULT_AVERAGE_WINDOW, DEFAULT_RANGE_WINDOW};
use crate::catalog::CatalogSource;
use crate::market::DEFAULT_LOGO_BASE_URL;
use crate::session::{DEFAULT_INDEX_LABEL, DEFAULT_INDEX_SYMBOL};
use crate::types::InstrumentKind;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FolioConfig {
    pub market: MarketConfig,
    pub catalog: CatalogConfig,
    pub metrics: MetricsConfig,
    pub logo: LogoConfig,
    pub risk: RiskConfig,
}

/// Price data and reference index settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    /// Reference index symbol (Yahoo notation)
    pub index_symbol: String,
    /// Display name of the reference index
    pub index_label: String,
    /// Use adjusted closes when the provider has them
    pub prefer_adjusted_close: bool,
    /// Start date used when none is given
    pub default_start_date: NaiveDate,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            index_symbol: DEFAULT_INDEX_SYMBOL.to_string(),
            index_label: DEFAULT_INDEX_LABEL.to_string(),
            prefer_adjusted_close: true,
            default_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Instrument reference tables, read in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub sources: Vec<CatalogSource>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let dir = FolioConfig::data_dir().join("catalog");
        Self {
            sources: vec![
                CatalogSource::new(InstrumentKind::Etf, dir.join("etfs.csv").to_string_lossy()),
                CatalogSource::new(
                    InstrumentKind::Equity,
                    dir.join("equities.csv").to_string_lossy(),
                ),
            ],
        }
    }
}

/// Window sizes of the per-ticker summary, in observations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub moving_average_window: usize,
    pub range_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_AVERAGE_WINDOW,
            range_window: DEFAULT_RANGE_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogoConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Ask Yahoo for the company website when the catalog has none
    pub use_provider_profile: bool,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_LOGO_BASE_URL.to_string(),
            use_provider_profile: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    /// Used only for the annualized companion figure
    pub trading_days_per_year: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252,
        }
    }
}

impl FolioConfig {
    /// Directory holding folio's files (`~/.folio`).
    pub fn data_dir() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio"))
            .unwrap_or_else(|| PathBuf::from(".folio"))
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }
        Self::data_dir().join("config.toml")
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.market.index_symbol.trim().is_empty() {
            return Err(Error::Config("market.index_symbol must not be empty".to_string()));
        }
        if self.metrics.moving_average_window == 0 || self.metrics.range_window == 0 {
            return Err(Error::Config("metrics windows must be at least 1".to_string()));
        }
        if self.risk.trading_days_per_year == 0 {
            return Err(Error::Config(
                "risk.trading_days_per_year must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = FolioConfig::default();

        assert_eq!(config.market.index_symbol, "^GSPC");
        assert_eq!(config.market.index_label, "S&P500");
        assert!(config.market.prefer_adjusted_close);
        assert_eq!(
            config.market.default_start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(config.metrics.moving_average_window, 50);
        assert_eq!(config.metrics.range_window, 365);
        assert_eq!(config.logo.base_url, "https://logo.clearbit.com/");
        assert_eq!(config.risk.trading_days_per_year, 252);

        let kinds: Vec<InstrumentKind> = config.catalog.sources.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![InstrumentKind::Etf, InstrumentKind::Equity]);
    }

    #[test]
    fn test_partial_document() {
        let config = FolioConfig::from_toml_str(
            r#"
            [market]
            index_symbol = "^NDX"
            index_label = "Nasdaq 100"

            [metrics]
            moving_average_window = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.market.index_symbol, "^NDX");
        assert!(config.market.prefer_adjusted_close);
        assert_eq!(config.metrics.moving_average_window, 20);
        assert_eq!(config.metrics.range_window, 365);
        assert!(config.logo.enabled);
    }

    #[test]
    fn test_catalog_sources() {
        let config = FolioConfig::from_toml_str(
            r#"
            [[catalog.sources]]
            kind = "etf"
            location = "https://example.com/etfs.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog.sources.len(), 1);
        assert!(config.catalog.sources[0].is_remote());
    }

    #[test]
    fn test_invalid_values() {
        let result = FolioConfig::from_toml_str("[metrics]\nrange_window = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = FolioConfig::from_toml_str("[market]\nindex_symbol = 5\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[risk]\ntrading_days_per_year = 365\n").unwrap();

        let config = FolioConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.risk.trading_days_per_year, 365);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = FolioConfig::load_from_path(Path::new("/nonexistent/folio/config.toml")).unwrap();
        assert_eq!(config, FolioConfig::default());
    }
}
