//! Folio Core - Portfolio dashboard analytics library.
//!
//! This crate provides everything behind the portfolio dashboard except rendering:
//!
//! - **Instrument catalog**: ETF and equity reference tables merged into one symbol map
//! - **Market data**: daily closing prices and best-effort company logos
//! - **Return/risk analytics**: daily and cumulative returns, equal-weight portfolio
//!   return, covariance-based portfolio standard deviation
//! - **Index comparison**: portfolio versus a reference index
//! - **Goal projection**: projected value of contributions and first date a goal is met
//! - **Per-ticker summaries**: trailing average, low and high
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use folio_core::{analytics, PriceTable};
//!
//! let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
//! let mut prices = PriceTable::new();
//! prices.insert_series("AAPL", [(d(2), 100.0), (d(3), 110.0), (d(4), 99.0)]);
//!
//! let series = analytics::compute_return_series(&prices);
//! let last = series[0].last().unwrap();
//! assert!((last.price_pct_from_start - (-0.01)).abs() < 1e-12);
//! ```

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod market;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, DateRange, Instrument, InstrumentKind, PriceColumn, PriceObservation, PriceTable,
};

// Re-export main functionality
pub use analytics::{
    calculate_portfolio_risk, compare_to_index, compute_return_series, portfolio_cumulative_returns,
    project_goal, summarize_ticker, GoalOutcome, GoalProjection, IndexComparison, PortfolioRisk,
    ReturnSeries, TickerSummary,
};
pub use catalog::{load_catalog, Catalog, CatalogSource};
pub use config::FolioConfig;
pub use market::{Logo, LogoLookup, PriceFetcher, PriceSource, WebsiteSource, YahooProvider};
pub use session::{Dashboard, DashboardReport, DashboardSettings, DashboardView, Session};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} provider error: {message}")]
    Provider { provider: String, message: String },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
