//! Dashboard sessions.
//!
//! A [`Session`] is everything the user chose: tickers, dates, contributions,
//! goal and reference index. Every dashboard computation takes a session
//! explicitly and recomputes from scratch.

use crate::analytics::{
    calculate_portfolio_risk, compare_to_index, compute_return_series, portfolio_cumulative_returns,
    project_goal, summarize_ticker, GoalProjection, IndexComparison, PortfolioPoint,
    PortfolioRisk, ReturnSeries, TickerSummary, DEFAULT_AVERAGE_WINDOW, DEFAULT_RANGE_WINDOW,
};
use crate::config::FolioConfig;
use crate::market::PriceFetcher;
use crate::types::{DateRange, PriceTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Reference index used when none is configured.
pub const DEFAULT_INDEX_SYMBOL: &str = "^GSPC";
/// Display name of [`DEFAULT_INDEX_SYMBOL`].
pub const DEFAULT_INDEX_LABEL: &str = "S&P500";
/// Shown when no ticker is selected.
pub const NO_SELECTION_MESSAGE: &str = "Select tickers to view plots";

/// User choices for one dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Selected symbols, uppercase and unique, in selection order
    pub tickers: Vec<String>,
    pub range: DateRange,
    /// Invested amount per symbol; missing symbols count as 0
    pub contributions: BTreeMap<String, f64>,
    pub goal: f64,
    pub index_symbol: String,
}

fn validate_amount(what: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            what, value
        )));
    }
    Ok(value)
}

impl Session {
    /// Create a session for `tickers` over `range`, with no contributions and a
    /// goal of 0.
    pub fn new<S: AsRef<str>>(tickers: &[S], range: DateRange) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let symbol = ticker.as_ref().trim().to_uppercase();
            if !symbol.is_empty() && !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }

        Self {
            tickers: unique,
            range,
            contributions: BTreeMap::new(),
            goal: 0.0,
            index_symbol: DEFAULT_INDEX_SYMBOL.to_string(),
        }
    }

    /// Set the invested amount of one symbol, replacing any previous amount.
    pub fn with_contribution(mut self, symbol: &str, amount: f64) -> Result<Self> {
        let amount = validate_amount(&format!("contribution for {}", symbol), amount)?;
        let symbol = symbol.trim().to_uppercase();
        if !self.tickers.contains(&symbol) {
            warn!("Contribution for {} which is not selected", symbol);
        }
        self.contributions.insert(symbol, amount);
        Ok(self)
    }

    pub fn with_goal(mut self, goal: f64) -> Result<Self> {
        self.goal = validate_amount("goal", goal)?;
        Ok(self)
    }

    pub fn with_index(mut self, symbol: &str) -> Self {
        self.index_symbol = symbol.trim().to_uppercase();
        self
    }

    /// Amount invested in `symbol`.
    pub fn contribution(&self, symbol: &str) -> f64 {
        self.contributions
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of the contributions of the selected tickers.
    pub fn total_investment(&self) -> f64 {
        self.tickers.iter().map(|t| self.contribution(t)).sum()
    }

    pub fn has_selection(&self) -> bool {
        !self.tickers.is_empty()
    }
}

/// Display and window settings for a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSettings {
    pub index_label: String,
    pub average_window: usize,
    pub range_window: usize,
    pub trading_days: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            index_label: DEFAULT_INDEX_LABEL.to_string(),
            average_window: DEFAULT_AVERAGE_WINDOW,
            range_window: DEFAULT_RANGE_WINDOW,
            trading_days: 252,
        }
    }
}

impl From<&FolioConfig> for DashboardSettings {
    fn from(config: &FolioConfig) -> Self {
        Self {
            index_label: config.market.index_label.clone(),
            average_window: config.metrics.moving_average_window,
            range_window: config.metrics.range_window,
            trading_days: config.risk.trading_days_per_year,
        }
    }
}

/// Everything the dashboard shows for a session with data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    /// Selected tickers that returned prices, in selection order
    pub tickers: Vec<String>,
    /// Selected tickers without prices
    pub missing: Vec<String>,
    pub range: DateRange,
    pub risk: PortfolioRisk,
    pub comparison: IndexComparison,
    pub portfolio: Vec<PortfolioPoint>,
    pub returns: Vec<ReturnSeries>,
    pub summaries: Vec<TickerSummary>,
    pub projection: GoalProjection,
}

/// Outcome of a dashboard computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    /// No tickers selected; nothing was computed
    NoSelection { message: String },
    /// Tickers selected but no prices were available
    NoData { message: String },
    Ready(Box<DashboardReport>),
}

impl DashboardView {
    pub fn report(&self) -> Option<&DashboardReport> {
        match self {
            DashboardView::Ready(report) => Some(report),
            _ => None,
        }
    }

    fn no_selection() -> Self {
        DashboardView::NoSelection {
            message: NO_SELECTION_MESSAGE.to_string(),
        }
    }
}

/// Fetches prices for sessions and computes their dashboards.
#[derive(Clone)]
pub struct Dashboard {
    fetcher: PriceFetcher,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(fetcher: PriceFetcher, settings: DashboardSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Fetch the session's tickers and reference index, then compute.
    ///
    /// Nothing is fetched when the session has no tickers.
    pub async fn load(&self, session: &Session) -> DashboardView {
        if !session.has_selection() {
            return DashboardView::no_selection();
        }

        let index_symbols = vec![session.index_symbol.clone()];
        let (portfolio_prices, index_prices) = futures::join!(
            self.fetcher.fetch_table(&session.tickers, &session.range),
            self.fetcher.fetch_table(&index_symbols, &session.range),
        );

        Self::compute(session, &portfolio_prices, &index_prices, &self.settings)
    }

    /// Compute the dashboard from already-fetched prices.
    ///
    /// # Arguments
    ///
    /// * `session` - User choices
    /// * `portfolio_prices` - Closes of the selected tickers
    /// * `index_prices` - Closes of the reference index (may be empty)
    /// * `settings` - Window sizes and index label
    pub fn compute(
        session: &Session,
        portfolio_prices: &PriceTable,
        index_prices: &PriceTable,
        settings: &DashboardSettings,
    ) -> DashboardView {
        if !session.has_selection() {
            return DashboardView::no_selection();
        }

        let by_symbol: BTreeMap<String, ReturnSeries> = compute_return_series(portfolio_prices)
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.symbol.clone(), s))
            .collect();

        let (tickers, missing): (Vec<String>, Vec<String>) = session
            .tickers
            .iter()
            .cloned()
            .partition(|t| by_symbol.contains_key(t));
        let returns: Vec<ReturnSeries> = tickers
            .iter()
            .filter_map(|t| by_symbol.get(t).cloned())
            .collect();

        if returns.is_empty() {
            info!(
                "No price data for {} between {} and {}",
                session.tickers.join(","),
                session.range.start,
                session.range.end
            );
            return DashboardView::NoData {
                message: format!(
                    "No price data for {} between {} and {}",
                    session.tickers.join(", "),
                    session.range.start,
                    session.range.end
                ),
            };
        }
        if !missing.is_empty() {
            warn!("No price data for {}", missing.join(","));
        }

        let index_series = compute_return_series(index_prices)
            .into_iter()
            .find(|s| s.symbol == session.index_symbol && !s.is_empty());
        if index_series.is_none() {
            warn!("No price data for index {}", session.index_symbol);
        }

        let risk = calculate_portfolio_risk(&returns, settings.trading_days);
        let comparison = compare_to_index(
            &session.index_symbol,
            &settings.index_label,
            index_series.as_ref(),
            &returns,
        );
        let portfolio = portfolio_cumulative_returns(&returns);
        let summaries = returns
            .iter()
            .map(|s| {
                summarize_ticker(
                    &s.symbol,
                    &s.prices(),
                    settings.average_window,
                    settings.range_window,
                )
            })
            .collect();
        let projection = project_goal(&returns, &session.contributions, session.goal);

        debug!(
            "Computed dashboard for {} tickers (std dev {:.6})",
            returns.len(),
            risk.std_dev
        );

        DashboardView::Ready(Box::new(DashboardReport {
            tickers,
            missing,
            range: session.range,
            risk,
            comparison,
            portfolio,
            returns,
            summaries,
            projection,
        }))
    }
}
