//! Trailing-window price metrics shown per ticker.

use serde::{Deserialize, Serialize};

/// Default window for the moving average, in observations.
pub const DEFAULT_AVERAGE_WINDOW: usize = 50;
/// Default window for the low/high range, in observations.
pub const DEFAULT_RANGE_WINDOW: usize = 365;

/// Headline metrics of one ticker, each rounded to 2 decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerSummary {
    pub symbol: String,
    /// Mean of the last `average_window` prices
    pub moving_average: Option<f64>,
    /// Lowest of the last `range_window` prices
    pub period_low: Option<f64>,
    /// Highest of the last `range_window` prices
    pub period_high: Option<f64>,
    pub average_window: usize,
    pub range_window: usize,
}

/// The last `window` values, or all of them when the series is shorter.
fn tail(data: &[f64], window: usize) -> &[f64] {
    &data[data.len().saturating_sub(window)..]
}

/// Mean of the trailing `window` values.
///
/// # Example
///
/// ```rust
/// use folio_core::analytics::trailing_mean;
///
/// let prices = vec![10.0, 11.0, 12.0, 13.0];
/// assert_eq!(trailing_mean(&prices, 2), Some(12.5));
/// // Window larger than the series uses what is available
/// assert_eq!(trailing_mean(&prices, 50), Some(11.5));
/// ```
pub fn trailing_mean(data: &[f64], window: usize) -> Option<f64> {
    let values = tail(data, window);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Minimum of the trailing `window` values.
pub fn trailing_min(data: &[f64], window: usize) -> Option<f64> {
    tail(data, window).iter().copied().reduce(f64::min)
}

/// Maximum of the trailing `window` values.
pub fn trailing_max(data: &[f64], window: usize) -> Option<f64> {
    tail(data, window).iter().copied().reduce(f64::max)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarize one ticker from its prices in date order.
pub fn summarize_ticker(
    symbol: &str,
    prices: &[f64],
    average_window: usize,
    range_window: usize,
) -> TickerSummary {
    TickerSummary {
        symbol: symbol.to_uppercase(),
        moving_average: trailing_mean(prices, average_window).map(round2),
        period_low: trailing_min(prices, range_window).map(round2),
        period_high: trailing_max(prices, range_window).map(round2),
        average_window,
        range_window,
    }
}
