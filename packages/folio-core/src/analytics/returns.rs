//! Daily, cumulative and from-start returns.

use crate::types::PriceTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a symbol's return series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    /// Closing price
    pub price: f64,
    /// `price[t] / price[t-1] - 1`, absent on the first observation
    pub daily_return: Option<f64>,
    /// Compounded daily returns since the first observation, absent on the first observation
    pub cumulative_return: Option<f64>,
    /// `(price - first_price) / first_price`, 0 on the first observation
    pub price_pct_from_start: f64,
}

/// Return series of a single symbol, one point per observed price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnSeries {
    pub symbol: String,
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// Build the return series from `(date, price)` pairs in any order.
    pub fn from_prices(symbol: &str, prices: &[(NaiveDate, f64)]) -> Self {
        let mut prices = prices.to_vec();
        prices.sort_by_key(|(date, _)| *date);

        let closes: Vec<f64> = prices.iter().map(|(_, p)| *p).collect();
        let daily = daily_returns(&closes);
        let cumulative = cumulative_returns(&daily);
        let from_start = price_pct_from_start(&closes);

        let points = prices
            .iter()
            .enumerate()
            .map(|(i, (date, price))| ReturnPoint {
                date: *date,
                price: *price,
                daily_return: daily[i],
                cumulative_return: cumulative[i],
                price_pct_from_start: from_start[i],
            })
            .collect();

        Self {
            symbol: symbol.to_uppercase(),
            points,
        }
    }

    /// Point on `date`, if the symbol has a price that day.
    pub fn at(&self, date: NaiveDate) -> Option<&ReturnPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| &self.points[idx])
    }

    /// Latest observed point.
    pub fn last(&self) -> Option<&ReturnPoint> {
        self.points.last()
    }

    /// Closing prices in date order.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Defined daily returns keyed by date.
    pub fn daily_returns_by_date(&self) -> BTreeMap<NaiveDate, f64> {
        self.points
            .iter()
            .filter_map(|p| p.daily_return.map(|r| (p.date, r)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Equal-weight portfolio cumulative return on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    /// Mean of per-symbol cumulative returns; absent when no symbol has one that day
    pub cumulative_return: Option<f64>,
}

/// Calculate daily percent returns.
///
/// `result[i] = data[i] / data[i-1] - 1`; the first value is `None`.
///
/// # Example
///
/// ```rust
/// use folio_core::analytics::daily_returns;
///
/// let r = daily_returns(&[100.0, 110.0, 99.0]);
/// assert_eq!(r[0], None);
/// assert!((r[1].unwrap() - 0.10).abs() < 1e-12);
/// assert!((r[2].unwrap() + 0.10).abs() < 1e-12);
/// ```
pub fn daily_returns(data: &[f64]) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    for i in 1..data.len() {
        result[i] = Some(data[i] / data[i - 1] - 1.0);
    }
    result
}

/// Compound daily returns into a cumulative return series.
///
/// Undefined returns are skipped: they stay `None` in the output and do not
/// break the running product.
pub fn cumulative_returns(returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            r.map(|r| {
                growth *= 1.0 + r;
                growth - 1.0
            })
        })
        .collect()
}

/// Percent change of each price relative to the first price.
pub fn price_pct_from_start(data: &[f64]) -> Vec<f64> {
    match data.first() {
        Some(&first) => data.iter().map(|p| (p - first) / first).collect(),
        None => Vec::new(),
    }
}

/// Compute the return series of every column of a price table, in column order.
pub fn compute_return_series(table: &PriceTable) -> Vec<ReturnSeries> {
    table
        .columns()
        .iter()
        .map(|column| ReturnSeries::from_prices(&column.symbol, &column.points()))
        .collect()
}

/// Sorted union of the dates covered by a set of series.
pub(crate) fn union_dates(series: &[ReturnSeries]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Mean of the values that are present, `None` when nothing is present.
fn mean_of_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Equal-weight portfolio cumulative return per date.
///
/// This is the arithmetic mean of the per-symbol cumulative returns at each
/// date, not the cumulative return of a rebalanced portfolio.
pub fn portfolio_cumulative_returns(series: &[ReturnSeries]) -> Vec<PortfolioPoint> {
    union_dates(series)
        .into_iter()
        .map(|date| PortfolioPoint {
            date,
            cumulative_return: mean_of_present(
                series
                    .iter()
                    .map(|s| s.at(date).and_then(|p| p.cumulative_return)),
            ),
        })
        .collect()
}
