//! Portfolio versus reference index overlay.

use super::returns::{portfolio_cumulative_returns, union_dates, ReturnSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One date of the comparison chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    /// Index change since its own first observation
    pub index: Option<f64>,
    /// Equal-weight portfolio cumulative return, 0 on the portfolio's first date
    pub portfolio: Option<f64>,
}

/// Two cumulative-return series aligned by date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexComparison {
    pub index_symbol: String,
    pub index_label: String,
    pub points: Vec<ComparisonPoint>,
}

/// Align the index and the equal-weight portfolio on the union of their dates.
///
/// The portfolio column is the same series as [`portfolio_cumulative_returns`],
/// set to 0 on the portfolio's first date where no holding has a return yet.
/// The index column starts at 0 on the index's first date. `index` is `None`
/// when no index prices could be fetched; the portfolio column is still
/// produced.
pub fn compare_to_index(
    index_symbol: &str,
    index_label: &str,
    index: Option<&ReturnSeries>,
    portfolio: &[ReturnSeries],
) -> IndexComparison {
    let mut all: Vec<ReturnSeries> = portfolio.to_vec();
    if let Some(index) = index {
        all.push(index.clone());
    }

    let portfolio_returns: BTreeMap<NaiveDate, Option<f64>> = portfolio_cumulative_returns(portfolio)
        .into_iter()
        .map(|p| (p.date, p.cumulative_return))
        .collect();
    let portfolio_start = portfolio_returns.keys().next().copied();

    let points = union_dates(&all)
        .into_iter()
        .map(|date| {
            let cumulative = portfolio_returns.get(&date).copied().flatten();
            ComparisonPoint {
                date,
                index: index.and_then(|s| s.at(date)).map(|p| p.price_pct_from_start),
                portfolio: if Some(date) == portfolio_start {
                    Some(cumulative.unwrap_or(0.0))
                } else {
                    cumulative
                },
            }
        })
        .collect();

    IndexComparison {
        index_symbol: index_symbol.to_uppercase(),
        index_label: index_label.to_string(),
        points,
    }
}
