//! Portfolio risk from the covariance of daily returns.
//!
//! Undefined inputs (too few observations, no symbols) produce NaN rather than
//! an error so that a degenerate selection never aborts the dashboard.

use super::returns::ReturnSeries;
use serde::{Deserialize, Serialize};

/// Standard deviation of the equal-weighted portfolio's daily returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioRisk {
    /// Daily standard deviation `sqrt(wᵀ Σ w)` with `w = 1/n`
    pub std_dev: f64,
    /// `std_dev * sqrt(trading_days)`, reported next to the daily figure
    pub annualized_std_dev: f64,
    /// Number of symbols in the portfolio
    pub symbol_count: usize,
}

/// Calculate the portfolio standard deviation for an equal-weight portfolio.
///
/// # Arguments
///
/// * `series` - Return series of each holding
/// * `trading_days` - Periods per year used for the annualized figure (typically 252)
pub fn calculate_portfolio_risk(series: &[ReturnSeries], trading_days: u32) -> PortfolioRisk {
    let cov = covariance_matrix(series);
    let std_dev = portfolio_std_dev(&cov);

    PortfolioRisk {
        std_dev,
        annualized_std_dev: std_dev * (trading_days as f64).sqrt(),
        symbol_count: series.len(),
    }
}

/// Sample covariance matrix of the daily returns of each series.
///
/// Each entry uses only the dates where both symbols have a daily return.
pub fn covariance_matrix(series: &[ReturnSeries]) -> Vec<Vec<f64>> {
    let returns: Vec<_> = series.iter().map(|s| s.daily_returns_by_date()).collect();
    let n = returns.len();
    let mut cov = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = returns[i]
                .iter()
                .filter_map(|(date, x)| returns[j].get(date).map(|y| (*x, *y)))
                .unzip();
            let value = sample_covariance(&xs, &ys);
            cov[i][j] = value;
            cov[j][i] = value;
        }
    }

    cov
}

/// Sample covariance (ddof = 1) of two paired series.
///
/// Returns NaN with fewer than two pairs.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_covariance(values, values).sqrt()
}

/// `sqrt(wᵀ Σ w)` for uniform weights `1/n`. NaN for an empty matrix.
pub fn portfolio_std_dev(cov: &[Vec<f64>]) -> f64 {
    let n = cov.len();
    if n == 0 {
        return f64::NAN;
    }

    let w = 1.0 / n as f64;
    let variance: f64 = cov
        .iter()
        .flat_map(|row| row.iter())
        .map(|c| w * c * w)
        .sum();

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::daily_returns;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn series(symbol: &str, prices: &[f64]) -> ReturnSeries {
        let points: Vec<(NaiveDate, f64)> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                (
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                    *p,
                )
            })
            .collect();
        ReturnSeries::from_prices(symbol, &points)
    }

    #[test]
    fn test_sample_covariance() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        // var(x) = 1.6667, cov(x, 2x) = 3.3333
        assert_abs_diff_eq!(sample_covariance(&xs, &xs), 5.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sample_covariance(&xs, &ys), 10.0 / 3.0, epsilon = 1e-12);
        assert!(sample_covariance(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_single_symbol_equals_own_std_dev() {
        let prices = [100.0, 102.0, 101.0, 105.0, 104.0, 108.0];
        let s = series("A", &prices);

        let risk = calculate_portfolio_risk(&[s], 252);
        let own: Vec<f64> = daily_returns(&prices).into_iter().flatten().collect();

        assert_eq!(risk.symbol_count, 1);
        assert_abs_diff_eq!(risk.std_dev, sample_std_dev(&own), epsilon = 1e-12);
        assert_abs_diff_eq!(
            risk.annualized_std_dev,
            risk.std_dev * 252f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_two_symbols() {
        // B moves opposite to A at half the size: returns +-10% vs -+5%
        let a = series("A", &[100.0, 110.0, 99.0, 108.9]);
        let b = series("B", &[100.0, 95.0, 99.75, 94.7625]);

        let cov = covariance_matrix(&[a.clone(), b.clone()]);
        assert_abs_diff_eq!(cov[0][1], cov[1][0], epsilon = 1e-15);
        assert_abs_diff_eq!(cov[0][1], -0.5 * cov[0][0], epsilon = 1e-12);

        // wᵀΣw = 0.25 * (v + 0.25v - v) = v / 16
        let risk = calculate_portfolio_risk(&[a, b], 252);
        assert_abs_diff_eq!(risk.std_dev, 0.25 * cov[0][0].sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_matches_manual_formula() {
        let a = series("A", &[10.0, 10.5, 10.2, 10.8, 11.0]);
        let b = series("B", &[20.0, 19.5, 20.4, 20.1, 21.0]);
        let cov = covariance_matrix(&[a.clone(), b.clone()]);

        let expected = (0.25 * (cov[0][0] + cov[1][1] + 2.0 * cov[0][1])).sqrt();
        let risk = calculate_portfolio_risk(&[a, b], 252);
        assert_abs_diff_eq!(risk.std_dev, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_are_nan() {
        assert!(calculate_portfolio_risk(&[], 252).std_dev.is_nan());

        // One observation gives no daily returns at all
        let short = series("A", &[100.0]);
        assert!(calculate_portfolio_risk(&[short.clone()], 252).std_dev.is_nan());

        // NaN propagates into the whole portfolio figure
        let ok = series("B", &[100.0, 101.0, 103.0]);
        let risk = calculate_portfolio_risk(&[ok, short], 252);
        assert!(risk.std_dev.is_nan());
        assert_eq!(risk.symbol_count, 2);
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let a = series("A", &[100.0, 101.0, 99.0, 102.0, 104.0]);
        // B is only observed on the last three dates
        let points: Vec<(NaiveDate, f64)> = a.points[2..]
            .iter()
            .zip([50.0, 51.0, 50.5])
            .map(|(p, price)| (p.date, price))
            .collect();
        let b = ReturnSeries::from_prices("B", &points);

        let cov = covariance_matrix(&[a, b]);
        assert!(cov[0][0].is_finite());
        assert!(cov[1][1].is_finite());
        assert!(cov[0][1].is_finite());
    }
}
