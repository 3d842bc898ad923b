//! Return, risk and projection analytics.
//!
//! Everything here is a pure function of already-fetched prices:
//!
//! - **Returns**: daily, cumulative and from-start returns per symbol
//! - **Risk**: covariance-based standard deviation of an equal-weight portfolio
//! - **Comparison**: portfolio versus a reference index
//! - **Projection**: contributions grown over the range, first date a goal is met
//! - **Summary**: trailing average, low and high per ticker

mod comparison;
mod projection;
mod returns;
mod risk;
mod summary;

pub use comparison::{compare_to_index, ComparisonPoint, IndexComparison};
pub use projection::{
    first_hit, project_goal, AggregatePoint, GoalOutcome, GoalProjection, ProjectedValue,
};
pub use returns::{
    compute_return_series, cumulative_returns, daily_returns, portfolio_cumulative_returns,
    price_pct_from_start, PortfolioPoint, ReturnPoint, ReturnSeries,
};
pub use risk::{
    calculate_portfolio_risk, covariance_matrix, portfolio_std_dev, sample_covariance,
    sample_std_dev, PortfolioRisk,
};
pub use summary::{
    round2, summarize_ticker, trailing_max, trailing_mean, trailing_min, TickerSummary,
    DEFAULT_AVERAGE_WINDOW, DEFAULT_RANGE_WINDOW,
};
