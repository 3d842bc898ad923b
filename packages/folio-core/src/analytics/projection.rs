//! Goal projection: how invested amounts would have grown over the range.

use super::returns::{union_dates, ReturnSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Projected value of one holding on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectedValue {
    pub date: NaiveDate,
    pub symbol: String,
    /// `amount * (1 + price_pct_from_start)`
    pub value: f64,
}

/// Sum of projected values across holdings on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Whether the aggregate value reached the goal within the fetched range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GoalOutcome {
    /// First date the aggregate value was at or above the goal
    Reached { date: NaiveDate, value: f64 },
    /// No date in range reached the goal
    Unreachable,
}

impl GoalOutcome {
    /// Date the goal was first reached, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            GoalOutcome::Reached { date, .. } => Some(*date),
            GoalOutcome::Unreachable => None,
        }
    }

    pub fn is_reached(&self) -> bool {
        matches!(self, GoalOutcome::Reached { .. })
    }
}

/// Full goal projection for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProjection {
    pub goal: f64,
    /// Sum of contributions of the projected holdings
    pub total_investment: f64,
    /// Per-holding values, grouped by symbol in series order
    pub values: Vec<ProjectedValue>,
    /// Per-date totals, sorted by date
    pub aggregate: Vec<AggregatePoint>,
    pub outcome: GoalOutcome,
}

/// Project contributions over each holding's price change and find the first
/// date the total reaches `goal`.
///
/// Holdings without a contribution entry count as 0.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use folio_core::analytics::{project_goal, ReturnSeries};
/// use std::collections::BTreeMap;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let series = vec![ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 110.0)])];
/// let contributions = BTreeMap::from([("A".to_string(), 1000.0)]);
///
/// let projection = project_goal(&series, &contributions, 1050.0);
/// assert_eq!(projection.outcome.date(), Some(d(3)));
/// ```
pub fn project_goal(
    series: &[ReturnSeries],
    contributions: &BTreeMap<String, f64>,
    goal: f64,
) -> GoalProjection {
    let amount_for = |symbol: &str| contributions.get(symbol).copied().unwrap_or(0.0);

    let values: Vec<ProjectedValue> = series
        .iter()
        .flat_map(|s| {
            let amount = amount_for(&s.symbol);
            s.points.iter().map(move |p| ProjectedValue {
                date: p.date,
                symbol: s.symbol.clone(),
                value: amount * (1.0 + p.price_pct_from_start),
            })
        })
        .collect();

    let aggregate = aggregate_values(series, &values);
    let outcome = first_hit(&aggregate, goal);
    let total_investment = series.iter().map(|s| amount_for(&s.symbol)).sum();

    GoalProjection {
        goal,
        total_investment,
        values,
        aggregate,
        outcome,
    }
}

fn aggregate_values(series: &[ReturnSeries], values: &[ProjectedValue]) -> Vec<AggregatePoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = union_dates(series)
        .into_iter()
        .map(|date| (date, 0.0))
        .collect();
    for v in values {
        *totals.entry(v.date).or_insert(0.0) += v.value;
    }

    totals
        .into_iter()
        .map(|(date, value)| AggregatePoint { date, value })
        .collect()
}

/// Earliest point at or above `goal`.
pub fn first_hit(aggregate: &[AggregatePoint], goal: f64) -> GoalOutcome {
    aggregate
        .iter()
        .find(|p| p.value >= goal)
        .map(|p| GoalOutcome::Reached {
            date: p.date,
            value: p.value,
        })
        .unwrap_or(GoalOutcome::Unreachable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn contributions(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(s, a)| (s.to_string(), *a)).collect()
    }

    #[test]
    fn test_two_symbol_scenario() {
        let a = ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 105.0)]);
        let b = ReturnSeries::from_prices("B", &[(d(2), 50.0), (d(3), 49.0)]);

        let projection = project_goal(&[a, b], &contributions(&[("A", 1000.0), ("B", 500.0)]), 0.0);

        let on_t: Vec<&ProjectedValue> = projection.values.iter().filter(|v| v.date == d(3)).collect();
        assert_eq!(on_t[0].symbol, "A");
        assert_abs_diff_eq!(on_t[0].value, 1050.0, epsilon = 1e-9);
        assert_eq!(on_t[1].symbol, "B");
        assert_abs_diff_eq!(on_t[1].value, 490.0, epsilon = 1e-9);

        assert_abs_diff_eq!(projection.aggregate[1].value, 1540.0, epsilon = 1e-9);
        assert_abs_diff_eq!(projection.total_investment, 1500.0);
    }

    #[test]
    fn test_zero_goal_hits_first_date() {
        let a = ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 90.0)]);
        let projection = project_goal(&[a], &contributions(&[("A", 250.0)]), 0.0);

        assert_eq!(
            projection.outcome,
            GoalOutcome::Reached {
                date: d(2),
                value: 250.0
            }
        );
    }

    #[test]
    fn test_all_zero_contributions() {
        let a = ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 120.0)]);
        let b = ReturnSeries::from_prices("B", &[(d(3), 10.0), (d(4), 30.0)]);

        let projection = project_goal(&[a.clone(), b.clone()], &BTreeMap::new(), 1.0);
        assert!(projection.aggregate.iter().all(|p| p.value == 0.0));
        assert_eq!(projection.outcome, GoalOutcome::Unreachable);

        let projection = project_goal(&[a, b], &BTreeMap::new(), 0.0);
        assert_eq!(projection.outcome.date(), Some(d(2)));
    }

    #[test]
    fn test_unreachable_goal() {
        let a = ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 110.0)]);
        let projection = project_goal(&[a], &contributions(&[("A", 1000.0)]), 5000.0);

        assert!(!projection.outcome.is_reached());
        assert_eq!(projection.outcome.date(), None);
        assert_eq!(projection.aggregate.len(), 2);
    }

    #[test]
    fn test_first_hit_is_earliest() {
        let a = ReturnSeries::from_prices(
            "A",
            &[(d(2), 100.0), (d(3), 130.0), (d(4), 90.0), (d(5), 140.0)],
        );
        let projection = project_goal(&[a], &contributions(&[("A", 100.0)]), 125.0);
        assert_eq!(projection.outcome.date(), Some(d(3)));
    }

    #[test]
    fn test_missing_dates_count_as_absent() {
        // B has no price on d(2); the total that day is A alone
        let a = ReturnSeries::from_prices("A", &[(d(2), 100.0), (d(3), 100.0)]);
        let b = ReturnSeries::from_prices("B", &[(d(3), 10.0)]);

        let projection =
            project_goal(&[a, b], &contributions(&[("A", 100.0), ("B", 50.0)]), 120.0);
        assert_abs_diff_eq!(projection.aggregate[0].value, 100.0);
        assert_abs_diff_eq!(projection.aggregate[1].value, 150.0);
        assert_eq!(projection.outcome.date(), Some(d(3)));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(GoalOutcome::Unreachable).unwrap();
        assert_eq!(json["status"], "unreachable");

        let json = serde_json::to_value(GoalOutcome::Reached {
            date: d(2),
            value: 1.0,
        })
        .unwrap();
        assert_eq!(json["status"], "reached");
        assert_eq!(json["date"], "2024-01-02");
    }
}
