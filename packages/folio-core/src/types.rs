//! Core data types for the folio dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of tradable instrument in the reference catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Etf,
    Equity,
}

/// A tradable instrument from the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    /// Ticker symbol (uppercase)
    pub symbol: String,
    /// Display name, when the reference table has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ETF or equity
    pub kind: InstrumentKind,
    /// Company website (used for logo lookup)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Instrument {
    /// Create a new instrument with the given symbol, name and kind.
    pub fn new(symbol: &str, name: Option<&str>, kind: InstrumentKind) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            kind,
            website: None,
        }
    }

    /// Attach a website to the instrument.
    pub fn with_website(mut self, website: Option<&str>) -> Self {
        self.website = website
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string);
        self
    }

    /// Display label in the `SYMBOL - Name` form used for search and selection.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} - {}", self.symbol, name),
            None => self.symbol.clone(),
        }
    }
}

/// A single closing price for one symbol on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceObservation {
    /// Ticker symbol
    pub symbol: String,
    /// Trading date
    pub date: NaiveDate,
    /// Closing price (adjusted when the provider exposes it)
    pub close: f64,
}

impl PriceObservation {
    /// Create a new observation.
    pub fn new(symbol: &str, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            date,
            close,
        }
    }
}

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new range. An inverted range is allowed and simply contains no dates.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the range contains no dates.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `date` falls within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Closing prices of one symbol keyed by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceColumn {
    pub symbol: String,
    pub prices: BTreeMap<NaiveDate, f64>,
}

impl PriceColumn {
    /// Prices in date order.
    pub fn values(&self) -> Vec<f64> {
        self.prices.values().copied().collect()
    }

    /// `(date, price)` pairs in date order.
    pub fn points(&self) -> Vec<(NaiveDate, f64)> {
        self.prices.iter().map(|(d, p)| (*d, *p)).collect()
    }

    /// Number of observed prices.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the column has no prices.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Date-indexed price table with one column per symbol.
///
/// Columns keep the order in which symbols were first inserted. A symbol may be
/// missing on dates where other symbols have prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceTable {
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a flat list of observations.
    pub fn from_observations(observations: impl IntoIterator<Item = PriceObservation>) -> Self {
        let mut table = Self::new();
        for obs in observations {
            table.insert(obs);
        }
        table
    }

    fn column_mut(&mut self, symbol: &str) -> &mut PriceColumn {
        let symbol_upper = symbol.to_uppercase();
        let idx = match self.columns.iter().position(|c| c.symbol == symbol_upper) {
            Some(idx) => idx,
            None => {
                self.columns.push(PriceColumn {
                    symbol: symbol_upper,
                    prices: BTreeMap::new(),
                });
                self.columns.len() - 1
            }
        };
        &mut self.columns[idx]
    }

    /// Insert one observation. Non-finite closes are treated as missing.
    /// A later observation for the same `(symbol, date)` replaces the earlier one.
    pub fn insert(&mut self, obs: PriceObservation) {
        let column = self.column_mut(&obs.symbol);
        if obs.close.is_finite() {
            column.prices.insert(obs.date, obs.close);
        }
    }

    /// Insert a whole series for one symbol.
    pub fn insert_series(
        &mut self,
        symbol: &str,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) {
        let column = self.column_mut(symbol);
        for (date, close) in points {
            if close.is_finite() {
                column.prices.insert(date, close);
            }
        }
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    /// Find a column by symbol (case-insensitive).
    pub fn column(&self, symbol: &str) -> Option<&PriceColumn> {
        let symbol_upper = symbol.to_uppercase();
        self.columns.iter().find(|c| c.symbol == symbol_upper)
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.symbol.as_str()).collect()
    }

    /// Sorted union of all dates across columns.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .columns
            .iter()
            .flat_map(|c| c.prices.keys().copied())
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// Whether the table holds no prices at all.
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(PriceColumn::is_empty)
    }

    /// Drop columns that ended up without any prices.
    pub fn without_empty_columns(mut self) -> Self {
        self.columns.retain(|c| !c.is_empty());
        self
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_instrument_new() {
        let inst = Instrument::new(" aapl ", Some("Apple Inc."), InstrumentKind::Equity);
        assert_eq!(inst.symbol, "AAPL");
        assert_eq!(inst.name.as_deref(), Some("Apple Inc."));
        assert!(inst.website.is_none());
    }

    #[test]
    fn test_instrument_label() {
        let inst = Instrument::new("SPY", Some("SPDR S&P 500 ETF"), InstrumentKind::Etf);
        assert_eq!(inst.label(), "SPY - SPDR S&P 500 ETF");

        // Blank names fall back to the bare symbol
        let inst = Instrument::new("XYZ", Some("  "), InstrumentKind::Equity);
        assert_eq!(inst.label(), "XYZ");
    }

    #[test]
    fn test_instrument_with_website() {
        let inst = Instrument::new("AAPL", None, InstrumentKind::Equity)
            .with_website(Some("https://www.apple.com"));
        assert_eq!(inst.website.as_deref(), Some("https://www.apple.com"));

        let inst = inst.with_website(Some(""));
        assert!(inst.website.is_none());
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(d(1), d(5));
        assert!(!range.is_empty());
        assert!(range.contains(d(1)));
        assert!(range.contains(d(4)));
        assert!(!range.contains(d(5))); // end is exclusive

        assert!(DateRange::new(d(5), d(5)).is_empty());
        assert!(DateRange::new(d(6), d(5)).is_empty());
    }

    #[test]
    fn test_price_table_union_of_dates() {
        let mut table = PriceTable::new();
        table.insert_series("aapl", [(d(2), 100.0), (d(3), 101.0)]);
        table.insert_series("MSFT", [(d(3), 300.0), (d(4), 301.0)]);

        assert_eq!(table.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(table.dates(), vec![d(2), d(3), d(4)]);
        assert_eq!(table.column("msft").unwrap().len(), 2);
    }

    #[test]
    fn test_price_table_skips_non_finite() {
        let table = PriceTable::from_observations([
            PriceObservation::new("AAPL", d(2), 100.0),
            PriceObservation::new("AAPL", d(3), f64::NAN),
            PriceObservation::new("AAPL", d(3), 102.0),
        ]);

        assert_eq!(table.column("AAPL").unwrap().values(), vec![100.0, 102.0]);
    }

    #[test]
    fn test_price_table_empty() {
        let mut table = PriceTable::new();
        assert!(table.is_empty());

        table.insert_series("AAPL", std::iter::empty());
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 1);
        assert!(table.without_empty_columns().columns().is_empty());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
