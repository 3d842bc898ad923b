//! Instrument catalog: the list of tickers a user can pick from.
//!
//! The catalog is the concatenation of an ETF table and an equity table,
//! keyed by symbol. It is loaded once and never mutated.

mod loader;

pub use loader::{load_catalog, parse_catalog_csv, CatalogSource};

use crate::types::Instrument;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Symbol-keyed instrument reference data.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    instruments: Vec<Instrument>,
    by_symbol: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from instruments in source order.
    ///
    /// Instruments with a blank symbol are dropped. When a symbol appears more
    /// than once, the first occurrence is kept.
    pub fn from_instruments(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let mut catalog = Self::new();
        let mut duplicates = 0usize;

        for instrument in instruments {
            if instrument.symbol.is_empty() {
                continue;
            }
            if catalog.by_symbol.contains_key(&instrument.symbol) {
                duplicates += 1;
                continue;
            }
            catalog
                .by_symbol
                .insert(instrument.symbol.clone(), catalog.instruments.len());
            catalog.instruments.push(instrument);
        }

        if duplicates > 0 {
            debug!("Ignored {} duplicate catalog symbols", duplicates);
        }
        catalog
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Find an instrument by symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.by_symbol
            .get(&symbol.trim().to_uppercase())
            .map(|&idx| &self.instruments[idx])
    }

    /// Display label of a symbol, if it is in the catalog.
    pub fn label(&self, symbol: &str) -> Option<String> {
        self.get(symbol).map(Instrument::label)
    }

    /// Case-insensitive substring search over display labels.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Instrument> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.instruments
            .iter()
            .filter(|i| i.label().to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    /// Resolve selected entries into symbols.
    ///
    /// Entries may be display labels (`"AAPL - Apple Inc."`) or bare symbols.
    /// The result follows catalog order, not selection order, and has no
    /// duplicates. Unknown entries are skipped.
    pub fn select<S: AsRef<str>>(&self, entries: &[S]) -> Vec<String> {
        let mut selected = BTreeSet::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            let idx = self.index_of_entry(entry);
            match idx {
                Some(idx) => {
                    selected.insert(idx);
                }
                None => warn!("'{}' is not in the instrument catalog", entry),
            }
        }

        selected
            .into_iter()
            .map(|idx| self.instruments[idx].symbol.clone())
            .collect()
    }

    fn index_of_entry(&self, entry: &str) -> Option<usize> {
        if let Some(&idx) = self.by_symbol.get(&entry.to_uppercase()) {
            return Some(idx);
        }

        let (symbol, _) = entry.split_once(" - ")?;
        let &idx = self.by_symbol.get(&symbol.trim().to_uppercase())?;
        (self.instruments[idx].label() == entry).then_some(idx)
    }
}
