//! Market data access: closing prices and company logos.
//!
//! Sources are traits so the dashboard can run against Yahoo Finance in
//! production and against in-memory data in tests.

mod logo;
mod yahoo;

pub use logo::{domain_from_website, Logo, LogoLookup, WebsiteSource, DEFAULT_LOGO_BASE_URL};
pub use yahoo::{pick_close, YahooProvider};

use crate::types::{DateRange, PriceObservation, PriceTable};
use crate::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// A provider of daily closing prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short provider identifier used in logs.
    fn id(&self) -> &'static str;

    /// Daily closes of `symbol` within `range`, in any order.
    async fn fetch_closes(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>>;
}

/// Builds price tables from a [`PriceSource`], tolerating per-symbol failures.
#[derive(Clone)]
pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Fetch closes for every symbol into one table.
    ///
    /// Symbols that fail or return nothing are logged and left out, so the
    /// result may be partial or empty. An empty range returns an empty table
    /// without contacting the provider.
    pub async fn fetch_table(&self, symbols: &[String], range: &DateRange) -> PriceTable {
        let mut table = PriceTable::new();

        if symbols.is_empty() || range.is_empty() {
            debug!(
                "Skipping price fetch ({} symbols, {} to {})",
                symbols.len(),
                range.start,
                range.end
            );
            return table;
        }

        let requests = symbols.iter().map(|symbol| async move {
            (symbol, self.source.fetch_closes(symbol, range).await)
        });

        for (symbol, result) in join_all(requests).await {
            match result {
                Ok(observations) => {
                    let in_range: Vec<PriceObservation> = observations
                        .into_iter()
                        .filter(|o| range.contains(o.date))
                        .collect();
                    if in_range.is_empty() {
                        warn!(
                            "{}: no prices for {} between {} and {}",
                            self.source.id(),
                            symbol,
                            range.start,
                            range.end
                        );
                        continue;
                    }
                    debug!("{}: {} prices for {}", self.source.id(), in_range.len(), symbol);
                    table.insert_series(symbol, in_range.into_iter().map(|o| (o.date, o.close)));
                }
                Err(e) => warn!("{}: failed to fetch {}: {}", self.source.id(), symbol, e),
            }
        }

        table.without_empty_columns()
    }
}
