//! Reading instrument reference tables from CSV files or URLs.

use super::Catalog;
use crate::types::{Instrument, InstrumentKind};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{debug, info, warn};

/// Where one reference table lives and what kind of instruments it lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSource {
    pub kind: InstrumentKind,
    /// Local path or `http(s)://` URL of a CSV file
    pub location: String,
}

impl CatalogSource {
    pub fn new(kind: InstrumentKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    /// Whether the location is fetched over HTTP.
    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

/// Row of a reference table. Only these columns are read; others are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    website: Option<String>,
}

/// Parse a reference table with a header row.
///
/// Rows without a symbol and rows that fail to parse are skipped.
pub fn parse_catalog_csv<R: Read>(reader: R, kind: InstrumentKind) -> Result<Vec<Instrument>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut instruments = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<CatalogRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed catalog row: {}", e);
                skipped += 1;
                continue;
            }
        };

        match record.symbol.as_deref().map(str::trim) {
            Some(symbol) if !symbol.is_empty() => instruments.push(
                Instrument::new(symbol, record.name.as_deref(), kind)
                    .with_website(record.website.as_deref()),
            ),
            _ => skipped += 1,
        }
    }

    debug!(
        "Parsed {} {:?} instruments ({} rows skipped)",
        instruments.len(),
        kind,
        skipped
    );
    Ok(instruments)
}

async fn read_source(client: &reqwest::Client, source: &CatalogSource) -> Result<Vec<Instrument>> {
    let bytes = if source.is_remote() {
        debug!("Downloading catalog from {}", source.location);
        client
            .get(&source.location)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    } else {
        debug!("Reading catalog from {}", source.location);
        tokio::fs::read(&source.location).await?
    };

    parse_catalog_csv(bytes.as_slice(), source.kind)
}

/// Load and concatenate all sources, in order, into one catalog.
///
/// A source that cannot be read fails the whole load.
pub async fn load_catalog(sources: &[CatalogSource]) -> Result<Catalog> {
    if sources.is_empty() {
        warn!("No catalog sources configured");
    }

    let client = reqwest::Client::new();
    let mut instruments = Vec::new();
    for source in sources {
        instruments.extend(read_source(&client, source).await?);
    }

    let catalog = Catalog::from_instruments(instruments);
    info!("Loaded instrument catalog with {} symbols", catalog.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ETFS: &str = "symbol,name,currency,category\n\
        SPY,SPDR S&P 500 ETF Trust,USD,Equities\n\
        ,Nameless Fund,USD,Equities\n\
        QQQ,Invesco QQQ Trust,USD,Equities\n";

    const EQUITIES: &str = "symbol,name,sector,website\n\
        AAPL,Apple Inc.,Technology,https://www.apple.com\n\
        MSFT,Microsoft Corporation,Technology,\n\
        SPY,Duplicate Listing,Financials,\n";

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_skips_missing_symbols() {
        let instruments = parse_catalog_csv(ETFS.as_bytes(), InstrumentKind::Etf).unwrap();

        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[0].symbol, "SPY");
        assert_eq!(instruments[1].symbol, "QQQ");
        assert!(instruments.iter().all(|i| i.kind == InstrumentKind::Etf));
    }

    #[test]
    fn test_parse_reads_optional_website() {
        let instruments = parse_catalog_csv(EQUITIES.as_bytes(), InstrumentKind::Equity).unwrap();

        assert_eq!(
            instruments[0].website.as_deref(),
            Some("https://www.apple.com")
        );
        assert!(instruments[1].website.is_none());
    }

    #[test]
    fn test_parse_without_name_column() {
        let csv = "symbol\nVTI\n";
        let instruments = parse_catalog_csv(csv.as_bytes(), InstrumentKind::Etf).unwrap();

        assert_eq!(instruments.len(), 1);
        assert!(instruments[0].name.is_none());
        assert_eq!(instruments[0].label(), "VTI");
    }

    #[test]
    fn test_source_is_remote() {
        assert!(CatalogSource::new(InstrumentKind::Etf, "https://example.com/etfs.csv").is_remote());
        assert!(!CatalogSource::new(InstrumentKind::Etf, "/tmp/etfs.csv").is_remote());
    }

    #[tokio::test]
    async fn test_load_catalog_concatenates_sources() {
        let etfs = write_temp(ETFS);
        let equities = write_temp(EQUITIES);

        let catalog = load_catalog(&[
            CatalogSource::new(InstrumentKind::Etf, etfs.path().to_string_lossy()),
            CatalogSource::new(InstrumentKind::Equity, equities.path().to_string_lossy()),
        ])
        .await
        .unwrap();

        // SPY appears in both tables; the ETF entry wins
        assert_eq!(catalog.len(), 4);
        let spy = catalog.get("SPY").unwrap();
        assert_eq!(spy.kind, InstrumentKind::Etf);
        assert_eq!(spy.name.as_deref(), Some("SPDR S&P 500 ETF Trust"));
    }

    #[tokio::test]
    async fn test_load_catalog_missing_file() {
        let result = load_catalog(&[CatalogSource::new(
            InstrumentKind::Etf,
            "/nonexistent/folio/etfs.csv",
        )])
        .await;

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
