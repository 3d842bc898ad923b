//! Folio CLI - portfolio dashboard from the command line.
//!
//! Every command prints one JSON `ApiResponse` document on stdout. Logs go to
//! stderr and are controlled with `RUST_LOG`.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use folio_core::{
    load_catalog, ApiResponse, Catalog, Dashboard, DashboardSettings, DateRange, FolioConfig,
    LogoLookup, PriceFetcher, Session, YahooProvider,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio portfolio dashboard - returns, risk and goal tracking")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $FOLIO_CONFIG_FILE or ~/.folio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard for a set of tickers
    Dashboard {
        /// Tickers or catalog labels (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
        /// First date (YYYY-MM-DD, inclusive)
        #[arg(short, long)]
        start: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD, exclusive, defaults to today)
        #[arg(short, long)]
        end: Option<NaiveDate>,
        /// Invested amount as SYMBOL=AMOUNT (repeatable)
        #[arg(short, long = "amount", value_parser = parse_amount)]
        amounts: Vec<(String, f64)>,
        /// Goal value
        #[arg(short, long, default_value = "0")]
        goal: f64,
        /// Reference index symbol
        #[arg(long)]
        index: Option<String>,
        /// Resolve tickers through the instrument catalog
        #[arg(long)]
        from_catalog: bool,
        /// Include company logos
        #[arg(long)]
        logos: bool,
    },
    /// Instrument catalog commands
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Look up a company logo
    Logo {
        /// Ticker symbol
        #[arg(short, long)]
        symbol: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Search instruments by symbol or name
    Search {
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one instrument
    Show { symbol: String },
}

/// Parse `SYMBOL=AMOUNT`.
fn parse_amount(raw: &str) -> Result<(String, f64), String> {
    let (symbol, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=AMOUNT, got '{}'", raw))?;
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(format!("missing symbol in '{}'", raw));
    }
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{}': {}", raw, e))?;
    Ok((symbol, amount))
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|e| {
        format!(
            "{{\"ok\": false, \"error\": \"failed to serialize response: {}\"}}",
            e
        )
    })
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let output = match run(cli).await {
        Ok(data) => render(&ApiResponse::ok(data)),
        Err(e) => render(&ApiResponse::<()>::err(format!("{:#}", e))),
    };

    println!("{}", output);
}

async fn run(cli: Cli) -> anyhow::Result<serde_json::Value> {
    let config = match &cli.config {
        Some(path) => FolioConfig::load_from_path(path),
        None => FolioConfig::load(),
    }
    .context("Failed to load config")?;

    match cli.command {
        Commands::Dashboard {
            tickers,
            start,
            end,
            amounts,
            goal,
            index,
            from_catalog,
            logos,
        } => {
            let request = DashboardRequest {
                tickers,
                start,
                end,
                amounts,
                goal,
                index,
                from_catalog,
                logos,
            };
            handle_dashboard(&config, request).await
        }
        Commands::Catalog { action } => handle_catalog(&config, action).await,
        Commands::Logo { symbol } => handle_logo(&config, &symbol).await,
    }
}

struct DashboardRequest {
    tickers: Vec<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    amounts: Vec<(String, f64)>,
    goal: f64,
    index: Option<String>,
    from_catalog: bool,
    logos: bool,
}

async fn handle_dashboard(
    config: &FolioConfig,
    request: DashboardRequest,
) -> anyhow::Result<serde_json::Value> {
    let start = request.start.unwrap_or(config.market.default_start_date);
    let end = request.end.unwrap_or_else(|| Local::now().date_naive());
    if start > end {
        bail!("start date {} is after end date {}", start, end);
    }

    let catalog = if request.from_catalog {
        Some(Arc::new(
            load_catalog(&config.catalog.sources)
                .await
                .context("Failed to load instrument catalog")?,
        ))
    } else if request.logos {
        // Logos are best effort; the provider profile still works without a catalog
        match load_catalog(&config.catalog.sources).await {
            Ok(catalog) => Some(Arc::new(catalog)),
            Err(e) => {
                warn!("Catalog unavailable for logo lookup: {}", e);
                None
            }
        }
    } else {
        None
    };

    let tickers = match (&catalog, request.from_catalog) {
        (Some(catalog), true) => catalog.select(&request.tickers),
        _ => request.tickers,
    };

    let mut session = Session::new(&tickers, DateRange::new(start, end))
        .with_goal(request.goal)?
        .with_index(
            request
                .index
                .as_deref()
                .unwrap_or(&config.market.index_symbol),
        );
    for (symbol, amount) in request.amounts {
        session = session.with_contribution(&symbol, amount)?;
    }

    let provider = Arc::new(YahooProvider::new(config.market.prefer_adjusted_close)?);
    let dashboard = Dashboard::new(
        PriceFetcher::new(provider.clone()),
        DashboardSettings::from(config),
    );

    info!(
        "Computing dashboard for {} tickers from {} to {}",
        session.tickers.len(),
        start,
        end
    );
    let view = dashboard.load(&session).await;

    let logos = if request.logos {
        let lookup = logo_lookup(config, catalog, provider);
        let resolved = lookup.resolve_all(&session.tickers).await;
        Some(resolved.into_iter().collect::<BTreeMap<_, _>>())
    } else {
        None
    };

    Ok(json!({
        "session": session,
        "view": view,
        "logos": logos,
    }))
}

async fn handle_catalog(
    config: &FolioConfig,
    action: CatalogAction,
) -> anyhow::Result<serde_json::Value> {
    let catalog = load_catalog(&config.catalog.sources)
        .await
        .context("Failed to load instrument catalog")?;

    match action {
        CatalogAction::Search { query, limit } => {
            let results = catalog.search(&query, limit);
            Ok(json!({
                "query": query,
                "count": results.len(),
                "instruments": results,
            }))
        }
        CatalogAction::Show { symbol } => match catalog.get(&symbol) {
            Some(instrument) => Ok(json!({
                "instrument": instrument,
                "label": instrument.label(),
            })),
            None => bail!("Symbol not found in catalog: {}", symbol),
        },
    }
}

async fn handle_logo(config: &FolioConfig, symbol: &str) -> anyhow::Result<serde_json::Value> {
    let catalog = match load_catalog(&config.catalog.sources).await {
        Ok(catalog) => Some(Arc::new(catalog)),
        Err(e) => {
            warn!("Catalog unavailable for logo lookup: {}", e);
            None
        }
    };
    let provider = Arc::new(YahooProvider::new(config.market.prefer_adjusted_close)?);

    let logo = logo_lookup(config, catalog, provider).resolve(symbol).await;
    Ok(json!({
        "symbol": symbol.to_uppercase(),
        "logo": logo,
    }))
}

fn logo_lookup(
    config: &FolioConfig,
    catalog: Option<Arc<Catalog>>,
    provider: Arc<YahooProvider>,
) -> LogoLookup {
    let mut lookup = LogoLookup::new(&config.logo.base_url, config.logo.enabled);
    if let Some(catalog) = catalog {
        lookup = lookup.with_source(catalog);
    }
    if config.logo.use_provider_profile {
        lookup = lookup.with_source(provider);
    }
    lookup
}
