//! Company logo lookup from instrument websites.

use crate::catalog::Catalog;
use crate::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Default logo image service; the instrument's domain is appended.
pub const DEFAULT_LOGO_BASE_URL: &str = "https://logo.clearbit.com/";

/// Result of a logo lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Logo {
    /// Image reference for the instrument
    Resolved { url: String },
    /// No logo; show the label instead
    Unavailable { label: String },
}

impl Logo {
    pub fn url(&self) -> Option<&str> {
        match self {
            Logo::Resolved { url } => Some(url),
            Logo::Unavailable { .. } => None,
        }
    }
}

/// Something that may know an instrument's website.
#[async_trait]
pub trait WebsiteSource: Send + Sync {
    async fn website(&self, symbol: &str) -> Result<Option<String>>;
}

#[async_trait]
impl WebsiteSource for Catalog {
    async fn website(&self, symbol: &str) -> Result<Option<String>> {
        Ok(self.get(symbol).and_then(|i| i.website.clone()))
    }
}

/// Bare domain of a website, e.g. `https://www.apple.com/ipad` -> `apple.com`.
///
/// A missing scheme is tolerated. Returns `None` when no host can be parsed.
pub fn domain_from_website(website: &str) -> Option<String> {
    let website = website.trim();
    if website.is_empty() {
        return None;
    }

    let url = if website.contains("://") {
        Url::parse(website)
    } else {
        Url::parse(&format!("https://{}", website))
    }
    .ok()?;

    let host = url.host_str()?.to_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    (!domain.is_empty()).then(|| domain.to_string())
}

/// Resolves logos by asking website sources in order.
#[derive(Clone)]
pub struct LogoLookup {
    base_url: String,
    enabled: bool,
    sources: Vec<Arc<dyn WebsiteSource>>,
}

impl LogoLookup {
    pub fn new(base_url: impl Into<String>, enabled: bool) -> Self {
        Self {
            base_url: base_url.into(),
            enabled,
            sources: Vec::new(),
        }
    }

    /// Append a website source; earlier sources win.
    pub fn with_source(mut self, source: Arc<dyn WebsiteSource>) -> Self {
        self.sources.push(source);
        self
    }

    fn logo_url(&self, domain: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, domain)
        } else {
            format!("{}/{}", self.base_url, domain)
        }
    }

    /// Resolve the logo of one symbol. Never fails.
    pub async fn resolve(&self, symbol: &str) -> Logo {
        let symbol = symbol.trim().to_uppercase();
        let unavailable = || Logo::Unavailable {
            label: symbol.clone(),
        };

        if !self.enabled {
            return unavailable();
        }

        for source in &self.sources {
            match source.website(&symbol).await {
                Ok(Some(website)) => match domain_from_website(&website) {
                    Some(domain) => {
                        debug!("Logo for {} from domain {}", symbol, domain);
                        return Logo::Resolved {
                            url: self.logo_url(&domain),
                        };
                    }
                    None => debug!("Unusable website '{}' for {}", website, symbol),
                },
                Ok(None) => {}
                Err(e) => warn!("Website lookup failed for {}: {}", symbol, e),
            }
        }

        unavailable()
    }

    /// Resolve logos for several symbols, in the given order.
    pub async fn resolve_all(&self, symbols: &[String]) -> Vec<(String, Logo)> {
        let lookups = symbols.iter().map(|s| async move { (s.clone(), self.resolve(s).await) });
        join_all(lookups).await
    }
}

impl Default for LogoLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOGO_BASE_URL, true)
    }
}
