//! Keyword and category search command implementation.

use crate::config::Config;
use crate::ebay::{Catalog, CatalogApi, EbayClient, Properties};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::info;

/// Which search call to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Popular items for keywords (Shopping API).
    Popular,
    /// Item search by keywords (Finding API).
    Keywords,
    /// Listings in a category (Finding API).
    Category,
    /// Product catalogue info for keywords (Shopping API).
    Product,
}

/// Executes a single search call.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(&self, kind: SearchKind, query: &str, props: &Properties) -> Result<String> {
        let client = EbayClient::new(&self.config).context("Failed to create HTTP client")?;
        let catalog = Catalog::new(client, self.config.batch_options());

        self.execute_with_catalog(&catalog, kind, query, props).await
    }

    /// Executes the search with a provided catalog (for testing).
    pub async fn execute_with_catalog<A: CatalogApi>(
        &self,
        catalog: &Catalog<A>,
        kind: SearchKind,
        query: &str,
        props: &Properties,
    ) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            anyhow::bail!("Search query must not be empty");
        }

        info!("Searching ({:?}): {}", kind, query);

        let response = match kind {
            SearchKind::Popular => catalog.popular_items(query, props).await,
            SearchKind::Keywords => catalog.search_by_keywords(query, props).await,
            SearchKind::Category => catalog.items_in_category(query, props).await,
            SearchKind::Product => catalog.product_info(query, props).await,
        }
        .with_context(|| format!("Search for '{}' failed", query))?;

        Ok(Formatter::new(self.config.format).format_response(&response))
    }
}
