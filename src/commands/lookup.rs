//! Id-based lookup command implementation (users, categories, items).

use crate::config::Config;
use crate::ebay::{Catalog, CatalogApi, EbayClient, Properties};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::info;

/// What an id-based lookup fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Users,
    Categories,
    Items,
}

/// Executes a lookup for one or more ids.
pub struct LookupCommand {
    config: Config,
}

impl LookupCommand {
    /// Creates a new lookup command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches the ids and returns formatted output.
    ///
    /// With `settle`, every id is awaited and failures are reported per slot
    /// instead of failing the whole lookup.
    pub async fn execute(
        &self,
        kind: LookupKind,
        ids: &[String],
        props: &Properties,
        settle: bool,
    ) -> Result<String> {
        let client = EbayClient::new(&self.config).context("Failed to create HTTP client")?;
        let catalog = Catalog::new(client, self.config.batch_options());

        self.execute_with_catalog(&catalog, kind, ids, props, settle).await
    }

    /// Fetches the ids with a provided catalog (for testing).
    pub async fn execute_with_catalog<A: CatalogApi>(
        &self,
        catalog: &Catalog<A>,
        kind: LookupKind,
        ids: &[String],
        props: &Properties,
        settle: bool,
    ) -> Result<String> {
        let ids: Vec<&str> = ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            anyhow::bail!("No ids given");
        }

        info!("Looking up {} {:?}", ids.len(), kind);
        let formatter = Formatter::new(self.config.format);

        let output = match (kind, settle) {
            (LookupKind::Items, _) => {
                let response =
                    catalog.get_items(ids, props).await.context("Failed to fetch items")?;
                formatter.format_response(&response)
            }
            (LookupKind::Users, false) => {
                let delivery =
                    catalog.get_users(ids, props).await.context("Failed to fetch users")?;
                formatter.format_delivery(&delivery)
            }
            (LookupKind::Users, true) => {
                let delivery = catalog.get_users_settled(ids, props).await?;
                formatter.format_settled(&delivery)
            }
            (LookupKind::Categories, false) => {
                let delivery = catalog
                    .get_categories(ids, props)
                    .await
                    .context("Failed to fetch categories")?;
                formatter.format_delivery(&delivery)
            }
            (LookupKind::Categories, true) => {
                let delivery = catalog.get_categories_settled(ids, props).await?;
                formatter.format_settled(&delivery)
            }
        };

        Ok(output)
    }
}
