//! Caller-facing catalog operations.
//!
//! User profiles and category info are looked up one id per request and
//! re-aggregated in input order. Items use the API's native multi-item call.

use crate::batch::{BatchAggregator, BatchOptions, Delivery};
use crate::ebay::client::CatalogApi;
use crate::ebay::models::{Identifier, Response};
use crate::ebay::request::{ApiRequest, Operation, Properties};
use crate::error::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Catalog operations over any [`CatalogApi`] implementation.
pub struct Catalog<A> {
    api: A,
    batches: BatchAggregator,
}

impl<A: CatalogApi> Catalog<A> {
    pub fn new(api: A, options: BatchOptions) -> Self {
        Self { api, batches: BatchAggregator::new(options) }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Aggregator running this catalog's batches (for `cancel_all`/`in_flight`).
    pub fn batches(&self) -> &BatchAggregator {
        &self.batches
    }

    /// Fetches user profiles.
    pub async fn get_users<I: Into<Identifier>>(
        &self,
        user_ids: impl IntoIterator<Item = I>,
        props: &Properties,
    ) -> Result<Delivery<Response>> {
        self.lookup(Operation::GetUserProfile, user_ids, props, &CancellationToken::new()).await
    }

    /// Fetches user profiles, keeping per-user failures in their slots.
    pub async fn get_users_settled<I: Into<Identifier>>(
        &self,
        user_ids: impl IntoIterator<Item = I>,
        props: &Properties,
    ) -> Result<Delivery<Result<Response>>> {
        self.lookup_settled(Operation::GetUserProfile, user_ids, props, &CancellationToken::new())
            .await
    }

    /// Fetches category info.
    pub async fn get_categories<I: Into<Identifier>>(
        &self,
        category_ids: impl IntoIterator<Item = I>,
        props: &Properties,
    ) -> Result<Delivery<Response>> {
        self.lookup(Operation::GetCategoryInfo, category_ids, props, &CancellationToken::new())
            .await
    }

    /// Fetches category info, keeping per-category failures in their slots.
    pub async fn get_categories_settled<I: Into<Identifier>>(
        &self,
        category_ids: impl IntoIterator<Item = I>,
        props: &Properties,
    ) -> Result<Delivery<Result<Response>>> {
        self.lookup_settled(
            Operation::GetCategoryInfo,
            category_ids,
            props,
            &CancellationToken::new(),
        )
        .await
    }

    /// Fetches items in a single call: `GetSingleItem` for one id,
    /// `GetMultipleItems` with the ids comma-joined otherwise.
    pub async fn get_items<I: Into<Identifier>>(
        &self,
        item_ids: impl IntoIterator<Item = I>,
        props: &Properties,
    ) -> Result<Response> {
        let ids: Vec<Identifier> = item_ids.into_iter().map(Into::into).collect();

        let request = match ids.as_slice() {
            [] => return Err(Error::EmptyBatch),
            [id] => ApiRequest::new(Operation::GetSingleItem, id.clone(), props),
            many => {
                let joined = many.iter().map(Identifier::as_str).collect::<Vec<_>>().join(",");
                ApiRequest::new(Operation::GetMultipleItems, joined, props)
            }
        };

        info!("Fetching {} item(s)", ids.len());
        self.api.execute(&request).await
    }

    /// Popular items matching space-separated keywords.
    pub async fn popular_items(&self, keywords: &str, props: &Properties) -> Result<Response> {
        self.single(Operation::FindPopularItems, keywords, props).await
    }

    /// Keyword search through the Finding API.
    pub async fn search_by_keywords(&self, keywords: &str, props: &Properties) -> Result<Response> {
        self.single(Operation::FindItemsByKeywords, keywords, props).await
    }

    /// Listings in one category through the Finding API.
    pub async fn items_in_category(
        &self,
        category_id: impl Into<Identifier>,
        props: &Properties,
    ) -> Result<Response> {
        self.single(Operation::FindItemsByCategory, category_id, props).await
    }

    /// Product information matching keywords.
    pub async fn product_info(&self, keywords: &str, props: &Properties) -> Result<Response> {
        self.single(Operation::FindProducts, keywords, props).await
    }

    /// Runs `operation` once per id, failing on the first error.
    pub async fn lookup<I: Into<Identifier>>(
        &self,
        operation: Operation,
        ids: impl IntoIterator<Item = I>,
        props: &Properties,
        cancel: &CancellationToken,
    ) -> Result<Delivery<Response>> {
        let ids: Vec<Identifier> = ids.into_iter().map(Into::into).collect();
        info!("{}: looking up {} id(s)", operation, ids.len());

        self.batches
            .run_with_cancel(
                ids,
                |id| {
                    let request = ApiRequest::new(operation, id, props);
                    async move { self.api.execute(&request).await }
                },
                cancel,
            )
            .await
    }

    /// Runs `operation` once per id, waiting for all and marking failed slots.
    pub async fn lookup_settled<I: Into<Identifier>>(
        &self,
        operation: Operation,
        ids: impl IntoIterator<Item = I>,
        props: &Properties,
        cancel: &CancellationToken,
    ) -> Result<Delivery<Result<Response>>> {
        let ids: Vec<Identifier> = ids.into_iter().map(Into::into).collect();
        info!("{}: looking up {} id(s), settling all", operation, ids.len());

        self.batches
            .settle_with_cancel(
                ids,
                |id| {
                    let request = ApiRequest::new(operation, id, props);
                    async move { self.api.execute(&request).await }
                },
                cancel,
            )
            .await
    }

    async fn single(
        &self,
        operation: Operation,
        primary: impl Into<Identifier>,
        props: &Properties,
    ) -> Result<Response> {
        let request = ApiRequest::new(operation, primary, props);
        info!("{}: {}", operation, request.primary());
        self.api.execute(&request).await
    }
}
