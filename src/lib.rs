//! ebay-catalog - Async eBay Shopping/Finding API client
//!
//! Builds Shopping and Finding API calls, fetches them as padded or plain
//! JSON, and fans multi-id lookups out into one request per id while
//! delivering the results in the order the ids were given.

pub mod batch;
pub mod commands;
pub mod config;
pub mod ebay;
pub mod error;
pub mod format;

pub use batch::{BatchAggregator, BatchOptions, Delivery};
pub use config::Config;
pub use ebay::{Catalog, CatalogApi, EbayClient, Properties, Response, Transport};
pub use error::{Error, Result};
