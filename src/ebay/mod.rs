//! eBay-specific modules for request building, HTTP transport, and responses.

pub mod catalog;
pub mod client;
pub mod endpoints;
pub mod models;
pub mod request;
pub mod response;

pub use catalog::Catalog;
pub use client::{CatalogApi, EbayClient, Transport};
pub use endpoints::{ApiFamily, Endpoints};
pub use models::{Identifier, Response};
pub use request::{ApiRequest, Operation, Properties, RequestBuilder};
pub use response::normalize;
