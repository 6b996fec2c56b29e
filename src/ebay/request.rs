//! Query construction for Shopping and Finding API calls.

use crate::ebay::endpoints::{ApiFamily, Endpoints};
use crate::ebay::models::Identifier;
use std::fmt;
use tracing::warn;

/// Shopping API schema version sent with every call.
pub const SHOPPING_VERSION: &str = "525";

/// Finding API service version sent with every call.
pub const FINDING_SERVICE_VERSION: &str = "1.0.0";

/// Response encoding requested from both families.
pub const RESPONSE_FORMAT: &str = "JSON";

/// Remote API call supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUserProfile,
    GetCategoryInfo,
    GetSingleItem,
    GetMultipleItems,
    FindPopularItems,
    FindProducts,
    FindItemsByKeywords,
    FindItemsByCategory,
}

impl Operation {
    /// Call name as the remote API expects it.
    pub fn call_name(&self) -> &'static str {
        match self {
            Operation::GetUserProfile => "GetUserProfile",
            Operation::GetCategoryInfo => "GetCategoryInfo",
            Operation::GetSingleItem => "GetSingleItem",
            Operation::GetMultipleItems => "GetMultipleItems",
            Operation::FindPopularItems => "FindPopularItems",
            Operation::FindProducts => "FindProducts",
            Operation::FindItemsByKeywords => "findItemsByKeywords",
            Operation::FindItemsByCategory => "findItemsByCategory",
        }
    }

    pub fn family(&self) -> ApiFamily {
        match self {
            Operation::FindItemsByKeywords | Operation::FindItemsByCategory => ApiFamily::Finding,
            _ => ApiFamily::Shopping,
        }
    }

    /// Query parameter carrying the call's primary argument.
    pub fn primary_param(&self) -> &'static str {
        match self {
            Operation::GetUserProfile => "UserID",
            Operation::GetCategoryInfo => "CategoryID",
            Operation::GetSingleItem | Operation::GetMultipleItems => "ItemID",
            Operation::FindPopularItems | Operation::FindProducts => "QueryKeywords",
            Operation::FindItemsByKeywords => "keywords",
            Operation::FindItemsByCategory => "categoryId",
        }
    }

    /// Query keys the builder sets itself; caller properties may not use them.
    pub fn reserved_params(&self) -> &'static [&'static str] {
        match self.family() {
            ApiFamily::Shopping => {
                &["callname", "appid", "version", "responseencoding", "callbackname"]
            }
            ApiFamily::Finding => &[
                "SERVICE-VERSION",
                "REST-PAYLOAD",
                "OPERATION-NAME",
                "SECURITY-APPNAME",
                "RESPONSE-DATA-FORMAT",
                "callback",
            ],
        }
    }

    pub fn all() -> &'static [Operation] {
        &[
            Operation::GetUserProfile,
            Operation::GetCategoryInfo,
            Operation::GetSingleItem,
            Operation::GetMultipleItems,
            Operation::FindPopularItems,
            Operation::FindProducts,
            Operation::FindItemsByKeywords,
            Operation::FindItemsByCategory,
        ]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_name())
    }
}

/// Ordered property bag passed through to a call.
///
/// Keys keep their first insertion position; setting an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses a `key=value` pair as given on the command line.
    pub fn parse_pair(pair: &str) -> Result<(String, String), String> {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("Invalid property '{}'. Expected key=value", pair)),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}

/// One call against the remote API: an operation, its primary argument and
/// the caller's extra properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    operation: Operation,
    primary: Identifier,
    properties: Properties,
}

impl ApiRequest {
    pub fn new(operation: Operation, primary: impl Into<Identifier>, properties: &Properties) -> Self {
        Self { operation, primary: primary.into(), properties: properties.clone() }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Primary argument (id, keywords, category) of the call.
    pub fn primary(&self) -> &Identifier {
        &self.primary
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Call parameters: the primary argument first, then the caller's
    /// properties, which override the primary argument on a key clash.
    /// Properties naming a reserved query key are dropped.
    pub fn params(&self) -> Properties {
        let reserved = self.operation.reserved_params();
        let mut params = Properties::new();
        params.set(self.operation.primary_param(), self.primary.as_str());
        for (key, value) in self.properties.iter() {
            if reserved.iter().any(|r| r.eq_ignore_ascii_case(key)) {
                warn!("Ignoring reserved property '{}' for {}", key, self.operation);
                continue;
            }
            params.set(key, value);
        }
        params
    }
}

/// Builds fully-qualified, percent-encoded request URLs.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    app_id: String,
    endpoints: Endpoints,
}

impl RequestBuilder {
    pub fn new(app_id: impl Into<String>, endpoints: Endpoints) -> Self {
        Self { app_id: app_id.into(), endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Returns the URL for `request`. With a `callback`, the padding parameter
    /// for the request's family is appended last.
    pub fn build(&self, request: &ApiRequest, callback: Option<&str>) -> String {
        let operation = request.operation();
        let family = operation.family();

        let mut query = match family {
            ApiFamily::Shopping => format!(
                "callname={}&appid={}&version={}&responseencoding={}",
                operation.call_name(),
                urlencoding::encode(&self.app_id),
                SHOPPING_VERSION,
                RESPONSE_FORMAT
            ),
            ApiFamily::Finding => format!(
                "SERVICE-VERSION={}&REST-PAYLOAD&OPERATION-NAME={}&SECURITY-APPNAME={}&RESPONSE-DATA-FORMAT={}",
                FINDING_SERVICE_VERSION,
                operation.call_name(),
                urlencoding::encode(&self.app_id),
                RESPONSE_FORMAT
            ),
        };

        for (key, value) in request.params().iter() {
            query.push('&');
            query.push_str(&urlencoding::encode(key));
            query.push('=');
            query.push_str(&urlencoding::encode(value));
        }

        if let Some(callback) = callback {
            query.push('&');
            query.push_str(family.callback_param());
            query.push('=');
            query.push_str(&urlencoding::encode(callback));
        }

        let base = self.endpoints.base_url(family);
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base, separator, query)
    }
}
