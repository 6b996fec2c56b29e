//! eBay API families and their base URLs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default Shopping API endpoint.
pub const SHOPPING_API: &str = "http://open.api.ebay.com/shopping";

/// Default Finding API endpoint.
pub const FINDING_API: &str = "http://svcs.ebay.com/services/search/FindingService/v1";

/// Remote API family a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFamily {
    #[default]
    Shopping,
    Finding,
}

impl ApiFamily {
    /// Returns the default base URL for this family.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiFamily::Shopping => SHOPPING_API,
            ApiFamily::Finding => FINDING_API,
        }
    }

    /// Name of the query parameter carrying the padding callback.
    pub fn callback_param(&self) -> &'static str {
        match self {
            ApiFamily::Shopping => "callbackname",
            ApiFamily::Finding => "callback",
        }
    }

    /// Returns all families.
    pub fn all() -> &'static [ApiFamily] {
        &[ApiFamily::Shopping, ApiFamily::Finding]
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFamily::Shopping => write!(f, "shopping"),
            ApiFamily::Finding => write!(f, "finding"),
        }
    }
}

impl FromStr for ApiFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shopping" => Ok(ApiFamily::Shopping),
            "finding" => Ok(ApiFamily::Finding),
            _ => Err(format!("Unknown API family: {}. Use: shopping, finding", s)),
        }
    }
}

/// Base URLs used for each family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    shopping: String,
    finding: String,
}

impl Endpoints {
    /// Uses `base_url` for both families when given, the public endpoints otherwise.
    pub fn new(base_url: Option<&str>) -> Self {
        match base_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => {
                let url = url.trim_end_matches('/');
                Self { shopping: url.to_string(), finding: url.to_string() }
            }
            None => Self::default(),
        }
    }

    /// Returns the base URL for `family`.
    pub fn base_url(&self, family: ApiFamily) -> &str {
        match family {
            ApiFamily::Shopping => &self.shopping,
            ApiFamily::Finding => &self.finding,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self { shopping: SHOPPING_API.to_string(), finding: FINDING_API.to_string() }
    }
}
