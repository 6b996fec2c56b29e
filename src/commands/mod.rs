//! CLI command implementations.

pub mod lookup;
pub mod search;

pub use lookup::{LookupCommand, LookupKind};
pub use search::{SearchCommand, SearchKind};
