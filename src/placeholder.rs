//! Placeholder substitution for overlay text.

pub mod resolver;
pub mod source;

pub use resolver::{PlaceholderResolver, Token, contains_token, resolve};
pub use source::{CatalogSource, InMemorySource, ItemDataSource, LocalizedNames, NoDataSource};
