//! URL handling module for honey-dl
//!
//! This module covers the two URL concerns of a crawl: turning the seed URL into
//! a sequence of page URLs, and mapping image URLs onto the download root.

mod domain;
mod navigator;

// Re-export main functions
pub use domain::{domain_root_name, resolve_item_url};
pub use navigator::SeedUrl;
