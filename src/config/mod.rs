//! Configuration module for honey-dl
//!
//! A [`CrawlConfig`] can be built in code, loaded from a TOML file, or assembled
//! by the CLI from defaults, an optional file and explicit flags. Whatever the
//! source, it goes through [`validate`] before a crawl starts.
//!
//! # Example
//!
//! ```no_run
//! use honey_dl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("honey.toml")).unwrap();
//! println!("Crawling {} with {} workers", config.url, config.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, parse_json_map, read_config, read_config_with_hash,
};
pub use validation::{resolve_start_page, validate};
