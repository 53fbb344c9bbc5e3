//! Shared types, error model, and configuration for ContentIQ.
//!
//! This crate is the foundation depended on by all other ContentIQ crates.
//! It provides:
//! - [`ContentIqError`] — the unified error type
//! - Domain types ([`ContentRecord`], [`Intent`], [`Action`], [`Enrichment`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FirecrawlConfig, OpenAiConfig, StoreConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_keys,
};
pub use error::{ContentIqError, Result};
pub use types::{
    Action, ContentRecord, Enrichment, EnrichmentKind, Entities, Intent, ItemFailure, word_count,
};
