//! Shared types, error model, and configuration for docsmith.
//!
//! This crate is the foundation depended on by all other docsmith crates.
//! It provides:
//! - [`DocsmithError`] — the unified error type
//! - Domain types ([`DocRecord`], [`IndexArtifact`], [`SearchArtifact`])
//! - Configuration ([`SiteConfig`], [`CorpusConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CorpusConfig, RewriteRule, SanitizeConfig, SiteConfig, config_file_path, humanize_slug,
    init_site_config, load_site_config, load_site_config_from,
};
pub use error::{DocsmithError, Result};
pub use types::{
    DocRecord, IndexArtifact, IndexItem, SearchArtifact, SearchItem, SectionGroup, WriteOutcome,
    generated_timestamp,
};
