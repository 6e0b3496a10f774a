//! Shared types, error model, and configuration for docground.
//!
//! This crate is the foundation depended on by all other docground crates.
//! It provides:
//! - [`DocgroundError`]: the unified error type
//! - Domain types ([`DocumentRecord`], [`PagePayload`], [`ChildRef`], [`ProviderKind`], [`TraversalLimits`])
//! - Configuration ([`AppConfig`], config loading, secret lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BedrockConfig, ConfluenceConfig, DefaultsConfig, GeminiConfig, GenerationConfig,
    GitLabDuoConfig, ServerConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, read_secret,
};
pub use error::{DocgroundError, Result};
pub use types::{
    ChildRef, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES, DocumentRecord, PagePayload, ProviderKind,
    TraversalLimits,
};
