//! Document-store access and bounded subtree extraction.
//!
//! This crate provides:
//! - [`source`]: The [`DocumentSource`] seam over a page hierarchy
//! - [`client`]: Confluence REST implementation of that seam
//! - [`normalize`]: Markup-to-plain-text normalization
//! - [`tree`]: Breadth-first extraction under depth and page quotas

pub mod client;
pub mod normalize;
pub mod source;
pub mod tree;

pub use client::ConfluenceClient;
pub use normalize::normalize;
pub use source::DocumentSource;
pub use tree::{ExtractProgress, SilentProgress, TreeExtractor};
