//! Query orchestration and answer grounding for docground.
//!
//! This crate ties page extraction and language models together:
//! - [`locator`]: page id parsing from root URLs
//! - [`prompt`]: grounding prompt assembly
//! - [`sources`]: mapping cited titles back to retrieved pages
//! - [`orchestrator`]: the full query and extraction-only flows

pub mod locator;
pub mod orchestrator;
pub mod prompt;
pub mod sources;

pub use locator::parse_page_id;
pub use orchestrator::{ExtractResponse, Orchestrator, QueryDefaults, QueryRequest, QueryResponse};
pub use prompt::build_prompt;
pub use sources::resolve_sources;
