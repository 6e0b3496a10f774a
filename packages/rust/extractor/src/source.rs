//! The document-store seam consumed by the tree extractor.

use async_trait::async_trait;

use docground_shared::{ChildRef, PagePayload, Result};

/// Read access to a parent→children document hierarchy.
///
/// Implementations turn whatever the store speaks into typed payloads at this
/// boundary. Any non-success outcome is an error; an empty child list is not.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch one page with its raw markup body.
    async fn fetch_page(&self, id: &str) -> Result<PagePayload>;

    /// List the direct children of a page, fully paginated, in store order.
    async fn fetch_children(&self, parent_id: &str) -> Result<Vec<ChildRef>>;
}
