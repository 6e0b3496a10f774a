//! Bounded breadth-first extraction of a page subtree.
//!
//! The extractor starts from a root page id, walks the hierarchy level by
//! level under a depth and a page-count quota, and emits one
//! [`DocumentRecord`] per distinct page in discovery order. Fetches are issued
//! one at a time; nothing is shared between runs.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, trace};

use docground_shared::{DocumentRecord, Result, TraversalLimits};

use crate::normalize::normalize;
use crate::source::DocumentSource;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for extraction runs.
pub trait ExtractProgress: Send + Sync {
    /// Called after each record is emitted.
    fn page_retrieved(&self, title: &str, retrieved: usize, max_pages: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ExtractProgress for SilentProgress {
    fn page_retrieved(&self, _title: &str, _retrieved: usize, _max_pages: usize) {}
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// A queued candidate, dropped once dequeued.
#[derive(Debug)]
struct FrontierEntry {
    id: String,
    parent_id: Option<String>,
    depth: u32,
}

// ---------------------------------------------------------------------------
// TreeExtractor
// ---------------------------------------------------------------------------

/// Breadth-first subtree extractor over a [`DocumentSource`].
#[derive(Clone)]
pub struct TreeExtractor {
    source: Arc<dyn DocumentSource>,
}

impl TreeExtractor {
    /// Create an extractor reading from `source`.
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self { source }
    }

    /// Extract the subtree rooted at `root_id`.
    ///
    /// Records come back in BFS order, with no duplicate ids, no record deeper
    /// than `limits.max_depth`, and at most `limits.max_pages` records. Entries
    /// that are too deep or already visited are dropped when dequeued, which
    /// also breaks cycles. The first failed fetch aborts the whole run.
    pub async fn extract(
        &self,
        root_id: &str,
        limits: TraversalLimits,
        progress: &dyn ExtractProgress,
    ) -> Result<Vec<DocumentRecord>> {
        self.extract_many(&[root_id.to_string()], limits, progress).await
    }

    /// Extract several subtrees as one breadth-first walk.
    ///
    /// Every root is seeded at depth 0 in the same frontier, so all roots are
    /// emitted before any child and depth never decreases across the output.
    /// The roots share one visited set and one page budget: a page reachable
    /// from several roots is emitted once, and the combined output holds at
    /// most `limits.max_pages` records.
    #[instrument(skip_all, fields(roots = root_ids.len(), max_depth = limits.max_depth, max_pages = limits.max_pages))]
    pub async fn extract_many(
        &self,
        root_ids: &[String],
        limits: TraversalLimits,
        progress: &dyn ExtractProgress,
    ) -> Result<Vec<DocumentRecord>> {
        let start_time = Instant::now();

        let mut frontier: VecDeque<FrontierEntry> = root_ids
            .iter()
            .map(|id| FrontierEntry {
                id: id.clone(),
                parent_id: None,
                depth: 0,
            })
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut records: Vec<DocumentRecord> = Vec::new();
        let mut pruned: usize = 0;

        info!("starting tree extraction");

        while records.len() < limits.max_pages {
            let Some(current) = frontier.pop_front() else {
                break;
            };

            if current.depth > limits.max_depth || visited.contains(&current.id) {
                trace!(id = %current.id, depth = current.depth, "pruned frontier entry");
                pruned += 1;
                continue;
            }
            visited.insert(current.id.clone());

            let page = self.source.fetch_page(&current.id).await?;
            let content = normalize(&page.body_html);

            debug!(
                id = %current.id,
                depth = current.depth,
                title = %page.title,
                content_len = content.len(),
                "page retrieved"
            );

            let record = DocumentRecord {
                id: current.id.clone(),
                title: page.title,
                parent_id: current.parent_id,
                depth: current.depth,
                source_url: page.source_url,
                content,
            };
            progress.page_retrieved(&record.title, records.len() + 1, limits.max_pages);
            records.push(record);

            if current.depth < limits.max_depth {
                let children = self.source.fetch_children(&current.id).await?;
                for child in children {
                    if !visited.contains(&child.id) {
                        frontier.push_back(FrontierEntry {
                            id: child.id,
                            parent_id: Some(current.id.clone()),
                            depth: current.depth + 1,
                        });
                    }
                }
            }
        }

        info!(
            pages = records.len(),
            pruned,
            remaining = frontier.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "tree extraction completed"
        );

        Ok(records)
    }
}
