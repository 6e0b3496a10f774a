//! Core domain types shared by the extractor, the model providers, and the
//! orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocgroundError;

/// Default maximum traversal depth below the root page.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Default maximum number of pages retrieved per request.
pub const DEFAULT_MAX_PAGES: usize = 200;

// ---------------------------------------------------------------------------
// DocumentRecord
// ---------------------------------------------------------------------------

/// One retrieved node of the document hierarchy.
///
/// Records are created by a single traversal run and owned by the request that
/// triggered it. `parent_id` is a plain back-reference for reporting; nothing
/// follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Page identifier, unique within one traversal result.
    #[serde(rename = "pageId")]
    pub id: String,
    /// Display title (not guaranteed unique).
    pub title: String,
    /// Id of the record that discovered this one (`None` for the root).
    pub parent_id: Option<String>,
    /// Distance from the root (root = 0).
    pub depth: u32,
    /// Canonical URL of the page.
    pub source_url: String,
    /// Normalized plain-text body, possibly empty.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Document-store payloads
// ---------------------------------------------------------------------------

/// A single page as returned by the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePayload {
    pub id: String,
    pub title: String,
    /// Raw storage-format markup.
    pub body_html: String,
    pub source_url: String,
}

/// Reference to a child page, in the order the document store lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRef {
    pub id: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// TraversalLimits
// ---------------------------------------------------------------------------

/// The pair of quotas bounding one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalLimits {
    /// Deepest level emitted (root = 0).
    pub max_depth: u32,
    /// Maximum number of records emitted; always at least 1.
    pub max_pages: usize,
}

impl TraversalLimits {
    /// Build limits, raising `max_pages` to 1 if zero.
    pub fn new(max_depth: u32, max_pages: usize) -> Self {
        Self {
            max_depth,
            max_pages: max_pages.max(1),
        }
    }

    /// Resolve caller-supplied quotas against defaults.
    ///
    /// Absent values take the default; negative depth clamps to 0 and a page
    /// quota below 1 clamps to 1.
    pub fn resolve(max_depth: Option<i64>, max_pages: Option<i64>, defaults: Self) -> Self {
        let max_depth = match max_depth {
            Some(d) => u32::try_from(d.max(0)).unwrap_or(u32::MAX),
            None => defaults.max_depth,
        };
        let max_pages = match max_pages {
            Some(p) => usize::try_from(p.max(1)).unwrap_or(usize::MAX),
            None => defaults.max_pages,
        };
        Self::new(max_depth, max_pages)
    }
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES)
    }
}

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Language-model providers selectable per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Bedrock,
    Gemini,
    GitlabDuo,
}

impl ProviderKind {
    /// All known providers, in registration order.
    pub const ALL: [ProviderKind; 3] = [Self::Bedrock, Self::Gemini, Self::GitlabDuo];

    /// Wire identifier of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Gemini => "gemini",
            Self::GitlabDuo => "gitlab_duo",
        }
    }

    /// Parse an optional identifier, falling back to `default` when blank.
    pub fn parse_or(value: Option<&str>, default: Self) -> Result<Self, DocgroundError> {
        match value.map(str::trim) {
            None | Some("") => Ok(default),
            Some(v) => v.parse(),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DocgroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "gemini" => Ok(Self::Gemini),
            "gitlab_duo" | "gitlab-duo" => Ok(Self::GitlabDuo),
            other => Err(DocgroundError::validation(format!(
                "unknown provider '{other}': expected bedrock, gemini, or gitlab_duo"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_record_uses_camel_case_wire_names() {
        let record = DocumentRecord {
            id: "42".into(),
            title: "Architecture".into(),
            parent_id: None,
            depth: 0,
            source_url: "https://wiki.example.com/pages/42".into(),
            content: "body".into(),
        };

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["pageId"], "42");
        assert_eq!(json["sourceUrl"], "https://wiki.example.com/pages/42");
        assert!(json["parentId"].is_null());
        assert_eq!(json["depth"], 0);
    }

    #[test]
    fn limits_resolve_defaults_and_clamps() {
        let defaults = TraversalLimits::default();
        assert_eq!(TraversalLimits::resolve(None, None, defaults), defaults);

        let clamped = TraversalLimits::resolve(Some(-3), Some(0), defaults);
        assert_eq!(clamped.max_depth, 0);
        assert_eq!(clamped.max_pages, 1);

        let explicit = TraversalLimits::resolve(Some(2), Some(10), defaults);
        assert_eq!(explicit, TraversalLimits::new(2, 10));
    }

    #[test]
    fn limits_new_raises_zero_pages() {
        assert_eq!(TraversalLimits::new(3, 0).max_pages, 1);
    }

    #[test]
    fn provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" gitlab-duo ".parse::<ProviderKind>().unwrap(), ProviderKind::GitlabDuo);
        assert_eq!(
            ProviderKind::parse_or(Some("  "), ProviderKind::Gemini).unwrap(),
            ProviderKind::Gemini
        );
        assert_eq!(
            ProviderKind::parse_or(None, ProviderKind::Bedrock).unwrap(),
            ProviderKind::Bedrock
        );

        let err = "openai".parse::<ProviderKind>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn provider_kind_display_matches_serde() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
