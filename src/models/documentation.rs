//! Documentation index types.

use serde::{Deserialize, Serialize};

/// Metadata of a documentation chunk. Every field is optional on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    /// Content kind (`text`, `code`, ...).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Page the chunk was scraped from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// When the page was scraped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<String>,
    /// Title of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_title: Option<String>,
    /// Documentation category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Estimated reading complexity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    /// Title of the enclosing section's parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    /// File the chunk was loaded from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Heading depth of the section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_level: Option<u32>,
    /// Title of the section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

/// A chunk of technical documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// Chunk text.
    pub content: String,
    /// Chunk metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
    /// Parent document for grouping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_doc: Option<String>,
    /// Position in the parent document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Token count of the content.
    #[serde(default)]
    pub tokens: Option<usize>,
}

/// A technology and the keywords that identify its documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Technology {
    /// Display name, also the `technology` filter value.
    pub name: &'static str,
    /// Identifying keywords.
    pub keywords: &'static [&'static str],
    /// Categories the technology's documentation covers.
    pub categories: &'static [&'static str],
}

/// Technologies covered by the documentation index.
pub const TECHNOLOGIES: &[Technology] = &[
    Technology {
        name: "Convex",
        keywords: &["convex", "database", "backend", "realtime"],
        categories: &["getting_started", "guides", "api_reference"],
    },
    Technology {
        name: "Shadcn/ui",
        keywords: &["shadcn", "ui", "components", "design system"],
        categories: &["getting_started", "guides", "examples"],
    },
    Technology {
        name: "RadixUI",
        keywords: &["radix", "primitives", "themes", "colors", "ui"],
        categories: &["getting_started", "guides", "examples"],
    },
    Technology {
        name: "TailwindCSS",
        keywords: &["tailwind", "css", "styling", "utility"],
        categories: &["getting_started", "guides", "examples"],
    },
    Technology {
        name: "Kiro",
        keywords: &["kiro", "mcp", "agent", "ai"],
        categories: &["getting_started", "guides", "mcp"],
    },
    Technology {
        name: "Claude Code",
        keywords: &["claude", "code", "anthropic", "ai", "mcp"],
        categories: &["getting_started", "guides", "setup"],
    },
    Technology {
        name: "Clerk",
        keywords: &["clerk", "auth", "authentication", "user"],
        categories: &["getting_started", "guides", "authentication"],
    },
    Technology {
        name: "Polar",
        keywords: &["polar", "billing", "subscriptions", "payments"],
        categories: &["getting_started", "guides", "api_reference"],
    },
    Technology {
        name: "React",
        keywords: &["react", "jsx", "components", "hooks"],
        categories: &["getting_started", "guides", "examples"],
    },
];

/// Documentation categories and what they hold.
pub const CATEGORY_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "getting_started",
        "Quick start guides and installation instructions",
    ),
    ("concepts", "Core concepts and architectural explanations"),
    ("guides", "Step-by-step tutorials and how-to guides"),
    ("api_reference", "API documentation and reference materials"),
    ("examples", "Code examples and sample implementations"),
    ("advanced", "Advanced topics and detailed configurations"),
    ("troubleshooting", "Common issues and solutions"),
    ("mcp", "Model Context Protocol related documentation"),
    ("setup", "Installation and setup instructions"),
    (
        "authentication",
        "Authentication and security documentation",
    ),
    (
        "agent_observations",
        "Agent behavior observations and performance data",
    ),
    (
        "agent_metrics",
        "Agent performance metrics and analytics",
    ),
    (
        "coordination_patterns",
        "Multi-agent coordination patterns and workflows",
    ),
];

/// Arguments of `search_documentation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentationQuery {
    /// Free-text query (non-empty).
    pub query: String,
    /// Maximum results (1 to 100).
    pub limit: Option<usize>,
    /// Restrict to one documentation category.
    pub category: Option<String>,
    /// Restrict to one technology from [`TECHNOLOGIES`].
    pub technology: Option<String>,
    /// Restrict to one content kind (`text`, `code`, ...).
    pub doc_type: Option<String>,
    /// Similarity floor in `[0, 1]`.
    pub min_similarity: Option<f64>,
}

/// One ranked documentation hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHit {
    /// The matching chunk.
    pub chunk: DocumentChunk,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Filters echoed back in documentation search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilters {
    /// Category filter.
    pub category: Option<String>,
    /// Technology filter.
    pub technology: Option<String>,
    /// Content kind filter.
    pub doc_type: Option<String>,
    /// Effective similarity floor.
    pub min_similarity: f64,
}

/// Query echo attached to documentation search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentQueryMetadata {
    /// The query text.
    pub query: String,
    /// Number of returned hits.
    pub total_results: usize,
    /// Filters in effect.
    pub filters_applied: AppliedFilters,
}

/// Ranked documentation search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSearchResult {
    /// Hits, best first.
    pub results: Vec<DocumentHit>,
    /// Query echo.
    pub query_metadata: DocumentQueryMetadata,
}

/// Looks up a technology by name, ignoring case.
#[must_use]
pub fn find_technology(name: &str) -> Option<&'static Technology> {
    TECHNOLOGIES
        .iter()
        .find(|tech| tech.name.eq_ignore_ascii_case(name.trim()))
}

/// Returns true if `category` is a known documentation category.
#[must_use]
pub fn is_documentation_category(category: &str) -> bool {
    CATEGORY_DESCRIPTIONS
        .iter()
        .any(|(name, _)| *name == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_tolerates_sparse_metadata() {
        let chunk: DocumentChunk = serde_json::from_value(json!({
            "chunk_id": "c1",
            "content": "Convex queries",
            "metadata": {"category": "guides"}
        }))
        .unwrap();
        assert_eq!(chunk.metadata.category.as_deref(), Some("guides"));
        assert!(chunk.metadata.kind.is_none());
        assert!(chunk.tokens.is_none());
    }

    #[test]
    fn test_find_technology_ignores_case() {
        assert_eq!(find_technology("tailwindcss").map(|t| t.name), Some("TailwindCSS"));
        assert!(find_technology("Angular").is_none());
    }

    #[test]
    fn test_catalogs() {
        assert_eq!(TECHNOLOGIES.len(), 9);
        assert_eq!(CATEGORY_DESCRIPTIONS.len(), 13);
        assert!(is_documentation_category("mcp"));
        assert!(!is_documentation_category("cooking"));
    }
}
