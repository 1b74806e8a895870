//! Read-only documentation index.
//!
//! Chunks come from `vector_db_index.json` in the configured directory. When
//! no directory is configured, or the index cannot be read, a small built-in
//! demo set is served instead so the tools stay usable.

use super::similarity::TermSet;
use crate::config::SearchSettings;
use crate::models::{
    AppliedFilters, CATEGORY_DESCRIPTIONS, ChunkMetadata, DocumentChunk, DocumentHit,
    DocumentQueryMetadata, DocumentSearchResult, DocumentationQuery, TECHNOLOGIES, Technology,
    find_technology, is_documentation_category, word_count,
};
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// File name of the index inside the documentation directory.
pub const INDEX_FILE: &str = "vector_db_index.json";

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: DocumentChunk,
    terms: TermSet,
}

/// Documentation chunks with precomputed term sets.
#[derive(Debug, Clone)]
pub struct DocumentationIndex {
    chunks: Vec<IndexedChunk>,
    demo: bool,
}

impl Default for DocumentationIndex {
    fn default() -> Self {
        Self::demo()
    }
}

impl DocumentationIndex {
    /// Builds an index over `chunks`.
    #[must_use]
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self::build(chunks, false)
    }

    /// The built-in demo chunks.
    #[must_use]
    pub fn demo() -> Self {
        Self::build(demo_chunks(), true)
    }

    fn build(chunks: Vec<DocumentChunk>, demo: bool) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                terms: TermSet::from_text(&chunk.content),
                chunk,
            })
            .collect();
        Self { chunks, demo }
    }

    /// Loads the index from `dir`, falling back to the demo chunks.
    #[must_use]
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            tracing::warn!("No documentation index configured, serving demo chunks");
            return Self::demo();
        };

        match Self::load_from_dir(dir) {
            Ok(index) => {
                tracing::info!(
                    path = %dir.display(),
                    chunks = index.len(),
                    "Loaded documentation index"
                );
                index
            },
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to load documentation index, serving demo chunks"
                );
                Self::demo()
            },
        }
    }

    /// Loads `vector_db_index.json` from `dir`.
    ///
    /// Entries that cannot be parsed are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a JSON array, or
    /// holds no usable chunk.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Error::internal("read_documentation_index", e))?;
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|e| Error::internal("parse_documentation_index", e))?;

        let chunks: Vec<DocumentChunk> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match parse_chunk(idx, entry) {
                Ok(chunk) => Some(chunk),
                Err(e) => {
                    tracing::warn!(index = idx, error = %e, "Skipping documentation chunk");
                    None
                },
            })
            .collect();

        if chunks.is_empty() {
            return Err(Error::internal(
                "load_documentation_index",
                format!("no valid chunks in {}", path.display()),
            ));
        }
        Ok(Self::new(chunks))
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the index holds no chunk.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns true if the built-in demo chunks are being served.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.demo
    }

    /// Documentation categories with their descriptions.
    #[must_use]
    pub const fn categories(&self) -> &'static [(&'static str, &'static str)] {
        CATEGORY_DESCRIPTIONS
    }

    /// Technologies covered by the documentation.
    #[must_use]
    pub const fn technologies(&self) -> &'static [Technology] {
        TECHNOLOGIES
    }

    /// Ranks chunks against `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the query is empty, the limit or
    /// similarity floor is out of range, or the category or technology is
    /// unknown.
    pub fn search(
        &self,
        query: &DocumentationQuery,
        settings: &SearchSettings,
    ) -> Result<DocumentSearchResult> {
        let text = query.query.trim();
        if text.is_empty() {
            return Err(Error::validation("query", "must not be empty"));
        }
        if text.len() > settings.max_query_length {
            return Err(Error::validation(
                "query",
                format!("must be at most {} bytes", settings.max_query_length),
            ));
        }
        let limit = query.limit.unwrap_or(settings.default_limit);
        if limit == 0 || limit > settings.max_limit {
            return Err(Error::validation(
                "limit",
                format!("must be between 1 and {}, got {limit}", settings.max_limit),
            ));
        }
        let min_similarity = query
            .min_similarity
            .unwrap_or(settings.default_min_similarity);
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(Error::validation(
                "min_similarity",
                format!("must be between 0.0 and 1.0, got {min_similarity}"),
            ));
        }

        let category = query.category.as_deref().map(str::trim);
        if let Some(category) = category {
            if !is_documentation_category(category) {
                return Err(Error::validation(
                    "category",
                    format!("unknown documentation category '{category}'"),
                ));
            }
        }
        let technology = query
            .technology
            .as_deref()
            .map(|name| {
                find_technology(name).ok_or_else(|| {
                    Error::validation("technology", format!("unknown technology '{name}'"))
                })
            })
            .transpose()?;
        let doc_type = query.doc_type.as_deref().map(str::trim);

        let query_terms = TermSet::from_text(text);
        let mut hits: Vec<(f64, &DocumentChunk)> = self
            .chunks
            .iter()
            .filter(|c| {
                let meta = &c.chunk.metadata;
                category.is_none_or(|cat| meta.category.as_deref() == Some(cat))
                    && doc_type.is_none_or(|kind| meta.kind.as_deref() == Some(kind))
                    && technology.is_none_or(|tech| mentions(&c.chunk, tech))
            })
            .map(|c| (query_terms.similarity(&c.terms), &c.chunk))
            .filter(|(similarity, _)| *similarity >= min_similarity)
            .collect();
        // stable sort keeps index order among equal scores
        hits.sort_by(|(a, _), (b, _)| b.total_cmp(a));

        let results: Vec<DocumentHit> = hits
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (similarity, chunk))| DocumentHit {
                chunk: chunk.clone(),
                similarity,
                rank: i + 1,
            })
            .collect();

        tracing::debug!(results = results.len(), "Searched documentation");

        Ok(DocumentSearchResult {
            query_metadata: DocumentQueryMetadata {
                query: text.to_string(),
                total_results: results.len(),
                filters_applied: AppliedFilters {
                    category: category.map(ToString::to_string),
                    technology: technology.map(|t| t.name.to_string()),
                    doc_type: doc_type.map(ToString::to_string),
                    min_similarity,
                },
            },
            results,
        })
    }
}

/// Returns true if the chunk's text or title names `technology`.
fn mentions(chunk: &DocumentChunk, technology: &Technology) -> bool {
    let name = technology.name.to_lowercase();
    chunk.content.to_lowercase().contains(&name)
        || chunk
            .metadata
            .doc_title
            .as_deref()
            .is_some_and(|title| title.to_lowercase().contains(&name))
}

fn parse_chunk(idx: usize, mut entry: Value) -> Result<DocumentChunk> {
    let Some(object) = entry.as_object_mut() else {
        return Err(Error::validation("chunk", "expected a JSON object"));
    };
    object
        .entry("chunk_id")
        .or_insert_with(|| Value::String(format!("chunk_{idx}")));

    let mut chunk: DocumentChunk =
        serde_json::from_value(entry).map_err(|e| Error::validation("chunk", e.to_string()))?;
    if chunk.content.trim().is_empty() {
        return Err(Error::validation("content", "must not be empty"));
    }
    chunk.metadata.kind.get_or_insert_with(|| "text".to_string());
    chunk.metadata.category.get_or_insert_with(|| "guides".to_string());
    chunk.tokens.get_or_insert_with(|| word_count(&chunk.content));
    Ok(chunk)
}

fn demo_chunk(id: &str, category: &str, title: &str, url: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        chunk_id: id.to_string(),
        content: content.to_string(),
        metadata: ChunkMetadata {
            kind: Some("text".to_string()),
            source_url: Some(url.to_string()),
            doc_title: Some(title.to_string()),
            category: Some(category.to_string()),
            ..ChunkMetadata::default()
        },
        parent_doc: None,
        position: None,
        tokens: Some(word_count(content)),
    }
}

fn demo_chunks() -> Vec<DocumentChunk> {
    vec![
        demo_chunk(
            "react_001",
            "guides",
            "React Hooks Guide",
            "https://react.dev/hooks",
            "React hooks like useState and useEffect allow you to use state and side effects \
             in functional components. The useState hook returns a stateful value and a \
             function to update it.",
        ),
        demo_chunk(
            "convex_001",
            "getting_started",
            "Convex Overview",
            "https://docs.convex.dev",
            "Convex is a backend application platform with a built-in database that keeps \
             your data in sync across all clients in real-time. It provides ACID transactions \
             and automatic caching.",
        ),
        demo_chunk(
            "shadcn_001",
            "getting_started",
            "Shadcn/ui Introduction",
            "https://ui.shadcn.com",
            "Shadcn/ui provides copy-and-paste React components built with Radix UI and \
             Tailwind CSS. Components are accessible, customizable, and open source.",
        ),
        demo_chunk(
            "tailwind_001",
            "guides",
            "TailwindCSS Basics",
            "https://tailwindcss.com",
            "TailwindCSS is a utility-first CSS framework. Use utility classes like flex, \
             pt-4, text-center and rotate-90 to build any design directly in your markup.",
        ),
        demo_chunk(
            "clerk_001",
            "authentication",
            "Clerk Authentication",
            "https://clerk.dev",
            "Clerk provides authentication and user management. It includes pre-built UI \
             components, APIs for user operations, and integrations with popular frameworks.",
        ),
    ]
}
