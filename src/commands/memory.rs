//! Memory commands: knowledge base CRUD, weighted search, and stats.

use serde::Serialize;

use super::Output;
use crate::models::{MemoryCategory, MemoryDocument, User, count_words, now_ms};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// A document with its author resolved.
#[derive(Debug, Serialize)]
pub struct DocumentWithAuthor {
    #[serde(flatten)]
    pub document: MemoryDocument,
    pub author: Option<User>,
}

/// Result of `mctl memory list` and `mctl memory recent`.
#[derive(Debug, Serialize)]
pub struct MemoryList {
    pub documents: Vec<DocumentWithAuthor>,
}

impl Output for MemoryList {
    fn to_human(&self) -> String {
        if self.documents.is_empty() {
            return "No documents found".to_string();
        }
        self.documents
            .iter()
            .map(|d| {
                format!(
                    "{}  [{}] {}  ({} words)",
                    d.document.id, d.document.category, d.document.title, d.document.word_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for MemoryDocument {
    fn to_human(&self) -> String {
        format!("{}  [{}] {}", self.id, self.category, self.title)
    }
}

/// List documents newest-first, optionally filtered by category and tag,
/// with authors joined in batch. The limit applies before the join.
pub fn memory_list(
    storage: &Storage,
    category: Option<MemoryCategory>,
    tag: Option<&str>,
    limit: Option<usize>,
) -> Result<MemoryList> {
    let documents: Vec<MemoryDocument> = storage.scan(Order::Desc)?;
    let mut documents: Vec<MemoryDocument> = documents
        .into_iter()
        .filter(|d| category.is_none_or(|c| d.category == c))
        .filter(|d| tag.is_none_or(|t| d.tags.iter().any(|dt| dt == t)))
        .collect();
    if let Some(limit) = limit {
        documents.truncate(limit);
    }

    let author_ids: Vec<&str> = documents.iter().filter_map(|d| d.author_id.as_deref()).collect();
    let authors = storage.get_many::<User>(&author_ids)?;

    let documents = documents
        .into_iter()
        .map(|document| {
            let author = document
                .author_id
                .as_deref()
                .and_then(|id| authors.get(id).cloned());
            DocumentWithAuthor { document, author }
        })
        .collect();

    Ok(MemoryList { documents })
}

/// List the most recently created documents.
pub fn memory_recent(storage: &Storage, limit: usize) -> Result<MemoryList> {
    memory_list(storage, None, None, Some(limit))
}

/// A document with its author and related documents resolved.
#[derive(Debug, Serialize)]
pub struct MemoryDetails {
    #[serde(flatten)]
    pub document: MemoryDocument,
    pub author: Option<User>,
    pub related: Vec<MemoryDocument>,
}

impl Output for MemoryDetails {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{}  [{}] {}", self.document.id, self.document.category, self.document.title),
        ];
        if let Some(summary) = &self.document.summary {
            lines.push(format!("  {}", summary));
        }
        if let Some(author) = &self.author {
            lines.push(format!("  author: {}", author.name));
        }
        if !self.related.is_empty() {
            let titles: Vec<&str> = self.related.iter().map(|d| d.title.as_str()).collect();
            lines.push(format!("  related: {}", titles.join(", ")));
        }
        lines.push(String::new());
        lines.push(self.document.content.clone());
        lines.join("\n")
    }
}

/// Show a document with its author and related documents resolved. Dangling
/// related ids are dropped from the result.
pub fn memory_show(storage: &Storage, document_id: &str) -> Result<MemoryDetails> {
    let document: MemoryDocument = storage.get(document_id)?;

    let author = match document.author_id.as_deref() {
        Some(id) => storage.try_get(id)?,
        None => None,
    };

    let related_ids: Vec<&str> = document.related_documents.iter().map(String::as_str).collect();
    let found = storage.get_many::<MemoryDocument>(&related_ids)?;
    let related = document
        .related_documents
        .iter()
        .filter_map(|id| found.get(id).cloned())
        .collect();

    Ok(MemoryDetails {
        document,
        author,
        related,
    })
}

/// A search hit with its relevance score.
#[derive(Debug, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: MemoryDocument,
    pub relevance_score: u32,
}

/// Result of `mctl memory search`.
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<ScoredDocument>,
}

impl Output for SearchResults {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return format!("No documents match '{}'", self.query);
        }
        self.results
            .iter()
            .map(|r| {
                format!(
                    "{}  ({})  [{}] {}",
                    r.document.id, r.relevance_score, r.document.category, r.document.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Search documents by keyword.
///
/// The query is lowercased and split on whitespace; a document matches only
/// when every term appears somewhere in its title, summary, content, or tags.
/// Each term then scores 3 for a title hit, 2 for a summary hit, and 1 for a
/// content hit. Ties keep newest-first order.
pub fn memory_search(
    storage: &Storage,
    query: &str,
    category: Option<MemoryCategory>,
    limit: usize,
) -> Result<SearchResults> {
    let terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let documents: Vec<MemoryDocument> = storage.scan(Order::Desc)?;
    let mut results: Vec<ScoredDocument> = documents
        .into_iter()
        .filter(|d| category.is_none_or(|c| d.category == c))
        .filter_map(|document| {
            if terms.is_empty() {
                return None;
            }
            let title = document.title.to_lowercase();
            let summary = document.summary.as_deref().unwrap_or("").to_lowercase();
            let content = document.content.to_lowercase();
            let tags = document.tags.join(" ").to_lowercase();

            let mut score = 0u32;
            for term in &terms {
                let in_title = title.contains(term.as_str());
                let in_summary = summary.contains(term.as_str());
                let in_content = content.contains(term.as_str());
                let in_tags = tags.contains(term.as_str());
                if !(in_title || in_summary || in_content || in_tags) {
                    return None;
                }
                if in_title {
                    score += 3;
                }
                if in_summary {
                    score += 2;
                }
                if in_content {
                    score += 1;
                }
            }
            Some(ScoredDocument {
                document,
                relevance_score: score,
            })
        })
        .collect();

    // Stable sort: equal scores keep the newest-first scan order.
    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    results.truncate(limit);

    Ok(SearchResults {
        query: query.to_string(),
        results,
    })
}

/// Document counts per category.
#[derive(Debug, Serialize)]
pub struct MemoryCategoryCounts {
    pub personal: usize,
    pub project: usize,
    pub learning: usize,
    pub reference: usize,
    pub archived: usize,
}

/// Result of `mctl memory stats`.
#[derive(Debug, Serialize)]
pub struct MemoryStats {
    pub total_documents: usize,
    pub total_words: usize,
    /// Documents created in the trailing seven days
    pub this_week: usize,
    /// Documents created in the trailing thirty days
    pub this_month: usize,
    pub by_category: MemoryCategoryCounts,
}

impl Output for MemoryStats {
    fn to_human(&self) -> String {
        format!(
            "{} documents, {} words ({} this week, {} this month)\n\
             personal: {}  project: {}  learning: {}  reference: {}  archived: {}",
            self.total_documents,
            self.total_words,
            self.this_week,
            self.this_month,
            self.by_category.personal,
            self.by_category.project,
            self.by_category.learning,
            self.by_category.reference,
            self.by_category.archived,
        )
    }
}

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const MONTH_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Compute knowledge base stats.
pub fn memory_stats(storage: &Storage) -> Result<MemoryStats> {
    let documents: Vec<MemoryDocument> = storage.scan(Order::Asc)?;
    let now = now_ms();
    let week_ago = now - WEEK_MS;
    let month_ago = now - MONTH_MS;

    let count = |category: MemoryCategory| {
        documents.iter().filter(|d| d.category == category).count()
    };

    Ok(MemoryStats {
        total_documents: documents.len(),
        total_words: documents.iter().map(|d| d.word_count).sum(),
        this_week: documents.iter().filter(|d| d.created_at > week_ago).count(),
        this_month: documents.iter().filter(|d| d.created_at > month_ago).count(),
        by_category: MemoryCategoryCounts {
            personal: count(MemoryCategory::Personal),
            project: count(MemoryCategory::Project),
            learning: count(MemoryCategory::Learning),
            reference: count(MemoryCategory::Reference),
            archived: count(MemoryCategory::Archived),
        },
    })
}

/// Arguments for `mctl memory create`.
#[derive(Debug)]
pub struct MemoryCreateArgs {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub category: MemoryCategory,
    pub tags: Vec<String>,
    pub author_id: Option<String>,
    pub source_url: Option<String>,
    pub related_documents: Vec<String>,
}

/// Create a document. The word count is derived from the content.
pub fn memory_create(storage: &mut Storage, args: MemoryCreateArgs) -> Result<MemoryDocument> {
    let mut document = MemoryDocument::new(
        generate_id("doc", &args.title),
        args.title,
        args.content,
        args.category,
    );
    document.summary = args.summary;
    document.tags = args.tags;
    document.author_id = args.author_id;
    document.source_url = args.source_url;
    document.related_documents = args.related_documents;

    storage.insert(&document)?;
    Ok(document)
}

/// Arguments for `mctl memory update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct MemoryUpdateArgs {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<MemoryCategory>,
    pub tags: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub related_documents: Option<Vec<String>>,
}

/// Patch document fields. Changing the content recomputes the word count.
pub fn memory_update(
    storage: &mut Storage,
    document_id: &str,
    args: MemoryUpdateArgs,
) -> Result<MemoryDocument> {
    let mut document: MemoryDocument = storage.get(document_id)?;

    if let Some(title) = args.title {
        document.title = title;
    }
    if let Some(content) = args.content {
        document.word_count = count_words(&content);
        document.content = content;
    }
    if let Some(summary) = args.summary {
        document.summary = Some(summary);
    }
    if let Some(category) = args.category {
        document.category = category;
    }
    if let Some(tags) = args.tags {
        document.tags = tags;
    }
    if let Some(source_url) = args.source_url {
        document.source_url = Some(source_url);
    }
    if let Some(related_documents) = args.related_documents {
        document.related_documents = related_documents;
    }
    document.updated_at = now_ms();

    storage.put(&document)?;
    Ok(document)
}

/// Result of `mctl memory delete`.
#[derive(Debug, Serialize)]
pub struct MemoryDeleted {
    pub id: String,
}

impl Output for MemoryDeleted {
    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete a document. Other documents keep any now-dangling related ids;
/// reads drop those silently.
pub fn memory_delete(storage: &mut Storage, document_id: &str) -> Result<MemoryDeleted> {
    storage.delete::<MemoryDocument>(document_id)?;
    Ok(MemoryDeleted {
        id: document_id.to_string(),
    })
}
