//! Filtered browse (F, §4.6): conjunctive filter composition over a notebook's entries,
//! with `sequence` descending order unless `fragment_of` narrows to one fragment chain, in
//! which case siblings are ordered by `fragment_index` ascending.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::{ClaimsStatus, Entry};
use serde::Deserialize;

use notebook_store::EntryStore;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseFilters {
    pub query: Option<String>,
    pub topic_prefix: Option<String>,
    pub claims_status: Option<ClaimsStatus>,
    pub author: Option<String>,
    pub sequence_min: Option<u64>,
    pub sequence_max: Option<u64>,
    pub fragment_of: Option<String>,
    pub has_friction_above: Option<f32>,
    pub needs_review: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub total: usize,
}

pub async fn browse(
    db: &SurrealDbClient,
    entries: &EntryStore,
    notebook_id: &str,
    filters: &BrowseFilters,
    review_threshold: f32,
) -> Result<Page, AppError> {
    let all = entries.list_all(db, notebook_id).await?;
    Ok(browse_entries(all, filters, review_threshold))
}

fn browse_entries(mut all: Vec<Entry>, filters: &BrowseFilters, review_threshold: f32) -> Page {
    all.retain(|entry| matches(entry, filters, review_threshold));

    if filters.fragment_of.is_some() {
        all.sort_by_key(|e| e.fragment_index.unwrap_or(u32::MAX));
    } else {
        all.sort_by(|a, b| b.sequence.cmp(&a.sequence));
    }

    let total = all.len();
    let offset = filters.offset.unwrap_or(0);
    let limit = filters.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let page: Vec<Entry> = all.into_iter().skip(offset).take(limit).collect();
    Page { entries: page, total }
}

fn matches(entry: &Entry, filters: &BrowseFilters, review_threshold: f32) -> bool {
    if let Some(query) = &filters.query {
        let q = query.to_lowercase();
        let haystack = format!("{} {}", entry.topic, entry.content).to_lowercase();
        if !haystack.contains(&q) {
            return false;
        }
    }
    if let Some(prefix) = &filters.topic_prefix {
        if !entry.topic.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if let Some(status) = filters.claims_status {
        if entry.claims_status != status {
            return false;
        }
    }
    if let Some(author) = &filters.author {
        if &entry.author != author {
            return false;
        }
    }
    if let Some(min) = filters.sequence_min {
        if entry.sequence < min {
            return false;
        }
    }
    if let Some(max) = filters.sequence_max {
        if entry.sequence > max {
            return false;
        }
    }
    if let Some(parent) = &filters.fragment_of {
        if entry.fragment_of.as_deref() != Some(parent.as_str()) {
            return false;
        }
    }
    if let Some(threshold) = filters.has_friction_above {
        if entry.max_friction <= threshold {
            return false;
        }
    }
    if let Some(true) = filters.needs_review {
        if entry.max_friction <= review_threshold {
            return false;
        }
    }
    true
}
