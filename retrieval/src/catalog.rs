//! Catalog Projector (C, §4.5): a topic-grouped projection over a notebook's entries,
//! computed fresh on every call. It is never a stored table — "invalidated on any write"
//! just means "there is nothing to invalidate, it's read straight off current entries".
use std::collections::BTreeMap;

use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::Entry;
use serde::Serialize;

use notebook_store::EntryStore;

const NONE_BUCKET: &str = "(none)";
const SUMMARY_CHARS: usize = 150;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogCluster {
    pub topic: String,
    pub summary: String,
    pub entry_count: usize,
    pub cumulative_cost: f32,
    pub latest_sequence: u64,
    pub entry_ids: Vec<String>,
}

pub async fn project_catalog(
    db: &SurrealDbClient,
    entries: &EntryStore,
    notebook_id: &str,
) -> Result<Vec<CatalogCluster>, AppError> {
    let all = entries.list_all(db, notebook_id).await?;
    Ok(project_from_entries(&all))
}

fn project_from_entries(all: &[Entry]) -> Vec<CatalogCluster> {
    let mut buckets: BTreeMap<String, Vec<&Entry>> = BTreeMap::new();
    for entry in all {
        let key = if entry.topic.is_empty() {
            NONE_BUCKET.to_string()
        } else {
            entry.topic.clone()
        };
        buckets.entry(key).or_default().push(entry);
    }

    let mut clusters: Vec<CatalogCluster> = buckets
        .into_iter()
        .map(|(topic, mut members)| {
            members.sort_by_key(|e| e.sequence);
            let latest = members.last().expect("bucket is never empty");
            let summary: String = latest.content.chars().take(SUMMARY_CHARS).collect();
            let cumulative_cost: f32 = members.iter().map(|e| e.integration_cost.weighted()).sum();
            CatalogCluster {
                topic,
                summary,
                entry_count: members.len(),
                cumulative_cost,
                latest_sequence: latest.sequence,
                entry_ids: members.iter().map(|e| e.id.clone()).collect(),
            }
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.cumulative_cost
            .partial_cmp(&a.cumulative_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::storage::types::entry::{ClaimsStatus, IntegrationStatus};
    use common::storage::types::integration_cost::IntegrationCost;

    fn entry(topic: &str, content: &str, sequence: u64, cost: IntegrationCost) -> Entry {
        Entry {
            id: format!("e{sequence}"),
            notebook_id: "nb".into(),
            content: content.into(),
            content_type: "text/plain".into(),
            topic: topic.into(),
            references: vec![],
            revision_of: None,
            fragment_of: None,
            fragment_index: None,
            author: "a".into(),
            created_at: Utc::now(),
            sequence,
            integration_cost: cost,
            claims_status: ClaimsStatus::Pending,
            integration_status: IntegrationStatus::Probation,
            max_friction: 0.0,
            embedding: None,
            secondary_topics: vec![],
        }
    }

    #[test]
    fn empty_notebook_has_zero_clusters() {
        assert!(project_from_entries(&[]).is_empty());
    }

    #[test]
    fn clusters_sort_by_cumulative_cost_descending() {
        let cheap_cost = IntegrationCost {
            entries_revised: 0,
            references_broken: 0,
            catalog_shift: 0.1,
            orphan: false,
        };
        let expensive_cost = IntegrationCost {
            entries_revised: 2,
            references_broken: 1,
            catalog_shift: 0.5,
            orphan: false,
        };
        let entries = vec![
            entry("cheap", "x", 1, cheap_cost),
            entry("expensive", "y", 2, expensive_cost),
        ];
        let clusters = project_from_entries(&entries);
        assert_eq!(clusters[0].topic, "expensive");
        assert_eq!(clusters[1].topic, "cheap");
    }

    #[test]
    fn empty_topic_buckets_under_none() {
        let cost = IntegrationCost {
            entries_revised: 0,
            references_broken: 0,
            catalog_shift: 0.0,
            orphan: false,
        };
        let entries = vec![entry("", "x", 1, cost)];
        let clusters = project_from_entries(&entries);
        assert_eq!(clusters[0].topic, "(none)");
    }

    #[test]
    fn cumulative_cost_matches_weighted_sum() {
        let cost_a = IntegrationCost {
            entries_revised: 2,
            references_broken: 1,
            catalog_shift: 0.4,
            orphan: false,
        };
        let cost_b = IntegrationCost {
            entries_revised: 0,
            references_broken: 0,
            catalog_shift: 0.2,
            orphan: false,
        };
        let entries = vec![entry("t", "a", 1, cost_a), entry("t", "b", 2, cost_b)];
        let clusters = project_from_entries(&entries);
        let expected = cost_a.weighted() + cost_b.weighted();
        assert!((clusters[0].cumulative_cost - expected).abs() < 1e-4);
    }
}
