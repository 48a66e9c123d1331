//! Usage statistics aggregation.

use crate::models::AddonRecord;
use serde::Serialize;

/// Number of entries in each top listing.
const TOP_N: usize = 5;

/// Aggregate usage statistics over the live record set.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_addons: u64,
    pub total_downloads: u64,
    pub total_views: u64,
    pub top_downloaded: Vec<AddonRecord>,
    pub top_recent: Vec<AddonRecord>,
}

/// Reduce a record set into aggregate statistics.
///
/// Pure: no store access and no reconciliation side effect. Callers pass an
/// already-reconciled set. Sorting is stable, so ties keep the input order,
/// and both top listings are truncated to five entries.
pub fn compute_stats(records: &[AddonRecord]) -> CatalogStats {
    let total_downloads = records.iter().map(|r| r.downloads.max(0) as u64).sum();
    let total_views = records.iter().map(|r| r.views.max(0) as u64).sum();

    let mut top_downloaded: Vec<AddonRecord> = records.to_vec();
    top_downloaded.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    top_downloaded.truncate(TOP_N);

    let mut top_recent: Vec<AddonRecord> = records.to_vec();
    top_recent.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    top_recent.truncate(TOP_N);

    CatalogStats {
        total_addons: records.len() as u64,
        total_downloads,
        total_views,
        top_downloaded,
        top_recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn record(name: &str, downloads: i64, views: i64, uploaded_at: OffsetDateTime) -> AddonRecord {
        AddonRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
            author: "Anonymous".to_string(),
            description: "desc".to_string(),
            kind: "complete".to_string(),
            file_hash: format!("{name:0>64}"),
            file_name: format!("{name}.zip"),
            original_name: format!("{name}.zip"),
            file_key: format!("addons/{name}.zip"),
            size: 1,
            images: Vec::new(),
            uploaded_at,
            downloads,
            views,
        }
    }

    #[test]
    fn test_totals_and_top_order() {
        let now = OffsetDateTime::now_utc();
        let records = vec![
            record("a", 3, 1, now - time::Duration::hours(2)),
            record("b", 7, 2, now - time::Duration::hours(1)),
            record("c", 0, 4, now),
        ];

        let stats = compute_stats(&records);
        assert_eq!(stats.total_addons, 3);
        assert_eq!(stats.total_downloads, 10);
        assert_eq!(stats.total_views, 7);
        assert_eq!(stats.top_downloaded[0].name, "b");
        assert_eq!(stats.top_recent[0].name, "c");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let now = OffsetDateTime::now_utc();
        let records = vec![
            record("first", 5, 0, now),
            record("second", 5, 0, now),
            record("third", 9, 0, now),
        ];

        let stats = compute_stats(&records);
        assert_eq!(stats.top_downloaded[0].name, "third");
        assert_eq!(stats.top_downloaded[1].name, "first");
        assert_eq!(stats.top_downloaded[2].name, "second");
    }

    #[test]
    fn test_top_listings_truncate_to_five() {
        let now = OffsetDateTime::now_utc();
        let records: Vec<_> = (0..8)
            .map(|i| record(&format!("r{i}"), i, 0, now - time::Duration::minutes(i)))
            .collect();

        let stats = compute_stats(&records);
        assert_eq!(stats.total_addons, 8);
        assert_eq!(stats.top_downloaded.len(), 5);
        assert_eq!(stats.top_recent.len(), 5);
        assert_eq!(stats.top_downloaded[0].name, "r7");
    }

    #[test]
    fn test_empty_set() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_addons, 0);
        assert_eq!(stats.total_downloads, 0);
        assert!(stats.top_downloaded.is_empty());
    }
}
