//! Provenance normalization and deduplication.
//!
//! Every source adapter and every later consolidation step runs its output
//! through [`normalize`] before the records are considered canonical.
//! `normalize` is idempotent: applying it twice yields the same record set.

use std::collections::HashMap;

use url::Url;

use crate::types::{DocumentRecord, META_CANONICAL_URL, META_DOMAIN};

/// Canonical form of a URL: `scheme://lowercased-host` plus the path with
/// any trailing slash stripped. Query string and fragment are dropped.
/// Returns `None` when the input does not parse as an absolute URL.
pub fn canonical_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let path = parsed.path().trim_end_matches('/');
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}{}", parsed.scheme(), host, port, path)),
        None => Some(format!("{}://{}{}", parsed.scheme(), host, path)),
    }
}

/// Host (netloc) of a URL, lowercased, including an explicit port if any.
fn netloc(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host),
    }
}

/// Annotate each record with `canonical_url` and `domain` metadata.
///
/// Existing annotations are never overwritten, so enrichment is idempotent.
/// When canonicalization fails the raw URL is kept as the canonical form;
/// records without a URL stay unannotated.
pub fn enrich(records: &mut [DocumentRecord]) {
    for record in records.iter_mut() {
        let canon = record.url.as_deref().and_then(canonical_url);
        if let Some(domain) = canon.as_deref().and_then(netloc) {
            record.set_meta_if_absent(META_DOMAIN, domain.into());
        }
        if let Some(canonical) = canon.or_else(|| record.url.clone()) {
            record.set_meta_if_absent(META_CANONICAL_URL, canonical.into());
        }
    }
}

/// Collapse duplicate records.
///
/// Dedup key, in priority order: the enriched canonical URL, a fresh
/// canonicalization of the raw URL, the record's own id. For records sharing
/// a key the higher `score` wins (missing score counts as 0); ties keep the
/// first-seen record. Output preserves first-seen key order, but callers
/// needing a particular order must sort explicitly.
pub fn dedupe(records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    let mut best: Vec<DocumentRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = record
            .canonical_url()
            .map(str::to_string)
            .or_else(|| record.url.as_deref().and_then(canonical_url))
            .unwrap_or_else(|| record.id.clone());

        match index.get(&key) {
            Some(&slot) => {
                if record.score.unwrap_or(0.0) > best[slot].score.unwrap_or(0.0) {
                    best[slot] = record;
                }
            }
            None => {
                index.insert(key, best.len());
                best.push(record);
            }
        }
    }

    best
}

/// Enrich then dedupe. The canonical entry point for all retrieval output.
pub fn normalize(mut records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    enrich(&mut records);
    dedupe(records)
}

/// Sort newest-first; records without a timestamp sort last.
pub fn sort_by_recency_desc(records: &mut [DocumentRecord]) {
    records.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Partition records into per-domain buckets, `"unknown"` when no domain
/// was enriched. Bucket order follows first appearance; relative record
/// order within each bucket follows the input.
pub fn cluster_by_domain(records: Vec<DocumentRecord>) -> Vec<(String, Vec<DocumentRecord>)> {
    let mut buckets: Vec<(String, Vec<DocumentRecord>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let domain = record.domain().unwrap_or("unknown").to_string();
        match index.get(&domain) {
            Some(&slot) => buckets[slot].1.push(record),
            None => {
                index.insert(domain.clone(), buckets.len());
                buckets.push((domain, vec![record]));
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(id: &str, url: Option<&str>) -> DocumentRecord {
        let mut r = DocumentRecord::new(id, format!("title {id}"), "summary");
        if let Some(url) = url {
            r = r.with_url(url);
        }
        r
    }

    #[test]
    fn canonical_lowercases_host_and_strips_slash_query_fragment() {
        assert_eq!(
            canonical_url("https://Example.com/a/?utm=x#frag").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            canonical_url("https://example.com/").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(canonical_url("not a url"), None);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for u in [
            "https://Example.com/a/",
            "http://news.example.org:8080/path/",
            "https://example.com",
        ] {
            let once = canonical_url(u).unwrap();
            assert_eq!(canonical_url(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn enrich_populates_domain_and_canonical_for_url_records() {
        let mut records = vec![
            record("a", Some("https://Example.com/a/")),
            record("b", None),
        ];
        enrich(&mut records);
        assert_eq!(records[0].canonical_url(), Some("https://example.com/a"));
        assert_eq!(records[0].domain(), Some("example.com"));
        assert_eq!(records[1].canonical_url(), None);
        assert_eq!(records[1].domain(), None);
    }

    #[test]
    fn enrich_never_overwrites_existing_annotations() {
        let mut records = vec![record("a", Some("https://example.com/a"))
            .with_metadata(META_DOMAIN, "pinned.example".into())];
        enrich(&mut records);
        assert_eq!(records[0].domain(), Some("pinned.example"));
    }

    #[test]
    fn case_and_slash_variants_collapse_to_one_record() {
        let records = vec![
            record("x1", Some("https://Example.com/a/")),
            record("x2", Some("https://example.com/a")),
        ];
        let out = normalize(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].canonical_url(), Some("https://example.com/a"));
    }

    #[test]
    fn higher_score_wins_ties_keep_first_seen() {
        let url = "https://example.com/story";
        let out = normalize(vec![
            record("low", Some(url)).with_score(0.2),
            record("high", Some(url)).with_score(0.9),
            record("late-tie", Some(url)).with_score(0.9),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "high");

        // Missing score counts as zero.
        let out = normalize(vec![
            record("unscored", Some(url)),
            record("scored", Some(url)).with_score(0.1),
        ]);
        assert_eq!(out[0].id, "scored");

        // Equal scores keep the first-seen record.
        let out = normalize(vec![
            record("first", Some(url)).with_score(0.5),
            record("second", Some(url)).with_score(0.5),
        ]);
        assert_eq!(out[0].id, "first");
    }

    #[test]
    fn records_without_urls_dedupe_by_id() {
        let out = normalize(vec![record("same", None), record("same", None), record("other", None)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn normalize_is_idempotent() {
        let records = vec![
            record("a", Some("https://Example.com/a/")).with_score(0.3),
            record("b", Some("https://example.com/a")).with_score(0.7),
            record("c", Some("https://other.org/x")),
            record("d", None),
        ];
        let once = normalize(records);
        let twice = normalize(once.clone());
        let ids = |rs: &[DocumentRecord]| rs.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn domain_buckets_partition_without_loss() {
        let records = normalize(vec![
            record("a", Some("https://a.example/1")),
            record("b", Some("https://b.example/1")),
            record("c", Some("https://a.example/2")),
            record("d", None),
        ]);
        let total = records.len();
        let buckets = cluster_by_domain(records);

        let bucket_total: usize = buckets.iter().map(|(_, b)| b.len()).sum();
        assert_eq!(bucket_total, total);

        let domains: Vec<_> = buckets.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(domains, vec!["a.example", "b.example", "unknown"]);

        // Relative input order preserved within a bucket.
        let a_ids: Vec<_> = buckets[0].1.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(a_ids, vec!["a", "c"]);
    }

    #[test]
    fn recency_sort_puts_missing_timestamps_last() {
        let mut records = vec![
            record("old", None).with_published_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            record("undated", None),
            record("new", None).with_published_at(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
        ];
        sort_by_recency_desc(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }
}
