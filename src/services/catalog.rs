//! Price catalog loading and session storage
//!
//! The catalog is read-only for the lifetime of a matching pass. Loading
//! walks three tiers — the last upload held in memory, a cached CSV on disk,
//! a configured remote URL — and the first tier that yields a non-empty,
//! parseable table wins. Failures at any tier fall through silently; an
//! exhausted ladder just means every item gets priced at zero.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::domain::PriceCatalogEntry;

/// One immutable catalog generation. Replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub entries: Vec<PriceCatalogEntry>,
    pub source: String,
}

impl CatalogSnapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            source: "none".to_string(),
        }
    }
}

pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
    cache_path: PathBuf,
    remote_url: Option<String>,
    http: reqwest::Client,
}

impl CatalogStore {
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_sources(
            settings.catalog_cache_path.clone(),
            settings.catalog_remote_url.clone(),
            settings.catalog_fetch_timeout_seconds,
        )
    }

    pub fn with_sources(
        cache_path: PathBuf,
        remote_url: Option<String>,
        fetch_timeout_seconds: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch_timeout_seconds))
            .build()
            .context("Failed to create catalog HTTP client")?;

        Ok(Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            cache_path,
            remote_url,
            http,
        })
    }

    /// Current catalog without triggering any loads.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().clone()
    }

    /// Replace the catalog wholesale from an uploaded CSV and refresh the
    /// disk cache. Returns the number of parsed entries.
    pub async fn replace_with_upload(&self, bytes: &[u8]) -> usize {
        let entries = parse_csv(bytes, "upload");
        let count = entries.len();

        if count > 0 {
            if let Err(e) = tokio::fs::write(&self.cache_path, bytes).await {
                tracing::warn!(error = %e, path = ?self.cache_path, "Failed to write catalog cache");
            }
            self.swap(CatalogSnapshot {
                entries,
                source: "upload".to_string(),
            });
            tracing::info!(entries = count, "Price catalog replaced from upload");
        }

        count
    }

    /// Walk the source tiers until one yields a non-empty catalog. Never
    /// fails: an empty snapshot is the degraded-but-valid end state.
    pub async fn ensure_loaded(&self) -> Arc<CatalogSnapshot> {
        {
            let current = self.current.read().clone();
            if !current.entries.is_empty() {
                return current;
            }
        }

        // Tier 2: cached copy on disk
        if let Ok(bytes) = tokio::fs::read(&self.cache_path).await {
            let entries = parse_csv(&bytes, "cache");
            if !entries.is_empty() {
                tracing::info!(entries = entries.len(), "Price catalog loaded from disk cache");
                return self.swap(CatalogSnapshot {
                    entries,
                    source: "cache".to_string(),
                });
            }
        }

        // Tier 3: remote fallback, bounded by the client timeout
        if let Some(url) = &self.remote_url {
            match self.fetch_remote(url).await {
                Ok(bytes) => {
                    let entries = parse_csv(&bytes, "remote");
                    if !entries.is_empty() {
                        if let Err(e) = tokio::fs::write(&self.cache_path, &bytes).await {
                            tracing::warn!(error = %e, "Failed to cache remote catalog");
                        }
                        tracing::info!(entries = entries.len(), url = %url, "Price catalog fetched from remote");
                        return self.swap(CatalogSnapshot {
                            entries,
                            source: "remote".to_string(),
                        });
                    }
                }
                Err(e) => {
                    // Timeout or transport failure behaves exactly as "source empty"
                    tracing::warn!(error = %e, url = %url, "Remote catalog fetch failed");
                }
            }
        }

        tracing::warn!("No price catalog available from any source tier");
        self.current.read().clone()
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn swap(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = snapshot.clone();
        snapshot
    }
}

/// Tolerant CSV parsing. Headers are matched case-insensitively; at minimum
/// `description` and `unit_price` must resolve or the whole table is treated
/// as unparseable. Rows with bad prices are kept at price 0, not dropped.
pub fn parse_csv(bytes: &[u8], default_source: &str) -> Vec<PriceCatalogEntry> {
    let text = decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(_) => return Vec::new(),
    };

    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let (desc_idx, price_idx) = match (col("description"), col("unit_price")) {
        (Some(d), Some(p)) => (d, p),
        _ => return Vec::new(),
    };
    let code_idx = col("code");
    let unit_idx = col("unit");
    let source_idx = col("source");

    let field = |record: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut entries = Vec::new();
    for record in reader.records().flatten() {
        let description = field(&record, Some(desc_idx));
        let unit_price = parse_price(record.get(price_idx).unwrap_or(""));

        let source = field(&record, source_idx);
        entries.push(PriceCatalogEntry {
            code: field(&record, code_idx),
            description,
            unit: field(&record, unit_idx),
            unit_price,
            source: if source.is_empty() {
                default_source.to_string()
            } else {
                source
            },
        });
    }

    entries
}

/// UTF-8 preferred, Windows-1252 best effort otherwise.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Price coercion: accepts plain decimals, decimal commas ("12,5") and
/// thousands-separator commas ("1,250.5"). A single comma followed by one or
/// two digits reads as a decimal point, matching how quantities are parsed;
/// any other comma is a separator. Anything else (including negatives)
/// becomes 0.
fn parse_price(raw: &str) -> f64 {
    let raw = raw.trim();
    let parsed = raw
        .parse::<f64>()
        .ok()
        .or_else(|| decimal_comma(raw))
        .or_else(|| raw.replace(',', "").parse::<f64>().ok())
        .unwrap_or(0.0);

    if parsed.is_finite() && parsed > 0.0 {
        parsed
    } else {
        0.0
    }
}

fn decimal_comma(raw: &str) -> Option<f64> {
    let (head, tail) = raw.split_once(',')?;
    if raw.contains('.') || tail.len() > 2 || tail.is_empty() {
        return None;
    }
    if !tail.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    format!("{}.{}", head, tail).parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn temp_cache_path() -> PathBuf {
        std::env::temp_dir().join(format!("boqflow-cache-{}.csv", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn exhausted_tiers_yield_an_empty_snapshot() {
        // no upload, cache path does not exist, no remote configured
        let store = CatalogStore::with_sources(temp_cache_path(), None, 1).unwrap();

        let snapshot = store.ensure_loaded().await;
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.source, "none");
    }

    #[tokio::test]
    async fn disk_cache_tier_loads_when_memory_is_empty() {
        let cache = temp_cache_path();
        tokio::fs::write(&cache, "description,unit_price\ncable THW,12.5\n")
            .await
            .unwrap();

        let store = CatalogStore::with_sources(cache.clone(), None, 1).unwrap();
        let snapshot = store.ensure_loaded().await;

        assert_eq!(snapshot.source, "cache");
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].unit_price, 12.5);

        tokio::fs::remove_file(&cache).await.ok();
    }

    #[tokio::test]
    async fn upload_outranks_the_disk_cache_and_refreshes_it() {
        let cache = temp_cache_path();
        tokio::fs::write(&cache, "description,unit_price\nold entry,1\n")
            .await
            .unwrap();

        let store = CatalogStore::with_sources(cache.clone(), None, 1).unwrap();
        let count = store
            .replace_with_upload(b"description,unit_price\nnew entry,2\n")
            .await;
        assert_eq!(count, 1);

        let snapshot = store.ensure_loaded().await;
        assert_eq!(snapshot.source, "upload");
        assert_eq!(snapshot.entries[0].description, "new entry");

        // the cache file now holds the uploaded table
        let cached = tokio::fs::read_to_string(&cache).await.unwrap();
        assert!(cached.contains("new entry"));

        tokio::fs::remove_file(&cache).await.ok();
    }

    #[tokio::test]
    async fn memory_tier_survives_cache_file_loss() {
        let cache = temp_cache_path();
        let store = CatalogStore::with_sources(cache.clone(), None, 1).unwrap();
        store
            .replace_with_upload(b"description,unit_price\ncable THW,12.5\n")
            .await;
        tokio::fs::remove_file(&cache).await.ok();

        let snapshot = store.ensure_loaded().await;
        assert_eq!(snapshot.source, "upload");
        assert_eq!(snapshot.entries.len(), 1);
    }

    #[tokio::test]
    async fn rejected_upload_keeps_the_current_snapshot() {
        let cache = temp_cache_path();
        let store = CatalogStore::with_sources(cache.clone(), None, 1).unwrap();
        store
            .replace_with_upload(b"description,unit_price\ncable THW,12.5\n")
            .await;

        // no usable columns: rejected, snapshot untouched
        let count = store.replace_with_upload(b"code,name\nX,Y\n").await;
        assert_eq!(count, 0);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].description, "cable THW");

        tokio::fs::remove_file(&cache).await.ok();
    }

    #[test]
    fn parses_minimal_two_column_csv() {
        let csv = "description,unit_price\nสายไฟ THW 2.5 mm2,12.5\n";
        let entries = parse_csv(csv.as_bytes(), "upload");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "สายไฟ THW 2.5 mm2");
        assert_eq!(entries[0].unit_price, 12.5);
        assert_eq!(entries[0].source, "upload");
        assert_eq!(entries[0].code, "");
    }

    #[test]
    fn headers_match_case_insensitively_and_extras_are_ignored() {
        let csv = "Code,DESCRIPTION,Unit,Unit_Price,Source,remarks\nEL-001,cable THW,m,12.5,vendor,ignore me\n";
        let entries = parse_csv(csv.as_bytes(), "cache");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, "EL-001");
        assert_eq!(entries[0].unit, "m");
        assert_eq!(entries[0].source, "vendor");
    }

    #[test]
    fn missing_required_columns_means_unparseable() {
        let csv = "code,name,price\nEL-001,cable,12.5\n";
        assert!(parse_csv(csv.as_bytes(), "upload").is_empty());
    }

    #[test]
    fn bad_price_rows_are_kept_at_zero() {
        let csv = "description,unit_price\ncable THW,not-a-number\nconduit EMT,20\n";
        let entries = parse_csv(csv.as_bytes(), "upload");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].unit_price, 0.0);
        assert_eq!(entries[1].unit_price, 20.0);
    }

    #[test]
    fn negative_prices_are_clamped() {
        let csv = "description,unit_price\ncable,-5\n";
        let entries = parse_csv(csv.as_bytes(), "upload");
        assert_eq!(entries[0].unit_price, 0.0);
    }

    #[test]
    fn thousands_and_decimal_commas_are_tolerated() {
        assert_eq!(parse_price("1,250.5"), 1250.5);
        assert_eq!(parse_price("12.5"), 12.5);
        // one comma, 1-2 trailing digits: a decimal point, as in quantities
        assert_eq!(parse_price("12,5"), 12.5);
        assert_eq!(parse_price("12,50"), 12.5);
        // three digits after the comma: a thousands separator
        assert_eq!(parse_price("1,250"), 1250.0);
        assert_eq!(parse_price("1,250,000"), 1_250_000.0);
    }

    #[test]
    fn non_utf8_bytes_decode_best_effort() {
        // "caf\xe9" in Windows-1252
        let csv = b"description,unit_price\ncaf\xe9 cable,3\n";
        let entries = parse_csv(csv, "upload");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "café cable");
    }
}
