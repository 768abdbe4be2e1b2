//! On-disk response store.
//!
//! One file per cached page under a sharded tree:
//! `root/<hex[0:2]>/<hex[2:4]>/<hex>.html`. The file's modification time is
//! the only metadata and drives expiry. Writes go to a temp file in the target
//! directory and are renamed into place, so readers only ever observe complete
//! entries.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::CacheConfig;
use super::gate::CLOSING_HTML;
use super::keys::CacheKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "vitrine_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "vitrine_cache_miss_total";
pub(crate) const METRIC_CACHE_STORE: &str = "vitrine_cache_store_total";
pub(crate) const METRIC_CACHE_STORE_SKIPPED: &str = "vitrine_cache_store_skipped_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "vitrine_cache_invalidate_total";
pub(crate) const METRIC_CACHE_FLUSH: &str = "vitrine_cache_flush_total";

/// Files in the cache root that survive a flush.
pub const HTACCESS: &str = ".htaccess";
pub const INDEX_STUB: &str = "index.html";
const HTACCESS_BODY: &str = "Require all denied\nDeny from all\n";
const ENTRY_EXTENSION: &str = "html";
const CLEANUP_LOG_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to create cache directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cache file `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to provision cache root `{path}`: {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache worker task failed: {0}")]
    Task(String),
}

/// A fresh entry read back from disk.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: Bytes,
    pub captured_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    Invalidate,
    Flush,
}

/// One invalidation or flush, kept for the admin status view.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupLogEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub action: CleanupAction,
    pub target: String,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub skipped: u64,
    pub invalidations: u64,
    pub flushes: u64,
}

#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    skipped: AtomicU64,
    invalidations: AtomicU64,
    flushes: AtomicU64,
}

/// Filesystem-backed page cache.
#[derive(Debug)]
pub struct ResponseStore {
    root: PathBuf,
    ttl: Duration,
    stats: CacheStats,
    log: Mutex<VecDeque<CleanupLogEntry>>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            root: config.directory.clone(),
            ttl: config.ttl,
            stats: CacheStats::default(),
            log: Mutex::new(VecDeque::with_capacity(CLEANUP_LOG_LIMIT)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Absolute location of the entry for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Create the root with its deny-all guard and index stub if missing.
    pub fn ensure_root(&self) -> Result<(), CacheStoreError> {
        provision(&self.root)
    }

    /// Return the entry for `key` when it exists and is still fresh.
    ///
    /// Stale entries are removed on the way out. Any I/O failure counts as a
    /// miss.
    pub async fn try_serve(&self, key: &CacheKey) -> Option<CachedPage> {
        let path = self.entry_path(key);
        let page = self.read_fresh(&path).await;

        if page.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            counter!(METRIC_CACHE_HIT).increment(1);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            counter!(METRIC_CACHE_MISS).increment(1);
        }

        page
    }

    async fn read_fresh(&self, path: &Path) -> Option<CachedPage> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "try_serve",
                    path = %path.display(),
                    error = %err,
                    "failed to stat cache entry"
                );
                return None;
            }
        };

        let modified = metadata.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age > self.ttl {
            match fs::remove_file(path).await {
                Ok(()) => debug!(
                    target = SOURCE,
                    op = "try_serve",
                    result = "expired",
                    path = %path.display(),
                    age_secs = age.as_secs(),
                    "removed stale cache entry"
                ),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!(
                    target = SOURCE,
                    op = "try_serve",
                    path = %path.display(),
                    error = %err,
                    "failed to remove stale cache entry"
                ),
            }
            return None;
        }

        match fs::read(path).await {
            Ok(body) => Some(CachedPage {
                body: Bytes::from(body),
                captured_at: OffsetDateTime::from(modified),
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "try_serve",
                    path = %path.display(),
                    error = %err,
                    "failed to read cache entry"
                );
                None
            }
        }
    }

    /// Annotate `body` and write it as the entry for `key`.
    ///
    /// Returns `false` when the write failed; the failure is logged and never
    /// surfaces to the visitor.
    pub async fn capture(&self, key: &CacheKey, body: &[u8]) -> bool {
        let annotated = annotate(body, OffsetDateTime::now_utc());
        let root = self.root.clone();
        let target = self.entry_path(key);

        let result = tokio::task::spawn_blocking(move || write_entry(&root, &target, &annotated))
            .await
            .map_err(|err| CacheStoreError::Task(err.to_string()))
            .and_then(|inner| inner);

        match result {
            Ok(()) => {
                self.stats.stores.fetch_add(1, Ordering::Relaxed);
                counter!(METRIC_CACHE_STORE).increment(1);
                debug!(
                    target = SOURCE,
                    op = "capture",
                    result = "stored",
                    key = key.digest(),
                    url = key.normalized(),
                    "cached rendered page"
                );
                true
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "capture",
                    result = "failed",
                    url = key.normalized(),
                    error = %err,
                    "failed to write cache entry"
                );
                false
            }
        }
    }

    /// Count a rendered response the gate refused to store.
    pub fn record_skipped(&self) {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CACHE_STORE_SKIPPED).increment(1);
    }

    /// Remove the entry for `key`. Missing entries are a no-op.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let path = self.entry_path(key);
        let removed = match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => false,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "invalidate",
                    path = %path.display(),
                    error = %err,
                    "failed to remove cache entry"
                );
                false
            }
        };

        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CACHE_INVALIDATE).increment(1);
        self.push_log(CleanupAction::Invalidate, key.normalized(), usize::from(removed));
        debug!(
            target = SOURCE,
            op = "invalidate",
            url = key.normalized(),
            removed,
            "invalidated cache entry"
        );

        removed
    }

    /// Remove the entry for an absolute URL or site-relative path.
    pub async fn invalidate_url(&self, url: &str) -> bool {
        self.invalidate(&CacheKey::from_url(url)).await
    }

    /// Remove every entry, keep the guard files, and re-provision the root.
    ///
    /// Individual failures are logged and skipped. Returns the number of
    /// entry files removed.
    pub async fn invalidate_all(&self) -> usize {
        let root = self.root.clone();
        let removed = match tokio::task::spawn_blocking(move || {
            let removed = clear_root(&root);
            if let Err(err) = provision(&root) {
                warn!(
                    target = SOURCE,
                    op = "invalidate_all",
                    error = %err,
                    "failed to re-provision cache root"
                );
            }
            removed
        })
        .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "invalidate_all",
                    error = %err,
                    "cache flush task failed"
                );
                0
            }
        };

        self.stats.flushes.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CACHE_FLUSH).increment(1);
        self.push_log(CleanupAction::Flush, "*", removed);
        info!(
            target = SOURCE,
            op = "invalidate_all",
            removed,
            "flushed page cache"
        );

        removed
    }

    /// Write and remove a scratch file to prove the root is writable.
    pub async fn write_test(&self) -> Result<(), CacheStoreError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            provision(&root)?;
            let scratch = root.join(format!(".write-test-{}", Uuid::new_v4()));
            std::fs::write(&scratch, b"ok").map_err(|source| CacheStoreError::Write {
                path: scratch.clone(),
                source,
            })?;
            std::fs::remove_file(&scratch).map_err(|source| CacheStoreError::Write {
                path: scratch,
                source,
            })
        })
        .await
        .map_err(|err| CacheStoreError::Task(err.to_string()))?
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            stores: self.stats.stores.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
            flushes: self.stats.flushes.load(Ordering::Relaxed),
        }
    }

    /// Most recent cleanup actions, newest first.
    pub fn cleanup_log(&self) -> Vec<CleanupLogEntry> {
        mutex_lock(&self.log, SOURCE, "cleanup_log")
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    fn push_log(&self, action: CleanupAction, target: &str, removed: usize) {
        let mut log = mutex_lock(&self.log, SOURCE, "push_log");
        if log.len() == CLEANUP_LOG_LIMIT {
            log.pop_front();
        }
        log.push_back(CleanupLogEntry {
            at: OffsetDateTime::now_utc(),
            action,
            target: target.to_string(),
            removed,
        });
    }
}

/// `YYYY-MM-DD HH:MM:SS UTC`, as written into entries and the hit header.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// The marker comment inserted into every stored page.
pub fn annotation(at: OffsetDateTime) -> String {
    format!("<!-- cache | Generated: {} -->", format_timestamp(at))
}

/// Insert the marker comment before the last `</html>`, or append it when
/// the document has none.
pub fn annotate(body: &[u8], at: OffsetDateTime) -> Vec<u8> {
    let comment = annotation(at);
    let split = CLOSING_HTML
        .find_iter(body)
        .last()
        .map_or(body.len(), |found| found.start());

    let mut annotated = Vec::with_capacity(body.len() + comment.len());
    annotated.extend_from_slice(&body[..split]);
    annotated.extend_from_slice(comment.as_bytes());
    annotated.extend_from_slice(&body[split..]);
    annotated
}

fn provision(root: &Path) -> Result<(), CacheStoreError> {
    std::fs::create_dir_all(root).map_err(|source| CacheStoreError::CreateDir {
        path: root.to_path_buf(),
        source,
    })?;

    for (name, contents) in [(HTACCESS, HTACCESS_BODY), (INDEX_STUB, "")] {
        let path = root.join(name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, contents)
            .map_err(|source| CacheStoreError::Provision { path, source })?;
    }

    Ok(())
}

fn write_entry(root: &Path, target: &Path, contents: &[u8]) -> Result<(), CacheStoreError> {
    provision(root)?;

    let parent = target.parent().unwrap_or(root);
    std::fs::create_dir_all(parent).map_err(|source| CacheStoreError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;

    let write_err = |source: io::Error| CacheStoreError::Write {
        path: target.to_path_buf(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix(".entry-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    file.persist(target).map_err(|err| write_err(err.error))?;

    Ok(())
}

fn clear_root(root: &Path) -> usize {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return 0,
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "invalidate_all",
                path = %root.display(),
                error = %err,
                "failed to list cache root"
            );
            return 0;
        }
    };

    entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            name != HTACCESS && name != INDEX_STUB
        })
        .map(|entry| remove_tree(&entry.path()))
        .sum()
}

fn remove_tree(path: &Path) -> usize {
    let is_dir = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata.is_dir(),
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "invalidate_all",
                path = %path.display(),
                error = %err,
                "failed to inspect cache path"
            );
            return 0;
        }
    };

    if !is_dir {
        return match std::fs::remove_file(path) {
            Ok(()) => usize::from(is_entry(path)),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "invalidate_all",
                    path = %path.display(),
                    error = %err,
                    "failed to remove cache file"
                );
                0
            }
        };
    }

    let removed = match std::fs::read_dir(path) {
        Ok(children) => children
            .flatten()
            .map(|child| remove_tree(&child.path()))
            .sum(),
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "invalidate_all",
                path = %path.display(),
                error = %err,
                "failed to list cache directory"
            );
            0
        }
    };

    if let Err(err) = std::fs::remove_dir(path) {
        warn!(
            target = SOURCE,
            op = "invalidate_all",
            path = %path.display(),
            error = %err,
            "failed to remove cache directory"
        );
    }

    removed
}

fn is_entry(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    const PAGE: &[u8] = b"<!doctype html><html><head></head><body><h1>Widget</h1></body></html>\n";

    fn store_in(dir: &TempDir) -> ResponseStore {
        ResponseStore::new(&CacheConfig::at(dir.path().join("pages")))
    }

    fn strip_annotation(body: &[u8]) -> Vec<u8> {
        let text = String::from_utf8(body.to_vec()).unwrap();
        let start = text.find("<!-- cache | Generated: ").unwrap();
        let end = start + text[start..].find("-->").unwrap() + "-->".len();
        format!("{}{}", &text[..start], &text[end..]).into_bytes()
    }

    #[test]
    fn annotation_goes_before_last_closing_tag() {
        let at = time::macros::datetime!(2026-03-04 05:06:07 UTC);
        let body = b"<html><body><pre></html></pre></body></HTML>";
        let annotated = annotate(body, at);

        assert_eq!(
            String::from_utf8(annotated).unwrap(),
            "<html><body><pre></html></pre></body><!-- cache | Generated: 2026-03-04 05:06:07 UTC --></HTML>"
        );
    }

    fn large_page(fill: u8) -> Vec<u8> {
        let mut page = b"<html><body>".to_vec();
        page.extend(std::iter::repeat_n(fill, 200 * 1024));
        page.extend_from_slice(b"</body></html>");
        page
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_captures_never_expose_partial_entries() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store_in(&dir));
        let key = CacheKey::from_url("/product/widget/");
        let first = large_page(b'a');
        let second = large_page(b'b');

        let mut writers = Vec::new();
        for round in 0..40 {
            let store = store.clone();
            let key = key.clone();
            let body = if round % 2 == 0 { first.clone() } else { second.clone() };
            writers.push(tokio::spawn(async move { store.capture(&key, &body).await }));
        }

        let mut readers = Vec::new();
        for _ in 0..40 {
            let store = store.clone();
            let key = key.clone();
            readers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..5 {
                    if let Some(page) = store.try_serve(&key).await {
                        seen.push(strip_annotation(&page.body));
                    }
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        for writer in writers {
            assert!(writer.await.unwrap());
        }
        for reader in readers {
            for body in reader.await.unwrap() {
                assert!(body == first || body == second, "torn read of {} bytes", body.len());
            }
        }

        let settled = store.try_serve(&key).await.unwrap();
        let settled = strip_annotation(&settled.body);
        assert!(settled == first || settled == second);
    }

    #[test]
    fn annotation_is_appended_without_closing_tag() {
        let at = time::macros::datetime!(2026-01-01 00:00:00 UTC);
        let annotated = annotate(b"fragment", at);
        assert!(annotated.starts_with(b"fragment<!-- cache"));
    }

    #[tokio::test]
    async fn capture_then_serve_round_trips_body() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let key = CacheKey::derive("/product/widget/", None);

        assert!(store.try_serve(&key).await.is_none());
        assert!(store.capture(&key, PAGE).await);

        let page = store.try_serve(&key).await.expect("fresh entry");
        assert_eq!(strip_annotation(&page.body), PAGE);
        assert!(store.entry_path(&key).is_file());
        assert!(store.root().join(HTACCESS).is_file());
        assert!(store.root().join(INDEX_STUB).is_file());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stores, 1);
    }

    #[tokio::test]
    async fn overwrite_leaves_single_complete_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let key = CacheKey::derive("/", None);

        assert!(store.capture(&key, b"<html>first</html>").await);
        assert!(store.capture(&key, b"<html>second</html>").await);

        let page = store.try_serve(&key).await.unwrap();
        assert_eq!(strip_annotation(&page.body), b"<html>second</html>");

        let shard = store.entry_path(&key).parent().unwrap().to_path_buf();
        let files: Vec<_> = std::fs::read_dir(shard).unwrap().flatten().collect();
        assert_eq!(files.len(), 1, "temp files must not linger");
    }

    #[tokio::test]
    async fn stale_entries_are_deleted_on_read() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let key = CacheKey::derive("/shop/", None);
        assert!(store.capture(&key, PAGE).await);

        let path = store.entry_path(&key);
        let past = SystemTime::now() - (store.ttl() + Duration::from_secs(60));
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert!(store.try_serve(&key).await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn invalidate_removes_only_target_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let widget = CacheKey::derive("/product/widget/", None);
        let gadget = CacheKey::derive("/product/gadget/", None);

        assert!(store.capture(&widget, PAGE).await);
        assert!(store.capture(&gadget, PAGE).await);

        assert!(store.invalidate_url("https://shop.example/product/widget/").await);
        assert!(!store.entry_path(&widget).exists());
        assert!(store.entry_path(&gadget).exists());

        assert!(!store.invalidate(&widget).await, "second removal is a no-op");

        let log = store.cleanup_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].removed, 0);
        assert_eq!(log[1].target, "/product/widget/");
        assert_eq!(log[1].action, CleanupAction::Invalidate);
    }

    #[tokio::test]
    async fn invalidate_all_keeps_guard_files() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for path in ["/", "/shop/", "/product/widget/"] {
            assert!(store.capture(&CacheKey::derive(path, None), PAGE).await);
        }

        assert_eq!(store.invalidate_all().await, 3);

        let remaining: Vec<String> = std::fs::read_dir(store.root())
            .unwrap()
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|name| name == HTACCESS));
        assert!(remaining.iter().any(|name| name == INDEX_STUB));

        let key = CacheKey::derive("/", None);
        assert!(store.capture(&key, PAGE).await, "store stays servable");
        assert_eq!(store.stats().flushes, 1);
    }

    #[tokio::test]
    async fn invalidate_all_on_missing_root_reprovisions() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.invalidate_all().await, 0);
        assert!(store.root().join(HTACCESS).is_file());
    }

    #[tokio::test]
    async fn write_test_leaves_no_scratch_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write_test().await.unwrap();

        let names: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .flatten()
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn capture_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("pages");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = ResponseStore::new(&CacheConfig::at(&blocker));

        assert!(!store.capture(&CacheKey::derive("/", None), PAGE).await);
        assert!(store.write_test().await.is_err());
    }

    #[tokio::test]
    async fn cleanup_log_is_bounded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for index in 0..(CLEANUP_LOG_LIMIT + 5) {
            store.invalidate_url(&format!("/p/{index}/")).await;
        }

        let log = store.cleanup_log();
        assert_eq!(log.len(), CLEANUP_LOG_LIMIT);
        assert_eq!(log[0].target, format!("/p/{}/", CLEANUP_LOG_LIMIT + 4));
    }
}
