//! Prewarm scheduler.
//!
//! A resumable state machine (`idle -> running -> completed`) that walks the
//! enumerated URL list in small, rate-limited batches. Each call to
//! [`PrewarmScheduler::tick`] does a bounded amount of work and schedules the
//! next one; the driver task decides when that happens.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify, futures::Notified};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::PrewarmConfig;
use super::enumerator::UrlEnumerator;
use super::error::PrewarmError;
use super::fetch::PageFetcher;
use super::job::{PrewarmJob, PrewarmStateFile, PrewarmStatus};
use crate::cache::FlushObserver;

const SOURCE: &str = "prewarm::scheduler";

pub(crate) const METRIC_PREWARM_FETCH: &str = "vitrine_prewarm_fetch_total";
pub(crate) const METRIC_PREWARM_TICK_MS: &str = "vitrine_prewarm_tick_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    /// Process the next batch of a running job.
    Tick,
    /// Enumerate again and start a fresh run.
    Restart,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    at: Instant,
    action: PendingAction,
}

struct SchedulerState {
    job: PrewarmJob,
    pending: Option<Pending>,
    /// Bumped whenever a run is started or stopped so an in-flight batch can
    /// tell that its job was replaced.
    generation: u64,
}

/// Point-in-time view of the job for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct PrewarmSnapshot {
    pub status: PrewarmStatus,
    pub total: usize,
    pub processed: usize,
    pub remaining: usize,
    pub last_url: Option<String>,
    pub auto_enabled: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
    pub next_action: Option<PendingAction>,
    pub next_action_in_ms: Option<u64>,
}

pub struct PrewarmScheduler {
    config: PrewarmConfig,
    enumerator: UrlEnumerator,
    fetcher: Arc<dyn PageFetcher>,
    state_file: PrewarmStateFile,
    state: Mutex<SchedulerState>,
    tick_lock: Mutex<()>,
    wake: Notify,
}

impl PrewarmScheduler {
    /// Restore the persisted job, or start idle with the configured auto
    /// flag when none exists.
    ///
    /// A persisted running job gets an immediate tick; a completed job with
    /// auto enabled gets a restart after the cooldown. A restart requested by
    /// an out-of-process flush runs immediately.
    pub async fn load(
        config: PrewarmConfig,
        enumerator: UrlEnumerator,
        fetcher: Arc<dyn PageFetcher>,
        state_file: PrewarmStateFile,
    ) -> Self {
        let job = match state_file.load().await {
            Ok(Some(job)) => {
                info!(
                    target = SOURCE,
                    op = "load",
                    status = job.status.as_str(),
                    remaining = job.remaining(),
                    auto_enabled = job.auto_enabled,
                    "restored prewarm state"
                );
                job
            }
            Ok(None) => PrewarmJob::new(config.auto_enabled),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "load",
                    error = %err,
                    "ignoring unreadable prewarm state"
                );
                PrewarmJob::new(config.auto_enabled)
            }
        };

        let now = Instant::now();
        let pending = match job.status {
            _ if job.restart_requested && job.auto_enabled => Some(Pending {
                at: now,
                action: PendingAction::Restart,
            }),
            PrewarmStatus::Running => Some(Pending {
                at: now,
                action: PendingAction::Tick,
            }),
            PrewarmStatus::Completed if job.auto_enabled => Some(Pending {
                at: now + config.cooldown,
                action: PendingAction::Restart,
            }),
            _ => None,
        };

        Self {
            config,
            enumerator,
            fetcher,
            state_file,
            state: Mutex::new(SchedulerState {
                job,
                pending,
                generation: 0,
            }),
            tick_lock: Mutex::new(()),
            wake: Notify::new(),
        }
    }

    pub fn config(&self) -> &PrewarmConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> PrewarmSnapshot {
        let state = self.state.lock().await;
        snapshot_of(&state)
    }

    /// Earliest scheduled action, if any.
    pub async fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().await.pending.map(|pending| pending.at)
    }

    /// Resolves when the schedule changed and the driver should re-plan.
    pub fn notified(&self) -> Notified<'_> {
        self.wake.notified()
    }

    /// Enumerate and begin a run. Rejected while a run is in progress.
    pub async fn start(&self) -> Result<PrewarmSnapshot, PrewarmError> {
        let mut state = self.state.lock().await;
        if state.job.is_running() {
            return Err(PrewarmError::AlreadyRunning);
        }

        self.begin_run(&mut state).await;
        Ok(snapshot_of(&state))
    }

    /// Abandon the current run. An in-flight fetch still completes.
    pub async fn stop(&self) -> PrewarmSnapshot {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.job.halt();
        state.pending = None;
        self.persist(&state.job).await;
        self.wake.notify_one();

        info!(target = SOURCE, op = "stop", "prewarm stopped");
        snapshot_of(&state)
    }

    pub async fn set_auto(&self, enabled: bool) -> PrewarmSnapshot {
        let mut state = self.state.lock().await;
        state.job.auto_enabled = enabled;

        let restart_pending = state
            .pending
            .is_some_and(|pending| pending.action == PendingAction::Restart);
        if !enabled && restart_pending {
            state.pending = None;
        }
        if enabled && state.job.status == PrewarmStatus::Completed && state.pending.is_none() {
            state.pending = Some(Pending {
                at: Instant::now() + self.config.cooldown,
                action: PendingAction::Restart,
            });
        }

        self.persist(&state.job).await;
        self.wake.notify_one();

        info!(target = SOURCE, op = "set_auto", enabled, "prewarm auto mode changed");
        snapshot_of(&state)
    }

    /// Process one batch of the running job.
    ///
    /// No-op while idle. A completed job with auto disabled settles to idle.
    pub async fn tick(&self) {
        let _serial = self.tick_lock.lock().await;
        let started = std::time::Instant::now();

        let (batch, generation) = {
            let mut state = self.state.lock().await;
            match state.job.status {
                PrewarmStatus::Idle => return,
                PrewarmStatus::Completed => {
                    if !state.job.auto_enabled {
                        state.job.status = PrewarmStatus::Idle;
                        state.pending = None;
                        self.persist(&state.job).await;
                        debug!(target = SOURCE, op = "tick", "completed job settled to idle");
                    }
                    return;
                }
                PrewarmStatus::Running => {}
            }

            state.pending = None;
            if state.job.queue.is_empty() {
                self.finish(&mut state).await;
                return;
            }

            let batch: Vec<String> = state
                .job
                .queue
                .iter()
                .take(self.config.batch_size.get())
                .cloned()
                .collect();
            (batch, state.generation)
        };

        for (index, path) in batch.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.request_delay).await;
            }
            if !self.still_current(generation).await {
                return;
            }

            self.fetch_one(path).await;

            let mut state = self.state.lock().await;
            if state.generation != generation || !state.job.is_running() {
                debug!(target = SOURCE, op = "tick", "run replaced during fetch");
                return;
            }
            state.job.advance(path);
        }

        let mut state = self.state.lock().await;
        if state.generation != generation || !state.job.is_running() {
            return;
        }

        if state.job.queue.is_empty() {
            self.finish(&mut state).await;
        } else {
            state.pending = Some(Pending {
                at: Instant::now() + self.config.tick_delay,
                action: PendingAction::Tick,
            });
            self.persist(&state.job).await;
        }

        histogram!(METRIC_PREWARM_TICK_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            target = SOURCE,
            op = "tick",
            processed = state.job.processed,
            remaining = state.job.remaining(),
            "prewarm batch finished"
        );
    }

    /// Run the scheduled action if its time has come. Returns whether
    /// anything ran.
    pub async fn run_due(&self) -> bool {
        let action = {
            let mut state = self.state.lock().await;
            match state.pending {
                Some(pending) if pending.at <= Instant::now() => {
                    state.pending = None;
                    pending.action
                }
                _ => return false,
            }
        };

        match action {
            PendingAction::Tick => self.tick().await,
            PendingAction::Restart => self.restart().await,
        }
        true
    }

    /// Periodic wake-up: run due work, otherwise let a finished job settle.
    pub async fn periodic(&self) {
        if self.run_due().await {
            return;
        }

        let settle = {
            let state = self.state.lock().await;
            state.job.status == PrewarmStatus::Completed && !state.job.auto_enabled
        };
        if settle {
            self.tick().await;
        }
    }

    async fn restart(&self) {
        let mut state = self.state.lock().await;
        if !state.job.auto_enabled || (state.job.is_running() && !state.job.restart_requested) {
            return;
        }
        self.begin_run(&mut state).await;
    }

    async fn begin_run(&self, state: &mut SchedulerState) {
        let urls = self.enumerator.enumerate().await;
        state.generation += 1;
        state.job.begin(urls, OffsetDateTime::now_utc());
        state.pending = Some(Pending {
            at: Instant::now(),
            action: PendingAction::Tick,
        });
        self.persist(&state.job).await;
        self.wake.notify_one();

        info!(
            target = SOURCE,
            op = "start",
            total = state.job.total,
            "prewarm run started"
        );
    }

    async fn finish(&self, state: &mut SchedulerState) {
        state.job.complete(OffsetDateTime::now_utc());
        state.pending = state.job.auto_enabled.then(|| Pending {
            at: Instant::now() + self.config.cooldown,
            action: PendingAction::Restart,
        });
        self.persist(&state.job).await;

        info!(
            target = SOURCE,
            op = "finish",
            processed = state.job.processed,
            total = state.job.total,
            "prewarm run completed"
        );
    }

    async fn still_current(&self, generation: u64) -> bool {
        let state = self.state.lock().await;
        state.generation == generation && state.job.is_running()
    }

    async fn fetch_one(&self, path: &str) {
        match self.fetcher.fetch(path).await {
            Ok(status) => {
                counter!(METRIC_PREWARM_FETCH, "outcome" => "ok").increment(1);
                debug!(target = SOURCE, op = "fetch", path, status, "prewarmed url");
            }
            Err(err) => {
                counter!(METRIC_PREWARM_FETCH, "outcome" => err.outcome()).increment(1);
                warn!(
                    target = SOURCE,
                    op = "fetch",
                    path,
                    error = %err,
                    "prewarm fetch failed, moving on"
                );
            }
        }
    }

    async fn persist(&self, job: &PrewarmJob) {
        if let Err(err) = self.state_file.save(job).await {
            warn!(
                target = SOURCE,
                op = "persist",
                error = %err,
                "failed to persist prewarm state"
            );
        }
    }
}

#[async_trait]
impl FlushObserver for PrewarmScheduler {
    /// A flushed cache is cold everywhere; start over when auto is enabled.
    async fn cache_flushed(&self) {
        let mut state = self.state.lock().await;
        if !state.job.auto_enabled {
            debug!(target = SOURCE, op = "cache_flushed", "auto prewarm disabled");
            return;
        }
        self.begin_run(&mut state).await;
    }
}

fn snapshot_of(state: &SchedulerState) -> PrewarmSnapshot {
    let now = Instant::now();
    PrewarmSnapshot {
        status: state.job.status,
        total: state.job.total,
        processed: state.job.processed,
        remaining: state.job.remaining(),
        last_url: state.job.last_url.clone(),
        auto_enabled: state.job.auto_enabled,
        started_at: state.job.started_at,
        finished_at: state.job.finished_at,
        next_action: state.pending.map(|pending| pending.action),
        next_action_in_ms: state.pending.map(|pending| {
            u64::try_from(pending.at.saturating_duration_since(now).as_millis()).unwrap_or(u64::MAX)
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use tempfile::TempDir;
    use url::Url;

    use super::*;
    use crate::application::repos::{
        CatalogRepo, ContentKind, ContentRecord, PublishStatus, RepoError, TermKind, TermRecord,
    };
    use crate::prewarm::fetch::FetchError;

    struct ItemsCatalog {
        items: usize,
    }

    #[async_trait]
    impl CatalogRepo for ItemsCatalog {
        async fn catalog_root(&self) -> Result<Option<String>, RepoError> {
            Ok(None)
        }

        async fn list_content(&self, kind: ContentKind) -> Result<Vec<ContentRecord>, RepoError> {
            if kind != ContentKind::CatalogItem {
                return Ok(Vec::new());
            }
            Ok((0..self.items)
                .map(|index| ContentRecord {
                    id: format!("item-{index}"),
                    permalink: Some(format!("/product/item-{index}/")),
                    status: PublishStatus::Published,
                })
                .collect())
        }

        async fn list_terms(&self, _kind: TermKind) -> Result<Vec<TermRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingFetcher {
        calls: StdMutex<Vec<String>>,
        failing: HashSet<String>,
        /// When set, the persisted `processed` count is recorded before each
        /// fetch.
        state_file: Option<std::path::PathBuf>,
        persisted: StdMutex<Vec<usize>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch(&self, path: &str) -> Result<u16, FetchError> {
            self.calls.lock().unwrap().push(path.to_string());
            if let Some(state_file) = &self.state_file {
                let raw = std::fs::read(state_file).unwrap();
                let job: PrewarmJob = serde_json::from_slice(&raw).unwrap();
                self.persisted.lock().unwrap().push(job.processed);
            }
            if self.failing.contains(path) {
                return Err(FetchError::Status {
                    url: path.to_string(),
                    status: 500,
                });
            }
            Ok(200)
        }
    }

    fn fast_config(batch: usize, auto_enabled: bool) -> PrewarmConfig {
        PrewarmConfig {
            auto_enabled,
            batch_size: std::num::NonZeroUsize::new(batch).unwrap(),
            request_delay: Duration::ZERO,
            tick_delay: Duration::ZERO,
            cooldown: Duration::ZERO,
            cadence: Duration::from_secs(60),
        }
    }

    async fn scheduler_with(
        dir: &TempDir,
        config: PrewarmConfig,
        items: usize,
        fetcher: Arc<RecordingFetcher>,
    ) -> PrewarmScheduler {
        let enumerator = UrlEnumerator::new(
            Arc::new(ItemsCatalog { items }),
            Url::parse("http://shop.test/").unwrap(),
        );
        PrewarmScheduler::load(
            config,
            enumerator,
            fetcher,
            PrewarmStateFile::new(dir.path().join("prewarm.json")),
        )
        .await
    }

    #[tokio::test]
    async fn progress_is_monotonic_until_completion() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let scheduler = scheduler_with(&dir, fast_config(2, false), 4, fetcher.clone()).await;

        let started = scheduler.start().await.unwrap();
        assert_eq!(started.status, PrewarmStatus::Running);
        assert_eq!(started.total, 5);
        assert_eq!(started.next_action, Some(PendingAction::Tick));

        let mut last_processed = 0;
        for expected_delta in [2, 2, 1] {
            scheduler.tick().await;
            let snapshot = scheduler.snapshot().await;
            assert_eq!(snapshot.processed - last_processed, expected_delta);
            assert_eq!(snapshot.processed + snapshot.remaining, snapshot.total);
            last_processed = snapshot.processed;
        }

        let finished = scheduler.snapshot().await;
        assert_eq!(finished.status, PrewarmStatus::Completed);
        assert_eq!(finished.processed, 5);
        assert_eq!(finished.last_url.as_deref(), Some("/product/item-3/"));
        assert!(finished.finished_at.is_some());
        assert_eq!(finished.next_action, None);

        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(calls[0], "/");
        assert_eq!(calls.len(), 5);

        scheduler.tick().await;
        assert_eq!(scheduler.snapshot().await.status, PrewarmStatus::Idle);
    }

    #[tokio::test]
    async fn state_is_persisted_once_per_batch() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher {
            state_file: Some(dir.path().join("prewarm.json")),
            ..Default::default()
        });
        let scheduler = scheduler_with(&dir, fast_config(3, false), 5, fetcher.clone()).await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;
        scheduler.tick().await;

        let persisted = fetcher.persisted.lock().unwrap().clone();
        assert_eq!(persisted, vec![0, 0, 0, 3, 3, 3]);

        let stored = PrewarmStateFile::new(dir.path().join("prewarm.json"))
            .load()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PrewarmStatus::Completed);
        assert_eq!(stored.processed, 6);
    }

    #[tokio::test]
    async fn draining_batch_completes_in_same_tick() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let scheduler = scheduler_with(&dir, fast_config(5, false), 2, fetcher).await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;

        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.status, PrewarmStatus::Completed);
        assert_eq!(snapshot.processed, 3);
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let dir = TempDir::new().unwrap();
        let scheduler =
            scheduler_with(&dir, fast_config(1, false), 3, Arc::new(RecordingFetcher::default()))
                .await;

        scheduler.start().await.unwrap();
        assert!(matches!(
            scheduler.start().await,
            Err(PrewarmError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn failed_fetches_are_not_requeued() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher {
            failing: HashSet::from(["/product/item-0/".to_string()]),
            ..Default::default()
        });
        let scheduler = scheduler_with(&dir, fast_config(5, false), 2, fetcher.clone()).await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;

        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.status, PrewarmStatus::Completed);
        assert_eq!(snapshot.processed, 3);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stop_clears_queue_and_keeps_auto() {
        let dir = TempDir::new().unwrap();
        let scheduler =
            scheduler_with(&dir, fast_config(1, true), 3, Arc::new(RecordingFetcher::default()))
                .await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;
        let stopped = scheduler.stop().await;

        assert_eq!(stopped.status, PrewarmStatus::Idle);
        assert_eq!(stopped.remaining, 0);
        assert!(stopped.auto_enabled);
        assert_eq!(stopped.next_action, None);

        scheduler.tick().await;
        assert_eq!(scheduler.snapshot().await.processed, 1);
    }

    #[tokio::test]
    async fn persisted_running_job_resumes_with_immediate_tick() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        {
            let scheduler = scheduler_with(&dir, fast_config(2, false), 4, fetcher.clone()).await;
            scheduler.start().await.unwrap();
            scheduler.tick().await;
        }

        let resumed = scheduler_with(&dir, fast_config(2, false), 4, fetcher.clone()).await;
        let snapshot = resumed.snapshot().await;
        assert_eq!(snapshot.status, PrewarmStatus::Running);
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.remaining, 3);
        assert_eq!(snapshot.next_action, Some(PendingAction::Tick));

        assert!(resumed.run_due().await);
        let snapshot = resumed.snapshot().await;
        assert_eq!(snapshot.processed, 4);

        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], "/product/item-1/", "resumes at the persisted front");
    }

    #[tokio::test]
    async fn state_file_seeds_auto_only_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        {
            let scheduler = scheduler_with(&dir, fast_config(2, true), 1, fetcher.clone()).await;
            assert!(scheduler.snapshot().await.auto_enabled);
            scheduler.set_auto(false).await;
        }

        let reloaded = scheduler_with(&dir, fast_config(2, true), 1, fetcher).await;
        assert!(!reloaded.snapshot().await.auto_enabled);
    }

    #[tokio::test]
    async fn auto_mode_restarts_after_cooldown() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        let scheduler = scheduler_with(&dir, fast_config(5, true), 1, fetcher.clone()).await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;
        let completed = scheduler.snapshot().await;
        assert_eq!(completed.status, PrewarmStatus::Completed);
        assert_eq!(completed.next_action, Some(PendingAction::Restart));

        assert!(scheduler.run_due().await);
        let restarted = scheduler.snapshot().await;
        assert_eq!(restarted.status, PrewarmStatus::Running);
        assert_eq!(restarted.processed, 0);

        scheduler.periodic().await;
        assert_eq!(fetcher.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn disabling_auto_cancels_pending_restart() {
        let dir = TempDir::new().unwrap();
        let scheduler =
            scheduler_with(&dir, fast_config(5, true), 1, Arc::new(RecordingFetcher::default()))
                .await;

        scheduler.start().await.unwrap();
        scheduler.tick().await;
        let snapshot = scheduler.set_auto(false).await;
        assert_eq!(snapshot.next_action, None);

        scheduler.periodic().await;
        assert_eq!(scheduler.snapshot().await.status, PrewarmStatus::Idle);
    }

    #[tokio::test]
    async fn requested_restart_runs_on_load() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(RecordingFetcher::default());
        {
            let scheduler = scheduler_with(&dir, fast_config(1, true), 2, fetcher.clone()).await;
            scheduler.start().await.unwrap();
            scheduler.tick().await;
        }

        let state_file = PrewarmStateFile::new(dir.path().join("prewarm.json"));
        assert!(state_file.request_restart(false).await.unwrap());

        let reloaded = scheduler_with(&dir, fast_config(1, true), 2, fetcher).await;
        let snapshot = reloaded.snapshot().await;
        assert_eq!(snapshot.status, PrewarmStatus::Running);
        assert_eq!(snapshot.next_action, Some(PendingAction::Restart));

        assert!(reloaded.run_due().await);
        let restarted = reloaded.snapshot().await;
        assert_eq!(restarted.status, PrewarmStatus::Running);
        assert_eq!(restarted.processed, 0);
        assert_eq!(restarted.remaining, 3);

        let stored = state_file.load().await.unwrap().unwrap();
        assert!(!stored.restart_requested);
    }

    #[tokio::test]
    async fn flush_starts_run_only_with_auto() {
        let dir = TempDir::new().unwrap();
        let scheduler =
            scheduler_with(&dir, fast_config(5, false), 2, Arc::new(RecordingFetcher::default()))
                .await;

        scheduler.cache_flushed().await;
        assert_eq!(scheduler.snapshot().await.status, PrewarmStatus::Idle);

        scheduler.set_auto(true).await;
        scheduler.cache_flushed().await;
        let snapshot = scheduler.snapshot().await;
        assert_eq!(snapshot.status, PrewarmStatus::Running);
        assert_eq!(snapshot.total, 3);
    }
}
