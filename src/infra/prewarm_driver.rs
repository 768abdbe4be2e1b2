//! Background task that wakes the prewarm scheduler.
//!
//! Sleeps until the scheduler's next deadline, capped at the configured
//! cadence, or until an admin action wakes it early.

use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::debug;

use crate::prewarm::PrewarmScheduler;

const SOURCE: &str = "infra::prewarm_driver";

pub fn spawn(scheduler: Arc<PrewarmScheduler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let cadence = scheduler.config().cadence;
        loop {
            let fallback = Instant::now() + cadence;
            let wake_at = match scheduler.next_deadline().await {
                Some(deadline) => deadline.min(fallback),
                None => fallback,
            };

            tokio::select! {
                _ = sleep_until(wake_at) => {}
                _ = scheduler.notified() => {
                    debug!(target = SOURCE, op = "wake", "prewarm scheduler notified");
                }
            }

            scheduler.periodic().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::{
        application::repos::{
            CatalogRepo, ContentKind, ContentRecord, RepoError, TermKind, TermRecord,
        },
        prewarm::{
            FetchError, PageFetcher, PrewarmConfig, PrewarmStateFile, PrewarmStatus,
            UrlEnumerator,
        },
    };

    struct HomeOnly;

    #[async_trait]
    impl CatalogRepo for HomeOnly {
        async fn catalog_root(&self) -> Result<Option<String>, RepoError> {
            Ok(Some("/shop/".to_string()))
        }

        async fn list_content(&self, _: ContentKind) -> Result<Vec<ContentRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_terms(&self, _: TermKind) -> Result<Vec<TermRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    struct Accepting;

    #[async_trait]
    impl PageFetcher for Accepting {
        async fn fetch(&self, _: &str) -> Result<u16, FetchError> {
            Ok(200)
        }
    }

    #[tokio::test]
    async fn started_run_is_driven_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrewarmConfig {
            request_delay: Duration::ZERO,
            tick_delay: Duration::from_millis(10),
            cadence: Duration::from_millis(50),
            ..Default::default()
        };
        let scheduler = Arc::new(
            PrewarmScheduler::load(
                config,
                UrlEnumerator::new(Arc::new(HomeOnly), Url::parse("http://shop.test/").unwrap()),
                Arc::new(Accepting),
                PrewarmStateFile::new(dir.path().join("state.json")),
            )
            .await,
        );

        let handle = spawn(scheduler.clone());
        scheduler.start().await.unwrap();

        let mut status = PrewarmStatus::Running;
        for _ in 0..100 {
            status = scheduler.snapshot().await.status;
            if status != PrewarmStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_ne!(status, PrewarmStatus::Running);
        assert_eq!(scheduler.snapshot().await.processed, 2);
    }
}
