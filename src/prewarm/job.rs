//! Durable prewarm job state.
//!
//! A single JSON document holding the remaining queue and progress counters.
//! It is rewritten atomically after every state change and once per batch,
//! so a restart resumes at the front of the last unfinished batch.

use std::collections::VecDeque;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::PrewarmError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrewarmStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

impl PrewarmStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrewarmJob {
    pub status: PrewarmStatus,
    /// Remaining URL paths, consumed from the front.
    #[serde(default)]
    pub queue: VecDeque<String>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub processed: usize,
    #[serde(default)]
    pub last_url: Option<String>,
    pub auto_enabled: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
    /// Set when the cache was flushed while no scheduler was listening; the
    /// next process to load the job starts a fresh run.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub restart_requested: bool,
}

impl PrewarmJob {
    pub fn new(auto_enabled: bool) -> Self {
        Self {
            status: PrewarmStatus::Idle,
            queue: VecDeque::new(),
            total: 0,
            processed: 0,
            last_url: None,
            auto_enabled,
            started_at: None,
            finished_at: None,
            restart_requested: false,
        }
    }

    /// Replace the queue and reset counters for a fresh run.
    pub fn begin(&mut self, urls: Vec<String>, now: OffsetDateTime) {
        self.total = urls.len();
        self.queue = urls.into();
        self.processed = 0;
        self.last_url = None;
        self.status = PrewarmStatus::Running;
        self.started_at = Some(now);
        self.finished_at = None;
        self.restart_requested = false;
    }

    /// Drop `url` from the front of the queue and count it.
    pub fn advance(&mut self, url: &str) {
        if self.queue.front().is_some_and(|front| front == url) {
            self.queue.pop_front();
        }
        self.processed += 1;
        self.last_url = Some(url.to_string());
    }

    pub fn complete(&mut self, now: OffsetDateTime) {
        self.status = PrewarmStatus::Completed;
        self.finished_at = Some(now);
    }

    /// Abandon any run. `auto_enabled` is left untouched.
    pub fn halt(&mut self) {
        self.queue.clear();
        self.status = PrewarmStatus::Idle;
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.status == PrewarmStatus::Running
    }
}

/// Location of the persisted job document.
#[derive(Debug, Clone)]
pub struct PrewarmStateFile {
    path: PathBuf,
}

impl PrewarmStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that the cache was flushed out of process. Only jobs with auto
    /// mode enabled are marked; returns whether a restart was requested.
    ///
    /// `auto_default` seeds the job when no state was saved yet.
    pub async fn request_restart(&self, auto_default: bool) -> Result<bool, PrewarmError> {
        let mut job = self
            .load()
            .await?
            .unwrap_or_else(|| PrewarmJob::new(auto_default));
        if !job.auto_enabled {
            return Ok(false);
        }

        job.restart_requested = true;
        self.save(&job).await?;
        Ok(true)
    }

    /// Read the persisted job, `None` when nothing was saved yet.
    pub async fn load(&self) -> Result<Option<PrewarmJob>, PrewarmError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PrewarmError::Load {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| PrewarmError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Atomically replace the persisted job.
    pub async fn save(&self, job: &PrewarmJob) -> Result<(), PrewarmError> {
        let contents = serde_json::to_vec_pretty(job).map_err(|source| PrewarmError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|err| PrewarmError::Task(err.to_string()))?
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), PrewarmError> {
    let persist_err = |source: std::io::Error| PrewarmError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(persist_err)?;

    let mut file = tempfile::Builder::new()
        .prefix(".prewarm-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(persist_err)?;
    file.write_all(contents).map_err(persist_err)?;
    file.flush().map_err(persist_err)?;
    file.persist(path).map_err(|err| persist_err(err.error))?;

    Ok(())
}
