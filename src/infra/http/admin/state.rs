use std::sync::Arc;

use crate::cache::{CacheConfig, CacheTrigger};
use crate::prewarm::PrewarmScheduler;

#[derive(Clone)]
pub struct AdminState {
    pub cache: CacheConfig,
    pub trigger: CacheTrigger,
    pub prewarm: Arc<PrewarmScheduler>,
}
