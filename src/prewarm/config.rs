//! Prewarm scheduling configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
const DEFAULT_TICK_DELAY_SECS: u64 = 5;
const DEFAULT_COOLDOWN_SECS: u64 = 3600;
const DEFAULT_CADENCE_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct PrewarmConfig {
    /// Seed for the persisted auto flag when no state file exists yet.
    pub auto_enabled: bool,
    /// URLs fetched per tick.
    pub batch_size: NonZeroUsize,
    /// Pause between two fetches of the same batch.
    pub request_delay: Duration,
    /// Pause between two ticks of a running job.
    pub tick_delay: Duration,
    /// Wait after completion before an automatic restart.
    pub cooldown: Duration,
    /// Periodic wake-up of the driver when nothing is scheduled.
    pub cadence: Duration,
}

impl Default for PrewarmConfig {
    fn default() -> Self {
        Self {
            auto_enabled: false,
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            tick_delay: Duration::from_secs(DEFAULT_TICK_DELAY_SECS),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            cadence: Duration::from_secs(DEFAULT_CADENCE_SECS),
        }
    }
}

impl From<&crate::config::PrewarmSettings> for PrewarmConfig {
    fn from(settings: &crate::config::PrewarmSettings) -> Self {
        Self {
            auto_enabled: settings.auto_enabled,
            batch_size: settings.batch_size,
            request_delay: settings.request_delay,
            tick_delay: settings.tick_delay,
            cooldown: settings.cooldown,
            cadence: settings.cadence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PrewarmConfig::default();
        assert_eq!(config.batch_size.get(), 5);
        assert_eq!(config.request_delay, Duration::from_millis(500));
        assert_eq!(config.tick_delay, Duration::from_secs(5));
        assert_eq!(config.cadence, Duration::from_secs(60));
        assert!(!config.auto_enabled);
    }
}
