//! Clock-driven election transitions
//!
//! Elections are operator-driven by default. When `auto_transition` is
//! enabled, [`ScheduleService`] periodically moves each election one step
//! forward once its nominal window says it should: `upcoming → active` at
//! `start_time`, `active → completed` at `end_time`.

use crate::config::LifecycleConfig;
use crate::lifecycle::LifecycleManager;
use crate::store::RecordStore;
use crate::types::{Election, ElectionStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The single step an election is due for at `now`, if any
pub fn due_transition(election: &Election, now: DateTime<Utc>) -> Option<ElectionStatus> {
    match election.status {
        ElectionStatus::Upcoming if now >= election.start_time => Some(ElectionStatus::Active),
        ElectionStatus::Active if now >= election.end_time => Some(ElectionStatus::Completed),
        _ => None,
    }
}

/// Background service for automatic transitions
pub struct ScheduleService {
    lifecycle: LifecycleManager,
    config: LifecycleConfig,
    stop_signal: tokio::sync::mpsc::Receiver<()>,
}

impl ScheduleService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        config: LifecycleConfig,
        stop_signal: tokio::sync::mpsc::Receiver<()>,
    ) -> Self {
        Self {
            lifecycle: LifecycleManager::new(store, config.clone()),
            config,
            stop_signal,
        }
    }

    /// Advance every election that is due at `now`, one step each
    ///
    /// An election that an admin moved in the meantime is skipped.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<Election>> {
        let mut advanced = Vec::new();

        for election in self.lifecycle.list(None)? {
            let Some(next) = due_transition(&election, now) else {
                continue;
            };

            match self.lifecycle.transition(election.id, next) {
                Ok(updated) => advanced.push(updated),
                Err(Error::InvalidTransition { from, .. }) => {
                    tracing::debug!(
                        "⏭️ Election {} already moved to {}, skipping scheduled step",
                        election.id,
                        from
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(advanced)
    }

    /// Start the background schedule loop
    pub async fn run(mut self) {
        if !self.config.auto_transition {
            tracing::info!("🕰️ Automatic transitions disabled; elections are operator-driven");
            return;
        }

        let check_interval = self.config.schedule_check_interval_seconds;
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(check_interval));

        tracing::info!(
            "🕰️ Election schedule service started (check interval: {}s)",
            check_interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep(Utc::now()) {
                        Ok(advanced) if !advanced.is_empty() => {
                            tracing::info!("🔄 Scheduled sweep advanced {} election(s)", advanced.len());
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("❌ Scheduled sweep failed: {}", e),
                    }
                }
                _ = self.stop_signal.recv() => {
                    tracing::info!("🛑 Election schedule service stopping");
                    break;
                }
            }
        }

        tracing::info!("✅ Election schedule service stopped");
    }
}
