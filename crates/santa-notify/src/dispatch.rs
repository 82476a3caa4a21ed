//! Concurrent, fire-and-forget notice delivery.
//!
//! [`dispatch`] spawns one task per notice and returns immediately. A
//! failing delivery is logged with `warn!` and does not affect the other
//! recipients or the caller. Callers that want to wait (tests, the admin
//! CLI before exiting) can await the returned [`Dispatch`]; dropping it
//! detaches the tasks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::event::{GameEvent, Notice};

/// Delivers a single event to a single user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `event` to the user `telegram_id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the transport could not deliver it.
    async fn notify(&self, telegram_id: i64, event: &GameEvent) -> Result<(), NotifyError>;
}

/// Notifier that only writes notices to the log.
///
/// Used when no chat transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, telegram_id: i64, event: &GameEvent) -> Result<(), NotifyError> {
        info!(telegram_id, notice = %event, "game notice");
        Ok(())
    }
}

/// Outcome counts of an awaited [`Dispatch`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Notices the transport accepted.
    pub delivered: usize,
    /// Notices that failed or whose task did not finish.
    pub failed: usize,
}

/// Handles of the delivery tasks started by [`dispatch`].
#[derive(Debug)]
#[must_use = "dropping a Dispatch detaches its tasks; await `wait` to observe them"]
pub struct Dispatch {
    handles: Vec<JoinHandle<bool>>,
}

impl Dispatch {
    /// Number of delivery tasks started.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no task was started.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every delivery task and count the outcomes.
    pub async fn wait(self) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for handle in self.handles {
            match handle.await {
                Ok(true) => summary.delivered = summary.delivered.saturating_add(1),
                Ok(false) => summary.failed = summary.failed.saturating_add(1),
                Err(e) => {
                    warn!(error = %e, "notice task did not complete");
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }
        summary
    }
}

/// Deliver every notice on its own task.
///
/// Must be called from within a Tokio runtime.
pub fn dispatch(notifier: Arc<dyn Notifier>, notices: Vec<Notice>) -> Dispatch {
    let handles = notices
        .into_iter()
        .map(|notice| {
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move {
                match notifier.notify(notice.telegram_id, &notice.event).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            telegram_id = notice.telegram_id,
                            error = %e,
                            "failed to deliver game notice"
                        );
                        false
                    }
                }
            })
        })
        .collect();

    Dispatch { handles }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use super::*;

    /// Records deliveries and refuses the ids in `refuse`.
    #[derive(Default)]
    struct RecordingNotifier {
        refuse: BTreeSet<i64>,
        delivered: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, telegram_id: i64, _event: &GameEvent) -> Result<(), NotifyError> {
            if self.refuse.contains(&telegram_id) {
                return Err(NotifyError::Delivery {
                    telegram_id,
                    reason: "bot was blocked by the user".to_owned(),
                });
            }
            if let Ok(mut delivered) = self.delivered.lock() {
                delivered.push(telegram_id);
            }
            Ok(())
        }
    }

    fn notices(ids: &[i64]) -> Vec<Notice> {
        ids.iter()
            .map(|&telegram_id| Notice {
                telegram_id,
                event: GameEvent::DescriptionChanged {
                    title: "Office Party".to_owned(),
                    description: "Bring cookies".to_owned(),
                },
            })
            .collect()
    }

    #[tokio::test]
    async fn delivers_to_every_recipient() {
        let notifier = Arc::new(RecordingNotifier::default());
        let summary = dispatch(notifier.clone(), notices(&[1, 2, 3])).wait().await;

        assert_eq!(summary, DispatchSummary { delivered: 3, failed: 0 });
        let delivered: BTreeSet<i64> = notifier
            .delivered
            .lock()
            .map(|d| d.iter().copied().collect())
            .unwrap_or_default();
        assert_eq!(delivered, BTreeSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let notifier = Arc::new(RecordingNotifier {
            refuse: BTreeSet::from([2]),
            ..RecordingNotifier::default()
        });
        let summary = dispatch(notifier.clone(), notices(&[1, 2, 3])).wait().await;

        assert_eq!(summary, DispatchSummary { delivered: 2, failed: 1 });
        let delivered: BTreeSet<i64> = notifier
            .delivered
            .lock()
            .map(|d| d.iter().copied().collect())
            .unwrap_or_default();
        assert_eq!(delivered, BTreeSet::from([1, 3]));
    }

    #[tokio::test]
    async fn nothing_to_send_spawns_nothing() {
        let running = dispatch(Arc::new(LogNotifier), Vec::new());
        assert!(running.is_empty());
        assert_eq!(running.wait().await, DispatchSummary::default());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let running = dispatch(Arc::new(LogNotifier), notices(&[7, 8]));
        assert_eq!(running.len(), 2);
        assert_eq!(running.wait().await.delivered, 2);
    }
}
