//! Error types for notification delivery.

/// Errors a [`Notifier`](crate::Notifier) may report.
///
/// These never propagate past [`dispatch`](crate::dispatch()); they are
/// logged per recipient.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The transport refused or failed to deliver to this user.
    #[error("delivery to {telegram_id} failed: {reason}")]
    Delivery {
        /// Intended recipient.
        telegram_id: i64,
        /// Transport-specific description.
        reason: String,
    },
}
