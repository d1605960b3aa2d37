use async_trait::async_trait;

/// Result of a delivery attempt. Transport failures come back as a value, not
/// a panic, so the worker can reconcile status and let the queue decide on a
/// retry.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub message: String,
}

impl DeliveryOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            message: "delivered".to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str) -> DeliveryOutcome;
}

/// Local-dev sender: logs the notification and reports success. Real
/// transports (SMTP, provider APIs) implement the same trait and are wired in
/// by the embedding application.
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, recipient: &str, subject: &str) -> DeliveryOutcome {
        log::info!(
            "Delivering reminder notification. [recipient = {}, subject = {}]",
            recipient,
            subject
        );

        DeliveryOutcome::delivered()
    }
}
