use chrono::Utc;

use crate::dispatch::compute_fire_at;
use crate::queue::{JobQueue, QueueError};
use crate::storage::ReminderStorage;

/// Startup reconciliation: every reminder still `PENDING` must have a live
/// delivery job. Rebuilds jobs lost with broker state; a reminder whose send
/// window elapsed while the process was down fires immediately, late.
pub async fn reschedule_pending<S: ReminderStorage>(
    reminders: &S,
    queue: &dyn JobQueue,
) -> anyhow::Result<usize> {
    let pending = reminders.list_pending().await?;

    let mut restored = 0;
    for reminder in pending {
        if queue.is_scheduled(reminder.id).await? {
            continue;
        }

        let fire_at = compute_fire_at(reminder.time).max(Utc::now());
        match queue.enqueue(reminder.id, fire_at).await {
            Ok(_) => {
                log::info!(
                    "Restored delivery job for pending reminder. [reminder_id = {}, fire_at = {}]",
                    reminder.id,
                    fire_at
                );
                restored += 1;
            }
            Err(QueueError::AlreadyScheduled(_)) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(restored)
}
