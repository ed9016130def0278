//! Reminder delivery
//!
//! The sweeper drains due reminders from the store and then delivers them as
//! direct messages. A reminder is removed before delivery is attempted, so a
//! failed delivery loses it; the loss is logged and counted.

use crate::REMINDER_TARGET;
use crate::store::{Database, ScheduledTask, StoreResult};
use async_trait::async_trait;
use serenity::all::{Http, UserId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Text of the direct message carrying a reminder
#[must_use]
pub fn format_reminder(payload: &str) -> String {
    format!("⏰ Reminder: {payload}")
}

/// Current time in unix epoch seconds
#[must_use]
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(u64),
}

impl From<serenity::Error> for DeliveryError {
    fn from(err: serenity::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}

/// Sends a direct message to a user
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn direct_message(&self, user_id: u64, content: &str) -> Result<(), DeliveryError>;
}

/// Delivers through the Discord HTTP client
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    #[must_use]
    pub const fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn direct_message(&self, user_id: u64, content: &str) -> Result<(), DeliveryError> {
        if user_id == 0 {
            return Err(DeliveryError::InvalidRecipient(user_id));
        }
        let channel = UserId::new(user_id).create_dm_channel(&*self.http).await?;
        channel.say(&*self.http, content).await?;
        Ok(())
    }
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub delivered: usize,
    pub lost: usize,
}

/// Requests accepted by a running sweeper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepRequest {
    /// Sweep immediately instead of waiting for the next tick
    SweepNow,
    Shutdown,
}

#[derive(Clone)]
pub struct ReminderSweeper {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl ReminderSweeper {
    #[must_use]
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Drain every reminder due at `now` and deliver it
    ///
    /// # Errors
    /// Returns an error if the store is unavailable; nothing is drained then.
    pub async fn sweep(&self, now: i64) -> StoreResult<SweepReport> {
        let due = self.db.drain_due(now).await?;
        let mut report = SweepReport::default();

        for task in due {
            if self.deliver(&task).await {
                report.delivered += 1;
            } else {
                report.lost += 1;
            }
        }

        if report.delivered + report.lost > 0 {
            info!(
                target: REMINDER_TARGET,
                delivered = report.delivered,
                lost = report.lost,
                "Reminder sweep finished"
            );
        }
        Ok(report)
    }

    async fn deliver(&self, task: &ScheduledTask) -> bool {
        match self
            .notifier
            .direct_message(task.owner_id, &format_reminder(&task.payload))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    target: REMINDER_TARGET,
                    task_id = task.id,
                    owner_id = task.owner_id,
                    due = task.due,
                    error = %e,
                    "Reminder lost: delivery failed after removal"
                );
                false
            }
        }
    }

    /// Run the sweeper in the background, sweeping every `interval`
    ///
    /// The first sweep happens immediately.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> SweeperHandle {
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(async move {
            self.run(rx, interval).await;
        });
        SweeperHandle { tx, task }
    }

    async fn run(self, mut rx: Receiver<SweepRequest>, period: Duration) {
        info!(
            target: REMINDER_TARGET,
            interval_secs = period.as_secs(),
            "Starting reminder sweeper"
        );

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                request = rx.recv() => match request {
                    Some(SweepRequest::SweepNow) => self.sweep_logged().await,
                    Some(SweepRequest::Shutdown) | None => {
                        info!(target: REMINDER_TARGET, "Received shutdown request for reminder sweeper");
                        break;
                    }
                },
                _ = interval.tick() => self.sweep_logged().await,
            }
        }

        info!(target: REMINDER_TARGET, "Reminder sweeper shut down");
    }

    async fn sweep_logged(&self) {
        if let Err(e) = self.sweep(now_unix()).await {
            error!(target: REMINDER_TARGET, error = %e, "Reminder sweep failed");
        }
    }
}

/// Control handle for a spawned sweeper
pub struct SweeperHandle {
    tx: Sender<SweepRequest>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Ask for an immediate sweep. Returns false if the sweeper has stopped.
    pub async fn sweep_now(&self) -> bool {
        self.tx.send(SweepRequest::SweepNow).await.is_ok()
    }

    /// Stop the sweeper and wait for it to finish its current sweep
    pub async fn shutdown(self) {
        let _ = self.tx.send(SweepRequest::Shutdown).await;
        if let Err(e) = self.task.await {
            error!(target: REMINDER_TARGET, error = %e, "Reminder sweeper task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{always, eq};
    use std::sync::Mutex;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_format_reminder() {
        assert_eq!(format_reminder("stretch"), "⏰ Reminder: stretch");
    }

    #[tokio::test]
    async fn test_sweep_delivers_due_reminders() {
        let db = db();
        db.schedule_reminder(42, 100, "first").await.unwrap();
        db.schedule_reminder(42, 500, "later").await.unwrap();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_direct_message()
            .with(eq(42), eq("⏰ Reminder: first"))
            .times(1)
            .returning(|_, _| Ok(()));

        let sweeper = ReminderSweeper::new(db.clone(), Arc::new(notifier));
        let report = sweeper.sweep(200).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                delivered: 1,
                lost: 0
            }
        );
        assert_eq!(db.pending_reminders(42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_not_retried() {
        let db = db();
        db.schedule_reminder(0, 10, "unreachable").await.unwrap();
        db.schedule_reminder(7, 10, "ok").await.unwrap();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_direct_message()
            .with(eq(0), always())
            .times(1)
            .returning(|user_id, _| Err(DeliveryError::InvalidRecipient(user_id)));
        notifier
            .expect_direct_message()
            .with(eq(7), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let sweeper = ReminderSweeper::new(db, Arc::new(notifier));
        let report = sweeper.sweep(10).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                delivered: 1,
                lost: 1
            }
        );

        // Both were removed; a second sweep delivers nothing
        let report = sweeper.sweep(10).await.unwrap();
        assert_eq!(report, SweepReport::default());
    }

    /// Notifier that touches the store while delivering
    struct StoreTouchingNotifier {
        db: Database,
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Notifier for StoreTouchingNotifier {
        async fn direct_message(&self, user_id: u64, _content: &str) -> Result<(), DeliveryError> {
            self.db.get_config(user_id).await.map_err(|_| DeliveryError::InvalidRecipient(user_id))?;
            self.seen.lock().unwrap().push(user_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_delivery_runs_outside_the_gate() {
        let db = db();
        db.schedule_reminder(1, 1, "a").await.unwrap();
        db.schedule_reminder(2, 2, "b").await.unwrap();

        let notifier = Arc::new(StoreTouchingNotifier {
            db: db.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let sweeper = ReminderSweeper::new(db, notifier.clone());

        let report = tokio::time::timeout(Duration::from_secs(5), sweeper.sweep(5))
            .await
            .expect("sweep deadlocked on the store")
            .unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(*notifier.seen.lock().unwrap(), vec![1, 2]);
    }

    /// Notifier that forwards each delivery to a channel
    struct ChannelNotifier(mpsc::UnboundedSender<(u64, String)>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn direct_message(&self, user_id: u64, content: &str) -> Result<(), DeliveryError> {
            let _ = self.0.send((user_id, content.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_spawned_sweeper_delivers_and_shuts_down() {
        let db = db();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ReminderSweeper::new(db.clone(), Arc::new(ChannelNotifier(tx)))
            .spawn(Duration::from_secs(3600));

        db.schedule_reminder(9, 0, "past due").await.unwrap();
        assert!(handle.sweep_now().await);

        let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("reminder was not delivered")
            .unwrap();
        assert_eq!(delivered, (9, "⏰ Reminder: past due".to_string()));

        handle.shutdown().await;
        assert!(db.pending_reminders(9).await.unwrap().is_empty());
    }
}
