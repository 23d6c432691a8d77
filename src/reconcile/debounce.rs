//! Per-item quantity edit session.
//!
//! Local edits are cheap and immediate; the outbound update only goes out
//! once the item has been quiet for the whole window. Each edit restarts the
//! timer, so a burst of edits produces a single `QuantityUpdate` carrying the
//! last value.

use std::time::Duration;

use time::Date;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct QuantityUpdate {
    pub id: Uuid,
    pub date: Date,
    pub quantity: f64,
}

pub struct QuantityEditSession {
    id: Uuid,
    date: Date,
    quiet: Duration,
    tx: UnboundedSender<QuantityUpdate>,
    timer: Option<JoinHandle<()>>,
}

impl QuantityEditSession {
    pub fn new(id: Uuid, date: Date, tx: UnboundedSender<QuantityUpdate>) -> Self {
        Self::with_quiet_period(id, date, DEFAULT_QUIET_PERIOD, tx)
    }

    pub fn with_quiet_period(
        id: Uuid,
        date: Date,
        quiet: Duration,
        tx: UnboundedSender<QuantityUpdate>,
    ) -> Self {
        Self {
            id,
            date,
            quiet,
            tx,
            timer: None,
        }
    }

    pub fn item_id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> Date {
        self.date
    }

    /// Restarts the quiet window with `quantity` as the value to send.
    ///
    /// Must be called from within a tokio runtime.
    pub fn edit(&mut self, quantity: f64) {
        self.cancel();

        let tx = self.tx.clone();
        let quiet = self.quiet;
        let update = QuantityUpdate {
            id: self.id,
            date: self.date,
            quantity,
        };
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            debug!(id = %update.id, quantity = update.quantity, "quantity edit settled");
            if tx.send(update).is_err() {
                debug!("quantity update dropped, receiver closed");
            }
        }));
    }

    /// True while an update is scheduled but not yet sent.
    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for QuantityEditSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
