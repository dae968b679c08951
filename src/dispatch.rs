//! Due-reminder scan and notification dispatch.
//!
//! One fixed-interval background loop scans every unsent reminder,
//! formats a message for each one whose notify window has opened, hands
//! it to the configured transports, and stamps the reminder sent with
//! the tick's timestamp, regardless of delivery outcome. Delivery is
//! fire-and-forget with at most one dispatch attempt per reminder.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::store::Store;
use crate::timeutil::{resolve_tz, utc_to_local, DISPLAY_FORMAT};
use crate::traits::{EmailSender, SmsSender};
use crate::types::{Profile, Reminder};

pub struct DispatchManager {
    store: Store,
    email: Option<Arc<dyn EmailSender>>,
    sms: Option<Arc<dyn SmsSender>>,
    clock: Arc<dyn Clock>,
    default_tz: Tz,
    tick_interval: Duration,
}

impl DispatchManager {
    pub fn new(
        store: Store,
        email: Option<Arc<dyn EmailSender>>,
        sms: Option<Arc<dyn SmsSender>>,
        clock: Arc<dyn Clock>,
        default_tz: Tz,
        tick_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            email,
            sms,
            clock,
            default_tz,
            tick_interval: Duration::from_secs(tick_interval_secs),
        }
    }

    /// Spawn the dispatch loop as a background task. Tick failures are
    /// isolated: one bad tick never stops future ticks.
    pub fn spawn(self: Arc<Self>) {
        let interval_secs = self.tick_interval.as_secs();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(self.tick_interval).await;
                let now = self.clock.now();
                if let Err(e) = self.tick(now).await {
                    error!("Dispatch tick error: {}", e);
                }
            }
        });

        info!(interval_secs, "Reminder dispatch loop spawned");
    }

    /// One full due-reminder scan at instant `now`.
    pub async fn tick(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let pending = self.store.unsent_reminders().await?;

        for reminder in pending {
            if !reminder.is_due(now) {
                continue;
            }
            if let Err(e) = self.dispatch(&reminder, now).await {
                // The reminder stays unsent and the next tick retries the
                // scan; only store failures land here, transport failures
                // do not.
                error!(id = %reminder.id, "Failed to dispatch reminder: {}", e);
            }
        }

        Ok(())
    }

    async fn dispatch(&self, reminder: &Reminder, now: DateTime<Utc>) -> anyhow::Result<()> {
        let user = self.store.get_user(&reminder.user_id).await?;
        let profile = self.store.get_profile(&reminder.user_id).await?;

        let tz = profile
            .as_ref()
            .map(|p| resolve_tz(&p.tz, self.default_tz))
            .unwrap_or(self.default_tz);
        let local_due = utc_to_local(reminder.due_at, tz);

        let subject = format!("Vital Guard Reminder: {}", reminder.title);
        let body = format_email_body(reminder, &local_due.format(DISPLAY_FORMAT).to_string());

        let email_enabled = profile.as_ref().map(|p| p.notify_email).unwrap_or(true);
        if email_enabled {
            match (&self.email, &user) {
                (Some(email), Some(user)) => {
                    let delivered = email.send_email(&user.email, &subject, &body).await;
                    if !delivered {
                        warn!(id = %reminder.id, "Email dispatch attempt failed");
                    }
                }
                (None, _) => warn!(id = %reminder.id, "Email transport not configured"),
                (_, None) => warn!(id = %reminder.id, "Reminder owner no longer exists"),
            }
        }

        if let Some(p) = profile.as_ref().filter(|p| p.notify_sms && !p.phone.is_empty()) {
            let sms_body = format_sms_body(reminder, &local_due.format("%b %d %H:%M").to_string());
            match &self.sms {
                Some(sms) => {
                    let delivered = sms.send_sms(&p.phone, &sms_body).await;
                    if !delivered {
                        warn!(id = %reminder.id, "SMS dispatch attempt failed");
                    }
                }
                None => warn!(id = %reminder.id, "SMS transport not configured"),
            }
        }

        // Terminal transition: stamped whether or not any transport
        // accepted the message.
        let stamped = self.store.mark_reminder_sent(&reminder.id, now).await?;
        if stamped {
            info!(id = %reminder.id, title = %reminder.title, "Reminder dispatched");
        }

        Ok(())
    }
}

fn format_email_body(reminder: &Reminder, local_due: &str) -> String {
    let notes = if reminder.notes.is_empty() {
        "-"
    } else {
        &reminder.notes
    };
    format!(
        "{}\nType: {}\nWhen: {}\nNotes: {}\n",
        reminder.title, reminder.kind, local_due, notes
    )
}

fn format_sms_body(reminder: &Reminder, local_due: &str) -> String {
    format!("{} at {} - {}", reminder.title, local_due, reminder.notes)
}

/// Profile-independent helper used by listings: localized display string
/// for a stored UTC instant.
pub fn display_local(t: DateTime<Utc>, profile: Option<&Profile>, default_tz: Tz) -> String {
    let tz = profile
        .map(|p| resolve_tz(&p.tz, default_tz))
        .unwrap_or(default_tz);
    utc_to_local(t, tz).format(DISPLAY_FORMAT).to_string()
}
