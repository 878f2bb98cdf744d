use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use serde_json::json;

use crate::db::DbPool;
use crate::models::push_subscription::PushSubscription;
use crate::services::push::{PushError, PushSender};

pub const TITLE: &str = "Come play on bcCHESS";
pub const BODY: &str = "Challenge your skills against our AI or other players!";

pub fn payload() -> String {
    json!({ "title": TITLE, "body": BODY }).to_string()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
    /// Endpoints the push service reported as gone (404/410).
    pub expired: usize,
}

/// Reminder sweep. Wakes at each configured hour (UTC) and pushes the
/// reminder to every stored subscription.
pub async fn run(pool: DbPool, sender: Arc<dyn PushSender>, hours: Vec<u32>) {
    loop {
        let now = Utc::now();
        let Some(next) = next_run(now, &hours) else {
            tracing::warn!("Notify sweep: no valid hours configured, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!("Notify sweep: next run at {next}");
        tokio::time::sleep(wait).await;

        match sweep(&pool, sender.as_ref()).await {
            Ok(report) => tracing::info!(
                sent = report.sent,
                failed = report.failed,
                expired = report.expired,
                "Notify sweep finished"
            ),
            Err(e) => tracing::error!("Notify sweep error: {e}"),
        }
    }
}

/// Send the reminder to each subscription in turn. One failing endpoint
/// never stops the rest. Expired subscriptions stay stored.
pub async fn sweep(pool: &DbPool, sender: &dyn PushSender) -> Result<SweepReport, sqlx::Error> {
    let subscriptions = PushSubscription::list_all(pool).await?;
    let payload = payload();
    let mut report = SweepReport::default();

    for sub in subscriptions {
        match sender.send(&sub.subscription, &payload).await {
            Ok(()) => report.sent += 1,
            Err(PushError::Gone) => {
                // Expired rows are reported, not removed.
                tracing::warn!(
                    "Notify sweep: subscription {} for user {} has expired",
                    sub.id,
                    sub.user_id
                );
                report.expired += 1;
            }
            Err(e) => {
                tracing::error!(
                    "Notify sweep: failed to notify user {} (subscription {}): {e}",
                    sub.user_id,
                    sub.id
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// The first configured hour strictly after `now`, today or tomorrow.
pub fn next_run(now: DateTime<Utc>, hours: &[u32]) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1))?;
    let mut candidates: Vec<DateTime<Utc>> = [today, tomorrow]
        .into_iter()
        .flat_map(|day| {
            hours
                .iter()
                .filter_map(move |h| day.and_hms_opt(*h, 0, 0))
                .map(|t| t.and_utc())
        })
        .filter(|t| *t > now)
        .collect();
    candidates.sort_unstable();
    candidates.into_iter().next()
}
