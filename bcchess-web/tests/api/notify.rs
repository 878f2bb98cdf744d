use std::sync::Mutex;

use async_trait::async_trait;
use bcchess_web::models::push_subscription::PushSubscription;
use bcchess_web::services::notify_sweep::{self, SweepReport};
use bcchess_web::services::push::{PushError, PushSender};

use crate::common::TestServer;

/// Sender whose behaviour depends on the endpoint in the subscription.
#[derive(Default)]
struct FakeSender {
    delivered: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PushSender for FakeSender {
    async fn send(&self, subscription: &str, payload: &str) -> Result<(), PushError> {
        if subscription.contains("gone") {
            return Err(PushError::Gone);
        }
        if subscription.contains("broken") {
            return Err(PushError::Failed("connection reset".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((subscription.to_string(), payload.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn sweep_sends_to_everyone_and_keeps_expired() {
    let server = TestServer::start().await;
    let user = server.create_user("olga").await;
    for endpoint in ["ok-1", "gone", "broken", "ok-2"] {
        let sub = format!(r#"{{"endpoint":"https://push.example.com/{endpoint}"}}"#);
        assert!(PushSubscription::save(&server.pool, user, &sub).await.unwrap());
    }

    let sender = FakeSender::default();
    let report = notify_sweep::sweep(&server.pool, &sender).await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            sent: 2,
            failed: 1,
            expired: 1
        }
    );

    let delivered = sender.delivered.lock().unwrap().clone();
    assert_eq!(delivered.len(), 2);
    for (_, payload) in &delivered {
        assert_eq!(payload, &notify_sweep::payload());
    }

    // Expired endpoints are reported, never deleted.
    let remaining = PushSubscription::list_all(&server.pool).await.unwrap();
    assert_eq!(remaining.len(), 4);
    assert!(remaining.iter().any(|s| s.subscription.contains("gone")));
}

#[tokio::test]
async fn sweep_with_no_subscriptions_is_a_no_op() {
    let server = TestServer::start().await;
    let report = notify_sweep::sweep(&server.pool, &FakeSender::default())
        .await
        .unwrap();
    assert_eq!(report, SweepReport::default());
}
