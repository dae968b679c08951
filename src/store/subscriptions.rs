use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use super::{parse_ts, parse_ts_opt, Store};
use crate::types::{Subscription, SubscriptionStatus};

fn row_to_subscription(row: &SqliteRow) -> anyhow::Result<Subscription> {
    Ok(Subscription {
        user_id: row.get("user_id"),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        status: SubscriptionStatus::parse(&row.get::<String, _>("status")),
        current_period_end: parse_ts_opt(row.get("current_period_end"))?,
        updated_at: parse_ts(&row.get::<String, _>("updated_at"))?,
    })
}

impl Store {
    pub async fn get_subscription(&self, user_id: &str) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query("SELECT * FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_subscription).transpose()
    }

    pub async fn get_subscription_by_customer(
        &self,
        stripe_customer_id: &str,
    ) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query("SELECT * FROM subscriptions WHERE stripe_customer_id = ?")
            .bind(stripe_customer_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_subscription).transpose()
    }

    /// Upsert keyed by user: webhook deliveries may repeat or arrive out
    /// of band, so applying the same event twice must converge on the
    /// same row.
    pub async fn upsert_subscription(&self, sub: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO subscriptions
                (user_id, stripe_customer_id, stripe_subscription_id, status,
                 current_period_end, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                stripe_customer_id = COALESCE(excluded.stripe_customer_id, stripe_customer_id),
                stripe_subscription_id = COALESCE(excluded.stripe_subscription_id, stripe_subscription_id),
                status = excluded.status,
                current_period_end = excluded.current_period_end,
                updated_at = excluded.updated_at",
        )
        .bind(&sub.user_id)
        .bind(&sub.stripe_customer_id)
        .bind(&sub.stripe_subscription_id)
        .bind(sub.status.as_str())
        .bind(sub.current_period_end.map(|t| t.to_rfc3339()))
        .bind(sub.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::store::Store;
    use crate::types::{Subscription, SubscriptionStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_upsert_subscription_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let now = Utc::now();
        let sub = Subscription {
            user_id: "u1".into(),
            stripe_customer_id: Some("cus_123".into()),
            stripe_subscription_id: Some("sub_123".into()),
            status: SubscriptionStatus::Active,
            current_period_end: None,
            updated_at: now,
        };

        store.upsert_subscription(&sub).await.unwrap();
        store.upsert_subscription(&sub).await.unwrap();

        let stored = store.get_subscription("u1").await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_123"));
    }

    #[tokio::test]
    async fn test_upsert_preserves_customer_id_when_absent() {
        let store = Store::open_in_memory().await.unwrap();
        let now = Utc::now();
        let mut sub = Subscription {
            user_id: "u1".into(),
            stripe_customer_id: Some("cus_123".into()),
            stripe_subscription_id: None,
            status: SubscriptionStatus::Active,
            current_period_end: None,
            updated_at: now,
        };
        store.upsert_subscription(&sub).await.unwrap();

        // A later status-only event should not wipe the customer link.
        sub.stripe_customer_id = None;
        sub.status = SubscriptionStatus::PastDue;
        store.upsert_subscription(&sub).await.unwrap();

        let stored = store.get_subscription("u1").await.unwrap().unwrap();
        assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_123"));
        assert_eq!(stored.status, SubscriptionStatus::PastDue);

        let by_customer = store
            .get_subscription_by_customer("cus_123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_customer.user_id, "u1");
    }
}
