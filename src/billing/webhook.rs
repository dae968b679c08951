//! Billing-provider webhook: signature verification and idempotent
//! application of subscription lifecycle events.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::store::Store;
use crate::types::{Subscription, SubscriptionStatus};

/// Replay window for the signature timestamp.
const TOLERANCE_SECS: i64 = 300;

/// Parse a `Stripe-Signature` header of the form `t=timestamp,v1=sig`.
pub fn parse_signature_header(signature: &str) -> Result<(String, String), String> {
    let mut timestamp = String::new();
    let mut v1_signature = String::new();

    for part in signature.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => timestamp = kv[1].to_string(),
            "v1" => v1_signature = kv[1].to_string(),
            _ => {}
        }
    }

    if timestamp.is_empty() || v1_signature.is_empty() {
        return Err("Invalid signature header format".to_string());
    }

    Ok((timestamp, v1_signature))
}

/// Verify a webhook signature: HMAC-SHA256 over `"{t}.{payload}"` with
/// constant-time comparison and a timestamp replay window. The payload
/// must not be trusted until this returns `Ok(true)`.
pub fn verify_signature(
    payload: &[u8],
    signature: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<bool, String> {
    let (timestamp, v1_sig) = parse_signature_header(signature)?;

    let timestamp_num: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let diff = (now.timestamp() - timestamp_num).abs();
    if diff > TOLERANCE_SECS {
        return Err("Timestamp outside tolerance window".to_string());
    }

    let payload_str = std::str::from_utf8(payload).map_err(|_| "Invalid UTF-8 payload")?;
    let signed_payload = format!("{}.{}", timestamp, payload_str);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| "Invalid secret key")?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    Ok(expected.as_bytes().ct_eq(v1_sig.as_bytes()).into())
}

/// Apply one verified subscription lifecycle event to the store.
///
/// Idempotent: replays converge on the same Subscription row. Events we
/// cannot attribute to a user (no known email or customer id) are
/// acknowledged and skipped: the provider retries on non-2xx and a
/// permanently unattributable event would retry forever.
pub async fn apply_event(store: &Store, event: &serde_json::Value, now: DateTime<Utc>) -> anyhow::Result<()> {
    let event_type = event["type"].as_str().unwrap_or("");
    let object = &event["data"]["object"];

    match event_type {
        "checkout.session.completed" => {
            let email = object["customer_email"]
                .as_str()
                .or_else(|| object["customer_details"]["email"].as_str());
            let Some(email) = email else {
                warn!("Checkout event with no customer email; skipping");
                return Ok(());
            };

            let Some(user) = store.get_user_by_email(&email.to_lowercase()).await? else {
                warn!(email, "Checkout event for unknown account; skipping");
                return Ok(());
            };

            let sub = Subscription {
                user_id: user.id.clone(),
                stripe_customer_id: object["customer"].as_str().map(String::from),
                stripe_subscription_id: object["subscription"].as_str().map(String::from),
                status: SubscriptionStatus::Active,
                current_period_end: None,
                updated_at: now,
            };
            store.upsert_subscription(&sub).await?;
            store.set_user_pro(&user.id, true).await?;
            info!(user = %user.id, "Subscription activated via checkout");
        }
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => {
            let Some(customer_id) = object["customer"].as_str() else {
                warn!(event_type, "Subscription event with no customer id; skipping");
                return Ok(());
            };

            // Subscription events carry no email; the checkout event has
            // already linked the customer id to a user.
            let Some(existing) = store.get_subscription_by_customer(customer_id).await? else {
                warn!(customer_id, "Subscription event for unlinked customer; skipping");
                return Ok(());
            };

            let status = if event_type == "customer.subscription.deleted" {
                SubscriptionStatus::Canceled
            } else {
                SubscriptionStatus::parse(object["status"].as_str().unwrap_or("inactive"))
            };

            let period_end = object["current_period_end"]
                .as_i64()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

            let sub = Subscription {
                user_id: existing.user_id.clone(),
                stripe_customer_id: Some(customer_id.to_string()),
                stripe_subscription_id: object["id"]
                    .as_str()
                    .map(String::from)
                    .or(existing.stripe_subscription_id),
                status,
                current_period_end: period_end,
                updated_at: now,
            };
            store.upsert_subscription(&sub).await?;
            store
                .set_user_pro(&existing.user_id, status == SubscriptionStatus::Active)
                .await?;
            info!(user = %existing.user_id, status = status.as_str(), "Subscription updated");
        }
        other => {
            // Acknowledged so the provider stops redelivering.
            info!(event_type = other, "Ignoring unhandled webhook event");
        }
    }

    Ok(())
}
