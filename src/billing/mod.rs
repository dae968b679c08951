//! Subscription entitlement and billing-provider integration.

pub mod webhook;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::config::BillingConfig;
use crate::types::{Subscription, SubscriptionStatus};

/// The subscription gate. Pure and evaluated fresh on every request:
/// no caching, no hysteresis. Authentication is enforced upstream by
/// the extractor, so a call here implies an authenticated user.
pub fn entitled(subscription: Option<&Subscription>, now: DateTime<Utc>) -> bool {
    match subscription {
        Some(sub) => {
            sub.status == SubscriptionStatus::Active
                && sub.current_period_end.map_or(true, |end| end > now)
        }
        None => false,
    }
}

/// Minimal Stripe REST client for checkout-session creation.
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(config: &BillingConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            base_url: "https://api.stripe.com".to_string(),
        })
    }

    /// Create a subscription-mode checkout session and return its id.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        customer_email: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> anyhow::Result<String> {
        let params = [
            ("mode", "subscription"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("customer_email", customer_email),
            ("allow_promotion_codes", "true"),
        ];

        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;

        if !status.is_success() {
            anyhow::bail!(
                "checkout session creation failed (HTTP {}): {}",
                status,
                body["error"]["message"].as_str().unwrap_or("unknown error")
            );
        }

        let session_id = body["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("checkout session response missing id"))?
            .to_string();

        info!(session = %session_id, "Created checkout session");
        Ok(session_id)
    }
}
