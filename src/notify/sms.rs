use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::SmsConfig;
use crate::traits::SmsSender;

/// SMS delivery via the Twilio Messages REST endpoint. Best-effort.
pub struct TwilioSmsSender {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsSender {
    pub fn new(config: &SmsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> bool {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let params = [("From", self.from_number.as_str()), ("To", to), ("Body", body)];

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => {
                debug!(to, "SMS accepted by Twilio");
                true
            }
            Ok(r) => {
                warn!(to, status = %r.status(), "SMS delivery rejected");
                false
            }
            Err(e) => {
                warn!(to, "SMS request failed: {}", e);
                false
            }
        }
    }
}
