mod api;
mod billing;
mod clock;
mod config;
mod db;
mod dispatch;
mod error;
mod notify;
mod store;
mod timeutil;
mod traits;
mod triage;
mod types;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::{build_router, AppState, BillingState};
use crate::billing::StripeClient;
use crate::clock::{Clock, SystemClock};
use crate::dispatch::DispatchManager;
use crate::notify::{SmtpEmailSender, TwilioSmsSender};
use crate::store::Store;
use crate::traits::{EmailSender, SmsSender, SymptomClassifier};
use crate::triage::{DelegatedClassifier, TriageEngine};

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        config::AppConfig::load(&config_path)?
    } else {
        warn!(
            path = %config_path.display(),
            "No config file found; starting with defaults and no outbound integrations"
        );
        toml::from_str("")?
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: config::AppConfig) -> anyhow::Result<()> {
    let store = Store::open(&config.state.db_path).await?;
    info!(db = %config.state.db_path, "Record store ready");

    let default_tz: Tz = config.app.default_tz.parse().map_err(|_| {
        anyhow::anyhow!("unrecognized default_tz '{}' in config", config.app.default_tz)
    })?;

    let email: Option<Arc<dyn EmailSender>> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, "Email transport configured");
            Some(Arc::new(SmtpEmailSender::new(smtp)?))
        }
        None => {
            warn!("No [smtp] section; email notifications disabled");
            None
        }
    };

    let sms: Option<Arc<dyn SmsSender>> = match &config.sms {
        Some(sms) => {
            info!("SMS transport configured");
            Some(Arc::new(TwilioSmsSender::new(sms)?))
        }
        None => None,
    };

    let classifier: Option<Arc<dyn SymptomClassifier>> = match &config.assistant {
        Some(assistant) => {
            info!(model = %assistant.model, "Delegated classifier configured");
            Some(Arc::new(DelegatedClassifier::new(assistant)?))
        }
        None => {
            info!("No [assistant] section; triage runs rule-based only");
            None
        }
    };

    let billing = match &config.billing {
        Some(billing_config) => Some(BillingState {
            stripe: Arc::new(StripeClient::new(billing_config)?),
            price_id: billing_config.price_id.clone(),
            webhook_secret: billing_config.webhook_secret.clone(),
        }),
        None => {
            info!("No [billing] section; subscription gating denies all delegation");
            None
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let dispatcher = Arc::new(DispatchManager::new(
        store.clone(),
        email,
        sms,
        clock.clone(),
        default_tz,
        config.scheduler.tick_interval_secs,
    ));
    dispatcher.spawn();

    let state = AppState {
        store,
        engine: Arc::new(TriageEngine::new(classifier)),
        clock,
        default_tz,
        billing,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}
