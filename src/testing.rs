//! Test infrastructure: manual clock, recording transports, and a fully
//! wired dispatch harness over an in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::dispatch::DispatchManager;
use crate::store::Store;
use crate::traits::{EmailSender, SmsSender};

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// A clock the test drives by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut guard = self.now.lock().unwrap();
        *guard += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Recording transports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email transport that records every attempt and returns a scripted
/// outcome.
pub struct RecordingEmail {
    pub sent: Mutex<Vec<SentEmail>>,
    succeed: bool,
}

impl RecordingEmail {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            succeed: true,
        }
    }

    /// A transport whose every attempt fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            succeed: false,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        self.succeed
    }
}

pub struct RecordingSms {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send_sms(&self, to: &str, body: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        true
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub store: Store,
    pub dispatcher: DispatchManager,
    pub clock: Arc<ManualClock>,
    pub email: Arc<RecordingEmail>,
    pub sms: Arc<RecordingSms>,
}

/// Wire a dispatcher over an in-memory store with recording transports.
pub async fn setup_dispatch_harness(start: DateTime<Utc>) -> TestHarness {
    setup_dispatch_harness_with_email(start, RecordingEmail::new()).await
}

pub async fn setup_dispatch_harness_with_email(
    start: DateTime<Utc>,
    email: RecordingEmail,
) -> TestHarness {
    let store = Store::open_in_memory().await.expect("in-memory store");
    let clock = Arc::new(ManualClock::at(start));
    let email = Arc::new(email);
    let sms = Arc::new(RecordingSms::new());

    let dispatcher = DispatchManager::new(
        store.clone(),
        Some(email.clone()),
        Some(sms.clone()),
        clock.clone(),
        chrono_tz::UTC,
        60,
    );

    TestHarness {
        store,
        dispatcher,
        clock,
        email,
        sms,
    }
}
