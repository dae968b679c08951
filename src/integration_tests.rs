//! Integration tests exercising the dispatch loop, the subscription
//! gate, and the triage engine against a real in-memory store, the same
//! code paths the HTTP surface and the background tick use.

use chrono::{TimeZone, Utc};

use crate::billing::entitled;
use crate::clock::Clock;
use crate::testing::{setup_dispatch_harness, setup_dispatch_harness_with_email, RecordingEmail};
use crate::types::{Profile, Subscription, SubscriptionStatus};

fn base_profile(user_id: &str) -> Profile {
    Profile {
        user_id: user_id.to_string(),
        name: "Pat".into(),
        age: Some(52),
        gender: String::new(),
        weight_kg: None,
        height_cm: None,
        conditions: String::new(),
        allergies: String::new(),
        medications: String::new(),
        emergency_contact: String::new(),
        phone: String::new(),
        notify_email: true,
        notify_sms: false,
        tz: "UTC".into(),
        goals: String::new(),
        diet_prefs: String::new(),
        activity_limits: String::new(),
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_reminder_not_sent_before_notify_window() {
    let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 29, 59).unwrap();
    let harness = setup_dispatch_harness(start).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", start)
        .await
        .unwrap();
    harness.store.create_profile(&user.id, "UTC").await.unwrap();

    let due = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
    let reminder = harness
        .store
        .create_reminder(&user.id, "Take metformin", "medication", due, 30, "")
        .await
        .unwrap();

    // 09:29:59 is one second before the window opens.
    harness.dispatcher.tick(start).await.unwrap();

    assert_eq!(harness.email.count(), 0);
    let stored = &harness.store.list_reminders(&user.id).await.unwrap()[0];
    assert_eq!(stored.id, reminder.id);
    assert!(stored.sent_at.is_none());
}

#[tokio::test]
async fn test_reminder_sent_exactly_at_window_open() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();
    harness.store.create_profile(&user.id, "UTC").await.unwrap();

    let due = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
    harness
        .store
        .create_reminder(&user.id, "Take metformin", "medication", due, 30, "with food")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    assert_eq!(harness.email.count(), 1);
    let sent = &harness.email.sent.lock().unwrap()[0];
    assert_eq!(sent.to, "pat@example.com");
    assert_eq!(sent.subject, "Vital Guard Reminder: Take metformin");
    assert!(sent.body.contains("Type: medication"));
    assert!(sent.body.contains("Notes: with food"));

    let stored = &harness.store.list_reminders(&user.id).await.unwrap()[0];
    assert_eq!(stored.sent_at, Some(tick_at));
}

#[tokio::test]
async fn test_tick_is_idempotent_once_sent() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();

    let due = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
    harness
        .store
        .create_reminder(&user.id, "Refill prescription", "medication", due, 30, "")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();
    let first_sent_at = harness.store.list_reminders(&user.id).await.unwrap()[0]
        .sent_at
        .unwrap();

    // Re-run much later: the stamp must not move and nothing re-sends.
    harness.clock.advance_secs(3600);
    let later = harness.clock.now();
    harness.dispatcher.tick(later).await.unwrap();
    harness.dispatcher.tick(later).await.unwrap();

    assert_eq!(harness.email.count(), 1);
    let stored = &harness.store.list_reminders(&user.id).await.unwrap()[0];
    assert_eq!(stored.sent_at, Some(first_sent_at));
}

#[tokio::test]
async fn test_transport_failure_still_stamps_sent() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let harness = setup_dispatch_harness_with_email(tick_at, RecordingEmail::failing()).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();

    let due = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    harness
        .store
        .create_reminder(&user.id, "Blood draw", "appointment", due, 0, "")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    // One attempt happened, failed, and the reminder is still terminal.
    assert_eq!(harness.email.count(), 1);
    let stored = &harness.store.list_reminders(&user.id).await.unwrap()[0];
    assert_eq!(stored.sent_at, Some(tick_at));

    harness.dispatcher.tick(tick_at).await.unwrap();
    assert_eq!(harness.email.count(), 1);
}

#[tokio::test]
async fn test_sent_at_never_earlier_than_window() {
    let harness =
        setup_dispatch_harness(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", harness.clock.now())
        .await
        .unwrap();

    for (title, due, pre) in [
        ("a", "2024-01-02T08:00:00Z", 0i64),
        ("b", "2024-01-02T09:00:00Z", 45),
        ("c", "2024-01-03T00:00:00Z", 120),
    ] {
        harness
            .store
            .create_reminder(&user.id, title, "general", due.parse().unwrap(), pre, "")
            .await
            .unwrap();
    }

    // Sweep ticks across two days at 30-minute steps.
    for _ in 0..96 {
        harness.clock.advance_secs(30 * 60);
        let now = harness.clock.now();
        harness.dispatcher.tick(now).await.unwrap();
    }

    for r in harness.store.list_reminders(&user.id).await.unwrap() {
        let sent_at = r.sent_at.expect("all reminders dispatched by the sweep");
        assert!(
            sent_at >= r.notify_at(),
            "{} sent at {} before its window {}",
            r.title,
            sent_at,
            r.notify_at()
        );
    }
}

#[tokio::test]
async fn test_email_respects_profile_opt_out_and_sms_opt_in() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();
    harness.store.create_profile(&user.id, "UTC").await.unwrap();

    let mut profile = base_profile(&user.id);
    profile.notify_email = false;
    profile.notify_sms = true;
    profile.phone = "+15550002222".into();
    harness.store.update_profile(&profile).await.unwrap();

    harness
        .store
        .create_reminder(&user.id, "Inhaler", "medication", tick_at, 0, "two puffs")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    assert_eq!(harness.email.count(), 0);
    assert_eq!(harness.sms.count(), 1);
    let (to, body) = harness.sms.sent.lock().unwrap()[0].clone();
    assert_eq!(to, "+15550002222");
    assert!(body.contains("Inhaler"));
}

#[tokio::test]
async fn test_missing_profile_defaults_to_email() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    // User exists but never got a profile row.
    let user = harness
        .store
        .create_user("ghost@example.com", "hash", tick_at)
        .await
        .unwrap();
    harness
        .store
        .create_reminder(&user.id, "Check in", "general", tick_at, 0, "")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    assert_eq!(harness.email.count(), 1);
    assert_eq!(harness.sms.count(), 0);
}

#[tokio::test]
async fn test_due_time_localized_to_profile_zone() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();
    harness.store.create_profile(&user.id, "UTC").await.unwrap();

    let mut profile = base_profile(&user.id);
    profile.tz = "America/New_York".into();
    harness.store.update_profile(&profile).await.unwrap();

    harness
        .store
        .create_reminder(&user.id, "Televisit", "appointment", tick_at, 0, "")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    let sent = &harness.email.sent.lock().unwrap()[0];
    // 15:00 UTC is 10:00 in January in New York.
    assert!(sent.body.contains("When: Jan 10, 2024 10:00"), "{}", sent.body);
}

#[tokio::test]
async fn test_unrecognized_profile_zone_falls_back_to_default() {
    let tick_at = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
    let harness = setup_dispatch_harness(tick_at).await;

    let user = harness
        .store
        .create_user("pat@example.com", "hash", tick_at)
        .await
        .unwrap();
    harness.store.create_profile(&user.id, "UTC").await.unwrap();

    let mut profile = base_profile(&user.id);
    profile.tz = "Mars/OlympusMons".into();
    harness.store.update_profile(&profile).await.unwrap();

    harness
        .store
        .create_reminder(&user.id, "Televisit", "appointment", tick_at, 0, "")
        .await
        .unwrap();

    harness.dispatcher.tick(tick_at).await.unwrap();

    let sent = &harness.email.sent.lock().unwrap()[0];
    assert!(sent.body.contains("When: Jan 10, 2024 15:00"), "{}", sent.body);
}

#[tokio::test]
async fn test_gate_against_stored_subscription() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let store = crate::store::Store::open_in_memory().await.unwrap();
    let user = store.create_user("pat@example.com", "hash", now).await.unwrap();

    // No subscription row: not entitled.
    let sub = store.get_subscription(&user.id).await.unwrap();
    assert!(!entitled(sub.as_ref(), now));

    // Active with a future period end: entitled.
    store
        .upsert_subscription(&Subscription {
            user_id: user.id.clone(),
            stripe_customer_id: Some("cus_1".into()),
            stripe_subscription_id: Some("sub_1".into()),
            status: SubscriptionStatus::Active,
            current_period_end: Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            updated_at: now,
        })
        .await
        .unwrap();
    let sub = store.get_subscription(&user.id).await.unwrap();
    assert!(entitled(sub.as_ref(), now));

    // Same row evaluated after the period lapses: gate closes with no
    // webhook needed.
    let later = Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap();
    assert!(!entitled(sub.as_ref(), later));
}
