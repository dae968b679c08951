use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub created_at: DateTime<Utc>,
    /// Convenience mirror of the subscription state, kept for the export
    /// payload. The Subscription record is the authoritative gate.
    pub is_pro: bool,
}

/// Health profile, one per user, created automatically at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub age: Option<i64>,
    pub gender: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub conditions: String,
    pub allergies: String,
    pub medications: String,
    pub emergency_contact: String,
    pub phone: String,
    pub notify_email: bool,
    pub notify_sms: bool,
    pub tz: String,
    pub goals: String,
    pub diet_prefs: String,
    pub activity_limits: String,
    pub notes: String,
}

impl Profile {
    /// Body-mass index from the biometric fields, when both are present.
    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let m = h / 100.0;
                Some(w / (m * m))
            }
            _ => None,
        }
    }
}

/// A scheduled medication/appointment reminder.
///
/// There is no stored state column: a reminder is PENDING until its
/// notify window opens, DUE until the dispatch loop stamps it, and SENT
/// forever after. `is_due` and `is_sent` are the observable transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub kind: String,
    pub due_at: DateTime<Utc>,
    pub pre_notify_min: i64,
    pub notes: String,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Reminder {
    /// The instant the notify window opens.
    pub fn notify_at(&self) -> DateTime<Utc> {
        self.due_at - Duration::minutes(self.pre_notify_min.max(0))
    }

    /// Whether the notify window has opened and no dispatch has happened.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_sent() && now >= self.notify_at()
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }
}

/// Read-access grant from a patient to a caregiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareTeamMember {
    pub id: i64,
    pub patient_id: String,
    pub caregiver_id: String,
    pub role: CareRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareRole {
    Viewer,
    Editor,
}

impl CareRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CareRole::Viewer => "viewer",
            CareRole::Editor => "editor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(CareRole::Viewer),
            "editor" => Some(CareRole::Editor),
            _ => None,
        }
    }
}

/// A persisted triage outcome; content is the serialized result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Billing state for one user, maintained by the provider webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Canceled,
    PastDue,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
        }
    }

    /// Map a stored or provider-supplied status tag. Anything the billing
    /// provider emits that we do not track (trialing, incomplete, unpaid)
    /// collapses to inactive.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            "past_due" => SubscriptionStatus::PastDue,
            _ => SubscriptionStatus::Inactive,
        }
    }
}
