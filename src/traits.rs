//! Capability seams for everything that leaves the process.
//!
//! Transports are best-effort: they report success/failure and never
//! error, so the dispatch loop can stamp a reminder sent regardless of
//! delivery outcome. The classifier is the one seam that returns a real
//! error; the triage engine uses it to decide when to fall back to the
//! rule path.

use async_trait::async_trait;

use crate::triage::result::TriageResult;
use crate::triage::ClassifierError;

/// Outbound email capability.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Attempt delivery; `true` means the transport accepted the message,
    /// not that it arrived.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool;
}

/// Outbound SMS capability.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> bool;
}

/// External symptom classifier (the delegated triage path).
///
/// Treated as untrusted and possibly absent: callers hold an
/// `Option<Arc<dyn SymptomClassifier>>` and an unconfigured endpoint is
/// simply `None`.
#[async_trait]
pub trait SymptomClassifier: Send + Sync {
    async fn classify(
        &self,
        symptoms: &str,
        question: &str,
        profile_context: &str,
    ) -> Result<TriageResult, ClassifierError>;
}
