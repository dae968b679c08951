//! Symptom triage: a deterministic rule path, an optional delegated
//! path, and the policy that picks between them.

mod assistant;
pub mod result;
pub mod rules;

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

pub use assistant::{ClassifierError, ClassifierErrorKind, DelegatedClassifier};
pub use result::{merge_lifestyle, TriageResult, Urgency};

use crate::traits::SymptomClassifier;
use crate::types::Profile;

/// Serialized profile context handed to the delegated classifier.
pub fn profile_context(profile: Option<&Profile>) -> String {
    let Some(p) = profile else {
        return "No profile on file.".to_string();
    };
    json!({
        "name": p.name,
        "age": p.age,
        "gender": p.gender,
        "weight_kg": p.weight_kg,
        "height_cm": p.height_cm,
        "conditions": p.conditions,
        "allergies": p.allergies,
        "medications": p.medications,
        "goals": p.goals,
        "diet_prefs": p.diet_prefs,
        "activity_limits": p.activity_limits,
        "notes": p.notes,
    })
    .to_string()
}

/// Picks the classifier path and owns the fallback policy.
///
/// The engine never errors: any failure on the delegated path produces a
/// rule-based result instead. Entitlement is decided by the caller (the
/// subscription gate needs the store and clock); the engine only knows
/// whether delegation is allowed for this call.
pub struct TriageEngine {
    classifier: Option<Arc<dyn SymptomClassifier>>,
}

impl TriageEngine {
    pub fn new(classifier: Option<Arc<dyn SymptomClassifier>>) -> Self {
        Self { classifier }
    }

    /// Whether the delegated path can run at all (endpoint configured).
    pub fn delegation_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Assess symptoms. `delegate` is true only when the caller is
    /// entitled; the rule path serves everyone else.
    pub async fn assess(
        &self,
        delegate: bool,
        symptoms: &str,
        question: &str,
        profile: Option<&Profile>,
    ) -> TriageResult {
        if delegate {
            if let Some(classifier) = &self.classifier {
                let context = profile_context(profile);
                match classifier.classify(symptoms, question, &context).await {
                    Ok(mut result) => {
                        merge_lifestyle(&mut result.lifestyle, rules::lifestyle_recs(profile));
                        return result;
                    }
                    Err(e) => {
                        warn!(error = %e, "Delegated classifier failed, falling back to rules");
                    }
                }
            }
        }

        rules::classify(symptoms, profile)
    }
}
