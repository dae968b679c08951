//! Deterministic keyword triage.
//!
//! Categories are an ordered table, not a chain of conditionals: the
//! first category whose term-set intersects the lowercased input wins,
//! and the emergency set sits first so it short-circuits everything
//! else. Ties are impossible by construction.

use crate::triage::result::{TriageResult, Urgency, DISCLAIMER};
use crate::types::Profile;

pub struct Category {
    pub label: &'static str,
    pub urgency: Urgency,
    pub specialty: &'static str,
    pub advice: &'static str,
    pub terms: &'static [&'static str],
}

pub const CATEGORIES: &[Category] = &[
    Category {
        label: "urgent",
        urgency: Urgency::Emergency,
        specialty: "emergency medicine",
        advice: "Call emergency services or go to the ER immediately.",
        terms: &[
            "chest pain",
            "pressure in chest",
            "shortness of breath",
            "stroke",
            "numbness one side",
            "fainting",
            "severe bleeding",
        ],
    },
    Category {
        label: "cardiovascular",
        urgency: Urgency::High,
        specialty: "cardiology",
        advice: "Schedule an urgent appointment with a cardiologist.",
        terms: &[
            "palpitations",
            "irregular heartbeat",
            "swelling ankles",
            "hypertension",
            "bp high",
        ],
    },
    Category {
        label: "metabolic",
        urgency: Urgency::Medium,
        specialty: "endocrinology",
        advice: "Check blood glucose and consult an endocrinologist.",
        terms: &["thirst", "urination", "blurry vision", "fatigue", "slow healing"],
    },
    Category {
        label: "infectious",
        urgency: Urgency::Medium,
        specialty: "primary care",
        advice: "Hydrate, rest; test for COVID/flu; see primary care if persists.",
        terms: &[
            "fever",
            "chills",
            "sore throat",
            "cough",
            "congestion",
            "flu",
            "body aches",
        ],
    },
    Category {
        label: "neurological",
        urgency: Urgency::Low,
        specialty: "neurology",
        advice: "Reduce light; hydrate; consider OTC analgesics if appropriate.",
        terms: &["migraine", "headache", "light sensitivity", "aura", "nausea"],
    },
    Category {
        label: "gastrointestinal",
        urgency: Urgency::Low,
        specialty: "gastroenterology",
        advice: "Track foods; hydrate; seek care if severe/persistent.",
        terms: &[
            "abdominal pain",
            "diarrhea",
            "constipation",
            "heartburn",
            "acid reflux",
            "nausea",
            "vomiting",
        ],
    },
];

const DEFAULT_ADVICE: &str =
    "Monitor symptoms. If they worsen or persist >48 hours, see primary care.";

/// Most tips shown on the rule path; the profile can match every
/// condition at once and six is already a wall of text.
const LIFESTYLE_CAP: usize = 6;

/// Classify symptom text against the category table.
pub fn classify(symptoms: &str, profile: Option<&Profile>) -> TriageResult {
    let text = symptoms.to_lowercase();

    let mut lifestyle = lifestyle_recs(profile);
    lifestyle.truncate(LIFESTYLE_CAP);

    for category in CATEGORIES {
        if category.terms.iter().any(|t| text.contains(t)) {
            return TriageResult {
                urgency: category.urgency,
                suggested_specialty: category.specialty.to_string(),
                advice: vec![category.advice.to_string()],
                lifestyle,
                doctor_search_query: None,
                disclaimer: DISCLAIMER.to_string(),
            };
        }
    }

    TriageResult {
        urgency: Urgency::Low,
        suggested_specialty: "primary care".to_string(),
        advice: vec![DEFAULT_ADVICE.to_string()],
        lifestyle,
        doctor_search_query: None,
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Profile-derived lifestyle tips, in condition-check order.
///
/// Shared by both classifier paths: the delegated path merges these into
/// whatever the external model produced.
pub fn lifestyle_recs(profile: Option<&Profile>) -> Vec<String> {
    let mut recs = Vec::new();
    let Some(profile) = profile else {
        return recs;
    };

    let conds = profile.conditions.to_lowercase();

    if conds.contains("diabetes") {
        recs.push("Low-glycemic carbs, lean proteins.".to_string());
        recs.push("Avoid sugary beverages.".to_string());
        recs.push("150 min/wk moderate activity.".to_string());
    }
    if conds.contains("hypertension") || conds.contains("high blood pressure") {
        recs.push("DASH-style diet, low sodium.".to_string());
        recs.push("Limit alcohol; monitor BP 3-4x/wk.".to_string());
    }
    if profile.bmi().is_some_and(|bmi| bmi >= 30.0) {
        recs.push("Swap fried for baked; soda for water.".to_string());
        recs.push("8-10k steps/day + 2x/wk resistance.".to_string());
    }
    if conds.contains("asthma") {
        recs.push(
            "Track triggers; warm up before activity; keep rescue inhaler accessible."
                .to_string(),
        );
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(conditions: &str, weight_kg: Option<f64>, height_cm: Option<f64>) -> Profile {
        Profile {
            user_id: "u1".into(),
            name: String::new(),
            age: None,
            gender: String::new(),
            weight_kg,
            height_cm,
            conditions: conditions.into(),
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

    #[test]
    fn test_emergency_terms_win() {
        let r = classify("chest pain and nausea", None);
        assert_eq!(r.urgency, Urgency::Emergency);
        assert_eq!(r.suggested_specialty, "emergency medicine");
        assert_eq!(
            r.advice[0],
            "Call emergency services or go to the ER immediately."
        );
    }

    #[test]
    fn test_emergency_dominates_every_other_category() {
        // Pair an emergency term with one term from each later category.
        for other in ["palpitations", "thirst", "fever", "migraine", "diarrhea"] {
            let r = classify(&format!("severe bleeding and {}", other), None);
            assert_eq!(r.urgency, Urgency::Emergency, "lost to {}", other);
        }
    }

    #[test]
    fn test_first_match_wins_on_shared_terms() {
        // "nausea" appears in both neurological and GI sets; neurological
        // comes first in the table.
        let r = classify("nausea", None);
        assert_eq!(r.suggested_specialty, "neurology");
    }

    #[test]
    fn test_category_matching_is_case_insensitive() {
        let r = classify("CHEST PAIN", None);
        assert_eq!(r.urgency, Urgency::Emergency);
    }

    #[test]
    fn test_unmatched_input_gets_default() {
        let r = classify("my elbow itches a little", None);
        assert_eq!(r.urgency, Urgency::Low);
        assert_eq!(r.suggested_specialty, "primary care");
        assert!(!r.advice.is_empty());
        assert!(r.advice[0].contains("48 hours"));
        assert!(!r.disclaimer.is_empty());
    }

    #[test]
    fn test_lifestyle_recs_follow_condition_order() {
        let p = profile_with("asthma, diabetes", None, None);
        let recs = lifestyle_recs(Some(&p));
        // Diabetes tips come first regardless of the order in the text.
        assert_eq!(recs[0], "Low-glycemic carbs, lean proteins.");
        assert!(recs.last().unwrap().contains("rescue inhaler"));
    }

    #[test]
    fn test_lifestyle_recs_bmi_threshold() {
        let obese = profile_with("", Some(95.0), Some(170.0));
        assert!(!lifestyle_recs(Some(&obese)).is_empty());

        let lean = profile_with("", Some(60.0), Some(170.0));
        assert!(lifestyle_recs(Some(&lean)).is_empty());
    }

    #[test]
    fn test_rule_path_caps_lifestyle() {
        // diabetes (3) + hypertension (2) + obesity (2) + asthma (1) = 8
        let p = profile_with("diabetes, hypertension, asthma", Some(100.0), Some(160.0));
        let r = classify("something unremarkable", Some(&p));
        assert_eq!(r.lifestyle.len(), 6);
    }

    #[test]
    fn test_no_profile_no_lifestyle() {
        assert!(lifestyle_recs(None).is_empty());
    }
}
