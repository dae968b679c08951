use serde::{Deserialize, Serialize};

/// Standard disclaimer appended to every triage outcome that lacks one.
pub const DISCLAIMER: &str = "Educational support only. Not a medical diagnosis. \
     Seek professional care for urgent concerns.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

/// Outcome of a triage assessment, from either classifier path.
///
/// Ephemeral: persisted only as the serialized content of a Plan
/// record. The serde defaults make this the strict parse target for the
/// delegated classifier's JSON response: `urgency` and
/// `suggested_specialty` are required, everything else is backfilled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    pub urgency: Urgency,
    pub suggested_specialty: String,
    #[serde(default)]
    pub advice: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_search_query: Option<String>,
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
}

fn default_disclaimer() -> String {
    DISCLAIMER.to_string()
}

/// Append each profile-derived tip not already present, preserving the
/// delegated list's order. Exact string match; the delegated classifier
/// is told to echo profile tips verbatim when it uses them.
pub fn merge_lifestyle(delegated: &mut Vec<String>, derived: Vec<String>) {
    for tip in derived {
        if !delegated.contains(&tip) {
            delegated.push(tip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Urgency::Emergency).unwrap(), "\"emergency\"");
        assert!(serde_json::from_str::<Urgency>("\"critical\"").is_err());
    }

    #[test]
    fn test_parse_backfills_optional_fields() {
        let r: TriageResult =
            serde_json::from_str(r#"{"urgency":"low","suggested_specialty":"primary care"}"#)
                .unwrap();
        assert!(r.advice.is_empty());
        assert_eq!(r.disclaimer, DISCLAIMER);
        assert!(r.doctor_search_query.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_urgency() {
        assert!(serde_json::from_str::<TriageResult>(r#"{"suggested_specialty":"x"}"#).is_err());
    }

    #[test]
    fn test_merge_lifestyle_appends_missing_preserves_order() {
        let mut delegated = vec!["walk daily".to_string(), "Avoid sugary beverages.".to_string()];
        let derived = vec![
            "Avoid sugary beverages.".to_string(),
            "150 min/wk moderate activity.".to_string(),
        ];
        merge_lifestyle(&mut delegated, derived);
        assert_eq!(
            delegated,
            vec![
                "walk daily".to_string(),
                "Avoid sugary beverages.".to_string(),
                "150 min/wk moderate activity.".to_string(),
            ]
        );
    }

    #[test]
    fn test_merge_lifestyle_no_duplicates() {
        let mut delegated = vec!["a".to_string()];
        merge_lifestyle(&mut delegated, vec!["a".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(delegated, vec!["a".to_string(), "b".to_string()]);
    }
}
