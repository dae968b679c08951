//! Delegated symptom classifier over an OpenAI-compatible chat endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::AssistantConfig;
use crate::traits::SymptomClassifier;
use crate::triage::result::TriageResult;

/// Classified classifier error: tells the triage engine *why* the
/// delegated call failed. Every kind triggers the same recovery (fall
/// back to the rule path), but the kind drives logging and tests.
#[derive(Debug)]
pub struct ClassifierError {
    pub kind: ClassifierErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierErrorKind {
    /// 401/403: bad API key or permissions.
    Auth,
    /// 429: rate limited.
    RateLimit,
    /// Request timeout or the endpoint took too long.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// 500/502/503/504: provider-side outage.
    ServerError,
    /// The endpoint answered but not with a parseable TriageResult.
    Malformed,
    /// Anything else.
    Unknown,
}

impl ClassifierError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ClassifierErrorKind::Auth,
            408 => ClassifierErrorKind::Timeout,
            429 => ClassifierErrorKind::RateLimit,
            500 | 502 | 503 | 504 => ClassifierErrorKind::ServerError,
            _ => ClassifierErrorKind::Unknown,
        };
        Self {
            kind,
            status: Some(status),
            message: truncate_body(body),
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ClassifierErrorKind::Timeout
        } else {
            ClassifierErrorKind::Network
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ClassifierErrorKind::Malformed,
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} (HTTP {}): {}", self.kind, status, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClassifierError {}

fn truncate_body(body: &str) -> String {
    let mut end = body.len().min(500);
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

const SYSTEM_MESSAGE: &str = "You are a helpful assistant that only returns valid JSON.";

fn build_prompt(symptoms: &str, question: &str, profile_context: &str) -> String {
    format!(
        r#"You are a cautious, empathetic AI health assistant. Your goal is to provide safe, helpful, and clear guidance.
Return a single, valid JSON object with the following keys:
- "urgency": (string) one of "emergency", "high", "medium", "low".
- "suggested_specialty": (string) e.g., "Cardiology", "Primary Care".
- "advice": (array of strings) Actionable next steps for the user.
- "lifestyle": (array of strings) Relevant lifestyle tips based on their profile and symptoms.
- "doctor_search_query": (string) A web search query to find a relevant local specialist. Example: "cardiologist near me for chest pain".
- "disclaimer": (string) A standard medical disclaimer.

CRITICAL SAFETY RULES:
- If symptoms include any red flags (chest pain, difficulty breathing, severe bleeding, stroke symptoms like one-sided numbness), ALWAYS set urgency to "emergency" and the first piece of advice MUST be "Call emergency services (911) or go to the nearest emergency room immediately."
- Your responses are for informational purposes only and are not a substitute for professional medical advice, diagnosis, or treatment.
- Be conservative in your recommendations. When in doubt, advise consulting a healthcare professional.

User's Symptoms: "{symptoms}"
User's Specific Question: "{question}"
User's Health Profile: {profile_context}"#
    )
}

/// Strip an optional markdown code fence from a model response.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line if present, then the closing fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .trim_end()
        .trim_end_matches("```")
        .trim()
}

pub struct DelegatedClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DelegatedClassifier {
    pub fn new(config: &AssistantConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl SymptomClassifier for DelegatedClassifier {
    async fn classify(
        &self,
        symptoms: &str,
        question: &str,
        profile_context: &str,
    ) -> Result<TriageResult, ClassifierError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": build_prompt(symptoms, question, profile_context)},
            ],
            "temperature": 0.2,
        });

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, url = %url, "Calling delegated classifier");

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Classifier HTTP request failed: {}", e);
                return Err(ClassifierError::network(&e));
            }
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClassifierError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, "Classifier API error: {}", truncate_body(&text));
            return Err(ClassifierError::from_status(status.as_u16(), &text));
        }

        let envelope: Value = serde_json::from_str(&text)
            .map_err(|e| ClassifierError::malformed(format!("bad response envelope: {}", e)))?;

        let content = envelope["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClassifierError::malformed("response has no message content"))?;

        debug!("Classifier raw content: {}", truncate_body(content));

        parse_result(content)
    }
}

/// Strict parse of the model output as a TriageResult.
pub(crate) fn parse_result(content: &str) -> Result<TriageResult, ClassifierError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ClassifierError::malformed(format!("unparseable triage result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::result::Urgency;

    #[test]
    fn test_parse_result_plain_json() {
        let r = parse_result(
            r#"{"urgency":"high","suggested_specialty":"Cardiology","advice":["See a cardiologist."]}"#,
        )
        .unwrap();
        assert_eq!(r.urgency, Urgency::High);
        assert_eq!(r.advice.len(), 1);
    }

    #[test]
    fn test_parse_result_strips_code_fence() {
        let content = "```json\n{\"urgency\":\"low\",\"suggested_specialty\":\"Primary Care\"}\n```";
        let r = parse_result(content).unwrap();
        assert_eq!(r.urgency, Urgency::Low);
    }

    #[test]
    fn test_parse_result_rejects_prose() {
        let err = parse_result("I think you should see a doctor.").unwrap_err();
        assert_eq!(err.kind, ClassifierErrorKind::Malformed);
    }

    #[test]
    fn test_parse_result_rejects_unknown_urgency() {
        let err =
            parse_result(r#"{"urgency":"critical","suggested_specialty":"ER"}"#).unwrap_err();
        assert_eq!(err.kind, ClassifierErrorKind::Malformed);
    }

    #[test]
    fn test_error_classification_from_status() {
        assert_eq!(
            ClassifierError::from_status(401, "").kind,
            ClassifierErrorKind::Auth
        );
        assert_eq!(
            ClassifierError::from_status(429, "").kind,
            ClassifierErrorKind::RateLimit
        );
        assert_eq!(
            ClassifierError::from_status(503, "").kind,
            ClassifierErrorKind::ServerError
        );
        assert_eq!(
            ClassifierError::from_status(418, "").kind,
            ClassifierErrorKind::Unknown
        );
    }

    #[test]
    fn test_prompt_embeds_inputs() {
        let p = build_prompt("dizzy", "should I worry?", r#"{"age":40}"#);
        assert!(p.contains("dizzy"));
        assert!(p.contains("should I worry?"));
        assert!(p.contains(r#"{"age":40}"#));
        assert!(p.contains("ALWAYS set urgency to \"emergency\""));
    }
}
