//! Answer and validation records exchanged with the model and the judge.
//!
//! Field names follow the JSON wire form:
//!
//! ```json
//! {
//!   "answer": "...",
//!   "citations": [{"source": "policy.md", "chunk_id": 0}],
//!   "confidence": "medium",
//!   "missing_info": null,
//!   "next_steps": ["..."],
//!   "similar_cases": [{"row_id": 7, "customer": "...", "support": "..."}]
//! }
//! ```

use copilot_core::{AppError, AppResult};
use copilot_llm::extract_json_object;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// How well the KB evidence supports the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl TryFrom<String> for Confidence {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "invalid confidence '{}', expected high, medium or low",
                other
            )),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one retrieved KB chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,

    #[serde(deserialize_with = "deserialize_chunk_id")]
    pub chunk_id: i64,
}

/// Read a loosely typed integer: a JSON integer, an integral float or an
/// integer string.
pub fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn deserialize_chunk_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    integer_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("invalid chunk_id: {}", value)))
}

fn deserialize_suggested_k<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => integer_from_value(&value)
            .and_then(|k| u32::try_from(k).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid suggested_k: {}", value))),
    }
}

/// A past ticket shown as an example of how support responded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub row_id: i64,

    #[serde(rename = "customer", default)]
    pub customer_text: String,

    #[serde(rename = "support", default)]
    pub support_text: String,
}

/// A structured, citation-bearing answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,

    #[serde(default)]
    pub citations: Vec<Citation>,

    pub confidence: Confidence,

    #[serde(default)]
    pub missing_info: Option<String>,

    #[serde(default)]
    pub next_steps: Vec<String>,

    #[serde(default)]
    pub similar_cases: Vec<SimilarCase>,
}

impl Answer {
    /// Parse an answer out of raw model output.
    ///
    /// Markdown fences and prose around the JSON object are tolerated.
    ///
    /// # Errors
    /// Returns `AppError::GenerationMalformed` when no JSON object is found or
    /// it does not have the answer shape.
    pub fn from_model_output(text: &str) -> AppResult<Self> {
        let json = extract_json_object(text).ok_or_else(|| {
            AppError::GenerationMalformed("model output contains no JSON object".to_string())
        })?;

        serde_json::from_str(json)
            .map_err(|e| AppError::GenerationMalformed(format!("answer JSON does not match schema: {}", e)))
    }

    /// Wire form handed to the validator.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `missing_info` is absent or blank.
    pub fn missing_info_is_empty(&self) -> bool {
        self.missing_info
            .as_deref()
            .map_or(true, |info| info.trim().is_empty())
    }
}

/// Outcome of validating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "PASS")]
    Pass,

    #[serde(rename = "RETRY_WITH_MORE_CONTEXT", alias = "RETRY")]
    Retry,

    #[serde(rename = "REFUSE")]
    Refuse,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Retry => "RETRY_WITH_MORE_CONTEXT",
            Self::Refuse => "REFUSE",
        }
    }

    /// The run stops here regardless of the retry budget.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retry)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision plus the feedback and retry hints that justify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub decision: Decision,

    #[serde(default)]
    pub feedback: String,

    #[serde(default)]
    pub suggested_query: Option<String>,

    #[serde(default, deserialize_with = "deserialize_suggested_k")]
    pub suggested_k: Option<u32>,
}

impl ValidationResult {
    pub fn pass(feedback: impl Into<String>) -> Self {
        Self {
            decision: Decision::Pass,
            feedback: feedback.into(),
            suggested_query: None,
            suggested_k: None,
        }
    }

    pub fn retry(feedback: impl Into<String>, query: impl Into<String>, k: u32) -> Self {
        Self {
            decision: Decision::Retry,
            feedback: feedback.into(),
            suggested_query: Some(query.into()),
            suggested_k: Some(k),
        }
    }

    pub fn refuse(feedback: impl Into<String>) -> Self {
        Self {
            decision: Decision::Refuse,
            feedback: feedback.into(),
            suggested_query: None,
            suggested_k: None,
        }
    }
}
