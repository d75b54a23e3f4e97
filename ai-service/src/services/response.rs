//! Provider response bodies and the shapes text can be found in.

use serde::{Deserialize, Serialize};

/// What a provider handed back for a generation call.
#[derive(Debug, Clone)]
pub enum RawResponse {
    /// Body decoded as a generate-content response.
    Structured(GenerateContentResponse),
    /// Body that was not structured JSON, kept as its string form.
    Rendered(String),
}

impl RawResponse {
    /// Structured response whose first candidate carries `text` as a single part.
    pub fn from_text(text: impl Into<String>) -> Self {
        RawResponse::Structured(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part {
                        text: Some(text.into()),
                    }],
                }),
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    /// Classify where the generated text lives, in priority order.
    pub fn shape(&self) -> ResponseShape<'_> {
        match self {
            RawResponse::Structured(body) => body.shape(),
            RawResponse::Rendered(text) => ResponseShape::Rendered(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape<'a> {
    DirectText(&'a str),
    /// Text parts of the first candidate, concatenated.
    CandidateParts(String),
    CandidateText(&'a str),
    Rendered(&'a str),
    Unrecognized,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Convenience field some gateways add next to `candidates`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn shape(&self) -> ResponseShape<'_> {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return ResponseShape::DirectText(text);
        }

        let Some(candidate) = self.candidates.first() else {
            return ResponseShape::Unrecognized;
        };

        let part_texts: Vec<&str> = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect();
        if !part_texts.is_empty() {
            return ResponseShape::CandidateParts(part_texts.concat());
        }

        match candidate.text.as_deref() {
            Some(text) => ResponseShape::CandidateText(text),
            None => ResponseShape::Unrecognized,
        }
    }

    /// Reason the provider gave for refusing the prompt, if any.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<i32>,
    pub candidates_token_count: Option<i32>,
    pub total_token_count: Option<i32>,
}
