//! Google Gemini `generateContent` backend.

use super::{AssistBackend, AssistError, AssistRequest, AssistResult, RequestTurn, Sender};
use crate::config::AssistConfig;
use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Talks to the Gemini REST API over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    config: AssistConfig,
}

impl GeminiBackend {
    pub fn new(config: AssistConfig) -> AssistResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send(&self, request: &AssistRequest) -> AssistResult<String> {
        let body = WireRequest::from(request);
        log::debug!(
            "Sending {} turn(s) to {}",
            body.contents.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistError::new(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AssistError::new(format!("backend returned {status}: {detail}")));
        }

        let reply: WireResponse = response
            .json()
            .await
            .map_err(|e| AssistError::new(format!("unreadable reply: {e}")))?;
        reply.text()
    }
}

impl AssistBackend for GeminiBackend {
    fn generate<'a>(&'a self, request: &'a AssistRequest) -> BoxFuture<'a, AssistResult<String>> {
        Box::pin(self.send(request))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
}

impl From<&AssistRequest> for WireRequest {
    fn from(request: &AssistRequest) -> Self {
        Self {
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart::text(&request.system_instruction)],
            },
            contents: request.turns.iter().map(WireContent::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl From<&RequestTurn> for WireContent {
    fn from(turn: &RequestTurn) -> Self {
        let role = match turn.sender {
            Sender::User => "user",
            Sender::Assistant => "model",
        };
        let mut parts = vec![WirePart::text(&turn.text)];
        if let Some(image) = &turn.image {
            parts.push(WirePart {
                text: None,
                inline_data: Some(WireBlob {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            });
        }
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireBlob>,
}

impl WirePart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
}

impl WireResponse {
    /// Text of the first candidate. An empty reply counts as a failure.
    fn text(&self) -> AssistResult<String> {
        let content = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .ok_or_else(|| AssistError::new("reply has no candidates"))?;

        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(AssistError::new("reply is empty"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::{ConversationTurn, Topic, build_request};
    use crate::scene::{Snapshot, SnapshotFormat};

    #[test]
    fn test_wire_request_shape() {
        let prior = vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello")];
        let snapshot = Snapshot::new(SnapshotFormat::Png, vec![0xff]);
        let request = build_request(Topic::Math, &prior, Some("next?"), &snapshot);

        let json = serde_json::to_value(WireRequest::from(&request)).unwrap();
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            Topic::Math.instruction()
        );
        assert!(json["systemInstruction"].get("role").is_none());

        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "next?");
        assert_eq!(
            contents[2]["parts"][1]["inlineData"]["mimeType"],
            "image/png",
        );
        assert_eq!(contents[2]["parts"][1]["inlineData"]["data"], "/w==");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_reply_text() {
        let reply: WireResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Try "},{"text":"again."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.text().unwrap(), "Try again.");
    }

    #[test]
    fn test_empty_reply_is_error() {
        let blocked: WireResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(blocked.text().is_err());

        let blank: WireResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(blank.text().is_err());
    }

    #[test]
    fn test_url() {
        let mut config = AssistConfig::new("key");
        config.endpoint = "http://localhost:9000/v1beta/".to_string();
        config.model = "gemini-test".to_string();
        let backend = GeminiBackend::new(config).unwrap();
        assert_eq!(
            backend.url(),
            "http://localhost:9000/v1beta/models/gemini-test:generateContent"
        );
    }
}
