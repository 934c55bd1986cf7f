//! Google Gemini Model Client
//!
//! Implements `ModelClient` for the Gemini `generateContent` API:
//! conversation mapping, the function-declaration block, and wire-order
//! preserving response parsing.

use async_trait::async_trait;
use tracing::debug;

use skiff_core::error::ProviderError;
use skiff_core::provider::{ModelClient, ModelResponse, ResponsePart};
use skiff_core::types::{Message, MessageContent, Role, ToolCallRequest, ToolDefinition};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Output cap sent with every request.
const MAX_OUTPUT_TOKENS: u32 = 8192;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Google Gemini model client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Construct against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Convert the conversation and tool schema to the Gemini wire format.
    fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for msg in messages {
            match (&msg.role, &msg.content) {
                (Role::System, MessageContent::Text(t)) => {
                    system_instruction = Some(serde_json::json!({
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::User, MessageContent::Text(t)) => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::Assistant, MessageContent::Text(t)) => {
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": [{ "text": t }]
                    }));
                }
                (Role::Assistant, MessageContent::ToolCalls(calls)) => {
                    let parts: Vec<serde_json::Value> = calls
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "functionCall": {
                                    "name": c.name,
                                    "args": c.arguments
                                }
                            })
                        })
                        .collect();
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": parts
                    }));
                }
                (Role::Tool, MessageContent::ToolResult(r)) => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{
                            "functionResponse": {
                                "name": r.name,
                                "response": { "result": r.content }
                            }
                        }]
                    }));
                }
                // No other role/content combinations are produced by the loop.
                _ => {}
            }
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        if let Some(sys) = system_instruction {
            body["systemInstruction"] = sys;
        }

        if !tools.is_empty() {
            let declarations: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    })
                })
                .collect();
            body["tools"] = serde_json::json!([{
                "functionDeclarations": declarations
            }]);
        }

        body
    }

    /// Extract response parts from the first candidate, preserving order.
    fn parse_response(parsed: &serde_json::Value) -> Result<ModelResponse, ProviderError> {
        let candidate = parsed
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or(ProviderError::EmptyResponse)?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or(ProviderError::MalformedResponse)?;

        let mut response = ModelResponse::default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                response.parts.push(ResponsePart::Text(text.to_string()));
            }
            if let Some(fc) = part.get("functionCall") {
                response
                    .parts
                    .push(ResponsePart::FunctionCall(ToolCallRequest {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: fc
                            .get("name")
                            .and_then(|n| n.as_str())
                            .unwrap_or("")
                            .to_string(),
                        arguments: fc
                            .get("args")
                            .cloned()
                            .unwrap_or_else(|| serde_json::json!({})),
                    }));
            }
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, ProviderError> {
        let body = self.build_request_body(messages, tools);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, "calling Gemini API");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("HTTP {status}: {body}")));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        Self::parse_response(&parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_core::types::ToolCallResult;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key", "gemini-2.5-flash")
    }

    #[test]
    fn system_turn_becomes_system_instruction() {
        let messages = vec![
            Message {
                role: Role::System,
                content: MessageContent::Text("be helpful".into()),
            },
            Message {
                role: Role::User,
                content: MessageContent::Text("hi".into()),
            },
        ];
        let body = client().build_request_body(&messages, &[]);

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            serde_json::json!("be helpful")
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn tool_call_turn_becomes_model_function_call_parts() {
        let messages = vec![Message {
            role: Role::Assistant,
            content: MessageContent::ToolCalls(vec![ToolCallRequest {
                id: "tc1".into(),
                name: "get_files_info".into(),
                arguments: serde_json::json!({"directory": "."}),
            }]),
        }];
        let body = client().build_request_body(&messages, &[]);

        let content = &body["contents"][0];
        assert_eq!(content["role"], "model");
        assert_eq!(
            content["parts"][0]["functionCall"]["name"],
            serde_json::json!("get_files_info")
        );
        assert_eq!(
            content["parts"][0]["functionCall"]["args"]["directory"],
            serde_json::json!(".")
        );
    }

    #[test]
    fn tool_result_turn_is_keyed_by_operation_name() {
        let messages = vec![Message {
            role: Role::Tool,
            content: MessageContent::ToolResult(ToolCallResult {
                tool_call_id: "tc1".into(),
                name: "get_files_info".into(),
                content: "- a.txt: file_size=3 bytes, is_dir=false\n".into(),
                is_error: false,
            }),
        }];
        let body = client().build_request_body(&messages, &[]);

        let part = &body["contents"][0]["parts"][0];
        assert_eq!(
            part["functionResponse"]["name"],
            serde_json::json!("get_files_info")
        );
        assert!(part["functionResponse"]["response"]["result"]
            .as_str()
            .unwrap()
            .contains("a.txt"));
    }

    #[test]
    fn tool_schema_is_declared_on_the_request() {
        let tools = skiff_core::dispatch::tool_definitions();
        let body = client().build_request_body(&[], &tools);

        let declarations = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declarations.len(), 4);
        assert_eq!(declarations[0]["name"], serde_json::json!("get_files_info"));
    }

    #[test]
    fn parse_preserves_part_order() {
        let parsed = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Looking now." },
                        { "functionCall": { "name": "get_files_info", "args": {} } },
                        { "text": "One moment." }
                    ]
                }
            }]
        });
        let response = GeminiClient::parse_response(&parsed).unwrap();

        assert_eq!(response.parts.len(), 3);
        assert!(matches!(&response.parts[0], ResponsePart::Text(t) if t == "Looking now."));
        assert!(matches!(
            &response.parts[1],
            ResponsePart::FunctionCall(c) if c.name == "get_files_info"
        ));
        assert!(matches!(&response.parts[2], ResponsePart::Text(t) if t == "One moment."));
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        let parsed = serde_json::json!({ "candidates": [] });
        assert!(matches!(
            GeminiClient::parse_response(&parsed),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn candidate_without_content_is_malformed() {
        let parsed = serde_json::json!({ "candidates": [{ "finishReason": "STOP" }] });
        assert!(matches!(
            GeminiClient::parse_response(&parsed),
            Err(ProviderError::MalformedResponse)
        ));
    }

    #[test]
    fn function_call_without_args_defaults_to_empty_object() {
        let parsed = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "functionCall": { "name": "get_files_info" } }]
                }
            }]
        });
        let response = GeminiClient::parse_response(&parsed).unwrap();
        match &response.parts[0] {
            ResponsePart::FunctionCall(c) => {
                assert_eq!(c.arguments, serde_json::json!({}));
                assert!(!c.id.is_empty());
            }
            other => panic!("expected a function call, got {other:?}"),
        }
    }
}
