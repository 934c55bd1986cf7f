//! Model Client Trait
//!
//! Boundary to the remote model API. A client receives the accumulated
//! conversation plus the fixed tool schema and returns the model's
//! response parts in wire order.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Message, ToolCallRequest, ToolDefinition};

/// One part of a model response, in the order the model produced it.
#[derive(Debug, Clone)]
pub enum ResponsePart {
    /// Free text intended for the user.
    Text(String),
    /// A structured request to execute one operation.
    FunctionCall(ToolCallRequest),
}

/// A model response: zero or more parts, encounter order preserved.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub parts: Vec<ResponsePart>,
}

impl ModelResponse {
    /// Whether any part is a function call.
    pub fn has_function_calls(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ResponsePart::FunctionCall(_)))
    }
}

/// Trait implemented by each model backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Backend identifier (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send the conversation and tool schema, return the response parts.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, ProviderError>;
}
