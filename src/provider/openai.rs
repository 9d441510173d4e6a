//! OpenAI Chat Completions streaming transport.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::error::WarbotError;
use crate::types::{Message, Role, StreamChunk};

use super::http::{bearer_headers, parse_sse_line, shared_client, LineBuffer, SseLine};
use super::{ChunkStream, ModelProvider, ProviderRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider for the chat-completions endpoint of OpenAI and compatible servers.
pub struct OpenAiProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build the JSON request body.
    pub fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> =
            request.messages.iter().map(message_to_openai).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| t.to_function_schema())
                .collect();
            body["tools"] = tool_defs.into();
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: &ProviderRequest) -> Result<ChunkStream, WarbotError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, messages = request.messages.len(), "OpenAI stream_chat");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(super::http::status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut lines = LineBuffer::new();
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        yield Err(WarbotError::Network(e));
                        break;
                    }
                };

                for line in lines.push(&bytes) {
                    match parse_sse_line(&line) {
                        SseLine::Data(data) => {
                            if let Some(chunk) = decode_chunk(data) {
                                yield Ok(chunk);
                            }
                        }
                        SseLine::Done => break 'read,
                        SseLine::Ignored => {}
                    }
                }
            }

            if let Some(rest) = lines.finish() {
                if let SseLine::Data(data) = parse_sse_line(&rest) {
                    if let Some(chunk) = decode_chunk(data) {
                        yield Ok(chunk);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn decode_chunk(data: &str) -> Option<StreamChunk> {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => Some(chunk),
        Err(err) => {
            debug!(error = %err, data, "skipping undecodable stream chunk");
            None
        }
    }
}

/// Serialize one history entry into chat-completions shape.
pub fn message_to_openai(msg: &Message) -> serde_json::Value {
    match msg.role {
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "name": msg.name,
            "content": msg.text(),
        }),
        Role::Assistant if !msg.tool_calls.is_empty() => {
            let calls: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments,
                        }
                    })
                })
                .collect();
            let mut out = serde_json::json!({
                "role": "assistant",
                "tool_calls": calls,
            });
            if let Some(ref content) = msg.content {
                out["content"] = content.clone().into();
            }
            out
        }
        role => serde_json::json!({
            "role": role.to_string(),
            "content": msg.text(),
        }),
    }
}
