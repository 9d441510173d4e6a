//! Shared test helpers and a scripted mock provider.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use warbot::error::WarbotError;
use warbot::provider::{ChunkStream, ModelProvider, ProviderRequest};
use warbot::types::*;

/// What one `stream_chat` call should produce.
pub enum Script {
    /// Yield these items in order, then end the stream.
    Chunks(Vec<Result<StreamChunk, WarbotError>>),
    /// Fail before any chunk is produced.
    OpenError(WarbotError),
}

/// A provider that replays queued rounds and records every request.
pub struct MockProvider {
    model_id: String,
    scripts: Mutex<Vec<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            scripts: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a round that yields these chunks.
    pub fn queue_round(&self, chunks: Vec<StreamChunk>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .push(Script::Chunks(chunks.into_iter().map(Ok).collect()));
        self
    }

    /// Queue a round with explicit per-item results.
    pub fn queue_results(&self, items: Vec<Result<StreamChunk, WarbotError>>) -> &Self {
        self.scripts.lock().unwrap().push(Script::Chunks(items));
        self
    }

    /// Queue a round whose request fails outright.
    pub fn queue_open_error(&self, err: WarbotError) -> &Self {
        self.scripts.lock().unwrap().push(Script::OpenError(err));
        self
    }

    /// Queue a plain answer, split into a few text chunks.
    pub fn queue_answer(&self, answer: &str) -> &Self {
        let mut chunks: Vec<StreamChunk> = answer.split_inclusive(' ').map(text).collect();
        chunks.push(finish("stop"));
        self.queue_round(chunks)
    }

    /// Queue a single complete tool call in one fragment.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) -> &Self {
        self.queue_round(vec![
            tool_fragment(
                ToolCallFragment::new(Some(id), Some(0))
                    .name(name)
                    .arguments(&args.to_string()),
            ),
            finish("tool_calls"),
        ])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream_chat(&self, request: &ProviderRequest) -> Result<ChunkStream, WarbotError> {
        self.requests.lock().unwrap().push(request.clone());

        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                return Err(WarbotError::Stream(
                    "mock provider has no scripted rounds left".into(),
                ));
            }
            scripts.remove(0)
        };

        match script {
            Script::OpenError(err) => Err(err),
            Script::Chunks(items) => Ok(Box::pin(futures::stream::iter(items))),
        }
    }
}

/// A chunk carrying answer text.
pub fn text(part: &str) -> StreamChunk {
    StreamChunk::from_delta(ChoiceDelta::text(part), None)
}

/// A chunk carrying reasoning text under `reasoning_content`.
pub fn reasoning(part: &str) -> StreamChunk {
    StreamChunk::from_delta(
        ChoiceDelta::default().with_field("reasoning_content", json!(part)),
        None,
    )
}

/// A chunk carrying one tool-call fragment.
pub fn tool_fragment(fragment: ToolCallFragment) -> StreamChunk {
    StreamChunk::from_delta(ChoiceDelta::tool_calls(vec![fragment]), None)
}

/// An empty chunk carrying a terminal reason.
pub fn finish(reason: &str) -> StreamChunk {
    StreamChunk::from_delta(ChoiceDelta::default(), Some(reason))
}
