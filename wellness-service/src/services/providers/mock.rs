//! Scripted provider for tests.
//!
//! Replies with a fixed script and records every conversation it receives so
//! tests can assert on prompts and on whether the model was called at all.

use super::{ChatProvider, ChatStream, CompletionOptions, ProviderError};
use crate::models::ModelMessage;
use async_trait::async_trait;
use futures::stream;
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Single-shot text (also streamed as one delta).
    Text(String),
    /// Streamed deltas followed by a normal end.
    Deltas(Vec<String>),
    /// Streamed deltas, then an error item.
    DeltasThenError(Vec<String>, ProviderError),
    /// Fail every call.
    Fail(ProviderError),
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ModelMessage>,
    pub options: CompletionOptions,
}

pub struct MockChatProvider {
    reply: MockReply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatProvider {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockReply::Fail(error))
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn record(&self, messages: &[ModelMessage], options: &CompletionOptions) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                options: options.clone(),
            });
        }
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.record(messages, options);

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Deltas(deltas) => Ok(deltas.concat()),
            MockReply::DeltasThenError(_, err) | MockReply::Fail(err) => Err(err.clone()),
        }
    }

    async fn stream(&self, messages: &[ModelMessage], options: &CompletionOptions) -> ChatStream {
        self.record(messages, options);

        let items: Vec<Result<String, ProviderError>> = match &self.reply {
            MockReply::Text(text) => vec![Ok(text.clone())],
            MockReply::Deltas(deltas) => deltas.iter().cloned().map(Ok).collect(),
            MockReply::DeltasThenError(deltas, err) => deltas
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(err.clone())))
                .collect(),
            MockReply::Fail(err) => vec![Err(err.clone())],
        };

        Box::pin(stream::iter(items))
    }
}
