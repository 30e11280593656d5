//! Decoding of OpenAI-style `text/event-stream` completion bodies.
//!
//! The body is consumed lazily: bytes are only pulled from the connection when
//! the consumer asks for the next delta, and the connection is dropped as soon
//! as a terminal frame is seen.

use super::{ChatStream, ProviderError};
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;

/// Payload that marks the end of a completion stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Longest unterminated line kept in the buffer before the stream is abandoned.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One meaningful frame of the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Delta(String),
    Done,
    Error(String),
}

/// Splits raw body bytes into lines and turns `data:` lines into frames.
///
/// Bytes are buffered until a newline arrives, so multi-byte characters and
/// frames split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
}

impl FrameDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            if let Some(frame) = parse_line(&self.buffer[consumed..=end]) {
                frames.push(frame);
            }
            consumed = end + 1;
            self.scanned = consumed;
        }

        self.buffer.drain(..consumed);
        self.scanned = self.buffer.len();
        frames
    }

    /// Whether the pending partial line has grown past [`MAX_LINE_BYTES`].
    pub fn overflowed(&self) -> bool {
        self.buffer.len() > MAX_LINE_BYTES
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        parse_line(&rest)
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_line(raw: &[u8]) -> Option<Frame> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    // Comments (": keep-alive"), event names and blank separators carry no data.
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == DONE_MARKER {
        return Some(Frame::Done);
    }

    let chunk: ChunkPayload = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!(error = %e, frame = %payload, "Skipping malformed stream frame");
            return None;
        }
    };

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(Frame::Error(message));
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty())
        .map(Frame::Delta)
}

struct DecodeState<S> {
    body: Option<Pin<Box<S>>>,
    decoder: FrameDecoder,
    pending: VecDeque<Result<String, ProviderError>>,
}

impl<S> DecodeState<S> {
    fn absorb(&mut self, frames: impl IntoIterator<Item = Frame>) {
        for frame in frames {
            match frame {
                Frame::Delta(text) => self.pending.push_back(Ok(text)),
                Frame::Done => {
                    self.body = None;
                    return;
                }
                Frame::Error(message) => {
                    self.pending.push_back(Err(ProviderError::Stream(message)));
                    self.body = None;
                    return;
                }
            }
        }
    }
}

/// Turn a raw event-stream body into a [`ChatStream`] of text deltas.
///
/// The sequence ends after `[DONE]`, after an error frame (delivered as the
/// last item), after a transport error (likewise) or when the body ends.
pub fn decode_chat_stream<S, B>(body: S) -> ChatStream
where
    S: Stream<Item = Result<B, ProviderError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        body: Some(Box::pin(body)),
        decoder: FrameDecoder::default(),
        pending: VecDeque::new(),
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }

            let body = state.body.as_mut()?;
            match body.next().await {
                Some(Ok(chunk)) => {
                    let frames = state.decoder.push(chunk.as_ref());
                    state.absorb(frames);
                    if state.body.is_some() && state.decoder.overflowed() {
                        tracing::error!(limit = MAX_LINE_BYTES, "Stream line too long; abandoning body");
                        state.pending.push_back(Err(ProviderError::InvalidPayload(format!(
                            "stream line exceeds {} bytes",
                            MAX_LINE_BYTES
                        ))));
                        state.body = None;
                    }
                }
                Some(Err(err)) => {
                    state.pending.push_back(Err(err));
                    state.body = None;
                }
                None => {
                    let tail = state.decoder.finish();
                    state.body = None;
                    state.absorb(tail);
                }
            }
        }
    }))
}
