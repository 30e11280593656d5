//! Streaming coach conversation over server-sent events.
//!
//! Each model delta becomes one `data: {"content": ...}` event. The stream
//! ends with `data: [DONE]`, or with a single `data: {"error": ...}` when the
//! upstream fails part-way. Dropping the response (client gone) drops the
//! upstream stream and its connection with it.

use super::reject;
use crate::dtos::CoachRequest;
use crate::error::AnalysisError;
use crate::services::providers::ChatStream;
use crate::startup::AppState;
use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    routing::post,
    Json, Router,
};
use futures::{stream, Stream, StreamExt};
use serde_json::json;
use service_core::error::AppError;
use std::convert::Infallible;

pub const DONE_EVENT: &str = "[DONE]";

pub fn router() -> Router<AppState> {
    Router::new().route("/coach", post(coach))
}

pub async fn coach(
    State(state): State<AppState>,
    Json(request): Json<CoachRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(user_id = %request.user_id, "Coach message received");

    let upstream = state
        .analysis
        .coach(request)
        .await
        .map_err(|e| reject("coach", e))?;

    let events = relay(upstream).map(|event| Ok::<_, Infallible>(event.into_event()));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    ))
}

/// One outbound stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Content(String),
    Done,
    Error(String),
}

impl RelayEvent {
    /// The `data:` payload of this event.
    pub fn payload(&self) -> String {
        match self {
            RelayEvent::Content(content) => json!({ "content": content }).to_string(),
            RelayEvent::Done => DONE_EVENT.to_string(),
            RelayEvent::Error(message) => json!({ "error": message }).to_string(),
        }
    }

    pub fn into_event(self) -> Event {
        Event::default().data(self.payload())
    }
}

/// Map upstream deltas to relay events, pulling one upstream item per event.
///
/// Exactly one terminal event (`Done` or `Error`) is emitted, after which the
/// upstream stream is dropped.
pub fn relay(upstream: ChatStream) -> impl Stream<Item = RelayEvent> + Send {
    stream::unfold(Some(upstream), |state| async move {
        let mut upstream = state?;
        match upstream.next().await {
            Some(Ok(delta)) => Some((RelayEvent::Content(delta), Some(upstream))),
            Some(Err(e)) => {
                let err = AnalysisError::from(e);
                tracing::error!(
                    endpoint = "coach",
                    kind = err.kind(),
                    error = %err,
                    "Coach stream failed"
                );
                Some((RelayEvent::Error(err.public_message()), None))
            }
            None => {
                tracing::debug!(endpoint = "coach", "Coach stream completed");
                Some((RelayEvent::Done, None))
            }
        }
    })
}
