//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Quiz endpoints return the produced message batch in display order, so a
//! client without a WebSocket can drive the same flows by carrying its own
//! session id.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, active_sessions: state.session_count().await })
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_quiz_start(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizStartIn>,
) -> impl IntoResponse {
  let mut out = Outbox::new(&state.messages);
  start_quiz(&state, &body.session_id, &mut out).await;
  info!(target: "quiz", session_id = %body.session_id, "HTTP quiz started");
  Json(StepOut { messages: out.into_messages() })
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, chosen = body.chosen))]
pub async fn http_post_quiz_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizAnswerIn>,
) -> impl IntoResponse {
  let mut out = Outbox::new(&state.messages);
  submit_answer(&state, &body.session_id, body.chosen, &mut out).await;
  Json(StepOut { messages: out.into_messages() })
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_quiz_finish(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizFinishIn>,
) -> impl IntoResponse {
  let mut out = Outbox::new(&state.messages);
  finish_quiz(&state, &body.session_id, &mut out).await;
  Json(StepOut { messages: out.into_messages() })
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> impl IntoResponse {
  let text = do_chat_reply(&state, &body.text).await;
  Json(ChatOut { text })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_fact(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let text = do_random_fact(&state).await;
  Json(FactOut { text })
}

#[instrument(level = "info", skip(state, body), fields(latitude = body.latitude, longitude = body.longitude))]
pub async fn http_post_weather(
  State(state): State<Arc<AppState>>,
  Json(body): Json<WeatherIn>,
) -> impl IntoResponse {
  let text = do_weather(&state, body.latitude, body.longitude).await;
  Json(ForecastOut { text })
}
