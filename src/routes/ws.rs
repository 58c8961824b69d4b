//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. One request may produce several replies (a notice
//! plus the next question, say); each goes out as its own text frame, in order.
//!
//! A connection owns one quiz session, keyed by a fresh UUID. The session is
//! dropped when the socket closes.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};
use uuid::Uuid;

use crate::logic::*;
use crate::protocol::{ClientWsMessage, Outbox, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "klyov_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4().to_string();
  info!(target: "klyov_backend", %session_id, "WebSocket connected");

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize responses.
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "klyov_backend", %session_id, "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &session_id).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };

        let mut send_failed = false;
        for reply in replies {
          let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
          });
          if let Err(e) = socket.send(Message::Text(out)).await {
            error!(target: "klyov_backend", %session_id, error = %e, "WS send error");
            send_failed = true;
            break;
          }
        }
        if send_failed {
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  state.remove_session(&session_id).await;
  info!(target: "klyov_backend", %session_id, "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session_id: &str) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::StartQuiz => {
      let mut out = Outbox::new(&state.messages);
      start_quiz(state, session_id, &mut out).await;
      out.into_messages()
    }

    ClientWsMessage::Answer { chosen } => {
      let mut out = Outbox::new(&state.messages);
      submit_answer(state, session_id, chosen, &mut out).await;
      out.into_messages()
    }

    ClientWsMessage::FinishQuiz => {
      let mut out = Outbox::new(&state.messages);
      finish_quiz(state, session_id, &mut out).await;
      out.into_messages()
    }

    ClientWsMessage::Chat { text } => {
      let reply = do_chat_reply(state, &text).await;
      vec![ServerWsMessage::ChatReply { text: reply }]
    }

    ClientWsMessage::RandomFact => {
      let text = do_random_fact(state).await;
      vec![ServerWsMessage::Fact { text }]
    }

    ClientWsMessage::Weather { latitude, longitude } => {
      let text = do_weather(state, latitude, longitude).await;
      vec![ServerWsMessage::Forecast { text }]
    }
  }
}
