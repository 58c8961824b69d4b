//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! The correct option of a question is never part of any outbound payload;
//! clients only learn it through the correct/wrong notice after answering.

use serde::{Deserialize, Serialize};

use crate::config::Messages;
use crate::session::QuizPresenter;
use crate::util::fill_template;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz,
    Answer {
        /// Option index: 0 = A, 1 = B, 2 = C.
        chosen: usize,
    },
    FinishQuiz,
    Chat {
        text: String,
    },
    RandomFact,
    Weather {
        latitude: f64,
        longitude: f64,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        round: usize,
        total: usize,
        prompt: String,
        options: [String; 3],
    },
    Notice {
        text: String,
    },
    QuizResult {
        score: usize,
        total: usize,
        text: String,
    },
    Menu {
        text: String,
    },
    ChatReply {
        text: String,
    },
    Fact {
        text: String,
    },
    Forecast {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Collects the protocol messages produced by one operation. Implements
/// `QuizPresenter` so quiz flows render without knowing the transport;
/// WS sends each message as a frame, HTTP returns them as a batch.
pub struct Outbox<'a> {
    messages: &'a Messages,
    out: Vec<ServerWsMessage>,
}

impl<'a> Outbox<'a> {
    pub fn new(messages: &'a Messages) -> Self {
        Self { messages, out: Vec::new() }
    }

    pub fn into_messages(self) -> Vec<ServerWsMessage> {
        self.out
    }
}

impl QuizPresenter for Outbox<'_> {
    fn show_question(&mut self, round: usize, total: usize, prompt: &str, options: &[String; 3]) {
        self.out.push(ServerWsMessage::Question {
            round,
            total,
            prompt: prompt.to_string(),
            options: options.clone(),
        });
    }

    fn show_result(&mut self, score: usize, total: usize) {
        let text = fill_template(
            &self.messages.finish_template,
            &[("score", &score.to_string()), ("total", &total.to_string())],
        );
        self.out.push(ServerWsMessage::QuizResult { score, total, text });
    }

    fn notify(&mut self, text: &str) {
        self.out.push(ServerWsMessage::Notice { text: text.to_string() });
    }

    fn show_home(&mut self, text: &str) {
        self.out.push(ServerWsMessage::Menu { text: text.to_string() });
    }
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct QuizStartIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct QuizAnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub chosen: usize,
}

#[derive(Deserialize)]
pub struct QuizFinishIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Batch of messages produced by one quiz step, in display order.
#[derive(Serialize)]
pub struct StepOut {
    pub messages: Vec<ServerWsMessage>,
}

#[derive(Deserialize)]
pub struct ChatIn {
    pub text: String,
}
#[derive(Serialize)]
pub struct ChatOut {
    pub text: String,
}

#[derive(Serialize)]
pub struct FactOut {
    pub text: String,
}

#[derive(Deserialize)]
pub struct WeatherIn {
    pub latitude: f64,
    pub longitude: f64,
}
#[derive(Serialize)]
pub struct ForecastOut {
    pub text: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    #[serde(rename = "activeSessions")]
    pub active_sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"answer","chosen":1}"#).expect("answer msg");
        match msg {
            ClientWsMessage::Answer { chosen } => assert_eq!(chosen, 1),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn question_payload_exposes_no_answer_key() {
        let msg = ServerWsMessage::Question {
            round: 1,
            total: 10,
            prompt: "Какой крючок мельче: №18 или №8?".into(),
            options: ["№18".into(), "№8".into(), "Одинаковые".into()],
        };
        let json = serde_json::to_string(&msg).expect("serialize question");
        assert!(json.contains(r#""type":"question""#));
        assert!(!json.to_lowercase().contains("correct"));
    }

    #[test]
    fn outbox_renders_the_result_through_the_template() {
        let messages = Messages::default();
        let mut out = Outbox::new(&messages);
        out.show_result(7, 10);
        match out.into_messages().as_slice() {
            [ServerWsMessage::QuizResult { score, total, text }] => {
                assert_eq!((*score, *total), (7, 10));
                assert!(text.contains('7') && text.contains("10"), "bad result text: {text}");
            }
            other => panic!("unexpected batch: {other:?}"),
        }
    }
}
