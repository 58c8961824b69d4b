//! Application state: session registry, bot configuration, and clients.
//!
//! This module owns:
//!   - the per-user quiz session registry (keyed by session id)
//!   - the prompts and message texts (from TOML or defaults)
//!   - the optional text generator (OpenAI in production)
//!   - the Open-Meteo client
//!
//! Question selection generates via the configured generator when available;
//! otherwise the fixed fallback question serves.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::config::{load_bot_config_from_env, BotConfig, Messages, Prompts};
use crate::domain::{QuestionSource, QuizQuestion};
use crate::openai::{GenerateText, OpenAI};
use crate::quiz::{acquire_question, fallback_question};
use crate::session::QuizSession;
use crate::weather::WeatherClient;

/// One registry slot. Sessions are individually locked so a slow generation
/// for one user never blocks another.
pub type SessionCell = Arc<Mutex<QuizSession>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, SessionCell>>>,
    pub generator: Option<Arc<dyn GenerateText>>,
    pub weather: WeatherClient,
    pub prompts: Prompts,
    pub messages: Messages,
}

impl AppState {
    /// Build state from env: load config, init OpenAI, set up the registry.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_bot_config_from_env().unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "klyov_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            info!(target: "klyov_backend", "OpenAI disabled (no OPENAI_API_KEY). Serving fallback content.");
        }

        Self::with_config(cfg, openai.map(|oa| Arc::new(oa) as Arc<dyn GenerateText>))
    }

    /// Assemble state from parts. Tests use this to run without env vars and
    /// to inject scripted generators.
    pub fn with_config(cfg: BotConfig, generator: Option<Arc<dyn GenerateText>>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            generator,
            weather: WeatherClient::new(),
            prompts: cfg.prompts,
            messages: cfg.messages,
        }
    }

    /// Get or create the session cell for `session_id`.
    #[instrument(level = "debug", skip(self))]
    pub async fn session_entry(&self, session_id: &str) -> SessionCell {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(QuizSession::new())))
            .clone()
    }

    /// Look up an existing session without creating one.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionCell> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Drop a session. Returns whether it existed.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Produce the next question for a quiz round.
    pub async fn next_question(&self, seen: &mut Vec<String>) -> (QuizQuestion, QuestionSource) {
        match &self.generator {
            Some(model) => acquire_question(model.as_ref(), &self.prompts, seen).await,
            None => {
                warn!(target: "quiz", "OPENAI_API_KEY not set; serving fallback question");
                (fallback_question(), QuestionSource::Fallback)
            }
        }
    }
}
