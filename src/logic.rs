//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - The quiz flows (start, answer, finish) rendered through `QuizPresenter`
//!   - Free chat and the random fishing fact
//!   - The 3-day weather forecast
//!
//! Quiz flows never hold a session lock across a model call; after the call
//! they re-check that the session still waits for that round and drop the
//! generated question if it moved on.

use rand::seq::SliceRandom;
use tracing::{debug, error, info, instrument, warn};

use crate::openai::GenerateText;
use crate::session::{AnswerOutcome, QuizPhase, QuizPresenter, TOTAL_ROUNDS};
use crate::state::{AppState, SessionCell};
use crate::weather::format_forecast;

#[instrument(level = "info", skip(state, out), fields(%session_id))]
pub async fn start_quiz(state: &AppState, session_id: &str, out: &mut dyn QuizPresenter) {
  let cell = state.session_entry(session_id).await;
  cell.lock().await.start();
  info!(target: "quiz", %session_id, "Quiz started");
  issue_next(state, session_id, &cell, out).await;
}

#[instrument(level = "info", skip(state, out), fields(%session_id, chosen))]
pub async fn submit_answer(state: &AppState, session_id: &str, chosen: usize, out: &mut dyn QuizPresenter) {
  let cell = match state.get_session(session_id).await {
    Some(c) => c,
    None => {
      warn!(target: "quiz", %session_id, "Answer for unknown session");
      out.notify(&state.messages.invalid_answer);
      return;
    }
  };

  let (outcome, score, round) = {
    let mut session = cell.lock().await;
    let outcome = session.record_answer(chosen);
    (outcome, session.score(), session.round_index())
  };
  debug!(target: "quiz", %session_id, ?outcome, score, round, "Answer recorded");
  match outcome {
    AnswerOutcome::Correct => {
      out.notify(&state.messages.correct_answer);
      issue_next(state, session_id, &cell, out).await;
    }
    AnswerOutcome::Wrong => {
      out.notify(&state.messages.wrong_answer);
      issue_next(state, session_id, &cell, out).await;
    }
    AnswerOutcome::Rejected => {
      warn!(target: "quiz", %session_id, chosen, "Answer rejected; session unchanged");
      out.notify(&state.messages.invalid_answer);
    }
  }
}

#[instrument(level = "info", skip(state, out), fields(%session_id))]
pub async fn finish_quiz(state: &AppState, session_id: &str, out: &mut dyn QuizPresenter) {
  if let Some(cell) = state.get_session(session_id).await {
    cell.lock().await.abort();
  }
  state.remove_session(session_id).await;
  info!(target: "quiz", %session_id, "Quiz dismissed");
  out.notify(&state.messages.quiz_exit);
  out.show_home(&state.messages.greeting);
}

/// Issue the next round's question, or close out a completed quiz.
async fn issue_next(state: &AppState, session_id: &str, cell: &SessionCell, out: &mut dyn QuizPresenter) {
  let (round, epoch, mut seen_work) = {
    let mut session = cell.lock().await;
    if session.phase() != QuizPhase::InProgress {
      return;
    }
    if session.is_complete() {
      let score = session.finish();
      drop(session);
      state.remove_session(session_id).await;
      info!(target: "quiz", %session_id, score, "Quiz complete");
      out.show_result(score, TOTAL_ROUNDS);
      out.show_home(&state.messages.greeting);
      return;
    }
    (session.round_index(), session.epoch(), session.seen_prompts().to_vec())
  };

  // The lock is released while the model call runs, so finish_quiz or a
  // fresh start_quiz from the same user is applied immediately.
  let (question, source) = state.next_question(&mut seen_work).await;

  let mut session = cell.lock().await;
  if session.phase() != QuizPhase::InProgress
    || session.round_index() != round
    || session.epoch() != epoch
  {
    debug!(target: "quiz", %session_id, ?source, "Session moved on during generation; dropping question");
    return;
  }
  *session.seen_prompts_mut() = seen_work;
  session.note_issued(&question);
  out.show_question(round + 1, TOTAL_ROUNDS, &question.prompt, &question.options);
}

#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn do_chat_reply(state: &AppState, text: &str) -> String {
  if let Some(model) = &state.generator {
    match model.ask(text, &state.prompts.chat_system).await {
      Ok(t) => return t,
      Err(e) => {
        error!(target: "klyov_backend", error = %e, "Chat generation failed.");
        return state.messages.generic_error.clone();
      }
    }
  }
  chat_reply_stub(text)
}

#[instrument(level = "info", skip(state))]
pub async fn do_random_fact(state: &AppState) -> String {
  let fact = if let Some(model) = &state.generator {
    match model.ask("", &state.prompts.fact_system).await {
      Ok(t) => t,
      Err(e) => {
        error!(target: "klyov_backend", error = %e, "Fact generation failed.");
        return state.messages.generic_error.clone();
      }
    }
  } else {
    fact_stub()
  };
  format!("{}\n\n{}", state.messages.fact_intro, fact)
}

#[instrument(level = "info", skip(state))]
pub async fn do_weather(state: &AppState, latitude: f64, longitude: f64) -> String {
  match state.weather.fetch_forecast(latitude, longitude).await {
    Ok(daily) => format_forecast(&daily),
    Err(e) => {
      error!(target: "klyov_backend", error = %e, "Forecast fetch failed.");
      state.messages.weather_error.clone()
    }
  }
}

// -------- Local fallbacks --------

/// Tiny chat fallback with canned angling advice for common topics.
fn chat_reply_stub(text: &str) -> String {
  let lower = text.to_lowercase();
  if lower.contains("прикорм") {
    "Для старта хватит простой смеси: панировочные сухари, жмых и немного грунта с берега.".into()
  } else if lower.contains("спиннинг") || lower.contains("блесн") {
    "Начните с вращающейся блесны №2-3: она прощает ошибки проводки и ловит почти везде.".into()
  } else if lower.contains("зим") {
    "Зимой ищите рыбу на бровках и ямах, лунки сверлите тихо и не кучно.".into()
  } else {
    "Спросите о снастях, прикормке или выборе места, и я подскажу, с чего начать.".into()
  }
}

const FALLBACK_FACTS: &[&str] = &[
  "Сом может прожить более 50 лет и почти всю жизнь держится одной ямы.",
  "Угорь идёт на нерест в Саргассово море, преодолевая тысячи километров.",
  "У карпа есть глоточные зубы, которыми он перетирает даже твёрдые ракушки.",
  "Щука разворачивает добычу в пасти, чтобы заглотить её с головы.",
];

fn fact_stub() -> String {
  let mut rng = rand::thread_rng();
  FALLBACK_FACTS
    .choose(&mut rng)
    .copied()
    .unwrap_or(FALLBACK_FACTS[0])
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::BotConfig;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use tokio::sync::Notify;

  #[derive(Debug, PartialEq)]
  enum Shown {
    Question { round: usize, prompt: String },
    Result { score: usize, total: usize },
    Notice(String),
    Home,
  }

  #[derive(Default)]
  struct RecordingPresenter {
    shown: Vec<Shown>,
  }

  impl QuizPresenter for RecordingPresenter {
    fn show_question(&mut self, round: usize, _total: usize, prompt: &str, _options: &[String; 3]) {
      self.shown.push(Shown::Question { round, prompt: prompt.to_string() });
    }
    fn show_result(&mut self, score: usize, total: usize) {
      self.shown.push(Shown::Result { score, total });
    }
    fn notify(&mut self, text: &str) {
      self.shown.push(Shown::Notice(text.to_string()));
    }
    fn show_home(&mut self, _text: &str) {
      self.shown.push(Shown::Home);
    }
  }

  // No generator, so every round serves the fixed fallback question whose
  // correct option is A (index 0).
  fn test_state() -> AppState {
    AppState::with_config(BotConfig::default(), None)
  }

  /// Generator whose first call parks until the test releases it; later
  /// calls reply at once. Lets a test overlap other session events with an
  /// in-flight generation.
  struct GatedModel {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
  }

  impl GatedModel {
    fn new() -> Arc<Self> {
      Arc::new(Self { entered: Notify::new(), release: Notify::new(), calls: AtomicUsize::new(0) })
    }
  }

  #[async_trait]
  impl GenerateText for GatedModel {
    async fn ask(&self, _user: &str, _system: &str) -> Result<String, String> {
      if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(model_reply("Вопрос из прошлого запуска?"))
      } else {
        Ok(model_reply("Свежий вопрос?"))
      }
    }
  }

  fn model_reply(prompt: &str) -> String {
    format!("Вопрос: {prompt}\nВарианты:\nA) Раз\nB) Два\nC) Три\nПравильный: A")
  }

  fn gated_state(model: &Arc<GatedModel>) -> AppState {
    AppState::with_config(BotConfig::default(), Some(model.clone() as Arc<dyn GenerateText>))
  }

  #[tokio::test]
  async fn full_session_reaches_the_result_after_ten_rounds() {
    let state = test_state();
    let mut out = RecordingPresenter::default();

    start_quiz(&state, "s-1", &mut out).await;
    for _ in 0..TOTAL_ROUNDS {
      submit_answer(&state, "s-1", 0, &mut out).await;
    }

    let questions = out.shown.iter().filter(|s| matches!(s, Shown::Question { .. })).count();
    assert_eq!(questions, TOTAL_ROUNDS);
    assert!(out.shown.contains(&Shown::Result { score: TOTAL_ROUNDS, total: TOTAL_ROUNDS }));
    assert_eq!(out.shown.last(), Some(&Shown::Home));
    assert_eq!(state.session_count().await, 0, "finished session must be dropped");
  }

  #[tokio::test]
  async fn invalid_answer_leaves_the_quiz_where_it_was() {
    let state = test_state();
    let mut out = RecordingPresenter::default();

    start_quiz(&state, "s-2", &mut out).await;
    submit_answer(&state, "s-2", 5, &mut out).await;

    assert_eq!(
      out.shown.last(),
      Some(&Shown::Notice(state.messages.invalid_answer.clone()))
    );
    let questions = out.shown.iter().filter(|s| matches!(s, Shown::Question { .. })).count();
    assert_eq!(questions, 1, "no new question after a rejected answer");

    // The same round can still be answered.
    submit_answer(&state, "s-2", 0, &mut out).await;
    assert!(out.shown.contains(&Shown::Notice(state.messages.correct_answer.clone())));
  }

  #[tokio::test]
  async fn answer_without_a_started_quiz_only_notifies() {
    let state = test_state();
    let mut out = RecordingPresenter::default();

    submit_answer(&state, "nobody", 0, &mut out).await;
    assert_eq!(out.shown, vec![Shown::Notice(state.messages.invalid_answer.clone())]);
    assert_eq!(state.session_count().await, 0);
  }

  #[tokio::test]
  async fn user_exit_discards_the_session_and_returns_home() {
    let state = test_state();
    let mut out = RecordingPresenter::default();

    start_quiz(&state, "s-3", &mut out).await;
    assert_eq!(state.session_count().await, 1);

    finish_quiz(&state, "s-3", &mut out).await;
    assert_eq!(state.session_count().await, 0);
    assert!(out.shown.contains(&Shown::Notice(state.messages.quiz_exit.clone())));
    assert_eq!(out.shown.last(), Some(&Shown::Home));
  }

  #[tokio::test]
  async fn chat_and_fact_fall_back_to_canned_text_without_a_generator() {
    let state = test_state();

    let reply = do_chat_reply(&state, "посоветуй прикормку для леща").await;
    assert!(reply.contains("сухари"), "stub should answer the groundbait question: {reply}");

    let fact = do_random_fact(&state).await;
    assert!(fact.starts_with(&state.messages.fact_intro));
  }

  #[tokio::test]
  async fn finish_during_generation_discards_the_late_question() {
    let model = GatedModel::new();
    let state = gated_state(&model);

    let quiz_state = state.clone();
    let quiz = tokio::spawn(async move {
      let mut out = RecordingPresenter::default();
      start_quiz(&quiz_state, "s-5", &mut out).await;
      out
    });

    model.entered.notified().await;
    let mut out = RecordingPresenter::default();
    finish_quiz(&state, "s-5", &mut out).await;
    model.release.notify_one();

    let shown = quiz.await.expect("quiz task").shown;
    assert!(
      !shown.iter().any(|s| matches!(s, Shown::Question { .. })),
      "a question generated for a finished quiz must not be shown: {shown:?}"
    );
    assert_eq!(state.session_count().await, 0, "finished session must stay gone");
  }

  #[tokio::test]
  async fn restart_during_generation_discards_the_replaced_runs_question() {
    let model = GatedModel::new();
    let state = gated_state(&model);

    let first_state = state.clone();
    let first = tokio::spawn(async move {
      let mut out = RecordingPresenter::default();
      start_quiz(&first_state, "s-6", &mut out).await;
      out
    });

    // Restart the same session while the first run's generation is parked.
    model.entered.notified().await;
    let mut out = RecordingPresenter::default();
    start_quiz(&state, "s-6", &mut out).await;
    model.release.notify_one();

    let first_shown = first.await.expect("first start").shown;
    assert!(
      !first_shown.iter().any(|s| matches!(s, Shown::Question { .. })),
      "stale question from the replaced run must be dropped: {first_shown:?}"
    );
    assert!(matches!(out.shown.last(), Some(Shown::Question { .. })));

    let cell = state.get_session("s-6").await.expect("restarted session");
    let session = cell.lock().await;
    assert_eq!(session.seen_prompts(), ["Свежий вопрос?"]);
  }
}
