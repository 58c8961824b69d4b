//! Question acquisition for the quiz: retrying generation, duplicate
//! filtering, and the fixed fallback question.

use tracing::{info, warn, error};

use crate::config::{Prompts, QUIZ_FORMAT_VERSION};
use crate::domain::{AnswerKey, QuestionSource, QuizQuestion};
use crate::openai::GenerateText;
use crate::parser::parse_question;
use crate::util::trunc_for_log;

/// Generation attempts per round before giving up and serving the fallback.
pub const MAX_ATTEMPTS: usize = 3;

/// Produce the next question for a quiz. Each attempt asks the model once;
/// unparseable replies and prompts already in `seen` burn an attempt. An
/// accepted prompt is pushed onto `seen`. The fallback is never recorded
/// there, so it may repeat within one quiz.
pub async fn acquire_question(
  model: &dyn GenerateText,
  prompts: &Prompts,
  seen: &mut Vec<String>,
) -> (QuizQuestion, QuestionSource) {
  for attempt in 1..=MAX_ATTEMPTS {
    let raw = match model.ask(&prompts.quiz_user, &prompts.quiz_system).await {
      Ok(text) => text,
      Err(e) => {
        error!(target: "quiz", attempt, error = %e, "Question generation call failed");
        String::new()
      }
    };

    match parse_question(&raw) {
      Some(q) if !seen.contains(&q.prompt) => {
        seen.push(q.prompt.clone());
        info!(target: "quiz", attempt, prompt = %trunc_for_log(&q.prompt, 60), "Question accepted");
        return (q, QuestionSource::Generated);
      }
      Some(q) => {
        warn!(target: "quiz", attempt, prompt = %trunc_for_log(&q.prompt, 60), "Duplicate question, retrying");
      }
      None => {
        warn!(target: "quiz", attempt, format = QUIZ_FORMAT_VERSION, raw = %trunc_for_log(&raw, 120), "Unparseable model reply");
      }
    }
  }

  warn!(target: "quiz", attempts = MAX_ATTEMPTS, "Generation budget exhausted, serving fallback question");
  (fallback_question(), QuestionSource::Fallback)
}

/// The fixed question served when generation keeps failing.
pub fn fallback_question() -> QuizQuestion {
  QuizQuestion {
    prompt: "Какой тип поводка лучше выбрать для осторожной рыбы?".into(),
    options: [
      "Флюорокарбоновый".into(),
      "Стальной".into(),
      "Без поводка".into(),
    ],
    correct: AnswerKey::A,
  }
}
