//! Loading bot configuration (prompts + user-facing messages) from TOML.
//!
//! See `BotConfig`, `Prompts` and `Messages` for the expected schema. Every
//! field has a compiled-in Russian default so the backend runs without any
//! config file at all.

use serde::Deserialize;
use tracing::{info, error};

/// Version marker for the quiz generation format. The instruction template
/// below and the grammar in `parser.rs` form one contract: bump this and
/// change both sides together.
pub const QUIZ_FORMAT_VERSION: &str = "quiz.ru.v1";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BotConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub messages: Messages,
}

/// Prompts sent to the OpenAI client. Override them in TOML to tune tone;
/// keep `quiz_user` in lockstep with the parser if you touch the format.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub quiz_system: String,
  pub quiz_user: String,
  pub chat_system: String,
  pub fact_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_system: "Ты — опытный рыбак и ведущий викторины о рыбалке: снасти, техника ловли, виды рыб, сезонность, безопасность на воде. Отвечай строго в запрошенном формате, без лишнего текста.".into(),
      quiz_user: "Сгенерируй ОДИН тестовый вопрос о рыбалке на русском языке с ТРЕМЯ вариантами.\n\
        ФОРМАТ ОТВЕТА (строго, БЕЗ пояснений, БЕЗ дополнительного текста):\n\
        Вопрос: <короткий вопрос>\n\
        Варианты:\n\
        A) <вариант A>\n\
        B) <вариант B>\n\
        C) <вариант C>\n\
        Правильный: <A|B|C>\n\
        Требования: без переносов строки внутри вариантов; без кавычек «ёлочек»; новый вопрос, не повторяй предыдущие.".into(),
      chat_system: "Ты — дружелюбный бот-рыбак. Отвечай кратко и по делу: советы о снастях, прикормке, выборе места и погоде для ловли.".into(),
      fact_system: "Расскажи один интересный и малоизвестный факт о рыбалке или рыбах. Коротко, 2-3 предложения, на русском языке. Каждый раз новый факт.".into(),
    }
  }
}

/// User-visible message texts. All of them can be overridden in TOML;
/// `finish_template` supports `{score}` and `{total}` placeholders.
#[derive(Clone, Debug, Deserialize)]
pub struct Messages {
  pub greeting: String,
  pub correct_answer: String,
  pub wrong_answer: String,
  pub invalid_answer: String,
  pub finish_template: String,
  pub quiz_exit: String,
  pub fact_intro: String,
  pub generic_error: String,
  pub weather_error: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      greeting: "Привет! Я бот-рыбак. Могу провести викторину о рыбалке, рассказать интересный факт, поболтать или показать прогноз погоды на 3 дня по координатам.".into(),
      correct_answer: "Верно ✅".into(),
      wrong_answer: "Неверно ❌".into(),
      invalid_answer: "Не удалось распознать ответ".into(),
      finish_template: "Готово! Правильных ответов: *{score}* из *{total}*.".into(),
      quiz_exit: "Квиз завершён. Возвращаемся в меню…".into(),
      fact_intro: "Интересный факт о рыбалке 🎣".into(),
      generic_error: "ОЙ, случилась ошибка. Давай попробуем позже.".into(),
      weather_error: "Не удалось получить прогноз. Попробуем позже.".into(),
    }
  }
}

/// Attempt to load `BotConfig` from BOT_CONFIG_PATH. On any parsing/IO error,
/// returns None and the caller falls back to the defaults.
pub fn load_bot_config_from_env() -> Option<BotConfig> {
  let path = std::env::var("BOT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BotConfig>(&s) {
      Ok(cfg) => {
        info!(target: "klyov_backend", %path, "Loaded bot config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "klyov_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "klyov_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
