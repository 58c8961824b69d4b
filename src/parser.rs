//! Parsing model replies into structured quiz questions.
//!
//! The model is told to answer in a fixed line-oriented format:
//!
//! ```text
//! Вопрос: <короткий вопрос>
//! Варианты:
//! A) <вариант A>
//! B) <вариант B>
//! C) <вариант C>
//! Правильный: <A|B|C>
//! ```
//!
//! Real replies drift anyway: code fences around the block, CRLF endings,
//! mixed-case labels, prose before or after. The scanner tolerates all of
//! that. It walks the reply line by line, keeps the first non-empty capture
//! per field and rejects the reply unless all five fields are present. A
//! label whose value sits on the next line is not recognized; the format
//! puts label and value on one line.

use crate::domain::{AnswerKey, QuizQuestion};

/// Extract a question from one raw model reply. `None` means the reply does
/// not follow the format and the caller should retry or fall back.
pub fn parse_question(raw: &str) -> Option<QuizQuestion> {
  let text = strip_code_fences(raw);

  let mut prompt: Option<String> = None;
  let mut options: [Option<String>; 3] = [None, None, None];
  let mut correct: Option<AnswerKey> = None;

  for line in text.lines() {
    if prompt.is_none() {
      if let Some(v) = label_value(line, "вопрос") {
        let v = collapse_spaces(v);
        if !v.is_empty() {
          prompt = Some(v);
        }
      }
    }
    for (slot, letter) in options.iter_mut().zip(['A', 'B', 'C']) {
      if slot.is_none() {
        if let Some(v) = option_value(line, letter) {
          let v = collapse_spaces(v);
          if !v.is_empty() {
            *slot = Some(v);
          }
        }
      }
    }
    if correct.is_none() {
      correct = answer_value(line);
    }
  }

  let [a, b, c] = options;
  Some(QuizQuestion {
    prompt: prompt?,
    options: [a?, b?, c?],
    correct: correct?,
  })
}

/// Remove a leading/trailing Markdown fence, including a language tag on the
/// opening fence ("```text"). Unfenced input passes through apart from outer
/// whitespace.
fn strip_code_fences(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix("```") {
    let rest = rest.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_' || c == '-');
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest
      .strip_prefix("\r\n")
      .or_else(|| rest.strip_prefix('\n'))
      .unwrap_or(rest);
    s = rest;
  }
  s = s.trim_end();
  if let Some(body) = s.strip_suffix("```") {
    s = body;
  }
  s.trim()
}

fn collapse_spaces(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Find `label` right before a colon anywhere in the line (so "Вопрос: …"
/// matches with any casing and with spaces before the colon) and return the
/// raw value after that colon.
fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
  for (i, _) in line.match_indices(':') {
    let left = line[..i].trim_end();
    if left.to_lowercase().ends_with(label) {
      return Some(line[i + 1..].trim());
    }
  }
  None
}

/// Match an option line: optional indent, the letter in either case, then
/// ")" immediately after it.
fn option_value(line: &str, letter: char) -> Option<&str> {
  let t = line.trim_start();
  let rest = t
    .strip_prefix(letter)
    .or_else(|| t.strip_prefix(letter.to_ascii_lowercase()))?;
  let rest = rest.strip_prefix(')')?;
  Some(rest.trim())
}

/// Match the answer line. The key must be a single standalone letter, so
/// "Правильный: AB" or a Cyrillic "А" is rejected rather than guessed at.
fn answer_value(line: &str) -> Option<AnswerKey> {
  let v = label_value(line, "правильный")?;
  let mut chars = v.chars();
  let key = AnswerKey::from_letter(chars.next()?)?;
  match chars.next() {
    Some(c) if c.is_alphanumeric() || c == '_' => None,
    _ => Some(key),
  }
}
