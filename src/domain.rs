//! Domain models used by the backend: answer keys, question sources, and the
//! structured quiz question itself.

/// One of the three answer slots of a quiz question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerKey {
  A,
  B,
  C,
}

impl AnswerKey {
  /// Display index to key (0 = A, 1 = B, 2 = C). Anything else is `None`.
  pub fn from_index(i: usize) -> Option<Self> {
    match i {
      0 => Some(AnswerKey::A),
      1 => Some(AnswerKey::B),
      2 => Some(AnswerKey::C),
      _ => None,
    }
  }

  /// Letter from the generation format, either case.
  pub fn from_letter(ch: char) -> Option<Self> {
    match ch {
      'A' | 'a' => Some(AnswerKey::A),
      'B' | 'b' => Some(AnswerKey::B),
      'C' | 'c' => Some(AnswerKey::C),
      _ => None,
    }
  }
}

/// Where did a served question come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
  Generated, // produced by the model and accepted by the parser
  Fallback,  // the built-in question served when generation cannot deliver
}

/// A fully structured quiz question. The parser only ever produces values
/// with a non-empty prompt and three non-empty options; there are no partial
/// questions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizQuestion {
  pub prompt: String,
  pub options: [String; 3],
  pub correct: AnswerKey,
}
