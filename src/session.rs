//! Per-user quiz session: a small state machine advanced one answer at a
//! time, plus the presenter seam that quiz flows render through.

use crate::domain::{AnswerKey, QuizQuestion};

/// Rounds in a full quiz.
pub const TOTAL_ROUNDS: usize = 10;

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
  /// No quiz running (initial state, or after an abort).
  Idle,
  /// Rounds are being played.
  InProgress,
  /// All rounds answered and the result computed.
  Finished,
}

/// What one submitted answer did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
  Correct,
  Wrong,
  /// The answer could not be applied: no quiz running, no pending question,
  /// or an option index outside 0..=2. The session is left untouched.
  Rejected,
}

#[derive(Clone, Debug)]
pub struct QuizSession {
  phase: QuizPhase,
  round_index: usize,
  score: usize,
  current_correct: Option<AnswerKey>,
  seen_prompts: Vec<String>,
  epoch: u64,
}

impl QuizSession {
  pub fn new() -> Self {
    Self {
      phase: QuizPhase::Idle,
      round_index: 0,
      score: 0,
      current_correct: None,
      seen_prompts: Vec::new(),
      epoch: 0,
    }
  }

  /// Begin a fresh quiz, discarding any previous progress. Bumps the epoch
  /// so work still in flight for the replaced run can tell it is stale.
  pub fn start(&mut self) {
    *self = Self { phase: QuizPhase::InProgress, epoch: self.epoch + 1, ..Self::new() };
  }

  /// Remember the answer key of the question just shown to the user.
  pub fn note_issued(&mut self, q: &QuizQuestion) {
    self.current_correct = Some(q.correct);
  }

  /// Apply one answer, given as an option index (0 = A). Out-of-range input
  /// is rejected before anything changes, so the pending question survives
  /// and the user can try again.
  pub fn record_answer(&mut self, chosen: usize) -> AnswerOutcome {
    if self.phase != QuizPhase::InProgress {
      return AnswerOutcome::Rejected;
    }
    let correct = match self.current_correct {
      Some(k) => k,
      None => return AnswerOutcome::Rejected,
    };
    let chosen = match AnswerKey::from_index(chosen) {
      Some(k) => k,
      None => return AnswerOutcome::Rejected,
    };

    self.current_correct = None;
    self.round_index += 1;
    if chosen == correct {
      self.score += 1;
      AnswerOutcome::Correct
    } else {
      AnswerOutcome::Wrong
    }
  }

  /// Close out a completed quiz and return the final score.
  pub fn finish(&mut self) -> usize {
    self.phase = QuizPhase::Finished;
    self.current_correct = None;
    self.score
  }

  /// Drop the quiz entirely (user exit). The epoch survives so a later
  /// `start` still gets a fresh one.
  pub fn abort(&mut self) {
    *self = Self { epoch: self.epoch, ..Self::new() };
  }

  pub fn is_complete(&self) -> bool {
    self.round_index >= TOTAL_ROUNDS
  }

  pub fn phase(&self) -> QuizPhase {
    self.phase
  }

  pub fn round_index(&self) -> usize {
    self.round_index
  }

  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  pub fn score(&self) -> usize {
    self.score
  }

  pub fn seen_prompts(&self) -> &[String] {
    &self.seen_prompts
  }

  pub fn seen_prompts_mut(&mut self) -> &mut Vec<String> {
    &mut self.seen_prompts
  }
}

impl Default for QuizSession {
  fn default() -> Self {
    Self::new()
  }
}

/// Output seam for quiz flows. The transport layers implement this with an
/// outbox of protocol messages; tests record the calls instead. Presenters
/// are carried across await points in the drivers, hence `Send`.
pub trait QuizPresenter: Send {
  /// Show round `round` of `total` with its prompt and three options.
  fn show_question(&mut self, round: usize, total: usize, prompt: &str, options: &[String; 3]);
  /// Show the final score.
  fn show_result(&mut self, score: usize, total: usize);
  /// One-line feedback (correct/wrong/could-not-parse and the like).
  fn notify(&mut self, text: &str);
  /// Return the user to the home menu with the given text.
  fn show_home(&mut self, text: &str);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn question(correct: AnswerKey) -> QuizQuestion {
    QuizQuestion {
      prompt: "Вопрос для теста".into(),
      options: ["Раз".into(), "Два".into(), "Три".into()],
      correct,
    }
  }

  #[test]
  fn score_and_round_advance_on_answers() {
    let mut s = QuizSession::new();
    s.start();

    s.note_issued(&question(AnswerKey::A));
    assert_eq!(s.record_answer(0), AnswerOutcome::Correct);
    s.note_issued(&question(AnswerKey::B));
    assert_eq!(s.record_answer(2), AnswerOutcome::Wrong);
    s.note_issued(&question(AnswerKey::C));
    assert_eq!(s.record_answer(2), AnswerOutcome::Correct);

    assert_eq!(s.score(), 2);
    assert_eq!(s.round_index(), 3);
  }

  #[test]
  fn out_of_range_answer_changes_nothing() {
    let mut s = QuizSession::new();
    s.start();
    s.note_issued(&question(AnswerKey::A));

    assert_eq!(s.record_answer(5), AnswerOutcome::Rejected);
    assert_eq!(s.round_index(), 0);
    assert_eq!(s.score(), 0);
    // The pending question survives and can still be answered.
    assert_eq!(s.record_answer(0), AnswerOutcome::Correct);
  }

  #[test]
  fn answer_without_a_pending_question_is_rejected() {
    let mut s = QuizSession::new();
    assert_eq!(s.record_answer(0), AnswerOutcome::Rejected);
    s.start();
    assert_eq!(s.record_answer(0), AnswerOutcome::Rejected);
  }

  #[test]
  fn start_resets_previous_progress() {
    let mut s = QuizSession::new();
    s.start();
    s.note_issued(&question(AnswerKey::A));
    s.record_answer(0);
    s.seen_prompts_mut().push("старый вопрос".into());

    s.start();
    assert_eq!(s.phase(), QuizPhase::InProgress);
    assert_eq!(s.round_index(), 0);
    assert_eq!(s.score(), 0);
    assert!(s.seen_prompts().is_empty());
  }

  #[test]
  fn restarts_never_reuse_an_epoch() {
    let mut s = QuizSession::new();
    s.start();
    let first = s.epoch();
    s.start();
    let second = s.epoch();
    assert_ne!(first, second);

    s.abort();
    s.start();
    assert_ne!(s.epoch(), first);
    assert_ne!(s.epoch(), second);
  }

  #[test]
  fn ten_answered_rounds_complete_the_quiz() {
    let mut s = QuizSession::new();
    s.start();
    for _ in 0..TOTAL_ROUNDS {
      assert!(!s.is_complete());
      s.note_issued(&question(AnswerKey::B));
      assert_eq!(s.record_answer(1), AnswerOutcome::Correct);
    }
    assert!(s.is_complete());
    assert_eq!(s.finish(), TOTAL_ROUNDS);
    assert_eq!(s.phase(), QuizPhase::Finished);
  }
}
