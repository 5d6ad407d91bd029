//! Type it out: the whole verse from memory, with an optional progressive word reveal.

use crate::domain::GameResult;
use crate::util::normalize;

/// Words added to the hint on each reveal.
const REVEAL_STEP: usize = 3;

#[derive(Clone, Debug)]
pub struct TypingChallenge {
  text: String,
  words: Vec<String>,
  input: String,
  revealed: usize,
}

impl TypingChallenge {
  pub fn new(text: &str, words: Vec<String>, show_hints: bool) -> Self {
    let revealed = if show_hints { words.len().min(1) } else { 0 };
    Self { text: text.to_string(), words, input: String::new(), revealed }
  }

  pub fn input(&self) -> &str {
    &self.input
  }

  pub fn set_input(&mut self, text: &str) {
    self.input.clear();
    self.input.push_str(text);
  }

  pub fn revealed_words(&self) -> &[String] {
    &self.words[..self.revealed]
  }

  pub fn can_reveal_more(&self) -> bool {
    self.revealed < self.words.len()
  }

  /// Grow the hint by three words, capped at the verse length.
  pub fn reveal_more(&mut self) {
    self.revealed = (self.revealed + REVEAL_STEP).min(self.words.len());
  }

  pub fn check_answer(&mut self) -> GameResult {
    GameResult { is_correct: normalize(&self.input) == normalize(&self.text), completed: true }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::tokenize;

  const VERSE: &str = "Be still, and know that I am God.";

  fn challenge(show_hints: bool) -> TypingChallenge {
    TypingChallenge::new(VERSE, tokenize(VERSE), show_hints)
  }

  #[test]
  fn hints_reveal_first_word_only() {
    let c = challenge(true);
    assert_eq!(c.revealed_words(), &["Be".to_string()]);
    assert_eq!(c.input(), "");
    assert!(challenge(false).revealed_words().is_empty());
  }

  #[test]
  fn reveal_more_grows_by_three_and_caps() {
    let mut c = challenge(true);
    c.reveal_more();
    assert_eq!(c.revealed_words().len(), 4);
    c.reveal_more();
    assert_eq!(c.revealed_words().len(), 7);
    assert!(c.can_reveal_more());
    c.reveal_more();
    assert_eq!(c.revealed_words().len(), 8);
    assert!(!c.can_reveal_more());
    c.reveal_more();
    assert_eq!(c.revealed_words().len(), 8);
  }

  #[test]
  fn matching_modulo_case_and_punctuation_is_correct() {
    let mut c = challenge(false);
    c.set_input("be still and KNOW that i am god");
    assert!(c.check_answer().is_correct);
    c.set_input("  Be still, and know that I am God!  ");
    assert!(c.check_answer().is_correct);
  }

  #[test]
  fn inserted_or_missing_word_is_incorrect() {
    let mut c = challenge(false);
    c.set_input("Be still and know that I am the God");
    assert!(!c.check_answer().is_correct);
    c.set_input("Be still and know I am God");
    assert!(!c.check_answer().is_correct);
    c.set_input("");
    let r = c.check_answer();
    assert!(!r.is_correct);
    assert!(r.completed);
  }

  #[test]
  fn empty_verse_reveals_nothing() {
    let mut c = TypingChallenge::new("", Vec::new(), true);
    assert!(c.revealed_words().is_empty());
    c.reveal_more();
    assert!(c.revealed_words().is_empty());
  }
}
