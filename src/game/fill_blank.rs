//! Fill-in-the-blank: a quarter of the inner words are hidden and must be typed back.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::Serialize;

use super::ActionError;
use crate::domain::{BlankStatus, GameResult};
use crate::util::normalize;

/// Minimum number of blanks asked for, whatever the verse length.
const MIN_BLANKS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankToken {
  pub word: String,
  pub is_blank: bool,
}

#[derive(Clone, Debug)]
pub struct FillBlankChallenge {
  tokens: Vec<BlankToken>,
  inputs: BTreeMap<usize, String>,
  status: BTreeMap<usize, BlankStatus>,
}

/// `max(2, floor(n * 0.25))`.
pub fn blank_count(word_count: usize) -> usize {
  MIN_BLANKS.max(word_count / 4)
}

/// Pick distinct positions in `[1, n-2]`, never the first or last word.
/// The count is clamped to what the range can hold, so short verses terminate.
pub fn choose_blank_positions<R: Rng + ?Sized>(word_count: usize, rng: &mut R) -> BTreeSet<usize> {
  let mut picked = BTreeSet::new();
  if word_count < 3 {
    return picked;
  }
  let last_inner = word_count - 2;
  let wanted = blank_count(word_count).min(last_inner);
  while picked.len() < wanted {
    // duplicates are simply drawn again
    picked.insert(rng.gen_range(1..=last_inner));
  }
  picked
}

impl FillBlankChallenge {
  pub fn new<R: Rng + ?Sized>(words: Vec<String>, rng: &mut R) -> Self {
    let blanks = choose_blank_positions(words.len(), rng);
    let tokens = words
      .into_iter()
      .enumerate()
      .map(|(idx, word)| BlankToken { word, is_blank: blanks.contains(&idx) })
      .collect();
    let inputs = blanks.iter().map(|&idx| (idx, String::new())).collect();
    Self { tokens, inputs, status: BTreeMap::new() }
  }

  pub fn tokens(&self) -> &[BlankToken] {
    &self.tokens
  }

  pub fn blank_positions(&self) -> impl Iterator<Item = usize> + '_ {
    self.inputs.keys().copied()
  }

  pub fn input(&self, position: usize) -> Option<&str> {
    self.inputs.get(&position).map(String::as_str)
  }

  /// `None` until the challenge has been graded at least once.
  pub fn status(&self, position: usize) -> Option<BlankStatus> {
    self.status.get(&position).copied()
  }

  /// Overwrite the buffer of one blank. No validation happens until grading.
  pub fn set_blank_input(&mut self, position: usize, text: &str) -> Result<(), ActionError> {
    match self.inputs.get_mut(&position) {
      Some(buf) => {
        buf.clear();
        buf.push_str(text);
        Ok(())
      }
      None if position >= self.tokens.len() => {
        Err(ActionError::OutOfRange { index: position, len: self.tokens.len() })
      }
      None => Err(ActionError::NotABlank(position)),
    }
  }

  fn grade(&self, position: usize) -> BlankStatus {
    let user = self.input(position).map(normalize).unwrap_or_default();
    if user.is_empty() {
      BlankStatus::Empty
    } else if user == normalize(&self.tokens[position].word) {
      BlankStatus::Correct
    } else {
      BlankStatus::Incorrect
    }
  }

  /// Positional grading with no partial credit: every blank must be `Correct`.
  pub fn check_answer(&mut self) -> GameResult {
    let graded: Vec<(usize, BlankStatus)> = self.blank_positions().map(|p| (p, self.grade(p))).collect();
    let all_correct = graded.iter().all(|(_, s)| *s == BlankStatus::Correct);
    self.status.extend(graded);
    GameResult { is_correct: all_correct, completed: true }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::tokenize;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{i}")).collect()
  }

  #[test]
  fn blank_count_follows_quarter_rule_with_floor_of_two() {
    assert_eq!(blank_count(0), 2);
    assert_eq!(blank_count(7), 2);
    assert_eq!(blank_count(8), 2);
    assert_eq!(blank_count(12), 3);
    assert_eq!(blank_count(40), 10);
    assert_eq!(blank_count(43), 10);
  }

  #[test]
  fn positions_are_distinct_inner_and_counted() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in 0..60 {
      for _ in 0..20 {
        let picked = choose_blank_positions(n, &mut rng);
        let available = n.saturating_sub(2);
        assert_eq!(picked.len(), blank_count(n).min(available), "n={n}");
        for &p in &picked {
          assert!(p >= 1 && p + 2 <= n, "position {p} outside [1, {}] for n={n}", n as isize - 2);
        }
      }
    }
  }

  #[test]
  fn short_verses_use_every_available_position() {
    let mut rng = StdRng::seed_from_u64(5);
    assert!(choose_blank_positions(1, &mut rng).is_empty());
    assert!(choose_blank_positions(2, &mut rng).is_empty());
    assert_eq!(choose_blank_positions(3, &mut rng).into_iter().collect::<Vec<_>>(), vec![1]);
    assert_eq!(choose_blank_positions(4, &mut rng).into_iter().collect::<Vec<_>>(), vec![1, 2]);
  }

  #[test]
  fn new_marks_blanks_and_starts_empty() {
    let mut rng = StdRng::seed_from_u64(9);
    let c = FillBlankChallenge::new(words(20), &mut rng);
    let blanks: Vec<usize> = c.blank_positions().collect();
    assert_eq!(blanks.len(), 5);
    for (idx, t) in c.tokens().iter().enumerate() {
      assert_eq!(t.is_blank, blanks.contains(&idx));
      assert_eq!(t.word, format!("w{idx}"));
    }
    for &b in &blanks {
      assert_eq!(c.input(b), Some(""));
      assert_eq!(c.status(b), None);
    }
  }

  #[test]
  fn exact_words_in_any_case_with_punctuation_grade_correct() {
    let mut rng = StdRng::seed_from_u64(21);
    let text = "For God so loved the world, that he gave his only begotten Son.";
    let mut c = FillBlankChallenge::new(tokenize(text), &mut rng);
    let blanks: Vec<usize> = c.blank_positions().collect();
    for &b in &blanks {
      let answer = format!("{}!", c.tokens()[b].word.to_uppercase());
      c.set_blank_input(b, &answer).unwrap();
    }
    let result = c.check_answer();
    assert!(result.is_correct);
    assert!(result.completed);
    for &b in &blanks {
      assert_eq!(c.status(b), Some(BlankStatus::Correct));
    }
  }

  #[test]
  fn one_empty_blank_fails_the_whole_challenge() {
    let mut rng = StdRng::seed_from_u64(22);
    let mut c = FillBlankChallenge::new(words(16), &mut rng);
    let blanks: Vec<usize> = c.blank_positions().collect();
    let (left_empty, rest) = blanks.split_first().unwrap();
    for &b in rest {
      let w = c.tokens()[b].word.clone();
      c.set_blank_input(b, &w).unwrap();
    }
    let result = c.check_answer();
    assert!(!result.is_correct);
    assert_eq!(c.status(*left_empty), Some(BlankStatus::Empty));
    for &b in rest {
      assert_eq!(c.status(b), Some(BlankStatus::Correct));
    }
  }

  #[test]
  fn wrong_word_is_marked_incorrect_and_grading_is_repeatable() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut c = FillBlankChallenge::new(words(12), &mut rng);
    let blanks: Vec<usize> = c.blank_positions().collect();
    for &b in &blanks {
      c.set_blank_input(b, "nope").unwrap();
    }
    let first = c.check_answer();
    let second = c.check_answer();
    assert_eq!(first, second);
    assert!(!first.is_correct);
    assert!(blanks.iter().all(|&b| c.status(b) == Some(BlankStatus::Incorrect)));
  }

  #[test]
  fn whitespace_only_input_counts_as_empty() {
    let mut rng = StdRng::seed_from_u64(24);
    let mut c = FillBlankChallenge::new(words(8), &mut rng);
    let b = c.blank_positions().next().unwrap();
    c.set_blank_input(b, "  ,. ").unwrap();
    c.check_answer();
    assert_eq!(c.status(b), Some(BlankStatus::Empty));
  }

  #[test]
  fn input_on_non_blank_positions_is_rejected() {
    let mut rng = StdRng::seed_from_u64(25);
    let mut c = FillBlankChallenge::new(words(10), &mut rng);
    assert_eq!(c.set_blank_input(0, "w0"), Err(ActionError::NotABlank(0)));
    assert_eq!(c.set_blank_input(10, "x"), Err(ActionError::OutOfRange { index: 10, len: 10 }));
  }
}
