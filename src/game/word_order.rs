//! Word order: rebuild the verse from a shuffled bank of its words.
//!
//! Words move by index, never by value, since a verse may repeat a word.

use rand::seq::SliceRandom;
use rand::Rng;

use super::ActionError;
use crate::domain::GameResult;
use crate::util::normalize;

#[derive(Clone, Debug)]
pub struct WordOrderChallenge {
  original: Vec<String>,
  bank: Vec<String>,
  selection: Vec<String>,
}

impl WordOrderChallenge {
  /// Bank holds every token (punctuation intact), Fisher-Yates shuffled.
  pub fn new<R: Rng + ?Sized>(words: Vec<String>, rng: &mut R) -> Self {
    let mut bank = words.clone();
    bank.shuffle(rng);
    Self { original: words, bank, selection: Vec::new() }
  }

  pub fn bank(&self) -> &[String] {
    &self.bank
  }

  pub fn selection(&self) -> &[String] {
    &self.selection
  }

  /// Move one bank word to the end of the selection.
  pub fn pick_from_bank(&mut self, bank_index: usize) -> Result<(), ActionError> {
    check_index(bank_index, self.bank.len())?;
    let word = self.bank.remove(bank_index);
    self.selection.push(word);
    Ok(())
  }

  /// Move one placed word back to the end of the bank.
  pub fn remove_from_selection(&mut self, selection_index: usize) -> Result<(), ActionError> {
    check_index(selection_index, self.selection.len())?;
    let word = self.selection.remove(selection_index);
    self.bank.push(word);
    Ok(())
  }

  /// Drag step: take the word at `from` and insert it at `to`, shifting the rest.
  /// A drag gesture issues one of these per hovered slot.
  pub fn move_within_selection(&mut self, from: usize, to: usize) -> Result<(), ActionError> {
    let len = self.selection.len();
    check_index(from, len)?;
    check_index(to, len)?;
    if from != to {
      let word = self.selection.remove(from);
      self.selection.insert(to, word);
    }
    Ok(())
  }

  /// Whole-sequence comparison: count, identity and order must all match.
  pub fn check_answer(&mut self) -> GameResult {
    let expected = normalize(&self.original.join(" "));
    let got = normalize(&self.selection.join(" "));
    GameResult { is_correct: expected == got, completed: true }
  }
}

fn check_index(index: usize, len: usize) -> Result<(), ActionError> {
  if index < len {
    Ok(())
  } else {
    Err(ActionError::OutOfRange { index, len })
  }
}
