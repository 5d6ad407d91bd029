//! Practice-game engine: builds a challenge from verse text, captures responses, grades them.
//!
//! One `Challenge` value holds the whole in-progress state of the active game.
//! It is replaced wholesale on every rebuild (new verse, new game type, reset),
//! so no field of one game can leak into another.
//!
//! Randomness is injected by the caller (`&mut impl Rng`) so construction is
//! reproducible under a seeded generator.

use rand::Rng;
use thiserror::Error;

use crate::domain::{GameResult, GameType};
use crate::util::tokenize;

pub mod fill_blank;
pub mod typing;
pub mod word_order;

pub use fill_blank::{BlankToken, FillBlankChallenge};
pub use typing::TypingChallenge;
pub use word_order::WordOrderChallenge;

/// Why a response-capture call was refused. The challenge is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
  #[error("action belongs to {action}, but the active game is {active}")]
  WrongGame { action: &'static str, active: &'static str },
  #[error("position {0} is not a blank")]
  NotABlank(usize),
  #[error("index {index} out of range (len {len})")]
  OutOfRange { index: usize, len: usize },
}

/// In-progress game state for one (verse, game type) pair.
#[derive(Clone, Debug)]
pub enum Challenge {
  FillBlank(FillBlankChallenge),
  WordOrder(WordOrderChallenge),
  Typing(TypingChallenge),
}

impl Challenge {
  /// Build a fresh challenge. `text` is the display text (trimmed here again for safety).
  pub fn build<R: Rng + ?Sized>(game_type: GameType, text: &str, show_hints: bool, rng: &mut R) -> Self {
    let text = text.trim();
    let words = tokenize(text);
    match game_type {
      GameType::FillBlank => Challenge::FillBlank(FillBlankChallenge::new(words, rng)),
      GameType::WordOrder => Challenge::WordOrder(WordOrderChallenge::new(words, rng)),
      GameType::Typing => Challenge::Typing(TypingChallenge::new(text, words, show_hints)),
    }
  }

  pub fn game_type(&self) -> GameType {
    match self {
      Challenge::FillBlank(_) => GameType::FillBlank,
      Challenge::WordOrder(_) => GameType::WordOrder,
      Challenge::Typing(_) => GameType::Typing,
    }
  }

  /// Grade the current responses. Safe to call repeatedly.
  pub fn check_answer(&mut self) -> GameResult {
    match self {
      Challenge::FillBlank(c) => c.check_answer(),
      Challenge::WordOrder(c) => c.check_answer(),
      Challenge::Typing(c) => c.check_answer(),
    }
  }

  pub fn set_blank_input(&mut self, position: usize, text: &str) -> Result<(), ActionError> {
    match self {
      Challenge::FillBlank(c) => c.set_blank_input(position, text),
      other => Err(other.wrong_game(GameType::FillBlank)),
    }
  }

  pub fn pick_from_bank(&mut self, bank_index: usize) -> Result<(), ActionError> {
    match self {
      Challenge::WordOrder(c) => c.pick_from_bank(bank_index),
      other => Err(other.wrong_game(GameType::WordOrder)),
    }
  }

  pub fn remove_from_selection(&mut self, selection_index: usize) -> Result<(), ActionError> {
    match self {
      Challenge::WordOrder(c) => c.remove_from_selection(selection_index),
      other => Err(other.wrong_game(GameType::WordOrder)),
    }
  }

  pub fn move_within_selection(&mut self, from: usize, to: usize) -> Result<(), ActionError> {
    match self {
      Challenge::WordOrder(c) => c.move_within_selection(from, to),
      other => Err(other.wrong_game(GameType::WordOrder)),
    }
  }

  pub fn set_input(&mut self, text: &str) -> Result<(), ActionError> {
    match self {
      Challenge::Typing(c) => {
        c.set_input(text);
        Ok(())
      }
      other => Err(other.wrong_game(GameType::Typing)),
    }
  }

  pub fn reveal_more(&mut self) -> Result<(), ActionError> {
    match self {
      Challenge::Typing(c) => {
        c.reveal_more();
        Ok(())
      }
      other => Err(other.wrong_game(GameType::Typing)),
    }
  }

  fn wrong_game(&self, action: GameType) -> ActionError {
    ActionError::WrongGame { action: action.as_str(), active: self.game_type().as_str() }
  }
}
