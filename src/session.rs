//! One learner's practice session: which verse, which game, and the live challenge.
//!
//! Lifecycle per verse:
//!   navigation → `Loading { ticket }` → (resolver runs elsewhere) → `complete_load`
//!   → `Ready(Round)` → responses / grading → next navigation.
//!
//! Every load issues a fresh ticket. Only the result carrying the current ticket
//! is applied; anything older is dropped, so a slow fetch for verse N can never
//! land on top of verse N+1. While loading there is no challenge, and response
//! calls are refused.
//!
//! Every built challenge also gets a round id (new verse, reset, game switch).
//! Clients echo it with their input so a response aimed at a replaced challenge
//! is refused instead of landing on the new one.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::domain::{GameResult, GameType, ResolvedVerse, Verse};
use crate::game::{ActionError, Challenge};

/// Why a session call did nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("no verses loaded")]
  NoContent,
  #[error("verse is still loading")]
  Loading,
  #[error("input was for round {sent}, current round is {current}")]
  StaleRound { sent: u64, current: u64 },
  #[error(transparent)]
  Action(#[from] ActionError),
}

/// Identifies one verse load. Hand it to the resolver, give it back with the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
  pub id: u64,
  pub index: usize,
}

/// The playable state for one resolved verse.
#[derive(Clone, Debug)]
pub struct Round {
  pub id: u64,
  pub verse: ResolvedVerse,
  pub challenge: Challenge,
  pub result: Option<GameResult>,
  pub show_answer: bool,
}

#[derive(Clone, Debug)]
pub enum Phase {
  /// Terminal "no content" state: the verse list is empty.
  Empty,
  Loading { ticket: u64 },
  Ready(Round),
}

pub struct PracticeSession {
  verses: Arc<Vec<Verse>>,
  index: usize,
  game_type: GameType,
  show_hints: bool,
  rng: StdRng,
  last_ticket: u64,
  last_round: u64,
  phase: Phase,
}

/// Seeded generator when a seed is configured, entropy otherwise.
pub fn session_rng(seed: Option<u64>) -> StdRng {
  match seed {
    Some(s) => StdRng::seed_from_u64(s),
    None => StdRng::from_entropy(),
  }
}

impl PracticeSession {
  pub fn new(verses: Arc<Vec<Verse>>, game_type: GameType, show_hints: bool, rng: StdRng) -> Self {
    Self { verses, index: 0, game_type, show_hints, rng, last_ticket: 0, last_round: 0, phase: Phase::Empty }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn verse_count(&self) -> usize {
    self.verses.len()
  }

  pub fn game_type(&self) -> GameType {
    self.game_type
  }

  pub fn show_hints(&self) -> bool {
    self.show_hints
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  /// The verse at the active index, if any.
  pub fn current_verse(&self) -> Option<&Verse> {
    self.verses.get(self.index)
  }

  /// Verse a ticket was issued for.
  pub fn verse_for(&self, ticket: LoadTicket) -> Option<&Verse> {
    self.verses.get(ticket.index)
  }

  /// (Re)load the verse at the current index. `None` when there is nothing to load.
  pub fn start(&mut self) -> Option<LoadTicket> {
    if self.verses.is_empty() {
      self.phase = Phase::Empty;
      return None;
    }
    self.last_ticket += 1;
    self.phase = Phase::Loading { ticket: self.last_ticket };
    debug!(target: "game", ticket = self.last_ticket, index = self.index, "Verse load started");
    Some(LoadTicket { id: self.last_ticket, index: self.index })
  }

  /// Swap in a new verse list (e.g. after the CSV URL changed) and start at its first verse.
  pub fn replace_verses(&mut self, verses: Arc<Vec<Verse>>) -> Option<LoadTicket> {
    self.verses = verses;
    self.index = 0;
    self.start()
  }

  /// Apply a resolver result. Returns false, changing nothing, if the ticket is stale.
  pub fn complete_load(&mut self, ticket: LoadTicket, verse: ResolvedVerse) -> bool {
    match self.phase {
      Phase::Loading { ticket: current } if current == ticket.id && ticket.index == self.index => {
        let challenge = Challenge::build(self.game_type, &verse.text, self.show_hints, &mut self.rng);
        self.last_round += 1;
        debug!(target: "game", ticket = ticket.id, round = self.last_round, index = ticket.index, game = self.game_type.as_str(), "Challenge built");
        self.phase = Phase::Ready(Round { id: self.last_round, verse, challenge, result: None, show_answer: false });
        true
      }
      _ => {
        debug!(target: "game", ticket = ticket.id, current = self.last_ticket, "Discarding stale verse load");
        false
      }
    }
  }

  /// Move forward one verse. No-op at the last verse.
  pub fn next(&mut self) -> Option<LoadTicket> {
    if self.index + 1 >= self.verses.len() {
      return None;
    }
    self.index += 1;
    self.start()
  }

  /// Move back one verse. No-op at the first verse.
  pub fn previous(&mut self) -> Option<LoadTicket> {
    if self.index == 0 || self.verses.is_empty() {
      return None;
    }
    self.index -= 1;
    self.start()
  }

  /// Jump straight to a verse. Same index or out of range is a no-op.
  pub fn select(&mut self, index: usize) -> Result<Option<LoadTicket>, SessionError> {
    if self.verses.is_empty() {
      return Err(SessionError::NoContent);
    }
    if index >= self.verses.len() {
      return Err(ActionError::OutOfRange { index, len: self.verses.len() }.into());
    }
    if index == self.index {
      return Ok(None);
    }
    self.index = index;
    Ok(self.start())
  }

  /// Switch games on the same verse; a real switch always builds a fresh challenge.
  /// While loading the choice is remembered and used when the verse arrives.
  pub fn set_game_type(&mut self, game_type: GameType) -> bool {
    if game_type == self.game_type {
      return false;
    }
    self.game_type = game_type;
    self.rebuild();
    true
  }

  /// Rebuild the current (verse, game) pair with new randomness.
  pub fn reset(&mut self) -> Result<(), SessionError> {
    self.round_mut()?;
    self.rebuild();
    Ok(())
  }

  /// Takes effect on the next challenge build.
  pub fn set_show_hints(&mut self, show_hints: bool) {
    self.show_hints = show_hints;
  }

  fn rebuild(&mut self) {
    if let Phase::Ready(round) = &mut self.phase {
      self.last_round += 1;
      round.id = self.last_round;
      round.challenge = Challenge::build(self.game_type, &round.verse.text, self.show_hints, &mut self.rng);
      round.result = None;
      round.show_answer = false;
      debug!(target: "game", index = self.index, game = self.game_type.as_str(), "Challenge rebuilt");
    }
  }

  /// Id of the challenge on screen, if there is one.
  pub fn round_id(&self) -> Option<u64> {
    match &self.phase {
      Phase::Ready(round) => Some(round.id),
      _ => None,
    }
  }

  /// Accept input only when it was aimed at the challenge currently on screen.
  pub fn check_round(&self, round: u64) -> Result<(), SessionError> {
    match &self.phase {
      Phase::Ready(r) if r.id == round => Ok(()),
      Phase::Ready(r) => Err(SessionError::StaleRound { sent: round, current: r.id }),
      Phase::Loading { .. } => Err(SessionError::Loading),
      Phase::Empty => Err(SessionError::NoContent),
    }
  }

  fn round_mut(&mut self) -> Result<&mut Round, SessionError> {
    match &mut self.phase {
      Phase::Ready(round) => Ok(round),
      Phase::Loading { .. } => Err(SessionError::Loading),
      Phase::Empty => Err(SessionError::NoContent),
    }
  }

  // --- Response capture ---

  pub fn set_blank_input(&mut self, position: usize, text: &str) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.set_blank_input(position, text)?)
  }

  pub fn pick_from_bank(&mut self, bank_index: usize) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.pick_from_bank(bank_index)?)
  }

  pub fn remove_from_selection(&mut self, selection_index: usize) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.remove_from_selection(selection_index)?)
  }

  pub fn move_within_selection(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.move_within_selection(from, to)?)
  }

  pub fn set_input(&mut self, text: &str) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.set_input(text)?)
  }

  pub fn reveal_more(&mut self) -> Result<(), SessionError> {
    Ok(self.round_mut()?.challenge.reveal_more()?)
  }

  // --- Grading / display ---

  pub fn check_answer(&mut self) -> Result<GameResult, SessionError> {
    let round = self.round_mut()?;
    let result = round.challenge.check_answer();
    round.result = Some(result);
    Ok(result)
  }

  pub fn toggle_answer(&mut self) -> Result<bool, SessionError> {
    let round = self.round_mut()?;
    round.show_answer = !round.show_answer;
    Ok(round.show_answer)
  }
}
