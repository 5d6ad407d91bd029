//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::bible_api::BibleVersion;
use crate::domain::{BlankStatus, GameResult, GameType, Verse, VerseSourceKind};
use crate::game::Challenge;
use crate::session::{Phase, PracticeSession};
use crate::settings::Settings;

/// Messages the client can send over WebSocket.
///
/// Input and grading messages carry the `round` from the last `state` they were
/// made against; a mismatch is answered with `ignored`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// (Re)load the current verse; sent once after connecting.
    Start,
    Next,
    Previous,
    SelectVerse {
        index: usize,
    },
    SetGameType {
        #[serde(rename = "gameType")]
        game_type: GameType,
    },
    Reset,
    SetBlankInput {
        round: u64,
        position: usize,
        text: String,
    },
    PickFromBank {
        round: u64,
        #[serde(rename = "bankIndex")]
        bank_index: usize,
    },
    RemoveFromSelection {
        round: u64,
        #[serde(rename = "selectionIndex")]
        selection_index: usize,
    },
    MoveWithinSelection {
        round: u64,
        from: usize,
        to: usize,
    },
    SetInput {
        round: u64,
        text: String,
    },
    RevealMore {
        round: u64,
    },
    CheckAnswer {
        round: u64,
    },
    ToggleAnswer {
        round: u64,
    },
    SaveSettings {
        settings: Settings,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// A verse is being resolved; no challenge exists until `state` arrives.
    Loading {
        index: usize,
        total: usize,
        reference: String,
    },
    State {
        state: SessionView,
    },
    /// Terminal "no content" display state.
    Empty {
        message: String,
    },
    /// The action did not apply (stale, wrong game, bad index). State is unchanged.
    Ignored {
        reason: String,
    },
    Settings {
        settings: Settings,
    },
    Error {
        message: String,
    },
}

/// Everything the shell needs to draw the practice screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Echo this back with every input for the challenge shown here.
    pub round: u64,
    pub index: usize,
    pub total: usize,
    pub game_type: GameType,
    pub show_hints: bool,
    pub reference: String,
    pub version: String,
    pub source: VerseSourceKind,
    pub challenge: ChallengeView,
    pub result: Option<GameResult>,
    /// Full verse text, only while "show answer" is on.
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChallengeView {
    FillBlank {
        tokens: Vec<TokenView>,
    },
    WordOrder {
        bank: Vec<String>,
        selection: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Typing {
        input: String,
        /// Empty unless hints are on.
        revealed: Vec<String>,
        can_reveal_more: bool,
    },
}

/// One word of a fill-in-the-blank verse. Blank words are never sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub position: usize,
    pub is_blank: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BlankStatus>,
    /// Letter count of the hidden word, when hints are on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_len: Option<usize>,
}

fn challenge_view(challenge: &Challenge, show_hints: bool) -> ChallengeView {
    match challenge {
        Challenge::FillBlank(c) => ChallengeView::FillBlank {
            tokens: c
                .tokens()
                .iter()
                .enumerate()
                .map(|(position, t)| TokenView {
                    position,
                    is_blank: t.is_blank,
                    word: (!t.is_blank).then(|| t.word.clone()),
                    input: c.input(position).map(str::to_string),
                    status: c.status(position),
                    hint_len: (t.is_blank && show_hints).then(|| t.word.chars().count()),
                })
                .collect(),
        },
        Challenge::WordOrder(c) => ChallengeView::WordOrder {
            bank: c.bank().to_vec(),
            selection: c.selection().to_vec(),
        },
        Challenge::Typing(c) => ChallengeView::Typing {
            input: c.input().to_string(),
            revealed: if show_hints { c.revealed_words().to_vec() } else { Vec::new() },
            can_reveal_more: show_hints && c.can_reveal_more(),
        },
    }
}

/// Message describing the session as it stands now.
pub fn session_message(session: &PracticeSession) -> ServerWsMessage {
    match session.phase() {
        Phase::Empty => ServerWsMessage::Empty {
            message: "No verses available. Please configure your verses in Settings first.".into(),
        },
        Phase::Loading { .. } => ServerWsMessage::Loading {
            index: session.index(),
            total: session.verse_count(),
            reference: session.current_verse().map(|v| v.reference.clone()).unwrap_or_default(),
        },
        Phase::Ready(round) => ServerWsMessage::State {
            state: SessionView {
                round: round.id,
                index: session.index(),
                total: session.verse_count(),
                game_type: session.game_type(),
                show_hints: session.show_hints(),
                reference: round.verse.reference.clone(),
                version: round.verse.version.clone(),
                source: round.verse.source,
                challenge: challenge_view(&round.challenge, session.show_hints()),
                result: round.result,
                answer: round.show_answer.then(|| round.verse.text.clone()),
            },
        },
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct VersesOut {
    pub count: usize,
    pub verses: Vec<Verse>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BiblesQuery {
    pub language: Option<String>,
}
#[derive(Serialize)]
pub struct BiblesOut {
    pub bibles: Vec<BibleVersion>,
}

#[derive(Serialize)]
pub struct LanguagesOut {
    pub languages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(rename = "bibleId")]
    pub bible_id: Option<String>,
}
#[derive(Serialize)]
pub struct SearchOut {
    pub data: serde_json::Value,
}

#[derive(Serialize)]
pub struct CacheClearedOut {
    pub cleared: usize,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}
