//! Entities owned by the hand engine: seats, phases, the action log, and the
//! immutable records written when a hand or a whole game completes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cards::Card;
use super::chips::Chips;

/// Persistent player identity.
pub type PlayerId = i64;

/// Table identity (one table hosts one cash game).
pub type TableId = i64;

/// Position of a seat at its table.
pub type SeatIndex = usize;

/// 1-based counter of hands dealt at a table.
pub type HandNumber = u32;

/// Lifecycle of the game hosted at a table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "WAITING",
            Self::Playing => "PLAYING",
            Self::Finished => "FINISHED",
        };
        write!(f, "{repr}")
    }
}

/// Betting street, plus the showdown and between-hands states.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    WaitingForPlayers,
}

impl Phase {
    /// True while seats may act.
    pub fn is_betting(self) -> bool {
        matches!(self, Self::Preflop | Self::Flop | Self::Turn | Self::River)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "PREFLOP",
            Self::Flop => "FLOP",
            Self::Turn => "TURN",
            Self::River => "RIVER",
            Self::Showdown => "SHOWDOWN",
            Self::WaitingForPlayers => "WAITING_FOR_PLAYERS",
        };
        write!(f, "{repr}")
    }
}

/// Seat lifecycle at the table. Per-hand standing (folded, all-in) lives in
/// [`Seat::in_hand`] and the stack.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Active,
    CashedOut,
    Left,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Active => "ACTIVE",
            Self::CashedOut => "CASHED_OUT",
            Self::Left => "LEFT",
        };
        write!(f, "{repr}")
    }
}

/// The single tagged player action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Fold => "FOLD",
            Self::Check => "CHECK",
            Self::Call => "CALL",
            Self::Bet => "BET",
            Self::Raise => "RAISE",
        };
        write!(f, "{repr}")
    }
}

/// A seat and its chips. The engine addresses seats by index; nothing holds
/// a reference into another entity.
#[derive(Clone, Debug)]
pub struct Seat {
    pub index: SeatIndex,
    pub player_id: PlayerId,
    pub display_name: String,
    pub status: SeatStatus,
    pub stack: Chips,
    pub starting_stack: Chips,
    pub final_stack: Option<Chips>,
    /// Dealt into the current hand and not folded. All-in seats stay in.
    pub in_hand: bool,
    pub hole_cards: Option<[Card; 2]>,
    pub current_bet: Chips,
    pub total_bet: Chips,
    pub ready_for_next: bool,
}

impl Seat {
    pub fn new(index: SeatIndex, player_id: PlayerId, display_name: String, buy_in: Chips) -> Self {
        Self {
            index,
            player_id,
            display_name,
            status: SeatStatus::Active,
            stack: buy_in,
            starting_stack: buy_in,
            final_stack: None,
            in_hand: false,
            hole_cards: None,
            current_bet: Chips::ZERO,
            total_bet: Chips::ZERO,
            ready_for_next: false,
        }
    }

    /// May be dealt into the next hand.
    pub fn is_eligible(&self) -> bool {
        self.status == SeatStatus::Active && self.stack > Chips::ZERO
    }

    /// Contesting the pot and still able to put chips in.
    pub fn can_act(&self) -> bool {
        self.in_hand && self.stack > Chips::ZERO
    }

    pub fn is_all_in(&self) -> bool {
        self.in_hand && self.stack == Chips::ZERO
    }
}

/// One applied action, appended to the per-hand log with a monotonic
/// sequence number.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub seq: u32,
    pub seat_index: SeatIndex,
    pub player_id: PlayerId,
    pub player_name: String,
    pub kind: ActionKind,
    pub amount: Chips,
    pub phase: Phase,
    pub ts: DateTime<Utc>,
}

/// How a hand ended.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerKind {
    SingleWinner,
    ShowdownWinner,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub winning_amount: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_hand_cards: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Position of a seat in the reveal sequence at showdown.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownSlot {
    pub player_id: PlayerId,
    pub player_name: String,
    pub show_order: usize,
}

/// A hand revealed at showdown, strongest first in `WinnerInfo::all_hands`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedHand {
    pub player_name: String,
    pub hand_name: String,
    pub category: u8,
    pub hole_cards: Vec<String>,
    pub best_hand_cards: Vec<String>,
}

/// Per-seat money movement over the hand, reported alongside the winners.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyChange {
    pub player_id: PlayerId,
    pub player_name: String,
    pub total_bet_this_hand: Chips,
    pub current_stack: Chips,
    pub was_in_hand: bool,
}

/// Outcome of a completed hand, kept on the table until the next hand is
/// dealt and archived into the hand's record.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerInfo {
    #[serde(rename = "type")]
    pub kind: WinnerKind,
    pub winners: Vec<WinnerEntry>,
    pub pot_amount: Chips,
    pub community_cards: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub showdown_order: Vec<ShowdownSlot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_hands: Vec<RevealedHand>,
    pub money_changes: Vec<MoneyChange>,
}

/// Immutable archive of one completed hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRecord {
    pub hand_number: HandNumber,
    pub pot: Chips,
    pub final_phase: Phase,
    pub community_cards: Vec<String>,
    /// Hole cards of the seats that reached showdown without folding, keyed
    /// by display name. Empty when the hand was won on folds: folded hands
    /// are never revealed, not even to history.
    pub player_cards: std::collections::BTreeMap<String, Vec<String>>,
    pub actions: Vec<ActionRecord>,
    pub winner_info: WinnerInfo,
    pub completed_at: DateTime<Utc>,
}

/// Per-seat line of a game summary.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatResult {
    pub seat_index: SeatIndex,
    pub player_id: PlayerId,
    pub player_name: String,
    pub starting_stack: Chips,
    pub final_stack: Chips,
    pub net: Chips,
    pub status: SeatStatus,
}

/// Written exactly once, when every seat has a final stack.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub table_id: TableId,
    pub table_name: String,
    pub completed_at: DateTime<Utc>,
    pub hands_played: HandNumber,
    pub players: Vec<SeatResult>,
}
