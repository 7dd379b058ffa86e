//! Messages exchanged with a table actor.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::game::chips::Chips;
use crate::game::entities::{ActionKind, GameSummary, HandNumber, PlayerId, TableId};
use crate::game::errors::GameError;
use crate::game::snapshot::GameSnapshot;

/// Commands a table actor consumes from its inbox. Every mutating variant
/// carries a oneshot reply channel; the actor answers after the mutation and
/// its persistence have both committed.
#[derive(Debug)]
pub enum TableCommand {
    Join {
        player_id: PlayerId,
        buy_in: Chips,
        reply: oneshot::Sender<Result<GameSnapshot, GameError>>,
    },
    Start {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<GameSnapshot, GameError>>,
    },
    Action {
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
        reply: oneshot::Sender<Result<GameSnapshot, GameError>>,
    },
    Ready {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<ReadyReceipt, GameError>>,
    },
    CashOut {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<CashOutReceipt, GameError>>,
    },
    BuyBackIn {
        player_id: PlayerId,
        amount: Chips,
        reply: oneshot::Sender<Result<BuyBackReceipt, GameError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveReceipt, GameError>>,
    },
    Snapshot {
        viewer: Option<PlayerId>,
        reply: oneshot::Sender<GameSnapshot>,
    },
    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<Broadcast>,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Unsubscribe {
        player_id: PlayerId,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Readiness poll after a `ready` command.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyReceipt {
    pub ready_count: usize,
    pub total_count: usize,
}

/// Result of cashing out. When this cash-out completed the game, the freshly
/// produced summary rides along.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutReceipt {
    pub stack: Chips,
    pub game_summary_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_summary: Option<GameSummary>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyBackReceipt {
    pub total_stack: Chips,
    pub new_balance: Chips,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveReceipt {
    pub left_with: Chips,
    pub new_balance: Chips,
}

/// Messages pushed to subscribers, in mutation order. `GameSummary` is sent
/// exactly once per table, when the summary is produced.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Broadcast {
    Snapshot(GameSnapshot),
    #[serde(rename = "game_summary_notification")]
    GameSummaryNotification(SummaryNotice),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryNotice {
    pub game_id: TableId,
    pub game_summary: GameSummary,
    pub total_hands: HandNumber,
}
