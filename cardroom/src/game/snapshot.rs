//! Authoritative state snapshots pushed to subscribers and returned from
//! every command.
//!
//! Field names are camelCase on the wire and money travels as decimal
//! strings. Snapshots are built per viewer: a seat's hole cards ride along
//! only for their owner, or for everyone once they were revealed at
//! showdown. Each hole-card group carries its `ownerId` so clients can
//! attribute it without guessing.

use serde::{Deserialize, Serialize};

use super::chips::Chips;
use super::entities::{
    ActionRecord, GameStatus, GameSummary, Phase, PlayerId, SeatIndex, SeatStatus, TableId,
    WinnerInfo,
};

/// Hole cards plus who they belong to.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleCardsView {
    pub cards: Vec<String>,
    pub owner_id: PlayerId,
}

/// One seat as seen in a snapshot.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub seat_index: SeatIndex,
    pub player_id: PlayerId,
    pub display_name: String,
    pub stack: Chips,
    pub starting_stack: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_stack: Option<Chips>,
    pub state: SeatStatus,
    pub current_bet: Chips,
    pub total_bet: Chips,
    pub ready_for_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<HoleCardsView>,
}

/// The whole table as one consistent view. The i-th snapshot broadcast for a
/// table reflects exactly the state after the i-th applied mutation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub table_id: TableId,
    pub status: GameStatus,
    pub phase: Phase,
    pub pot: Chips,
    pub current_bet: Chips,
    pub dealer_index: SeatIndex,
    pub current_to_act: Option<SeatIndex>,
    pub community_cards: Vec<String>,
    pub players: Vec<PlayerSnapshot>,
    pub recent_actions: Vec<ActionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_info: Option<WinnerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_summary: Option<GameSummary>,
}

impl GameSnapshot {
    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn snapshot_wire_format_is_camel_case_with_string_decimals() {
        let snapshot = GameSnapshot {
            table_id: 4,
            status: GameStatus::Playing,
            phase: Phase::Flop,
            pot: dec!(12.50),
            current_bet: dec!(4),
            dealer_index: 1,
            current_to_act: Some(2),
            community_cards: vec!["AH".into(), "10C".into(), "2D".into()],
            players: vec![PlayerSnapshot {
                seat_index: 1,
                player_id: 9,
                display_name: "alice".into(),
                stack: dec!(95.25),
                starting_stack: dec!(100),
                final_stack: None,
                state: SeatStatus::Active,
                current_bet: dec!(4),
                total_bet: dec!(6),
                ready_for_next: false,
                hole_cards: Some(HoleCardsView {
                    cards: vec!["KS".into(), "KD".into()],
                    owner_id: 9,
                }),
            }],
            recent_actions: vec![],
            winner_info: None,
            game_summary: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tableId"], 4);
        assert_eq!(json["phase"], "FLOP");
        assert_eq!(json["pot"], "12.50");
        assert_eq!(json["currentToAct"], 2);
        let player = &json["players"][0];
        assert_eq!(player["seatIndex"], 1);
        assert_eq!(player["stack"], "95.25");
        assert_eq!(player["state"], "ACTIVE");
        assert_eq!(player["holeCards"]["ownerId"], 9);
        assert!(player.get("finalStack").is_none());
    }

    #[test]
    fn snapshot_round_trips() {
        let snapshot = GameSnapshot {
            table_id: 1,
            status: GameStatus::Waiting,
            phase: Phase::WaitingForPlayers,
            pot: dec!(0),
            current_bet: dec!(0),
            dealer_index: 0,
            current_to_act: None,
            community_cards: vec![],
            players: vec![],
            recent_actions: vec![],
            winner_info: None,
            game_summary: None,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.table_id, 1);
        assert_eq!(back.phase, Phase::WaitingForPlayers);
    }
}
