//! The per-table hand engine.
//!
//! One [`HandEngine`] owns everything a single table's current hand touches:
//! seats, deck, pot, the betting-round bookkeeping, and the record of the
//! hand in flight. The engine is purely in-memory and synchronous; the table
//! actor serializes access to it and handles persistence around it. It is
//! `Clone` so callers can stage a mutation, commit it to storage, and only
//! then swap the new state in.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use super::cards::Deck;
use super::chips::{self, Chips};
use super::entities::{
    ActionKind, ActionRecord, GameStatus, GameSummary, HandNumber, HandRecord, MoneyChange, Phase,
    PlayerId, RevealedHand, Seat, SeatIndex, SeatResult, SeatStatus, ShowdownSlot, TableId,
    WinnerEntry, WinnerInfo, WinnerKind,
};
use super::errors::GameError;
use super::eval::{evaluate, HandScore};
use super::snapshot::{GameSnapshot, HoleCardsView, PlayerSnapshot};
use super::RECENT_ACTION_LIMIT;

/// Readiness poll result after a seat marks itself ready.
#[derive(Clone, Copy, Debug)]
pub struct ReadyStatus {
    pub ready_count: usize,
    pub total_count: usize,
    pub started: bool,
}

/// A betting round is complete when every non-folded seat that still has
/// chips has matched the table bet and has acted since the last aggressive
/// action. Posting a blind does not count as acting, which is what gives the
/// big blind its pre-flop option; a bet or raise resets the acted set, which
/// is what reopens the action.
pub(crate) fn round_complete(
    seats: &[Seat],
    current_bet: Chips,
    acted: &HashSet<SeatIndex>,
) -> bool {
    seats
        .iter()
        .filter(|s| s.in_hand && s.stack > Chips::ZERO)
        .all(|s| s.current_bet == current_bet && acted.contains(&s.index))
}

#[derive(Clone)]
pub struct HandEngine {
    table_id: TableId,
    max_seats: usize,
    small_blind: Chips,
    big_blind: Chips,
    status: GameStatus,
    phase: Phase,
    seats: Vec<Seat>,
    dealer_index: SeatIndex,
    current_to_act: Option<SeatIndex>,
    current_bet: Chips,
    pot: Chips,
    community: Vec<super::cards::Card>,
    deck: Deck,
    last_aggressor: Option<SeatIndex>,
    acted_this_round: HashSet<SeatIndex>,
    hand_number: HandNumber,
    actions: Vec<ActionRecord>,
    next_seq: u32,
    winner_info: Option<WinnerInfo>,
    pending_record: Option<HandRecord>,
    summary: Option<GameSummary>,
    rng: StdRng,
    reseed_each_hand: bool,
}

impl HandEngine {
    /// Engine with an OS-seeded generator, reseeded at every hand.
    pub fn new(table_id: TableId, max_seats: usize, small_blind: Chips, big_blind: Chips) -> Self {
        Self::build(
            table_id,
            max_seats,
            small_blind,
            big_blind,
            StdRng::from_os_rng(),
            true,
        )
    }

    /// Engine with an injected generator, for deterministic tests.
    pub fn with_rng(
        table_id: TableId,
        max_seats: usize,
        small_blind: Chips,
        big_blind: Chips,
        rng: StdRng,
    ) -> Self {
        Self::build(table_id, max_seats, small_blind, big_blind, rng, false)
    }

    fn build(
        table_id: TableId,
        max_seats: usize,
        small_blind: Chips,
        big_blind: Chips,
        rng: StdRng,
        reseed_each_hand: bool,
    ) -> Self {
        Self {
            table_id,
            max_seats: max_seats.min(super::MAX_SEATS),
            small_blind,
            big_blind,
            status: GameStatus::Waiting,
            phase: Phase::WaitingForPlayers,
            seats: Vec::new(),
            dealer_index: 0,
            current_to_act: None,
            current_bet: Chips::ZERO,
            pot: Chips::ZERO,
            community: Vec::with_capacity(5),
            deck: Deck::standard(),
            last_aggressor: None,
            acted_this_round: HashSet::new(),
            hand_number: 0,
            actions: Vec::new(),
            next_seq: 0,
            winner_info: None,
            pending_record: None,
            summary: None,
            rng,
            reseed_each_hand,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn hand_number(&self) -> HandNumber {
        self.hand_number
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn winner_info(&self) -> Option<&WinnerInfo> {
        self.winner_info.as_ref()
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    /// Sequence number of the most recently applied action of this hand.
    pub fn last_seq(&self) -> u32 {
        self.next_seq
    }

    /// The archived record of a hand that just completed, if any. The table
    /// actor takes it, persists it, and only then commits the engine state.
    pub fn take_pending_record(&mut self) -> Option<HandRecord> {
        self.pending_record.take()
    }

    pub fn player_seat(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }

    fn seat(&self, index: SeatIndex) -> Option<&Seat> {
        self.seats.iter().find(|s| s.index == index)
    }

    fn seat_mut(&mut self, index: SeatIndex) -> &mut Seat {
        self.seats
            .iter_mut()
            .find(|s| s.index == index)
            .expect("seat index is always valid inside the engine")
    }

    fn eligible_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_eligible()).count()
    }

    /// First seat strictly clockwise of `from` matching `pred`; wraps all the
    /// way around, ending on `from` itself.
    fn next_matching(&self, from: SeatIndex, pred: impl Fn(&Seat) -> bool) -> Option<SeatIndex> {
        (1..=self.max_seats)
            .map(|offset| (from + offset) % self.max_seats)
            .find(|&idx| self.seat(idx).is_some_and(&pred))
    }

    /// Seat a player while the game is still gathering participants.
    pub fn add_seat(
        &mut self,
        player_id: PlayerId,
        display_name: &str,
        buy_in: Chips,
    ) -> Result<SeatIndex, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.seats.iter().any(|s| s.player_id == player_id) {
            return Err(GameError::AlreadySeated);
        }
        if self.seats.len() >= self.max_seats {
            return Err(GameError::TableFull);
        }
        let index = (0..self.max_seats)
            .find(|i| self.seat(*i).is_none())
            .ok_or(GameError::TableFull)?;
        let seat = Seat::new(index, player_id, display_name.to_string(), buy_in);
        self.seats.push(seat);
        self.seats.sort_by_key(|s| s.index);
        info!(
            "table {}: {} took seat {} with {}",
            self.table_id, display_name, index, buy_in
        );
        Ok(index)
    }

    /// Deal a new hand. Used both for the explicit `start` command and when
    /// every seat has readied up between hands.
    pub fn start_hand(&mut self) -> Result<(), GameError> {
        if self.status == GameStatus::Playing && self.phase != Phase::WaitingForPlayers {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.eligible_count() < 2 {
            return Err(GameError::InvalidAction(
                "need at least two seats with chips".into(),
            ));
        }

        self.hand_number += 1;
        if self.reseed_each_hand {
            self.rng = StdRng::from_os_rng();
        }

        // Per-hand reset. Winner info from the previous hand dies here and
        // nowhere else.
        self.winner_info = None;
        self.community.clear();
        self.pot = Chips::ZERO;
        self.current_bet = Chips::ZERO;
        self.actions.clear();
        self.next_seq = 0;
        self.acted_this_round.clear();
        self.last_aggressor = None;
        for seat in &mut self.seats {
            seat.in_hand = seat.is_eligible();
            seat.hole_cards = None;
            seat.current_bet = Chips::ZERO;
            seat.total_bet = Chips::ZERO;
            seat.ready_for_next = false;
        }

        self.deck = Deck::shuffled(&mut self.rng);

        // Button: random on the first hand of the session, then clockwise to
        // the next seat that can play.
        self.dealer_index = if self.hand_number == 1 {
            let eligible: Vec<SeatIndex> = self
                .seats
                .iter()
                .filter(|s| s.in_hand)
                .map(|s| s.index)
                .collect();
            eligible[self.rng.random_range(0..eligible.len())]
        } else {
            self.next_matching(self.dealer_index, |s| s.in_hand)
                .ok_or_else(|| GameError::Internal("no eligible dealer seat".into()))?
        };

        // Blind seats. Heads-up, the dealer posts the small blind.
        let in_hand_count = self.seats.iter().filter(|s| s.in_hand).count();
        let small_blind_seat = if in_hand_count == 2 {
            self.dealer_index
        } else {
            self.next_matching(self.dealer_index, |s| s.in_hand)
                .ok_or_else(|| GameError::Internal("no small blind seat".into()))?
        };
        let big_blind_seat = self
            .next_matching(small_blind_seat, |s| s.in_hand)
            .ok_or_else(|| GameError::Internal("no big blind seat".into()))?;

        let small_posted = self.post_blind(small_blind_seat, self.small_blind);
        let big_posted = self.post_blind(big_blind_seat, self.big_blind);
        self.current_bet = big_posted;
        self.last_aggressor = Some(big_blind_seat);

        // Hole cards for everyone in the hand, in seat order.
        let indices: Vec<SeatIndex> = self
            .seats
            .iter()
            .filter(|s| s.in_hand)
            .map(|s| s.index)
            .collect();
        for index in indices {
            let cards = self.deck.deal(2)?;
            self.seat_mut(index).hole_cards = Some([cards[0], cards[1]]);
        }

        self.status = GameStatus::Playing;
        self.phase = Phase::Preflop;
        info!(
            "table {}: hand #{} dealt, dealer seat {}, blinds {}/{}",
            self.table_id, self.hand_number, self.dealer_index, small_posted, big_posted
        );

        // First to act sits clockwise of the big blind; heads-up that is the
        // dealer, so the big blind acts last pre-flop. If the blinds put
        // everyone all-in there is nothing to bet and the board runs out.
        match self.next_matching(big_blind_seat, Seat::can_act) {
            Some(idx) => self.current_to_act = Some(idx),
            None => self.finish_round()?,
        }
        Ok(())
    }

    fn post_blind(&mut self, index: SeatIndex, blind: Chips) -> Chips {
        let seat = self.seat_mut(index);
        let posted = blind.min(seat.stack);
        seat.stack -= posted;
        seat.current_bet = posted;
        seat.total_bet += posted;
        self.pot += posted;
        posted
    }

    /// Validate and apply one player action, then advance the turn, the
    /// phase, or the whole hand as far as it will go.
    pub fn apply_action(
        &mut self,
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        if !self.phase.is_betting() {
            return Err(GameError::InvalidAction(
                "no betting round in progress".into(),
            ));
        }
        let index = self
            .player_seat(player_id)
            .map(|s| s.index)
            .ok_or(GameError::NotSeated)?;
        if self.current_to_act != Some(index) {
            return Err(GameError::NotYourTurn);
        }
        if !self.seat(index).is_some_and(Seat::can_act) {
            return Err(GameError::InvalidAction("seat cannot act".into()));
        }

        let recorded = match kind {
            ActionKind::Fold => {
                self.seat_mut(index).in_hand = false;
                Chips::ZERO
            }
            ActionKind::Check => {
                let table_bet = self.current_bet;
                let seat = self.seat_mut(index);
                if seat.current_bet != table_bet {
                    return Err(GameError::InvalidAction(
                        "cannot check with a bet to call".into(),
                    ));
                }
                Chips::ZERO
            }
            ActionKind::Call => {
                let table_bet = self.current_bet;
                let seat = self.seat_mut(index);
                if seat.current_bet >= table_bet {
                    return Err(GameError::InvalidAction(
                        "nothing to call, check instead".into(),
                    ));
                }
                let paid = (table_bet - seat.current_bet).min(seat.stack);
                seat.stack -= paid;
                seat.current_bet += paid;
                seat.total_bet += paid;
                self.pot += paid;
                paid
            }
            ActionKind::Bet => {
                if self.current_bet != Chips::ZERO {
                    return Err(GameError::InvalidAction(
                        "there is already a bet, raise instead".into(),
                    ));
                }
                let wanted = required_amount(amount)?;
                if wanted < self.big_blind {
                    return Err(GameError::InvalidAction(format!(
                        "bet must be at least the big blind ({})",
                        self.big_blind
                    )));
                }
                let seat = self.seat_mut(index);
                let bet = wanted.min(seat.stack);
                seat.stack -= bet;
                seat.current_bet = bet;
                seat.total_bet += bet;
                self.pot += bet;
                self.current_bet = bet;
                self.last_aggressor = Some(index);
                self.acted_this_round.clear();
                bet
            }
            ActionKind::Raise => {
                if self.current_bet == Chips::ZERO {
                    return Err(GameError::InvalidAction(
                        "there is no bet to raise, bet instead".into(),
                    ));
                }
                let target = required_amount(amount)?;
                let min_raise = self.current_bet * Decimal::TWO;
                if target < min_raise {
                    return Err(GameError::InvalidAction(format!(
                        "raise must be to at least double the current bet ({min_raise})"
                    )));
                }
                let seat = self.seat_mut(index);
                if target <= seat.current_bet {
                    return Err(GameError::InvalidAction(
                        "raise target is below chips already in".into(),
                    ));
                }
                let top_up = (target - seat.current_bet).min(seat.stack);
                seat.stack -= top_up;
                seat.current_bet += top_up;
                seat.total_bet += top_up;
                let reached = seat.current_bet;
                self.pot += top_up;
                // A short all-in that cannot reach the standing bet leaves
                // the seat exempt as all-in; the table bet never goes down.
                self.current_bet = self.current_bet.max(reached);
                self.last_aggressor = Some(index);
                self.acted_this_round.clear();
                reached
            }
        };

        self.acted_this_round.insert(index);
        self.next_seq += 1;
        let seat = self.seat(index).expect("acting seat exists");
        let record = ActionRecord {
            seq: self.next_seq,
            seat_index: index,
            player_id,
            player_name: seat.display_name.clone(),
            kind,
            amount: recorded,
            phase: self.phase,
            ts: now,
        };
        debug!(
            "table {}: seat {} {} {} in {}",
            self.table_id, index, record.player_name, kind, self.phase
        );
        self.actions.push(record);

        self.advance(now)
    }

    /// After every action: either the hand is over, the round is over, or
    /// the turn passes clockwise.
    fn advance(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let in_hand = self.seats.iter().filter(|s| s.in_hand).count();
        if in_hand <= 1 {
            return self.resolve_single_winner(now);
        }
        if round_complete(&self.seats, self.current_bet, &self.acted_this_round) {
            return self.finish_round();
        }
        let current = self
            .current_to_act
            .ok_or_else(|| GameError::Internal("no seat to act mid-round".into()))?;
        self.current_to_act = Some(
            self.next_matching(current, Seat::can_act)
                .ok_or_else(|| GameError::Internal("no next seat to act".into()))?,
        );
        Ok(())
    }

    /// Close the street: sweep bets, deal the next community cards, and hand
    /// the action to the first seat clockwise of the dealer. Streets where
    /// nobody can act (everyone all-in) run out back-to-back.
    fn finish_round(&mut self) -> Result<(), GameError> {
        loop {
            for seat in &mut self.seats {
                seat.current_bet = Chips::ZERO;
            }
            self.current_bet = Chips::ZERO;
            self.acted_this_round.clear();

            match self.phase {
                Phase::Preflop => {
                    let flop = self.deck.deal(3)?;
                    self.community.extend(flop);
                    self.phase = Phase::Flop;
                }
                Phase::Flop => {
                    self.community.push(self.deck.deal_one()?);
                    self.phase = Phase::Turn;
                }
                Phase::Turn => {
                    self.community.push(self.deck.deal_one()?);
                    self.phase = Phase::River;
                }
                Phase::River => {
                    self.phase = Phase::Showdown;
                    return self.showdown();
                }
                _ => {
                    return Err(GameError::Internal(
                        "round finished outside a betting phase".into(),
                    ))
                }
            }
            self.last_aggressor = None;
            debug!(
                "table {}: phase {} with board {:?}",
                self.table_id,
                self.phase,
                self.community.iter().map(|c| c.to_string()).collect::<Vec<_>>()
            );

            match self.next_matching(self.dealer_index, Seat::can_act) {
                Some(idx) => {
                    self.current_to_act = Some(idx);
                    return Ok(());
                }
                None => {
                    self.current_to_act = None;
                    // All-in run-out: nothing to bet on this street either.
                }
            }
        }
    }

    /// Everyone else folded: the last seat standing takes the whole pot
    /// without showing.
    fn resolve_single_winner(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let index = self
            .seats
            .iter()
            .find(|s| s.in_hand)
            .map(|s| s.index)
            .ok_or_else(|| GameError::Internal("no seat left to win the pot".into()))?;
        let pot = self.pot;
        {
            let seat = self.seat_mut(index);
            seat.stack += pot;
        }
        let seat = self.seat(index).expect("winner seat exists");
        info!(
            "table {}: hand #{} won by {} uncontested ({})",
            self.table_id, self.hand_number, seat.display_name, pot
        );
        self.winner_info = Some(WinnerInfo {
            kind: WinnerKind::SingleWinner,
            winners: vec![WinnerEntry {
                player_id: seat.player_id,
                player_name: seat.display_name.clone(),
                winning_amount: pot,
                hand_name: None,
                hole_cards: None,
                best_hand_cards: None,
                reason: Some("All other players folded".to_string()),
            }],
            pot_amount: pot,
            community_cards: self.community_strings(),
            showdown_order: Vec::new(),
            all_hands: Vec::new(),
            money_changes: self.money_changes(),
        });
        self.pot = Chips::ZERO;
        self.archive_hand(now)
    }

    /// Reveal, evaluate, and split the pot at showdown. The phase stays
    /// `SHOWDOWN` until [`HandEngine::conclude_showdown`] archives the hand,
    /// so the caller can publish the reveal to subscribers first.
    fn showdown(&mut self) -> Result<(), GameError> {
        let contenders: Vec<SeatIndex> = self
            .seats
            .iter()
            .filter(|s| s.in_hand)
            .map(|s| s.index)
            .collect();

        // Reveal order: the last river aggressor first, otherwise the first
        // contender clockwise of the dealer; the rest follow clockwise.
        let first_to_show = self
            .last_aggressor
            .filter(|idx| contenders.contains(idx))
            .or_else(|| self.next_matching(self.dealer_index, |s| s.in_hand))
            .ok_or_else(|| GameError::Internal("no seat to show first".into()))?;
        let mut show_order = vec![first_to_show];
        let mut cursor = first_to_show;
        while show_order.len() < contenders.len() {
            cursor = self
                .next_matching(cursor, |s| s.in_hand)
                .ok_or_else(|| GameError::Internal("showdown order underflow".into()))?;
            if !show_order.contains(&cursor) {
                show_order.push(cursor);
            }
        }

        let mut scored: Vec<(SeatIndex, HandScore)> = Vec::with_capacity(contenders.len());
        for index in &contenders {
            let seat = self.seat(*index).expect("contender seat exists");
            let hole = seat
                .hole_cards
                .ok_or_else(|| GameError::Internal("contender without hole cards".into()))?;
            let mut cards = hole.to_vec();
            cards.extend_from_slice(&self.community);
            scored.push((*index, evaluate(&cards)?));
        }
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let best = scored[0].1.clone();
        let winning: Vec<SeatIndex> = scored
            .iter()
            .filter(|(_, score)| *score == best)
            .map(|(idx, _)| *idx)
            .collect();

        // Split in whole cents; the odd cents go to the first winner
        // clockwise of the dealer so no chip appears or vanishes.
        let pot = self.pot;
        let share = chips::floor_cents(pot / Decimal::from(winning.len()));
        let remainder = pot - share * Decimal::from(winning.len());
        let first_winner = self
            .next_matching(self.dealer_index, |s| winning.contains(&s.index))
            .unwrap_or(winning[0]);
        for index in &winning {
            let bonus = if *index == first_winner {
                remainder
            } else {
                Chips::ZERO
            };
            self.seat_mut(*index).stack += share + bonus;
        }

        let winners = winning
            .iter()
            .map(|index| {
                let seat = self.seat(*index).expect("winner seat exists");
                let score = &scored.iter().find(|(i, _)| i == index).expect("scored").1;
                WinnerEntry {
                    player_id: seat.player_id,
                    player_name: seat.display_name.clone(),
                    winning_amount: share
                        + if *index == first_winner {
                            remainder
                        } else {
                            Chips::ZERO
                        },
                    hand_name: Some(score.name().to_string()),
                    hole_cards: Some(hole_strings(seat)),
                    best_hand_cards: Some(
                        score.best_five.iter().map(|c| c.to_string()).collect(),
                    ),
                    reason: None,
                }
            })
            .collect();
        let all_hands = scored
            .iter()
            .map(|(index, score)| {
                let seat = self.seat(*index).expect("contender seat exists");
                RevealedHand {
                    player_name: seat.display_name.clone(),
                    hand_name: score.name().to_string(),
                    category: score.category.strength(),
                    hole_cards: hole_strings(seat),
                    best_hand_cards: score.best_five.iter().map(|c| c.to_string()).collect(),
                }
            })
            .collect();
        let showdown_order = show_order
            .iter()
            .enumerate()
            .map(|(i, index)| {
                let seat = self.seat(*index).expect("contender seat exists");
                ShowdownSlot {
                    player_id: seat.player_id,
                    player_name: seat.display_name.clone(),
                    show_order: i + 1,
                }
            })
            .collect();

        info!(
            "table {}: hand #{} showdown, {} way{} for {}",
            self.table_id,
            self.hand_number,
            winning.len(),
            if winning.len() == 1 { "" } else { "s" },
            pot
        );
        self.winner_info = Some(WinnerInfo {
            kind: WinnerKind::ShowdownWinner,
            winners,
            pot_amount: pot,
            community_cards: self.community_strings(),
            showdown_order,
            all_hands,
            money_changes: self.money_changes(),
        });
        self.pot = Chips::ZERO;
        self.current_to_act = None;
        Ok(())
    }

    /// Archive a hand that was resolved at showdown and park the table
    /// between hands. Separate from [`showdown`](Self::showdown) so the
    /// caller can publish the `SHOWDOWN`-phase snapshot before the table
    /// moves on.
    pub fn conclude_showdown(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.phase != Phase::Showdown || self.winner_info.is_none() {
            return Err(GameError::Internal("no showdown to conclude".into()));
        }
        self.archive_hand(now)
    }

    /// Write the hand record and park the table between hands. Hole cards go
    /// into the record only for seats that reached showdown without folding;
    /// a hand won on folds archives none, because nobody showed.
    fn archive_hand(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let winner_info = self
            .winner_info
            .clone()
            .ok_or_else(|| GameError::Internal("archiving a hand with no outcome".into()))?;
        let mut player_cards = BTreeMap::new();
        if winner_info.kind == WinnerKind::ShowdownWinner {
            for seat in self.seats.iter().filter(|s| s.in_hand) {
                if seat.hole_cards.is_some() {
                    player_cards.insert(seat.display_name.clone(), hole_strings(seat));
                }
            }
        }
        self.pending_record = Some(HandRecord {
            hand_number: self.hand_number,
            pot: winner_info.pot_amount,
            final_phase: self.phase,
            community_cards: self.community_strings(),
            player_cards,
            actions: self.actions.clone(),
            winner_info,
            completed_at: now,
        });
        self.phase = Phase::WaitingForPlayers;
        self.current_to_act = None;
        Ok(())
    }

    fn money_changes(&self) -> Vec<MoneyChange> {
        self.seats
            .iter()
            .map(|seat| MoneyChange {
                player_id: seat.player_id,
                player_name: seat.display_name.clone(),
                total_bet_this_hand: seat.total_bet,
                current_stack: seat.stack,
                was_in_hand: seat.in_hand,
            })
            .collect()
    }

    fn community_strings(&self) -> Vec<String> {
        self.community.iter().map(|c| c.to_string()).collect()
    }

    /// Flag a seat ready for the next hand; deals it once everyone with
    /// chips is ready.
    pub fn mark_ready(&mut self, player_id: PlayerId) -> Result<ReadyStatus, GameError> {
        let index = self
            .player_seat(player_id)
            .map(|s| s.index)
            .ok_or(GameError::NotSeated)?;
        if self.winner_info.is_none() || self.phase == Phase::Showdown {
            return Err(GameError::InvalidAction(
                "cannot ready up before the hand has ended".into(),
            ));
        }
        if !self.seat(index).is_some_and(Seat::is_eligible) {
            return Err(GameError::InvalidAction(
                "only seats with chips in play can ready up".into(),
            ));
        }
        self.seat_mut(index).ready_for_next = true;

        let total_count = self.eligible_count();
        let ready_count = self
            .seats
            .iter()
            .filter(|s| s.is_eligible() && s.ready_for_next)
            .count();
        if total_count < 2 {
            self.status = GameStatus::Finished;
            return Ok(ReadyStatus {
                ready_count,
                total_count,
                started: false,
            });
        }
        if ready_count == total_count {
            self.start_hand()?;
            return Ok(ReadyStatus {
                ready_count,
                total_count,
                started: true,
            });
        }
        Ok(ReadyStatus {
            ready_count,
            total_count,
            started: false,
        })
    }

    /// Freeze a seat's result while keeping it at the table. Forbidden while
    /// the seat is still live in a hand.
    pub fn cash_out(&mut self, player_id: PlayerId) -> Result<Chips, GameError> {
        let index = self
            .player_seat(player_id)
            .map(|s| s.index)
            .ok_or(GameError::NotSeated)?;
        {
            let seat = self.seat(index).expect("seat exists");
            match seat.status {
                SeatStatus::Left => return Err(GameError::NotSeated),
                SeatStatus::CashedOut => return Err(GameError::AlreadyCashedOut),
                SeatStatus::Active => {}
            }
            if self.status == GameStatus::Playing && seat.in_hand && self.phase.is_betting() {
                return Err(GameError::CannotLeaveWhileActive);
            }
        }
        let seat = self.seat_mut(index);
        seat.status = SeatStatus::CashedOut;
        seat.in_hand = false;
        seat.ready_for_next = false;
        seat.final_stack = Some(seat.stack);
        let stack = seat.stack;
        info!(
            "table {}: seat {} cashed out with {}",
            self.table_id, index, stack
        );
        if self.status == GameStatus::Playing
            && self.phase == Phase::WaitingForPlayers
            && self.eligible_count() < 2
        {
            self.status = GameStatus::Finished;
        }
        Ok(stack)
    }

    /// Convert bankroll back into a stack after cashing out. The caller
    /// validates the amount against the table limits and the bankroll.
    pub fn buy_back_in(&mut self, player_id: PlayerId, amount: Chips) -> Result<Chips, GameError> {
        let index = self
            .player_seat(player_id)
            .map(|s| s.index)
            .ok_or(GameError::NotSeated)?;
        {
            let seat = self.seat(index).expect("seat exists");
            match seat.status {
                SeatStatus::Left => return Err(GameError::NotSeated),
                SeatStatus::Active => {
                    return Err(GameError::InvalidAction(
                        "you have not cashed out".into(),
                    ))
                }
                SeatStatus::CashedOut => {}
            }
            if self.status == GameStatus::Playing && self.phase.is_betting() {
                return Err(GameError::InvalidAction(
                    "cannot buy back in during a hand".into(),
                ));
            }
        }
        let seat = self.seat_mut(index);
        seat.stack += amount;
        seat.starting_stack += amount;
        seat.final_stack = None;
        seat.status = SeatStatus::Active;
        let total = seat.stack;
        info!(
            "table {}: seat {} bought back in for {} (stack {})",
            self.table_id, index, amount, total
        );
        Ok(total)
    }

    /// Release a cashed-out seat. Returns the stack to be credited back to
    /// the bankroll.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Chips, GameError> {
        let index = self
            .player_seat(player_id)
            .map(|s| s.index)
            .ok_or(GameError::NotSeated)?;
        {
            let seat = self.seat(index).expect("seat exists");
            match seat.status {
                SeatStatus::Left => return Err(GameError::NotSeated),
                SeatStatus::Active => return Err(GameError::CannotLeaveWhileActive),
                SeatStatus::CashedOut => {}
            }
        }
        let seat = self.seat_mut(index);
        let amount = seat.stack;
        if seat.final_stack.is_none() {
            seat.final_stack = Some(amount);
        }
        seat.stack = Chips::ZERO;
        seat.status = SeatStatus::Left;
        info!(
            "table {}: seat {} left the table with {}",
            self.table_id, index, amount
        );
        Ok(amount)
    }

    /// Once every seat has a final stack the game is over: produce the
    /// summary (idempotently) and mark the game finished.
    pub fn complete_if_done(
        &mut self,
        table_name: &str,
        now: DateTime<Utc>,
    ) -> Option<GameSummary> {
        if self.summary.is_some() {
            return None;
        }
        if self.seats.is_empty() || self.seats.iter().any(|s| s.final_stack.is_none()) {
            return None;
        }
        let players = self
            .seats
            .iter()
            .map(|seat| {
                let final_stack = seat.final_stack.unwrap_or(seat.stack);
                SeatResult {
                    seat_index: seat.index,
                    player_id: seat.player_id,
                    player_name: seat.display_name.clone(),
                    starting_stack: seat.starting_stack,
                    final_stack,
                    net: final_stack - seat.starting_stack,
                    status: seat.status,
                }
            })
            .collect();
        let summary = GameSummary {
            table_id: self.table_id,
            table_name: table_name.to_string(),
            completed_at: now,
            hands_played: self.hand_number,
            players,
        };
        self.status = GameStatus::Finished;
        self.summary = Some(summary.clone());
        info!(
            "table {}: game complete after {} hand(s)",
            self.table_id, self.hand_number
        );
        Some(summary)
    }

    /// Drain the settled stacks of cashed-out seats so they can be returned
    /// to the owners' bankrolls alongside the game summary. Seats that
    /// already left were paid on the way out.
    pub fn settle_cashed_out_seats(&mut self) -> Vec<(PlayerId, Chips)> {
        let mut payouts = Vec::new();
        for seat in &mut self.seats {
            if seat.status == SeatStatus::CashedOut && seat.stack > Chips::ZERO {
                payouts.push((seat.player_id, seat.stack));
                seat.stack = Chips::ZERO;
            }
        }
        payouts
    }

    /// Build the authoritative snapshot as seen by `viewer`. Hole cards of
    /// other seats appear only at showdown, and only for seats that did not
    /// fold; the owner always sees their own.
    pub fn snapshot_for(&self, viewer: Option<PlayerId>) -> GameSnapshot {
        let players = self
            .seats
            .iter()
            .map(|seat| {
                let visible = viewer == Some(seat.player_id)
                    || (self.phase == Phase::Showdown && seat.in_hand);
                PlayerSnapshot {
                    seat_index: seat.index,
                    player_id: seat.player_id,
                    display_name: seat.display_name.clone(),
                    stack: seat.stack,
                    starting_stack: seat.starting_stack,
                    final_stack: seat.final_stack,
                    state: seat.status,
                    current_bet: seat.current_bet,
                    total_bet: seat.total_bet,
                    ready_for_next: seat.ready_for_next,
                    hole_cards: seat.hole_cards.filter(|_| visible).map(|_| HoleCardsView {
                        cards: hole_strings(seat),
                        owner_id: seat.player_id,
                    }),
                }
            })
            .collect();
        let skip = self.actions.len().saturating_sub(RECENT_ACTION_LIMIT);
        GameSnapshot {
            table_id: self.table_id,
            status: self.status,
            phase: self.phase,
            pot: self.pot,
            current_bet: self.current_bet,
            dealer_index: self.dealer_index,
            current_to_act: self.current_to_act,
            community_cards: self.community_strings(),
            players,
            recent_actions: self.actions[skip..].to_vec(),
            winner_info: self.winner_info.clone(),
            game_summary: self.summary.clone(),
        }
    }
}

fn required_amount(amount: Option<Chips>) -> Result<Chips, GameError> {
    let amount =
        amount.ok_or_else(|| GameError::InvalidAmount("an amount is required".into()))?;
    chips::validate_amount(amount)
}

fn hole_strings(seat: &Seat) -> Vec<String> {
    seat.hole_cards
        .map(|cards| cards.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::Card;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn engine(seed: u64) -> HandEngine {
        let mut engine =
            HandEngine::with_rng(1, 9, dec!(1), dec!(2), StdRng::seed_from_u64(seed));
        engine.add_seat(11, "alice", dec!(100)).unwrap();
        engine.add_seat(22, "bob", dec!(100)).unwrap();
        engine.add_seat(33, "carol", dec!(100)).unwrap();
        engine
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn total_chips(engine: &HandEngine) -> Chips {
        engine.seats().iter().map(|s| s.stack).sum::<Chips>() + engine.pot()
    }

    fn assert_deck_partition(engine: &HandEngine) {
        let mut seen: HashSet<Card> = HashSet::new();
        for seat in engine.seats() {
            if let Some(cards) = seat.hole_cards {
                for c in cards {
                    assert!(seen.insert(c), "duplicate card {c}");
                }
            }
        }
        for c in &engine.community {
            assert!(seen.insert(*c), "duplicate card {c}");
        }
        for c in engine.deck.undealt() {
            assert!(seen.insert(*c), "duplicate card {c}");
        }
        assert_eq!(seen.len(), 52, "dealt + undealt cards must form one deck");
    }

    fn to_act(engine: &HandEngine) -> PlayerId {
        let idx = engine.current_to_act.expect("someone to act");
        engine.seat(idx).unwrap().player_id
    }

    #[test]
    fn round_complete_requires_matched_bets_and_actions() {
        let mut seats = vec![
            Seat::new(0, 1, "a".into(), dec!(100)),
            Seat::new(1, 2, "b".into(), dec!(100)),
        ];
        for seat in &mut seats {
            seat.in_hand = true;
            seat.current_bet = dec!(2);
        }
        let mut acted = HashSet::new();
        assert!(!round_complete(&seats, dec!(2), &acted));
        acted.insert(0);
        assert!(!round_complete(&seats, dec!(2), &acted));
        acted.insert(1);
        assert!(round_complete(&seats, dec!(2), &acted));
        seats[1].current_bet = dec!(1);
        assert!(!round_complete(&seats, dec!(2), &acted));
    }

    #[test]
    fn round_complete_ignores_all_in_and_folded_seats() {
        let mut seats = vec![
            Seat::new(0, 1, "a".into(), dec!(100)),
            Seat::new(1, 2, "b".into(), dec!(100)),
            Seat::new(2, 3, "c".into(), dec!(100)),
        ];
        seats[0].in_hand = true;
        seats[0].current_bet = dec!(30);
        seats[1].in_hand = true;
        seats[1].stack = Chips::ZERO; // all-in short
        seats[1].current_bet = dec!(10);
        seats[2].in_hand = false; // folded
        let acted: HashSet<SeatIndex> = [0].into_iter().collect();
        assert!(round_complete(&seats, dec!(30), &acted));
    }

    #[test]
    fn starting_a_hand_posts_blinds_and_deals() {
        let mut engine = engine(3);
        engine.start_hand().unwrap();
        assert_eq!(engine.phase(), Phase::Preflop);
        assert_eq!(engine.status(), GameStatus::Playing);
        assert_eq!(engine.pot(), dec!(3));
        assert_eq!(engine.current_bet, dec!(2));
        assert_eq!(total_chips(&engine), dec!(300));
        assert!(engine.seats().iter().all(|s| s.hole_cards.is_some()));
        assert_deck_partition(&engine);
    }

    #[test]
    fn dealer_rotates_to_next_eligible_seat() {
        let mut engine = engine(5);
        engine.start_hand().unwrap();
        let first_dealer = engine.dealer_index;
        // Fold the hand out so the next one can start.
        let first = to_act(&engine);
        engine
            .apply_action(first, ActionKind::Fold, None, now())
            .unwrap();
        let second = to_act(&engine);
        engine
            .apply_action(second, ActionKind::Fold, None, now())
            .unwrap();
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
        engine.start_hand().unwrap();
        // Seats 0..=2 are occupied, so the button moves to the next of them.
        assert_eq!(engine.dealer_index, (first_dealer + 1) % 3);
    }

    #[test]
    fn second_action_cannot_come_from_the_wrong_seat() {
        let mut engine = engine(3);
        engine.start_hand().unwrap();
        let actor = to_act(&engine);
        let interloper = engine
            .seats()
            .iter()
            .map(|s| s.player_id)
            .find(|id| *id != actor)
            .unwrap();
        let err = engine
            .apply_action(interloper, ActionKind::Fold, None, now())
            .unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
    }

    #[test]
    fn check_with_outstanding_bet_is_rejected_without_state_change() {
        let mut engine = engine(3);
        engine.start_hand().unwrap();
        let actor = to_act(&engine);
        let before = total_chips(&engine);
        let err = engine
            .apply_action(actor, ActionKind::Check, None, now())
            .unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidAction("cannot check with a bet to call".into())
        );
        assert_eq!(to_act(&engine), actor);
        assert_eq!(total_chips(&engine), before);
    }

    #[test]
    fn sub_minimum_raise_is_rejected() {
        let mut engine = engine(3);
        engine.start_hand().unwrap();
        let actor = to_act(&engine);
        let err = engine
            .apply_action(actor, ActionKind::Raise, Some(dec!(3)), now())
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
        // A raise to exactly double is the minimum legal raise.
        engine
            .apply_action(actor, ActionKind::Raise, Some(dec!(4)), now())
            .unwrap();
        assert_eq!(engine.current_bet, dec!(4));
    }

    #[test]
    fn bet_requires_no_outstanding_bet_and_raise_requires_one() {
        let mut engine = engine(3);
        engine.start_hand().unwrap();
        let actor = to_act(&engine);
        let err = engine
            .apply_action(actor, ActionKind::Bet, Some(dec!(10)), now())
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
    }

    #[test]
    fn money_and_cards_are_conserved_through_a_full_hand() {
        let mut engine = engine(9);
        engine.start_hand().unwrap();
        let buyins = dec!(300);
        // Call around, check every street down to showdown.
        for _ in 0..64 {
            if !engine.phase().is_betting() {
                break;
            }
            let actor = to_act(&engine);
            let seat = engine.player_seat(actor).unwrap();
            let kind = if seat.current_bet < engine.current_bet {
                ActionKind::Call
            } else {
                ActionKind::Check
            };
            engine.apply_action(actor, kind, None, now()).unwrap();
            assert_eq!(total_chips(&engine), buyins);
            if engine.phase().is_betting() {
                assert_deck_partition(&engine);
            }
        }
        // The hand rests at showdown until concluded; this is the view that
        // reveals every contender's cards to everyone.
        assert_eq!(engine.phase(), Phase::Showdown);
        let reveal = engine.snapshot_for(None);
        assert!(reveal.players.iter().all(|p| p.hole_cards.is_some()));
        engine.conclude_showdown(now()).unwrap();
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
        let info = engine.winner_info().expect("hand resolved");
        assert_eq!(info.kind, WinnerKind::ShowdownWinner);
        assert_eq!(info.pot_amount, dec!(6));
        assert_eq!(total_chips(&engine), buyins);
        let record = engine.take_pending_record().expect("record written");
        assert_eq!(record.final_phase, Phase::Showdown);
        assert_eq!(record.community_cards.len(), 5);
        assert_eq!(record.player_cards.len(), 3);
    }

    #[test]
    fn folded_seats_never_enter_the_record_or_the_reveal() {
        let mut engine = engine(37);
        engine.start_hand().unwrap();
        let folder = to_act(&engine);
        engine
            .apply_action(folder, ActionKind::Fold, None, now())
            .unwrap();
        let folded_name = engine.player_seat(folder).unwrap().display_name.clone();
        // The remaining two check the hand down to showdown.
        for _ in 0..16 {
            if !engine.phase().is_betting() {
                break;
            }
            let actor = to_act(&engine);
            let seat = engine.player_seat(actor).unwrap();
            let kind = if seat.current_bet < engine.current_bet {
                ActionKind::Call
            } else {
                ActionKind::Check
            };
            engine.apply_action(actor, kind, None, now()).unwrap();
        }
        assert_eq!(engine.phase(), Phase::Showdown);

        // The showdown view shows both contenders and keeps the folded hand
        // face down.
        let reveal = engine.snapshot_for(None);
        for player in &reveal.players {
            if player.player_id == folder {
                assert!(player.hole_cards.is_none(), "folded hand leaked");
            } else {
                assert!(player.hole_cards.is_some());
            }
        }

        engine.conclude_showdown(now()).unwrap();
        let record = engine.take_pending_record().expect("record written");
        assert_eq!(record.player_cards.len(), 2);
        assert!(!record.player_cards.contains_key(&folded_name));
    }

    #[test]
    fn turn_invariant_holds_after_every_accepted_action() {
        let mut engine = engine(21);
        engine.start_hand().unwrap();
        for _ in 0..64 {
            if !engine.phase().is_betting() {
                break;
            }
            match engine.current_to_act {
                Some(idx) => {
                    let seat = engine.seat(idx).unwrap();
                    assert!(seat.in_hand && seat.stack > Chips::ZERO);
                }
                None => panic!("betting phase with nobody to act"),
            }
            let actor = to_act(&engine);
            let seat = engine.player_seat(actor).unwrap();
            let kind = if seat.current_bet < engine.current_bet {
                ActionKind::Call
            } else {
                ActionKind::Check
            };
            engine.apply_action(actor, kind, None, now()).unwrap();
        }
    }

    // The split-pot and wheel scenarios need a known board, so they drive
    // the showdown machinery directly.
    fn rigged_river(
        engine: &mut HandEngine,
        board: [&str; 5],
        holes: &[(PlayerId, [&str; 2])],
        pot: Chips,
    ) {
        engine.start_hand().unwrap();
        engine.community = board.iter().map(|s| card(s)).collect();
        for (player_id, hole) in holes {
            let idx = engine.player_seat(*player_id).unwrap().index;
            let seat = engine.seat_mut(idx);
            seat.hole_cards = Some([card(hole[0]), card(hole[1])]);
            seat.in_hand = true;
        }
        for seat in &mut engine.seats {
            seat.current_bet = Chips::ZERO;
        }
        engine.pot = pot;
        engine.current_bet = Chips::ZERO;
        engine.last_aggressor = None;
        engine.phase = Phase::Showdown;
    }

    #[test]
    fn wheel_loses_to_six_high_straight_at_showdown() {
        let mut engine = HandEngine::with_rng(7, 9, dec!(1), dec!(2), StdRng::seed_from_u64(2));
        engine.add_seat(1, "x", dec!(100)).unwrap();
        engine.add_seat(2, "y", dec!(100)).unwrap();
        rigged_river(
            &mut engine,
            ["5C", "4D", "3S", "2H", "9C"],
            &[(1, ["AH", "KH"]), (2, ["6S", "7D"])],
            dec!(10),
        );
        engine.showdown().unwrap();
        let info = engine.winner_info().unwrap();
        assert_eq!(info.winners.len(), 1);
        assert_eq!(info.winners[0].player_name, "y");
        assert_eq!(info.winners[0].winning_amount, dec!(10));
        // Both straights are on display in the revealed hands.
        assert!(info.all_hands.iter().all(|h| h.hand_name == "Straight"));
    }

    #[test]
    fn identical_hands_split_the_pot_evenly() {
        let mut engine = HandEngine::with_rng(8, 9, dec!(1), dec!(2), StdRng::seed_from_u64(4));
        engine.add_seat(1, "x", dec!(100)).unwrap();
        engine.add_seat(2, "y", dec!(100)).unwrap();
        rigged_river(
            &mut engine,
            ["AS", "KD", "AH", "KC", "2C"],
            &[(1, ["QS", "JD"]), (2, ["QH", "JC"])],
            dec!(40),
        );
        engine.showdown().unwrap();
        let info = engine.winner_info().unwrap();
        assert_eq!(info.winners.len(), 2);
        assert!(info
            .winners
            .iter()
            .all(|w| w.winning_amount == dec!(20)));
        // The whole rigged pot was paid out and nothing lingers in the pot.
        assert_eq!(engine.pot, Chips::ZERO);
        let awarded: Chips = info.winners.iter().map(|w| w.winning_amount).sum();
        assert_eq!(awarded, dec!(40));
    }

    #[test]
    fn odd_cent_goes_to_first_winner_clockwise_of_dealer() {
        let mut engine = HandEngine::with_rng(9, 9, dec!(1), dec!(2), StdRng::seed_from_u64(4));
        engine.add_seat(1, "x", dec!(100)).unwrap();
        engine.add_seat(2, "y", dec!(100)).unwrap();
        rigged_river(
            &mut engine,
            ["AS", "KD", "AH", "KC", "2C"],
            &[(1, ["QS", "JD"]), (2, ["QH", "JC"])],
            dec!(0.03),
        );
        engine.showdown().unwrap();
        let info = engine.winner_info().unwrap();
        let mut amounts: Vec<Chips> = info.winners.iter().map(|w| w.winning_amount).collect();
        amounts.sort();
        assert_eq!(amounts, vec![dec!(0.01), dec!(0.02)]);
        let awarded: Chips = amounts.into_iter().sum();
        assert_eq!(awarded, dec!(0.03));
    }

    #[test]
    fn river_aggressor_shows_first() {
        let mut engine = HandEngine::with_rng(10, 9, dec!(1), dec!(2), StdRng::seed_from_u64(4));
        engine.add_seat(1, "x", dec!(100)).unwrap();
        engine.add_seat(2, "y", dec!(100)).unwrap();
        rigged_river(
            &mut engine,
            ["AS", "KD", "9H", "KC", "2C"],
            &[(1, ["QS", "JD"]), (2, ["QH", "JC"])],
            dec!(10),
        );
        let aggressor = engine.player_seat(2).unwrap().index;
        engine.last_aggressor = Some(aggressor);
        engine.showdown().unwrap();
        let info = engine.winner_info().unwrap();
        assert_eq!(info.showdown_order[0].player_name, "y");
        assert_eq!(info.showdown_order[0].show_order, 1);
        assert_eq!(info.showdown_order[1].player_name, "x");
    }

    #[test]
    fn winner_info_survives_until_next_deal() {
        let mut engine = engine(13);
        engine.start_hand().unwrap();
        let first = to_act(&engine);
        engine
            .apply_action(first, ActionKind::Fold, None, now())
            .unwrap();
        let second = to_act(&engine);
        engine
            .apply_action(second, ActionKind::Fold, None, now())
            .unwrap();
        assert!(engine.winner_info().is_some());
        // Readying one seat leaves the popup alone.
        let a_player = engine.seats()[0].player_id;
        engine.mark_ready(a_player).unwrap();
        assert!(engine.winner_info().is_some());
        for id in [engine.seats()[1].player_id, engine.seats()[2].player_id] {
            engine.mark_ready(id).unwrap();
        }
        // Third ready deals hand #2, which clears the winner info.
        assert_eq!(engine.hand_number(), 2);
        assert!(engine.winner_info().is_none());
    }

    #[test]
    fn snapshot_hides_other_seats_hole_cards_before_showdown() {
        let mut engine = engine(17);
        engine.start_hand().unwrap();
        let viewer = engine.seats()[0].player_id;
        let snapshot = engine.snapshot_for(Some(viewer));
        for player in &snapshot.players {
            if player.player_id == viewer {
                let hole = player.hole_cards.as_ref().expect("own cards visible");
                assert_eq!(hole.owner_id, viewer);
                assert_eq!(hole.cards.len(), 2);
            } else {
                assert!(player.hole_cards.is_none(), "opponent cards leaked");
            }
        }
    }

    #[test]
    fn all_in_board_runs_out_to_showdown() {
        let mut engine = HandEngine::with_rng(11, 9, dec!(1), dec!(2), StdRng::seed_from_u64(6));
        engine.add_seat(1, "x", dec!(10)).unwrap();
        engine.add_seat(2, "y", dec!(10)).unwrap();
        engine.start_hand().unwrap();
        // Shove and call: no further actions are possible, so the engine
        // must deal all five cards and resolve the hand by itself.
        let first = to_act(&engine);
        engine
            .apply_action(first, ActionKind::Raise, Some(dec!(10)), now())
            .unwrap();
        let second = to_act(&engine);
        engine
            .apply_action(second, ActionKind::Call, None, now())
            .unwrap();
        assert_eq!(engine.phase(), Phase::Showdown);
        let info = engine.winner_info().unwrap();
        assert_eq!(info.pot_amount, dec!(20));
        assert_eq!(info.community_cards.len(), 5);
        assert_eq!(total_chips(&engine), dec!(20));
        engine.conclude_showdown(now()).unwrap();
        assert_eq!(engine.phase(), Phase::WaitingForPlayers);
        assert!(engine.take_pending_record().is_some());
        assert_eq!(total_chips(&engine), dec!(20));
    }

    #[test]
    fn cash_out_is_blocked_while_live_in_a_hand() {
        let mut engine = engine(19);
        engine.start_hand().unwrap();
        let actor = to_act(&engine);
        let err = engine.cash_out(actor).unwrap_err();
        assert_eq!(err, GameError::CannotLeaveWhileActive);
        // After folding, the seat may cash out mid-hand.
        engine
            .apply_action(actor, ActionKind::Fold, None, now())
            .unwrap();
        let stack = engine.cash_out(actor).unwrap();
        assert_eq!(stack, engine.player_seat(actor).unwrap().stack);
    }

    #[test]
    fn summary_appears_once_every_seat_has_a_final_stack() {
        let mut engine = engine(23);
        let names: Vec<PlayerId> = engine.seats().iter().map(|s| s.player_id).collect();
        for id in &names {
            engine.cash_out(*id).unwrap();
        }
        let summary = engine.complete_if_done("Test Table", now()).unwrap();
        assert_eq!(summary.players.len(), 3);
        assert!(summary
            .players
            .iter()
            .all(|p| p.net == Chips::ZERO && p.final_stack == dec!(100)));
        assert_eq!(engine.status(), GameStatus::Finished);
        // Idempotent: the summary is produced exactly once.
        assert!(engine.complete_if_done("Test Table", now()).is_none());
        assert!(engine.summary().is_some());
    }

    #[test]
    fn buy_back_in_restores_an_eligible_seat() {
        let mut engine = engine(29);
        let player = engine.seats()[0].player_id;
        engine.cash_out(player).unwrap();
        let err = engine.buy_back_in(player, dec!(50)).err();
        assert!(err.is_none());
        let seat = engine.player_seat(player).unwrap();
        assert_eq!(seat.status, SeatStatus::Active);
        assert_eq!(seat.stack, dec!(150));
        assert_eq!(seat.starting_stack, dec!(150));
        assert!(seat.final_stack.is_none());
    }

    #[test]
    fn leave_requires_cash_out_and_zeroes_the_stack() {
        let mut engine = engine(31);
        let player = engine.seats()[0].player_id;
        assert_eq!(
            engine.leave(player).unwrap_err(),
            GameError::CannotLeaveWhileActive
        );
        engine.cash_out(player).unwrap();
        let amount = engine.leave(player).unwrap();
        assert_eq!(amount, dec!(100));
        let seat = engine.player_seat(player).unwrap();
        assert_eq!(seat.status, SeatStatus::Left);
        assert_eq!(seat.stack, Chips::ZERO);
        assert_eq!(seat.final_stack, Some(dec!(100)));
    }
}
