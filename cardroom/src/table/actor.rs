//! The table actor: one owning task per table.
//!
//! Every operation that touches table state flows through the actor's inbox
//! and is handled serially, so the engine never sees concurrent mutation.
//! Mutations are staged on a clone of the engine; persistence commits first
//! and the staged state replaces the live state only afterwards, which keeps
//! a failed commit from leaving half-applied actions behind. An unexpected
//! internal error parks the actor in read-only quarantine.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::clock::Clock;
use crate::db::store::GameStore;
use crate::game::chips::{self, Chips};
use crate::game::engine::HandEngine;
use crate::game::entities::{ActionKind, GameSummary, Phase, PlayerId, TableId};
use crate::game::errors::GameError;
use crate::game::snapshot::GameSnapshot;

use super::broadcast::Broadcaster;
use super::config::TableConfig;
use super::messages::{
    Broadcast, BuyBackReceipt, CashOutReceipt, LeaveReceipt, ReadyReceipt, SummaryNotice,
    TableCommand,
};

/// How long a caller waits for the table's mutator before giving up.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

const INBOX_DEPTH: usize = 64;

/// Cheap cloneable address of a running table actor.
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableCommand>,
    table_id: TableId,
}

impl TableHandle {
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, GameError>>) -> TableCommand,
    ) -> Result<T, GameError> {
        let (tx, rx) = oneshot::channel();
        timeout(COMMAND_TIMEOUT, self.sender.send(build(tx)))
            .await
            .map_err(|_| GameError::Busy)?
            .map_err(|_| GameError::NotFound("table is closed".into()))?;
        timeout(COMMAND_TIMEOUT, rx)
            .await
            .map_err(|_| GameError::Busy)?
            .map_err(|_| GameError::Internal("table dropped the request".into()))?
    }

    pub async fn join(&self, player_id: PlayerId, buy_in: Chips) -> Result<GameSnapshot, GameError> {
        self.request(|reply| TableCommand::Join {
            player_id,
            buy_in,
            reply,
        })
        .await
    }

    pub async fn start(&self, player_id: PlayerId) -> Result<GameSnapshot, GameError> {
        self.request(|reply| TableCommand::Start { player_id, reply })
            .await
    }

    pub async fn action(
        &self,
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<GameSnapshot, GameError> {
        self.request(|reply| TableCommand::Action {
            player_id,
            kind,
            amount,
            reply,
        })
        .await
    }

    pub async fn ready(&self, player_id: PlayerId) -> Result<ReadyReceipt, GameError> {
        self.request(|reply| TableCommand::Ready { player_id, reply })
            .await
    }

    pub async fn cash_out(&self, player_id: PlayerId) -> Result<CashOutReceipt, GameError> {
        self.request(|reply| TableCommand::CashOut { player_id, reply })
            .await
    }

    pub async fn buy_back_in(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<BuyBackReceipt, GameError> {
        self.request(|reply| TableCommand::BuyBackIn {
            player_id,
            amount,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<LeaveReceipt, GameError> {
        self.request(|reply| TableCommand::Leave { player_id, reply })
            .await
    }

    pub async fn snapshot(&self, viewer: Option<PlayerId>) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        timeout(
            COMMAND_TIMEOUT,
            self.sender.send(TableCommand::Snapshot { viewer, reply: tx }),
        )
        .await
        .map_err(|_| GameError::Busy)?
        .map_err(|_| GameError::NotFound("table is closed".into()))?;
        timeout(COMMAND_TIMEOUT, rx)
            .await
            .map_err(|_| GameError::Busy)?
            .map_err(|_| GameError::Internal("table dropped the request".into()))
    }

    pub async fn subscribe(
        &self,
        player_id: PlayerId,
        sender: mpsc::Sender<Broadcast>,
    ) -> Result<(), GameError> {
        self.request(|reply| TableCommand::Subscribe {
            player_id,
            sender,
            reply,
        })
        .await
    }

    pub async fn unsubscribe(&self, player_id: PlayerId) {
        let _ = self
            .sender
            .send(TableCommand::Unsubscribe { player_id })
            .await;
    }

    pub async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(TableCommand::Close { reply: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }
}

pub struct TableActor {
    id: TableId,
    config: TableConfig,
    engine: HandEngine,
    inbox: mpsc::Receiver<TableCommand>,
    store: Arc<dyn GameStore>,
    clock: Arc<dyn Clock>,
    broadcaster: Broadcaster,
    summary_sent: bool,
    quarantined: bool,
    closed: bool,
}

impl TableActor {
    pub fn new(
        id: TableId,
        config: TableConfig,
        engine: HandEngine,
        store: Arc<dyn GameStore>,
        clock: Arc<dyn Clock>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_DEPTH);
        let actor = Self {
            id,
            config,
            engine,
            inbox,
            store,
            clock,
            broadcaster: Broadcaster::new(),
            summary_sent: false,
            quarantined: false,
            closed: false,
        };
        let handle = TableHandle {
            sender,
            table_id: id,
        };
        (actor, handle)
    }

    pub async fn run(mut self) {
        info!("table {} '{}' running", self.id, self.config.name);
        while let Some(command) = self.inbox.recv().await {
            self.handle(command).await;
            if self.closed {
                break;
            }
        }
        info!("table {} '{}' stopped", self.id, self.config.name);
    }

    async fn handle(&mut self, command: TableCommand) {
        match command {
            TableCommand::Join {
                player_id,
                buy_in,
                reply,
            } => {
                let result = self.handle_join(player_id, buy_in).await;
                let _ = reply.send(result);
            }
            TableCommand::Start { player_id, reply } => {
                let result = self.handle_start(player_id).await;
                let _ = reply.send(result);
            }
            TableCommand::Action {
                player_id,
                kind,
                amount,
                reply,
            } => {
                let result = self.handle_action(player_id, kind, amount).await;
                let _ = reply.send(result);
            }
            TableCommand::Ready { player_id, reply } => {
                let result = self.handle_ready(player_id).await;
                let _ = reply.send(result);
            }
            TableCommand::CashOut { player_id, reply } => {
                let result = self.handle_cash_out(player_id).await;
                let _ = reply.send(result);
            }
            TableCommand::BuyBackIn {
                player_id,
                amount,
                reply,
            } => {
                let result = self.handle_buy_back_in(player_id, amount).await;
                let _ = reply.send(result);
            }
            TableCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id).await;
                let _ = reply.send(result);
            }
            TableCommand::Snapshot { viewer, reply } => {
                let _ = reply.send(self.engine.snapshot_for(viewer));
            }
            TableCommand::Subscribe {
                player_id,
                sender,
                reply,
            } => {
                let result = self.handle_subscribe(player_id, sender);
                let _ = reply.send(result);
            }
            TableCommand::Unsubscribe { player_id } => {
                self.broadcaster.unsubscribe(player_id);
            }
            TableCommand::Close { reply } => {
                self.closed = true;
                let _ = reply.send(());
            }
        }
    }

    /// Gate for every mutating command.
    fn writable(&self) -> Result<(), GameError> {
        if self.quarantined {
            return Err(GameError::Internal(
                "table is quarantined pending operator intervention".into(),
            ));
        }
        Ok(())
    }

    /// Internal failures flip the table read-only; validation failures pass
    /// straight through.
    fn note_failure(&mut self, err: &GameError) {
        if err.is_internal() {
            self.quarantined = true;
            error!(
                "table {} quarantined after internal error (last seq {}): {}",
                self.id,
                self.engine.last_seq(),
                err
            );
        }
    }

    /// Push a personalized snapshot to every subscriber, in mutation order.
    fn broadcast_snapshots(&mut self) {
        for player_id in self.broadcaster.subscriber_ids() {
            let snapshot = self.engine.snapshot_for(Some(player_id));
            self.broadcaster
                .send_to(player_id, Broadcast::Snapshot(snapshot));
        }
    }

    /// Commit a staged engine mutation. A hand that just reached showdown is
    /// still in its `SHOWDOWN` phase here: its reveal snapshots are captured
    /// first, then the hand is archived and its record persisted, and only
    /// then does the staged state replace the live one. Subscribers see the
    /// showdown view followed by the between-hands state; a failed write
    /// rolls the whole mutation back.
    async fn commit_staged(&mut self, mut staged: HandEngine) -> Result<(), GameError> {
        let mut reveals = Vec::new();
        if staged.phase() == Phase::Showdown {
            for player_id in self.broadcaster.subscriber_ids() {
                reveals.push((player_id, staged.snapshot_for(Some(player_id))));
            }
            staged.conclude_showdown(self.clock.now())?;
        }
        if let Some(record) = staged.take_pending_record() {
            self.store.insert_hand_record(self.id, &record).await?;
        }
        self.engine = staged;
        for (player_id, snapshot) in reveals {
            self.broadcaster
                .send_to(player_id, Broadcast::Snapshot(snapshot));
        }
        self.broadcast_snapshots();
        Ok(())
    }

    /// The one-shot end-of-game notification.
    fn broadcast_summary(&mut self, summary: &GameSummary) {
        if self.summary_sent {
            return;
        }
        self.summary_sent = true;
        self.broadcaster
            .send_all(&Broadcast::GameSummaryNotification(SummaryNotice {
                game_id: self.id,
                game_summary: summary.clone(),
                total_hands: summary.hands_played,
            }));
    }

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        buy_in: Chips,
    ) -> Result<GameSnapshot, GameError> {
        self.writable()?;
        let result = self.join_inner(player_id, buy_in).await;
        if let Err(err) = &result {
            self.note_failure(err);
        }
        result
    }

    async fn join_inner(
        &mut self,
        player_id: PlayerId,
        buy_in: Chips,
    ) -> Result<GameSnapshot, GameError> {
        let buy_in = chips::validate_amount(buy_in)?;
        if !self.config.buy_in_in_range(buy_in) {
            return Err(GameError::InvalidAmount(format!(
                "buy-in must be between {} and {}",
                self.config.min_buy_in, self.config.max_buy_in
            )));
        }
        let player = self
            .store
            .player_by_id(player_id)
            .await?
            .ok_or_else(|| GameError::NotFound("player".into()))?;

        let mut staged = self.engine.clone();
        staged.add_seat(player_id, &player.display_name, buy_in)?;
        // The bankroll debit is the real side effect; it happens only after
        // the seat validated, and the staged seat commits only after it.
        self.store.debit_bankroll(player_id, buy_in).await?;
        self.engine = staged;
        self.broadcast_snapshots();
        Ok(self.engine.snapshot_for(Some(player_id)))
    }

    async fn handle_start(&mut self, player_id: PlayerId) -> Result<GameSnapshot, GameError> {
        self.writable()?;
        if self.engine.player_seat(player_id).is_none() {
            return Err(GameError::NotSeated);
        }
        let mut staged = self.engine.clone();
        if let Err(err) = staged.start_hand() {
            self.note_failure(&err);
            return Err(err);
        }
        if let Err(err) = self.commit_staged(staged).await {
            self.note_failure(&err);
            return Err(err);
        }
        Ok(self.engine.snapshot_for(Some(player_id)))
    }

    async fn handle_action(
        &mut self,
        player_id: PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<GameSnapshot, GameError> {
        self.writable()?;
        let now = self.clock.now();
        let mut staged = self.engine.clone();
        if let Err(err) = staged.apply_action(player_id, kind, amount, now) {
            self.note_failure(&err);
            return Err(err);
        }
        if let Err(err) = self.commit_staged(staged).await {
            self.note_failure(&err);
            return Err(err);
        }
        Ok(self.engine.snapshot_for(Some(player_id)))
    }

    async fn handle_ready(&mut self, player_id: PlayerId) -> Result<ReadyReceipt, GameError> {
        self.writable()?;
        let mut staged = self.engine.clone();
        let status = match staged.mark_ready(player_id) {
            Ok(status) => status,
            Err(err) => {
                self.note_failure(&err);
                return Err(err);
            }
        };
        if let Err(err) = self.commit_staged(staged).await {
            self.note_failure(&err);
            return Err(err);
        }
        Ok(ReadyReceipt {
            ready_count: status.ready_count,
            total_count: status.total_count,
        })
    }

    async fn handle_cash_out(&mut self, player_id: PlayerId) -> Result<CashOutReceipt, GameError> {
        self.writable()?;
        let now = self.clock.now();
        let mut staged = self.engine.clone();
        let stack = match staged.cash_out(player_id) {
            Ok(stack) => stack,
            Err(err) => {
                self.note_failure(&err);
                return Err(err);
            }
        };
        let summary = staged.complete_if_done(&self.config.name, now);
        if let Some(summary) = &summary {
            let payouts = staged.settle_cashed_out_seats();
            if let Err(err) = self.store.complete_game(self.id, summary, &payouts).await {
                self.note_failure(&err);
                return Err(err);
            }
        }
        self.engine = staged;
        match &summary {
            Some(summary) => self.broadcast_summary(summary),
            None => self.broadcast_snapshots(),
        }
        Ok(CashOutReceipt {
            stack,
            game_summary_generated: summary.is_some(),
            game_summary: summary,
        })
    }

    async fn handle_buy_back_in(
        &mut self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<BuyBackReceipt, GameError> {
        self.writable()?;
        let amount = chips::validate_amount(amount)?;
        if !self.config.buy_in_in_range(amount) {
            return Err(GameError::InvalidAmount(format!(
                "buy-in must be between {} and {}",
                self.config.min_buy_in, self.config.max_buy_in
            )));
        }
        let mut staged = self.engine.clone();
        let total_stack = match staged.buy_back_in(player_id, amount) {
            Ok(total) => total,
            Err(err) => {
                self.note_failure(&err);
                return Err(err);
            }
        };
        let new_balance = self.store.debit_bankroll(player_id, amount).await?;
        self.engine = staged;
        self.broadcast_snapshots();
        Ok(BuyBackReceipt {
            total_stack,
            new_balance,
        })
    }

    async fn handle_leave(&mut self, player_id: PlayerId) -> Result<LeaveReceipt, GameError> {
        self.writable()?;
        let now = self.clock.now();
        let mut staged = self.engine.clone();
        let left_with = match staged.leave(player_id) {
            Ok(amount) => amount,
            Err(err) => {
                self.note_failure(&err);
                return Err(err);
            }
        };
        let summary = staged.complete_if_done(&self.config.name, now);
        if let Some(summary) = &summary {
            let payouts = staged.settle_cashed_out_seats();
            if let Err(err) = self.store.complete_game(self.id, summary, &payouts).await {
                self.note_failure(&err);
                return Err(err);
            }
        }
        let new_balance = self.store.credit_bankroll(player_id, left_with).await?;
        self.engine = staged;
        match &summary {
            Some(summary) => self.broadcast_summary(summary),
            None => self.broadcast_snapshots(),
        }
        Ok(LeaveReceipt {
            left_with,
            new_balance,
        })
    }

    fn handle_subscribe(
        &mut self,
        player_id: PlayerId,
        sender: mpsc::Sender<Broadcast>,
    ) -> Result<(), GameError> {
        if self.engine.player_seat(player_id).is_none() {
            return Err(GameError::Forbidden(
                "not a participant at this table".into(),
            ));
        }
        self.broadcaster.subscribe(player_id, sender);
        // The attach-time snapshot, so a late subscriber starts consistent.
        let snapshot = self.engine.snapshot_for(Some(player_id));
        self.broadcaster
            .send_to(player_id, Broadcast::Snapshot(snapshot));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::db::memory::MemoryStore;
    use crate::game::entities::{GameStatus, Phase};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    async fn spawn_table(seed: u64) -> (TableHandle, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            store
                .seed_player(id, name, dec!(1000))
                .await
                .expect("seed player");
        }
        let config = TableConfig::default();
        let engine = HandEngine::with_rng(
            1,
            config.max_seats,
            config.small_blind,
            config.big_blind,
            StdRng::seed_from_u64(seed),
        );
        let (actor, handle) =
            TableActor::new(1, config, engine, store.clone(), Arc::new(SystemClock));
        tokio::spawn(actor.run());
        (handle, store)
    }

    async fn player_to_act(handle: &TableHandle) -> PlayerId {
        let snapshot = handle.snapshot(None).await.unwrap();
        let idx = snapshot.current_to_act.expect("someone to act");
        snapshot
            .players
            .iter()
            .find(|p| p.seat_index == idx)
            .unwrap()
            .player_id
    }

    #[tokio::test]
    async fn join_debits_the_bankroll_and_seats_the_player() {
        let (handle, store) = spawn_table(1).await;
        let snapshot = handle.join(1, dec!(100)).await.unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].stack, dec!(100));
        let player = store.player_by_id(1).await.unwrap().unwrap();
        assert_eq!(player.bankroll, dec!(900));
    }

    #[tokio::test]
    async fn join_with_insufficient_bankroll_leaves_no_seat() {
        let (handle, store) = spawn_table(1).await;
        store.seed_player(9, "dave", dec!(10)).await.unwrap();
        let err = handle.join(9, dec!(100)).await.unwrap_err();
        assert_eq!(err, GameError::InsufficientFunds);
        let snapshot = handle.snapshot(None).await.unwrap();
        assert!(snapshot.players.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_buy_in_is_rejected() {
        let (handle, _) = spawn_table(1).await;
        let err = handle.join(1, dec!(5)).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidAmount");
    }

    #[tokio::test]
    async fn fold_out_hand_persists_a_record() {
        let (handle, store) = spawn_table(42).await;
        for id in [1, 2, 3] {
            handle.join(id, dec!(100)).await.unwrap();
        }
        handle.start(1).await.unwrap();
        let first = player_to_act(&handle).await;
        handle.action(first, ActionKind::Fold, None).await.unwrap();
        let second = player_to_act(&handle).await;
        let snapshot = handle.action(second, ActionKind::Fold, None).await.unwrap();
        assert_eq!(snapshot.phase, Phase::WaitingForPlayers);
        assert!(snapshot.winner_info.is_some());
        let records = store.hand_records(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].final_phase, Phase::Preflop);
        // Money conservation across the whole table.
        let total: Chips = snapshot.players.iter().map(|p| p.stack).sum();
        assert_eq!(total + snapshot.pot, dec!(300));
    }

    #[tokio::test]
    async fn subscriber_sees_snapshots_in_mutation_order() {
        let (handle, _) = spawn_table(42).await;
        handle.join(1, dec!(100)).await.unwrap();
        handle.join(2, dec!(100)).await.unwrap();
        let (tx, mut rx) = mpsc::channel(64);
        handle.subscribe(1, tx).await.unwrap();
        // Attach-time snapshot arrives first.
        let first = rx.recv().await.unwrap();
        let Broadcast::Snapshot(first) = first else {
            panic!("expected snapshot on attach");
        };
        assert_eq!(first.players.len(), 2);
        handle.join(3, dec!(100)).await.unwrap();
        let Broadcast::Snapshot(second) = rx.recv().await.unwrap() else {
            panic!("expected snapshot after join");
        };
        assert_eq!(second.players.len(), 3);
    }

    #[tokio::test]
    async fn subscribers_receive_the_showdown_reveal_before_the_next_state() {
        let (handle, _) = spawn_table(7).await;
        handle.join(1, dec!(100)).await.unwrap();
        handle.join(2, dec!(100)).await.unwrap();
        let (tx, mut rx) = mpsc::channel(64);
        handle.subscribe(1, tx).await.unwrap();
        handle.start(1).await.unwrap();

        // Check the whole hand down to showdown.
        for _ in 0..16 {
            let snapshot = handle.snapshot(None).await.unwrap();
            if snapshot.phase == Phase::WaitingForPlayers {
                break;
            }
            let Some(idx) = snapshot.current_to_act else {
                break;
            };
            let actor_id = snapshot
                .players
                .iter()
                .find(|p| p.seat_index == idx)
                .unwrap()
                .player_id;
            let seat = snapshot.player(actor_id).unwrap();
            let kind = if seat.current_bet < snapshot.current_bet {
                ActionKind::Call
            } else {
                ActionKind::Check
            };
            handle.action(actor_id, kind, None).await.unwrap();
        }
        assert_eq!(
            handle.snapshot(None).await.unwrap().phase,
            Phase::WaitingForPlayers
        );

        // Exactly one broadcast carries the SHOWDOWN phase, and only that
        // one reveals the opponent's hole cards.
        let mut showdown_views = 0;
        while let Ok(message) = rx.try_recv() {
            let Broadcast::Snapshot(snapshot) = message else {
                panic!("unexpected broadcast kind");
            };
            if snapshot.phase == Phase::Showdown {
                showdown_views += 1;
                assert!(
                    snapshot.players.iter().all(|p| p.hole_cards.is_some()),
                    "showdown view must reveal every contender"
                );
            } else {
                for player in &snapshot.players {
                    if player.player_id != 1 {
                        assert!(
                            player.hole_cards.is_none(),
                            "seat {} revealed outside showdown",
                            player.seat_index
                        );
                    }
                }
            }
        }
        assert_eq!(showdown_views, 1);
    }

    #[tokio::test]
    async fn subscribing_without_a_seat_is_forbidden() {
        let (handle, _) = spawn_table(1).await;
        let (tx, _rx) = mpsc::channel(4);
        let err = handle.subscribe(99, tx).await.unwrap_err();
        assert_eq!(err.kind(), "Forbidden");
    }

    #[tokio::test]
    async fn cash_out_of_every_seat_generates_one_summary() {
        let (handle, store) = spawn_table(42).await;
        handle.join(1, dec!(100)).await.unwrap();
        handle.join(2, dec!(100)).await.unwrap();
        let (tx, mut rx) = mpsc::channel(64);
        handle.subscribe(1, tx).await.unwrap();
        let _ = rx.recv().await; // attach snapshot

        let receipt = handle.cash_out(1).await.unwrap();
        assert!(!receipt.game_summary_generated);
        let _ = rx.recv().await; // cash-out snapshot

        let receipt = handle.cash_out(2).await.unwrap();
        assert!(receipt.game_summary_generated);
        let summary = receipt.game_summary.expect("summary in receipt");
        assert_eq!(summary.players.len(), 2);
        assert!(summary.players.iter().all(|p| p.net == Chips::ZERO));

        let Broadcast::GameSummaryNotification(notice) = rx.recv().await.unwrap() else {
            panic!("expected game summary notification");
        };
        assert_eq!(notice.game_id, 1);
        assert!(store.game_summary(1).await.unwrap().is_some());
        // Settled stacks are back in the bankrolls.
        for id in [1, 2] {
            let player = store.player_by_id(id).await.unwrap().unwrap();
            assert_eq!(player.bankroll, dec!(1000));
        }
    }

    #[tokio::test]
    async fn leave_credits_the_bankroll() {
        let (handle, store) = spawn_table(42).await;
        handle.join(1, dec!(100)).await.unwrap();
        handle.join(2, dec!(100)).await.unwrap();
        handle.cash_out(1).await.unwrap();
        let receipt = handle.leave(1).await.unwrap();
        assert_eq!(receipt.left_with, dec!(100));
        assert_eq!(receipt.new_balance, dec!(1000));
        let player = store.player_by_id(1).await.unwrap().unwrap();
        assert_eq!(player.bankroll, dec!(1000));
    }

    #[tokio::test]
    async fn buy_back_in_debits_the_bankroll_again() {
        let (handle, store) = spawn_table(42).await;
        handle.join(1, dec!(100)).await.unwrap();
        handle.join(2, dec!(100)).await.unwrap();
        handle.cash_out(1).await.unwrap();
        let receipt = handle.buy_back_in(1, dec!(50)).await.unwrap();
        assert_eq!(receipt.total_stack, dec!(150));
        assert_eq!(receipt.new_balance, dec!(850));
        let player = store.player_by_id(1).await.unwrap().unwrap();
        assert_eq!(player.bankroll, dec!(850));
        let snapshot = handle.snapshot(Some(1)).await.unwrap();
        assert_eq!(snapshot.players[0].state.to_string(), "ACTIVE");
        assert_eq!(snapshot.status, GameStatus::Waiting);
    }

    #[tokio::test]
    async fn close_stops_the_actor() {
        let (handle, _) = spawn_table(1).await;
        handle.close().await;
        let err = handle.snapshot(None).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::NotFound(_) | GameError::Busy | GameError::Internal(_)
        ));
    }
}
