use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use tilerush_lib::grid::{Direction, GridPos, MapBounds};
use tilerush_lib::net::Message;
use tilerush_lib::player::PlayerRecord;
use tilerush_lib::PlayerId;

use super::cards::{self, CardId};
use super::minigame::{Challenge, Input, MinigameKind, MinigameRun};
use super::phase::{Phase, PhaseController, PhaseEvent};
use super::player::{LocalPlayer, MoveRejected};
use super::rank::{self, Contender, FinishRegistry, Standing};

pub const MAP_WIDTH: i32 = 7;
pub const MAP_HEIGHT: i32 = 15;

/// Cards offered per turn.
pub const OFFER_SIZE: usize = 3;

/// Cadence at which queued moves execute during the movement phase.
pub const STEP_INTERVAL: Duration = Duration::from_millis(600);

/// One client's complete game context: the local player, the mirrored
/// roster, the phase machine, and the turn bookkeeping. Everything phase
/// logic touches lives here and is passed around explicitly; there are
/// no module-level singletons.
///
/// The session is single-threaded and tick-driven. The driver feeds it
/// network messages and wall-clock instants; it answers with outbound
/// relay messages.
pub struct GameSession {
    local: LocalPlayer,
    remotes: HashMap<PlayerId, PlayerRecord>,
    controller: PhaseController,
    bounds: MapBounds,
    round: u32,
    offer: Vec<CardId>,
    minigame: Option<MinigameRun>,
    pending_success: Option<bool>,
    finishes: FinishRegistry,
    last_ranks: HashMap<PlayerId, u32>,
    latest_standings: Vec<Standing>,
    started_at: Instant,
    next_step_at: Option<Instant>,
    local_finished: bool,
    game_over: bool,
    rng: StdRng,
    outbox: Vec<Message>,
}

impl GameSession {
    pub fn new(id: PlayerId, username: String, now: Instant, seed: Option<u64>) -> Self {
        let bounds = MapBounds::new(MAP_WIDTH, MAP_HEIGHT);
        let spawn = GridPos::new(MAP_WIDTH / 2, 0);
        let rng = seed
            .map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);

        Self {
            local: LocalPlayer::new(id, username.clone(), spawn),
            remotes: HashMap::new(),
            controller: PhaseController::new(now),
            bounds,
            round: 1,
            offer: Vec::new(),
            minigame: None,
            pending_success: None,
            finishes: FinishRegistry::default(),
            last_ranks: HashMap::new(),
            latest_standings: Vec::new(),
            started_at: now,
            next_step_at: None,
            local_finished: false,
            game_over: false,
            rng,
            outbox: vec![
                Message::UpdateUsername { username },
                Message::UpdatePosition {
                    position: spawn,
                    facing: Direction::Forward,
                },
            ],
        }
    }

    // ------------------------------------------------------------------
    // Read surface for the driver / input source
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Option<Phase> {
        self.controller.phase()
    }

    pub fn local(&self) -> &LocalPlayer {
        &self.local
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn offer(&self) -> &[CardId] {
        &self.offer
    }

    pub fn selected_card(&self) -> Option<CardId> {
        self.local.selected_card
    }

    pub fn minigame_challenge(&self) -> Option<&Challenge> {
        self.minigame.as_ref().map(MinigameRun::challenge)
    }

    pub fn standings(&self) -> &[Standing] {
        &self.latest_standings
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    /// The race has been decided for everyone.
    pub fn is_over(&self) -> bool {
        self.game_over
    }

    /// The local player is done and nobody is left to watch.
    pub fn idle_finished(&self) -> bool {
        self.local_finished && self.remotes.is_empty()
    }

    // ------------------------------------------------------------------
    // Input surface
    // ------------------------------------------------------------------

    /// Choose one of the offered cards and advance out of the card phase.
    pub fn select_card(&mut self, index: usize, now: Instant) {
        if !self.controller.is_active(Phase::Card) {
            tracing::debug!("Card selected outside the card phase, ignoring");
            return;
        }
        let Some(&id) = self.offer.get(index) else {
            tracing::debug!(index, "Card selection out of range, ignoring");
            return;
        };
        self.local.selected_card = Some(id);
        if let Some(card) = cards::card(id) {
            tracing::info!("Selected card: {}", card.name);
        }
        self.controller.end_phase(Phase::Card, now);
    }

    /// Forward player input to the running mini-game. Resolution is
    /// observed on the next tick.
    pub fn minigame_input(&mut self, input: &Input, now: Instant) {
        if !self.controller.is_active(Phase::Minigame) {
            tracing::debug!("Mini-game input outside the mini-game phase, ignoring");
            return;
        }
        if let Some(run) = self.minigame.as_mut() {
            run.submit(input, now);
        }
    }

    /// Queue one move for the movement phase.
    pub fn queue_move(&mut self, dir: Direction) -> Result<(), MoveRejected> {
        if !self.controller.is_active(Phase::Movement) {
            return Err(MoveRejected::NotMoving);
        }
        self.local.queue_move(dir, &self.bounds)
    }

    // ------------------------------------------------------------------
    // Network input
    // ------------------------------------------------------------------

    pub fn handle_message(&mut self, msg: Message, now: Instant) {
        match msg {
            Message::PlayerConnected { id, player } => {
                if id == self.local.id {
                    return;
                }
                tracing::info!(player_id = %id, username = %player.username, "Player joined");
                let position = player.position;
                self.remotes.insert(id, player);
                self.maybe_remote_finish(id, position, now);
            }
            Message::PlayerDisconnected { id } => {
                if self.remotes.remove(&id).is_some() {
                    tracing::info!(player_id = %id, "Player left");
                }
            }
            Message::PlayerPosition {
                id,
                position,
                facing,
            } => {
                let Some(remote) = self.remotes.get_mut(&id) else {
                    // Normal during connect/disconnect races
                    tracing::debug!(player_id = %id, "Position for unknown player, ignoring");
                    return;
                };
                remote.position = position;
                remote.facing = facing;
                self.maybe_remote_finish(id, position, now);
            }
            Message::UsernameRoster { players } => {
                for (id, record) in players {
                    if id == self.local.id {
                        self.local.username = record.username;
                    } else {
                        self.remotes.insert(id, record);
                    }
                }
            }
            Message::Error { error } => {
                tracing::error!("Relay reported: {error}");
            }
            // Welcome is consumed by the driver when it builds the
            // session; client-to-server frames never arrive here.
            other => {
                tracing::debug!("Unexpected message: {other:?}");
            }
        }
    }

    // ------------------------------------------------------------------
    // The tick
    // ------------------------------------------------------------------

    /// Advance the session to `now`. Returns outbound relay messages.
    pub fn tick(&mut self, now: Instant) -> Vec<Message> {
        self.run_movement(now);
        self.poll_minigame(now);
        if let Some(event) = self.controller.tick(now) {
            match event {
                PhaseEvent::Started(phase) => self.phase_started(phase, now),
                PhaseEvent::Ended(phase) => self.phase_timed_out(phase, now),
            }
        }
        std::mem::take(&mut self.outbox)
    }

    fn run_movement(&mut self, now: Instant) {
        if !self.controller.is_active(Phase::Movement) {
            return;
        }
        let Some(step_at) = self.next_step_at else {
            return;
        };
        if now < step_at {
            return;
        }

        if self.local.step_completed().is_some() {
            self.next_step_at = Some(now + STEP_INTERVAL);
            self.outbox.push(Message::UpdatePosition {
                position: self.local.position,
                facing: self.local.facing,
            });

            if self.local.position.y >= self.bounds.last_row() {
                self.local_finished = true;
                self.record_finish(self.local.id, now);
                if !self.game_over {
                    self.controller.finish(now);
                }
            }
        }
    }

    fn poll_minigame(&mut self, now: Instant) {
        let Some(run) = self.minigame.as_mut() else {
            return;
        };
        if let Some(outcome) = run.poll(now) {
            tracing::info!(success = outcome.success, score = ?outcome.score, "Mini-game resolved");
            self.pending_success = Some(outcome.success);
            self.controller.end_phase(Phase::Minigame, now);
        }
    }

    fn phase_started(&mut self, phase: Phase, now: Instant) {
        tracing::debug!(?phase, "Phase started");
        match phase {
            Phase::Countdown => {}
            Phase::Card => {
                self.local.begin_turn();
                self.offer = cards::draw_offer(&mut self.rng, OFFER_SIZE);
                let names: Vec<&str> = self
                    .offer
                    .iter()
                    .filter_map(|&id| cards::card(id))
                    .map(|c| c.name)
                    .collect();
                tracing::info!("Cards on offer: {}", names.join(", "));
            }
            Phase::Minigame => {
                let kind = MinigameKind::pick(&mut self.rng);
                let challenge = Challenge::spawn(kind, &mut self.rng);
                tracing::info!("{}", challenge.describe());
                let run = MinigameRun::new(challenge, now);
                self.controller.arm(run.deadline());
                self.minigame = Some(run);
            }
            Phase::CardResult => {
                let success = self.pending_success.take().unwrap_or(false);
                self.minigame = None;
                if let Some(card) = self.local.selected_card.and_then(cards::card) {
                    let record = cards::resolve(card, success);
                    tracing::info!("{}", record.message);
                    self.local.effects.push(record);
                }
            }
            Phase::Movement => {
                let budget = cards::final_steps(self.local.base_steps, &self.local.effects);
                self.local.remaining_steps = budget;
                self.local.clear_queue();
                // Effects are spent once folded into the budget
                self.local.effects.clear();
                self.next_step_at = Some(now + STEP_INTERVAL);
                tracing::info!(steps = budget, "Movement phase begins");
            }
            Phase::Leaderboard => {
                self.show_leaderboard();
            }
            Phase::Round => {
                self.round += 1;
                self.local.grow_base();
                self.local.reset_steps();
                tracing::info!(round = self.round, "Next round");
            }
            Phase::Finished => {
                match self.finishes.finished_at(self.local.id) {
                    Some(at_ms) => {
                        tracing::info!(at_ms, "Race finished; this client stops cycling phases")
                    }
                    None => tracing::info!("Race over; this client stops cycling phases"),
                }
            }
        }
    }

    /// Deadline-driven phase ends. Manual early exits do not pass
    /// through here; their callers already did the work.
    fn phase_timed_out(&mut self, phase: Phase, now: Instant) {
        tracing::debug!(?phase, "Phase timed out");
        match phase {
            Phase::Card => {
                if self.local.selected_card.is_none() {
                    self.local.selected_card = cards::fallback_pick(&mut self.rng, &self.offer);
                    if let Some(card) = self.local.selected_card.and_then(cards::card) {
                        tracing::info!("No selection made, drew {} instead", card.name);
                    }
                }
            }
            Phase::Minigame => {
                // The budget elapsed; make sure the run resolves false.
                if let Some(run) = self.minigame.as_mut() {
                    if let Some(outcome) = run.poll(now) {
                        self.pending_success = Some(outcome.success);
                    }
                }
            }
            Phase::Movement => {
                self.next_step_at = None;
                // Unexecuted moves are forfeit
                self.local.clear_queue();
            }
            _ => {}
        }
    }

    fn show_leaderboard(&mut self) {
        let standings = self.compute_standings();
        for s in &standings {
            let marker = if s.is_local {
                " (you)"
            } else if self.finishes.is_finished(s.id) {
                " (finished)"
            } else {
                ""
            };
            match self.last_ranks.get(&s.id) {
                Some(&prev) if prev != s.rank => {
                    let delta = prev as i64 - s.rank as i64;
                    tracing::info!("#{} {}{marker} ({delta:+})", s.rank, s.username);
                }
                _ => tracing::info!("#{} {}{marker}", s.rank, s.username),
            }
        }
        self.last_ranks = standings.iter().map(|s| (s.id, s.rank)).collect();
        self.latest_standings = standings;
    }

    fn compute_standings(&self) -> Vec<Standing> {
        let mut contenders = vec![Contender {
            id: self.local.id,
            username: self.local.username.clone(),
            y: self.local.position.y,
        }];
        contenders.extend(self.remotes.iter().map(|(&id, r)| Contender {
            id,
            username: r.username.clone(),
            y: r.position.y,
        }));
        rank::standings(contenders, self.local.id)
    }

    fn maybe_remote_finish(&mut self, id: PlayerId, position: GridPos, now: Instant) {
        if position.y >= self.bounds.last_row() {
            self.record_finish(id, now);
        }
    }

    fn record_finish(&mut self, id: PlayerId, now: Instant) {
        let at_ms = now.duration_since(self.started_at).as_millis() as u64;
        if !self.finishes.record(id, at_ms) {
            return;
        }
        tracing::info!(
            player_id = %id,
            at_ms,
            finished = self.finishes.count(),
            "Player reached the finish row"
        );

        let total = 1 + self.remotes.len();
        if self.finishes.game_over(total) {
            tracing::info!("Race over: only one straggler remains");
            self.game_over = true;
            self.controller.halt();
        }
    }
}
