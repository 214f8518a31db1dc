use std::collections::VecDeque;

use thiserror::Error;
use tilerush_lib::grid::{Direction, GridPos, MapBounds};
use tilerush_lib::PlayerId;

use super::cards::{CardId, EffectRecord};

/// Steps available in round one; grows by [`STEP_INCREMENT`] each round.
pub const INITIAL_BASE_STEPS: u32 = 3;
pub const STEP_INCREMENT: u32 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveRejected {
    #[error("move would leave the map")]
    OutOfBounds,
    #[error("no steps remaining this turn")]
    NoStepsLeft,
    #[error("moves can only be queued during the movement phase")]
    NotMoving,
}

/// The full local player: identity, grid position, and the step ledger
/// for the current turn. Remote players are mirrored as plain
/// [`PlayerRecord`](tilerush_lib::player::PlayerRecord)s instead.
#[derive(Debug)]
pub struct LocalPlayer {
    pub id: PlayerId,
    pub username: String,
    pub position: GridPos,
    pub facing: Direction,
    pub base_steps: u32,
    pub remaining_steps: u32,
    pub effects: Vec<EffectRecord>,
    pub selected_card: Option<CardId>,
    queue: VecDeque<Direction>,
}

impl LocalPlayer {
    pub fn new(id: PlayerId, username: String, spawn: GridPos) -> Self {
        Self {
            id,
            username,
            position: spawn,
            facing: Direction::Forward,
            base_steps: INITIAL_BASE_STEPS,
            remaining_steps: INITIAL_BASE_STEPS,
            effects: Vec::new(),
            selected_card: None,
            queue: VecDeque::new(),
        }
    }

    /// Restore the step budget to the base count and forget any queued
    /// moves and card selection. Runs at init and at every round start.
    pub fn reset_steps(&mut self) {
        self.remaining_steps = self.base_steps;
        self.queue.clear();
        self.selected_card = None;
    }

    /// Validate and enqueue one move.
    ///
    /// The budget check counts moves already waiting in the queue, so a
    /// player can never queue more moves than steps remain. The bounds
    /// check replays the pending queue plus the candidate move; since
    /// every queued prefix was validated the same way, checking the final
    /// cell is enough.
    pub fn queue_move(&mut self, dir: Direction, bounds: &MapBounds) -> Result<(), MoveRejected> {
        if self.queue.len() as u32 >= self.remaining_steps {
            return Err(MoveRejected::NoStepsLeft);
        }

        let target = self.replay_target().stepped(dir);
        if !bounds.contains(target) {
            return Err(MoveRejected::OutOfBounds);
        }

        self.queue.push_back(dir);
        Ok(())
    }

    /// Apply the oldest queued move to the grid position and spend one
    /// step. Returns the applied direction, or `None` if nothing waited.
    pub fn step_completed(&mut self) -> Option<Direction> {
        let dir = self.queue.pop_front()?;
        self.position = self.position.stepped(dir);
        self.facing = dir;
        self.remaining_steps = self.remaining_steps.saturating_sub(1);
        Some(dir)
    }

    /// Forget the card selection and active effects from the previous
    /// turn. Runs when a new card draw begins.
    pub fn begin_turn(&mut self) {
        self.effects.clear();
        self.selected_card = None;
    }

    pub fn grow_base(&mut self) {
        self.base_steps += STEP_INCREMENT;
    }

    pub fn queued_moves(&self) -> usize {
        self.queue.len()
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    fn replay_target(&self) -> GridPos {
        self.queue
            .iter()
            .fold(self.position, |pos, &dir| pos.stepped(dir))
    }
}
