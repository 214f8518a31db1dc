use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use tilerush_lib::grid::Direction;

use super::minigame::{blocks, memory, trivia, Challenge, Input};
use super::phase::Phase;
use super::session::GameSession;

/// A scripted stand-in for the human player: picks cards, takes a swing
/// at each mini-game, and queues forward-biased moves, with think delays
/// so a race against real peers looks lively rather than instant.
pub struct Autopilot {
    rng: StdRng,
    armed_phase: Option<Phase>,
    next_action_at: Option<Instant>,
}

impl Autopilot {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed
                .map(StdRng::seed_from_u64)
                .unwrap_or_else(StdRng::from_entropy),
            armed_phase: None,
            next_action_at: None,
        }
    }

    pub fn drive(&mut self, session: &mut GameSession, now: Instant) {
        let phase = session.phase();
        if phase != self.armed_phase {
            self.armed_phase = phase;
            self.next_action_at = Some(now + self.think_delay());
        }

        match self.next_action_at {
            Some(at) if now >= at => {}
            _ => return,
        }

        match phase {
            Some(Phase::Card) => {
                if session.selected_card().is_none() && !session.offer().is_empty() {
                    let index = self.rng.gen_range(0..session.offer().len());
                    session.select_card(index, now);
                }
                self.next_action_at = None;
            }
            Some(Phase::Minigame) => {
                let input = session.minigame_challenge().map(|c| self.guess(c));
                if let Some(input) = input {
                    session.minigame_input(&input, now);
                }
                // Block clearing needs several inputs; the rest resolve
                // on the first and further input is ignored anyway.
                self.next_action_at = Some(now + self.think_delay());
            }
            Some(Phase::Movement) => {
                let local = session.local();
                if (local.queued_moves() as u32) < local.remaining_steps {
                    // Map-edge rejections just mean another attempt later
                    let _ = session.queue_move(self.pick_direction());
                }
                self.next_action_at =
                    Some(now + Duration::from_millis(self.rng.gen_range(200..700)));
            }
            _ => {
                self.next_action_at = None;
            }
        }
    }

    fn guess(&mut self, challenge: &Challenge) -> Input {
        match challenge {
            Challenge::Trivia(t) => {
                // Knows the answer about half the time
                if self.rng.gen_bool(0.5) {
                    Input::Answer(t.answer())
                } else {
                    Input::Answer(self.rng.gen_range(0..trivia::CHOICES))
                }
            }
            Challenge::Math(m) => {
                if self.rng.gen_bool(0.6) {
                    Input::Number(m.solution())
                } else {
                    Input::Number(m.solution() + self.rng.gen_range(1..10))
                }
            }
            Challenge::Memory(m) => {
                // Recalls the pattern with the occasional slip
                let cells = m
                    .pattern()
                    .map(|cell| {
                        if self.rng.gen_bool(0.15) {
                            (
                                self.rng.gen_range(0..memory::GRID_SIZE),
                                self.rng.gen_range(0..memory::GRID_SIZE),
                            )
                        } else {
                            cell
                        }
                    })
                    .collect();
                Input::Recall(cells)
            }
            Challenge::Blocks(b) => {
                let occupied: Vec<usize> = (0..blocks::COLUMNS)
                    .filter(|&c| b.column(c).map_or(false, |col| !col.is_empty()))
                    .collect();
                match occupied.choose(&mut self.rng) {
                    Some(&column) => Input::ClearColumn(column),
                    None => Input::ClearColumn(0),
                }
            }
        }
    }

    fn pick_direction(&mut self) -> Direction {
        if self.rng.gen_bool(0.6) {
            Direction::Forward
        } else {
            *Direction::ALL.choose(&mut self.rng).expect("non-empty")
        }
    }

    fn think_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(400..1600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilerush_lib::PlayerId;

    #[test]
    fn pilot_plays_a_full_turn() {
        let t0 = Instant::now();
        let mut session = GameSession::new(PlayerId(1), "bot".into(), t0, Some(42));
        let mut pilot = Autopilot::new(Some(42));

        let mut now = t0;
        let mut saw_selection = false;
        let mut saw_queued_move = false;
        let mut had_steps = false;
        for _ in 0..10_000 {
            now += Duration::from_millis(50);
            pilot.drive(&mut session, now);
            // Observe queued moves before the tick executes them
            if session.phase() == Some(Phase::Movement) {
                had_steps |= session.local().remaining_steps > 0;
                saw_queued_move |= session.local().queued_moves() > 0;
            }
            session.tick(now);
            saw_selection |= session.selected_card().is_some();
            if session.phase() == Some(Phase::Leaderboard) {
                break;
            }
        }

        assert!(saw_selection, "autopilot never selected a card");
        if had_steps {
            assert!(saw_queued_move, "autopilot had steps but never queued");
        }
        assert_eq!(session.phase(), Some(Phase::Leaderboard));
    }
}
