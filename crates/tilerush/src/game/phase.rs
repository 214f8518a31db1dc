use std::time::{Duration, Instant};

pub const COUNTDOWN: Duration = Duration::from_secs(5);
pub const CARD_SELECT: Duration = Duration::from_secs(10);
pub const CARD_RESULT: Duration = Duration::from_secs(5);
pub const MOVEMENT: Duration = Duration::from_secs(10);
pub const LEADERBOARD: Duration = Duration::from_secs(8);
pub const ROUND_BREAK: Duration = Duration::from_secs(3);

/// Breather between one phase ending and the next starting, so transient
/// presentation can tear down.
pub const PHASE_GAP: Duration = Duration::from_millis(500);

/// A named stretch of game time with one active behavior. The table is
/// fixed and cyclic; `Finished` is terminal and never times out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Countdown,
    Card,
    Minigame,
    CardResult,
    Movement,
    Leaderboard,
    Round,
    Finished,
}

impl Phase {
    /// Fixed duration, or `None` for phases that are armed explicitly
    /// (`Minigame`, whose budget depends on the chosen game) or never
    /// expire (`Finished`).
    fn scheduled(self) -> Option<Duration> {
        match self {
            Phase::Countdown => Some(COUNTDOWN),
            Phase::Card => Some(CARD_SELECT),
            Phase::Minigame => None,
            Phase::CardResult => Some(CARD_RESULT),
            Phase::Movement => Some(MOVEMENT),
            Phase::Leaderboard => Some(LEADERBOARD),
            Phase::Round => Some(ROUND_BREAK),
            Phase::Finished => None,
        }
    }

    fn successor(self) -> Phase {
        match self {
            Phase::Countdown => Phase::Card,
            Phase::Card => Phase::Minigame,
            Phase::Minigame => Phase::CardResult,
            Phase::CardResult => Phase::Movement,
            Phase::Movement => Phase::Leaderboard,
            Phase::Leaderboard => Phase::Round,
            Phase::Round => Phase::Card,
            Phase::Finished => Phase::Finished,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The phase's deadline fired. Not emitted for manual early exits;
    /// whoever calls [`PhaseController::end_phase`] already knows.
    Ended(Phase),
    Started(Phase),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Active {
        phase: Phase,
        deadline: Option<Instant>,
    },
    /// Between phases: the previous one has ended, the next starts at `at`.
    Gap { next: Phase, at: Instant },
}

/// The single source of truth for "what phase is this client in".
///
/// Purely tick-driven: callers pass `now` into [`tick`](Self::tick) and the
/// controller compares deadlines, so tests can run entirely on synthetic
/// instants. Ending a phase that is no longer active is a logged no-op.
#[derive(Debug)]
pub struct PhaseController {
    state: State,
}

impl PhaseController {
    pub fn new(now: Instant) -> Self {
        Self {
            state: State::Active {
                phase: Phase::Countdown,
                deadline: Some(now + COUNTDOWN),
            },
        }
    }

    /// The active phase, or `None` while between phases.
    pub fn phase(&self) -> Option<Phase> {
        match self.state {
            State::Active { phase, .. } => Some(phase),
            State::Gap { .. } => None,
        }
    }

    pub fn is_active(&self, phase: Phase) -> bool {
        self.phase() == Some(phase)
    }

    /// Set the deadline of the currently active phase. Used for phases
    /// whose duration is only known at start time.
    pub fn arm(&mut self, deadline: Instant) {
        match &mut self.state {
            State::Active { deadline: slot, .. } => *slot = Some(deadline),
            State::Gap { .. } => {
                tracing::debug!("Tried to arm a deadline while between phases");
            }
        }
    }

    /// Manually end `phase` before its deadline. Calling this for a phase
    /// that is not active (already timed out, already ended) does nothing.
    pub fn end_phase(&mut self, phase: Phase, now: Instant) {
        match self.state {
            State::Active { phase: current, .. } if current == phase => {
                self.state = State::Gap {
                    next: phase.successor(),
                    at: now + PHASE_GAP,
                };
            }
            _ => {
                tracing::debug!(?phase, "Phase already ended, ignoring");
            }
        }
    }

    /// Short-circuit from the movement phase to the terminal finish
    /// display, skipping the leaderboard. Only valid during `Movement`.
    pub fn finish(&mut self, now: Instant) {
        match self.state {
            State::Active {
                phase: Phase::Movement,
                ..
            } => {
                self.state = State::Gap {
                    next: Phase::Finished,
                    at: now + PHASE_GAP,
                };
            }
            _ => {
                tracing::debug!("Finish requested outside the movement phase, ignoring");
            }
        }
    }

    /// Stop cycling immediately, whatever the current phase. Used when the
    /// race is decided for everyone.
    pub fn halt(&mut self) {
        if let State::Active {
            phase: Phase::Finished,
            ..
        } = self.state
        {
            return;
        }
        self.state = State::Active {
            phase: Phase::Finished,
            deadline: None,
        };
    }

    /// Advance time to `now`. Returns at most one event per call: the end
    /// of a timed-out phase, or the start of the next one after the gap.
    pub fn tick(&mut self, now: Instant) -> Option<PhaseEvent> {
        match self.state {
            State::Active {
                phase,
                deadline: Some(deadline),
            } if now >= deadline => {
                self.state = State::Gap {
                    next: phase.successor(),
                    at: now + PHASE_GAP,
                };
                Some(PhaseEvent::Ended(phase))
            }
            State::Gap { next, at } if now >= at => {
                self.state = State::Active {
                    phase: next,
                    deadline: next.scheduled().map(|d| now + d),
                };
                Some(PhaseEvent::Started(next))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn countdown_times_out_into_card() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);
        assert_eq!(ctrl.phase(), Some(Phase::Countdown));

        assert_eq!(ctrl.tick(start + Duration::from_secs(4)), None);
        assert_eq!(
            ctrl.tick(start + COUNTDOWN),
            Some(PhaseEvent::Ended(Phase::Countdown))
        );
        assert_eq!(ctrl.phase(), None);

        let after_gap = start + COUNTDOWN + PHASE_GAP;
        assert_eq!(ctrl.tick(after_gap), Some(PhaseEvent::Started(Phase::Card)));
        assert_eq!(ctrl.phase(), Some(Phase::Card));
    }

    #[test]
    fn the_cycle_loops_back_to_card() {
        let mut now = t0();
        let mut ctrl = PhaseController::new(now);
        let mut seen = vec![Phase::Countdown];

        // Walk the machine for a while, arming the minigame whenever it starts.
        for _ in 0..1000 {
            now += Duration::from_millis(250);
            match ctrl.tick(now) {
                Some(PhaseEvent::Started(Phase::Minigame)) => {
                    ctrl.arm(now + Duration::from_secs(2));
                    seen.push(Phase::Minigame);
                }
                Some(PhaseEvent::Started(p)) => seen.push(p),
                _ => {}
            }
            if seen.len() >= 8 {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                Phase::Countdown,
                Phase::Card,
                Phase::Minigame,
                Phase::CardResult,
                Phase::Movement,
                Phase::Leaderboard,
                Phase::Round,
                Phase::Card,
            ]
        );
    }

    #[test]
    fn ending_twice_equals_ending_once() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);

        let now = start + Duration::from_secs(1);
        ctrl.end_phase(Phase::Countdown, now);
        let after_first = ctrl.state;

        // Second end is a no-op, even with a later timestamp
        ctrl.end_phase(Phase::Countdown, now + Duration::from_secs(3));
        assert_eq!(ctrl.state, after_first);

        // And ending a phase that is not active does nothing either
        ctrl.end_phase(Phase::Movement, now);
        assert_eq!(ctrl.state, after_first);
    }

    #[test]
    fn manual_end_respects_the_gap() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);

        let now = start + Duration::from_secs(1);
        ctrl.end_phase(Phase::Countdown, now);
        assert_eq!(ctrl.tick(now + Duration::from_millis(100)), None);
        assert_eq!(
            ctrl.tick(now + PHASE_GAP),
            Some(PhaseEvent::Started(Phase::Card))
        );
    }

    #[test]
    fn finish_short_circuits_movement_only() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);

        // Not in movement: ignored
        ctrl.finish(start);
        assert_eq!(ctrl.phase(), Some(Phase::Countdown));

        ctrl.state = State::Active {
            phase: Phase::Movement,
            deadline: Some(start + MOVEMENT),
        };
        ctrl.finish(start + Duration::from_secs(2));
        let landing = start + Duration::from_secs(2) + PHASE_GAP;
        assert_eq!(
            ctrl.tick(landing),
            Some(PhaseEvent::Started(Phase::Finished))
        );
        // Finished never times out
        assert_eq!(ctrl.tick(landing + Duration::from_secs(3600)), None);
    }

    #[test]
    fn halt_is_immediate_and_idempotent() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);
        ctrl.halt();
        assert_eq!(ctrl.phase(), Some(Phase::Finished));
        ctrl.halt();
        assert_eq!(ctrl.phase(), Some(Phase::Finished));
        assert_eq!(ctrl.tick(start + Duration::from_secs(100)), None);
    }

    #[test]
    fn minigame_waits_for_an_armed_deadline() {
        let start = t0();
        let mut ctrl = PhaseController::new(start);
        ctrl.state = State::Gap {
            next: Phase::Minigame,
            at: start,
        };
        assert_eq!(
            ctrl.tick(start),
            Some(PhaseEvent::Started(Phase::Minigame))
        );
        // No deadline until armed
        assert_eq!(ctrl.tick(start + Duration::from_secs(3600)), None);

        ctrl.arm(start + Duration::from_secs(10));
        assert_eq!(
            ctrl.tick(start + Duration::from_secs(10)),
            Some(PhaseEvent::Ended(Phase::Minigame))
        );
    }
}
