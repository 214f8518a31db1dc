pub mod blocks;
pub mod math;
pub mod memory;
pub mod trivia;

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use blocks::BlockClear;
use math::MathChallenge;
use memory::MemoryMatrix;
use trivia::Trivia;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MinigameKind {
    Trivia,
    Memory,
    Math,
    Blocks,
}

impl MinigameKind {
    pub const POOL: [MinigameKind; 4] = [
        MinigameKind::Trivia,
        MinigameKind::Memory,
        MinigameKind::Math,
        MinigameKind::Blocks,
    ];

    /// Uniform pick from the enabled pool.
    pub fn pick<R: Rng>(rng: &mut R) -> Self {
        *Self::POOL.choose(rng).expect("pool is never empty")
    }

    /// Time budget for one activation.
    pub fn budget(self) -> Duration {
        match self {
            MinigameKind::Trivia => Duration::from_secs(15),
            MinigameKind::Memory => Duration::from_secs(20),
            MinigameKind::Math => Duration::from_secs(10),
            MinigameKind::Blocks => Duration::from_secs(30),
        }
    }
}

/// Player input, one variant per game. A game ignores input shapes that
/// are not meant for it.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    /// Trivia: index of the chosen answer.
    Answer(usize),
    /// Memory matrix: the recalled cells.
    Recall(Vec<(u8, u8)>),
    /// Math: the computed result.
    Number(i64),
    /// Block clearing: strip the top run of one column.
    ClearColumn(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub score: Option<u32>,
}

impl Outcome {
    fn timeout() -> Self {
        Self {
            success: false,
            score: None,
        }
    }
}

/// One concrete mini-game. An enum rather than a trait object so the
/// presentation layer (and the autopilot) can reach each game's own
/// display surface.
#[derive(Debug)]
pub enum Challenge {
    Trivia(Trivia),
    Memory(MemoryMatrix),
    Math(MathChallenge),
    Blocks(BlockClear),
}

impl Challenge {
    pub fn spawn<R: Rng>(kind: MinigameKind, rng: &mut R) -> Self {
        match kind {
            MinigameKind::Trivia => Challenge::Trivia(Trivia::new(rng)),
            MinigameKind::Memory => Challenge::Memory(MemoryMatrix::new(rng)),
            MinigameKind::Math => Challenge::Math(MathChallenge::new(rng)),
            MinigameKind::Blocks => Challenge::Blocks(BlockClear::new(rng)),
        }
    }

    pub fn kind(&self) -> MinigameKind {
        match self {
            Challenge::Trivia(_) => MinigameKind::Trivia,
            Challenge::Memory(_) => MinigameKind::Memory,
            Challenge::Math(_) => MinigameKind::Math,
            Challenge::Blocks(_) => MinigameKind::Blocks,
        }
    }

    /// One-line description for the log.
    pub fn describe(&self) -> String {
        match self {
            Challenge::Trivia(t) => {
                format!("Trivia: {} [{}]", t.prompt(), t.choices().join(" / "))
            }
            Challenge::Memory(_) => format!(
                "Memory matrix: memorize {} cells on a {}x{} grid",
                memory::PATTERN_LEN,
                memory::GRID_SIZE,
                memory::GRID_SIZE
            ),
            Challenge::Math(m) => format!("Quick math: {}", m.prompt()),
            Challenge::Blocks(b) => format!("Block clearing: remove {} blocks", b.target()),
        }
    }

    /// `Some(outcome)` when `input` is a qualifying completion.
    fn submit(&mut self, input: &Input) -> Option<Outcome> {
        match self {
            Challenge::Trivia(t) => t.submit(input),
            Challenge::Memory(m) => m.submit(input),
            Challenge::Math(m) => m.submit(input),
            Challenge::Blocks(b) => b.submit(input),
        }
    }
}

/// A result slot that can resolve exactly once. Later resolutions are
/// ignored rather than erroring; timeouts and racing inputs may both try.
#[derive(Debug, Default)]
struct ResultSlot {
    outcome: Option<Outcome>,
    delivered: bool,
}

impl ResultSlot {
    fn resolved(&self) -> bool {
        self.outcome.is_some()
    }

    fn resolve(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            tracing::debug!("Mini-game already resolved, ignoring late result");
            return;
        }
        self.outcome = Some(outcome);
    }

    /// Hand the resolution to the caller, once.
    fn claim(&mut self) -> Option<Outcome> {
        if self.delivered {
            return None;
        }
        let outcome = self.outcome?;
        self.delivered = true;
        Some(outcome)
    }
}

/// One activation of a mini-game against a time budget.
///
/// The uniform contract every game satisfies through this wrapper: input
/// is accepted until the budget elapses, and the run resolves exactly
/// once — with the game's outcome, or `success = false` on timeout.
#[derive(Debug)]
pub struct MinigameRun {
    challenge: Challenge,
    deadline: Instant,
    result: ResultSlot,
}

impl MinigameRun {
    pub fn new(challenge: Challenge, now: Instant) -> Self {
        let budget = challenge.kind().budget();
        Self::with_budget(challenge, now, budget)
    }

    pub fn with_budget(challenge: Challenge, now: Instant, budget: Duration) -> Self {
        Self {
            challenge,
            deadline: now + budget,
            result: ResultSlot::default(),
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn submit(&mut self, input: &Input, now: Instant) {
        if self.result.resolved() {
            return;
        }
        if now >= self.deadline {
            self.result.resolve(Outcome::timeout());
            return;
        }
        if let Some(outcome) = self.challenge.submit(input) {
            self.result.resolve(outcome);
        }
    }

    /// Check for a resolution. Expires the budget first, so polling past
    /// the deadline resolves `success = false`. Returns `Some` exactly
    /// once per activation.
    pub fn poll(&mut self, now: Instant) -> Option<Outcome> {
        if now >= self.deadline {
            self.result.resolve(Outcome::timeout());
        }
        self.result.claim()
    }
}
