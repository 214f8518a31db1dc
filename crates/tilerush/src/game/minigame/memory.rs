use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{Input, Outcome};

pub const GRID_SIZE: u8 = 4;
pub const PATTERN_LEN: usize = 5;

/// Recall a briefly shown pattern of cells. Success requires the exact
/// set; the score reports how many cells were remembered correctly.
#[derive(Debug)]
pub struct MemoryMatrix {
    pattern: HashSet<(u8, u8)>,
}

impl MemoryMatrix {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut cells: Vec<(u8, u8)> = (0..GRID_SIZE)
            .flat_map(|x| (0..GRID_SIZE).map(move |y| (x, y)))
            .collect();
        cells.shuffle(rng);
        Self {
            pattern: cells.into_iter().take(PATTERN_LEN).collect(),
        }
    }

    /// The cells the player is shown during the reveal.
    pub(crate) fn pattern(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.pattern.iter().copied()
    }

    pub(super) fn submit(&mut self, input: &Input) -> Option<Outcome> {
        let Input::Recall(cells) = input else {
            return None;
        };
        let recalled: HashSet<(u8, u8)> = cells.iter().copied().collect();
        let correct = recalled.intersection(&self.pattern).count();
        Some(Outcome {
            success: recalled == self.pattern,
            score: Some(correct as u32),
        })
    }
}
