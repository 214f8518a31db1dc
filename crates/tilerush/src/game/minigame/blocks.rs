use rand::Rng;

use super::{Input, Outcome};

pub const COLUMNS: usize = 6;
pub const ROWS: usize = 8;
const COLORS: u8 = 4;
const TARGET: u32 = 12;

/// Strip same-colored runs off column tops until enough blocks are gone.
///
/// Each `ClearColumn` input removes the contiguous run of one color at
/// the top of that column. The run resolves success as soon as the
/// cleared total reaches the target, and failure early if the board
/// empties first.
#[derive(Debug)]
pub struct BlockClear {
    /// `columns[c]` is bottom-to-top; the last element is the top block.
    columns: Vec<Vec<u8>>,
    cleared: u32,
    target: u32,
}

impl BlockClear {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let columns = (0..COLUMNS)
            .map(|_| (0..ROWS).map(|_| rng.gen_range(0..COLORS)).collect())
            .collect();
        Self {
            columns,
            cleared: 0,
            target: TARGET,
        }
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn column(&self, index: usize) -> Option<&[u8]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    fn board_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    pub(super) fn submit(&mut self, input: &Input) -> Option<Outcome> {
        let Input::ClearColumn(index) = input else {
            return None;
        };
        let column = self.columns.get_mut(*index)?;
        let top = *column.last()?;

        let mut run = 0;
        while column.last() == Some(&top) {
            column.pop();
            run += 1;
        }
        self.cleared += run;

        if self.cleared >= self.target {
            return Some(Outcome {
                success: true,
                score: Some(self.cleared),
            });
        }
        if self.board_empty() {
            return Some(Outcome {
                success: false,
                score: Some(self.cleared),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(columns: Vec<Vec<u8>>, target: u32) -> BlockClear {
        BlockClear {
            columns,
            cleared: 0,
            target,
        }
    }

    #[test]
    fn clearing_strips_the_top_run_only() {
        let mut b = board(vec![vec![1, 2, 2, 2]], 100);
        assert!(b.submit(&Input::ClearColumn(0)).is_none());
        assert_eq!(b.cleared, 3);
        assert_eq!(b.column(0), Some(&[1u8][..]));
    }

    #[test]
    fn reaching_the_target_succeeds() {
        let mut b = board(vec![vec![1, 1], vec![2, 2, 2]], 5);
        assert!(b.submit(&Input::ClearColumn(0)).is_none());
        let outcome = b.submit(&Input::ClearColumn(1)).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.score, Some(5));
    }

    #[test]
    fn emptying_the_board_short_fails() {
        let mut b = board(vec![vec![1], vec![2]], 50);
        assert!(b.submit(&Input::ClearColumn(0)).is_none());
        let outcome = b.submit(&Input::ClearColumn(1)).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.score, Some(2));
    }

    #[test]
    fn bogus_columns_are_ignored() {
        let mut b = board(vec![vec![1], vec![]], 50);
        assert!(b.submit(&Input::ClearColumn(99)).is_none());
        assert!(b.submit(&Input::ClearColumn(1)).is_none());
        assert_eq!(b.cleared, 0);
    }

    #[test]
    fn generated_boards_are_full() {
        let mut rng = StdRng::seed_from_u64(8);
        let b = BlockClear::new(&mut rng);
        for c in 0..COLUMNS {
            assert_eq!(b.column(c).unwrap().len(), ROWS);
        }
    }
}
