use rand::Rng;

use super::{Input, Outcome};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
}

/// A single arithmetic problem; only the exact result counts.
#[derive(Debug)]
pub struct MathChallenge {
    a: i64,
    b: i64,
    op: Op,
}

impl MathChallenge {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let op = match rng.gen_range(0..3) {
            0 => Op::Add,
            1 => Op::Sub,
            _ => Op::Mul,
        };
        let (a, b) = match op {
            // Keep products mental-math sized
            Op::Mul => (rng.gen_range(2..=12), rng.gen_range(2..=12)),
            _ => (rng.gen_range(10..=99), rng.gen_range(10..=99)),
        };
        Self { a, b, op }
    }

    pub fn prompt(&self) -> String {
        let symbol = match self.op {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
        };
        format!("{} {} {}", self.a, symbol, self.b)
    }

    pub(crate) fn solution(&self) -> i64 {
        match self.op {
            Op::Add => self.a + self.b,
            Op::Sub => self.a - self.b,
            Op::Mul => self.a * self.b,
        }
    }

    pub(super) fn submit(&mut self, input: &Input) -> Option<Outcome> {
        let Input::Number(n) = input else {
            return None;
        };
        Some(Outcome {
            success: *n == self.solution(),
            score: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exact_answers_only() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let mut challenge = MathChallenge::new(&mut rng);
            let solution = challenge.solution();
            assert!(challenge.submit(&Input::Number(solution)).unwrap().success);
            assert!(!challenge
                .submit(&Input::Number(solution + 1))
                .unwrap()
                .success);
        }
    }

    #[test]
    fn prompt_matches_the_operands() {
        let challenge = MathChallenge {
            a: 7,
            b: 5,
            op: Op::Mul,
        };
        assert_eq!(challenge.prompt(), "7 * 5");
        assert_eq!(challenge.solution(), 35);
    }

    #[test]
    fn foreign_input_is_ignored() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut challenge = MathChallenge::new(&mut rng);
        assert!(challenge.submit(&Input::Answer(3)).is_none());
    }
}
