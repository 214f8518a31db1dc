use std::collections::HashMap;

use itertools::Itertools;
use tilerush_lib::PlayerId;

/// Input to the ranking: one row per live player.
#[derive(Clone, Debug)]
pub struct Contender {
    pub id: PlayerId,
    pub username: String,
    pub y: i32,
}

/// Derived, never stored between rounds (previous ranks are kept only to
/// render rank-delta arrows).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub id: PlayerId,
    pub username: String,
    pub rank: u32,
    pub is_local: bool,
}

/// Competition ranking over grid row, furthest first; ties share a rank
/// and the next distinct row jumps to `index + 1`. Deliberately not
/// dense: rows `[10, 10, 7, 3]` rank `[1, 1, 3, 4]`.
pub fn standings(contenders: Vec<Contender>, local: PlayerId) -> Vec<Standing> {
    let sorted: Vec<Contender> = contenders
        .into_iter()
        .sorted_by(|a, b| b.y.cmp(&a.y).then_with(|| a.username.cmp(&b.username)))
        .collect();

    let mut out = Vec::with_capacity(sorted.len());
    let mut prev: Option<(i32, u32)> = None;
    for (index, c) in sorted.into_iter().enumerate() {
        let rank = match prev {
            Some((y, rank)) if y == c.y => rank,
            _ => index as u32 + 1,
        };
        prev = Some((c.y, rank));
        out.push(Standing {
            id: c.id,
            username: c.username,
            rank,
            is_local: c.id == local,
        });
    }
    out
}

/// Who has reached the finish row, and when. Kept per client; logically
/// shared across peers because every client derives the same entries
/// from relayed positions.
#[derive(Debug, Default)]
pub struct FinishRegistry {
    finishes: HashMap<PlayerId, u64>,
}

impl FinishRegistry {
    /// Record a finish. Returns `true` only for the first finish of that
    /// player; repeats keep the original timestamp.
    pub fn record(&mut self, id: PlayerId, at_ms: u64) -> bool {
        use std::collections::hash_map::Entry;
        match self.finishes.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(at_ms);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn is_finished(&self, id: PlayerId) -> bool {
        self.finishes.contains_key(&id)
    }

    pub fn finished_at(&self, id: PlayerId) -> Option<u64> {
        self.finishes.get(&id).copied()
    }

    pub fn count(&self) -> usize {
        self.finishes.len()
    }

    /// The race ends when exactly one straggler remains. Evaluated after
    /// each recorded finish; with a single connected player the count is
    /// already 1 by then, so a solo race never ends this way.
    pub fn game_over(&self, total_players: usize) -> bool {
        self.finishes.len() == total_players.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contender(id: u32, name: &str, y: i32) -> Contender {
        Contender {
            id: PlayerId(id),
            username: name.into(),
            y,
        }
    }

    #[test]
    fn ties_share_rank_and_the_next_rank_jumps() {
        let ranks: Vec<u32> = standings(
            vec![
                contender(1, "ada", 10),
                contender(2, "bo", 10),
                contender(3, "cy", 7),
                contender(4, "di", 3),
            ],
            PlayerId(3),
        )
        .iter()
        .map(|s| s.rank)
        .collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
    }

    #[test]
    fn ties_are_broken_alphabetically_for_ordering() {
        let result = standings(
            vec![
                contender(1, "zoe", 5),
                contender(2, "amy", 5),
                contender(3, "mia", 9),
            ],
            PlayerId(1),
        );
        let names: Vec<&str> = result.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["mia", "amy", "zoe"]);
        assert_eq!(result[1].rank, 2);
        assert_eq!(result[2].rank, 2);
    }

    #[test]
    fn local_player_is_flagged() {
        let result = standings(
            vec![contender(1, "ada", 4), contender(2, "bo", 2)],
            PlayerId(2),
        );
        assert!(!result[0].is_local);
        assert!(result[1].is_local);
    }

    #[test]
    fn empty_field_ranks_nobody() {
        assert!(standings(Vec::new(), PlayerId(1)).is_empty());
    }

    #[test]
    fn first_finish_wins_the_timestamp() {
        let mut reg = FinishRegistry::default();
        assert!(reg.record(PlayerId(1), 1000));
        assert!(!reg.record(PlayerId(1), 2000));
        assert_eq!(reg.finished_at(PlayerId(1)), Some(1000));
        assert!(reg.is_finished(PlayerId(1)));
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn race_ends_with_one_straggler_left() {
        let mut reg = FinishRegistry::default();
        reg.record(PlayerId(1), 10);
        assert!(!reg.game_over(3));
        reg.record(PlayerId(2), 20);
        assert!(reg.game_over(3));
    }

    #[test]
    fn solo_races_never_end() {
        let mut reg = FinishRegistry::default();
        // The check always runs after a recorded finish, so a 1-player
        // session can never satisfy `count == total - 1`.
        reg.record(PlayerId(1), 10);
        assert!(!reg.game_over(1));
    }
}
