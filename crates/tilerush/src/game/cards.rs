use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;

/// Index into the immutable card catalog.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CardId(pub u16);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EffectKind {
    /// Extra steps this turn.
    StepBonus,
    /// Fewer steps this turn, floored at zero.
    StepPenalty,
    /// No movement at all this turn. Absolute: overrides all arithmetic.
    Block,
    Nothing,
}

/// One of a card's two outcomes, picked by the mini-game result.
#[derive(Clone, Debug)]
pub struct EffectSpec {
    pub kind: EffectKind,
    pub magnitude: u32,
    pub message: &'static str,
}

const fn effect(kind: EffectKind, magnitude: u32, message: &'static str) -> EffectSpec {
    EffectSpec {
        kind,
        magnitude,
        message,
    }
}

/// Immutable catalog entry. Never mutated at runtime.
#[derive(Clone, Debug)]
pub struct Card {
    pub id: CardId,
    pub name: &'static str,
    pub weight: f32,
    pub positive: EffectSpec,
    pub negative: EffectSpec,
}

pub static CATALOG: Lazy<Vec<Card>> = Lazy::new(|| {
    use EffectKind::*;
    vec![
        Card {
            id: CardId(0),
            name: "Turbo Boots",
            weight: 1.0,
            positive: effect(StepBonus, 3, "extra spring in your step"),
            negative: effect(StepPenalty, 1, "the laces come undone"),
        },
        Card {
            id: CardId(1),
            name: "Banana Peel",
            weight: 1.2,
            positive: effect(StepBonus, 1, "you vault right over it"),
            negative: effect(StepPenalty, 2, "you slip and tumble"),
        },
        Card {
            id: CardId(2),
            name: "Rusty Anchor",
            weight: 0.6,
            positive: effect(Nothing, 0, "the anchor stays aboard"),
            negative: effect(Block, 0, "anchored to the tile"),
        },
        Card {
            id: CardId(3),
            name: "Tailwind",
            weight: 1.0,
            positive: effect(StepBonus, 2, "the wind is at your back"),
            negative: effect(Nothing, 0, "the air goes still"),
        },
        Card {
            id: CardId(4),
            name: "Pebble in the Shoe",
            weight: 1.4,
            positive: effect(StepBonus, 1, "you shake it out mid-stride"),
            negative: effect(StepPenalty, 1, "every step stings"),
        },
        Card {
            id: CardId(5),
            name: "Rocket Skates",
            weight: 0.4,
            positive: effect(StepBonus, 5, "ignition!"),
            negative: effect(Block, 0, "they fire backwards and you cling to a lamppost"),
        },
        Card {
            id: CardId(6),
            name: "Comfy Bench",
            weight: 0.8,
            positive: effect(StepBonus, 2, "a power nap works wonders"),
            negative: effect(StepPenalty, 3, "you doze through the starting gun"),
        },
        Card {
            id: CardId(7),
            name: "Lucky Clover",
            weight: 0.9,
            positive: effect(StepBonus, 2, "fortune favors you"),
            negative: effect(Nothing, 0, "just a weed after all"),
        },
    ]
});

pub fn card(id: CardId) -> Option<&'static Card> {
    CATALOG.iter().find(|c| c.id == id)
}

/// Draw `n` distinct cards from the whole catalog, weighted.
pub fn draw_offer<R: Rng>(rng: &mut R, n: usize) -> Vec<CardId> {
    weighted_distinct(rng, CATALOG.iter().map(|c| (c.id, c.weight)), n)
}

/// Draw a single card from an already offered set, with the same weights.
/// Used when the card phase times out without a selection.
pub fn fallback_pick<R: Rng>(rng: &mut R, offered: &[CardId]) -> Option<CardId> {
    let candidates = offered
        .iter()
        .filter_map(|&id| card(id))
        .map(|c| (c.id, c.weight));
    weighted_distinct(rng, candidates, 1).into_iter().next()
}

/// Approximately-weighted sampling without replacement: each candidate is
/// replicated `ceil(weight * 10)` times, the pool is shuffled, and the
/// first `n` distinct identities win. The result is only roughly
/// proportional to the weights; that is the intended behavior.
fn weighted_distinct<R: Rng>(
    rng: &mut R,
    candidates: impl Iterator<Item = (CardId, f32)>,
    n: usize,
) -> Vec<CardId> {
    let mut pool = Vec::new();
    for (id, weight) in candidates {
        let copies = (weight * 10.0).ceil().max(1.0) as usize;
        pool.extend(std::iter::repeat(id).take(copies));
    }
    pool.shuffle(rng);

    let mut picked = Vec::with_capacity(n);
    for id in pool {
        if !picked.contains(&id) {
            picked.push(id);
            if picked.len() == n {
                break;
            }
        }
    }
    picked
}

/// A resolved effect attached to a player for the current turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectRecord {
    pub kind: EffectKind,
    pub magnitude: u32,
    pub message: String,
}

/// Pick the card's positive or negative branch from the mini-game result.
pub fn resolve(card: &Card, success: bool) -> EffectRecord {
    let branch = if success { &card.positive } else { &card.negative };
    EffectRecord {
        kind: branch.kind,
        magnitude: branch.magnitude,
        message: format!("{}: {}", card.name, branch.message),
    }
}

/// Fold the turn's effects onto the base step count.
///
/// A movement block wins outright. Otherwise records apply in insertion
/// order and the running total is clamped at zero immediately after each
/// penalty; a bonus recorded after a clamping penalty is therefore not
/// swallowed by it.
pub fn final_steps(base: u32, effects: &[EffectRecord]) -> u32 {
    if effects.iter().any(|e| e.kind == EffectKind::Block) {
        return 0;
    }
    effects.iter().fold(base, |steps, e| match e.kind {
        EffectKind::StepBonus => steps + e.magnitude,
        EffectKind::StepPenalty => steps.saturating_sub(e.magnitude),
        EffectKind::Block | EffectKind::Nothing => steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(kind: EffectKind, magnitude: u32) -> EffectRecord {
        EffectRecord {
            kind,
            magnitude,
            message: String::new(),
        }
    }

    #[test]
    fn catalog_ids_are_unique_and_resolvable() {
        for c in CATALOG.iter() {
            assert_eq!(card(c.id).unwrap().id, c.id);
        }
        let mut ids: Vec<_> = CATALOG.iter().map(|c| c.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn offers_are_exactly_n_distinct_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let offer = draw_offer(&mut rng, 3);
            assert_eq!(offer.len(), 3);
            assert!(offer[0] != offer[1] && offer[1] != offer[2] && offer[0] != offer[2]);
        }
    }

    #[test]
    fn offer_can_request_the_whole_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        let offer = draw_offer(&mut rng, CATALOG.len());
        assert_eq!(offer.len(), CATALOG.len());
    }

    #[test]
    fn heavier_cards_come_up_more_often() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut banana = 0usize;
        let mut skates = 0usize;
        for _ in 0..2000 {
            let pick = fallback_pick(&mut rng, &[CardId(1), CardId(5)]).unwrap();
            match pick {
                CardId(1) => banana += 1,
                CardId(5) => skates += 1,
                _ => unreachable!(),
            }
        }
        // weight 1.2 vs 0.4: a clear majority, not an exact ratio
        assert!(banana > skates * 2, "banana={banana} skates={skates}");
    }

    #[test]
    fn fallback_pick_stays_within_the_offer() {
        let mut rng = StdRng::seed_from_u64(5);
        let offer = [CardId(2), CardId(6)];
        for _ in 0..50 {
            let pick = fallback_pick(&mut rng, &offer).unwrap();
            assert!(offer.contains(&pick));
        }
        assert_eq!(fallback_pick(&mut rng, &[]), None);
    }

    #[test]
    fn resolve_picks_the_matching_branch() {
        let boots = card(CardId(0)).unwrap();
        assert_eq!(resolve(boots, true).kind, EffectKind::StepBonus);
        assert_eq!(resolve(boots, false).kind, EffectKind::StepPenalty);
        assert!(resolve(boots, true).message.contains("Turbo Boots"));
    }

    #[test]
    fn block_overrides_everything() {
        let effects = vec![
            record(EffectKind::StepBonus, 10),
            record(EffectKind::Block, 0),
            record(EffectKind::StepBonus, 10),
        ];
        assert_eq!(final_steps(5, &effects), 0);
    }

    #[test]
    fn penalties_clamp_immediately_not_at_the_end() {
        // base 2: penalty 5 clamps to 0, then bonus 3 lands on top
        let effects = vec![
            record(EffectKind::StepPenalty, 5),
            record(EffectKind::StepBonus, 3),
        ];
        assert_eq!(final_steps(2, &effects), 3);

        // same records, opposite order: 2 + 3 - 5 clamps to 0
        let effects = vec![
            record(EffectKind::StepBonus, 3),
            record(EffectKind::StepPenalty, 5),
        ];
        assert_eq!(final_steps(2, &effects), 0);
    }

    #[test]
    fn noop_effects_change_nothing() {
        let effects = vec![record(EffectKind::Nothing, 9)];
        assert_eq!(final_steps(4, &effects), 4);
        assert_eq!(final_steps(4, &[]), 4);
    }
}
