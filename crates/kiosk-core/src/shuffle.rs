//! Seeded display order.
//!
//! The order is a pure function of the eligible set and the seed stored in
//! the settings document, so every display client (and every listing
//! request) sees the same sequence until something reshuffles.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::types::ItemId;

/// Upper bound on seeds tried by [`reshuffle_avoiding`].
pub const RESHUFFLE_MAX_ATTEMPTS: usize = 100;

/// Draw a new seed in `[0, 1)`.
///
/// Uses the thread-local generator; no shared generator state is touched.
pub fn new_seed() -> f64 {
    rand::rng().random::<f64>()
}

/// Permute `eligible` deterministically from `seed`.
///
/// The generator is local to the call, so ordering never perturbs
/// randomness used elsewhere.
pub fn order(eligible: &BTreeSet<ItemId>, seed: f64) -> Vec<ItemId> {
    let mut items: Vec<ItemId> = eligible.iter().cloned().collect();
    let mut rng = StdRng::seed_from_u64(seed.to_bits());
    items.shuffle(&mut rng);
    items
}

/// Result of a reshuffle search.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshuffle {
    pub seed: f64,
    pub order: Vec<ItemId>,
    pub attempts: usize,
    /// False when the attempt bound was exhausted and the last candidate
    /// still starts with the avoided item.
    pub avoided: bool,
}

/// Find a seed whose order does not start with `avoid`.
///
/// Seeds come from `next_seed`. The search stops after
/// [`RESHUFFLE_MAX_ATTEMPTS`]; the last candidate is then accepted with
/// `avoided == false` so the caller can log it. With a single eligible item
/// that is always the outcome.
pub fn reshuffle_avoiding<F>(eligible: &BTreeSet<ItemId>, avoid: Option<&str>, mut next_seed: F) -> Reshuffle
where
    F: FnMut() -> f64,
{
    let mut last = None;
    for attempt in 1..=RESHUFFLE_MAX_ATTEMPTS {
        let seed = next_seed();
        let candidate = order(eligible, seed);
        let head_ok = match (avoid, candidate.first()) {
            (Some(avoid), Some(head)) => head != avoid,
            _ => true,
        };
        if head_ok {
            return Reshuffle {
                seed,
                order: candidate,
                attempts: attempt,
                avoided: true,
            };
        }
        last = Some((seed, candidate));
    }

    let (seed, order) = last.unwrap_or_default();
    Reshuffle {
        seed,
        order,
        attempts: RESHUFFLE_MAX_ATTEMPTS,
        avoided: false,
    }
}

/// Where playback goes after `current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextItem {
    pub id: ItemId,
    /// True when `current` was the last item and the order wrapped.
    pub wrapped: bool,
}

/// The item following `current` in `order`, wrapping to the start.
///
/// When `current` is not in the order the first item is returned.
pub fn next_after(order: &[ItemId], current: &str) -> Option<NextItem> {
    let first = order.first()?;
    match order.iter().position(|id| id == current) {
        Some(index) if index + 1 < order.len() => Some(NextItem {
            id: order[index + 1].clone(),
            wrapped: false,
        }),
        Some(_) => Some(NextItem {
            id: first.clone(),
            wrapped: true,
        }),
        None => Some(NextItem {
            id: first.clone(),
            wrapped: false,
        }),
    }
}
