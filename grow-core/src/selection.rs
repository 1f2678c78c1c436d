//! Weighted stochastic choice among scored frontier candidates.

use crate::config::GrowthConfig;
use crate::types::Cell;
use rand::Rng;
use std::cmp::Ordering;

/// Outcome of scoring one candidate.
///
/// `Blocked` is the growth field's categorical veto; such candidates never
/// take part in selection and never enter score arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    Blocked,
    Scored(f64),
}

impl Score {
    pub fn value(self) -> Option<f64> {
        match self {
            Score::Blocked => None,
            Score::Scored(v) => Some(v),
        }
    }

    pub fn is_blocked(self) -> bool {
        matches!(self, Score::Blocked)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub cell: Cell,
    pub score: f64,
}

/// Roulette weight of one score.
///
/// Non-negative scores grow exponentially; negative scores get a small
/// fixed weight, and scores under the strongly negative threshold almost
/// none.
pub fn selection_weight(score: f64, config: &GrowthConfig) -> f64 {
    if score < config.strongly_negative_threshold {
        config.strongly_negative_weight
    } else if score < 0.0 {
        config.negative_score_weight
    } else {
        (score * config.selection_exponent).exp()
    }
}

/// Picks one cell from `candidates` by cumulative-weight roulette over the
/// best `selection_pool` of them.
///
/// `candidates` is sorted in place, best first; the sort is stable, so
/// equal scores keep their discovery order. When the pool's total weight
/// is not a positive finite number, the best candidate is returned.
///
/// ### Returns
/// `None` only when `candidates` is empty.
pub fn weighted_pick<R: Rng + ?Sized>(
    candidates: &mut [Candidate],
    config: &GrowthConfig,
    rng: &mut R,
) -> Option<Cell> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let best = candidates.first()?.cell;

    let pool = &candidates[..candidates.len().min(config.selection_pool)];
    let weights: Vec<f64> = pool
        .iter()
        .map(|c| selection_weight(c.score, config))
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(best);
    }

    let r = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (candidate, w) in pool.iter().zip(&weights) {
        cumulative += w;
        if r <= cumulative {
            return Some(candidate.cell);
        }
    }
    Some(best)
}
