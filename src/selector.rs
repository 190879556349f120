//! Path Selector (C5): explore/exploit policy over candidate paths
//! and the run's `PathHistory`.
//!
//! Grounded on the upstream `pick_two_paths`/`pick_path` pair. The
//! "pick two paths" duplicate-visit discipline follows the resolution
//! recorded in the design notes: the exploit path's visit count is
//! always bumped; the explore path's is bumped only when its label
//! differs from the exploit path's, so a duplicate selection pays one
//! visit, not two, and the caller only ever renders one prompt block
//! per unique label.

use crate::model::{Path, PathHistory};
use rand::seq::SliceRandom;

pub const MAX_VISIT: u32 = 10;
pub const ALPHA: f64 = 0.7;

pub struct Selection {
    pub exploit: Path,
    /// `None` when explore collapsed onto the same path as exploit.
    pub explore: Option<Path>,
}

/// Two-path mode (default): filter out paths with `visits >= MAX_VISIT`;
/// pick exploit = argmax missed_value, explore = argmin visits. The
/// candidate list is shuffled first, so ties in either argmax/argmin
/// are broken by a deliberate random draw rather than AST order.
pub fn pick_two_paths(mut candidates: Vec<Path>, history: &mut PathHistory) -> Option<Selection> {
    candidates.shuffle(&mut rand::thread_rng());
    let filtered: Vec<Path> = candidates
        .into_iter()
        .filter(|p| history.visits(&p.path_label) < MAX_VISIT)
        .collect();
    if filtered.is_empty() {
        return None;
    }

    let exploit_idx = filtered
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| p.missed_value)
        .map(|(i, _)| i)?;
    let explore_idx = filtered
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| history.visits(&p.path_label))
        .map(|(i, _)| i)?;

    let exploit = filtered[exploit_idx].clone();
    history.record_visit(&exploit.path_label);

    let explore = if explore_idx == exploit_idx || filtered[explore_idx].path_label == exploit.path_label {
        None
    } else {
        let p = filtered[explore_idx].clone();
        history.record_visit(&p.path_label);
        Some(p)
    };

    Some(Selection { exploit, explore })
}

/// Single-path mode: argmax `alpha*(missed_value/max_missed_value) + (1-alpha)/(visits+1)`,
/// ties broken by raw `missed_value`, itself tie-broken by the same
/// upstream shuffle `pick_two_paths` applies.
pub fn pick_single_path(mut candidates: Vec<Path>, history: &mut PathHistory) -> Option<Path> {
    if candidates.is_empty() {
        return None;
    }
    candidates.shuffle(&mut rand::thread_rng());
    let max_missed_value = candidates.iter().map(|p| p.missed_value).max().unwrap_or(1).max(1) as f64;

    let best = candidates
        .into_iter()
        .map(|p| {
            let visits = history.visits(&p.path_label) as f64;
            let score = ALPHA * (p.missed_value as f64 / max_missed_value) + (1.0 - ALPHA) / (visits + 1.0);
            (score, p)
        })
        .reduce(|a, b| {
            if b.0 > a.0 || (b.0 == a.0 && b.1.missed_value > a.1.missed_value) {
                b
            } else {
                a
            }
        })
        .map(|(_, p)| p)?;

    history.record_visit(&best.path_label);
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(label: &str, missed_value: usize) -> Path {
        Path {
            node_ids: Vec::new(),
            edges: Vec::new(),
            missed_value,
            path_label: label.to_string(),
            condition_trace: String::new(),
        }
    }

    #[test]
    fn two_path_mode_picks_max_missed_and_least_visited() {
        let mut history = PathHistory::default();
        history.record_visit("b");
        history.record_visit("b");
        let candidates = vec![path("a", 5), path("b", 1), path("c", 5)];
        let sel = pick_two_paths(candidates, &mut history).unwrap();
        assert_eq!(sel.exploit.missed_value, 5);
        assert!(sel.explore.is_some());
        assert_eq!(history.visits(&sel.exploit.path_label), 1);
    }

    #[test]
    fn duplicate_path_pays_one_visit_not_two() {
        let mut history = PathHistory::default();
        let candidates = vec![path("only", 5)];
        let sel = pick_two_paths(candidates, &mut history).unwrap();
        assert!(sel.explore.is_none());
        assert_eq!(history.visits("only"), 1);
    }

    #[test]
    fn over_visited_paths_are_filtered_out() {
        let mut history = PathHistory::default();
        for _ in 0..MAX_VISIT {
            history.record_visit("a");
        }
        let candidates = vec![path("a", 5), path("b", 1)];
        let sel = pick_two_paths(candidates, &mut history).unwrap();
        assert_eq!(sel.exploit.path_label, "b");
    }

    #[test]
    fn single_path_mode_scores_by_alpha_blend() {
        let mut history = PathHistory::default();
        let candidates = vec![path("a", 10), path("b", 1)];
        let picked = pick_single_path(candidates, &mut history).unwrap();
        assert_eq!(picked.path_label, "a");
        assert_eq!(history.visits("a"), 1);
    }
}
