// src/eval/ranking.rs
// Per-period ranking walks: top-k selection and reciprocal-rank position

use crate::common::is_valid;

/// Fill one selection set per requested k from a single descending walk
///
/// `order` is the descending predicted-value ordering of asset indices for
/// the period; `mask` is the period's validity column. Masked-out assets are
/// skipped. Every k still being filled receives each surviving asset, so the
/// set for a larger k is always a superset of the set for any smaller k. The
/// walk stops once the largest k is satisfied.
///
/// When fewer valid assets exist than k the selection stays short; callers
/// still average over the nominal k.
pub fn select_top_k(order: &[usize], mask: &[f64], ks: &[usize]) -> Vec<Vec<usize>> {
    let mut selections: Vec<Vec<usize>> = ks
        .iter()
        .map(|&k| Vec::with_capacity(k.min(order.len())))
        .collect();
    let largest = ks.iter().copied().max().unwrap_or(0);
    let mut taken = 0usize;

    for &asset in order {
        if !is_valid(mask[asset]) {
            continue;
        }
        for (slot, &k) in ks.iter().enumerate() {
            if selections[slot].len() < k {
                selections[slot].push(asset);
            }
        }
        taken += 1;
        if taken == largest {
            break;
        }
    }

    selections
}

/// Valid-rank position of the top-1 predicted pick within the true ranking
///
/// Walks `truth_order` (descending ground-truth ordering) from the top,
/// counting valid assets from 1 and stopping at the first one contained in
/// `top1`. Returns `None` when the period has no valid assets at all, which
/// makes it a miss day for MRR.
pub fn reciprocal_rank_position(truth_order: &[usize], mask: &[f64], top1: &[usize]) -> Option<usize> {
    let mut position = 0usize;
    for &asset in truth_order {
        if !is_valid(mask[asset]) {
            continue;
        }
        position += 1;
        if top1.contains(&asset) {
            break;
        }
    }

    if position == 0 {
        None
    } else {
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_skips_masked_assets() {
        // Descending order 1, 0, 2; asset 1 masked out
        let selections = select_top_k(&[1, 0, 2], &[1.0, 0.0, 1.0], &[1, 2]);
        assert_eq!(selections[0], vec![0]);
        assert_eq!(selections[1], vec![0, 2]);
    }

    #[test]
    fn test_select_superset_across_ks() {
        let selections = select_top_k(&[3, 1, 0, 2], &[1.0, 1.0, 1.0, 1.0], &[1, 3]);
        assert_eq!(selections[0], vec![3]);
        assert_eq!(selections[1], vec![3, 1, 0]);
        assert!(selections[1].starts_with(&selections[0]));
    }

    #[test]
    fn test_select_partial_fill() {
        // Only one valid asset for k=3
        let selections = select_top_k(&[0, 1, 2], &[0.0, 1.0, 0.0], &[3]);
        assert_eq!(selections[0], vec![1]);
    }

    #[test]
    fn test_select_no_valid_assets() {
        let selections = select_top_k(&[0, 1], &[0.0, 0.2], &[1, 2]);
        assert!(selections[0].is_empty());
        assert!(selections[1].is_empty());
    }

    #[test]
    fn test_position_first_match() {
        let position = reciprocal_rank_position(&[1, 0, 2], &[1.0, 1.0, 1.0], &[1]);
        assert_eq!(position, Some(1));
    }

    #[test]
    fn test_position_counts_only_valid_assets() {
        // Asset 1 leads the true ranking but is masked out, so asset 0 is
        // the first valid entry and the pick (asset 2) sits at position 2
        let position = reciprocal_rank_position(&[1, 0, 2], &[1.0, 0.0, 1.0], &[2]);
        assert_eq!(position, Some(2));
    }

    #[test]
    fn test_position_miss_day() {
        let position = reciprocal_rank_position(&[0, 1], &[0.0, 0.0], &[0]);
        assert_eq!(position, None);
    }
}
