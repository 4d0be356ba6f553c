/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Conflict-rule checks shared by the solver and its final guard.
//!
//! # Rule
//! For every conflict triple, the final colour set of one LED action may
//! contain **at most one distinct** non-zero member of that triple.  Repeating
//! the same colour across slots never violates the rule:
//!
//! | Colours | Triple | Result |
//! |---|---|---|
//! | `1,1,1` | `(1,2,3)` | ok |
//! | `1,4,4` | `(1,2,3)` | ok |
//! | `1,2,4` | `(1,2,3)` | violation (1 and 2) |

use crate::config::ConflictTriple;

/// First violation found: `(triple_position, first_color, second_color)`,
/// with the triple position 0-based.
pub fn find_violation(colors: &[u32], conflicts: &[ConflictTriple]) -> Option<(usize, u32, u32)> {
    for (ti, triple) in conflicts.iter().enumerate() {
        let mut seen: Option<u32> = None;
        for &c in colors {
            if !triple.contains(c) {
                continue;
            }
            match seen {
                None => seen = Some(c),
                Some(first) if first != c => return Some((ti, first, c)),
                Some(_) => {}
            }
        }
    }
    None
}

pub fn satisfies(colors: &[u32], conflicts: &[ConflictTriple]) -> bool {
    find_violation(colors, conflicts).is_none()
}

/// For each available colour (same order as `available`), the positions of
/// the triples it belongs to.
pub fn groups_for_colors(available: &[u32], conflicts: &[ConflictTriple]) -> Vec<Vec<usize>> {
    available
        .iter()
        .map(|&c| {
            conflicts
                .iter()
                .enumerate()
                .filter(|(_, t)| t.contains(c))
                .map(|(ti, _)| ti)
                .collect()
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn t(a: u32, b: u32, c: u32) -> ConflictTriple {
        ConflictTriple::new(a, b, c)
    }

    #[test]
    fn repetition_of_one_member_is_allowed() {
        assert!(satisfies(&[1, 1, 1], &[t(1, 2, 3)]));
        assert!(satisfies(&[1, 4, 4], &[t(1, 2, 3)]));
    }

    #[test]
    fn two_distinct_members_violate() {
        assert_eq!(
            find_violation(&[1, 2, 4], &[t(5, 6, 0), t(1, 2, 3)]),
            Some((1, 1, 2))
        );
    }

    #[test]
    fn zero_slots_never_count() {
        assert!(satisfies(&[0, 0, 1], &[t(1, 0, 0)]));
        assert!(satisfies(&[0, 2, 0], &[t(0, 0, 2)]));
    }

    #[test]
    fn groups_follow_available_order() {
        let groups = groups_for_colors(&[1, 2, 3], &[t(1, 2, 0), t(2, 3, 0)]);
        assert_eq!(groups, vec![vec![0], vec![0, 1], vec![1]]);
    }
}
