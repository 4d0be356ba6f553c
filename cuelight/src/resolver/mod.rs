/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wildcard colour resolution under conflict constraints.
//!
//! [`ColorResolver`] replaces every wildcard (`0`) LED slot of a plan with a
//! concrete palette index such that no LED action ends up with two distinct
//! colours from the same conflict triple.
//!
//! # Entry points
//! * [`ColorResolver::precheck`]: prove the plan solvable, mutating nothing.
//! * [`ColorResolver::resolve`]: return a fully resolved copy of the plan.
//! * [`ColorResolver::diagnose`]: every failure, one per offending action.
//!
//! All three share [`ColorResolver::solve_colors`], so `precheck` succeeds
//! exactly when `resolve` does.
//!
//! # Search
//! Each available colour knows the triples it belongs to.  A per-triple
//! *representative* table is seeded from the fixed colours of the action, then
//! wildcard slots are filled left to right with candidates in ascending index
//! order.  A candidate is legal when every triple it belongs to is either
//! unclaimed or already claimed by that same colour.  Each decision point
//! recurses with its own copy of the table, so backtracking is just returning.
//! Depth is bounded by the LED count.
//!
//! The candidate order is fixed, so the assignment is deterministic.

pub mod conflict;
pub mod error;

pub use error::{ResolveError, SolveReason};

use tracing::{debug, info, warn};

use crate::action::{Action, ActionBody, WILDCARD_COLOR};
use crate::config::{ColorTable, ConflictTriple};

// ── Alignment ─────────────────────────────────────────────────────────────────

/// Pad with wildcards or truncate so `colors` has exactly `led_count` slots.
pub fn align_colors(colors: &[u32], led_count: usize) -> Vec<u32> {
    let mut aligned: Vec<u32> = colors.iter().copied().take(led_count).collect();
    aligned.resize(led_count, WILDCARD_COLOR);
    aligned
}

// ── ColorResolver ─────────────────────────────────────────────────────────────

/// Solver bound to one palette, conflict table and LED count.
///
/// Holds no per-plan state; every call is independent.
#[derive(Debug, Clone)]
pub struct ColorResolver<'a> {
    /// Valid palette indices, sorted and deduplicated.
    available: Vec<u32>,
    /// `groups[k]` = triple positions containing `available[k]`.
    groups: Vec<Vec<usize>>,
    conflicts: &'a [ConflictTriple],
    led_count: usize,
}

impl<'a> ColorResolver<'a> {
    pub fn new(palette: &'a ColorTable, led_count: usize) -> Self {
        let indices: Vec<u32> = palette.colors().iter().map(|c| c.index).collect();
        Self::from_parts(&indices, palette.conflicts(), led_count)
    }

    /// Build from a raw list of palette indices (any order, duplicates and
    /// zeros allowed).
    pub fn from_parts(indices: &[u32], conflicts: &'a [ConflictTriple], led_count: usize) -> Self {
        let mut available: Vec<u32> = indices.iter().copied().filter(|&i| i > 0).collect();
        available.sort_unstable();
        available.dedup();
        let groups = conflict::groups_for_colors(&available, conflicts);
        Self {
            available,
            groups,
            conflicts,
            led_count,
        }
    }

    pub fn available(&self) -> &[u32] {
        &self.available
    }

    // ── Plan-level entry points ───────────────────────────────────────────────

    /// Check that every LED action is solvable.  Stops at the first failure.
    pub fn precheck(&self, actions: &[Action]) -> Result<(), ResolveError> {
        self.check_led_count()?;
        for (i, action) in actions.iter().enumerate() {
            if let Some(colors) = action.led_colors() {
                self.solve_action(i, action, colors)?;
            }
        }
        info!(
            actions = actions.len(),
            palette = self.available.len(),
            conflicts = self.conflicts.len(),
            "colour precheck passed"
        );
        Ok(())
    }

    /// Return a copy of `actions` with every LED action aligned to the LED
    /// count and every wildcard slot replaced.
    pub fn resolve(&self, actions: &[Action]) -> Result<Vec<Action>, ResolveError> {
        self.check_led_count()?;
        let mut resolved = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            let body = match &action.body {
                ActionBody::Led { mode, colors } => ActionBody::Led {
                    mode: *mode,
                    colors: self.solve_action(i, action, colors)?,
                },
                other => other.clone(),
            };
            resolved.push(Action {
                flow_name: action.flow_name.clone(),
                body,
            });
        }
        info!(actions = resolved.len(), "plan resolved");
        Ok(resolved)
    }

    /// Run the solver over every LED action and collect all failures.
    pub fn diagnose(&self, actions: &[Action]) -> Vec<ResolveError> {
        if let Err(e) = self.check_led_count() {
            return vec![e];
        }
        actions
            .iter()
            .enumerate()
            .filter_map(|(i, a)| {
                a.led_colors()
                    .and_then(|colors| self.solve_action(i, a, colors).err())
            })
            .collect()
    }

    // ── Single action ─────────────────────────────────────────────────────────

    /// Align `colors` to the LED count and fill its wildcards.
    pub fn solve_colors(&self, colors: &[u32]) -> Result<Vec<u32>, SolveReason> {
        let mut work = align_colors(colors, self.led_count);

        if let Some(&color) = work
            .iter()
            .find(|&&c| c != WILDCARD_COLOR && self.available.binary_search(&c).is_err())
        {
            return Err(SolveReason::UnknownColor { color });
        }

        if let Some((ti, first, second)) = conflict::find_violation(&work, self.conflicts) {
            return Err(SolveReason::FixedColorClash {
                triple: ti + 1,
                first,
                second,
            });
        }

        let wildcards: Vec<usize> = work
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == WILDCARD_COLOR)
            .map(|(slot, _)| slot)
            .collect();
        if wildcards.is_empty() {
            return Ok(work);
        }
        if self.available.is_empty() {
            return Err(SolveReason::EmptyPalette);
        }

        let reps = self.seed_representatives(&work)?;
        let mut dead_end = None;
        if !self.fill(&mut work, &wildcards, reps, &mut dead_end) {
            let slot = dead_end.unwrap_or(wildcards[0]);
            return Err(SolveReason::Exhausted { slot: slot + 1 });
        }

        if let Some((ti, first, second)) = conflict::find_violation(&work, self.conflicts) {
            return Err(SolveReason::ConflictViolation {
                triple: ti + 1,
                first,
                second,
            });
        }
        Ok(work)
    }

    fn check_led_count(&self) -> Result<(), ResolveError> {
        if self.led_count == 0 {
            return Err(ResolveError::InvalidLedCount(self.led_count));
        }
        Ok(())
    }

    fn solve_action(
        &self,
        index: usize,
        action: &Action,
        colors: &[u32],
    ) -> Result<Vec<u32>, ResolveError> {
        match self.solve_colors(colors) {
            Ok(filled) => {
                debug!(
                    action = index,
                    flow = %action.flow_name,
                    colors = ?filled,
                    "LED action solved"
                );
                Ok(filled)
            }
            Err(reason) => {
                warn!(
                    action = index,
                    flow = %action.flow_name,
                    reason = %reason,
                    "LED action unsolvable"
                );
                Err(ResolveError::Unsolvable {
                    action_index: index,
                    flow: action.flow_name.clone(),
                    reason,
                })
            }
        }
    }

    fn position(&self, color: u32) -> Option<usize> {
        self.available.binary_search(&color).ok()
    }

    /// Claim every triple touched by a fixed colour.
    fn seed_representatives(&self, work: &[u32]) -> Result<Vec<u32>, SolveReason> {
        let mut reps = vec![WILDCARD_COLOR; self.conflicts.len()];
        for &c in work.iter().filter(|&&c| c != WILDCARD_COLOR) {
            let Some(k) = self.position(c) else { continue };
            for &g in &self.groups[k] {
                match reps[g] {
                    WILDCARD_COLOR => reps[g] = c,
                    rep if rep != c => {
                        return Err(SolveReason::FixedColorClash {
                            triple: g + 1,
                            first: rep,
                            second: c,
                        })
                    }
                    _ => {}
                }
            }
        }
        Ok(reps)
    }

    /// Fill `wildcards[0]`, then recurse on the rest.  `reps` is this level's
    /// own copy of the representative table.
    fn fill(
        &self,
        work: &mut [u32],
        wildcards: &[usize],
        reps: Vec<u32>,
        dead_end: &mut Option<usize>,
    ) -> bool {
        let Some((&slot, rest)) = wildcards.split_first() else {
            return true;
        };

        let mut any_legal = false;
        for (k, &color) in self.available.iter().enumerate() {
            let groups = &self.groups[k];
            let legal = groups
                .iter()
                .all(|&g| reps[g] == WILDCARD_COLOR || reps[g] == color);
            if !legal {
                continue;
            }
            any_legal = true;

            let mut next = reps.clone();
            for &g in groups {
                if next[g] == WILDCARD_COLOR {
                    next[g] = color;
                }
            }
            work[slot] = color;
            if self.fill(work, rest, next, dead_end) {
                return true;
            }
        }

        work[slot] = WILDCARD_COLOR;
        if !any_legal {
            *dead_end = Some(dead_end.map_or(slot, |d| d.max(slot)));
        }
        false
    }
}

// ── Free-function entry points ────────────────────────────────────────────────

/// Non-mutating solvability check of a whole plan.
pub fn precheck(
    actions: &[Action],
    palette: &ColorTable,
    led_count: usize,
) -> Result<(), ResolveError> {
    ColorResolver::new(palette, led_count).precheck(actions)
}

/// Resolved copy of a whole plan.
pub fn resolve(
    actions: &[Action],
    palette: &ColorTable,
    led_count: usize,
) -> Result<Vec<Action>, ResolveError> {
    ColorResolver::new(palette, led_count).resolve(actions)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::LedMode;
    use crate::config::Rgb;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn t(a: u32, b: u32, c: u32) -> ConflictTriple {
        ConflictTriple::new(a, b, c)
    }

    fn led(colors: &[u32]) -> Action {
        Action::led("flow1", LedMode::All, colors.to_vec())
    }

    fn random_triple(rng: &mut StdRng) -> ConflictTriple {
        let mut slot = || rng.gen_range(0..6);
        t(slot(), slot(), slot())
    }

    fn random_colors(rng: &mut StdRng) -> Vec<u32> {
        let len = rng.gen_range(0..5);
        (0..len).map(|_| rng.gen_range(0..6)).collect()
    }

    // ── Alignment ─────────────────────────────────────────────────────────────

    #[test]
    fn align_pads_and_truncates() {
        assert_eq!(align_colors(&[1, 2], 4), vec![1, 2, 0, 0]);
        assert_eq!(align_colors(&[1, 2, 3], 2), vec![1, 2]);
    }

    #[test]
    fn resolve_aligns_every_led_action() {
        let r = ColorResolver::from_parts(&[1, 2], &[], 3);
        let out = r.resolve(&[led(&[2]), Action::delay("flow1", 5)]).unwrap();
        assert_eq!(out[0].led_colors(), Some(&[2, 1, 1][..]));
        assert_eq!(out[1], Action::delay("flow1", 5));
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn wildcards_take_first_legal_candidate() {
        let conflicts = [t(1, 2, 0)];
        let r = ColorResolver::from_parts(&[3, 1, 2, 2], &conflicts, 2);
        assert_eq!(r.available(), &[1, 2, 3]);
        // 1 is blocked by the fixed 2, which claims the triple.
        assert_eq!(r.solve_colors(&[2, 0]), Ok(vec![2, 2]));
        assert_eq!(r.solve_colors(&[0, 0]), Ok(vec![1, 1]));
    }

    #[test]
    fn colors_outside_triples_are_always_legal() {
        let conflicts = [t(1, 2, 3)];
        let r = ColorResolver::from_parts(&[1, 2, 3, 4], &conflicts, 3);
        assert_eq!(r.solve_colors(&[3, 0, 4]), Ok(vec![3, 3, 4]));
    }

    #[test]
    fn resolved_plan_satisfies_every_triple() {
        let conflicts = [t(1, 2, 3), t(3, 4, 0), t(2, 5, 0)];
        let r = ColorResolver::from_parts(&[1, 2, 3, 4, 5], &conflicts, 4);
        let plan = vec![led(&[0, 0, 0, 0]), led(&[4, 0, 0, 5]), led(&[2, 0, 4, 0])];
        for action in r.resolve(&plan).unwrap() {
            let colors = action.led_colors().unwrap();
            assert!(!colors.contains(&WILDCARD_COLOR));
            assert!(conflict::satisfies(colors, &conflicts), "{colors:?}");
        }
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn fixed_clash_is_reported_without_search() {
        let conflicts = [t(0, 1, 2)];
        let r = ColorResolver::from_parts(&[1, 2], &conflicts, 3);
        assert_eq!(
            r.solve_colors(&[1, 0, 2]),
            Err(SolveReason::FixedColorClash {
                triple: 1,
                first: 1,
                second: 2,
            })
        );
    }

    #[test]
    fn unknown_fixed_color_is_rejected() {
        let r = ColorResolver::from_parts(&[1, 2], &[], 2);
        assert_eq!(
            r.solve_colors(&[7, 0]),
            Err(SolveReason::UnknownColor { color: 7 })
        );
    }

    #[test]
    fn empty_palette_with_wildcard_is_rejected() {
        let r = ColorResolver::from_parts(&[], &[], 2);
        assert_eq!(r.solve_colors(&[0, 0]), Err(SolveReason::EmptyPalette));
    }

    #[test]
    fn empty_palette_without_wildcard_only_fails_on_unknown_color() {
        let r = ColorResolver::from_parts(&[], &[], 1);
        assert_eq!(
            r.solve_colors(&[1]),
            Err(SolveReason::UnknownColor { color: 1 })
        );
        assert!(r.precheck(&[Action::delay("f", 1)]).is_ok());
    }

    #[test]
    fn zero_led_count_is_rejected_up_front() {
        let r = ColorResolver::from_parts(&[1], &[], 0);
        assert_eq!(
            r.precheck(&[Action::delay("f", 1)]),
            Err(ResolveError::InvalidLedCount(0))
        );
        assert_eq!(r.diagnose(&[]), vec![ResolveError::InvalidLedCount(0)]);
    }

    #[test]
    fn errors_name_action_and_flow() {
        let conflicts = [t(1, 2, 0)];
        let r = ColorResolver::from_parts(&[1, 2], &conflicts, 2);
        let plan = vec![
            Action::delay("flow1", 1),
            Action::led("flow2", LedMode::Seq, vec![1, 2]),
        ];
        let err = r.precheck(&plan).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Unsolvable {
                action_index: 1,
                flow: "flow2".to_string(),
                reason: SolveReason::FixedColorClash {
                    triple: 1,
                    first: 1,
                    second: 2,
                },
            }
        );
        let msg = err.to_string();
        assert!(msg.starts_with("action 2 (flow2) is unsolvable"), "{msg}");
    }

    #[test]
    fn diagnose_collects_every_failure() {
        let conflicts = [t(1, 2, 0)];
        let r = ColorResolver::from_parts(&[1, 2], &conflicts, 2);
        let plan = vec![led(&[1, 2]), led(&[0, 0]), led(&[9, 0])];
        let errors = r.diagnose(&plan);
        let indices: Vec<usize> = errors
            .iter()
            .filter_map(|e| match e {
                ResolveError::Unsolvable { action_index, .. } => Some(*action_index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }

    // ── precheck / resolve agreement ──────────────────────────────────────────

    #[test]
    fn precheck_agrees_with_resolve_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..300 {
            let palette: Vec<u32> = (0..rng.gen_range(0..5))
                .map(|_| rng.gen_range(1..6))
                .collect();
            let conflicts: Vec<ConflictTriple> = (0..rng.gen_range(0..4))
                .map(|_| random_triple(&mut rng))
                .collect();
            let led_count = rng.gen_range(0..5);
            let plan: Vec<Action> = (0..rng.gen_range(1..4))
                .map(|_| led(&random_colors(&mut rng)))
                .collect();

            let r = ColorResolver::from_parts(&palette, &conflicts, led_count);
            let pre = r.precheck(&plan);
            let res = r.resolve(&plan);
            assert_eq!(
                pre.is_ok(),
                res.is_ok(),
                "{palette:?} {conflicts:?} {plan:?}"
            );
            if let Ok(resolved) = res {
                for a in resolved {
                    let colors = a.led_colors().unwrap();
                    assert_eq!(colors.len(), led_count);
                    assert!(conflict::satisfies(colors, &conflicts));
                }
            }
        }
    }

    #[test]
    fn free_functions_use_color_table() {
        let mut palette = ColorTable::default();
        palette.add_color(Rgb::new(255, 0, 0)).unwrap();
        assert!(precheck(&[led(&[0])], &palette, 1).is_ok());
        let out = resolve(&[led(&[0])], &palette, 1).unwrap();
        assert_eq!(out[0].led_colors(), Some(&[1][..]));
    }
}
