// src/lcs/min_lcs.rs

use log::trace;

use crate::utils::count_non_whitespace;
use super::sdiff::{push_unmatched, sdiff, DiffOp};

/// Edit script whose matched part is the tightest window that still
/// carries the full LCS.
#[derive(Debug, Clone)]
pub struct MinLcsDiff {
    pub lcs: usize,
    /// Covers the whole of both inputs; chars outside the tight window
    /// show up as unmatched ops.
    pub sdiff: Vec<DiffOp>,
    pub str1_match_initial: usize,
    pub str1_match_final: usize,
    pub str2_match_initial: usize,
    pub str2_match_final: usize,
    similarity: f64,
}

impl MinLcsDiff {
    /// Dice-style score: twice the matched non-whitespace chars over the
    /// non-whitespace chars of `str1` plus those of the matched window of `str2`.
    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Length of `str1` between its first and last matched char.
    pub fn str1_match_len(&self) -> usize {
        self.str1_match_final + 1 - self.str1_match_initial
    }

    pub fn str2_match_len(&self) -> usize {
        self.str2_match_final + 1 - self.str2_match_initial
    }
}

// half-open windows into str1 and str2
#[derive(Debug, Clone, Copy)]
struct Window {
    b1: usize,
    e1: usize,
    b2: usize,
    e2: usize,
}

/// Minimal LCS diff of `str1` into `str2`.
///
/// Returns `None` when nothing matches or the LCS is shorter than `min_len`.
pub fn min_lcs_sdiff(str1: &[char], str2: &[char], min_len: usize) -> Option<MinLcsDiff> {
    let mut window = Window { b1: 0, e1: str1.len(), b2: 0, e2: str2.len() };
    let mut script = window_sdiff(str1, str2, window);
    let lcs = count_matches(&script);
    if lcs == 0 || lcs < min_len {
        return None;
    }

    // shrink while one edge char can be dropped without losing a match
    loop {
        let (m1i, m1f, m2i, m2f) = match_bounds(&script)?;
        let trials = [
            Window { b1: m1i + 1, e1: m1f + 1, b2: m2i, e2: m2f + 1 },
            Window { b1: m1i, e1: m1f, b2: m2i, e2: m2f + 1 },
            Window { b1: m1i, e1: m1f + 1, b2: m2i + 1, e2: m2f + 1 },
            Window { b1: m1i, e1: m1f + 1, b2: m2i, e2: m2f },
        ];

        let mut shrunk = None;
        for trial in trials.iter() {
            if trial.b1 >= trial.e1 || trial.b2 >= trial.e2 {
                continue;
            }
            let candidate = window_sdiff(str1, str2, *trial);
            if count_matches(&candidate) >= lcs {
                shrunk = Some((*trial, candidate));
                break;
            }
        }

        match shrunk {
            Some((trial, candidate)) => {
                trace!("min-lcs window shrunk to [{}, {}) x [{}, {})", trial.b1, trial.e1, trial.b2, trial.e2);
                window = trial;
                script = candidate;
            }
            None => break,
        }
    }

    let (m1i, m1f, m2i, m2f) = match_bounds(&script)?;

    // unmatched margins outside the final window
    let mut full = Vec::with_capacity(str1.len().max(str2.len()));
    push_unmatched(&mut full, 0..window.b1, 0..window.b2);
    full.extend(script);
    push_unmatched(&mut full, window.e1..str1.len(), window.e2..str2.len());

    let matched_non_ws = full
        .iter()
        .filter(|op| matches!(op, DiffOp::Match { old, .. } if !str1[*old].is_whitespace()))
        .count();
    let scope1 = count_non_whitespace(str1);
    let scope2 = count_non_whitespace(&str2[m2i..=m2f]);
    let similarity = if scope1 + scope2 == 0 {
        1.0
    } else {
        (2 * matched_non_ws) as f64 / (scope1 + scope2) as f64
    };

    Some(MinLcsDiff {
        lcs,
        sdiff: full,
        str1_match_initial: m1i,
        str1_match_final: m1f,
        str2_match_initial: m2i,
        str2_match_final: m2f,
        similarity,
    })
}

fn window_sdiff(str1: &[char], str2: &[char], w: Window) -> Vec<DiffOp> {
    sdiff(&str1[w.b1..w.e1], &str2[w.b2..w.e2])
        .into_iter()
        .map(|op| op.offset(w.b1, w.b2))
        .collect()
}

fn count_matches(script: &[DiffOp]) -> usize {
    script.iter().filter(|op| op.is_match()).count()
}

// inclusive positions of the first and last match on each side
fn match_bounds(script: &[DiffOp]) -> Option<(usize, usize, usize, usize)> {
    let first = script.iter().find(|op| op.is_match())?;
    let last = script.iter().rev().find(|op| op.is_match())?;
    Some((
        first.old_position()?,
        last.old_position()?,
        first.new_position()?,
        last.new_position()?,
    ))
}
