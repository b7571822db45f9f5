// src/lcs/sdiff.rs

use serde::{Serialize, Deserialize};

/// One step of a side-by-side edit script.
///
/// Positions are char offsets into the old (`str1`) and new (`str2`) strings.
/// A `Match` produced by the generalized LCS may cover more than one char
/// on either side; the plain diff engine only produces single-char matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffOp {
    Match { old: usize, new: usize, old_len: usize, new_len: usize },
    Replace { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

impl DiffOp {
    pub fn matched(old: usize, new: usize) -> Self {
        DiffOp::Match { old, new, old_len: 1, new_len: 1 }
    }

    /// The classic one-char action tag: `=`, `!`, `-` or `+`.
    pub fn action(&self) -> char {
        match self {
            DiffOp::Match { .. } => '=',
            DiffOp::Replace { .. } => '!',
            DiffOp::Delete { .. } => '-',
            DiffOp::Insert { .. } => '+',
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, DiffOp::Match { .. })
    }

    pub fn old_position(&self) -> Option<usize> {
        match *self {
            DiffOp::Match { old, .. } | DiffOp::Replace { old, .. } | DiffOp::Delete { old } => Some(old),
            DiffOp::Insert { .. } => None,
        }
    }

    pub fn new_position(&self) -> Option<usize> {
        match *self {
            DiffOp::Match { new, .. } | DiffOp::Replace { new, .. } | DiffOp::Insert { new } => Some(new),
            DiffOp::Delete { .. } => None,
        }
    }

    /// Same op with both positions moved by the given offsets.
    pub fn offset(&self, old_delta: usize, new_delta: usize) -> Self {
        match *self {
            DiffOp::Match { old, new, old_len, new_len } => DiffOp::Match {
                old: old + old_delta,
                new: new + new_delta,
                old_len,
                new_len,
            },
            DiffOp::Replace { old, new } => DiffOp::Replace { old: old + old_delta, new: new + new_delta },
            DiffOp::Delete { old } => DiffOp::Delete { old: old + old_delta },
            DiffOp::Insert { new } => DiffOp::Insert { new: new + new_delta },
        }
    }
}

/// Dense LCS length table, `(a.len() + 1) x (b.len() + 1)`, row-major.
pub struct LcsTable {
    cells: Vec<u32>,
    width: usize,
}

impl LcsTable {
    pub fn new(a: &[char], b: &[char]) -> Self {
        let width = b.len() + 1;
        let mut cells = vec![0u32; (a.len() + 1) * width];
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                cells[i * width + j] = if a[i - 1] == b[j - 1] {
                    cells[(i - 1) * width + j - 1] + 1
                } else {
                    cells[i * width + j - 1].max(cells[(i - 1) * width + j])
                };
            }
        }
        Self { cells, width }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }

    pub fn length(&self) -> usize {
        self.cells.last().copied().unwrap_or(0) as usize
    }
}

/// Matched `(old, new)` pairs of one LCS, in ascending order.
///
/// Reconstruction walks back from the end; on equal table values the
/// insertion from `b` is taken first.
pub fn lcs_pairs(a: &[char], b: &[char]) -> Vec<(usize, usize)> {
    let table = LcsTable::new(a, b);
    let mut pairs = Vec::with_capacity(table.length());
    let (mut i, mut j) = (a.len(), b.len());
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if table.get(i, j - 1) >= table.get(i - 1, j) {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    pairs.reverse();
    pairs
}

pub fn lcs_length(a: &[char], b: &[char]) -> usize {
    LcsTable::new(a, b).length()
}

/// Side-by-side diff of `a` into `b`.
///
/// Unmatched stretches between two matches are balanced: paired chars
/// become `Replace`, the excess on either side follows as `Delete` then
/// `Insert`.
pub fn sdiff(a: &[char], b: &[char]) -> Vec<DiffOp> {
    let pairs = lcs_pairs(a, b);
    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    for &(mi, mj) in &pairs {
        push_unmatched(&mut ops, i..mi, j..mj);
        ops.push(DiffOp::matched(mi, mj));
        i = mi + 1;
        j = mj + 1;
    }
    push_unmatched(&mut ops, i..a.len(), j..b.len());
    ops
}

/// Diff of `a` into `b` with deletions and insertions only.
pub fn diff(a: &[char], b: &[char]) -> Vec<DiffOp> {
    sdiff(a, b)
        .into_iter()
        .flat_map(|op| match op {
            DiffOp::Replace { old, new } => vec![DiffOp::Delete { old }, DiffOp::Insert { new }],
            DiffOp::Match { .. } => Vec::new(),
            other => vec![other],
        })
        .collect()
}

pub(crate) fn push_unmatched(
    ops: &mut Vec<DiffOp>,
    old: std::ops::Range<usize>,
    new: std::ops::Range<usize>,
) {
    let paired = old.len().min(new.len());
    for k in 0..paired {
        ops.push(DiffOp::Replace { old: old.start + k, new: new.start + k });
    }
    for p in old.start + paired..old.end {
        ops.push(DiffOp::Delete { old: p });
    }
    for p in new.start + paired..new.end {
        ops.push(DiffOp::Insert { new: p });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_sdiff_balances_changes() {
        let ops = sdiff(&chars("ijkabc"), &chars("xyabc"));
        let actions: String = ops.iter().map(|op| op.action()).collect();
        assert_eq!(actions, "!!-===");
        assert_eq!(ops[2], DiffOp::Delete { old: 2 });
        assert_eq!(ops[3], DiffOp::matched(3, 2));
    }

    #[test]
    fn test_sdiff_insertion_in_middle() {
        let ops = sdiff(&chars("abcd"), &chars("abxyzcd"));
        let actions: String = ops.iter().map(|op| op.action()).collect();
        assert_eq!(actions, "==+++==");
        assert_eq!(ops[5], DiffOp::matched(2, 5));
    }

    #[test]
    fn test_lcs_prefers_later_target_occurrence() {
        // both "ab"s of the target are valid; the walk from the end binds the last one
        let pairs = lcs_pairs(&chars("ab"), &chars("abab"));
        assert_eq!(pairs, vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_diff_and_length() {
        assert_eq!(lcs_length(&chars("abcxyz"), &chars("abc")), 3);
        let ops = diff(&chars("abc"), &chars("axc"));
        assert_eq!(ops, vec![DiffOp::Delete { old: 1 }, DiffOp::Insert { new: 1 }]);
        assert!(sdiff(&[], &[]).is_empty());
    }
}
