//! Character normalization with a reversible offset map.
//!
//! Known Unicode variants are folded through an [`EquivalenceTable`] and
//! whitespace runs are squeezed. Every boundary of the original text keeps
//! a monotonic image in the normalized text so positions can be projected
//! both ways.

pub mod table;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::types::Denotation;

pub use self::table::EquivalenceTable;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitespacePolicy {
    /// Runs of two or more whitespace chars become a single space.
    CollapseToOne,
    /// Every whitespace char is removed.
    CollapseToZero,
}

impl WhitespacePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhitespacePolicy::CollapseToOne => "collapse_to_one",
            WhitespacePolicy::CollapseToZero => "collapse_to_zero",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "collapse_to_one" | "one" => Some(Self::CollapseToOne),
            "collapse_to_zero" | "zero" => Some(Self::CollapseToZero),
            _ => None,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            WhitespacePolicy::CollapseToOne => &WHITESPACE_RUN,
            WhitespacePolicy::CollapseToZero => &WHITESPACE,
        }
    }
}

impl Default for WhitespacePolicy {
    fn default() -> Self {
        Self::CollapseToOne
    }
}

/// A normalized text together with its offset map.
#[derive(Debug, Clone)]
pub struct CharMapping {
    text: String,
    // (original boundary, normalized boundary), one entry per original boundary
    offsets: Vec<(usize, usize)>,
}

impl CharMapping {
    pub fn new(text: &str, table: &EquivalenceTable, policy: WhitespacePolicy) -> Self {
        let substitutions = table.char_substitutions();
        let mut work: Vec<char> = text
            .chars()
            .map(|c| *substitutions.get(&c).unwrap_or(&c))
            .collect();
        let n = work.len();

        // claimed: part of a long form already located; dropped: removed from the output
        let mut claimed = vec![false; n];
        let mut dropped = vec![false; n];
        let mut collapsed_forms = 0usize;

        for (one, long) in table.long_forms() {
            let len = long.len();
            let mut i = 0;
            while i + len <= n {
                if work[i] == long[0]
                    && work[i..i + len] == long[..]
                    && !claimed[i..i + len].iter().any(|&c| c)
                {
                    for p in i..i + len {
                        work[p] = one;
                        claimed[p] = true;
                        dropped[p] = p != i;
                    }
                    collapsed_forms += 1;
                    i += len;
                } else {
                    i += 1;
                }
            }
        }

        squeeze_whitespace(&mut work, &mut dropped, policy);

        let mut normalized = String::with_capacity(n);
        let mut offsets = Vec::with_capacity(n + 1);
        let mut j = 0;
        for i in 0..n {
            offsets.push((i, j));
            if !dropped[i] {
                normalized.push(work[i]);
                j += 1;
            }
        }
        offsets.push((n, j));

        trace!("Normalized {} chars to {} ({} long forms collapsed)", n, j, collapsed_forms);

        Self { text: normalized, offsets }
    }

    /// A mapping that leaves the text untouched.
    pub fn identity(text: &str) -> Self {
        let n = text.chars().count();
        Self {
            text: text.to_string(),
            offsets: (0..=n).map(|i| (i, i)).collect(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn original_len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn normalized_len(&self) -> usize {
        self.offsets.last().map(|&(_, j)| j).unwrap_or(0)
    }

    pub fn offsets(&self) -> &[(usize, usize)] {
        &self.offsets
    }

    /// Original boundary to normalized boundary.
    pub fn enmap_position(&self, position: usize) -> Option<usize> {
        self.offsets.get(position).map(|&(_, j)| j)
    }

    /// Normalized boundary to the last original boundary that maps onto it.
    pub fn demap_position(&self, position: usize) -> Option<usize> {
        let idx = self.offsets.partition_point(|&(_, j)| j <= position);
        if idx == 0 {
            return None;
        }
        let (i, j) = self.offsets[idx - 1];
        if j == position { Some(i) } else { None }
    }

    pub fn enmap_denotations(&self, denotations: &[Denotation]) -> Result<Vec<Denotation>> {
        denotations
            .iter()
            .map(|d| {
                match (self.enmap_position(d.span.begin), self.enmap_position(d.span.end)) {
                    (Some(begin), Some(end)) => {
                        let mut mapped = d.clone();
                        mapped.span.begin = begin;
                        mapped.span.end = end;
                        Ok(mapped)
                    }
                    _ => Err(Error::invalid_input(format!(
                        "Denotation span {} outside text of length {}",
                        d.span, self.original_len()
                    ))),
                }
            })
            .collect()
    }
}

fn squeeze_whitespace(work: &mut [char], dropped: &mut [bool], policy: WhitespacePolicy) {
    // positions of the surviving chars, so regex matches can be mapped back
    let kept: Vec<usize> = (0..work.len()).filter(|&i| !dropped[i]).collect();
    let visible: String = kept.iter().map(|&i| work[i]).collect();

    let mut char_idx = 0;
    let mut byte_to_char = Vec::with_capacity(visible.len() + 1);
    for c in visible.chars() {
        for _ in 0..c.len_utf8() {
            byte_to_char.push(char_idx);
        }
        char_idx += 1;
    }
    byte_to_char.push(char_idx);

    for m in policy.pattern().find_iter(&visible) {
        let first = byte_to_char[m.start()];
        let last = byte_to_char[m.end()];
        match policy {
            WhitespacePolicy::CollapseToOne => {
                work[kept[first]] = ' ';
                for k in first + 1..last {
                    dropped[kept[k]] = true;
                }
            }
            WhitespacePolicy::CollapseToZero => {
                for k in first..last {
                    dropped[kept[k]] = true;
                }
            }
        }
    }
}

/// Normalize `text`, returning the new text and its `(original, normalized)` offset pairs.
pub fn normalize(
    text: &str,
    table: &EquivalenceTable,
    policy: WhitespacePolicy,
) -> (String, Vec<(usize, usize)>) {
    let mapping = CharMapping::new(text, table, policy);
    let offsets = mapping.offsets.clone();
    (mapping.text, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn greek() -> EquivalenceTable {
        EquivalenceTable::from_strs(&[("β", "beta"), ("κ", "kappa"), ("’", "'")]).unwrap()
    }

    #[test]
    fn test_long_forms_collapse() {
        let mapping = CharMapping::new("TGF-beta and kappa’s", &greek(), WhitespacePolicy::CollapseToOne);
        assert_eq!(mapping.text(), "TGF-β and κ's");
        // "beta" spans original 4..8
        assert_eq!(mapping.enmap_position(4), Some(4));
        assert_eq!(mapping.enmap_position(5), Some(5));
        assert_eq!(mapping.enmap_position(7), Some(5));
        assert_eq!(mapping.enmap_position(8), Some(5));
        assert_eq!(mapping.demap_position(5), Some(8));
        assert_eq!(mapping.demap_position(4), Some(4));
    }

    #[test]
    fn test_whitespace_collapse_to_one() {
        let mapping = CharMapping::new("a \t\n b c", &EquivalenceTable::empty(), WhitespacePolicy::CollapseToOne);
        assert_eq!(mapping.text(), "a b c");
        assert_eq!(mapping.enmap_position(5), Some(2));
        assert_eq!(mapping.demap_position(2), Some(5));
        assert_eq!(mapping.demap_position(1), Some(1));
        assert_eq!(mapping.normalized_len(), 5);
    }

    #[test]
    fn test_whitespace_collapse_to_zero() {
        let mapping = CharMapping::new("a  b c", &EquivalenceTable::empty(), WhitespacePolicy::CollapseToZero);
        assert_eq!(mapping.text(), "abc");
        assert_eq!(mapping.enmap_position(1), Some(1));
        assert_eq!(mapping.enmap_position(3), Some(1));
        assert_eq!(mapping.demap_position(1), Some(3));
        assert_eq!(mapping.demap_position(3), Some(6));
        assert_eq!(mapping.demap_position(4), None);
    }

    #[test]
    fn test_placeholders_are_not_rematched() {
        // "betakappa" must not let a later form match across the first collapse
        let table = EquivalenceTable::from_strs(&[("β", "beta"), ("x", "ak")]).unwrap();
        let mapping = CharMapping::new("betakappa", &table, WhitespacePolicy::CollapseToOne);
        assert_eq!(mapping.text(), "βkappa");
    }

    #[test]
    fn test_empty_text() {
        let mapping = CharMapping::new("", EquivalenceTable::default_table(), WhitespacePolicy::CollapseToOne);
        assert_eq!(mapping.text(), "");
        assert_eq!(mapping.offsets(), &[(0, 0)]);
        assert_eq!(mapping.demap_position(0), Some(0));
    }

    #[test]
    fn test_enmap_denotations() {
        let mapping = CharMapping::new("TGF-beta mRNA", &greek(), WhitespacePolicy::CollapseToOne);
        let denotations = vec![Denotation::new(0, 8).with_id("T1"), Denotation::new(9, 13)];
        let mapped = mapping.enmap_denotations(&denotations).unwrap();
        assert_eq!(mapped[0].span.begin, 0);
        assert_eq!(mapped[0].span.end, 5);
        assert_eq!(mapped[0].id.as_deref(), Some("T1"));
        assert_eq!((mapped[1].span.begin, mapped[1].span.end), (6, 10));

        let bad = vec![Denotation::new(0, 99)];
        assert!(mapping.enmap_denotations(&bad).is_err());
    }

    #[test]
    fn test_round_trip_outside_collapsed_regions() {
        let alphabet = ['a', 'b', 'e', 't', ' ', '\n', 'β', 'κ', 'p'];
        let table = greek();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let len = rng.gen_range(0..40);
            let text: String = (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect();
            let mapping = CharMapping::new(&text, &table, WhitespacePolicy::CollapseToOne);

            let offsets = mapping.offsets();
            for w in offsets.windows(2) {
                assert!(w[0].1 <= w[1].1, "offset map must be monotonic");
            }
            for i in 0..=mapping.original_len() {
                let j = mapping.enmap_position(i).unwrap();
                let back = mapping.demap_position(j).unwrap();
                // i is untouched unless it shares its image with the next boundary
                let shared = i < mapping.original_len() && mapping.enmap_position(i + 1) == Some(j);
                if !shared {
                    assert_eq!(back, i, "text {:?} boundary {}", text, i);
                } else {
                    assert!(back > i);
                    assert_eq!(mapping.enmap_position(back), Some(j));
                }
            }
        }
    }
}
