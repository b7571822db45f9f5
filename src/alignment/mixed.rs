// src/alignment/mixed.rs

use log::trace;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::lcs::{min_lcs_sdiff, DiffOp, GeneralizedLcs};
use crate::normalizer::EquivalenceTable;
use crate::types::PositionMap;

/// Sentinel alphabet for padding collapsed long forms.
pub const PADDING_LETTERS: [char; 8] = ['@', '^', '|', '#', '$', '%', '&', '_'];

/// Character-level alignment of two short texts.
///
/// Long forms of the equivalence table (`beta` against `β`) are padded to
/// the length of their long counterpart so the plain min-LCS diff can
/// treat them as one matched unit. Mixed insert/delete runs are handed to
/// the generalized LCS for a finer mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedAlignment {
    similarity: f64,
    sdiff: Vec<DiffOp>,
    position_map_begin: PositionMap,
    position_map_end: PositionMap,
    common_elements: Vec<(String, String)>,
    mapped_elements: Vec<(String, String)>,
    str1_match_initial: Option<usize>,
    str1_match_final: Option<usize>,
    str2_match_initial: Option<usize>,
    str2_match_final: Option<usize>,
}

// a text rewritten for the diff, with its padding positions flagged
struct Padded {
    work: Vec<char>,
    padding: Vec<bool>,
}

impl Padded {
    fn new(chars: &[char], table: &EquivalenceTable) -> Self {
        let substitutions = table.char_substitutions();
        Self {
            work: chars.iter().map(|c| *substitutions.get(c).unwrap_or(c)).collect(),
            padding: vec![false; chars.len()],
        }
    }

    fn contains(&self, c: char) -> bool {
        self.work.contains(&c)
    }

    // every free occurrence of `long` becomes `one` followed by pads
    fn pad_long_form(&mut self, one: char, long: &[char], pad: char) -> usize {
        let mut replaced = 0;
        let mut i = 0;
        while i + long.len() <= self.work.len() {
            if self.work[i..i + long.len()] == *long && !self.padding[i..i + long.len()].contains(&true) {
                self.work[i] = one;
                for p in i + 1..i + long.len() {
                    self.work[p] = pad;
                    self.padding[p] = true;
                }
                replaced += 1;
                i += long.len();
            } else {
                i += 1;
            }
        }
        replaced
    }

    // chars that take part in the diff, with their original positions
    fn visible(&self) -> (Vec<char>, Vec<usize>) {
        self.work
            .iter()
            .enumerate()
            .filter(|&(i, _)| !self.padding[i])
            .map(|(i, &c)| (c, i))
            .unzip()
    }

    // padding positions right after `position`
    fn pad_run(&self, position: usize) -> usize {
        self.padding[position + 1..].iter().take_while(|&&p| p).count()
    }
}

fn choose_pad(avoid: &[char], exclude: Option<char>) -> Result<char> {
    PADDING_LETTERS
        .iter()
        .copied()
        .find(|c| Some(*c) != exclude && !avoid.contains(c))
        .ok_or_else(|| Error::padding(
            format!("every sentinel of {:?} occurs in the text", PADDING_LETTERS)
        ))
}

impl MixedAlignment {
    pub fn new(str1: &str, str2: &str, table: &EquivalenceTable) -> Result<Self> {
        let s1: Vec<char> = str1.chars().collect();
        let s2: Vec<char> = str2.chars().collect();
        Self::from_chars(&s1, &s2, table)
    }

    pub fn from_chars(s1: &[char], s2: &[char], table: &EquivalenceTable) -> Result<Self> {
        let mut padded1 = Padded::new(s1, table);
        let mut padded2 = Padded::new(s2, table);

        // sentinels are only chosen once a long form needs padding
        let mut pads: Option<(char, char)> = None;
        for (one, long) in table.long_forms() {
            let pad_into_1 = padded2.contains(one) && contains_run(&padded1.work, &long);
            let pad_into_2 = padded1.contains(one) && contains_run(&padded2.work, &long);
            if !pad_into_1 && !pad_into_2 {
                continue;
            }
            let (pad1, pad2) = match pads {
                Some(pair) => pair,
                None => {
                    let pad1 = choose_pad(s2, None)?;
                    let pad2 = choose_pad(s1, Some(pad1))?;
                    pads = Some((pad1, pad2));
                    (pad1, pad2)
                }
            };
            if pad_into_1 {
                padded1.pad_long_form(one, &long, pad1);
            }
            if pad_into_2 {
                padded2.pad_long_form(one, &long, pad2);
            }
        }

        let (visible1, index1) = padded1.visible();
        let (visible2, index2) = padded2.visible();

        let lcs = match min_lcs_sdiff(&visible1, &visible2, 0) {
            Some(lcs) => lcs,
            None => {
                trace!("mixed alignment: no common subsequence");
                return Ok(Self::unaligned(s1.len()));
            }
        };

        // back to original positions; matches absorb the padding that follows them
        let sdiff: Vec<DiffOp> = lcs
            .sdiff
            .iter()
            .map(|op| match *op {
                DiffOp::Match { old, new, .. } => {
                    let (p1, p2) = (index1[old], index2[new]);
                    DiffOp::Match {
                        old: p1,
                        new: p2,
                        old_len: 1 + padded1.pad_run(p1),
                        new_len: 1 + padded2.pad_run(p2),
                    }
                }
                DiffOp::Replace { old, new } => DiffOp::Replace { old: index1[old], new: index2[new] },
                DiffOp::Delete { old } => DiffOp::Delete { old: index1[old] },
                DiffOp::Insert { new } => DiffOp::Insert { new: index2[new] },
            })
            .collect();

        let mut alignment = Self {
            similarity: compute_similarity(s1, s2, &sdiff),
            sdiff: Vec::new(),
            position_map_begin: vec![None; s1.len() + 1],
            position_map_end: vec![None; s1.len() + 1],
            common_elements: Vec::new(),
            mapped_elements: Vec::new(),
            str1_match_initial: Some(index1[lcs.str1_match_initial]),
            str1_match_final: Some(index1[lcs.str1_match_final]),
            str2_match_initial: Some(index2[lcs.str2_match_initial]),
            str2_match_final: Some(index2[lcs.str2_match_final]),
        };
        alignment.build_maps(s1, s2, &sdiff, table);
        alignment.sdiff = sdiff;

        trace!(
            "mixed alignment of {} x {} chars: similarity {:.3}, {} mapped elements",
            s1.len(), s2.len(), alignment.similarity, alignment.mapped_elements.len()
        );
        Ok(alignment)
    }

    fn unaligned(len1: usize) -> Self {
        Self {
            similarity: 0.0,
            sdiff: Vec::new(),
            position_map_begin: vec![None; len1 + 1],
            position_map_end: vec![None; len1 + 1],
            common_elements: Vec::new(),
            mapped_elements: Vec::new(),
            str1_match_initial: None,
            str1_match_final: None,
            str2_match_initial: None,
            str2_match_final: None,
        }
    }

    fn build_maps(&mut self, s1: &[char], s2: &[char], sdiff: &[DiffOp], table: &EquivalenceTable) {
        let mut addition: Vec<usize> = Vec::new();
        let mut deletion: Vec<usize> = Vec::new();

        for op in sdiff {
            match *op {
                DiffOp::Match { old: p1, new: p2, old_len, new_len } => {
                    self.common_elements.push((
                        s1[p1..p1 + old_len].iter().collect(),
                        s2[p2..p2 + new_len].iter().collect(),
                    ));
                    self.close_run(p1, p2, &addition, &deletion, s1, s2, table);
                    addition.clear();
                    deletion.clear();
                }
                DiffOp::Replace { old, new } => {
                    deletion.push(old);
                    addition.push(new);
                }
                DiffOp::Delete { old } => deletion.push(old),
                DiffOp::Insert { new } => addition.push(new),
            }
        }

        self.close_run(s1.len(), s2.len(), &addition, &deletion, s1, s2, table);
    }

    // settle the run of unmatched positions that ends at the boundary (p1, p2)
    #[allow(clippy::too_many_arguments)]
    fn close_run(
        &mut self,
        p1: usize,
        p2: usize,
        addition: &[usize],
        deletion: &[usize],
        s1: &[char],
        s2: &[char],
        table: &EquivalenceTable,
    ) {
        self.position_map_begin[p1] = Some(p2);
        self.position_map_end[p1] = Some(p2);

        match (addition.first(), deletion.first()) {
            (None, None) => {}
            (Some(&a0), None) => {
                if p1 != 0 {
                    self.position_map_end[p1] = Some(a0);
                }
            }
            (None, Some(_)) => {
                for &p in deletion {
                    self.position_map_begin[p] = Some(p2);
                    self.position_map_end[p] = Some(p2);
                }
            }
            (Some(&a0), Some(&d0)) => {
                let (a_last, d_last) = (addition[addition.len() - 1], deletion[deletion.len() - 1]);
                if addition.len() > 1 || deletion.len() > 1 {
                    let glcs = GeneralizedLcs::from_chars(
                        s1[d0..=d_last].to_vec(),
                        s2[a0..=a_last].to_vec(),
                        table,
                    );
                    let (begin, end) = glcs.position_maps();
                    for (k, v) in begin.into_iter().enumerate() {
                        self.position_map_begin[k + d0] = v.map(|v| v + a0);
                    }
                    for (k, v) in end.into_iter().enumerate() {
                        self.position_map_end[k + d0] = v.map(|v| v + a0);
                    }
                    self.position_map_begin[p1] = Some(p2);
                    self.position_map_end[p1] = Some(p2);
                    self.common_elements.extend(glcs.common_elements());
                    self.mapped_elements.extend(glcs.mapped_elements());
                } else {
                    self.position_map_begin[d0] = Some(a0);
                    self.position_map_end[d0] = Some(a0);
                    self.mapped_elements.push((s1[d0].to_string(), s2[a0].to_string()));
                }
            }
        }
    }

    /// Coverage of `str1` times the fragmentation penalty; 0 when nothing matched.
    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    pub fn is_aligned(&self) -> bool {
        !self.sdiff.is_empty()
    }

    pub fn sdiff(&self) -> &[DiffOp] {
        &self.sdiff
    }

    pub fn transform_begin_position(&self, position: usize) -> Option<usize> {
        self.position_map_begin.get(position).copied().flatten()
    }

    pub fn transform_end_position(&self, position: usize) -> Option<usize> {
        self.position_map_end.get(position).copied().flatten()
    }

    pub fn position_map_begin(&self) -> &PositionMap {
        &self.position_map_begin
    }

    pub fn position_map_end(&self) -> &PositionMap {
        &self.position_map_end
    }

    pub fn common_elements(&self) -> &[(String, String)] {
        &self.common_elements
    }

    pub fn mapped_elements(&self) -> &[(String, String)] {
        &self.mapped_elements
    }

    /// First and last matched positions of the tightest min-LCS window, inclusive.
    pub fn str1_match_range(&self) -> Option<(usize, usize)> {
        Some((self.str1_match_initial?, self.str1_match_final?))
    }

    pub fn str2_match_range(&self) -> Option<(usize, usize)> {
        Some((self.str2_match_initial?, self.str2_match_final?))
    }
}

fn contains_run(haystack: &[char], needle: &[char]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn compute_similarity(s1: &[char], s2: &[char], sdiff: &[DiffOp]) -> f64 {
    let old_non_ws = sdiff
        .iter()
        .filter(|op| op.old_position().map_or(false, |p| !s1[p].is_whitespace()))
        .count();
    let matched_non_ws = sdiff
        .iter()
        .filter(|op| matches!(op, DiffOp::Match { old, .. } if !s1[*old].is_whitespace()))
        .count();
    let coverage = if old_non_ws == 0 { 1.0 } else { matched_non_ws as f64 / old_non_ws as f64 };

    let marks: String = sdiff
        .iter()
        .filter_map(|op| match *op {
            DiffOp::Match { .. } => Some('='),
            DiffOp::Insert { new } if !s2[new].is_whitespace() => Some('+'),
            _ => None,
        })
        .collect();
    let trimmed = marks.trim_matches('+');
    let fragments = trimmed.split('+').filter(|run| !run.is_empty()).count();

    if fragments == 0 {
        return 0.0;
    }
    coverage / fragments as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greek() -> EquivalenceTable {
        EquivalenceTable::from_strs(&[("β", "beta"), ("κ", "kappa")]).unwrap()
    }

    fn maps(str1: &str, str2: &str) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
        let alignment = MixedAlignment::new(str1, str2, &greek()).unwrap();
        (alignment.position_map_begin().clone(), alignment.position_map_end().clone())
    }

    const N: Option<usize> = None;

    fn s(values: &[usize]) -> Vec<Option<usize>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_short_to_long_form() {
        assert_eq!(maps("-β-", "-beta***-"), (s(&[0, 1, 8, 9]), s(&[0, 1, 5, 9])));
        assert_eq!(maps("-β-", "-***beta-"), (s(&[0, 4, 8, 9]), s(&[0, 1, 8, 9])));
    }

    #[test]
    fn test_long_to_short_form() {
        let (begin, end) = maps("-beta-", "-β***-");
        assert_eq!(begin, vec![Some(0), Some(1), N, N, N, Some(5), Some(6)]);
        assert_eq!(end, vec![Some(0), Some(1), N, N, N, Some(2), Some(6)]);

        let (begin, end) = maps("-beta-", "-***β-");
        assert_eq!(begin, vec![Some(0), Some(4), N, N, N, Some(5), Some(6)]);
        assert_eq!(end, vec![Some(0), Some(1), N, N, N, Some(5), Some(6)]);
    }

    #[test]
    fn test_deleted_stars() {
        assert_eq!(maps("-β***-", "-beta-").0, s(&[0, 1, 5, 5, 5, 5, 6]));
        assert_eq!(maps("-***β-", "-beta-").0, s(&[0, 1, 1, 1, 1, 5, 6]));
        assert_eq!(
            maps("-beta***-", "-β-").0,
            vec![Some(0), Some(1), N, N, N, Some(2), Some(2), Some(2), Some(2), Some(3)]
        );
        assert_eq!(
            maps("-***beta-", "-β-").0,
            vec![Some(0), Some(1), Some(1), Some(1), Some(1), N, N, N, Some(2), Some(3)]
        );
    }

    #[test]
    fn test_unknown_long_form_goes_through_generalized_lcs() {
        let table = EquivalenceTable::from_strs(&[("β", "beta")]).unwrap();
        let alignment = MixedAlignment::new("-βκ-", "-betakappa-", &table).unwrap();
        assert_eq!(alignment.position_map_begin(), &s(&[0, 1, 5, 10, 11]));
        assert_eq!(alignment.mapped_elements(), &[("κ".to_string(), "kappa".to_string())]);

        let alignment = MixedAlignment::new("-betakappa-", "-βκ-", &table).unwrap();
        assert_eq!(
            alignment.position_map_begin(),
            &vec![Some(0), Some(1), N, N, N, Some(2), N, N, N, N, Some(3), Some(4)]
        );
    }

    #[test]
    fn test_plain_additions_and_deletions() {
        assert_eq!(maps("abc", "abcxyz"), (s(&[0, 1, 2, 6]), s(&[0, 1, 2, 3])));
        assert_eq!(maps("abc", "xyzabc").0, s(&[3, 4, 5, 6]));
        let (begin, end) = maps("abcd", "abxyzcd");
        assert_eq!((begin[2], end[2]), (Some(5), Some(2)));
        assert_eq!(maps("xyzabc", "abc").0, s(&[0, 0, 0, 0, 1, 2, 3]));
        assert_eq!(maps("abcxyz", "abc").0, s(&[0, 1, 2, 3, 3, 3, 3]));
        assert_eq!(maps("abxyzcd", "abcd").0, s(&[0, 1, 2, 2, 2, 2, 3, 4]));
    }

    #[test]
    fn test_replacements() {
        let alignment = MixedAlignment::new("ijkabc", "xyabc", &greek()).unwrap();
        assert_eq!(alignment.position_map_begin(), &vec![Some(0), N, N, Some(2), Some(3), Some(4), Some(5)]);
        assert_eq!(alignment.mapped_elements(), &[("ijk".to_string(), "xy".to_string())]);
        let common: Vec<(&str, &str)> = alignment
            .common_elements()
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        assert_eq!(common, vec![("a", "a"), ("b", "b"), ("c", "c")]);

        assert_eq!(maps("abcijk", "abcxy").0, vec![Some(0), Some(1), Some(2), Some(3), N, N, Some(5)]);
        assert_eq!(maps("abijkcd", "abxycd").0, vec![Some(0), Some(1), Some(2), N, N, Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn test_common_elements_carry_long_forms() {
        let alignment = MixedAlignment::new("-β-", "-beta-", &greek()).unwrap();
        assert_eq!(alignment.common_elements()[1], ("β".to_string(), "beta".to_string()));
        assert!((alignment.similarity() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similarity() {
        let table = EquivalenceTable::empty();
        let same = MixedAlignment::new("the same", "the same", &table).unwrap();
        assert!((same.similarity() - 1.0).abs() < 1e-9);

        // two fragments split by a non-space insertion halve the score
        let split = MixedAlignment::new("abcdef", "abcXdef", &table).unwrap();
        assert!((split.similarity() - 0.5).abs() < 1e-9);

        let none = MixedAlignment::new("abc", "xyz", &table).unwrap();
        assert_eq!(none.similarity(), 0.0);
        assert!(!none.is_aligned());
        assert_eq!(none.transform_begin_position(0), None);
    }

    #[test]
    fn test_padding_exhausted() {
        let err = MixedAlignment::new("-β-", "@^|#$%&_ beta", &greek()).unwrap_err();
        assert!(matches!(err, Error::PaddingExhausted(_)));
        // no long form to pad, no sentinel needed
        assert!(MixedAlignment::new("abc", "@^|#$%&_ abc", &greek()).is_ok());
    }
}
