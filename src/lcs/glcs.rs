// src/lcs/glcs.rs

use ahash::AHashMap;

use crate::normalizer::EquivalenceTable;
use crate::types::Position;
use super::sdiff::DiffOp;

/// Generalized LCS where a suffix of `str1` can also equal a suffix of
/// `str2` through a dictionary pair, e.g. `β` against `beta`.
pub struct GeneralizedLcs {
    str1: Vec<char>,
    str2: Vec<char>,
    dictionary: Vec<(Vec<char>, Vec<char>)>,
    // dictionary entries keyed by the last char of each side
    by_last: AHashMap<(char, char), Vec<usize>>,
    table: Vec<u32>,
    width: usize,
    steps: Vec<Step>,
}

// backward walk step; positions are boundaries counted from 1
#[derive(Debug, Clone, Copy)]
enum Step {
    Match { p1: usize, p2: usize, l1: usize, l2: usize },
    Add(usize),
    Del(usize),
}

impl GeneralizedLcs {
    pub fn new(str1: &str, str2: &str, dictionary: &EquivalenceTable) -> Self {
        Self::from_chars(str1.chars().collect(), str2.chars().collect(), dictionary)
    }

    pub fn from_chars(str1: Vec<char>, str2: Vec<char>, dictionary: &EquivalenceTable) -> Self {
        let dictionary = dictionary.symmetric_pairs();
        let mut by_last: AHashMap<(char, char), Vec<usize>> = AHashMap::new();
        for (idx, (a, b)) in dictionary.iter().enumerate() {
            if let (Some(&la), Some(&lb)) = (a.last(), b.last()) {
                by_last.entry((la, lb)).or_default().push(idx);
            }
        }

        let width = str2.len() + 1;
        let mut glcs = Self {
            table: vec![0; (str1.len() + 1) * width],
            str1,
            str2,
            dictionary,
            by_last,
            width,
            steps: Vec::new(),
        };
        glcs.fill_table();
        glcs.steps = glcs.walk();
        glcs
    }

    fn fill_table(&mut self) {
        for p1 in 1..=self.str1.len() {
            for p2 in 1..=self.str2.len() {
                let value = match self.suffix_match(p1, p2) {
                    Some((l1, l2)) => self.cell(p1 - l1, p2 - l2) + 1,
                    None => self.cell(p1, p2 - 1).max(self.cell(p1 - 1, p2)),
                };
                self.table[p1 * self.width + p2] = value;
            }
        }
    }

    #[inline]
    fn cell(&self, p1: usize, p2: usize) -> u32 {
        self.table[p1 * self.width + p2]
    }

    /// Lengths of the matching suffixes of `str1[..p1]` and `str2[..p2]`.
    /// Dictionary pairs are tried first, in registration order, then
    /// plain equality of the last chars.
    fn suffix_match(&self, p1: usize, p2: usize) -> Option<(usize, usize)> {
        if p1 == 0 || p2 == 0 {
            return None;
        }
        let (c1, c2) = (self.str1[p1 - 1], self.str2[p2 - 1]);
        if let Some(candidates) = self.by_last.get(&(c1, c2)) {
            for &idx in candidates {
                let (a, b) = &self.dictionary[idx];
                if self.str1[..p1].ends_with(a) && self.str2[..p2].ends_with(b) {
                    return Some((a.len(), b.len()));
                }
            }
        }
        if c1 == c2 { Some((1, 1)) } else { None }
    }

    // single reverse pass; ties prefer the insertion from str2
    fn walk(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.str1.len() + self.str2.len());
        let (mut p1, mut p2) = (self.str1.len(), self.str2.len());
        while p1 > 0 || p2 > 0 {
            if let Some((l1, l2)) = self.suffix_match(p1, p2) {
                steps.push(Step::Match { p1, p2, l1, l2 });
                p1 -= l1;
                p2 -= l2;
            } else if p2 > 0 && (p1 == 0 || self.cell(p1, p2 - 1) >= self.cell(p1 - 1, p2)) {
                steps.push(Step::Add(p2));
                p2 -= 1;
            } else {
                steps.push(Step::Del(p1));
                p1 -= 1;
            }
        }
        steps
    }

    /// Number of matched units (dictionary pairs count once).
    pub fn length(&self) -> usize {
        self.table.last().copied().unwrap_or(0) as usize
    }

    /// Deletions and insertions only, in forward order.
    pub fn diff(&self) -> Vec<DiffOp> {
        self.sdiff().into_iter().filter(|op| !op.is_match()).collect()
    }

    /// Full edit script in forward order; matches carry their lengths.
    pub fn sdiff(&self) -> Vec<DiffOp> {
        self.steps
            .iter()
            .rev()
            .map(|step| match *step {
                Step::Match { p1, p2, l1, l2 } => DiffOp::Match { old: p1 - l1, new: p2 - l2, old_len: l1, new_len: l2 },
                Step::Add(p2) => DiffOp::Insert { new: p2 - 1 },
                Step::Del(p1) => DiffOp::Delete { old: p1 - 1 },
            })
            .collect()
    }

    /// Image of every `str1` boundary in `str2`.
    ///
    /// Boundaries strictly inside a multi-char match or a mixed
    /// insert/delete run have no image.
    pub fn mapping(&self) -> Vec<Option<Position>> {
        self.compute_mapping().0
    }

    /// Unmatched `(str1, str2)` fragments that were mapped onto each other.
    pub fn mapped_elements(&self) -> Vec<(String, String)> {
        self.compute_mapping().1
    }

    fn compute_mapping(&self) -> (Vec<Option<Position>>, Vec<(String, String)>) {
        let mut map: Vec<Option<Position>> = vec![None; self.str1.len() + 1];
        let mut mapped = Vec::new();
        let mut addition: Vec<usize> = Vec::new();
        let mut deletion: Vec<usize> = Vec::new();
        let mut seen_match = false;

        for step in &self.steps {
            match *step {
                Step::Add(p2) => addition.push(p2),
                Step::Del(p1) => deletion.push(p1),
                Step::Match { p1, p2, l1, l2 } => {
                    addition.reverse();
                    deletion.reverse();

                    match (addition.is_empty(), deletion.is_empty()) {
                        (false, true) => {
                            map[p1] = Some(if seen_match {
                                let begin = map[p1].map(|p| p.begin()).unwrap_or(p2);
                                Position::Collapsed(begin, p2)
                            } else {
                                Position::Single(p2)
                            });
                        }
                        (true, false) => {
                            if !seen_match {
                                map[deletion[deletion.len() - 1]] = Some(Position::Single(p2));
                            }
                            for &p in &deletion {
                                map[p - 1] = Some(Position::Single(p2));
                            }
                        }
                        (false, false) => {
                            if !seen_match {
                                map[deletion[deletion.len() - 1]] =
                                    Some(Position::Single(addition[addition.len() - 1]));
                            }
                            map[deletion[0] - 1] = Some(Position::Single(addition[0] - 1));
                            for &p in &deletion[1..] {
                                map[p - 1] = None;
                            }
                            mapped.push(self.fragment(&deletion, &addition));
                        }
                        (true, true) => map[p1] = Some(Position::Single(p2)),
                    }
                    addition.clear();
                    deletion.clear();

                    map[p1 - l1] = Some(Position::Single(p2 - l2));
                    for i in p1 - l1 + 1..p1 {
                        map[i] = None;
                    }
                    seen_match = true;
                }
            }
        }

        // leading run before the first match
        addition.reverse();
        deletion.reverse();
        if !addition.is_empty() && !deletion.is_empty() {
            map[deletion[0] - 1] = Some(Position::Single(0));
            for &p in &deletion[1..] {
                map[p - 1] = None;
            }
            mapped.push(self.fragment(&deletion, &addition));
        } else {
            for &p in &deletion {
                map[p - 1] = Some(Position::Single(0));
            }
        }
        if !seen_match && map[self.str1.len()].is_none() {
            map[self.str1.len()] = Some(Position::Single(self.str2.len()));
        }

        mapped.reverse();
        (map, mapped)
    }

    fn fragment(&self, deletion: &[usize], addition: &[usize]) -> (String, String) {
        let d = &self.str1[deletion[0] - 1..deletion[deletion.len() - 1]];
        let a = &self.str2[addition[0] - 1..addition[addition.len() - 1]];
        (d.iter().collect(), a.iter().collect())
    }

    /// Begin-side and end-side maps; collapse points split into their two halves.
    pub fn position_maps(&self) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
        let mapping = self.mapping();
        let begin = mapping.iter().map(|p| p.map(|p| p.begin())).collect();
        let end = mapping.iter().map(|p| p.map(|p| p.end())).collect();
        (begin, end)
    }

    /// Matched `(str1, str2)` units in forward order.
    pub fn common_elements(&self) -> Vec<(String, String)> {
        self.steps
            .iter()
            .rev()
            .filter_map(|step| match *step {
                Step::Match { p1, p2, l1, l2 } => Some((
                    self.str1[p1 - l1..p1].iter().collect(),
                    self.str2[p2 - l2..p2].iter().collect(),
                )),
                _ => None,
            })
            .collect()
    }

    /// The deleted chars of `str1` and the inserted chars of `str2`.
    pub fn diff_strings(&self) -> (String, String) {
        let mut deleted = Vec::new();
        let mut added = Vec::new();
        for step in self.steps.iter().rev() {
            match *step {
                Step::Del(p1) => deleted.push(self.str1[p1 - 1]),
                Step::Add(p2) => added.push(self.str2[p2 - 1]),
                Step::Match { .. } => {}
            }
        }
        (deleted.into_iter().collect(), added.into_iter().collect())
    }

    pub fn similarity(&self) -> f64 {
        let c = self.length();
        let (deleted, added) = self.diff_strings();
        let l1 = c + deleted.chars().count();
        let l2 = c + added.chars().count();
        if l1 + l2 == 0 {
            return 1.0;
        }
        (2 * c) as f64 / (l1 + l2) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::{Collapsed, Single};

    fn mapping(str1: &str, str2: &str, dictionary: &[(&str, &str)]) -> Vec<Option<Position>> {
        let table = EquivalenceTable::from_strs(dictionary).unwrap();
        GeneralizedLcs::new(str1, str2, &table).mapping()
    }

    fn singles(values: &[Option<usize>]) -> Vec<Option<Position>> {
        values.iter().map(|v| v.map(Single)).collect()
    }

    #[test]
    fn test_deletion_at_the_beginning() {
        assert_eq!(mapping("xyzabc", "abc", &[]), singles(&[Some(0), Some(0), Some(0), Some(0), Some(1), Some(2), Some(3)]));
    }

    #[test]
    fn test_deletion_at_the_end() {
        assert_eq!(mapping("abcxyz", "abc", &[]), singles(&[Some(0), Some(1), Some(2), Some(3), Some(3), Some(3), Some(3)]));
    }

    #[test]
    fn test_deletion_in_the_middle() {
        assert_eq!(
            mapping("abxyzcd", "abcd", &[]),
            singles(&[Some(0), Some(1), Some(2), Some(2), Some(2), Some(2), Some(3), Some(4)])
        );
    }

    #[test]
    fn test_additions() {
        assert_eq!(mapping("abc", "xyzabc", &[]), singles(&[Some(3), Some(4), Some(5), Some(6)]));
        assert_eq!(mapping("abc", "abcxyz", &[]), singles(&[Some(0), Some(1), Some(2), Some(3)]));
        assert_eq!(
            mapping("abcd", "abxyzcd", &[]),
            vec![Some(Single(0)), Some(Single(1)), Some(Collapsed(5, 2)), Some(Single(6)), Some(Single(7))]
        );
    }

    #[test]
    fn test_variations() {
        assert_eq!(
            mapping("ijkabc", "xyabc", &[]),
            singles(&[Some(0), None, None, Some(2), Some(3), Some(4), Some(5)])
        );
        assert_eq!(
            mapping("abcijk", "abcxy", &[]),
            singles(&[Some(0), Some(1), Some(2), Some(3), None, None, Some(5)])
        );
        assert_eq!(
            mapping("abijkcd", "abxycd", &[]),
            singles(&[Some(0), Some(1), Some(2), None, None, Some(4), Some(5), Some(6)])
        );
    }

    #[test]
    fn test_spellout_with_partial_dictionary() {
        let dictionary = [("β", "beta")];
        assert_eq!(
            mapping("-βκ-", "-betakappa-", &dictionary),
            singles(&[Some(0), Some(1), Some(5), Some(10), Some(11)])
        );
        assert_eq!(
            mapping("-betakappa-", "-βκ-", &dictionary),
            singles(&[Some(0), Some(1), None, None, None, Some(2), None, None, None, None, Some(3), Some(4)])
        );
    }

    #[test]
    fn test_spellout_next_to_additions_and_deletions() {
        let dictionary = [("β", "beta"), ("κ", "kappa")];
        assert_eq!(
            mapping("-β-", "-beta***-", &dictionary),
            vec![Some(Single(0)), Some(Single(1)), Some(Collapsed(8, 5)), Some(Single(9))]
        );
        assert_eq!(
            mapping("-beta-", "-β***-", &dictionary),
            vec![Some(Single(0)), Some(Single(1)), None, None, None, Some(Collapsed(5, 2)), Some(Single(6))]
        );
        assert_eq!(
            mapping("-β***-", "-beta-", &dictionary),
            singles(&[Some(0), Some(1), Some(5), Some(5), Some(5), Some(5), Some(6)])
        );
        assert_eq!(
            mapping("-beta***-", "-β-", &dictionary),
            singles(&[Some(0), Some(1), None, None, None, Some(2), Some(2), Some(2), Some(2), Some(3)])
        );
        assert_eq!(
            mapping("-β-", "-***beta-", &dictionary),
            vec![Some(Single(0)), Some(Collapsed(4, 1)), Some(Single(8)), Some(Single(9))]
        );
        assert_eq!(
            mapping("-***β-", "-beta-", &dictionary),
            singles(&[Some(0), Some(1), Some(1), Some(1), Some(1), Some(5), Some(6)])
        );
    }

    #[test]
    fn test_elements_and_similarity() {
        let table = EquivalenceTable::from_strs(&[("β", "beta")]).unwrap();
        let glcs = GeneralizedLcs::new("-βκ-", "-betakappa-", &table);
        assert_eq!(glcs.length(), 3);
        assert_eq!(
            glcs.common_elements(),
            vec![
                ("-".to_string(), "-".to_string()),
                ("β".to_string(), "beta".to_string()),
                ("-".to_string(), "-".to_string()),
            ]
        );
        assert_eq!(glcs.mapped_elements(), vec![("κ".to_string(), "kappa".to_string())]);
        assert_eq!(glcs.diff_strings(), ("κ".to_string(), "kappa".to_string()));
        // 2 * 3 / (4 + 8)
        assert!((glcs.similarity() - 0.5).abs() < 1e-9);

        let same = GeneralizedLcs::new("abc", "abc", &EquivalenceTable::empty());
        assert!((same.similarity() - 1.0).abs() < 1e-9);
        assert!(same.diff().is_empty());
    }

    #[test]
    fn test_sdiff_carries_match_lengths() {
        let table = EquivalenceTable::from_strs(&[("β", "beta")]).unwrap();
        let ops = GeneralizedLcs::new("-β-", "-beta-", &table).sdiff();
        assert_eq!(
            ops,
            vec![
                DiffOp::Match { old: 0, new: 0, old_len: 1, new_len: 1 },
                DiffOp::Match { old: 1, new: 1, old_len: 1, new_len: 4 },
                DiffOp::Match { old: 2, new: 5, old_len: 1, new_len: 1 },
            ]
        );
    }

    #[test]
    fn test_unrelated_strings() {
        let map = mapping("ijk", "xy", &[]);
        assert_eq!(map, vec![Some(Single(0)), None, None, Some(Single(2))]);
    }
}
