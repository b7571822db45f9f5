// src/matcher/anchor_finder.rs

use log::{debug, trace};
use serde::{Serialize, Deserialize};

use crate::alignment::CultivationMap;
use crate::config::AnchorConfig;
use crate::types::Span;
use crate::utils::text::{fold_case_all, TextIndex};
use super::algorithms::{SimilarityAlgorithm, SimilarityAlgorithmFactory, DEFAULT_NGRAM_ORDER};

/// An exact match shared by the source and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub source: Span,
    pub target: Span,
}

/// Stateful scanner producing anchors left to right.
///
/// The shorter text is scanned n-gram by n-gram and each n-gram is looked
/// up in the longer one. Comparison is case-insensitive. When a
/// cultivation map is given, target text it claims is never matched.
pub struct AnchorFinder<'a> {
    s1: Vec<char>,
    s2: TextIndex,
    // s1 is the target when the target is the shorter text
    reverse: bool,
    config: AnchorConfig,
    similarity: Box<dyn SimilarityAlgorithm>,
    cultivation: Option<&'a CultivationMap>,
    beg_s1: usize,
    end_prev: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    beg_s2: usize,
    score: Option<f64>,
}

impl<'a> AnchorFinder<'a> {
    pub fn new(source: &str, target: &str, config: &AnchorConfig) -> Self {
        Self::from_chars(
            &source.chars().collect::<Vec<_>>(),
            &target.chars().collect::<Vec<_>>(),
            config,
            None,
        )
    }

    pub fn with_cultivation(source: &str, target: &str, config: &AnchorConfig, cultivation: &'a CultivationMap) -> Self {
        Self::from_chars(
            &source.chars().collect::<Vec<_>>(),
            &target.chars().collect::<Vec<_>>(),
            config,
            Some(cultivation),
        )
    }

    pub fn from_chars(
        source: &[char],
        target: &[char],
        config: &AnchorConfig,
        cultivation: Option<&'a CultivationMap>,
    ) -> Self {
        let reverse = target.len() < source.len();
        let (s1, s2) = if reverse { (target, source) } else { (source, target) };

        Self {
            s1: fold_case_all(s1),
            s2: TextIndex::from_chars(fold_case_all(s2)),
            reverse,
            config: config.clone(),
            similarity: SimilarityAlgorithmFactory::create(config.similarity_metric, DEFAULT_NGRAM_ORDER),
            cultivation,
            beg_s1: 0,
            end_prev: None,
        }
    }

    pub fn next_anchor(&mut self) -> Option<Anchor> {
        let n = self.config.ngram_size;
        let len1 = self.s1.len();

        while self.beg_s1 + n <= len1 {
            let beg1 = self.beg_s1;
            if self.s1[beg1].is_whitespace() {
                self.beg_s1 += 1;
                continue;
            }

            if self.reverse && !self.target_open(Span::new(beg1, beg1 + n)) {
                self.beg_s1 = self.resume_after_claimed(beg1);
                continue;
            }

            let candidates = match self.candidates(beg1) {
                Some(candidates) if !candidates.is_empty() => candidates,
                _ => {
                    self.beg_s1 += 1;
                    continue;
                }
            };

            match self.validate(beg1, &candidates) {
                Some(beg2) => return Some(self.extend(beg1, beg2)),
                None => self.beg_s1 += 1,
            }
        }

        None
    }

    // occurrences of the n-gram at beg1; None when there are too many to be informative
    fn candidates(&self, beg1: usize) -> Option<Vec<usize>> {
        let n = self.config.ngram_size;
        let pattern: String = self.s1[beg1..beg1 + n].iter().collect();
        let mut from = self.end_prev.map(|(_, e2)| e2).unwrap_or(0);
        let mut found = Vec::new();

        while found.len() <= self.config.max_candidates {
            let hit = match (self.reverse, self.cultivation) {
                (false, Some(map)) => map.index(&pattern, &self.s2, from),
                _ => self.s2.find(&pattern, from),
            };
            match hit {
                Some(beg2) => {
                    found.push(beg2);
                    from = beg2 + 1;
                }
                None => break,
            }
        }

        if found.len() > self.config.max_candidates {
            trace!("n-gram {:?} at {} too frequent, skipped", pattern, beg1);
            None
        } else {
            Some(found)
        }
    }

    fn validate(&self, beg1: usize, occurrences: &[usize]) -> Option<usize> {
        if let Some((e1, e2)) = self.end_prev {
            let proximity = self.config.proximity;
            if let Some(&beg2) = occurrences
                .iter()
                .find(|&&beg2| beg1 - e1 < proximity && beg2 - e2 < proximity)
            {
                return Some(beg2);
            }
        }

        let mut window = self.config.window_size;
        let mut candidates: Vec<Candidate> = occurrences
            .iter()
            .map(|&beg2| Candidate { beg_s2: beg2, score: self.context_score(beg1, beg2, window) })
            .collect();

        if candidates.len() == 1 && candidates[0].score.is_none() {
            return Some(candidates[0].beg_s2);
        }

        let threshold = self.config.similarity_threshold;
        candidates.retain(|c| c.score.map_or(false, |s| s > threshold));

        let mut escalations = 0;
        while candidates.len() > 1 && escalations < self.config.max_window_escalations {
            window *= 2;
            escalations += 1;
            for candidate in candidates.iter_mut() {
                candidate.score = self.context_score(beg1, candidate.beg_s2, window);
            }
            candidates.retain(|c| c.score.map_or(false, |s| s > threshold));
            trace!("ambiguous anchor at {}: {} candidates, window widened to {}", beg1, candidates.len(), window);
        }

        // best score wins, the earliest occurrence on ties
        let mut best: Option<Candidate> = None;
        for candidate in candidates {
            let score = candidate.score.unwrap_or(0.0);
            if best.map_or(true, |b| score > b.score.unwrap_or(0.0)) {
                best = Some(candidate);
            }
        }
        best.map(|c| c.beg_s2)
    }

    // higher of the left and right context similarities; None when neither side has a usable window
    fn context_score(&self, beg1: usize, beg2: usize, window: usize) -> Option<f64> {
        let n = self.config.ngram_size;
        let s2 = self.s2.chars();

        let left1 = context_window(self.s1[..beg1].iter().rev(), window);
        let left2 = context_window(s2[..beg2].iter().rev(), window);
        let right1 = context_window(self.s1[beg1 + n..].iter(), window);
        let right2 = context_window(s2[beg2 + n..].iter(), window);

        let mut score: Option<f64> = None;
        for (w1, w2) in [(left1, left2), (right1, right2)] {
            if w1.chars().count() < 2 || w2.chars().count() < 2 {
                continue;
            }
            let s = self.similarity.compare_texts(&w1, &w2);
            score = Some(score.map_or(s, |prev: f64| prev.max(s)));
        }

        trace!("context score at ({}, {}) with window {}: {:?}", beg1, beg2, window, score);
        score
    }

    fn extend(&mut self, beg1: usize, beg2: usize) -> Anchor {
        let n = self.config.ngram_size;
        let s2 = self.s2.chars();
        let (prev1, prev2) = self.end_prev.unwrap_or((0, 0));

        // claimed target text bounds the extension on the target side
        let (floor1, floor2) = match self.cultivation {
            Some(map) if self.reverse => (prev1.max(map.last_cultivated_position(beg1).unwrap_or(0)), prev2),
            Some(map) => (prev1, prev2.max(map.last_cultivated_position(beg2).unwrap_or(0))),
            None => (prev1, prev2),
        };
        let (ceil1, ceil2) = match self.cultivation {
            Some(map) if self.reverse => (
                map.next_cultivated_position(beg1).unwrap_or(self.s1.len()).min(self.s1.len()),
                s2.len(),
            ),
            Some(map) => (
                self.s1.len(),
                map.next_cultivated_position(beg2).unwrap_or(s2.len()).min(s2.len()),
            ),
            None => (self.s1.len(), s2.len()),
        };

        let (mut b1, mut b2) = (beg1, beg2);
        while b1 > floor1 && b2 > floor2 && self.s1[b1 - 1] == s2[b2 - 1] {
            b1 -= 1;
            b2 -= 1;
        }

        let (mut e1, mut e2) = (beg1 + n, beg2 + n);
        while e1 < ceil1 && e2 < ceil2 && self.s1[e1] == s2[e2] {
            e1 += 1;
            e2 += 1;
        }

        self.end_prev = Some((e1, e2));
        self.beg_s1 = e1;

        let anchor = if self.reverse {
            Anchor { source: Span::new(b2, e2), target: Span::new(b1, e1) }
        } else {
            Anchor { source: Span::new(b1, e1), target: Span::new(b2, e2) }
        };
        debug!("anchor {} -> {}", anchor.source, anchor.target);
        anchor
    }

    fn target_open(&self, span: Span) -> bool {
        self.cultivation.map_or(true, |map| map.is_open(span))
    }

    fn resume_after_claimed(&self, beg1: usize) -> usize {
        self.cultivation
            .and_then(|map| map.search_again_position(beg1, None))
            .map_or(beg1 + 1, |resume| resume.max(beg1 + 1))
    }
}

impl<'a> Iterator for AnchorFinder<'a> {
    type Item = Anchor;

    fn next(&mut self) -> Option<Anchor> {
        self.next_anchor()
    }
}

fn context_window<'c, I: Iterator<Item = &'c char>>(chars: I, size: usize) -> String {
    chars.filter(|c| c.is_alphanumeric()).take(size).collect()
}
