// src/matcher/approximate_fit.rs

use ahash::{AHashMap, AHashSet};
use log::trace;

use crate::config::FitConfig;
use super::algorithms::{CosineMatcher, SimilarityAlgorithm};

/// Estimate the region of `long` that contains `short`.
///
/// Returns the whole of `long` when it is too short to bother, and `None`
/// when no region can be vouched for. Callers then compare against the
/// full range.
pub fn approximate_fit(short: &[char], long: &[char], config: &FitConfig) -> Option<(usize, usize)> {
    if long.len() < config.min_length {
        return Some((0, long.len()));
    }

    let n = config.signature_ngram;
    if short.len() < n || long.len() < n {
        return None;
    }

    // occurrence count and first position of every n-gram of the long text
    let mut long_grams: AHashMap<&[char], (usize, usize)> = AHashMap::new();
    for (i, gram) in long.windows(n).enumerate() {
        long_grams.entry(gram).or_insert((0, i)).0 += 1;
    }

    // shared n-grams that occur once in the long text, in discovery order
    let mut seen: AHashSet<&[char]> = AHashSet::new();
    let signatures: Vec<(usize, usize)> = short
        .windows(n)
        .enumerate()
        .filter(|(_, gram)| seen.insert(*gram))
        .filter_map(|(loc1, gram)| match long_grams.get(gram) {
            Some(&(1, loc2)) => Some((loc1, loc2)),
            _ => None,
        })
        .collect();

    if signatures.is_empty() {
        trace!("approximate fit: no signature n-gram");
        return None;
    }

    let cosine = CosineMatcher::new(2).ignoring_whitespace();
    let short_text: String = short.iter().collect();
    let mut cache: AHashMap<(usize, usize), f64> = AHashMap::new();

    for (loc1, loc2) in signatures {
        let front = loc1 + (loc1 as f64 * config.buffer_rate) as usize;
        let fit_begin = loc2.saturating_sub(front);

        let offset_end = short.len() - loc1;
        let fit_end = (loc2 + offset_end + (offset_end as f64 * config.buffer_rate) as usize).min(long.len());

        if fit_begin >= fit_end || cache.contains_key(&(fit_begin, fit_end)) {
            continue;
        }

        let candidate: String = long[fit_begin..fit_end].iter().collect();
        let similarity = cosine.compare_texts(&short_text, &candidate);
        cache.insert((fit_begin, fit_end), similarity);
        trace!("approximate fit candidate [{}, {}) scored {:.3}", fit_begin, fit_end, similarity);

        if similarity > config.similarity_threshold {
            return Some((fit_begin, fit_end));
        }
    }

    None
}
