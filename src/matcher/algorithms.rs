use ahash::AHashMap;
use serde::{Serialize, Deserialize};

/// Character n-gram order used when a caller does not pick one.
pub const DEFAULT_NGRAM_ORDER: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    Exact,
    Cosine,
    Dice,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Exact => "exact",
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Dice => "dice",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "cosine" => Some(Self::Cosine),
            "dice" => Some(Self::Dice),
            _ => None,
        }
    }
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        Self::Cosine
    }
}

/// The SimilarityAlgorithm trait defines the interface for comparing text similarity.
/// All similarity scores are normalized between 0.0 (completely different) and 1.0 (identical).
pub trait SimilarityAlgorithm: Send + Sync {
    /// Returns the type of similarity metric this algorithm implements
    fn name(&self) -> SimilarityMetric;

    /// Compares two raw text strings and returns their similarity score
    fn compare_texts(&self, source: &str, target: &str) -> f64;
}

/// ExactMatcher scores 1.0 for identical texts and 0.0 otherwise.
pub struct ExactMatcher;

impl ExactMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityAlgorithm for ExactMatcher {
    fn name(&self) -> SimilarityMetric {
        SimilarityMetric::Exact
    }

    fn compare_texts(&self, source: &str, target: &str) -> f64 {
        if source == target { 1.0 } else { 0.0 }
    }
}

/// CosineMatcher compares the character n-gram frequency vectors of two texts.
pub struct CosineMatcher {
    order: usize,
    strip_whitespace: bool,
}

impl CosineMatcher {
    pub fn new(order: usize) -> Self {
        Self { order: order.max(1), strip_whitespace: false }
    }

    /// Drop whitespace before building n-grams, so layout changes do not count.
    pub fn ignoring_whitespace(mut self) -> Self {
        self.strip_whitespace = true;
        self
    }
}

impl SimilarityAlgorithm for CosineMatcher {
    fn name(&self) -> SimilarityMetric {
        SimilarityMetric::Cosine
    }

    fn compare_texts(&self, source: &str, target: &str) -> f64 {
        let a = prepare(source, self.strip_whitespace);
        let b = prepare(target, self.strip_whitespace);
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let counts_a = ngram_counts(&a, self.order);
        let counts_b = ngram_counts(&b, self.order);

        let dot: f64 = counts_a
            .iter()
            .filter_map(|(gram, &ca)| counts_b.get(gram).map(|&cb| (ca * cb) as f64))
            .sum();
        if dot == 0.0 {
            return 0.0;
        }
        let norm_a: f64 = counts_a.values().map(|&c| (c * c) as f64).sum::<f64>().sqrt();
        let norm_b: f64 = counts_b.values().map(|&c| (c * c) as f64).sum::<f64>().sqrt();

        (dot / (norm_a * norm_b)).min(1.0)
    }
}

/// DiceMatcher measures the shared share of two n-gram multisets.
pub struct DiceMatcher {
    order: usize,
}

impl DiceMatcher {
    pub fn new(order: usize) -> Self {
        Self { order: order.max(1) }
    }
}

impl SimilarityAlgorithm for DiceMatcher {
    fn name(&self) -> SimilarityMetric {
        SimilarityMetric::Dice
    }

    fn compare_texts(&self, source: &str, target: &str) -> f64 {
        let a: Vec<char> = source.chars().collect();
        let b: Vec<char> = target.chars().collect();
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let counts_a = ngram_counts(&a, self.order);
        let counts_b = ngram_counts(&b, self.order);
        let shared: usize = counts_a
            .iter()
            .filter_map(|(gram, &ca)| counts_b.get(gram).map(|&cb| ca.min(cb)))
            .sum();
        let total: usize = counts_a.values().sum::<usize>() + counts_b.values().sum::<usize>();

        (2 * shared) as f64 / total as f64
    }
}

fn prepare(text: &str, strip_whitespace: bool) -> Vec<char> {
    if strip_whitespace {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    } else {
        text.chars().collect()
    }
}

/// Counts of every char n-gram; a text shorter than `order` is a single gram.
pub fn ngram_counts(chars: &[char], order: usize) -> AHashMap<&[char], usize> {
    let mut counts = AHashMap::new();
    if chars.is_empty() {
        return counts;
    }
    if chars.len() < order {
        counts.insert(chars, 1);
        return counts;
    }
    for gram in chars.windows(order) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Factory for creating similarity algorithm instances
pub struct SimilarityAlgorithmFactory;

impl SimilarityAlgorithmFactory {
    pub fn create(metric: SimilarityMetric, order: usize) -> Box<dyn SimilarityAlgorithm> {
        match metric {
            SimilarityMetric::Exact => Box::new(ExactMatcher::new()),
            SimilarityMetric::Cosine => Box::new(CosineMatcher::new(order)),
            SimilarityMetric::Dice => Box::new(DiceMatcher::new(order)),
        }
    }
}
