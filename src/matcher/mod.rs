pub mod algorithms;
pub mod anchor_finder;
pub mod approximate_fit;

// Re-export the main types
pub use self::algorithms::{
    CosineMatcher,
    DiceMatcher,
    ExactMatcher,
    SimilarityAlgorithm,
    SimilarityAlgorithmFactory,
    SimilarityMetric,
};
pub use self::anchor_finder::{Anchor, AnchorFinder};
pub use self::approximate_fit::approximate_fit;
