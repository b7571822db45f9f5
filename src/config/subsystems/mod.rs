pub mod normalizer;
pub mod anchor;
pub mod fit;
pub mod alignment;
pub mod divisions;

pub use normalizer::NormalizerConfig;
pub use anchor::AnchorConfig;
pub use fit::FitConfig;
pub use alignment::GapConfig;
pub use divisions::DivisionConfig;
