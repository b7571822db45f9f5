//! text-alignment relocates character-offset annotations between two
//! versions of the same text.
//!
//! Given a source text, a target text and annotation spans over the source,
//! it computes a block alignment between the two texts and projects each
//! span onto the target. Spans that cannot be carried over reliably are
//! reported as lost rather than guessed.

// Module declarations
pub mod error;
pub mod types;
pub mod utils;
pub mod normalizer;
pub mod lcs;
pub mod matcher;
pub mod alignment;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::{Denotation, Position, PositionMap, Span};
pub use normalizer::{CharMapping, EquivalenceTable, WhitespacePolicy};
pub use lcs::{GeneralizedLcs, MinLcsDiff, min_lcs_sdiff};
pub use alignment::{
    find_divisions,
    Block,
    BlockKind,
    CultivationMap,
    DenotationTransfer,
    Division,
    DivisionIndex,
    DivisionMatch,
    LossReason,
    LostDenotation,
    MixedAlignment,
    ReferenceAligner,
    SharedReferenceAligner,
    TextAlignment,
};

// Re-export the config from config module
pub use config::AlignmentConfig;
