pub mod sdiff;
pub mod min_lcs;
pub mod glcs;

pub use self::sdiff::{diff, lcs_length, lcs_pairs, sdiff, DiffOp, LcsTable};
pub use self::min_lcs::{min_lcs_sdiff, MinLcsDiff};
pub use self::glcs::GeneralizedLcs;
