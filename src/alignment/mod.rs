pub mod block;
pub mod cultivation_map;
pub mod divisions;
pub mod mixed;
pub mod reference;
pub mod term;
pub mod text_alignment;

pub use self::block::{Block, BlockKind};
pub use self::cultivation_map::{CultivationMap, RegionState};
pub use self::divisions::{find_divisions, Division, DivisionIndex, DivisionMatch};
pub use self::mixed::{MixedAlignment, PADDING_LETTERS};
pub use self::reference::{ReferenceAligner, SharedReferenceAligner};
pub use self::term::term_alignment;
pub use self::text_alignment::{DenotationTransfer, LossReason, LostDenotation, TextAlignment};
