// src/alignment/block.rs

use serde::{Serialize, Deserialize};

use crate::types::Span;
use super::mixed::MixedAlignment;

/// How a block relates its source span to its target span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockKind {
    /// Identical text, possibly up to case.
    Block,
    /// A lexeme matched exactly once on both sides.
    Term,
    /// No trustworthy alignment; only the block edges resolve.
    Empty,
    /// Character-level sub-alignment against the target window.
    Local(Box<MixedAlignment>),
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Block => "block",
            BlockKind::Term => "term",
            BlockKind::Empty => "empty",
            BlockKind::Local(_) => "local",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub source: Span,
    /// For a `Local` block, the whole target window it was aligned against.
    pub target: Span,
    pub kind: BlockKind,
}

impl Block {
    pub fn verbatim(source: Span, target: Span) -> Self {
        Self { source, target, kind: BlockKind::Block }
    }

    pub fn term(source: Span, target: Span) -> Self {
        Self { source, target, kind: BlockKind::Term }
    }

    pub fn empty(source: Span, target: Span) -> Self {
        Self { source, target, kind: BlockKind::Empty }
    }

    pub fn local(source: Span, window: Span, alignment: MixedAlignment) -> Self {
        Self { source, target: window, kind: BlockKind::Local(Box::new(alignment)) }
    }

    pub fn is_empty_kind(&self) -> bool {
        matches!(self.kind, BlockKind::Empty)
    }

    /// Target text this block actually accounts for.
    pub fn claimed_target(&self) -> Option<Span> {
        match &self.kind {
            BlockKind::Empty => None,
            BlockKind::Block | BlockKind::Term => Some(self.target),
            BlockKind::Local(alignment) => {
                let (first, last) = alignment.str2_match_range()?;
                Some(Span::new(self.target.begin + first, self.target.begin + last + 1))
            }
        }
    }

    pub fn similarity(&self) -> f64 {
        match &self.kind {
            BlockKind::Local(alignment) => alignment.similarity(),
            BlockKind::Empty => 0.0,
            BlockKind::Block | BlockKind::Term => 1.0,
        }
    }

    pub fn transform_begin_position(&self, position: usize) -> Option<usize> {
        self.transform(position, true)
    }

    pub fn transform_end_position(&self, position: usize) -> Option<usize> {
        self.transform(position, false)
    }

    fn transform(&self, position: usize, begin_side: bool) -> Option<usize> {
        if position < self.source.begin || position > self.source.end {
            return None;
        }
        let local = position - self.source.begin;
        match &self.kind {
            BlockKind::Block | BlockKind::Term => Some(self.target.begin + local),
            BlockKind::Empty => {
                if position == self.source.begin {
                    Some(self.target.begin)
                } else if position == self.source.end {
                    Some(self.target.end)
                } else {
                    None
                }
            }
            BlockKind::Local(alignment) => {
                let mapped = if begin_side {
                    alignment.transform_begin_position(local)
                } else {
                    alignment.transform_end_position(local)
                };
                mapped.map(|p| p + self.target.begin)
            }
        }
    }

    pub(crate) fn offset(mut self, source_delta: usize, target_delta: usize) -> Self {
        self.source = self.source.shift(source_delta);
        self.target = self.target.shift(target_delta);
        self
    }
}
