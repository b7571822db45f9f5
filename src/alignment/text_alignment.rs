// src/alignment/text_alignment.rs

use log::{debug, trace};
use serde::{Serialize, Deserialize};

use crate::config::AlignmentConfig;
use crate::error::{Error, Result};
use crate::matcher::{approximate_fit, Anchor, AnchorFinder};
use crate::normalizer::{CharMapping, EquivalenceTable};
use crate::types::{Denotation, Span};
use crate::utils::text::{fold_case_all, TextIndex};
use super::block::Block;
use super::cultivation_map::{CultivationMap, RegionState};
use super::mixed::MixedAlignment;
use super::term::term_alignment;

/// Why a denotation could not be carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    UnresolvedBegin,
    UnresolvedEnd,
    /// Both ends resolved but the span came out inverted or empty.
    Collapsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostDenotation {
    pub denotation: Denotation,
    pub reason: LossReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenotationTransfer {
    pub transferred: Vec<Denotation>,
    pub lost: Vec<LostDenotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GapSide {
    Front,
    Middle,
    Rear,
    Whole,
}

/// Alignment of a source text onto a target text.
///
/// Both texts are normalized first; blocks are computed on the normalized
/// texts and every position query goes through the two offset maps.
pub struct TextAlignment {
    source: CharMapping,
    target: CharMapping,
    // normalized coordinates, partitioning the normalized source
    blocks: Vec<Block>,
}

// read-only inputs shared by the gap filling steps
struct Context<'a> {
    s1: &'a TextIndex,
    s2: &'a TextIndex,
    config: &'a AlignmentConfig,
    table: &'a EquivalenceTable,
    lexemes: &'a [Span],
    cultivation: Option<&'a CultivationMap>,
}

impl TextAlignment {
    /// Align with the default configuration and the built-in equivalence table.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Self::with_config(source, target, &AlignmentConfig::default(), EquivalenceTable::default_table())
    }

    pub fn with_config(
        source: &str,
        target: &str,
        config: &AlignmentConfig,
        table: &EquivalenceTable,
    ) -> Result<Self> {
        Self::with_denotations(source, target, &[], config, table)
    }

    /// Like [`TextAlignment::with_config`], using the texts of `denotations`
    /// as lexemes for gaps that anchors leave open.
    pub fn with_denotations(
        source: &str,
        target: &str,
        denotations: &[Denotation],
        config: &AlignmentConfig,
        table: &EquivalenceTable,
    ) -> Result<Self> {
        let source = normalized(source, config, table);
        let target = normalized(target, config, table);
        Self::align_mapped(source, target, denotations, config, table, None)
    }

    pub(crate) fn align_mapped(
        source: CharMapping,
        target: CharMapping,
        denotations: &[Denotation],
        config: &AlignmentConfig,
        table: &EquivalenceTable,
        cultivation: Option<&CultivationMap>,
    ) -> Result<Self> {
        let lexemes: Vec<Span> = source
            .enmap_denotations(denotations)?
            .into_iter()
            .map(|d| d.span)
            .collect();

        let s1 = TextIndex::new(source.text());
        let s2 = TextIndex::new(target.text());
        let ctx = Context { s1: &s1, s2: &s2, config, table, lexemes: &lexemes, cultivation };

        let blocks = match fast_path(&ctx) {
            Some(blocks) => blocks,
            None => anchored_blocks(&ctx)?,
        };

        debug!(
            "aligned {} chars onto {} chars in {} blocks ({} empty)",
            s1.len(),
            s2.len(),
            blocks.len(),
            blocks.iter().filter(|b| b.is_empty_kind()).count()
        );

        Ok(Self { source, target, blocks })
    }

    /// Blocks in original source and target coordinates.
    pub fn blocks(&self) -> Vec<Block> {
        let last = self.blocks.len().saturating_sub(1);
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let mut public = block.clone();
                public.source = Span::new(
                    if i == 0 { 0 } else { demap(&self.source, block.source.begin) },
                    if i == last { self.source.original_len() } else { demap(&self.source, block.source.end) },
                );
                public.target = Span::new(demap(&self.target, block.target.begin), demap(&self.target, block.target.end));
                public
            })
            .collect()
    }

    /// Blocks in normalized coordinates.
    pub fn normalized_blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn source_mapping(&self) -> &CharMapping {
        &self.source
    }

    pub fn target_mapping(&self) -> &CharMapping {
        &self.target
    }

    /// Mean block similarity weighted by source length.
    pub fn similarity(&self) -> f64 {
        let total: usize = self.blocks.iter().map(|b| b.source.len()).sum();
        if total == 0 {
            return if self.blocks.iter().any(|b| !b.is_empty_kind()) { 1.0 } else { 0.0 };
        }
        self.blocks
            .iter()
            .map(|b| b.similarity() * b.source.len() as f64)
            .sum::<f64>()
            / total as f64
    }

    pub fn transform_begin_position(&self, position: usize) -> Option<usize> {
        let q = self.source.enmap_position(position)?;
        let block = self.block_for_begin(q)?;
        let r = block.transform_begin_position(q)?;
        self.target.demap_position(r)
    }

    pub fn transform_end_position(&self, position: usize) -> Option<usize> {
        let q = self.source.enmap_position(position)?;
        let block = self.block_for_end(q)?;
        let r = block.transform_end_position(q)?;
        self.target.demap_position(r)
    }

    pub fn transform_span(&self, span: Span) -> Option<Span> {
        let begin = self.transform_begin_position(span.begin)?;
        let end = self.transform_end_position(span.end)?;
        if begin > end { None } else { Some(Span::new(begin, end)) }
    }

    /// Relocate denotations onto the target. Failures are collected, not raised;
    /// only a span that does not fit the source text is an error.
    pub fn transform_denotations(&self, denotations: &[Denotation]) -> Result<DenotationTransfer> {
        let len = self.source.original_len();
        let mut transfer = DenotationTransfer::default();

        for denotation in denotations {
            let span = denotation.span;
            if span.begin > span.end || span.end > len {
                return Err(Error::invalid_input(format!(
                    "Denotation span {} does not fit a source text of length {}",
                    span, len
                )));
            }

            let begin = self.transform_begin_position(span.begin);
            let end = self.transform_end_position(span.end);
            let outcome = match (begin, end) {
                (None, _) => Err(LossReason::UnresolvedBegin),
                (_, None) => Err(LossReason::UnresolvedEnd),
                (Some(b), Some(e)) if b > e || (b == e && !span.is_empty()) => Err(LossReason::Collapsed),
                (Some(b), Some(e)) => Ok(Span::new(b, e)),
            };

            match outcome {
                Ok(target_span) => transfer.transferred.push(denotation.with_span(target_span)),
                Err(reason) => {
                    trace!("lost denotation {:?} at {}: {:?}", denotation.id, span, reason);
                    transfer.lost.push(LostDenotation { denotation: denotation.clone(), reason });
                }
            }
        }

        debug!("transferred {} denotations, lost {}", transfer.transferred.len(), transfer.lost.len());
        Ok(transfer)
    }

    // the block whose source contains q; the end of the text belongs to the last block
    fn block_for_begin(&self, q: usize) -> Option<&Block> {
        let idx = self.blocks.partition_point(|b| b.source.end <= q);
        self.blocks.get(idx).or_else(|| self.blocks.last().filter(|b| b.source.end == q))
    }

    // the block with begin < q <= end; the start of the text belongs to the first block
    fn block_for_end(&self, q: usize) -> Option<&Block> {
        let idx = self.blocks.partition_point(|b| b.source.end < q);
        self.blocks.get(idx)
    }
}

pub(crate) fn normalized(text: &str, config: &AlignmentConfig, table: &EquivalenceTable) -> CharMapping {
    if config.normalizer.enabled {
        CharMapping::new(text, table, config.normalizer.whitespace)
    } else {
        CharMapping::identity(text)
    }
}

fn demap(mapping: &CharMapping, position: usize) -> usize {
    mapping
        .demap_position(position)
        .unwrap_or_else(|| position.min(mapping.original_len()))
}

// whole of one text found verbatim (or up to case) inside the other
fn fast_path(ctx: &Context<'_>) -> Option<Vec<Block>> {
    let (len1, len2) = (ctx.s1.len(), ctx.s2.len());

    if len1 <= len2 {
        let found = find_in_target(ctx, ctx.s1.as_str(), ctx.s2).or_else(|| {
            if !ctx.config.alignment.case_insensitive_fast_path {
                return None;
            }
            let folded1: String = fold_case_all(ctx.s1.chars()).into_iter().collect();
            let folded2 = TextIndex::from_chars(fold_case_all(ctx.s2.chars()));
            find_in_target(ctx, &folded1, &folded2)
        })?;
        debug!("fast path: source found in target at {}", found);
        return Some(vec![Block::verbatim(Span::new(0, len1), Span::new(found, found + len1))]);
    }

    if let Some(map) = ctx.cultivation {
        if !map.is_open(Span::new(0, len2)) {
            return None;
        }
    }
    let found = ctx.s1.find(ctx.s2.as_str(), 0).or_else(|| {
        if !ctx.config.alignment.case_insensitive_fast_path {
            return None;
        }
        let folded1 = TextIndex::from_chars(fold_case_all(ctx.s1.chars()));
        let folded2: String = fold_case_all(ctx.s2.chars()).into_iter().collect();
        folded1.find(&folded2, 0)
    })?;
    debug!("fast path: target found in source at {}", found);

    let mut blocks = Vec::with_capacity(3);
    if found > 0 {
        blocks.push(Block::empty(Span::new(0, found), Span::new(0, 0)));
    }
    blocks.push(Block::verbatim(Span::new(found, found + len2), Span::new(0, len2)));
    if found + len2 < len1 {
        blocks.push(Block::empty(Span::new(found + len2, len1), Span::new(len2, len2)));
    }
    Some(blocks)
}

fn find_in_target(ctx: &Context<'_>, pattern: &str, haystack: &TextIndex) -> Option<usize> {
    match ctx.cultivation {
        Some(map) => map.index(pattern, haystack, 0),
        None => haystack.find(pattern, 0),
    }
}

fn anchored_blocks(ctx: &Context<'_>) -> Result<Vec<Block>> {
    let (len1, len2) = (ctx.s1.len(), ctx.s2.len());
    let anchors = merge_anchors(
        AnchorFinder::from_chars(ctx.s1.chars(), ctx.s2.chars(), &ctx.config.anchor, ctx.cultivation).collect(),
    );
    debug!("{} anchors between {} and {} chars", anchors.len(), len1, len2);

    let (first, last) = match (anchors.first(), anchors.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return fill_gap(ctx, GapSide::Whole, Span::new(0, len1), Span::new(0, len2)),
    };

    let buffer = |gap: usize| {
        let alignment = &ctx.config.alignment;
        gap + (gap as f64 * alignment.buffer_rate) as usize + alignment.buffer_min
    };

    let mut blocks = Vec::with_capacity(anchors.len() * 2 + 1);

    if first.source.begin > 0 {
        let gap = first.source.begin;
        let window = Span::new(first.target.begin.saturating_sub(buffer(gap)), first.target.begin);
        blocks.extend(fill_gap(ctx, GapSide::Front, Span::new(0, gap), window)?);
    }

    for (i, anchor) in anchors.iter().enumerate() {
        blocks.push(Block::verbatim(anchor.source, anchor.target));
        if let Some(next) = anchors.get(i + 1) {
            let gap = Span::new(anchor.source.end, next.source.begin);
            if gap.is_empty() {
                continue;
            }
            let window = Span::new(anchor.target.end, next.target.begin);
            blocks.extend(fill_gap(ctx, GapSide::Middle, gap, window)?);
        }
    }

    if last.source.end < len1 {
        let gap = len1 - last.source.end;
        let window = Span::new(last.target.end, (last.target.end + buffer(gap)).min(len2));
        blocks.extend(fill_gap(ctx, GapSide::Rear, Span::new(last.source.end, len1), window)?);
    }

    Ok(blocks)
}

fn merge_anchors(anchors: Vec<Anchor>) -> Vec<Anchor> {
    let mut merged: Vec<Anchor> = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        match merged.last_mut() {
            Some(prev) if prev.source.end == anchor.source.begin && prev.target.end == anchor.target.begin => {
                prev.source.end = anchor.source.end;
                prev.target.end = anchor.target.end;
            }
            _ => merged.push(anchor),
        }
    }
    merged
}

// Empty block for a gap; only the edge shared with a neighbouring anchor is known
fn empty_gap(side: GapSide, gap: Span, window: Span) -> Block {
    let target = match side {
        GapSide::Front => Span::new(window.end, window.end),
        GapSide::Rear => Span::new(window.begin, window.begin),
        GapSide::Middle | GapSide::Whole => window,
    };
    Block::empty(gap, target)
}

fn open_window(ctx: &Context<'_>, side: GapSide, window: Span) -> Option<Span> {
    let map = match ctx.cultivation {
        Some(map) => map,
        None => return Some(window),
    };
    let state = map.region_state(window);
    trace!("gap window {} is {:?}", window, state);
    match state {
        RegionState::Open(span) | RegionState::FrontOpen(span) | RegionState::RearOpen(span) => Some(span),
        RegionState::Closed => None,
        RegionState::MiddleClosed { front, rear } => Some(match side {
            GapSide::Front => rear,
            GapSide::Rear => front,
            GapSide::Middle | GapSide::Whole => if rear.len() > front.len() { rear } else { front },
        }),
    }
}

fn fill_gap(ctx: &Context<'_>, side: GapSide, gap: Span, window: Span) -> Result<Vec<Block>> {
    // empty blocks always take their edges from the open window
    let open = match open_window(ctx, side, window) {
        Some(open) if !open.is_empty() => open,
        _ => {
            debug!("gap {} has no open target window", gap);
            return Ok(vec![empty_gap(side, gap, window)]);
        }
    };

    let source = ctx.s1.slice(gap.begin, gap.end);
    let source_chars = &ctx.s1.chars()[gap.begin..gap.end];

    // narrow a window much longer than the gap
    let mut fitted = open;
    let slack = 1.0 - ctx.config.fit.similarity_threshold;
    if open.len() as f64 - gap.len() as f64 > gap.len() as f64 * slack {
        let window_chars = &ctx.s2.chars()[open.begin..open.end];
        if let Some((b, e)) = approximate_fit(source_chars, window_chars, &ctx.config.fit) {
            trace!("gap {} narrowed to [{}, {}) of window {}", gap, b, e, open);
            fitted = Span::new(open.begin + b, open.begin + e);
        }
    }
    let target = ctx.s2.slice(fitted.begin, fitted.end);

    let lexemes: Vec<Span> = ctx
        .lexemes
        .iter()
        .filter(|span| gap.covers(span))
        .map(|span| Span::new(span.begin - gap.begin, span.end - gap.begin))
        .collect();
    if !lexemes.is_empty() {
        let (gap_index, window_index) = (TextIndex::new(source), TextIndex::new(target));
        if let Some(local) = term_alignment(&gap_index, &window_index, &lexemes) {
            debug!("gap {} aligned through {} lexemes", gap, lexemes.len());
            let last = local.len().saturating_sub(1);
            return Ok(local
                .into_iter()
                .enumerate()
                .map(|(i, block)| {
                    let block = block.offset(gap.begin, fitted.begin);
                    if !block.is_empty_kind() {
                        return block;
                    }
                    let mut target = block.target;
                    if i == 0 {
                        target.begin = open.begin;
                    }
                    if i == last {
                        target.end = open.end;
                    }
                    match side {
                        GapSide::Front if i == 0 => target.begin = target.end,
                        GapSide::Rear if i == last => target.end = target.begin,
                        _ => {}
                    }
                    Block::empty(block.source, target)
                })
                .collect());
        }
    }

    let cap = ctx.config.alignment.max_local_length;
    if gap.len() < cap && fitted.len() < cap * 2 {
        let alignment = MixedAlignment::new(source, target, ctx.table)?;
        let similarity = alignment.similarity();
        if similarity >= ctx.config.alignment.local_similarity_cutoff {
            debug!("gap {} aligned locally against {} (similarity {:.3})", gap, fitted, similarity);
            return Ok(vec![Block::local(gap, fitted, alignment)]);
        }
        debug!("gap {} local similarity {:.3} below cutoff", gap, similarity);
    } else {
        debug!("gap {} too long for local alignment", gap);
    }

    Ok(vec![empty_gap(side, gap, open)])
}
