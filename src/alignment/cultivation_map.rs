// src/alignment/cultivation_map.rs

use log::trace;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::types::Span;
use crate::utils::text::TextIndex;

/// How much of a query span is still unclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionState {
    /// Nothing in the span is claimed.
    Open(Span),
    /// No free part at either end.
    Closed,
    /// Only the front of the span is free.
    FrontOpen(Span),
    /// Only the rear of the span is free.
    RearOpen(Span),
    /// Claimed text sits in the interior, leaving both ends free.
    MiddleClosed { front: Span, rear: Span },
}

impl RegionState {
    pub fn is_open(&self) -> bool {
        matches!(self, RegionState::Open(_))
    }
}

/// Target regions already attributed to earlier alignments.
///
/// Regions are kept sorted and disjoint; touching regions are merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CultivationMap {
    regions: Vec<Span>,
}

impl CultivationMap {
    pub fn new() -> Self {
        Self { regions: Vec::new() }
    }

    pub fn regions(&self) -> &[Span] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Claim `incoming`. Fails, leaving the map untouched, if any of the
    /// new regions overlaps an existing one or another new one.
    pub fn cultivate(&mut self, incoming: &[Span]) -> Result<()> {
        let mut all: Vec<Span> = self.regions.iter().copied()
            .chain(incoming.iter().copied().filter(|r| !r.is_empty()))
            .collect();
        all.sort();

        let mut merged: Vec<Span> = Vec::with_capacity(all.len());
        for region in all {
            match merged.last_mut() {
                Some(last) if last.end > region.begin => {
                    return Err(Error::OverlappingRegion { existing: *last, incoming: region });
                }
                Some(last) if last.end == region.begin => last.end = region.end,
                _ => merged.push(region),
            }
        }

        trace!("Cultivated {} regions, map now holds {}", incoming.len(), merged.len());
        self.regions = merged;
        Ok(())
    }

    /// End of the region covering `position` (and reaching past `end_position`),
    /// i.e. where a search that hit claimed text should resume.
    pub fn search_again_position(&self, position: usize, end_position: Option<usize>) -> Option<usize> {
        let end_position = end_position.unwrap_or(position);
        let idx = self.regions.partition_point(|r| r.end <= end_position);
        let region = self.regions.get(idx)?;
        if region.begin > position { None } else { Some(region.end) }
    }

    pub fn last_cultivated_position(&self, position: usize) -> Option<usize> {
        let idx = self.regions.partition_point(|r| r.end <= position);
        if idx == 0 { None } else { Some(self.regions[idx - 1].end) }
    }

    pub fn next_cultivated_position(&self, position: usize) -> Option<usize> {
        let idx = self.regions.partition_point(|r| r.begin <= position);
        self.regions.get(idx).map(|r| r.begin)
    }

    /// Regions overlapping `span`.
    pub fn in_regions(&self, span: Span) -> &[Span] {
        let first = self.regions.partition_point(|r| r.end <= span.begin);
        let last = self.regions.partition_point(|r| r.begin < span.end);
        if first >= last { &[] } else { &self.regions[first..last] }
    }

    pub fn is_open(&self, span: Span) -> bool {
        self.in_regions(span).is_empty()
    }

    pub fn region_state(&self, span: Span) -> RegionState {
        let closed = self.in_regions(span);
        let (first, last) = match (closed.first(), closed.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return RegionState::Open(span),
        };

        let front_open = first.begin > span.begin;
        let rear_open = last.end < span.end;
        match (front_open, rear_open) {
            (true, true) => RegionState::MiddleClosed {
                front: Span::new(span.begin, first.begin),
                rear: Span::new(last.end, span.end),
            },
            (true, false) => RegionState::FrontOpen(Span::new(span.begin, first.begin)),
            (false, true) => RegionState::RearOpen(Span::new(last.end, span.end)),
            (false, false) => RegionState::Closed,
        }
    }

    /// First occurrence of `pattern` in `haystack` at or after `from` that
    /// lies entirely in unclaimed text.
    pub fn index(&self, pattern: &str, haystack: &TextIndex, from: usize) -> Option<usize> {
        let length = pattern.chars().count();
        let mut position = from;
        loop {
            let begin = haystack.find(pattern, position)?;
            if let Some(resume) = self.search_again_position(begin, None) {
                position = resume;
                continue;
            }
            if self.is_open(Span::new(begin, begin + length)) {
                return Some(begin);
            }
            position = begin + 1;
        }
    }
}
