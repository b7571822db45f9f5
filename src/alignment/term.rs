// src/alignment/term.rs

use log::trace;

use crate::types::Span;
use crate::utils::text::TextIndex;
use super::block::Block;

/// Align a gap through its lexemes: the text under each given span.
///
/// Every lexeme has to occur exactly once in the source gap and exactly
/// once in the target window, in the same order as on the source side.
/// Any failure voids the whole path and yields `None`. Spans are local
/// to the gap, and the returned blocks are local to the gap and window.
pub fn term_alignment(source: &TextIndex, target: &TextIndex, spans: &[Span]) -> Option<Vec<Block>> {
    let mut spans: Vec<Span> = spans.iter().copied().filter(|s| !s.is_empty()).collect();
    spans.sort();
    spans.dedup();
    if spans.is_empty() {
        return None;
    }
    if spans.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
        trace!("term alignment: overlapping lexemes");
        return None;
    }

    let mut blocks = Vec::with_capacity(spans.len() * 2 + 1);
    let (mut source_cursor, mut target_cursor) = (0, 0);

    for span in spans {
        if span.end > source.len() {
            return None;
        }
        let lexeme = source.slice(span.begin, span.end);
        if source.count(lexeme) != 1 || target.count(lexeme) != 1 {
            trace!("term alignment: lexeme {:?} is missing or repeated", lexeme);
            return None;
        }
        let found = target.find(lexeme, 0)?;
        if found < target_cursor {
            trace!("term alignment: lexeme {:?} out of order", lexeme);
            return None;
        }

        if span.begin > source_cursor {
            blocks.push(Block::empty(
                Span::new(source_cursor, span.begin),
                Span::new(target_cursor, found),
            ));
        }
        let target_span = Span::new(found, found + span.len());
        blocks.push(Block::term(span, target_span));
        source_cursor = span.end;
        target_cursor = target_span.end;
    }

    if source_cursor < source.len() {
        blocks.push(Block::empty(
            Span::new(source_cursor, source.len()),
            Span::new(target_cursor, target.len()),
        ));
    }

    Some(blocks)
}
