// src/alignment/divisions.rs

use log::{debug, info, trace};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::config::AlignmentConfig;
use crate::error::{Error, Result};
use crate::lcs::min_lcs_sdiff;
use crate::matcher::approximate_fit;
use crate::types::Span;

/// A piece of text expected somewhere inside a larger source, e.g. a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: String,
    pub text: String,
}

impl Division {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, text: T) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionMatch {
    pub id: String,
    /// Char offsets into the original source.
    pub region: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionIndex {
    pub matches: Vec<DivisionMatch>,
    /// Source text left over once every match was cut out, unless only whitespace remains.
    pub remaining_source: Option<String>,
    pub remaining_divisions: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    similarity: f64,
    // working source coordinates
    region: Span,
}

/// Find where each division sits in `source`.
///
/// Divisions are placed one per round, smallest first, each round taking
/// the best scoring candidate and cutting its region out of the source.
pub fn find_divisions(source: &str, divisions: &[Division], config: &AlignmentConfig) -> Result<DivisionIndex> {
    if divisions.is_empty() {
        return Err(Error::invalid_input("No divisions to locate"));
    }

    let table = config.equivalence_table()?;
    let substitutions = table.char_substitutions();
    let fold = |text: &str| -> Vec<char> {
        text.chars().map(|c| *substitutions.get(&c).unwrap_or(&c)).collect()
    };

    let mut working = fold(source);
    // original source offset of each working char
    let mut origin: Vec<usize> = (0..working.len()).collect();

    let mut pending: Vec<(String, Vec<char>)> = divisions
        .iter()
        .map(|d| (d.id.clone(), fold(&d.text)))
        .collect();
    pending.sort_by_key(|(_, text)| text.len());

    let threshold = config.divisions.similarity_threshold;
    let slack = config.divisions.slack_rate();
    let mut matches = Vec::with_capacity(divisions.len());

    while !pending.is_empty() && working.iter().any(|c| !c.is_whitespace()) {
        let candidates: Vec<Candidate> = pending
            .par_iter()
            .enumerate()
            .filter_map(|(index, (id, text))| {
                let candidate = evaluate(&working, text, config, threshold, slack).map(|(similarity, region)| {
                    Candidate { index, similarity, region }
                });
                trace!("division {}: {:?}", id, candidate.map(|c| c.similarity));
                candidate
            })
            .collect();

        // highest similarity, earliest division on ties
        let best = candidates.into_iter().fold(None, |best: Option<Candidate>, c| match best {
            Some(b) if b.similarity >= c.similarity => Some(b),
            _ => Some(c),
        });
        let choice = match best {
            Some(choice) => choice,
            None => break,
        };

        let (id, _) = pending.remove(choice.index);
        let region = Span::new(origin[choice.region.begin], origin[choice.region.end - 1] + 1);
        debug!("division {} placed at {} (similarity {:.3})", id, region, choice.similarity);
        matches.push(DivisionMatch { id, region });

        working.drain(choice.region.begin..choice.region.end);
        origin.drain(choice.region.begin..choice.region.end);
    }

    let remaining_source = if working.iter().any(|c| !c.is_whitespace()) {
        let mut chars = source.chars();
        let mut remaining = String::with_capacity(origin.len());
        let mut cursor = 0;
        for &i in &origin {
            if let Some(c) = chars.nth(i - cursor) {
                remaining.push(c);
            }
            cursor = i + 1;
        }
        Some(remaining)
    } else {
        None
    };
    let remaining_divisions: Vec<String> = pending.into_iter().map(|(id, _)| id).collect();

    info!(
        "Placed {} of {} divisions ({} left over)",
        matches.len(),
        divisions.len(),
        remaining_divisions.len()
    );

    Ok(DivisionIndex { matches, remaining_source, remaining_divisions })
}

// similarity and working-source region of one division, if it is acceptable
fn evaluate(
    working: &[char],
    division: &[char],
    config: &AlignmentConfig,
    threshold: f64,
    slack: f64,
) -> Option<(f64, Span)> {
    if division.is_empty() || working.is_empty() {
        return None;
    }

    // compare the shorter text against (a fitted window of) the longer one
    let division_inside = division.len() <= working.len();
    let (str1, str2) = if division_inside { (division, working) } else { (working, division) };
    let (len1, len2) = (str1.len(), str2.len());

    let (begin, end) = if (len2 - len1) as f64 > len1 as f64 * slack {
        approximate_fit(str1, str2, &config.fit)?
    } else {
        (0, len2)
    };

    let comparison = min_lcs_sdiff(str1, &str2[begin..end], 0)?;
    let similarity = comparison.similarity();
    let unmatched = len1 - comparison.str1_match_len();
    if similarity <= threshold || unmatched as f64 >= len1 as f64 * slack {
        return None;
    }

    let region = if division_inside {
        Span::new(begin + comparison.str2_match_initial, begin + comparison.str2_match_final + 1)
    } else {
        Span::new(0, working.len())
    };
    Some((similarity, region))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: &str = "First paragraph about cats.";
    const SECOND: &str = "Second paragraph about dogs and their owners.";

    fn region_of<'a>(index: &'a DivisionIndex, id: &str) -> Option<&'a Span> {
        index.matches.iter().find(|m| m.id == id).map(|m| &m.region)
    }

    #[test]
    fn test_paragraphs_are_located() {
        let source = format!("{}\n\n{}", FIRST, SECOND);
        let divisions = vec![Division::new("d1", SECOND), Division::new("d2", FIRST)];
        let index = find_divisions(&source, &divisions, &AlignmentConfig::default()).unwrap();

        assert_eq!(region_of(&index, "d2"), Some(&Span::new(0, 27)));
        assert_eq!(region_of(&index, "d1"), Some(&Span::new(29, 74)));
        assert_eq!(index.remaining_source, None);
        assert!(index.remaining_divisions.is_empty());
    }

    #[test]
    fn test_unplaced_division_and_leftover_source() {
        let source = format!("{}\n\n{}\n\n[Figure 1]", FIRST, SECOND);
        let divisions = vec![
            Division::new("d1", SECOND),
            Division::new("d2", FIRST),
            Division::new("d3", "0123456789 9876543210"),
        ];
        let index = find_divisions(&source, &divisions, &AlignmentConfig::default()).unwrap();

        assert_eq!(region_of(&index, "d2"), Some(&Span::new(0, 27)));
        assert_eq!(region_of(&index, "d1"), Some(&Span::new(29, 74)));
        assert_eq!(index.remaining_divisions, vec!["d3".to_string()]);
        let remaining = index.remaining_source.unwrap();
        assert!(remaining.contains("[Figure 1]"));
    }

    #[test]
    fn test_no_divisions_is_invalid() {
        let err = find_divisions("text", &[], &AlignmentConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
