use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use text_alignment::{
    AlignmentConfig, CharMapping, Denotation, EquivalenceTable, LossReason, Span, TextAlignment,
    WhitespacePolicy,
};
use text_alignment::matcher::{CosineMatcher, SimilarityAlgorithm};

const VOCABULARY: &[&str] = &[
    "kinase", "binds", "the", "receptor", "cells", "growth", "signal",
    "protein", "domain", "complex", "activity", "membrane",
];

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sentence(rng: &mut StdRng, words: usize) -> Vec<&'static str> {
    (0..words).map(|_| VOCABULARY[rng.gen_range(0..VOCABULARY.len())]).collect()
}

// delete, replace or insert about a third of the words
fn mutate(rng: &mut StdRng, words: &[&'static str]) -> Vec<&'static str> {
    let mut mutated = Vec::with_capacity(words.len() + 8);
    for &word in words {
        match rng.gen_range(0..10) {
            0 => {}
            1 => mutated.push(VOCABULARY[rng.gen_range(0..VOCABULARY.len())]),
            2 => {
                mutated.push(VOCABULARY[rng.gen_range(0..VOCABULARY.len())]);
                mutated.push(word);
            }
            _ => mutated.push(word),
        }
    }
    mutated
}

#[test]
fn test_exact_match_is_a_shifted_identity() {
    init();
    let text = "Interleukin two activates the receptor.";
    let target = format!("Abstract: {} (end)", text);
    let alignment = TextAlignment::new(text, &target).unwrap();

    let blocks = alignment.blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind.as_str(), "block");
    assert_eq!(blocks[0].target, Span::new(10, 10 + text.len()));
    for i in 0..=text.len() {
        assert_eq!(alignment.transform_begin_position(i), Some(i + 10));
        assert_eq!(alignment.transform_end_position(i), Some(i + 10));
    }
}

#[test]
fn test_deletion_and_addition() {
    init();
    let deletion = TextAlignment::new("xyzabc", "abc").unwrap();
    assert_eq!(deletion.transform_begin_position(0), Some(0));
    assert_eq!(deletion.transform_begin_position(1), None);
    assert_eq!(deletion.transform_begin_position(3), Some(0));
    assert_eq!(deletion.transform_begin_position(4), Some(1));
    assert_eq!(deletion.transform_end_position(6), Some(3));

    let addition = TextAlignment::new("abc", "xyzabc").unwrap();
    for i in 0..=3 {
        assert_eq!(addition.transform_begin_position(i), Some(i + 3));
    }
}

#[test]
fn test_spelled_out_letters_map_onto_symbols() {
    init();
    let alignment = TextAlignment::new("-βκ-", "-betakappa-").unwrap();
    assert_eq!(alignment.transform_begin_position(1), Some(1));
    assert_eq!(alignment.transform_span(Span::new(1, 2)), Some(Span::new(1, 5)));
    assert_eq!(alignment.transform_span(Span::new(2, 3)), Some(Span::new(5, 10)));
    assert_eq!(alignment.transform_end_position(4), Some(11));
}

#[test]
fn test_normalizer_round_trip() {
    let table = EquivalenceTable::default_table();
    let text = "TNF-α and IFN-gamma  levels \u{2013} measured in μg";
    let mapping = CharMapping::new(text, table, WhitespacePolicy::CollapseToOne);
    assert_eq!(mapping.text(), "TNF-α and IFN-γ levels - measured in μg");

    // boundaries outside collapsed spans survive the round trip
    let collapsed = [(14, 19), (19, 21)];
    for i in 0..=mapping.original_len() {
        if collapsed.iter().any(|&(b, e)| i > b && i < e) {
            continue;
        }
        let j = mapping.enmap_position(i).unwrap();
        assert_eq!(mapping.demap_position(j), Some(i), "boundary {}", i);
    }
}

#[test]
fn test_positions_are_monotonic() {
    init();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let words = sentence(&mut rng, 40);
        let source = words.join(" ");
        let target = mutate(&mut rng, &words).join(" ");
        let alignment = TextAlignment::new(&source, &target).unwrap();

        let len = source.chars().count();
        let begins: Vec<usize> = (0..=len).filter_map(|i| alignment.transform_begin_position(i)).collect();
        let ends: Vec<usize> = (0..=len).filter_map(|i| alignment.transform_end_position(i)).collect();
        assert!(begins.windows(2).all(|w| w[0] <= w[1]), "{:?} -> {:?}", source, target);
        assert!(ends.windows(2).all(|w| w[0] <= w[1]), "{:?} -> {:?}", source, target);

        let similarity = alignment.similarity();
        assert!((0.0..=1.0).contains(&similarity));
    }
}

#[test]
fn test_similarity_bounds() {
    let text = "the receptor binds the kinase";
    assert_eq!(TextAlignment::new(text, text).unwrap().similarity(), 1.0);

    let cosine = CosineMatcher::new(2);
    assert_eq!(cosine.compare_texts(text, text), 1.0);
    assert_eq!(cosine.compare_texts("abcd", "wxyz"), 0.0);
}

#[test]
fn test_lost_denotations_are_accounted_for() {
    init();
    let alignment = TextAlignment::new("xyz abc def uvw", "abc def").unwrap();
    let denotations = vec![
        Denotation::new(4, 7).with_id("T1"),
        Denotation::new(2, 6).with_id("T2"),
        Denotation::new(8, 13).with_id("T3"),
        Denotation::new(12, 15).with_id("T4"),
    ];
    let transfer = alignment.transform_denotations(&denotations).unwrap();

    assert_eq!(transfer.transferred.len() + transfer.lost.len(), denotations.len());
    assert_eq!(transfer.transferred.len(), 1);
    assert_eq!(transfer.transferred[0].span, Span::new(0, 3));

    let reasons: Vec<(Option<&str>, LossReason)> = transfer
        .lost
        .iter()
        .map(|l| (l.denotation.id.as_deref(), l.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (Some("T2"), LossReason::UnresolvedBegin),
            (Some("T3"), LossReason::UnresolvedEnd),
            (Some("T4"), LossReason::UnresolvedBegin),
        ]
    );
    // the original span is kept for diagnostics
    assert_eq!(transfer.lost[0].denotation.span, Span::new(2, 6));
}

#[test]
fn test_lexemes_resolve_an_unanchored_gap() {
    init();
    let mut config = AlignmentConfig::default();
    config.alignment.local_similarity_cutoff = 1.0;
    let source = "IL-2 activates STAT5 in T cells";
    let target = "We saw IL-2 strongly activate STAT5 there";
    let denotations = vec![
        Denotation::new(0, 4).with_obj("Protein"),
        Denotation::new(15, 20).with_obj("Protein"),
    ];
    let alignment = TextAlignment::with_denotations(
        source,
        target,
        &denotations,
        &config,
        EquivalenceTable::default_table(),
    )
    .unwrap();

    let transfer = alignment.transform_denotations(&denotations).unwrap();
    let spans: Vec<Span> = transfer.transferred.iter().map(|d| d.span).collect();
    assert_eq!(spans, vec![Span::new(7, 11), Span::new(30, 35)]);
    assert!(transfer.lost.is_empty());
}
