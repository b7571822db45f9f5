use std::io::Write;
use tempfile::NamedTempFile;

use text_alignment::{
    find_divisions, AlignmentConfig, CultivationMap, Denotation, Division, Error, ReferenceAligner, Span,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_reference_aligner_relocates_repeated_passages() {
    init();
    let reference = "Results. The kinase phosphorylates its substrate. Discussion. \
                     The kinase phosphorylates its substrate.";
    let passage = "The kinase phosphorylates its substrate.";
    let mut aligner = ReferenceAligner::new(reference, AlignmentConfig::default()).unwrap();
    let kinase = [Denotation::new(4, 10).with_id("T1").with_obj("Protein")];

    let first = aligner.align(passage, &kinase).unwrap();
    let first = first.transform_denotations(&kinase).unwrap();
    assert_eq!(first.transferred[0].span, Span::new(13, 19));

    let second = aligner.align(passage, &kinase).unwrap();
    let second = second.transform_denotations(&kinase).unwrap();
    assert_eq!(second.transferred[0].span, Span::new(66, 72));

    assert_eq!(aligner.cultivated_regions(), vec![Span::new(9, 49), Span::new(62, 102)]);
}

#[test]
fn test_rear_gap_falls_back_to_unclaimed_front() {
    init();
    let heading = "Results of the experiment are summarised below: ";
    let reference = format!("{}rabcdefwMethods. and more text follows here.", heading);
    let mut aligner = ReferenceAligner::new(&reference, AlignmentConfig::default()).unwrap();

    aligner.align("Methods.", &[]).unwrap();
    assert_eq!(aligner.cultivated_regions(), vec![Span::new(56, 64)]);

    // the rear window [48, 76) is cut in two by the claimed "Methods."
    let source = format!("{}qabcdefz", heading);
    let alignment = aligner.align(&source, &[]).unwrap();
    let kinds: Vec<&str> = alignment.blocks().iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, vec!["block", "local"]);
    assert_eq!(alignment.blocks()[1].target, Span::new(48, 56));
    assert_eq!(alignment.transform_span(Span::new(49, 55)), Some(Span::new(49, 55)));
}

#[test]
fn test_overlapping_cultivation_is_fatal() {
    let mut map = CultivationMap::new();
    map.cultivate(&[Span::new(0, 10), Span::new(20, 30)]).unwrap();
    map.cultivate(&[Span::new(10, 15)]).unwrap();
    assert_eq!(map.regions(), &[Span::new(0, 15), Span::new(20, 30)]);

    let err = map.cultivate(&[Span::new(25, 35)]).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::OverlappingRegion { .. }));
    assert_eq!(map.regions().len(), 2);
}

#[test]
fn test_find_divisions_locates_sections() {
    init();
    let title = "A kinase cascade controls cell growth";
    let body = "We show that the kinase phosphorylates its substrate in growing cells.";
    let source = format!("{}\n{}", title, body);
    let divisions = vec![Division::new("body", body), Division::new("title", title)];

    let index = find_divisions(&source, &divisions, &AlignmentConfig::default()).unwrap();
    let region = |id: &str| index.matches.iter().find(|m| m.id == id).map(|m| m.region);
    assert_eq!(region("title"), Some(Span::new(0, 37)));
    assert_eq!(region("body"), Some(Span::new(38, 108)));
    assert!(index.remaining_divisions.is_empty());
    assert_eq!(index.remaining_source, None);
}

#[test]
fn test_ini_configuration_drives_alignment() {
    init();
    let mut table = NamedTempFile::new().unwrap();
    write!(table, r#"[["β", "beta"]]"#).unwrap();
    table.flush().unwrap();

    let mut ini = NamedTempFile::new().unwrap();
    writeln!(ini, "[normalizer]").unwrap();
    writeln!(ini, "mapping_file = {}", table.path().display()).unwrap();
    writeln!(ini, "[alignment]").unwrap();
    writeln!(ini, "case_insensitive_fast_path = false").unwrap();
    ini.flush().unwrap();

    let config = AlignmentConfig::from_ini(ini.path()).unwrap();
    assert!(!config.alignment.case_insensitive_fast_path);

    let mut aligner = ReferenceAligner::new("TGF-beta signalling", config).unwrap();
    let alignment = aligner.align("TGF-β signalling", &[]).unwrap();
    assert_eq!(alignment.transform_span(Span::new(0, 5)), Some(Span::new(0, 8)));
    assert_eq!(alignment.transform_span(Span::new(6, 16)), Some(Span::new(9, 19)));
}
