// src/alignment/reference.rs

use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::normalizer::{CharMapping, EquivalenceTable};
use crate::types::{Denotation, Span};
use super::cultivation_map::CultivationMap;
use super::text_alignment::{normalized, TextAlignment};

/// Alignment session against one reference text.
///
/// Every successful [`ReferenceAligner::align`] claims the target text its
/// blocks account for, so later sources are steered towards the parts of
/// the reference nobody has matched yet. Calls take `&mut self`; wrap the
/// aligner in a [`SharedReferenceAligner`] to share it between threads.
pub struct ReferenceAligner {
    reference: CharMapping,
    // normalized reference coordinates
    cultivation: CultivationMap,
    config: AlignmentConfig,
    table: Arc<EquivalenceTable>,
}

impl ReferenceAligner {
    /// Session using the equivalence table named by the configuration.
    pub fn new(reference: &str, config: AlignmentConfig) -> Result<Self> {
        let table = Arc::new(config.equivalence_table()?);
        Self::with_table(reference, config, table)
    }

    pub fn with_table(reference: &str, config: AlignmentConfig, table: Arc<EquivalenceTable>) -> Result<Self> {
        config.validate()?;
        let reference = normalized(reference, &config, &table);
        info!("Reference aligner ready for {} chars", reference.original_len());
        Ok(Self {
            reference,
            cultivation: CultivationMap::new(),
            config,
            table,
        })
    }

    /// Align `source` against the unclaimed part of the reference and claim
    /// what the alignment accounts for.
    pub fn align(&mut self, source: &str, denotations: &[Denotation]) -> Result<TextAlignment> {
        let source = normalized(source, &self.config, &self.table);
        let alignment = TextAlignment::align_mapped(
            source,
            self.reference.clone(),
            denotations,
            &self.config,
            &self.table,
            Some(&self.cultivation),
        )?;

        let claimed: Vec<Span> = alignment
            .normalized_blocks()
            .iter()
            .filter_map(|block| block.claimed_target())
            .collect();
        self.cultivation.cultivate(&claimed)?;
        debug!(
            "claimed {} target regions, {} regions cultivated in total",
            claimed.len(),
            self.cultivation.regions().len()
        );

        Ok(alignment)
    }

    /// Claimed regions in original reference coordinates.
    pub fn cultivated_regions(&self) -> Vec<Span> {
        self.cultivation
            .regions()
            .iter()
            .filter_map(|region| {
                let begin = self.reference.demap_position(region.begin)?;
                let end = self.reference.demap_position(region.end)?;
                Some(Span::new(begin, end))
            })
            .collect()
    }

    pub fn cultivation_map(&self) -> &CultivationMap {
        &self.cultivation
    }

    pub fn reference_len(&self) -> usize {
        self.reference.original_len()
    }

    /// Forget every claim.
    pub fn reset(&mut self) {
        self.cultivation = CultivationMap::new();
    }
}

/// Thread-safe handle to a [`ReferenceAligner`]; calls are serialized.
#[derive(Clone)]
pub struct SharedReferenceAligner {
    inner: Arc<Mutex<ReferenceAligner>>,
}

impl SharedReferenceAligner {
    pub fn new(aligner: ReferenceAligner) -> Self {
        Self { inner: Arc::new(Mutex::new(aligner)) }
    }

    pub fn align(&self, source: &str, denotations: &[Denotation]) -> Result<TextAlignment> {
        self.inner.lock().align(source, denotations)
    }

    pub fn cultivated_regions(&self) -> Vec<Span> {
        self.inner.lock().cultivated_regions()
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "The kinase phosphorylates its substrate. The kinase phosphorylates its substrate.";

    #[test]
    fn test_repeated_source_claims_next_copy() {
        let mut aligner = ReferenceAligner::new(REFERENCE, AlignmentConfig::default()).unwrap();
        let sentence = "The kinase phosphorylates its substrate.";

        let first = aligner.align(sentence, &[]).unwrap();
        assert_eq!(first.transform_begin_position(0), Some(0));
        assert_eq!(aligner.cultivated_regions(), vec![Span::new(0, 40)]);

        let second = aligner.align(sentence, &[]).unwrap();
        assert_eq!(second.transform_begin_position(0), Some(41));
        assert_eq!(second.transform_end_position(40), Some(81));
        assert_eq!(aligner.cultivated_regions(), vec![Span::new(0, 40), Span::new(41, 81)]);
    }

    #[test]
    fn test_reset_forgets_claims() {
        let mut aligner = ReferenceAligner::new(REFERENCE, AlignmentConfig::default()).unwrap();
        aligner.align("its substrate", &[]).unwrap();
        assert!(!aligner.cultivation_map().is_empty());
        aligner.reset();
        assert!(aligner.cultivated_regions().is_empty());
        assert_eq!(aligner.reference_len(), 81);
    }

    #[test]
    fn test_shared_aligner_serializes_calls() {
        let aligner = ReferenceAligner::new(REFERENCE, AlignmentConfig::default()).unwrap();
        let shared = SharedReferenceAligner::new(aligner);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared
                        .align("The kinase phosphorylates its substrate.", &[])
                        .map(|a| a.transform_begin_position(0))
                })
            })
            .collect();

        let mut begins: Vec<Option<usize>> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        begins.sort();
        assert_eq!(begins, vec![Some(0), Some(41)]);
    }
}
