// src/normalizer/table.rs

use ahash::AHashMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// Unicode variants folded to their ASCII-ish spelling
const DEFAULT_PAIRS: &[(&str, &str)] = &[
    ("©", "(c)"),

    ("α", "alpha"),
    ("β", "beta"),
    ("γ", "gamma"),
    ("δ", "delta"),
    ("ε", "epsilon"),
    ("ζ", "zeta"),
    ("η", "eta"),
    ("θ", "theta"),
    ("ι", "iota"),
    ("κ", "kappa"),
    ("λ", "lambda"),
    ("λ", "lamda"),
    ("μ", "mu"),
    ("ν", "nu"),
    ("ξ", "xi"),
    ("ο", "omicron"),
    ("π", "pi"),
    ("ρ", "rho"),
    ("σ", "sigma"),
    ("τ", "tau"),
    ("υ", "upsilon"),
    ("φ", "phi"),
    ("χ", "chi"),
    ("ψ", "psi"),
    ("ω", "omega"),

    ("Α", "Alpha"),
    ("Β", "Beta"),
    ("Γ", "Gamma"),
    ("Δ", "Delta"),
    ("Ε", "Epsilon"),
    ("Ζ", "Zeta"),
    ("Η", "Eta"),
    ("Θ", "Theta"),
    ("Ι", "Iota"),
    ("Κ", "Kappa"),
    ("Λ", "Lambda"),
    ("Λ", "Lamda"),
    ("Μ", "Mu"),
    ("Ν", "Nu"),
    ("Ξ", "Xi"),
    ("Ο", "Omicron"),
    ("Π", "Pi"),
    ("Ρ", "Rho"),
    ("Σ", "Sigma"),
    ("Τ", "Tau"),
    ("Υ", "Upsilon"),
    ("Φ", "Phi"),
    ("Χ", "Chi"),
    ("Ψ", "Psi"),
    ("Ω", "Omega"),

    ("ϕ", "phi"),

    ("×", "x"),
    ("•", "*"),
    ("\u{2009}", " "), // thin space
    ("\u{200A}", " "), // hair space
    ("\u{00A0}", " "), // no-break space
    ("\u{3000}", " "), // ideographic space
    ("\u{2011}", "-"), // non-breaking hyphen
    ("\u{2212}", "-"), // minus sign
    ("\u{2013}", "-"), // en dash
    ("\u{2032}", "'"), // prime
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\"", "''"),
];

static DEFAULT_TABLE: Lazy<EquivalenceTable> = Lazy::new(|| EquivalenceTable {
    pairs: DEFAULT_PAIRS
        .iter()
        .map(|&(a, b)| (a.to_string(), b.to_string()))
        .collect(),
});

/// Ordered list of `(a, b)` patterns treated as equal during alignment.
///
/// Tables are immutable once built. Customisation goes through
/// [`EquivalenceTable::with_pairs`], which returns a new table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquivalenceTable {
    pairs: Vec<(String, String)>,
}

impl EquivalenceTable {
    pub fn new(pairs: Vec<(String, String)>) -> Result<Self> {
        for (a, b) in &pairs {
            if a.is_empty() || b.is_empty() {
                return Err(Error::invalid_input(
                    format!("Empty pattern in equivalence pair ({:?}, {:?})", a, b)
                ));
            }
        }
        Ok(Self { pairs })
    }

    pub fn from_strs(pairs: &[(&str, &str)]) -> Result<Self> {
        Self::new(pairs.iter().map(|&(a, b)| (a.to_string(), b.to_string())).collect())
    }

    /// A table with no equivalences; only identical characters match.
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// The built-in Unicode fold list, shared read-only by every caller.
    pub fn default_table() -> &'static EquivalenceTable {
        &DEFAULT_TABLE
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_json::from_str(json)?;
        Self::new(pairs)
    }

    /// Load a JSON array of `[pattern_a, pattern_b]` pairs.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let table = Self::from_json_str(&content)?;
        info!("Loaded {} equivalence pairs from {:?}", table.len(), path.as_ref());
        Ok(table)
    }

    /// A new table with `extra` appended after the existing pairs.
    pub fn with_pairs(&self, extra: &[(&str, &str)]) -> Result<Self> {
        let mut pairs = self.pairs.clone();
        pairs.extend(extra.iter().map(|&(a, b)| (a.to_string(), b.to_string())));
        debug!("Extending equivalence table from {} to {} pairs", self.len(), pairs.len());
        Self::new(pairs)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 1:1 substitutions. The first registered pair for a character wins.
    pub fn char_substitutions(&self) -> AHashMap<char, char> {
        let mut map = AHashMap::new();
        for (a, b) in &self.pairs {
            if let (Some(from), Some(to)) = (single_char(a), single_char(b)) {
                map.entry(from).or_insert(to);
            }
        }
        map
    }

    /// One-to-many pairs as `(single char, long form)`, in registration order.
    pub fn long_forms(&self) -> Vec<(char, Vec<char>)> {
        self.pairs
            .iter()
            .filter_map(|(a, b)| {
                let one = single_char(a)?;
                let long: Vec<char> = b.chars().collect();
                if long.len() > 1 { Some((one, long)) } else { None }
            })
            .collect()
    }

    /// Every pair followed by every reversed pair, as char vectors.
    pub fn symmetric_pairs(&self) -> Vec<(Vec<char>, Vec<char>)> {
        let forward = self.pairs.iter().map(|(a, b)| (a.chars().collect(), b.chars().collect()));
        let reversed = self.pairs.iter().map(|(a, b)| (b.chars().collect(), a.chars().collect()));
        forward.chain(reversed).collect()
    }
}

impl Default for EquivalenceTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
