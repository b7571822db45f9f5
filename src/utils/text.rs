// src/utils/text.rs

use memchr::memmem;

/// A string addressed by character offsets.
///
/// Keeps the char-to-byte table so that slicing is O(1) and substring
/// search can run over the raw UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextIndex {
    text: String,
    chars: Vec<char>,
    // byte offset of every char boundary, len() + 1 entries
    offsets: Vec<usize>,
}

impl TextIndex {
    pub fn new(text: &str) -> Self {
        Self::from_chars(text.chars().collect())
    }

    pub fn from_chars(chars: Vec<char>) -> Self {
        let mut text = String::with_capacity(chars.len());
        let mut offsets = Vec::with_capacity(chars.len() + 1);
        for &c in &chars {
            offsets.push(text.len());
            text.push(c);
        }
        offsets.push(text.len());
        Self { text, chars, offsets }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Slice by char offsets, clamped to the text.
    pub fn slice(&self, begin: usize, end: usize) -> &str {
        let end = end.min(self.len());
        let begin = begin.min(end);
        &self.text[self.offsets[begin]..self.offsets[end]]
    }

    /// Char offset of the first occurrence of `pattern` at or after `from`.
    pub fn find(&self, pattern: &str, from: usize) -> Option<usize> {
        if from > self.len() {
            return None;
        }
        let start = self.offsets[from];
        let found = memmem::find(&self.text.as_bytes()[start..], pattern.as_bytes())?;
        Some(self.char_offset(start + found))
    }

    /// Char offsets of every non-overlapping occurrence of `pattern`.
    pub fn find_all(&self, pattern: &str) -> Vec<usize> {
        if pattern.is_empty() {
            return Vec::new();
        }
        let finder = memmem::Finder::new(pattern.as_bytes());
        finder
            .find_iter(self.text.as_bytes())
            .map(|byte| self.char_offset(byte))
            .collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.find_all(pattern).len()
    }

    // matches always start on a char boundary
    fn char_offset(&self, byte: usize) -> usize {
        self.offsets.partition_point(|&b| b < byte)
    }
}

/// Lowercase a char without changing the char count of the text.
pub fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

pub fn fold_case_all(chars: &[char]) -> Vec<char> {
    chars.iter().map(|&c| fold_case(c)).collect()
}

pub fn count_non_whitespace(chars: &[char]) -> usize {
    chars.iter().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_uses_char_offsets() {
        let index = TextIndex::new("αβγ abc αβγ");
        assert_eq!(index.find("abc", 0), Some(4));
        assert_eq!(index.find("αβγ", 1), Some(8));
        assert_eq!(index.find("αβγ", 9), None);
    }

    #[test]
    fn test_slice_and_find_all() {
        let index = TextIndex::new("-β-β-");
        assert_eq!(index.slice(1, 4), "β-β");
        assert_eq!(index.find_all("β"), vec![1, 3]);
        assert_eq!(index.count("-"), 3);
        assert_eq!(index.slice(3, 99), "β-");
    }

    #[test]
    fn test_fold_case_keeps_length() {
        assert_eq!(fold_case('A'), 'a');
        assert_eq!(fold_case('Β'), 'β');
        // 'İ' lowercases to two chars and is left alone
        assert_eq!(fold_case('İ'), 'İ');
    }
}
