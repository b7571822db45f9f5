use serde::{Serialize, Deserialize};
use std::fmt;

/// Half-open character range `[begin, end)` into one version of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    pub fn contains(&self, position: usize) -> bool {
        self.begin <= position && position < self.end
    }

    /// True when `other` lies entirely inside this span.
    pub fn covers(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    pub fn shift(&self, offset: usize) -> Span {
        Span::new(self.begin + offset, self.end + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// An annotation anchored to a span of a specific text version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
}

impl Denotation {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { id: None, span: Span::new(begin, end), obj: None }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_obj<S: Into<String>>(mut self, obj: S) -> Self {
        self.obj = Some(obj.into());
        self
    }

    pub fn with_span(&self, span: Span) -> Self {
        Self { span, ..self.clone() }
    }
}

/// Target-side image of one source boundary.
///
/// `Collapsed` appears where a single source boundary sits in front of a
/// pure insertion: a span beginning there should start after the inserted
/// text, a span ending there should stop before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Single(usize),
    Collapsed(usize, usize),
}

impl Position {
    pub fn begin(&self) -> usize {
        match *self {
            Position::Single(p) => p,
            Position::Collapsed(begin, _) => begin,
        }
    }

    pub fn end(&self) -> usize {
        match *self {
            Position::Single(p) => p,
            Position::Collapsed(_, end) => end,
        }
    }

    pub fn offset(&self, delta: usize) -> Position {
        match *self {
            Position::Single(p) => Position::Single(p + delta),
            Position::Collapsed(b, e) => Position::Collapsed(b + delta, e + delta),
        }
    }
}

/// Dense map from every source boundary `0..=len` to an optional target boundary.
pub type PositionMap = Vec<Option<usize>>;
