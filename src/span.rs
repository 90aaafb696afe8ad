use serde::{Deserialize, Serialize};
use std::{cmp, fmt::Display};
use thiserror::Error;

/// A span marks a contiguous range of tokens classified under a label. The range is half-open:
/// `start` is the index of the first token and `end` is one past the last token. A span always
/// covers at least one token.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct Span {
    start: usize,
    end: usize,
    label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    #[error("Span ({start}, {end}) starts after it ends")]
    Reversed { start: usize, end: usize },
    #[error("Span ({start}, {end}) does not cover any token")]
    Empty { start: usize, end: usize },
    #[error("Span ({start}, {end}) has an empty label")]
    MissingLabel { start: usize, end: usize },
}

impl Span {
    /// Builds a validated span.
    pub fn try_new(
        start: usize,
        end: usize,
        label: impl Into<String>,
    ) -> Result<Self, SpanError> {
        let label = label.into();
        match start.cmp(&end) {
            cmp::Ordering::Greater => Err(SpanError::Reversed { start, end }),
            cmp::Ordering::Equal => Err(SpanError::Empty { start, end }),
            cmp::Ordering::Less if label.trim().is_empty() => {
                Err(SpanError::MissingLabel { start, end })
            }
            cmp::Ordering::Less => Ok(Self { start, end, label }),
        }
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    /// Number of tokens covered by the span. Never zero.
    pub fn len(&self) -> usize {
        self.end - self.start
    }
    /// Always false, a valid span covers at least one token. Present for clippy's sake.
    pub fn is_empty(&self) -> bool {
        false
    }
    /// Number of tokens shared by the two spans.
    pub fn overlap(&self, other: &Span) -> usize {
        let start = cmp::max(self.start, other.start);
        let end = cmp::min(self.end, other.end);
        end.saturating_sub(start)
    }
    /// Same positions, label ignored.
    pub fn same_range(&self, other: &Span) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl TryFrom<(usize, usize, String)> for Span {
    type Error = SpanError;
    fn try_from(value: (usize, usize, String)) -> Result<Self, Self::Error> {
        Span::try_new(value.0, value.1, value.2)
    }
}

impl From<Span> for (usize, usize, String) {
    fn from(value: Span) -> Self {
        (value.start, value.end, value.label)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.start, self.end, self.label)
    }
}

/// The collection of spans of a single text, serialized under the `"entities"` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub entities: Vec<Span>,
}

impl Annotations {
    pub fn new(entities: Vec<Span>) -> Self {
        Self { entities }
    }
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

impl From<Vec<Span>> for Annotations {
    fn from(value: Vec<Span>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<Span> for Annotations {
    fn from_iter<T: IntoIterator<Item = Span>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
