//! The recognizer seam. A recognizer finds entities in a `Doc` and returns them as token spans
//! together with their byte offsets. The statistical entity recognizer is supplied by the caller;
//! this crate adds the pattern (regex) and list (gazetteer) recognizers.
use crate::span::{Span, SpanError};
use regex::Regex;
use std::{fmt::Display, ops::Range, path::PathBuf, sync::OnceLock};
use thiserror::Error;

mod gazetteer;
mod pattern;

pub use gazetteer::Gazetteer;
pub(crate) use gazetteer::read_csv_column;
pub use pattern::PatternRecognizer;

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    // Word runs, or any single character which is neither a word character nor a space.
    TOKEN_REGEX.get_or_init(|| Regex::new(r"\w+|[^\w\s]").expect("valid token pattern"))
}

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Invalid span: {0}")]
    Span(#[from] SpanError),
    #[error("Could not build the term automaton: {0}")]
    Automaton(#[from] aho_corasick::BuildError),
    #[error("Could not read the term list: {0}")]
    Csv(#[from] csv::Error),
    #[error("Column {column} not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("Token range {start}..{end} is out of bounds for a document of {len} tokens")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("Recognizer {name} failed: {reason}")]
    Failed { name: String, reason: String },
}

/// A text split into tokens. Tokens are stored as byte ranges into the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc<'a> {
    text: &'a str,
    tokens: Vec<Range<usize>>,
}

impl<'a> Doc<'a> {
    pub fn new(text: &'a str) -> Self {
        let tokens = token_regex().find_iter(text).map(|m| m.range()).collect();
        Self { text, tokens }
    }
    pub fn text(&self) -> &'a str {
        self.text
    }
    pub fn tokens(&self) -> &[Range<usize>] {
        &self.tokens
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn token_text(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).and_then(|r| self.text.get(r.clone()))
    }

    /// Builds an entity from token indices.
    pub fn entity(&self, start: usize, end: usize, label: &str) -> Result<Entity, RecognizerError> {
        let span = Span::try_new(start, end, label)?;
        if end > self.tokens.len() {
            return Err(RecognizerError::OutOfBounds {
                start,
                end,
                len: self.tokens.len(),
            });
        }
        let offsets = self.tokens[start].start..self.tokens[end - 1].end;
        Ok(Entity { span, offsets })
    }

    /// Expands a byte range to the tokens it touches and returns the covering entity. Returns
    /// `None` when the range does not touch any token.
    pub fn entity_for_bytes(
        &self,
        bytes: Range<usize>,
        label: &str,
    ) -> Result<Option<Entity>, RecognizerError> {
        let start = self.tokens.partition_point(|t| t.end <= bytes.start);
        let end = self.tokens.partition_point(|t| t.start < bytes.end);
        if start >= end {
            return Ok(None);
        }
        self.entity(start, end, label).map(Some)
    }

    /// Token index starting exactly at `byte`, if any.
    pub(crate) fn token_starting_at(&self, byte: usize) -> Option<usize> {
        self.tokens.binary_search_by_key(&byte, |t| t.start).ok()
    }

    /// Token index ending exactly at `byte`, if any.
    pub(crate) fn token_ending_at(&self, byte: usize) -> Option<usize> {
        self.tokens.binary_search_by_key(&byte, |t| t.end).ok()
    }
}

/// A detected entity: its token span and the byte offsets of the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    pub span: Span,
    pub offsets: Range<usize>,
}

impl Entity {
    pub fn label(&self) -> &str {
        self.span.label()
    }
    /// The covered text. Empty when the offsets do not belong to `text`.
    pub fn text<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.offsets.clone()).unwrap_or_default()
    }
    /// True when the two entities share at least one token.
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.span.overlap(&other.span) > 0
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}..{}]",
            self.span, self.offsets.start, self.offsets.end
        )
    }
}

/// Anything able to find entities in a document. The wrapped statistical recognizer implements
/// this trait on the caller's side.
pub trait Recognizer: Send + Sync {
    /// Name used in logs and as the default pipeline stage name.
    fn name(&self) -> &str;
    /// Entities found in the document, in any order.
    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError>;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        (**self).recognize(doc)
    }
}

/// Keeps the entities that do not overlap an already accepted one, in the given order.
pub(crate) fn drop_overlapping(entities: Vec<Entity>) -> Vec<Entity> {
    let mut kept: Vec<Entity> = Vec::with_capacity(entities.len());
    for e in entities {
        if !kept.iter().any(|k| k.overlaps(&e)) {
            kept.push(e);
        }
    }
    kept
}
