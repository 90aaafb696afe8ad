//! List-based recognizer using an Aho-Corasick automaton. Terms, such as first names or the
//! names of municipalities, are matched in linear time against the whole text.
use super::{drop_overlapping, Doc, Entity, Recognizer, RecognizerError};
use aho_corasick::{AhoCorasick, MatchKind};
use std::path::Path;
use tracing::info;

/// Matches fixed terms. A match is only accepted when it starts and ends on token boundaries, so
/// that `Per` is not found inside `Persen`. Longer terms win over the terms they overlap, so
/// "Nord-Odal" is found rather than "Nord".
#[derive(Debug, Clone)]
pub struct Gazetteer {
    automaton: AhoCorasick,
    /// Label of every pattern, by pattern index
    labels: Vec<String>,
    terms: Vec<String>,
}

impl Gazetteer {
    pub fn new<L, T, I>(terms: I) -> Result<Self, RecognizerError>
    where
        L: Into<String>,
        T: Into<String>,
        I: IntoIterator<Item = (L, T)>,
    {
        let (labels, terms): (Vec<String>, Vec<String>) = terms
            .into_iter()
            .map(|(l, t)| (l.into(), t.into()))
            .filter(|(_, t)| !t.trim().is_empty())
            .unzip();
        Self::build(labels, terms)
    }

    fn build(labels: Vec<String>, terms: Vec<String>) -> Result<Self, RecognizerError> {
        // Standard semantics, so that every occurrence can be reported by `find_overlapping_iter`
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&terms)?;
        Ok(Self {
            automaton,
            labels,
            terms,
        })
    }

    /// Reads the terms of one CSV column and labels them all with `label`.
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        column: &str,
        label: &str,
    ) -> Result<Self, RecognizerError> {
        let terms = read_csv_column(path, column)?;
        info!(label, terms = terms.len(), "loaded term list");
        Self::new(terms.into_iter().map(|t| (label, t)))
    }

    /// Adds terms and rebuilds the automaton.
    pub fn extend<L, T, I>(&mut self, terms: I) -> Result<(), RecognizerError>
    where
        L: Into<String>,
        T: Into<String>,
        I: IntoIterator<Item = (L, T)>,
    {
        let mut labels = std::mem::take(&mut self.labels);
        let mut all_terms = std::mem::take(&mut self.terms);
        for (l, t) in terms {
            let t = t.into();
            if !t.trim().is_empty() {
                labels.push(l.into());
                all_terms.push(t);
            }
        }
        *self = Self::build(labels, all_terms)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Values of a named column of a CSV file with a header row. Surrounding spaces are trimmed and
/// empty values skipped.
pub(crate) fn read_csv_column<P: AsRef<Path>>(
    path: P,
    column: &str,
) -> Result<Vec<String>, RecognizerError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| RecognizerError::MissingColumn {
            column: String::from(column),
            path: path.to_path_buf(),
        })?;
    let mut values = Vec::new();
    for record in reader.records() {
        if let Some(value) = record?.get(index).map(str::trim) {
            if !value.is_empty() {
                values.push(String::from(value));
            }
        }
    }
    Ok(values)
}

impl Recognizer for Gazetteer {
    fn name(&self) -> &str {
        "list_matcher"
    }

    /// Every occurrence on token boundaries is a candidate. Among overlapping candidates the
    /// leftmost wins, then the longest, then the term listed first.
    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        let mut candidates = Vec::new();
        for m in self.automaton.find_overlapping_iter(doc.text()) {
            let (Some(start), Some(last)) = (
                doc.token_starting_at(m.start()),
                doc.token_ending_at(m.end()),
            ) else {
                continue;
            };
            let pattern = m.pattern().as_usize();
            candidates.push((pattern, doc.entity(start, last + 1, &self.labels[pattern])?));
        }
        candidates.sort_by_key(|(pattern, e)| {
            (e.span.start(), std::cmp::Reverse(e.span.end()), *pattern)
        });
        Ok(drop_overlapping(
            candidates.into_iter().map(|(_, e)| e).collect(),
        ))
    }
}
