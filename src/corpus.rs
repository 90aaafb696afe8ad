//! Loading annotated documents from JSON lines files.
use crate::span::{Annotations, Span};
use serde::{Deserialize, Serialize};
use serde_jsonlines::json_lines;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Line {line} of {} is not a valid record: {source}", path.display())]
    Record {
        path: PathBuf,
        line: usize,
        source: std::io::Error,
    },
}

/// A raw text together with its ground-truth annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord", into = "DocumentRecord")]
pub struct Document {
    pub text: String,
    pub truth: Annotations,
}

impl Document {
    pub fn new(text: impl Into<String>, truth: Annotations) -> Self {
        Self {
            text: text.into(),
            truth,
        }
    }
}

/// The two accepted layouts of a document line: `{"text": .., "entities": [..]}`, or the training
/// layout `["text", {"entities": [..]}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DocumentRecord {
    Object { text: String, entities: Vec<Span> },
    Tuple(String, Annotations),
}

impl From<DocumentRecord> for Document {
    fn from(value: DocumentRecord) -> Self {
        match value {
            DocumentRecord::Object { text, entities } => Self::new(text, Annotations::new(entities)),
            DocumentRecord::Tuple(text, truth) => Self::new(text, truth),
        }
    }
}

impl From<Document> for DocumentRecord {
    fn from(value: Document) -> Self {
        DocumentRecord::Object {
            text: value.text,
            entities: value.truth.entities,
        }
    }
}

/// A document whose predictions were computed beforehand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(default)]
    pub text: String,
    pub truth: Annotations,
    pub pred: Annotations,
}

fn read_lines<T, P>(path: P) -> Result<Vec<T>, CorpusError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let lines = json_lines::<T, _>(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = lines
        .enumerate()
        .map(|(i, r)| {
            r.map_err(|source| CorpusError::Record {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect::<Result<Vec<T>, CorpusError>>()?;
    info!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

/// Reads one document per line.
pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Document>, CorpusError> {
    read_lines(path)
}

/// Reads one `{"text", "truth", "pred"}` record per line.
pub fn load_scored_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<ScoredRecord>, CorpusError> {
    read_lines(path)
}
