//! This library finds personal information (names, places, identity numbers, phone numbers,
//! e-mail addresses, bank accounts) in free text and anonymizes it. A statistical entity
//! recognizer is supplied by the caller; the crate adds pattern and list recognizers around it,
//! rewrites the detected entities, and scores predictions against annotated documents.
//!
//! The scoring functions are the heart of the crate. `score_predictions` gives a lenient custom
//! score, crediting overlapping and contained spans, along with the binary F1 score of the
//! hit/miss decisions. `entity_report` gives exact-match metrics per label.
//!
//! # Example
//!
//! ```rust
//! use pii_anon::{PatternRecognizer, PiiModel, Redaction};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let patterns = PatternRecognizer::with_defaults().unwrap();
//! let mut model = PiiModel::new(Box::new(PatternRecognizer::new([("PER", r"\bOla\b")]).unwrap()));
//! model.add_patterns(patterns, None).unwrap();
//!
//! let redacted = model
//!     .replace("Ola har fnr 01019012345", &Redaction::Label, &mut StdRng::seed_from_u64(0))
//!     .unwrap();
//! assert_eq!(redacted, "<PER> har fnr <FNR>");
//! ```

mod anonymizer;
mod config;
mod corpus;
mod metrics;
mod model;
mod pipeline;
mod recognizer;
mod reporter;
mod span;

pub use anonymizer::{anonymize, Pseudonyms, Redaction, REMOVED};
pub use config::{
    Alignment, NoEntitiesPolicy, ParsingAlignmentError, ScorerConfig, ScorerConfigBuilder,
};
pub use corpus::{load_jsonl, load_scored_jsonl, CorpusError, Document, ScoredRecord};
pub use metrics::{
    compare, entity_report, f1_score, fbeta_score, score_corpus, score_predictions,
    ArrayNotUniqueOrEmpty, Comparison, DivByZeroStrat, DivisionByZeroError,
    ParsingDivisionByZeroStrategyError, PrecisionRecallFScoreTrueSum, Scores, ScoringError,
};
pub use model::{ModelError, PiiModel, NER_STAGE};
pub use pipeline::{Pipeline, PipelineError};
pub use recognizer::{Doc, Entity, Gazetteer, PatternRecognizer, Recognizer, RecognizerError};
pub use reporter::{Average, AverageParsingError, LabelMetrics, OverallAverage, Reporter};
pub use span::{Annotations, Span, SpanError};
