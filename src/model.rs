//! The anonymization model: a base entity recognizer extended with pattern and list stages.
use crate::anonymizer::{anonymize, Redaction};
use crate::config::ScorerConfig;
use crate::corpus::Document;
use crate::metrics::{entity_report, predict_all, score_corpus, DivByZeroStrat, Scores, ScoringError};
use crate::pipeline::{Pipeline, PipelineError};
use crate::recognizer::{Doc, Entity, Gazetteer, PatternRecognizer, Recognizer, RecognizerError};
use crate::reporter::Reporter;
use crate::span::Annotations;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Name of the stage holding the base recognizer.
pub const NER_STAGE: &str = "ner";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Finds personal information in texts and rewrites it.
///
/// The pipeline runs the pattern stage first, then the base recognizer, then the list stage. An
/// entity overlapping one found by an earlier stage is dropped.
#[derive(Debug)]
pub struct PiiModel {
    pipeline: Pipeline,
}

impl PiiModel {
    /// Wraps the base recognizer, registered as the `ner` stage.
    pub fn new(base: Box<dyn Recognizer>) -> Self {
        let mut pipeline = Pipeline::new();
        // The pipeline is empty, no name can clash
        let _ = pipeline.push(NER_STAGE, base);
        Self { pipeline }
    }

    /// Adds the pattern stage before the base recognizer and, when given, the list stage after
    /// it.
    pub fn add_patterns(
        &mut self,
        patterns: PatternRecognizer,
        gazetteer: Option<Gazetteer>,
    ) -> Result<(), ModelError> {
        let name = String::from(patterns.name());
        self.pipeline
            .add_before(NER_STAGE, name, Box::new(patterns))?;
        if let Some(gazetteer) = gazetteer {
            let name = String::from(gazetteer.name());
            self.pipeline
                .add_after(NER_STAGE, name, Box::new(gazetteer))?;
        }
        info!(stages = ?self.pipeline.names(), "pipeline updated");
        Ok(())
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Tokenizes the text.
    pub fn get_doc<'a>(&self, text: &'a str) -> Doc<'a> {
        Doc::new(text)
    }

    /// Entities of the text, sorted by position.
    pub fn predict(&self, text: &str) -> Result<Vec<Entity>, ModelError> {
        let doc = self.get_doc(text);
        let entities = self.pipeline.run(&doc)?;
        for e in entities.iter() {
            debug!(label = e.label(), text = e.text(text), "found entity");
        }
        Ok(entities)
    }

    /// The text with every entity written as `[text](LABEL)`.
    pub fn highlight(&self, text: &str) -> Result<String, ModelError> {
        let entities = self.predict(text)?;
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for e in entities.iter() {
            let range = e.offsets.clone();
            // Offsets come from the recognizers and may overlap or miss char boundaries
            let (Some(before), Some(covered)) =
                (text.get(cursor..range.start), text.get(range.clone()))
            else {
                debug!(entity = %e, "skipping entity outside the text or overlapping");
                continue;
            };
            out.push_str(before);
            out.push_str(&format!("[{}]({})", covered, e.label()));
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }

    pub fn disable_ner(&mut self) -> Result<(), ModelError> {
        Ok(self.pipeline.disable(NER_STAGE)?)
    }

    pub fn enable_ner(&mut self) -> Result<(), ModelError> {
        Ok(self.pipeline.enable(NER_STAGE)?)
    }

    /// Detects the entities of `text` and rewrites them.
    pub fn replace<R: Rng + ?Sized>(
        &self,
        text: &str,
        redaction: &Redaction,
        rng: &mut R,
    ) -> Result<String, ModelError> {
        let entities = self.predict(text)?;
        Ok(anonymize(text, &entities, redaction, rng))
    }

    /// Runs the model on every document and scores the predictions against the ground truth.
    pub fn test(&self, docs: &[Document], config: &ScorerConfig) -> Result<Scores, ModelError> {
        Ok(score_corpus(docs, &self.pipeline, config)?)
    }

    /// Exact-match report per label of the model's predictions.
    pub fn entity_report(
        &self,
        docs: &[Document],
        zero_division: DivByZeroStrat,
    ) -> Result<Reporter, ModelError> {
        let preds = predict_all(docs, &self.pipeline)?;
        let truths: Vec<Annotations> = docs.iter().map(|d| d.truth.clone()).collect();
        Ok(entity_report(&truths, &preds, zero_division)?)
    }
}
