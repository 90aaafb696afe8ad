//! Ordered composition of recognizers. Each stage sees the same document; the entities of an
//! earlier stage take precedence over overlapping entities of a later stage.
use crate::recognizer::{drop_overlapping, Doc, Entity, Recognizer, RecognizerError};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No stage named {0} in the pipeline")]
    UnknownStage(String),
    #[error("A stage named {0} is already in the pipeline")]
    DuplicateStage(String),
}

struct Stage {
    name: String,
    recognizer: Box<dyn Recognizer>,
    enabled: bool,
}

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| (&s.name, s.enabled)))
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| PipelineError::UnknownStage(String::from(name)))
    }

    fn insert(
        &mut self,
        index: usize,
        name: String,
        recognizer: Box<dyn Recognizer>,
    ) -> Result<(), PipelineError> {
        if self.stages.iter().any(|s| s.name == name) {
            return Err(PipelineError::DuplicateStage(name));
        }
        debug!(stage = name.as_str(), index, "adding pipeline stage");
        self.stages.insert(
            index,
            Stage {
                name,
                recognizer,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Appends a stage, with the lowest precedence.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        recognizer: Box<dyn Recognizer>,
    ) -> Result<(), PipelineError> {
        self.insert(self.stages.len(), name.into(), recognizer)
    }

    pub fn add_before(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        recognizer: Box<dyn Recognizer>,
    ) -> Result<(), PipelineError> {
        let index = self.position(anchor)?;
        self.insert(index, name.into(), recognizer)
    }

    pub fn add_after(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        recognizer: Box<dyn Recognizer>,
    ) -> Result<(), PipelineError> {
        let index = self.position(anchor)?;
        self.insert(index + 1, name.into(), recognizer)
    }

    /// Removes a stage and hands its recognizer back.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Recognizer>, PipelineError> {
        let index = self.position(name)?;
        Ok(self.stages.remove(index).recognizer)
    }

    pub fn disable(&mut self, name: &str) -> Result<(), PipelineError> {
        let index = self.position(name)?;
        self.stages[index].enabled = false;
        Ok(())
    }

    pub fn enable(&mut self, name: &str) -> Result<(), PipelineError> {
        let index = self.position(name)?;
        self.stages[index].enabled = true;
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> Result<bool, PipelineError> {
        Ok(self.stages[self.position(name)?].enabled)
    }

    /// Stage names, in execution order, disabled stages included.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Runs the enabled stages and merges their entities, sorted by position.
    pub fn run(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        let mut all = Vec::new();
        for stage in self.stages.iter().filter(|s| s.enabled) {
            let mut found = stage.recognizer.recognize(doc)?;
            trace!(stage = stage.name.as_str(), found = found.len(), "stage done");
            // Sorted inside a stage, so that its own overlaps resolve left to right
            found.sort_by_key(|e| (e.span.start(), std::cmp::Reverse(e.span.end())));
            all.extend(found);
        }
        let mut merged = drop_overlapping(all);
        merged.sort_by_key(|e| e.span.start());
        Ok(merged)
    }
}

impl Recognizer for Pipeline {
    fn name(&self) -> &str {
        "pipeline"
    }
    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        self.run(doc)
    }
}
