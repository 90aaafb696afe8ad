/*
 * This modules contains the `ScorerConfig` struct, which implements the default trait, and the
 * builder used to customize it. The config is passed to `score_predictions`, `score_corpus` and
 * `PiiModel::test` to simplify their arguments.
*/
use crate::metrics::DivByZeroStrat;
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;

/// How are the predicted spans of a document paired with its true spans?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alignment {
    /// Only the first predicted span is compared to the first true span. The remaining spans of
    /// the document are ignored. Keeps results comparable with scores produced before multi-span
    /// alignment existed.
    #[default]
    FirstPair,
    /// Every true span, in order, is paired with the unused predicted span sharing the most
    /// tokens with it. Unpaired spans count as misses or false alarms.
    Greedy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse {0} into an `Alignment`")]
pub struct ParsingAlignmentError(String);

impl FromStr for Alignment {
    type Err = ParsingAlignmentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_ref() {
            "firstpair" | "first" | "positional" => Ok(Alignment::FirstPair),
            "greedy" => Ok(Alignment::Greedy),
            _ => Err(ParsingAlignmentError(String::from(s))),
        }
    }
}

/// What to do when entities were seen but no pair of spans was ever compared, leaving the
/// custom score with a zero denominator. A corpus without any entity is always an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoEntitiesPolicy {
    /// The custom score is 0.
    #[default]
    ReplaceBy0,
    /// Returns `ScoringError::NoEntities`.
    ReturnError,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of the scoring functions. It implements the default
/// trait.
pub struct ScorerConfig {
    /// How spans are paired inside a document.
    pub(crate) alignment: Alignment,
    /// Policy for a custom score without any compared pair.
    pub(crate) no_entities: NoEntitiesPolicy,
    /// Policy for the precision, recall and F1 denominators.
    pub(crate) zero_division: DivByZeroStrat,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::FirstPair,
            no_entities: NoEntitiesPolicy::ReplaceBy0,
            zero_division: DivByZeroStrat::ReplaceBy0,
        }
    }
}

impl ScorerConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
    pub fn no_entities(&self) -> NoEntitiesPolicy {
        self.no_entities
    }
    pub fn zero_division(&self) -> DivByZeroStrat {
        self.zero_division
    }
}

impl Display for ScorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Span alignment: {:?}\n Policy when no pair was compared: {:?}\n Strategy when encountering a division by zero: {:?}",
            self.alignment, self.no_entities, self.zero_division
        )
    }
}

/// This builder can be used to build and customize a `ScorerConfig` structure.
#[derive(Debug, Clone)]
pub struct ScorerConfigBuilder {
    alignment: LeftOrRight<Alignment, Alignment>,
    no_entities: LeftOrRight<NoEntitiesPolicy, NoEntitiesPolicy>,
    zero_division: LeftOrRight<DivByZeroStrat, DivByZeroStrat>,
}

impl Default for ScorerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorerConfigBuilder {
    pub fn new() -> Self {
        let defaults = ScorerConfig::default();
        Self {
            alignment: LeftOrRight::Right(defaults.alignment),
            no_entities: LeftOrRight::Right(defaults.no_entities),
            zero_division: LeftOrRight::Right(defaults.zero_division),
        }
    }
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = LeftOrRight::Left(alignment);
        self
    }
    pub fn no_entities(mut self, policy: NoEntitiesPolicy) -> Self {
        self.no_entities = LeftOrRight::Left(policy);
        self
    }
    pub fn division_by_zero(mut self, division_by_zero: DivByZeroStrat) -> Self {
        self.zero_division = LeftOrRight::Left(division_by_zero);
        self
    }
    /// True when the setter of at least one field was called.
    pub fn is_customized(&self) -> bool {
        self.alignment.is_left() || self.no_entities.is_left() || self.zero_division.is_left()
    }
    pub fn build(self) -> ScorerConfig {
        ScorerConfig::from(self)
    }
}

impl From<ScorerConfigBuilder> for ScorerConfig {
    fn from(value: ScorerConfigBuilder) -> Self {
        Self {
            alignment: value.alignment.into_inner(),
            no_entities: value.no_entities.into_inner(),
            zero_division: value.zero_division.into_inner(),
        }
    }
}
