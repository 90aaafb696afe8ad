/**
This modules gives a few tools to prettyprint the per-label metrics of an entity report and the
overall averages.
*/
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::cmp::PartialOrd;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// The reporter holds the exact-match metrics of every entity label and the overall averages. It
/// can be displayed as if it was a dataframe and it can be consumed to obtain a `HashSet`
/// containing the metrics. The reporter is built with the `entity_report` function.
///
/// # Example
///
/// ```rust
/// use pii_anon::{entity_report, Annotations, DivByZeroStrat, Span};
///
/// let truth = vec![Annotations::new(vec![
///     Span::try_new(0, 2, "PER").unwrap(),
///     Span::try_new(4, 5, "LOC").unwrap(),
/// ])];
/// let pred = vec![Annotations::new(vec![
///     Span::try_new(0, 2, "PER").unwrap(),
///     Span::try_new(4, 6, "LOC").unwrap(),
/// ])];
///
/// let reporter = entity_report(&truth, &pred, DivByZeroStrat::ReplaceBy0).unwrap();
///
/// let expected_report = "Label, Precision, Recall, Fscore, Support
/// Overall_Weighted, 0.5, 0.5, 0.5, 2
/// Overall_Micro, 0.5, 0.5, 0.5, 2
/// Overall_Macro, 0.5, 0.5, 0.5, 2
/// PER, 1, 1, 1, 1
/// LOC, 0, 0, 0, 1\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Reporter {
    pub(crate) labels: BTreeSet<LabelMetricsInner>,
}

/// By converting the reporter into a `HashSet` of `LabelMetrics`, you lose the ordering used when
/// printing. If you mean to consume the data without prettyprinting it, this is not a problem.
impl From<Reporter> for HashSet<LabelMetrics> {
    fn from(value: Reporter) -> Self {
        value.labels.into_iter().map(LabelMetrics::from).collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: LabelMetricsInner) -> bool {
        self.labels.insert(metrics)
    }
    /// Metrics of a single label, or of an overall average when given `Overall_Micro`,
    /// `Overall_Macro` or `Overall_Weighted`.
    pub fn get(&self, label: &str) -> Option<LabelMetrics> {
        self.labels
            .iter()
            .find(|m| m.label == label)
            .cloned()
            .map(LabelMetrics::from)
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Label, Precision, Recall, Fscore, Support")?;
        for v in self.labels.iter().rev() {
            //Must call `.rev()` because the iter is in ascending order
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Datastructure holding metrics about a given label.
pub struct LabelMetrics {
    /// The label, such as "PER", "LOC", "FNR", etc.
    pub label: String,
    /// The average used to compute this label's metrics
    pub average: Average,
    /// Precision metric
    pub precision: f32,
    /// Recall metric
    pub recall: f32,
    /// Fscore metric
    pub fscore: f32,
    /// Support metric
    pub support: usize,
}

impl Hash for LabelMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for LabelMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.average == other.average
    }
}
impl Eq for LabelMetrics {}

impl From<LabelMetricsInner> for LabelMetrics {
    fn from(value: LabelMetricsInner) -> Self {
        Self {
            label: value.label,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// Row of the reporter. Rows are ordered by their average first (per-label rows before the
/// overall rows) and by their label name second.
pub(crate) struct LabelMetricsInner {
    pub(crate) label: String,
    pub(crate) average: Average,
    pub(crate) precision: f32,
    pub(crate) recall: f32,
    pub(crate) fscore: f32,
    pub(crate) support: usize,
}
impl PartialEq for LabelMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.average == other.average
    }
}
impl Eq for LabelMetricsInner {}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for LabelMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.average.cmp(&other.average) {
            std::cmp::Ordering::Equal => self.label.partial_cmp(&other.label),
            v => Some(v),
        }
    }
}

impl Ord for LabelMetricsInner {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.average.cmp(&other.average) {
            std::cmp::Ordering::Equal => self.label.cmp(&other.label),
            v => v,
        }
    }
}

impl LabelMetricsInner {
    pub(crate) fn new_label(
        label: &str,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
    ) -> Self {
        LabelMetricsInner {
            label: String::from(label),
            average: Average::None,
            precision,
            recall,
            fscore,
            support,
        }
    }
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
    ) -> Self {
        LabelMetricsInner {
            label: average.to_string(),
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// The LabelMetrics struct acts as a line in a dataframe when displayed.
impl Display for LabelMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.label, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging supported by this crate. &str can be parsed
/// to create an `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}
impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Error)]
#[error("Impossible to parse the string ({0}) into an Average")]
pub struct AverageParsingError(String);

/// Average implements ordering. This is used during the reporting to represent the rows with an
/// `average` other than `None` as `Greater` than those with `None`.
#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for Average {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Average {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Self::None, Self::None) => std::cmp::Ordering::Equal,
            (Self::None, _) => std::cmp::Ordering::Less,
            (_, Self::None) => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        }
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize, Sequence)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}
