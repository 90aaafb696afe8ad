/**
This module compares predicted entity spans with ground-truth spans. It computes the lenient
custom score (partial credit for overlapping and contained spans), the binary F1 score of the
hit/miss decisions, and the exact-match per-label report.
*/
use crate::config::{Alignment, NoEntitiesPolicy, ScorerConfig};
use crate::corpus::Document;
use crate::recognizer::{Doc, Recognizer, RecognizerError};
use crate::reporter::{Average, LabelMetricsInner, OverallAverage, Reporter};
use crate::span::{Annotations, Span};
use ahash::{AHashMap, AHashSet};
use enum_iterator::all;
use itertools::{multizip, EitherOrBoth, Itertools};
use ndarray::{array, Array1, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use num::{Float, NumCast};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt::Display, str::FromStr};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("This array contains more than one element or is empty. It has length: {0}. Cannot call `item` on it")]
pub struct ArrayNotUniqueOrEmpty(usize);

trait ItemArrayExt<Output> {
    /// Returns the element out of the Array. Can return an error if the array is empty of if the
    /// array has a length superior to 1.
    fn item(&self) -> Result<Output, ArrayNotUniqueOrEmpty>;
}

impl<F: Copy> ItemArrayExt<F> for Array1<F> {
    fn item(&self) -> Result<F, ArrayNotUniqueOrEmpty> {
        match self.as_slice() {
            Some([value]) => Ok(*value),
            _ => Err(ArrayNotUniqueOrEmpty(self.len())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// How do we handle a zero denominator when computing precision, recall and F-score? The result
/// can be replaced by 0 (the usual choice), by 1, or the computation can stop with an error. The
/// error strategy is useful if you believe there should be no 0 in the denominator.
pub enum DivByZeroStrat {
    /// Returns 1 when the denominator is 0
    ReplaceBy1,
    /// Returns an error
    ReturnError,
    /// Returns 0 when the denominator is 0
    #[default]
    ReplaceBy0,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse the {0} into a `DivByZeroStrat`")]
pub struct ParsingDivisionByZeroStrategyError(String);

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "replaceby1" | "replacebyone" => Ok(DivByZeroStrat::ReplaceBy1),
            "replaceby0" | "replacebyzero" => Ok(DivByZeroStrat::ReplaceBy0),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Encountered division by zero")]
pub struct DivisionByZeroError;

#[derive(Debug, Error)]
/// Enum error encompassing the failures that can happen while scoring predictions.
pub enum ScoringError {
    #[error("No entities to score: neither the ground truth nor the predictions contain a span")]
    NoEntities,
    #[error("Beta value is negative")]
    BetaNotPositive,
    #[error("Beta squared cannot be represented as an f32")]
    BetaNotRepresentable,
    #[error("Inconsistent length between two lists. The ground truth has length {0}, the predictions have length {1}")]
    InconsistentLength(usize, usize),
    #[error(transparent)]
    DivisionByZero(#[from] DivisionByZeroError),
    #[error(transparent)]
    InputError(#[from] MultiInputError),
    #[error("Found an empty array in {0}")]
    EmptyArray(String),
    #[error(transparent)]
    EmptyOrNotUnique(#[from] ArrayNotUniqueOrEmpty),
    #[error("The recognizer failed: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Relationship between a true span and the predicted span it is compared to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// Same start and same end.
    Exact,
    /// One boundary of the true span falls strictly inside the predicted span. Credited with the
    /// predicted length divided by the true length.
    Overlap { ratio: f32 },
    /// Neither exact nor overlapping, and the prediction is shorter than the truth.
    Contained,
    /// Neither exact nor overlapping, and the prediction is at least as long as the truth.
    Covering,
}

impl Comparison {
    /// Partial credit given to the comparison.
    pub fn score(&self) -> f32 {
        match self {
            Self::Exact => 1.0,
            Self::Overlap { ratio } => *ratio,
            Self::Contained => 1.0,
            Self::Covering => 0.5,
        }
    }
    /// The (true, predicted) binary labels recorded for the F1 score.
    pub fn labels(&self) -> (u8, u8) {
        match self {
            Self::Exact | Self::Covering => (1, 1),
            Self::Overlap { .. } | Self::Contained => (1, 0),
        }
    }
}

/// Classifies a pair of spans. Labels are not compared.
///
/// The overlap test is asymmetric and uses strict inequalities: either the end of the truth
/// falls strictly inside the prediction, or the start of the truth does.
pub fn compare(truth: &Span, pred: &Span) -> Comparison {
    let (t_start, t_end) = (truth.start(), truth.end());
    let (p_start, p_end) = (pred.start(), pred.end());
    if p_start == t_start && p_end == t_end {
        Comparison::Exact
    } else if (p_start < t_end && t_end < p_end) || (p_end > t_start && t_start > p_start) {
        Comparison::Overlap {
            ratio: pred.len() as f32 / truth.len() as f32,
        }
    } else if pred.len() < truth.len() {
        Comparison::Contained
    } else {
        Comparison::Covering
    }
}

/// Output of the scoring functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// Accumulated partial credit divided by the number of compared entities.
    pub custom: f32,
    /// Binary F1 score of the hit/miss decisions.
    pub f1: f32,
    /// Number of compared entities, the denominator of `custom`.
    pub entities: usize,
    /// Number of binary decisions behind `f1`.
    pub decisions: usize,
}

impl Display for Scores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Custom score: {}, F1: {}, Entities: {}, Decisions: {}",
            self.custom, self.f1, self.entities, self.decisions
        )
    }
}

/// Running totals of a scoring pass.
#[derive(Debug, Default, Clone, PartialEq)]
struct Tally {
    score: f32,
    entities: usize,
    y_true: Vec<u8>,
    y_pred: Vec<u8>,
}

impl Tally {
    fn record(&mut self, comparison: Comparison) {
        let (t, p) = comparison.labels();
        self.score += comparison.score();
        self.entities += 1;
        self.push(t, p);
    }
    fn push(&mut self, t: u8, p: u8) {
        self.y_true.push(t);
        self.y_pred.push(p);
    }
    fn push_n(&mut self, t: u8, p: u8, n: usize) {
        self.y_true.extend(std::iter::repeat(t).take(n));
        self.y_pred.extend(std::iter::repeat(p).take(n));
    }
    fn document(&mut self, truth: &[Span], pred: &[Span], alignment: Alignment) {
        match (truth.is_empty(), pred.is_empty()) {
            (true, true) => {}
            (false, true) => self.push_n(1, 0, truth.len()),
            (true, false) => self.push_n(0, 1, pred.len()),
            (false, false) => match alignment {
                Alignment::FirstPair => self.record(compare(&truth[0], &pred[0])),
                Alignment::Greedy => {
                    for pair in align_greedy(truth, pred) {
                        match pair {
                            EitherOrBoth::Both(t, p) => self.record(compare(t, p)),
                            EitherOrBoth::Left(_) => {
                                self.entities += 1;
                                self.push(1, 0);
                            }
                            EitherOrBoth::Right(_) => self.push(0, 1),
                        }
                    }
                }
            },
        }
    }
}

/// Pairs every true span, in list order, with the unused predicted span sharing the most tokens
/// with it. Ties go to the earliest prediction. Spans left without a partner are returned as
/// `Left` (truth) or `Right` (prediction), the unused predictions last.
fn align_greedy<'a>(truth: &'a [Span], pred: &'a [Span]) -> Vec<EitherOrBoth<&'a Span, &'a Span>> {
    let mut used = vec![false; pred.len()];
    let mut pairs = Vec::with_capacity(truth.len() + pred.len());
    for t in truth {
        let mut best: Option<(usize, usize)> = None;
        for (i, p) in pred.iter().enumerate() {
            if used[i] {
                continue;
            }
            let overlap = t.overlap(p);
            if overlap > 0 && best.map_or(true, |(_, o)| overlap > o) {
                best = Some((i, overlap));
            }
        }
        match best {
            Some((i, _)) => {
                used[i] = true;
                pairs.push(EitherOrBoth::Both(t, &pred[i]));
            }
            None => pairs.push(EitherOrBoth::Left(t)),
        }
    }
    pairs.extend(
        pred.iter()
            .zip(used)
            .filter(|(_, u)| !u)
            .map(|(p, _)| EitherOrBoth::Right(p)),
    );
    pairs
}

/// One of the main entrypoints of the crate. Compares the predicted spans of every document with
/// its ground-truth spans and returns the custom score and the binary F1 score.
///
/// Documents are paired by position. When one list is longer than the other, every extra
/// document counts as a single miss (extra truth) or a single false alarm (extra prediction).
///
/// * `truths`: Ground-truth annotations, one per document
/// * `preds`: Predicted annotations, one per document
/// * `config`: Alignment and division-by-zero policies
///
/// # Example
/// ```rust
/// use pii_anon::{score_predictions, Annotations, ScorerConfig, Span};
///
/// let truth = vec![Annotations::new(vec![Span::try_new(0, 4, "PER").unwrap()])];
/// let pred = vec![Annotations::new(vec![Span::try_new(2, 6, "PER").unwrap()])];
/// let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
/// assert_eq!(scores.custom, 1.0);
/// assert_eq!(scores.f1, 0.0);
/// ```
pub fn score_predictions(
    truths: &[Annotations],
    preds: &[Annotations],
    config: &ScorerConfig,
) -> Result<Scores, ScoringError> {
    if truths.len() != preds.len() {
        warn!(
            truths = truths.len(),
            predictions = preds.len(),
            "ground truth and predictions do not cover the same number of documents"
        );
    }
    let mut tally = Tally::default();
    for (i, pair) in truths.iter().zip_longest(preds.iter()).enumerate() {
        match pair {
            EitherOrBoth::Both(truth, pred) => {
                tally.document(&truth.entities, &pred.entities, config.alignment());
                debug!(
                    document = i,
                    truth = truth.len(),
                    predicted = pred.len(),
                    score = tally.score,
                    "compared document"
                );
            }
            EitherOrBoth::Left(_) => tally.push(1, 0),
            EitherOrBoth::Right(_) => tally.push(0, 1),
        }
    }
    finish(tally, config)
}

fn finish(tally: Tally, config: &ScorerConfig) -> Result<Scores, ScoringError> {
    if tally.y_true.is_empty() {
        warn!("no entities found in the ground truth nor in the predictions");
        return Err(ScoringError::NoEntities);
    }
    let custom = match (tally.entities, config.no_entities()) {
        (0, NoEntitiesPolicy::ReturnError) => return Err(ScoringError::NoEntities),
        (0, NoEntitiesPolicy::ReplaceBy0) => 0.0,
        (n, _) => tally.score / n as f32,
    };
    let f1 = f1_score(&tally.y_true, &tally.y_pred, config.zero_division())?;
    let scores = Scores {
        custom,
        f1,
        entities: tally.entities,
        decisions: tally.y_true.len(),
    };
    info!(
        custom = scores.custom,
        f1 = scores.f1,
        entities = scores.entities,
        "scored predictions"
    );
    Ok(scores)
}

/// Runs the recognizer on every document and scores its predictions against the ground truth.
pub fn score_corpus(
    docs: &[Document],
    recognizer: &dyn Recognizer,
    config: &ScorerConfig,
) -> Result<Scores, ScoringError> {
    let preds = predict_all(docs, recognizer)?;
    let truths: Vec<Annotations> = docs.iter().map(|d| d.truth.clone()).collect();
    score_predictions(&truths, &preds, config)
}

pub(crate) fn predict_all(
    docs: &[Document],
    recognizer: &dyn Recognizer,
) -> Result<Vec<Annotations>, RecognizerError> {
    docs.iter()
        .map(|d| {
            let doc = Doc::new(&d.text);
            let entities = recognizer.recognize(&doc)?;
            Ok(entities.into_iter().map(|e| e.span).collect())
        })
        .collect()
}

/// Binary F1 score of two label sequences, the positive class being `1`. The sequences are
/// compared element-wise; they must have the same length.
pub fn f1_score(
    y_true: &[u8],
    y_pred: &[u8],
    zero_division: DivByZeroStrat,
) -> Result<f32, ScoringError> {
    fbeta_score(y_true, y_pred, 1.0_f32, zero_division)
}

/// Binary F-beta score, `(1 + beta²) * P * R / (beta² * P + R)`. `beta < 1` favors precision,
/// `beta > 1` favors recall.
pub fn fbeta_score<F: Float>(
    y_true: &[u8],
    y_pred: &[u8],
    beta: F,
    zero_division: DivByZeroStrat,
) -> Result<f32, ScoringError> {
    if y_true.len() != y_pred.len() {
        return Err(ScoringError::InconsistentLength(y_true.len(), y_pred.len()));
    }
    let y_true = Array1::from_iter(y_true.iter().copied());
    let y_pred = Array1::from_iter(y_pred.iter().copied());
    let mut tp = 0usize;
    Zip::from(&y_true).and(&y_pred).for_each(|&t, &p| {
        if t == 1 && p == 1 {
            tp += 1
        }
    });
    let pred_sum = y_pred.iter().filter(|p| **p == 1).count();
    let true_sum = y_true.iter().filter(|t| **t == 1).count();
    let (_, _, f1, _) = precision_recall_fscore_support(
        array![pred_sum],
        array![tp],
        array![true_sum],
        beta,
        Average::None,
        zero_division,
    )?;
    Ok(f1.item()?)
}

/// Divides `numerator` by `denominator` element-wise, resolving zero denominators with the given
/// strategy.
fn prf_divide(
    numerator: &Array1<f32>,
    denominator: &Array1<f32>,
    zero_division: DivByZeroStrat,
) -> Result<Array1<f32>, DivisionByZeroError> {
    let zero_mask = denominator.mapv(|d| d == 0.0);
    if zero_mask.iter().any(|z| *z) && matches!(zero_division, DivByZeroStrat::ReturnError) {
        return Err(DivisionByZeroError);
    }
    let safe_denominator = denominator.mapv(|d| if d == 0.0 { 1.0 } else { d });
    let mut result = numerator / &safe_denominator;
    let fill = match zero_division {
        DivByZeroStrat::ReplaceBy1 => 1.0,
        _ => 0.0,
    };
    Zip::from(&mut result).and(&zero_mask).for_each(|r, &z| {
        if z {
            *r = fill
        }
    });
    Ok(result)
}

/// Type alias for the output of `precision_recall_fscore_support`: precision, recall, f-score
/// and support, one value per label or a single value for an average.
pub type PrecisionRecallFScoreTrueSum = (Array1<f32>, Array1<f32>, Array1<f32>, Array1<usize>);

/// Computes precision, recall, f-score and support from the predicted sum, the true positive sum
/// and the true sum of every label.
///
/// * `beta`: Value of the `beta` parameter of the fscore. `beta=1` for F1 and `beta=0.5` for F0.5.
/// * `average`: What type of average to use.
/// * `zero_division`: What to do in case of division by zero.
fn precision_recall_fscore_support<F: Float>(
    mut pred_sum: Array1<usize>,
    mut tp_sum: Array1<usize>,
    mut true_sum: Array1<usize>,
    beta: F,
    average: Average,
    zero_division: DivByZeroStrat,
) -> Result<PrecisionRecallFScoreTrueSum, ScoringError> {
    if beta.is_sign_negative() {
        return Err(ScoringError::BetaNotPositive);
    };
    if matches!(average, Average::Micro) {
        tp_sum = array![tp_sum.sum()];
        pred_sum = array![pred_sum.sum()];
        true_sum = array![true_sum.sum()];
    };
    let tp = tp_sum.mapv(|x| x as f32);
    let precision = prf_divide(&tp, &pred_sum.mapv(|x| x as f32), zero_division)?;
    let recall = prf_divide(&tp, &true_sum.mapv(|x| x as f32), zero_division)?;
    let beta2 = beta.powi(2);
    let f_score = if beta2.is_infinite() {
        recall.clone()
    } else {
        let beta2: f32 = <f32 as NumCast>::from(beta2)
            .filter(|b| b.is_finite())
            .ok_or(ScoringError::BetaNotRepresentable)?;
        // Zero only when precision and recall are both zero, and so is the numerator
        let denom = (&precision * beta2 + &recall).mapv(|v| if v == 0.0 { 1.0 } else { v });
        (&precision * &recall) * (beta2 + 1.0) / denom
    };
    match average {
        Average::None | Average::Micro => Ok((precision, recall, f_score, true_sum)),
        Average::Weighted => {
            let support = true_sum.sum();
            if support == 0 {
                return match zero_division {
                    DivByZeroStrat::ReturnError => Err(DivisionByZeroError.into()),
                    _ => Ok((array![0.0], array![0.0], array![0.0], array![0])),
                };
            }
            let weights = true_sum.mapv(|x| x as f32);
            Ok((
                array![precision.weighted_mean(&weights)?],
                array![recall.weighted_mean(&weights)?],
                array![f_score.weighted_mean(&weights)?],
                array![support],
            ))
        }
        Average::Macro => Ok((
            array![precision
                .mean()
                .ok_or_else(|| ScoringError::EmptyArray(String::from("precision")))?],
            array![recall
                .mean()
                .ok_or_else(|| ScoringError::EmptyArray(String::from("recall")))?],
            array![f_score
                .mean()
                .ok_or_else(|| ScoringError::EmptyArray(String::from("fscore")))?],
            array![true_sum.sum()],
        )),
    }
}

/// Spans grouped by label, identified by (document index, start, end).
type SpansByLabel<'a> = AHashMap<&'a str, AHashSet<(usize, usize, usize)>>;

fn group_by_label(annotations: &[Annotations]) -> SpansByLabel<'_> {
    let mut grouped: SpansByLabel = AHashMap::new();
    for (doc, a) in annotations.iter().enumerate() {
        for s in a.entities.iter() {
            grouped
                .entry(s.label())
                .or_insert_with(AHashSet::new)
                .insert((doc, s.start(), s.end()));
        }
    }
    grouped
}

/// Exact-match precision, recall, F1 and support of every label, plus the micro, macro and
/// weighted averages. A predicted span counts as a true positive when a true span of the same
/// document has the same start, end and label.
pub fn entity_report(
    truths: &[Annotations],
    preds: &[Annotations],
    zero_division: DivByZeroStrat,
) -> Result<Reporter, ScoringError> {
    if truths.len() != preds.len() {
        return Err(ScoringError::InconsistentLength(truths.len(), preds.len()));
    }
    let entities_true = group_by_label(truths);
    let entities_pred = group_by_label(preds);
    let target_names: BTreeSet<&str> = entities_true
        .keys()
        .chain(entities_pred.keys())
        .copied()
        .collect();
    if target_names.is_empty() {
        return Err(ScoringError::NoEntities);
    }
    let empty = AHashSet::new();
    let mut pred_sum = Vec::with_capacity(target_names.len());
    let mut tp_sum = Vec::with_capacity(target_names.len());
    let mut true_sum = Vec::with_capacity(target_names.len());
    for name in target_names.iter() {
        let true_set = entities_true.get(name).unwrap_or(&empty);
        let pred_set = entities_pred.get(name).unwrap_or(&empty);
        pred_sum.push(pred_set.len());
        true_sum.push(true_set.len());
        tp_sum.push(pred_set.intersection(true_set).count());
    }
    let (pred_sum, tp_sum, true_sum) = (
        Array1::from(pred_sum),
        Array1::from(tp_sum),
        Array1::from(true_sum),
    );
    let (p, r, f1, s) = precision_recall_fscore_support(
        pred_sum.clone(),
        tp_sum.clone(),
        true_sum.clone(),
        1.0_f32,
        Average::None,
        zero_division,
    )?;
    let mut reporter = Reporter::default();
    for (name, precision, recall, fscore, support) in
        multizip((target_names.iter(), p, r, f1, s))
    {
        reporter.insert(LabelMetricsInner::new_label(
            name, precision, recall, fscore, support,
        ));
    }
    for avg in all::<OverallAverage>() {
        let (p, r, f1, s) = precision_recall_fscore_support(
            pred_sum.clone(),
            tp_sum.clone(),
            true_sum.clone(),
            1.0_f32,
            avg.into(),
            zero_division,
        )?;
        reporter.insert(LabelMetricsInner::new_overall(
            avg,
            p.item()?,
            r.item()?,
            f1.item()?,
            s.item()?,
        ));
    }
    Ok(reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScorerConfigBuilder;
    use crate::span::tests::span;
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;

    fn docs(spans: Vec<Vec<Span>>) -> Vec<Annotations> {
        spans.into_iter().map(Annotations::new).collect()
    }

    fn greedy() -> ScorerConfig {
        ScorerConfigBuilder::default()
            .alignment(Alignment::Greedy)
            .build()
    }

    #[rstest]
    #[case(span(0, 3, "PER"), span(0, 3, "PER"), Comparison::Exact)]
    #[case(span(0, 4, "PER"), span(2, 6, "PER"), Comparison::Overlap { ratio: 1.0 })]
    #[case(span(2, 6, "PER"), span(0, 4, "PER"), Comparison::Overlap { ratio: 1.0 })]
    #[case(span(2, 4, "PER"), span(0, 6, "PER"), Comparison::Overlap { ratio: 3.0 })]
    #[case(span(0, 10, "LOC"), span(5, 8, "LOC"), Comparison::Contained)]
    #[case(span(0, 6, "LOC"), span(0, 3, "LOC"), Comparison::Contained)]
    #[case(span(0, 2, "LOC"), span(5, 8, "LOC"), Comparison::Covering)]
    #[case(span(0, 3, "LOC"), span(3, 6, "LOC"), Comparison::Covering)]
    #[case(span(0, 3, "LOC"), span(0, 6, "LOC"), Comparison::Overlap { ratio: 2.0 })]
    fn test_compare(#[case] truth: Span, #[case] pred: Span, #[case] expected: Comparison) {
        assert_eq!(compare(&truth, &pred), expected)
    }

    #[test]
    fn test_labels_are_ignored() {
        assert_eq!(
            compare(&span(0, 3, "PER"), &span(0, 3, "LOC")),
            Comparison::Exact
        )
    }

    #[test]
    fn test_exact_match() {
        let truth = docs(vec![vec![span(0, 3, "PER")]]);
        let scores = score_predictions(&truth, &truth.clone(), &ScorerConfig::default()).unwrap();
        assert_eq!(
            scores,
            Scores {
                custom: 1.0,
                f1: 1.0,
                entities: 1,
                decisions: 1
            }
        );
    }

    #[test]
    fn test_missed_entity() {
        let truth = docs(vec![vec![span(0, 3, "PER")]]);
        let pred = docs(vec![vec![]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.custom, 0.0);
        assert_eq!(scores.f1, 0.0);
        assert_eq!(scores.entities, 0);
        assert_eq!(scores.decisions, 1);
    }

    #[test]
    fn test_missed_entity_strict_policy() {
        let truth = docs(vec![vec![span(0, 3, "PER")]]);
        let pred = docs(vec![vec![]]);
        let config = ScorerConfigBuilder::default()
            .no_entities(NoEntitiesPolicy::ReturnError)
            .build();
        let res = score_predictions(&truth, &pred, &config);
        assert!(matches!(res, Err(ScoringError::NoEntities)));
    }

    #[test]
    fn test_contained_prediction() {
        let truth = docs(vec![vec![span(0, 10, "LOC")]]);
        let pred = docs(vec![vec![span(5, 8, "LOC")]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.custom, 1.0);
        assert_eq!(scores.f1, 0.0);
        assert_eq!(scores.entities, 1);
    }

    #[test]
    fn test_partial_overlap() {
        let truth = docs(vec![vec![span(0, 4, "PER")]]);
        let pred = docs(vec![vec![span(2, 6, "PER")]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.custom, 1.0);
        assert_eq!(scores.entities, 1);
    }

    #[test]
    fn test_both_empty_document_is_skipped() {
        let truth = docs(vec![vec![], vec![span(0, 3, "PER")]]);
        let pred = docs(vec![vec![], vec![span(0, 3, "PER")]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.entities, 1);
        assert_eq!(scores.decisions, 1);
    }

    #[test]
    fn test_no_entities_at_all() {
        let truth = docs(vec![vec![], vec![]]);
        let res = score_predictions(&truth, &truth.clone(), &ScorerConfig::default());
        assert!(matches!(res, Err(ScoringError::NoEntities)));
    }

    #[test]
    fn test_false_alarms() {
        let truth = docs(vec![vec![], vec![span(0, 1, "PER")]]);
        let pred = docs(vec![
            vec![span(0, 2, "LOC"), span(4, 5, "PER")],
            vec![span(0, 1, "PER")],
        ]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        // tp = 1, fp = 2, fn = 0
        assert_eq!(scores.decisions, 3);
        assert!((scores.f1 - 0.5).abs() < 1e-6);
        assert_eq!(scores.custom, 1.0);
    }

    #[test]
    fn test_first_pair_ignores_remaining_spans() {
        let truth = docs(vec![vec![span(0, 2, "PER"), span(5, 7, "LOC")]]);
        let pred = docs(vec![vec![span(0, 2, "PER")]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.entities, 1);
        assert_eq!(scores.f1, 1.0);
    }

    #[test]
    fn test_greedy_counts_every_span() {
        let truth = docs(vec![vec![span(0, 2, "PER"), span(5, 7, "LOC")]]);
        let pred = docs(vec![vec![span(5, 7, "LOC"), span(10, 11, "PER")]]);
        let scores = score_predictions(&truth, &pred, &greedy()).unwrap();
        // (0,2) unmatched, (5,7) exact, (10,11) false alarm
        assert_eq!(scores.entities, 2);
        assert_eq!(scores.custom, 0.5);
        assert_eq!(scores.decisions, 3);
        assert!((scores.f1 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_greedy_prefers_largest_overlap() {
        let truth = [span(0, 4, "PER")];
        let pred = [span(3, 5, "PER"), span(0, 3, "PER")];
        let pairs = align_greedy(&truth, &pred);
        assert_eq!(
            pairs,
            vec![
                EitherOrBoth::Both(&truth[0], &pred[1]),
                EitherOrBoth::Right(&pred[0])
            ]
        );
    }

    #[test]
    fn test_uneven_corpus_lengths() {
        let truth = docs(vec![vec![span(0, 1, "PER")], vec![span(0, 1, "PER")]]);
        let pred = docs(vec![vec![span(0, 1, "PER")]]);
        let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
        assert_eq!(scores.decisions, 2);
        assert_eq!(scores.entities, 1);
        assert!((scores.f1 - 2.0 / 3.0).abs() < 1e-6);
    }

    #[rstest]
    #[case(&[1, 1, 0, 1], &[1, 0, 0, 1], 0.8)]
    #[case(&[1, 1], &[1, 1], 1.0)]
    #[case(&[1, 1], &[0, 0], 0.0)]
    #[case(&[0, 0], &[0, 0], 0.0)]
    fn test_f1_score(#[case] y_true: &[u8], #[case] y_pred: &[u8], #[case] expected: f32) {
        let actual = f1_score(y_true, y_pred, DivByZeroStrat::ReplaceBy0).unwrap();
        assert!((actual - expected).abs() < 1e-6)
    }

    #[rstest]
    #[case(0.5, 1.25 * (2.0 / 3.0) / (0.25 + 2.0 / 3.0))]
    #[case(1.0, 0.8)]
    #[case(2.0, 5.0 * (2.0 / 3.0) / (4.0 + 2.0 / 3.0))]
    #[case(0.0, 1.0)]
    fn test_fbeta_score(#[case] beta: f32, #[case] expected: f32) {
        // precision 1, recall 2/3
        let actual = fbeta_score(&[1, 1, 0, 1], &[1, 0, 0, 1], beta, DivByZeroStrat::ReplaceBy0).unwrap();
        assert!((actual - expected).abs() < 1e-6)
    }

    #[test]
    fn test_fbeta_score_invalid_beta() {
        let res = fbeta_score(&[1], &[1], -0.5_f32, DivByZeroStrat::ReplaceBy0);
        assert!(matches!(res, Err(ScoringError::BetaNotPositive)));
        let res = fbeta_score(&[1], &[1], 1e30_f64, DivByZeroStrat::ReplaceBy0);
        assert!(matches!(res, Err(ScoringError::BetaNotRepresentable)));
    }

    #[test]
    fn test_f1_score_error_strategy() {
        let res = f1_score(&[1, 1], &[0, 0], DivByZeroStrat::ReturnError);
        assert!(matches!(res, Err(ScoringError::DivisionByZero(_))));
        let res = f1_score(&[1], &[0, 0], DivByZeroStrat::ReplaceBy0);
        assert!(matches!(res, Err(ScoringError::InconsistentLength(1, 2))));
    }

    #[test]
    fn test_prf_divide() {
        let numerator = array![1., 2., 0.];
        let denominator = array![1., 4., 0.];
        let by0 = prf_divide(&numerator, &denominator, DivByZeroStrat::ReplaceBy0).unwrap();
        let by1 = prf_divide(&numerator, &denominator, DivByZeroStrat::ReplaceBy1).unwrap();
        assert_eq!(by0, array![1., 0.5, 0.]);
        assert_eq!(by1, array![1., 0.5, 1.]);
        assert!(prf_divide(&numerator, &denominator, DivByZeroStrat::ReturnError).is_err());
    }

    #[test]
    fn test_negative_beta() {
        let res = precision_recall_fscore_support(
            array![1],
            array![1],
            array![1],
            -1.0_f32,
            Average::None,
            DivByZeroStrat::ReplaceBy0,
        );
        assert!(matches!(res, Err(ScoringError::BetaNotPositive)));
    }

    #[test]
    fn test_entity_report() {
        let truth = docs(vec![
            vec![span(0, 2, "PER"), span(4, 5, "LOC")],
            vec![span(1, 2, "PER")],
        ]);
        let pred = docs(vec![
            vec![span(0, 2, "PER"), span(4, 6, "LOC")],
            vec![span(1, 2, "PER"), span(3, 4, "FNR")],
        ]);
        let reporter = entity_report(&truth, &pred, DivByZeroStrat::ReplaceBy0).unwrap();
        let expected = "Label, Precision, Recall, Fscore, Support
Overall_Weighted, 0.6666667, 0.6666667, 0.6666667, 3
Overall_Micro, 0.5, 0.6666667, 0.57142854, 3
Overall_Macro, 0.33333334, 0.33333334, 0.33333334, 3
PER, 1, 1, 1, 2
LOC, 0, 0, 0, 1
FNR, 0, 0, 0, 0\n";
        assert_eq!(reporter.to_string(), expected);
    }

    #[test]
    fn test_entity_report_inconsistent_length() {
        let truth = docs(vec![vec![span(0, 2, "PER")]]);
        let res = entity_report(&truth, &[], DivByZeroStrat::ReplaceBy0);
        assert!(matches!(res, Err(ScoringError::InconsistentLength(1, 0))));
    }

    #[test]
    fn test_property_identical_predictions_score_one() {
        fn identical(spans: Vec<Vec<Span>>, greedy_alignment: bool) -> TestResult {
            if spans.iter().all(|s| s.is_empty()) {
                return TestResult::discard();
            }
            let truth = docs(spans);
            let config = if greedy_alignment {
                greedy()
            } else {
                ScorerConfig::default()
            };
            match score_predictions(&truth, &truth.clone(), &config) {
                Ok(s) => TestResult::from_bool(s.custom == 1.0 && s.f1 == 1.0),
                Err(_) => TestResult::failed(),
            }
        }
        QuickCheck::new()
            .tests(500)
            .quickcheck(identical as fn(Vec<Vec<Span>>, bool) -> TestResult)
    }

    #[test]
    fn test_property_empty_predictions_only_miss() {
        fn misses(spans: Vec<Vec<Span>>) -> TestResult {
            let expected: usize = spans.iter().map(|s| s.len()).sum();
            if expected == 0 {
                return TestResult::discard();
            }
            let truth = docs(spans);
            let pred: Vec<Annotations> = truth.iter().map(|_| Annotations::default()).collect();
            match score_predictions(&truth, &pred, &ScorerConfig::default()) {
                Ok(s) => TestResult::from_bool(
                    s.custom == 0.0 && s.f1 == 0.0 && s.entities == 0 && s.decisions == expected,
                ),
                Err(_) => TestResult::failed(),
            }
        }
        QuickCheck::new()
            .tests(500)
            .quickcheck(misses as fn(Vec<Vec<Span>>) -> TestResult)
    }
}
