use pii_anon::{
    entity_report, load_jsonl, load_scored_jsonl, score_predictions, Alignment, Annotations, Doc,
    DivByZeroStrat, Entity, Gazetteer, NoEntitiesPolicy, PatternRecognizer, PiiModel, Pseudonyms,
    Recognizer, RecognizerError, Redaction, ScorerConfig, ScorerConfigBuilder, ScoringError,
};
use rand::{rngs::StdRng, SeedableRng};

pub trait CloseEnough {
    fn are_close(&self, other: &Self, eps: f32) -> bool;
}

impl CloseEnough for f32 {
    fn are_close(&self, other: &Self, eps: f32) -> bool {
        f32::abs(self - other) < eps
    }
}

fn scored_records() -> (Vec<Annotations>, Vec<Annotations>) {
    let records = load_scored_jsonl("tests/data/scored.jsonl").expect("scored.jsonl not found");
    records.into_iter().map(|r| (r.truth, r.pred)).unzip()
}

/// Labels every capitalized word that is not the first of the text as a person.
struct CapitalizedWords;

impl Recognizer for CapitalizedWords {
    fn name(&self) -> &str {
        "capitalized"
    }
    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        let mut found = Vec::new();
        for i in 1..doc.len() {
            let starts_upper = doc
                .token_text(i)
                .and_then(|t| t.chars().next())
                .is_some_and(char::is_uppercase);
            if starts_upper {
                found.push(doc.entity(i, i + 1, "PER")?);
            }
        }
        Ok(found)
    }
}

#[test]
fn first_pair_scores_of_a_corpus() {
    let (truth, pred) = scored_records();
    let scores = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
    assert_eq!(scores.entities, 3);
    assert_eq!(scores.decisions, 4);
    assert!(scores.custom.are_close(&(2.5 / 3.0), 1e-6));
    assert!(scores.f1.are_close(&(2.0 / 3.0), 1e-6));
}

#[test]
fn greedy_scores_of_a_corpus() {
    let (truth, pred) = scored_records();
    let config = ScorerConfigBuilder::default()
        .alignment(Alignment::Greedy)
        .build();
    let scores = score_predictions(&truth, &pred, &config).unwrap();
    assert_eq!(scores.entities, 6);
    assert_eq!(scores.decisions, 7);
    assert!(scores.custom.are_close(&(4.0 / 6.0), 1e-6));
    assert!(scores.f1.are_close(&0.6, 1e-6));
}

#[test]
fn entity_report_of_a_corpus() {
    let (truth, pred) = scored_records();
    let reporter = entity_report(&truth, &pred, DivByZeroStrat::ReplaceBy0).unwrap();
    assert_eq!(reporter.len(), 6);
    let per = reporter.get("PER").unwrap();
    assert!(per.precision.are_close(&0.5, 1e-6));
    assert!(per.recall.are_close(&(1.0 / 3.0), 1e-6));
    assert!(per.fscore.are_close(&0.4, 1e-6));
    let tlf = reporter.get("TLF").unwrap();
    assert_eq!(tlf.support, 0);
    assert_eq!(tlf.fscore, 0.0);
    let micro = reporter.get("Overall_Micro").unwrap();
    assert!(micro.precision.are_close(&0.6, 1e-6));
    assert!(micro.recall.are_close(&0.5, 1e-6));
    assert_eq!(micro.support, 6);
}

#[test]
fn missed_entity_depends_on_policy() {
    let (truth, _) = scored_records();
    let pred: Vec<Annotations> = truth.iter().map(|_| Annotations::default()).collect();
    let lenient = score_predictions(&truth, &pred, &ScorerConfig::default()).unwrap();
    assert_eq!(lenient.custom, 0.0);
    assert_eq!(lenient.f1, 0.0);
    let strict = ScorerConfigBuilder::default()
        .no_entities(NoEntitiesPolicy::ReturnError)
        .build();
    assert!(matches!(
        score_predictions(&truth, &pred, &strict),
        Err(ScoringError::NoEntities)
    ));
}

#[test]
fn model_scores_on_a_corpus() {
    let docs = load_jsonl("tests/data/corpus.jsonl").unwrap();
    assert_eq!(docs.len(), 3);
    let base = Gazetteer::new([("PER", "Ola Nordmann")]).unwrap();
    let mut model = PiiModel::new(Box::new(base));
    model
        .add_patterns(PatternRecognizer::with_defaults().unwrap(), None)
        .unwrap();
    let scores = model.test(&docs, &ScorerConfig::default()).unwrap();
    assert_eq!(scores.custom, 1.0);
    assert_eq!(scores.f1, 1.0);
    assert_eq!(scores.entities, 3);
}

#[test]
fn custom_recognizer_in_a_model() {
    let mut model = PiiModel::new(Box::new(CapitalizedWords));
    let places = Gazetteer::new([("LOC", "Tromsø")]).unwrap();
    model
        .add_patterns(PatternRecognizer::with_defaults().unwrap(), Some(places))
        .unwrap();
    let text = "Hilsen Ida fra Tromsø, tlf 99887766";
    assert_eq!(
        model.highlight(text).unwrap(),
        "Hilsen [Ida](PER) fra [Tromsø](PER), tlf [99887766](TLF)"
    );

    let pseudonyms = Pseudonyms::new(vec![String::from("Siri")], vec![String::from("Alta")]);
    let redacted = model
        .replace(
            text,
            &Redaction::Pseudonymize(pseudonyms),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
    assert_eq!(redacted, "Hilsen Siri fra Siri, tlf <TLF>");

    model.disable_ner().unwrap();
    let removed = model
        .replace(text, &Redaction::Remove, &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(removed, "Hilsen Ida fra ~, tlf ~");
}
