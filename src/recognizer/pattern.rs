//! Pattern-based recognizer. Finds entities with a recognizable format, such as identity numbers,
//! bank accounts, phone numbers and e-mail addresses.
use super::{drop_overlapping, Doc, Entity, Recognizer, RecognizerError};
use regex::Regex;
use tracing::debug;

/// Norwegian PII formats. Order matters: a match overlapping the match of an earlier rule is
/// dropped.
const DEFAULT_RULES: [(&str, &str); 4] = [
    // Fødselsnummer: ddmmyy followed by five digits
    ("FNR", r"\b[0-7]\d[01]\d{3}\s?\d{5}\b"),
    ("KONTONR", r"\b\d{4}[. ]?\d{2}[. ]?\d{5}\b"),
    // The country code is glued to the number, so it stands in for the word boundary
    ("TLF", r"(?:\+47\s?|\b)(?:\d{2}\s?){3}\d{2}\b"),
    ("EPOST", r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b"),
];

/// Regex recognizer. Every rule assigns its label to the tokens touched by its matches.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    rules: Vec<(String, Regex)>,
}

impl PatternRecognizer {
    pub fn new<L, P, I>(rules: I) -> Result<Self, RecognizerError>
    where
        L: Into<String>,
        P: AsRef<str>,
        I: IntoIterator<Item = (L, P)>,
    {
        let rules = rules
            .into_iter()
            .map(|(label, pattern)| Ok((label.into(), Regex::new(pattern.as_ref())?)))
            .collect::<Result<Vec<_>, RecognizerError>>()?;
        Ok(Self { rules })
    }

    /// Identity numbers (`FNR`), bank accounts (`KONTONR`), phone numbers (`TLF`) and e-mail
    /// addresses (`EPOST`).
    pub fn with_defaults() -> Result<Self, RecognizerError> {
        Self::new(DEFAULT_RULES)
    }

    /// Appends a rule, with the lowest priority.
    pub fn add_rule(&mut self, label: impl Into<String>, pattern: &str) -> Result<(), RecognizerError> {
        self.rules.push((label.into(), Regex::new(pattern)?));
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(l, _)| l.as_str())
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "regex_matcher"
    }

    fn recognize(&self, doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        let mut found = Vec::new();
        for (label, regex) in self.rules.iter() {
            for m in regex.find_iter(doc.text()) {
                if let Some(entity) = doc.entity_for_bytes(m.range(), label)? {
                    debug!(label = label.as_str(), text = m.as_str(), "pattern match");
                    found.push(entity);
                }
            }
        }
        Ok(drop_overlapping(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn labels_of(text: &str) -> Vec<(String, String)> {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let doc = Doc::new(text);
        recognizer
            .recognize(&doc)
            .unwrap()
            .into_iter()
            .map(|e| (e.label().to_string(), e.text(text).to_string()))
            .collect()
    }

    #[rstest]
    #[case("Mitt fnr er 01019012345.", "FNR", "01019012345")]
    #[case("Mitt fnr er 010190 12345.", "FNR", "010190 12345")]
    #[case("Kontonummer 1234.56.78901 takk", "KONTONR", "1234.56.78901")]
    #[case("Ring meg på 22 33 44 55", "TLF", "22 33 44 55")]
    #[case("Ring meg på 99887766", "TLF", "99887766")]
    #[case("Ring meg på +4799887766 i dag", "TLF", "+4799887766")]
    #[case("Ring meg på +47 22 33 44 55", "TLF", "+47 22 33 44 55")]
    #[case("Skriv til ola.nordmann@nav.no i dag", "EPOST", "ola.nordmann@nav.no")]
    fn test_default_rules(#[case] text: &str, #[case] label: &str, #[case] matched: &str) {
        assert_eq!(
            labels_of(text),
            vec![(String::from(label), String::from(matched))]
        )
    }

    #[test]
    fn test_no_match() {
        assert!(labels_of("Ingen personopplysninger her").is_empty())
    }

    #[test]
    fn test_invalid_pattern() {
        let res = PatternRecognizer::new([("BAD", "(unclosed")]);
        assert!(matches!(res, Err(RecognizerError::Pattern(_))));
    }

    #[test]
    fn test_custom_rule_lowest_priority() {
        let mut recognizer = PatternRecognizer::new([("SAK", r"\bSAK-\d+\b")]).unwrap();
        recognizer.add_rule("NUM", r"\d+").unwrap();
        let text = "Gjelder SAK-42";
        let doc = Doc::new(text);
        let found = recognizer.recognize(&doc).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label(), "SAK");
        assert_eq!(found[0].text(text), "SAK-42");
        assert_eq!(recognizer.labels().collect::<Vec<_>>(), vec!["SAK", "NUM"]);
    }
}
