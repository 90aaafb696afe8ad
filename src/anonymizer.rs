//! Rewrites a text so that the detected entities no longer reveal who or where.
use crate::recognizer::{read_csv_column, Entity, RecognizerError};
use rand::{seq::SliceRandom, Rng};
use std::path::Path;
use tracing::{debug, info};

/// Replacement used for removed entities.
pub const REMOVED: &str = "~";

/// Pools of replacement values used when pseudonymizing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pseudonyms {
    names: Vec<String>,
    places: Vec<String>,
}

impl Pseudonyms {
    pub fn new(names: Vec<String>, places: Vec<String>) -> Self {
        Self { names, places }
    }

    /// Builds the pools from CSV columns. Every `(path, column)` pair contributes all the values
    /// of that column.
    pub fn from_csv<P: AsRef<Path>>(
        names: &[(P, &str)],
        places: &[(P, &str)],
    ) -> Result<Self, RecognizerError> {
        let pseudonyms = Self::new(read_columns(names)?, read_columns(places)?);
        info!(
            names = pseudonyms.names.len(),
            places = pseudonyms.places.len(),
            "loaded pseudonyms"
        );
        Ok(pseudonyms)
    }

    /// Loads the Statistics Norway name lists and the place lists from `dir`: girls' and boys'
    /// first names (`fornavn` column), municipalities, countries and villages (`name` column).
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, RecognizerError> {
        let dir = dir.as_ref();
        Self::from_csv(
            &[
                (dir.join("jentefornavn_ssb.csv"), "fornavn"),
                (dir.join("guttefornavn_ssb.csv"), "fornavn"),
            ],
            &[
                (dir.join("kommuner.csv"), "name"),
                (dir.join("land.csv"), "name"),
                (dir.join("tettsteder.csv"), "name"),
            ],
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn places(&self) -> &[String] {
        &self.places
    }

    /// True when both pools are empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.places.is_empty()
    }

    fn pick<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> Option<&str> {
        let pool = match label {
            "PER" => &self.names,
            "LOC" => &self.places,
            _ => return None,
        };
        pool.choose(rng).map(String::as_str)
    }
}

fn read_columns<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<Vec<String>, RecognizerError> {
    let mut values = Vec::new();
    for (path, column) in files {
        values.extend(read_csv_column(path, column)?);
    }
    Ok(values)
}

/// How detected entities are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Redaction {
    /// `<LABEL>`, for example `<PER>`.
    #[default]
    Label,
    /// `~`, whatever the label.
    Remove,
    /// A random name for `PER`, a random place for `LOC`, `<LABEL>` for anything else or when
    /// the matching pool is empty.
    Pseudonymize(Pseudonyms),
}

fn placeholder(label: &str) -> String {
    format!("<{}>", label)
}

/// Replaces every entity of `text` according to `redaction`. Entities are applied from left to
/// right; an entity overlapping an already replaced one is left out.
pub fn anonymize<R: Rng + ?Sized>(
    text: &str,
    entities: &[Entity],
    redaction: &Redaction,
    rng: &mut R,
) -> String {
    let mut sorted: Vec<&Entity> = entities.iter().collect();
    sorted.sort_by_key(|e| e.offsets.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for entity in sorted {
        let range = entity.offsets.clone();
        if range.start < cursor || text.get(range.clone()).is_none() {
            debug!(entity = %entity, "skipping entity outside the text or overlapping");
            continue;
        }
        out.push_str(&text[cursor..range.start]);
        let label = entity.label();
        match redaction {
            Redaction::Label => out.push_str(&placeholder(label)),
            Redaction::Remove => out.push_str(REMOVED),
            Redaction::Pseudonymize(pseudonyms) => match pseudonyms.pick(label, rng) {
                Some(value) => out.push_str(value),
                None => out.push_str(&placeholder(label)),
            },
        }
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
