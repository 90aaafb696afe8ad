use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pii_anon::{
    entity_report, load_scored_jsonl, score_predictions, Alignment, Annotations, Doc,
    DivByZeroStrat, Entity, Gazetteer, NoEntitiesPolicy, PatternRecognizer, PiiModel, Pseudonyms,
    Recognizer, RecognizerError, Redaction, ScorerConfigBuilder,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Find, redact and score personal information in text")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scores precomputed predictions stored as {"text", "truth", "pred"} JSON lines.
    Score {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, default_value = "first-pair")]
        alignment: Alignment,
        /// Fail instead of reporting 0 when no pair of spans could be compared.
        #[arg(long)]
        strict_empty: bool,
        #[arg(long, default_value = "replaceby0")]
        zero_division: DivByZeroStrat,
    },
    /// Redacts a text with the built-in patterns and optional name and place lists.
    Redact {
        #[arg(short, long)]
        text: String,
        #[arg(short, long, value_enum, default_value_t = Mode::Label)]
        mode: Mode,
        /// CSV file with a `fornavn` column.
        #[arg(long)]
        names: Option<PathBuf>,
        /// CSV file with a `name` column.
        #[arg(long)]
        places: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Label,
    Remove,
    Pseudonymize,
}

/// Stands in for the statistical recognizer, which this binary does not ship.
struct NoNer;

impl Recognizer for NoNer {
    fn name(&self) -> &str {
        "no_ner"
    }
    fn recognize(&self, _doc: &Doc) -> Result<Vec<Entity>, RecognizerError> {
        Ok(Vec::new())
    }
}

fn score(
    input: PathBuf,
    alignment: Alignment,
    strict_empty: bool,
    zero_division: DivByZeroStrat,
) -> anyhow::Result<()> {
    let records = load_scored_jsonl(&input)?;
    let (truth, pred): (Vec<Annotations>, Vec<Annotations>) =
        records.into_iter().map(|r| (r.truth, r.pred)).unzip();
    let policy = if strict_empty {
        NoEntitiesPolicy::ReturnError
    } else {
        NoEntitiesPolicy::ReplaceBy0
    };
    let config = ScorerConfigBuilder::default()
        .alignment(alignment)
        .no_entities(policy)
        .division_by_zero(zero_division)
        .build();
    info!(%config, "scoring");
    let scores = score_predictions(&truth, &pred, &config)?;
    println!("{}", scores);
    let reporter = entity_report(&truth, &pred, zero_division)?;
    print!("{}", reporter);
    Ok(())
}

fn redact(
    text: String,
    mode: Mode,
    names: Option<PathBuf>,
    places: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let names: Vec<(PathBuf, &str)> = names.into_iter().map(|p| (p, "fornavn")).collect();
    let places: Vec<(PathBuf, &str)> = places.into_iter().map(|p| (p, "name")).collect();
    let pseudonyms =
        Pseudonyms::from_csv(&names, &places).context("reading the name and place lists")?;
    let gazetteer = if pseudonyms.is_empty() {
        None
    } else {
        let terms = pseudonyms
            .names()
            .iter()
            .map(|n| ("PER", n.as_str()))
            .chain(pseudonyms.places().iter().map(|p| ("LOC", p.as_str())));
        Some(Gazetteer::new(terms)?)
    };
    let mut model = PiiModel::new(Box::new(NoNer));
    model.add_patterns(PatternRecognizer::with_defaults()?, gazetteer)?;
    let redaction = match mode {
        Mode::Label => Redaction::Label,
        Mode::Remove => Redaction::Remove,
        Mode::Pseudonymize => Redaction::Pseudonymize(pseudonyms),
    };
    let redacted = match seed {
        Some(seed) => {
            use rand::SeedableRng;
            model.replace(&text, &redaction, &mut rand::rngs::StdRng::seed_from_u64(seed))?
        }
        None => model.replace(&text, &redaction, &mut rand::thread_rng())?,
    };
    println!("{}", redacted);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pii_anon=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match args.command {
        Command::Score {
            input,
            alignment,
            strict_empty,
            zero_division,
        } => score(input, alignment, strict_empty, zero_division),
        Command::Redact {
            text,
            mode,
            names,
            places,
            seed,
        } => redact(text, mode, names, places, seed),
    }
}
