mod batch;
mod display;
mod session;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::RangedI64ValueParser;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use triage_ai::{
    DualHeadClassifier, PopulationConfig, TrainConfig, TriageError, TriagePipeline, synthesize,
    train_from_batches,
};
use triage_core::{Department, Feature, VitalsRecord};
use triage_store::{ArtifactStore, export_report, write_parquet};

use crate::session::{Page, Session};

/// Clinical triage decision aid: risk tier and receiving department from vitals.
#[derive(Parser, Debug)]
#[command(name = "triage", version)]
struct Cli {
    /// Directory holding the risk and department model artifacts
    #[arg(long, global = true, env = "TRIAGE_MODEL_DIR", default_value = "models")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize the labelled population and train both classifier heads
    Train {
        #[arg(long, default_value_t = 1500)]
        rows: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Trees in the department forest
        #[arg(long, default_value_t = 50)]
        trees: usize,
        /// Also write the synthetic population to this Parquet file
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Assess one patient
    Assess(AssessArgs),
    /// Assess JSON-lines requests concurrently, one JSON result per line
    Batch {
        input: PathBuf,
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// List treatment centres for a department
    Facilities {
        #[arg(value_parser = parse_department)]
        department: Department,
    },
}

#[derive(Args, Debug)]
struct AssessArgs {
    #[arg(long, default_value_t = 45, value_parser = vital(Feature::Age))]
    age: u32,
    #[arg(long, default_value_t = 120, value_parser = vital(Feature::SystolicBp))]
    systolic: u32,
    #[arg(long, default_value_t = 80, value_parser = vital(Feature::DiastolicBp))]
    diastolic: u32,
    #[arg(long, default_value_t = 75, value_parser = vital(Feature::HeartRate))]
    heart_rate: u32,
    /// Oxygen saturation, percent
    #[arg(long, default_value_t = 98, value_parser = vital(Feature::OxygenSat))]
    spo2: u32,
    /// Body temperature, °F
    #[arg(long, default_value_t = 98.6, value_parser = parse_temperature)]
    temp: f64,
    #[arg(long)]
    chest_pain: bool,
    #[arg(long)]
    shortness_of_breath: bool,
    #[arg(long)]
    dizziness: bool,
    #[arg(long)]
    vomiting: bool,
    /// Medical history PDF to scan for comorbidities
    #[arg(long)]
    document: Option<PathBuf>,
    /// Write the narrative as a timestamped .txt report into this directory
    #[arg(long)]
    export: Option<PathBuf>,
    /// Show the facility finder for the assessed department
    #[arg(long)]
    facilities: bool,
    /// Print the assessment as JSON instead of the dashboard
    #[arg(long)]
    json: bool,
}

impl AssessArgs {
    fn vitals(&self) -> VitalsRecord {
        VitalsRecord {
            age: self.age,
            systolic_bp: self.systolic,
            diastolic_bp: self.diastolic,
            heart_rate: self.heart_rate,
            temperature: self.temp,
            oxygen_sat: self.spo2,
            chest_pain: self.chest_pain,
            shortness_of_breath: self.shortness_of_breath,
            dizziness: self.dizziness,
            vomiting: self.vomiting,
        }
    }
}

/// Integer vitals share their accepted range with feature assembly.
fn vital(feature: Feature) -> RangedI64ValueParser<u32> {
    let (lo, hi) = feature.bounds();
    RangedI64ValueParser::new().range(lo as i64..=hi as i64)
}

fn parse_temperature(s: &str) -> Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if Feature::Temperature.accepts(t) {
        Ok(t)
    } else {
        let (lo, hi) = Feature::Temperature.bounds();
        Err(format!("{t} is not in {lo:.1}..={hi:.1}"))
    }
}

fn parse_department(s: &str) -> Result<Department, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = ArtifactStore::new(&cli.model_dir);

    match cli.command {
        Command::Train {
            rows,
            seed,
            trees,
            dataset,
        } => {
            let mut config = TrainConfig::default();
            config.population = PopulationConfig { rows, seed };
            config.department.n_trees = trees;
            cmd_train(&store, &config, dataset)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Assess(args) => Ok(exit_code(cmd_assess(&store, &args)?)),
        Command::Batch { input, workers } => Ok(exit_code(cmd_batch(&store, input, workers)?)),
        Command::Facilities { department } => {
            print!("{}", display::render_facilities(department));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(succeeded: bool) -> ExitCode {
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_train(
    store: &ArtifactStore,
    config: &TrainConfig,
    dataset: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("triage v{}", env!("CARGO_PKG_VERSION"));
    let batch = synthesize(&config.population)?;
    if let Some(path) = dataset {
        let rows = write_parquet(&path, std::slice::from_ref(&batch))
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("  Wrote {rows} rows to {}", path.display());
    }

    let trained = train_from_batches(&[batch], config)?;
    let paths = trained
        .save(store)
        .with_context(|| format!("saving models to {}", store.root().display()))?;

    print!("{}", display::render_training_report(&trained));
    for path in paths {
        eprintln!("  Saved {}", path.display());
    }
    Ok(())
}

/// Returns `false` when no assessment could be produced.
fn cmd_assess(store: &ArtifactStore, args: &AssessArgs) -> anyhow::Result<bool> {
    let vitals = args.vitals();
    let color = std::io::stdout().is_terminal() && !args.json;

    let document = match &args.document {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document unreadable, ignoring history");
                None
            }
        },
        None => None,
    };

    let outcome = DualHeadClassifier::load(store)
        .map_err(TriageError::from)
        .and_then(|clf| {
            let pipeline = TriagePipeline::new(clf);
            pipeline.evaluate(&vitals, document.as_deref())
        });

    let assessment = match outcome {
        Ok(a) => a,
        Err(e) => {
            if args.json {
                let err = serde_json::json!({
                    "status": "error",
                    "kind": e.kind(),
                    "message": e.to_string(),
                });
                println!("{err}");
            } else {
                print!("{}", display::render_unavailable_page(&vitals, &e, color));
            }
            return Ok(false);
        }
    };

    let mut session = Session::default();
    session.record(assessment.result.department);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print!("{}", display::render_dashboard(&vitals, &assessment, color));
    }

    if let Some(dir) = &args.export {
        let path = export_report(dir, &assessment.result.narrative, chrono::Utc::now())
            .with_context(|| format!("exporting report to {}", dir.display()))?;
        eprintln!("  Exported {}", path.display());
    }

    if args.facilities {
        session.open_finder();
    }
    if session.page() == Page::FacilityFinder {
        println!();
        let department = session.finder_department();
        print!("{}", display::render_facilities(department));
        session.back();
    }

    Ok(true)
}

/// Returns `false` when any request failed.
fn cmd_batch(store: &ArtifactStore, input: PathBuf, workers: usize) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;

    // A missing model still produces one error line per request.
    let classifier = DualHeadClassifier::load(store).unwrap_or_else(|e| {
        warn!(error = %e, "models unavailable, every request will fail");
        DualHeadClassifier::unloaded()
    });
    let pipeline = Arc::new(TriagePipeline::new(classifier));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let outcomes = runtime.block_on(batch::run_batch(pipeline, &text, workers))?;

    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    Ok(outcomes.iter().all(batch::BatchOutcome::is_ok))
}
