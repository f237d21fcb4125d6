use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nephromind::{
    config::Config,
    pipeline::{evaluate_artifact, load_training_table},
    ModelArtifact, PatientRecord, RiskService,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nephromind")]
#[command(about = "CKD risk screening engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and persist the artifact bundle
    Train {
        /// Training CSV; falls back to the configured candidate paths
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output path for the artifact bundle
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-run the held-out evaluation of a persisted artifact
    Evaluate {
        /// Labeled CSV to evaluate against
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact bundle to evaluate
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },

    /// Assess one patient record (JSON file, or '-' for stdin)
    Predict {
        /// Input JSON with clinical fields
        #[arg(short, long)]
        input: String,

        /// Artifact bundle to assess against
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },

    /// Show artifact metadata
    Info {
        /// Artifact bundle to inspect
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nephromind=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Train { data, out } => {
            let data_path = resolve_dataset(data, &config)?;
            let artifact_path = out.unwrap_or_else(|| config.storage.artifact_path.clone());

            tracing::info!("training from {}", data_path.display());
            let (_, report) =
                RiskService::train_from_csv(&data_path, &artifact_path, &config.pipeline)?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.calibration.floor_met {
                eprintln!(
                    "warning: sensitivity floor {:.2} not reached (best {:.4})",
                    report.calibration.sensitivity_floor, report.calibration.sensitivity
                );
            }
        }

        Commands::Evaluate { data, artifact } => {
            let data_path = resolve_dataset(data, &config)?;
            let artifact_path = artifact.unwrap_or_else(|| config.storage.artifact_path.clone());

            let artifact = ModelArtifact::load(&artifact_path)?;
            let table = load_training_table(&data_path)?;
            let evaluation = evaluate_artifact(&artifact, &table, &config.pipeline)?;

            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }

        Commands::Predict { input, artifact } => {
            let artifact_path = artifact.unwrap_or_else(|| config.storage.artifact_path.clone());
            let service = RiskService::load(&artifact_path)?;

            let raw = if input == "-" {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                std::fs::read_to_string(&input)
                    .with_context(|| format!("failed to read {}", input))?
            };
            let record: PatientRecord =
                serde_json::from_str(&raw).context("input is not a valid patient record")?;

            let assessment = service.assess(&record)?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }

        Commands::Info { artifact } => {
            let artifact_path = artifact.unwrap_or_else(|| config.storage.artifact_path.clone());
            let artifact = ModelArtifact::load(&artifact_path)?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "schema_version": artifact.schema_version,
                    "threshold": artifact.threshold,
                    "n_columns": artifact.all_columns.len(),
                    "selected_features": artifact.selected.names,
                    "metadata": artifact.metadata,
                }))?
            );
        }
    }

    Ok(())
}

fn resolve_dataset(explicit: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    for candidate in &config.storage.dataset_paths {
        if Path::new(candidate).exists() {
            return Ok(PathBuf::from(candidate));
        }
    }
    bail!(
        "no dataset found; pass --data or place a CSV at one of {:?}",
        config.storage.dataset_paths
    )
}
