//! FactoryGuard - Main Entry Point

use alerting::{rank_by_risk, RiskSimulator};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use inference_engine::{global_importance, LinearRiskModel, ScoringContext};
use pipeline::{
    init_logging, write_predictions_to_path, write_simulation, write_training_set_to_path,
    Pipeline, Settings,
};
use sensor_ingest::{read_readings_from_path, MachineId};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "factoryguard")]
#[command(version)]
#[command(about = "Predictive-maintenance risk scoring for machine fleets", long_about = None)]
struct Cli {
    /// TOML settings file; FACTORYGUARD__* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the latest state of every machine
    Score {
        /// Sensor readings CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Linear model artifact (JSON)
        #[arg(long, short)]
        model: PathBuf,

        /// Predictions CSV
        #[arg(long, short, default_value = "machine_risk_predictions.csv")]
        output: PathBuf,

        /// Number of top drivers to log per machine
        #[arg(long, default_value = "5")]
        top: usize,

        /// Write a simulated risk update to this CSV
        #[arg(long)]
        simulate: Option<PathBuf>,

        /// Rescore one machine with overridden features
        #[arg(long, requires = "set")]
        what_if: Option<String>,

        /// Feature override as name=value, repeatable
        #[arg(long, value_parser = parse_override)]
        set: Vec<(String, f64)>,
    },

    /// Build the labeled training table
    PrepareTraining {
        /// Sensor readings CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Training CSV
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn parse_override(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    init_logging(&settings.logging)?;

    info!("=== FactoryGuard v{} ===", env!("CARGO_PKG_VERSION"));

    let pipeline = Pipeline::new(&settings)?;
    match cli.command {
        Commands::Score {
            input,
            model,
            output,
            top,
            simulate,
            what_if,
            set,
        } => {
            let model = LinearRiskModel::from_path(&model)?;
            let context = ScoringContext::new(Arc::new(model));
            let readings = read_readings_from_path(&input)
                .with_context(|| format!("reading {}", input.display()))?;

            let report = pipeline.score(&readings, &context)?;
            report.summary.log();

            let explanations = context.explain(&report.snapshot)?;
            for risk in rank_by_risk(&report.risks) {
                let drivers = explanations
                    .iter()
                    .find(|e| e.machine_id == risk.machine_id)
                    .map(|e| {
                        e.top_drivers(top)
                            .iter()
                            .map(|c| format!("{}={:+.3}", c.feature, c.contribution))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                info!(
                    "Machine {}: risk {:.4} ({}) drivers [{}]",
                    risk.machine_id, risk.failure_risk, risk.tier, drivers
                );
            }
            for (feature, importance) in global_importance(&explanations).iter().take(top) {
                info!("Global importance {}: {:.4}", feature, importance);
            }

            if let Some(machine) = what_if {
                let outcome = context.what_if(&report.snapshot, &MachineId::new(machine), &set)?;
                info!(
                    "What-if for machine {}: {:.4} -> {:.4} ({:+.4})",
                    outcome.machine_id,
                    outcome.baseline_risk,
                    outcome.simulated_risk,
                    outcome.delta()
                );
            }

            if let Some(path) = simulate {
                let mut simulator = RiskSimulator::new(&settings.simulation, pipeline.thresholds())?;
                let simulated = simulator.simulate(&report.risks);
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_simulation(BufWriter::new(file), &report.risks, &simulated)?;
                info!("Wrote simulated risk update to {}", path.display());
            }

            write_predictions_to_path(&output, &report)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::PrepareTraining { input, output } => {
            let readings = read_readings_from_path(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let report = pipeline.prepare_training(&readings)?;
            if report.training_set.is_empty() {
                return Err(anyhow!("no complete training rows in {}", input.display()));
            }
            write_training_set_to_path(&output, &report.training_set, pipeline.label_column())
                .with_context(|| format!("writing {}", output.display()))?;
        }
    }

    Ok(())
}
