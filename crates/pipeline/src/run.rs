//! Batch Runs

use crate::settings::Settings;
use crate::PipelineError;
use alerting::{FleetSummary, MachineRisk, TierThresholds};
use feature_engine::{
    select_latest, CompletionReport, FeatureBuilder, FeatureTable, GapFill, LabelSummary,
    Snapshot, TargetLabeler, TrainingSet,
};
use inference_engine::{RiskPrediction, ScoringContext};
use sensor_ingest::Reading;
use tracing::{info, warn};

/// Everything produced by one scoring batch
#[derive(Debug, Clone)]
pub struct ScoringReport {
    pub completion: CompletionReport,
    /// Latest dense row per machine, as handed to the model
    pub snapshot: Snapshot,
    pub predictions: Vec<RiskPrediction>,
    /// Predictions with tiers, same order as `predictions`
    pub risks: Vec<MachineRisk>,
    pub summary: FleetSummary,
}

impl ScoringReport {
    /// Feature columns of the snapshot
    pub fn columns(&self) -> &[String] {
        self.snapshot.columns()
    }
}

/// Everything produced by one training-preparation batch
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub completion: CompletionReport,
    pub labels: LabelSummary,
    pub training_set: TrainingSet,
}

/// Configured pipeline stages. Holds no per-batch state, so one instance
/// serves any number of runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    builder: FeatureBuilder,
    labeler: TargetLabeler,
    gap_fill: GapFill,
    thresholds: TierThresholds,
    label_column: String,
}

impl Pipeline {
    /// Build every stage from validated settings
    pub fn new(settings: &Settings) -> Result<Self, PipelineError> {
        settings.validate()?;
        Ok(Self {
            builder: FeatureBuilder::new(&settings.features)?,
            labeler: TargetLabeler::new(&settings.labels)?,
            gap_fill: GapFill::new(settings.completion.scope),
            thresholds: settings.tiers,
            label_column: settings.labels.column_name(),
        })
    }

    /// Model columns this pipeline produces
    pub fn model_columns(&self) -> Vec<String> {
        self.builder.schema().model_columns()
    }

    /// Name of the training label column, e.g. `failure_next_24h`
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Tier boundaries applied to every score
    pub fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    /// Derive raw (unfilled) features
    pub fn features(&self, readings: &[Reading]) -> Result<FeatureTable, PipelineError> {
        metrics::counter!("factoryguard_rows_ingested_total").increment(readings.len() as u64);
        Ok(self.builder.build(readings)?)
    }

    /// Score the latest state of every machine in the batch
    pub fn score(
        &self,
        readings: &[Reading],
        context: &ScoringContext,
    ) -> Result<ScoringReport, PipelineError> {
        // Fail on a column mismatch before any work is done
        context.check_columns(&self.model_columns())?;

        let mut table = self.features(readings)?;
        let completion = self.gap_fill.complete(&mut table);
        record_dropped(&completion);

        let snapshot = select_latest(&table)?;
        let predictions = context.score(&snapshot)?;
        let risks: Vec<MachineRisk> = predictions
            .iter()
            .map(|p| self.thresholds.assess(p.machine_id.clone(), p.failure_risk))
            .collect();
        let summary = FleetSummary::from_risks(&risks);

        metrics::counter!("factoryguard_machines_scored_total").increment(predictions.len() as u64);
        metrics::gauge!("factoryguard_high_risk_machines").set(summary.high as f64);
        info!(
            "Scored {} machines from {} readings ({} high risk)",
            predictions.len(),
            readings.len(),
            summary.high
        );

        Ok(ScoringReport {
            completion,
            snapshot,
            predictions,
            risks,
            summary,
        })
    }

    /// Build the labeled, dense training table.
    ///
    /// Labels are computed before completion and the raw failure flag never
    /// reaches the training columns.
    pub fn prepare_training(&self, readings: &[Reading]) -> Result<TrainingReport, PipelineError> {
        let mut table = self.features(readings)?;
        let labels = self.labeler.label(&mut table);
        let completion = self.gap_fill.complete(&mut table);
        record_dropped(&completion);

        let training_set = TrainingSet::from_table(&table)?;
        if training_set.is_empty() && !readings.is_empty() {
            warn!("No training rows survived completion");
        }
        info!(
            "Prepared {} training rows with {} features (positive rate {:.4})",
            training_set.len(),
            training_set.columns.len(),
            training_set.positive_rate().unwrap_or_default()
        );

        Ok(TrainingReport {
            completion,
            labels,
            training_set,
        })
    }
}

fn record_dropped(completion: &CompletionReport) {
    metrics::counter!("factoryguard_rows_dropped_total").increment(completion.dropped_rows as u64);
    if completion.dropped_rows > 0 {
        warn!(
            "{} of {} rows could not be completed and were dropped",
            completion.dropped_rows, completion.input_rows
        );
    }
}
