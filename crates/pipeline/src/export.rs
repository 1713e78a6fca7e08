//! CSV Export

use crate::run::ScoringReport;
use crate::PipelineError;
use alerting::MachineRisk;
use feature_engine::TrainingSet;
use std::io;
use std::path::Path;
use tracing::info;

/// Timestamp layout used in every exported file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write one row per scored machine: identity, model inputs, risk and tier.
pub fn write_predictions<W: io::Write>(
    writer: W,
    report: &ScoringReport,
) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["machine_id".to_string(), "timestamp".to_string()];
    header.extend(report.columns().iter().cloned());
    header.push("Failure Risk".to_string());
    header.push("Risk Tier".to_string());
    csv.write_record(&header)?;

    for (prediction, risk) in report.predictions.iter().zip(&report.risks) {
        let mut record = Vec::with_capacity(header.len());
        record.push(prediction.machine_id.to_string());
        record.push(prediction.timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.extend(prediction.features.iter().map(f64::to_string));
        record.push(risk.failure_risk.to_string());
        record.push(risk.tier.to_string());
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the predictions CSV to a file
pub fn write_predictions_to_path(
    path: impl AsRef<Path>,
    report: &ScoringReport,
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_predictions(io::BufWriter::new(file), report)?;
    info!("Wrote {} predictions to {}", report.predictions.len(), path.display());
    Ok(())
}

/// Write simulated risks next to the scores they were derived from
pub fn write_simulation<W: io::Write>(
    writer: W,
    current: &[MachineRisk],
    simulated: &[MachineRisk],
) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "machine_id",
        "Failure Risk",
        "Risk Tier",
        "Simulated Risk",
        "Simulated Tier",
    ])?;
    for (now, next) in current.iter().zip(simulated) {
        csv.write_record([
            now.machine_id.to_string(),
            now.failure_risk.to_string(),
            now.tier.to_string(),
            next.failure_risk.to_string(),
            next.tier.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the dense training table with the label as the last column.
pub fn write_training_set<W: io::Write>(
    writer: W,
    set: &TrainingSet,
    label_column: &str,
) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["machine_id".to_string(), "timestamp".to_string()];
    header.extend(set.columns.iter().cloned());
    header.push(label_column.to_string());
    csv.write_record(&header)?;

    for ((identity, values), label) in set.identities.iter().zip(&set.features).zip(&set.labels) {
        let (machine_id, timestamp) = identity;
        let mut record = Vec::with_capacity(header.len());
        record.push(machine_id.to_string());
        record.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.extend(values.iter().map(f64::to_string));
        record.push(label.to_string());
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the training CSV to a file
pub fn write_training_set_to_path(
    path: impl AsRef<Path>,
    set: &TrainingSet,
    label_column: &str,
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_training_set(io::BufWriter::new(file), set, label_column)?;
    info!("Wrote {} training rows to {}", set.len(), path.display());
    Ok(())
}
