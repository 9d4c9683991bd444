//! Pipeline metrics
//!
//! Thin wrappers over the `metrics` facade plus an in-memory `StageTimings`
//! aggregator used for the end-of-run summary. Without an installed recorder
//! every `record_*` call is a no-op.

use std::fmt;
use std::time::Duration;

use contracts::{ValidationMetrics, ValidationSplit};
use metrics::{counter, gauge, histogram};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configure,
    Acquire,
    Normalize,
    Train,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Acquire => "acquire",
            Stage::Normalize => "normalize",
            Stage::Train => "train",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Record how long a stage took
pub fn record_stage_duration(stage: Stage, elapsed: Duration) {
    histogram!(
        "raptor_pipeline_stage_duration_seconds",
        "stage" => stage.as_str()
    )
    .record(elapsed.as_secs_f64());
}

/// Record a stage that ended in an error
pub fn record_stage_failure(stage: Stage) {
    counter!(
        "raptor_pipeline_stage_failures_total",
        "stage" => stage.as_str()
    )
    .increment(1);
}

/// Record a dataset installed by the acquirer
pub fn record_dataset_acquired(images: Option<u64>) {
    counter!("raptor_pipeline_datasets_acquired_total").increment(1);
    if let Some(images) = images {
        gauge!("raptor_pipeline_dataset_images").set(images as f64);
    }
}

/// Record the split chosen for validation
///
/// Falling back to the training split is counted separately.
pub fn record_validation_split(split: ValidationSplit) {
    if split == ValidationSplit::TrainFallback {
        counter!("raptor_pipeline_validation_fallback_total").increment(1);
    }
}

/// Record validation aggregates, labelled with the split they were measured on
pub fn record_validation_metrics(metrics: &ValidationMetrics, split: ValidationSplit) {
    let tag = split.metrics_tag();
    gauge!("raptor_pipeline_map50_95", "split" => tag).set(metrics.map50_95);
    if let Some(map50) = metrics.map50 {
        gauge!("raptor_pipeline_map50", "split" => tag).set(map50);
    }
    if let Some(precision) = metrics.precision {
        gauge!("raptor_pipeline_precision", "split" => tag).set(precision);
    }
    if let Some(recall) = metrics.recall {
        gauge!("raptor_pipeline_recall", "split" => tag).set(recall);
    }
}

/// How a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Failed,
    Skipped,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            StageOutcome::Completed => "ok",
            StageOutcome::Failed => "failed",
            StageOutcome::Skipped => "skipped",
        })
    }
}

/// One finished stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
    pub outcome: StageOutcome,
}

/// Per-stage timings of one run, in execution order
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    entries: Vec<StageTiming>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage and forward it to the metrics facade
    pub fn record(&mut self, stage: Stage, elapsed: Duration, outcome: StageOutcome) {
        match outcome {
            StageOutcome::Completed => record_stage_duration(stage, elapsed),
            StageOutcome::Failed => {
                record_stage_duration(stage, elapsed);
                record_stage_failure(stage);
            }
            StageOutcome::Skipped => {}
        }
        self.entries.push(StageTiming {
            stage,
            elapsed,
            outcome,
        });
    }

    pub fn entries(&self) -> &[StageTiming] {
        &self.entries
    }

    /// Sum of all recorded stage durations
    pub fn total(&self) -> Duration {
        self.entries.iter().map(|e| e.elapsed).sum()
    }

    /// Time spent in `stage`, if it ran
    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.entries
            .iter()
            .find(|e| e.stage == stage)
            .map(|e| e.elapsed)
    }

    /// First stage that failed
    pub fn failed_stage(&self) -> Option<Stage> {
        self.entries
            .iter()
            .find(|e| e.outcome == StageOutcome::Failed)
            .map(|e| e.stage)
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Stage Timings ===")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<10} {:>9.2}s  {}",
                entry.stage,
                entry.elapsed.as_secs_f64(),
                entry.outcome
            )?;
        }
        writeln!(f, "{:<10} {:>9.2}s", "total", self.total().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_timings_order_and_total() {
        let mut timings = StageTimings::new();
        timings.record(Stage::Configure, Duration::from_millis(10), StageOutcome::Completed);
        timings.record(Stage::Acquire, Duration::from_secs(2), StageOutcome::Completed);
        timings.record(Stage::Normalize, Duration::ZERO, StageOutcome::Skipped);

        let stages: Vec<Stage> = timings.entries().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Configure, Stage::Acquire, Stage::Normalize]);
        assert_eq!(timings.total(), Duration::from_millis(2010));
        assert_eq!(timings.get(Stage::Acquire), Some(Duration::from_secs(2)));
        assert_eq!(timings.get(Stage::Export), None);
        assert_eq!(timings.failed_stage(), None);
    }

    #[test]
    fn test_failed_stage() {
        let mut timings = StageTimings::new();
        timings.record(Stage::Configure, Duration::ZERO, StageOutcome::Completed);
        timings.record(Stage::Train, Duration::from_secs(1), StageOutcome::Failed);
        assert_eq!(timings.failed_stage(), Some(Stage::Train));
    }

    #[test]
    fn test_display() {
        let mut timings = StageTimings::new();
        timings.record(Stage::Export, Duration::from_millis(1500), StageOutcome::Completed);
        let output = timings.to_string();
        assert!(output.contains("export"));
        assert!(output.contains("1.50s"));
        assert!(output.contains("total"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        let metrics = ValidationMetrics {
            map50_95: 0.4,
            map50: None,
            precision: Some(0.9),
            recall: None,
        };
        record_validation_metrics(&metrics, ValidationSplit::TrainFallback);
        record_validation_split(ValidationSplit::TrainFallback);
        record_dataset_acquired(Some(12));
    }
}
