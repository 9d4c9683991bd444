//! Validation summary parsing
//!
//! The validator prints a per-class table; the aggregate row starts with
//! `all` followed by image count, instance count, precision, recall, mAP50 and
//! mAP50-95:
//!
//! ```text
//!                  Class     Images  Instances      Box(P          R      mAP50  mAP50-95)
//!                    all         42        117      0.812      0.704      0.781      0.512
//! ```

use contracts::{ContractError, ValidationMetrics};

/// Label of the aggregate row
const SUMMARY_LABEL: &str = "all";

/// Numeric columns after the label
const SUMMARY_COLUMNS: usize = 6;

/// Parse the last aggregate row found in `output`
///
/// Progress output uses carriage returns, so both `\r` and `\n` split lines.
pub fn parse_validation_summary(output: &str) -> Result<ValidationMetrics, ContractError> {
    output
        .split(['\n', '\r'])
        .filter_map(parse_summary_row)
        .last()
        .ok_or_else(|| ContractError::MetricsUnavailable {
            message: "no 'all' summary row in validation output".into(),
        })
}

fn parse_summary_row(line: &str) -> Option<ValidationMetrics> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != SUMMARY_LABEL {
        return None;
    }

    let values: Vec<f64> = tokens
        .take(SUMMARY_COLUMNS)
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    if values.len() != SUMMARY_COLUMNS {
        return None;
    }

    Some(ValidationMetrics {
        precision: Some(values[2]),
        recall: Some(values[3]),
        map50: Some(values[4]),
        map50_95: values[5],
    })
}
