//! Settings validation
//!
//! Field rules are declared on the settings structs with `validator` derives:
//! - epochs >= 1
//! - image sizes in 32..=4096, multiple of 32
//! - batch > 0 or -1 (auto)
//! - run_name is a single non-empty path component
//! - api_url is an http(s) URL
//!
//! This module runs them and reports the first failure as a `ContractError`.

use contracts::{ContractError, PipelineSettings};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate PipelineSettings
///
/// Returns the first error encountered (ordered by field path), or Ok(()).
pub fn validate(settings: &PipelineSettings) -> Result<(), ContractError> {
    match settings.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut failures = Vec::new();
            collect_failures("", &errors, &mut failures);
            failures.sort();
            let (field, message) = failures
                .into_iter()
                .next()
                .unwrap_or_else(|| ("settings".to_string(), "invalid settings".to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Flatten nested validation errors into (field path, message) pairs
fn collect_failures(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(items) => {
                for item in items {
                    let message = item
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", item.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_failures(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_failures(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}
