//! Completion configuration validation (model, sampling, timeouts, retries).

use crate::schema::DizanConfig;

use super::helpers::{validate_not_blank, validate_range, validate_range_f64};

/// Validate all completion-related constraints.
pub(crate) fn validate_completion(errors: &mut Vec<String>, config: &DizanConfig) {
    let completion = &config.completion;
    validate_not_blank(errors, "completion.model", &completion.model);
    validate_range_f64(
        errors,
        "completion.temperature",
        completion.temperature,
        0.0,
        2.0,
    );
    validate_range(
        errors,
        "completion.max_output_tokens",
        u64::from(completion.max_output_tokens),
        1,
        8192,
    );
    validate_range(
        errors,
        "completion.timeout_secs",
        completion.timeout_secs,
        1,
        600,
    );
    validate_range(
        errors,
        "completion.max_retries",
        u64::from(completion.max_retries),
        0,
        5,
    );
    validate_range(
        errors,
        "completion.max_context_exchanges",
        completion.max_context_exchanges as u64,
        1,
        1000,
    );
}
