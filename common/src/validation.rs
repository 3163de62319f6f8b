// Submission checks run before any job call is issued

use crate::errors::ValidationError;
use crate::schedule::normalize;
use crate::state::ConfigurationState;
use std::collections::BTreeMap;

/// What the submission is for; only changes the wording of selection errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    RunNow,
    Schedule,
}

/// An object and at least one field must be selected
pub fn validate_selection(
    state: &ConfigurationState,
    submission: Submission,
) -> Result<String, ValidationError> {
    match state.selected_object() {
        Some(object) if !state.selected_fields().is_empty() => Ok(object.to_string()),
        _ => Err(match submission {
            Submission::RunNow => ValidationError::NothingSelectedToRun,
            Submission::Schedule => ValidationError::NothingSelectedToSchedule,
        }),
    }
}

/// Every threshold must lie in [0, 100]. The first offending field (in
/// selection order) is reported.
pub fn validate_thresholds(
    state: &ConfigurationState,
) -> Result<BTreeMap<String, u8>, ValidationError> {
    state
        .field_thresholds()
        .iter()
        .map(|entry| match u8::try_from(entry.threshold) {
            Ok(value) if value <= 100 => Ok((entry.field.clone(), value)),
            _ => Err(ValidationError::ThresholdOutOfRange {
                field: entry.field.clone(),
                value: entry.threshold,
            }),
        })
        .collect()
}

/// A scheduled job needs a time that normalizes to `HH:mm`
pub fn validate_schedule_time(time: Option<&str>) -> Result<String, ValidationError> {
    let time = time
        .filter(|t| !t.trim().is_empty())
        .ok_or(ValidationError::MissingScheduleTime)?;
    normalize(time).map_err(ValidationError::InvalidScheduleTime)
}
