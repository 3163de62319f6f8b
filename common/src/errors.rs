// Error handling framework for the MDM configuration core

use thiserror::Error;

/// Raised when a schedule time cannot be brought into canonical `HH:mm` form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time '{input}': expected HH:mm")]
pub struct NormalizationError {
    pub input: String,
}

impl NormalizationError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Local validation errors. These never reach a collaborator.
///
/// The `Display` text of every variant is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an object and at least one field.")]
    NothingSelectedToRun,

    #[error("Please select an object and at least one field to schedule.")]
    NothingSelectedToSchedule,

    #[error("Threshold for {field} must be between 0 and 100.")]
    ThresholdOutOfRange { field: String, value: i32 },

    #[error("Please provide a valid time.")]
    MissingScheduleTime,

    #[error("Please provide a valid time in HH:mm format (e.g., 14:30).")]
    InvalidScheduleTime(#[source] NormalizationError),
}

/// Failures reported by (or while talking to) an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The collaborator answered with an error; the message is shown verbatim
    #[error("{0}")]
    Remote(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response payload: {0}")]
    Decode(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error(transparent)]
    InvalidTime(#[from] NormalizationError),

    #[error("No next execution time available for daily schedule at {0}")]
    NoNextExecution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_error_names_the_field() {
        let err = ValidationError::ThresholdOutOfRange {
            field: "Phone".to_string(),
            value: 150,
        };
        assert_eq!(err.to_string(), "Threshold for Phone must be between 0 and 100.");
    }

    #[test]
    fn test_invalid_time_message_gives_example() {
        let err = ValidationError::InvalidScheduleTime(NormalizationError::new("25:00"));
        assert!(err.to_string().contains("HH:mm"));
        assert!(err.to_string().contains("14:30"));
    }

    #[test]
    fn test_remote_error_is_displayed_verbatim() {
        let err = BackendError::Remote("Insufficient access".to_string());
        assert_eq!(err.to_string(), "Insufficient access");
    }

    #[test]
    fn test_normalization_error_names_input() {
        let err = NormalizationError::new("noon");
        assert!(err.to_string().contains("'noon'"));
    }
}
