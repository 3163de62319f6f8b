use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Threshold assigned to a field when it is first selected
pub const DEFAULT_THRESHOLD: i32 = 80;

// Collaborators send `null` for empty collections and blank strings
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

// ============================================================================
// Collaborator payloads
// ============================================================================

/// An entity type the dedup engine can run against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: String,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Persisted description of the recurring job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSettings {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub object_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_thresholds: HashMap<String, i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_dependents: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub schedule_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_scheduled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_emails: String,
}

impl ScheduleSettings {
    /// True when these settings describe an active schedule for `object`
    pub fn is_scheduled_for(&self, object: &str) -> bool {
        self.is_scheduled && self.object_name.as_deref() == Some(object)
    }
}

/// Parameters of an immediate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessRequest {
    pub object_name: String,
    pub fields: Vec<String>,
    pub field_thresholds: BTreeMap<String, u8>,
    pub include_dependents: bool,
    pub run_now: bool,
    pub error_emails: String,
}

/// Parameters of a schedule write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleProcessRequest {
    pub object_name: String,
    pub fields: Vec<String>,
    pub field_thresholds: BTreeMap<String, u8>,
    pub include_dependents: bool,
    pub schedule_time: Option<String>,
    pub is_scheduled: bool,
    pub error_emails: String,
}

// ============================================================================
// Session models
// ============================================================================

/// Similarity cutoff for one selected field.
///
/// Stored unclamped; range checks happen at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldThreshold {
    pub field: String,
    pub threshold: i32,
}

impl FieldThreshold {
    pub fn new(field: impl Into<String>, threshold: i32) -> Self {
        Self {
            field: field.into(),
            threshold,
        }
    }
}

/// Meaning of the dual-purpose start button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionLabel {
    #[default]
    Start,
    Terminate,
}

impl ActionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionLabel::Start => "Start MDM Process Now",
            ActionLabel::Terminate => "Terminate MDM Process",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_settings_tolerates_nulls() {
        let json = r#"{
            "objectName": "Contact",
            "fields": null,
            "fieldThresholds": null,
            "includeDependents": null,
            "scheduleTime": "",
            "isScheduled": true,
            "errorEmails": null
        }"#;
        let settings: ScheduleSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.object_name.as_deref(), Some("Contact"));
        assert!(settings.fields.is_empty());
        assert!(settings.field_thresholds.is_empty());
        assert!(!settings.include_dependents);
        assert_eq!(settings.schedule_time, None);
        assert!(settings.is_scheduled);
        assert_eq!(settings.error_emails, "");
    }

    #[test]
    fn test_blank_object_name_is_no_object() {
        let settings: ScheduleSettings =
            serde_json::from_str(r#"{"objectName": "  ", "isScheduled": true}"#).unwrap();
        assert_eq!(settings.object_name, None);
        assert!(!settings.is_scheduled_for(""));
    }

    #[test]
    fn test_is_scheduled_for_requires_match_and_flag() {
        let settings = ScheduleSettings {
            object_name: Some("Account".to_string()),
            is_scheduled: true,
            ..Default::default()
        };
        assert!(settings.is_scheduled_for("Account"));
        assert!(!settings.is_scheduled_for("Contact"));

        let unscheduled = ScheduleSettings {
            is_scheduled: false,
            ..settings
        };
        assert!(!unscheduled.is_scheduled_for("Account"));
    }

    #[test]
    fn test_start_request_uses_camel_case() {
        let request = StartProcessRequest {
            object_name: "Account".to_string(),
            fields: vec!["Name".to_string()],
            field_thresholds: BTreeMap::from([("Name".to_string(), 90)]),
            include_dependents: false,
            run_now: true,
            error_emails: "ops@example.com".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["objectName"], "Account");
        assert_eq!(value["runNow"], true);
        assert_eq!(value["fieldThresholds"]["Name"], 90);
    }

    #[test]
    fn test_action_label_text() {
        assert_eq!(ActionLabel::default().to_string(), "Start MDM Process Now");
        assert_eq!(ActionLabel::Terminate.as_str(), "Terminate MDM Process");
    }
}
