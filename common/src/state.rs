//! Configuration state store.
//!
//! Holds the current selection of one configuration session. Every write is
//! synchronous and immediately visible; reconciliation rules (threshold
//! rebuild, dependents gating) run inside the setters.

use crate::models::{
    ActionLabel, FieldThreshold, ObjectDescriptor, ScheduleSettings, DEFAULT_THRESHOLD,
};
use std::collections::{HashMap, HashSet};

/// Selection and job status for one configuration session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationState {
    available_objects: Vec<ObjectDescriptor>,
    selected_object: Option<String>,
    available_fields: Vec<String>,
    selected_fields: Vec<String>,
    field_thresholds: Vec<FieldThreshold>,
    include_dependents: bool,
    has_dependents: bool,
    is_scheduled: bool,
    schedule_time: Option<String>,
    is_job_scheduled_for_object: bool,
    error_emails: String,
    is_processing: bool,
    action_label: ActionLabel,
}

impl ConfigurationState {
    /// Create an empty session state
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Getters ====================

    pub fn available_objects(&self) -> &[ObjectDescriptor] {
        &self.available_objects
    }

    pub fn selected_object(&self) -> Option<&str> {
        self.selected_object.as_deref()
    }

    pub fn available_fields(&self) -> &[String] {
        &self.available_fields
    }

    /// Selected fields in the order they were picked
    pub fn selected_fields(&self) -> &[String] {
        &self.selected_fields
    }

    /// One entry per selected field, in selection order
    pub fn field_thresholds(&self) -> &[FieldThreshold] {
        &self.field_thresholds
    }

    pub fn threshold_for(&self, field: &str) -> Option<i32> {
        self.field_thresholds
            .iter()
            .find(|t| t.field == field)
            .map(|t| t.threshold)
    }

    pub fn include_dependents(&self) -> bool {
        self.include_dependents
    }

    pub fn has_dependents(&self) -> bool {
        self.has_dependents
    }

    pub fn is_scheduled(&self) -> bool {
        self.is_scheduled
    }

    pub fn schedule_time(&self) -> Option<&str> {
        self.schedule_time.as_deref()
    }

    pub fn is_job_scheduled_for_object(&self) -> bool {
        self.is_job_scheduled_for_object
    }

    pub fn error_emails(&self) -> &str {
        &self.error_emails
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn action_label(&self) -> ActionLabel {
        self.action_label
    }

    // ==================== Setters ====================

    pub fn set_available_objects(&mut self, objects: Vec<ObjectDescriptor>) {
        self.available_objects = objects;
    }

    /// Set the target object. Blank names count as no selection.
    pub fn set_selected_object(&mut self, object: Option<String>) {
        self.selected_object = object.filter(|name| !name.trim().is_empty());
    }

    pub fn set_available_fields(&mut self, fields: Vec<String>) {
        self.available_fields = fields;
    }

    /// Replace the selected fields and rebuild the threshold list.
    ///
    /// Fields that stay selected keep their threshold, new fields start at
    /// [`DEFAULT_THRESHOLD`], deselected fields are dropped. Duplicates keep
    /// their first position.
    pub fn set_selected_fields(&mut self, fields: Vec<String>) {
        let previous: HashMap<&str, i32> = self
            .field_thresholds
            .iter()
            .map(|t| (t.field.as_str(), t.threshold))
            .collect();

        let mut seen = HashSet::with_capacity(fields.len());
        let mut selected = Vec::with_capacity(fields.len());
        let mut thresholds = Vec::with_capacity(fields.len());
        for field in fields {
            if !seen.insert(field.clone()) {
                continue;
            }
            let threshold = previous
                .get(field.as_str())
                .copied()
                .unwrap_or(DEFAULT_THRESHOLD);
            thresholds.push(FieldThreshold::new(field.clone(), threshold));
            selected.push(field);
        }

        self.selected_fields = selected;
        self.field_thresholds = thresholds;
    }

    /// Update the threshold of a selected field. The value is stored as-is,
    /// range checks happen on submission.
    ///
    /// Returns false if `field` is not selected.
    pub fn set_threshold(&mut self, field: &str, value: i32) -> bool {
        match self.field_thresholds.iter_mut().find(|t| t.field == field) {
            Some(entry) => {
                entry.threshold = value;
                true
            }
            None => false,
        }
    }

    pub fn set_include_dependents(&mut self, include: bool) {
        self.include_dependents = include;
    }

    /// Record whether the selected object has dependents.
    /// `false` forces `include_dependents` off.
    pub fn set_has_dependents(&mut self, has_dependents: bool) {
        self.has_dependents = has_dependents;
        if !has_dependents {
            self.include_dependents = false;
        }
    }

    pub fn set_scheduled(&mut self, scheduled: bool) {
        self.is_scheduled = scheduled;
    }

    pub fn set_schedule_time(&mut self, time: Option<String>) {
        self.schedule_time = time;
    }

    pub fn set_error_emails(&mut self, emails: impl Into<String>) {
        self.error_emails = emails.into();
    }

    pub fn set_processing(&mut self, processing: bool) {
        self.is_processing = processing;
    }

    /// Set the job-scheduled flag together with the matching button label
    pub fn set_job_scheduled_for_object(&mut self, scheduled: bool) {
        self.is_job_scheduled_for_object = scheduled;
        self.action_label = if scheduled {
            ActionLabel::Terminate
        } else {
            ActionLabel::Start
        };
    }

    // ==================== Reconciliation ====================

    /// Clear everything derived from the previous object selection
    pub fn reset_for_object_change(&mut self) {
        self.selected_fields.clear();
        self.field_thresholds.clear();
        self.include_dependents = false;
        self.has_dependents = false;
        self.set_job_scheduled_for_object(false);
    }

    /// Populate the session from persisted schedule settings.
    ///
    /// Thresholds missing from the settings default to [`DEFAULT_THRESHOLD`].
    /// The job-scheduled flag comes straight from the settings, but never
    /// holds without a selected object.
    pub fn apply_schedule_settings(&mut self, settings: &ScheduleSettings) {
        self.set_selected_object(settings.object_name.clone());

        // Start from the persisted values so the rebuild carries them over
        self.field_thresholds = settings
            .fields
            .iter()
            .map(|field| {
                let threshold = settings
                    .field_thresholds
                    .get(field)
                    .copied()
                    .unwrap_or(DEFAULT_THRESHOLD);
                FieldThreshold::new(field.clone(), threshold)
            })
            .collect();
        self.set_selected_fields(settings.fields.clone());

        self.include_dependents = settings.include_dependents;
        self.schedule_time = settings.schedule_time.clone();
        self.is_scheduled = settings.is_scheduled;
        self.error_emails = settings.error_emails.clone();
        let scheduled = settings.is_scheduled && self.selected_object.is_some();
        self.set_job_scheduled_for_object(scheduled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = ConfigurationState::new();
        assert_eq!(state.selected_object(), None);
        assert!(state.selected_fields().is_empty());
        assert!(state.field_thresholds().is_empty());
        assert!(!state.is_processing());
        assert_eq!(state.action_label(), ActionLabel::Start);
    }

    #[test]
    fn test_field_change_rebuilds_thresholds() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["A", "B"]));
        assert!(state.set_threshold("A", 90));
        assert!(state.set_threshold("B", 70));

        state.set_selected_fields(fields(&["B", "C"]));

        assert_eq!(
            state.field_thresholds(),
            &[FieldThreshold::new("B", 70), FieldThreshold::new("C", 80)]
        );
        assert_eq!(state.threshold_for("A"), None);
    }

    #[test]
    fn test_zero_threshold_is_carried_over() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["Email"]));
        state.set_threshold("Email", 0);
        state.set_selected_fields(fields(&["Email", "Phone"]));
        assert_eq!(state.threshold_for("Email"), Some(0));
    }

    #[test]
    fn test_duplicate_fields_keep_first_position() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["Name", "Phone", "Name"]));
        assert_eq!(state.selected_fields(), &fields(&["Name", "Phone"])[..]);
        assert_eq!(state.field_thresholds().len(), 2);
    }

    #[test]
    fn test_threshold_for_unselected_field_is_ignored() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["Name"]));
        assert!(!state.set_threshold("Phone", 50));
        assert_eq!(state.field_thresholds().len(), 1);
    }

    #[test]
    fn test_threshold_is_not_clamped() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["Phone"]));
        state.set_threshold("Phone", 150);
        assert_eq!(state.threshold_for("Phone"), Some(150));
    }

    #[test]
    fn test_dependents_recompute_forces_include_off() {
        let mut state = ConfigurationState::new();
        state.set_include_dependents(true);
        state.set_has_dependents(false);
        assert!(!state.include_dependents());

        state.set_has_dependents(true);
        state.set_include_dependents(true);
        assert!(state.include_dependents());
    }

    #[test]
    fn test_blank_object_is_no_selection() {
        let mut state = ConfigurationState::new();
        state.set_selected_object(Some("   ".to_string()));
        assert_eq!(state.selected_object(), None);
    }

    #[test]
    fn test_reset_for_object_change() {
        let mut state = ConfigurationState::new();
        state.set_selected_fields(fields(&["Name"]));
        state.set_has_dependents(true);
        state.set_include_dependents(true);
        state.set_job_scheduled_for_object(true);
        state.set_available_fields(fields(&["Name", "Phone"]));

        state.reset_for_object_change();

        assert!(state.selected_fields().is_empty());
        assert!(state.field_thresholds().is_empty());
        assert!(!state.include_dependents());
        assert!(!state.has_dependents());
        assert!(!state.is_job_scheduled_for_object());
        assert_eq!(state.action_label(), ActionLabel::Start);
        // available fields are replaced by the next fetch, not cleared here
        assert_eq!(state.available_fields().len(), 2);
    }

    #[test]
    fn test_apply_schedule_settings() {
        let settings = ScheduleSettings {
            object_name: Some("Contact".to_string()),
            fields: fields(&["Email", "LastName"]),
            field_thresholds: HashMap::from([("Email".to_string(), 95)]),
            include_dependents: true,
            schedule_time: Some("02:00".to_string()),
            is_scheduled: true,
            error_emails: "ops@example.com".to_string(),
        };
        let mut state = ConfigurationState::new();
        state.apply_schedule_settings(&settings);

        assert_eq!(state.selected_object(), Some("Contact"));
        assert_eq!(state.threshold_for("Email"), Some(95));
        assert_eq!(state.threshold_for("LastName"), Some(DEFAULT_THRESHOLD));
        assert!(state.include_dependents());
        assert_eq!(state.schedule_time(), Some("02:00"));
        assert!(state.is_scheduled());
        assert_eq!(state.error_emails(), "ops@example.com");
        assert!(state.is_job_scheduled_for_object());
        assert_eq!(state.action_label(), ActionLabel::Terminate);
    }

    #[test]
    fn test_scheduled_settings_without_object_do_not_flag_job() {
        let settings = ScheduleSettings {
            object_name: None,
            is_scheduled: true,
            ..Default::default()
        };
        let mut state = ConfigurationState::new();
        state.apply_schedule_settings(&settings);
        assert!(state.is_scheduled());
        assert!(!state.is_job_scheduled_for_object());
    }
}
