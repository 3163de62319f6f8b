// Text rendering of the session for the console

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use common::models::{Notification, ObjectDescriptor, Severity};
use common::schedule::next_daily_run;
use common::state::ConfigurationState;
use std::fmt::Write;

pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.severity {
        Severity::Success => "+",
        Severity::Error => "!",
    };
    format!("[{}] {}: {}", marker, notification.title, notification.message)
}

pub fn render_objects(objects: &[ObjectDescriptor]) -> String {
    if objects.is_empty() {
        return "No objects loaded yet".to_string();
    }

    let mut out = String::new();
    for object in objects {
        if object.label.is_empty() || object.label == object.name {
            let _ = writeln!(out, "  {}", object.name);
        } else {
            let _ = writeln!(out, "  {} ({})", object.name, object.label);
        }
    }
    out.trim_end().to_string()
}

/// Render the session. The next trigger is only shown for a time that
/// normalizes.
pub fn render_state(state: &ConfigurationState, timezone: Tz, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    let _ = writeln!(out, "Object:            {}", state.selected_object().unwrap_or("-"));
    let _ = writeln!(out, "Available fields:  {}", state.available_fields().join(", "));
    let _ = writeln!(out, "Selected fields:");
    for entry in state.field_thresholds() {
        let _ = writeln!(out, "  {:<24} {}", entry.field, entry.threshold);
    }
    let dependents = if state.has_dependents() {
        yes_no(state.include_dependents())
    } else {
        "n/a"
    };
    let _ = writeln!(out, "Include dependents: {}", dependents);
    let _ = writeln!(out, "Scheduled:         {}", yes_no(state.is_scheduled()));
    let _ = writeln!(out, "Schedule time:     {}", state.schedule_time().unwrap_or("-"));
    if let Some(time) = state.schedule_time() {
        if let Ok(next) = next_daily_run(time, timezone, now) {
            let _ = writeln!(
                out,
                "Next run:          {} ({})",
                next.with_timezone(&timezone).format("%Y-%m-%d %H:%M"),
                timezone
            );
        }
    }
    let _ = writeln!(out, "Error emails:      {}", state.error_emails());
    let _ = writeln!(out, "Busy:              {}", yes_no(state.is_processing()));
    let _ = write!(out, "Action:            {}", state.action_label());
    out
}
