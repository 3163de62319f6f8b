// Messages consumed by the orchestrator's event loop

use crate::errors::BackendError;
use crate::models::{ObjectDescriptor, ScheduleSettings};

/// A user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SelectObject(Option<String>),
    SetFields(Vec<String>),
    SetThreshold { field: String, value: i32 },
    SetIncludeDependents(bool),
    SetScheduled(bool),
    SetScheduleTime(Option<String>),
    SetErrorEmails(String),
    /// The dual-purpose button: run now, or terminate the scheduled job
    StartOrTerminate,
    SaveSchedule,
    RemoveSchedule,
}

/// The object selection a call was issued under.
///
/// Results tagged with an older generation than the orchestrator's current
/// one belong to a selection the user has since left and are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTag {
    pub generation: u64,
    pub object: String,
}

/// Which action asked for the scheduled job to be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOrigin {
    Terminate,
    RemoveSchedule,
}

impl RemovalOrigin {
    pub fn success_message(&self) -> &'static str {
        match self {
            RemovalOrigin::Terminate => "Scheduled MDM process terminated.",
            RemovalOrigin::RemoveSchedule => "Scheduled job removed successfully.",
        }
    }
}

/// The outcome of one collaborator call, delivered back to the event loop
#[derive(Debug)]
pub enum Completion {
    SettingsLoaded {
        generation: u64,
        /// Job epoch the load was issued under
        job_epoch: u64,
        result: Result<Option<ScheduleSettings>, BackendError>,
    },
    ObjectsLoaded(Result<Vec<ObjectDescriptor>, BackendError>),
    FieldsLoaded {
        tag: SelectionTag,
        result: Result<Vec<String>, BackendError>,
    },
    DependentsChecked {
        tag: SelectionTag,
        result: Result<bool, BackendError>,
    },
    ScheduleLookedUp {
        tag: SelectionTag,
        /// Job epoch the lookup was issued under
        job_epoch: u64,
        result: Result<Option<ScheduleSettings>, BackendError>,
    },
    ProcessStarted(Result<(), BackendError>),
    ScheduleSaved {
        tag: SelectionTag,
        is_scheduled: bool,
        result: Result<(), BackendError>,
    },
    JobRemoved {
        origin: RemovalOrigin,
        result: Result<(), BackendError>,
    },
}

impl Completion {
    /// Name of the collaborator call this completion answers
    pub fn call_name(&self) -> &'static str {
        match self {
            Completion::SettingsLoaded { .. } | Completion::ScheduleLookedUp { .. } => {
                "getScheduleSettings"
            }
            Completion::ObjectsLoaded(_) => "getObjects",
            Completion::FieldsLoaded { .. } => "getFields",
            Completion::DependentsChecked { .. } => "hasDependentObjects",
            Completion::ProcessStarted(_) => "startMDMProcess",
            Completion::ScheduleSaved { .. } => "scheduleMDMProcess",
            Completion::JobRemoved { .. } => "removeScheduledJob",
        }
    }
}
