// Backend module: the external collaborators the orchestrator drives
// Provides the trait and a REST implementation

pub mod rest;

pub use rest::RestBackend;

use crate::errors::BackendError;
use crate::models::{ObjectDescriptor, ScheduleProcessRequest, ScheduleSettings, StartProcessRequest};
use async_trait::async_trait;

/// MdmBackend covers metadata discovery, schedule persistence and job control.
///
/// Every call is an independent request/response; the orchestrator never
/// awaits one inline but spawns it and applies the outcome later.
#[async_trait]
pub trait MdmBackend: Send + Sync {
    /// List the object types a job can target
    async fn get_objects(&self) -> Result<Vec<ObjectDescriptor>, BackendError>;

    /// List the comparable fields of an object
    async fn get_fields(&self, object_name: &str) -> Result<Vec<String>, BackendError>;

    /// Whether related records can be included for this object
    async fn has_dependent_objects(&self, object_name: &str) -> Result<bool, BackendError>;

    /// Load the persisted schedule, if one was ever saved
    async fn get_schedule_settings(&self) -> Result<Option<ScheduleSettings>, BackendError>;

    /// Run the dedup job once, now
    async fn start_mdm_process(&self, request: &StartProcessRequest) -> Result<(), BackendError>;

    /// Persist the schedule and (un)register the daily job
    async fn schedule_mdm_process(
        &self,
        request: &ScheduleProcessRequest,
    ) -> Result<(), BackendError>;

    /// Cancel the recurring job
    async fn remove_scheduled_job(&self) -> Result<(), BackendError>;
}
