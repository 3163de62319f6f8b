// Orchestrator engine implementation
//
// Single-threaded, event-driven: user events and call completions are
// applied one at a time by whoever owns the Orchestrator. Collaborator calls
// are spawned onto the runtime and report back through a channel, so no
// handler ever waits on a call inline.

use crate::backend::MdmBackend;
use crate::errors::{BackendError, ValidationError};
use crate::models::{
    Notification, ObjectDescriptor, ScheduleProcessRequest, ScheduleSettings, StartProcessRequest,
};
use crate::notify::Notifier;
use crate::orchestrator::event::{Completion, RemovalOrigin, SelectionTag, UiEvent};
use crate::state::ConfigurationState;
use crate::validation::{
    validate_schedule_time, validate_selection, validate_thresholds, Submission,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, instrument, warn};

/// Drives the configuration session.
///
/// Owns the [`ConfigurationState`]; collaborators only ever see copies of
/// the values they need.
pub struct Orchestrator {
    state: ConfigurationState,
    backend: Arc<dyn MdmBackend>,
    notifier: Arc<dyn Notifier>,
    completion_tx: UnboundedSender<Completion>,
    completion_rx: UnboundedReceiver<Completion>,
    in_flight: usize,
    /// Bumped on every object selection change
    generation: u64,
    /// Bumped whenever a schedule write or job removal succeeds
    job_epoch: u64,
    /// Start, save and remove calls still running
    actions_in_flight: usize,
    /// Object restored by the initial load whose metadata is fetched once
    /// the object list arrives
    pending_metadata: Option<SelectionTag>,
}

impl Orchestrator {
    /// Create a new orchestrator with an empty session
    pub fn new(backend: Arc<dyn MdmBackend>, notifier: Arc<dyn Notifier>) -> Self {
        let (completion_tx, completion_rx) = unbounded_channel();

        Self {
            state: ConfigurationState::new(),
            backend,
            notifier,
            completion_tx,
            completion_rx,
            in_flight: 0,
            generation: 0,
            job_epoch: 0,
            actions_in_flight: 0,
            pending_metadata: None,
        }
    }

    pub fn state(&self) -> &ConfigurationState {
        &self.state
    }

    /// Number of calls issued whose completion has not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Start the once-per-session load: schedule settings, then the object
    /// list, then metadata for the restored object.
    #[instrument(skip(self))]
    pub fn initial_load(&mut self) {
        let generation = self.generation;
        let job_epoch = self.job_epoch;
        self.dispatch(
            move |backend| async move {
                let result = backend.get_schedule_settings().await;
                Completion::SettingsLoaded {
                    generation,
                    job_epoch,
                    result,
                }
            },
            move |e| Completion::SettingsLoaded {
                generation,
                job_epoch,
                result: Err(e),
            },
        );
    }

    /// Apply one user interaction
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SelectObject(object) => self.select_object(object),
            UiEvent::SetFields(fields) => self.state.set_selected_fields(fields),
            UiEvent::SetThreshold { field, value } => {
                if !self.state.set_threshold(&field, value) {
                    warn!(field = %field, "Ignoring threshold for a field that is not selected");
                }
            }
            UiEvent::SetIncludeDependents(include) => self.state.set_include_dependents(include),
            UiEvent::SetScheduled(scheduled) => self.state.set_scheduled(scheduled),
            UiEvent::SetScheduleTime(time) => self.state.set_schedule_time(time),
            UiEvent::SetErrorEmails(emails) => self.state.set_error_emails(emails),
            UiEvent::StartOrTerminate => self.start_or_terminate(),
            UiEvent::SaveSchedule => self.save_schedule(),
            UiEvent::RemoveSchedule => self.remove_job(RemovalOrigin::RemoveSchedule),
        }
    }

    /// Wait for the next call completion. Never resolves while idle.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            std::future::pending::<()>().await;
        }
        self.completion_rx.recv().await
    }

    /// Apply completions until no call is in flight
    pub async fn run_until_idle(&mut self) {
        while self.in_flight > 0 {
            match self.completion_rx.recv().await {
                Some(completion) => self.handle_completion(completion),
                None => break,
            }
        }
    }

    /// Apply one call outcome to the state
    #[instrument(skip(self, completion), fields(call = completion.call_name()))]
    pub fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::SettingsLoaded {
                generation,
                job_epoch,
                result,
            } => self.on_settings_loaded(generation, job_epoch, result),
            Completion::ObjectsLoaded(result) => self.on_objects_loaded(result),
            Completion::FieldsLoaded { tag, result } => {
                if self.is_stale(&tag) {
                    return;
                }
                match result {
                    Ok(fields) => self.state.set_available_fields(fields),
                    Err(e) => self.report_failure("Failed to fetch fields: ", &e),
                }
            }
            Completion::DependentsChecked { tag, result } => {
                if self.is_stale(&tag) {
                    return;
                }
                match result {
                    Ok(has_dependents) => self.state.set_has_dependents(has_dependents),
                    Err(e) => self.report_failure("Failed to check dependent objects: ", &e),
                }
            }
            Completion::ScheduleLookedUp {
                tag,
                job_epoch,
                result,
            } => {
                if self.is_stale(&tag) {
                    return;
                }
                if job_epoch != self.job_epoch {
                    debug!(object = %tag.object, "Job changed while looking up schedule; result dropped");
                    return;
                }
                match result {
                    Ok(Some(settings)) if settings.is_scheduled_for(&tag.object) => {
                        self.state.set_job_scheduled_for_object(true);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, object = %tag.object, "Schedule lookup failed"),
                }
            }
            Completion::ProcessStarted(result) => {
                self.finish_action();
                match result {
                    Ok(()) => self.notifier.notify(Notification::success(
                        "MDM Process started! Check Debug Logs for progress.",
                    )),
                    Err(e) => self.report_failure("", &e),
                }
            }
            Completion::ScheduleSaved {
                tag,
                is_scheduled,
                result,
            } => {
                self.finish_action();
                match result {
                    Ok(()) => {
                        self.job_epoch += 1;
                        if tag.generation == self.generation {
                            self.state.set_job_scheduled_for_object(is_scheduled);
                        } else {
                            debug!(object = %tag.object, "Selection changed while saving; job flag left untouched");
                        }
                        self.notifier.notify(Notification::success(if is_scheduled {
                            "MDM Process scheduled successfully!"
                        } else {
                            "MDM Schedule removed."
                        }));
                    }
                    Err(e) => self.report_failure("", &e),
                }
            }
            Completion::JobRemoved { origin, result } => {
                self.finish_action();
                match result {
                    Ok(()) => {
                        self.job_epoch += 1;
                        self.state.set_scheduled(false);
                        self.state.set_job_scheduled_for_object(false);
                        self.notifier
                            .notify(Notification::success(origin.success_message()));
                    }
                    Err(e) => self.report_failure("", &e),
                }
            }
        }
    }

    // ==================== Flows ====================

    fn select_object(&mut self, object: Option<String>) {
        self.generation += 1;
        self.pending_metadata = None;
        self.state.set_selected_object(object);
        self.state.reset_for_object_change();

        match self.state.selected_object().map(str::to_string) {
            Some(object) => {
                info!(object = %object, generation = self.generation, "Object selected");
                let tag = SelectionTag {
                    generation: self.generation,
                    object,
                };
                self.fetch_metadata(tag.clone());
                self.lookup_schedule(tag);
            }
            None => self.state.set_available_fields(Vec::new()),
        }
    }

    fn on_settings_loaded(
        &mut self,
        generation: u64,
        job_epoch: u64,
        result: Result<Option<ScheduleSettings>, BackendError>,
    ) {
        if generation != self.generation {
            // The user picked an object before the settings arrived
            debug!("Discarding schedule settings, selection changed during initial load");
        } else if job_epoch != self.job_epoch {
            debug!("Discarding schedule settings, job changed during initial load");
        } else {
            match result {
                Ok(Some(settings)) => {
                    self.generation += 1;
                    self.state.apply_schedule_settings(&settings);
                    self.pending_metadata =
                        self.state.selected_object().map(|object| SelectionTag {
                            generation: self.generation,
                            object: object.to_string(),
                        });
                    info!(
                        object = ?self.state.selected_object(),
                        is_scheduled = settings.is_scheduled,
                        "Schedule settings restored"
                    );
                }
                Ok(None) => debug!("No persisted schedule settings"),
                Err(e) => self.report_failure("Failed to load schedule settings: ", &e),
            }
        }

        self.dispatch(
            |backend| async move { Completion::ObjectsLoaded(backend.get_objects().await) },
            |e| Completion::ObjectsLoaded(Err(e)),
        );
    }

    fn on_objects_loaded(&mut self, result: Result<Vec<ObjectDescriptor>, BackendError>) {
        match result {
            Ok(objects) => self.state.set_available_objects(objects),
            Err(e) => self.report_failure("Failed to fetch objects: ", &e),
        }

        if let Some(tag) = self.pending_metadata.take() {
            if !self.is_stale(&tag) {
                self.fetch_metadata(tag);
            }
        }
    }

    fn start_or_terminate(&mut self) {
        if self.state.is_job_scheduled_for_object() {
            self.remove_job(RemovalOrigin::Terminate);
            return;
        }

        let request = match self.build_start_request() {
            Ok(request) => request,
            Err(e) => return self.report_validation(e),
        };

        info!(object = %request.object_name, fields = request.fields.len(), "Starting MDM process");
        self.begin_action();
        self.dispatch(
            move |backend| async move {
                Completion::ProcessStarted(backend.start_mdm_process(&request).await)
            },
            |e| Completion::ProcessStarted(Err(e)),
        );
    }

    fn save_schedule(&mut self) {
        let request = match self.build_schedule_request() {
            Ok(request) => request,
            Err(e) => return self.report_validation(e),
        };

        info!(
            object = %request.object_name,
            is_scheduled = request.is_scheduled,
            schedule_time = ?request.schedule_time,
            "Saving MDM schedule"
        );
        let tag = SelectionTag {
            generation: self.generation,
            object: request.object_name.clone(),
        };
        let is_scheduled = request.is_scheduled;
        let fallback_tag = tag.clone();
        self.begin_action();
        self.dispatch(
            move |backend| async move {
                let result = backend.schedule_mdm_process(&request).await;
                Completion::ScheduleSaved {
                    tag,
                    is_scheduled,
                    result,
                }
            },
            move |e| Completion::ScheduleSaved {
                tag: fallback_tag,
                is_scheduled,
                result: Err(e),
            },
        );
    }

    fn remove_job(&mut self, origin: RemovalOrigin) {
        info!(?origin, "Removing scheduled MDM job");
        self.begin_action();
        self.dispatch(
            move |backend| async move {
                let result = backend.remove_scheduled_job().await;
                Completion::JobRemoved { origin, result }
            },
            move |e| Completion::JobRemoved {
                origin,
                result: Err(e),
            },
        );
    }

    // ==================== Calls ====================

    fn fetch_metadata(&mut self, tag: SelectionTag) {
        let fields_tag = tag.clone();
        let fields_fallback = tag.clone();
        self.dispatch(
            move |backend| async move {
                let result = backend.get_fields(&fields_tag.object).await;
                Completion::FieldsLoaded {
                    tag: fields_tag,
                    result,
                }
            },
            move |e| Completion::FieldsLoaded {
                tag: fields_fallback,
                result: Err(e),
            },
        );

        let dependents_fallback = tag.clone();
        self.dispatch(
            move |backend| async move {
                let result = backend.has_dependent_objects(&tag.object).await;
                Completion::DependentsChecked { tag, result }
            },
            move |e| Completion::DependentsChecked {
                tag: dependents_fallback,
                result: Err(e),
            },
        );
    }

    fn lookup_schedule(&mut self, tag: SelectionTag) {
        let job_epoch = self.job_epoch;
        let fallback_tag = tag.clone();
        self.dispatch(
            move |backend| async move {
                let result = backend.get_schedule_settings().await;
                Completion::ScheduleLookedUp {
                    tag,
                    job_epoch,
                    result,
                }
            },
            move |e| Completion::ScheduleLookedUp {
                tag: fallback_tag,
                job_epoch,
                result: Err(e),
            },
        );
    }

    /// Spawn a collaborator call; its completion comes back through the channel.
    ///
    /// If the call task panics, `on_abort` builds a failed completion instead
    /// so every dispatched call is answered exactly once.
    fn dispatch<F, Fut, A>(&mut self, call: F, on_abort: A)
    where
        F: FnOnce(Arc<dyn MdmBackend>) -> Fut,
        Fut: Future<Output = Completion> + Send + 'static,
        A: FnOnce(BackendError) -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.completion_tx.clone();
        let task = tokio::spawn(call(Arc::clone(&self.backend)));
        tokio::spawn(async move {
            let completion = match task.await {
                Ok(completion) => completion,
                Err(e) => {
                    error!(error = %e, "Backend call task aborted");
                    on_abort(BackendError::Transport(e.to_string()))
                }
            };
            if tx.send(completion).is_err() {
                debug!("Orchestrator dropped before call completed");
            }
        });
    }

    fn begin_action(&mut self) {
        self.actions_in_flight += 1;
        self.state.set_processing(true);
    }

    /// The busy flag clears only once the last running action has answered
    fn finish_action(&mut self) {
        self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
        self.state.set_processing(self.actions_in_flight > 0);
    }

    // ==================== Helpers ====================

    fn build_start_request(&self) -> Result<StartProcessRequest, ValidationError> {
        let object_name = validate_selection(&self.state, Submission::RunNow)?;
        let field_thresholds = validate_thresholds(&self.state)?;

        Ok(StartProcessRequest {
            object_name,
            fields: self.state.selected_fields().to_vec(),
            field_thresholds,
            include_dependents: self.state.include_dependents(),
            run_now: true,
            error_emails: self.state.error_emails().to_string(),
        })
    }

    fn build_schedule_request(&self) -> Result<ScheduleProcessRequest, ValidationError> {
        let object_name = validate_selection(&self.state, Submission::Schedule)?;
        let field_thresholds = validate_thresholds(&self.state)?;
        let is_scheduled = self.state.is_scheduled();
        let schedule_time = if is_scheduled {
            Some(validate_schedule_time(self.state.schedule_time())?)
        } else {
            self.state.schedule_time().map(str::to_string)
        };

        Ok(ScheduleProcessRequest {
            object_name,
            fields: self.state.selected_fields().to_vec(),
            field_thresholds,
            include_dependents: self.state.include_dependents(),
            schedule_time,
            is_scheduled,
            error_emails: self.state.error_emails().to_string(),
        })
    }

    fn is_stale(&self, tag: &SelectionTag) -> bool {
        let stale = tag.generation != self.generation;
        if stale {
            debug!(
                object = %tag.object,
                issued = tag.generation,
                current = self.generation,
                "Discarding stale result"
            );
        }
        stale
    }

    fn report_validation(&self, error: ValidationError) {
        warn!(error = %error, "Validation failed, no call issued");
        self.notifier.notify(Notification::error(error.to_string()));
    }

    fn report_failure(&self, prefix: &str, error: &BackendError) {
        warn!(error = %error, "Backend call failed");
        self.notifier
            .notify(Notification::error(format!("{}{}", prefix, error)));
    }
}
