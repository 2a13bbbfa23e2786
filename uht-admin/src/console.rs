//! Save/cancel orchestration
//!
//! [`Console`] owns the selection store and the expansion controller and drives every
//! round trip to the gateway. User actions are synchronous methods. Any action that
//! needs the gateway returns a [`Task`]: a future that performs the call and resolves
//! to an [`Outcome`]. The caller runs the task on its event loop and hands the outcome
//! back to [`Console::apply`], which may return follow-up tasks (a save is followed
//! by a reload).
//!
//! Tasks are not `Send`; the console and its tasks live on one thread, matching a
//! single-threaded UI runtime. [`Console::settle`] runs a task and its follow-ups to
//! completion, which is convenient for tests and scripted use.
//!
//! Stale outcomes are dropped: each load bumps a generation counter, and object or
//! field lists produced for an older generation are ignored.

use std::{collections::VecDeque, sync::Arc};

use futures::{FutureExt, future::LocalBoxFuture};
use tracing::{debug, error, info, warn};

use crate::{
    Result,
    delta::{SelectionDelta, compute_delta},
    error::ErrorClass,
    expansion::{Expansion, ExpansionController, FieldsApplied},
    gateway::Gateway,
    model::{FieldInfo, ObjectInfo, SaveResult, TrackableObject},
    notify::{Notification, Notifier},
    store::{SelectionStore, ToggleEffect},
};

/// Caption of the primary save action
pub const SAVE_LABEL: &str = "Save Configuration";

/// Pending gateway call. Resolve it and pass the outcome to [`Console::apply`].
pub type Task = LocalBoxFuture<'static, Outcome>;

/// Settled gateway call
#[derive(Debug)]
pub enum Outcome {
    Objects {
        generation: u64,
        result: Result<Vec<ObjectInfo>>,
    },
    Fields {
        generation: u64,
        object_api_name: String,
        result: Result<Vec<FieldInfo>>,
    },
    Saved {
        result: Result<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavePhase {
    #[default]
    Idle,
    Saving,
}

pub struct Console<G, N> {
    gateway: Arc<G>,
    notifier: N,
    store: SelectionStore,
    expansion: ExpansionController,
    save_phase: SavePhase,
    loading: bool,
    generation: u64,
}

impl<G, N> std::fmt::Debug for Console<G, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("objects", &self.store.total_count())
            .field("expansion", self.expansion.state())
            .field("save_phase", &self.save_phase)
            .field("loading", &self.loading)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<G, N> Console<G, N>
where
    G: Gateway + 'static,
    N: Notifier,
{
    /// Creates a console. It reports loading until the first [`load`](Self::load) settles.
    pub fn new(gateway: G, notifier: N) -> Self {
        Self::with_shared_gateway(Arc::new(gateway), notifier)
    }

    pub fn with_shared_gateway(gateway: Arc<G>, notifier: N) -> Self {
        Self {
            gateway,
            notifier,
            store: SelectionStore::new(),
            expansion: ExpansionController::new(),
            save_phase: SavePhase::Idle,
            loading: true,
            generation: 0,
        }
    }

    // ------------------------------------------------------------------
    // actions
    // ------------------------------------------------------------------

    /// Fetches the object list. On success every object is replaced, selection is
    /// reset to baseline, and expansion and cached fields are cleared.
    pub fn load(&mut self) -> Task {
        self.generation += 1;
        self.loading = true;
        let generation = self.generation;
        let gateway = Arc::clone(&self.gateway);
        debug!(generation, "load objects");
        async move {
            let result = gateway.available_objects().await;
            Outcome::Objects { generation, result }
        }
        .boxed_local()
    }

    /// Discards all edits by reloading from the gateway. Edits stay visible until
    /// the reload settles, but nothing can be saved in between.
    pub fn cancel(&mut self) -> Task {
        info!("cancel: discarding edits");
        self.load()
    }

    /// Opens or closes an object's field panel. Returns a task when fields must be fetched.
    pub fn toggle_expanded(&mut self, object_api_name: &str) -> Option<Task> {
        let fetch = self.expansion.toggle(&mut self.store, object_api_name)?;
        Some(self.fetch_fields(fetch.object_api_name))
    }

    /// Checks or unchecks an object. Checking an object that has no fields loaded
    /// and is not expanded expands it, which may return a field fetch task.
    pub fn toggle_object_selection(&mut self, object_api_name: &str, checked: bool) -> Option<Task> {
        match self.store.toggle_object_selection(object_api_name, checked) {
            ToggleEffect::AutoExpand => {
                debug!(object = %object_api_name, "auto-expand");
                let fetch = self.expansion.expand(&mut self.store, object_api_name)?;
                Some(self.fetch_fields(fetch.object_api_name))
            }
            ToggleEffect::None => None,
        }
    }

    /// Checks or unchecks a field. Ignored while the owning object is unchecked.
    pub fn toggle_field_selection(
        &mut self,
        object_api_name: &str,
        field_api_name: &str,
        checked: bool,
    ) -> bool {
        self.store
            .toggle_field_selection(object_api_name, field_api_name, checked)
    }

    /// Selects all fields of the object, or clears them if all are selected.
    pub fn toggle_all_fields(&mut self, object_api_name: &str) -> bool {
        self.store.toggle_all_fields(object_api_name)
    }

    /// Submits the current delta.
    ///
    /// Returns `None` without contacting the gateway when a save is already in
    /// progress, while objects are (re)loading, or when there is nothing to save
    /// (an info notification is emitted).
    pub fn save(&mut self) -> Option<Task> {
        if self.is_saving() {
            warn!("save ignored: save already in progress");
            return None;
        }
        if self.is_loading() {
            warn!("save ignored: objects are loading");
            return None;
        }
        let delta = self.delta();
        if !delta.has_changes() {
            info!(class = %ErrorClass::NoChanges, "save skipped");
            self.notifier
                .notify(Notification::info("No changes", "No changes to save"));
            return None;
        }
        info!(changes = delta.change_count(), "saving tracked configuration");
        self.save_phase = SavePhase::Saving;
        let gateway = Arc::clone(&self.gateway);
        Some(
            async move {
                let result = gateway.save_tracked_configuration(&delta).await;
                Outcome::Saved { result }
            }
            .boxed_local(),
        )
    }

    fn fetch_fields(&self, object_api_name: String) -> Task {
        let generation = self.generation;
        let gateway = Arc::clone(&self.gateway);
        async move {
            let result = gateway.object_fields(&object_api_name).await;
            Outcome::Fields {
                generation,
                object_api_name,
                result,
            }
        }
        .boxed_local()
    }

    // ------------------------------------------------------------------
    // outcomes
    // ------------------------------------------------------------------

    /// Applies a settled gateway call. Returns follow-up tasks.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<Task> {
        match outcome {
            Outcome::Objects { generation, result } => {
                self.objects_settled(generation, result);
                Vec::new()
            }
            Outcome::Fields {
                generation,
                object_api_name,
                result,
            } => {
                self.fields_settled(generation, &object_api_name, result);
                Vec::new()
            }
            Outcome::Saved { result } => self.save_settled(result),
        }
    }

    fn objects_settled(&mut self, generation: u64, result: Result<Vec<ObjectInfo>>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale object list dropped");
            return;
        }
        self.loading = false;
        self.expansion.reset();
        match result {
            Ok(objects) => self.store.replace(objects),
            Err(err) => {
                error!(class = %ErrorClass::Load, error = %err, transient = err.is_transient(), "load objects failed");
                self.store.clear();
                self.notifier.notify(Notification::error(
                    "Error loading objects",
                    err.user_message(),
                ));
            }
        }
    }

    fn fields_settled(
        &mut self,
        generation: u64,
        object_api_name: &str,
        result: Result<Vec<FieldInfo>>,
    ) {
        if generation != self.generation {
            debug!(object = %object_api_name, generation, "stale field list dropped");
            return;
        }
        let result = result.map_err(|err| {
            error!(class = %ErrorClass::Load, object = %object_api_name, error = %err, transient = err.is_transient(), "load fields failed");
            err.user_message()
        });
        if let FieldsApplied::Failed(message) =
            self.expansion
                .fields_settled(&mut self.store, object_api_name, result)
        {
            self.notifier
                .notify(Notification::error("Error loading fields", message));
        }
    }

    fn save_settled(&mut self, result: Result<String>) -> Vec<Task> {
        self.save_phase = SavePhase::Idle;
        match result.and_then(|payload| SaveResult::parse(&payload)) {
            Ok(saved) => {
                info!(
                    deployment = %saved.mdt_deployment_id,
                    triggers = saved.trigger_deployment_ids.len(),
                    warnings = saved.trigger_errors.len(),
                    "save succeeded"
                );
                for warning in &saved.trigger_errors {
                    warn!(warning = %warning, "trigger deployment warning");
                }
                self.notifier
                    .notify(Notification::success("Success", success_message(&saved)));
                vec![self.load()]
            }
            Err(err) => {
                error!(class = %ErrorClass::Save, error = %err, "save failed");
                self.notifier.notify(Notification::error(
                    "Error saving configuration",
                    err.user_message(),
                ));
                Vec::new()
            }
        }
    }

    /// Runs a task and every follow-up it produces, applying outcomes in order.
    pub async fn settle(&mut self, task: Task) {
        self.settle_all(std::iter::once(task)).await;
    }

    /// Runs tasks one at a time, applying each outcome before starting the next.
    pub async fn settle_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        let mut queue: VecDeque<Task> = tasks.into_iter().collect();
        while let Some(task) = queue.pop_front() {
            let outcome = task.await;
            queue.extend(self.apply(outcome));
        }
    }

    // ------------------------------------------------------------------
    // derived state
    // ------------------------------------------------------------------

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn objects(&self) -> &[TrackableObject] {
        self.store.objects()
    }

    pub fn object(&self, api_name: &str) -> Option<&TrackableObject> {
        self.store.object(api_name)
    }

    pub fn expansion(&self) -> &Expansion {
        self.expansion.state()
    }

    /// Api name of the object whose field panel is open
    pub fn expanded_object(&self) -> Option<&str> {
        self.expansion.active()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// true until the latest object load settles
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.save_phase == SavePhase::Saving
    }

    pub fn save_phase(&self) -> SavePhase {
        self.save_phase
    }

    pub fn selected_count(&self) -> usize {
        self.store.selected_count()
    }

    pub fn total_count(&self) -> usize {
        self.store.total_count()
    }

    /// "<selected> of <total>"
    pub fn summary(&self) -> String {
        format!("{} of {}", self.selected_count(), self.total_count())
    }

    pub fn delta(&self) -> SelectionDelta {
        compute_delta(self.store.objects())
    }

    pub fn has_changes(&self) -> bool {
        self.delta().has_changes()
    }

    /// Save action is offered while neither saving nor loading, and either some
    /// object is selected or there are pending changes (deactivating the last
    /// tracked object).
    pub fn save_enabled(&self) -> bool {
        !self.is_saving()
            && !self.is_loading()
            && (self.store.has_selected_objects() || self.has_changes())
    }
}

/// Text of the notification shown after a successful save
pub fn success_message(saved: &SaveResult) -> String {
    let mut message = format!(
        "Tracking configuration deployed (id {})",
        saved.mdt_deployment_id
    );
    match saved.trigger_deployment_ids.len() {
        0 => {}
        1 => message.push_str(". 1 trigger deployment queued"),
        n => message.push_str(&format!(". {n} trigger deployments queued")),
    }
    if saved.has_warnings() {
        message.push_str(". Warnings: ");
        message.push_str(&saved.trigger_errors.join("; "));
    }
    message
}
