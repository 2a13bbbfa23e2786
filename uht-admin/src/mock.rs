//! In-memory gateway for tests and offline demos.
//!
//! Every call is recorded. Replies can be scripted per operation to succeed, fail
//! with a message, or never settle. With [`MockGateway::persist_saves`] enabled,
//! a successful save updates the mock's own catalog so the next load reflects it.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    Result,
    delta::SelectionDelta,
    error::AdminError,
    gateway::Gateway,
    model::{FieldInfo, FieldType, ObjectInfo},
};

/// Scripted reply for one operation
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Err(String),
    /// The call never settles
    Pending,
}

/// Recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    AvailableObjects,
    ObjectFields(String),
    SaveTrackedConfiguration(SelectionDelta),
}

#[derive(Debug)]
struct MockState {
    objects: Reply<Vec<ObjectInfo>>,
    fields: HashMap<String, Reply<Vec<FieldInfo>>>,
    default_fields: Reply<Vec<FieldInfo>>,
    save: Option<Reply<String>>,
    persist_saves: bool,
    latency: Duration,
    deployments: u32,
    calls: Vec<GatewayCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            objects: Reply::Ok(Vec::new()),
            fields: HashMap::new(),
            default_fields: Reply::Ok(Vec::new()),
            save: None,
            persist_saves: false,
            latency: Duration::ZERO,
            deployments: 0,
            calls: Vec::new(),
        }
    }
}

/// Gateway answering from memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample catalog used by the terminal console's `--demo` mode.
    pub fn demo() -> Self {
        let mock = Self::new()
            .with_objects(vec![
                object("Account", "Account", true, false),
                object("Contact", "Contact", false, false),
                object("Opportunity", "Opportunity", true, false),
                object("Case", "Case", false, false),
                object("Invoice__c", "Invoice", false, true),
            ])
            .with_fields_for(
                "Account",
                vec![
                    field("Name", "Account Name", FieldType::Text, true),
                    field("Industry", "Industry", FieldType::Picklist, false),
                    field("AnnualRevenue", "Annual Revenue", FieldType::Currency, false),
                    field("Phone", "Account Phone", FieldType::Phone, false),
                ],
            )
            .with_fields_for(
                "Contact",
                vec![
                    field("FirstName", "First Name", FieldType::Text, false),
                    field("LastName", "Last Name", FieldType::Text, false),
                    field("Email", "Email", FieldType::Email, false),
                ],
            )
            .with_fields_for(
                "Opportunity",
                vec![
                    field("StageName", "Stage", FieldType::Picklist, true),
                    field("Amount", "Amount", FieldType::Currency, true),
                    field("CloseDate", "Close Date", FieldType::Date, false),
                ],
            )
            .with_fields_for(
                "Case",
                vec![
                    field("Status", "Status", FieldType::Picklist, false),
                    field("Priority", "Priority", FieldType::Picklist, false),
                ],
            )
            .with_fields_for(
                "Invoice__c",
                vec![
                    field("Total__c", "Total", FieldType::Currency, false),
                    field("Due__c", "Due Date", FieldType::Date, false),
                ],
            );
        mock.persist_saves(true);
        mock
    }

    pub fn with_objects(self, objects: Vec<ObjectInfo>) -> Self {
        self.state.lock().objects = Reply::Ok(objects);
        self
    }

    /// Fields returned for objects without a specific list
    pub fn with_fields(self, fields: Vec<FieldInfo>) -> Self {
        self.state.lock().default_fields = Reply::Ok(fields);
        self
    }

    pub fn with_fields_for(self, object_api_name: &str, fields: Vec<FieldInfo>) -> Self {
        self.state
            .lock()
            .fields
            .insert(object_api_name.to_string(), Reply::Ok(fields));
        self
    }

    pub fn reply_objects(&self, reply: Reply<Vec<ObjectInfo>>) {
        self.state.lock().objects = reply;
    }

    /// Sets the reply for every object without a specific reply
    pub fn reply_fields(&self, reply: Reply<Vec<FieldInfo>>) {
        self.state.lock().default_fields = reply;
    }

    pub fn reply_fields_for(&self, object_api_name: &str, reply: Reply<Vec<FieldInfo>>) {
        self.state
            .lock()
            .fields
            .insert(object_api_name.to_string(), reply);
    }

    /// Sets the raw save payload. Without a scripted reply a valid payload is generated.
    pub fn reply_save(&self, reply: Reply<String>) {
        self.state.lock().save = Some(reply);
    }

    /// When enabled, a successful save is written back into the mock catalog.
    pub fn persist_saves(&self, enabled: bool) {
        self.state.lock().persist_saves = enabled;
    }

    /// Delay applied before every reply
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn object_list_count(&self) -> usize {
        self.count(|call| matches!(call, GatewayCall::AvailableObjects))
    }

    pub fn field_fetch_count(&self, object_api_name: &str) -> usize {
        self.count(|call| matches!(call, GatewayCall::ObjectFields(name) if name == object_api_name))
    }

    /// Deltas submitted so far, oldest first
    pub fn saved_deltas(&self) -> Vec<SelectionDelta> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                GatewayCall::SaveTrackedConfiguration(delta) => Some(delta.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: GatewayCall) -> Duration {
        debug!(?call, "mock gateway call");
        let mut state = self.state.lock();
        state.calls.push(call);
        state.latency
    }

    fn apply_delta(state: &mut MockState, delta: &SelectionDelta) {
        if let Reply::Ok(objects) = &mut state.objects {
            for obj in objects.iter_mut() {
                if delta.objects_to_activate.contains(&obj.api_name) {
                    obj.is_tracked = true;
                }
                if delta.objects_to_deactivate.contains(&obj.api_name) {
                    obj.is_tracked = false;
                }
            }
        }
        for (object_api_name, reply) in &mut state.fields {
            let Reply::Ok(fields) = reply else {
                continue;
            };
            let on = delta.fields_to_activate.get(object_api_name);
            let off = delta.fields_to_deactivate.get(object_api_name);
            for field in fields.iter_mut() {
                if on.is_some_and(|names| names.contains(&field.api_name)) {
                    field.is_tracked = true;
                }
                if off.is_some_and(|names| names.contains(&field.api_name)) {
                    field.is_tracked = false;
                }
            }
        }
    }
}

async fn settle<T>(latency: Duration, reply: Reply<T>) -> Result<T> {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Err(message) => Err(AdminError::Gateway { message }),
        Reply::Pending => futures::future::pending().await,
    }
}

impl Gateway for MockGateway {
    async fn available_objects(&self) -> Result<Vec<ObjectInfo>> {
        let latency = self.record(GatewayCall::AvailableObjects);
        let reply = self.state.lock().objects.clone();
        settle(latency, reply).await
    }

    async fn object_fields(&self, object_api_name: &str) -> Result<Vec<FieldInfo>> {
        let latency = self.record(GatewayCall::ObjectFields(object_api_name.to_string()));
        let reply = {
            let state = self.state.lock();
            state
                .fields
                .get(object_api_name)
                .unwrap_or(&state.default_fields)
                .clone()
        };
        settle(latency, reply).await
    }

    async fn save_tracked_configuration(&self, delta: &SelectionDelta) -> Result<String> {
        let latency = self.record(GatewayCall::SaveTrackedConfiguration(delta.clone()));
        let reply = {
            let mut state = self.state.lock();
            match state.save.clone() {
                Some(reply) => reply,
                None => {
                    state.deployments += 1;
                    let payload = serde_json::json!({
                        "mdtDeploymentId": format!("mock-{:04}", state.deployments),
                        "triggerDeploymentIds": delta
                            .objects_to_activate
                            .iter()
                            .map(|name| format!("trigger-{name}"))
                            .collect::<Vec<_>>(),
                        "triggerErrors": [],
                    });
                    Reply::Ok(payload.to_string())
                }
            }
        };
        let result = settle(latency, reply).await;
        if result.is_ok() {
            let mut state = self.state.lock();
            if state.persist_saves {
                Self::apply_delta(&mut state, delta);
            }
        }
        result
    }
}

/// Shorthand for building an [`ObjectInfo`]
pub fn object(api_name: &str, label: &str, is_tracked: bool, is_custom: bool) -> ObjectInfo {
    ObjectInfo {
        api_name: api_name.to_string(),
        label: label.to_string(),
        is_tracked,
        is_custom,
    }
}

/// Shorthand for building a [`FieldInfo`]
pub fn field(api_name: &str, label: &str, field_type: FieldType, is_tracked: bool) -> FieldInfo {
    FieldInfo {
        api_name: api_name.to_string(),
        label: label.to_string(),
        field_type,
        is_tracked,
    }
}
