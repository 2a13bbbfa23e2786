//! Expansion controller
//!
//! At most one object's field panel is open at a time.
//!
//! ```text
//! Collapsed --toggle--> Expanding --fields settled--> Expanded --toggle--> Collapsed
//! ```
//!
//! Entering `Expanding` issues a field fetch only when the object has no cached
//! field list and no fetch outstanding. An object with cached fields goes
//! straight to `Expanded`. Opening another object collapses the current one
//! without discarding its cached fields.

use tracing::debug;

use crate::{
    model::{FieldInfo, FieldState},
    store::SelectionStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Expansion {
    #[default]
    Collapsed,
    Expanding(String),
    Expanded(String),
}

/// Field fetch the caller must issue for `object_api_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFetch {
    pub object_api_name: String,
}

/// Result of applying a settled field fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldsApplied {
    Loaded,
    /// Fields were stored for an object that is no longer expanded
    Cached,
    Failed(String),
    /// Nothing was outstanding, or a failure arrived for an object no longer expanded.
    Stale,
}

#[derive(Debug, Default)]
pub struct ExpansionController {
    state: Expansion,
}

impl ExpansionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Expansion {
        &self.state
    }

    /// Api name of the expanding or expanded object
    pub fn active(&self) -> Option<&str> {
        match &self.state {
            Expansion::Collapsed => None,
            Expansion::Expanding(name) | Expansion::Expanded(name) => Some(name),
        }
    }

    pub fn is_expanded(&self, api_name: &str) -> bool {
        self.active() == Some(api_name)
    }

    /// Opens `api_name` if it is closed, closes it if it is open.
    pub fn toggle(&mut self, store: &mut SelectionStore, api_name: &str) -> Option<FieldFetch> {
        if self.is_expanded(api_name) {
            self.collapse(store);
            None
        } else {
            self.expand(store, api_name)
        }
    }

    /// Opens `api_name`, collapsing any other open object.
    pub fn expand(&mut self, store: &mut SelectionStore, api_name: &str) -> Option<FieldFetch> {
        let fields = &store.object(api_name)?.fields;
        let needs_fetch = matches!(fields, FieldState::NotLoaded | FieldState::Failed { .. });
        let loaded = fields.is_loaded();

        store.set_expanded(Some(api_name));
        if loaded {
            debug!(object = %api_name, "expanded from cache");
            self.state = Expansion::Expanded(api_name.to_string());
            return None;
        }
        self.state = Expansion::Expanding(api_name.to_string());
        if needs_fetch {
            store.begin_field_load(api_name);
            debug!(object = %api_name, "expanding, fetching fields");
            Some(FieldFetch {
                object_api_name: api_name.to_string(),
            })
        } else {
            debug!(object = %api_name, "expanding, fetch already outstanding");
            None
        }
    }

    pub fn collapse(&mut self, store: &mut SelectionStore) {
        if let Some(name) = self.active() {
            debug!(object = %name, "collapsed");
        }
        store.set_expanded(None);
        self.state = Expansion::Collapsed;
    }

    /// Forgets expansion without touching the store. Used when the store is replaced.
    pub fn reset(&mut self) {
        self.state = Expansion::Collapsed;
    }

    /// Applies a settled field fetch.
    ///
    /// Results are applied only while the object's fetch is outstanding. Fields for
    /// an object the user has moved away from are still cached, but the expansion
    /// stays where it is; a failure for such an object is forgotten so the next
    /// expansion fetches again. Failure of the active object still completes the
    /// expansion, with an error in place of the fields.
    pub fn fields_settled(
        &mut self,
        store: &mut SelectionStore,
        api_name: &str,
        result: Result<Vec<FieldInfo>, String>,
    ) -> FieldsApplied {
        let outstanding = store
            .object(api_name)
            .is_some_and(|o| o.fields.is_loading());
        if !outstanding {
            debug!(object = %api_name, "field result ignored: no fetch outstanding");
            return FieldsApplied::Stale;
        }
        if !self.is_expanded(api_name) {
            return match result {
                Ok(fields) => {
                    debug!(object = %api_name, "fields cached for collapsed object");
                    store.set_fields(api_name, fields);
                    FieldsApplied::Cached
                }
                Err(_) => {
                    debug!(object = %api_name, "field failure ignored: object no longer expanded");
                    store.reset_fields(api_name);
                    FieldsApplied::Stale
                }
            };
        }

        self.state = Expansion::Expanded(api_name.to_string());
        match result {
            Ok(fields) => {
                store.set_fields(api_name, fields);
                FieldsApplied::Loaded
            }
            Err(message) => {
                store.fail_fields(api_name, message.clone());
                FieldsApplied::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, ObjectInfo};

    fn store() -> SelectionStore {
        let mut store = SelectionStore::new();
        store.replace(
            ["Account", "Contact"]
                .into_iter()
                .map(|name| ObjectInfo {
                    api_name: name.into(),
                    label: name.into(),
                    is_tracked: name == "Account",
                    is_custom: false,
                })
                .collect(),
        );
        store
    }

    fn fields() -> Vec<FieldInfo> {
        vec![FieldInfo {
            api_name: "Name".into(),
            label: "Name".into(),
            field_type: FieldType::Text,
            is_tracked: true,
        }]
    }

    #[test]
    fn first_expand_fetches_then_cache_is_used() {
        let mut store = store();
        let mut ctl = ExpansionController::new();

        let fetch = ctl.toggle(&mut store, "Account");
        assert_eq!(
            fetch,
            Some(FieldFetch {
                object_api_name: "Account".into()
            })
        );
        assert_eq!(ctl.state(), &Expansion::Expanding("Account".into()));
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Ok(fields())),
            FieldsApplied::Loaded
        );
        assert_eq!(ctl.state(), &Expansion::Expanded("Account".into()));

        assert_eq!(ctl.toggle(&mut store, "Account"), None);
        assert_eq!(ctl.state(), &Expansion::Collapsed);
        assert!(store.object("Account").is_some_and(|o| o.fields.is_loaded()));

        assert_eq!(ctl.toggle(&mut store, "Account"), None);
        assert_eq!(ctl.state(), &Expansion::Expanded("Account".into()));
    }

    #[test]
    fn expanding_second_object_collapses_first() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        ctl.expand(&mut store, "Account");
        ctl.fields_settled(&mut store, "Account", Ok(fields()));
        ctl.expand(&mut store, "Contact");
        assert_eq!(ctl.active(), Some("Contact"));
        assert!(!store.object("Account").is_some_and(|o| o.is_expanded));
        assert!(store.object("Contact").is_some_and(|o| o.is_expanded));
        assert!(store.object("Account").is_some_and(|o| o.fields.is_loaded()));
    }

    #[test]
    fn reexpanding_while_fetch_outstanding_does_not_refetch() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        assert!(ctl.expand(&mut store, "Account").is_some());
        ctl.collapse(&mut store);
        assert_eq!(ctl.expand(&mut store, "Account"), None);
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Ok(fields())),
            FieldsApplied::Loaded
        );
    }

    #[test]
    fn late_result_is_cached_without_moving_expansion() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        ctl.expand(&mut store, "Account");
        ctl.expand(&mut store, "Contact");
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Ok(fields())),
            FieldsApplied::Cached
        );
        assert!(store.object("Account").is_some_and(|o| o.fields.is_loaded()));
        assert!(!store.object("Account").is_some_and(|o| o.is_expanded));
        assert_eq!(ctl.state(), &Expansion::Expanding("Contact".into()));

        // cached, so going back needs no fetch
        assert_eq!(ctl.expand(&mut store, "Account"), None);
        assert_eq!(ctl.state(), &Expansion::Expanded("Account".into()));
    }

    #[test]
    fn late_failure_is_forgotten() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        ctl.expand(&mut store, "Account");
        ctl.expand(&mut store, "Contact");
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Err("Failed to load fields".into())),
            FieldsApplied::Stale
        );
        assert_eq!(
            store.object("Account").map(|o| o.fields.clone()),
            Some(FieldState::NotLoaded)
        );
        assert_eq!(ctl.state(), &Expansion::Expanding("Contact".into()));
    }

    #[test]
    fn result_without_outstanding_fetch_is_stale() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Ok(fields())),
            FieldsApplied::Stale
        );
        assert_eq!(
            store.object("Account").map(|o| o.fields.clone()),
            Some(FieldState::NotLoaded)
        );
    }

    #[test]
    fn failure_still_expands_and_next_expand_retries() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        ctl.expand(&mut store, "Account");
        assert_eq!(
            ctl.fields_settled(&mut store, "Account", Err("Failed to load fields".into())),
            FieldsApplied::Failed("Failed to load fields".into())
        );
        assert_eq!(ctl.state(), &Expansion::Expanded("Account".into()));
        assert!(store.object("Account").is_some_and(|o| o.field_count() == 0));

        ctl.collapse(&mut store);
        assert!(ctl.expand(&mut store, "Account").is_some());
    }

    #[test]
    fn unknown_object_is_ignored() {
        let mut store = store();
        let mut ctl = ExpansionController::new();
        assert_eq!(ctl.expand(&mut store, "Lead"), None);
        assert_eq!(ctl.state(), &Expansion::Collapsed);
    }
}
