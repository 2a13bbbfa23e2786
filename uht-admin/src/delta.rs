//! Delta calculation
//!
//! Diffs live selection against baseline to produce the minimal set of
//! activations and deactivations to send to the controller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::TrackableObject;

/// Request body of `saveTrackedConfiguration`.
///
/// Field maps are keyed by object api name. Objects with no qualifying fields
/// have no key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDelta {
    pub objects_to_activate: Vec<String>,
    pub objects_to_deactivate: Vec<String>,
    pub fields_to_activate: BTreeMap<String, Vec<String>>,
    pub fields_to_deactivate: BTreeMap<String, Vec<String>>,
}

impl SelectionDelta {
    /// true if any of the four collections is non-empty
    pub fn has_changes(&self) -> bool {
        !(self.objects_to_activate.is_empty()
            && self.objects_to_deactivate.is_empty()
            && self.fields_to_activate.is_empty()
            && self.fields_to_deactivate.is_empty())
    }

    /// Total number of object and field operations
    pub fn change_count(&self) -> usize {
        self.objects_to_activate.len()
            + self.objects_to_deactivate.len()
            + self.fields_to_activate.values().map(Vec::len).sum::<usize>()
            + self.fields_to_deactivate.values().map(Vec::len).sum::<usize>()
    }
}

/// Computes the delta between selection and baseline.
///
/// Objects whose fields were never loaded contribute no field entries.
pub fn compute_delta(objects: &[TrackableObject]) -> SelectionDelta {
    let mut delta = SelectionDelta::default();
    for obj in objects {
        match (obj.is_selected, obj.is_tracked_baseline) {
            (true, false) => delta.objects_to_activate.push(obj.api_name.clone()),
            (false, true) => delta.objects_to_deactivate.push(obj.api_name.clone()),
            _ => {}
        }

        let mut activate = Vec::new();
        let mut deactivate = Vec::new();
        for field in obj.fields.fields() {
            match (field.is_selected, field.is_tracked_baseline) {
                (true, false) => activate.push(field.api_name.clone()),
                (false, true) => deactivate.push(field.api_name.clone()),
                _ => {}
            }
        }
        if !activate.is_empty() {
            delta.fields_to_activate.insert(obj.api_name.clone(), activate);
        }
        if !deactivate.is_empty() {
            delta
                .fields_to_deactivate
                .insert(obj.api_name.clone(), deactivate);
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldInfo, FieldType, ObjectInfo};
    use crate::store::SelectionStore;

    fn store() -> SelectionStore {
        let mut store = SelectionStore::new();
        store.replace(vec![
            ObjectInfo {
                api_name: "Account".into(),
                label: "Account".into(),
                is_tracked: true,
                is_custom: false,
            },
            ObjectInfo {
                api_name: "Contact".into(),
                label: "Contact".into(),
                is_tracked: false,
                is_custom: false,
            },
            ObjectInfo {
                api_name: "Custom_Object__c".into(),
                label: "Custom Object".into(),
                is_tracked: false,
                is_custom: true,
            },
        ]);
        store
    }

    fn account_fields() -> Vec<FieldInfo> {
        vec![
            FieldInfo {
                api_name: "Name".into(),
                label: "Account Name".into(),
                field_type: FieldType::Text,
                is_tracked: true,
            },
            FieldInfo {
                api_name: "Industry".into(),
                label: "Industry".into(),
                field_type: FieldType::Picklist,
                is_tracked: false,
            },
            FieldInfo {
                api_name: "AnnualRevenue".into(),
                label: "Annual Revenue".into(),
                field_type: FieldType::Currency,
                is_tracked: false,
            },
        ]
    }

    #[test]
    fn baseline_has_no_changes() {
        let store = store();
        let delta = compute_delta(store.objects());
        assert_eq!(delta, SelectionDelta::default());
        assert!(!delta.has_changes());
    }

    #[test]
    fn selecting_contact_activates_object_only() {
        let mut store = store();
        store.toggle_object_selection("Contact", true);
        let delta = compute_delta(store.objects());
        assert_eq!(delta.objects_to_activate, vec!["Contact".to_string()]);
        assert!(delta.objects_to_deactivate.is_empty());
        assert!(delta.fields_to_activate.is_empty());
        assert!(delta.fields_to_deactivate.is_empty());
        assert_eq!(
            serde_json::to_value(&delta).expect("serialize"),
            serde_json::json!({
                "objectsToActivate": ["Contact"],
                "objectsToDeactivate": [],
                "fieldsToActivate": {},
                "fieldsToDeactivate": {}
            })
        );
    }

    #[test]
    fn selecting_industry_activates_field() {
        let mut store = store();
        store.set_fields("Account", account_fields());
        store.toggle_field_selection("Account", "Industry", true);
        let delta = compute_delta(store.objects());
        assert_eq!(
            serde_json::to_value(&delta).expect("serialize"),
            serde_json::json!({
                "objectsToActivate": [],
                "objectsToDeactivate": [],
                "fieldsToActivate": {"Account": ["Industry"]},
                "fieldsToDeactivate": {}
            })
        );
        assert_eq!(delta.change_count(), 1);
    }

    #[test]
    fn deselecting_loaded_object_deactivates_object_and_tracked_fields() {
        let mut store = store();
        store.set_fields("Account", account_fields());
        store.toggle_object_selection("Account", false);
        let delta = compute_delta(store.objects());
        assert_eq!(delta.objects_to_deactivate, vec!["Account".to_string()]);
        assert_eq!(
            delta.fields_to_deactivate.get("Account"),
            Some(&vec!["Name".to_string()])
        );
        assert!(!delta.fields_to_activate.contains_key("Account"));
    }

    #[test]
    fn returning_to_baseline_yields_empty_delta() {
        let mut store = store();
        store.toggle_object_selection("Contact", true);
        store.toggle_object_selection("Contact", false);
        store.set_fields("Account", account_fields());
        store.toggle_field_selection("Account", "Industry", true);
        store.toggle_field_selection("Account", "Industry", false);
        let delta = compute_delta(store.objects());
        assert!(!delta.has_changes(), "{delta:?}");
    }

    #[test]
    fn compute_is_pure() {
        let mut store = store();
        store.toggle_object_selection("Custom_Object__c", true);
        store.set_fields("Account", account_fields());
        store.toggle_all_fields("Account");
        let snapshot = store.objects().to_vec();
        let first = compute_delta(store.objects());
        let second = compute_delta(store.objects());
        assert_eq!(first, second);
        assert_eq!(store.objects(), snapshot.as_slice());
        assert_eq!(
            first.fields_to_activate.get("Account"),
            Some(&vec!["Industry".to_string(), "AnnualRevenue".to_string()])
        );
    }
}
