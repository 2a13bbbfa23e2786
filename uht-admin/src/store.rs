//! Selection store
//!
//! Owns every [`TrackableObject`] and its field list for the lifetime of a console.
//! All selection mutations go through here. Counts are computed on demand and never cached.

use tracing::{debug, trace};

use crate::model::{FieldInfo, FieldState, ObjectInfo, TrackableField, TrackableObject};

/// Side effect requested by [`SelectionStore::toggle_object_selection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    None,
    /// Object was switched on, has no loaded fields, and is not expanded.
    AutoExpand,
}

#[derive(Debug, Default, Clone)]
pub struct SelectionStore {
    objects: Vec<TrackableObject>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all objects. Baselines are overwritten wholesale, selection is reset
    /// to baseline, and expansion and cached fields are cleared.
    pub fn replace(&mut self, objects: Vec<ObjectInfo>) {
        self.objects = objects.into_iter().map(TrackableObject::from).collect();
        debug!(count = self.objects.len(), "store replaced");
    }

    /// Removes all objects.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn objects(&self) -> &[TrackableObject] {
        &self.objects
    }

    pub fn object(&self, api_name: &str) -> Option<&TrackableObject> {
        self.objects.iter().find(|o| o.api_name == api_name)
    }

    fn object_mut(&mut self, api_name: &str) -> Option<&mut TrackableObject> {
        let found = self.objects.iter_mut().find(|o| o.api_name == api_name);
        if found.is_none() {
            debug!(object = %api_name, "unknown object");
        }
        found
    }

    /// Sets an object's selection.
    ///
    /// Deselecting forces every loaded field off but keeps the cached list.
    /// Selecting an object whose fields are not loaded and which is not expanded
    /// returns [`ToggleEffect::AutoExpand`].
    pub fn toggle_object_selection(&mut self, api_name: &str, checked: bool) -> ToggleEffect {
        let Some(obj) = self.object_mut(api_name) else {
            return ToggleEffect::None;
        };
        obj.is_selected = checked;
        trace!(object = %api_name, checked, "object toggled");
        if checked {
            if !obj.fields.is_loaded() && !obj.is_expanded {
                return ToggleEffect::AutoExpand;
            }
        } else if let FieldState::Loaded(fields) = &mut obj.fields {
            for field in fields.iter_mut() {
                field.is_selected = false;
            }
        }
        ToggleEffect::None
    }

    /// Sets a field's selection. No-op while the owning object is unselected.
    /// Returns true if the field was updated.
    pub fn toggle_field_selection(
        &mut self,
        object_api_name: &str,
        field_api_name: &str,
        checked: bool,
    ) -> bool {
        let Some(obj) = self.object_mut(object_api_name) else {
            return false;
        };
        if !obj.is_selected {
            debug!(object = %object_api_name, field = %field_api_name, "field toggle ignored: object unselected");
            return false;
        }
        let FieldState::Loaded(fields) = &mut obj.fields else {
            return false;
        };
        match fields.iter_mut().find(|f| f.api_name == field_api_name) {
            Some(field) => {
                field.is_selected = checked;
                trace!(object = %object_api_name, field = %field_api_name, checked, "field toggled");
                true
            }
            None => false,
        }
    }

    /// Selects every field of the object, or deselects all of them if they are
    /// already all selected. No-op while the object is unselected.
    pub fn toggle_all_fields(&mut self, object_api_name: &str) -> bool {
        let Some(obj) = self.object_mut(object_api_name) else {
            return false;
        };
        if !obj.is_selected {
            return false;
        }
        let target = !obj.all_fields_selected();
        let FieldState::Loaded(fields) = &mut obj.fields else {
            return false;
        };
        for field in fields.iter_mut() {
            field.is_selected = target;
        }
        trace!(object = %object_api_name, selected = target, "all fields toggled");
        true
    }

    /// Marks an object's field list as being fetched.
    pub fn begin_field_load(&mut self, api_name: &str) {
        if let Some(obj) = self.object_mut(api_name) {
            obj.fields = FieldState::Loading;
        }
    }

    /// Installs a fetched field list, with selection equal to baseline.
    ///
    /// Fields of an unselected object start deselected, so a tracked field of an
    /// object the user just switched off does not reappear as selected.
    pub fn set_fields(&mut self, api_name: &str, fields: Vec<FieldInfo>) {
        if let Some(obj) = self.object_mut(api_name) {
            let selected = obj.is_selected;
            let mut fields: Vec<TrackableField> =
                fields.into_iter().map(TrackableField::from).collect();
            if !selected {
                for field in &mut fields {
                    field.is_selected = false;
                }
            }
            debug!(object = %api_name, count = fields.len(), "fields loaded");
            obj.fields = FieldState::Loaded(fields);
        }
    }

    pub fn fail_fields(&mut self, api_name: &str, message: String) {
        if let Some(obj) = self.object_mut(api_name) {
            obj.fields = FieldState::Failed { message };
        }
    }

    /// Drops any field state for the object so the next expansion fetches again.
    pub fn reset_fields(&mut self, api_name: &str) {
        if let Some(obj) = self.object_mut(api_name) {
            obj.fields = FieldState::NotLoaded;
        }
    }

    /// Marks `api_name` as the only expanded object, or collapses all with `None`.
    pub fn set_expanded(&mut self, api_name: Option<&str>) {
        for obj in &mut self.objects {
            obj.is_expanded = Some(obj.api_name.as_str()) == api_name;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_selected).count()
    }

    pub fn total_count(&self) -> usize {
        self.objects.len()
    }

    pub fn has_selected_objects(&self) -> bool {
        self.objects.iter().any(|o| o.is_selected)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// (selected, total) loaded fields of the object
    pub fn field_counts(&self, api_name: &str) -> Option<(usize, usize)> {
        self.object(api_name)
            .map(|o| (o.selected_field_count(), o.field_count()))
    }
}
