//! Trackable objects and fields
//!
//! Two families of types live here:
//!
//! - wire types returned by the controller: [`ObjectInfo`], [`FieldInfo`], [`SaveResult`]
//! - live records owned by the selection store: [`TrackableObject`], [`TrackableField`],
//!   with [`FieldState`] describing the lifecycle of an object's field list.
//!
//! `is_tracked_baseline` is the controller-confirmed state at last sync.
//! `is_selected` is the user-editable state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::error;

use crate::{Result, error::AdminError};

/// Object as listed by `getAvailableObjects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub api_name: String,
    pub label: String,
    pub is_tracked: bool,
    #[serde(default)]
    pub is_custom: bool,
}

/// Field as listed by `getObjectFields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub api_name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub is_tracked: bool,
}

/// Field data type. Unknown type names are preserved in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FieldType {
    #[strum(serialize = "STRING")]
    Text,
    #[strum(serialize = "TEXTAREA")]
    TextArea,
    #[strum(serialize = "PICKLIST")]
    Picklist,
    #[strum(serialize = "MULTIPICKLIST")]
    MultiPicklist,
    #[strum(serialize = "CURRENCY")]
    Currency,
    #[strum(serialize = "EMAIL")]
    Email,
    #[strum(serialize = "PHONE")]
    Phone,
    #[strum(serialize = "URL")]
    Url,
    #[strum(serialize = "BOOLEAN")]
    Boolean,
    #[strum(serialize = "DATE")]
    Date,
    #[strum(serialize = "DATETIME")]
    DateTime,
    #[strum(serialize = "DOUBLE")]
    Double,
    #[strum(serialize = "INTEGER")]
    Integer,
    #[strum(serialize = "PERCENT")]
    Percent,
    #[strum(serialize = "REFERENCE")]
    Reference,
    #[strum(default)]
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "STRING",
            FieldType::TextArea => "TEXTAREA",
            FieldType::Picklist => "PICKLIST",
            FieldType::MultiPicklist => "MULTIPICKLIST",
            FieldType::Currency => "CURRENCY",
            FieldType::Email => "EMAIL",
            FieldType::Phone => "PHONE",
            FieldType::Url => "URL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATETIME",
            FieldType::Double => "DOUBLE",
            FieldType::Integer => "INTEGER",
            FieldType::Percent => "PERCENT",
            FieldType::Reference => "REFERENCE",
            FieldType::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        // Other(..) is the strum default, so parsing never fails
        Ok(FieldType::from_str(&name).unwrap_or(FieldType::Other(name)))
    }
}

/// Deserialized payload of `saveTrackedConfiguration`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub mdt_deployment_id: String,
    pub trigger_deployment_ids: Vec<String>,
    pub trigger_errors: Vec<String>,
}

impl SaveResult {
    /// Parses the serialized save response.
    ///
    /// All three keys are required. A payload that is not json, is missing a key,
    /// or carries an empty deployment id is rejected.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(payload);
        let parsed: SaveResult = match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(value) => value,
            Err(err) => {
                error!("save response invalid at {}: {}", err.path(), err);
                return Err(AdminError::MalformedResponse {
                    what: "save".into(),
                    message: format!("{} at {}", err.inner(), err.path()),
                });
            }
        };
        if parsed.mdt_deployment_id.trim().is_empty() {
            return Err(AdminError::MalformedResponse {
                what: "save".into(),
                message: "empty mdtDeploymentId".into(),
            });
        }
        Ok(parsed)
    }

    pub fn has_warnings(&self) -> bool {
        !self.trigger_errors.is_empty()
    }
}

/// A field of a trackable object, with baseline and live selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackableField {
    pub api_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub is_tracked_baseline: bool,
    pub is_selected: bool,
}

impl From<FieldInfo> for TrackableField {
    fn from(info: FieldInfo) -> Self {
        TrackableField {
            api_name: info.api_name,
            label: info.label,
            field_type: info.field_type,
            is_tracked_baseline: info.is_tracked,
            is_selected: info.is_tracked,
        }
    }
}

/// Lifecycle of an object's field list.
///
/// `NotLoaded` until first expansion, `Loading` while the fetch is outstanding,
/// then `Loaded` (cached for the session) or `Failed` (not cached; the next
/// expansion retries).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<TrackableField>),
    Failed {
        message: String,
    },
}

impl FieldState {
    pub fn fields(&self) -> &[TrackableField] {
        match self {
            FieldState::Loaded(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FieldState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldState::Loading)
    }
}

/// A trackable object with its lazily loaded fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackableObject {
    pub api_name: String,
    pub label: String,
    pub is_custom: bool,
    pub is_tracked_baseline: bool,
    pub is_selected: bool,
    pub fields: FieldState,
    pub is_expanded: bool,
}

impl From<ObjectInfo> for TrackableObject {
    fn from(info: ObjectInfo) -> Self {
        TrackableObject {
            api_name: info.api_name,
            label: info.label,
            is_custom: info.is_custom,
            is_tracked_baseline: info.is_tracked,
            is_selected: info.is_tracked,
            fields: FieldState::NotLoaded,
            is_expanded: false,
        }
    }
}

impl TrackableObject {
    /// Number of loaded fields currently selected
    pub fn selected_field_count(&self) -> usize {
        self.fields.fields().iter().filter(|f| f.is_selected).count()
    }

    /// Number of loaded fields
    pub fn field_count(&self) -> usize {
        self.fields.fields().len()
    }

    /// true if the object has a non-empty loaded field list and every field is selected
    pub fn all_fields_selected(&self) -> bool {
        let fields = self.fields.fields();
        !fields.is_empty() && fields.iter().all(|f| f.is_selected)
    }

    /// Field checkboxes are editable only while the object itself is selected.
    pub fn fields_editable(&self) -> bool {
        self.is_selected
    }

    pub fn field(&self, field_api_name: &str) -> Option<&TrackableField> {
        self.fields
            .fields()
            .iter()
            .find(|f| f.api_name == field_api_name)
    }
}
