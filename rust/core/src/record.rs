// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backend records and the per-endpoint schemas they are parsed from.
//!
//! Every endpoint payload is first decoded into an explicit schema struct, so
//! a malformed response fails at the boundary instead of deep inside the
//! display code. Schemas then convert into the opaque [`Record`] that the
//! grouping and selection layers work on.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// What a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    File,
    FileVersion,
    View,
    Element,
    Designer,
    Coordinate,
}

impl RecordKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Project => "project",
            RecordKind::File => "file",
            RecordKind::FileVersion => "file_version",
            RecordKind::View => "view",
            RecordKind::Element => "element",
            RecordKind::Designer => "designer",
            RecordKind::Coordinate => "coordinate",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flat mapping of field name to value, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record of the given kind.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builds a record from any serializable schema value.
    ///
    /// Non-object values are stored under a single `value` field.
    pub fn from_serialize<T: Serialize + ?Sized>(kind: RecordKind, value: &T) -> Result<Self> {
        let fields = match serde_json::to_value(value)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Ok(Self { kind, fields })
    }

    /// Returns a field's value. JSON `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Returns a field rendered as a display label.
    ///
    /// Strings are returned as-is (including the empty string), scalars are
    /// formatted, and absent or `null` fields yield `None`.
    pub fn label(&self, name: &str) -> Option<String> {
        self.get(name).map(value_label)
    }

    /// Decodes the record's fields back into a schema struct.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Formats a JSON value as a grouping/display label.
pub(crate) fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Schemas that can be flattened into a [`Record`].
pub trait IntoRecord: Serialize {
    /// Kind tag attached to the produced record.
    const KIND: RecordKind;

    /// Flattens `self` into a record.
    fn to_record(&self) -> Result<Record> {
        Record::from_serialize(Self::KIND, self)
    }
}

/// Parses a JSON array payload into schema values.
pub fn parse_list<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>> {
    Ok(serde_json::from_value(payload)?)
}

/// Converts a list of schema values into records.
pub fn to_records<T: IntoRecord>(items: &[T]) -> Result<Vec<Record>> {
    items.iter().map(IntoRecord::to_record).collect()
}

/// One row of the projects table: a published version of a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFileVersion {
    pub project: String,
    pub file_name: String,
    pub version_number: i64,
    #[serde(default)]
    pub last_modified_time: Option<String>,
    #[serde(default)]
    pub last_modified_user: Option<String>,
    #[serde(default)]
    pub published_time: Option<String>,
    #[serde(default)]
    pub published_user: Option<String>,
    #[serde(default)]
    pub process_state: Option<String>,
}

impl IntoRecord for ProjectFileVersion {
    const KIND: RecordKind = RecordKind::FileVersion;
}

/// A 3D view available in one version of a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub view_name: String,
    pub version_number: i64,
    pub guid: String,
    #[serde(default)]
    pub urn: Option<String>,
}

impl IntoRecord for ViewSummary {
    const KIND: RecordKind = RecordKind::View;
}

/// A view reference nested inside a views-table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRef {
    pub view_name: String,
    pub guid: String,
    #[serde(default)]
    pub urn: Option<String>,
}

/// Views of one file version, as listed by the views table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewsTableEntry {
    pub project: String,
    pub discipline: String,
    pub file_name: String,
    pub version_number: i64,
    #[serde(default)]
    pub views: Vec<ViewRef>,
}

impl IntoRecord for ViewsTableEntry {
    const KIND: RecordKind = RecordKind::View;
}

/// A model element visible in a 3D view, with its raw property payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub object_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub element_data: Value,
    #[serde(default)]
    pub properties: Value,
}

impl IntoRecord for Element {
    const KIND: RecordKind = RecordKind::Element;
}

/// Geographic placement of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCoordinate {
    pub project: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub elevation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub angle: Option<f64>,
}

impl ProjectCoordinate {
    /// Whether the point can be placed on a map.
    pub fn is_plottable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Key identifying the coordinate pair (used by the geocode cache).
    pub fn pair_key(&self) -> String {
        format!("{}_{}", self.latitude, self.longitude)
    }
}

impl IntoRecord for ProjectCoordinate {
    const KIND: RecordKind = RecordKind::Coordinate;
}

/// A designer contact stored for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Designer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub discipline: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub position: String,
}

impl Designer {
    /// Builds an editable draft of this designer for `project_name`.
    pub fn to_draft(&self, project_name: &str) -> DesignerDraft {
        DesignerDraft {
            project_name: project_name.to_string(),
            discipline: self.discipline.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            company: self.company.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            position: self.position.clone(),
        }
    }
}

impl IntoRecord for Designer {
    const KIND: RecordKind = RecordKind::Designer;
}

/// Create/update payload for a designer. See [`DesignerDraft::validate`].
///
/// Missing fields deserialize as empty so validation can report them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerDraft {
    pub project_name: String,
    pub discipline: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub position: String,
}

/// Question sent to the chat backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatQuestion {
    pub question: String,
}

/// Chat backend reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn into_f64(self) -> std::result::Result<Option<f64>, String> {
        match self {
            LooseNumber::Number(n) => Ok(Some(n)),
            LooseNumber::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .replace(',', ".")
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|e| format!("invalid number {s:?}: {e}"))
            }
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    LooseNumber::deserialize(deserializer)?
        .into_f64()
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("empty number"))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    match Option::<LooseNumber>::deserialize(deserializer)? {
        Some(loose) => loose.into_f64().map_err(D::Error::custom),
        None => Ok(None),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_field_counts_as_absent() {
        let record = Record::new(RecordKind::FileVersion)
            .with("project", "A")
            .with("discipline", Value::Null)
            .with("file_name", "");

        assert_eq!(record.label("project").as_deref(), Some("A"));
        assert_eq!(record.label("discipline"), None);
        assert_eq!(record.label("missing"), None);
        assert_eq!(record.label("file_name").as_deref(), Some(""));
    }

    #[test]
    fn numeric_fields_format_as_labels() {
        let record = Record::new(RecordKind::View)
            .with("version_number", 3)
            .with("ratio", 0.5)
            .with("published", true);

        assert_eq!(record.label("version_number").as_deref(), Some("3"));
        assert_eq!(record.label("ratio").as_deref(), Some("0.5"));
        assert_eq!(record.label("published").as_deref(), Some("true"));
    }

    #[test]
    fn schema_flattens_into_record() {
        let row = ProjectFileVersion {
            project: "P1".into(),
            file_name: "P1_ARC_model.rvt".into(),
            version_number: 4,
            last_modified_time: None,
            last_modified_user: Some("anna".into()),
            published_time: None,
            published_user: None,
            process_state: Some("PROCESSED".into()),
        };

        let record = row.to_record().unwrap();
        assert_eq!(record.kind, RecordKind::FileVersion);
        assert_eq!(record.label("version_number").as_deref(), Some("4"));
        assert_eq!(record.label("last_modified_time"), None);

        let back: ProjectFileVersion = record.decode().unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn unsized_and_scalar_values_become_records() {
        let record = Record::from_serialize(RecordKind::Project, "Tower").unwrap();
        assert_eq!(record.label("value").as_deref(), Some("Tower"));

        let rows: &[i64] = &[1, 2];
        let record = Record::from_serialize(RecordKind::File, rows).unwrap();
        assert_eq!(record.get("value"), Some(&json!([1, 2])));
    }

    #[test]
    fn coordinates_accept_decimal_comma_strings() {
        let payload = json!([
            {
                "project": "Tower", "latitude": "31,77", "longitude": 35.21,
                "elevation": "12,5", "angle": null
            },
            {"project": "Depot", "latitude": 32.0, "longitude": 34.8}
        ]);

        let coords: Vec<ProjectCoordinate> = parse_list(payload).unwrap();
        assert_eq!(coords[0].latitude, 31.77);
        assert_eq!(coords[0].elevation, Some(12.5));
        assert_eq!(coords[0].angle, None);
        assert_eq!(coords[1].elevation, None);
        assert!(coords.iter().all(ProjectCoordinate::is_plottable));
    }

    #[test]
    fn malformed_payload_is_a_schema_error() {
        let payload = json!([{"view_name": "3D", "guid": "g-1"}]);
        let err = parse_list::<ViewSummary>(payload).unwrap_err();
        assert!(matches!(err, crate::Error::Schema(_)));
    }

    #[test]
    fn designer_tolerates_null_text_columns() {
        let payload = json!([{
            "id": 7, "discipline": "Electrical", "first_name": "Dana", "last_name": null,
            "company": "Volt", "email": "dana@volt.example", "phone": "+972 50 1234567",
            "position": null
        }]);

        let designers: Vec<Designer> = parse_list(payload).unwrap();
        assert_eq!(designers[0].last_name, "");
        assert_eq!(designers[0].to_draft("Tower").project_name, "Tower");
    }
}
