//! Read-only records returned by the platform and equipment APIs.
//!
//! Only identifiers and display fields are typed. Everything else the
//! upstream sends is kept verbatim in `extra` and serialized back out.

use crate::errors::DashboardError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `{ "values": [...] }` list envelope used by every collection endpoint.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

pub fn parse_list<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
) -> Result<Vec<T>, DashboardError> {
    serde_json::from_value::<ListEnvelope<T>>(body)
        .map(|envelope| envelope.values)
        .map_err(|e| {
            DashboardError::InternalError(anyhow::anyhow!(
                "Unexpected response shape from {}: {}",
                endpoint,
                e
            ))
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// Ids arrive as strings from some endpoints and numbers from others.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to an owning organization embedded in other records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub principal_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// VIN / serial number.
    #[serde(default)]
    pub identification_number: Option<String>,
    #[serde(default)]
    pub organization: Option<OrganizationRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Equipment {
    pub fn display_name(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOperation {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn organizations_endpoint() -> String {
    "organizations".to_string()
}

pub fn equipment_endpoint() -> String {
    "equipment?status=all".to_string()
}

pub fn fields_endpoint(org_id: &str) -> String {
    format!("organizations/{}/fields?status=all", org_id)
}

pub fn field_operations_endpoint(org_id: &str, field_id: &str) -> String {
    format!("organizations/{}/fields/{}/fieldOperations", org_id, field_id)
}

/// Equipment and fields for one organization, fetched together. Each half
/// succeeds or fails on its own.
#[derive(Debug)]
pub struct OrganizationView {
    pub org_id: String,
    pub equipment: Result<Vec<Equipment>, DashboardError>,
    pub fields: Result<Vec<Field>, DashboardError>,
}
