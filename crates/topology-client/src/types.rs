//! Types for the topology and component APIs

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the canary checker HTTP API (serves `/api/topology`)
    pub canary_checker_url: String,
    /// Base URL of the canary checker database REST endpoint
    pub canary_checker_db_url: String,
    /// Base URL of the incident commander REST endpoint
    pub incident_commander_url: String,
    /// Optional bearer token sent with every request
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            canary_checker_url: "http://localhost:8080/api/canary".to_string(),
            canary_checker_db_url: "http://localhost:8080/api/canary/db".to_string(),
            incident_commander_url: "http://localhost:8080/api/db".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Topology
// ============================================================================

/// Health state of a topology node.
///
/// Strings the backend sends that are not one of the known states are kept
/// verbatim in [`HealthStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
    #[default]
    Unknown,
    Other(String),
}

impl HealthStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
            Self::Other(s) => s,
        }
    }

    /// Severity rank, least severe first.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Unknown => 1,
            Self::Other(_) => 2,
            Self::Warning => 3,
            Self::Unhealthy => 4,
        }
    }
}

impl From<String> for HealthStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "healthy" => Self::Healthy,
            "warning" => Self::Warning,
            "unhealthy" => Self::Unhealthy,
            "unknown" | "" => Self::Unknown,
            _ => Self::Other(s),
        }
    }
}

impl From<HealthStatus> for String {
    fn from(status: HealthStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Value carried by a node property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

/// A named attribute on a topology node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
    /// Textual value, used when no `value` is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Summary properties shown on the card header; these become sort keys
    #[serde(default)]
    pub headline: bool,
}

impl Property {
    /// Display label, falling back to the property name when empty
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.name,
        }
    }

    /// Value used for ordering: `value` if set, otherwise `text`
    pub fn sort_value(&self) -> Option<PropertyValue> {
        self.value
            .clone()
            .or_else(|| self.text.clone().map(PropertyValue::Text))
    }
}

/// A node of the topology graph as returned by the canary checker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawTopologyNode")]
pub struct TopologyNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// Lookup relation to the owning node, not an ownership pointer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub properties: Vec<Property>,
    pub labels: BTreeMap<String, String>,
    pub components: Vec<TopologyNode>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub hidden: bool,
}

impl TopologyNode {
    /// Name if set and non-empty, otherwise title
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.title.as_deref().filter(|t| !t.is_empty()))
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Headline properties in declaration order
    pub fn headline_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.headline)
    }
}

/// Wire shape of a node. Unknown scalar fields end up in `extra` and are
/// folded into `properties` on conversion.
#[derive(Deserialize)]
struct RawTopologyNode {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    status: HealthStatus,
    #[serde(default)]
    status_reason: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    properties: Vec<Property>,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    components: Vec<TopologyNode>,
    #[serde(default, rename = "type")]
    node_type: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    hidden: bool,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl From<RawTopologyNode> for TopologyNode {
    fn from(raw: RawTopologyNode) -> Self {
        let mut properties = raw.properties;
        for (key, value) in &raw.extra {
            if properties.iter().any(|p| &p.name == key) {
                continue;
            }
            if let Some(value) = PropertyValue::from_json(value) {
                properties.push(Property {
                    name: key.clone(),
                    value: Some(value),
                    ..Default::default()
                });
            }
        }

        Self {
            id: raw.id,
            name: raw.name,
            title: raw.title,
            status: raw.status,
            status_reason: raw.status_reason,
            parent_id: raw.parent_id,
            properties,
            labels: raw.labels,
            components: raw.components,
            node_type: raw.node_type,
            team: raw.team,
            agent_id: raw.agent_id,
            icon: raw.icon,
            hidden: raw.hidden,
        }
    }
}

/// Response of `GET /api/topology`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<TopologyNode>,
    #[serde(default, rename = "healthStatuses", deserialize_with = "null_as_default")]
    pub health_statuses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<String>,
}

// ============================================================================
// Component & Health Check API Types
// ============================================================================

/// Row of the `component_names` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "type")]
    pub component_type: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Reference to the topology definition a component was created by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ComponentTopologyRow {
    #[serde(default)]
    pub topologies: Option<TopologyRef>,
}

/// Partial update for a component; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Health check summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub check_type: Option<String>,
}

/// Row of the `checks_by_component` view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealthCheck {
    pub component_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub check_type: Option<String>,
}

/// One historical result of a health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckStatus {
    pub check_id: String,
    pub time: String,
    pub status: bool,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub invalid: Option<bool>,
}

/// Page selector for paginated endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        self.page_index as u64 * self.page_size as u64
    }
}

/// A page of results with the exact total when the server reports it
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
}

/// Look-back window for check status history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    SixHours,
    TwelveHours,
    OneDay,
    ThreeDays,
    SevenDays,
    ThirtyDays,
    ThreeMonths,
}

impl TimeRange {
    /// Parse the short form used in the dashboard ("1h", "7d", "3mo", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "30m" => Some(Self::ThirtyMinutes),
            "1h" => Some(Self::OneHour),
            "3h" => Some(Self::ThreeHours),
            "6h" => Some(Self::SixHours),
            "12h" => Some(Self::TwelveHours),
            "1d" => Some(Self::OneDay),
            "3d" => Some(Self::ThreeDays),
            "7d" => Some(Self::SevenDays),
            "30d" => Some(Self::ThirtyDays),
            "3mo" => Some(Self::ThreeMonths),
            _ => None,
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::ThreeHours => 3 * 60,
            Self::SixHours => 6 * 60,
            Self::TwelveHours => 12 * 60,
            Self::OneDay => 24 * 60,
            Self::ThreeDays => 3 * 24 * 60,
            Self::SevenDays => 7 * 24 * 60,
            Self::ThirtyDays => 30 * 24 * 60,
            Self::ThreeMonths => 90 * 24 * 60,
        }
    }
}

/// Filters for check status history
#[derive(Debug, Clone, Default)]
pub struct CheckStatusFilter {
    /// Only results with this status (`true`/`false`)
    pub status: Option<bool>,
    /// Only results that took at least this many milliseconds
    pub min_duration_ms: Option<u64>,
}
