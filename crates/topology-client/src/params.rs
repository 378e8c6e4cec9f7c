//! Topology query parameters
//!
//! Filters equal to the [`ALL`] sentinel mean "no filter" and are dropped
//! before the query string is built, never sent as a literal match.

/// Sentinel filter value meaning "do not filter on this field"
pub const ALL: &str = "All";

/// Parameters for `GET /api/topology`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyParams {
    pub id: Option<String>,
    pub status: Option<String>,
    pub node_type: Option<String>,
    pub team: Option<String>,
    pub labels: Option<String>,
    pub agent_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub flatten: Option<bool>,
    pub hidden: Option<bool>,
}

impl TopologyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(sort_order.into());
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = Some(flatten);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Drop every filter set to the [`ALL`] sentinel.
    pub fn arranged(mut self) -> Self {
        for filter in [
            &mut self.node_type,
            &mut self.team,
            &mut self.labels,
            &mut self.status,
            &mut self.agent_id,
        ] {
            if filter.as_deref() == Some(ALL) {
                *filter = None;
            }
        }
        self
    }

    /// Present parameters as `(key, value)` pairs in wire order.
    ///
    /// Sentinel filters are removed first, so this is what gets transmitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let arranged = self.clone().arranged();
        let mut pairs = Vec::new();

        let strings = [
            ("id", arranged.id),
            ("status", arranged.status),
            ("type", arranged.node_type),
            ("team", arranged.team),
            ("labels", arranged.labels),
            ("agent_id", arranged.agent_id),
            ("sortBy", arranged.sort_by),
            ("sortOrder", arranged.sort_order),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                pairs.push((key, value));
            }
        }
        if let Some(flatten) = arranged.flatten {
            pairs.push(("flatten", flatten.to_string()));
        }
        if let Some(hidden) = arranged.hidden {
            pairs.push(("hidden", hidden.to_string()));
        }
        pairs
    }

    /// Encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.to_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sentinel_is_stripped() {
        let params = TopologyParams::new()
            .with_id("root")
            .with_status(ALL)
            .with_type(ALL)
            .with_team(ALL)
            .with_labels(ALL)
            .with_agent_id(ALL);

        assert_eq!(params.to_query_string(), "id=root");
    }

    #[test]
    fn test_only_sentinel_filters_are_stripped() {
        let params = TopologyParams::new()
            .with_type("Kubernetes::Pod")
            .with_team(ALL)
            .with_status("unhealthy");

        let query = params.to_query_string();
        assert_eq!(query, "status=unhealthy&type=Kubernetes%3A%3APod");
        assert!(!query.contains("team="));
    }

    #[test]
    fn test_sentinel_match_is_exact() {
        // "all" in lower case is a real value as far as the backend is concerned
        let params = TopologyParams::new().with_team("all");
        assert_eq!(params.to_query_string(), "team=all");
    }

    #[test]
    fn test_flags_and_sort_are_serialized() {
        let params = TopologyParams::new()
            .with_sort("cpu", "desc")
            .with_flatten(true)
            .with_hidden(false);

        assert_eq!(
            params.to_query_string(),
            "sortBy=cpu&sortOrder=desc&flatten=true&hidden=false"
        );
    }

    #[test]
    fn test_labels_are_encoded() {
        let params = TopologyParams::new().with_labels("app=web,tier=front end");
        assert_eq!(
            params.to_query_string(),
            "labels=app%3Dweb%2Ctier%3Dfront%20end"
        );
    }
}
