//! Page query parameters
//!
//! The cards page keeps its filter and sort state in the URL query. This
//! module parses that query, turns it into fetch parameters, and fills in
//! missing sort parameters from the stored preferences.

use crate::params::{TopologyParams, ALL};
use crate::preference::{PreferenceStorage, Preferences};
use crate::sort::SortLabel;

/// Filter and sort state carried in the page URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub node_type: Option<String>,
    pub team: Option<String>,
    pub labels: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub hide_filters: Option<String>,
    pub show_hidden_components: Option<String>,
    pub referer_id: Option<String>,
}

impl PageQuery {
    /// Parse a URL query string, with or without the leading `?`.
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut page = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "type" => page.node_type = value,
                "team" => page.team = value,
                "labels" => page.labels = value,
                "status" => page.status = value,
                "sortBy" => page.sort_by = value,
                "sortOrder" => page.sort_order = value,
                "hideFilters" => page.hide_filters = value,
                "showHiddenComponents" => page.show_hidden_components = value,
                "refererId" => page.referer_id = value,
                _ => {}
            }
        }
        page
    }

    pub fn node_type(&self) -> &str {
        self.node_type.as_deref().unwrap_or(ALL)
    }

    pub fn team(&self) -> &str {
        self.team.as_deref().unwrap_or(ALL)
    }

    pub fn labels(&self) -> &str {
        self.labels.as_deref().unwrap_or(ALL)
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(ALL)
    }

    /// Fetch parameters for the node `id` (or the global list).
    ///
    /// Results are flattened only when a concrete type is selected, and
    /// hidden components are excluded only when `showHiddenComponents=no`.
    pub fn to_params(&self, id: Option<&str>) -> TopologyParams {
        let node_type = self.node_type();
        TopologyParams {
            id: id.map(str::to_string),
            status: Some(self.status().to_string()),
            node_type: Some(node_type.to_string()),
            team: Some(self.team().to_string()),
            labels: Some(self.labels().to_string()),
            agent_id: None,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
            flatten: (!node_type.is_empty() && !node_type.eq_ignore_ascii_case("all"))
                .then_some(true),
            hidden: (self.show_hidden_components.as_deref() == Some("no")).then_some(false),
        }
    }

    /// Fill `sortBy`/`sortOrder` from preferences when neither is set.
    /// Returns whether anything changed.
    ///
    /// Preferences decide the actual sort. Sort params already in the query
    /// are left as they are and do not change the stored preference; a host
    /// that wants them applied passes them to
    /// [`TopologyView::set_sort_by`](crate::TopologyView::set_sort_by) and
    /// [`set_sort_order`](crate::TopologyView::set_sort_order), which also
    /// rewrite the query.
    pub fn seed_sort<S: PreferenceStorage>(
        &mut self,
        labels: &[SortLabel],
        prefs: &Preferences<S>,
    ) -> bool {
        if self.sort_by.is_some() || self.sort_order.is_some() {
            return false;
        }
        self.sort_by = Some(prefs.get_sort_by(labels));
        self.sort_order = Some(prefs.get_sort_order().to_string());
        true
    }

    /// Serialize back into a query string (without `?`)
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let fields = [
            ("type", &self.node_type),
            ("team", &self.team),
            ("labels", &self.labels),
            ("status", &self.status),
            ("sortBy", &self.sort_by),
            ("sortOrder", &self.sort_order),
            ("hideFilters", &self.hide_filters),
            ("showHiddenComponents", &self.show_hidden_components),
            ("refererId", &self.referer_id),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::MemoryStorage;
    use crate::sort::SortOrder;

    #[test]
    fn test_parse_known_keys() {
        let page = PageQuery::parse("?type=Pod&team=ops&sortBy=cpu&refererId=abc&other=1");
        assert_eq!(page.node_type.as_deref(), Some("Pod"));
        assert_eq!(page.team(), "ops");
        assert_eq!(page.labels(), ALL);
        assert_eq!(page.sort_by.as_deref(), Some("cpu"));
        assert_eq!(page.referer_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_default_page_sends_no_filters() {
        let params = PageQuery::default().to_params(Some("root"));
        assert_eq!(params.to_query_string(), "id=root");
    }

    #[test]
    fn test_flatten_only_with_concrete_type() {
        let page = PageQuery::parse("type=Kubernetes");
        assert_eq!(page.to_params(None).flatten, Some(true));

        let page = PageQuery::parse("type=all");
        assert_eq!(page.to_params(None).flatten, None);

        let page = PageQuery::parse("type=");
        assert_eq!(page.to_params(None).flatten, None);
        assert_eq!(page.to_params(None).to_query_string(), "type=");
    }

    #[test]
    fn test_hidden_only_when_show_hidden_is_no() {
        let page = PageQuery::parse("showHiddenComponents=no");
        assert_eq!(page.to_params(None).hidden, Some(false));

        let page = PageQuery::parse("showHiddenComponents=yes");
        assert_eq!(page.to_params(None).hidden, None);
    }

    #[test]
    fn test_seed_sort_from_preferences() {
        let prefs = Preferences::new(MemoryStorage::new());
        prefs.save_sort_order(SortOrder::Desc).unwrap();
        let labels = vec![SortLabel::standard("name", "Name")];
        prefs.save_sort_by("name", &labels).unwrap();

        let mut page = PageQuery::default();
        assert!(page.seed_sort(&labels, &prefs));
        assert_eq!(page.sort_by.as_deref(), Some("name"));
        assert_eq!(page.sort_order.as_deref(), Some("desc"));

        let mut page = PageQuery::parse("sortOrder=asc");
        assert!(!page.seed_sort(&labels, &prefs));
        assert!(page.sort_by.is_none());
    }

    #[test]
    fn test_query_string_round_trip() {
        let page = PageQuery::parse("labels=app%3Dweb&status=unhealthy&hideFilters=true");
        let reparsed = PageQuery::parse(&page.to_query_string());
        assert_eq!(reparsed, page);
    }
}
