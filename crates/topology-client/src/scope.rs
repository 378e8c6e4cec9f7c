//! Decides which nodes of a topology response are shown as cards

use crate::types::TopologyNode;
use tracing::warn;

/// Non-fatal data-quality problem found while resolving the displayed nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAnomaly {
    /// The backend returned more than one top-level node for a single id.
    /// The first one is used.
    MultipleRoots { id: String, count: usize },
}

impl std::fmt::Display for DataAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataAnomaly::MultipleRoots { id, count } => write!(
                f,
                "Response has {} components for the id {}",
                count, id
            ),
        }
    }
}

/// Nodes to display plus any anomaly detected on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub nodes: Vec<TopologyNode>,
    pub anomaly: Option<DataAnomaly>,
}

/// Resolve the nodes to display for `requested_id`.
///
/// Without an id the top-level list is shown. With an id the children of the
/// (first) matching root are shown, falling back to the top-level list when
/// the root has no children. Nodes without a name or title, and the requested
/// node itself, are left out, unless that leaves nothing, in which case the
/// requested node is shown alone.
pub fn resolve_displayed_nodes(raw: &[TopologyNode], requested_id: Option<&str>) -> Resolution {
    let Some(id) = requested_id else {
        return Resolution {
            nodes: displayable(raw, None),
            anomaly: None,
        };
    };

    let anomaly = if raw.len() > 1 {
        warn!(id, count = raw.len(), "multiple nodes for same id");
        Some(DataAnomaly::MultipleRoots {
            id: id.to_string(),
            count: raw.len(),
        })
    } else {
        None
    };

    let candidates = match raw.first() {
        Some(root) if !root.components.is_empty() => root.components.as_slice(),
        _ => {
            if !raw.is_empty() {
                warn!(id, "component doesn't have any child components");
            }
            raw
        }
    };

    let mut nodes = displayable(candidates, Some(id));
    if nodes.is_empty() {
        if let Some(node) = candidates.iter().find(|n| n.id == id) {
            nodes.push(node.clone());
        }
    }

    Resolution { nodes, anomaly }
}

fn displayable(candidates: &[TopologyNode], exclude_id: Option<&str>) -> Vec<TopologyNode> {
    candidates
        .iter()
        .filter(|n| n.display_name().is_some())
        .filter(|n| exclude_id != Some(n.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: Option<&str>) -> TopologyNode {
        TopologyNode {
            id: id.into(),
            name: name.map(Into::into),
            ..Default::default()
        }
    }

    fn with_children(mut parent: TopologyNode, children: Vec<TopologyNode>) -> TopologyNode {
        parent.components = children;
        parent
    }

    fn ids(resolution: &Resolution) -> Vec<&str> {
        resolution.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_no_id_shows_top_level() {
        let raw = vec![node("a", Some("A")), node("b", Some("B"))];
        let resolution = resolve_displayed_nodes(&raw, None);
        assert_eq!(ids(&resolution), vec!["a", "b"]);
        assert!(resolution.anomaly.is_none());
    }

    #[test]
    fn test_no_id_drops_unnamed_nodes() {
        let raw = vec![node("a", Some("A")), node("b", None)];
        let resolution = resolve_displayed_nodes(&raw, None);
        assert_eq!(ids(&resolution), vec!["a"]);
    }

    #[test]
    fn test_children_of_requested_root() {
        let root = with_children(
            node("root", Some("Root")),
            vec![node("a", Some("A")), node("b", Some("B"))],
        );
        let resolution = resolve_displayed_nodes(&[root], Some("root"));
        assert_eq!(ids(&resolution), vec!["a", "b"]);
    }

    #[test]
    fn test_children_exclude_self_and_unnamed() {
        let mut titled = node("c", None);
        titled.title = Some("C".into());
        let root = with_children(
            node("root", Some("Root")),
            vec![node("root", Some("Root")), node("a", None), titled],
        );
        let resolution = resolve_displayed_nodes(&[root], Some("root"));
        assert_eq!(ids(&resolution), vec!["c"]);
    }

    #[test]
    fn test_childless_single_node_is_recovered() {
        let raw = vec![node("root", Some("Root"))];
        let resolution = resolve_displayed_nodes(&raw, Some("root"));
        assert_eq!(ids(&resolution), vec!["root"]);
        assert_eq!(resolution.nodes[0].name.as_deref(), Some("Root"));
    }

    #[test]
    fn test_multiple_roots_use_first_and_flag() {
        let first = with_children(node("root", Some("Root")), vec![node("a", Some("A"))]);
        let second = with_children(node("root", Some("Root")), vec![node("b", Some("B"))]);
        let resolution = resolve_displayed_nodes(&[first, second], Some("root"));
        assert_eq!(ids(&resolution), vec!["a"]);
        assert_eq!(
            resolution.anomaly,
            Some(DataAnomaly::MultipleRoots {
                id: "root".into(),
                count: 2
            })
        );
    }

    #[test]
    fn test_recovery_without_match_is_empty() {
        let root = with_children(node("root", Some("Root")), vec![node("a", None)]);
        let resolution = resolve_displayed_nodes(&[root], Some("root"));
        assert!(resolution.nodes.is_empty());
    }

    #[test]
    fn test_empty_response_is_empty() {
        let resolution = resolve_displayed_nodes(&[], Some("root"));
        assert!(resolution.nodes.is_empty());
        assert!(resolution.anomaly.is_none());
    }

    #[test]
    fn test_source_is_untouched() {
        let raw = vec![with_children(
            node("root", Some("Root")),
            vec![node("b", Some("B")), node("a", Some("A"))],
        )];
        let before = raw.clone();
        let _ = resolve_displayed_nodes(&raw, Some("root"));
        assert_eq!(raw, before);
    }
}
