use super::SortLabel;
use crate::types::TopologyNode;
use std::collections::HashSet;

/// Built-in sort keys as `(value, label)`
pub const STANDARD_SORT_LABELS: [(&str, &str); 3] =
    [("status", "Status"), ("name", "Name"), ("type", "Type")];

/// Sortable fields for a set of nodes.
///
/// Empty input yields no labels at all, which hides the sort controls.
pub fn derive_sort_labels(nodes: &[TopologyNode]) -> Vec<SortLabel> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut labels = Vec::new();

    for (value, label) in STANDARD_SORT_LABELS {
        seen.insert(value.to_string());
        labels.push(SortLabel::standard(value, label));
    }

    for property in nodes.iter().flat_map(|n| n.headline_properties()) {
        if property.name.is_empty() || !seen.insert(property.name.clone()) {
            continue;
        }
        labels.push(SortLabel::custom(
            property.name.clone(),
            property.display_label(),
        ));
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Property;

    fn node_with(props: Vec<Property>) -> TopologyNode {
        TopologyNode {
            id: "n".into(),
            name: Some("N".into()),
            properties: props,
            ..Default::default()
        }
    }

    fn headline(name: &str, label: Option<&str>) -> Property {
        Property {
            name: name.into(),
            label: label.map(Into::into),
            headline: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_nodes_have_no_labels() {
        assert!(derive_sort_labels(&[]).is_empty());
    }

    #[test]
    fn test_standard_labels_come_first() {
        let labels = derive_sort_labels(&[node_with(vec![])]);
        let values: Vec<&str> = labels.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(values, vec!["status", "name", "type"]);
        assert!(labels.iter().all(|l| l.standard));
    }

    #[test]
    fn test_headline_properties_become_custom_labels() {
        let nodes = vec![
            node_with(vec![
                headline("cpu", Some("CPU")),
                Property {
                    name: "zone".into(),
                    ..Default::default()
                },
            ]),
            node_with(vec![headline("cpu", Some("Processor")), headline("memory", None)]),
        ];

        let labels = derive_sort_labels(&nodes);
        let custom: Vec<&SortLabel> = labels.iter().filter(|l| !l.standard).collect();
        assert_eq!(
            custom,
            vec![
                &SortLabel::custom("cpu", "CPU"),
                &SortLabel::custom("memory", "memory"),
            ]
        );
    }

    #[test]
    fn test_custom_label_cannot_shadow_standard() {
        let labels = derive_sort_labels(&[node_with(vec![headline("status", Some("Pod status"))])]);
        let status: Vec<&SortLabel> = labels.iter().filter(|l| l.value == "status").collect();
        assert_eq!(status.len(), 1);
        assert!(status[0].standard);
    }
}
