use super::SortOrder;
use crate::types::{PropertyValue, TopologyNode};
use std::cmp::Ordering;

/// Return `nodes` ordered by `sort_by` in `order`.
///
/// `status`, `name` and `type` use built-in comparators; any other key is
/// looked up as a node property. Nodes missing that property always come
/// first. Ties are broken by name (case-insensitive) and then id, both
/// ascending whatever `order` is. The input is left untouched.
pub fn sort_topology(nodes: &[TopologyNode], sort_by: &str, order: SortOrder) -> Vec<TopologyNode> {
    let mut sorted = nodes.to_vec();
    sorted.sort_by(|a, b| {
        compare_primary(a, b, sort_by, order).then_with(|| tie_break(a, b))
    });
    sorted
}

fn compare_primary(a: &TopologyNode, b: &TopologyNode, sort_by: &str, order: SortOrder) -> Ordering {
    match sort_by {
        "status" => directed(a.status.severity().cmp(&b.status.severity()), order),
        "name" => directed(
            cmp_ignore_case(a.display_name().unwrap_or(""), b.display_name().unwrap_or("")),
            order,
        ),
        "type" => directed(
            cmp_ignore_case(
                a.node_type.as_deref().unwrap_or(""),
                b.node_type.as_deref().unwrap_or(""),
            ),
            order,
        ),
        property => {
            let a = property_value(a, property);
            let b = property_value(b, property);
            match (a, b) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => directed(cmp_values(&a, &b), order),
            }
        }
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn tie_break(a: &TopologyNode, b: &TopologyNode) -> Ordering {
    cmp_ignore_case(a.display_name().unwrap_or(""), b.display_name().unwrap_or(""))
        .then_with(|| a.id.cmp(&b.id))
}

fn property_value(node: &TopologyNode, name: &str) -> Option<PropertyValue> {
    node.property(name).and_then(|p| p.sort_value())
}

fn cmp_values(a: &PropertyValue, b: &PropertyValue) -> Ordering {
    match (a, b) {
        (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a.cmp(b),
        (PropertyValue::Number(a), PropertyValue::Number(b)) => a.total_cmp(b),
        (PropertyValue::Text(a), PropertyValue::Text(b)) => {
            cmp_ignore_case(a, b).then_with(|| a.cmp(b))
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

// bool < number < text
fn kind_rank(value: &PropertyValue) -> u8 {
    match value {
        PropertyValue::Bool(_) => 0,
        PropertyValue::Number(_) => 1,
        PropertyValue::Text(_) => 2,
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
