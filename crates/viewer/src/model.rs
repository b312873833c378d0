//! KDL model parsing into layout nodes and edges.
//!
//! ```kdl
//! core-1 type="router" subgraph="dc1" size=14 label="Core" {
//!     link "edge-1" type="uplink" weight=2
//! }
//! ```

use std::collections::HashMap;

use anyhow::{Context, Result};
use graphlens_layout::{Edge, Node, Position, ResolveAppearance};
use kdl::{KdlDocument, KdlNode, KdlValue};

#[derive(Debug, Default)]
pub struct Model {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Parses a KDL model. Nodes without `type=` are skipped; links to unknown
/// nodes are kept and left for the layout to ignore.
pub fn parse_model(content: &str, appearance: &dyn ResolveAppearance) -> Result<Model> {
    let doc = KdlDocument::parse(content).context("invalid KDL model")?;
    let mut model = Model::default();
    let mut edge_ids: HashMap<String, usize> = HashMap::new();

    for kdl_node in doc.nodes() {
        let id = kdl_node.name().value().to_string();
        let Some(node_type) = prop(kdl_node, "type").and_then(KdlValue::as_string) else {
            tracing::warn!(id = %id, "skipping node without a type");
            continue;
        };

        let mut node = Node::new(&id, node_type);
        node.size = prop(kdl_node, "size")
            .and_then(number)
            .unwrap_or_else(|| appearance.resolve(node_type).size);
        node.subgraph = prop(kdl_node, "subgraph")
            .and_then(KdlValue::as_string)
            .map(str::to_string);
        node.label = prop(kdl_node, "label")
            .and_then(KdlValue::as_string)
            .map(str::to_string);
        if let (Some(x), Some(y)) = (
            prop(kdl_node, "x").and_then(number),
            prop(kdl_node, "y").and_then(number),
        ) {
            node.position = Some(Position::new(x, y));
        }
        model.nodes.push(node);

        let Some(children) = kdl_node.children() else {
            continue;
        };
        for child in children.nodes() {
            if child.name().value() != "link" {
                continue;
            }
            let Some(target) = argument(child).and_then(KdlValue::as_string) else {
                tracing::warn!(source = %id, "link without a target");
                continue;
            };
            let base = format!("{id}->{target}");
            let seen = edge_ids.entry(base.clone()).or_insert(0);
            *seen += 1;
            let edge_id = match prop(child, "id").and_then(KdlValue::as_string) {
                Some(explicit) => explicit.to_string(),
                None if *seen == 1 => base,
                None => format!("{base}#{seen}"),
            };

            let mut edge = Edge::new(edge_id, &id, target);
            edge.edge_type = prop(child, "type")
                .and_then(KdlValue::as_string)
                .map(str::to_string);
            edge.weight = prop(child, "weight").and_then(number);
            edge.timestamp = prop(child, "timestamp").and_then(number);
            model.edges.push(edge);
        }
    }

    tracing::info!(
        nodes = model.nodes.len(),
        edges = model.edges.len(),
        "model loaded"
    );
    Ok(model)
}

fn prop<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_some_and(|n| n.value() == key))
        .map(|e| e.value())
}

fn argument(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

fn number(value: &KdlValue) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use graphlens_layout::{Appearance, AppearanceTable};

    use super::*;

    const MODEL: &str = r#"
core type="router" subgraph="dc1" size=14 label="Core router" {
    link "edge" type="uplink" weight=2
    link "edge"
    link "ghost"
}
edge type="switch" x=10 y=20.5
note "no type here"
"#;

    #[test]
    fn test_parses_nodes_and_links() {
        let mut appearance = AppearanceTable::default();
        appearance.insert("switch", Appearance { size: 8.0 });
        let model = parse_model(MODEL, &appearance).unwrap();

        assert_eq!(model.nodes.len(), 2);
        let core = &model.nodes[0];
        assert_eq!(core.node_type, "router");
        assert_eq!(core.size, 14.0);
        assert_eq!(core.subgraph.as_deref(), Some("dc1"));
        assert_eq!(core.label.as_deref(), Some("Core router"));
        let edge = &model.nodes[1];
        assert_eq!(edge.size, 8.0);
        assert_eq!(edge.position, Some(Position::new(10.0, 20.5)));

        let ids: Vec<_> = model.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["core->edge", "core->edge#2", "core->ghost"]);
        assert_eq!(model.edges[0].weight, Some(2.0));
        assert_eq!(model.edges[0].edge_type.as_deref(), Some("uplink"));
    }

    #[test]
    fn test_invalid_kdl_is_an_error() {
        assert!(parse_model("node {", &AppearanceTable::default()).is_err());
    }
}
