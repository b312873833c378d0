use std::path::Path;

use anyhow::{Context, Result};
use graphview::{RenderSet, Transform};
use svg::Document;
use svg::node::element::{Circle, Definitions, Group, Line, Marker, Path as SvgPath, Rectangle, Text};

const PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#9c755f",
];

/// Stable colour per node type.
fn color_for(node_type: &str) -> &'static str {
    let hash = node_type
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    PALETTE[hash as usize % PALETTE.len()]
}

/// Draws the render set in screen space.
pub fn render_svg(set: &RenderSet, transform: Transform, width: f64, height: f64) -> Document {
    let style = set.style;
    let mut document = Document::new()
        .set("viewBox", (0.0, 0.0, width, height))
        .set("width", width)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", "white"),
        );

    if style.arrows {
        let marker = Marker::new()
            .set("id", "arrow")
            .set("viewBox", "0 0 10 10")
            .set("refX", 10)
            .set("refY", 5)
            .set("markerWidth", 6)
            .set("markerHeight", 6)
            .set("orient", "auto-start-reverse")
            .add(SvgPath::new().set("d", "M 0 0 L 10 5 L 0 10 z").set("fill", "#888"));
        document = document.add(Definitions::new().add(marker));
    }

    let mut edges = Group::new()
        .set("stroke", "#888")
        .set("stroke-width", style.edge_width)
        .set("stroke-opacity", style.edge_opacity);
    for edge in &set.edges {
        let a = transform.apply(edge.source);
        let b = transform.apply(edge.target);
        let mut line = Line::new()
            .set("x1", a.x)
            .set("y1", a.y)
            .set("x2", b.x)
            .set("y2", b.y);
        if style.arrows {
            line = line.set("marker-end", "url(#arrow)");
        }
        edges = edges.add(line);
    }
    document = document.add(edges);

    let mut nodes = Group::new().set("fill-opacity", style.node_opacity);
    for node in &set.nodes {
        let at = transform.apply(node.position);
        let radius = if style.icons || style.labels {
            node.size * transform.k
        } else {
            (node.size * transform.k).clamp(1.0, 3.0)
        };
        let mut shape = Circle::new()
            .set("cx", at.x)
            .set("cy", at.y)
            .set("r", radius)
            .set("fill", color_for(&node.node_type));
        if style.icons {
            shape = shape.set("stroke", "#333").set("stroke-width", 1);
        }
        nodes = nodes.add(shape);

        if style.icons {
            let glyph = node
                .node_type
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase().to_string())
                .unwrap_or_default();
            nodes = nodes.add(
                Text::new(glyph)
                    .set("x", at.x)
                    .set("y", at.y + radius * 0.35)
                    .set("font-size", radius)
                    .set("font-family", "Arial")
                    .set("text-anchor", "middle")
                    .set("fill", "white"),
            );
        }
        if style.labels {
            let label = node.label.clone().unwrap_or_else(|| node.id.clone());
            nodes = nodes.add(
                Text::new(label)
                    .set("x", at.x)
                    .set("y", at.y + radius + 12.0)
                    .set("font-size", 11)
                    .set("font-family", "Arial")
                    .set("text-anchor", "middle")
                    .set("fill", "#222"),
            );
        }
    }
    document.add(nodes)
}

pub fn write_svg(path: &Path, document: &Document) -> Result<()> {
    svg::save(path, document).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use graphlens_layout::Position;
    use graphview::{DetailTier, Rect, VisibleEdge, VisibleNode};

    use super::*;

    fn set(tier: DetailTier) -> RenderSet {
        RenderSet {
            nodes: vec![VisibleNode {
                id: "core".into(),
                node_type: "router".into(),
                label: Some("Core router".into()),
                size: 10.0,
                position: Position::new(10.0, 10.0),
            }],
            edges: vec![VisibleEdge {
                id: "e".into(),
                source: Position::new(10.0, 10.0),
                target: Position::new(50.0, 50.0),
                edge_type: None,
            }],
            tier,
            style: tier.style(),
            bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
        }
    }

    #[test]
    fn test_labels_only_in_full_tier() {
        let full = render_svg(&set(DetailTier::Full), Transform::IDENTITY, 100.0, 100.0).to_string();
        assert!(full.contains("Core router"));
        assert!(full.contains("marker-end"));

        let minimal =
            render_svg(&set(DetailTier::Minimal), Transform::IDENTITY, 100.0, 100.0).to_string();
        assert!(!minimal.contains("Core router"));
        assert!(!minimal.contains("marker-end"));
        assert!(minimal.contains("<circle"));
    }

    #[test]
    fn test_type_colour_is_stable() {
        assert_eq!(color_for("router"), color_for("router"));
    }
}
