use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;

/// How much of a node is drawn at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailTier {
    /// Undecorated dots, faded, with hairline edges.
    Minimal,
    /// Plain shapes and edges.
    Shapes,
    /// Shapes with type icons.
    Icons,
    /// Icons and text labels.
    Full,
}

/// Drawing switches for one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub node_opacity: f64,
    pub edge_width: f64,
    pub edge_opacity: f64,
    pub arrows: bool,
    pub icons: bool,
    pub labels: bool,
}

impl DetailTier {
    /// Picks the tier for scale `k`.
    ///
    /// Graphs above the configured size threshold have every threshold
    /// multiplied up, so they simplify at closer zoom levels.
    pub fn select(k: f64, node_count: usize, config: &ViewportConfig) -> Self {
        let factor = if node_count > config.large_graph_threshold {
            config.large_graph_lod_factor
        } else {
            1.0
        };
        if k < config.lod_low * factor {
            DetailTier::Minimal
        } else if k < config.lod_mid * factor {
            DetailTier::Shapes
        } else if k < config.lod_high * factor {
            DetailTier::Icons
        } else {
            DetailTier::Full
        }
    }

    pub fn style(self) -> RenderStyle {
        match self {
            DetailTier::Minimal => RenderStyle {
                node_opacity: 0.6,
                edge_width: 0.5,
                edge_opacity: 0.3,
                arrows: false,
                icons: false,
                labels: false,
            },
            DetailTier::Shapes => RenderStyle {
                node_opacity: 1.0,
                edge_width: 1.0,
                edge_opacity: 0.6,
                arrows: true,
                icons: false,
                labels: false,
            },
            DetailTier::Icons => RenderStyle {
                node_opacity: 1.0,
                edge_width: 1.5,
                edge_opacity: 0.8,
                arrows: true,
                icons: true,
                labels: false,
            },
            DetailTier::Full => RenderStyle {
                node_opacity: 1.0,
                edge_width: 1.5,
                edge_opacity: 0.8,
                arrows: true,
                icons: true,
                labels: true,
            },
        }
    }
}
