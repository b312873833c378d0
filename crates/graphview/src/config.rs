use serde::{Deserialize, Serialize};

/// Viewport, culling and level-of-detail tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// World units added on every side of the visible rectangle.
    pub padding: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Below this scale nodes are plain dots.
    pub lod_low: f64,
    /// From this scale icons are drawn.
    pub lod_mid: f64,
    /// From this scale labels are drawn.
    pub lod_high: f64,
    /// Node count above which every LOD threshold is multiplied by `large_graph_lod_factor`.
    pub large_graph_threshold: usize,
    pub large_graph_lod_factor: f64,
    /// Screen margin kept around content by `fit`.
    pub fit_margin: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            padding: 100.0,
            min_scale: 0.1,
            max_scale: 4.0,
            lod_low: 0.4,
            lod_mid: 0.7,
            lod_high: 1.2,
            large_graph_threshold: 1000,
            large_graph_lod_factor: 1.5,
            fit_margin: 40.0,
        }
    }
}
