use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Size assumed for nodes whose type has no resolved appearance.
pub const DEFAULT_NODE_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Canvas size the layouts target, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 530.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Appearance-resolved radius; drives collision distance and mass.
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub subgraph: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_size() -> f64 {
    DEFAULT_NODE_SIZE
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            size: DEFAULT_NODE_SIZE,
            position: None,
            subgraph: None,
            label: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_subgraph(mut self, subgraph: impl Into<String>) -> Self {
        self.subgraph = Some(subgraph.into());
        self
    }

    /// Simulation mass, derived from the visual size.
    pub fn mass(&self) -> f64 {
        (self.size / 10.0).max(1.0)
    }

    /// Grouping key used to tell intra-cluster from inter-cluster edges.
    pub fn cluster_key(&self) -> &str {
        self.subgraph.as_deref().unwrap_or(&self.node_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            weight: None,
            timestamp: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Weight used by simulations; missing or non-positive weights count as 1.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => 1.0,
        }
    }
}

/// Layout-relevant part of a node type's appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub size: f64,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            size: DEFAULT_NODE_SIZE,
        }
    }
}

/// Maps a node type to its appearance.
pub trait ResolveAppearance {
    fn resolve(&self, node_type: &str) -> Appearance;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppearanceTable {
    #[serde(default)]
    pub default: Appearance,
    #[serde(default)]
    pub types: HashMap<String, Appearance>,
}

impl AppearanceTable {
    pub fn insert(&mut self, node_type: impl Into<String>, appearance: Appearance) {
        self.types.insert(node_type.into(), appearance);
    }
}

impl ResolveAppearance for AppearanceTable {
    fn resolve(&self, node_type: &str) -> Appearance {
        self.types.get(node_type).copied().unwrap_or(self.default)
    }
}

/// Overwrites every node's size with the one its type resolves to.
pub fn apply_appearance(nodes: &mut [Node], resolver: &dyn ResolveAppearance) {
    for node in nodes {
        node.size = resolver.resolve(&node.node_type).size;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("canvas dimensions must be finite and positive, got {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("unknown layout mode `{0}`")]
    UnknownMode(String),
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
