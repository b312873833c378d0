//! Tunables for every layout, grouped per strategy.
//!
//! All structs deserialize with defaults for missing fields, so a settings
//! file only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::types::{LayoutError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Seed for randomized initial placement and annealing jitter.
    pub seed: u64,
    pub force: ForceConfig,
    pub force_atlas2: ForceAtlas2Config,
    pub open_ord: OpenOrdConfig,
    pub circle: CircleConfig,
    pub radial: RadialConfig,
    pub hierarchy: HierarchyConfig,
    pub fast: FastConfig,
}

impl LayoutSettings {
    pub fn validate(&self) -> Result<()> {
        self.force.validate()?;
        self.force_atlas2.validate()?;
        self.open_ord.validate()
    }
}

/// Cooling and precision knobs; the force layout picks one of two by graph size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoolingProfile {
    pub velocity_decay: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    /// Repulsion is skipped beyond this distance.
    pub distance_max: f64,
    pub collide_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub link_distance_intra: f64,
    pub link_distance_inter: f64,
    pub link_strength_intra: f64,
    pub link_strength_inter: f64,
    /// Repulsion constant, applied as `charge / d²`.
    pub charge: f64,
    pub center_strength: f64,
    pub collision_padding: f64,
    pub collision_strength: f64,
    /// Node count above which `large` replaces `small`.
    pub large_graph_threshold: usize,
    pub small: CoolingProfile,
    pub large: CoolingProfile,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            link_distance_intra: 60.0,
            link_distance_inter: 150.0,
            link_strength_intra: 0.7,
            link_strength_inter: 0.15,
            charge: 300.0,
            center_strength: 0.03,
            collision_padding: 4.0,
            collision_strength: 0.7,
            large_graph_threshold: 500,
            small: CoolingProfile {
                velocity_decay: 0.4,
                alpha_decay: 0.0228,
                alpha_min: 0.001,
                distance_max: 2000.0,
                collide_iterations: 2,
            },
            large: CoolingProfile {
                velocity_decay: 0.6,
                alpha_decay: 0.05,
                alpha_min: 0.01,
                distance_max: 300.0,
                collide_iterations: 1,
            },
        }
    }
}

impl ForceConfig {
    pub fn profile_for(&self, node_count: usize) -> CoolingProfile {
        if node_count > self.large_graph_threshold {
            self.large
        } else {
            self.small
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, profile) in [("force.small", &self.small), ("force.large", &self.large)] {
            if !(0.0..1.0).contains(&profile.velocity_decay) {
                return Err(LayoutError::InvalidConfig {
                    field,
                    reason: format!("velocity_decay {} outside [0, 1)", profile.velocity_decay),
                });
            }
            if profile.alpha_decay <= 0.0 || profile.alpha_min <= 0.0 {
                return Err(LayoutError::InvalidConfig {
                    field,
                    reason: "alpha_decay and alpha_min must be positive".into(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceAtlas2Config {
    pub gravity: f64,
    pub scaling_ratio: f64,
    /// Repulsion unit before `scaling_ratio` and the node masses are applied.
    pub repulsion: f64,
    pub attraction: f64,
    pub lin_log_mode: bool,
    /// Larger theta skips more distant pairs.
    pub theta: f64,
    /// Pair cutoff at `theta == 1`; the effective cutoff is `barnes_hut_cutoff / theta`.
    pub barnes_hut_cutoff: f64,
    pub edge_weight_influence: f64,
    pub friction: f64,
    pub max_displacement: f64,
    pub prevent_overlap: bool,
    pub node_size: f64,
    pub overlap_iterations: usize,
    pub duration_ms: u64,
    pub large_graph_duration_ms: u64,
    pub large_graph_threshold: usize,
}

impl Default for ForceAtlas2Config {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            scaling_ratio: 10.0,
            repulsion: 200.0,
            attraction: 0.01,
            lin_log_mode: false,
            theta: 0.5,
            barnes_hut_cutoff: 200.0,
            edge_weight_influence: 1.0,
            friction: 0.6,
            max_displacement: 10.0,
            prevent_overlap: true,
            node_size: 10.0,
            overlap_iterations: 50,
            duration_ms: 8_000,
            large_graph_duration_ms: 3_000,
            large_graph_threshold: 1_000,
        }
    }
}

impl ForceAtlas2Config {
    pub fn cutoff(&self) -> f64 {
        self.barnes_hut_cutoff / self.theta
    }

    pub fn duration_for(&self, node_count: usize) -> std::time::Duration {
        let ms = if node_count > self.large_graph_threshold {
            self.large_graph_duration_ms
        } else {
            self.duration_ms
        };
        std::time::Duration::from_millis(ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.theta > 0.0) {
            return Err(LayoutError::InvalidConfig {
                field: "force_atlas2.theta",
                reason: format!("must be positive, got {}", self.theta),
            });
        }
        if !(self.max_displacement > 0.0) {
            return Err(LayoutError::InvalidConfig {
                field: "force_atlas2.max_displacement",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Liquid,
    Expansion,
    Cooldown,
    Crunch,
    Simmer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    pub stage: Stage,
    pub iterations: usize,
    pub temperature: f64,
    pub attraction: f64,
    pub damping: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOrdConfig {
    pub schedule: Vec<StageParams>,
    /// Fraction by which the stretch beyond `ideal_edge_length` is discounted.
    pub edge_cutoff: f64,
    pub ideal_edge_length: f64,
    pub attraction_scale: f64,
    pub repulsion: f64,
    /// Pairs farther apart than this never repel.
    pub repulsion_cutoff: f64,
    pub grid_cell_size: f64,
    pub grid_rebuild_interval: u64,
    pub jitter_scale: f64,
    pub displacement_scale: f64,
    pub prevent_overlap: bool,
    pub node_size: f64,
    pub overlap_iterations: usize,
}

impl Default for OpenOrdConfig {
    fn default() -> Self {
        let stage = |stage, iterations, temperature, attraction, damping| StageParams {
            stage,
            iterations,
            temperature,
            attraction,
            damping,
        };
        Self {
            schedule: vec![
                stage(Stage::Liquid, 200, 2000.0, 10.0, 0.9),
                stage(Stage::Expansion, 200, 2000.0, 2.0, 0.8),
                stage(Stage::Cooldown, 200, 2000.0, 1.0, 0.5),
                stage(Stage::Crunch, 50, 250.0, 1.0, 0.35),
                stage(Stage::Simmer, 100, 250.0, 0.5, 0.2),
            ],
            edge_cutoff: 0.8,
            ideal_edge_length: 80.0,
            attraction_scale: 0.002,
            repulsion: 800.0,
            repulsion_cutoff: 250.0,
            grid_cell_size: 250.0,
            grid_rebuild_interval: 10,
            jitter_scale: 0.005,
            displacement_scale: 0.02,
            prevent_overlap: true,
            node_size: 10.0,
            overlap_iterations: 50,
        }
    }
}

impl OpenOrdConfig {
    pub fn validate(&self) -> Result<()> {
        if self.schedule.is_empty() {
            return Err(LayoutError::InvalidConfig {
                field: "open_ord.schedule",
                reason: "needs at least one stage".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.edge_cutoff) {
            return Err(LayoutError::InvalidConfig {
                field: "open_ord.edge_cutoff",
                reason: format!("{} outside [0, 1]", self.edge_cutoff),
            });
        }
        if !(self.grid_cell_size > 0.0) {
            return Err(LayoutError::InvalidConfig {
                field: "open_ord.grid_cell_size",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    /// Defaults to the canvas center.
    pub center: Option<crate::types::Position>,
    /// Defaults to the largest ring that fits the canvas minus `margin`.
    pub radius: Option<f64>,
    pub margin: f64,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            center: None,
            radius: None,
            margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    pub level_gap: f64,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self { level_gap: 100.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub level_gap: f64,
    pub top_margin: f64,
    /// Horizontal gap between unreachable nodes in the overflow row.
    pub orphan_spacing: f64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            level_gap: 100.0,
            top_margin: 50.0,
            orphan_spacing: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FastConfig {
    /// Spacing of the pure grid fallback.
    pub grid_spacing: f64,
    /// Radial step between rings inside one cluster cell.
    pub ring_gap: f64,
    /// Nodes on the innermost ring; each further ring holds this many more.
    pub ring_capacity: usize,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            grid_spacing: 60.0,
            ring_gap: 40.0,
            ring_capacity: 6,
        }
    }
}
