//! Headless graph layout engine.
//!
//! Analytic placements and tick-driven simulations behind one
//! [`LayoutStrategy`] surface, driven by a [`LayoutDispatcher`] that owns the
//! shared [`PositionCache`].

pub mod analytic;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod graph;
pub mod sim;
pub mod strategy;
pub mod types;

pub use analytic::AnalyticKind;
pub use cache::PositionCache;
pub use config::{
    CircleConfig, FastConfig, ForceAtlas2Config, ForceConfig, HierarchyConfig, LayoutSettings,
    OpenOrdConfig, RadialConfig, Stage, StageParams,
};
pub use dispatcher::{FrameTicket, LayoutDispatcher, LayoutMessage, LayoutMode, Lifecycle};
pub use graph::GraphIndex;
pub use sim::{ForceAtlas2, ForceSimulation, OpenOrd};
pub use strategy::{AnalyticRun, LayoutStrategy};
pub use types::{
    Appearance, AppearanceTable, Dimensions, Edge, LayoutError, Node, Position, ResolveAppearance,
    Result, apply_appearance,
};
