//! Viewport, level-of-detail and drag handling over a layout dispatcher.

mod config;
mod cull;
mod drag;
mod lod;
mod registry;
mod session;
mod throttle;
mod viewport;

pub use config::ViewportConfig;
pub use cull::{RenderSet, VisibleEdge, VisibleNode, cull};
pub use drag::{DragController, DragEvent, DragPhase, PinTarget};
pub use lod::{DetailTier, RenderStyle};
pub use registry::{NodeHandle, NodeRegistry};
pub use session::GraphSession;
pub use throttle::RenderThrottle;
pub use viewport::{Rect, Transform, Viewport};
