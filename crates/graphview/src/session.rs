use crossbeam_channel::Sender;
use graphlens_layout::{
    Dimensions, Edge, LayoutDispatcher, LayoutMessage, LayoutMode, LayoutSettings, Node, Position,
    Result,
};

use crate::config::ViewportConfig;
use crate::cull::{RenderSet, cull};
use crate::drag::{DragController, DragEvent};
use crate::lod::DetailTier;
use crate::registry::{NodeHandle, NodeRegistry};
use crate::throttle::RenderThrottle;
use crate::viewport::{Rect, Transform, Viewport};

/// One interactive view over one graph.
///
/// Frames are driven by the host: each `frame` drains pending layout
/// messages, ticks the active strategy once, and rebuilds the render set when
/// the throttle allows it or the view changed.
pub struct GraphSession {
    dispatcher: LayoutDispatcher,
    viewport: Viewport,
    drag: DragController,
    registry: NodeRegistry,
    throttle: RenderThrottle,
    render_set: Option<RenderSet>,
    dirty: bool,
}

impl GraphSession {
    pub fn new(settings: LayoutSettings, config: ViewportConfig, canvas: Dimensions) -> Result<Self> {
        Ok(Self {
            dispatcher: LayoutDispatcher::new(settings)?,
            viewport: Viewport::new(canvas, config),
            drag: DragController::new(),
            registry: NodeRegistry::new(),
            throttle: RenderThrottle::for_node_count(0),
            render_set: None,
            dirty: true,
        })
    }

    pub fn dispatcher(&self) -> &LayoutDispatcher {
        &self.dispatcher
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn throttle(&self) -> RenderThrottle {
        self.throttle
    }

    pub fn sender(&self) -> Sender<LayoutMessage> {
        self.dispatcher.sender()
    }

    /// Loads a graph and activates `mode` over it.
    pub fn set_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>, mode: LayoutMode) -> Result<()> {
        self.registry
            .sync(nodes.iter().map(|n| n.id.as_str()), |_| NodeHandle::default());
        self.throttle = RenderThrottle::for_node_count(nodes.len());
        self.dispatcher
            .activate(mode, nodes, edges, self.viewport.canvas())?;
        self.drag.restore(&mut self.dispatcher);
        self.dirty = true;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: LayoutMode) -> Result<()> {
        self.dispatcher.switch_mode(mode)?;
        self.drag.restore(&mut self.dispatcher);
        self.dirty = true;
        Ok(())
    }

    pub fn reheat(&mut self) {
        self.dispatcher.reheat();
    }

    /// Runs one frame. Returns whether the render set was rebuilt.
    pub fn frame(&mut self) -> Result<bool> {
        if self.dispatcher.pump()? > 0 {
            self.drag.restore(&mut self.dispatcher);
            self.dirty = true;
        }
        let ticked = self.dispatcher.tick();
        if self.dirty || (ticked && self.throttle.should_render(self.dispatcher.ticks())) {
            self.render();
            return Ok(true);
        }
        Ok(false)
    }

    /// Rebuilds the render set from the cache and the current view.
    pub fn render(&mut self) -> &RenderSet {
        let nodes = self.dispatcher.nodes();
        let tier = DetailTier::select(self.viewport.scale(), nodes.len(), self.viewport.config());
        let set = cull(
            nodes,
            self.dispatcher.edges(),
            self.dispatcher.cache(),
            self.viewport.visible_rect(),
            tier,
        );

        for (_, handle) in self.registry.iter_mut() {
            handle.anchor = None;
        }
        for node in &set.nodes {
            if let Some(handle) = self.registry.get_mut(&node.id) {
                handle.anchor = Some(self.viewport.world_to_screen(node.position));
                handle.renders += 1;
            }
        }
        tracing::trace!(
            nodes = set.nodes.len(),
            edges = set.edges.len(),
            ?tier,
            "render set rebuilt"
        );
        self.dirty = false;
        self.render_set.insert(set)
    }

    pub fn render_set(&self) -> Option<&RenderSet> {
        self.render_set.as_ref()
    }

    /// Screen anchor for overlays on `id`, if it was drawn last frame.
    pub fn anchor(&self, id: &str) -> Option<Position> {
        self.registry.get(id).and_then(|h| h.anchor)
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.viewport.set_transform(transform);
        self.dirty = true;
    }

    pub fn zoom_at(&mut self, screen: Position, factor: f64) {
        self.viewport.zoom_at(screen, factor);
        self.dirty = true;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
        self.dirty = true;
    }

    pub fn resize(&mut self, canvas: Dimensions) {
        self.viewport.resize(canvas);
        self.dirty = true;
    }

    /// Fits every placed node on screen.
    pub fn fit_to_content(&mut self) {
        let Some(bounds) = Rect::bounding(self.dispatcher.cache().iter().map(|(_, p)| p)) else {
            return;
        };
        let widest = self
            .dispatcher
            .nodes()
            .iter()
            .map(|n| n.size)
            .filter(|s| s.is_finite())
            .fold(0.0, f64::max);
        self.viewport.fit(bounds.expand(widest));
        self.dirty = true;
    }

    pub fn pointer_down(&mut self, id: &str, screen: Position) -> bool {
        let started = self
            .drag
            .pointer_down(&mut self.dispatcher, id, screen, &self.viewport);
        self.dirty |= started;
        started
    }

    pub fn pointer_move(&mut self, screen: Position) -> bool {
        let moved = self
            .drag
            .pointer_move(&mut self.dispatcher, screen, &self.viewport);
        self.dirty |= moved;
        moved
    }

    pub fn pointer_up(&mut self, screen: Position) -> bool {
        let ended = self
            .drag
            .pointer_up(&mut self.dispatcher, screen, &self.viewport);
        self.dirty |= ended;
        ended
    }

    /// Force-releases any pin on `id`.
    pub fn double_click(&mut self, id: &str) -> bool {
        self.drag.release(&mut self.dispatcher, id)
    }

    /// Pins `id` at a world position until released.
    pub fn fix(&mut self, id: &str, world: Position) -> bool {
        let fixed = self.drag.fix(&mut self.dispatcher, id, world);
        self.dirty |= fixed;
        fixed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.dragging().is_some()
    }

    pub fn drain_drag_events(&mut self) -> Vec<DragEvent> {
        self.drag.drain_events()
    }

    /// Stops the layout and cancels pending frames.
    pub fn shutdown(&mut self) {
        self.drag.cancel(&mut self.dispatcher);
        self.dispatcher.shutdown();
    }
}
