use std::collections::{HashMap, VecDeque};

use graphlens_layout::{LayoutDispatcher, Position};

use crate::viewport::Viewport;

/// Whatever owns node positions during a drag.
pub trait PinTarget {
    /// Simulations take pins; everything else takes direct overrides.
    fn is_physics(&self) -> bool;
    fn is_running(&self) -> bool;
    fn position_of(&self, id: &str) -> Option<Position>;
    fn pin(&mut self, id: &str, position: Position) -> bool;
    fn unpin(&mut self, id: &str) -> bool;
    fn override_position(&mut self, id: &str, position: Position) -> bool;
    fn reheat(&mut self);
}

impl PinTarget for LayoutDispatcher {
    fn is_physics(&self) -> bool {
        LayoutDispatcher::is_physics(self)
    }

    fn is_running(&self) -> bool {
        LayoutDispatcher::is_running(self)
    }

    fn position_of(&self, id: &str) -> Option<Position> {
        self.cache().get(id)
    }

    fn pin(&mut self, id: &str, position: Position) -> bool {
        LayoutDispatcher::pin(self, id, position)
    }

    fn unpin(&mut self, id: &str) -> bool {
        LayoutDispatcher::unpin(self, id)
    }

    fn override_position(&mut self, id: &str, position: Position) -> bool {
        self.set_position(id, position)
    }

    fn reheat(&mut self) {
        LayoutDispatcher::reheat(self)
    }
}

/// Drag lifecycle notifications for anything mirroring node positions.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Start { id: String, position: Position },
    Drag { id: String, position: Position },
    End { id: String, position: Position },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        id: String,
        /// Where the node was before the drag began.
        origin: Position,
        last: Position,
    },
}

/// Turns pointer input into pins or position overrides.
///
/// Pointer coordinates arrive in screen space and are mapped through the
/// viewport's inverse transform before they reach the layout.
#[derive(Debug, Default)]
pub struct DragController {
    phase: DragPhase,
    /// Explicit pins and where they hold, kept across layout rebuilds.
    fixed: HashMap<String, Position>,
    events: VecDeque<DragEvent>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn dragging(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Dragging { id, .. } => Some(id.as_str()),
            DragPhase::Idle => None,
        }
    }

    pub fn is_fixed(&self, id: &str) -> bool {
        self.fixed.contains_key(id)
    }

    /// Begins dragging `id`. Returns `false` for unknown or unplaced nodes.
    pub fn pointer_down(
        &mut self,
        target: &mut dyn PinTarget,
        id: &str,
        screen: Position,
        viewport: &Viewport,
    ) -> bool {
        let Some(origin) = target.position_of(id) else {
            return false;
        };
        if self.dragging().is_some() {
            self.finish(target);
        }
        let world = viewport.screen_to_world(screen);
        if !Self::hold(target, id, world) {
            return false;
        }
        if target.is_physics() && !target.is_running() {
            target.reheat();
        }
        tracing::debug!(id, x = world.x, y = world.y, "drag start");
        self.phase = DragPhase::Dragging {
            id: id.to_string(),
            origin,
            last: world,
        };
        self.events.push_back(DragEvent::Start {
            id: id.to_string(),
            position: world,
        });
        true
    }

    /// Moves the dragged node under the pointer.
    pub fn pointer_move(
        &mut self,
        target: &mut dyn PinTarget,
        screen: Position,
        viewport: &Viewport,
    ) -> bool {
        let DragPhase::Dragging { id, .. } = &self.phase else {
            return false;
        };
        let id = id.clone();
        let world = viewport.screen_to_world(screen);
        if !Self::hold(target, &id, world) {
            return false;
        }
        if target.is_physics() && !target.is_running() {
            target.reheat();
        }
        if let DragPhase::Dragging { last, .. } = &mut self.phase {
            *last = world;
        }
        self.events.push_back(DragEvent::Drag { id, position: world });
        true
    }

    /// Drops the node at the pointer.
    ///
    /// Simulations get the node back unless it was explicitly fixed; other
    /// layouts keep the drop point as a permanent override.
    pub fn pointer_up(
        &mut self,
        target: &mut dyn PinTarget,
        screen: Position,
        viewport: &Viewport,
    ) -> bool {
        if self.dragging().is_none() {
            return false;
        }
        let world = viewport.screen_to_world(screen);
        if let DragPhase::Dragging { last, .. } = &mut self.phase
            && world.is_finite()
        {
            *last = world;
        }
        self.finish(target);
        true
    }

    /// Abandons the drag and puts the node back where it started.
    pub fn cancel(&mut self, target: &mut dyn PinTarget) -> bool {
        let DragPhase::Dragging { id, origin, .. } = std::mem::take(&mut self.phase) else {
            return false;
        };
        if let Some(spot) = self.fixed.get_mut(&id) {
            *spot = origin;
            target.pin(&id, origin);
        } else {
            if target.is_physics() {
                target.unpin(&id);
            }
            target.override_position(&id, origin);
        }
        self.events.push_back(DragEvent::End { id, position: origin });
        true
    }

    /// Pins `id` at `position` until `release` is called.
    pub fn fix(&mut self, target: &mut dyn PinTarget, id: &str, position: Position) -> bool {
        if !Self::hold(target, id, position) {
            return false;
        }
        self.fixed.insert(id.to_string(), position);
        true
    }

    /// Re-applies explicit pins and any drag hold after the layout behind
    /// `target` was rebuilt. Pins on nodes the new graph lacks are dropped,
    /// as is a drag on such a node. Returns how many pins remain.
    pub fn restore(&mut self, target: &mut dyn PinTarget) -> usize {
        self.fixed.retain(|id, spot| {
            let kept = Self::hold(target, id, *spot);
            if !kept {
                tracing::debug!(id = %id, "dropping pin on removed node");
            }
            kept
        });
        let lost = match &self.phase {
            DragPhase::Dragging { id, last, .. } => !Self::hold(target, id, *last),
            DragPhase::Idle => false,
        };
        if lost && let DragPhase::Dragging { id, last, .. } = std::mem::take(&mut self.phase) {
            self.events.push_back(DragEvent::End { id, position: last });
        }
        self.fixed.len()
    }

    /// Force-releases any pin on `id`, ending its drag if one is in progress.
    pub fn release(&mut self, target: &mut dyn PinTarget, id: &str) -> bool {
        let was_fixed = self.fixed.remove(id).is_some();
        if self.dragging() == Some(id) {
            self.finish(target);
            return true;
        }
        let unpinned = target.is_physics() && target.unpin(id);
        if unpinned && !target.is_running() {
            target.reheat();
        }
        was_fixed || unpinned
    }

    /// Takes every queued notification in order.
    pub fn drain_events(&mut self) -> Vec<DragEvent> {
        self.events.drain(..).collect()
    }

    fn hold(target: &mut dyn PinTarget, id: &str, world: Position) -> bool {
        if !world.is_finite() {
            return false;
        }
        if target.is_physics() {
            target.pin(id, world)
        } else {
            target.override_position(id, world)
        }
    }

    fn finish(&mut self, target: &mut dyn PinTarget) {
        let DragPhase::Dragging { id, last, .. } = std::mem::take(&mut self.phase) else {
            return;
        };
        if let Some(spot) = self.fixed.get_mut(&id) {
            *spot = last;
            target.pin(&id, last);
        } else if target.is_physics() {
            target.unpin(&id);
        } else {
            target.override_position(&id, last);
        }
        tracing::debug!(id = %id, x = last.x, y = last.y, "drag end");
        self.events.push_back(DragEvent::End { id, position: last });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use graphlens_layout::Dimensions;

    use super::*;
    use crate::config::ViewportConfig;
    use crate::viewport::Transform;

    #[derive(Default)]
    struct Recorder {
        physics: bool,
        running: bool,
        positions: HashMap<String, Position>,
        pins: HashMap<String, Position>,
        unpins: usize,
        reheats: usize,
    }

    impl Recorder {
        fn physics(running: bool) -> Self {
            let mut r = Self {
                physics: true,
                running,
                ..Default::default()
            };
            r.positions.insert("a".into(), Position::new(10.0, 10.0));
            r
        }
    }

    impl PinTarget for Recorder {
        fn is_physics(&self) -> bool {
            self.physics
        }
        fn is_running(&self) -> bool {
            self.running
        }
        fn position_of(&self, id: &str) -> Option<Position> {
            self.positions.get(id).copied()
        }
        fn pin(&mut self, id: &str, position: Position) -> bool {
            if !self.positions.contains_key(id) {
                return false;
            }
            self.pins.insert(id.into(), position);
            self.positions.insert(id.into(), position);
            true
        }
        fn unpin(&mut self, id: &str) -> bool {
            let had = self.pins.remove(id).is_some();
            if had {
                self.unpins += 1;
            }
            had
        }
        fn override_position(&mut self, id: &str, position: Position) -> bool {
            self.positions.insert(id.into(), position);
            true
        }
        fn reheat(&mut self) {
            self.reheats += 1;
            self.running = true;
        }
    }

    fn zoomed() -> Viewport {
        let mut vp = Viewport::new(Dimensions::default(), ViewportConfig::default());
        vp.set_transform(Transform::new(2.0, 100.0, 0.0));
        vp
    }

    #[test]
    fn test_pins_at_inverse_mapped_pointer() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        let vp = zoomed();
        assert!(drag.pointer_down(&mut target, "a", Position::new(120.0, 40.0), &vp));
        assert_eq!(target.pins["a"], Position::new(10.0, 20.0));
        assert!(drag.pointer_move(&mut target, Position::new(140.0, 60.0), &vp));
        assert_eq!(target.pins["a"], Position::new(20.0, 30.0));
        assert!(drag.pointer_up(&mut target, Position::new(140.0, 60.0), &vp));
        assert!(target.pins.is_empty());
        assert_eq!(target.unpins, 1);
        assert_eq!(target.reheats, 0);
        assert_eq!(drag.phase(), &DragPhase::Idle);
    }

    #[test]
    fn test_settled_simulation_is_reheated() {
        let mut target = Recorder::physics(false);
        let mut drag = DragController::new();
        drag.pointer_down(&mut target, "a", Position::new(0.0, 0.0), &zoomed());
        assert_eq!(target.reheats, 1);
        assert!(target.is_running());
    }

    #[test]
    fn test_click_without_move_emits_start_and_end() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        let vp = zoomed();
        drag.pointer_down(&mut target, "a", Position::new(100.0, 0.0), &vp);
        drag.pointer_up(&mut target, Position::new(100.0, 0.0), &vp);
        let events = drag.drain_events();
        assert!(matches!(events.as_slice(), [DragEvent::Start { .. }, DragEvent::End { .. }]));
        assert!(drag.drain_events().is_empty());
    }

    #[test]
    fn test_analytic_drop_is_permanent() {
        let mut target = Recorder::physics(false);
        target.physics = false;
        let mut drag = DragController::new();
        let vp = zoomed();
        drag.pointer_down(&mut target, "a", Position::new(100.0, 0.0), &vp);
        drag.pointer_up(&mut target, Position::new(300.0, 100.0), &vp);
        assert!(target.pins.is_empty());
        assert_eq!(target.reheats, 0);
        assert_eq!(target.positions["a"], Position::new(100.0, 50.0));
    }

    #[test]
    fn test_fixed_node_stays_pinned_until_released() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        let vp = zoomed();
        assert!(drag.fix(&mut target, "a", Position::new(5.0, 5.0)));
        drag.pointer_down(&mut target, "a", Position::new(100.0, 0.0), &vp);
        drag.pointer_up(&mut target, Position::new(120.0, 0.0), &vp);
        assert_eq!(target.pins["a"], Position::new(10.0, 0.0));

        assert!(drag.release(&mut target, "a"));
        assert!(target.pins.is_empty());
        assert!(!drag.is_fixed("a"));
        assert!(!drag.release(&mut target, "a"));
    }

    #[test]
    fn test_release_ends_active_drag() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        drag.pointer_down(&mut target, "a", Position::new(100.0, 0.0), &zoomed());
        assert!(drag.release(&mut target, "a"));
        assert!(drag.dragging().is_none());
        assert_eq!(target.unpins, 1);
        assert!(!drag.pointer_up(&mut target, Position::ORIGIN, &zoomed()));
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        assert!(!drag.pointer_down(&mut target, "ghost", Position::ORIGIN, &zoomed()));
        assert!(drag.drain_events().is_empty());
    }

    #[test]
    fn test_cancel_restores_origin() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        let vp = zoomed();
        drag.pointer_down(&mut target, "a", Position::new(300.0, 300.0), &vp);
        assert!(drag.cancel(&mut target));
        assert!(target.pins.is_empty());
        assert_eq!(target.positions["a"], Position::new(10.0, 10.0));
    }

    #[test]
    fn test_restore_reapplies_fixed_pins() {
        let mut target = Recorder::physics(true);
        target.positions.insert("b".into(), Position::ORIGIN);
        let mut drag = DragController::new();
        let spot = Position::new(50.0, 50.0);
        assert!(drag.fix(&mut target, "a", spot));
        assert!(drag.fix(&mut target, "b", spot));

        // rebuilt layout: no pins, and "b" left the graph
        let mut rebuilt = Recorder::physics(true);
        assert_eq!(drag.restore(&mut rebuilt), 1);
        assert_eq!(rebuilt.pins["a"], spot);
        assert!(drag.is_fixed("a"));
        assert!(!drag.is_fixed("b"));
    }

    #[test]
    fn test_restore_ends_drag_on_removed_node() {
        let mut target = Recorder::physics(true);
        let mut drag = DragController::new();
        drag.pointer_down(&mut target, "a", Position::new(100.0, 0.0), &zoomed());
        drag.drain_events();

        let mut rebuilt = Recorder {
            physics: true,
            running: true,
            ..Default::default()
        };
        drag.restore(&mut rebuilt);
        assert!(drag.dragging().is_none());
        assert!(matches!(drag.drain_events().as_slice(), [DragEvent::End { .. }]));
    }
}
