use graphlens_layout::{Dimensions, Position};

use crate::config::ViewportConfig;

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// Smallest rectangle holding every finite point, or `None` if there are none.
    pub fn bounding(points: impl IntoIterator<Item = Position>) -> Option<Self> {
        points
            .into_iter()
            .filter(Position::is_finite)
            .fold(None, |acc: Option<Rect>, p| {
                Some(match acc {
                    Some(r) => Rect {
                        min_x: r.min_x.min(p.x),
                        min_y: r.min_y.min(p.y),
                        max_x: r.max_x.max(p.x),
                        max_y: r.max_y.max(p.y),
                    },
                    None => Rect::new(p.x, p.y, p.x, p.y),
                })
            })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: Position) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn expand(&self, by: f64) -> Self {
        Rect {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }
}

/// Zoom and pan: `screen = world * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    /// World to screen.
    pub fn apply(&self, world: Position) -> Position {
        Position::new(world.x * self.k + self.x, world.y * self.k + self.y)
    }

    /// Screen to world.
    pub fn invert(&self, screen: Position) -> Position {
        Position::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }
}

/// Owns the transform and answers what part of the world is on screen.
#[derive(Debug, Clone)]
pub struct Viewport {
    transform: Transform,
    canvas: Dimensions,
    config: ViewportConfig,
}

impl Viewport {
    pub fn new(canvas: Dimensions, config: ViewportConfig) -> Self {
        Self {
            transform: Transform::IDENTITY,
            canvas,
            config,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn canvas(&self) -> Dimensions {
        self.canvas
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn scale(&self) -> f64 {
        self.transform.k
    }

    pub fn resize(&mut self, canvas: Dimensions) {
        if canvas.is_valid() {
            self.canvas = canvas;
        }
    }

    /// Replaces the transform, clamping its scale. Non-finite input is ignored.
    pub fn set_transform(&mut self, transform: Transform) {
        if !(transform.k.is_finite() && transform.x.is_finite() && transform.y.is_finite()) {
            tracing::warn!(?transform, "ignoring non-finite transform");
            return;
        }
        self.transform = Transform {
            k: self.clamp_scale(transform.k),
            ..transform
        };
    }

    fn clamp_scale(&self, k: f64) -> f64 {
        k.clamp(self.config.min_scale, self.config.max_scale)
    }

    pub fn screen_to_world(&self, screen: Position) -> Position {
        self.transform.invert(screen)
    }

    pub fn world_to_screen(&self, world: Position) -> Position {
        self.transform.apply(world)
    }

    /// Scales by `factor` around `screen`, keeping the world point under it fixed.
    pub fn zoom_at(&mut self, screen: Position, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let world = self.transform.invert(screen);
        let k = self.clamp_scale(self.transform.k * factor);
        self.transform = Transform {
            k,
            x: screen.x - world.x * k,
            y: screen.y - world.y * k,
        };
    }

    /// Moves the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.transform.x += dx;
            self.transform.y += dy;
        }
    }

    /// Zooms and centers so `bounds` fills the canvas minus the fit margin.
    pub fn fit(&mut self, bounds: Rect) {
        let margin = self.config.fit_margin;
        let available_w = (self.canvas.width - 2.0 * margin).max(1.0);
        let available_h = (self.canvas.height - 2.0 * margin).max(1.0);
        let k = (available_w / bounds.width().max(1.0))
            .min(available_h / bounds.height().max(1.0));
        let k = self.clamp_scale(k);
        let center = bounds.center();
        self.transform = Transform {
            k,
            x: self.canvas.width / 2.0 - center.x * k,
            y: self.canvas.height / 2.0 - center.y * k,
        };
    }

    /// World-space rectangle on screen, grown by the configured padding.
    pub fn visible_rect(&self) -> Rect {
        let top_left = self.transform.invert(Position::ORIGIN);
        let bottom_right = self
            .transform
            .invert(Position::new(self.canvas.width, self.canvas.height));
        Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
            .expand(self.config.padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(Dimensions::new(900.0, 530.0), ViewportConfig::default())
    }

    #[test]
    fn test_visible_rect_at_identity() {
        let rect = viewport().visible_rect();
        assert_eq!(rect, Rect::new(-100.0, -100.0, 1000.0, 630.0));
        assert!(rect.contains(Position::new(950.0, 300.0)));
        assert!(!rect.contains(Position::new(1200.0, 300.0)));
    }

    #[test]
    fn test_visible_rect_follows_transform() {
        let mut vp = viewport();
        vp.set_transform(Transform::new(2.0, -100.0, 50.0));
        let rect = vp.visible_rect();
        assert_eq!(rect, Rect::new(-50.0, -125.0, 600.0, 340.0));
    }

    #[test]
    fn test_apply_and_invert_agree() {
        let t = Transform::new(1.5, 30.0, -12.0);
        let p = Position::new(7.0, -3.0);
        let back = t.invert(t.apply(p));
        assert!((back.x - p.x).abs() < 1e-12 && (back.y - p.y).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_keeps_cursor_point() {
        let mut vp = viewport();
        let cursor = Position::new(300.0, 200.0);
        let before = vp.screen_to_world(cursor);
        vp.zoom_at(cursor, 2.0);
        let after = vp.screen_to_world(cursor);
        assert_eq!(vp.scale(), 2.0);
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut vp = viewport();
        vp.zoom_at(Position::ORIGIN, 1000.0);
        assert_eq!(vp.scale(), vp.config().max_scale);
        vp.set_transform(Transform::new(0.0001, 0.0, 0.0));
        assert_eq!(vp.scale(), vp.config().min_scale);
        vp.set_transform(Transform::new(f64::NAN, 0.0, 0.0));
        assert_eq!(vp.scale(), vp.config().min_scale);
    }

    #[test]
    fn test_fit_centers_content() {
        let mut vp = viewport();
        vp.fit(Rect::new(0.0, 0.0, 200.0, 100.0));
        let center = vp.world_to_screen(Position::new(100.0, 50.0));
        assert!((center.x - 450.0).abs() < 1e-9 && (center.y - 265.0).abs() < 1e-9);
        assert!((vp.scale() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_skips_non_finite() {
        let rect = Rect::bounding([
            Position::new(1.0, 2.0),
            Position::new(f64::NAN, 0.0),
            Position::new(-3.0, 5.0),
        ])
        .unwrap();
        assert_eq!(rect, Rect::new(-3.0, 2.0, 1.0, 5.0));
        assert!(Rect::bounding(Vec::<Position>::new()).is_none());
    }
}
