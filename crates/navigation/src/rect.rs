/// A sub-rectangle of the captured image in normalised texture space.
///
/// Coordinates are not clamped: edges may leave `[0, 1]` while zooming out or
/// panning past the border, and the fragment stage treats such samples as
/// empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl ViewRect {
    /// The identity view: the whole snapshot mapped onto the whole viewport.
    pub const HOME: ViewRect = ViewRect {
        x0: 0.0,
        y0: 0.0,
        x1: 1.0,
        y1: 1.0,
    };

    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }

    pub fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Shifts all four edges; the span is unchanged.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x0 += dx;
        self.x1 += dx;
        self.y0 += dy;
        self.y1 += dy;
    }

    /// Contracts (`factor < 1`) or expands (`factor > 1`) every edge around
    /// `(cx, cy)`.
    pub fn scale_about(&mut self, cx: f32, cy: f32, factor: f32) {
        self.x0 = cx + (self.x0 - cx) * factor;
        self.x1 = cx + (self.x1 - cx) * factor;
        self.y0 = cy + (self.y0 - cy) * factor;
        self.y1 = cy + (self.y1 - cy) * factor;
    }

    /// Texture-space point under the pixel `(px, py)` of a `viewport`-sized
    /// display showing this rect.
    pub fn focal_point(&self, px: f32, py: f32, viewport: (f32, f32)) -> (f32, f32) {
        let (width, height) = viewport;
        (
            self.x0 + self.width() * (px / width.max(1.0)),
            self.y0 + self.height() * (py / height.max(1.0)),
        )
    }

    /// One first-order lag step toward `target`.
    pub fn approach(&mut self, target: &ViewRect, rate: f32) {
        let mut edges = self.to_array();
        for (edge, goal) in edges.iter_mut().zip(target.to_array()) {
            *edge += (goal - *edge) * rate;
        }
        *self = Self::from_array(edges);
    }

    /// Largest absolute per-edge difference between two rects.
    pub fn distance(&self, other: &ViewRect) -> f32 {
        self.to_array()
            .into_iter()
            .zip(other.to_array())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl Default for ViewRect {
    fn default() -> Self {
        Self::HOME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_point_tracks_pointer_fraction() {
        let rect = ViewRect::new(0.25, 0.5, 0.75, 1.0);
        let (cx, cy) = rect.focal_point(480.0, 270.0, (1920.0, 1080.0));
        assert!((cx - 0.375).abs() < 1e-6);
        assert!((cy - 0.625).abs() < 1e-6);
    }

    #[test]
    fn scale_about_keeps_focal_point_fixed() {
        let mut rect = ViewRect::HOME;
        rect.scale_about(0.2, 0.8, 0.5);
        assert_eq!(rect, ViewRect::new(0.1, 0.4, 0.6, 0.9));
        let (cx, cy) = rect.focal_point(0.2 * 100.0, 0.8 * 100.0, (100.0, 100.0));
        assert!((cx - 0.2).abs() < 1e-6);
        assert!((cy - 0.8).abs() < 1e-6);
    }

    #[test]
    fn approach_stays_between_previous_and_target() {
        let mut rect = ViewRect::HOME;
        let target = ViewRect::new(0.4, 0.4, 0.6, 0.6);
        rect.approach(&target, 0.7);
        for (value, (start, goal)) in rect
            .to_array()
            .into_iter()
            .zip(ViewRect::HOME.to_array().into_iter().zip(target.to_array()))
        {
            let (lo, hi) = if start < goal { (start, goal) } else { (goal, start) };
            assert!(value >= lo && value <= hi);
        }
        assert!(rect.distance(&target) > 0.0);
    }
}
