use crate::rect::ViewRect;
use crate::tuning::Tuning;

/// The two lagging copies of the target rect fed to the renderer.
///
/// `sharp` is the in-focus sample region; `blur` trails further behind and
/// its separation from `sharp` is what the post-process smears across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Followers {
    pub sharp: ViewRect,
    pub blur: ViewRect,
}

impl Followers {
    pub fn new() -> Self {
        Self {
            sharp: ViewRect::HOME,
            blur: ViewRect::HOME,
        }
    }

    /// Moves both followers one step toward `target`. Called after the
    /// frame has been drawn.
    pub fn advance(&mut self, target: &ViewRect, tuning: &Tuning) {
        self.sharp.approach(target, tuning.track_rate);
        self.blur.approach(target, tuning.blur_rate());
    }

    pub fn divergence(&self) -> f32 {
        self.sharp.distance(&self.blur)
    }

    pub fn settled(&self, target: &ViewRect, epsilon: f32) -> bool {
        self.sharp.distance(target) <= epsilon && self.blur.distance(target) <= epsilon
    }
}

impl Default for Followers {
    fn default() -> Self {
        Self::new()
    }
}
