use bytemuck::{Pod, Zeroable};
use navigation::Followers;

/// Mirrors the `Rects` uniform block of the vertex shader: two std140
/// `vec4`s holding `(x0, y0, x1, y1)` of each follower.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct RectUniforms {
    pub sharp: [f32; 4],
    pub blur: [f32; 4],
}

impl RectUniforms {
    pub fn from_followers(followers: &Followers) -> Self {
        Self {
            sharp: followers.sharp.to_array(),
            blur: followers.blur.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigation::ViewRect;

    #[test]
    fn layout_matches_two_std140_vec4s() {
        assert_eq!(std::mem::size_of::<RectUniforms>(), 32);
        assert_eq!(std::mem::align_of::<RectUniforms>(), 4);
    }

    #[test]
    fn carries_both_followers_in_order() {
        let followers = Followers {
            sharp: ViewRect::new(0.1, 0.2, 0.3, 0.4),
            blur: ViewRect::new(0.5, 0.6, 0.7, 0.8),
        };
        let uniforms = RectUniforms::from_followers(&followers);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(floats, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    }
}
