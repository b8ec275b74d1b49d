use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use winit::dpi::PhysicalSize;

/// Vertical field of view of the camera, in degrees.
pub(crate) const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub(crate) const NEAR_PLANE: f32 = 0.1;
pub(crate) const FAR_PLANE: f32 = 100.0;

/// Mirror of the `SceneParams` uniform block declared in the GLSL prelude.
///
/// std140 lays a `mat4` out as four `vec4` columns followed here by a single
/// `vec4`, so a plain `repr(C)` struct matches without padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub model_view_projection: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl SceneUniforms {
    pub fn new(projection: Mat4, model_view: Mat4, color: [f32; 4]) -> Self {
        Self {
            model_view_projection: (projection * model_view).to_cols_array_2d(),
            color,
        }
    }
}

impl Default for SceneUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, [1.0; 4])
    }
}

/// Perspective projection for a surface of `size`, with depth mapped to 0..1.
pub(crate) fn projection(size: PhysicalSize<u32>) -> Mat4 {
    let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
    Mat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect,
        NEAR_PLANE,
        FAR_PLANE,
    )
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;
    use crate::capabilities::UNIFORM_BLOCK_SIZE;
    use crate::geometry::model_view;

    #[test]
    fn uniform_block_matches_declared_size() {
        assert_eq!(std::mem::size_of::<SceneUniforms>() as u64, UNIFORM_BLOCK_SIZE);
    }

    #[test]
    fn back_wall_lands_inside_clip_volume() {
        let size = PhysicalSize::new(800, 600);
        let uniforms = SceneUniforms::new(projection(size), model_view([0.0; 3]), [1.0; 4]);
        let mvp = Mat4::from_cols_array_2d(&uniforms.model_view_projection);

        let clip = mvp * Vec4::new(1.0, 1.0, 0.0, 1.0);
        let ndc = Vec3::new(clip.x, clip.y, clip.z) / clip.w;
        assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn projection_tracks_aspect_ratio() {
        let wide = projection(PhysicalSize::new(1600, 800));
        let square = projection(PhysicalSize::new(800, 800));
        assert!((square.x_axis.x / wide.x_axis.x - 2.0).abs() < 1e-5);
        assert_eq!(wide.y_axis.y, square.y_axis.y);
    }

    #[test]
    fn zero_sized_surface_does_not_divide_by_zero() {
        let matrix = projection(PhysicalSize::new(0, 0));
        assert!(matrix.is_finite());
    }
}
