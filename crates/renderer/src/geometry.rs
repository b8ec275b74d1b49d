//! Model-space geometry for the lit box and the camera transform applied to it.
//!
//! The box is five quads: a back wall at `z = 0` and four side walls reaching
//! towards `z = 2`, leaving the `+z` end open. Each quad walks its texture
//! corners in the same order so the wall texture lines up across faces.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Number of quads emitted per frame.
pub const QUAD_COUNT: usize = 5;
/// Number of vertices emitted per frame (four per quad).
pub const VERTEX_COUNT: usize = QUAD_COUNT * 4;
/// Number of indices needed to draw the quads as a triangle list.
pub const INDEX_COUNT: usize = QUAD_COUNT * 6;

/// Distance the camera sits back from the model origin along `-z`.
pub const CAMERA_DISTANCE: f32 = 5.0;

const QUAD_TEXCOORDS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

const QUAD_POSITIONS: [[[f32; 3]; 4]; QUAD_COUNT] = [
    [
        [-1.0, 1.0, 0.0],
        [-1.0, -1.0, 0.0],
        [1.0, -1.0, 0.0],
        [1.0, 1.0, 0.0],
    ],
    [
        [-1.0, 1.0, 2.0],
        [-1.0, 1.0, 0.0],
        [-1.0, -1.0, 0.0],
        [-1.0, -1.0, 2.0],
    ],
    [
        [1.0, -1.0, 2.0],
        [1.0, -1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 1.0, 2.0],
    ],
    [
        [-1.0, 1.0, 2.0],
        [-1.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 1.0, 2.0],
    ],
    [
        [-1.0, -1.0, 2.0],
        [-1.0, -1.0, 0.0],
        [1.0, -1.0, 0.0],
        [1.0, -1.0, 2.0],
    ],
];

/// A single emitted vertex.
///
/// `light_vector` is the vertex position minus the light position. The
/// fragment stage receives it interpolated and derives per-pixel lighting from
/// it, so it must be recomputed whenever the light moves.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BoxVertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub light_vector: [f32; 3],
}

impl BoxVertex {
    fn new(position: [f32; 3], texcoord: [f32; 2], light: [f32; 3]) -> Self {
        Self {
            position,
            texcoord,
            light_vector: [
                position[0] - light[0],
                position[1] - light[1],
                position[2] - light[2],
            ],
        }
    }
}

/// Emits every box vertex, quad by quad, with light vectors relative to `light`.
pub fn emit_box(light: [f32; 3]) -> Vec<BoxVertex> {
    let mut vertices = Vec::with_capacity(VERTEX_COUNT);
    for quad in QUAD_POSITIONS.iter() {
        for (position, texcoord) in quad.iter().zip(QUAD_TEXCOORDS.iter()) {
            vertices.push(BoxVertex::new(*position, *texcoord, light));
        }
    }
    vertices
}

/// Triangle-list indices that split each quad along its first diagonal.
pub fn quad_indices() -> [u16; INDEX_COUNT] {
    let mut indices = [0u16; INDEX_COUNT];
    for quad in 0..QUAD_COUNT {
        let base = (quad * 4) as u16;
        let offset = quad * 6;
        indices[offset..offset + 6]
            .copy_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

/// Builds the model-view matrix for a camera rotation given in degrees.
///
/// Equivalent to loading identity, translating back by [`CAMERA_DISTANCE`],
/// then rotating about X, Y and Z in that order.
pub fn model_view(camera_rotation: [f32; 3]) -> Mat4 {
    let [pitch, yaw, roll] = camera_rotation;
    Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE))
        * Mat4::from_rotation_x(pitch.to_radians())
        * Mat4::from_rotation_y(yaw.to_radians())
        * Mat4::from_rotation_z(roll.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_twenty_vertices_in_source_order() {
        let vertices = emit_box([0.0; 3]);
        assert_eq!(vertices.len(), VERTEX_COUNT);
        assert_eq!(vertices[0].position, [-1.0, 1.0, 0.0]);
        assert_eq!(vertices[0].texcoord, [0.0, 0.0]);
        assert_eq!(vertices[5].position, [-1.0, 1.0, 0.0]);
        assert_eq!(vertices[5].texcoord, [0.0, 1.0]);
        assert_eq!(vertices[19].position, [1.0, -1.0, 2.0]);
        assert_eq!(vertices[19].texcoord, [1.0, 0.0]);
    }

    #[test]
    fn light_vector_is_position_relative_to_light() {
        let light = [0.5, -0.25, 0.0];
        for vertex in emit_box(light) {
            for axis in 0..3 {
                assert_eq!(vertex.light_vector[axis], vertex.position[axis] - light[axis]);
            }
        }
    }

    #[test]
    fn texcoords_stay_on_unit_square_corners() {
        for vertex in emit_box([1.0, 0.0, 0.0]) {
            for coord in vertex.texcoord {
                assert!(coord == 0.0 || coord == 1.0);
            }
        }
    }

    #[test]
    fn box_is_open_towards_positive_z() {
        let vertices = emit_box([0.0; 3]);
        let far_face = vertices
            .chunks(4)
            .filter(|quad| quad.iter().all(|vertex| vertex.position[2] == 2.0))
            .count();
        let near_face = vertices
            .chunks(4)
            .filter(|quad| quad.iter().all(|vertex| vertex.position[2] == 0.0))
            .count();
        assert_eq!(far_face, 0);
        assert_eq!(near_face, 1);
    }

    #[test]
    fn indices_cover_each_quad_with_two_triangles() {
        let indices = quad_indices();
        assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&indices[24..], &[16, 17, 18, 16, 18, 19]);
        assert!(indices.iter().all(|&index| (index as usize) < VERTEX_COUNT));
    }

    #[test]
    fn model_view_moves_origin_back_along_view_axis() {
        let origin = model_view([0.0, 37.0, 0.0]).transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.0, -CAMERA_DISTANCE)).length() < 1e-6);
    }

    #[test]
    fn yaw_rotates_about_the_vertical_axis() {
        let point = model_view([0.0, 90.0, 0.0]).transform_point3(Vec3::X);
        assert!((point - Vec3::new(0.0, 0.0, -CAMERA_DISTANCE - 1.0)).length() < 1e-5);
    }
}
