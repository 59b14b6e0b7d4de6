//! Vertex format and the built-in NDC shapes.

use bytemuck::{Pod, Zeroable};

/// Position-only vertex in normalized device coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }
}

/// Left half of the triangle pair.
pub const TRIANGLE_LEFT: [Vertex; 3] = [
    Vertex::new(-1.0, -0.5, 0.0),
    Vertex::new(0.0, -0.5, 0.0),
    Vertex::new(-0.5, 0.5, 0.0),
];

/// Right half of the triangle pair.
pub const TRIANGLE_RIGHT: [Vertex; 3] = [
    Vertex::new(0.0, -0.5, 0.0),
    Vertex::new(1.0, -0.5, 0.0),
    Vertex::new(0.5, 0.5, 0.0),
];

/// Corners of the centered rectangle: top-right, bottom-right, bottom-left, top-left.
pub const RECT_VERTICES: [Vertex; 4] = [
    Vertex::new(0.5, 0.5, 0.0),
    Vertex::new(0.5, -0.5, 0.0),
    Vertex::new(-0.5, -0.5, 0.0),
    Vertex::new(-0.5, 0.5, 0.0),
];

pub const RECT_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];
