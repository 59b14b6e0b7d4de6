/// Fixed-function state a program is linked against.
///
/// Linking checks the vertex stage's `@location` inputs against
/// `vertex_attributes` and the fragment stage's outputs against `color_format`.
#[derive(Debug, Clone)]
pub struct ProgramTarget {
    /// Color attachment format. `None` links a program without color output.
    pub color_format: Option<wgpu::TextureFormat>,

    /// Byte stride of one vertex in the single vertex buffer.
    pub vertex_stride: u64,

    /// Attributes read from the vertex buffer. Empty means no vertex buffer.
    pub vertex_attributes: Vec<wgpu::VertexAttribute>,

    pub topology: wgpu::PrimitiveTopology,

    /// `Line` requires `wgpu::Features::POLYGON_MODE_LINE` on the device.
    pub polygon_mode: wgpu::PolygonMode,
}

impl ProgramTarget {
    pub fn new(color_format: Option<wgpu::TextureFormat>) -> Self {
        Self {
            color_format,
            vertex_stride: 0,
            vertex_attributes: Vec::new(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            polygon_mode: wgpu::PolygonMode::Fill,
        }
    }

    pub fn with_vertex_layout(mut self, stride: u64, attributes: &[wgpu::VertexAttribute]) -> Self {
        self.vertex_stride = stride;
        self.vertex_attributes = attributes.to_vec();
        self
    }

    pub fn with_polygon_mode(mut self, polygon_mode: wgpu::PolygonMode) -> Self {
        self.polygon_mode = polygon_mode;
        self
    }

    pub(crate) fn attribute(&self, location: u32) -> Option<&wgpu::VertexAttribute> {
        self.vertex_attributes
            .iter()
            .find(|a| a.shader_location == location)
    }
}
