use winit::dpi::PhysicalSize;

/// Viewport rectangle in physical pixels.
///
/// Owned per window by the runtime and updated on framebuffer resize.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Full-framebuffer viewport for a drawable of `size`.
    #[inline]
    pub fn from_size(size: PhysicalSize<u32>) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Sets this viewport on `pass`. Returns `false` (and does nothing) for a
    /// zero-area viewport, e.g. while the window is minimized.
    pub fn apply(self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        if !self.is_valid() {
            return false;
        }
        pass.set_viewport(self.x, self.y, self.width, self.height, 0.0, 1.0);
        true
    }
}
