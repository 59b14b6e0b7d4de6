//! Screen-space types.
//!
//! Viewport rectangles are in physical pixels, origin top-left, matching what
//! `wgpu::RenderPass::set_viewport` expects.

mod viewport;

pub use viewport::Viewport;
