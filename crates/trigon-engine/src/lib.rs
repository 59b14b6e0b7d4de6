//! Trigon engine crate.
//!
//! Window runtime, wgpu device layer, and the shader program builder used by
//! the trigon demo.

pub mod core;
pub mod device;
pub mod input;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
