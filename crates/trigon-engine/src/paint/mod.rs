//! Color values handed to the GPU.

mod color;

pub use color::Color;
