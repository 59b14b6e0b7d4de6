//! Shader stage compilation and program linking.
//!
//! Two layers:
//! - [`front`] parses and validates WGSL with naga and checks stage interfaces
//!   against each other, without touching the GPU
//! - [`ShaderProgramBuilder`] runs the front end, then creates the wgpu shader
//!   modules and render pipelines
//!
//! A build moves through `Empty -> StagesCompiled -> Linked`, or stops at the
//! first compile or link failure. Nothing is retried; the caller builds again
//! from corrected source.

mod builder;
mod error;
pub mod front;
mod source;
mod target;

pub use builder::{CompiledStage, LinkedProgram, ShaderProgramBuilder};
pub use error::{CompileError, DiagnosticLog, LinkError, ShaderError, MAX_LOG_LEN};
pub use front::{InterfaceVar, StageInterface};
pub use source::{ShaderSource, ShaderStage};
pub use target::ProgramTarget;
