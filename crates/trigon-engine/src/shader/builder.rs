use super::error::{CompileError, DiagnosticLog, LinkError, ShaderError};
use super::front::{self, StageInterface};
use super::source::{ShaderSource, ShaderStage};
use super::target::ProgramTarget;

/// A successfully compiled shader stage.
///
/// Owns the GPU shader module, which is released on drop. Linking borrows the
/// stage, so one stage can be linked into any number of programs.
pub struct CompiledStage {
    module: wgpu::ShaderModule,
    interface: StageInterface,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.interface.stage
    }

    pub fn label(&self) -> &str {
        &self.interface.label
    }

    pub fn entry_point(&self) -> &str {
        &self.interface.entry_point
    }
}

/// A fully linked, executable program.
///
/// Only ever produced after every link check passed. Owned by the caller;
/// the pipeline is released on drop.
pub struct LinkedProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    _layout: wgpu::PipelineLayout,
}

impl LinkedProgram {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Binds this program for subsequent draw calls in `pass`.
    #[inline]
    pub fn activate(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }
}

/// Compiles WGSL stages and links them into render pipelines.
///
/// Every call blocks until the front end and the device have answered. The
/// builder holds no state between calls beyond the device reference.
pub struct ShaderProgramBuilder<'d> {
    device: &'d wgpu::Device,
}

impl<'d> ShaderProgramBuilder<'d> {
    pub fn new(device: &'d wgpu::Device) -> Self {
        Self { device }
    }

    /// Compiles one stage.
    ///
    /// The module is validated against the capabilities of the device's
    /// enabled features. On failure the error is logged and returned; no GPU
    /// module outlives the call.
    pub fn compile_stage(&self, source: &ShaderSource<'_>) -> Result<CompiledStage, CompileError> {
        let caps = front::capabilities_for(self.device.features());
        let interface = front::compile_stage_for(source, caps).inspect_err(|e| log::error!("{e}"))?;

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&interface.label),
            source: wgpu::ShaderSource::Wgsl(source.text.into()),
        });
        let scoped = pollster::block_on(scope.pop());

        let info = pollster::block_on(module.get_compilation_info());
        let mut errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(format_compilation_message)
            .collect();

        // Compilation info usually repeats the scoped error; keep one copy.
        if let Some(err) = scoped
            && errors.is_empty()
        {
            errors.push(err.to_string());
        }

        if !errors.is_empty() {
            let err = CompileError {
                stage: source.stage,
                label: interface.label,
                log: DiagnosticLog::new(errors.join("\n"), "shader module creation failed"),
            };
            log::error!("{err}");
            return Err(err);
        }

        log::debug!(
            "compiled {} stage `{}` (entry `{}`)",
            interface.stage,
            interface.label,
            interface.entry_point
        );

        Ok(CompiledStage { module, interface })
    }

    /// Links previously compiled stages into a program for `target`.
    ///
    /// Stage order does not matter. The stages are only borrowed and stay
    /// usable for further links.
    pub fn link_program(
        &self,
        label: &str,
        stages: &[&CompiledStage],
        target: &ProgramTarget,
    ) -> Result<LinkedProgram, LinkError> {
        let interfaces: Vec<&StageInterface> = stages.iter().map(|s| &s.interface).collect();
        let pair = front::link_stages(label, &interfaces, target).inspect_err(|e| log::error!("{e}"))?;

        let vertex = stages[pair.vertex];
        let fragment = stages[pair.fragment];

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = if target.vertex_attributes.is_empty() {
            Vec::new()
        } else {
            vec![wgpu::VertexBufferLayout {
                array_stride: target.vertex_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &target.vertex_attributes,
            }]
        };

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = target
            .color_format
            .map(|format| wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })
            .into_iter()
            .map(Some)
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(vertex.entry_point()),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(fragment.entry_point()),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),

            primitive: wgpu::PrimitiveState {
                topology: target.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: target.polygon_mode,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            let err = LinkError {
                label: label.to_owned(),
                log: DiagnosticLog::new(err.to_string(), "pipeline creation failed"),
            };
            log::error!("{err}");
            return Err(err);
        }

        log::info!(
            "linked program `{label}` ({} + {})",
            vertex.label(),
            fragment.label()
        );

        Ok(LinkedProgram {
            label: label.to_owned(),
            pipeline,
            _layout: layout,
        })
    }

    /// Compiles every source, then links them.
    ///
    /// Stops at the first compile failure without attempting the link.
    /// Intermediate stages are dropped on every path.
    pub fn build(
        &self,
        label: &str,
        sources: &[ShaderSource<'_>],
        target: &ProgramTarget,
    ) -> Result<LinkedProgram, ShaderError> {
        let stages = sources
            .iter()
            .map(|s| self.compile_stage(s))
            .collect::<Result<Vec<_>, _>>()?;

        let refs: Vec<&CompiledStage> = stages.iter().collect();
        Ok(self.link_program(label, &refs, target)?)
    }
}

fn format_compilation_message(m: &wgpu::CompilationMessage) -> String {
    match &m.location {
        Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
        None => m.message.clone(),
    }
}
