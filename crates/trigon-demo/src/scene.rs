//! The hello-triangle scene: one shared pass-through vertex stage, one or two
//! solid-color fragment stages, and the meshes they draw.

use anyhow::Result;
use winit::dpi::PhysicalSize;

use trigon_engine::core::{App, AppControl, FrameCtx, SetupCtx};
use trigon_engine::input::Key;
use trigon_engine::paint::Color;
use trigon_engine::render::geometry::{RECT_INDICES, RECT_VERTICES, TRIANGLE_LEFT, TRIANGLE_RIGHT};
use trigon_engine::render::{Mesh, RenderCtx, RenderTarget, Vertex};
use trigon_engine::shader::{LinkedProgram, ProgramTarget, ShaderProgramBuilder, ShaderSource};

use crate::cli::DrawMode;

const PASSTHROUGH_VS: ShaderSource<'static> =
    ShaderSource::vertex(include_str!("shaders/passthrough.wgsl")).with_label("passthrough.vert");

const ORANGE_FS: ShaderSource<'static> =
    ShaderSource::fragment(include_str!("shaders/orange.wgsl")).with_label("orange.frag");

const YELLOW_FS: ShaderSource<'static> =
    ShaderSource::fragment(include_str!("shaders/yellow.wgsl")).with_label("yellow.frag");

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub mode: DrawMode,
    pub wireframe: bool,
    pub clear: Color,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mode: DrawMode::TrianglePair,
            wireframe: false,
            clear: Color::rgb(0.2, 0.3, 0.3),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProgramKind {
    Orange,
    Yellow,
}

impl ProgramKind {
    fn label(self) -> &'static str {
        match self {
            ProgramKind::Orange => "orange",
            ProgramKind::Yellow => "yellow",
        }
    }

    fn fragment_source(self) -> ShaderSource<'static> {
        match self {
            ProgramKind::Orange => ORANGE_FS,
            ProgramKind::Yellow => YELLOW_FS,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Shape {
    TriangleLeft,
    TriangleRight,
    Rectangle,
}

impl Shape {
    fn label(self) -> &'static str {
        match self {
            Shape::TriangleLeft => "triangle left",
            Shape::TriangleRight => "triangle right",
            Shape::Rectangle => "rectangle",
        }
    }

    fn vertices(self) -> &'static [Vertex] {
        match self {
            Shape::TriangleLeft => &TRIANGLE_LEFT,
            Shape::TriangleRight => &TRIANGLE_RIGHT,
            Shape::Rectangle => &RECT_VERTICES,
        }
    }

    fn indices(self) -> &'static [u32] {
        match self {
            Shape::Rectangle => &RECT_INDICES,
            _ => &[],
        }
    }
}

/// Draw order for `mode`: which program draws which shape.
pub fn draw_plan(mode: DrawMode) -> &'static [(ProgramKind, Shape)] {
    match mode {
        DrawMode::TrianglePair => &[
            (ProgramKind::Orange, Shape::TriangleLeft),
            (ProgramKind::Yellow, Shape::TriangleRight),
        ],
        DrawMode::Rectangle => &[(ProgramKind::Orange, Shape::Rectangle)],
    }
}

struct DrawItem {
    program: usize,
    mesh: Mesh,
}

/// GPU resources created in `on_setup`.
struct SceneGpu {
    programs: Vec<LinkedProgram>,
    items: Vec<DrawItem>,
}

impl SceneGpu {
    fn draw(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let mut pass = target.begin_load_pass("trigon scene pass");
        if !ctx.viewport.apply(&mut pass) {
            return;
        }

        for item in &self.items {
            self.programs[item.program].activate(&mut pass);
            item.mesh.draw(&mut pass);
        }
    }
}

pub struct HelloScene {
    config: SceneConfig,
    gpu: Option<SceneGpu>,
}

impl HelloScene {
    pub fn new(config: SceneConfig) -> Self {
        Self { config, gpu: None }
    }
}

impl App for HelloScene {
    fn on_setup(&mut self, ctx: &mut SetupCtx<'_, '_>) -> Result<()> {
        let device = ctx.gpu.device();
        let polygon_mode = if self.config.wireframe {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };
        let target = ProgramTarget::new(Some(ctx.gpu.surface_format()))
            .with_vertex_layout(Vertex::STRIDE, &Vertex::ATTRS)
            .with_polygon_mode(polygon_mode);

        let builder = ShaderProgramBuilder::new(device);
        let vertex = builder.compile_stage(&PASSTHROUGH_VS)?;

        let mut kinds: Vec<ProgramKind> = Vec::new();
        let mut programs = Vec::new();
        let mut items = Vec::new();

        for &(kind, shape) in draw_plan(self.config.mode) {
            let program = match kinds.iter().position(|k| *k == kind) {
                Some(i) => i,
                None => {
                    let fragment = builder.compile_stage(&kind.fragment_source())?;
                    programs.push(builder.link_program(kind.label(), &[&vertex, &fragment], &target)?);
                    kinds.push(kind);
                    programs.len() - 1
                }
            };

            items.push(DrawItem {
                program,
                mesh: Mesh::upload(device, shape.label(), shape.vertices(), shape.indices()),
            });
        }

        log::info!(
            "scene ready: {:?}, {} program(s), {} mesh(es){}",
            self.config.mode,
            programs.len(),
            items.len(),
            if self.config.wireframe { ", wireframe" } else { "" }
        );

        self.gpu = Some(SceneGpu { programs, items });
        Ok(())
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        log::trace!("scene viewport now {}x{}", size.width, size.height);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) || ctx.input.key_down(Key::Escape) {
            log::info!("escape pressed");
            return AppControl::Exit;
        }

        let Some(gpu) = &self.gpu else {
            return AppControl::Continue;
        };

        ctx.render(self.config.clear, |rctx, target| gpu.draw(rctx, target))
    }
}
