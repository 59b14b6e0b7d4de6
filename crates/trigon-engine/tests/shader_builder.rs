//! Device-backed tests for `ShaderProgramBuilder`.
//!
//! Each test returns early when no adapter is available (headless CI without
//! a software rasterizer).

use trigon_engine::render::{Mesh, Vertex};
use trigon_engine::shader::{
    CompiledStage, ProgramTarget, ShaderError, ShaderProgramBuilder, ShaderSource, ShaderStage,
};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const SIZE: u32 = 4;
// copy_texture_to_buffer requires 256-byte aligned rows.
const BYTES_PER_ROW: u32 = 256;

const PASSTHROUGH_VS: &str = r#"
@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos.x, pos.y, pos.z, 1.0);
}
"#;

const ORANGE_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.2, 1.0);
}
"#;

const YELLOW_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 0.0, 1.0);
}
"#;

const MISSING_SEMICOLON_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let c = vec4<f32>(1.0, 0.5, 0.2, 1.0)
    return c;
}
"#;

// Oversized triangle covering the whole target.
const FULLSCREEN: [Vertex; 3] = [
    Vertex::new(-1.0, -1.0, 0.0),
    Vertex::new(3.0, -1.0, 0.0),
    Vertex::new(-1.0, 3.0, 0.0),
];

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
}

macro_rules! require_device {
    () => {
        match device() {
            Some(d) => d,
            None => {
                eprintln!("no wgpu adapter available; skipping");
                return;
            }
        }
    };
}

fn target() -> ProgramTarget {
    ProgramTarget::new(Some(FORMAT)).with_vertex_layout(Vertex::STRIDE, &Vertex::ATTRS)
}

fn compile(builder: &ShaderProgramBuilder<'_>, src: ShaderSource<'_>) -> CompiledStage {
    builder.compile_stage(&src).unwrap()
}

/// Draws a fullscreen triangle with `program` and returns the RGBA8 of pixel (0, 0).
fn render_pixel(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    program: &trigon_engine::shader::LinkedProgram,
) -> [u8; 4] {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test target"),
        size: wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test readback"),
        size: (BYTES_PER_ROW * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mesh = Mesh::upload(device, "fullscreen", &FULLSCREEN, &[]);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("test encoder"),
    });

    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        program.activate(&mut pass);
        mesh.draw(&mut pass);
    }

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_ROW),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    slice.map_async(wgpu::MapMode::Read, |r| r.expect("readback map failed"));
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("device poll failed");

    let data = slice.get_mapped_range();
    [data[0], data[1], data[2], data[3]]
}

fn assert_rgba_near(actual: [u8; 4], expected: [u8; 4]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((*a as i32 - e as i32).abs() <= 1, "got {actual:?}, expected {expected:?}");
    }
}

#[test]
fn valid_pair_links() {
    let (device, _queue) = require_device!();
    let builder = ShaderProgramBuilder::new(&device);

    let vs = compile(&builder, ShaderSource::vertex(PASSTHROUGH_VS));
    let fs = compile(&builder, ShaderSource::fragment(ORANGE_FS));
    let program = builder.link_program("orange", &[&vs, &fs], &target()).unwrap();

    assert_eq!(program.label(), "orange");
    assert_eq!(vs.stage(), ShaderStage::Vertex);
    assert_eq!(fs.entry_point(), "fs_main");
}

#[test]
fn shared_vertex_stage_draws_orange_and_yellow() {
    let (device, queue) = require_device!();
    let builder = ShaderProgramBuilder::new(&device);
    let target = target();

    let vs = compile(&builder, ShaderSource::vertex(PASSTHROUGH_VS).with_label("passthrough"));
    let orange_fs = compile(&builder, ShaderSource::fragment(ORANGE_FS).with_label("orange"));
    let yellow_fs = compile(&builder, ShaderSource::fragment(YELLOW_FS).with_label("yellow"));

    let orange = builder.link_program("orange", &[&vs, &orange_fs], &target).unwrap();
    let yellow = builder.link_program("yellow", &[&vs, &yellow_fs], &target).unwrap();

    // Stages are disposable once linked; the programs stay usable.
    drop((vs, orange_fs, yellow_fs));

    // Unorm8 rounding: 0.5 -> 128, 0.2 -> 51.
    assert_rgba_near(render_pixel(&device, &queue, &orange), [255, 128, 51, 255]);
    assert_rgba_near(render_pixel(&device, &queue, &yellow), [255, 255, 0, 255]);
}

#[test]
fn syntax_error_fails_before_link() {
    let (device, _queue) = require_device!();
    let builder = ShaderProgramBuilder::new(&device);

    let sources = [
        ShaderSource::vertex(PASSTHROUGH_VS),
        ShaderSource::fragment(MISSING_SEMICOLON_FS).with_label("broken"),
    ];

    let err = match builder.build("broken", &sources, &target()) {
        Ok(_) => panic!("malformed fragment stage must not produce a program"),
        Err(ShaderError::Compile(err)) => err,
        Err(other) => panic!("expected a compile error, got {other}"),
    };

    assert_eq!(err.stage, ShaderStage::Fragment);
    assert_eq!(err.label, "broken");
    assert!(err.log.as_str().contains("return"), "log: {}", err.log);
}

#[test]
fn two_vertex_stages_do_not_link() {
    let (device, _queue) = require_device!();
    let builder = ShaderProgramBuilder::new(&device);

    let a = compile(&builder, ShaderSource::vertex(PASSTHROUGH_VS));
    let b = compile(&builder, ShaderSource::vertex(PASSTHROUGH_VS));

    let Err(err) = builder.link_program("broken", &[&a, &b], &target()) else {
        panic!("two vertex stages must not link");
    };
    assert!(!err.log.as_str().is_empty());
}

#[test]
fn build_links_in_one_call() {
    let (device, _queue) = require_device!();
    let builder = ShaderProgramBuilder::new(&device);

    let sources = [ShaderSource::fragment(YELLOW_FS), ShaderSource::vertex(PASSTHROUGH_VS)];
    let program = builder.build("yellow", &sources, &target()).unwrap();
    assert_eq!(program.label(), "yellow");
}

#[test]
fn stage_needing_unrequested_feature_is_a_compile_error() {
    let (device, _queue) = require_device!();
    if device.features().contains(wgpu::Features::SHADER_F64) {
        eprintln!("device has SHADER_F64; skipping");
        return;
    }
    let builder = ShaderProgramBuilder::new(&device);

    let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f64 = 1.0lf;
    return vec4<f32>(f32(x), 0.5, 0.2, 1.0);
}
"#;

    let Err(err) = builder.compile_stage(&ShaderSource::fragment(src).with_label("wide")) else {
        panic!("f64 stage must not compile without SHADER_F64");
    };
    assert_eq!(err.stage, ShaderStage::Fragment);
    assert_eq!(err.label, "wide");
    assert!(!err.log.as_str().is_empty());
}

#[test]
fn line_mode_without_feature_is_a_link_error() {
    let (device, _queue) = require_device!();
    if device.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
        eprintln!("device has POLYGON_MODE_LINE; skipping");
        return;
    }
    let builder = ShaderProgramBuilder::new(&device);

    let vs = compile(&builder, ShaderSource::vertex(PASSTHROUGH_VS));
    let fs = compile(&builder, ShaderSource::fragment(ORANGE_FS));
    let wire = target().with_polygon_mode(wgpu::PolygonMode::Line);

    let Err(err) = builder.link_program("wire", &[&vs, &fs], &wire) else {
        panic!("line polygon mode must not link without POLYGON_MODE_LINE");
    };
    assert_eq!(err.label, "wire");
    assert!(!err.log.as_str().is_empty());
}
