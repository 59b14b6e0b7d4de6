//! CPU-side WGSL front end.
//!
//! Compiles a stage to naga IR, validates it, and records the `@location`
//! interface of its entry point. Linking checks those interfaces against each
//! other and against a [`ProgramTarget`], so mismatches surface as readable
//! diagnostics before any GPU object exists.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::error::{CompileError, DiagnosticLog, LinkError};
use super::source::{ShaderSource, ShaderStage};
use super::target::ProgramTarget;

/// One user-defined (`@location`) input or output of an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceVar {
    pub location: u32,
    pub name: Option<String>,
    pub ty: naga::TypeInner,
}

impl InterfaceVar {
    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("@location({}) `{}`", self.location, name),
            None => format!("@location({})", self.location),
        }
    }
}

/// Entry point and `@location` interface of one compiled stage.
///
/// Builtins such as `@builtin(position)` are not recorded.
#[derive(Debug, Clone)]
pub struct StageInterface {
    pub stage: ShaderStage,
    pub label: String,
    pub entry_point: String,
    /// Sorted by location.
    pub inputs: Vec<InterfaceVar>,
    /// Sorted by location.
    pub outputs: Vec<InterfaceVar>,
}

impl StageInterface {
    pub fn input(&self, location: u32) -> Option<&InterfaceVar> {
        self.inputs.iter().find(|v| v.location == location)
    }

    pub fn output(&self, location: u32) -> Option<&InterfaceVar> {
        self.outputs.iter().find(|v| v.location == location)
    }
}

/// Indices of the vertex and fragment stage in a linked stage list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StagePair {
    pub vertex: usize,
    pub fragment: usize,
}

/// Parses and validates `source` with every validator capability enabled.
///
/// Use [`compile_stage_for`] to reject modules a particular device cannot run.
pub fn compile_stage(source: &ShaderSource<'_>) -> Result<StageInterface, CompileError> {
    compile_stage_for(source, Capabilities::all())
}

/// Validator capabilities a device with `features` supports.
///
/// Only capabilities gated behind optional device features are cleared.
pub fn capabilities_for(features: wgpu::Features) -> Capabilities {
    let mut caps = Capabilities::all();
    caps.set(Capabilities::FLOAT64, features.contains(wgpu::Features::SHADER_F64));
    caps.set(Capabilities::SHADER_INT64, features.contains(wgpu::Features::SHADER_INT64));
    caps
}

/// Parses and validates `source` against `capabilities`, returning the
/// interface of its entry point.
///
/// When the module declares several entry points for the requested stage, the
/// first one is used.
pub fn compile_stage_for(
    source: &ShaderSource<'_>,
    capabilities: Capabilities,
) -> Result<StageInterface, CompileError> {
    let label = source.display_label();
    let fail = |text: String, fallback: &str| CompileError {
        stage: source.stage,
        label: label.to_owned(),
        log: DiagnosticLog::new(text, fallback),
    };

    let module = naga::front::wgsl::parse_str(source.text)
        .map_err(|e| fail(e.emit_to_string(source.text), "WGSL parse failed"))?;

    Validator::new(ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source.text), "module validation failed"))?;

    let wanted = source.stage.to_naga();
    let Some(entry) = module.entry_points.iter().find(|ep| ep.stage == wanted) else {
        return Err(fail(
            format!("error: `{label}` declares no @{} entry point", source.stage),
            "missing entry point",
        ));
    };

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, result.ty, result.binding.as_ref(), None, &mut outputs);
    }

    inputs.sort_by_key(|v| v.location);
    outputs.sort_by_key(|v| v.location);

    Ok(StageInterface {
        stage: source.stage,
        label: label.to_owned(),
        entry_point: entry.name.clone(),
        inputs,
        outputs,
    })
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    name: Option<&str>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(InterfaceVar {
            location: *location,
            name: name.map(str::to_owned),
            ty: module.types[ty].inner.clone(),
        }),
        // builtins
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), m.name.as_deref(), out);
                }
            }
        }
    }
}

/// Checks that `stages` form a complete program for `target`.
///
/// Rules:
/// - exactly one vertex and exactly one fragment stage
/// - every vertex input location is supplied by a vertex attribute of the same
///   scalar kind
/// - every fragment input is written by the vertex stage with the same type
/// - the fragment stage writes `@location(0)` when a color target exists
///
/// All violations are reported together in one log.
pub fn link_stages(
    label: &str,
    stages: &[&StageInterface],
    target: &ProgramTarget,
) -> Result<StagePair, LinkError> {
    let fail = |lines: Vec<String>| LinkError {
        label: label.to_owned(),
        log: DiagnosticLog::new(lines.join("\n"), "program link failed"),
    };

    let mut problems = Vec::new();
    let vertex = single_stage(stages, ShaderStage::Vertex, &mut problems);
    let fragment = single_stage(stages, ShaderStage::Fragment, &mut problems);

    let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
        return Err(fail(problems));
    };

    let vs = stages[vertex];
    let fs = stages[fragment];

    for input in &vs.inputs {
        let Some(attr) = target.attribute(input.location) else {
            problems.push(format!(
                "error: vertex input {} of `{}` is not supplied by the vertex buffer layout",
                input.describe(),
                vs.label
            ));
            continue;
        };

        let supplied = format_kind(attr.format);
        if let Some(declared) = scalar_kind(&input.ty)
            && declared != supplied
        {
            problems.push(format!(
                "error: vertex input {} of `{}` is {declared:?} but the vertex buffer supplies {:?} ({supplied:?})",
                input.describe(),
                vs.label,
                attr.format
            ));
        }
    }

    for input in &fs.inputs {
        match vs.output(input.location) {
            None => problems.push(format!(
                "error: fragment input {} of `{}` is not written by vertex stage `{}`",
                input.describe(),
                fs.label,
                vs.label
            )),
            Some(out) if out.ty != input.ty => problems.push(format!(
                "error: type mismatch at @location({}): vertex stage `{}` writes {:?}, fragment stage `{}` reads {:?}",
                input.location, vs.label, out.ty, fs.label, input.ty
            )),
            Some(_) => {}
        }
    }

    if target.color_format.is_some() && fs.output(0).is_none() {
        problems.push(format!(
            "error: fragment stage `{}` does not write @location(0) but the program has a color target",
            fs.label
        ));
    }

    if problems.is_empty() {
        Ok(StagePair { vertex, fragment })
    } else {
        Err(fail(problems))
    }
}

fn scalar_kind(ty: &naga::TypeInner) -> Option<naga::ScalarKind> {
    match ty {
        naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => Some(scalar.kind),
        _ => None,
    }
}

/// Scalar kind a vertex attribute of `format` presents to the shader.
fn format_kind(format: wgpu::VertexFormat) -> naga::ScalarKind {
    use wgpu::VertexFormat as F;

    match format {
        F::Uint8 | F::Uint8x2 | F::Uint8x4 | F::Uint16 | F::Uint16x2 | F::Uint16x4 | F::Uint32
        | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => naga::ScalarKind::Uint,
        F::Sint8 | F::Sint8x2 | F::Sint8x4 | F::Sint16 | F::Sint16x2 | F::Sint16x4 | F::Sint32
        | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => naga::ScalarKind::Sint,
        // float, normalized and packed formats
        _ => naga::ScalarKind::Float,
    }
}

fn single_stage(
    stages: &[&StageInterface],
    stage: ShaderStage,
    problems: &mut Vec<String>,
) -> Option<usize> {
    let found: Vec<usize> = stages
        .iter()
        .enumerate()
        .filter(|(_, s)| s.stage == stage)
        .map(|(i, _)| i)
        .collect();

    match found.as_slice() {
        [] => {
            problems.push(format!("error: program has no {stage} stage"));
            None
        }
        [only] => Some(*only),
        many => {
            let labels: Vec<&str> = many.iter().map(|&i| stages[i].label.as_str()).collect();
            problems.push(format!(
                "error: program has {} {stage} stages ({}); exactly one is allowed",
                many.len(),
                labels.join(", ")
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    const VARYING_VS: &str = r#"
struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) tint: vec3<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(pos, 1.0);
    out.tint = pos * 0.5 + vec3<f32>(0.5);
    return out;
}
"#;

    const VARYING_FS: &str = r#"
@fragment
fn fs_main(@location(0) tint: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(tint, 1.0);
}
"#;

    const VEC4_VARYING_FS: &str = r#"
@fragment
fn fs_main(@location(0) tint: vec4<f32>) -> @location(0) vec4<f32> {
    return tint;
}
"#;

    const MISSING_SEMICOLON_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let c = vec4<f32>(1.0, 0.5, 0.2, 1.0)
    return c;
}
"#;

    fn target() -> ProgramTarget {
        ProgramTarget::new(Some(wgpu::TextureFormat::Rgba8Unorm)).with_vertex_layout(
            12,
            &wgpu::vertex_attr_array![0 => Float32x3],
        )
    }

    fn compile(src: ShaderSource<'_>) -> StageInterface {
        compile_stage(&src).unwrap()
    }

    #[test]
    fn compiles_passthrough_vertex_stage() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS).with_label("passthrough"));
        assert_eq!(vs.stage, ShaderStage::Vertex);
        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(vs.inputs.len(), 1);
        assert_eq!(vs.inputs[0].location, 0);
        assert_eq!(vs.inputs[0].name.as_deref(), Some("pos"));
        // @builtin(position) is not part of the location interface.
        assert!(vs.outputs.is_empty());
    }

    #[test]
    fn struct_outputs_are_flattened() {
        let vs = compile(ShaderSource::vertex(VARYING_VS));
        assert_eq!(vs.outputs.len(), 1);
        assert_eq!(vs.output(0).and_then(|v| v.name.as_deref()), Some("tint"));
    }

    #[test]
    fn syntax_error_yields_non_empty_log() {
        let err = compile_stage(&ShaderSource::fragment(MISSING_SEMICOLON_FS).with_label("broken"))
            .unwrap_err();
        assert_eq!(err.stage, ShaderStage::Fragment);
        assert_eq!(err.label, "broken");
        assert!(!err.log.as_str().is_empty());
        assert!(err.log.as_str().contains("return"), "log: {}", err.log);
    }

    #[test]
    fn validation_error_is_a_compile_error() {
        // Returns a vec3 where the signature promises vec4.
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec3<f32>(1.0, 0.0, 0.0);
}
"#;
        let err = compile_stage(&ShaderSource::fragment(src)).unwrap_err();
        assert!(!err.log.as_str().is_empty());
    }

    #[test]
    fn wrong_stage_kind_is_a_compile_error() {
        let err = compile_stage(&ShaderSource::fragment(PASSTHROUGH_VS)).unwrap_err();
        assert!(err.log.as_str().contains("@fragment"), "log: {}", err.log);
    }

    #[test]
    fn vertex_and_fragment_link() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS));
        let fs = compile(ShaderSource::fragment(ORANGE_FS));
        let pair = link_stages("orange", &[&vs, &fs], &target()).unwrap();
        assert_eq!(pair, StagePair { vertex: 0, fragment: 1 });
    }

    #[test]
    fn stage_order_is_insignificant() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS));
        let fs = compile(ShaderSource::fragment(ORANGE_FS));
        let pair = link_stages("orange", &[&fs, &vs], &target()).unwrap();
        assert_eq!(pair, StagePair { vertex: 1, fragment: 0 });
    }

    #[test]
    fn one_vertex_stage_links_with_two_fragment_stages() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS));
        let orange = compile(ShaderSource::fragment(ORANGE_FS));
        let yellow = compile(ShaderSource::fragment(YELLOW_FS));
        link_stages("orange", &[&vs, &orange], &target()).unwrap();
        link_stages("yellow", &[&vs, &yellow], &target()).unwrap();
    }

    #[test]
    fn two_vertex_stages_fail_to_link() {
        let a = compile(ShaderSource::vertex(PASSTHROUGH_VS).with_label("a"));
        let b = compile(ShaderSource::vertex(PASSTHROUGH_VS).with_label("b"));
        let err = link_stages("broken", &[&a, &b], &target()).unwrap_err();
        let log = err.log.as_str();
        assert!(log.contains("2 vertex stages"), "log: {log}");
        assert!(log.contains("no fragment stage"), "log: {log}");
    }

    #[test]
    fn missing_vertex_attribute_fails_to_link() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS));
        let fs = compile(ShaderSource::fragment(ORANGE_FS));
        let bare = ProgramTarget::new(Some(wgpu::TextureFormat::Rgba8Unorm));
        let err = link_stages("orange", &[&vs, &fs], &bare).unwrap_err();
        assert!(err.log.as_str().contains("vertex buffer layout"));
    }

    #[test]
    fn unwritten_varying_fails_to_link() {
        let vs = compile(ShaderSource::vertex(PASSTHROUGH_VS));
        let fs = compile(ShaderSource::fragment(VARYING_FS));
        let err = link_stages("tinted", &[&vs, &fs], &target()).unwrap_err();
        assert!(err.log.as_str().contains("not written by vertex stage"));
    }

    #[test]
    fn varying_type_mismatch_fails_to_link() {
        let vs = compile(ShaderSource::vertex(VARYING_VS));
        let fs = compile(ShaderSource::fragment(VEC4_VARYING_FS));
        let err = link_stages("tinted", &[&vs, &fs], &target()).unwrap_err();
        assert!(err.log.as_str().contains("type mismatch"));
    }

    #[test]
    fn float_attribute_into_int_input_fails_to_link() {
        let src = r#"
@vertex
fn vs_main(@location(0) pos: vec3<i32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec3<f32>(pos), 1.0);
}
"#;
        let vs = compile(ShaderSource::vertex(src).with_label("int-pos"));
        let fs = compile(ShaderSource::fragment(ORANGE_FS));
        let err = link_stages("int", &[&vs, &fs], &target()).unwrap_err();
        assert!(err.log.as_str().contains("Float32x3"), "log: {}", err.log);
    }

    #[test]
    fn f64_needs_the_device_feature() {
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f64 = 1.0lf;
    return vec4<f32>(f32(x), 0.5, 0.2, 1.0);
}
"#;
        let source = ShaderSource::fragment(src).with_label("wide");
        let err = compile_stage_for(&source, capabilities_for(wgpu::Features::empty())).unwrap_err();
        assert_eq!(err.label, "wide");
        assert!(!err.log.as_str().is_empty());

        compile_stage_for(&source, capabilities_for(wgpu::Features::SHADER_F64)).unwrap();
    }

    #[test]
    fn matching_varyings_link() {
        let vs = compile(ShaderSource::vertex(VARYING_VS));
        let fs = compile(ShaderSource::fragment(VARYING_FS));
        link_stages("tinted", &[&vs, &fs], &target()).unwrap();
    }
}
