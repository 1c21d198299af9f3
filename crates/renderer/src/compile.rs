//! Shader program assembly and front-end checks.
//!
//! Both backends go through the same path before touching any device:
//!
//! 1. Wrap the ShaderToy-style fragment body with [`HEADER`] and [`FOOTER`].
//! 2. Parse each stage with naga's GLSL front end and run the validator;
//!    failures become [`HostError::ShaderCompile`] with the rendered
//!    diagnostic.
//! 3. "Link": every fragment input location must be written by the vertex
//!    stage with the same type, and the uniform block must expose
//!    `iResolution` and `iTime`. Failures become [`HostError::ShaderLink`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::{debug, trace};
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{AddressSpace, Binding, Handle, Module, Type, TypeInner};

use crate::error::{HostError, ShaderStageKind};

/// Vertices of the full-viewport quad, drawn as a 4-vertex triangle strip.
pub const FULLSCREEN_QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

/// Source text for a program before wrapping.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    /// Complete GLSL 450 vertex shader.
    pub vertex: Cow<'static, str>,
    /// ShaderToy-style fragment body defining `mainImage`.
    pub fragment: Cow<'static, str>,
}

impl ProgramSource {
    /// The fixed pass-through vertex stage paired with the glow pattern.
    pub fn pattern() -> Self {
        Self {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: Cow::Borrowed(kernel::PATTERN_SHADER_GLSL),
        }
    }

    /// Pairs the standard vertex stage with a custom `mainImage` body.
    pub fn with_fragment(fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: fragment.into(),
        }
    }
}

impl Default for ProgramSource {
    fn default() -> Self {
        Self::pattern()
    }
}

/// Uniforms the host writes every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformSlot {
    Resolution,
    Time,
}

impl UniformSlot {
    fn member_name(self) -> &'static str {
        match self {
            UniformSlot::Resolution => "_iResolution",
            UniformSlot::Time => "_iTime",
        }
    }

    fn shader_name(self) -> &'static str {
        match self {
            UniformSlot::Resolution => "iResolution",
            UniformSlot::Time => "iTime",
        }
    }
}

/// Byte offset of a uniform inside the std140 block, resolved by reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation {
    pub slot: UniformSlot,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocations {
    pub resolution: UniformLocation,
    pub time: UniformLocation,
}

/// Value written through a [`UniformLocation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Vec2([f32; 2]),
    Float(f32),
}

/// A compiled and linked program, ready for a backend to instantiate.
pub struct ShaderProgram {
    vertex_glsl: String,
    fragment_glsl: String,
    fragment: Module,
    uniforms: UniformLocations,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    pub fn build(source: &ProgramSource) -> Result<Self, HostError> {
        let vertex_glsl = source.vertex.to_string();
        let fragment_glsl = wrap_shadertoy_fragment(&source.fragment);
        trace!(source = %fragment_glsl, "wrapped fragment shader");

        let vertex = compile_stage(ShaderStageKind::Vertex, &vertex_glsl)?;
        let fragment = compile_stage(ShaderStageKind::Fragment, &fragment_glsl)?;
        check_stage_interface(&vertex, &fragment)?;
        let uniforms = UniformLocations {
            resolution: resolve_uniform(&fragment, UniformSlot::Resolution)?,
            time: resolve_uniform(&fragment, UniformSlot::Time)?,
        };
        debug!(?uniforms, "linked shader program");

        Ok(Self {
            vertex_glsl,
            fragment_glsl,
            fragment,
            uniforms,
        })
    }

    pub fn vertex_glsl(&self) -> &str {
        &self.vertex_glsl
    }

    pub fn fragment_glsl(&self) -> &str {
        &self.fragment_glsl
    }

    pub fn fragment_module(&self) -> &Module {
        &self.fragment
    }

    pub fn uniforms(&self) -> UniformLocations {
        self.uniforms
    }
}

/// Parses and validates one stage.
pub(crate) fn compile_stage(stage: ShaderStageKind, source: &str) -> Result<Module, HostError> {
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(stage.to_naga()), source)
        .map_err(|errors| HostError::compile(stage, errors.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| HostError::compile(stage, error.emit_to_string(source)))?;

    Ok(module)
}

fn check_stage_interface(vertex: &Module, fragment: &Module) -> Result<(), HostError> {
    let vertex_entry = entry_point(vertex, wgpu::naga::ShaderStage::Vertex)?;
    let fragment_entry = entry_point(fragment, wgpu::naga::ShaderStage::Fragment)?;

    let mut outputs = BTreeMap::new();
    if let Some(result) = vertex_entry.function.result.as_ref() {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = BTreeMap::new();
    for argument in &fragment_entry.function.arguments {
        collect_locations(fragment, argument.ty, argument.binding.as_ref(), &mut inputs);
    }

    let mut problems = Vec::new();
    for (location, input_ty) in &inputs {
        match outputs.get(location) {
            None => problems.push(format!(
                "fragment input at location {location} is not written by the vertex stage"
            )),
            Some(output_ty) if output_ty != input_ty => problems.push(format!(
                "location {location} type mismatch: vertex writes {output_ty:?}, fragment reads {input_ty:?}"
            )),
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(HostError::link(problems.join("\n")))
    }
}

fn entry_point(
    module: &Module,
    stage: wgpu::naga::ShaderStage,
) -> Result<&wgpu::naga::EntryPoint, HostError> {
    module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage && entry.name == "main")
        .ok_or_else(|| HostError::link(format!("no `main` entry point for {stage:?} stage")))
}

/// Flattens user-defined locations reachable from an entry point argument or
/// result; builtins are skipped.
fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut BTreeMap<u32, TypeInner>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn resolve_uniform(module: &Module, slot: UniformSlot) -> Result<UniformLocation, HostError> {
    let wanted = slot.member_name();
    module
        .global_variables
        .iter()
        .filter(|(_, global)| global.space == AddressSpace::Uniform)
        .find_map(|(_, global)| match &module.types[global.ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .find(|member| member.name.as_deref() == Some(wanted))
                .map(|member| UniformLocation {
                    slot,
                    offset: member.offset,
                }),
            _ => None,
        })
        .ok_or_else(|| {
            HostError::link(format!(
                "uniform `{}` not found in the fragment uniform block",
                slot.shader_name()
            ))
        })
}

/// Produces a self-contained GLSL 450 fragment shader from ShaderToy code.
///
/// Steps performed:
///
/// 1. Strip `#version`/`precision` directives and ShaderToy uniform
///    declarations so WebGL-era sources can be pasted in unchanged.
/// 2. Prepend [`HEADER`] which declares the uniform block and macro aliases.
/// 3. Append [`FOOTER`] which remaps `gl_FragCoord`, calls `mainImage`, and
///    writes an opaque `outColor`.
pub(crate) fn wrap_shadertoy_fragment(source: &str) -> String {
    let mut sanitized = String::new();
    let mut skipped_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if trimmed.starts_with("precision ") {
            continue;
        }
        let should_skip_uniform = trimmed.starts_with("uniform ")
            && SHADERTOY_UNIFORMS.iter().any(|name| trimmed.contains(name));
        if should_skip_uniform {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{HEADER}\n#line 1\n{sanitized}{FOOTER}")
}

const SHADERTOY_UNIFORMS: [&str; 9] = [
    "iResolution",
    "iTime",
    "iFrameRate",
    "iFrame",
    "iMouse",
    "iDate",
    "iSampleRate",
    "iChannelTime",
    "iChannelResolution",
];

/// GLSL prologue injected ahead of the fragment body.
///
/// The block layout must match `ShaderUniforms` in `gpu/uniforms.rs`.
/// `iTimeDelta` is covered by the `iTime` prefix when stripping.
pub(crate) const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform ShaderParams {
    vec3 _iResolution;
    float _iTime;
    float _iTimeDelta;
    float _iFrameRate;
    int _iFrame;
    float _padding0;
    vec4 _iMouse;
    vec4 _iDate;
    float _iChannelTime[4];
    vec3 _iChannelResolution[4];
} ubo;

// Map ShaderToy names to our UBO fields via macros to avoid name clashes.
#define iResolution ubo._iResolution
#define iTime ubo._iTime
#define iTimeDelta ubo._iTimeDelta
#define iFrameRate ubo._iFrameRate
#define iFrame ubo._iFrame
#define iMouse ubo._iMouse
#define iDate ubo._iDate
#define iChannelTime ubo._iChannelTime
#define iChannelResolution ubo._iChannelResolution

vec4 glow_gl_FragCoord;
#define gl_FragCoord glow_gl_FragCoord
";

/// GLSL epilogue that remaps coordinates and delegates to `mainImage`.
pub(crate) const FOOTER: &str = r"void main() {
    // Read the hardware builtin, then remap to a bottom-left origin.
    #undef gl_FragCoord
    vec2 builtinFC = vec2(gl_FragCoord.x, gl_FragCoord.y);
    #define gl_FragCoord glow_gl_FragCoord

    vec2 fragCoord = vec2(builtinFC.x, iResolution.y - builtinFC.y);
    glow_gl_FragCoord = vec4(fragCoord, 0.0, 1.0);

    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = vec4(color.rgb, 1.0);
}
";

/// Identity pass-through of the quad's 2D position attribute.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = a_position * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";
