use std::borrow::Cow;
use std::collections::HashSet;

use tracing::debug;
use wgpu::naga::ShaderStage;

use crate::types::{SetupError, ShaderSource, ShaderStageKind};
use crate::uniforms::{SlotTable, Uniform};

/// Pattern used when no `--shader` is given.
pub const BUNDLED_FRAGMENT: &str = include_str!("shaders/drift.frag");

/// Wrapped fragment source plus the uniform slots the user code references.
#[derive(Debug, Clone)]
pub struct PreparedShader {
    pub wrapped: String,
    pub slots: SlotTable,
}

pub fn load_fragment_source(source: &ShaderSource) -> Result<Cow<'static, str>, SetupError> {
    match source {
        ShaderSource::Bundled => Ok(Cow::Borrowed(BUNDLED_FRAGMENT)),
        ShaderSource::File(path) => std::fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|source| SetupError::ReadShader {
                path: path.clone(),
                source,
            }),
    }
}

/// Sanitises user GLSL, resolves its uniform slots and wraps it for naga.
pub fn prepare_fragment(source: &str) -> PreparedShader {
    let body = sanitize(source);
    let slots = referenced_uniforms(&body);
    PreparedShader {
        wrapped: format!("{HEADER}\n#line 1\n{body}{FOOTER}"),
        slots,
    }
}

/// A slot counts as found when its name appears as an identifier outside
/// comments. `resolution` is always bound since the wrapper footer reads it.
pub fn referenced_uniforms(source: &str) -> SlotTable {
    let code = strip_comments(source);
    let tokens: HashSet<&str> = identifiers(&code).collect();
    SlotTable::resolve(|name| name == Uniform::Resolution.name() || tokens.contains(name))
}

/// Blanks out `//` and `/* */` comments, keeping line breaks.
fn strip_comments(source: &str) -> String {
    let mut code = String::with_capacity(source.len());
    let mut rest = source;
    while !rest.is_empty() {
        let line = rest.find("//");
        let block = rest.find("/*");
        match (line, block) {
            (Some(l), b) if b.map_or(true, |b| l < b) => {
                code.push_str(&rest[..l]);
                rest = &rest[l..];
                let end = rest.find('\n').unwrap_or(rest.len());
                rest = &rest[end..];
            }
            (_, Some(b)) => {
                code.push_str(&rest[..b]);
                code.push(' ');
                let body = &rest[b + 2..];
                let end = body.find("*/").map_or(body.len(), |e| e + 2);
                code.extend(body[..end].chars().filter(|&c| c == '\n'));
                rest = &body[end..];
            }
            _ => {
                code.push_str(rest);
                rest = "";
            }
        }
    }
    code
}

/// Drops `#version`, `precision` and any `uniform` declaration that names
/// one of the injected block members.
fn sanitize(source: &str) -> String {
    let mut sanitized = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if trimmed.starts_with("uniform ") && declares_injected_uniform(trimmed) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }
    sanitized
}

fn declares_injected_uniform(line: &str) -> bool {
    identifiers(strip_line_comment(line))
        .any(|token| Uniform::ALL.iter().any(|slot| slot.name() == token))
}

fn strip_line_comment(line: &str) -> &str {
    line.split_once("//").map_or(line, |(code, _)| code)
}

fn identifiers(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
}

pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule, SetupError> {
    compile_glsl(
        device,
        "fullscreen quad vertex",
        Cow::Borrowed(VERTEX_SHADER_GLSL),
        ShaderStageKind::Vertex,
    )
}

pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    prepared: &PreparedShader,
) -> Result<wgpu::ShaderModule, SetupError> {
    debug!(bytes = prepared.wrapped.len(), "compiling wrapped fragment shader");
    compile_glsl(
        device,
        "lumadrift fragment",
        Cow::Owned(prepared.wrapped.clone()),
        ShaderStageKind::Fragment,
    )
}

fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    shader: Cow<'_, str>,
    stage: ShaderStageKind,
) -> Result<wgpu::ShaderModule, SetupError> {
    let naga_stage = match stage {
        ShaderStageKind::Vertex => ShaderStage::Vertex,
        ShaderStageKind::Fragment => ShaderStage::Fragment,
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader,
            stage: naga_stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(SetupError::ShaderCompile {
            stage,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// GLSL prologue injected ahead of the user fragment shader.
///
/// The block layout must match [`UniformBlock`](crate::uniforms::UniformBlock).
/// Uniform names map onto block members through macros so user code can
/// keep using the bare names.
const HEADER: &str = r"#version 450
layout(location = 0) out vec4 lumadrift_color;

layout(std140, set = 0, binding = 0) uniform VisualParams {
    vec2 u_resolution;
    float u_time;
    float u_timeScale;
    vec3 u_seed;
    float u_patternAmp;
    vec3 u_colorTint;
    float u_patternFreq;
    float u_bloomStrength;
    float u_saturation;
    float u_grainAmount;
    float u_minCircleSize;
    float u_circleStrength;
    float u_distortX;
    float u_distortY;
    float u_padding;
} ubo;

#define resolution ubo.u_resolution
#define time ubo.u_time
#define timeScale ubo.u_timeScale
#define seed ubo.u_seed
#define patternAmp ubo.u_patternAmp
#define colorTint ubo.u_colorTint
#define patternFreq ubo.u_patternFreq
#define bloomStrength ubo.u_bloomStrength
#define saturation ubo.u_saturation
#define grainAmount ubo.u_grainAmount
#define minCircleSize ubo.u_minCircleSize
#define circleStrength ubo.u_circleStrength
#define distortX ubo.u_distortX
#define distortY ubo.u_distortY
";

/// Flips to a bottom-left origin and delegates to `mainImage`.
const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, ubo.u_resolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0, 0.0, 0.0, 1.0);
    mainImage(color, fragCoord);
    lumadrift_color = color;
}
";

/// Passes the quad corners straight through.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";
