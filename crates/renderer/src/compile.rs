//! GLSL sources for the box pipelines and wrapping of user fragment programs.

use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::backend::{BackendError, ProgramKind, ProgramSource};

/// Compiles the built-in box vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("litbox vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the fragment stage used while no program is enabled: the bound
/// texture modulated by the current color.
pub(crate) fn compile_fixed_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("litbox fixed fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrap_fragment(FIXED_FRAGMENT_GLSL)),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Wraps a user program with the scene prelude and compiles it.
///
/// Compilation runs inside a validation error scope so a broken program is
/// reported as [`BackendError::Compile`] rather than through the device's
/// uncaptured error handler.
pub(crate) fn compile_program(
    device: &wgpu::Device,
    source: &ProgramSource,
) -> Result<wgpu::ShaderModule, BackendError> {
    let stage = match source.kind {
        ProgramKind::Fragment => ShaderStage::Fragment,
        #[allow(unreachable_patterns)]
        kind => return Err(BackendError::UnsupportedProgram { kind }),
    };

    let wrapped = wrap_fragment(&source.text);
    tracing::trace!(label = %source.label, "wrapped program:\n{wrapped}");

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&source.label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(wrapped),
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(BackendError::Compile {
            kind: source.kind,
            label: source.label.clone(),
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Produces a self-contained GLSL fragment shader from program text.
///
/// The program's first `#version` directive is blanked since [`PRELUDE`]
/// supplies its own. Line numbers in diagnostics match the program file.
pub(crate) fn wrap_fragment(source: &str) -> String {
    let mut body = String::with_capacity(source.len());
    let mut skipped_version = false;
    for line in source.lines() {
        if !skipped_version && line.trim_start().starts_with("#version") {
            skipped_version = true;
            body.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    format!("{PRELUDE}\n#line 1\n{body}")
}

/// Declarations shared by every fragment program.
///
/// The uniform block layout must match `SceneUniforms` in `gpu/uniforms.rs`.
const PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_texcoord;
layout(location = 1) in vec3 v_light;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 model_view_projection;
    vec4 color;
} scene;

layout(set = 1, binding = 0) uniform texture2D litbox_wall_texture;
layout(set = 1, binding = 1) uniform sampler litbox_wall_sampler;

#define wallTexture sampler2D(litbox_wall_texture, litbox_wall_sampler)
#define sceneColor scene.color
";

const FIXED_FRAGMENT_GLSL: &str = r"void main() {
    outColor = texture(wallTexture, v_texcoord) * sceneColor;
}
";

const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 texcoord;
layout(location = 2) in vec3 light_vector;

layout(location = 0) out vec2 v_texcoord;
layout(location = 1) out vec3 v_light;

layout(std140, set = 0, binding = 0) uniform SceneParams {
    mat4 model_view_projection;
    vec4 color;
} scene;

void main() {
    v_texcoord = texcoord;
    v_light = light_vector;
    gl_Position = scene.model_view_projection * vec4(position, 1.0);
}
";
