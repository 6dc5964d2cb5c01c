use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::types::PostProcess;

/// Compiles the vertex shader that stretches both follower rects over the
/// full viewport.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("loupe quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the fragment shader for the chosen post-process.
///
/// Build failures are reported through the device error scope opened by the
/// caller, not here.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    post_process: PostProcess,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("loupe fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: fragment_source(post_process),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

pub(crate) fn fragment_source(post_process: PostProcess) -> Cow<'static, str> {
    match post_process {
        PostProcess::Blurry { samples } => Cow::Owned(format!(
            "{FRAGMENT_HEADER}\nconst int SAMPLES = {samples};\n{BLURRY_BODY}",
            samples = samples.max(1)
        )),
        PostProcess::Noisy => Cow::Owned(format!("{FRAGMENT_HEADER}\n{NOISY_BODY}")),
    }
}

/// Viewport corner (x right, y down, both in `[0, 1]`) of each quad vertex:
/// two triangles sharing the top-left and bottom-right corners.
pub(crate) const QUAD_CORNERS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

/// The uniform block layout must match `RectUniforms` in `gpu/uniforms.rs`.
const VERTEX_HEADER: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform Rects {
    vec4 sharp;
    vec4 blur;
} rects;

layout(location = 0) out vec2 v_sharp;
layout(location = 1) out vec2 v_blur;
";

/// Each vertex picks its entry of [`QUAD_CORNERS`] and emits the matching
/// corner of the sharp and blur rects: `(0,0)` is `.xy`, `(1,0)` is `.zy`,
/// `(1,1)` is `.zw` and `(0,1)` is `.xw`.
pub(crate) fn vertex_source() -> String {
    let mut corners = String::new();
    for (index, [x, y]) in QUAD_CORNERS.iter().enumerate() {
        let branch = if index == 0 { "if" } else { " else if" };
        corners.push_str(&format!(
            "{branch} (index == {index}) {{\n        corner = vec2({x:.1}, {y:.1});\n    }}"
        ));
    }
    format!(
        "{VERTEX_HEADER}
void main() {{
    int index = int(gl_VertexIndex);
    vec2 corner = vec2(0.0);
    {corners}
    v_sharp = mix(rects.sharp.xy, rects.sharp.zw, corner);
    v_blur = mix(rects.blur.xy, rects.blur.zw, corner);
    gl_Position = vec4(corner.x * 2.0 - 1.0, 1.0 - corner.y * 2.0, 0.0, 1.0);
}}
"
    )
}

const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_sharp;
layout(location = 1) in vec2 v_blur;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D loupe_snapshot;
layout(set = 1, binding = 1) uniform sampler loupe_sampler;

float inside_unit(vec2 uv) {
    bool inside = all(greaterThanEqual(uv, vec2(0.0))) && all(lessThanEqual(uv, vec2(1.0)));
    return inside ? 1.0 : 0.0;
}

vec3 snapshot_at(vec2 uv) {
    return texture(sampler2D(loupe_snapshot, loupe_sampler), uv).rgb;
}
";

// Taps outside the snapshot contribute nothing but still count towards the
// divisor, so the overlay darkens towards out-of-range areas.
const BLURRY_BODY: &str = r"void main() {
    vec3 sum = vec3(0.0);
    for (int i = 0; i < SAMPLES; i++) {
        vec2 uv = mix(v_sharp, v_blur, float(i) / float(SAMPLES));
        sum += inside_unit(uv) * snapshot_at(uv);
    }
    outColor = vec4(sum / float(SAMPLES), 1.0);
}
";

const NOISY_BODY: &str = r"float loupe_hash(vec2 co) {
    return fract(sin(dot(co, vec2(12.9898, 78.233))) * 43758.5453);
}

void main() {
    vec2 uv = mix(v_sharp, v_blur, loupe_hash(v_sharp + v_blur));
    outColor = vec4(inside_unit(uv) * snapshot_at(uv), 1.0);
}
";
