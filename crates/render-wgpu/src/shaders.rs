/// WGSL shader for the instanced phalanxes and the palm.
///
/// Surface colour is the instance tint modulated by the environment cube
/// sampled along the reflected view ray.
pub const MESH_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var env_map: texture_cube<f32>;
@group(1) @binding(1)
var env_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let view_dir = normalize(in.world_position - camera.eye.xyz);
    let ray = reflect(view_dir, normalize(in.world_normal));
    let env = textureSample(env_map, env_sampler, ray);
    return vec4<f32>(in.color.rgb * env.rgb, in.color.a);
}
"#;

/// Name and version of [`GRID_TEMPLATE`], checked by the scroll patcher.
pub const GRID_TEMPLATE_NAME: &str = "grid";
pub const GRID_TEMPLATE_VERSION: u32 = 1;

/// WGSL template for grid lines. Must pass through the scroll patcher before
/// compilation: the hook markers are where the patch lands.
pub const GRID_TEMPLATE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

//#hook declarations

struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    //#hook vertex_attributes
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    var transformed = vertex.position;
    //#hook begin_vertex
    var out: GridOutput;
    out.clip_position = camera.view_proj * vec4<f32>(transformed, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
