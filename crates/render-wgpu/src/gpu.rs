use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use handgrid_render::{
    CubeMapImages, GridMesh, GridShaderPatcher, GridVertex, HandScene, InstanceBuffer, Mesh,
    RenderError, ShaderTemplate, Vertex,
};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

fn instance_data(instances: &InstanceBuffer) -> Vec<InstanceData> {
    let color = instances.color();
    instances
        .columns()
        .map(|cols| InstanceData {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        })
        .collect()
}

/// Six-layer cube texture plus the bind group the mesh pipeline samples it
/// through.
pub struct EnvironmentMap {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl EnvironmentMap {
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("env_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Upload all six faces in one copy.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        images: &CubeMapImages,
    ) -> Self {
        let side = images.face_size().max(1);
        let size = wgpu::Extent3d {
            width: side,
            height: side,
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("env_cube_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bytes = images.layer_bytes();
        if bytes.len() == (side * side * 4 * 6) as usize {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &bytes,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * side),
                    rows_per_image: Some(side),
                },
                size,
            );
        } else {
            tracing::warn!(
                faces = images.faces.len(),
                bytes = bytes.len(),
                "cube map is incomplete, leaving environment black"
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("env_cube_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("env_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("env_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        tracing::info!(face_size = side, "environment cube map uploaded");
        Self {
            _texture: texture,
            bind_group,
        }
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn new(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// GPU copy of an [`InstanceBuffer`], re-uploaded only when its generation
/// moves.
struct InstanceSlots {
    buffer: wgpu::Buffer,
    count: u32,
    uploaded: Option<u64>,
}

impl InstanceSlots {
    fn new(device: &wgpu::Device, instances: &InstanceBuffer) -> Self {
        let size = (instances.len().max(1) * std::mem::size_of::<InstanceData>()) as u64;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{}_instance_buffer", instances.label())),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            count: instances.len() as u32,
            uploaded: None,
        }
    }

    fn sync(&mut self, queue: &wgpu::Queue, instances: &InstanceBuffer) {
        if self.count == 0 || self.uploaded == Some(instances.generation()) {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&instance_data(instances)));
        self.uploaded = Some(instances.generation());
    }
}

struct GridBuffers {
    vertices: wgpu::Buffer,
    moveable: wgpu::Buffer,
    vertex_count: u32,
}

impl GridBuffers {
    fn new(device: &wgpu::Device, label: &str, grid: &GridMesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&grid.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let moveable = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_moveable_buffer")),
            contents: bytemuck::cast_slice(&grid.moveable),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertices,
            moveable,
            vertex_count: grid.vertex_count() as u32,
        }
    }
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: wgpu::TextureFormat::Depth32Float,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

/// wgpu renderer for a [`HandScene`]: two grids through the patched line
/// pipeline, then the palm and the phalanxes through the instanced mesh
/// pipeline.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    scroll_buffer: wgpu::Buffer,
    scroll_bind_group: wgpu::BindGroup,
    environment: EnvironmentMap,
    phalanx_mesh: MeshBuffers,
    palm_mesh: MeshBuffers,
    phalanx_slots: InstanceSlots,
    palm_slots: InstanceSlots,
    scroll_grid: GridBuffers,
    square: GridBuffers,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &HandScene,
        environment: &CubeMapImages,
    ) -> Result<Self, RenderError> {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0, 0.0, 0.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let scroll_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_scroll_buffer"),
            contents: bytemuck::bytes_of(&scene.uniforms.raw()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scroll_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid_scroll_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let scroll_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid_scroll_bind_group"),
            layout: &scroll_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scroll_buffer.as_entire_binding(),
            }],
        });

        let env_layout = EnvironmentMap::bind_group_layout(device);
        let environment = EnvironmentMap::upload(device, queue, &env_layout, environment);

        // Mesh pipeline
        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &env_layout],
            push_constant_ranges: &[],
        });
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&mesh_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Grid pipeline, compiled from the patched template
        let template = ShaderTemplate::new(
            shaders::GRID_TEMPLATE_NAME,
            shaders::GRID_TEMPLATE_VERSION,
            shaders::GRID_TEMPLATE,
        )?;
        let grid_source = GridShaderPatcher::patch(template)?.into_source();
        let grid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &scroll_layout],
            push_constant_ranges: &[],
        });
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(grid_source.into()),
        });
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&grid_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<GridVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x4,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<f32>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![2 => Float32],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::info!(
            phalanx_instances = scene.phalanxes.len(),
            grid_vertices = scene.scroll_grid.vertex_count(),
            "wgpu renderer ready"
        );

        Ok(Self {
            mesh_pipeline,
            grid_pipeline,
            camera_buffer,
            camera_bind_group,
            scroll_buffer,
            scroll_bind_group,
            environment,
            phalanx_mesh: MeshBuffers::new(device, "phalanx", &scene.phalanx_mesh),
            palm_mesh: MeshBuffers::new(device, "palm", &scene.palm_mesh),
            phalanx_slots: InstanceSlots::new(device, &scene.phalanxes),
            palm_slots: InstanceSlots::new(device, &scene.palm),
            scroll_grid: GridBuffers::new(device, "scroll_grid", &scene.scroll_grid),
            square: GridBuffers::new(device, "square_grid", &scene.square),
            depth_texture,
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame. Instance buffers are uploaded only if the scene
    /// marked them dirty since the last upload.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        scene: &HandScene,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                eye: camera.position().extend(1.0).to_array(),
            }),
        );
        queue.write_buffer(
            &self.scroll_buffer,
            0,
            bytemuck::bytes_of(&scene.uniforms.raw()),
        );
        self.phalanx_slots.sync(queue, &scene.phalanxes);
        self.palm_slots.sync(queue, &scene.palm);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &self.scroll_bind_group, &[]);
            for grid in [&self.scroll_grid, &self.square] {
                pass.set_vertex_buffer(0, grid.vertices.slice(..));
                pass.set_vertex_buffer(1, grid.moveable.slice(..));
                pass.draw(0..grid.vertex_count, 0..1);
            }

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &self.environment.bind_group, &[]);
            for (mesh, slots) in [
                (&self.palm_mesh, &self.palm_slots),
                (&self.phalanx_mesh, &self.phalanx_slots),
            ] {
                if slots.count == 0 || mesh.index_count == 0 {
                    continue;
                }
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_vertex_buffer(1, slots.buffer.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..slots.count);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handgrid_kernel::InstanceSink;
    use handgrid_render::PHALANX_COLOR;

    #[test]
    fn instance_data_carries_shared_color_and_columns() {
        let mut buffer = InstanceBuffer::new("phalanxes", 2, PHALANX_COLOR);
        let world = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        buffer.sync_instance(1, world).unwrap();
        let data = instance_data(&buffer);
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(|d| d.color == PHALANX_COLOR));
        assert_eq!(data[1].model_3, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(data[0].model_0, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn gpu_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
    }
}
