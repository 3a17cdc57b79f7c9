use crate::mesh::{self, InstanceData, PointVertex, Uniforms, Vertex};
use crate::shaders;
use frameloop_common::GeometryHandle;
use frameloop_render::{RenderError, RenderFrame, Renderer};
use frameloop_scene::NodeKind;
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const MAX_MESH_INSTANCES: u32 = 10_000;
const MAX_POINT_NODES: u32 = 256;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Surface, device and queue for one window.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    backend: String,
}

impl GpuContext {
    /// Open a surface on `target` and pick an adapter that can present to it.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Device("no compatible adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("frameloop_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let backend = adapter.get_info().backend.to_str().to_string();
        tracing::info!(%backend, ?format, "GPU initialized");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            backend,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

struct PointBuffer {
    version: u64,
    buffer: wgpu::Buffer,
    count: u32,
}

/// wgpu implementation of [`Renderer`].
pub struct WgpuRenderer {
    gpu: GpuContext,
    mesh_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    points_additive_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    mesh_instance_buffer: wgpu::Buffer,
    point_instance_buffer: wgpu::Buffer,
    point_buffers: BTreeMap<GeometryHandle, PointBuffer>,
    depth_texture: wgpu::TextureView,
}

struct PointDraw {
    geometry: GeometryHandle,
    additive: bool,
}

impl WgpuRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;
        let surface_format = gpu.config.format;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&mesh::lighting(
                &frameloop_scene::Scene::new(),
                glam::Mat4::IDENTITY,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![
                2 => Float32x4,
                3 => Float32x4,
                4 => Float32x4,
                5 => Float32x4,
                6 => Float32x4,
            ],
        };

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
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
                    instance_layout.clone(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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

        let points_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POINTS_SHADER.into()),
        });

        let points_pipeline_with = |label: &str, blend: wgpu::BlendState, depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &points_shader,
                    entry_point: Some("vs_points"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<PointVertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x4,
                            ],
                        },
                        instance_layout.clone(),
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &points_shader,
                    entry_point: Some("fs_points"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::PointList,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state(depth_write)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let points_pipeline =
            points_pipeline_with("points_pipeline", wgpu::BlendState::ALPHA_BLENDING, true);
        let points_additive_pipeline =
            points_pipeline_with("points_additive_pipeline", additive, false);

        let (cube_verts, cube_indices) = mesh::cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let instance_buffer = |label: &str, capacity: u32| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: u64::from(capacity) * std::mem::size_of::<InstanceData>() as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let mesh_instance_buffer = instance_buffer("mesh_instance_buffer", MAX_MESH_INSTANCES);
        let point_instance_buffer = instance_buffer("point_instance_buffer", MAX_POINT_NODES);

        let depth_texture = create_depth_texture(device, gpu.config.width, gpu.config.height);

        Self {
            mesh_pipeline,
            points_pipeline,
            points_additive_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            mesh_instance_buffer,
            point_instance_buffer,
            point_buffers: BTreeMap::new(),
            depth_texture,
            gpu,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Upload point clouds whose geometry changed since the last frame and
    /// forget buffers whose geometry was disposed.
    fn refresh_point_buffers(&mut self, frame: &RenderFrame<'_>) {
        self.point_buffers
            .retain(|handle, _| frame.resources.geometry(*handle).is_some());

        for (_, node, geometry, material) in frame.scene.drawables() {
            if !matches!(node.kind, NodeKind::Points { .. }) {
                continue;
            }
            let (Some(record), Some(mat)) = (
                frame.resources.geometry(geometry),
                frame.resources.material(material),
            ) else {
                continue;
            };
            if self
                .point_buffers
                .get(&geometry)
                .is_some_and(|b| b.version == record.version)
            {
                continue;
            }
            let Some(vertices) = mesh::point_vertices(&record.geometry, &mat.material) else {
                continue;
            };
            let buffer = self
                .gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("point_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            tracing::debug!(
                ?geometry,
                version = record.version,
                points = vertices.len(),
                "point buffer uploaded"
            );
            self.point_buffers.insert(
                geometry,
                PointBuffer {
                    version: record.version,
                    buffer,
                    count: vertices.len() as u32,
                },
            );
        }
    }
}

impl Renderer for WgpuRenderer {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        frame.validate()?;

        let output = match self.gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!(frame = frame.frame, "surface lost, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.refresh_point_buffers(frame);

        let uniforms: Uniforms = mesh::lighting(frame.scene, frame.camera.view_projection());
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut mesh_instances: Vec<InstanceData> = Vec::new();
        let mut point_instances: Vec<InstanceData> = Vec::new();
        let mut point_draws: Vec<PointDraw> = Vec::new();
        for (_, node, geometry, material) in frame.scene.drawables() {
            let (Some(g), Some(m)) = (
                frame.resources.geometry(geometry),
                frame.resources.material(material),
            ) else {
                continue;
            };
            match node.kind {
                NodeKind::Points { .. } => {
                    if point_instances.len() >= MAX_POINT_NODES as usize
                        || !self.point_buffers.contains_key(&geometry)
                    {
                        continue;
                    }
                    point_instances.push(mesh::points_instance(&node.transform, &m.material));
                    point_draws.push(PointDraw {
                        geometry,
                        additive: mesh::is_additive(&m.material),
                    });
                }
                _ => {
                    if mesh_instances.len() >= MAX_MESH_INSTANCES as usize {
                        continue;
                    }
                    mesh_instances.push(mesh::mesh_instance(
                        &node.transform,
                        &g.geometry,
                        &m.material,
                    ));
                }
            }
        }

        if !mesh_instances.is_empty() {
            self.gpu.queue.write_buffer(
                &self.mesh_instance_buffer,
                0,
                bytemuck::cast_slice(&mesh_instances),
            );
        }
        if !point_instances.is_empty() {
            self.gpu.queue.write_buffer(
                &self.point_instance_buffer,
                0,
                bytemuck::cast_slice(&point_instances),
            );
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let [r, g, b] = frame.scene.background.to_array();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: 1.0,
                        }),
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
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if !mesh_instances.is_empty() {
                pass.set_pipeline(&self.mesh_pipeline);
                pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.mesh_instance_buffer.slice(..));
                pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.cube_index_count, 0, 0..mesh_instances.len() as u32);
            }

            if !point_draws.is_empty() {
                pass.set_vertex_buffer(1, self.point_instance_buffer.slice(..));
                for (i, draw) in point_draws.iter().enumerate() {
                    let Some(points) = self.point_buffers.get(&draw.geometry) else {
                        continue;
                    };
                    pass.set_pipeline(if draw.additive {
                        &self.points_additive_pipeline
                    } else {
                        &self.points_pipeline
                    });
                    pass.set_vertex_buffer(0, points.buffer.slice(..));
                    let i = i as u32;
                    pass.draw(0..points.count, i..i + 1);
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.config.width = width.max(1);
        self.gpu.config.height = height.max(1);
        self.gpu.reconfigure();
        self.depth_texture =
            create_depth_texture(&self.gpu.device, self.gpu.config.width, self.gpu.config.height);
    }
}

fn depth_state(depth_write_enabled: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
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
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
