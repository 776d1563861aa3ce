//! WGPU implementation of [`RenderBackend`].
//!
//! Scene traversal calls `bind`, `set_uniforms` and `draw` in pre-order. Those
//! calls are recorded as [`DrawCommand`]s while GPU resources for unseen objects
//! are created on the spot; [`WgpuBackend::end_frame`] then uploads all node
//! uniforms in one write and replays the commands inside a single render pass.
//!
//! Bind groups:
//! - group 0: [`NodeUniforms`] with a dynamic offset per draw
//! - group 1: diffuse texture, normal map, sampler

use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::gfx::{
    camera::camera_utils::{convert_matrix4_to_array, OPENGL_TO_WGPU_MATRIX},
    renderer::Renderer,
    resources::texture_resource::TextureResource,
    scene::{
        node::NodeUniforms,
        object::{ObjectId, RenderObject},
        shader::{ShaderHandle, ShaderSource},
    },
};

use super::{
    backend::{RenderBackend, RenderError},
    pipeline_manager::{PipelineConfig, PipelineManager},
};

/// One recorded backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    SetPipeline(ShaderHandle),
    /// Index of the node's slot in the frame's uniform buffer.
    SetUniforms(u32),
    Draw(ObjectId),
}

/// GPU copy of a render object.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    textures: wgpu::BindGroup,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    pipeline_config: PipelineConfig,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    staged_uniforms: Vec<u8>,
    fallback_diffuse: TextureResource,
    fallback_normal: TextureResource,
    meshes: HashMap<ObjectId, GpuMesh>,
    commands: Vec<DrawCommand>,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    /// Creates the backend for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Arbor Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Surface(e.to_string()))?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<NodeUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Textures Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = wgpu::util::align_to(std::mem::size_of::<NodeUniforms>() as u64, alignment);
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniform_slots(&device, &uniform_layout, uniform_stride, 64);

        let pipeline_manager =
            PipelineManager::new(device.clone(), &[&uniform_layout, &texture_layout]);
        let fallback_diffuse = TextureResource::white(&device, &queue);
        let fallback_normal = TextureResource::flat_normal(&device, &queue);

        info!(
            "WGPU backend ready: {} ({:?}), {}x{}",
            adapter.get_info().name,
            format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline_manager,
            pipeline_config: PipelineConfig::default(),
            uniform_layout,
            texture_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            staged_uniforms: Vec::new(),
            fallback_diffuse,
            fallback_normal,
            meshes: HashMap::new(),
            commands: Vec::new(),
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
        })
    }

    fn create_uniform_slots(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        slots: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Node Uniforms"),
            size: stride * slots,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Node Uniforms Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<NodeUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Render state used for programs compiled from now on (builder pattern)
    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Starts recording a frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.staged_uniforms.clear();
    }

    /// Uploads the frame's uniforms, replays the recorded commands in one
    /// render pass, then submits and presents.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn end_frame(&mut self) -> Result<(), RenderError> {
        self.upload_uniforms();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for command in &self.commands {
                match *command {
                    DrawCommand::SetPipeline(handle) => {
                        let pipeline = self
                            .pipeline_manager
                            .get(handle)
                            .ok_or(RenderError::UnknownShader(handle))?;
                        render_pass.set_pipeline(pipeline);
                    }
                    DrawCommand::SetUniforms(slot) => {
                        let offset = (slot as u64 * self.uniform_stride) as u32;
                        render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                    }
                    DrawCommand::Draw(id) => {
                        let mesh = self.meshes.get(&id).ok_or(RenderError::MissingObject(id))?;
                        render_pass.draw_mesh(mesh);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Runs one frame: `begin_frame`, the renderer's draw traversal, `end_frame`.
    pub fn render_frame(&mut self, renderer: &mut Renderer) -> Result<(), RenderError> {
        self.begin_frame();
        renderer.render(self)?;
        self.end_frame()
    }

    fn upload_uniforms(&mut self) {
        if self.staged_uniforms.is_empty() {
            return;
        }
        let needed = self.staged_uniforms.len() as u64;
        if needed > self.uniform_buffer.size() {
            let slots = (needed / self.uniform_stride).next_power_of_two();
            debug!("Growing node uniform buffer to {} slots", slots);
            let (buffer, bind_group) = Self::create_uniform_slots(
                &self.device,
                &self.uniform_layout,
                self.uniform_stride,
                slots,
            );
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, &self.staged_uniforms);
    }

    fn upload_object(&self, object: &RenderObject) -> GpuMesh {
        let geometry = object.geometry();
        let label = object.name();

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertices", label)),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Indices", label)),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });

        let diffuse = object
            .diffuse()
            .map(|t| TextureResource::from_image(&self.device, &self.queue, t.image(), label));
        let normal = object
            .normal_map()
            .map(|t| TextureResource::from_normal_map(&self.device, &self.queue, t.image(), label));
        let diffuse = diffuse.as_ref().unwrap_or(&self.fallback_diffuse);
        let normal = normal.as_ref().unwrap_or(&self.fallback_normal);

        let textures = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Textures", label)),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
            ],
        });

        debug!(
            "Uploaded '{}' ({} vertices, {} indices)",
            label,
            geometry.vertex_count(),
            geometry.indices().len()
        );

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices().len() as u32,
            textures,
        }
    }

    /// Reconfigures the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Commands recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}

impl RenderBackend for WgpuBackend {
    fn compile(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
        self.pipeline_manager
            .compile(source, &self.pipeline_config, self.config.format)
    }

    fn bind(&mut self, shader: ShaderHandle) -> Result<(), RenderError> {
        if !self.pipeline_manager.contains(shader) {
            return Err(RenderError::UnknownShader(shader));
        }
        self.commands.push(DrawCommand::SetPipeline(shader));
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &NodeUniforms) -> Result<(), RenderError> {
        let slot = (self.staged_uniforms.len() as u64 / self.uniform_stride) as u32;

        let projection = OPENGL_TO_WGPU_MATRIX * cgmath::Matrix4::from(uniforms.projection);
        let adjusted = NodeUniforms {
            projection: convert_matrix4_to_array(projection),
            ..*uniforms
        };

        self.staged_uniforms
            .extend_from_slice(bytemuck::bytes_of(&adjusted));
        let padded = (slot as u64 + 1) * self.uniform_stride;
        self.staged_uniforms.resize(padded as usize, 0);

        self.commands.push(DrawCommand::SetUniforms(slot));
        Ok(())
    }

    fn draw(&mut self, object: &RenderObject) -> Result<(), RenderError> {
        if object.geometry().indices().is_empty() {
            return Ok(());
        }
        if !self.meshes.contains_key(&object.id()) {
            let mesh = self.upload_object(object);
            self.meshes.insert(object.id(), mesh);
        }
        self.commands.push(DrawCommand::Draw(object.id()));
        Ok(())
    }

    fn release(&mut self, object: ObjectId) {
        if self.meshes.remove(&object).is_some() {
            debug!("Released GPU mesh for {:?}", object);
        }
    }
}

trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &GpuMesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &GpuMesh) {
        self.set_bind_group(1, &mesh.textures, &[]);
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
