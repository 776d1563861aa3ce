//! Render pipeline management for wgpu
//!
//! Every compiled shader program becomes one render pipeline, keyed by the
//! [`ShaderHandle`] returned to the scene graph. All pipelines share the same
//! bind group layouts and the [`Vertex3D`] buffer layout.

use std::{collections::HashMap, sync::Arc};

use log::{debug, error};
use wgpu::*;

use crate::gfx::{
    geometry::Vertex3D,
    rendering::backend::RenderError,
    resources::texture_resource::TextureResource,
    scene::shader::{ShaderHandle, ShaderSource},
};

/// Render state applied to each compiled program.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_compare: CompareFunction,
    pub depth_write: bool,
    pub blend: Option<BlendState>,
    pub multisample: MultisampleState,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Scene Pipeline".to_string(),
            primitive_topology: PrimitiveTopology::TriangleList,
            // Skyboxes are seen from inside and OBJ winding is not guaranteed
            cull_mode: None,
            depth_compare: CompareFunction::LessEqual,
            depth_write: true,
            blend: Some(BlendState::REPLACE),
            multisample: MultisampleState::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    /// Sets primitive topology for this pipeline (builder pattern)
    ///
    /// # Arguments
    /// * `topology` - Primitive topology (TriangleList, LineList, ...)
    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    /// Sets the depth test (builder pattern)
    ///
    /// # Arguments
    /// * `compare` - Depth comparison function
    /// * `write` - Whether passing fragments write depth
    pub fn with_depth(mut self, compare: CompareFunction, write: bool) -> Self {
        self.depth_compare = compare;
        self.depth_write = write;
        self
    }

    pub fn with_blend(mut self, blend: Option<BlendState>) -> Self {
        self.blend = blend;
        self
    }
}

/// Compiles shader programs into pipelines and hands out their handles.
pub struct PipelineManager {
    device: Arc<Device>,
    layout: PipelineLayout,
    pipelines: HashMap<ShaderHandle, RenderPipeline>,
    next_id: u32,
}

impl PipelineManager {
    /// Creates a manager whose pipelines use `bind_group_layouts` in order.
    pub fn new(device: Arc<Device>, bind_group_layouts: &[&BindGroupLayout]) -> Self {
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        Self {
            device,
            layout,
            pipelines: HashMap::new(),
            next_id: 1,
        }
    }

    /// Builds a pipeline for `source`.
    ///
    /// Validation errors raised while creating the module or the pipeline are
    /// captured and returned instead of reaching wgpu's panic handler.
    ///
    /// # Arguments
    /// * `source` - Program sources, resolved to one WGSL module
    /// * `config` - Render state
    /// * `format` - Color target format (the surface format)
    pub fn compile(
        &mut self,
        source: &ShaderSource,
        config: &PipelineConfig,
        format: TextureFormat,
    ) -> Result<ShaderHandle, RenderError> {
        let label = source.label();
        let wgsl = source.resolve()?;

        self.device.push_error_scope(ErrorFilter::Validation);

        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });

        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&format!("{} ({})", config.label, label)),
            layout: Some(&self.layout),
            vertex: VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format,
                    blend: config.blend,
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: config.primitive_topology,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: config.depth_write,
                depth_compare: config.depth_compare,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: config.multisample,
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            error!("Shader program '{}' rejected: {}", label, err);
            return Err(RenderError::ShaderCompilation {
                label,
                message: err.to_string(),
            });
        }

        let handle = ShaderHandle::new(self.next_id);
        self.next_id += 1;
        self.pipelines.insert(handle, pipeline);
        debug!("Compiled shader program '{}' as {:?}", label, handle);
        Ok(handle)
    }

    pub fn get(&self, handle: ShaderHandle) -> Option<&RenderPipeline> {
        self.pipelines.get(&handle)
    }

    pub fn contains(&self, handle: ShaderHandle) -> bool {
        self.pipelines.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
