use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Mat4;
use image::RgbImage;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::backend::{
    BackendError, DrawCommand, Frame, GraphicsBackend, ProgramSource, ShaderHandle,
    TextureHandle, TextureSampling,
};
use crate::compile::{compile_fixed_fragment_shader, compile_program};
use crate::geometry::{quad_indices, BoxVertex, INDEX_COUNT};
use crate::types::{Antialiasing, ColorSpaceMode};

use super::context::GpuContext;
use super::pipeline::{create_scene_pipeline, PipelineLayouts};
use super::textures::{self, GpuTexture};
use super::uniforms::{projection, SceneUniforms};
use super::DEPTH_FORMAT;

/// Fragment stage a draw runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Texture modulated by the current color.
    Fixed,
    Program(ShaderHandle),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlannedDraw<'a> {
    pub stage: Stage,
    pub texture: TextureHandle,
    pub model_view: Mat4,
    pub color: [f32; 4],
    pub vertices: &'a [BoxVertex],
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PassOp<'a> {
    Clear { color: bool, depth: bool },
    Draw(PlannedDraw<'a>),
}

/// Commands between two presents.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PlannedBatch<'a> {
    pub ops: Vec<PassOp<'a>>,
    pub present: bool,
}

/// Replays a frame's commands against the fixed-function state they modify,
/// validating every handle against the allocation counts.
pub(crate) fn plan_frame(
    frame: &Frame,
    program_count: usize,
    texture_count: usize,
) -> Result<Vec<PlannedBatch<'_>>, BackendError> {
    let mut batches = Vec::new();
    let mut batch = PlannedBatch::default();
    let mut model_view = Mat4::IDENTITY;
    let mut color = [1.0; 4];
    let mut texture = None;
    let mut program_enabled = false;
    let mut program = None;

    for command in frame.commands() {
        match command {
            DrawCommand::Clear { color, depth } => batch.ops.push(PassOp::Clear {
                color: *color,
                depth: *depth,
            }),
            DrawCommand::SetModelView(matrix) => model_view = *matrix,
            DrawCommand::SetColor(rgba) => color = *rgba,
            DrawCommand::BindTexture(handle) => {
                if handle.index() >= texture_count {
                    return Err(BackendError::UnknownTexture(*handle));
                }
                texture = Some(*handle);
            }
            DrawCommand::EnableProgram => program_enabled = true,
            DrawCommand::DisableProgram => program_enabled = false,
            DrawCommand::BindProgram(handle) => {
                if handle.index() >= program_count {
                    return Err(BackendError::UnknownShader(*handle));
                }
                program = Some(*handle);
            }
            DrawCommand::Quads(vertices) => {
                let texture = texture.ok_or(BackendError::NoTextureBound)?;
                let stage = match (program_enabled, program) {
                    (true, Some(handle)) => Stage::Program(handle),
                    _ => Stage::Fixed,
                };
                batch.ops.push(PassOp::Draw(PlannedDraw {
                    stage,
                    texture,
                    model_view,
                    color,
                    vertices,
                }));
            }
            DrawCommand::Present => {
                batch.present = true;
                batches.push(std::mem::take(&mut batch));
            }
        }
    }

    if !batch.ops.is_empty() {
        batches.push(batch);
    }
    Ok(batches)
}

struct RenderTargets {
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    msaa: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl RenderTargets {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let msaa = (sample_count > 1).then(|| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("msaa color target"),
                size: extent,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        Self {
            _depth_texture: depth_texture,
            depth_view,
            msaa,
        }
    }
}

pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    index_buffer: wgpu::Buffer,
    fixed_pipeline: wgpu::RenderPipeline,
    programs: Vec<wgpu::RenderPipeline>,
    textures: Vec<GpuTexture>,
    targets: RenderTargets,
    projection: Mat4,
    frame_count: u64,
    last_stats: Instant,
    frames_since_stats: u32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        color_space: ColorSpaceMode,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, antialiasing, color_space)?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniform buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad index buffer"),
            contents: bytemuck::cast_slice(&quad_indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let fixed_fragment = compile_fixed_fragment_shader(device);
        let fixed_pipeline = create_scene_pipeline(
            device,
            &layouts,
            &fixed_fragment,
            context.surface_format,
            context.sample_count,
            "fixed-function pipeline",
        );

        let targets = RenderTargets::new(
            device,
            context.surface_format,
            context.size,
            context.sample_count,
        );
        let projection = projection(context.size);

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            uniform_bind_group,
            index_buffer,
            fixed_pipeline,
            programs: Vec::new(),
            textures: Vec::new(),
            targets,
            projection,
            frame_count: 0,
            last_stats: Instant::now(),
            frames_since_stats: 0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.context.resize(new_size) {
            return;
        }
        self.targets = RenderTargets::new(
            &self.context.device,
            self.context.surface_format,
            self.context.size,
            self.context.sample_count,
        );
        self.projection = projection(self.context.size);
    }

    /// Restores the swapchain after it was reported lost or outdated.
    pub(crate) fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    fn encode_draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        draw: Option<&PlannedDraw<'_>>,
        clear: Option<(bool, bool)>,
    ) {
        let (clear_color, clear_depth) = clear.unwrap_or((false, false));
        let draw = draw.filter(|draw| draw.vertices.len() >= 4);

        let vertex_buffer = draw.map(|draw| {
            // Per-draw uniforms travel through a staging copy so that every pass
            // of the frame sees its own values.
            let uniforms = SceneUniforms::new(self.projection, draw.model_view, draw.color);
            let staging = self
                .context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("uniform staging"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::COPY_SRC,
                });
            encoder.copy_buffer_to_buffer(
                &staging,
                0,
                &self.uniform_buffer,
                0,
                std::mem::size_of::<SceneUniforms>() as u64,
            );
            self.context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("box vertices"),
                    contents: bytemuck::cast_slice(draw.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let (attachment_view, resolve_target) = match self.targets.msaa.as_ref() {
            Some((_, msaa_view)) => (msaa_view, Some(view)),
            None => (view, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: if clear_color {
                        wgpu::LoadOp::Clear(wgpu::Color::BLACK)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: if clear_depth {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (Some(draw), Some(vertex_buffer)) = (draw, vertex_buffer.as_ref()) else {
            return;
        };
        let pipeline = match draw.stage {
            Stage::Fixed => &self.fixed_pipeline,
            Stage::Program(handle) => &self.programs[handle.index()],
        };
        let texture = &self.textures[draw.texture.index()];
        let index_count = (draw.vertices.len() / 4 * 6).min(INDEX_COUNT) as u32;

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &texture.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..index_count, 0, 0..1);
    }

    fn render_batch(&mut self, batch: &PlannedBatch<'_>) -> Result<(), BackendError> {
        let surface_texture = self.context.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        let mut pending_clear = None;
        for op in &batch.ops {
            match op {
                PassOp::Clear { color, depth } => {
                    let (prev_color, prev_depth) = pending_clear.unwrap_or((false, false));
                    pending_clear = Some((prev_color || *color, prev_depth || *depth));
                }
                PassOp::Draw(draw) => {
                    self.encode_draw(&mut encoder, &view, Some(draw), pending_clear.take());
                }
            }
        }
        if pending_clear.is_some() {
            self.encode_draw(&mut encoder, &view, None, pending_clear);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        if batch.present {
            surface_texture.present();
            self.record_present();
        }
        Ok(())
    }

    fn record_present(&mut self) {
        self.frame_count += 1;
        self.frames_since_stats += 1;
        let elapsed = self.last_stats.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_stats as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame_count = self.frame_count,
                "render stats"
            );
            self.frames_since_stats = 0;
            self.last_stats = Instant::now();
        }
    }
}

impl GraphicsBackend for GpuState {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ShaderHandle, BackendError> {
        let module = compile_program(&self.context.device, source)?;

        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = create_scene_pipeline(
            &self.context.device,
            &self.layouts,
            &module,
            self.context.surface_format,
            self.context.sample_count,
            &source.label,
        );
        if let Some(err) = pollster::block_on(self.context.device.pop_error_scope()) {
            return Err(BackendError::Compile {
                kind: source.kind,
                label: source.label.clone(),
                message: err.to_string(),
            });
        }

        self.programs.push(pipeline);
        Ok(ShaderHandle::from_index(self.programs.len() - 1))
    }

    fn create_texture(
        &mut self,
        image: &RgbImage,
        sampling: TextureSampling,
    ) -> Result<TextureHandle, BackendError> {
        let max_dimension = self.context.capabilities.max_texture_dimension();
        let (width, height) = image.dimensions();
        if width > max_dimension || height > max_dimension {
            return Err(BackendError::TextureTooLarge {
                width,
                height,
                max_dimension,
            });
        }

        let texture = textures::create_texture(
            &self.context.device,
            &self.context.queue,
            &self.layouts.texture_layout,
            image,
            sampling,
            self.context.color_space,
            self.textures.len(),
        );
        self.textures.push(texture);
        Ok(TextureHandle::from_index(self.textures.len() - 1))
    }

    fn max_texture_dimension(&self) -> Option<u32> {
        Some(self.context.capabilities.max_texture_dimension())
    }

    fn submit(&mut self, frame: &Frame) -> Result<(), BackendError> {
        let batches = plan_frame(frame, self.programs.len(), self.textures.len())?;
        for batch in &batches {
            if !batch.present {
                warn!(
                    ops = batch.ops.len(),
                    "frame ended without a present; rendering offscreen only"
                );
            }
            self.render_batch(batch)?;
        }
        Ok(())
    }
}
