use std::time::{Duration, Instant};

use navigation::Followers;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::capture::{CaptureTexture, Snapshot};
use crate::error::EngineError;
use crate::types::{AdapterProfile, MagnifierConfig};

use super::context::GpuContext;
use super::pipeline::{MagnifierPipeline, QUAD_VERTICES};
use super::uniforms::RectUniforms;

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Presented,
    /// No swapchain image this frame; navigation still advances.
    Skipped,
}

/// Per-session GPU resources: surface, pipeline, the uploaded snapshot and
/// the rect uniform buffer.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: MagnifierPipeline,
    _capture: CaptureTexture,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    snapshot_bind_group: wgpu::BindGroup,
    uniforms: RectUniforms,
    frame_count: u64,
    frames_since_last_update: u32,
    last_fps_update: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        snapshot: Snapshot,
        config: &MagnifierConfig,
    ) -> Result<Self, EngineError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let size = PhysicalSize::new(snapshot.width(), snapshot.height());
        let context = GpuContext::new(target, size, config.gpu_power)
            .map_err(|err| EngineError::Gpu(format!("{err:#}")))?;
        let pipeline = MagnifierPipeline::new(
            &context.device,
            context.surface_format,
            config.post_process,
        )?;
        let capture =
            CaptureTexture::upload(&context.device, &context.queue, snapshot, context.color_space)?;
        let snapshot_bind_group = pipeline.snapshot_bind_group(&context.device, &capture);

        let uniforms = RectUniforms::from_followers(&Followers::new());
        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rect uniforms"),
            size: std::mem::size_of::<RectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rect uniform bind group"),
            layout: &pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            context,
            pipeline,
            _capture: capture,
            uniform_buffer,
            uniform_bind_group,
            snapshot_bind_group,
            uniforms,
            frame_count: 0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
        })
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    /// Draws the quad with the followers' current rects and presents it.
    ///
    /// Lost or outdated surfaces are reconfigured and a timeout skips the
    /// frame; every other surface or device error ends the session.
    pub(crate) fn render(&mut self, followers: &Followers) -> Result<FrameOutcome, EngineError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; skipping frame");
                return Ok(FrameOutcome::Skipped);
            }
            Err(err) => return Err(EngineError::Surface(err)),
        };

        let uniforms = RectUniforms::from_followers(followers);
        if uniforms != self.uniforms {
            self.uniforms = uniforms;
            self.context.queue.write_buffer(
                &self.uniform_buffer,
                0,
                bytemuck::bytes_of(&self.uniforms),
            );
        }

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("loupe encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("loupe pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.snapshot_bind_group, &[]);
            render_pass.draw(0..QUAD_VERTICES, 0..1);
        }
        self.context.queue.submit(Some(encoder.finish()));
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(EngineError::Gpu(err.to_string()));
        }
        frame.present();

        self.record_frame();
        Ok(FrameOutcome::Presented)
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn record_frame(&mut self) {
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            debug!(
                fps = (self.frames_since_last_update as f32 / elapsed.as_secs_f32()).round(),
                frame_count = self.frame_count,
                "render stats"
            );
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
        }
    }
}
