use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::{CompositeAlphaMode, InstanceDescriptor, SurfaceConfiguration};
use winit::window::Window;

use crate::pipeline::BlitPipeline;

/// Owns the surface, device and the single frame texture; uploads an RGB
/// frame of fixed dimensions and draws it scaled to the window.
pub struct FramePresenter {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: SurfaceConfiguration,
    pipeline: BlitPipeline,
    frame_texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    quad: wgpu::Buffer,
    staging: Vec<u8>,
    frame_size: (u32, u32),
}

impl FramePresenter {
    pub async fn new(window: Arc<Window>, frame_size: (u32, u32)) -> Result<Self> {
        let backend = wgpu::util::backend_bits_from_env().unwrap_or_else(wgpu::Backends::all);
        let instance = wgpu::Instance::new(InstanceDescriptor {
            backends: backend,
            dx12_shader_compiler: wgpu::Dx12Compiler::Fxc,
            flags: wgpu::InstanceFlags::default(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let size = window.inner_size();
        let surface = instance
            .create_surface(window.clone())
            .context("surface unsupported by adapter")?;

        let adapter = wgpu::util::initialize_adapter_from_env_or_default(&instance, Some(&surface))
            .await
            .context("no suitable GPU adapters found on the system")?;
        log::debug!("selected adapter: {:?}", adapter.get_info());

        let needed_limits =
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: needed_limits,
                },
                None,
            )
            .await
            .context("unable to open a device on the adapter")?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface.get_capabilities(&adapter).formats[0],
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let (w, h) = frame_size;
        let frame_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("wasidoom_render.frame_texture"),
            size: wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = frame_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Nearest filtering: the frame is chunky indexed-color art and
        // integer upscaling should keep the pixel edges.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("wasidoom_render.frame_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline = BlitPipeline::new(&device, config.format);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("wasidoom_render.frame_bind_group"),
            layout: &pipeline.texture_layout,
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
        let quad = BlitPipeline::fullscreen_quad(&device);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            frame_texture,
            bind_group,
            quad,
            staging: vec![0u8; (w * h * 4) as usize],
            frame_size,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload `rgb` (tightly packed, frame_size pixels) and draw it.
    pub fn present(&mut self, rgb: &[u8]) -> Result<()> {
        let (w, h) = self.frame_size;
        anyhow::ensure!(
            rgb.len() == (w * h * 3) as usize,
            "frame has {} bytes, expected {}",
            rgb.len(),
            w * h * 3
        );

        for (src, dst) in rgb.chunks_exact(3).zip(self.staging.chunks_exact_mut(4)) {
            dst[..3].copy_from_slice(src);
            dst[3] = 0xff;
        }
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.frame_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.staging,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(w * 4),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .context("surface lost and could not be reacquired")?
            }
            Err(err) => return Err(err).context("failed to acquire the next surface frame"),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("wasidoom_render.blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.pipeline.draw(&mut pass, &self.bind_group, &self.quad);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
