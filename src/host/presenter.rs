// =============================================================================
// PRESENTER.RS — shows the screen surface in the window
//
// Each frame the screen is converted to RGBA8 on the CPU, uploaded into a
// streaming texture and drawn as a letterboxed quad with nearest sampling.
// =============================================================================

use std::sync::Arc;

use log::{debug, info};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::HostError;
use super::config::{WindowConfig, WindowMode};
use super::scanline::{ScanlinePass, create_scanline_pass, resize_scanline_pass};
use super::utils::{Viewport, letterbox_viewport};
use crate::graphics::Surface;
use crate::types::Size;

struct ScreenTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: Size,
}

pub struct Presenter {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    screen_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    screen: ScreenTexture,
    viewport: Viewport,
    scanline_pass: Option<ScanlinePass>,
}

fn create_present_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/present.wgsl"));

    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("present_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
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
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("present_pipeline_layout"),
        bind_group_layouts: &[&bgl],
        ..Default::default()
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("present_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    (pipeline, bgl)
}

fn create_screen_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: Size,
) -> ScreenTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("screen"),
        size: wgpu::Extent3d {
            width: size.w.max(1) as u32,
            height: size.h.max(1) as u32,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("screen_bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    });
    ScreenTexture { texture, bind_group, size }
}

impl Presenter {
    pub async fn new(window: Arc<Window>, screen_size: Size, scanlines: bool) -> Result<Self, HostError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await?;
        info!("[host] adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor::default()).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps.formats.first().copied().ok_or(HostError::NoSurfaceFormat)?;
        let alpha_mode = caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let (pipeline, screen_bgl) = create_present_pipeline(&device, format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("screen_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let screen = create_screen_texture(&device, &screen_bgl, &sampler, screen_size);

        let mut presenter = Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            screen_bgl,
            sampler,
            screen,
            viewport: Viewport::ZERO,
            scanline_pass: None,
        };
        presenter.update_viewport();
        presenter.set_scanlines(scanlines);
        Ok(presenter)
    }

    fn window_config(&self) -> WindowConfig {
        WindowConfig {
            physical_width: self.config.width,
            physical_height: self.config.height,
            logical_width: self.screen.size.w as u32,
            logical_height: self.screen.size.h as u32,
            mode: WindowMode::Windowed,
        }
    }

    fn update_viewport(&mut self) {
        self.viewport = letterbox_viewport(&self.window_config(), true);
        let rows = self.screen.size.h as u32;
        if let Some(sp) = self.scanline_pass.as_mut() {
            resize_scanline_pass(sp, &self.device, &self.queue, &self.config, &self.viewport, rows);
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn screen_window_config(&self) -> WindowConfig {
        self.window_config()
    }

    pub fn set_scanlines(&mut self, enabled: bool) {
        self.scanline_pass = enabled.then(|| {
            create_scanline_pass(&self.device, &self.config, &self.viewport, self.screen.size.h as u32)
        });
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.update_viewport();
    }

    /// Upload `screen` and draw it. A changed screen size (mode switch)
    /// recreates the texture.
    pub fn present(&mut self, screen: &Surface) -> Result<(), wgpu::SurfaceError> {
        if screen.bounds != self.screen.size {
            debug!("[host] screen texture {}x{}", screen.bounds.w, screen.bounds.h);
            self.screen = create_screen_texture(&self.device, &self.screen_bgl, &self.sampler, screen.bounds);
            self.update_viewport();
        }

        let w = screen.bounds.w.max(1) as u32;
        let h = screen.bounds.h.max(1) as u32;
        let rgba = screen.to_rgba8();
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.screen.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("present") });

        let target_view: &wgpu::TextureView = match &self.scanline_pass {
            Some(sp) => &sp.render_view,
            None => &view,
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("present_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let vp = self.viewport;
            if vp.width >= 1.0 && vp.height >= 1.0 {
                pass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.screen.bind_group, &[]);
                pass.draw(0..6, 0..1);
            }
        }

        if let Some(ref sp) = self.scanline_pass {
            let mut blit = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scanline_blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            blit.set_pipeline(&sp.pipeline.pipeline);
            blit.set_bind_group(0, &sp.scene_bind_group, &[]);
            blit.set_bind_group(1, &sp.uniforms_bind_group, &[]);
            blit.draw(0..6, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
