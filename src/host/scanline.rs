// =============================================================================
// SCANLINE.RS — optional CRT scanline post-process
//
// The present pass renders into an intermediate texture; this pass copies it
// to the swapchain, darkening half of every screen-pixel row.
// =============================================================================

use wgpu::util::DeviceExt;

use super::utils::Viewport;

pub const SCANLINE_STRENGTH: f32 = 0.18;

pub struct ScanlinePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub scene_bgl: wgpu::BindGroupLayout,
    pub uniforms_bgl: wgpu::BindGroupLayout,
}

pub struct ScanlinePass {
    pub pipeline: ScanlinePipeline,
    pub intermediate_texture: wgpu::Texture,
    /// sRGB view, rendered into by the present pass.
    pub render_view: wgpu::TextureView,
    /// Linear view sampled by the shader, so gamma is applied once.
    pub sample_view: wgpu::TextureView,
    pub scene_bind_group: wgpu::BindGroup,
    /// `[viewport_y, viewport_h, rows, strength]`
    pub uniforms_buffer: wgpu::Buffer,
    pub uniforms_bind_group: wgpu::BindGroup,
}

fn make_pipeline(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> ScanlinePipeline {
    let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/scanline_shader.wgsl"));

    let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scanline_scene_bgl"),
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

    let uniforms_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scanline_uniforms_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scanline_pipeline_layout"),
        bind_group_layouts: &[&scene_bgl, &uniforms_bgl],
        ..Default::default()
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scanline_pipeline"),
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
                format: output_format,
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

    ScanlinePipeline { pipeline, scene_bgl, uniforms_bgl }
}

/// Intermediate target plus the bind group that samples it.
fn make_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    scene_bgl: &wgpu::BindGroupLayout,
) -> (wgpu::Texture, wgpu::TextureView, wgpu::TextureView, wgpu::BindGroup) {
    let non_srgb_fmt = config.format.remove_srgb_suffix();

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scanline_intermediate"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[non_srgb_fmt],
    });

    let render_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
        format: Some(non_srgb_fmt),
        ..Default::default()
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("scanline_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scanline_scene_bg"),
        layout: scene_bgl,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&sample_view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&sampler) },
        ],
    });

    (texture, render_view, sample_view, bind_group)
}

fn uniforms(viewport: &Viewport, rows: u32) -> [f32; 4] {
    [viewport.y, viewport.height, rows as f32, SCANLINE_STRENGTH]
}

pub fn create_scanline_pass(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    viewport: &Viewport,
    rows: u32,
) -> ScanlinePass {
    let pipeline = make_pipeline(device, config.format);
    let (intermediate_texture, render_view, sample_view, scene_bind_group) =
        make_target(device, config, &pipeline.scene_bgl);

    let uniforms_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("scanline_uniforms"),
        contents: bytemuck::cast_slice(&uniforms(viewport, rows)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let uniforms_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scanline_uniforms_bg"),
        layout: &pipeline.uniforms_bgl,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniforms_buffer.as_entire_binding() }],
    });

    ScanlinePass {
        pipeline,
        intermediate_texture,
        render_view,
        sample_view,
        scene_bind_group,
        uniforms_buffer,
        uniforms_bind_group,
    }
}

/// Recreate size-dependent resources after a resize or screen mode change.
pub fn resize_scanline_pass(
    pass: &mut ScanlinePass,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &wgpu::SurfaceConfiguration,
    viewport: &Viewport,
    rows: u32,
) {
    let (texture, render_view, sample_view, bind_group) = make_target(device, config, &pass.pipeline.scene_bgl);
    pass.intermediate_texture = texture;
    pass.render_view = render_view;
    pass.sample_view = sample_view;
    pass.scene_bind_group = bind_group;
    queue.write_buffer(&pass.uniforms_buffer, 0, bytemuck::cast_slice(&uniforms(viewport, rows)));
}
