//! Batched textured-quad drawing for the wgpu binding.
//!
//! Every draw call the backend receives (textures, texture regions, circles) becomes a
//! run of triangles sampling one texture; circles sample a 1x1 white texture. A
//! [`DrawList`] collects those runs for one drawing scope and [`Compositor::flush`]
//! turns it into a single render pass on the scope's target.

use crate::backend::{BlendMode, Color, Rect};
use crate::gpu::GpuContext;
use crate::texture::Texture;
use glam::Vec2;
use std::ops::Range;

/// Vertex for 2D quad rendering. Positions are already in clip space.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

const CIRCLE_SEGMENTS: usize = 64;

struct Batch {
    bind_group: wgpu::BindGroup,
    blend: BlendMode,
    vertices: Range<u32>,
}

/// Draw calls recorded for one drawing scope, in submission order.
pub struct DrawList {
    width: f32,
    height: f32,
    vertices: Vec<Vertex2d>,
    batches: Vec<Batch>,
}

impl DrawList {
    /// Start an empty list for a `width` x `height` target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            vertices: Vec::with_capacity(256),
            batches: Vec::new(),
        }
    }

    /// Draw `source` (in texels of a `texture_size` texture) stretched over `dest`.
    ///
    /// A negative source width or height mirrors the sampled region along that axis.
    pub fn quad(
        &mut self,
        bind_group: wgpu::BindGroup,
        blend: BlendMode,
        texture_size: (u32, u32),
        source: Rect,
        dest: Rect,
        tint: Color,
    ) {
        let (tw, th) = (texture_size.0.max(1) as f32, texture_size.1.max(1) as f32);
        let (u0, u1) = span(source.x, source.width, tw);
        let (v0, v1) = span(source.y, source.height, th);

        let c = tint.to_array();
        let tl = self.clip(dest.x, dest.y);
        let tr = self.clip(dest.x + dest.width, dest.y);
        let bl = self.clip(dest.x, dest.y + dest.height);
        let br = self.clip(dest.x + dest.width, dest.y + dest.height);

        self.push(
            bind_group,
            blend,
            &[
                vertex(tl, [u0, v0], c),
                vertex(tr, [u1, v0], c),
                vertex(bl, [u0, v1], c),
                vertex(tr, [u1, v0], c),
                vertex(br, [u1, v1], c),
                vertex(bl, [u0, v1], c),
            ],
        );
    }

    /// Draw a filled circle as a triangle fan sampling the centre of `bind_group`'s texture.
    pub fn circle(
        &mut self,
        bind_group: wgpu::BindGroup,
        blend: BlendMode,
        center: Vec2,
        radius: f32,
        color: Color,
    ) {
        let c = color.to_array();
        let uv = [0.5, 0.5];
        let middle = self.clip(center.x, center.y);
        let rim = |i: usize| {
            let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        };

        let mut triangles = Vec::with_capacity(CIRCLE_SEGMENTS * 3);
        for i in 0..CIRCLE_SEGMENTS {
            let a = rim(i);
            let b = rim(i + 1);
            triangles.push(vertex(middle, uv, c));
            triangles.push(vertex(self.clip(a.x, a.y), uv, c));
            triangles.push(vertex(self.clip(b.x, b.y), uv, c));
        }
        self.push(bind_group, blend, &triangles);
    }

    fn push(&mut self, bind_group: wgpu::BindGroup, blend: BlendMode, vertices: &[Vertex2d]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.batches.push(Batch {
            bind_group,
            blend,
            vertices: start..self.vertices.len() as u32,
        });
    }

    /// Pixel coordinates (origin top-left, y down) to clip space.
    fn clip(&self, x: f32, y: f32) -> [f32; 2] {
        [x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0]
    }
}

fn vertex(position: [f32; 2], uv: [f32; 2], color: [f32; 4]) -> Vertex2d {
    Vertex2d {
        position,
        uv,
        color,
    }
}

/// Normalised texture coordinates covering `start..start + len` texels.
fn span(start: f32, len: f32, size: f32) -> (f32, f32) {
    if len < 0.0 {
        ((start - len) / size, start / size)
    } else {
        (start / size, (start + len) / size)
    }
}

/// GPU resources for composing frames from textured quads.
pub struct Compositor {
    alpha_pipeline: wgpu::RenderPipeline,
    alpha_min_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    _white_texture: Texture,
}

impl Compositor {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let quad_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Compositor Shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_SHADER.into()),
        });
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Compositor Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Texture + sampler, shared by the quad and blit pipelines
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Compositor Texture Layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compositor Pipeline Layout"),
            bind_group_layouts: &[&texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Standard "over" blending
        let alpha_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        // Keeps destination color, alpha becomes min(src, dst)
        let alpha_min_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Min,
            },
        };

        let alpha_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &quad_shader,
            "Compositor Alpha Pipeline",
            &[Vertex2d::LAYOUT],
            alpha_blend,
        );
        let alpha_min_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &quad_shader,
            "Compositor Alpha Min Pipeline",
            &[Vertex2d::LAYOUT],
            alpha_min_blend,
        );
        let blit_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &blit_shader,
            "Blit Pipeline",
            &[],
            wgpu::BlendState::REPLACE,
        );

        let white_texture = Texture::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "White Texture");
        let white = bind_texture(device, &texture_bind_group_layout, &sampler, &white_texture.view);

        Self {
            alpha_pipeline,
            alpha_min_pipeline,
            blit_pipeline,
            texture_bind_group_layout,
            sampler,
            white,
            _white_texture: white_texture,
        }
    }

    /// Bind group sampling `view`.
    pub fn bind(&self, gpu: &GpuContext, view: &wgpu::TextureView) -> wgpu::BindGroup {
        bind_texture(
            &gpu.device,
            &self.texture_bind_group_layout,
            &self.sampler,
            view,
        )
    }

    /// Bind group sampling the 1x1 white texture used for solid shapes.
    pub fn white(&self) -> wgpu::BindGroup {
        self.white.clone()
    }

    /// Clear `target` to `clear` and draw `list` into it.
    pub fn flush(&self, gpu: &GpuContext, target: &wgpu::TextureView, clear: Color, list: &DrawList) {
        use wgpu::util::DeviceExt;

        let vertex_buffer = (!list.vertices.is_empty()).then(|| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Compositor Vertex Buffer"),
                    contents: bytemuck::cast_slice(&list.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Compositor Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Compositor Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu_color(clear)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(buffer) = &vertex_buffer {
                pass.set_vertex_buffer(0, buffer.slice(..));
                for batch in &list.batches {
                    let pipeline = match batch.blend {
                        BlendMode::Alpha => &self.alpha_pipeline,
                        BlendMode::AlphaMin => &self.alpha_min_pipeline,
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &batch.bind_group, &[]);
                    pass.draw(batch.vertices.clone(), 0..1);
                }
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy `source` over the whole of `target` with a fullscreen triangle.
    pub fn blit(&self, gpu: &GpuContext, source: &wgpu::TextureView, target: &wgpu::TextureView) {
        let bind_group = self.bind(gpu, source);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn bind_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Compositor Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

fn wgpu_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: color.a as f64,
    }
}

/// Textured quads tinted by their vertex color.
const QUAD_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2f,
    @location(1) uv: vec2f,
    @location(2) color: vec4f,
}

struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
    @location(1) color: vec4f,
}

@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var tex_sampler: sampler;

@vertex
fn vs(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4f(in.position, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs(in: VertexOutput) -> @location(0) vec4f {
    return textureSample(tex, tex_sampler, in.uv) * in.color;
}
"#;

/// Copies a texture onto the whole target.
const BLIT_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var tex_sampler: sampler;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VertexOutput {
    // Fullscreen triangle, uv (0,0) at the top-left corner
    let uv = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    var out: VertexOutput;
    out.position = vec4f(uv * vec2f(2.0, -2.0) + vec2f(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs(in: VertexOutput) -> @location(0) vec4f {
    return textureSample(tex, tex_sampler, in.uv);
}
"#;
