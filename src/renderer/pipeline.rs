//! WebGPU render pipeline setup
//!
//! Every circle is one quad; coverage is computed in the fragment shader.
//! Draw calls accumulate into a CPU vertex list during the frame and are
//! uploaded in one `write_buffer` on [`GpuCanvas::present`].

use glam::Vec2;

use super::bridge::{Canvas, Rgba};
use super::shapes::{QUAD_VERTICES, circle_quad, ring_quad};
use super::vertex::Vertex;
use crate::Playfield;

/// Circles the vertex buffer is sized for before its first growth
const INITIAL_CIRCLES: usize = 4096;

/// Main render state
pub struct GpuCanvas {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    /// Vertices the buffer can hold
    vertex_capacity: usize,
    vertices: Vec<Vertex>,
    clear_color: wgpu::Color,
    /// Surface size in physical pixels
    pub size: (u32, u32),
    /// Playfield in CSS pixels, the coordinate space draw calls use
    viewport: Playfield,
    /// Target format applies sRGB encoding, colors are uploaded linear
    srgb: bool,
}

impl GpuCanvas {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        viewport: Playfield,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("bullet-hell-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("circle_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("circle_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let vertex_capacity = INITIAL_CIRCLES * QUAD_VERTICES;
        let vertex_buffer = create_vertex_buffer(&device, vertex_capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            vertex_capacity,
            vertices: Vec::with_capacity(vertex_capacity),
            clear_color: wgpu::Color::BLACK,
            size: (width, height),
            viewport,
            srgb: surface_format.is_srgb(),
        })
    }

    /// Reconfigure for a new physical size and CSS playfield
    pub fn resize(&mut self, new_width: u32, new_height: u32, viewport: Playfield) {
        self.viewport = viewport;
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reapply the current configuration after `SurfaceError::Lost`
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Playfield pixels (origin top-left, y down) to NDC
    pub fn pixel_to_ndc(&self, pos: [f32; 2]) -> [f32; 2] {
        let w = self.viewport.width.max(1.0);
        let h = self.viewport.height.max(1.0);
        [pos[0] / w * 2.0 - 1.0, 1.0 - pos[1] / h * 2.0]
    }

    fn color(&self, color: Rgba) -> [f32; 4] {
        if self.srgb {
            color.to_linear()
        } else {
            color.to_array()
        }
    }

    fn push_quad(&mut self, quad: [Vertex; QUAD_VERTICES]) {
        for mut v in quad {
            v.position = self.pixel_to_ndc(v.position);
            self.vertices.push(v);
        }
    }

    fn ensure_capacity(&mut self, needed: usize) {
        if needed <= self.vertex_capacity {
            return;
        }
        self.vertex_capacity = needed.next_power_of_two();
        self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
        log::debug!("Vertex buffer grown to {} vertices", self.vertex_capacity);
    }

    /// Upload this frame's vertices and render
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ensure_capacity(self.vertices.len());
        if !self.vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
        let vertex_count = self.vertices.len() as u32;
        self.vertices.clear();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if vertex_count > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Canvas for GpuCanvas {
    fn clear(&mut self, color: Rgba) {
        self.vertices.clear();
        let [r, g, b, a] = self.color(color);
        self.clear_color = wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        };
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let color = self.color(color);
        self.push_quad(circle_quad(center, radius, 0.0, color));
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        let color = self.color(color);
        self.push_quad(ring_quad(center, radius, width, color));
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertices: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vertex_buffer"),
        size: (vertices * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
