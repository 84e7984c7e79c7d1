//! [`RenderBackend`] binding on top of wgpu and a winit window.

use crate::backend::{BlendMode, Color, Rect, RenderBackend};
use crate::compositor::{Compositor, DrawList};
use crate::error::BackendError;
use crate::gpu::GpuContext;
use crate::render_target::RenderTarget;
use crate::texture::Texture;
use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;
use winit::window::Window;

/// A captured frame. Kept on the GPU; capturing never reads pixels back.
#[derive(Debug)]
pub struct Snapshot {
    texture: Texture,
}

impl Snapshot {
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width, self.texture.height)
    }
}

enum PassTarget {
    Screen,
    Offscreen(wgpu::TextureView),
}

struct Pass {
    target: PassTarget,
    clear: Color,
    list: DrawList,
}

/// Draws through wgpu into a persistent frame target that is blitted to the window
/// surface on [`end_drawing`](RenderBackend::end_drawing).
///
/// The clock is advanced by [`begin_frame`](Self::begin_frame), which the runner calls
/// once per redraw.
pub struct WgpuBackend {
    window: Arc<Window>,
    gpu: GpuContext,
    compositor: Compositor,
    frame: RenderTarget,
    passes: Vec<Pass>,
    blend: BlendMode,
    start_time: Instant,
    last_frame: Instant,
    frame_time: f32,
    time: f32,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Result<Self, BackendError> {
        let gpu = GpuContext::new(window.clone())?;
        let compositor = Compositor::new(&gpu);
        let frame = RenderTarget::new(&gpu)?;
        let now = Instant::now();

        Ok(Self {
            window,
            gpu,
            compositor,
            frame,
            passes: Vec::new(),
            blend: BlendMode::Alpha,
            start_time: now,
            last_frame: now,
            frame_time: 1.0 / 60.0,
            time: 0.0,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// GPU context for advanced rendering.
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Sample the clock for a new frame.
    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        self.frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.time = self.start_time.elapsed().as_secs_f32();
        self.last_frame = now;
    }

    /// Resize the surface and the frame target. Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        self.gpu.resize(width, height);
        self.frame.ensure_size(&self.gpu)
    }

    /// Upload scene content.
    pub fn texture_from_rgba(&self, image: &image::RgbaImage, label: &str) -> Texture {
        Texture::from_image(&self.gpu, image, label)
    }

    /// Load scene content from an image file.
    pub fn texture_from_file(&self, path: &str) -> Result<Texture, image::ImageError> {
        Texture::from_file(&self.gpu, path)
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.gpu.reconfigure();
                return Err(BackendError::Surface(e.to_string()));
            }
            Err(e) => return Err(BackendError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.compositor.blit(&self.gpu, self.frame.view(), &view);
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    fn record(&mut self, call: &'static str) -> Option<&mut DrawList> {
        match self.passes.last_mut() {
            Some(pass) => Some(&mut pass.list),
            None => {
                tracing::warn!(target: "gpu", "{} outside of a drawing scope", call);
                None
            }
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Image = Snapshot;
    type Texture = Texture;

    const OFFSCREEN_FLIPPED: bool = false;

    fn frame_size(&self) -> (u32, u32) {
        self.frame.size()
    }

    fn frame_time(&self) -> f32 {
        self.frame_time
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn capture_screen(&mut self) -> Result<Self::Image, BackendError> {
        Texture::duplicate(&self.gpu, self.frame.texture(), "Screen Capture")
            .map(|texture| Snapshot { texture })
            .map_err(|e| BackendError::Capture(e.to_string()))
    }

    fn load_texture(&mut self, image: &Self::Image) -> Result<Self::Texture, BackendError> {
        Texture::duplicate(&self.gpu, &image.texture.texture, "Snapshot Texture")
    }

    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, BackendError> {
        Texture::render_target(&self.gpu, width, height, "Render Texture")
    }

    fn texture_size(&self, texture: &Self::Texture) -> (u32, u32) {
        (texture.width, texture.height)
    }

    fn begin_drawing(&mut self, clear: Color) {
        let (width, height) = self.frame.size();
        self.passes.push(Pass {
            target: PassTarget::Screen,
            clear,
            list: DrawList::new(width, height),
        });
    }

    fn end_drawing(&mut self) -> Result<(), BackendError> {
        let pass = match self.passes.pop() {
            Some(pass @ Pass { target: PassTarget::Screen, .. }) => pass,
            Some(other) => {
                self.passes.push(other);
                return Err(BackendError::OutsideDrawing("end_drawing"));
            }
            None => return Err(BackendError::OutsideDrawing("end_drawing")),
        };

        self.compositor
            .flush(&self.gpu, self.frame.view(), pass.clear, &pass.list);
        self.present()
    }

    fn begin_texture_mode(&mut self, target: &Self::Texture, clear: Color) {
        self.passes.push(Pass {
            target: PassTarget::Offscreen(target.view.clone()),
            clear,
            list: DrawList::new(target.width, target.height),
        });
    }

    fn end_texture_mode(&mut self) -> Result<(), BackendError> {
        match self.passes.pop() {
            Some(Pass {
                target: PassTarget::Offscreen(view),
                clear,
                list,
            }) => {
                self.compositor.flush(&self.gpu, &view, clear, &list);
                Ok(())
            }
            Some(other) => {
                self.passes.push(other);
                Err(BackendError::OutsideDrawing("end_texture_mode"))
            }
            None => Err(BackendError::OutsideDrawing("end_texture_mode")),
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn draw_texture(&mut self, texture: &Self::Texture, position: Vec2, tint: Color) {
        let (w, h) = (texture.width as f32, texture.height as f32);
        self.draw_texture_region(
            texture,
            Rect::new(0.0, 0.0, w, h),
            Rect::new(position.x, position.y, w, h),
            tint,
        );
    }

    fn draw_texture_region(
        &mut self,
        texture: &Self::Texture,
        source: Rect,
        dest: Rect,
        tint: Color,
    ) {
        let bind_group = self.compositor.bind(&self.gpu, &texture.view);
        let blend = self.blend;
        let size = (texture.width, texture.height);
        if let Some(list) = self.record("draw_texture_region") {
            list.quad(bind_group, blend, size, source, dest, tint);
        }
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let bind_group = self.compositor.white();
        let blend = self.blend;
        if let Some(list) = self.record("draw_circle") {
            list.circle(bind_group, blend, center, radius, color);
        }
    }

    fn release_texture(&mut self, texture: Self::Texture) {
        drop(texture);
    }

    fn release_image(&mut self, image: Self::Image) {
        drop(image);
    }
}
