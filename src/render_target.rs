//! The persistent off-screen frame every live frame is drawn into.

use crate::error::BackendError;
use crate::gpu::GpuContext;
use crate::texture::Texture;

/// An off-screen copy of what is on screen.
///
/// Frames are composed here and then blitted to the surface, so the last presented frame
/// can always be copied back out for a screen capture. Surface textures cannot be read
/// after presentation.
pub struct RenderTarget {
    target: Texture,
}

impl RenderTarget {
    const LABEL: &'static str = "Frame Target";

    /// Creates a new render target matching the current GPU surface dimensions.
    pub fn new(gpu: &GpuContext) -> Result<Self, BackendError> {
        Ok(Self {
            target: Texture::render_target(gpu, gpu.width(), gpu.height(), Self::LABEL)?,
        })
    }

    /// Checks if the target dimensions match the GPU surface and recreates if needed.
    ///
    /// The previous contents are dropped along with the old texture.
    pub fn ensure_size(&mut self, gpu: &GpuContext) -> Result<(), BackendError> {
        if self.target.width != gpu.width() || self.target.height != gpu.height() {
            tracing::debug!(
                target: "gpu",
                "resizing frame target to {}x{}",
                gpu.width(),
                gpu.height()
            );
            self.target = Texture::render_target(gpu, gpu.width(), gpu.height(), Self::LABEL)?;
        }
        Ok(())
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.target.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.target.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }
}
