use crate::error::BackendError;
use crate::gpu::GpuContext;

/// A GPU texture that can be drawn by the compositor.
///
/// Scene content textures are uploaded from RGBA pixels; render textures share the
/// surface format so they can be both drawn into and sampled.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        Self::wrap(texture, width, height)
    }

    /// Upload a decoded image.
    pub fn from_image(gpu: &GpuContext, image: &image::RgbaImage, label: &str) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba(gpu, image, width, height, label)
    }

    /// Load a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        Ok(Self::from_image(gpu, &img, path))
    }

    /// Create a texture that can be rendered into, sampled and copied in both directions.
    pub fn render_target(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<Self, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::TextureCreation(format!(
                "invalid render texture size {}x{}",
                width, height
            )));
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        Ok(Self::wrap(texture, width, height))
    }

    /// Copy `source` into a new render texture of the same size.
    pub fn duplicate(gpu: &GpuContext, source: &wgpu::Texture, label: &str) -> Result<Self, BackendError> {
        let (width, height) = (source.width(), source.height());
        let copy = Self::render_target(gpu, width, height, label)?;

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texture Copy Encoder"),
            });
        encoder.copy_texture_to_texture(
            source.as_image_copy(),
            copy.texture.as_image_copy(),
            extent(width, height),
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        Ok(copy)
    }

    fn wrap(texture: wgpu::Texture, width: u32, height: u32) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

pub(crate) fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}
