//! The rendering capability the scene lifecycle and transition engine draw through.
//!
//! Neither the [`SceneManager`](crate::scene::SceneManager) nor the
//! [`TransitionEngine`](crate::scene::TransitionEngine) talks to a GPU directly. Everything
//! they need from the outside world (frame timing, screen capture, off-screen targets,
//! textured quads and the blend state used to punch holes) is expressed by
//! [`RenderBackend`].
//!
//! Two bindings ship with the crate:
//!
//! - [`WgpuBackend`](crate::WgpuBackend) renders with wgpu into a winit window.
//! - [`HeadlessBackend`] hands out numbered handles and records every draw call, which is
//!   enough to drive scene logic without a GPU.

mod headless;

pub use headless::{DrawCommand, HeadlessBackend, HeadlessImage, HeadlessTexture};

use crate::error::BackendError;
use glam::Vec2;

/// Axis-aligned rectangle in pixels.
///
/// A negative `width` or `height` in a *source* rectangle mirrors the sampled region
/// along that axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from 8-bit channels.
    pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Same color with the alpha channel replaced (clamped to `0.0..=1.0`).
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

/// Blend function applied to subsequent draw calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Regular "source over" alpha blending.
    #[default]
    Alpha,
    /// Keeps the destination color and writes `min(src.a, dst.a)` as alpha.
    ///
    /// Drawing a fully transparent shape in this mode cuts a transparent hole into
    /// whatever the current target already holds.
    AlphaMin,
}

/// Capabilities the scene lifecycle and the transition engine need from a renderer.
///
/// All drawing happens between a `begin_*`/`end_*` pair: [`begin_drawing`] targets the
/// displayed frame, [`begin_texture_mode`] targets a texture created by
/// [`create_render_texture`]. Scopes may nest; draws go to the innermost one.
///
/// Handles are released by value so a texture can never be released twice.
///
/// [`begin_drawing`]: RenderBackend::begin_drawing
/// [`begin_texture_mode`]: RenderBackend::begin_texture_mode
/// [`create_render_texture`]: RenderBackend::create_render_texture
pub trait RenderBackend {
    /// Owned copy of captured frame pixels.
    type Image;
    /// Drawable texture handle.
    type Texture;

    /// Whether textures filled through `begin_texture_mode` come out upside down when
    /// drawn, as they do with bottom-up render targets. The engine compensates by
    /// drawing them with a mirrored source rectangle.
    const OFFSCREEN_FLIPPED: bool = false;

    /// Current frame size in pixels.
    fn frame_size(&self) -> (u32, u32);

    /// Seconds elapsed between the previous frame and the current one.
    fn frame_time(&self) -> f32;

    /// Seconds since the backend started.
    fn time(&self) -> f32;

    /// Copy what is currently displayed into an owned image.
    fn capture_screen(&mut self) -> Result<Self::Image, BackendError>;

    /// Upload an image into a drawable texture.
    fn load_texture(&mut self, image: &Self::Image) -> Result<Self::Texture, BackendError>;

    /// Allocate an off-screen color target of the given size.
    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, BackendError>;

    fn texture_size(&self, texture: &Self::Texture) -> (u32, u32);

    /// Start drawing the displayed frame, cleared to `clear`.
    fn begin_drawing(&mut self, clear: Color);

    /// Finish the displayed frame and present it.
    fn end_drawing(&mut self) -> Result<(), BackendError>;

    /// Start drawing into `target`, cleared to `clear`.
    fn begin_texture_mode(&mut self, target: &Self::Texture, clear: Color);

    fn end_texture_mode(&mut self) -> Result<(), BackendError>;

    /// Switch the blend function used by subsequent draws.
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Draw a whole texture with its top-left corner at `position`.
    fn draw_texture(&mut self, texture: &Self::Texture, position: Vec2, tint: Color);

    /// Draw the `source` region of a texture stretched into `dest`.
    fn draw_texture_region(
        &mut self,
        texture: &Self::Texture,
        source: Rect,
        dest: Rect,
        tint: Color,
    );

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn release_texture(&mut self, texture: Self::Texture);

    fn release_image(&mut self, image: Self::Image);
}
