//! A GPU-less backend that records draw calls.

use super::{BlendMode, Color, Rect, RenderBackend};
use crate::error::BackendError;
use glam::Vec2;
use std::collections::BTreeSet;

/// Texture handle issued by [`HeadlessBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessTexture {
    id: u64,
    width: u32,
    height: u32,
}

impl HeadlessTexture {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Captured frame issued by [`HeadlessBackend::capture_screen`].
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessImage {
    id: u64,
    width: u32,
    height: u32,
}

impl HeadlessImage {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    BeginDrawing { clear: Color },
    EndDrawing,
    BeginTextureMode { target: u64, clear: Color },
    EndTextureMode,
    SetBlendMode(BlendMode),
    Texture {
        texture: u64,
        position: Vec2,
        tint: Color,
    },
    TextureRegion {
        texture: u64,
        source: Rect,
        dest: Rect,
        tint: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Screen,
    Texture,
}

/// Records everything drawn through it instead of rasterizing.
///
/// Frame time is fixed (see [`with_frame_time`](Self::with_frame_time)) and the clock
/// only moves on [`tick`](Self::tick), which makes animation timing fully deterministic.
/// Render textures follow the bottom-up convention (`OFFSCREEN_FLIPPED = true`).
#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    frame_time: f32,
    time: f32,
    next_id: u64,
    scopes: Vec<Scope>,
    commands: Vec<DrawCommand>,
    live: BTreeSet<u64>,
    released: Vec<u64>,
    frames_presented: usize,
    captures: usize,
    fail_next_frame: Option<BackendError>,
}

impl HeadlessBackend {
    /// Default frame time: 60 frames per second.
    pub const DEFAULT_FRAME_TIME: f32 = 1.0 / 60.0;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_time: Self::DEFAULT_FRAME_TIME,
            time: 0.0,
            next_id: 1,
            scopes: Vec::new(),
            commands: Vec::new(),
            live: BTreeSet::new(),
            released: Vec::new(),
            frames_presented: 0,
            captures: 0,
            fail_next_frame: None,
        }
    }

    pub fn with_frame_time(mut self, seconds: f32) -> Self {
        self.frame_time = seconds;
        self
    }

    pub fn set_frame_time(&mut self, seconds: f32) {
        self.frame_time = seconds;
    }

    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Move the clock forward by one frame.
    pub fn tick(&mut self) {
        self.time += self.frame_time;
    }

    /// Every call recorded since the last [`take_commands`](Self::take_commands).
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Handles (textures and images) that were issued and not yet released.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// Released handle ids, in release order.
    pub fn released(&self) -> &[u64] {
        &self.released
    }

    /// Number of completed `begin_drawing`/`end_drawing` pairs.
    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Make the next `end_drawing` fail with a surface error, as a lost swapchain would.
    pub fn fail_next_frame(&mut self) {
        self.fail_next_frame_with(BackendError::Surface("frame lost".into()));
    }

    /// Make the next `end_drawing` fail with `error`.
    pub fn fail_next_frame_with(&mut self, error: BackendError) {
        self.fail_next_frame = Some(error);
    }

    /// Issue a texture handle, e.g. for scene content.
    pub fn create_texture(&mut self, width: u32, height: u32) -> HeadlessTexture {
        HeadlessTexture {
            id: self.issue(),
            width,
            height,
        }
    }

    fn issue(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    fn retire(&mut self, id: u64) {
        if !self.live.remove(&id) {
            tracing::warn!(target: "headless", "release of unknown handle {}", id);
        }
        self.released.push(id);
    }

    fn end_scope(&mut self, expected: Scope, call: &'static str) -> Result<(), BackendError> {
        match self.scopes.last() {
            Some(scope) if *scope == expected => {
                self.scopes.pop();
                Ok(())
            }
            _ => Err(BackendError::OutsideDrawing(call)),
        }
    }
}

impl RenderBackend for HeadlessBackend {
    type Image = HeadlessImage;
    type Texture = HeadlessTexture;

    const OFFSCREEN_FLIPPED: bool = true;

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_time(&self) -> f32 {
        self.frame_time
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn capture_screen(&mut self) -> Result<Self::Image, BackendError> {
        if self.width == 0 || self.height == 0 {
            return Err(BackendError::Capture("frame has zero size".into()));
        }
        self.captures += 1;
        Ok(HeadlessImage {
            id: self.issue(),
            width: self.width,
            height: self.height,
        })
    }

    fn load_texture(&mut self, image: &Self::Image) -> Result<Self::Texture, BackendError> {
        Ok(self.create_texture(image.width, image.height))
    }

    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::TextureCreation(format!(
                "invalid render texture size {}x{}",
                width, height
            )));
        }
        Ok(self.create_texture(width, height))
    }

    fn texture_size(&self, texture: &Self::Texture) -> (u32, u32) {
        (texture.width, texture.height)
    }

    fn begin_drawing(&mut self, clear: Color) {
        self.scopes.push(Scope::Screen);
        self.commands.push(DrawCommand::BeginDrawing { clear });
    }

    fn end_drawing(&mut self) -> Result<(), BackendError> {
        self.end_scope(Scope::Screen, "end_drawing")?;
        if let Some(error) = self.fail_next_frame.take() {
            return Err(error);
        }
        self.commands.push(DrawCommand::EndDrawing);
        self.frames_presented += 1;
        Ok(())
    }

    fn begin_texture_mode(&mut self, target: &Self::Texture, clear: Color) {
        self.scopes.push(Scope::Texture);
        self.commands.push(DrawCommand::BeginTextureMode {
            target: target.id,
            clear,
        });
    }

    fn end_texture_mode(&mut self) -> Result<(), BackendError> {
        self.end_scope(Scope::Texture, "end_texture_mode")?;
        self.commands.push(DrawCommand::EndTextureMode);
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::SetBlendMode(mode));
    }

    fn draw_texture(&mut self, texture: &Self::Texture, position: Vec2, tint: Color) {
        self.commands.push(DrawCommand::Texture {
            texture: texture.id,
            position,
            tint,
        });
    }

    fn draw_texture_region(
        &mut self,
        texture: &Self::Texture,
        source: Rect,
        dest: Rect,
        tint: Color,
    ) {
        self.commands.push(DrawCommand::TextureRegion {
            texture: texture.id,
            source,
            dest,
            tint,
        });
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn release_texture(&mut self, texture: Self::Texture) {
        self.retire(texture.id);
    }

    fn release_image(&mut self, image: Self::Image) {
        self.retire(image.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_tracked_until_released() {
        let mut backend = HeadlessBackend::new(64, 32);
        let image = backend.capture_screen().unwrap();
        let texture = backend.load_texture(&image).unwrap();
        assert_eq!(backend.live_handles(), 2);
        assert_eq!(backend.texture_size(&texture), (64, 32));

        let texture_id = texture.id();
        backend.release_image(image);
        backend.release_texture(texture);
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.released().last(), Some(&texture_id));
    }

    #[test]
    fn unbalanced_end_is_an_error() {
        let mut backend = HeadlessBackend::new(8, 8);
        assert_eq!(
            backend.end_drawing(),
            Err(BackendError::OutsideDrawing("end_drawing"))
        );

        let target = backend.create_render_texture(8, 8).unwrap();
        backend.begin_texture_mode(&target, Color::TRANSPARENT);
        assert!(backend.end_drawing().is_err());
        assert!(backend.end_texture_mode().is_ok());
        assert_eq!(backend.frames_presented(), 0);
    }

    #[test]
    fn zero_sized_render_texture_is_rejected() {
        let mut backend = HeadlessBackend::new(8, 8);
        assert!(matches!(
            backend.create_render_texture(0, 8),
            Err(BackendError::TextureCreation(_))
        ));
    }

    #[test]
    fn clock_moves_only_on_tick() {
        let mut backend = HeadlessBackend::new(8, 8).with_frame_time(0.5);
        assert_eq!(backend.time(), 0.0);
        backend.tick();
        backend.tick();
        assert_eq!(backend.time(), 1.0);
        assert_eq!(backend.frame_time(), 0.5);
    }
}
