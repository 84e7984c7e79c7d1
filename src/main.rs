//! Three procedural slides cycling through the transition styles.
//!
//! Space or the right arrow advances, Escape quits. `RUST_LOG=debug` shows the
//! scene lifecycle.

use curtain::backend::{Color, Rect, RenderBackend};
use curtain::scene::{Easing, Scene, TransitionStyle};
use curtain::{AppConfig, SceneError, Texture, WgpuBackend};
use glam::Vec2;
use image::{Rgba, RgbaImage};

/// A full-screen pattern with a pulsing dot in the middle.
struct PatternScene {
    background: Texture,
    dot: Color,
    phase: f32,
}

impl PatternScene {
    fn new(background: Texture, dot: Color) -> Self {
        Self {
            background,
            dot,
            phase: 0.0,
        }
    }
}

impl Scene<WgpuBackend> for PatternScene {
    fn init(&mut self, _backend: &mut WgpuBackend) -> bool {
        self.phase = 0.0;
        true
    }

    fn render(&mut self, backend: &mut WgpuBackend) {
        let (width, height) = backend.frame_size();
        let (w, h) = (width as f32, height as f32);
        let (tw, th) = backend.texture_size(&self.background);

        backend.draw_texture_region(
            &self.background,
            Rect::new(0.0, 0.0, tw as f32, th as f32),
            Rect::new(0.0, 0.0, w, h),
            Color::WHITE,
        );

        let radius = h.min(w) * (0.12 + 0.03 * self.phase.sin());
        backend.draw_circle(Vec2::new(w / 2.0, h / 2.0), radius, self.dot);
    }

    fn run(&mut self, backend: &mut WgpuBackend) -> bool {
        self.phase += backend.frame_time() * 3.0;
        true
    }
}

fn stripes(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        if (x / 40) % 2 == 0 {
            Rgba([32, 64, 128, 255])
        } else {
            Rgba([48, 96, 176, 255])
        }
    })
}

fn checker(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / 48 + y / 48) % 2 == 0 {
            Rgba([170, 60, 50, 255])
        } else {
            Rgba([230, 200, 120, 255])
        }
    })
}

fn radial(width: u32, height: u32) -> RgbaImage {
    let center = Vec2::new(width as f32, height as f32) / 2.0;
    let reach = center.length().max(1.0);
    RgbaImage::from_fn(width, height, |x, y| {
        let t = (Vec2::new(x as f32, y as f32).distance(center) / reach).min(1.0);
        let shade = (255.0 * (1.0 - t)) as u8;
        Rgba([20, shade, 90, 255])
    })
}

fn main() -> Result<(), SceneError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = AppConfig::new()
        .title("curtain")
        .size(960, 540)
        .transition_duration(1.2)?
        .easing(Easing::EaseInOut)
        .clear_color(Color::rgb(0.05, 0.05, 0.08));

    curtain::run_with_scenes(config, |ctx| {
        let (width, height) = ctx.size();

        let stripes = ctx.texture_from_rgba(&stripes(width, height), "Stripes");
        let checker = ctx.texture_from_rgba(&checker(width, height), "Checker");
        let radial = ctx.texture_from_rgba(&radial(width, height), "Radial");
        let surprise = ctx.random_transition();
        tracing::info!("the radial slide leaves with {}", surprise);

        ctx.scene(
            "stripes",
            PatternScene::new(stripes, Color::WHITE),
            TransitionStyle::CircleExpand,
        )?;
        ctx.scene(
            "checker",
            PatternScene::new(checker, Color::rgb(0.1, 0.1, 0.1)),
            TransitionStyle::SlideLeft,
        )?;
        ctx.scene(
            "radial",
            PatternScene::new(radial, Color::rgba8(255, 220, 0, 255)),
            surprise,
        )?;
        Ok(())
    })
}
