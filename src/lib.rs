//! # Curtain
//!
//! **Scene lifecycle and animated scene transitions for real-time renderers.**
//!
//! A [`SceneManager`](scene::SceneManager) keeps a bounded list of named scenes and
//! advances through them in order. Leaving a scene can play one of seven transitions
//! (fade, four slides, and an expanding or contracting circle) drawn by the
//! [`TransitionEngine`](scene::TransitionEngine) from a snapshot of the outgoing frame
//! and an off-screen render of the incoming one.
//!
//! Everything is drawn through the [`RenderBackend`](backend::RenderBackend) trait.
//! [`WgpuBackend`] renders into a winit window; [`HeadlessBackend`](backend::HeadlessBackend)
//! records draw calls instead, which is how scene logic is tested.
//!
//! ## Quick Start
//!
//! ```no_run
//! use curtain::backend::{Color, RenderBackend};
//! use curtain::scene::{FnScene, TransitionStyle};
//! use curtain::{AppConfig, WgpuBackend};
//!
//! fn main() -> Result<(), curtain::SceneError> {
//!     curtain::run_with_scenes(AppConfig::new().title("Hello"), |ctx| {
//!         ctx.scene(
//!             "dot",
//!             FnScene::new(
//!                 |b: &mut WgpuBackend| b.draw_circle(glam::Vec2::new(400.0, 300.0), 50.0, Color::WHITE),
//!                 |_| true,
//!             ),
//!             TransitionStyle::CircleExpand,
//!         )?;
//!         ctx.scene(
//!             "blank",
//!             FnScene::<WgpuBackend>::new(|_| {}, |_| true),
//!             TransitionStyle::Fade,
//!         )?;
//!         Ok(())
//!     })
//! }
//! ```

mod app;
pub mod backend;
mod compositor;
mod config;
pub mod error;
mod gpu;
mod input;
mod render_target;
pub mod scene;
mod texture;
mod wgpu_backend;

pub use app::{SetupContext, run_with_scenes};
pub use config::AppConfig;
pub use error::{BackendError, SceneError, TransitionError};
pub use gpu::GpuContext;
pub use texture::Texture;
pub use wgpu_backend::{Snapshot, WgpuBackend};

// Re-export glam math types for convenience
pub use glam::Vec2;
