//! Scene lifecycle and scene transitions.
//!
//! # Overview
//!
//! A [`SceneManager`] holds a fixed-capacity list of named scenes in registration order.
//! Exactly one of them is current. Each scene declares the [`TransitionStyle`] played
//! when it is left, and [`SceneManager::advance`] moves to the next scene, wrapping back
//! to the first one after the last.
//!
//! Transitions are drawn by a [`TransitionEngine`] from two snapshots: the frame on
//! screen when the switch was requested and an off-screen render of the incoming scene.
//! While a transition runs, [`SceneManager::run_frame`] hands the whole frame to the
//! engine and the incoming scene's per-frame hook is not called.
//!
//! # Example
//!
//! ```
//! use curtain::backend::{Color, HeadlessBackend, RenderBackend};
//! use curtain::scene::{FnScene, SceneManager, TransitionStyle};
//!
//! let mut backend = HeadlessBackend::new(640, 480).with_frame_time(0.5);
//! let mut scenes: SceneManager<HeadlessBackend> = SceneManager::new();
//! scenes.transitions_mut().set_duration(1.0).unwrap();
//!
//! scenes
//!     .register(
//!         "intro",
//!         FnScene::new(|b: &mut HeadlessBackend| b.draw_circle(glam::Vec2::ZERO, 8.0, Color::WHITE), |_| true),
//!         TransitionStyle::CircleExpand,
//!     )
//!     .unwrap();
//! scenes
//!     .register_fn("menu", |_| {}, |_| true, TransitionStyle::Fade)
//!     .unwrap();
//!
//! scenes.activate_first(&mut backend);
//! scenes.run_frame(&mut backend).unwrap();
//!
//! scenes.advance(&mut backend).unwrap();
//! while scenes.is_transitioning() {
//!     scenes.run_frame(&mut backend).unwrap();
//! }
//! assert_eq!(scenes.current_name(), Some("menu"));
//! ```

mod engine;
mod manager;
mod scene;
mod transition;

pub use engine::TransitionEngine;
pub use manager::{MAX_SCENE_ENTRIES, MAX_SCENE_NAME_LEN, SceneManager};
pub use scene::{FnScene, Scene, SceneId};
pub use transition::{Easing, EffectParameter, TransitionConfig, TransitionStatus, TransitionStyle};
