//! Scene definition and identifier types.

use crate::backend::RenderBackend;
use std::fmt;

/// Position of a scene in its [`SceneManager`](super::SceneManager).
///
/// Positions are dense: the first registered scene is `0`, the next `1` and so on.
/// A position is assigned once and never reused or reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(pub(crate) usize);

impl SceneId {
    /// The first registered scene.
    pub const FIRST: SceneId = SceneId(0);

    /// Refer to a scene by raw position. The manager rejects positions it never issued.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle hooks of one scene.
///
/// Only one scene is alive at a time: the outgoing scene's [`end`](Scene::end) always
/// runs before the incoming scene's [`init`](Scene::init).
pub trait Scene<B: RenderBackend> {
    /// Prepare the scene for becoming current. Returning `false` reports a failed
    /// activation; the manager does not roll back.
    fn init(&mut self, _backend: &mut B) -> bool {
        true
    }

    /// Draw the scene. Called inside an open drawing scope, both for live frames and for
    /// the off-screen snapshot taken when a transition leads into this scene.
    fn render(&mut self, backend: &mut B);

    /// Per-frame update. Returning `false` asks the application to stop.
    fn run(&mut self, backend: &mut B) -> bool;

    /// Tear the scene down. Best effort.
    fn end(&mut self, _backend: &mut B) {}
}

type InitFn<B> = Box<dyn FnMut(&mut B) -> bool>;
type RenderFn<B> = Box<dyn FnMut(&mut B)>;
type RunFn<B> = Box<dyn FnMut(&mut B) -> bool>;
type EndFn<B> = Box<dyn FnMut(&mut B)>;

/// A [`Scene`] assembled from closures.
///
/// `render` and `run` are required; `init` and `end` default to no-ops.
///
/// # Example
///
/// ```
/// use curtain::backend::{Color, HeadlessBackend, RenderBackend};
/// use curtain::scene::FnScene;
///
/// let scene = FnScene::new(
///     |b: &mut HeadlessBackend| b.draw_circle(glam::Vec2::ZERO, 4.0, Color::WHITE),
///     |_| true,
/// )
/// .on_init(|_| true)
/// .on_end(|_| println!("Leaving..."));
/// ```
pub struct FnScene<B: RenderBackend> {
    init: Option<InitFn<B>>,
    render: RenderFn<B>,
    run: RunFn<B>,
    end: Option<EndFn<B>>,
}

impl<B: RenderBackend> FnScene<B> {
    pub fn new<R, U>(render: R, run: U) -> Self
    where
        R: FnMut(&mut B) + 'static,
        U: FnMut(&mut B) -> bool + 'static,
    {
        Self {
            init: None,
            render: Box::new(render),
            run: Box::new(run),
            end: None,
        }
    }

    /// Set a callback to run when this scene becomes current.
    pub fn on_init<F: FnMut(&mut B) -> bool + 'static>(mut self, callback: F) -> Self {
        self.init = Some(Box::new(callback));
        self
    }

    /// Set a callback to run when this scene is left.
    pub fn on_end<F: FnMut(&mut B) + 'static>(mut self, callback: F) -> Self {
        self.end = Some(Box::new(callback));
        self
    }
}

impl<B: RenderBackend> Scene<B> for FnScene<B> {
    fn init(&mut self, backend: &mut B) -> bool {
        match self.init {
            Some(ref mut callback) => callback(backend),
            None => true,
        }
    }

    fn render(&mut self, backend: &mut B) {
        (self.render)(backend)
    }

    fn run(&mut self, backend: &mut B) -> bool {
        (self.run)(backend)
    }

    fn end(&mut self, backend: &mut B) {
        if let Some(ref mut callback) = self.end {
            callback(backend);
        }
    }
}
