//! Error types for the scene lifecycle, the transition engine and the render backends.
//!
//! Failures are layered the same way the components are: backend failures are wrapped
//! by transition failures, and both are wrapped by scene failures, so `?` carries a
//! GPU error from a snapshot all the way out of [`SceneManager::advance`].
//!
//! [`SceneManager::advance`]: crate::scene::SceneManager::advance

use thiserror::Error;

/// Failures reported by a [`RenderBackend`](crate::backend::RenderBackend) binding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no compatible GPU adapter found: {0}")]
    Adapter(String),

    #[error("failed to create device: {0}")]
    Device(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("window creation failed: {0}")]
    Window(String),

    #[error("event loop error: {0}")]
    EventLoop(String),

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("texture creation failed: {0}")]
    TextureCreation(String),

    /// `end_drawing`/`end_texture_mode` without the matching `begin_*` call.
    #[error("{0} called outside of a matching drawing scope")]
    OutsideDrawing(&'static str),
}

impl BackendError {
    /// A lost or outdated surface only costs the current frame; the next one redraws.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Surface(_))
    }
}

/// Failures of the transition engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// A session is already running; transitions never overlap.
    #[error("a transition is already running")]
    AlreadyActive,

    #[error("transition duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f32),

    /// `start` was called before the named snapshot was captured.
    #[error("missing {0} snapshot")]
    MissingSnapshot(&'static str),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Failures of the scene registry and lifecycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The registry has no free slot left.
    #[error("scene registry is full ({capacity} entries)")]
    RegistryFull { capacity: usize },

    #[error("a scene named '{0}' is already registered")]
    DuplicateName(String),

    #[error("scene name '{name}' exceeds {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("scene name must not be empty")]
    EmptyName,

    #[error("no scene is active")]
    NoActiveScene,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
