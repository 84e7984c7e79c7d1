//! Scene manager for storing scenes and advancing between them.

use super::engine::TransitionEngine;
use super::scene::{FnScene, Scene, SceneId};
use super::transition::{TransitionConfig, TransitionStyle};
use crate::backend::{Color, RenderBackend};
use crate::error::{SceneError, TransitionError};

/// Default number of scenes a manager accepts.
pub const MAX_SCENE_ENTRIES: usize = 20;

/// Longest accepted scene name, in bytes.
pub const MAX_SCENE_NAME_LEN: usize = 50;

struct SceneEntry<B: RenderBackend> {
    name: String,
    scene: Box<dyn Scene<B>>,
    transition: TransitionStyle,
}

/// Owns the registered scenes, the current scene and the transition engine.
///
/// The scene manager is responsible for:
/// - Storing registered scenes in registration order
/// - Tracking the current scene
/// - Starting a transition when a scene with a transition style is left
/// - Handing the whole frame to the transition engine while one runs
///
/// # Example
///
/// ```
/// use curtain::backend::HeadlessBackend;
/// use curtain::scene::{FnScene, SceneManager, TransitionStyle};
///
/// let mut backend = HeadlessBackend::new(320, 240);
/// let mut scenes: SceneManager<HeadlessBackend> = SceneManager::new();
/// scenes
///     .register("title", FnScene::new(|_| {}, |_| true), TransitionStyle::Fade)
///     .unwrap();
/// scenes
///     .register_fn("game", |_| {}, |_| true, TransitionStyle::None)
///     .unwrap();
///
/// assert!(scenes.activate_first(&mut backend));
/// assert!(scenes.advance(&mut backend).unwrap());
/// assert!(scenes.is_transitioning());
/// ```
pub struct SceneManager<B: RenderBackend> {
    scenes: Vec<SceneEntry<B>>,
    capacity: usize,
    current: Option<SceneId>,
    transitions: TransitionEngine<B>,
    clear_color: Color,
}

impl<B: RenderBackend> SceneManager<B> {
    /// Create an empty manager accepting [`MAX_SCENE_ENTRIES`] scenes.
    pub fn new() -> Self {
        Self::with_capacity(MAX_SCENE_ENTRIES)
    }

    /// Create an empty manager accepting at most `capacity` scenes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scenes: Vec::with_capacity(capacity),
            capacity,
            current: None,
            transitions: TransitionEngine::new(),
            clear_color: Color::BLACK,
        }
    }

    /// Use `config` for every transition started from now on.
    pub fn with_transition_config(mut self, config: TransitionConfig) -> Self {
        self.transitions = TransitionEngine::with_config(config);
        self
    }

    /// Color live frames are cleared to before a scene renders.
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Register a scene. `transition` is played whenever this scene is left through
    /// [`advance`](Self::advance).
    ///
    /// Fails with [`SceneError::RegistryFull`] once `capacity` scenes are registered; the
    /// registry is left unchanged in that case.
    pub fn register<S>(
        &mut self,
        name: impl Into<String>,
        scene: S,
        transition: TransitionStyle,
    ) -> Result<SceneId, SceneError>
    where
        S: Scene<B> + 'static,
    {
        let name = name.into();
        if self.scenes.len() >= self.capacity {
            tracing::warn!(target: "scene", "no slot left for scene '{}'", name);
            return Err(SceneError::RegistryFull {
                capacity: self.capacity,
            });
        }
        if name.is_empty() {
            return Err(SceneError::EmptyName);
        }
        if name.len() > MAX_SCENE_NAME_LEN {
            return Err(SceneError::NameTooLong {
                name,
                max: MAX_SCENE_NAME_LEN,
            });
        }
        if self.find_by_name(&name).is_some() {
            return Err(SceneError::DuplicateName(name));
        }

        let id = SceneId(self.scenes.len());
        tracing::debug!(target: "scene", "registered '{}' as {} ({})", name, id, transition);
        self.scenes.push(SceneEntry {
            name,
            scene: Box::new(scene),
            transition,
        });
        Ok(id)
    }

    /// Register a scene built from closures; `init`/`end` are no-ops.
    pub fn register_fn<R, U>(
        &mut self,
        name: impl Into<String>,
        render: R,
        run: U,
        transition: TransitionStyle,
    ) -> Result<SceneId, SceneError>
    where
        B: 'static,
        R: FnMut(&mut B) + 'static,
        U: FnMut(&mut B) -> bool + 'static,
    {
        self.register(name, FnScene::new(render, run), transition)
    }

    /// Make `id` current and run its `init` hook. No transition is played.
    ///
    /// Returns the hook's result (`true` when absent), or `false` without touching any
    /// state when `id` was never issued.
    pub fn activate(&mut self, backend: &mut B, id: SceneId) -> bool {
        let Some(entry) = self.scenes.get_mut(id.0) else {
            tracing::warn!(target: "scene", "cannot activate unknown scene {}", id);
            return false;
        };
        self.current = Some(id);
        tracing::debug!(target: "scene", "activating '{}'", entry.name);
        let initialised = entry.scene.init(backend);
        if !initialised {
            tracing::warn!(target: "scene", "init of '{}' failed", entry.name);
        }
        initialised
    }

    /// Activate the first registered scene.
    pub fn activate_first(&mut self, backend: &mut B) -> bool {
        self.activate(backend, SceneId::FIRST)
    }

    /// Activate the scene registered as `name`.
    pub fn activate_by_name(&mut self, backend: &mut B, name: &str) -> bool {
        match self.find_by_name(name) {
            Some(id) => self.activate(backend, id),
            None => {
                tracing::warn!(target: "scene", "scene '{}' not found", name);
                false
            }
        }
    }

    /// Move to the next scene in registration order, wrapping to the first.
    ///
    /// When the current scene declares a transition style, the frame on screen is
    /// captured before the scene's `end` hook runs, the next scene is rendered
    /// off-screen after its `init` hook, and the transition is started.
    ///
    /// Returns the next scene's `init` result whether or not a transition started. With
    /// no current scene the first scene is entered. Fails without touching any state
    /// while a transition is still running.
    ///
    /// If the incoming frame cannot be rendered or the transition cannot start, the
    /// switch has already happened: the next scene is current and initialised, the
    /// pending snapshots are released, and the error is returned in place of the `init`
    /// result. The next [`run_frame`](Self::run_frame) simply shows the new scene.
    pub fn advance(&mut self, backend: &mut B) -> Result<bool, SceneError> {
        if self.transitions.is_active() {
            return Err(TransitionError::AlreadyActive.into());
        }
        if self.scenes.is_empty() {
            return Ok(false);
        }

        let mut style = TransitionStyle::None;
        if let Some(id) = self.current {
            let entry = self.scenes.get_mut(id.0).ok_or(SceneError::NoActiveScene)?;
            if entry.transition.is_animated() {
                style = entry.transition;
                self.transitions.capture_before(backend)?;
            }
            tracing::debug!(target: "scene", "leaving '{}'", entry.name);
            entry.scene.end(backend);
        }

        let next = self.next_position();
        self.current = Some(next);

        let entry = self.scenes.get_mut(next.0).ok_or(SceneError::NoActiveScene)?;
        tracing::debug!(target: "scene", "entering '{}'", entry.name);
        let initialised = entry.scene.init(backend);
        if !initialised {
            tracing::warn!(target: "scene", "init of '{}' failed", entry.name);
        }

        if style.is_animated() {
            let scene = &mut entry.scene;
            let started = self
                .transitions
                .capture_after(backend, |b| scene.render(b))
                .and_then(|()| self.transitions.start(backend, style));
            if let Err(e) = started {
                tracing::warn!(target: "scene", "skipping {} into '{}': {}", style, entry.name, e);
                self.transitions.discard_snapshots(backend);
                return Err(e.into());
            }
        }

        Ok(initialised)
    }

    /// Run one frame.
    ///
    /// While a transition is running the frame belongs to the transition engine and the
    /// current scene's `run` hook is not called; the result is then always `true`.
    /// Otherwise the current scene's `run` hook decides the result, and when it returns
    /// `true` the scene is rendered into a fresh frame.
    pub fn run_frame(&mut self, backend: &mut B) -> Result<bool, SceneError> {
        if self.transitions.is_active() {
            self.transitions.step(backend)?;
            return Ok(true);
        }

        let id = self.current.ok_or(SceneError::NoActiveScene)?;
        let entry = self.scenes.get_mut(id.0).ok_or(SceneError::NoActiveScene)?;

        if !entry.scene.run(backend) {
            tracing::debug!(target: "scene", "'{}' asked to stop", entry.name);
            return Ok(false);
        }

        backend.begin_drawing(self.clear_color);
        entry.scene.render(backend);
        backend.end_drawing()?;
        Ok(true)
    }

    /// Position of the scene registered as `name`.
    pub fn find_by_name(&self, name: &str) -> Option<SceneId> {
        self.scenes
            .iter()
            .position(|entry| entry.name == name)
            .map(SceneId)
    }

    /// The current scene, if any scene was activated.
    pub fn current(&self) -> Option<SceneId> {
        self.current
    }

    /// Name of the current scene.
    pub fn current_name(&self) -> Option<&str> {
        self.current.and_then(|id| self.name(id))
    }

    pub fn name(&self, id: SceneId) -> Option<&str> {
        self.scenes.get(id.0).map(|entry| entry.name.as_str())
    }

    /// Transition style played when leaving `id`.
    pub fn transition_of(&self, id: SceneId) -> Option<TransitionStyle> {
        self.scenes.get(id.0).map(|entry| entry.transition)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if a transition is currently in progress.
    pub fn is_transitioning(&self) -> bool {
        self.transitions.is_active()
    }

    pub fn transitions(&self) -> &TransitionEngine<B> {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut TransitionEngine<B> {
        &mut self.transitions
    }

    /// Position after the current one; always within `0..len`.
    fn next_position(&self) -> SceneId {
        match self.current {
            Some(SceneId(pos)) => SceneId((pos + 1) % self.scenes.len()),
            None => SceneId::FIRST,
        }
    }
}

impl<B: RenderBackend> Default for SceneManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, HeadlessBackend};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        log: Vec<String>,
    }

    type Shared = Rc<RefCell<Calls>>;

    fn traced(name: &'static str, calls: &Shared) -> FnScene<HeadlessBackend> {
        let (c1, c2, c3, c4) = (calls.clone(), calls.clone(), calls.clone(), calls.clone());
        FnScene::new(
            move |_| c1.borrow_mut().log.push(format!("{name}:render")),
            move |_| {
                c2.borrow_mut().log.push(format!("{name}:run"));
                true
            },
        )
        .on_init(move |_| {
            c3.borrow_mut().log.push(format!("{name}:init"));
            true
        })
        .on_end(move |_| c4.borrow_mut().log.push(format!("{name}:end")))
    }

    fn manager_with(names: &[&'static str], style: TransitionStyle) -> (SceneManager<HeadlessBackend>, Shared) {
        let calls = Shared::default();
        let mut manager = SceneManager::new();
        for &name in names {
            manager.register(name, traced(name, &calls), style).unwrap();
        }
        (manager, calls)
    }

    #[test]
    fn registration_assigns_dense_positions() {
        let (manager, _) = manager_with(&["a", "b", "c"], TransitionStyle::None);
        assert_eq!(manager.find_by_name("a"), Some(SceneId(0)));
        assert_eq!(manager.find_by_name("c"), Some(SceneId(2)));
        assert_eq!(manager.find_by_name("missing"), None);
        assert_eq!(manager.name(SceneId(1)), Some("b"));
    }

    #[test]
    fn registry_rejects_entries_beyond_capacity() {
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::with_capacity(2);
        manager.register_fn("a", |_| {}, |_| true, TransitionStyle::None).unwrap();
        manager.register_fn("b", |_| {}, |_| true, TransitionStyle::None).unwrap();
        assert_eq!(
            manager.register_fn("c", |_| {}, |_| true, TransitionStyle::None),
            Err(SceneError::RegistryFull { capacity: 2 })
        );
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn names_must_be_unique_and_bounded() {
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
        manager.register_fn("a", |_| {}, |_| true, TransitionStyle::None).unwrap();
        assert_eq!(
            manager.register_fn("a", |_| {}, |_| true, TransitionStyle::None),
            Err(SceneError::DuplicateName("a".into()))
        );
        assert_eq!(
            manager.register_fn("", |_| {}, |_| true, TransitionStyle::None),
            Err(SceneError::EmptyName)
        );
        let long = "x".repeat(MAX_SCENE_NAME_LEN + 1);
        assert!(matches!(
            manager.register_fn(long, |_| {}, |_| true, TransitionStyle::None),
            Err(SceneError::NameTooLong { .. })
        ));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn activate_runs_init_without_transition() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a", "b"], TransitionStyle::Fade);

        assert!(manager.activate(&mut backend, SceneId(1)));
        assert_eq!(manager.current(), Some(SceneId(1)));
        assert!(!manager.is_transitioning());
        assert_eq!(calls.borrow().log, vec!["b:init"]);
    }

    #[test]
    fn activate_rejects_unknown_positions() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a"], TransitionStyle::None);

        assert!(!manager.activate(&mut backend, SceneId::from_index(5)));
        assert_eq!(manager.current(), None);
        assert!(calls.borrow().log.is_empty());

        let mut empty: SceneManager<HeadlessBackend> = SceneManager::new();
        assert!(!empty.activate_first(&mut backend));
        assert_eq!(empty.advance(&mut backend), Ok(false));
    }

    #[test]
    fn failed_init_is_reported_but_position_moves() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
        manager.register_fn("a", |_| {}, |_| true, TransitionStyle::None).unwrap();
        manager
            .register(
                "b",
                FnScene::<HeadlessBackend>::new(|_| {}, |_| true).on_init(|_| false),
                TransitionStyle::None,
            )
            .unwrap();

        assert!(manager.activate_first(&mut backend));
        assert_eq!(manager.advance(&mut backend), Ok(false));
        assert_eq!(manager.current(), Some(SceneId(1)));
    }

    #[test]
    fn advance_wraps_using_scene_count() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::with_capacity(10);
        for name in ["a", "b", "c"] {
            manager.register_fn(name, |_| {}, |_| true, TransitionStyle::None).unwrap();
        }

        manager.activate_first(&mut backend);
        let mut seen = Vec::new();
        for _ in 0..4 {
            manager.advance(&mut backend).unwrap();
            let current = manager.current().unwrap();
            assert!(current.index() < manager.len());
            seen.push(current.index());
        }
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn advance_from_no_scene_enters_the_first() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a", "b"], TransitionStyle::Fade);

        assert_eq!(manager.advance(&mut backend), Ok(true));
        assert_eq!(manager.current(), Some(SceneId(0)));
        assert!(!manager.is_transitioning());
        assert_eq!(calls.borrow().log, vec!["a:init"]);
    }

    #[test]
    fn advance_orders_capture_end_init_render() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a", "b"], TransitionStyle::SlideLeft);
        manager.activate_first(&mut backend);
        calls.borrow_mut().log.clear();

        assert_eq!(backend.captures(), 0);
        manager.advance(&mut backend).unwrap();

        assert_eq!(backend.captures(), 1);
        assert_eq!(calls.borrow().log, vec!["a:end", "b:init", "b:render"]);
        assert!(manager.is_transitioning());
        assert_eq!(manager.transitions().style(), Some(TransitionStyle::SlideLeft));

        // the off-screen render happened inside its own texture scope
        let commands = backend.commands();
        assert!(matches!(commands[0], DrawCommand::BeginTextureMode { .. }));
        assert_eq!(commands[1], DrawCommand::EndTextureMode);
    }

    #[test]
    fn advance_is_rejected_while_transitioning() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a", "b", "c"], TransitionStyle::Fade);
        manager.activate_first(&mut backend);
        manager.advance(&mut backend).unwrap();
        calls.borrow_mut().log.clear();

        assert_eq!(
            manager.advance(&mut backend),
            Err(SceneError::Transition(TransitionError::AlreadyActive))
        );
        assert_eq!(manager.current(), Some(SceneId(1)));
        assert!(calls.borrow().log.is_empty());
    }

    #[test]
    fn run_frame_delegates_to_the_engine_while_transitioning() {
        let mut backend = HeadlessBackend::new(64, 64).with_frame_time(0.25);
        let (mut manager, calls) = manager_with(&["a", "b"], TransitionStyle::Fade);
        manager.transitions_mut().set_duration(1.0).unwrap();
        manager.activate_first(&mut backend);
        manager.advance(&mut backend).unwrap();
        calls.borrow_mut().log.clear();

        for _ in 0..4 {
            assert_eq!(manager.run_frame(&mut backend), Ok(true));
        }
        assert!(!manager.is_transitioning());
        assert!(calls.borrow().log.is_empty(), "scene ran during transition");

        assert_eq!(manager.run_frame(&mut backend), Ok(true));
        assert_eq!(calls.borrow().log, vec!["b:run", "b:render"]);
    }

    #[test]
    fn run_frame_stops_without_rendering() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
        manager.register_fn("quit", |_| {}, |_| false, TransitionStyle::None).unwrap();

        assert_eq!(manager.run_frame(&mut backend), Err(SceneError::NoActiveScene));
        manager.activate_first(&mut backend);
        assert_eq!(manager.run_frame(&mut backend), Ok(false));
        assert_eq!(backend.frames_presented(), 0);
    }

    #[test]
    fn failing_capture_leaves_the_current_scene_alive() {
        let mut backend = HeadlessBackend::new(64, 64);
        let (mut manager, calls) = manager_with(&["a", "b"], TransitionStyle::Fade);
        manager.activate_first(&mut backend);
        calls.borrow_mut().log.clear();

        backend.set_frame_size(0, 0);
        assert!(matches!(
            manager.advance(&mut backend),
            Err(SceneError::Transition(TransitionError::Backend(_)))
        ));
        assert_eq!(manager.current(), Some(SceneId(0)));
        assert!(calls.borrow().log.is_empty());
    }

    #[test]
    fn failing_incoming_render_switches_without_a_transition() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
        manager
            .register_fn("a", |_| {}, |_| true, TransitionStyle::CircleExpand)
            .unwrap();
        // the incoming scene leaves nothing to render into
        manager
            .register(
                "b",
                FnScene::<HeadlessBackend>::new(|_| {}, |_| true).on_init(|b| {
                    b.set_frame_size(0, 0);
                    true
                }),
                TransitionStyle::None,
            )
            .unwrap();
        manager.activate_first(&mut backend);

        assert!(matches!(
            manager.advance(&mut backend),
            Err(SceneError::Transition(TransitionError::Backend(
                crate::error::BackendError::TextureCreation(_)
            )))
        ));
        assert_eq!(manager.current_name(), Some("b"));
        assert!(!manager.is_transitioning());
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.captures(), 1);
    }

    proptest! {
        #[test]
        fn advance_always_lands_inside_the_registry(count in 1usize..=MAX_SCENE_ENTRIES, steps in 0usize..64) {
            let mut backend = HeadlessBackend::new(16, 16);
            let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
            for i in 0..count {
                manager.register_fn(format!("scene-{i}"), |_| {}, |_| true, TransitionStyle::None).unwrap();
            }
            manager.activate_first(&mut backend);
            for _ in 0..steps {
                manager.advance(&mut backend).unwrap();
            }
            prop_assert_eq!(manager.current(), Some(SceneId(steps % count)));
        }

        #[test]
        fn find_by_name_returns_the_registration_position(count in 1usize..=MAX_SCENE_ENTRIES, pick in 0usize..MAX_SCENE_ENTRIES) {
            let mut manager: SceneManager<HeadlessBackend> = SceneManager::new();
            for i in 0..count {
                manager.register_fn(format!("scene-{i}"), |_| {}, |_| true, TransitionStyle::None).unwrap();
            }
            let pick = pick % count;
            let name = format!("scene-{pick}");
            prop_assert_eq!(manager.find_by_name(&name), Some(SceneId(pick)));
            prop_assert_eq!(manager.name(SceneId(pick)), Some(name.as_str()));
        }
    }
}
