use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{WindowAttributes, WindowId};

use crate::backend::RenderBackend;
use crate::config::AppConfig;
use crate::error::{BackendError, SceneError, TransitionError};
use crate::input::Input;
use crate::scene::{Scene, SceneId, SceneManager, TransitionStyle};
use crate::texture::Texture;
use crate::wgpu_backend::WgpuBackend;

/// Keys that move to the next scene.
const ADVANCE_KEYS: [KeyCode; 2] = [KeyCode::Space, KeyCode::ArrowRight];

/// Context provided during app setup, once the window and GPU exist.
pub struct SetupContext<'a> {
    pub backend: &'a mut WgpuBackend,
    pub scenes: &'a mut SceneManager<WgpuBackend>,
}

impl SetupContext<'_> {
    /// Register a scene; see [`SceneManager::register`].
    pub fn scene<S>(
        &mut self,
        name: &str,
        scene: S,
        transition: TransitionStyle,
    ) -> Result<SceneId, SceneError>
    where
        S: Scene<WgpuBackend> + 'static,
    {
        self.scenes.register(name, scene, transition)
    }

    /// Pick a random animated style.
    pub fn random_transition(&mut self) -> TransitionStyle {
        self.scenes.transitions_mut().random_transition()
    }

    /// Upload scene content.
    pub fn texture_from_rgba(&self, image: &image::RgbaImage, label: &str) -> Texture {
        self.backend.texture_from_rgba(image, label)
    }

    /// Choose the scene shown first. Defaults to the first registered scene.
    pub fn start_scene(&mut self, name: &str) -> bool {
        self.scenes.activate_by_name(self.backend, name)
    }

    /// Current frame size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.backend.frame_size()
    }
}

/// Run the scene runner with custom configuration.
///
/// `setup` registers the scenes. Space or the right arrow advances to the next scene,
/// Escape quits. With [`AppConfig::auto_advance`] set, scenes also advance on their own.
///
/// # Example
/// ```ignore
/// curtain::run_with_scenes(AppConfig::new().title("Slides"), |ctx| {
///     ctx.scene("first", FirstSlide::new(ctx.backend), TransitionStyle::Fade)?;
///     ctx.scene("second", SecondSlide::new(ctx.backend), TransitionStyle::CircleExpand)?;
///     Ok(())
/// })?;
/// ```
pub fn run_with_scenes<S>(config: AppConfig, setup: S) -> Result<(), SceneError>
where
    S: FnOnce(&mut SetupContext) -> Result<(), SceneError> + 'static,
{
    let event_loop = EventLoop::new().map_err(|e| BackendError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = CurtainApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(setup)),
        },
        error: None,
    };

    event_loop
        .run_app(&mut app)
        .map_err(|e| BackendError::EventLoop(e.to_string()))?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<(), SceneError>>;

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        backend: WgpuBackend,
        scenes: SceneManager<WgpuBackend>,
        input: Input,
        auto_advance: Option<f32>,
        on_screen: f32,
    },
    Stopped,
}

struct CurtainApp {
    state: AppState,
    error: Option<SceneError>,
}

impl CurtainApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SceneError) {
        tracing::error!(target: "scene", "{}", error);
        self.error = Some(error);
        self.state = AppState::Stopped;
        event_loop.exit();
    }

    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        setup: SetupFn,
    ) -> Result<AppState, SceneError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| BackendError::Window(e.to_string()))?,
        );
        let mut backend = WgpuBackend::new(window)?;
        let mut scenes = SceneManager::new()
            .with_transition_config(config.transition)
            .with_clear_color(config.clear_color);

        setup(&mut SetupContext {
            backend: &mut backend,
            scenes: &mut scenes,
        })?;

        if scenes.is_empty() {
            return Err(SceneError::NoActiveScene);
        }
        if scenes.current().is_none() {
            scenes.activate_first(&mut backend);
        }
        tracing::debug!(target: "scene", "running {} scenes", scenes.len());

        backend.window().request_redraw();
        Ok(AppState::Running {
            backend,
            scenes,
            input: Input::new(),
            auto_advance: config.auto_advance,
            on_screen: 0.0,
        })
    }
}

impl ApplicationHandler for CurtainApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Self::start(event_loop, config, setup) {
            Ok(state) => self.state = state,
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running {
            backend,
            scenes,
            input,
            auto_advance,
            on_screen,
        } = &mut self.state
        else {
            return;
        };

        input.handle_event(&event);

        let failure = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                None
            }
            WindowEvent::Resized(size) => backend
                .resize(size.width, size.height)
                .err()
                .map(SceneError::from),
            WindowEvent::RedrawRequested => {
                backend.begin_frame();

                if input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                }

                let mut advance = input.any_pressed(&ADVANCE_KEYS);
                if let Some(interval) = *auto_advance {
                    if !scenes.is_transitioning() {
                        *on_screen += backend.frame_time();
                    }
                    advance |= *on_screen >= interval;
                }

                let mut failure = None;
                if advance {
                    *on_screen = 0.0;
                    match scenes.advance(backend) {
                        Ok(true) => {}
                        Ok(false) => tracing::warn!(target: "scene", "scene failed to start"),
                        Err(SceneError::Transition(TransitionError::AlreadyActive)) => {
                            tracing::debug!(target: "scene", "ignoring advance during transition");
                        }
                        Err(e) => failure = Some(e),
                    }
                }

                if failure.is_none() {
                    match scenes.run_frame(backend) {
                        Ok(true) => {}
                        Ok(false) => event_loop.exit(),
                        Err(e) if is_transient(&e) => {
                            tracing::warn!(target: "gpu", "dropped frame: {}", e);
                        }
                        Err(e) => failure = Some(e),
                    }
                }

                input.begin_frame();
                backend.window().request_redraw();
                failure
            }
            _ => None,
        };

        if let Some(e) = failure {
            self.fail(event_loop, e);
        }
    }
}

/// Surface loss and timeouts recover on the next frame.
fn is_transient(error: &SceneError) -> bool {
    match error {
        SceneError::Backend(e) | SceneError::Transition(TransitionError::Backend(e)) => {
            e.is_transient()
        }
        _ => false,
    }
}
