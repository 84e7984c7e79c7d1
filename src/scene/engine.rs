//! The transition engine: snapshots, timing and per-effect compositing.

use super::transition::{
    EffectParameter, Easing, TransitionConfig, TransitionStatus, TransitionStyle,
    validate_duration,
};
use crate::backend::{BlendMode, Color, Rect, RenderBackend};
use crate::error::{BackendError, TransitionError};
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// A running transition. Owns every texture it draws with.
struct Session<T> {
    style: TransitionStyle,
    start_time: f32,
    elapsed: f32,
    duration: f32,
    easing: Easing,
    width: f32,
    height: f32,
    before: T,
    after: T,
    canvas: Option<T>,
}

impl<T> Session<T> {
    fn progress(&self) -> f32 {
        self.easing.apply(self.elapsed / self.duration)
    }

    fn parameter(&self) -> EffectParameter {
        self.style.parameter(self.progress(), self.width, self.height)
    }

    fn release<B: RenderBackend<Texture = T>>(self, backend: &mut B) {
        backend.release_texture(self.before);
        backend.release_texture(self.after);
        if let Some(canvas) = self.canvas {
            backend.release_texture(canvas);
        }
    }
}

/// Animates the handoff between two captured frames.
///
/// The engine is either idle or running exactly one session. A session is prepared with
/// [`capture_before`](Self::capture_before) and [`capture_after`](Self::capture_after),
/// started with [`start`](Self::start) and then driven by one [`step`](Self::step) per
/// frame until it reports [`TransitionStatus::Finished`].
///
/// Progress is `elapsed / duration` where `elapsed` is the sum of the backend's actual
/// frame deltas, so an effect covers the same distance in the same wall-clock time at any
/// frame rate. The frame drawn on completion always uses the exact terminal value.
pub struct TransitionEngine<B: RenderBackend> {
    config: TransitionConfig,
    before: Option<B::Image>,
    after: Option<B::Texture>,
    session: Option<Session<B::Texture>>,
    rng: Option<StdRng>,
}

impl<B: RenderBackend> TransitionEngine<B> {
    pub fn new() -> Self {
        Self::with_config(TransitionConfig::default())
    }

    pub fn with_config(config: TransitionConfig) -> Self {
        Self {
            config,
            before: None,
            after: None,
            session: None,
            rng: None,
        }
    }

    pub fn config(&self) -> TransitionConfig {
        self.config
    }

    /// Change the duration used by sessions started from now on.
    pub fn set_duration(&mut self, seconds: f32) -> Result<(), TransitionError> {
        self.config = self.config.duration(seconds)?;
        Ok(())
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.config = self.config.easing(easing);
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Style of the running session.
    pub fn style(&self) -> Option<TransitionStyle> {
        self.session.as_ref().map(|s| s.style)
    }

    /// Eased progress of the running session in `0.0..=1.0`.
    pub fn progress(&self) -> Option<f32> {
        self.session.as_ref().map(Session::progress)
    }

    /// Current animation parameter of the running session.
    pub fn parameter(&self) -> Option<EffectParameter> {
        self.session.as_ref().map(Session::parameter)
    }

    /// Backend time at which the running session started.
    pub fn started_at(&self) -> Option<f32> {
        self.session.as_ref().map(|s| s.start_time)
    }

    /// Snapshot the frame currently on screen as the outgoing image.
    ///
    /// Must run before the outgoing scene is torn down or the incoming one is rendered.
    pub fn capture_before(&mut self, backend: &mut B) -> Result<(), TransitionError> {
        let image = backend.capture_screen()?;
        if let Some(stale) = self.before.replace(image) {
            backend.release_image(stale);
        }
        Ok(())
    }

    /// Render `render` off-screen at the current frame size and keep it as the
    /// incoming texture.
    pub fn capture_after<F>(&mut self, backend: &mut B, render: F) -> Result<(), TransitionError>
    where
        F: FnOnce(&mut B),
    {
        let (width, height) = backend.frame_size();
        let target = backend.create_render_texture(width, height)?;

        backend.begin_texture_mode(&target, Color::TRANSPARENT);
        render(backend);
        if let Err(e) = backend.end_texture_mode() {
            backend.release_texture(target);
            return Err(e.into());
        }

        if let Some(stale) = self.after.replace(target) {
            backend.release_texture(stale);
        }
        Ok(())
    }

    /// Start animating the captured snapshots with `style`.
    ///
    /// Returns `Ok(false)` for [`TransitionStyle::None`], which drops any pending
    /// snapshots and leaves the engine idle. A running session is never replaced.
    pub fn start(&mut self, backend: &mut B, style: TransitionStyle) -> Result<bool, TransitionError> {
        if self.session.is_some() {
            return Err(TransitionError::AlreadyActive);
        }
        if !style.is_animated() {
            self.discard_snapshots(backend);
            return Ok(false);
        }
        let duration = validate_duration(self.config.seconds())?;

        let Some(image) = self.before.take() else {
            return Err(TransitionError::MissingSnapshot("before"));
        };
        let Some(after) = self.after.take() else {
            self.before = Some(image);
            return Err(TransitionError::MissingSnapshot("after"));
        };

        let before = backend.load_texture(&image);
        backend.release_image(image);
        let before = match before {
            Ok(texture) => texture,
            Err(e) => {
                backend.release_texture(after);
                return Err(e.into());
            }
        };

        let (width, height) = backend.frame_size();
        let canvas = if style.needs_canvas() {
            match backend.create_render_texture(width, height) {
                Ok(canvas) => Some(canvas),
                Err(e) => {
                    backend.release_texture(before);
                    backend.release_texture(after);
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let start_time = backend.time();
        tracing::debug!(
            target: "transition",
            "starting {} ({:.2}s, {}x{})",
            style,
            duration,
            width,
            height
        );

        self.session = Some(Session {
            style,
            start_time,
            elapsed: 0.0,
            duration,
            easing: self.config.curve(),
            width: width as f32,
            height: height as f32,
            before,
            after,
            canvas,
        });
        Ok(true)
    }

    /// Advance the running session by one frame and draw it.
    ///
    /// When the terminal value is reached the terminal frame is drawn, every session
    /// texture is released and [`TransitionStatus::Finished`] is returned.
    ///
    /// A transient backend failure (see [`BackendError::is_transient`]) drops only the
    /// frame: the session keeps running and its clock does not move, so the next step
    /// redraws from the same point. Any other failure ends the session, releasing its
    /// textures, before being returned.
    pub fn step(&mut self, backend: &mut B) -> Result<TransitionStatus, TransitionError> {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!(target: "transition", "step called without a running transition");
            return Ok(TransitionStatus::Idle);
        };

        let resume_at = session.elapsed;
        let dt = backend.frame_time();
        if dt.is_finite() && dt > 0.0 {
            session.elapsed = (session.elapsed + dt).min(session.duration);
        }

        let finished = session.elapsed >= session.duration;
        if let Err(e) = draw_session(session, backend) {
            if e.is_transient() {
                session.elapsed = resume_at;
                tracing::debug!(target: "transition", "{} dropped a frame: {}", session.style, e);
            } else {
                tracing::warn!(target: "transition", "{} aborted: {}", session.style, e);
                self.end_session(backend);
            }
            return Err(e.into());
        }

        if finished {
            self.end_session(backend);
            Ok(TransitionStatus::Finished)
        } else {
            Ok(TransitionStatus::Running)
        }
    }

    /// End the running session immediately without drawing. Returns whether one was running.
    pub fn cancel(&mut self, backend: &mut B) -> bool {
        self.discard_snapshots(backend);
        match self.session.take() {
            Some(session) => {
                tracing::debug!(target: "transition", "{} cancelled", session.style);
                session.release(backend);
                true
            }
            None => false,
        }
    }

    /// Uniformly pick an animated style.
    ///
    /// The generator is seeded from the wall clock on first use.
    pub fn random_transition(&mut self) -> TransitionStyle {
        let rng = self.rng.get_or_insert_with(|| {
            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default();
            StdRng::seed_from_u64(seed)
        });
        TransitionStyle::random(rng)
    }

    fn end_session(&mut self, backend: &mut B) {
        if let Some(session) = self.session.take() {
            tracing::debug!(
                target: "transition",
                "{} finished after {:.2}s",
                session.style,
                session.elapsed
            );
            session.release(backend);
        }
    }

    pub(crate) fn discard_snapshots(&mut self, backend: &mut B) {
        if let Some(image) = self.before.take() {
            backend.release_image(image);
        }
        if let Some(texture) = self.after.take() {
            backend.release_texture(texture);
        }
    }
}

impl<B: RenderBackend> Default for TransitionEngine<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Source rectangle covering a whole texture, mirrored when the backend stores
/// render textures bottom-up.
fn full_source<B: RenderBackend>(backend: &B, texture: &B::Texture, offscreen: bool) -> Rect {
    let (w, h) = backend.texture_size(texture);
    let (w, h) = (w as f32, h as f32);
    if offscreen && B::OFFSCREEN_FLIPPED {
        Rect::new(0.0, 0.0, w, -h)
    } else {
        Rect::new(0.0, 0.0, w, h)
    }
}

/// Draw an off-screen texture with its top-left corner at `x`.
fn draw_offscreen<B: RenderBackend>(backend: &mut B, texture: &B::Texture, x: f32, tint: Color) {
    let source = full_source(backend, texture, true);
    let dest = Rect::new(x, 0.0, source.width, source.height.abs());
    backend.draw_texture_region(texture, source, dest, tint);
}

/// Fill `canvas` with `source` and cut a transparent circle of `radius` out of its centre.
fn punch_hole<B: RenderBackend>(
    backend: &mut B,
    canvas: &B::Texture,
    source: &B::Texture,
    source_offscreen: bool,
    center: Vec2,
    radius: f32,
) -> Result<(), BackendError> {
    backend.begin_texture_mode(canvas, Color::TRANSPARENT);
    if source_offscreen {
        draw_offscreen(backend, source, 0.0, Color::WHITE);
    } else {
        backend.draw_texture(source, Vec2::ZERO, Color::WHITE);
    }
    backend.set_blend_mode(BlendMode::AlphaMin);
    backend.draw_circle(center, radius, Color::TRANSPARENT);
    backend.set_blend_mode(BlendMode::Alpha);
    backend.end_texture_mode()
}

fn draw_session<B: RenderBackend>(
    session: &Session<B::Texture>,
    backend: &mut B,
) -> Result<(), BackendError> {
    let width = session.width;
    let center = Vec2::new(session.width / 2.0, session.height / 2.0);

    match (session.style, session.parameter()) {
        (TransitionStyle::Fade, EffectParameter::Alpha { outgoing, incoming }) => {
            backend.begin_drawing(Color::BLACK);
            backend.draw_texture(
                &session.before,
                Vec2::ZERO,
                Color::WHITE.with_alpha(outgoing / 255.0),
            );
            draw_offscreen(
                backend,
                &session.after,
                0.0,
                Color::WHITE.with_alpha(incoming / 255.0),
            );
            backend.end_drawing()
        }
        (
            TransitionStyle::SlideLeftOverlap | TransitionStyle::SlideRightOverlap,
            EffectParameter::Offset(offset),
        ) => {
            backend.begin_drawing(Color::BLACK);
            backend.draw_texture(&session.before, Vec2::ZERO, Color::WHITE);
            draw_offscreen(backend, &session.after, -offset, Color::WHITE);
            backend.end_drawing()
        }
        (TransitionStyle::SlideLeft, EffectParameter::Offset(offset)) => {
            backend.begin_drawing(Color::BLACK);
            backend.draw_texture(&session.before, Vec2::new(-width - offset, 0.0), Color::WHITE);
            draw_offscreen(backend, &session.after, -offset, Color::WHITE);
            backend.end_drawing()
        }
        (TransitionStyle::SlideRight, EffectParameter::Offset(offset)) => {
            backend.begin_drawing(Color::BLACK);
            backend.draw_texture(&session.before, Vec2::new(width - offset, 0.0), Color::WHITE);
            draw_offscreen(backend, &session.after, -offset, Color::WHITE);
            backend.end_drawing()
        }
        (TransitionStyle::CircleExpand, EffectParameter::Radius(radius)) => {
            let Some(canvas) = session.canvas.as_ref() else {
                return Err(BackendError::TextureCreation("missing working canvas".into()));
            };
            punch_hole(backend, canvas, &session.before, false, center, radius)?;

            backend.begin_drawing(Color::BLACK);
            draw_offscreen(backend, &session.after, 0.0, Color::WHITE);
            draw_offscreen(backend, canvas, 0.0, Color::WHITE);
            backend.end_drawing()
        }
        (TransitionStyle::CircleContract, EffectParameter::Radius(radius)) => {
            let Some(canvas) = session.canvas.as_ref() else {
                return Err(BackendError::TextureCreation("missing working canvas".into()));
            };
            punch_hole(backend, canvas, &session.after, true, center, radius)?;

            backend.begin_drawing(Color::BLACK);
            backend.draw_texture(&session.before, Vec2::ZERO, Color::WHITE);
            draw_offscreen(backend, canvas, 0.0, Color::WHITE);
            backend.end_drawing()
        }
        // `None` never starts a session and every style maps to its own parameter kind.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, HeadlessBackend};

    const DT: f32 = 1.0 / 60.0;

    fn engine(duration: f32) -> TransitionEngine<HeadlessBackend> {
        let mut engine = TransitionEngine::new();
        engine.set_duration(duration).unwrap();
        engine
    }

    fn prepare(engine: &mut TransitionEngine<HeadlessBackend>, backend: &mut HeadlessBackend) {
        engine.capture_before(backend).unwrap();
        engine
            .capture_after(backend, |b| b.draw_circle(Vec2::ZERO, 1.0, Color::WHITE))
            .unwrap();
    }

    fn run_to_end(
        engine: &mut TransitionEngine<HeadlessBackend>,
        backend: &mut HeadlessBackend,
    ) -> (usize, Vec<EffectParameter>) {
        let mut steps = 0;
        let mut params = Vec::new();
        loop {
            let status = engine.step(backend).unwrap();
            steps += 1;
            if let Some(p) = engine.parameter() {
                params.push(p);
            }
            if status == TransitionStatus::Finished {
                return (steps, params);
            }
            assert!(steps < 10_000, "transition never finished");
        }
    }

    fn scalar(param: EffectParameter) -> f32 {
        match param {
            EffectParameter::Alpha { incoming, .. } => incoming,
            EffectParameter::Offset(x) | EffectParameter::Radius(x) => x,
            EffectParameter::None => 0.0,
        }
    }

    #[test]
    fn none_style_stays_idle_and_drops_snapshots() {
        let mut backend = HeadlessBackend::new(320, 240);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);

        assert_eq!(engine.start(&mut backend, TransitionStyle::None), Ok(false));
        assert!(!engine.is_active());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn start_requires_both_snapshots() {
        let mut backend = HeadlessBackend::new(320, 240);
        let mut engine = engine(1.0);
        assert_eq!(
            engine.start(&mut backend, TransitionStyle::Fade),
            Err(TransitionError::MissingSnapshot("before"))
        );

        engine.capture_before(&mut backend).unwrap();
        assert_eq!(
            engine.start(&mut backend, TransitionStyle::Fade),
            Err(TransitionError::MissingSnapshot("after"))
        );
        assert!(!engine.is_active());
    }

    #[test]
    fn starting_while_running_is_rejected() {
        let mut backend = HeadlessBackend::new(320, 240);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        assert_eq!(engine.start(&mut backend, TransitionStyle::Fade), Ok(true));

        prepare(&mut engine, &mut backend);
        assert_eq!(
            engine.start(&mut backend, TransitionStyle::SlideLeft),
            Err(TransitionError::AlreadyActive)
        );
        assert_eq!(engine.style(), Some(TransitionStyle::Fade));
    }

    #[test]
    fn step_while_idle_draws_nothing() {
        let mut backend = HeadlessBackend::new(320, 240);
        let mut engine = engine(1.0);
        assert_eq!(engine.step(&mut backend), Ok(TransitionStatus::Idle));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn fade_takes_duration_over_frame_time_steps() {
        let mut backend = HeadlessBackend::new(320, 240).with_frame_time(DT);
        let mut engine = engine(2.0);
        prepare(&mut engine, &mut backend);
        engine.start(&mut backend, TransitionStyle::Fade).unwrap();

        let (steps, _) = run_to_end(&mut engine, &mut backend);
        let expected = (2.0 / DT).ceil() as i64;
        assert!(
            (steps as i64 - expected).abs() <= 1,
            "{} steps, expected about {}",
            steps,
            expected
        );
        assert!(!engine.is_active());
    }

    #[test]
    fn every_effect_is_monotonic_and_lands_on_its_terminal_value() {
        let (w, h) = (320.0, 240.0);
        for style in TransitionStyle::ANIMATED {
            let mut backend = HeadlessBackend::new(320, 240).with_frame_time(0.07);
            let mut engine = engine(1.0);
            prepare(&mut engine, &mut backend);
            engine.start(&mut backend, style).unwrap();

            let first = scalar(style.parameter(0.0, w, h));
            let terminal = scalar(style.terminal(w, h));
            let rising = terminal >= first;

            let mut last = first;
            loop {
                let status = engine.step(&mut backend).unwrap();
                // once finished, the frame just drawn used the terminal value
                let current = engine.parameter().map(scalar).unwrap_or(terminal);
                if rising {
                    assert!(current >= last && current <= terminal, "{} overshot", style);
                } else {
                    assert!(current <= last && current >= terminal, "{} overshot", style);
                }
                last = current;
                if status == TransitionStatus::Finished {
                    break;
                }
            }
            assert_eq!(last, terminal, "{} did not land on its terminal value", style);
            assert_eq!(backend.live_handles(), 0, "{} leaked textures", style);
        }
    }

    #[test]
    fn final_fade_frame_is_drawn_at_exact_terminal_alpha() {
        let mut backend = HeadlessBackend::new(100, 100).with_frame_time(0.3);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine.start(&mut backend, TransitionStyle::Fade).unwrap();
        backend.take_commands();

        let (steps, _) = run_to_end(&mut engine, &mut backend);
        assert_eq!(steps, 4);

        let commands = backend.take_commands();
        let last_frame = &commands[commands.len() - 4..];
        match (&last_frame[1], &last_frame[2]) {
            (
                DrawCommand::Texture { tint: out, .. },
                DrawCommand::TextureRegion { tint: inc, .. },
            ) => {
                assert_eq!(out.a, 0.0);
                assert_eq!(inc.a, 1.0);
            }
            other => panic!("unexpected final frame {:?}", other),
        }
        assert_eq!(last_frame[3], DrawCommand::EndDrawing);
    }

    #[test]
    fn session_textures_are_released_exactly_once() {
        let mut backend = HeadlessBackend::new(64, 64).with_frame_time(0.5);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine
            .start(&mut backend, TransitionStyle::CircleExpand)
            .unwrap();
        run_to_end(&mut engine, &mut backend);

        let mut released = backend.released().to_vec();
        let count = released.len();
        released.sort_unstable();
        released.dedup();
        assert_eq!(released.len(), count, "a handle was released twice");
        // image, before texture, after texture, canvas
        assert_eq!(count, 4);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn circle_expand_punches_before_with_min_alpha() {
        let mut backend = HeadlessBackend::new(200, 100).with_frame_time(0.25);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine
            .start(&mut backend, TransitionStyle::CircleExpand)
            .unwrap();
        backend.take_commands();

        engine.step(&mut backend).unwrap();
        let commands = backend.take_commands();
        let punch: Vec<_> = commands
            .iter()
            .skip_while(|c| !matches!(c, DrawCommand::BeginTextureMode { .. }))
            .take(6)
            .collect();

        assert!(matches!(punch[1], DrawCommand::Texture { .. }));
        assert_eq!(punch[2], &DrawCommand::SetBlendMode(BlendMode::AlphaMin));
        match punch[3] {
            DrawCommand::Circle { center, radius, color } => {
                assert_eq!(*center, Vec2::new(100.0, 50.0));
                let expected = (200.0f32 * 200.0 + 100.0 * 100.0).sqrt() / 2.0 * 0.25;
                assert!((radius - expected).abs() < 1e-3);
                assert_eq!(color.a, 0.0);
            }
            other => panic!("expected circle, got {:?}", other),
        }
        assert_eq!(punch[4], &DrawCommand::SetBlendMode(BlendMode::Alpha));
        assert_eq!(punch[5], &DrawCommand::EndTextureMode);
    }

    #[test]
    fn offscreen_textures_are_drawn_mirrored() {
        let mut backend = HeadlessBackend::new(40, 30).with_frame_time(0.1);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine.start(&mut backend, TransitionStyle::Fade).unwrap();
        backend.take_commands();
        engine.step(&mut backend).unwrap();

        let region = backend
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::TextureRegion { source, dest, .. } => Some((*source, *dest)),
                _ => None,
            })
            .unwrap();
        assert_eq!(region.0, Rect::new(0.0, 0.0, 40.0, -30.0));
        assert_eq!(region.1, Rect::new(0.0, 0.0, 40.0, 30.0));
    }

    /// Texture id and left edge of every textured draw, in order.
    fn placements(commands: &[DrawCommand]) -> Vec<(u64, f32)> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Texture {
                    texture, position, ..
                } => Some((*texture, position.x)),
                DrawCommand::TextureRegion { texture, dest, .. } => Some((*texture, dest.x)),
                _ => None,
            })
            .collect()
    }

    /// Id of the incoming texture, taken from the off-screen pass `prepare` recorded.
    fn after_id(commands: &[DrawCommand]) -> u64 {
        commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::BeginTextureMode { target, .. } => Some(*target),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn slides_place_both_frames_at_half_progress() {
        // 100px wide, halfway through: (before x, after x)
        let cases = [
            (TransitionStyle::SlideLeft, -50.0, 50.0),
            (TransitionStyle::SlideRight, 50.0, -50.0),
            (TransitionStyle::SlideLeftOverlap, 0.0, 50.0),
            (TransitionStyle::SlideRightOverlap, 0.0, -50.0),
        ];
        for (style, before_x, after_x) in cases {
            let mut backend = HeadlessBackend::new(100, 50).with_frame_time(0.5);
            let mut engine = engine(1.0);
            prepare(&mut engine, &mut backend);
            let after = after_id(&backend.take_commands());
            engine.start(&mut backend, style).unwrap();

            engine.step(&mut backend).unwrap();
            let drawn = placements(backend.commands());
            assert_eq!(drawn.len(), 2, "{}", style);

            // before underneath, after on top
            assert_ne!(drawn[0].0, after, "{} drew after first", style);
            assert_eq!(drawn[0].1, before_x, "{} before", style);
            assert_eq!(drawn[1], (after, after_x), "{} after", style);
        }
    }

    #[test]
    fn circle_contract_cuts_the_hole_into_after() {
        let mut backend = HeadlessBackend::new(200, 100).with_frame_time(0.25);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        let after = after_id(&backend.take_commands());
        engine
            .start(&mut backend, TransitionStyle::CircleContract)
            .unwrap();

        engine.step(&mut backend).unwrap();
        let commands = backend.take_commands();
        let canvas = after_id(&commands);
        assert_ne!(canvas, after);

        match &commands[1] {
            DrawCommand::TextureRegion {
                texture, source, ..
            } => {
                assert_eq!(*texture, after);
                assert_eq!(*source, Rect::new(0.0, 0.0, 200.0, -100.0));
            }
            other => panic!("expected the incoming frame, got {:?}", other),
        }
        assert_eq!(commands[2], DrawCommand::SetBlendMode(BlendMode::AlphaMin));
        match &commands[3] {
            DrawCommand::Circle { center, radius, .. } => {
                assert_eq!(*center, Vec2::new(100.0, 50.0));
                let expected = (200.0f32 * 200.0 + 100.0 * 100.0).sqrt() / 2.0 * 0.75;
                assert!((radius - expected).abs() < 1e-3);
            }
            other => panic!("expected circle, got {:?}", other),
        }
        assert_eq!(commands[5], DrawCommand::EndTextureMode);

        // on screen: before full-frame, the holed canvas over it
        let on_screen = placements(&commands[6..]);
        assert_eq!(on_screen.len(), 2);
        assert!(matches!(
            commands[7],
            DrawCommand::Texture { position, .. } if position == Vec2::ZERO
        ));
        assert_ne!(on_screen[0].0, after);
        assert_ne!(on_screen[0].0, canvas);
        assert_eq!(on_screen[1], (canvas, 0.0));
    }

    #[test]
    fn cancel_releases_everything() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine
            .start(&mut backend, TransitionStyle::CircleContract)
            .unwrap();

        assert!(engine.cancel(&mut backend));
        assert!(!engine.is_active());
        assert_eq!(backend.live_handles(), 0);
        assert!(!engine.cancel(&mut backend));
    }

    #[test]
    fn dropped_frame_keeps_the_session_where_it_was() {
        let mut backend = HeadlessBackend::new(64, 64).with_frame_time(0.25);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine.start(&mut backend, TransitionStyle::Fade).unwrap();

        engine.step(&mut backend).unwrap();
        let before_loss = engine.progress();

        backend.fail_next_frame();
        assert!(matches!(
            engine.step(&mut backend),
            Err(TransitionError::Backend(BackendError::Surface(_)))
        ));
        assert!(engine.is_active());
        assert_eq!(engine.progress(), before_loss);

        // the remaining three quarters still play out
        let (steps, _) = run_to_end(&mut engine, &mut backend);
        assert_eq!(steps, 3);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn fatal_backend_failure_ends_the_session() {
        let mut backend = HeadlessBackend::new(64, 64);
        let mut engine = engine(1.0);
        prepare(&mut engine, &mut backend);
        engine.start(&mut backend, TransitionStyle::Fade).unwrap();

        backend.fail_next_frame_with(BackendError::Device("device lost".into()));

        assert!(matches!(
            engine.step(&mut backend),
            Err(TransitionError::Backend(BackendError::Device(_)))
        ));
        assert!(!engine.is_active());
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn random_transition_is_animated() {
        let mut engine: TransitionEngine<HeadlessBackend> = TransitionEngine::new();
        for _ in 0..50 {
            assert!(engine.random_transition().is_animated());
        }
    }
}
