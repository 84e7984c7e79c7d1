//! Transition styles, easing functions and the per-effect animation parameters.

use crate::error::TransitionError;
use rand::Rng;
use std::fmt;

/// Easing functions for smooth transitions.
///
/// These control the acceleration curve of transition animations. Every curve maps
/// `0.0` to `0.0` and `1.0` to `1.0` and is monotonic in between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Visual effect used when leaving a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionStyle {
    /// Instant switch, no snapshot and no animation.
    #[default]
    None,
    /// Outgoing frame fades out while the incoming one fades in.
    Fade,
    /// Incoming frame slides leftwards over the still outgoing frame.
    SlideLeftOverlap,
    /// Incoming frame slides rightwards over the still outgoing frame.
    SlideRightOverlap,
    /// Both frames move left in lockstep; the outgoing one is pushed off-screen.
    SlideLeft,
    /// Both frames move right in lockstep; the outgoing one is pushed off-screen.
    SlideRight,
    /// A growing transparent hole in the outgoing frame reveals the incoming one.
    CircleExpand,
    /// The incoming frame closes in on the outgoing one through a shrinking hole.
    CircleContract,
}

impl TransitionStyle {
    /// Every style that produces an animation.
    pub const ANIMATED: [TransitionStyle; 7] = [
        TransitionStyle::Fade,
        TransitionStyle::SlideLeftOverlap,
        TransitionStyle::SlideRightOverlap,
        TransitionStyle::SlideLeft,
        TransitionStyle::SlideRight,
        TransitionStyle::CircleExpand,
        TransitionStyle::CircleContract,
    ];

    pub fn is_animated(self) -> bool {
        self != TransitionStyle::None
    }

    /// Circle styles need a working canvas to punch their hole into.
    pub fn needs_canvas(self) -> bool {
        matches!(
            self,
            TransitionStyle::CircleExpand | TransitionStyle::CircleContract
        )
    }

    /// Uniformly pick an animated style.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ANIMATED[rng.gen_range(0..Self::ANIMATED.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            TransitionStyle::None => "none",
            TransitionStyle::Fade => "fade",
            TransitionStyle::SlideLeftOverlap => "slide-left-overlap",
            TransitionStyle::SlideRightOverlap => "slide-right-overlap",
            TransitionStyle::SlideLeft => "slide-left",
            TransitionStyle::SlideRight => "slide-right",
            TransitionStyle::CircleExpand => "circle-expand",
            TransitionStyle::CircleContract => "circle-contract",
        }
    }

    /// The effect parameter at eased progress `p` for a `width` x `height` frame.
    ///
    /// Offsets are origin shifts: the incoming frame is drawn at `x = -offset`.
    pub fn parameter(self, p: f32, width: f32, height: f32) -> EffectParameter {
        let p = p.clamp(0.0, 1.0);
        let remaining = 1.0 - p;
        match self {
            TransitionStyle::None => EffectParameter::None,
            TransitionStyle::Fade => EffectParameter::Alpha {
                outgoing: 255.0 * remaining,
                incoming: 255.0 * p,
            },
            TransitionStyle::SlideLeftOverlap | TransitionStyle::SlideLeft => {
                EffectParameter::Offset(-width * remaining)
            }
            TransitionStyle::SlideRightOverlap | TransitionStyle::SlideRight => {
                EffectParameter::Offset(width * remaining)
            }
            TransitionStyle::CircleExpand => {
                EffectParameter::Radius(half_diagonal(width, height) * p)
            }
            TransitionStyle::CircleContract => {
                EffectParameter::Radius(half_diagonal(width, height) * remaining)
            }
        }
    }

    /// The value [`parameter`](Self::parameter) lands on when the effect is finished.
    pub fn terminal(self, width: f32, height: f32) -> EffectParameter {
        self.parameter(1.0, width, height)
    }
}

impl fmt::Display for TransitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn half_diagonal(width: f32, height: f32) -> f32 {
    (width * width + height * height).sqrt() / 2.0
}

/// The single scalar (or alpha pair) an effect animates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectParameter {
    None,
    /// Tint alphas in `0..=255` for the outgoing and incoming frame.
    Alpha { outgoing: f32, incoming: f32 },
    /// Horizontal origin shift in pixels.
    Offset(f32),
    /// Hole radius in pixels.
    Radius(f32),
}

/// Result of one [`TransitionEngine::step`](super::TransitionEngine::step).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionStatus {
    /// No session was running; nothing was drawn.
    Idle,
    /// A frame was drawn and the session continues.
    Running,
    /// The terminal frame was drawn and the session's textures were released.
    Finished,
}

/// Timing configuration shared by every transition of an engine.
///
/// # Example
///
/// ```
/// use curtain::scene::{Easing, TransitionConfig};
///
/// let config = TransitionConfig::new()
///     .duration(0.75)
///     .unwrap()
///     .easing(Easing::EaseInOut);
/// assert_eq!(config.seconds(), 0.75);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    duration: f32,
    easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: Self::DEFAULT_DURATION,
            easing: Easing::Linear,
        }
    }
}

impl TransitionConfig {
    /// Seconds a transition takes unless configured otherwise.
    pub const DEFAULT_DURATION: f32 = 2.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration in seconds. Zero, negative and non-finite values are rejected.
    pub fn duration(mut self, seconds: f32) -> Result<Self, TransitionError> {
        self.duration = validate_duration(seconds)?;
        Ok(self)
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn seconds(&self) -> f32 {
        self.duration
    }

    pub fn curve(&self) -> Easing {
        self.easing
    }
}

pub(crate) fn validate_duration(seconds: f32) -> Result<f32, TransitionError> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(TransitionError::InvalidDuration(seconds))
    }
}
